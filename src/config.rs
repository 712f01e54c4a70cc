//! Configuration types for mdu
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::Parser;
use std::path::PathBuf;

/// Maximum reasonable worker count
pub const MAX_WORKERS: usize = 512;

/// Parallel disk usage calculator
#[derive(Parser, Debug, Clone)]
#[command(
    name = "mdu",
    version,
    about = "Parallel disk usage calculator",
    long_about = "Reports the disk space used by each PATH, in 512-byte blocks.\n\n\
                  Directories are walked recursively by a pool of worker threads. \
                  Symbolic links are not followed and hard-linked files are \
                  counted once per PATH.",
    after_help = "EXAMPLES:\n    \
        mdu /var/log\n    \
        mdu -j 8 /usr /opt\n    \
        mdu -j 4 -H -s ~/projects"
)]
pub struct CliArgs {
    /// Files or directories to measure
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Number of worker threads
    #[arg(short = 'j', long = "jobs", default_value_t = 1, value_name = "NUM")]
    pub jobs: usize,

    /// Print sizes in human readable units instead of blocks
    #[arg(short = 'H', long)]
    pub human_readable: bool,

    /// Print a summary of the walk to stderr
    #[arg(short = 's', long)]
    pub summary: bool,

    /// Verbose output (worker lifecycle and skipped entries)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Input paths, in the order given
    pub paths: Vec<PathBuf>,

    /// Number of worker threads
    pub worker_count: usize,

    /// Render sizes with humansize
    pub human_readable: bool,

    /// Print the walk summary
    pub show_summary: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl WalkConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.paths.is_empty() {
            return Err(ConfigError::NoPaths);
        }

        if args.jobs > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.jobs,
                max: MAX_WORKERS,
            });
        }

        Ok(Self {
            paths: args.paths,
            // A pool always has at least one worker
            worker_count: args.jobs.max(1),
            human_readable: args.human_readable,
            show_summary: args.summary,
            verbose: args.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("mdu").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_defaults() {
        let args = parse(&["/data"]);
        assert_eq!(args.paths, vec![PathBuf::from("/data")]);
        assert_eq!(args.jobs, 1);
        assert!(!args.human_readable);
        assert!(!args.summary);
    }

    #[test]
    fn test_parse_jobs_and_paths() {
        let args = parse(&["-j", "8", "/a", "/b", "-H"]);
        assert_eq!(args.jobs, 8);
        assert_eq!(args.paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert!(args.human_readable);
    }

    #[test]
    fn test_paths_required() {
        assert!(CliArgs::try_parse_from(["mdu", "-j", "2"]).is_err());
    }

    #[test]
    fn test_flags_carried_into_config() {
        let config = WalkConfig::from_args(parse(&["-v", "-s", "-H", "/a"])).unwrap();
        assert!(config.verbose);
        assert!(config.show_summary);
        assert!(config.human_readable);

        let quiet = WalkConfig::from_args(parse(&["/a"])).unwrap();
        assert!(!quiet.verbose);
    }

    #[test]
    fn test_zero_jobs_means_one() {
        let config = WalkConfig::from_args(parse(&["-j", "0", "/a"])).unwrap();
        assert_eq!(config.worker_count, 1);
    }

    #[test]
    fn test_too_many_jobs() {
        let err = WalkConfig::from_args(parse(&["-j", "10000", "/a"])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidWorkerCount { count: 10000, max: MAX_WORKERS }
        ));
    }

    #[test]
    fn test_no_paths() {
        let args = CliArgs {
            paths: Vec::new(),
            jobs: 1,
            human_readable: false,
            summary: false,
            verbose: false,
        };
        assert!(matches!(
            WalkConfig::from_args(args),
            Err(ConfigError::NoPaths)
        ));
    }
}
