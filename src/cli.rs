//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Harvest biodiversity literature and its metadata.
///
/// Crawls every source configured in the YAML file, filters the discovered
/// items by the configured rules and writes metadata and full texts below
/// the output path.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Path to the YAML harvest configuration
    pub config: PathBuf,

    /// Output root, overriding `output-path` from the configuration
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Only run the named source (repeatable; default: all configured sources)
    #[arg(short, long = "source", value_name = "NAME")]
    pub sources: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Log level implied by `-q`/`-v`, if either was given.
    #[must_use]
    pub fn flag_log_level(&self) -> Option<&'static str> {
        if self.quiet {
            return Some("error");
        }
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_config_path_parses_successfully() {
        let args = Args::try_parse_from(["harvester", "harvest.yml"]).unwrap();
        assert_eq!(args.config, PathBuf::from("harvest.yml"));
        assert!(args.output.is_none());
        assert!(args.sources.is_empty());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_missing_config_returns_error() {
        let result = Args::try_parse_from(["harvester"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["harvester", "c.yml", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);
        assert_eq!(args.flag_log_level(), Some("debug"));

        let args = Args::try_parse_from(["harvester", "c.yml", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.flag_log_level(), Some("trace"));
    }

    #[test]
    fn test_cli_quiet_flag_wins_over_verbose() {
        let args = Args::try_parse_from(["harvester", "c.yml", "-q", "-v"]).unwrap();
        assert!(args.quiet);
        assert_eq!(args.flag_log_level(), Some("error"));
    }

    #[test]
    fn test_cli_no_flags_defers_log_level() {
        let args = Args::try_parse_from(["harvester", "c.yml"]).unwrap();
        assert_eq!(args.flag_log_level(), None);
    }

    #[test]
    fn test_cli_output_and_sources() {
        let args = Args::try_parse_from([
            "harvester",
            "c.yml",
            "-o",
            "/tmp/out",
            "-s",
            "Zobodat",
            "--source",
            "Other",
        ])
        .unwrap();
        assert_eq!(args.output, Some(PathBuf::from("/tmp/out")));
        assert_eq!(args.sources, vec!["Zobodat", "Other"]);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        // --help causes early exit, so we check it returns an error with Help kind
        let result = Args::try_parse_from(["harvester", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let result = Args::try_parse_from(["harvester", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["harvester", "c.yml", "--invalid-flag"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
