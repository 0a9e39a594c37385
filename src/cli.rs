//! Command-line interface for pagecast
//!
//! Provides argument parsing using clap derive macros, plus the parser for
//! the interactive reader's line commands.

use crate::pipeline::Artifact;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Turn documents into spoken pages with summaries and interpretations
#[derive(Parser, Debug)]
#[command(
    name = "pagecast",
    version,
    about = "Turn documents into spoken pages with summaries and interpretations"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: info logs, -vv: debug logs)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process every page and write audio files plus a manifest
    Process {
        /// Document to read: text with pages separated by form feeds (pdftotext output)
        document: PathBuf,

        /// Output directory (default: <document stem>.pagecast next to the document)
        #[arg(long, short = 'o', value_name = "DIR")]
        out: Option<PathBuf>,

        /// Maximum pages processed at once (default: from config)
        #[arg(long, short = 'j', value_name = "N")]
        jobs: Option<usize>,

        /// Give up on the run after this long. Examples: 90s, 5m, 1h30m
        #[arg(long, value_name = "DURATION", value_parser = parse_timeout)]
        timeout: Option<Duration>,
    },

    /// Read a document interactively
    Read {
        /// Document to read: text with pages separated by form feeds (pdftotext output)
        document: PathBuf,

        /// Load pages on demand instead of all up front
        #[arg(long)]
        lazy: bool,

        /// Maximum pages processed at once (default: from config)
        #[arg(long, short = 'j', value_name = "N")]
        jobs: Option<usize>,
    },

    /// Manage configuration
    Config {
        /// Action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (file + environment overrides)
    Show,
    /// Print the configuration file path
    Path,
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Parse a timeout string.
///
/// Supports any duration format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`, `2m30s`).
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// A line typed into the interactive reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderCommand {
    Play(Artifact),
    Stop,
    Pause,
    Resume,
    Next,
    Prev,
    /// 1-based page number as typed
    Page(usize),
    Status,
    Help,
    Quit,
}

pub const READER_HELP: &str = "\
Commands:
  play | summary | interp   play the page text, summary or interpretation
  stop | pause | resume     control playback
  next | prev               move between loaded pages
  page N                    jump to page N
  status                    show which pages are loaded
  help                      show this list
  quit                      exit";

/// Parse one reader line. Empty lines and unknown words yield an error
/// message suitable for printing.
pub fn parse_reader_command(line: &str) -> Result<ReaderCommand, String> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Err("type 'help' for commands".to_string());
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "play" | "text" => ReaderCommand::Play(Artifact::Text),
        "summary" | "sum" => ReaderCommand::Play(Artifact::Summary),
        "interp" | "interpretation" => ReaderCommand::Play(Artifact::Interpretation),
        "stop" => ReaderCommand::Stop,
        "pause" => ReaderCommand::Pause,
        "resume" => ReaderCommand::Resume,
        "next" | "n" => ReaderCommand::Next,
        "prev" | "p" => ReaderCommand::Prev,
        "page" | "goto" => {
            let number = words
                .next()
                .ok_or_else(|| "usage: page N".to_string())?
                .parse::<usize>()
                .map_err(|_| "page number must be a positive integer".to_string())?;
            if number == 0 {
                return Err("pages are numbered from 1".to_string());
            }
            ReaderCommand::Page(number)
        }
        "status" | "s" => ReaderCommand::Status,
        "help" | "?" => ReaderCommand::Help,
        "quit" | "exit" | "q" => ReaderCommand::Quit,
        other => return Err(format!("unknown command '{other}', type 'help' for commands")),
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["pagecast"]).is_err());
    }

    #[test]
    fn test_parse_process_defaults() {
        let cli = Cli::try_parse_from(["pagecast", "process", "book.txt"]).unwrap();
        match cli.command {
            Commands::Process {
                document,
                out,
                jobs,
                timeout,
            } => {
                assert_eq!(document, PathBuf::from("book.txt"));
                assert!(out.is_none());
                assert!(jobs.is_none());
                assert!(timeout.is_none());
            }
            other => panic!("Expected Process command, got {:?}", other),
        }
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_process_with_options() {
        let cli = Cli::try_parse_from([
            "pagecast", "process", "book.txt", "--out", "audio", "-j", "4", "--timeout", "2m",
        ])
        .unwrap();
        match cli.command {
            Commands::Process {
                out, jobs, timeout, ..
            } => {
                assert_eq!(out, Some(PathBuf::from("audio")));
                assert_eq!(jobs, Some(4));
                assert_eq!(timeout, Some(Duration::from_secs(120)));
            }
            other => panic!("Expected Process command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_read_lazy() {
        let cli = Cli::try_parse_from(["pagecast", "read", "book.txt", "--lazy"]).unwrap();
        match cli.command {
            Commands::Read { lazy, jobs, .. } => {
                assert!(lazy);
                assert!(jobs.is_none());
            }
            other => panic!("Expected Read command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_verbose_double() {
        let cli = Cli::try_parse_from(["pagecast", "-vv", "config", "show"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["pagecast", "config", "path", "--config", "/tmp/p.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.toml")));
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Path
            }
        ));
    }

    #[test]
    fn test_parse_config_init_force() {
        let cli = Cli::try_parse_from(["pagecast", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: true }
            }
        ));
    }

    #[test]
    fn test_parse_timeout_formats() {
        assert_eq!(parse_timeout("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_timeout("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_timeout("1h30m").unwrap(), Duration::from_secs(5400));
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["pagecast", "process", "a.txt", "--timeout", "x"]).is_err());
    }

    #[test]
    fn test_reader_play_commands() {
        assert_eq!(
            parse_reader_command("play"),
            Ok(ReaderCommand::Play(Artifact::Text))
        );
        assert_eq!(
            parse_reader_command("  Summary "),
            Ok(ReaderCommand::Play(Artifact::Summary))
        );
        assert_eq!(
            parse_reader_command("interp"),
            Ok(ReaderCommand::Play(Artifact::Interpretation))
        );
    }

    #[test]
    fn test_reader_page_command() {
        assert_eq!(parse_reader_command("page 3"), Ok(ReaderCommand::Page(3)));
        assert!(parse_reader_command("page").is_err());
        assert!(parse_reader_command("page zero").is_err());
        assert!(parse_reader_command("page 0").is_err());
    }

    #[test]
    fn test_reader_rejects_blank_and_unknown() {
        assert!(parse_reader_command("").is_err());
        assert!(parse_reader_command("   ").is_err());
        let err = parse_reader_command("dance").unwrap_err();
        assert!(err.contains("dance"));
    }

    #[test]
    fn test_reader_navigation_and_quit() {
        assert_eq!(parse_reader_command("next"), Ok(ReaderCommand::Next));
        assert_eq!(parse_reader_command("prev"), Ok(ReaderCommand::Prev));
        assert_eq!(parse_reader_command("quit"), Ok(ReaderCommand::Quit));
        assert_eq!(parse_reader_command("q"), Ok(ReaderCommand::Quit));
    }
}
