//! Command-line interface definition for Tequila
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for browsing weeks, editing day fields, running
//! generation jobs, and inspecting usage.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tequila - Latin curriculum dashboard
///
/// Browse generated weeks, edit lesson fields, and drive generation
/// jobs on the curriculum backend.
#[derive(Parser, Debug, Clone)]
#[command(name = "tequila")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the backend base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Override the API key sent as X-API-Key
    #[arg(long)]
    pub api_key: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Tequila
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Browse and manage curriculum weeks
    Weeks {
        /// Week subcommand
        #[command(subcommand)]
        command: WeekCommand,
    },

    /// Inspect and edit the fields of one day
    Day {
        /// Day subcommand
        #[command(subcommand)]
        command: DayCommand,
    },

    /// Run generation jobs on the backend
    Generate {
        /// Generation subcommand
        #[command(subcommand)]
        command: GenerateCommand,
    },

    /// Show or reset token and cost usage
    Usage {
        /// Usage subcommand
        #[command(subcommand)]
        command: UsageCommand,
    },

    /// Stream backend events until interrupted
    Events,
}

/// Week subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum WeekCommand {
    /// List all weeks with their status
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-validate a week on the backend
    Validate {
        /// Week number
        week: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a week to a ZIP archive
    Export {
        /// Week number
        week: u32,

        /// Also download the archive to this path
        #[arg(short, long)]
        download: Option<PathBuf>,
    },

    /// Create the folder structure for a week
    Scaffold {
        /// Week number
        week: u32,
    },

    /// Print the compiled week spec, or one part of it
    Spec {
        /// Week number
        week: u32,

        /// Spec part file name (e.g. 01_metadata.json)
        #[arg(short, long)]
        part: Option<String>,
    },
}

/// Day subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum DayCommand {
    /// Show every field of a day
    Show {
        /// Week number
        week: u32,

        /// Day number (1-4)
        day: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace the content of one field
    Set {
        /// Week number
        week: u32,

        /// Day number (1-4)
        day: u32,

        /// Field key (e.g. 01_class_name.txt)
        field: String,

        /// New content
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        value: Option<String>,

        /// Read new content from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the compiled Flint bundle for a day
    Bundle {
        /// Week number
        week: u32,

        /// Day number (1-4)
        day: u32,
    },
}

/// Generation subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum GenerateCommand {
    /// Hydrate one complete week
    Week {
        /// Week number
        week: u32,

        /// Poll usage stats while generating
        #[arg(long)]
        watch_usage: bool,

        /// Follow backend progress events while generating
        #[arg(long)]
        events: bool,
    },

    /// Hydrate an inclusive range of weeks, one at a time
    Range {
        /// First week
        from: u32,

        /// Last week
        to: u32,
    },

    /// Generate the week spec
    Spec {
        /// Week number
        week: u32,
    },

    /// Generate the role context
    RoleContext {
        /// Week number
        week: u32,
    },

    /// Generate the week assets
    Assets {
        /// Week number
        week: u32,
    },

    /// Generate the fields of one day
    DayFields {
        /// Week number
        week: u32,

        /// Day number (1-4)
        day: u32,
    },

    /// Generate the Sparky document of one day
    Document {
        /// Week number
        week: u32,

        /// Day number (1-4)
        day: u32,
    },
}

/// Usage subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum UsageCommand {
    /// Show current usage stats
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reset usage counters
    Reset,

    /// Poll usage stats until interrupted
    Watch,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            api_url: None,
            api_key: None,
            command: Commands::Weeks {
                command: WeekCommand::List { json: false },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Weeks {
                command: WeekCommand::List { json: false }
            }
        ));
    }

    #[test]
    fn test_cli_parse_weeks_list() {
        let cli = Cli::try_parse_from(["tequila", "weeks", "list", "--json"]).unwrap();
        if let Commands::Weeks {
            command: WeekCommand::List { json },
        } = cli.command
        {
            assert!(json);
        } else {
            panic!("Expected weeks list command");
        }
    }

    #[test]
    fn test_cli_parse_global_overrides() {
        let cli = Cli::try_parse_from([
            "tequila",
            "--api-url",
            "http://backend:8000",
            "--api-key",
            "k",
            "usage",
            "show",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://backend:8000"));
        assert_eq!(cli.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_cli_parse_export_with_download() {
        let cli =
            Cli::try_parse_from(["tequila", "weeks", "export", "3", "--download", "w3.zip"])
                .unwrap();
        if let Commands::Weeks {
            command: WeekCommand::Export { week, download },
        } = cli.command
        {
            assert_eq!(week, 3);
            assert_eq!(download, Some(PathBuf::from("w3.zip")));
        } else {
            panic!("Expected weeks export command");
        }
    }

    #[test]
    fn test_cli_parse_day_set_requires_content() {
        let result = Cli::try_parse_from(["tequila", "day", "set", "3", "2", "01_class_name.txt"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "tequila",
            "day",
            "set",
            "3",
            "2",
            "01_class_name.txt",
            "--value",
            "X",
        ])
        .unwrap();
        if let Commands::Day {
            command:
                DayCommand::Set {
                    week,
                    day,
                    field,
                    value,
                    file,
                },
        } = cli.command
        {
            assert_eq!((week, day), (3, 2));
            assert_eq!(field, "01_class_name.txt");
            assert_eq!(value.as_deref(), Some("X"));
            assert!(file.is_none());
        } else {
            panic!("Expected day set command");
        }
    }

    #[test]
    fn test_cli_parse_generate_range() {
        let cli = Cli::try_parse_from(["tequila", "generate", "range", "5", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Generate {
                command: GenerateCommand::Range { from: 5, to: 7 }
            }
        ));
    }

    #[test]
    fn test_cli_parse_generate_role_context() {
        let cli = Cli::try_parse_from(["tequila", "generate", "role-context", "4"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Generate {
                command: GenerateCommand::RoleContext { week: 4 }
            }
        ));
    }

    #[test]
    fn test_cli_parse_events() {
        let cli = Cli::try_parse_from(["tequila", "events"]).unwrap();
        assert!(matches!(cli.command, Commands::Events));
    }
}
