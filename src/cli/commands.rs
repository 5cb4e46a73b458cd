//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - version: print the installed version
//! - list-models: list the prebuilt models
//! - start: serve the configured model
//! - etl: load documents into the vector database
//! - dli_airbyte: fetch and launch the Airbyte platform
//! - server: serve the prompt engine API

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const BANNER: &str = r#"
██╗     ██╗     ███╗   ███╗    ███████╗████████╗ █████╗  ██████╗██╗  ██╗
██║     ██║     ████╗ ████║    ██╔════╝╚══██╔══╝██╔══██╗██╔════╝██║ ██╔╝
██║     ██║     ██╔████╔██║    ███████╗   ██║   ███████║██║     █████╔╝
██║     ██║     ██║╚██╔╝██║    ╚════██║   ██║   ██╔══██║██║     ██╔═██╗
███████╗███████╗██║ ╚═╝ ██║    ███████║   ██║   ██║  ██║╚██████╗██║  ██╗
╚══════╝╚══════╝╚═╝     ╚═╝    ╚══════╝   ╚═╝   ╚═╝  ╚═╝ ╚═════╝╚═╝  ╚═╝
"#;

/// LLM Stack - build and serve retrieval-augmented LLM apps
#[derive(Parser, Debug)]
#[command(name = "llmstack")]
#[command(author, version, about, long_about = None, before_help = BANNER)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Version of the installed LLM Stack package
    Version,

    /// Lists available prebuilt models
    ListModels,

    /// Start the model server for the configured stack
    Start {
        /// Stack config file (YAML or JSON)
        #[arg(long = "config_file", alias = "config-file")]
        config_file: Option<PathBuf>,
    },

    /// Load documents into the configured vector database
    Etl {
        /// Stack config file (YAML or JSON)
        #[arg(long = "config_file", alias = "config-file")]
        config_file: Option<PathBuf>,
    },

    /// Clone and launch the Airbyte platform
    #[command(name = "dli_airbyte", alias = "dli-airbyte")]
    DliAirbyte {
        /// Directory to clone Airbyte into
        #[arg(short, long)]
        destination: PathBuf,
    },

    /// Serve the prompt engine HTTP API
    Server {
        /// Stack config file (YAML or JSON)
        #[arg(long = "config_file", alias = "config-file")]
        config_file: Option<PathBuf>,
    },
}

impl Commands {
    /// Config file named on the command line, for commands that take one
    pub fn config_file(&self) -> Option<&PathBuf> {
        match self {
            Commands::Start { config_file } | Commands::Etl { config_file } | Commands::Server { config_file } => {
                config_file.as_ref()
            }
            Commands::Version | Commands::ListModels | Commands::DliAirbyte { .. } => None,
        }
    }
}

/// Rewrite the single-dash `-destination` spelling to `--destination`
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(|arg| match arg.strip_prefix("-destination") {
            Some(rest) if rest.is_empty() || rest.starts_with('=') => format!("--destination{}", rest),
            _ => arg,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["llmstack"]).is_err());
    }

    #[test]
    fn test_version_command() {
        let cli = Cli::try_parse_from(["llmstack", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_list_models_command() {
        let cli = Cli::try_parse_from(["llmstack", "list-models"]).unwrap();
        assert!(matches!(cli.command, Commands::ListModels));
    }

    #[test]
    fn test_start_with_config_file() {
        let cli = Cli::try_parse_from(["llmstack", "start", "--config_file", "stack.yml"]).unwrap();
        assert_eq!(cli.command.config_file(), Some(&PathBuf::from("stack.yml")));
    }

    #[test]
    fn test_start_without_config_file() {
        let cli = Cli::try_parse_from(["llmstack", "start"]).unwrap();
        match cli.command {
            Commands::Start { config_file } => assert!(config_file.is_none()),
            _ => panic!("Expected start command"),
        }
    }

    #[test]
    fn test_etl_kebab_alias() {
        let cli = Cli::try_parse_from(["llmstack", "etl", "--config-file", "etl.yml"]).unwrap();
        match cli.command {
            Commands::Etl { config_file } => assert_eq!(config_file, Some(PathBuf::from("etl.yml"))),
            _ => panic!("Expected etl command"),
        }
    }

    #[test]
    fn test_server_command() {
        let cli = Cli::try_parse_from(["llmstack", "server"]).unwrap();
        assert!(matches!(cli.command, Commands::Server { config_file: None }));
    }

    #[test]
    fn test_dli_airbyte_short_flag() {
        let cli = Cli::try_parse_from(["llmstack", "dli_airbyte", "-d", "/opt"]).unwrap();
        match cli.command {
            Commands::DliAirbyte { destination } => assert_eq!(destination, PathBuf::from("/opt")),
            _ => panic!("Expected dli_airbyte command"),
        }
        assert!(Cli::try_parse_from(["llmstack", "dli_airbyte"]).is_err());
    }

    #[test]
    fn test_legacy_destination_flag() {
        let argv = normalize_args(args(&["llmstack", "dli_airbyte", "-destination", "/srv"]));
        assert_eq!(argv, args(&["llmstack", "dli_airbyte", "--destination", "/srv"]));
        let cli = Cli::try_parse_from(argv).unwrap();
        assert!(matches!(cli.command, Commands::DliAirbyte { .. }));
    }

    #[test]
    fn test_normalize_leaves_other_args() {
        let original = args(&["llmstack", "dli_airbyte", "-d", "-destinationx", "--destination=/a"]);
        assert_eq!(normalize_args(original.clone()), original);
        assert_eq!(normalize_args(args(&["-destination=/b"])), args(&["--destination=/b"]));
    }

    #[test]
    fn test_help_includes_banner() {
        let help = Cli::command().render_help().to_string();
        assert!(help.contains("███████╗"));
        assert!(help.contains("list-models"));
    }

    #[test]
    fn test_help_works() {
        Cli::command().debug_assert();
    }
}
