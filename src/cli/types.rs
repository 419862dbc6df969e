//! CLI type definitions
//!
//! Top-level clap structures. Per-command argument structs live next to
//! their command in `commands/`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::{
    auth::AuthArgs, certificates::CertificatesArgs, download::DownloadArgs, history::HistoryArgs,
    process::ProcessArgs, progress::ProgressArgs, sign::SignArgs, ttn::TtnArgs,
    validate::ValidateArgs,
};

#[derive(Parser, Debug)]
#[command(name = "iconesign")]
#[command(about = "IconeSign - sign, file and track electronic invoices", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Read configuration from this file instead of .iconesign/
    #[arg(short, long, global = true, env = "ICONESIGN_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in, check or clear the stored session
    Auth(AuthArgs),

    /// Submit invoices to the signing workflow and follow them to completion
    Process(ProcessArgs),

    /// Show or follow the progress of a submitted batch
    Progress(ProgressArgs),

    /// Sign, file with TTN and validate invoices directly
    Sign(SignArgs),

    /// Validate the signature of XML invoices
    Validate(ValidateArgs),

    /// Query invoices filed with TTN
    Ttn(TtnArgs),

    /// Show the signing certificate setup
    Certificates(CertificatesArgs),

    /// Show recorded activity
    History(HistoryArgs),

    /// Download a results archive
    Download(DownloadArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_json_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["iconesign", "certificates", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Certificates(_)));
    }

    #[test]
    fn test_process_requires_files() {
        assert!(Cli::try_parse_from(["iconesign", "process"]).is_err());
        let cli = Cli::try_parse_from(["iconesign", "process", "a.xml", "b.xml", "--no-wait"])
            .unwrap();
        match cli.command {
            Commands::Process(args) => {
                assert_eq!(args.files.len(), 2);
                assert!(args.no_wait);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
