use clap::{Parser, Subcommand};
use dacroq_model::dimacs::DimacsError;
use lazy_static::lazy_static;
use reqwest::blocking::Client;
use response::UnknownApiError;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

mod convert;
mod profile;
mod response;
mod subcommands;
mod util;

lazy_static! {
    static ref CLIENT: Client = Client::builder()
        .user_agent(format!("dacroq-cli {}", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(1))
        .timeout(Duration::from_secs(8))
        .build()
        .expect("Failed to build http client");
}

#[derive(Debug, Error)]
#[error("{0}")]
pub enum DacroqError {
    ClientError(
        #[source]
        #[from]
        ClientError,
    ),
    ConnectionError(
        #[source]
        #[from]
        reqwest::Error,
    ),
    ApiError(
        #[source]
        #[from]
        http_api_problem::HttpApiProblem,
    ),
    UnknownApiError(
        #[source]
        #[from]
        UnknownApiError,
    ),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Unable to locate the user config directory")]
    NoConfigDirectory,
    #[error("Failed to read profile file: {0}")]
    FailedToReadProfileFile(#[source] std::io::Error),
    #[error("Failed to parse profile file: {0}")]
    FailedToParseProfile(#[source] serde_json::Error),
    #[error("Failed to create profile directory: {0}")]
    FailedToCreateAppDirectory(#[source] std::io::Error),
    #[error("Failed to write profile file: {0}")]
    FailedToWriteProfileFile(#[source] std::io::Error),
    #[error("Failed to delete profile file: {0}")]
    FailedToDeleteProfileFile(#[source] std::io::Error),
    #[error("Profile file already exists")]
    ProfileAlreadyExists,
    #[error("Page number must be 1 or greater")]
    InvalidPageNumber,
    #[error("Failed to read from stdin: {0}")]
    FailedToReadStdin(#[source] std::io::Error),
    #[error("Failed to read input (dialoguer): {0}")]
    DialoguerError(#[source] std::io::Error),
    #[error("Server url cannot be used as a base")]
    InvalidServerUrl,
    #[error("Invalid path variable: {0}")]
    FailedToParsePathVariable(#[source] url::ParseError),
    #[error("Failed to parse json input: {0}")]
    FailedToParseJsonInput(#[source] serde_json::Error),
    #[error("Failed to read argument file: {0}")]
    FailedToReadArgumentFile(#[source] std::io::Error),
    #[error("Failed to write output file: {0}")]
    FailedToWriteOutputFile(#[source] std::io::Error),
    #[error("Invalid user id, expected integer or `self`")]
    InvalidUserId,
    #[error("Input file must have a file name")]
    MissingFileName,
    #[error("{file} is not UTF-8 text")]
    NotUtf8Text { file: String },
    #[error("{file} is not a valid CNF file: {source}")]
    InvalidCnf {
        file: String,
        #[source]
        source: DimacsError,
    },
    #[error("{0}")]
    ConversionFailed(
        #[source]
        #[from]
        convert::ConvertError,
    ),
}

#[derive(Debug, Serialize)]
#[serde(tag = "variant")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DacroqErrorSerializable {
    ClientError { message: String },
    ConnectionError { message: String },
    ApiError(http_api_problem::HttpApiProblem),
    UnknownApiError(UnknownApiError),
}

impl From<DacroqError> for DacroqErrorSerializable {
    fn from(e: DacroqError) -> Self {
        match e {
            DacroqError::ClientError(e) => Self::ClientError {
                message: format!("{}", e),
            },
            DacroqError::ConnectionError(e) => Self::ConnectionError {
                message: format!("{}", e),
            },
            DacroqError::ApiError(a) => Self::ApiError(a),
            DacroqError::UnknownApiError(e) => Self::UnknownApiError(e),
        }
    }
}

#[derive(Parser, Debug)]
#[clap(about, version)]
struct Args {
    #[clap(subcommand)]
    subcommand: SubCommand,
    #[clap(flatten)]
    global: GlobalOpts,
}

#[derive(Parser, Debug)]
pub struct GlobalOpts {
    /// Override the profile file
    #[clap(long)]
    profile: Option<PathBuf>,
    /// Page size for paginated requests
    #[clap(long, default_value_t = 10)]
    page_size: u32,
}

impl GlobalOpts {
    fn get_offset(&self, page_number: Option<u32>) -> Result<u32, ClientError> {
        match page_number {
            None => Ok(0),
            Some(page_number) => {
                if page_number < 1 {
                    return Err(ClientError::InvalidPageNumber);
                }
                Ok((page_number - 1) * self.page_size)
            }
        }
    }
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Login, logout, and session management
    Session(subcommands::Session),
    /// User account management
    Users(subcommands::Users),
    /// Hardware test runs
    Tests(subcommands::Tests),
    /// Community posts and replies
    Posts(subcommands::Posts),
    /// System announcements
    Notifications(subcommands::Notifications),
    /// System flags such as maintenance mode
    System(subcommands::System),
    /// Documentation sections
    Docs(subcommands::Docs),
    /// Send or read feedback
    Feedback(subcommands::Feedback),
    /// Remote API health and metrics
    Monitor(subcommands::Monitor),
    /// Hardware status and resets
    Hardware(subcommands::Hardware),
    /// Validate, solve and export SAT problems
    Sat(subcommands::Sat),
    /// Convert between CSV and JSON (offline)
    Convert(subcommands::Convert),
}

fn main() {
    let args: Args = Args::parse();
    std::process::exit(match args.subcommand.run(&args.global) {
        Ok(s) => {
            println!("{}", s);
            0
        }
        Err(e) => {
            let e = DacroqErrorSerializable::from(e);
            println!(
                "{}",
                serde_json::to_string_pretty(&e).unwrap_or_else(|_| format!("{:?}", e))
            );
            1
        }
    });
}

trait Runnable {
    fn run(&self, opts: &GlobalOpts) -> Result<String, DacroqError>;
}

impl Runnable for SubCommand {
    fn run(&self, opts: &GlobalOpts) -> Result<String, DacroqError> {
        match &self {
            SubCommand::Session(a) => a.run(opts),
            SubCommand::Users(a) => a.run(opts),
            SubCommand::Tests(a) => a.run(opts),
            SubCommand::Posts(a) => a.run(opts),
            SubCommand::Notifications(a) => a.run(opts),
            SubCommand::System(a) => a.run(opts),
            SubCommand::Docs(a) => a.run(opts),
            SubCommand::Feedback(a) => a.run(opts),
            SubCommand::Monitor(a) => a.run(opts),
            SubCommand::Hardware(a) => a.run(opts),
            SubCommand::Sat(a) => a.run(opts),
            SubCommand::Convert(a) => a.run(opts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn opts(page_size: u32) -> GlobalOpts {
        GlobalOpts {
            profile: None,
            page_size,
        }
    }

    #[test]
    fn page_offsets() {
        assert_eq!(opts(10).get_offset(None).unwrap(), 0);
        assert_eq!(opts(10).get_offset(Some(1)).unwrap(), 0);
        assert_eq!(opts(25).get_offset(Some(3)).unwrap(), 50);
        assert!(opts(10).get_offset(Some(0)).is_err());
    }

    #[test]
    fn api_errors_serialize_with_variant() {
        let e = DacroqError::from(ClientError::InvalidUserId);
        let value = serde_json::to_value(DacroqErrorSerializable::from(e)).unwrap();
        assert_eq!(value["variant"], "CLIENT_ERROR");
    }

    #[test]
    fn args_parse() {
        Args::command().debug_assert();
    }
}
