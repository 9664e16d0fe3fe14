use crate::profile::Profile;
use crate::response::{to_pretty, ResponseExt};
use crate::util::parse_plain;
use crate::{ClientError, DacroqError, GlobalOpts, Runnable, CLIENT};
use clap::{Parser, Subcommand};
use dacroq_model::dimacs::{self, CnfHeader};
use dacroq_model::sat::{
    ListSatResultsRequest, ListSatResultsResponse, SatResultSummary, SolveUploadQuery, SolverKind,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SOLVE_TIMEOUT: Duration = Duration::from_secs(600);
const EXPORT_PAGE: u32 = 1000;

#[derive(Parser, Debug)]
pub struct Sat {
    #[clap(subcommand)]
    op: Operations,
}

#[derive(Subcommand, Debug)]
pub enum Operations {
    /// Check CNF files locally without contacting the server
    Validate(Validate),
    /// Upload a .cnf file or .zip of them and wait for the batch summary
    Solve(Solve),
    /// List stored SAT results
    Results(Results),
    /// Write every stored result to a JSON file
    Export(Export),
}

impl Runnable for Sat {
    fn run(&self, opts: &GlobalOpts) -> Result<String, DacroqError> {
        match &self.op {
            Operations::Validate(a) => validate(a),
            Operations::Solve(a) => solve(opts, a),
            Operations::Results(a) => results(opts, a),
            Operations::Export(a) => export(opts, a),
        }
    }
}

#[derive(Debug, Serialize)]
struct ValidatedFile {
    file: String,
    #[serde(flatten)]
    header: CnfHeader,
}

fn display_name(path: &Path) -> Result<String, ClientError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or(ClientError::MissingFileName)
}

fn is_cnf(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".cnf")
}

fn check_cnf(file: String, bytes: &[u8]) -> Result<ValidatedFile, ClientError> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => return Err(ClientError::NotUtf8Text { file }),
    };
    match dimacs::validate(text) {
        Ok(header) => Ok(ValidatedFile { file, header }),
        Err(source) => Err(ClientError::InvalidCnf { file, source }),
    }
}

#[derive(Parser, Debug)]
pub struct Validate {
    #[clap(required = true)]
    files: Vec<PathBuf>,
}

fn validate(args: &Validate) -> Result<String, DacroqError> {
    let checked = args
        .files
        .iter()
        .map(|path| {
            let bytes = fs::read(path).map_err(ClientError::FailedToReadArgumentFile)?;
            check_cnf(display_name(path)?, &bytes)
        })
        .collect::<Result<Vec<_>, _>>()?;
    to_pretty(&checked)
}

#[derive(Parser, Debug)]
pub struct Solve {
    /// A .cnf problem or a .zip archive of them
    file: PathBuf,
    /// One of daedalus, minisat, walksat
    #[clap(long, default_value = "daedalus", value_parser = parse_plain::<SolverKind>)]
    solver: SolverKind,
    /// Submit all problems of an archive at once
    #[clap(long)]
    parallel: bool,
}

fn solve(opts: &GlobalOpts, args: &Solve) -> Result<String, DacroqError> {
    let profile = Profile::load_profile(opts.profile.as_ref())?;
    let filename = display_name(&args.file)?;
    let bytes = fs::read(&args.file).map_err(ClientError::FailedToReadArgumentFile)?;
    // Archives are checked member by member on the server.
    if is_cnf(&filename) {
        check_cnf(filename.clone(), &bytes)?;
    }
    CLIENT
        .post(profile.route_url("v1/sat/solve")?)
        .bearer_auth(&profile.token)
        .query(&SolveUploadQuery {
            filename,
            solver: args.solver,
            parallel: args.parallel,
        })
        .timeout(SOLVE_TIMEOUT)
        .body(bytes)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Results {
    /// Page number
    page: Option<u32>,
    /// Only results from one batch
    #[clap(long)]
    batch: Option<String>,
}

fn results(opts: &GlobalOpts, args: &Results) -> Result<String, DacroqError> {
    let profile = Profile::load_profile(opts.profile.as_ref())?;
    CLIENT
        .get(profile.route_url("v1/sat/results")?)
        .bearer_auth(&profile.token)
        .query(&ListSatResultsRequest {
            limit: opts.page_size,
            offset: opts.get_offset(args.page)?,
            batch_id: args.batch.clone(),
        })
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Export {
    /// Output JSON file
    output: PathBuf,
    /// Only results from one batch
    #[clap(long)]
    batch: Option<String>,
}

fn export(opts: &GlobalOpts, args: &Export) -> Result<String, DacroqError> {
    let profile = Profile::load_profile(opts.profile.as_ref())?;
    let url = profile.route_url("v1/sat/results")?;
    let mut items: Vec<SatResultSummary> = Vec::new();
    loop {
        let page = CLIENT
            .get(url.clone())
            .bearer_auth(&profile.token)
            .query(&ListSatResultsRequest {
                limit: EXPORT_PAGE,
                offset: items.len() as u32,
                batch_id: args.batch.clone(),
            })
            .send()?
            .verify_success()?
            .json_typed::<ListSatResultsResponse>()?;
        let received = page.items.len();
        items.extend(page.items);
        if received == 0 || items.len() as i64 >= page.total {
            break;
        }
    }
    fs::write(&args.output, to_pretty(&items)?).map_err(ClientError::FailedToWriteOutputFile)?;
    Ok(format!(
        "Exported {} result(s) to {}",
        items.len(),
        args.output.display()
    ))
}
