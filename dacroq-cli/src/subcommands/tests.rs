use super::watch::watch;
use crate::profile::Profile;
use crate::response::ResponseExt;
use crate::util::{parse_json_from_arg_or_stdin, parse_plain};
use crate::{DacroqError, GlobalOpts, Runnable, CLIENT};
use clap::{Parser, Subcommand};
use dacroq_model::api_v1::{
    Collection, CreateTestRequest, ListTestsRequest, UpdateTestRequest,
};
use dacroq_model::tests::{ChipType, TestStatus};
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct Tests {
    #[clap(subcommand)]
    op: Operations,
}

#[derive(Subcommand, Debug)]
pub enum Operations {
    /// List test runs
    List(List),
    /// Queue a new test run
    Create(Create),
    /// Get a test run by id
    Get(Get),
    /// Delete a test run by id
    Delete(Delete),
    /// Update name, status or results of a test run
    Update(Update),
    /// Queue a finished test run again
    Rerun(Rerun),
    /// Print test changes as they happen
    Watch(Watch),
}

impl Runnable for Tests {
    fn run(&self, opts: &GlobalOpts) -> Result<String, DacroqError> {
        let profile = Profile::load_profile(opts.profile.as_ref())?;
        match &self.op {
            Operations::List(l) => list(opts, &profile, l),
            Operations::Create(c) => create(opts, &profile, c),
            Operations::Get(g) => get(opts, &profile, g),
            Operations::Delete(d) => delete(opts, &profile, d),
            Operations::Update(u) => update(opts, &profile, u),
            Operations::Rerun(r) => rerun(opts, &profile, r),
            Operations::Watch(w) => watch(&profile, Collection::Tests, w.once),
        }
    }
}

#[derive(Parser, Debug)]
pub struct List {
    /// Page number
    page: Option<u32>,
    /// One of queued, running, completed, failed, error
    #[clap(long, value_parser = parse_plain::<TestStatus>)]
    status: Option<TestStatus>,
    /// One of 3SAT, KSAT, LDPC
    #[clap(long, value_parser = parse_plain::<ChipType>)]
    chip_type: Option<ChipType>,
}

fn list(opts: &GlobalOpts, profile: &Profile, args: &List) -> Result<String, DacroqError> {
    CLIENT
        .get(profile.route_url("v1/tests")?)
        .bearer_auth(&profile.token)
        .query(&ListTestsRequest {
            limit: opts.page_size,
            offset: opts.get_offset(args.page)?,
            status: args.status,
            chip_type: args.chip_type,
        })
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Create {
    name: String,
    /// One of 3SAT, KSAT, LDPC
    #[clap(value_parser = parse_plain::<ChipType>)]
    chip_type: ChipType,
}

fn create(_: &GlobalOpts, profile: &Profile, args: &Create) -> Result<String, DacroqError> {
    let item = CreateTestRequest {
        name: args.name.clone(),
        chip_type: args.chip_type,
        results: None,
    };
    CLIENT
        .post(profile.route_url("v1/tests")?)
        .bearer_auth(&profile.token)
        .json(&item)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Get {
    /// ID of test to get
    id: i32,
}

fn get(_: &GlobalOpts, profile: &Profile, args: &Get) -> Result<String, DacroqError> {
    CLIENT
        .get(profile.route_url_with_id("v1/tests/", &args.id)?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Update {
    /// ID of test to update
    id: i32,
    #[clap(long)]
    name: Option<String>,
    #[clap(long, value_parser = parse_plain::<TestStatus>)]
    status: Option<TestStatus>,
    /// Results blob (JSON file, `-` for stdin)
    #[clap(long)]
    results: Option<PathBuf>,
}

fn update(_: &GlobalOpts, profile: &Profile, args: &Update) -> Result<String, DacroqError> {
    let results = match &args.results {
        Some(path) => Some(parse_json_from_arg_or_stdin(Some(path))?),
        None => None,
    };
    let item = UpdateTestRequest {
        name: args.name.clone(),
        status: args.status,
        results,
    };
    CLIENT
        .put(profile.route_url_with_id("v1/tests/", &args.id)?)
        .bearer_auth(&profile.token)
        .json(&item)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Delete {
    /// ID of test to delete
    id: i32,
}

fn delete(_: &GlobalOpts, profile: &Profile, args: &Delete) -> Result<String, DacroqError> {
    CLIENT
        .delete(profile.route_url_with_id("v1/tests/", &args.id)?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?;
    Ok(format!("Successfully deleted test {}", args.id))
}

#[derive(Parser, Debug)]
pub struct Rerun {
    /// ID of test to queue again
    id: i32,
}

fn rerun(_: &GlobalOpts, profile: &Profile, args: &Rerun) -> Result<String, DacroqError> {
    CLIENT
        .post(profile.route_url_with_id_and("v1/tests/", &args.id, "rerun")?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Watch {
    /// Exit after the first batch of changes
    #[clap(long)]
    once: bool,
}
