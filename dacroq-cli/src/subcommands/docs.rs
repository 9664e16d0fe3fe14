use crate::profile::Profile;
use crate::response::ResponseExt;
use crate::util::read_text_arg;
use crate::{DacroqError, GlobalOpts, Runnable, CLIENT};
use clap::{Parser, Subcommand};
use dacroq_model::api_v1::PutDocRequest;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct Docs {
    #[clap(subcommand)]
    op: Operations,
}

#[derive(Subcommand, Debug)]
pub enum Operations {
    /// List documentation sections
    List,
    /// Get a section
    Get(Section),
    /// Create or replace a section
    Put(Put),
    /// Delete a section
    Delete(Section),
}

impl Runnable for Docs {
    fn run(&self, opts: &GlobalOpts) -> Result<String, DacroqError> {
        let profile = Profile::load_profile(opts.profile.as_ref())?;
        match &self.op {
            Operations::List => list(&profile),
            Operations::Get(a) => get(&profile, a),
            Operations::Put(a) => put(&profile, a),
            Operations::Delete(a) => delete(&profile, a),
        }
    }
}

fn list(profile: &Profile) -> Result<String, DacroqError> {
    CLIENT
        .get(profile.route_url("v1/docs")?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Section {
    section_id: String,
}

fn get(profile: &Profile, args: &Section) -> Result<String, DacroqError> {
    CLIENT
        .get(profile.route_url_with_id("v1/docs/", &args.section_id)?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Put {
    section_id: String,
    title: String,
    /// Markdown file with the section body (`-` for stdin)
    content: PathBuf,
}

fn put(profile: &Profile, args: &Put) -> Result<String, DacroqError> {
    let item = PutDocRequest {
        title: args.title.clone(),
        content: read_text_arg(&args.content)?,
    };
    CLIENT
        .put(profile.route_url_with_id("v1/docs/", &args.section_id)?)
        .bearer_auth(&profile.token)
        .json(&item)
        .send()?
        .verify_success()?
        .json_pretty()
}

fn delete(profile: &Profile, args: &Section) -> Result<String, DacroqError> {
    CLIENT
        .delete(profile.route_url_with_id("v1/docs/", &args.section_id)?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?;
    Ok(format!("Successfully deleted section {}", args.section_id))
}
