use crate::profile::Profile;
use crate::response::ResponseExt;
use crate::{DacroqError, GlobalOpts, Runnable, CLIENT};
use clap::{Parser, Subcommand};
use dacroq_model::api_v1::SetSystemFlagRequest;

#[derive(Parser, Debug)]
pub struct System {
    #[clap(subcommand)]
    op: Operations,
}

#[derive(Subcommand, Debug)]
pub enum Operations {
    /// List system flags
    List,
    /// Turn a flag on or off, e.g. `maintenance`
    Set(Set),
}

impl Runnable for System {
    fn run(&self, opts: &GlobalOpts) -> Result<String, DacroqError> {
        let profile = Profile::load_profile(opts.profile.as_ref())?;
        match &self.op {
            Operations::List => list(&profile),
            Operations::Set(a) => set(&profile, a),
        }
    }
}

fn list(profile: &Profile) -> Result<String, DacroqError> {
    CLIENT
        .get(profile.route_url("v1/system")?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Set {
    name: String,
    enabled: bool,
    /// Message shown to users while the flag is on
    #[clap(long)]
    message: Option<String>,
}

fn set(profile: &Profile, args: &Set) -> Result<String, DacroqError> {
    CLIENT
        .put(profile.route_url_with_id("v1/system/", &args.name)?)
        .bearer_auth(&profile.token)
        .json(&SetSystemFlagRequest {
            enabled: args.enabled,
            message: args.message.clone(),
        })
        .send()?
        .verify_success()?
        .json_pretty()
}
