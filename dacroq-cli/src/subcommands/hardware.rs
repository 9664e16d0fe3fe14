use crate::profile::Profile;
use crate::response::ResponseExt;
use crate::{DacroqError, GlobalOpts, Runnable, CLIENT};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
pub struct Hardware {
    #[clap(subcommand)]
    op: Operations,
}

#[derive(Subcommand, Debug)]
pub enum Operations {
    /// Show the status reported by the hardware API
    Status,
    /// Reset a chip, e.g. `ldpc`
    Reset(Reset),
}

impl Runnable for Hardware {
    fn run(&self, opts: &GlobalOpts) -> Result<String, DacroqError> {
        let profile = Profile::load_profile(opts.profile.as_ref())?;
        match &self.op {
            Operations::Status => status(&profile),
            Operations::Reset(a) => reset(&profile, a),
        }
    }
}

fn status(profile: &Profile) -> Result<String, DacroqError> {
    CLIENT
        .get(profile.route_url("v1/hardware/status")?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Reset {
    device: String,
}

fn reset(profile: &Profile, args: &Reset) -> Result<String, DacroqError> {
    CLIENT
        .post(profile.route_url_with_id("v1/hardware/reset/", &args.device)?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?
        .json_pretty()
}
