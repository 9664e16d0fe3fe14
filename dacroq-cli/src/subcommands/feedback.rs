use crate::profile::{join_route, Profile};
use crate::response::ResponseExt;
use crate::{DacroqError, GlobalOpts, Runnable, CLIENT};
use clap::{Parser, Subcommand};
use dacroq_model::api_v1::SubmitFeedbackRequest;
use url::Url;

#[derive(Parser, Debug)]
pub struct Feedback {
    #[clap(subcommand)]
    op: Operations,
}

#[derive(Subcommand, Debug)]
pub enum Operations {
    /// Send feedback, no login needed
    Submit(Submit),
    /// List all feedback
    List,
}

impl Runnable for Feedback {
    fn run(&self, opts: &GlobalOpts) -> Result<String, DacroqError> {
        match &self.op {
            Operations::Submit(a) => submit(opts, a),
            Operations::List => list(opts),
        }
    }
}

#[derive(Parser, Debug)]
pub struct Submit {
    /// Kind of feedback, e.g. bug or feature
    kind: String,
    description: String,
    /// Where to reach you
    #[clap(long)]
    email: Option<String>,
    /// Server URL, defaults to the one in the profile
    #[clap(long)]
    url: Option<Url>,
}

fn submit(opts: &GlobalOpts, args: &Submit) -> Result<String, DacroqError> {
    let base = match &args.url {
        Some(url) => url.clone(),
        None => Profile::load_profile(opts.profile.as_ref())?.url,
    };
    CLIENT
        .post(join_route(&base, "v1/feedback")?)
        .json(&SubmitFeedbackRequest {
            kind: args.kind.clone(),
            description: args.description.clone(),
            email: args.email.clone(),
        })
        .send()?
        .verify_success()?
        .json_pretty()
}

fn list(opts: &GlobalOpts) -> Result<String, DacroqError> {
    let profile = Profile::load_profile(opts.profile.as_ref())?;
    CLIENT
        .get(profile.route_url("v1/feedback/all")?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?
        .json_pretty()
}
