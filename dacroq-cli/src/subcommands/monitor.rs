use crate::profile::Profile;
use crate::response::{to_pretty, ResponseExt};
use crate::{DacroqError, GlobalOpts, Runnable, CLIENT};
use clap::{Parser, Subcommand};
use dacroq_model::api_v1::MonitorSnapshot;
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
pub struct Monitor {
    #[clap(subcommand)]
    op: Operations,
}

#[derive(Subcommand, Debug)]
pub enum Operations {
    /// Show the latest health check and metric samples
    Show,
    /// Print a health line every few seconds
    Watch(Watch),
}

impl Runnable for Monitor {
    fn run(&self, opts: &GlobalOpts) -> Result<String, DacroqError> {
        let profile = Profile::load_profile(opts.profile.as_ref())?;
        match &self.op {
            Operations::Show => to_pretty(&fetch(&profile)?),
            Operations::Watch(a) => watch(&profile, a),
        }
    }
}

fn fetch(profile: &Profile) -> Result<MonitorSnapshot, DacroqError> {
    CLIENT
        .get(profile.route_url("v1/monitor")?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?
        .json_typed()
}

fn status_line(snapshot: &MonitorSnapshot) -> String {
    let checked = snapshot
        .health
        .checked
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    let state = if snapshot.health.online {
        "online"
    } else {
        "offline"
    };
    let mut line = format!(
        "{} (checked {}, {} metric samples)",
        state,
        checked,
        snapshot.metrics.len()
    );
    if let Some(error) = &snapshot.health.last_error {
        line.push_str(&format!(" error: {}", error));
    }
    line
}

#[derive(Parser, Debug)]
pub struct Watch {
    /// Seconds between polls
    #[clap(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..=30))]
    interval: u64,
    /// Stop after this many polls
    #[clap(long)]
    count: Option<u32>,
}

fn watch(profile: &Profile, args: &Watch) -> Result<String, DacroqError> {
    let mut polls = 0;
    loop {
        println!("{}", status_line(&fetch(profile)?));
        polls += 1;
        if args.count.map_or(false, |count| polls >= count) {
            return Ok(format!("Polled {} time(s)", polls));
        }
        thread::sleep(Duration::from_secs(args.interval));
    }
}
