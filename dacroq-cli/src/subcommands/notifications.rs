use crate::profile::Profile;
use crate::response::ResponseExt;
use crate::util::parse_plain;
use crate::{DacroqError, GlobalOpts, Runnable, CLIENT};
use clap::{Parser, Subcommand};
use dacroq_model::api_v1::{CreateNotificationRequest, NotificationKind};

#[derive(Parser, Debug)]
pub struct Notifications {
    #[clap(subcommand)]
    op: Operations,
}

#[derive(Subcommand, Debug)]
pub enum Operations {
    /// List notifications addressed to you
    List,
    /// Send a notification
    Create(Create),
    /// Mark a notification as read
    Read(Id),
    /// Delete a notification for everyone
    Delete(Id),
}

impl Runnable for Notifications {
    fn run(&self, opts: &GlobalOpts) -> Result<String, DacroqError> {
        let profile = Profile::load_profile(opts.profile.as_ref())?;
        match &self.op {
            Operations::List => list(&profile),
            Operations::Create(a) => create(&profile, a),
            Operations::Read(a) => read(&profile, a),
            Operations::Delete(a) => delete(&profile, a),
        }
    }
}

fn list(profile: &Profile) -> Result<String, DacroqError> {
    CLIENT
        .get(profile.route_url("v1/notifications")?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Create {
    title: String,
    message: String,
    /// One of system, alert, update, info
    #[clap(long, default_value = "info", value_parser = parse_plain::<NotificationKind>)]
    kind: NotificationKind,
    /// Recipient user id, repeat for several. Omit to notify everyone
    #[clap(long = "to")]
    recipients: Vec<i32>,
}

fn create(profile: &Profile, args: &Create) -> Result<String, DacroqError> {
    let item = CreateNotificationRequest {
        title: args.title.clone(),
        message: args.message.clone(),
        kind: args.kind,
        recipients: args.recipients.clone(),
    };
    CLIENT
        .post(profile.route_url("v1/notifications")?)
        .bearer_auth(&profile.token)
        .json(&item)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Id {
    /// ID of the notification
    id: i32,
}

fn read(profile: &Profile, args: &Id) -> Result<String, DacroqError> {
    CLIENT
        .post(profile.route_url_with_id_and("v1/notifications/", &args.id, "read")?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?;
    Ok(format!("Marked notification {} as read", args.id))
}

fn delete(profile: &Profile, args: &Id) -> Result<String, DacroqError> {
    CLIENT
        .delete(profile.route_url_with_id("v1/notifications/", &args.id)?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?;
    Ok(format!("Successfully deleted notification {}", args.id))
}
