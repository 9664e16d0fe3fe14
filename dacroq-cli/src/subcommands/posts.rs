use super::watch::watch;
use crate::profile::Profile;
use crate::response::ResponseExt;
use crate::util::read_text_arg;
use crate::{DacroqError, GlobalOpts, Runnable, CLIENT};
use clap::{Parser, Subcommand};
use dacroq_model::api_v1::{
    Collection, CreatePostRequest, CreateReplyRequest, ListPostsRequest, PinPostRequest,
    UpdatePostRequest,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct Posts {
    #[clap(subcommand)]
    op: Operations,
}

#[derive(Subcommand, Debug)]
pub enum Operations {
    /// List posts, pinned first
    List(List),
    /// Create a new post
    Create(Create),
    /// Get a post by id
    Get(Get),
    /// Edit a post or mark it answered
    Update(Update),
    /// Delete a post and its replies
    Delete(Delete),
    /// Pin or unpin a post
    Pin(Pin),
    /// List replies to a post
    Replies(Replies),
    /// Reply to a post
    Reply(Reply),
    /// Delete a reply
    DeleteReply(DeleteReply),
    /// Print post changes as they happen
    Watch(Watch),
}

impl Runnable for Posts {
    fn run(&self, opts: &GlobalOpts) -> Result<String, DacroqError> {
        let profile = Profile::load_profile(opts.profile.as_ref())?;
        match &self.op {
            Operations::List(a) => list(opts, &profile, a),
            Operations::Create(a) => create(&profile, a),
            Operations::Get(a) => get(&profile, a),
            Operations::Update(a) => update(&profile, a),
            Operations::Delete(a) => delete(&profile, a),
            Operations::Pin(a) => pin(&profile, a),
            Operations::Replies(a) => replies(&profile, a),
            Operations::Reply(a) => reply(&profile, a),
            Operations::DeleteReply(a) => delete_reply(&profile, a),
            Operations::Watch(a) => watch(&profile, Collection::Posts, a.once),
        }
    }
}

#[derive(Parser, Debug)]
pub struct List {
    /// Page number
    page: Option<u32>,
}

fn list(opts: &GlobalOpts, profile: &Profile, args: &List) -> Result<String, DacroqError> {
    CLIENT
        .get(profile.route_url("v1/posts")?)
        .bearer_auth(&profile.token)
        .query(&ListPostsRequest {
            limit: opts.page_size,
            offset: opts.get_offset(args.page)?,
        })
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Create {
    title: String,
    /// File holding the post body (`-` for stdin)
    content: PathBuf,
}

fn create(profile: &Profile, args: &Create) -> Result<String, DacroqError> {
    let item = CreatePostRequest {
        title: args.title.clone(),
        content: read_text_arg(&args.content)?,
    };
    CLIENT
        .post(profile.route_url("v1/posts")?)
        .bearer_auth(&profile.token)
        .json(&item)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Get {
    /// ID of post to get
    id: i32,
}

fn get(profile: &Profile, args: &Get) -> Result<String, DacroqError> {
    CLIENT
        .get(profile.route_url_with_id("v1/posts/", &args.id)?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Update {
    /// ID of post to update
    id: i32,
    #[clap(long)]
    title: Option<String>,
    /// File holding the new body (`-` for stdin)
    #[clap(long)]
    content: Option<PathBuf>,
    #[clap(long)]
    answered: Option<bool>,
}

fn update(profile: &Profile, args: &Update) -> Result<String, DacroqError> {
    let content = match &args.content {
        Some(path) => Some(read_text_arg(path)?),
        None => None,
    };
    let item = UpdatePostRequest {
        title: args.title.clone(),
        content,
        answered: args.answered,
    };
    CLIENT
        .put(profile.route_url_with_id("v1/posts/", &args.id)?)
        .bearer_auth(&profile.token)
        .json(&item)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Delete {
    /// ID of post to delete
    id: i32,
}

fn delete(profile: &Profile, args: &Delete) -> Result<String, DacroqError> {
    CLIENT
        .delete(profile.route_url_with_id("v1/posts/", &args.id)?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?;
    Ok(format!("Successfully deleted post {}", args.id))
}

#[derive(Parser, Debug)]
pub struct Pin {
    /// ID of post to pin
    id: i32,
    /// Unpin instead
    #[clap(long)]
    unpin: bool,
}

fn pin(profile: &Profile, args: &Pin) -> Result<String, DacroqError> {
    CLIENT
        .put(profile.route_url_with_id_and("v1/posts/", &args.id, "pin")?)
        .bearer_auth(&profile.token)
        .json(&PinPostRequest {
            pinned: !args.unpin,
        })
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Replies {
    /// ID of the post
    post_id: i32,
}

fn replies(profile: &Profile, args: &Replies) -> Result<String, DacroqError> {
    CLIENT
        .get(profile.route_url_with_id_and("v1/posts/", &args.post_id, "replies")?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Reply {
    /// ID of the post
    post_id: i32,
    /// File holding the reply (`-` for stdin)
    content: PathBuf,
}

fn reply(profile: &Profile, args: &Reply) -> Result<String, DacroqError> {
    let item = CreateReplyRequest {
        content: read_text_arg(&args.content)?,
    };
    CLIENT
        .post(profile.route_url_with_id_and("v1/posts/", &args.post_id, "replies")?)
        .bearer_auth(&profile.token)
        .json(&item)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct DeleteReply {
    /// ID of the post
    post_id: i32,
    /// ID of the reply
    reply_id: i32,
}

fn delete_reply(profile: &Profile, args: &DeleteReply) -> Result<String, DacroqError> {
    let path = format!("replies/{}", args.reply_id);
    CLIENT
        .delete(profile.route_url_with_id_and("v1/posts/", &args.post_id, &path)?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?;
    Ok(format!("Successfully deleted reply {}", args.reply_id))
}

#[derive(Parser, Debug)]
pub struct Watch {
    /// Exit after the first batch of changes
    #[clap(long)]
    once: bool,
}
