use crate::profile::Profile;
use crate::response::ResponseExt;
use crate::util::{parse_plain, read_password};
use crate::{ClientError, DacroqError, GlobalOpts, Runnable, CLIENT};
use clap::{Parser, Subcommand};
use dacroq_model::api_v1::{CreateUserRequest, ListUsersRequest, UpdateUserRequest};
use dacroq_model::tests::Role;

#[derive(Parser, Debug)]
pub struct Users {
    #[clap(subcommand)]
    op: Operations,
}

#[derive(Subcommand, Debug)]
pub enum Operations {
    /// List user accounts
    List(List),
    /// Create a new user account
    Create(Create),
    /// Get a user by id
    Get(Get),
    /// Delete a user by id
    Delete(Delete),
    /// Update a user by id
    Update(Update),
}

impl Runnable for Users {
    fn run(&self, opts: &GlobalOpts) -> Result<String, DacroqError> {
        let profile = Profile::load_profile(opts.profile.as_ref())?;
        match &self.op {
            Operations::List(l) => list(opts, &profile, l),
            Operations::Create(c) => create(opts, &profile, c),
            Operations::Get(g) => get(opts, &profile, g),
            Operations::Delete(d) => delete(opts, &profile, d),
            Operations::Update(u) => update(opts, &profile, u),
        }
    }
}

#[derive(Parser, Debug)]
pub struct List {
    /// Page number
    page: Option<u32>,
    /// Match against name or email
    #[clap(long)]
    search: Option<String>,
}

fn list(opts: &GlobalOpts, profile: &Profile, args: &List) -> Result<String, DacroqError> {
    CLIENT
        .get(profile.route_url("v1/users")?)
        .bearer_auth(&profile.token)
        .query(&ListUsersRequest {
            limit: opts.page_size,
            offset: opts.get_offset(args.page)?,
            search: args.search.clone(),
        })
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Create {
    name: String,
    email: String,
    /// One of user, moderator, admin
    #[clap(long, default_value = "user", value_parser = parse_plain::<Role>)]
    role: Role,
    /// Provide the password via stdin
    #[clap(long)]
    password_stdin: bool,
}

fn create(_: &GlobalOpts, profile: &Profile, args: &Create) -> Result<String, DacroqError> {
    let item = CreateUserRequest {
        name: args.name.clone(),
        email: args.email.clone(),
        password: read_password(args.password_stdin)?,
        role: args.role,
    };
    CLIENT
        .post(profile.route_url("v1/users")?)
        .bearer_auth(&profile.token)
        .json(&item)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Get {
    /// ID of user to get, or `self`
    id: String,
}

fn get(_: &GlobalOpts, profile: &Profile, args: &Get) -> Result<String, DacroqError> {
    let id = resolve_user_id(&args.id, profile)?;
    CLIENT
        .get(profile.route_url_with_id("v1/users/", &id)?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Update {
    /// ID of user to update, or `self`
    id: String,
    #[clap(long)]
    name: Option<String>,
    #[clap(long)]
    email: Option<String>,
    /// Prompt for a new password
    #[clap(long)]
    password: bool,
    /// Read the new password from stdin
    #[clap(long)]
    password_stdin: bool,
    #[clap(long, value_parser = parse_plain::<Role>)]
    role: Option<Role>,
    #[clap(long)]
    enabled: Option<bool>,
}

fn update(_: &GlobalOpts, profile: &Profile, args: &Update) -> Result<String, DacroqError> {
    let id = resolve_user_id(&args.id, profile)?;
    let password = if args.password || args.password_stdin {
        Some(read_password(args.password_stdin)?)
    } else {
        None
    };
    let item = UpdateUserRequest {
        name: args.name.clone(),
        email: args.email.clone(),
        password,
        role: args.role,
        enabled: args.enabled,
    };
    CLIENT
        .put(profile.route_url_with_id("v1/users/", &id)?)
        .bearer_auth(&profile.token)
        .json(&item)
        .send()?
        .verify_success()?
        .json_pretty()
}

#[derive(Parser, Debug)]
pub struct Delete {
    /// ID of user to delete
    id: String,
}

fn delete(_: &GlobalOpts, profile: &Profile, args: &Delete) -> Result<String, DacroqError> {
    let id = resolve_user_id(&args.id, profile)?;
    CLIENT
        .delete(profile.route_url_with_id("v1/users/", &id)?)
        .bearer_auth(&profile.token)
        .send()?
        .verify_success()?;
    Ok(format!("Successfully deleted user {}", args.id))
}

fn resolve_user_id(input: &str, profile: &Profile) -> Result<i32, ClientError> {
    if input.eq_ignore_ascii_case("self") {
        return Ok(profile.user.id);
    }
    input.parse().map_err(|_| ClientError::InvalidUserId)
}
