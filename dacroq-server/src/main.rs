#[macro_use]
extern crate diesel_migrations;
embed_migrations!();
#[macro_use]
extern crate diesel;

mod api;
mod changes;
mod database;
mod monitor;
mod remote;
mod schema;
mod settings;
mod solver;
mod state;

use crate::api::v1::converters::user_summary;
use crate::database::{Connection, NewUser, UserRepositoryImpl};
use crate::settings::Settings;
use actix_extensible_rate_limit::backend::memory::InMemoryBackend;
use actix_web::web::Data;
use actix_web::{middleware, App, HttpServer};
use anyhow::Context;
use clap::{Parser, Subcommand};
use dacroq_model::tests::Role;
use diesel::r2d2::ConnectionManager;
use diesel::{r2d2, PgConnection};
use env_logger::Env;
use state::AppState;

#[derive(Parser)]
#[clap(about, version)]
struct Opts {
    #[clap(subcommand)]
    subcommand: SubCommand,
    /// Config file
    #[clap(long, short)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum SubCommand {
    /// Run the dacroq server
    Server,
    /// Create a new user account
    CreateUser(CreateUser),
}

#[derive(Parser)]
struct CreateUser {
    #[clap(long)]
    name: String,
    #[clap(long)]
    email: String,
    #[clap(long)]
    password: String,
    /// One of user, moderator or admin
    #[clap(long, default_value = "admin")]
    role: String,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let opts: Opts = Opts::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if cfg!(debug_assertions) {
        log::warn!("This is a debug build")
    };
    let settings = Settings::new(opts.config.as_ref())?;

    let manager = ConnectionManager::<PgConnection>::new(&settings.database_url);
    let pool = r2d2::Pool::builder().build(manager)?;
    let connection = pool.get().context("Failed to connect to database")?;
    embedded_migrations::run_with_output(&connection, &mut std::io::stdout())?;

    match opts.subcommand {
        SubCommand::Server => {
            drop(connection);
            let state = AppState::new(&settings, pool)?;
            let rl_backend = InMemoryBackend::builder().build();
            let upload_limit = settings.upload_limit_bytes();
            let monitor = monitor::start(
                state.monitor.clone(),
                state.remote.clone(),
                &settings.monitor,
            );
            let server = HttpServer::new(move || {
                App::new()
                    .app_data(Data::new(state.clone()))
                    .configure(|cfg| api::configure(cfg, &rl_backend, upload_limit))
                    .wrap(middleware::Logger::default())
            })
            .bind(&settings.api_socket)?
            .run();
            tokio::select! {
                result = monitor => result.context("Monitor failed")?,
                result = server => result.context("Http Server failed")?,
            };
        }
        SubCommand::CreateUser(u) => create_user(connection, u)?,
    }
    Ok(())
}

fn create_user(connection: Connection, user: CreateUser) -> anyhow::Result<()> {
    let role: Role = serde_plain::from_str(&user.role).context("Unknown role")?;
    let user_repository = UserRepositoryImpl::new(&connection);
    let created = user_repository
        .insert(&NewUser {
            name: user.name,
            email: user.email.to_ascii_lowercase(),
            password_hash: bcrypt::hash(user.password, bcrypt::DEFAULT_COST)?,
            role: role.to_string(),
            enabled: true,
        })
        .context("Failed to create user")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&user_summary(created, 0))?
    );
    Ok(())
}
