use crate::changes::ChangeFeed;
use crate::monitor::Monitor;
use crate::remote::RemoteApi;
use crate::settings::Settings;
use diesel::r2d2::ConnectionManager;
use diesel::{r2d2, PgConnection};

pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct AppState {
    database: Pool,
    pub remote: RemoteApi,
    pub monitor: Monitor,
    pub changes: ChangeFeed,
    pub upload_limit: usize,
}

impl AppState {
    pub fn new(settings: &Settings, database: Pool) -> anyhow::Result<Self> {
        Ok(Self {
            database,
            remote: RemoteApi::new(&settings.remote)?,
            monitor: Monitor::new(settings.monitor.metrics_window),
            changes: ChangeFeed::default(),
            upload_limit: settings.upload_limit_bytes(),
        })
    }

    /// Blocks until a connection is free. Only call from blocking contexts.
    pub fn database(&self) -> Result<crate::database::Connection, r2d2::PoolError> {
        self.database.get()
    }

    pub fn pool(&self) -> Pool {
        self.database.clone()
    }
}
