use crate::schema::system_flags::dsl as SystemFlags;
use crate::schema::*;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

pub const MAINTENANCE_FLAG: &str = "maintenance";

#[derive(Debug, Queryable, Identifiable, Insertable, AsChangeset)]
#[primary_key(name)]
#[changeset_options(treat_none_as_null = "true")]
pub struct SystemFlag {
    pub name: String,
    pub enabled: bool,
    pub message: Option<String>,
    pub updated: DateTime<Utc>,
}

implement_crud_repository!(
    SystemFlagRepositoryImpl,
    SystemFlag,
    SystemFlag,
    system_flags,
    &str
);

pub trait SystemFlagRepository {
    fn find_all_ordered(&self) -> QueryResult<Vec<SystemFlag>>;
    fn upsert(&self, flag: &SystemFlag) -> QueryResult<SystemFlag>;
    fn is_enabled(&self, name: &str) -> QueryResult<bool>;
}

impl SystemFlagRepository for SystemFlagRepositoryImpl<'_> {
    fn find_all_ordered(&self) -> QueryResult<Vec<SystemFlag>> {
        SystemFlags::system_flags
            .order(SystemFlags::name.asc())
            .load(self.connection())
    }

    fn upsert(&self, flag: &SystemFlag) -> QueryResult<SystemFlag> {
        diesel::insert_into(SystemFlags::system_flags)
            .values(flag)
            .on_conflict(SystemFlags::name)
            .do_update()
            .set(flag)
            .get_result(self.connection())
    }

    fn is_enabled(&self, name: &str) -> QueryResult<bool> {
        Ok(self.find_by_id(name)?.map_or(false, |f| f.enabled))
    }
}
