use crate::database::page;
use crate::schema::sat_results::dsl as SatResults;
use crate::schema::*;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[derive(Debug, Queryable, Identifiable)]
pub struct SatResult {
    pub id: i32,
    pub batch_id: String,
    pub problem_id: String,
    pub source: String,
    pub variables: i32,
    pub clauses: i32,
    pub solver: String,
    pub solved: bool,
    pub satisfiable: Option<bool>,
    pub time_ms: f64,
    pub energy_nj: Option<f64>,
    pub created: DateTime<Utc>,
    pub created_by: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[table_name = "sat_results"]
pub struct NewSatResult {
    pub batch_id: String,
    pub problem_id: String,
    pub source: String,
    pub variables: i32,
    pub clauses: i32,
    pub solver: String,
    pub solved: bool,
    pub satisfiable: Option<bool>,
    pub time_ms: f64,
    pub energy_nj: Option<f64>,
    pub created_by: Option<i32>,
}

/// Rows per INSERT statement. Postgres caps a statement at 65535 bind
/// parameters and every row binds one per inserted column.
pub const INSERT_CHUNK: usize = 1000;

pub struct SatResultPage {
    pub results: Vec<SatResult>,
    pub count: i64,
}

pub trait SatResultRepository {
    fn insert_all(&self, rows: &[NewSatResult]) -> QueryResult<usize>;
    fn find_page(&self, limit: u32, offset: u32, batch_id: Option<&str>)
        -> QueryResult<SatResultPage>;
}

pub struct SatResultRepositoryImpl<'c> {
    connection: &'c crate::database::Connection,
}

impl<'c> SatResultRepositoryImpl<'c> {
    pub fn new(connection: &'c crate::database::Connection) -> Self {
        Self { connection }
    }

    fn connection(&self) -> &PgConnection {
        &**self.connection
    }
}

impl SatResultRepository for SatResultRepositoryImpl<'_> {
    fn insert_all(&self, rows: &[NewSatResult]) -> QueryResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        self.connection().transaction(|| {
            let mut inserted = 0;
            for chunk in rows.chunks(INSERT_CHUNK) {
                inserted += diesel::insert_into(SatResults::sat_results)
                    .values(chunk)
                    .execute(self.connection())?;
            }
            Ok(inserted)
        })
    }

    fn find_page(
        &self,
        limit: u32,
        offset: u32,
        batch_id: Option<&str>,
    ) -> QueryResult<SatResultPage> {
        let (limit, offset) = page(limit, offset);
        let filtered = || {
            let mut query = SatResults::sat_results.into_boxed();
            if let Some(batch_id) = batch_id {
                query = query.filter(SatResults::batch_id.eq(batch_id));
            }
            query
        };
        let count = filtered().count().get_result(self.connection())?;
        let results = filtered()
            .order(SatResults::id.desc())
            .limit(limit)
            .offset(offset)
            .load(self.connection())?;
        Ok(SatResultPage { results, count })
    }
}
