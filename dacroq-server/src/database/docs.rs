use crate::schema::docs::dsl as Docs;
use crate::schema::*;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[derive(Debug, Queryable, Identifiable, Insertable, AsChangeset)]
#[primary_key(section_id)]
pub struct Doc {
    pub section_id: String,
    pub title: String,
    pub content: String,
    pub updated: DateTime<Utc>,
}

implement_crud_repository!(DocRepositoryImpl, Doc, Doc, docs, &str);

pub trait DocRepository {
    fn find_all_ordered(&self) -> QueryResult<Vec<Doc>>;
    fn upsert(&self, doc: &Doc) -> QueryResult<Doc>;
}

impl DocRepository for DocRepositoryImpl<'_> {
    fn find_all_ordered(&self) -> QueryResult<Vec<Doc>> {
        Docs::docs.order(Docs::section_id.asc()).load(self.connection())
    }

    fn upsert(&self, doc: &Doc) -> QueryResult<Doc> {
        diesel::insert_into(Docs::docs)
            .values(doc)
            .on_conflict(Docs::section_id)
            .do_update()
            .set(doc)
            .get_result(self.connection())
    }
}
