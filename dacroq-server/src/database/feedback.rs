use crate::schema::feedback::dsl as Feedback;
use crate::schema::*;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

pub const FEEDBACK_STATUS_NEW: &str = "new";

#[derive(Debug, Queryable, Identifiable, AsChangeset)]
#[table_name = "feedback"]
#[changeset_options(treat_none_as_null = "true")]
pub struct FeedbackEntry {
    pub id: i32,
    pub kind: String,
    pub description: String,
    pub email: Option<String>,
    pub status: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[table_name = "feedback"]
pub struct NewFeedbackEntry {
    pub kind: String,
    pub description: String,
    pub email: Option<String>,
    pub status: String,
}

implement_crud_repository!(
    FeedbackRepositoryImpl,
    FeedbackEntry,
    NewFeedbackEntry,
    feedback,
    i32
);

pub trait FeedbackRepository {
    fn find_newest(&self) -> QueryResult<Vec<FeedbackEntry>>;
}

impl FeedbackRepository for FeedbackRepositoryImpl<'_> {
    fn find_newest(&self) -> QueryResult<Vec<FeedbackEntry>> {
        Feedback::feedback
            .order(Feedback::created.desc())
            .load(self.connection())
    }
}
