use crate::schema::notifications::dsl as Notifications;
use crate::schema::*;
use chrono::{DateTime, Utc};
use diesel::dsl::not;
use diesel::prelude::*;
use diesel::sql_types::{Array, Integer};

sql_function!(fn array_append(array: Array<Integer>, element: Integer) -> Array<Integer>);

#[derive(Debug, Clone, Queryable, Identifiable, AsChangeset)]
pub struct Notification {
    pub id: i32,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub global: bool,
    pub recipients: Vec<i32>,
    pub read_by: Vec<i32>,
    pub deleted: bool,
    pub created: DateTime<Utc>,
}

impl Notification {
    pub fn visible_to(&self, user_id: i32) -> bool {
        !self.deleted && (self.global || self.recipients.contains(&user_id))
    }

    pub fn read_by(&self, user_id: i32) -> bool {
        self.read_by.contains(&user_id)
    }
}

#[derive(Debug, Insertable)]
#[table_name = "notifications"]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: String,
    pub global: bool,
    pub recipients: Vec<i32>,
}

implement_crud_repository!(
    NotificationRepositoryImpl,
    Notification,
    NewNotification,
    notifications,
    i32
);

pub trait NotificationRepository {
    /// Newest first, excluding soft deleted rows and rows addressed to others.
    fn find_visible_to(&self, user_id: i32) -> QueryResult<Vec<Notification>>;
    fn mark_read(&self, notification: &Notification, user_id: i32) -> QueryResult<usize>;
    fn soft_delete(&self, notification: &Notification) -> QueryResult<usize>;
}

impl NotificationRepository for NotificationRepositoryImpl<'_> {
    fn find_visible_to(&self, user_id: i32) -> QueryResult<Vec<Notification>> {
        Notifications::notifications
            .filter(not(Notifications::deleted))
            .filter(
                Notifications::global
                    .eq(true)
                    .or(Notifications::recipients.contains(vec![user_id])),
            )
            .order(Notifications::created.desc())
            .load(self.connection())
    }

    fn mark_read(&self, notification: &Notification, user_id: i32) -> QueryResult<usize> {
        if notification.read_by(user_id) {
            return Ok(0);
        }
        diesel::update(
            Notifications::notifications
                .filter(Notifications::id.eq(notification.id))
                .filter(not(Notifications::read_by.contains(vec![user_id]))),
        )
        .set(Notifications::read_by.eq(array_append(Notifications::read_by, user_id)))
        .execute(self.connection())
    }

    fn soft_delete(&self, notification: &Notification) -> QueryResult<usize> {
        diesel::update(notification)
            .set(Notifications::deleted.eq(true))
            .execute(self.connection())
    }
}
