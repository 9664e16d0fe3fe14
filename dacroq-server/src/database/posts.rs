use crate::database::page;
use crate::schema::posts::dsl as Posts;
use crate::schema::replies::dsl as Replies;
use crate::schema::*;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[derive(Debug, Queryable, Identifiable, AsChangeset)]
#[changeset_options(treat_none_as_null = "true")]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author_id: Option<i32>,
    pub author: serde_json::Value,
    pub created: DateTime<Utc>,
    pub views: i32,
    pub reply_count: i32,
    pub pinned: bool,
    pub answered: bool,
}

#[derive(Debug, Insertable)]
#[table_name = "posts"]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_id: Option<i32>,
    pub author: serde_json::Value,
}

/// Author editable columns. `None` leaves the column untouched, and the
/// counters are never part of the statement.
#[derive(Debug, Default, AsChangeset)]
#[table_name = "posts"]
pub struct PostEdit {
    pub title: Option<String>,
    pub content: Option<String>,
    pub answered: Option<bool>,
}

impl PostEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.answered.is_none()
    }
}

#[derive(Debug, Queryable, Identifiable, Associations, AsChangeset)]
#[belongs_to(Post)]
#[table_name = "replies"]
#[changeset_options(treat_none_as_null = "true")]
pub struct Reply {
    pub id: i32,
    pub post_id: i32,
    pub content: String,
    pub author_id: Option<i32>,
    pub author: serde_json::Value,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[table_name = "replies"]
pub struct NewReply {
    pub post_id: i32,
    pub content: String,
    pub author_id: Option<i32>,
    pub author: serde_json::Value,
}

implement_crud_repository!(PostRepositoryImpl, Post, NewPost, posts, i32);
implement_crud_repository!(ReplyRepositoryImpl, Reply, NewReply, replies, i32);

pub struct PostPage {
    pub results: Vec<Post>,
    pub count: i64,
}

pub trait PostRepository {
    /// Pinned posts first, then newest first.
    fn find_page(&self, limit: u32, offset: u32) -> QueryResult<PostPage>;
    /// Bumps the view counter and returns the updated post.
    fn record_view(&self, id: i32) -> QueryResult<Option<Post>>;
    /// Writes only the edited columns and returns the stored row.
    fn apply_edit(&self, post: &Post, edit: &PostEdit) -> QueryResult<Post>;
    fn set_pinned(&self, post: &Post, pinned: bool) -> QueryResult<Post>;
    /// Removes the post and all of its replies.
    fn delete_with_replies(&self, post: &Post) -> QueryResult<()>;
}

impl PostRepository for PostRepositoryImpl<'_> {
    fn find_page(&self, limit: u32, offset: u32) -> QueryResult<PostPage> {
        let (limit, offset) = page(limit, offset);
        let count = Posts::posts.count().get_result(self.connection())?;
        let results = Posts::posts
            .order((Posts::pinned.desc(), Posts::created.desc()))
            .limit(limit)
            .offset(offset)
            .load(self.connection())?;
        Ok(PostPage { results, count })
    }

    fn record_view(&self, id: i32) -> QueryResult<Option<Post>> {
        diesel::update(Posts::posts.find(id))
            .set(Posts::views.eq(Posts::views + 1))
            .get_result(self.connection())
            .optional()
    }

    fn apply_edit(&self, post: &Post, edit: &PostEdit) -> QueryResult<Post> {
        if edit.is_empty() {
            return Posts::posts.find(post.id).first(self.connection());
        }
        diesel::update(post)
            .set(edit)
            .get_result(self.connection())
    }

    fn set_pinned(&self, post: &Post, pinned: bool) -> QueryResult<Post> {
        diesel::update(post)
            .set(Posts::pinned.eq(pinned))
            .get_result(self.connection())
    }

    fn delete_with_replies(&self, post: &Post) -> QueryResult<()> {
        self.connection().transaction(|| {
            diesel::delete(Reply::belonging_to(post)).execute(self.connection())?;
            diesel::delete(post).execute(self.connection())?;
            Ok(())
        })
    }
}

pub trait ReplyRepository {
    fn find_all_belonging_to(&self, post: &Post) -> QueryResult<Vec<Reply>>;
    fn find_belonging_to(&self, post: &Post, reply_id: i32) -> QueryResult<Option<Reply>>;
    /// Inserts the reply and increments the post's reply counter.
    fn insert_counted(&self, post: &Post, new: &NewReply) -> QueryResult<Reply>;
    /// Deletes the reply and decrements the post's reply counter.
    fn delete_counted(&self, post: &Post, reply: &Reply) -> QueryResult<()>;
}

impl ReplyRepository for ReplyRepositoryImpl<'_> {
    fn find_all_belonging_to(&self, post: &Post) -> QueryResult<Vec<Reply>> {
        Reply::belonging_to(post)
            .order(Replies::created.asc())
            .load(self.connection())
    }

    fn find_belonging_to(&self, post: &Post, reply_id: i32) -> QueryResult<Option<Reply>> {
        Reply::belonging_to(post)
            .filter(Replies::id.eq(reply_id))
            .first(self.connection())
            .optional()
    }

    fn insert_counted(&self, post: &Post, new: &NewReply) -> QueryResult<Reply> {
        self.connection().transaction(|| {
            let reply = self.insert(new)?;
            diesel::update(post)
                .set(Posts::reply_count.eq(Posts::reply_count + 1))
                .execute(self.connection())?;
            Ok(reply)
        })
    }

    fn delete_counted(&self, post: &Post, reply: &Reply) -> QueryResult<()> {
        self.connection().transaction(|| {
            diesel::delete(reply).execute(self.connection())?;
            diesel::update(post)
                .filter(Posts::reply_count.gt(0))
                .set(Posts::reply_count.eq(Posts::reply_count - 1))
                .execute(self.connection())?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::debug_query;
    use diesel::pg::Pg;

    #[test]
    fn edit_only_writes_supplied_columns() {
        let edit = PostEdit {
            title: Some("Timing jitter on the 3-SAT chip".into()),
            answered: Some(true),
            ..PostEdit::default()
        };
        let statement = diesel::update(Posts::posts.find(7)).set(&edit);
        let sql = debug_query::<Pg, _>(&statement).to_string();
        assert!(sql.contains("\"title\""));
        assert!(sql.contains("\"answered\""));
        assert!(!sql.contains("\"content\""));
        assert!(!sql.contains("views"));
        assert!(!sql.contains("reply_count"));
    }

    #[test]
    fn empty_edit_is_detected() {
        assert!(PostEdit::default().is_empty());
        let edit = PostEdit {
            content: Some("Updated".into()),
            ..PostEdit::default()
        };
        assert!(!edit.is_empty());
    }
}
