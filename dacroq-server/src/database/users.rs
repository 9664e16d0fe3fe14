use crate::database::page;
use crate::schema::tests::dsl as Tests;
use crate::schema::users;
use crate::schema::users::dsl as Users;
use chrono::{DateTime, Utc};
use dacroq_model::tests::{IdentitySnapshot, Role};
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Identifiable, AsChangeset)]
#[table_name = "users"]
#[changeset_options(treat_none_as_null = "true")]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub enabled: bool,
    pub created: DateTime<Utc>,
    pub last_online: Option<DateTime<Utc>>,
}

impl User {
    /// Unknown role strings are treated as the least privileged role.
    pub fn role(&self) -> Role {
        serde_plain::from_str(&self.role).unwrap_or_else(|_| {
            log::warn!("User {} has unknown role {:?}", self.id, self.role);
            Role::User
        })
    }

    pub fn snapshot(&self) -> IdentitySnapshot {
        IdentitySnapshot {
            uid: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role(),
            avatar: None,
        }
    }
}

#[derive(Debug, Insertable)]
#[table_name = "users"]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub enabled: bool,
}

implement_crud_repository!(UserRepositoryImpl, User, NewUser, users, i32);

pub struct UserPage {
    pub results: Vec<(User, i64)>,
    pub count: i64,
}

pub trait UserRepository {
    fn find_page(&self, limit: u32, offset: u32, search: Option<&str>) -> QueryResult<UserPage>;
    fn find_by_email(&self, email: &str) -> QueryResult<Option<User>>;
    fn count_tests(&self, user: &User) -> QueryResult<i64>;
    fn touch_last_online(&self, user: &User, time: DateTime<Utc>) -> QueryResult<usize>;
}

impl UserRepository for UserRepositoryImpl<'_> {
    fn find_page(&self, limit: u32, offset: u32, search: Option<&str>) -> QueryResult<UserPage> {
        let (limit, offset) = page(limit, offset);
        let filtered = || {
            let mut query = Users::users.into_boxed();
            if let Some(search) = search {
                let like = format!("%{}%", search);
                query = query.filter(Users::name.ilike(like.clone()).or(Users::email.ilike(like)));
            }
            query
        };
        let count = filtered().count().get_result(self.connection())?;
        let users = filtered()
            .order(Users::id.asc())
            .limit(limit)
            .offset(offset)
            .load::<User>(self.connection())?;
        let results = users
            .into_iter()
            .map(|user| {
                let tests = self.count_tests(&user)?;
                Ok((user, tests))
            })
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(UserPage { results, count })
    }

    fn find_by_email(&self, email: &str) -> QueryResult<Option<User>> {
        Users::users
            .filter(Users::email.eq(email.to_ascii_lowercase()))
            .first::<User>(self.connection())
            .optional()
    }

    fn count_tests(&self, user: &User) -> QueryResult<i64> {
        Tests::tests
            .filter(Tests::created_by.eq(user.id))
            .count()
            .get_result(self.connection())
    }

    fn touch_last_online(&self, user: &User, time: DateTime<Utc>) -> QueryResult<usize> {
        diesel::update(user)
            .set(Users::last_online.eq(time))
            .execute(self.connection())
    }
}
