use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::PgConnection;

pub type Connection = PooledConnection<ConnectionManager<PgConnection>>;

/// Generates a repository struct borrowing a pooled connection, with the
/// basic create / read / update / delete queries for one table.
macro_rules! implement_crud_repository {
    ($repository:ident, $model:ty, $new_model:ty, $table:ident, $key:ty) => {
        pub struct $repository<'c> {
            connection: &'c crate::database::Connection,
        }

        #[allow(dead_code)]
        impl<'c> $repository<'c> {
            pub fn new(connection: &'c crate::database::Connection) -> Self {
                Self { connection }
            }

            pub fn connection(&self) -> &diesel::PgConnection {
                &**self.connection
            }

            pub fn insert(&self, new: &$new_model) -> diesel::QueryResult<$model> {
                use diesel::prelude::*;
                diesel::insert_into(crate::schema::$table::table)
                    .values(new)
                    .get_result(self.connection())
            }

            pub fn find_by_id(&self, id: $key) -> diesel::QueryResult<Option<$model>> {
                use diesel::prelude::*;
                crate::schema::$table::table
                    .find(id)
                    .first(self.connection())
                    .optional()
            }

            pub fn find_all(&self) -> diesel::QueryResult<Vec<$model>> {
                use diesel::prelude::*;
                crate::schema::$table::table.load(self.connection())
            }

            pub fn update(&self, model: &$model) -> diesel::QueryResult<usize> {
                use diesel::prelude::*;
                diesel::update(model).set(model).execute(self.connection())
            }

            pub fn delete(&self, model: &$model) -> diesel::QueryResult<usize> {
                use diesel::prelude::*;
                diesel::delete(model).execute(self.connection())
            }
        }
    };
}

mod docs;
mod feedback;
mod notifications;
mod posts;
mod sat_results;
mod sessions;
mod system_flags;
mod tests;
mod users;

pub use docs::*;
pub use feedback::*;
pub use notifications::*;
pub use posts::*;
pub use sat_results::*;
pub use sessions::*;
pub use system_flags::*;
pub use tests::*;
pub use users::*;

/// Converts API paging arguments to the `i64` diesel expects.
pub fn page(limit: u32, offset: u32) -> (i64, i64) {
    (limit as i64, offset as i64)
}
