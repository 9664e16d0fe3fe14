use crate::database::page;
use crate::schema::tests::dsl as Tests;
use crate::schema::*;
use chrono::{DateTime, Utc};
use dacroq_model::tests::{ChipType, TestStatus};
use diesel::prelude::*;

#[derive(Queryable, Debug, Identifiable, AsChangeset)]
#[changeset_options(treat_none_as_null = "true")]
pub struct Test {
    pub id: i32,
    pub name: String,
    pub chip_type: String,
    pub status: String,
    pub created: DateTime<Utc>,
    pub completed: Option<DateTime<Utc>>,
    pub results: Option<serde_json::Value>,
    pub created_by: Option<i32>,
    pub creator: serde_json::Value,
}

impl Test {
    /// Moves the run to a new status, stamping or clearing the completion
    /// time as the status enters or leaves a terminal state.
    pub fn set_status(&mut self, status: TestStatus, now: DateTime<Utc>) {
        self.status = status.to_string();
        if status.is_terminal() {
            if self.completed.is_none() {
                self.completed = Some(now);
            }
        } else {
            self.completed = None;
        }
    }

    /// Resets the run so the remote runner picks it up again.
    pub fn rerun(&mut self) {
        self.status = TestStatus::Queued.to_string();
        self.completed = None;
        self.results = None;
    }
}

#[derive(Debug, Insertable)]
#[table_name = "tests"]
pub struct NewTest {
    pub name: String,
    pub chip_type: String,
    pub status: String,
    pub results: Option<serde_json::Value>,
    pub created_by: Option<i32>,
    pub creator: serde_json::Value,
}

implement_crud_repository!(TestRepositoryImpl, Test, NewTest, tests, i32);

pub struct TestPage {
    pub results: Vec<Test>,
    pub count: i64,
}

pub trait TestRepository {
    fn find_page(
        &self,
        limit: u32,
        offset: u32,
        status: Option<TestStatus>,
        chip_type: Option<ChipType>,
    ) -> QueryResult<TestPage>;
}

impl TestRepository for TestRepositoryImpl<'_> {
    fn find_page(
        &self,
        limit: u32,
        offset: u32,
        status: Option<TestStatus>,
        chip_type: Option<ChipType>,
    ) -> QueryResult<TestPage> {
        let (limit, offset) = page(limit, offset);
        let filtered = || {
            let mut query = Tests::tests.into_boxed();
            if let Some(status) = status {
                query = query.filter(Tests::status.eq(status.to_string()));
            }
            if let Some(chip_type) = chip_type {
                query = query.filter(Tests::chip_type.eq(chip_type.to_string()));
            }
            query
        };
        let count = filtered().count().get_result(self.connection())?;
        let results = filtered()
            .order(Tests::created.desc())
            .limit(limit)
            .offset(offset)
            .load(self.connection())?;
        Ok(TestPage { results, count })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Duration;

    fn test_run() -> Test {
        Test {
            id: 1,
            name: "batch 7".into(),
            chip_type: ChipType::ThreeSat.to_string(),
            status: TestStatus::Running.to_string(),
            created: Utc::now(),
            completed: None,
            results: None,
            created_by: Some(3),
            creator: serde_json::json!({}),
        }
    }

    #[test]
    fn terminal_status_stamps_completion_once() {
        let mut test = test_run();
        let first = Utc::now();
        test.set_status(TestStatus::Completed, first);
        assert_eq!(test.completed, Some(first));
        test.set_status(TestStatus::Failed, first + Duration::seconds(5));
        assert_eq!(test.completed, Some(first));
        assert_eq!(test.status, "failed");
    }

    #[test]
    fn non_terminal_status_clears_completion() {
        let mut test = test_run();
        test.set_status(TestStatus::Error, Utc::now());
        test.set_status(TestStatus::Running, Utc::now());
        assert!(test.completed.is_none());
    }

    #[test]
    fn rerun_resets_to_queued() {
        let mut test = test_run();
        test.results = Some(serde_json::json!({"success_rate": 0.5}));
        test.set_status(TestStatus::Completed, Utc::now());
        test.rerun();
        assert_eq!(test.status, "queued");
        assert!(test.completed.is_none());
        assert!(test.results.is_none());
    }
}
