use crate::database::{NewSatResult, SatResultRepository, SatResultRepositoryImpl};
use crate::state::Pool;
use anyhow::Context;
use tokio::task::spawn_blocking;

/// Persists the processed members of a batch. The pooled connection is
/// checked out on the blocking thread pool.
pub async fn insert_results(pool: Pool, rows: Vec<NewSatResult>) -> anyhow::Result<usize> {
    if rows.is_empty() {
        return Ok(0);
    }
    spawn_blocking(move || -> anyhow::Result<usize> {
        let database = pool.get().context("Failed to get a database connection")?;
        let repository = SatResultRepositoryImpl::new(&database);
        let inserted = repository
            .insert_all(&rows)
            .context("Failed to insert SAT results")?;
        log::debug!("Stored {} SAT results", inserted);
        Ok(inserted)
    })
    .await
    .context("SAT result insert task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::r2d2::ConnectionManager;
    use diesel::PgConnection;
    use std::time::{Duration, Instant};

    fn unreachable_pool() -> Pool {
        let manager = ConnectionManager::<PgConnection>::new("postgres://dacroq@127.0.0.1:1/dacroq");
        Pool::builder()
            .connection_timeout(Duration::from_millis(500))
            .build_unchecked(manager)
    }

    fn row() -> NewSatResult {
        NewSatResult {
            batch_id: "batch".into(),
            problem_id: "uf20-01.cnf".into(),
            source: "uf20.zip".into(),
            variables: 20,
            clauses: 91,
            solver: "daedalus".into(),
            solved: true,
            satisfiable: Some(true),
            time_ms: 1.0,
            energy_nj: None,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn empty_batch_needs_no_connection() {
        assert_eq!(insert_results(unreachable_pool(), Vec::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn waiting_for_a_connection_leaves_runtime_free() {
        let started = Instant::now();
        let insert = insert_results(unreachable_pool(), vec![row()]);
        tokio::pin!(insert);
        tokio::select! {
            biased;
            _ = &mut insert => panic!("insert finished before the runtime ticked"),
            _ = tokio::time::sleep(Duration::from_millis(20)) => {}
        }
        assert!(started.elapsed() < Duration::from_millis(500));
        let error = insert.await.unwrap_err();
        assert!(format!("{:#}", error).contains("Failed to get a database connection"));
    }
}
