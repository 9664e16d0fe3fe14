//! Batch SAT pipeline: unpack an upload, validate each problem, fan the
//! valid ones out to the solver service and aggregate what comes back.

mod database;
mod extract;

pub use database::insert_results;
pub use extract::{extract, BatchError, ProblemFile};

use crate::database::NewSatResult;
use crate::remote::{SolveRequest, SolveResults, Solver};
use dacroq_model::dimacs::{self, CnfHeader};
use dacroq_model::sat::{BatchSummary, FileOutcome, FileStatus, SolveBatchResponse, SolverKind};
use futures::{stream, StreamExt};
use rand::distributions::Alphanumeric;
use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub solver: SolverKind,
    pub parallel: bool,
    /// Largest accepted size of one extracted archive member.
    pub member_limit: u64,
}

/// A finished batch: the response for the caller and the rows to persist.
pub struct SolvedBatch {
    pub response: SolveBatchResponse,
    pub rows: Vec<NewSatResult>,
}

enum Prepared {
    Valid {
        name: String,
        header: CnfHeader,
        dimacs: String,
    },
    Invalid(FileOutcome),
}

fn prepare(problem: ProblemFile) -> Prepared {
    let ProblemFile { name, contents } = problem;
    let text = contents.and_then(|bytes| {
        String::from_utf8(bytes).map_err(|_| "File is not valid UTF-8".to_owned())
    });
    let checked = text.and_then(|dimacs| match dimacs::validate(&dimacs) {
        Ok(header) => Ok((header, dimacs)),
        Err(e) => Err(e.to_string()),
    });
    match checked {
        Ok((header, dimacs)) => Prepared::Valid {
            name,
            header,
            dimacs,
        },
        Err(reason) => Prepared::Invalid(FileOutcome {
            file_name: name,
            variables: None,
            clauses: None,
            status: FileStatus::Failed { reason },
        }),
    }
}

/// Energy reported by the solver, or estimated from its reported power draw.
pub fn energy_nj(results: &SolveResults) -> Option<f64> {
    results.energy_nj.or_else(|| {
        results
            .power_mw
            .zip(results.solve_time_ms)
            .map(|(power_mw, time_ms)| power_mw * time_ms * 1000.0)
    })
}

fn outcome_for(
    name: String,
    header: CnfHeader,
    response: anyhow::Result<SolveResults>,
) -> FileOutcome {
    let status = match response {
        Ok(results) => FileStatus::Processed {
            solved: results
                .success
                .unwrap_or_else(|| results.satisfiable.unwrap_or(false)),
            satisfiable: results.satisfiable,
            time_ms: results.solve_time_ms.unwrap_or_default(),
            energy_nj: energy_nj(&results),
        },
        Err(e) => {
            log::warn!("Solve request for {} failed: {:#}", name, e);
            FileStatus::Failed {
                reason: format!("{:#}", e),
            }
        }
    };
    FileOutcome {
        file_name: name,
        variables: Some(header.variables),
        clauses: Some(header.clauses),
        status,
    }
}

pub fn summarize(files: &[FileOutcome]) -> BatchSummary {
    let mut summary = BatchSummary {
        total_files: files.len(),
        ..Default::default()
    };
    let mut total_time = 0.0;
    let mut energies = Vec::new();
    for file in files {
        match &file.status {
            FileStatus::Processed {
                solved,
                time_ms,
                energy_nj,
                ..
            } => {
                summary.processed += 1;
                if *solved {
                    summary.solved += 1;
                }
                total_time += time_ms;
                energies.extend(*energy_nj);
            }
            FileStatus::Failed { .. } => summary.failed += 1,
        }
    }
    if summary.processed > 0 {
        summary.success_rate = summary.solved as f64 / summary.processed as f64;
        summary.avg_time_ms = total_time / summary.processed as f64;
    }
    if !energies.is_empty() {
        summary.avg_energy_nj = Some(energies.iter().sum::<f64>() / energies.len() as f64);
    }
    summary
}

fn batch_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

fn to_row(
    outcome: &FileOutcome,
    batch_id: &str,
    source: &str,
    solver: SolverKind,
    created_by: Option<i32>,
) -> Option<NewSatResult> {
    match &outcome.status {
        FileStatus::Processed {
            solved,
            satisfiable,
            time_ms,
            energy_nj,
        } => Some(NewSatResult {
            batch_id: batch_id.to_owned(),
            problem_id: outcome.file_name.clone(),
            source: source.to_owned(),
            variables: i32::try_from(outcome.variables?).ok()?,
            clauses: i32::try_from(outcome.clauses?).ok()?,
            solver: solver.to_string(),
            solved: *solved,
            satisfiable: *satisfiable,
            time_ms: *time_ms,
            energy_nj: *energy_nj,
            created_by,
        }),
        FileStatus::Failed { .. } => None,
    }
}

/// Runs every problem in the upload through `solver`. Individual problems
/// never fail the batch, only an unusable upload does.
pub async fn solve_batch<S: Solver + ?Sized>(
    solver: &S,
    source: &str,
    bytes: &[u8],
    options: BatchOptions,
    created_by: Option<i32>,
) -> Result<SolvedBatch, BatchError> {
    let problems = extract(source, bytes, options.member_limit)?;
    let mut files = Vec::with_capacity(problems.len());
    let mut valid = Vec::new();
    for problem in problems {
        match prepare(problem) {
            Prepared::Valid {
                name,
                header,
                dimacs,
            } => valid.push((name, header, dimacs)),
            Prepared::Invalid(outcome) => {
                log::warn!("Skipping invalid problem {}", outcome.file_name);
                files.push(outcome)
            }
        }
    }

    let concurrency = if options.parallel { valid.len().max(1) } else { 1 };
    let solved = stream::iter(valid)
        .map(|(name, header, dimacs)| async move {
            let request = SolveRequest {
                name: name.clone(),
                dimacs,
                solver_type: options.solver,
            };
            let response = solver.solve(&request).await.map_err(anyhow::Error::from);
            outcome_for(name, header, response)
        })
        .buffered(concurrency)
        .collect::<Vec<_>>()
        .await;
    files.extend(solved);

    let summary = summarize(&files);
    let batch_id = batch_id();
    let rows = files
        .iter()
        .filter_map(|f| to_row(f, &batch_id, source, options.solver, created_by))
        .collect();
    log::info!(
        "Batch {} ({}): {} files, {} processed, {} solved, {} failed",
        batch_id,
        source,
        summary.total_files,
        summary.processed,
        summary.solved,
        summary.failed
    );
    Ok(SolvedBatch {
        response: SolveBatchResponse {
            batch_id,
            source: source.to_owned(),
            solver: options.solver,
            summary,
            files,
        },
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::extract::tests::build_zip;
    use super::*;
    use crate::remote::RemoteError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Solves anything whose name contains "sat", rejects "down" with an
    /// HTTP error and reports the rest as unsolved.
    struct MockSolver {
        calls: AtomicUsize,
    }

    impl MockSolver {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Solver for MockSolver {
        async fn solve(&self, request: &SolveRequest) -> Result<SolveResults, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.name.contains("down") {
                return Err(RemoteError::Status {
                    status: 503,
                    body: "busy".into(),
                });
            }
            let solved = request.name.contains("sat");
            Ok(SolveResults {
                success: Some(solved),
                satisfiable: Some(solved),
                solve_time_ms: Some(2.0),
                energy_nj: None,
                power_mw: Some(10.0),
            })
        }
    }

    const VALID: &str = "c example\np cnf 3 2\n1 -2 0\n2 3 0\n";

    fn options(parallel: bool) -> BatchOptions {
        BatchOptions {
            solver: SolverKind::Daedalus,
            parallel,
            member_limit: 1024 * 1024,
        }
    }

    #[test]
    fn energy_estimated_from_power() {
        let results = SolveResults {
            power_mw: Some(24.6),
            solve_time_ms: Some(0.5),
            ..Default::default()
        };
        assert_eq!(energy_nj(&results), Some(24.6 * 0.5 * 1000.0));
        let reported = SolveResults {
            energy_nj: Some(12.3),
            ..results
        };
        assert_eq!(energy_nj(&reported), Some(12.3));
        assert_eq!(energy_nj(&SolveResults::default()), None);
    }

    #[test]
    fn empty_summary_has_zero_rate() {
        let summary = summarize(&[]);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.avg_time_ms, 0.0);
        assert!(summary.avg_energy_nj.is_none());
    }

    #[tokio::test]
    async fn success_rate_excludes_failed_members() {
        let zip = build_zip(&[
            ("sat1.cnf", VALID),
            ("sat2.cnf", VALID),
            ("hard.cnf", VALID),
            ("down.cnf", VALID),
            ("broken.cnf", "1 2 0\n"),
        ]);
        let solver = MockSolver::new();
        let batch = solve_batch(&solver, "set.zip", &zip, options(true), Some(4))
            .await
            .unwrap();
        let summary = &batch.response.summary;
        assert_eq!(summary.total_files, 5);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.solved, 2);
        assert!((summary.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.avg_time_ms, 2.0);
        assert_eq!(summary.avg_energy_nj, Some(20_000.0));
        // The invalid member is never submitted
        assert_eq!(solver.calls.load(Ordering::SeqCst), 4);
        assert_eq!(batch.rows.len(), 3);
        assert!(batch.rows.iter().all(|r| r.created_by == Some(4)));
        assert!(batch.rows.iter().all(|r| r.batch_id == batch.response.batch_id));
    }

    #[tokio::test]
    async fn sequential_mode_keeps_file_order() {
        let zip = build_zip(&[("a-sat.cnf", VALID), ("b.cnf", VALID), ("c-sat.cnf", VALID)]);
        let batch = solve_batch(&MockSolver::new(), "set.zip", &zip, options(false), None)
            .await
            .unwrap();
        let names: Vec<_> = batch
            .response
            .files
            .iter()
            .map(|f| f.file_name.as_str())
            .collect();
        assert_eq!(names, vec!["a-sat.cnf", "b.cnf", "c-sat.cnf"]);
        assert_eq!(batch.response.summary.solved, 2);
    }

    #[tokio::test]
    async fn single_cnf_upload() {
        let batch = solve_batch(
            &MockSolver::new(),
            "uf3-sat.cnf",
            VALID.as_bytes(),
            options(false),
            None,
        )
        .await
        .unwrap();
        let file = &batch.response.files[0];
        assert_eq!(file.variables, Some(3));
        assert_eq!(file.clauses, Some(2));
        assert_eq!(batch.response.summary.success_rate, 1.0);
    }

    #[tokio::test]
    async fn unusable_upload_fails_batch() {
        let result = solve_batch(&MockSolver::new(), "set.tar", b"", options(true), None).await;
        assert_eq!(result.err(), Some(BatchError::UnsupportedUpload));
    }

    #[tokio::test]
    async fn counts_beyond_column_range_are_failed() {
        let zip = build_zip(&[
            ("wide.cnf", "p cnf 3000000000 1\n1 0\n"),
            ("sat.cnf", VALID),
        ]);
        let solver = MockSolver::new();
        let batch = solve_batch(&solver, "set.zip", &zip, options(false), None)
            .await
            .unwrap();
        assert_eq!(batch.response.summary.failed, 1);
        assert_eq!(solver.calls.load(Ordering::SeqCst), 1);
        assert_eq!(batch.rows.len(), 1);
        assert!(batch.rows.iter().all(|r| r.variables >= 0));
    }

    #[tokio::test]
    async fn oversized_member_is_failed_not_fatal() {
        let big = "1 2 0\n".repeat(64);
        let zip = build_zip(&[("sat.cnf", VALID), ("big.cnf", big.as_str())]);
        let options = BatchOptions {
            member_limit: 64,
            ..options(true)
        };
        let batch = solve_batch(&MockSolver::new(), "set.zip", &zip, options, None)
            .await
            .unwrap();
        assert_eq!(batch.response.summary.processed, 1);
        assert_eq!(batch.response.summary.failed, 1);
        assert!(matches!(
            &batch.response.files[0].status,
            FileStatus::Failed { reason } if reason.contains("exceeds 64 bytes")
        ));
    }

    #[test]
    fn rows_require_counts() {
        let outcome = FileOutcome {
            file_name: "a.cnf".into(),
            variables: None,
            clauses: None,
            status: FileStatus::Processed {
                solved: true,
                satisfiable: Some(true),
                time_ms: 1.0,
                energy_nj: None,
            },
        };
        assert!(to_row(&outcome, "batch", "a.cnf", SolverKind::Daedalus, None).is_none());
    }
}
