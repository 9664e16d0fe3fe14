use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "validator")]
use validator::Validate;

#[derive(Copy, Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// The hardware solver chip.
    Daedalus,
    Minisat,
    Walksat,
}

impl Default for SolverKind {
    fn default() -> Self {
        Self::Daedalus
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolverKind::Daedalus => "daedalus",
            SolverKind::Minisat => "minisat",
            SolverKind::Walksat => "walksat",
        })
    }
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveUploadQuery {
    /// Name of the uploaded file, its extension selects `.cnf` or `.zip` handling.
    #[cfg_attr(feature = "validator", validate(length(min = 1, max = 255)))]
    pub filename: String,
    #[serde(default)]
    pub solver: SolverKind,
    /// Submit every extracted problem at once instead of one after another.
    #[serde(default)]
    pub parallel: bool,
}

/// Outcome for one problem file of a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileOutcome {
    pub file_name: String,
    pub variables: Option<u32>,
    pub clauses: Option<u32>,
    #[serde(flatten)]
    pub status: FileStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileStatus {
    /// The solver answered. `solved` reports whether it succeeded.
    Processed {
        solved: bool,
        satisfiable: Option<bool>,
        time_ms: f64,
        energy_nj: Option<f64>,
    },
    /// Excluded from the aggregate: invalid file or failed request.
    Failed { reason: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchSummary {
    pub total_files: usize,
    pub processed: usize,
    pub failed: usize,
    pub solved: usize,
    /// `solved / processed`, zero when nothing was processed.
    pub success_rate: f64,
    pub avg_time_ms: f64,
    pub avg_energy_nj: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveBatchResponse {
    pub batch_id: String,
    pub source: String,
    pub solver: SolverKind,
    pub summary: BatchSummary,
    pub files: Vec<FileOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SatResultSummary {
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
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListSatResultsRequest {
    #[cfg_attr(feature = "validator", validate(range(min = 1, max = 1000)))]
    pub limit: u32,
    pub offset: u32,
    pub batch_id: Option<String>,
}

impl Default for ListSatResultsRequest {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
            batch_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSatResultsResponse {
    pub items: Vec<SatResultSummary>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_is_flattened_with_tag() {
        let outcome = FileOutcome {
            file_name: "uf20-01.cnf".into(),
            variables: Some(20),
            clauses: Some(91),
            status: FileStatus::Processed {
                solved: true,
                satisfiable: Some(true),
                time_ms: 0.5,
                energy_nj: Some(12.3),
            },
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["outcome"], "processed");
        assert_eq!(value["solved"], true);
        assert_eq!(value["file_name"], "uf20-01.cnf");
    }

    #[test]
    fn upload_query_defaults() {
        let query: SolveUploadQuery = serde_json::from_str(r#"{"filename": "a.zip"}"#).unwrap();
        assert_eq!(query.solver, SolverKind::Daedalus);
        assert!(!query.parallel);
    }
}
