//! Client for the hardware / solver API that owns test execution.

use crate::settings::RemoteSetting;
use async_trait::async_trait;
use dacroq_model::sat::SolverKind;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote url: {0}")]
    Url(#[from] url::ParseError),
    #[error("Remote request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Remote API returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SolveRequest {
    pub name: String,
    pub dimacs: String,
    pub solver_type: SolverKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolveResponse {
    #[serde(default)]
    pub results: SolveResults,
}

/// Per-problem measurements reported by the solver service. Every field is
/// optional because software and hardware solvers report different subsets.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SolveResults {
    pub success: Option<bool>,
    pub satisfiable: Option<bool>,
    pub solve_time_ms: Option<f64>,
    pub energy_nj: Option<f64>,
    pub power_mw: Option<f64>,
}

/// Seam between the batch pipeline and whatever answers solve requests.
#[async_trait]
pub trait Solver: Send + Sync {
    async fn solve(&self, request: &SolveRequest) -> Result<SolveResults, RemoteError>;
}

#[derive(Clone)]
pub struct RemoteApi {
    client: reqwest::Client,
    base: Url,
}

impl RemoteApi {
    pub fn new(setting: &RemoteSetting) -> anyhow::Result<Self> {
        let client = reqwest::ClientBuilder::default()
            .timeout(setting.timeout_duration())
            .user_agent(format!("dacroq-server {}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base: setting.url.clone(),
        })
    }

    pub async fn health(&self) -> Result<Value, RemoteError> {
        let response = self.client.get(self.base.join("health")?).send().await?;
        read_json(response).await
    }

    pub async fn metrics(&self) -> Result<Value, RemoteError> {
        let response = self
            .client
            .get(self.base.join("api/metrics")?)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn hardware_status(&self) -> Result<Value, RemoteError> {
        let response = self
            .client
            .get(self.base.join("hardware/status")?)
            .send()
            .await?;
        read_json(response).await
    }

    /// `device` is a chip name or `all`.
    pub async fn reset_hardware(&self, device: &str) -> Result<Value, RemoteError> {
        let url = self.base.join("hardware/reset/")?.join(device)?;
        let response = self.client.post(url).send().await?;
        read_json(response).await
    }
}

#[async_trait]
impl Solver for RemoteApi {
    async fn solve(&self, request: &SolveRequest) -> Result<SolveResults, RemoteError> {
        let response = self
            .client
            .post(self.base.join("sat/solve")?)
            .json(request)
            .send()
            .await?;
        let parsed: SolveResponse = read_json(response).await?;
        Ok(parsed.results)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let status = response.status();
    if !status.is_success() {
        let mut body = response.text().await.unwrap_or_default();
        body.truncate(1024);
        return Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_solver_results() {
        let json = r#"{"test_id": "a1", "status": "completed",
            "results": {"solver": "minisat", "satisfiable": true, "solve_time_ms": 1.5, "success": true}}"#;
        let parsed: SolveResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results.success, Some(true));
        assert_eq!(parsed.results.solve_time_ms, Some(1.5));
        assert!(parsed.results.energy_nj.is_none());
    }

    #[test]
    fn solve_request_uses_lowercase_solver() {
        let request = SolveRequest {
            name: "uf20-01.cnf".into(),
            dimacs: "p cnf 1 1\n1 0\n".into(),
            solver_type: SolverKind::Walksat,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["solver_type"], "walksat");
    }

    #[test]
    fn reset_url_is_joined_under_base() {
        let base: Url = "http://localhost:8001/".parse().unwrap();
        let url = base.join("hardware/reset/").unwrap().join("ldpc").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8001/hardware/reset/ldpc");
    }
}
