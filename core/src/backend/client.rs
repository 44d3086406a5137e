use serde::de::DeserializeOwned;

use super::error::BackendError;
use super::models::{
    ExecuteRequest, ExecuteResponse, ExecutionResult, HealthResponse, MemoryEntry,
    MemoryResponse, PlanHandle, PlanRequest,
};
use crate::config::BackendConfig;

async fn parse_json_response<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, BackendError> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp
        .text()
        .await
        .map_err(|err| BackendError::from_reqwest(err, url.clone()))?;

    if !status.is_success() {
        return Err(BackendError::status_error(status.as_u16(), url, &body));
    }

    serde_json::from_str::<T>(&body)
        .map_err(|err| BackendError::decode_error(status.as_u16(), url, err, &body))
}

/// HTTP client for the agent planner REST API.
#[derive(Clone)]
pub struct PlannerClient {
    http: reqwest::Client,
    url_plan: String,
    url_execute: String,
    url_memory: String,
    url_health: String,
}

impl PlannerClient {
    pub fn new(cfg: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|err| BackendError::from_reqwest(err, cfg.base_url.clone()))?;
        let normalized = cfg.base_url.trim_end_matches('/');
        Ok(Self {
            http,
            url_plan: format!("{}/plan", normalized),
            url_execute: format!("{}/execute", normalized),
            url_memory: format!("{}/memory", normalized),
            url_health: cfg.health_url.clone(),
        })
    }

    pub async fn create_plan(&self, prompt: &str) -> Result<PlanHandle, BackendError> {
        let url = &self.url_plan;
        tracing::debug!(
            target: "planner.http",
            stage = "plan.create.in",
            url = %url,
            prompt_len = prompt.len()
        );
        let resp = self
            .http
            .post(url)
            .json(&PlanRequest { prompt })
            .send()
            .await
            .map_err(|err| BackendError::from_reqwest(err, url.clone()))?;
        let status = resp.status();
        let plan: PlanHandle = parse_json_response(resp).await?;
        tracing::debug!(
            target: "planner.http",
            stage = "plan.create.out",
            status = %status,
            plan_id = plan.plan_id,
            steps = plan.steps.len()
        );
        Ok(plan)
    }

    /// Runs the whole plan server side; resolves once every step finished.
    pub async fn execute_plan(&self, plan_id: i64) -> Result<ExecutionResult, BackendError> {
        let url = &self.url_execute;
        tracing::debug!(
            target: "planner.http",
            stage = "plan.execute.in",
            url = %url,
            plan_id = plan_id
        );
        let resp = self
            .http
            .post(url)
            .json(&ExecuteRequest { plan_id })
            .send()
            .await
            .map_err(|err| BackendError::from_reqwest(err, url.clone()))?;
        let status = resp.status();
        let body: ExecuteResponse = parse_json_response(resp).await?;
        tracing::debug!(
            target: "planner.http",
            stage = "plan.execute.out",
            status = %status,
            results = body.result.results.len(),
            reported = ?body.status
        );
        Ok(body.result)
    }

    pub async fn get_memory(&self) -> Result<Vec<MemoryEntry>, BackendError> {
        let url = &self.url_memory;
        tracing::debug!(target: "planner.http", stage = "memory.in", url = %url);
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| BackendError::from_reqwest(err, url.clone()))?;
        let status = resp.status();
        let body: MemoryResponse = parse_json_response(resp).await?;
        tracing::debug!(
            target: "planner.http",
            stage = "memory.out",
            status = %status,
            entries = body.memory.len()
        );
        Ok(body.memory)
    }

    /// True when the backend answers 2xx with a healthy status. Transport
    /// failures count as unhealthy rather than as errors.
    pub async fn health_check(&self) -> bool {
        let url = &self.url_health;
        let resp = match self.http.get(url).send().await {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!(target: "planner.http", stage = "health", url = %url, error = %err);
                return false;
            }
        };
        match parse_json_response::<HealthResponse>(resp).await {
            Ok(body) => matches!(body.status.as_str(), "healthy" | "ok"),
            Err(err) => {
                tracing::warn!(target: "planner.http", stage = "health", error = %err);
                false
            }
        }
    }
}
