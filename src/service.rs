use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::core::{RoiInputs, RoiResults, compute};
use crate::error::{Result, RoiError, StoreError};
use crate::store::{IdGenerator, Scenario, ScenarioId, ScenarioRepository, ScenarioSummary};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Raw request body for simulate and create.
///
/// Every input is optional here so that a missing field becomes a validation
/// error with a readable message instead of a generic decode failure.
/// `scenario_name` is only read when creating a scenario.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputsPayload {
    pub scenario_name: Option<String>,
    pub monthly_invoice_volume: Option<f64>,
    pub num_ap_staff: Option<f64>,
    pub avg_hours_per_invoice: Option<f64>,
    pub hourly_wage: Option<f64>,
    pub error_rate_manual: Option<f64>,
    pub error_cost: Option<f64>,
    pub time_horizon_months: Option<u32>,
    pub one_time_implementation_cost: Option<f64>,
}

/// Turns a request body into validated inputs.
pub fn build_inputs(payload: &InputsPayload) -> Result<RoiInputs> {
    let Some(monthly_invoice_volume) = payload.monthly_invoice_volume else {
        return Err(RoiError::validation("Invalid invoice volume"));
    };

    let inputs = RoiInputs {
        monthly_invoice_volume,
        num_ap_staff: required(payload.num_ap_staff, "num_ap_staff")?,
        avg_hours_per_invoice: required(payload.avg_hours_per_invoice, "avg_hours_per_invoice")?,
        hourly_wage: required(payload.hourly_wage, "hourly_wage")?,
        error_rate_manual: required(payload.error_rate_manual, "error_rate_manual")?,
        error_cost: required(payload.error_cost, "error_cost")?,
        time_horizon_months: required(payload.time_horizon_months, "time_horizon_months")?,
        one_time_implementation_cost: required(
            payload.one_time_implementation_cost,
            "one_time_implementation_cost",
        )?,
    };
    inputs.validate().map_err(RoiError::Validation)?;
    Ok(inputs)
}

fn required<T>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| RoiError::Validation(format!("Missing required input: {name}")))
}

/// Validates a request body and projects it. Inputs whose products overflow
/// are rejected rather than rendered as `inf` or `NaN`.
pub fn project(payload: &InputsPayload) -> Result<Simulation> {
    let inputs = build_inputs(payload)?;
    let projection = compute(&inputs);
    if !projection.is_finite() {
        return Err(RoiError::validation("Inputs are too large to project"));
    }
    Ok(Simulation {
        inputs,
        results: projection.formatted(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Simulation {
    pub inputs: RoiInputs,
    pub results: RoiResults,
}

/// Confirmation returned by [`ScenarioService::generate_report`]. Nothing is
/// actually delivered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportReceipt {
    pub message: String,
    pub report_url: String,
    pub scenario_data: Scenario,
}

/// Scenario operations over an explicitly constructed repository handle.
///
/// Reads are abandoned once the store timeout elapses. Writes hand the
/// repository a deadline instead, so a write is either committed and reported
/// as such or reported as failed with nothing stored.
#[derive(Clone)]
pub struct ScenarioService {
    repo: Arc<dyn ScenarioRepository>,
    ids: Arc<dyn IdGenerator>,
    store_timeout: Duration,
}

impl ScenarioService {
    pub fn new(repo: Arc<dyn ScenarioRepository>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            repo,
            ids,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Computes a projection without persisting anything.
    pub fn simulate(&self, payload: &InputsPayload) -> Result<Simulation> {
        project(payload).inspect_err(|err| debug!("simulate rejected: {err}"))
    }

    /// Saves a projection under the name exactly as sent. The name must have
    /// something besides whitespace.
    pub async fn create_scenario(&self, payload: &InputsPayload) -> Result<Scenario> {
        let scenario_name = payload
            .scenario_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| RoiError::validation("Scenario name is required."))?;

        let Simulation { inputs, results } = project(payload).map_err(|err| {
            debug!("create rejected: {err}");
            match err {
                RoiError::Validation(msg) => {
                    RoiError::Validation(format!("Invalid inputs provided for saving: {msg}"))
                }
                other => other,
            }
        })?;

        let scenario = Scenario {
            id: self.ids.next_id(),
            scenario_name: scenario_name.to_string(),
            inputs,
            results,
            created_at: Utc::now(),
        };

        self.repo
            .insert(scenario.clone(), self.write_deadline())
            .await
            .map_err(|err| store_failure("insert", err))?;
        info!(id = %scenario.id, name = %scenario.scenario_name, "scenario created");
        Ok(scenario)
    }

    pub async fn list_scenarios(&self) -> Result<Vec<ScenarioSummary>> {
        self.bounded("list", self.repo.list()).await
    }

    pub async fn get_scenario(&self, raw_id: &str) -> Result<Scenario> {
        let id: ScenarioId = raw_id.parse()?;
        self.find(&id, "Scenario not found.").await
    }

    pub async fn delete_scenario(&self, raw_id: &str) -> Result<bool> {
        let id: ScenarioId = raw_id.parse()?;
        let deleted = self
            .repo
            .delete(&id, self.write_deadline())
            .await
            .map_err(|err| store_failure("delete", err))?;
        if !deleted {
            return Err(RoiError::NotFound("Scenario not found.".to_string()));
        }
        info!(%id, "scenario deleted");
        Ok(true)
    }

    /// Confirms a report request for a saved scenario. No message is sent.
    pub async fn generate_report(
        &self,
        email: Option<&str>,
        scenario_id: Option<&str>,
    ) -> Result<ReportReceipt> {
        let email = email.map(str::trim).unwrap_or_default();
        let scenario_id = scenario_id.map(str::trim).unwrap_or_default();
        if email.is_empty() || scenario_id.is_empty() || !email.contains('@') {
            return Err(RoiError::validation(
                "Valid email and scenario ID are required for report generation.",
            ));
        }

        let id: ScenarioId = scenario_id.parse()?;
        let scenario = self.find(&id, "Scenario not found for reporting.").await?;
        info!(%id, email, "report link issued");

        Ok(ReportReceipt {
            message: format!(
                "Report generation for scenario \"{}\" successful. A link has been 'sent' to {email}.",
                scenario.scenario_name
            ),
            report_url: format!("/report.html?id={id}"),
            scenario_data: scenario,
        })
    }

    async fn find(&self, id: &ScenarioId, not_found: &str) -> Result<Scenario> {
        self.bounded("get", self.repo.get(id))
            .await?
            .ok_or_else(|| RoiError::NotFound(not_found.to_string()))
    }

    fn write_deadline(&self) -> Instant {
        Instant::now() + self.store_timeout
    }

    /// Only for reads: dropping a read midway leaves nothing behind.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = std::result::Result<T, StoreError>>,
    ) -> Result<T> {
        let outcome = match tokio::time::timeout(self.store_timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(StoreError::Timeout),
        };
        outcome.map_err(|err| store_failure(operation, err))
    }
}

fn store_failure(operation: &'static str, err: StoreError) -> RoiError {
    error!(operation, "scenario store failure: {err}");
    err.into()
}
