mod file;
mod id;
mod memory;

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{RoiInputs, RoiResults};
use crate::error::StoreError;

pub use file::FileScenarioRepository;
pub use id::{IdGenerator, ScenarioId, UuidGenerator};
pub use memory::InMemoryScenarioRepository;

/// A named, saved projection. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub scenario_name: String,
    pub inputs: RoiInputs,
    pub results: RoiResults,
    pub created_at: DateTime<Utc>,
}

impl Scenario {
    pub fn summary(&self) -> ScenarioSummary {
        ScenarioSummary {
            id: self.id,
            scenario_name: self.scenario_name.clone(),
            created_at: self.created_at,
            monthly_savings: self.results.monthly_savings.clone(),
        }
    }
}

/// Listing projection of a [`Scenario`]; never carries the inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub id: ScenarioId,
    pub scenario_name: String,
    pub created_at: DateTime<Utc>,
    pub monthly_savings: String,
}

/// Persistence for scenarios. Each call is a single-document operation.
///
/// Writes take a deadline that bounds only the work before their commit
/// point. A write that reports `StoreError::Timeout` has changed nothing, and
/// a write that got past its commit point always runs to completion, even if
/// the caller stops waiting.
#[async_trait]
pub trait ScenarioRepository: Send + Sync {
    async fn insert(&self, scenario: Scenario, deadline: Instant) -> Result<(), StoreError>;
    /// Summaries in creation order, oldest first.
    async fn list(&self) -> Result<Vec<ScenarioSummary>, StoreError>;
    async fn get(&self, id: &ScenarioId) -> Result<Option<Scenario>, StoreError>;
    /// Returns `false` when nothing was stored under `id`.
    async fn delete(&self, id: &ScenarioId, deadline: Instant) -> Result<bool, StoreError>;
}
