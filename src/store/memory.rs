use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::{RwLock, RwLockWriteGuard};

use super::{Scenario, ScenarioId, ScenarioRepository, ScenarioSummary};
use crate::error::StoreError;

/// Process-local backend, used when no data file is configured.
#[derive(Debug, Default)]
pub struct InMemoryScenarioRepository {
    scenarios: RwLock<Vec<Scenario>>,
}

impl InMemoryScenarioRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waiting for the lock is the only step that can miss the deadline; the
    /// mutation after it is synchronous.
    async fn write_before(
        &self,
        deadline: Instant,
    ) -> Result<RwLockWriteGuard<'_, Vec<Scenario>>, StoreError> {
        tokio::time::timeout_at(deadline.into(), self.scenarios.write())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

#[async_trait]
impl ScenarioRepository for InMemoryScenarioRepository {
    async fn insert(&self, scenario: Scenario, deadline: Instant) -> Result<(), StoreError> {
        let mut scenarios = self.write_before(deadline).await?;
        if scenarios.iter().any(|s| s.id == scenario.id) {
            return Err(StoreError::Conflict(scenario.id.to_string()));
        }
        scenarios.push(scenario);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ScenarioSummary>, StoreError> {
        let scenarios = self.scenarios.read().await;
        Ok(scenarios.iter().map(Scenario::summary).collect())
    }

    async fn get(&self, id: &ScenarioId) -> Result<Option<Scenario>, StoreError> {
        let scenarios = self.scenarios.read().await;
        Ok(scenarios.iter().find(|s| s.id == *id).cloned())
    }

    async fn delete(&self, id: &ScenarioId, deadline: Instant) -> Result<bool, StoreError> {
        let mut scenarios = self.write_before(deadline).await?;
        let Some(index) = scenarios.iter().position(|s| s.id == *id) else {
            return Ok(false);
        };
        scenarios.remove(index);
        Ok(true)
    }
}
