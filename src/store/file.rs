use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Scenario, ScenarioId, ScenarioRepository, ScenarioSummary};
use crate::error::StoreError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ScenarioDocument {
    scenarios: Vec<Scenario>,
}

/// Backend that keeps the whole collection in one JSON document on disk.
///
/// Each write stages the new document in its own temp file next to the target
/// and renames it over the target; the rename is the commit point. The staging
/// and rename run on the blocking pool under the write lock, so dropping the
/// calling future cannot interrupt a write halfway or release the lock early.
pub struct FileScenarioRepository {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl FileScenarioRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Arc::new(path.as_ref().to_path_buf()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn lock_before(&self, deadline: Instant) -> Result<OwnedMutexGuard<()>, StoreError> {
        tokio::time::timeout_at(deadline.into(), Arc::clone(&self.write_lock).lock_owned())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await?
}

fn load_document(path: &Path) -> Result<ScenarioDocument, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ScenarioDocument::default()),
        Err(err) => return Err(err.into()),
    };
    if content.trim().is_empty() {
        return Ok(ScenarioDocument::default());
    }
    Ok(serde_json::from_str(&content)?)
}

/// Stages `document` and renames it over `path` unless `deadline` has passed
/// by then. A missed deadline removes the staged file and leaves `path` as it
/// was.
fn commit_document(
    path: &Path,
    document: &ScenarioDocument,
    deadline: Instant,
) -> Result<(), StoreError> {
    let content = serde_json::to_vec_pretty(document)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(&content)?;
    staged.as_file().sync_all()?;

    if Instant::now() >= deadline {
        return Err(StoreError::Timeout);
    }
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[async_trait]
impl ScenarioRepository for FileScenarioRepository {
    async fn insert(&self, scenario: Scenario, deadline: Instant) -> Result<(), StoreError> {
        let guard = self.lock_before(deadline).await?;
        let path = Arc::clone(&self.path);
        run_blocking(move || {
            let _guard = guard;
            let mut document = load_document(&path)?;
            if document.scenarios.iter().any(|s| s.id == scenario.id) {
                return Err(StoreError::Conflict(scenario.id.to_string()));
            }
            document.scenarios.push(scenario);
            commit_document(&path, &document, deadline)
        })
        .await
    }

    async fn list(&self) -> Result<Vec<ScenarioSummary>, StoreError> {
        let path = Arc::clone(&self.path);
        run_blocking(move || {
            let document = load_document(&path)?;
            Ok(document.scenarios.iter().map(Scenario::summary).collect())
        })
        .await
    }

    async fn get(&self, id: &ScenarioId) -> Result<Option<Scenario>, StoreError> {
        let path = Arc::clone(&self.path);
        let id = *id;
        run_blocking(move || {
            let document = load_document(&path)?;
            Ok(document.scenarios.into_iter().find(|s| s.id == id))
        })
        .await
    }

    async fn delete(&self, id: &ScenarioId, deadline: Instant) -> Result<bool, StoreError> {
        let guard = self.lock_before(deadline).await?;
        let path = Arc::clone(&self.path);
        let id = *id;
        run_blocking(move || {
            let _guard = guard;
            let mut document = load_document(&path)?;
            let Some(index) = document.scenarios.iter().position(|s| s.id == id) else {
                return Ok(false);
            };
            document.scenarios.remove(index);
            commit_document(&path, &document, deadline)?;
            Ok(true)
        })
        .await
    }
}
