//! Snapshot storage.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::state::OptimizationState;
use crate::traits::StateRepository;

#[derive(Debug, Default)]
pub struct InMemoryStateRepository {
    states: Mutex<HashMap<Uuid, OptimizationState>>,
}

impl InMemoryStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.lock().map(|states| states.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::Unavailable("state store lock poisoned".to_string())
}

impl StateRepository for InMemoryStateRepository {
    fn save(&self, state: &OptimizationState) -> Result<(), RepositoryError> {
        let mut states = self.states.lock().map_err(|_| poisoned())?;
        states.insert(state.id(), state.clone());
        Ok(())
    }

    fn save_run(&self, source: &OptimizationState, result: &OptimizationState) -> Result<(), RepositoryError> {
        let mut states = self.states.lock().map_err(|_| poisoned())?;
        states.insert(source.id(), source.clone());
        states.insert(result.id(), result.clone());
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> Result<OptimizationState, RepositoryError> {
        let states = self.states.lock().map_err(|_| poisoned())?;
        states.get(&id).cloned().ok_or(RepositoryError::NotFound(id))
    }
}

/// One pretty-printed JSON file per snapshot, named by its id.
#[derive(Debug, Clone)]
pub struct JsonFileStateRepository {
    dir: PathBuf,
}

impl JsonFileStateRepository {
    /// Creates `dir` if it does not exist.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn temp_path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json.tmp"))
    }

    /// Writes every snapshot to a temporary file first and only then renames
    /// them into place. On failure nothing new is left in the directory.
    fn write_all(&self, states: &[&OptimizationState]) -> Result<(), RepositoryError> {
        let documents = states
            .iter()
            .map(|state| Ok((state.id(), serde_json::to_string_pretty(state)?)))
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(documents.len());
        for (id, json) in documents {
            let temp = self.temp_path_for(id);
            if let Err(err) = fs::write(&temp, json) {
                let _ = fs::remove_file(&temp);
                discard(staged.iter().map(|(temp, _)| temp));
                return Err(err.into());
            }
            staged.push((temp, self.path_for(id)));
        }

        for (index, (temp, path)) in staged.iter().enumerate() {
            if let Err(err) = fs::rename(temp, path) {
                discard(staged[..index].iter().map(|(_, path)| path));
                discard(staged[index..].iter().map(|(temp, _)| temp));
                return Err(err.into());
            }
            debug!(path = %path.display(), "optimization state saved");
        }
        Ok(())
    }
}

fn discard<'a>(paths: impl Iterator<Item = &'a PathBuf>) {
    for path in paths {
        if let Err(err) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %err, "failed to clean up partial save");
        }
    }
}

impl StateRepository for JsonFileStateRepository {
    fn save(&self, state: &OptimizationState) -> Result<(), RepositoryError> {
        self.write_all(&[state])
    }

    fn save_run(&self, source: &OptimizationState, result: &OptimizationState) -> Result<(), RepositoryError> {
        self.write_all(&[source, result])
    }

    fn find_by_id(&self, id: Uuid) -> Result<OptimizationState, RepositoryError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(RepositoryError::NotFound(id));
        }
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
