use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RoiError;

const HYPHENATED_LEN: usize = 36;

/// Store-assigned scenario key, rendered as a hyphenated lowercase UUID.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(Uuid);

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ScenarioId {
    type Err = RoiError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.len() != HYPHENATED_LEN {
            return Err(invalid_id());
        }
        Uuid::parse_str(raw).map(Self).map_err(|_| invalid_id())
    }
}

fn invalid_id() -> RoiError {
    RoiError::InvalidId("Invalid scenario ID format.".to_string())
}

/// Source of fresh scenario ids.
///
/// Implementations must hand out collision-free ids without coordinating
/// with other creators.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> ScenarioId;
}

/// Random (v4) UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> ScenarioId {
        ScenarioId(Uuid::new_v4())
    }
}
