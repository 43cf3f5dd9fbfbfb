//! Filing ("obrigação acessória") types

use crate::{require_non_empty, ValidationError};
use serde::{Deserialize, Serialize};

/// A stored filing. Never embeds its parent organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filing {
    pub id: i64,
    pub name: String,
    /// Free-form periodicity label, e.g. "mensal"
    pub frequency: String,
    pub organization_id: i64,
}

/// Filing fields as sent on create and full-replace update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFiling {
    pub name: String,
    pub frequency: String,
    pub organization_id: i64,
}

impl NewFiling {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }
}
