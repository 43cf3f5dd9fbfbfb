//! Organization ("empresa") types

use crate::{require_non_empty, Filing, ValidationError};
use serde::{Deserialize, Serialize};

/// A stored organization with its filings embedded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    /// CNPJ, unique across all organizations
    pub tax_id: String,
    pub address: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub filings: Vec<Filing>,
}

/// Organization fields as sent on create and full-replace update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub tax_id: String,
    pub address: String,
    pub email: String,
    pub phone: String,
}

impl NewOrganization {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("tax_id", &self.tax_id)?;
        require_non_empty("address", &self.address)?;
        require_non_empty("email", &self.email)?;
        require_non_empty("phone", &self.phone)?;
        Ok(())
    }
}
