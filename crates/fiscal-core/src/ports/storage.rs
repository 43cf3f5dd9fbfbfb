//! Storage traits for persistence
//!
//! Implemented by a request-scoped session: every method borrows the session
//! mutably, so one session serves one request at a time. Absence is reported
//! as `None`/`false`, never as an error.

use crate::Result;
use async_trait::async_trait;
use fiscal_types::{Filing, NewFiling, NewOrganization, Organization, Page};

/// Organization store. Reads return organizations with their filings embedded.
#[async_trait]
pub trait OrganizationStore: Send {
    /// Fails with `Conflict` when `tax_id` is already taken.
    async fn insert_organization(&mut self, org: &NewOrganization) -> Result<Organization>;
    async fn find_organization(&mut self, id: i64) -> Result<Option<Organization>>;
    async fn list_organizations(&mut self, page: Page) -> Result<Vec<Organization>>;
    /// Replaces every mutable field. `None` when `id` does not exist.
    async fn update_organization(
        &mut self,
        id: i64,
        org: &NewOrganization,
    ) -> Result<Option<Organization>>;
    /// Also removes every filing owned by the organization.
    async fn delete_organization(&mut self, id: i64) -> Result<bool>;
}

/// Filing store
#[async_trait]
pub trait FilingStore: Send {
    /// Fails with `InvalidReference` when `organization_id` does not exist.
    async fn insert_filing(&mut self, filing: &NewFiling) -> Result<Filing>;
    async fn find_filing(&mut self, id: i64) -> Result<Option<Filing>>;
    async fn list_filings(&mut self, page: Page) -> Result<Vec<Filing>>;
    async fn update_filing(&mut self, id: i64, filing: &NewFiling) -> Result<Option<Filing>>;
    async fn delete_filing(&mut self, id: i64) -> Result<bool>;
}
