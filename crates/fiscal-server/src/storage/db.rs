//! SQLite database layer (embedded, no external dependencies)

use anyhow::{Context, Result};
use async_trait::async_trait;
use fiscal_core::ports::{FilingStore, OrganizationStore};
use fiscal_core::{Filing, FiscalError, NewFiling, NewOrganization, Organization, Page};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Connection, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        tracing::info!("Opening SQLite database at: {}", database_url);

        let in_memory = is_in_memory(database_url);

        let mut options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true)
            .foreign_keys(true);
        if !in_memory {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        // Every connection to `:memory:` opens its own database, so the pool
        // must hold exactly one connection and never recycle it. All requests
        // then share that connection; in-memory stores are for tests only.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| {
                format!("Failed to connect to SQLite database at: {}", database_url)
            })?;

        tracing::info!("SQLite connection established, running migrations...");

        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        tracing::info!("Database initialization complete");

        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        // AUTOINCREMENT keeps ids of deleted rows from being reissued
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS organizations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                tax_id TEXT NOT NULL UNIQUE,
                address TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS filings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                frequency TEXT NOT NULL,
                organization_id INTEGER NOT NULL
                    REFERENCES organizations(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_filings_organization_id
                ON filings(organization_id)
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Check out a connection for one request. It goes back to the pool when
    /// the session is dropped.
    pub async fn acquire(&self) -> fiscal_core::Result<DbSession> {
        let conn = self.pool.acquire().await.map_err(db_err)?;
        tracing::trace!("Storage session acquired");
        Ok(DbSession { conn })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// A pooled connection scoped to a single request
pub struct DbSession {
    conn: PoolConnection<Sqlite>,
}

impl DbSession {
    pub async fn ping(&mut self) -> fiscal_core::Result<()> {
        self.conn.ping().await.map_err(db_err)
    }
}

#[async_trait]
impl OrganizationStore for DbSession {
    async fn insert_organization(
        &mut self,
        org: &NewOrganization,
    ) -> fiscal_core::Result<Organization> {
        let row: OrganizationRow = sqlx::query_as(
            r#"
            INSERT INTO organizations (name, tax_id, address, email, phone)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, name, tax_id, address, email, phone
            "#,
        )
        .bind(&org.name)
        .bind(&org.tax_id)
        .bind(&org.address)
        .bind(&org.email)
        .bind(&org.phone)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(db_err)?;

        Ok(row.into_organization(Vec::new()))
    }

    async fn find_organization(
        &mut self,
        id: i64,
    ) -> fiscal_core::Result<Option<Organization>> {
        let mut tx = self.conn.begin().await.map_err(db_err)?;
        let org = fetch_organization(&mut tx, id).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(org)
    }

    async fn list_organizations(
        &mut self,
        page: Page,
    ) -> fiscal_core::Result<Vec<Organization>> {
        let mut tx = self.conn.begin().await.map_err(db_err)?;

        let rows: Vec<OrganizationRow> = sqlx::query_as(
            r#"
            SELECT id, name, tax_id, address, email, phone
            FROM organizations
            ORDER BY id
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(i64::from(page.limit))
        .bind(i64::from(page.skip))
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        let filings: Vec<FilingRow> = sqlx::query_as(
            r#"
            SELECT id, name, frequency, organization_id
            FROM filings
            WHERE organization_id IN (
                SELECT id FROM organizations ORDER BY id LIMIT ?1 OFFSET ?2
            )
            ORDER BY id
            "#,
        )
        .bind(i64::from(page.limit))
        .bind(i64::from(page.skip))
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok(attach_filings(rows, filings))
    }

    async fn update_organization(
        &mut self,
        id: i64,
        org: &NewOrganization,
    ) -> fiscal_core::Result<Option<Organization>> {
        let mut tx = self.conn.begin().await.map_err(db_err)?;

        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET name = ?1, tax_id = ?2, address = ?3, email = ?4, phone = ?5
            WHERE id = ?6
            "#,
        )
        .bind(&org.name)
        .bind(&org.tax_id)
        .bind(&org.address)
        .bind(&org.email)
        .bind(&org.phone)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let updated = fetch_organization(&mut tx, id).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    async fn delete_organization(&mut self, id: i64) -> fiscal_core::Result<bool> {
        // Owned filings go with it through ON DELETE CASCADE
        let result = sqlx::query(
            r#"
            DELETE FROM organizations WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(&mut *self.conn)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl FilingStore for DbSession {
    async fn insert_filing(&mut self, filing: &NewFiling) -> fiscal_core::Result<Filing> {
        let row: FilingRow = sqlx::query_as(
            r#"
            INSERT INTO filings (name, frequency, organization_id)
            VALUES (?1, ?2, ?3)
            RETURNING id, name, frequency, organization_id
            "#,
        )
        .bind(&filing.name)
        .bind(&filing.frequency)
        .bind(filing.organization_id)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(db_err)?;

        Ok(row.into())
    }

    async fn find_filing(&mut self, id: i64) -> fiscal_core::Result<Option<Filing>> {
        let row: Option<FilingRow> = sqlx::query_as(
            r#"
            SELECT id, name, frequency, organization_id
            FROM filings WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_filings(&mut self, page: Page) -> fiscal_core::Result<Vec<Filing>> {
        let rows: Vec<FilingRow> = sqlx::query_as(
            r#"
            SELECT id, name, frequency, organization_id
            FROM filings
            ORDER BY id
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(i64::from(page.limit))
        .bind(i64::from(page.skip))
        .fetch_all(&mut *self.conn)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_filing(
        &mut self,
        id: i64,
        filing: &NewFiling,
    ) -> fiscal_core::Result<Option<Filing>> {
        let row: Option<FilingRow> = sqlx::query_as(
            r#"
            UPDATE filings
            SET name = ?1, frequency = ?2, organization_id = ?3
            WHERE id = ?4
            RETURNING id, name, frequency, organization_id
            "#,
        )
        .bind(&filing.name)
        .bind(&filing.frequency)
        .bind(filing.organization_id)
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| r.into()))
    }

    async fn delete_filing(&mut self, id: i64) -> fiscal_core::Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM filings WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(&mut *self.conn)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }
}

async fn fetch_organization(
    conn: &mut SqliteConnection,
    id: i64,
) -> fiscal_core::Result<Option<Organization>> {
    let row: Option<OrganizationRow> = sqlx::query_as(
        r#"
        SELECT id, name, tax_id, address, email, phone
        FROM organizations WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_err)?;

    let Some(row) = row else {
        return Ok(None);
    };

    let filings: Vec<FilingRow> = sqlx::query_as(
        r#"
        SELECT id, name, frequency, organization_id
        FROM filings WHERE organization_id = ?1
        ORDER BY id
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;

    Ok(attach_filings(vec![row], filings).pop())
}

/// Group filings under their owners, keeping the order of both inputs.
fn attach_filings(rows: Vec<OrganizationRow>, filings: Vec<FilingRow>) -> Vec<Organization> {
    let mut by_owner: HashMap<i64, Vec<Filing>> = HashMap::new();
    for filing in filings {
        by_owner
            .entry(filing.organization_id)
            .or_default()
            .push(filing.into());
    }

    rows.into_iter()
        .map(|row| {
            let filings = by_owner.remove(&row.id).unwrap_or_default();
            row.into_organization(filings)
        })
        .collect()
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Translate constraint failures into domain errors; everything else is opaque.
fn db_err(e: sqlx::Error) -> FiscalError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return FiscalError::Conflict("CNPJ já cadastrado".to_string());
        }
        if db.is_foreign_key_violation() {
            return FiscalError::InvalidReference(
                "Empresa referenciada não existe".to_string(),
            );
        }
    }
    FiscalError::Database(e.to_string())
}

// Helper structs for sqlx query_as
#[derive(sqlx::FromRow)]
struct OrganizationRow {
    id: i64,
    name: String,
    tax_id: String,
    address: String,
    email: String,
    phone: String,
}

impl OrganizationRow {
    fn into_organization(self, filings: Vec<Filing>) -> Organization {
        Organization {
            id: self.id,
            name: self.name,
            tax_id: self.tax_id,
            address: self.address,
            email: self.email,
            phone: self.phone,
            filings,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FilingRow {
    id: i64,
    name: String,
    frequency: String,
    organization_id: i64,
}

impl From<FilingRow> for Filing {
    fn from(r: FilingRow) -> Self {
        Filing {
            id: r.id,
            name: r.name,
            frequency: r.frequency,
            organization_id: r.organization_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn session() -> (Database, DbSession) {
        let db = Database::connect("sqlite::memory:", 1).await.unwrap();
        let session = db.acquire().await.unwrap();
        (db, session)
    }

    fn organization(tax_id: &str) -> NewOrganization {
        NewOrganization {
            name: "Empresa Teste".to_string(),
            tax_id: tax_id.to_string(),
            address: "Rua Teste, 123".to_string(),
            email: "teste@empresa.com".to_string(),
            phone: "11999999999".to_string(),
        }
    }

    fn filing(organization_id: i64, name: &str) -> NewFiling {
        NewFiling {
            name: name.to_string(),
            frequency: "mensal".to_string(),
            organization_id,
        }
    }

    #[test]
    fn test_in_memory_detection() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:test?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://fiscal.db"));
    }

    #[tokio::test]
    async fn test_insert_and_find_organization() {
        let (_db, mut s) = session().await;

        let created = s.insert_organization(&organization("1")).await.unwrap();
        assert!(created.id > 0);
        assert!(created.filings.is_empty());

        let found = s.find_organization(created.id).await.unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(s.find_organization(999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_tax_id_is_conflict() {
        let (_db, mut s) = session().await;

        s.insert_organization(&organization("dup")).await.unwrap();
        let err = s.insert_organization(&organization("dup")).await.unwrap_err();
        assert!(matches!(err, FiscalError::Conflict(_)));

        let other = s.insert_organization(&organization("other")).await.unwrap();
        let err = s
            .update_organization(other.id, &organization("dup"))
            .await
            .unwrap_err();
        assert!(matches!(err, FiscalError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_filing_requires_existing_organization() {
        let (_db, mut s) = session().await;

        let err = s.insert_filing(&filing(42, "DCTF")).await.unwrap_err();
        assert!(matches!(err, FiscalError::InvalidReference(_)));

        let org = s.insert_organization(&organization("1")).await.unwrap();
        let created = s.insert_filing(&filing(org.id, "DCTF")).await.unwrap();
        let err = s
            .update_filing(created.id, &filing(42, "DCTF"))
            .await
            .unwrap_err();
        assert!(matches!(err, FiscalError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_delete_organization_cascades() {
        let (_db, mut s) = session().await;

        let org = s.insert_organization(&organization("1")).await.unwrap();
        let keep = s.insert_organization(&organization("2")).await.unwrap();
        let a = s.insert_filing(&filing(org.id, "DCTF")).await.unwrap();
        let b = s.insert_filing(&filing(org.id, "SPED")).await.unwrap();
        let c = s.insert_filing(&filing(keep.id, "EFD")).await.unwrap();

        let nested = s.find_organization(org.id).await.unwrap().unwrap();
        assert_eq!(nested.filings, vec![a.clone(), b.clone()]);

        assert!(s.delete_organization(org.id).await.unwrap());
        assert_eq!(s.find_filing(a.id).await.unwrap(), None);
        assert_eq!(s.find_filing(b.id).await.unwrap(), None);
        assert_eq!(s.find_filing(c.id).await.unwrap(), Some(c));

        assert!(!s.delete_organization(org.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_replaces_every_field() {
        let (_db, mut s) = session().await;

        let org = s.insert_organization(&organization("1")).await.unwrap();
        let replacement = NewOrganization {
            name: "Empresa Atualizada".to_string(),
            tax_id: "99".to_string(),
            address: "Av. Nova, 1".to_string(),
            email: "novo@empresa.com".to_string(),
            phone: "1100000000".to_string(),
        };

        let updated = s
            .update_organization(org.id, &replacement)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, org.id);
        assert_eq!(updated.name, replacement.name);
        assert_eq!(updated.tax_id, replacement.tax_id);
        assert_eq!(updated.address, replacement.address);
        assert_eq!(updated.email, replacement.email);
        assert_eq!(updated.phone, replacement.phone);

        assert_eq!(s.update_organization(999, &replacement).await.unwrap(), None);
        assert_eq!(
            s.update_filing(999, &filing(org.id, "x")).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_list_respects_page_and_order() {
        let (_db, mut s) = session().await;

        assert!(s.list_organizations(Page::default()).await.unwrap().is_empty());

        let mut ids = Vec::new();
        for i in 0..5 {
            let org = s
                .insert_organization(&organization(&i.to_string()))
                .await
                .unwrap();
            s.insert_filing(&filing(org.id, "DCTF")).await.unwrap();
            ids.push(org.id);
        }

        let all = s.list_organizations(Page::default()).await.unwrap();
        assert_eq!(all.iter().map(|o| o.id).collect::<Vec<_>>(), ids);
        assert!(all.iter().all(|o| o.filings.len() == 1));

        let window = s
            .list_organizations(Page { skip: 1, limit: 2 })
            .await
            .unwrap();
        assert_eq!(
            window.iter().map(|o| o.id).collect::<Vec<_>>(),
            ids[1..3].to_vec()
        );
        assert!(window.iter().all(|o| o.filings[0].organization_id == o.id));

        let filings = s.list_filings(Page { skip: 3, limit: 100 }).await.unwrap();
        assert_eq!(filings.len(), 2);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let (_db, mut s) = session().await;

        let first = s.insert_organization(&organization("1")).await.unwrap();
        assert!(s.delete_organization(first.id).await.unwrap());
        let second = s.insert_organization(&organization("1")).await.unwrap();
        assert!(second.id > first.id);
    }
}
