//! SQLite-backed store, enabled with the `database` cargo feature. The
//! aggregate is persisted as a JSON payload next to dedicated `status` and
//! `version` columns; the version column carries the optimistic-concurrency
//! check, and the status log plus the review/decision projections are
//! written in the same transaction as the aggregate.

#[cfg(feature = "database")]
use async_trait::async_trait;
#[cfg(feature = "database")]
use chrono::{DateTime, Utc};
#[cfg(feature = "database")]
use sqlx::{migrate::MigrateDatabase, Row, SqlitePool};
#[cfg(feature = "database")]
use tracing::info;

#[cfg(feature = "database")]
use crate::audit_trail::StatusLogEntry;
#[cfg(feature = "database")]
use crate::domain::{Actor, ActorId, Audit, AuditId, AuditStatus, StaffRole};
#[cfg(feature = "database")]
use crate::store::{AuditStore, StoreError};

#[cfg(feature = "database")]
pub struct SqliteAuditStore {
    pool: SqlitePool,
}

#[cfg(feature = "database")]
impl SqliteAuditStore {
    /// Open (creating if necessary) the database and run migrations.
    pub async fn new(database_url: &str, auto_migrate: bool) -> Result<Self, StoreError> {
        if !sqlx::Sqlite::database_exists(database_url).await? {
            info!("Creating database at {}", database_url);
            sqlx::Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePool::connect(database_url).await?;

        if auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn shutdown(&self) {
        info!("Shutting down database connections...");
        self.pool.close().await;
    }

    async fn write_projections<'a>(
        tx: &mut sqlx::Transaction<'a, sqlx::Sqlite>,
        audit: &Audit,
    ) -> Result<(), StoreError> {
        if let Some(review) = &audit.technical_review {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO technical_review
                    (audit_id, reviewer, approved, checklist, voided, completed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(audit.id.to_string())
            .bind(review.reviewer.as_str())
            .bind(review.approved)
            .bind(serde_json::to_string(&review.checklist)?)
            .bind(review.voided)
            .bind(review.completed_at.map(|t| t.to_rfc3339()))
            .execute(&mut **tx)
            .await?;
        }
        if let Some(decision) = &audit.decision {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO certification_decision
                    (audit_id, decision_maker, outcome, justification, voided, decided_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(audit.id.to_string())
            .bind(decision.decision_maker.as_str())
            .bind(decision.outcome.to_string())
            .bind(&decision.justification)
            .bind(decision.voided)
            .bind(decision.decided_at.to_rfc3339())
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// CAS update of the aggregate row. Returns the stored version on a
    /// version mismatch so the error can report what was found.
    async fn update_aggregate<'a>(
        tx: &mut sqlx::Transaction<'a, sqlx::Sqlite>,
        expected_version: u64,
        audit: &Audit,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE audit
            SET status = ?1, version = ?2, payload = ?3, updated_at = ?4
            WHERE id = ?5 AND version = ?6
            "#,
        )
        .bind(audit.status.as_str())
        .bind(audit.version as i64)
        .bind(serde_json::to_string(audit)?)
        .bind(audit.updated_at.to_rfc3339())
        .bind(audit.id.to_string())
        .bind(expected_version as i64)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let row = sqlx::query("SELECT version FROM audit WHERE id = ?1")
            .bind(audit.id.to_string())
            .fetch_optional(&mut **tx)
            .await?;
        match row {
            Some(row) => Err(StoreError::VersionConflict {
                audit_id: audit.id,
                expected: expected_version,
                found: row.get::<i64, _>("version") as u64,
            }),
            None => Err(StoreError::AuditNotFound(audit.id)),
        }
    }

    fn parse_timestamp(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }
}

#[cfg(feature = "database")]
#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn create_audit(&self, audit: Audit) -> Result<(), StoreError> {
        let existing = sqlx::query("SELECT id FROM audit WHERE id = ?1")
            .bind(audit.id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(StoreError::AuditAlreadyExists(audit.id));
        }

        sqlx::query(
            r#"
            INSERT INTO audit (id, organization, status, version, payload, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(audit.id.to_string())
        .bind(&audit.organization)
        .bind(audit.status.as_str())
        .bind(audit.version as i64)
        .bind(serde_json::to_string(&audit)?)
        .bind(audit.created_at.to_rfc3339())
        .bind(audit.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load(&self, id: &AuditId) -> Result<Audit, StoreError> {
        let row = sqlx::query("SELECT payload FROM audit WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(serde_json::from_str(row.get::<String, _>("payload").as_str())?),
            None => Err(StoreError::AuditNotFound(*id)),
        }
    }

    async fn save(&self, expected_version: u64, mut audit: Audit) -> Result<Audit, StoreError> {
        audit.version = expected_version + 1;
        audit.updated_at = Utc::now();

        let mut tx = self.pool.begin().await?;
        Self::update_aggregate(&mut tx, expected_version, &audit).await?;
        Self::write_projections(&mut tx, &audit).await?;
        tx.commit().await?;
        Ok(audit)
    }

    async fn commit_transition(
        &self,
        expected_version: u64,
        mut audit: Audit,
        entry: StatusLogEntry,
    ) -> Result<Audit, StoreError> {
        audit.version = expected_version + 1;
        audit.updated_at = entry.changed_at;

        let mut tx = self.pool.begin().await?;
        Self::update_aggregate(&mut tx, expected_version, &audit).await?;
        sqlx::query(
            r#"
            INSERT INTO audit_status_log
                (audit_id, from_status, to_status, actor_id, justification, changed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(entry.audit_id.to_string())
        .bind(entry.from_status.as_str())
        .bind(entry.to_status.as_str())
        .bind(entry.actor.as_str())
        .bind(&entry.justification)
        .bind(entry.changed_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;
        Self::write_projections(&mut tx, &audit).await?;
        tx.commit().await?;
        Ok(audit)
    }

    async fn log_entries(&self, id: &AuditId) -> Result<Vec<StatusLogEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT audit_id, from_status, to_status, actor_id, justification, changed_at
            FROM audit_status_log
            WHERE audit_id = ?1
            ORDER BY changed_at ASC, id ASC
            "#,
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let entries = rows
            .into_iter()
            .filter_map(|row| {
                let from = AuditStatus::parse(row.get::<String, _>("from_status").as_str())?;
                let to = AuditStatus::parse(row.get::<String, _>("to_status").as_str())?;
                Some(StatusLogEntry {
                    audit_id: *id,
                    from_status: from,
                    to_status: to,
                    actor: ActorId::new(row.get::<String, _>("actor_id")),
                    changed_at: Self::parse_timestamp(row.get::<String, _>("changed_at").as_str()),
                    justification: row.get::<Option<String>, _>("justification"),
                })
            })
            .collect();
        Ok(entries)
    }

    async fn register_actor(&self, actor: Actor) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO actor (id, name, role)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(actor.id.as_str())
        .bind(&actor.name)
        .bind(serde_json::to_string(&actor.role)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn actor(&self, id: &ActorId) -> Result<Actor, StoreError> {
        let row = sqlx::query("SELECT id, name, role FROM actor WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let role: StaffRole =
                    serde_json::from_str(row.get::<String, _>("role").as_str())?;
                Ok(Actor {
                    id: id.clone(),
                    name: row.get("name"),
                    role,
                })
            }
            None => Err(StoreError::ActorNotFound(id.clone())),
        }
    }

    async fn remove_actor(&self, id: &ActorId) -> Result<(), StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS entries FROM audit_status_log WHERE actor_id = ?1",
        )
        .bind(id.as_str())
        .fetch_one(&self.pool)
        .await?;
        let entries = row.get::<i64, _>("entries") as usize;
        if entries > 0 {
            return Err(StoreError::ActorReferenced {
                actor: id.clone(),
                entries,
            });
        }

        let result = sqlx::query("DELETE FROM actor WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ActorNotFound(id.clone()));
        }
        Ok(())
    }
}
