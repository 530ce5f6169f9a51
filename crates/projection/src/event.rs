//! Event projection - per-user event history

use crate::error::{from_sql_int, to_sql_int, ProjectionError};
use gcdex_core::Address;
use gcdex_events::{DomainEvent, EventRecord};
use sqlx::{Row, SqlitePool};

/// The account an event is filed under: the `user` of exchange events.
/// Token `Transfer`/`Approval` events are not per-user history.
fn acting_user(event: &DomainEvent) -> Option<&Address> {
    match event {
        DomainEvent::Deposit { user, .. }
        | DomainEvent::Withdraw { user, .. }
        | DomainEvent::OrderCreated { user, .. }
        | DomainEvent::OrderCancelled { user, .. }
        | DomainEvent::OrderFilled { user, .. } => Some(user),
        DomainEvent::Transfer { .. } | DomainEvent::Approval { .. } => None,
    }
}

/// Stores every committed record, indexed by acting user
pub struct EventProjection {
    pool: SqlitePool,
}

impl EventProjection {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the schema
    pub async fn init(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                user TEXT,
                timestamp INTEGER NOT NULL,
                record TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_user ON events(user)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn apply(&self, record: &EventRecord) -> Result<(), ProjectionError> {
        let json = serde_json::to_string(record)?;
        sqlx::query("INSERT OR REPLACE INTO events (id, name, user, timestamp, record) VALUES (?, ?, ?, ?, ?)")
            .bind(to_sql_int(record.id, "id")?)
            .bind(record.event.name())
            .bind(acting_user(&record.event).map(|u| u.to_string()))
            .bind(to_sql_int(record.timestamp, "timestamp")?)
            .bind(json)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Deposits, withdrawals and order events where `user` acted, in log order
    pub async fn user_events(&self, user: &Address) -> Result<Vec<EventRecord>, ProjectionError> {
        let rows = sqlx::query("SELECT record FROM events WHERE user = ? ORDER BY id")
            .bind(user.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<EventRecord, ProjectionError> {
                let json: String = row.try_get("record")?;
                Ok(serde_json::from_str(&json)?)
            })
            .collect()
    }

    /// Highest event id applied, 0 when empty
    pub async fn last_event_id(&self) -> Result<u64, ProjectionError> {
        let row = sqlx::query("SELECT COALESCE(MAX(id), 0) AS last FROM events")
            .fetch_one(&self.pool)
            .await?;
        from_sql_int(row.try_get("last")?, "id")
    }

    /// Clear all events (for replay)
    pub async fn clear(&self) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM events").execute(&self.pool).await?;
        Ok(())
    }
}
