//! Order projection - order lifecycle from exchange events
//!
//! Three tables mirror the three event streams: `orders` (created),
//! `fills` and `cancels`. An order is open while its id appears in
//! neither of the latter two.

use crate::error::{from_sql_int, to_sql_int, ProjectionError};
use gcdex_core::{Address, TokenAmount};
use gcdex_events::{DomainEvent, EventRecord};
use gcdex_exchange::{OrderId, OrderStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

/// An order as seen by the read side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    pub id: OrderId,
    /// Creator
    pub user: Address,
    pub token_get: Address,
    pub amount_get: TokenAmount,
    pub token_give: Address,
    pub amount_give: TokenAmount,
    /// Creation time, unix seconds
    pub timestamp: u64,
    pub status: OrderStatus,
    /// Set once filled
    pub filler: Option<Address>,
    pub fee: Option<TokenAmount>,
    /// Fill or cancel time
    pub closed_at: Option<u64>,
}

impl OrderView {
    /// True if `address` created or filled this order
    pub fn involves(&self, address: &Address) -> bool {
        self.user == *address || self.filler.as_ref() == Some(address)
    }
}

const SELECT_ORDERS: &str = r#"
    SELECT o.id, o.user, o.token_get, o.amount_get, o.token_give, o.amount_give, o.timestamp,
           f.filler, f.fee, f.timestamp AS filled_at, c.timestamp AS cancelled_at
    FROM orders o
    LEFT JOIN fills f ON f.id = o.id
    LEFT JOIN cancels c ON c.id = o.id
"#;

/// Order projection - tracks every order and how it closed
pub struct OrderProjection {
    pool: SqlitePool,
}

impl OrderProjection {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the schema
    pub async fn init(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY,
                user TEXT NOT NULL,
                token_get TEXT NOT NULL,
                amount_get TEXT NOT NULL,
                token_give TEXT NOT NULL,
                amount_give TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS fills (
                id INTEGER PRIMARY KEY,
                filler TEXT NOT NULL,
                fee TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cancels (
                id INTEGER PRIMARY KEY,
                timestamp INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Apply one committed record; non-order events are ignored
    pub async fn apply(&self, record: &EventRecord) -> Result<(), ProjectionError> {
        match &record.event {
            DomainEvent::OrderCreated {
                id,
                user,
                token_get,
                amount_get,
                token_give,
                amount_give,
                timestamp,
            } => {
                sqlx::query(
                    r#"
                    INSERT OR REPLACE INTO orders
                    (id, user, token_get, amount_get, token_give, amount_give, timestamp)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(to_sql_int(*id, "id")?)
                .bind(user.to_string())
                .bind(token_get.to_string())
                .bind(amount_get.to_string())
                .bind(token_give.to_string())
                .bind(amount_give.to_string())
                .bind(to_sql_int(*timestamp, "timestamp")?)
                .execute(&self.pool)
                .await?;
            }
            DomainEvent::OrderFilled {
                id,
                user,
                fee,
                timestamp,
                ..
            } => {
                sqlx::query("INSERT OR REPLACE INTO fills (id, filler, fee, timestamp) VALUES (?, ?, ?, ?)")
                    .bind(to_sql_int(*id, "id")?)
                    .bind(user.to_string())
                    .bind(fee.to_string())
                    .bind(to_sql_int(*timestamp, "timestamp")?)
                    .execute(&self.pool)
                    .await?;
            }
            DomainEvent::OrderCancelled { id, timestamp, .. } => {
                sqlx::query("INSERT OR REPLACE INTO cancels (id, timestamp) VALUES (?, ?)")
                    .bind(to_sql_int(*id, "id")?)
                    .bind(to_sql_int(*timestamp, "timestamp")?)
                    .execute(&self.pool)
                    .await?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Every order, by id
    pub async fn all_orders(&self) -> Result<Vec<OrderView>, ProjectionError> {
        self.select("ORDER BY o.id").await
    }

    /// Filled orders, most recently filled first
    pub async fn filled_orders(&self) -> Result<Vec<OrderView>, ProjectionError> {
        self.select("WHERE f.id IS NOT NULL ORDER BY f.timestamp DESC, o.id DESC")
            .await
    }

    /// Cancelled orders, by id
    pub async fn cancelled_orders(&self) -> Result<Vec<OrderView>, ProjectionError> {
        self.select("WHERE c.id IS NOT NULL ORDER BY o.id").await
    }

    /// Orders neither filled nor cancelled, by id
    pub async fn open_orders(&self) -> Result<Vec<OrderView>, ProjectionError> {
        self.select("WHERE f.id IS NULL AND c.id IS NULL ORDER BY o.id")
            .await
    }

    /// Open orders created by `user`, newest first
    pub async fn user_open_orders(&self, user: &Address) -> Result<Vec<OrderView>, ProjectionError> {
        let sql = format!(
            "{SELECT_ORDERS} WHERE f.id IS NULL AND c.id IS NULL AND o.user = ? ORDER BY o.timestamp DESC, o.id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(order_from_row).collect()
    }

    /// Filled orders where `user` was the filler or the creator, newest first
    pub async fn user_trades(&self, user: &Address) -> Result<Vec<OrderView>, ProjectionError> {
        let sql = format!(
            "{SELECT_ORDERS} WHERE f.id IS NOT NULL AND (f.filler = ? OR o.user = ?) ORDER BY f.timestamp DESC, o.id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user.to_string())
            .bind(user.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(order_from_row).collect()
    }

    pub async fn order(&self, id: OrderId) -> Result<Option<OrderView>, ProjectionError> {
        let sql = format!("{SELECT_ORDERS} WHERE o.id = ?");
        let row = sqlx::query(&sql)
            .bind(to_sql_int(id, "id")?)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(order_from_row).transpose()
    }

    /// Clear all orders (for replay)
    pub async fn clear(&self) -> Result<(), sqlx::Error> {
        for table in ["orders", "fills", "cancels"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    async fn select(&self, tail: &str) -> Result<Vec<OrderView>, ProjectionError> {
        let sql = format!("{SELECT_ORDERS} {tail}");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(order_from_row).collect()
    }
}

fn parse<T: FromStr>(row: &SqliteRow, column: &str) -> Result<T, ProjectionError>
where
    T::Err: std::fmt::Display,
{
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|e| ProjectionError::Corrupt(format!("{column} = {raw}: {e}")))
}

fn parse_opt<T: FromStr>(row: &SqliteRow, column: &str) -> Result<Option<T>, ProjectionError>
where
    T::Err: std::fmt::Display,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|raw| {
        raw.parse()
            .map_err(|e| ProjectionError::Corrupt(format!("{column} = {raw}: {e}")))
    })
    .transpose()
}

fn order_from_row(row: &SqliteRow) -> Result<OrderView, ProjectionError> {
    let filled_at: Option<i64> = row.try_get("filled_at")?;
    let cancelled_at: Option<i64> = row.try_get("cancelled_at")?;
    let (status, closed_at) = match (filled_at, cancelled_at) {
        (Some(t), _) => (OrderStatus::Filled, Some(from_sql_int(t, "filled_at")?)),
        (None, Some(t)) => (OrderStatus::Cancelled, Some(from_sql_int(t, "cancelled_at")?)),
        (None, None) => (OrderStatus::Open, None),
    };

    Ok(OrderView {
        id: from_sql_int(row.try_get("id")?, "id")?,
        user: parse(row, "user")?,
        token_get: parse(row, "token_get")?,
        amount_get: parse(row, "amount_get")?,
        token_give: parse(row, "token_give")?,
        amount_give: parse(row, "amount_give")?,
        timestamp: from_sql_int(row.try_get("timestamp")?, "timestamp")?,
        status,
        filler: parse_opt(row, "filler")?,
        fee: parse_opt(row, "fee")?,
        closed_at,
    })
}
