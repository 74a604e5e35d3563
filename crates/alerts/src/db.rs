//! SQLite storage for destinations and notified events.

use async_trait::async_trait;
use buyalert_core::{AlertFrequency, ConfigError, DestinationConfig, DestinationId};
use buyalert_engine::{DedupStore, DestinationRegistry, StoreError, StoreResult};
use chrono::{DateTime, Duration, Utc};
use compact_str::CompactString;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Invalid destination configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("Total supply out of range: {0}")]
    SupplyOutOfRange(u64),
    #[error("Retention must be at least one day, got {0}")]
    InvalidRetention(i64),
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        StoreError::new(e.to_string())
    }
}

type DestinationRow = (String, String, String, String, i64, f64, String, bool, i64, i64);

const DESTINATION_COLUMNS: &str = "destination_id, token_address, token_symbol, venue_name, \
     total_supply, min_buy_threshold, alert_frequency, is_active, created_at, updated_at";

/// Database connection for the bot.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the SQLite database at the given URL and run migrations.
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        // Every connection to an in-memory database is a separate database
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS destinations (
                destination_id TEXT PRIMARY KEY,
                token_address TEXT NOT NULL,
                token_symbol TEXT NOT NULL,
                venue_name TEXT NOT NULL,
                total_supply INTEGER NOT NULL,
                min_buy_threshold REAL NOT NULL DEFAULT 0,
                alert_frequency TEXT NOT NULL DEFAULT 'every_buy',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notified_events (
                destination_id TEXT NOT NULL,
                event_hash TEXT NOT NULL,
                notified_at INTEGER NOT NULL,
                PRIMARY KEY (destination_id, event_hash)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_notified_at ON notified_events(notified_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a destination. `created_at` of an existing row is kept.
    pub async fn save_destination(&self, config: &DestinationConfig) -> Result<(), DbError> {
        config.validate()?;
        let total_supply = i64::try_from(config.total_supply)
            .map_err(|_| DbError::SupplyOutOfRange(config.total_supply))?;

        sqlx::query(
            r#"
            INSERT INTO destinations (destination_id, token_address, token_symbol, venue_name,
                total_supply, min_buy_threshold, alert_frequency, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(destination_id) DO UPDATE SET
                token_address = excluded.token_address,
                token_symbol = excluded.token_symbol,
                venue_name = excluded.venue_name,
                total_supply = excluded.total_supply,
                min_buy_threshold = excluded.min_buy_threshold,
                alert_frequency = excluded.alert_frequency,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(config.destination_id.as_str())
        .bind(&config.token_address)
        .bind(config.token_symbol.as_str())
        .bind(&config.venue_name)
        .bind(total_supply)
        .bind(config.min_buy_threshold)
        .bind(config.alert_frequency.as_str())
        .bind(config.is_active)
        .bind(config.created_at.timestamp())
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_destination(
        &self,
        destination_id: &DestinationId,
    ) -> Result<Option<DestinationConfig>, DbError> {
        let row = sqlx::query_as::<_, DestinationRow>(&format!(
            "SELECT {DESTINATION_COLUMNS} FROM destinations WHERE destination_id = ?"
        ))
        .bind(destination_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(destination_from_row))
    }

    /// Pause or resume a destination. Returns false if it does not exist.
    pub async fn set_active(
        &self,
        destination_id: &DestinationId,
        active: bool,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            "UPDATE destinations SET is_active = ?, updated_at = ? WHERE destination_id = ?",
        )
        .bind(active)
        .bind(Utc::now().timestamp())
        .bind(destination_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All active destinations, oldest first.
    pub async fn list_active_destinations(&self) -> Result<Vec<DestinationConfig>, DbError> {
        let rows = sqlx::query_as::<_, DestinationRow>(&format!(
            "SELECT {DESTINATION_COLUMNS} FROM destinations WHERE is_active = 1 \
             ORDER BY created_at, destination_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(destination_from_row).collect())
    }

    pub async fn is_notified(
        &self,
        destination_id: &DestinationId,
        event_hash: &str,
    ) -> Result<bool, DbError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notified_events WHERE destination_id = ? AND event_hash = ?",
        )
        .bind(destination_id.as_str())
        .bind(event_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Record a delivered alert. Returns false if it was already recorded.
    pub async fn mark_notified(
        &self,
        destination_id: &DestinationId,
        event_hash: &str,
    ) -> Result<bool, DbError> {
        self.mark_notified_at(destination_id, event_hash, Utc::now())
            .await
    }

    /// [`Database::mark_notified`] with an explicit timestamp.
    pub async fn mark_notified_at(
        &self,
        destination_id: &DestinationId,
        event_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO notified_events (destination_id, event_hash, notified_at) \
             VALUES (?, ?, ?)",
        )
        .bind(destination_id.as_str())
        .bind(event_hash)
        .bind(at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete notified events older than `days`. Returns the number removed.
    pub async fn purge_notified_older_than(&self, days: i64) -> Result<u64, DbError> {
        let age = Duration::try_days(days)
            .filter(|_| days >= 1)
            .ok_or(DbError::InvalidRetention(days))?;
        let cutoff = Utc::now() - age;
        let result = sqlx::query("DELETE FROM notified_events WHERE notified_at < ?")
            .bind(cutoff.timestamp())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_notified(&self) -> Result<u64, DbError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notified_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

fn destination_from_row(row: DestinationRow) -> DestinationConfig {
    let (
        destination_id,
        token_address,
        token_symbol,
        venue_name,
        total_supply,
        min_buy_threshold,
        alert_frequency,
        is_active,
        created_at,
        updated_at,
    ) = row;

    DestinationConfig {
        destination_id: DestinationId::from(destination_id),
        token_address,
        token_symbol: CompactString::from(token_symbol),
        venue_name,
        total_supply: total_supply.max(0) as u64,
        min_buy_threshold,
        alert_frequency: alert_frequency.parse().unwrap_or(AlertFrequency::EveryBuy),
        is_active,
        created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_default(),
        updated_at: DateTime::from_timestamp(updated_at, 0).unwrap_or_default(),
    }
}

#[async_trait]
impl DestinationRegistry for Database {
    async fn list_active_destinations(&self) -> StoreResult<Vec<DestinationConfig>> {
        Ok(Database::list_active_destinations(self).await?)
    }
}

#[async_trait]
impl DedupStore for Database {
    async fn exists(&self, destination_id: &DestinationId, event_hash: &str) -> StoreResult<bool> {
        Ok(self.is_notified(destination_id, event_hash).await?)
    }

    async fn insert(&self, destination_id: &DestinationId, event_hash: &str) -> StoreResult<bool> {
        Ok(self.mark_notified(destination_id, event_hash).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ADDR: &str = "0x049d36570d4e46f48e99674bd3fcc84644ddd6b96f7c741b1562b82f9e004dc7";

    fn sample(id: &str) -> DestinationConfig {
        DestinationConfig::new(id, ADDR, "SLAY", "Ekubo", 1_000_000, 50.0)
    }

    #[tokio::test]
    async fn test_save_and_get_destination() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let config = sample("-100");
        db.save_destination(&config).await.unwrap();

        let loaded = db.get_destination(&config.destination_id).await.unwrap().unwrap();
        assert_eq!(loaded.token_address, ADDR);
        assert_eq!(loaded.token_symbol.as_str(), "SLAY");
        assert_eq!(loaded.venue_name, "Ekubo");
        assert_eq!(loaded.total_supply, 1_000_000);
        assert_eq!(loaded.min_buy_threshold, 50.0);
        assert_eq!(loaded.alert_frequency, AlertFrequency::EveryBuy);
        assert!(loaded.is_active);

        let missing = db.get_destination(&DestinationId::from("-200")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_save_is_upsert_preserving_created_at() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let mut config = sample("-100");
        config.created_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        db.save_destination(&config).await.unwrap();

        let mut updated = sample("-100");
        updated.min_buy_threshold = 10.0;
        updated.token_symbol = CompactString::new("NEW");
        db.save_destination(&updated).await.unwrap();

        let loaded = db.get_destination(&config.destination_id).await.unwrap().unwrap();
        assert_eq!(loaded.min_buy_threshold, 10.0);
        assert_eq!(loaded.token_symbol.as_str(), "NEW");
        assert_eq!(loaded.created_at.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_config() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let mut config = sample("-100");
        config.total_supply = 0;
        assert!(matches!(
            db.save_destination(&config).await,
            Err(DbError::InvalidConfig(ConfigError::ZeroSupply))
        ));
    }

    #[tokio::test]
    async fn test_set_active_filters_listing() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.save_destination(&sample("-100")).await.unwrap();
        db.save_destination(&sample("-200")).await.unwrap();

        let active = db.list_active_destinations().await.unwrap();
        assert_eq!(active.len(), 2);

        assert!(db.set_active(&DestinationId::from("-100"), false).await.unwrap());
        let active = db.list_active_destinations().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].destination_id.as_str(), "-200");

        assert!(!db.set_active(&DestinationId::from("-999"), false).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_notified_is_idempotent() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let dest = DestinationId::from("-100");

        assert!(!db.is_notified(&dest, "0xaa").await.unwrap());
        assert!(db.mark_notified(&dest, "0xaa").await.unwrap());
        assert!(!db.mark_notified(&dest, "0xaa").await.unwrap());
        assert!(db.is_notified(&dest, "0xaa").await.unwrap());
        assert!(!db.is_notified(&DestinationId::from("-200"), "0xaa").await.unwrap());
        assert_eq!(db.count_notified().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purge_removes_only_old_entries() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let dest = DestinationId::from("-100");

        db.mark_notified_at(&dest, "0xold", Utc::now() - Duration::days(8))
            .await
            .unwrap();
        db.mark_notified(&dest, "0xnew").await.unwrap();

        assert_eq!(db.purge_notified_older_than(7).await.unwrap(), 1);
        assert!(!db.is_notified(&dest, "0xold").await.unwrap());
        assert!(db.is_notified(&dest, "0xnew").await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_rejects_invalid_retention() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let dest = DestinationId::from("-100");
        db.mark_notified(&dest, "0xnew").await.unwrap();

        for days in [0, -1, i64::MAX] {
            assert!(matches!(
                db.purge_notified_older_than(days).await,
                Err(DbError::InvalidRetention(d)) if d == days
            ));
        }
        assert_eq!(db.count_notified().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_engine_traits_delegate() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.save_destination(&sample("-100")).await.unwrap();

        let registry: &dyn DestinationRegistry = &db;
        assert_eq!(registry.list_active_destinations().await.unwrap().len(), 1);

        let dedup: &dyn DedupStore = &db;
        let dest = DestinationId::from("-100");
        assert!(dedup.insert(&dest, "0xaa").await.unwrap());
        assert!(dedup.exists(&dest, "0xaa").await.unwrap());
    }
}
