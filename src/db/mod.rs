mod category;
mod product;
mod user;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub use category::{Category, CategoryStore};
pub use product::{Feature, NewProduct, Product, ProductStore};
pub use user::{User, UserStore};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path.
    /// Use ":memory:" for an in-memory database.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        let (url, max_connections) = if path == ":memory:" {
            // Every in-memory connection is its own database, so keep one.
            ("sqlite::memory:".to_string(), 1)
        } else {
            (format!("sqlite:{}?mode=rwc", path), 5)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the current schema version.
    async fn get_version(&self) -> Result<i32, sqlx::Error> {
        let result: Option<(i32,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.map(|r| r.0).unwrap_or(0))
    }

    /// Set the schema version within a transaction.
    async fn set_version(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        version: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM schema_version")
            .execute(&mut **tx)
            .await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Run database migrations.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let version = self.get_version().await?;

        if version < 1 {
            self.migrate_v1().await?;
        }

        Ok(())
    }

    /// Execute a list of queries in a transaction, then set the version.
    async fn run_migration(
        &self,
        version: i32,
        queries: &[&'static str],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for query in queries {
            sqlx::query(*query).execute(&mut *tx).await?;
        }
        Self::set_version(&mut tx, version).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn migrate_v1(&self) -> Result<(), sqlx::Error> {
        self.run_migration(
            1,
            &[
                "CREATE TABLE users (
                    id TEXT PRIMARY KEY NOT NULL,
                    name TEXT UNIQUE NOT NULL,
                    password TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE TABLE categories (
                    id TEXT PRIMARY KEY NOT NULL,
                    name TEXT UNIQUE NOT NULL
                )",
                "CREATE TABLE products (
                    id TEXT PRIMARY KEY NOT NULL,
                    name TEXT NOT NULL,
                    price REAL NOT NULL,
                    amount INTEGER NOT NULL,
                    description TEXT NOT NULL,
                    category_id TEXT NOT NULL REFERENCES categories(id),
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_products_category_id ON products(category_id)",
                // Each feature is a typed entry hanging off a product
                "CREATE TABLE feature_types (
                    id TEXT PRIMARY KEY NOT NULL,
                    product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
                    type TEXT NOT NULL
                )",
                "CREATE INDEX idx_feature_types_product_id ON feature_types(product_id)",
                "CREATE TABLE features (
                    id TEXT PRIMARY KEY NOT NULL,
                    type_id TEXT NOT NULL REFERENCES feature_types(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    details TEXT NOT NULL DEFAULT ''
                )",
                "CREATE INDEX idx_features_type_id ON features(type_id)",
            ],
        )
        .await
    }

    /// Get the user store.
    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    /// Get the category store.
    pub fn categories(&self) -> CategoryStore {
        CategoryStore::new(self.pool.clone())
    }

    /// Get the product store.
    pub fn products(&self) -> ProductStore {
        ProductStore::new(self.pool.clone())
    }

    /// Get the underlying connection pool (for tests that need raw SQL access).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Count rows of `table` whose `column` equals `value`.
    ///
    /// Table and column names are interpolated, so they must be plain identifiers.
    pub async fn count_matching(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<i64, sqlx::Error> {
        if !is_identifier(table) || !is_identifier(column) {
            return Err(sqlx::Error::Protocol(format!(
                "refusing to query {}.{}",
                table, column
            )));
        }

        let query = format!("SELECT COUNT(*) FROM {} WHERE {} = ?", table, column);
        let count: (i64,) = sqlx::query_as(&query)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether the write was rejected by a UNIQUE constraint.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Whether the write was rejected by a FOREIGN KEY constraint.
pub fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}
