use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// A registered credential. Never updated or deleted once created.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    /// PHC-formatted password hash
    pub password: String,
    pub created_at: String,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new user with an already hashed password.
    pub async fn create(&self, id: &str, name: &str, password_hash: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO users (id, name, password) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Get a user by login name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT id, name, password, created_at FROM users WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    /// Get a user by id.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT id, name, password, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}
