use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct CategoryStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl CategoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, id: &str, name: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO categories (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as("SELECT id, name FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn test_create_and_get_category() {
        let db = Database::open(":memory:").await.unwrap();

        db.categories().create("cat-1", "books").await.unwrap();

        let category = db.categories().get_by_id("cat-1").await.unwrap();
        assert_eq!(
            category,
            Some(Category {
                id: "cat-1".to_string(),
                name: "books".to_string(),
            })
        );
        assert!(db.categories().get_by_id("cat-2").await.unwrap().is_none());
    }
}
