//! Product storage. A product and all of its features are written atomically.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct ProductStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct Feature {
    pub kind: String,
    pub name: String,
    pub details: String,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub amount: i64,
    pub description: String,
    pub category_id: String,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub amount: i64,
    pub description: String,
    pub category_id: String,
    pub created_at: String,
}

impl ProductStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a product with its feature rows in one transaction.
    ///
    /// Any failure before commit drops the transaction, which rolls back every
    /// row written so far. That includes unwinding from a panic or the task
    /// being aborted.
    pub async fn create(&self, id: &str, product: &NewProduct) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO products (id, name, price, amount, description, category_id) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.amount)
        .bind(&product.description)
        .bind(&product.category_id)
        .execute(&mut *tx)
        .await?;

        for feature in &product.features {
            let type_id = uuid::Uuid::new_v4().to_string();
            sqlx::query("INSERT INTO feature_types (id, product_id, type) VALUES (?, ?, ?)")
                .bind(&type_id)
                .bind(id)
                .bind(&feature.kind)
                .execute(&mut *tx)
                .await?;

            sqlx::query("INSERT INTO features (id, type_id, name, details) VALUES (?, ?, ?, ?)")
                .bind(uuid::Uuid::new_v4().to_string())
                .bind(&type_id)
                .bind(&feature.name)
                .bind(&feature.details)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, name, price, amount, description, category_id, created_at FROM products WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Features of a product in insertion order.
    pub async fn features(&self, product_id: &str) -> Result<Vec<Feature>, sqlx::Error> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT t.type, f.name, f.details FROM feature_types t
             JOIN features f ON f.type_id = t.id
             WHERE t.product_id = ?
             ORDER BY t.rowid",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(kind, name, details)| Feature {
                kind,
                name,
                details,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, is_foreign_key_violation};

    fn sample(category_id: &str) -> NewProduct {
        NewProduct {
            name: "Kindle".to_string(),
            price: 499.9,
            amount: 3,
            description: "e-reader".to_string(),
            category_id: category_id.to_string(),
            features: vec![
                Feature {
                    kind: "screen".to_string(),
                    name: "size".to_string(),
                    details: "6in".to_string(),
                },
                Feature {
                    kind: "battery".to_string(),
                    name: "life".to_string(),
                    details: "weeks".to_string(),
                },
            ],
        }
    }

    async fn row_count(db: &Database, table: &str) -> i64 {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(db.pool())
            .await
            .unwrap();
        count.0
    }

    #[tokio::test]
    async fn test_create_product_with_features() {
        let db = Database::open(":memory:").await.unwrap();
        db.categories().create("cat-1", "books").await.unwrap();

        db.products().create("prod-1", &sample("cat-1")).await.unwrap();

        let product = db.products().get_by_id("prod-1").await.unwrap().unwrap();
        assert_eq!(product.name, "Kindle");
        assert_eq!(product.amount, 3);
        assert_eq!(product.category_id, "cat-1");

        let features = db.products().features("prod-1").await.unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].kind, "screen");
        assert_eq!(features[1].details, "weeks");
    }

    #[tokio::test]
    async fn test_missing_category_writes_nothing() {
        let db = Database::open(":memory:").await.unwrap();

        let err = db
            .products()
            .create("prod-1", &sample("no-such-category"))
            .await
            .unwrap_err();

        assert!(is_foreign_key_violation(&err));
        assert_eq!(row_count(&db, "products").await, 0);
        assert_eq!(row_count(&db, "feature_types").await, 0);
        assert_eq!(row_count(&db, "features").await, 0);
    }

    #[tokio::test]
    async fn test_failure_midway_rolls_back_product_row() {
        let db = Database::open(":memory:").await.unwrap();
        db.categories().create("cat-1", "books").await.unwrap();

        // Fails the first feature insert, after the product row is already written
        sqlx::query("CREATE TRIGGER reject_feature BEFORE INSERT ON features BEGIN SELECT RAISE(ABORT, 'nope'); END")
            .execute(db.pool())
            .await
            .unwrap();

        assert!(db.products().create("prod-1", &sample("cat-1")).await.is_err());
        assert_eq!(row_count(&db, "products").await, 0);
        assert_eq!(row_count(&db, "feature_types").await, 0);
    }

    #[tokio::test]
    async fn test_panic_before_commit_rolls_back() {
        let db = Database::open(":memory:").await.unwrap();
        db.categories().create("cat-1", "books").await.unwrap();

        let pool = db.pool().clone();
        let task = tokio::spawn(async move {
            let mut tx = pool.begin().await.unwrap();
            sqlx::query(
                "INSERT INTO products (id, name, price, amount, description, category_id) VALUES ('prod-1', 'Kindle', 1.0, 1, '', 'cat-1')",
            )
            .execute(&mut *tx)
            .await
            .unwrap();
            sqlx::query("INSERT INTO feature_types (id, product_id, type) VALUES ('type-1', 'prod-1', 'screen')")
                .execute(&mut *tx)
                .await
                .unwrap();
            panic!("interrupted before commit");
        });
        assert!(task.await.unwrap_err().is_panic());

        assert_eq!(row_count(&db, "products").await, 0);
        assert_eq!(row_count(&db, "feature_types").await, 0);

        // The connection is usable again once the rollback has run
        db.products().create("prod-2", &sample("cat-1")).await.unwrap();
        assert_eq!(row_count(&db, "products").await, 1);
    }
}
