use anyhow::Result;
use async_trait::async_trait;
use shared::SchoolClass;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::storage::connection::DbConnection;
use crate::storage::traits::ClassStorage;

#[derive(Clone)]
pub struct ClassRepository {
    db: DbConnection,
}

impl ClassRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_class(r: &SqliteRow) -> Result<SchoolClass> {
        Ok(SchoolClass {
            id: r.try_get("id")?,
            owner_id: r.try_get("owner_id")?,
            name: r.try_get("name")?,
            section: r.try_get("section")?,
            monthly_fee: r.try_get("monthly_fee")?,
            created_at: r.try_get("created_at")?,
            updated_at: r.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl ClassStorage for ClassRepository {
    async fn store_class(&self, class: &SchoolClass) -> Result<()> {
        sqlx::query(
            "INSERT INTO classes (id, owner_id, name, section, monthly_fee, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&class.id)
        .bind(&class.owner_id)
        .bind(&class.name)
        .bind(&class.section)
        .bind(class.monthly_fee)
        .bind(&class.created_at)
        .bind(&class.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_class(&self, owner_id: &str, class_id: &str) -> Result<Option<SchoolClass>> {
        let row = sqlx::query("SELECT * FROM classes WHERE owner_id = ? AND id = ?")
            .bind(owner_id)
            .bind(class_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_class).transpose()
    }

    async fn list_classes(&self, owner_id: &str) -> Result<Vec<SchoolClass>> {
        let rows = sqlx::query("SELECT * FROM classes WHERE owner_id = ? ORDER BY name, section")
            .bind(owner_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::row_to_class).collect()
    }

    async fn update_class(&self, class: &SchoolClass) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE classes SET name = ?, section = ?, monthly_fee = ?, updated_at = ? WHERE owner_id = ? AND id = ?",
        )
        .bind(&class.name)
        .bind(&class.section)
        .bind(class.monthly_fee)
        .bind(&class.updated_at)
        .bind(&class.owner_id)
        .bind(&class.id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_class(&self, owner_id: &str, class_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM classes WHERE owner_id = ? AND id = ?")
            .bind(owner_id)
            .bind(class_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
