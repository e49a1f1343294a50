use anyhow::Result;
use async_trait::async_trait;
use shared::Driver;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::storage::connection::DbConnection;
use crate::storage::traits::DriverStorage;

#[derive(Clone)]
pub struct DriverRepository {
    db: DbConnection,
}

impl DriverRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_driver(r: &SqliteRow) -> Result<Driver> {
        Ok(Driver {
            id: r.try_get("id")?,
            owner_id: r.try_get("owner_id")?,
            name: r.try_get("name")?,
            phone: r.try_get("phone")?,
            vehicle_number: r.try_get("vehicle_number")?,
            route: r.try_get("route")?,
            created_at: r.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl DriverStorage for DriverRepository {
    async fn store_driver(&self, driver: &Driver) -> Result<()> {
        sqlx::query(
            "INSERT INTO drivers (id, owner_id, name, phone, vehicle_number, route, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&driver.id)
        .bind(&driver.owner_id)
        .bind(&driver.name)
        .bind(&driver.phone)
        .bind(&driver.vehicle_number)
        .bind(&driver.route)
        .bind(&driver.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_driver(&self, owner_id: &str, driver_id: &str) -> Result<Option<Driver>> {
        let row = sqlx::query("SELECT * FROM drivers WHERE owner_id = ? AND id = ?")
            .bind(owner_id)
            .bind(driver_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_driver).transpose()
    }

    async fn list_drivers(&self, owner_id: &str) -> Result<Vec<Driver>> {
        let rows = sqlx::query("SELECT * FROM drivers WHERE owner_id = ? ORDER BY name")
            .bind(owner_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::row_to_driver).collect()
    }

    async fn update_driver(&self, driver: &Driver) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE drivers SET name = ?, phone = ?, vehicle_number = ?, route = ? WHERE owner_id = ? AND id = ?",
        )
        .bind(&driver.name)
        .bind(&driver.phone)
        .bind(&driver.vehicle_number)
        .bind(&driver.route)
        .bind(&driver.owner_id)
        .bind(&driver.id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_driver(&self, owner_id: &str, driver_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM drivers WHERE owner_id = ? AND id = ?")
            .bind(owner_id)
            .bind(driver_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
