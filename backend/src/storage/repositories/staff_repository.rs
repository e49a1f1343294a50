use anyhow::Result;
use async_trait::async_trait;
use shared::Staff;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::storage::connection::DbConnection;
use crate::storage::traits::StaffStorage;

#[derive(Clone)]
pub struct StaffRepository {
    db: DbConnection,
}

impl StaffRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_staff(r: &SqliteRow) -> Result<Staff> {
        Ok(Staff {
            id: r.try_get("id")?,
            owner_id: r.try_get("owner_id")?,
            name: r.try_get("name")?,
            role: r.try_get("role")?,
            phone: r.try_get("phone")?,
            monthly_salary: r.try_get("monthly_salary")?,
            join_date: r.try_get("join_date")?,
            photo_path: r.try_get("photo_path")?,
            created_at: r.try_get("created_at")?,
            updated_at: r.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl StaffStorage for StaffRepository {
    async fn store_staff(&self, staff: &Staff) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO staff (id, owner_id, name, role, phone, monthly_salary, join_date, photo_path, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&staff.id)
        .bind(&staff.owner_id)
        .bind(&staff.name)
        .bind(&staff.role)
        .bind(&staff.phone)
        .bind(staff.monthly_salary)
        .bind(&staff.join_date)
        .bind(&staff.photo_path)
        .bind(&staff.created_at)
        .bind(&staff.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_staff(&self, owner_id: &str, staff_id: &str) -> Result<Option<Staff>> {
        let row = sqlx::query("SELECT * FROM staff WHERE owner_id = ? AND id = ?")
            .bind(owner_id)
            .bind(staff_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_staff).transpose()
    }

    async fn list_staff(&self, owner_id: &str) -> Result<Vec<Staff>> {
        let rows = sqlx::query("SELECT * FROM staff WHERE owner_id = ? ORDER BY name")
            .bind(owner_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::row_to_staff).collect()
    }

    async fn update_staff(&self, staff: &Staff) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE staff
            SET name = ?, role = ?, phone = ?, monthly_salary = ?, join_date = ?, photo_path = ?, updated_at = ?
            WHERE owner_id = ? AND id = ?
            "#,
        )
        .bind(&staff.name)
        .bind(&staff.role)
        .bind(&staff.phone)
        .bind(staff.monthly_salary)
        .bind(&staff.join_date)
        .bind(&staff.photo_path)
        .bind(&staff.updated_at)
        .bind(&staff.owner_id)
        .bind(&staff.id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_staff(&self, owner_id: &str, staff_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM staff WHERE owner_id = ? AND id = ?")
            .bind(owner_id)
            .bind(staff_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff(id: &str, name: &str) -> Staff {
        Staff {
            id: id.to_string(),
            owner_id: "o".to_string(),
            name: name.to_string(),
            role: "Teacher".to_string(),
            phone: None,
            monthly_salary: 15000.0,
            join_date: "2022-06-01".to_string(),
            photo_path: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_staff_crud() {
        let repo = StaffRepository::new(DbConnection::init_in_memory().await.unwrap());
        repo.store_staff(&staff("t1", "Kavita")).await.unwrap();
        repo.store_staff(&staff("t2", "Anil")).await.unwrap();

        let names: Vec<String> = repo.list_staff("o").await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Anil", "Kavita"]);

        let mut promoted = staff("t1", "Kavita");
        promoted.role = "Principal".to_string();
        assert!(repo.update_staff(&promoted).await.unwrap());
        assert_eq!(repo.get_staff("o", "t1").await.unwrap().unwrap().role, "Principal");

        assert!(repo.get_staff("x", "t1").await.unwrap().is_none());
        assert!(repo.delete_staff("o", "t2").await.unwrap());
        assert_eq!(repo.list_staff("o").await.unwrap().len(), 1);
    }
}
