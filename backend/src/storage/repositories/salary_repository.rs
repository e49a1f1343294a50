use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{Month, SalaryRecord};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::storage::connection::DbConnection;
use crate::storage::traits::SalaryStorage;

#[derive(Clone)]
pub struct SalaryRepository {
    db: DbConnection,
}

impl SalaryRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_record(r: &SqliteRow) -> Result<SalaryRecord> {
        let month: String = r.try_get("month")?;
        Ok(SalaryRecord {
            id: r.try_get("id")?,
            owner_id: r.try_get("owner_id")?,
            staff_id: r.try_get("staff_id")?,
            month: month.parse::<Month>().map_err(|e| anyhow!(e))?,
            year: r.try_get("year")?,
            amount: r.try_get("amount")?,
            paid_date: r.try_get("paid_date")?,
            note: r.try_get("note")?,
        })
    }
}

#[async_trait]
impl SalaryStorage for SalaryRepository {
    async fn store_salary(&self, record: &SalaryRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO salary_records (id, owner_id, staff_id, month, year, amount, paid_date, note)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.owner_id)
        .bind(&record.staff_id)
        .bind(record.month.name())
        .bind(record.year)
        .bind(record.amount)
        .bind(&record.paid_date)
        .bind(&record.note)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn find_salary(&self, owner_id: &str, staff_id: &str, month: Month, year: i32) -> Result<Option<SalaryRecord>> {
        let row = sqlx::query(
            "SELECT * FROM salary_records WHERE owner_id = ? AND staff_id = ? AND month = ? AND year = ?",
        )
        .bind(owner_id)
        .bind(staff_id)
        .bind(month.name())
        .bind(year)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn list_salaries(
        &self,
        owner_id: &str,
        staff_id: Option<&str>,
        period: Option<(Month, i32)>,
    ) -> Result<Vec<SalaryRecord>> {
        let month = period.map(|(m, _)| m.name());
        let year = period.map(|(_, y)| y);

        let rows = sqlx::query(
            r#"
            SELECT * FROM salary_records
            WHERE owner_id = ?
              AND (? IS NULL OR staff_id = ?)
              AND (? IS NULL OR (month = ? AND year = ?))
            "#,
        )
        .bind(owner_id)
        .bind(staff_id)
        .bind(staff_id)
        .bind(month)
        .bind(month)
        .bind(year)
        .fetch_all(self.db.pool())
        .await?;

        let mut records = rows.iter().map(Self::row_to_record).collect::<Result<Vec<_>>>()?;
        // Month is stored by name, so calendar order is applied here
        records.sort_by(|a, b| (a.year, a.month, &a.staff_id).cmp(&(b.year, b.month, &b.staff_id)));
        Ok(records)
    }

    async fn delete_salaries_for_staff(&self, owner_id: &str, staff_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM salary_records WHERE owner_id = ? AND staff_id = ?")
            .bind(owner_id)
            .bind(staff_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
