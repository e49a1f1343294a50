use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::AttendanceRecord;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::storage::connection::DbConnection;
use crate::storage::traits::AttendanceStorage;

#[derive(Clone)]
pub struct AttendanceRepository {
    db: DbConnection,
}

impl AttendanceRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_record(r: &SqliteRow) -> Result<AttendanceRecord> {
        Ok(AttendanceRecord {
            id: r.try_get("id")?,
            owner_id: r.try_get("owner_id")?,
            class_id: r.try_get("class_id")?,
            date: r.try_get("date")?,
            present_ids: r.try_get("present_ids")?,
            absent_ids: r.try_get("absent_ids")?,
            created_at: r.try_get("created_at")?,
            updated_at: r.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl AttendanceStorage for AttendanceRepository {
    async fn upsert_attendance(&self, record: &AttendanceRecord) -> Result<AttendanceRecord> {
        // The existing row keeps its id and created_at on conflict
        sqlx::query(
            r#"
            INSERT INTO attendance (id, owner_id, class_id, date, present_ids, absent_ids, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(owner_id, class_id, date) DO UPDATE SET
                present_ids = excluded.present_ids,
                absent_ids = excluded.absent_ids,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.owner_id)
        .bind(&record.class_id)
        .bind(&record.date)
        .bind(&record.present_ids)
        .bind(&record.absent_ids)
        .bind(&record.created_at)
        .bind(&record.updated_at)
        .execute(self.db.pool())
        .await?;

        self.get_attendance(&record.owner_id, &record.class_id, &record.date)
            .await?
            .context("Attendance row missing after upsert")
    }

    async fn get_attendance(&self, owner_id: &str, class_id: &str, date: &str) -> Result<Option<AttendanceRecord>> {
        let row = sqlx::query("SELECT * FROM attendance WHERE owner_id = ? AND class_id = ? AND date = ?")
            .bind(owner_id)
            .bind(class_id)
            .bind(date)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn list_attendance(
        &self,
        owner_id: &str,
        class_id: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Vec<AttendanceRecord>> {
        // NULL parameters disable their filter
        let rows = sqlx::query(
            r#"
            SELECT * FROM attendance
            WHERE owner_id = ?
              AND (? IS NULL OR class_id = ?)
              AND (? IS NULL OR date >= ?)
              AND (? IS NULL OR date <= ?)
            ORDER BY date, class_id
            "#,
        )
        .bind(owner_id)
        .bind(class_id)
        .bind(class_id)
        .bind(from)
        .bind(from)
        .bind(to)
        .bind(to)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::row_to_record).collect()
    }
}
