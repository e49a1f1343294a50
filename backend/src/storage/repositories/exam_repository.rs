use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::{ExamResult, SubjectMark};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::storage::connection::DbConnection;
use crate::storage::traits::ExamStorage;

#[derive(Clone)]
pub struct ExamRepository {
    db: DbConnection,
}

impl ExamRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_result(r: &SqliteRow) -> Result<ExamResult> {
        let subjects_json: String = r.try_get("subjects")?;
        let subjects: Vec<SubjectMark> =
            serde_json::from_str(&subjects_json).context("Failed to decode subjects column")?;
        Ok(ExamResult {
            id: r.try_get("id")?,
            owner_id: r.try_get("owner_id")?,
            student_id: r.try_get("student_id")?,
            exam_name: r.try_get("exam_name")?,
            subjects,
            created_at: r.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl ExamStorage for ExamRepository {
    async fn store_result(&self, result: &ExamResult) -> Result<()> {
        let subjects = serde_json::to_string(&result.subjects)?;
        sqlx::query(
            "INSERT INTO exam_results (id, owner_id, student_id, exam_name, subjects, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&result.id)
        .bind(&result.owner_id)
        .bind(&result.student_id)
        .bind(&result.exam_name)
        .bind(subjects)
        .bind(&result.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_result(&self, owner_id: &str, result_id: &str) -> Result<Option<ExamResult>> {
        let row = sqlx::query("SELECT * FROM exam_results WHERE owner_id = ? AND id = ?")
            .bind(owner_id)
            .bind(result_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_result).transpose()
    }

    async fn list_results(
        &self,
        owner_id: &str,
        student_id: Option<&str>,
        exam_name: Option<&str>,
    ) -> Result<Vec<ExamResult>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM exam_results
            WHERE owner_id = ?
              AND (? IS NULL OR student_id = ?)
              AND (? IS NULL OR exam_name = ?)
            ORDER BY created_at, id
            "#,
        )
        .bind(owner_id)
        .bind(student_id)
        .bind(student_id)
        .bind(exam_name)
        .bind(exam_name)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::row_to_result).collect()
    }

    async fn delete_results_for_student(&self, owner_id: &str, student_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM exam_results WHERE owner_id = ? AND student_id = ?")
            .bind(owner_id)
            .bind(student_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, student: &str, exam: &str) -> ExamResult {
        ExamResult {
            id: id.to_string(),
            owner_id: "o".to_string(),
            student_id: student.to_string(),
            exam_name: exam.to_string(),
            subjects: vec![
                SubjectMark { subject: "Maths".into(), max_marks: 100.0, obtained_marks: 78.0 },
                SubjectMark { subject: "Hindi".into(), max_marks: 100.0, obtained_marks: 64.5 },
            ],
            created_at: format!("2024-03-01T00:00:0{}Z", id.len()),
        }
    }

    #[tokio::test]
    async fn test_subjects_round_trip_and_filters() {
        let repo = ExamRepository::new(DbConnection::init_in_memory().await.unwrap());
        repo.store_result(&result("r1", "s1", "Half Yearly")).await.unwrap();
        repo.store_result(&result("r2", "s2", "Half Yearly")).await.unwrap();
        repo.store_result(&result("r3", "s1", "Annual")).await.unwrap();

        let loaded = repo.get_result("o", "r1").await.unwrap().unwrap();
        assert_eq!(loaded.subjects.len(), 2);
        assert_eq!(loaded.subjects[1].obtained_marks, 64.5);

        assert_eq!(repo.list_results("o", Some("s1"), None).await.unwrap().len(), 2);
        assert_eq!(repo.list_results("o", None, Some("Half Yearly")).await.unwrap().len(), 2);
        assert_eq!(repo.list_results("o", Some("s1"), Some("Annual")).await.unwrap().len(), 1);

        assert_eq!(repo.delete_results_for_student("o", "s1").await.unwrap(), 2);
        assert_eq!(repo.list_results("o", None, None).await.unwrap().len(), 1);
    }
}
