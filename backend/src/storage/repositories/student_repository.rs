use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::{FeeLedger, Month, OtherFee, Student};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::storage::connection::DbConnection;
use crate::storage::traits::StudentStorage;

const STUDENT_COLUMNS: &str = "id, owner_id, class_id, name, father_name, mother_name, phone, address, \
    roll_number, admission_date, photo_path, transport_driver_id, previous_dues, other_fees, \
    january, february, march, april, may, june, july, august, september, october, november, december, \
    created_at, updated_at";

/// GLOB form of the legacy `YYYY-MM-DDTHH:MM:SS.sssZ` paid-in-full value
const LEGACY_PAID_GLOB: &str =
    "[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]T[0-9][0-9]:[0-9][0-9]:[0-9][0-9].[0-9][0-9][0-9]Z";

/// Repository for student rows and their fee ledger columns
#[derive(Clone)]
pub struct StudentRepository {
    db: DbConnection,
}

impl StudentRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_student(r: &SqliteRow) -> Result<Student> {
        let other_fees_json: String = r.try_get("other_fees")?;
        let other_fees: Vec<OtherFee> = serde_json::from_str(&other_fees_json)
            .context("Failed to decode other_fees column")?;

        let mut fees = FeeLedger::default();
        for month in Month::ALL {
            fees.set(month, r.try_get::<Option<String>, _>(month.name())?);
        }

        Ok(Student {
            id: r.try_get("id")?,
            owner_id: r.try_get("owner_id")?,
            class_id: r.try_get("class_id")?,
            name: r.try_get("name")?,
            father_name: r.try_get("father_name")?,
            mother_name: r.try_get("mother_name")?,
            phone: r.try_get("phone")?,
            address: r.try_get("address")?,
            roll_number: r.try_get("roll_number")?,
            admission_date: r.try_get("admission_date")?,
            photo_path: r.try_get("photo_path")?,
            transport_driver_id: r.try_get("transport_driver_id")?,
            previous_dues: r.try_get("previous_dues")?,
            other_fees,
            fees,
            created_at: r.try_get("created_at")?,
            updated_at: r.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl StudentStorage for StudentRepository {
    async fn store_student(&self, student: &Student) -> Result<()> {
        let other_fees = serde_json::to_string(&student.other_fees)?;
        sqlx::query(&format!(
            "INSERT INTO students ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            STUDENT_COLUMNS
        ))
        .bind(&student.id)
        .bind(&student.owner_id)
        .bind(&student.class_id)
        .bind(&student.name)
        .bind(&student.father_name)
        .bind(&student.mother_name)
        .bind(&student.phone)
        .bind(&student.address)
        .bind(&student.roll_number)
        .bind(&student.admission_date)
        .bind(&student.photo_path)
        .bind(&student.transport_driver_id)
        .bind(student.previous_dues)
        .bind(other_fees)
        .bind(&student.fees.january)
        .bind(&student.fees.february)
        .bind(&student.fees.march)
        .bind(&student.fees.april)
        .bind(&student.fees.may)
        .bind(&student.fees.june)
        .bind(&student.fees.july)
        .bind(&student.fees.august)
        .bind(&student.fees.september)
        .bind(&student.fees.october)
        .bind(&student.fees.november)
        .bind(&student.fees.december)
        .bind(&student.created_at)
        .bind(&student.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_student(&self, owner_id: &str, student_id: &str) -> Result<Option<Student>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM students WHERE owner_id = ? AND id = ?",
            STUDENT_COLUMNS
        ))
        .bind(owner_id)
        .bind(student_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::row_to_student).transpose()
    }

    async fn list_students(&self, owner_id: &str, class_id: Option<&str>) -> Result<Vec<Student>> {
        let rows = match class_id {
            Some(class_id) => {
                sqlx::query(&format!(
                    "SELECT {} FROM students WHERE owner_id = ? AND class_id = ? ORDER BY name",
                    STUDENT_COLUMNS
                ))
                .bind(owner_id)
                .bind(class_id)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM students WHERE owner_id = ? ORDER BY name",
                    STUDENT_COLUMNS
                ))
                .bind(owner_id)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        rows.iter().map(Self::row_to_student).collect()
    }

    async fn list_students_by_driver(&self, owner_id: &str, driver_id: &str) -> Result<Vec<Student>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM students WHERE owner_id = ? AND transport_driver_id = ? ORDER BY name",
            STUDENT_COLUMNS
        ))
        .bind(owner_id)
        .bind(driver_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::row_to_student).collect()
    }

    async fn count_students_in_class(&self, owner_id: &str, class_id: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM students WHERE owner_id = ? AND class_id = ?")
            .bind(owner_id)
            .bind(class_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(row.try_get("n")?)
    }

    async fn update_student(&self, student: &Student) -> Result<bool> {
        let other_fees = serde_json::to_string(&student.other_fees)?;
        let result = sqlx::query(
            r#"
            UPDATE students
            SET class_id = ?, name = ?, father_name = ?, mother_name = ?, phone = ?, address = ?,
                roll_number = ?, admission_date = ?, photo_path = ?, transport_driver_id = ?,
                previous_dues = ?, other_fees = ?, updated_at = ?
            WHERE owner_id = ? AND id = ?
            "#,
        )
        .bind(&student.class_id)
        .bind(&student.name)
        .bind(&student.father_name)
        .bind(&student.mother_name)
        .bind(&student.phone)
        .bind(&student.address)
        .bind(&student.roll_number)
        .bind(&student.admission_date)
        .bind(&student.photo_path)
        .bind(&student.transport_driver_id)
        .bind(student.previous_dues)
        .bind(other_fees)
        .bind(&student.updated_at)
        .bind(&student.owner_id)
        .bind(&student.id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_student(&self, owner_id: &str, student_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM students WHERE owner_id = ? AND id = ?")
            .bind(owner_id)
            .bind(student_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_month_entry(
        &self,
        owner_id: &str,
        student_id: &str,
        month: Month,
        entry: &str,
        updated_at: &str,
    ) -> Result<bool> {
        // Column names come from the fixed Month enum, never from input
        let column = month.name();
        let sql = format!(
            r#"
            UPDATE students
            SET {col} = CASE
                    WHEN {col} IS NULL OR TRIM({col}, char(32, 9, 13, 10)) IN ('', 'undefined', 'Dues') THEN ?
                    ELSE {col} || ';' || ?
                END,
                updated_at = ?
            WHERE owner_id = ? AND id = ? AND NOT (COALESCE({col}, '') GLOB '{glob}')
            "#,
            col = column,
            glob = LEGACY_PAID_GLOB,
        );

        let result = sqlx::query(&sql)
            .bind(entry)
            .bind(entry)
            .bind(updated_at)
            .bind(owner_id)
            .bind(student_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_driver_assignments(&self, owner_id: &str, driver_id: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE students SET transport_driver_id = NULL WHERE owner_id = ? AND transport_driver_id = ?",
        )
        .bind(owner_id)
        .bind(driver_id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn setup_test() -> StudentRepository {
        let db = DbConnection::init_in_memory().await.expect("Failed to create test database");
        StudentRepository::new(db)
    }

    fn student(id: &str, owner: &str, class_id: &str, name: &str) -> Student {
        Student {
            id: id.to_string(),
            owner_id: owner.to_string(),
            class_id: class_id.to_string(),
            name: name.to_string(),
            father_name: Some("Father".to_string()),
            mother_name: None,
            phone: None,
            address: None,
            roll_number: Some("1".to_string()),
            admission_date: "2024-04-01".to_string(),
            photo_path: None,
            transport_driver_id: None,
            previous_dues: 0.0,
            other_fees: vec![OtherFee { fees_name: "Exam".into(), amount: 100.0, paid_date: None }],
            fees: FeeLedger::default(),
            created_at: "2024-04-01T00:00:00Z".to_string(),
            updated_at: "2024-04-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_store_and_get_student_round_trips_all_columns() {
        let repo = setup_test().await;
        let mut s = student("s1", "owner-a", "c1", "Meena");
        s.fees.march = Some("2023-03-01T10:00:00.000Z".to_string());

        repo.store_student(&s).await.expect("Failed to store student");

        let loaded = repo.get_student("owner-a", "s1").await.unwrap().unwrap();
        assert_eq!(loaded, s);
    }

    #[tokio::test]
    async fn test_rows_are_scoped_by_owner() {
        let repo = setup_test().await;
        repo.store_student(&student("s1", "owner-a", "c1", "Meena")).await.unwrap();

        assert!(repo.get_student("owner-b", "s1").await.unwrap().is_none());
        assert!(repo.list_students("owner-b", None).await.unwrap().is_empty());
        assert!(!repo.delete_student("owner-b", "s1").await.unwrap());
        assert!(!repo
            .append_month_entry("owner-b", "s1", Month::May, "1=d=2024-05-01T00:00:00.000Z", "now")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_list_filters_by_class_and_orders_by_name() {
        let repo = setup_test().await;
        repo.store_student(&student("s1", "o", "c1", "Zoya")).await.unwrap();
        repo.store_student(&student("s2", "o", "c1", "Arjun")).await.unwrap();
        repo.store_student(&student("s3", "o", "c2", "Bela")).await.unwrap();

        let c1 = repo.list_students("o", Some("c1")).await.unwrap();
        assert_eq!(c1.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), vec!["Arjun", "Zoya"]);
        assert_eq!(repo.list_students("o", None).await.unwrap().len(), 3);
        assert_eq!(repo.count_students_in_class("o", "c1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_append_month_entry_concatenates() {
        let repo = setup_test().await;
        let mut s = student("s1", "o", "c1", "Meena");
        s.fees.january = Some("Dues".to_string());
        repo.store_student(&s).await.unwrap();

        let first = "300=d=2024-01-05T00:00:00.000Z";
        let second = "200=d=2024-01-20T00:00:00.000Z";
        assert!(repo.append_month_entry("o", "s1", Month::January, first, "t1").await.unwrap());
        assert!(repo.append_month_entry("o", "s1", Month::January, second, "t2").await.unwrap());

        let loaded = repo.get_student("o", "s1").await.unwrap().unwrap();
        assert_eq!(loaded.fees.january.as_deref(), Some(format!("{};{}", first, second).as_str()));
        assert_eq!(loaded.updated_at, "t2");
        assert_eq!(loaded.fees.february, None);
    }

    #[tokio::test]
    async fn test_append_replaces_whitespace_only_month() {
        let repo = setup_test().await;
        let mut s = student("s1", "o", "c1", "Meena");
        s.fees.march = Some("\t".to_string());
        s.fees.april = Some(" Dues\n".to_string());
        repo.store_student(&s).await.unwrap();

        let entry = "150=d=2024-03-02T00:00:00.000Z";
        assert!(repo.append_month_entry("o", "s1", Month::March, entry, "t").await.unwrap());
        assert!(repo.append_month_entry("o", "s1", Month::April, entry, "t").await.unwrap());

        let loaded = repo.get_student("o", "s1").await.unwrap().unwrap();
        assert_eq!(loaded.fees.march.as_deref(), Some(entry));
        assert_eq!(loaded.fees.april.as_deref(), Some(entry));
    }

    #[tokio::test]
    async fn test_append_refuses_legacy_paid_month() {
        let repo = setup_test().await;
        let mut s = student("s1", "o", "c1", "Meena");
        s.fees.june = Some("2023-06-01T10:00:00.000Z".to_string());
        repo.store_student(&s).await.unwrap();

        let appended = repo
            .append_month_entry("o", "s1", Month::June, "100=d=2024-06-02T00:00:00.000Z", "t")
            .await
            .unwrap();
        assert!(!appended);

        let loaded = repo.get_student("o", "s1").await.unwrap().unwrap();
        assert_eq!(loaded.fees.june.as_deref(), Some("2023-06-01T10:00:00.000Z"));
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_all_kept() {
        let repo = Arc::new(setup_test().await);
        repo.store_student(&student("s1", "o", "c1", "Meena")).await.unwrap();

        let mut handles = Vec::new();
        for i in 1..=10 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let entry = format!("{}=d=2024-02-{:02}T00:00:00.000Z", i * 10, i);
                repo.append_month_entry("o", "s1", Month::February, &entry, "t").await.unwrap()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        let loaded = repo.get_student("o", "s1").await.unwrap().unwrap();
        let stored = loaded.fees.february.unwrap();
        assert_eq!(stored.split(';').count(), 10);
        match crate::domain::ledger::parse_paid_amount(Some(&stored)) {
            crate::domain::ledger::PaidAmount::Amount(total) => assert_eq!(total, 550.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_leaves_ledger_untouched() {
        let repo = setup_test().await;
        let mut s = student("s1", "o", "c1", "Meena");
        s.fees.april = Some("50=d=2024-04-02T00:00:00.000Z".to_string());
        repo.store_student(&s).await.unwrap();

        let mut changed = s.clone();
        changed.name = "Meena K".to_string();
        changed.previous_dues = 75.0;
        changed.fees.april = None;
        assert!(repo.update_student(&changed).await.unwrap());

        let loaded = repo.get_student("o", "s1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Meena K");
        assert_eq!(loaded.previous_dues, 75.0);
        assert_eq!(loaded.fees.april.as_deref(), Some("50=d=2024-04-02T00:00:00.000Z"));
    }

    #[tokio::test]
    async fn test_driver_assignments() {
        let repo = setup_test().await;
        let mut a = student("s1", "o", "c1", "A");
        a.transport_driver_id = Some("d1".to_string());
        let mut b = student("s2", "o", "c1", "B");
        b.transport_driver_id = Some("d1".to_string());
        repo.store_student(&a).await.unwrap();
        repo.store_student(&b).await.unwrap();
        repo.store_student(&student("s3", "o", "c1", "C")).await.unwrap();

        assert_eq!(repo.list_students_by_driver("o", "d1").await.unwrap().len(), 2);
        assert_eq!(repo.clear_driver_assignments("o", "d1").await.unwrap(), 2);
        assert!(repo.list_students_by_driver("o", "d1").await.unwrap().is_empty());
    }
}
