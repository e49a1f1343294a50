//! # Export / Import
//!
//! An export is a JSON object mapping each table name to an array of raw
//! rows. Owner ids are stripped on the way out and each row's id moves to
//! `export_ref`. On the way in every row receives a fresh id and the
//! importing owner's id, and references between rows (a student's
//! `class_id`, an attendance day's present ids) are rewritten through the
//! `export_ref` of the row they point at. Every row is checked before the
//! first write, so a malformed document leaves storage untouched.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use shared::{
    AttendanceRecord, ChangeKind, Driver, ExamResult, Expense, ImportSummary, SalaryRecord, SchoolClass,
    SchoolProfile, Staff, Student,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

use super::attendance_service::PresenceSet;
use super::change_feed::{tables, ChangeFeed};
use super::error::{SchoolError, SchoolResult};
use super::validation::now_timestamp;
use crate::storage::Repositories;

const ID_FIELD: &str = "id";
const OWNER_FIELD: &str = "owner_id";
pub const EXPORT_REF_FIELD: &str = "export_ref";

const KNOWN_TABLES: [&str; 9] = [
    tables::PROFILES,
    tables::CLASSES,
    tables::STUDENTS,
    tables::STAFF,
    tables::ATTENDANCE,
    tables::SALARY_RECORDS,
    tables::EXPENSES,
    tables::EXAM_RESULTS,
    tables::DRIVERS,
];

/// Table name to raw rows
pub type ExportDocument = BTreeMap<String, Vec<Value>>;

/// Serialize rows, drop the owner and keep the id as a portable reference
fn strip_rows<T: Serialize>(rows: &[T]) -> SchoolResult<Vec<Value>> {
    rows.iter()
        .map(|row| -> SchoolResult<Value> {
            let mut value = serde_json::to_value(row)?;
            if let Value::Object(map) = &mut value {
                map.remove(OWNER_FIELD);
                if let Some(id) = map.remove(ID_FIELD) {
                    map.insert(EXPORT_REF_FIELD.to_string(), id);
                }
            }
            Ok(value)
        })
        .collect()
}

/// Rebuild a row for the importing owner
fn adopt_row<T: DeserializeOwned>(table: &str, raw: &Value, owner_id: &str, id: Option<&str>) -> SchoolResult<T> {
    let mut map: Map<String, Value> = match raw {
        Value::Object(map) => map.clone(),
        _ => return Err(SchoolError::validation(format!("Rows in {} must be objects", table))),
    };
    map.remove(EXPORT_REF_FIELD);
    if let Some(id) = id {
        map.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    }
    map.insert(OWNER_FIELD.to_string(), Value::String(owner_id.to_string()));

    serde_json::from_value(Value::Object(map))
        .map_err(|e| SchoolError::validation(format!("Invalid row in {}: {}", table, e)))
}

fn rows<'a>(doc: &'a ExportDocument, table: &str) -> &'a [Value] {
    doc.get(table).map(Vec::as_slice).unwrap_or(&[])
}

/// Exported ids mapped to the ids minted on import
#[derive(Debug, Default)]
struct IdMap(HashMap<String, String>);

impl IdMap {
    /// New id for a row, remembered under the row's `export_ref`
    fn mint(&mut self, raw: &Value, id: String) -> String {
        if let Some(export_ref) = raw.get(EXPORT_REF_FIELD).and_then(Value::as_str) {
            self.0.insert(export_ref.to_string(), id.clone());
        }
        id
    }

    /// Ids with no exported row behind them are kept as they are
    fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.0.get(id).map(String::as_str).unwrap_or(id)
    }

    fn resolve_joined(&self, joined: &str) -> String {
        let ids = PresenceSet::from_joined(joined);
        ids.iter().map(|id| self.resolve(id)).collect::<PresenceSet>().to_joined()
    }
}

/// Every row of a document, adopted and re-linked, ready to store
#[derive(Debug, Default)]
struct ImportPlan {
    profile: Option<SchoolProfile>,
    classes: Vec<SchoolClass>,
    drivers: Vec<Driver>,
    staff: Vec<Staff>,
    students: Vec<Student>,
    attendance: Vec<AttendanceRecord>,
    salaries: Vec<SalaryRecord>,
    expenses: Vec<Expense>,
    exam_results: Vec<ExamResult>,
}

impl ImportPlan {
    /// Referenced tables are adopted before the tables pointing at them
    fn build(owner_id: &str, doc: &ExportDocument) -> SchoolResult<Self> {
        let now = now_timestamp();
        let mut ids = IdMap::default();
        let mut plan = ImportPlan::default();

        for table in doc.keys().filter(|t| !KNOWN_TABLES.contains(&t.as_str())) {
            warn!("Skipping unknown table in import: {}", table);
        }

        if let Some(raw) = rows(doc, tables::PROFILES).last() {
            let mut profile: SchoolProfile = adopt_row(tables::PROFILES, raw, owner_id, None)?;
            profile.updated_at = now.clone();
            plan.profile = Some(profile);
        }

        for raw in rows(doc, tables::CLASSES) {
            let id = ids.mint(raw, SchoolClass::generate_id());
            plan.classes.push(adopt_row(tables::CLASSES, raw, owner_id, Some(&id))?);
        }
        for raw in rows(doc, tables::DRIVERS) {
            let id = ids.mint(raw, Driver::generate_id());
            plan.drivers.push(adopt_row(tables::DRIVERS, raw, owner_id, Some(&id))?);
        }
        for raw in rows(doc, tables::STAFF) {
            let id = ids.mint(raw, Staff::generate_id());
            plan.staff.push(adopt_row(tables::STAFF, raw, owner_id, Some(&id))?);
        }

        for raw in rows(doc, tables::STUDENTS) {
            let id = ids.mint(raw, Student::generate_id());
            let mut student: Student = adopt_row(tables::STUDENTS, raw, owner_id, Some(&id))?;
            student.class_id = ids.resolve(&student.class_id).to_string();
            student.transport_driver_id = student.transport_driver_id.as_deref().map(|d| ids.resolve(d).to_string());
            plan.students.push(student);
        }

        for raw in rows(doc, tables::ATTENDANCE) {
            let mut record: AttendanceRecord =
                adopt_row(tables::ATTENDANCE, raw, owner_id, Some(&AttendanceRecord::generate_id()))?;
            record.class_id = ids.resolve(&record.class_id).to_string();
            record.present_ids = ids.resolve_joined(&record.present_ids);
            record.absent_ids = ids.resolve_joined(&record.absent_ids);
            plan.attendance.push(record);
        }
        for raw in rows(doc, tables::SALARY_RECORDS) {
            let mut record: SalaryRecord =
                adopt_row(tables::SALARY_RECORDS, raw, owner_id, Some(&SalaryRecord::generate_id()))?;
            record.staff_id = ids.resolve(&record.staff_id).to_string();
            plan.salaries.push(record);
        }
        for raw in rows(doc, tables::EXAM_RESULTS) {
            let mut result: ExamResult =
                adopt_row(tables::EXAM_RESULTS, raw, owner_id, Some(&ExamResult::generate_id()))?;
            result.student_id = ids.resolve(&result.student_id).to_string();
            plan.exam_results.push(result);
        }
        for raw in rows(doc, tables::EXPENSES) {
            plan.expenses.push(adopt_row(tables::EXPENSES, raw, owner_id, Some(&Expense::generate_id()))?);
        }

        Ok(plan)
    }
}

#[derive(Clone)]
pub struct ExportService {
    repos: Repositories,
    feed: ChangeFeed,
}

impl ExportService {
    pub fn new(repos: Repositories, feed: ChangeFeed) -> Self {
        Self { repos, feed }
    }

    pub async fn export_all(&self, owner_id: &str) -> SchoolResult<ExportDocument> {
        info!("Exporting all data for owner {}", owner_id);
        let r = &self.repos;
        let mut doc = ExportDocument::new();

        let profiles: Vec<SchoolProfile> = r.profiles.get_profile(owner_id).await?.into_iter().collect();
        doc.insert(tables::PROFILES.to_string(), strip_rows(&profiles)?);
        doc.insert(tables::CLASSES.to_string(), strip_rows(&r.classes.list_classes(owner_id).await?)?);
        doc.insert(tables::STUDENTS.to_string(), strip_rows(&r.students.list_students(owner_id, None).await?)?);
        doc.insert(tables::STAFF.to_string(), strip_rows(&r.staff.list_staff(owner_id).await?)?);
        doc.insert(
            tables::ATTENDANCE.to_string(),
            strip_rows(&r.attendance.list_attendance(owner_id, None, None, None).await?)?,
        );
        doc.insert(
            tables::SALARY_RECORDS.to_string(),
            strip_rows(&r.salaries.list_salaries(owner_id, None, None).await?)?,
        );
        doc.insert(tables::EXPENSES.to_string(), strip_rows(&r.expenses.list_expenses(owner_id).await?)?);
        doc.insert(tables::EXAM_RESULTS.to_string(), strip_rows(&r.exams.list_results(owner_id, None, None).await?)?);
        doc.insert(tables::DRIVERS.to_string(), strip_rows(&r.drivers.list_drivers(owner_id).await?)?);

        let total: usize = doc.values().map(Vec::len).sum();
        info!("Exported {} rows across {} tables", total, doc.len());
        Ok(doc)
    }

    /// Insert every row of an export under the current owner. Unknown tables
    /// are skipped; salary rows that duplicate an existing period are skipped.
    pub async fn import_all(&self, owner_id: &str, doc: ExportDocument) -> SchoolResult<ImportSummary> {
        info!("Importing {} tables for owner {}", doc.len(), owner_id);
        let plan = ImportPlan::build(owner_id, &doc)?;
        let r = &self.repos;
        let mut summary = ImportSummary::default();

        if let Some(profile) = &plan.profile {
            r.profiles.upsert_profile(profile).await?;
            self.feed.publish(owner_id, tables::PROFILES, ChangeKind::Update, owner_id);
        }
        for class in &plan.classes {
            r.classes.store_class(class).await?;
            self.feed.publish(owner_id, tables::CLASSES, ChangeKind::Insert, &class.id);
            summary.classes += 1;
        }
        for driver in &plan.drivers {
            r.drivers.store_driver(driver).await?;
            self.feed.publish(owner_id, tables::DRIVERS, ChangeKind::Insert, &driver.id);
            summary.drivers += 1;
        }
        for staff in &plan.staff {
            r.staff.store_staff(staff).await?;
            self.feed.publish(owner_id, tables::STAFF, ChangeKind::Insert, &staff.id);
            summary.staff += 1;
        }
        for student in &plan.students {
            r.students.store_student(student).await?;
            self.feed.publish(owner_id, tables::STUDENTS, ChangeKind::Insert, &student.id);
            summary.students += 1;
        }
        for record in &plan.attendance {
            let saved = r.attendance.upsert_attendance(record).await?;
            self.feed.publish(owner_id, tables::ATTENDANCE, ChangeKind::Insert, &saved.id);
            summary.attendance += 1;
        }
        for record in &plan.salaries {
            if r.salaries.find_salary(owner_id, &record.staff_id, record.month, record.year).await?.is_some() {
                warn!("Skipping duplicate salary row for {} {} {}", record.staff_id, record.month, record.year);
                continue;
            }
            r.salaries.store_salary(record).await?;
            self.feed.publish(owner_id, tables::SALARY_RECORDS, ChangeKind::Insert, &record.id);
            summary.salary_records += 1;
        }
        for expense in &plan.expenses {
            r.expenses.store_expense(expense).await?;
            self.feed.publish(owner_id, tables::EXPENSES, ChangeKind::Insert, &expense.id);
            summary.expenses += 1;
        }
        for result in &plan.exam_results {
            r.exams.store_result(result).await?;
            self.feed.publish(owner_id, tables::EXAM_RESULTS, ChangeKind::Insert, &result.id);
            summary.exam_results += 1;
        }

        info!("Import finished: {:?}", summary);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::student_service::tests::{sample_student, store_class};
    use serde_json::json;
    use shared::{Month, SubjectMark};

    const STAMP: &str = "2024-01-01T00:00:00.000Z";

    fn sample_driver(owner_id: &str) -> Driver {
        Driver {
            id: Driver::generate_id(),
            owner_id: owner_id.to_string(),
            name: "Rafiq".to_string(),
            phone: None,
            vehicle_number: "DHA-11".to_string(),
            route: Some("North".to_string()),
            created_at: STAMP.to_string(),
        }
    }

    fn sample_staff(owner_id: &str) -> Staff {
        Staff {
            id: Staff::generate_id(),
            owner_id: owner_id.to_string(),
            name: "Mrs Begum".to_string(),
            role: "Teacher".to_string(),
            phone: None,
            monthly_salary: 15000.0,
            join_date: "2023-06-01".to_string(),
            photo_path: None,
            created_at: STAMP.to_string(),
            updated_at: STAMP.to_string(),
        }
    }

    #[tokio::test]
    async fn test_export_strips_owner_and_keeps_reference() {
        let repos = Repositories::in_memory().await.unwrap();
        let class = store_class(&repos, "o", 700.0).await;
        let mut student = sample_student("o", &class.id, "Lina");
        student.fees.may = Some("700=d=2024-05-02T00:00:00.000Z".to_string());
        repos.students.store_student(&student).await.unwrap();
        store_class(&repos, "someone-else", 1.0).await;

        let service = ExportService::new(repos, ChangeFeed::new());
        let doc = service.export_all("o").await.unwrap();

        assert_eq!(doc[tables::CLASSES].len(), 1);
        let row = &doc[tables::STUDENTS][0];
        assert!(row.get("id").is_none());
        assert!(row.get("owner_id").is_none());
        assert_eq!(row[EXPORT_REF_FIELD], json!(student.id));
        assert_eq!(row["class_id"], json!(class.id));
        assert_eq!(row["may"], json!("700=d=2024-05-02T00:00:00.000Z"));
        assert!(doc[tables::PROFILES].is_empty());
    }

    #[tokio::test]
    async fn test_import_assigns_fresh_ids_to_current_owner() {
        let source = Repositories::in_memory().await.unwrap();
        let class = store_class(&source, "alice", 700.0).await;
        source.students.store_student(&sample_student("alice", &class.id, "Lina")).await.unwrap();
        let doc = ExportService::new(source, ChangeFeed::new()).export_all("alice").await.unwrap();

        let target = Repositories::in_memory().await.unwrap();
        let service = ExportService::new(target.clone(), ChangeFeed::new());
        let summary = service.import_all("bob", doc).await.unwrap();

        assert_eq!(summary.classes, 1);
        assert_eq!(summary.students, 1);
        let students = target.students.list_students("bob", None).await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].owner_id, "bob");
        assert!(students[0].id.starts_with("student::"));
        assert!(target.students.list_students("alice", None).await.unwrap().is_empty());

        let imported_class = target.classes.get_class("bob", &students[0].class_id).await.unwrap();
        assert_eq!(imported_class.map(|c| c.monthly_fee), Some(700.0));
    }

    #[tokio::test]
    async fn test_import_relinks_references_between_tables() {
        let source = Repositories::in_memory().await.unwrap();
        let class = store_class(&source, "alice", 700.0).await;
        let driver = sample_driver("alice");
        source.drivers.store_driver(&driver).await.unwrap();
        let mut student = sample_student("alice", &class.id, "Lina");
        student.transport_driver_id = Some(driver.id.clone());
        source.students.store_student(&student).await.unwrap();
        let absent = sample_student("alice", &class.id, "Omar");
        source.students.store_student(&absent).await.unwrap();
        let staff = sample_staff("alice");
        source.staff.store_staff(&staff).await.unwrap();

        source
            .attendance
            .upsert_attendance(&AttendanceRecord {
                id: AttendanceRecord::generate_id(),
                owner_id: "alice".to_string(),
                class_id: class.id.clone(),
                date: "2024-03-04".to_string(),
                present_ids: student.id.clone(),
                absent_ids: absent.id.clone(),
                created_at: STAMP.to_string(),
                updated_at: STAMP.to_string(),
            })
            .await
            .unwrap();
        source
            .salaries
            .store_salary(&SalaryRecord {
                id: SalaryRecord::generate_id(),
                owner_id: "alice".to_string(),
                staff_id: staff.id.clone(),
                month: Month::March,
                year: 2024,
                amount: 15000.0,
                paid_date: STAMP.to_string(),
                note: None,
            })
            .await
            .unwrap();
        source
            .exams
            .store_result(&ExamResult {
                id: ExamResult::generate_id(),
                owner_id: "alice".to_string(),
                student_id: student.id.clone(),
                exam_name: "Midterm".to_string(),
                subjects: vec![SubjectMark { subject: "Maths".to_string(), max_marks: 100.0, obtained_marks: 81.0 }],
                created_at: STAMP.to_string(),
            })
            .await
            .unwrap();

        let doc = ExportService::new(source, ChangeFeed::new()).export_all("alice").await.unwrap();
        let target = Repositories::in_memory().await.unwrap();
        ExportService::new(target.clone(), ChangeFeed::new()).import_all("bob", doc).await.unwrap();

        let students = target.students.list_students("bob", None).await.unwrap();
        let lina = students.iter().find(|s| s.name == "Lina").unwrap();
        let omar = students.iter().find(|s| s.name == "Omar").unwrap();
        assert_ne!(lina.id, student.id);
        assert!(target.classes.get_class("bob", &lina.class_id).await.unwrap().is_some());
        let driver_id = lina.transport_driver_id.as_deref().unwrap();
        assert!(target.drivers.get_driver("bob", driver_id).await.unwrap().is_some());

        let days = target.attendance.list_attendance("bob", None, None, None).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].class_id, lina.class_id);
        assert_eq!(days[0].present_ids, lina.id);
        assert_eq!(days[0].absent_ids, omar.id);

        let salaries = target.salaries.list_salaries("bob", None, None).await.unwrap();
        assert!(target.staff.get_staff("bob", &salaries[0].staff_id).await.unwrap().is_some());

        let results = target.exams.list_results("bob", None, None).await.unwrap();
        assert_eq!(results[0].student_id, lina.id);
    }

    #[tokio::test]
    async fn test_import_without_refs_keeps_references_verbatim() {
        let service = ExportService::new(Repositories::in_memory().await.unwrap(), ChangeFeed::new());
        let mut doc = ExportDocument::new();
        doc.insert(
            tables::EXAM_RESULTS.to_string(),
            vec![json!({"student_id": "student::kept", "exam_name": "Final", "subjects": [], "created_at": STAMP})],
        );

        service.import_all("o", doc).await.unwrap();
        let results = service.repos.exams.list_results("o", None, None).await.unwrap();
        assert_eq!(results[0].student_id, "student::kept");
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_rows_and_skips_unknown_tables() {
        let service = ExportService::new(Repositories::in_memory().await.unwrap(), ChangeFeed::new());

        let mut doc = ExportDocument::new();
        doc.insert("unicorns".to_string(), vec![json!({"horn": true})]);
        assert_eq!(service.import_all("o", doc).await.unwrap(), ImportSummary::default());

        let mut bad = ExportDocument::new();
        bad.insert(tables::EXPENSES.to_string(), vec![json!("not an object")]);
        assert!(matches!(service.import_all("o", bad).await, Err(SchoolError::Validation(_))));
    }

    #[tokio::test]
    async fn test_malformed_row_leaves_earlier_tables_unwritten() {
        let repos = Repositories::in_memory().await.unwrap();
        let service = ExportService::new(repos.clone(), ChangeFeed::new());

        let mut doc = ExportDocument::new();
        doc.insert(
            tables::CLASSES.to_string(),
            vec![json!({"name": "Class 2", "section": null, "monthly_fee": 500.0, "created_at": STAMP, "updated_at": STAMP})],
        );
        doc.insert(tables::EXPENSES.to_string(), vec![json!("not an object")]);

        assert!(matches!(service.import_all("o", doc).await, Err(SchoolError::Validation(_))));
        assert!(repos.classes.list_classes("o").await.unwrap().is_empty());
    }
}
