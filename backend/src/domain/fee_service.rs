//! # Fee Service
//!
//! Records monthly tuition payments into the per-month ledger strings, tracks
//! one-off fees and the opening balance, and turns all of it into dues
//! figures for one student or a whole roster.

use chrono::{NaiveDate, Utc};
use shared::{
    AddOtherFeeRequest, ChangeKind, DuesBreakdown, DuesListResponse, MonthPayments, OtherFee,
    PaymentEntryDto, PaymentHistoryResponse, RecordPaymentRequest, RecordPaymentResponse,
    SchoolClass, SettlePreviousDuesRequest, Student, StudentDuesSummary, StudentResponse,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::change_feed::{tables, ChangeFeed};
use super::dues::{assess_month, compute_dues, due_months, round_currency, DuesWindow};
use super::error::{SchoolError, SchoolResult};
use super::ledger::{format_timestamp, is_legacy_paid, parse_entries, PaymentEntry};
use super::validation::{now_timestamp, parse_timestamp, positive_amount, required};
use crate::storage::{ClassStorage, StudentStorage};

/// Which months count towards dues
#[derive(Debug, Clone, Copy)]
pub struct DuesQuery {
    pub as_of: NaiveDate,
    /// Start counting at the admission month instead of January
    pub since_admission: bool,
}

impl DuesQuery {
    pub fn today() -> Self {
        Self { as_of: Utc::now().date_naive(), since_admission: false }
    }

    fn window_for(&self, student: &Student) -> DuesWindow {
        if !self.since_admission {
            return DuesWindow::as_of(self.as_of);
        }
        match NaiveDate::parse_from_str(&student.admission_date, "%Y-%m-%d") {
            Ok(admission) => DuesWindow::since_admission(self.as_of, admission),
            Err(_) => {
                warn!("Student {} has unreadable admission date {:?}", student.id, student.admission_date);
                DuesWindow::as_of(self.as_of)
            }
        }
    }
}

#[derive(Clone)]
pub struct FeeService {
    students: Arc<dyn StudentStorage>,
    classes: Arc<dyn ClassStorage>,
    feed: ChangeFeed,
}

impl FeeService {
    pub fn new(students: Arc<dyn StudentStorage>, classes: Arc<dyn ClassStorage>, feed: ChangeFeed) -> Self {
        Self { students, classes, feed }
    }

    async fn load_student(&self, owner_id: &str, student_id: &str) -> SchoolResult<Student> {
        self.students
            .get_student(owner_id, student_id)
            .await?
            .ok_or_else(|| SchoolError::not_found("Student", student_id))
    }

    /// Monthly fee of the student's class; a missing class charges nothing
    async fn monthly_fee(&self, owner_id: &str, class_id: &str) -> SchoolResult<f64> {
        match self.classes.get_class(owner_id, class_id).await? {
            Some(class) => Ok(class.monthly_fee),
            None => {
                warn!("Class {} not found while computing fees", class_id);
                Ok(0.0)
            }
        }
    }

    /// Append a payment to one month of the student's ledger
    pub async fn record_payment(
        &self,
        owner_id: &str,
        student_id: &str,
        request: RecordPaymentRequest,
    ) -> SchoolResult<RecordPaymentResponse> {
        info!("Recording payment: student={}, month={}, amount={}", student_id, request.month, request.amount);

        let amount = positive_amount("Payment amount", request.amount)?;
        let paid_at = match request.paid_at.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_timestamp("Payment time", raw)?,
            _ => Utc::now(),
        };

        let student = self.load_student(owner_id, student_id).await?;
        if student.fees.get(request.month).map_or(false, is_legacy_paid) {
            return Err(SchoolError::Conflict(format!(
                "{} is already marked fully paid for {}",
                request.month, student.name
            )));
        }

        let entry = PaymentEntry::new(amount, paid_at).format();
        let appended = self
            .students
            .append_month_entry(owner_id, student_id, request.month, &entry, &now_timestamp())
            .await?;
        if !appended {
            // Lost a race with a delete or a legacy write
            let current = self.load_student(owner_id, student_id).await?;
            warn!("Payment for {} in {} was not applied", current.id, request.month);
            return Err(SchoolError::Conflict(format!(
                "{} is already marked fully paid for {}",
                request.month, current.name
            )));
        }

        let student = self.load_student(owner_id, student_id).await?;
        let fee = self.monthly_fee(owner_id, &student.class_id).await?;
        let (paid, _, status) = assess_month(student.fees.get(request.month), fee);
        self.feed.publish(owner_id, tables::STUDENTS, ChangeKind::Update, student_id);

        info!("Recorded {} for {} ({:?}, total paid {})", amount, request.month, status, paid);
        Ok(RecordPaymentResponse {
            success_message: format!("Payment of {} recorded for {}", amount, request.month),
            month: request.month,
            status,
            paid: round_currency(paid),
            student,
        })
    }

    pub async fn add_other_fee(
        &self,
        owner_id: &str,
        student_id: &str,
        request: AddOtherFeeRequest,
    ) -> SchoolResult<StudentResponse> {
        info!("Adding other fee {} ({}) to student {}", request.fees_name, request.amount, student_id);

        let fees_name = required("Fee name", &request.fees_name)?;
        let amount = positive_amount("Fee amount", request.amount)?;

        let mut student = self.load_student(owner_id, student_id).await?;
        student.other_fees.push(OtherFee { fees_name: fees_name.clone(), amount, paid_date: None });
        self.save(&mut student).await?;

        Ok(StudentResponse {
            success_message: format!("Fee '{}' added for {}", fees_name, student.name),
            student,
        })
    }

    /// Stamp an other fee as paid now
    pub async fn pay_other_fee(&self, owner_id: &str, student_id: &str, index: usize) -> SchoolResult<StudentResponse> {
        info!("Marking other fee #{} paid for student {}", index, student_id);

        let mut student = self.load_student(owner_id, student_id).await?;
        let fee = student
            .other_fees
            .get_mut(index)
            .ok_or_else(|| SchoolError::NotFound(format!("Other fee #{} not found for {}", index, student_id)))?;
        if fee.is_paid() {
            return Err(SchoolError::Conflict(format!("Fee '{}' is already paid", fee.fees_name)));
        }
        fee.paid_date = Some(format_timestamp(Utc::now()));
        let fees_name = fee.fees_name.clone();

        self.save(&mut student).await?;
        Ok(StudentResponse {
            success_message: format!("Fee '{}' marked paid for {}", fees_name, student.name),
            student,
        })
    }

    /// Reduce the opening balance; paying more than is owed is refused
    pub async fn settle_previous_dues(
        &self,
        owner_id: &str,
        student_id: &str,
        request: SettlePreviousDuesRequest,
    ) -> SchoolResult<StudentResponse> {
        info!("Settling previous dues: student={}, amount={}", student_id, request.amount);

        let amount = positive_amount("Amount", request.amount)?;
        let mut student = self.load_student(owner_id, student_id).await?;
        if amount > student.previous_dues + 0.005 {
            return Err(SchoolError::validation(format!(
                "Amount exceeds previous dues of {}",
                student.previous_dues
            )));
        }
        student.previous_dues = round_currency((student.previous_dues - amount).max(0.0));

        self.save(&mut student).await?;
        Ok(StudentResponse {
            success_message: format!("Previous dues reduced to {} for {}", student.previous_dues, student.name),
            student,
        })
    }

    async fn save(&self, student: &mut Student) -> SchoolResult<()> {
        student.updated_at = now_timestamp();
        if !self.students.update_student(student).await? {
            return Err(SchoolError::not_found("Student", &student.id));
        }
        self.feed.publish(&student.owner_id, tables::STUDENTS, ChangeKind::Update, &student.id);
        Ok(())
    }

    /// Every recorded payment, month by month
    pub async fn payment_history(&self, owner_id: &str, student_id: &str) -> SchoolResult<PaymentHistoryResponse> {
        let student = self.load_student(owner_id, student_id).await?;

        let months = student
            .fees
            .iter()
            .map(|(month, raw)| MonthPayments {
                month,
                entries: parse_entries(raw)
                    .into_iter()
                    .map(|e| PaymentEntryDto { amount: e.amount, paid_at: format_timestamp(e.paid_at) })
                    .collect(),
                legacy_paid: raw.map_or(false, is_legacy_paid),
            })
            .collect();

        Ok(PaymentHistoryResponse { student_id: student.id, months })
    }

    pub async fn student_dues(&self, owner_id: &str, student_id: &str, query: DuesQuery) -> SchoolResult<DuesBreakdown> {
        let student = self.load_student(owner_id, student_id).await?;
        let fee = self.monthly_fee(owner_id, &student.class_id).await?;
        Ok(compute_dues(&student, fee, query.window_for(&student)))
    }

    /// Students that owe anything, ordered by class then name
    pub async fn dues_list(
        &self,
        owner_id: &str,
        class_id: Option<&str>,
        query: DuesQuery,
    ) -> SchoolResult<DuesListResponse> {
        info!("Building dues list: class={:?}, as_of={}", class_id, query.as_of);

        let classes: HashMap<String, SchoolClass> = self
            .classes
            .list_classes(owner_id)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        let students = self.students.list_students(owner_id, class_id).await?;

        let mut summaries: Vec<StudentDuesSummary> = students
            .iter()
            .filter_map(|student| {
                let class = classes.get(&student.class_id);
                let fee = class.map_or(0.0, |c| c.monthly_fee);
                let breakdown = compute_dues(student, fee, query.window_for(student));
                if breakdown.total <= 0.0 {
                    return None;
                }
                Some(StudentDuesSummary {
                    student_id: student.id.clone(),
                    student_name: student.name.clone(),
                    class_id: student.class_id.clone(),
                    class_name: class.map_or_else(String::new, |c| c.display_name()),
                    roll_number: student.roll_number.clone(),
                    phone: student.phone.clone(),
                    due_months: due_months(&breakdown),
                    total: breakdown.total,
                })
            })
            .collect();

        summaries.sort_by(|a, b| (&a.class_name, &a.student_name).cmp(&(&b.class_name, &b.student_name)));
        let grand_total = round_currency(summaries.iter().map(|s| s.total).sum());

        info!("{} students owe {}", summaries.len(), grand_total);
        Ok(DuesListResponse {
            as_of: query.as_of.format("%Y-%m-%d").to_string(),
            students: summaries,
            grand_total,
        })
    }

    /// The dues list as CSV, one row per student
    pub async fn export_dues_csv(
        &self,
        owner_id: &str,
        class_id: Option<&str>,
        query: DuesQuery,
    ) -> SchoolResult<String> {
        let list = self.dues_list(owner_id, class_id, query).await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["Student", "Class", "Roll", "Phone", "Due months", "Total"])
            .map_err(anyhow::Error::from)?;
        for row in &list.students {
            let months: Vec<&str> = row.due_months.iter().map(|m| m.label()).collect();
            let months = months.join(" ");
            let total = format!("{:.2}", row.total);
            writer
                .write_record([
                    row.student_name.as_str(),
                    row.class_name.as_str(),
                    row.roll_number.as_deref().unwrap_or(""),
                    row.phone.as_deref().unwrap_or(""),
                    months.as_str(),
                    total.as_str(),
                ])
                .map_err(anyhow::Error::from)?;
        }

        let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("Failed to finish CSV: {}", e))?;
        Ok(String::from_utf8(bytes).map_err(anyhow::Error::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::student_service::tests::{sample_student, store_class};
    use crate::storage::Repositories;
    use shared::{Month, MonthStatus};

    fn service(repos: &Repositories) -> FeeService {
        FeeService::new(repos.students.clone(), repos.classes.clone(), ChangeFeed::new())
    }

    fn pay(month: Month, amount: f64, at: &str) -> RecordPaymentRequest {
        RecordPaymentRequest { month, amount, paid_at: Some(at.to_string()) }
    }

    fn as_of(y: i32, m: u32, d: u32) -> DuesQuery {
        DuesQuery { as_of: NaiveDate::from_ymd_opt(y, m, d).unwrap(), since_admission: false }
    }

    #[tokio::test]
    async fn test_partial_then_full_payment() {
        let repos = Repositories::in_memory().await.unwrap();
        let class = store_class(&repos, "o", 1000.0).await;
        let student = sample_student("o", &class.id, "Ira");
        repos.students.store_student(&student).await.unwrap();
        let service = service(&repos);

        let first = service
            .record_payment("o", &student.id, pay(Month::January, 400.0, "2024-01-05T09:00:00.000Z"))
            .await
            .unwrap();
        assert_eq!(first.status, MonthStatus::Partial);
        assert_eq!(first.paid, 400.0);

        let second = service
            .record_payment("o", &student.id, pay(Month::January, 600.0, "2024-01-20T09:00:00.000Z"))
            .await
            .unwrap();
        assert_eq!(second.status, MonthStatus::Paid);
        assert_eq!(
            second.student.fees.january.as_deref(),
            Some("400=d=2024-01-05T09:00:00.000Z;600=d=2024-01-20T09:00:00.000Z")
        );

        let history = service.payment_history("o", &student.id).await.unwrap();
        assert_eq!(history.months[0].entries.len(), 2);
        assert!(history.months[1].entries.is_empty());
    }

    #[tokio::test]
    async fn test_payment_validation() {
        let repos = Repositories::in_memory().await.unwrap();
        let class = store_class(&repos, "o", 1000.0).await;
        let mut student = sample_student("o", &class.id, "Ira");
        student.fees.march = Some("2023-03-02T08:00:00.000Z".to_string());
        repos.students.store_student(&student).await.unwrap();
        let service = service(&repos);

        assert!(matches!(
            service.record_payment("o", &student.id, pay(Month::January, 0.0, "2024-01-05T09:00:00.000Z")).await,
            Err(SchoolError::Validation(_))
        ));
        assert!(matches!(
            service.record_payment("o", &student.id, pay(Month::January, 10.0, "soon")).await,
            Err(SchoolError::Validation(_))
        ));
        assert!(matches!(
            service.record_payment("o", &student.id, pay(Month::March, 10.0, "2024-03-05T09:00:00.000Z")).await,
            Err(SchoolError::Conflict(_))
        ));
        assert!(matches!(
            service.record_payment("x", &student.id, pay(Month::April, 10.0, "2024-04-05T09:00:00.000Z")).await,
            Err(SchoolError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_dues_for_student_and_list() {
        let repos = Repositories::in_memory().await.unwrap();
        let class = store_class(&repos, "o", 1000.0).await;

        let mut paid_up = sample_student("o", &class.id, "Paid Up");
        paid_up.fees.january = Some("1000=d=2024-01-02T00:00:00.000Z".to_string());
        paid_up.fees.february = Some("1000=d=2024-02-02T00:00:00.000Z".to_string());
        repos.students.store_student(&paid_up).await.unwrap();

        let mut owing = sample_student("o", &class.id, "Owing");
        owing.fees.january = Some("1000=d=2024-01-02T00:00:00.000Z".to_string());
        owing.previous_dues = 200.0;
        owing.other_fees.push(OtherFee { fees_name: "Exam".into(), amount: 50.0, paid_date: None });
        repos.students.store_student(&owing).await.unwrap();

        let service = service(&repos);
        let breakdown = service.student_dues("o", &owing.id, as_of(2024, 2, 10)).await.unwrap();
        assert_eq!(breakdown.monthly_total, 1000.0);
        assert_eq!(breakdown.total, 1250.0);

        let list = service.dues_list("o", None, as_of(2024, 2, 10)).await.unwrap();
        assert_eq!(list.students.len(), 1);
        assert_eq!(list.students[0].student_name, "Owing");
        assert_eq!(list.students[0].due_months, vec![Month::February]);
        assert_eq!(list.grand_total, 1250.0);
        assert_eq!(list.as_of, "2024-02-10");

        let csv = service.export_dues_csv("o", None, as_of(2024, 2, 10)).await.unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Student,Class,Roll,Phone,Due months,Total");
        assert_eq!(lines[1], "Owing,Class 4,,,February,1250.00");
    }

    #[tokio::test]
    async fn test_since_admission_skips_months_before_joining() {
        let repos = Repositories::in_memory().await.unwrap();
        let class = store_class(&repos, "o", 500.0).await;
        let mut student = sample_student("o", &class.id, "New");
        student.admission_date = "2024-03-15".to_string();
        repos.students.store_student(&student).await.unwrap();
        let service = service(&repos);

        let query = DuesQuery { as_of: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(), since_admission: true };
        assert_eq!(service.student_dues("o", &student.id, query).await.unwrap().total, 1000.0);
        assert_eq!(service.student_dues("o", &student.id, as_of(2024, 4, 1)).await.unwrap().total, 2000.0);
    }

    #[tokio::test]
    async fn test_other_fees_and_previous_dues() {
        let repos = Repositories::in_memory().await.unwrap();
        let class = store_class(&repos, "o", 0.0).await;
        let mut student = sample_student("o", &class.id, "Dev");
        student.previous_dues = 300.0;
        repos.students.store_student(&student).await.unwrap();
        let service = service(&repos);

        let added = service
            .add_other_fee("o", &student.id, AddOtherFeeRequest { fees_name: "Uniform".into(), amount: 450.0 })
            .await
            .unwrap();
        assert_eq!(added.student.other_fees.len(), 1);

        let paid = service.pay_other_fee("o", &student.id, 0).await.unwrap();
        assert!(paid.student.other_fees[0].is_paid());
        assert!(matches!(service.pay_other_fee("o", &student.id, 0).await, Err(SchoolError::Conflict(_))));
        assert!(matches!(service.pay_other_fee("o", &student.id, 5).await, Err(SchoolError::NotFound(_))));

        let settled = service
            .settle_previous_dues("o", &student.id, SettlePreviousDuesRequest { amount: 120.0 })
            .await
            .unwrap();
        assert_eq!(settled.student.previous_dues, 180.0);
        assert!(matches!(
            service.settle_previous_dues("o", &student.id, SettlePreviousDuesRequest { amount: 500.0 }).await,
            Err(SchoolError::Validation(_))
        ));

        let dues = service.student_dues("o", &student.id, as_of(2024, 12, 31)).await.unwrap();
        assert_eq!(dues.total, 180.0);
    }
}
