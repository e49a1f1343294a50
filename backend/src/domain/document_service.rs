//! # Documents
//!
//! Plain-text renderings of the printable documents: student ID card, fee
//! bill and certificates. Every document opens with the school header.

use chrono::Utc;
use shared::{DuesBreakdown, MonthStatus, SchoolClass, SchoolProfile, Student};
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use super::error::{SchoolError, SchoolResult};
use super::fee_service::{DuesQuery, FeeService};
use super::profile_service::ProfileService;
use crate::storage::{ClassStorage, StudentStorage};

const RULE: &str = "----------------------------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateKind {
    Transfer,
    Character,
    Bonafide,
}

impl CertificateKind {
    fn title(self) -> &'static str {
        match self {
            CertificateKind::Transfer => "TRANSFER CERTIFICATE",
            CertificateKind::Character => "CHARACTER CERTIFICATE",
            CertificateKind::Bonafide => "BONAFIDE CERTIFICATE",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            CertificateKind::Transfer => "transfer",
            CertificateKind::Character => "character",
            CertificateKind::Bonafide => "bonafide",
        }
    }
}

impl FromStr for CertificateKind {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "transfer" => Ok(CertificateKind::Transfer),
            "character" => Ok(CertificateKind::Character),
            "bonafide" => Ok(CertificateKind::Bonafide),
            other => Err(SchoolError::validation(format!("Unknown certificate kind: {}", other))),
        }
    }
}

/// A rendered document ready for download
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub file_name: String,
    pub content: String,
}

#[derive(Clone)]
pub struct DocumentService {
    profiles: ProfileService,
    fees: FeeService,
    students: Arc<dyn StudentStorage>,
    classes: Arc<dyn ClassStorage>,
}

impl DocumentService {
    pub fn new(
        profiles: ProfileService,
        fees: FeeService,
        students: Arc<dyn StudentStorage>,
        classes: Arc<dyn ClassStorage>,
    ) -> Self {
        Self { profiles, fees, students, classes }
    }

    async fn load(&self, owner_id: &str, student_id: &str) -> SchoolResult<(SchoolProfile, Student, Option<SchoolClass>)> {
        let student = self
            .students
            .get_student(owner_id, student_id)
            .await?
            .ok_or_else(|| SchoolError::not_found("Student", student_id))?;
        let class = self.classes.get_class(owner_id, &student.class_id).await?;
        let profile = self.profiles.profile_or_default(owner_id).await?;
        Ok((profile, student, class))
    }

    pub async fn id_card(&self, owner_id: &str, student_id: &str) -> SchoolResult<Document> {
        info!("Generating ID card for {}", student_id);
        let (profile, student, class) = self.load(owner_id, student_id).await?;

        let mut out = header(&profile);
        out.push_str("STUDENT IDENTITY CARD\n\n");
        line(&mut out, "Name", &student.name);
        line(&mut out, "Class", &class_label(class.as_ref()));
        line(&mut out, "Roll No.", student.roll_number.as_deref().unwrap_or("-"));
        line(&mut out, "Father", student.father_name.as_deref().unwrap_or("-"));
        line(&mut out, "Phone", student.phone.as_deref().unwrap_or("-"));
        line(&mut out, "Address", student.address.as_deref().unwrap_or("-"));
        line(&mut out, "Session", &profile.session_year.to_string());

        Ok(Document { file_name: file_name("id-card", &student), content: out })
    }

    pub async fn fee_bill(&self, owner_id: &str, student_id: &str, query: DuesQuery) -> SchoolResult<Document> {
        info!("Generating fee bill for {} as of {}", student_id, query.as_of);
        let (profile, student, class) = self.load(owner_id, student_id).await?;
        let dues = self.fees.student_dues(owner_id, student_id, query).await?;

        let mut out = header(&profile);
        out.push_str("FEE BILL\n\n");
        line(&mut out, "Name", &student.name);
        line(&mut out, "Class", &class_label(class.as_ref()));
        line(&mut out, "Roll No.", student.roll_number.as_deref().unwrap_or("-"));
        line(&mut out, "Bill date", &query.as_of.format("%d %B %Y").to_string());
        out.push('\n');
        render_dues(&mut out, &student, &dues);

        Ok(Document { file_name: file_name("fee-bill", &student), content: out })
    }

    pub async fn certificate(&self, owner_id: &str, student_id: &str, kind: CertificateKind) -> SchoolResult<Document> {
        info!("Generating {:?} certificate for {}", kind, student_id);
        let (profile, student, class) = self.load(owner_id, student_id).await?;

        let parent = student
            .father_name
            .as_deref()
            .or(student.mother_name.as_deref())
            .map(|p| format!(", child of {}", p))
            .unwrap_or_default();
        let class_name = class_label(class.as_ref());

        let body = match kind {
            CertificateKind::Transfer => format!(
                "This is to certify that {}{} was a student of this school in {} from {} and has \
                 been granted a transfer. All dues to the school have been settled.",
                student.name, parent, class_name, student.admission_date
            ),
            CertificateKind::Character => format!(
                "This is to certify that {}{}, a student of {}, has borne a good moral character \
                 during the period of study at this school.",
                student.name, parent, class_name
            ),
            CertificateKind::Bonafide => format!(
                "This is to certify that {}{} is a bonafide student of this school, studying in {} \
                 during the session {}.",
                student.name, parent, class_name, profile.session_year
            ),
        };

        let mut out = header(&profile);
        out.push_str(kind.title());
        out.push_str("\n\n");
        out.push_str(&body);
        out.push_str("\n\n");
        line(&mut out, "Date", &Utc::now().format("%d %B %Y").to_string());
        out.push_str("\n\nPrincipal\n");

        Ok(Document { file_name: file_name(kind.slug(), &student), content: out })
    }
}

fn header(profile: &SchoolProfile) -> String {
    let mut out = String::new();
    out.push_str(&profile.school_name.to_uppercase());
    out.push('\n');
    for detail in [&profile.address, &profile.phone, &profile.email] {
        if !detail.is_empty() {
            out.push_str(detail);
            out.push('\n');
        }
    }
    out.push_str(RULE);
    out.push('\n');
    out
}

fn line(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "{:<10}: {}", label, value);
}

fn class_label(class: Option<&SchoolClass>) -> String {
    class.map_or_else(|| "-".to_string(), |c| c.display_name())
}

fn render_dues(out: &mut String, student: &Student, dues: &DuesBreakdown) {
    let _ = writeln!(out, "{:<12}{:>10}{:>10}  {}", "Month", "Paid", "Due", "Status");
    for month in dues.months.iter().filter(|m| m.status != MonthStatus::Upcoming) {
        let status = match month.status {
            MonthStatus::Paid => "paid",
            MonthStatus::Partial => "partial",
            MonthStatus::Due => "due",
            MonthStatus::Upcoming => "",
        };
        let _ = writeln!(out, "{:<12}{:>10.2}{:>10.2}  {}", month.month.label(), month.paid, month.due, status);
    }
    out.push_str(RULE);
    out.push('\n');
    for fee in student.other_fees.iter().filter(|f| !f.is_paid()) {
        let _ = writeln!(out, "{:<22}{:>10.2}", fee.fees_name, fee.amount);
    }
    if dues.previous_dues > 0.0 {
        let _ = writeln!(out, "{:<22}{:>10.2}", "Previous dues", dues.previous_dues);
    }
    let _ = writeln!(out, "{:<22}{:>10.2}", "TOTAL DUE", dues.total);
}

fn file_name(kind: &str, student: &Student) -> String {
    let slug: String = student
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("{}-{}.txt", kind, slug.trim_matches('-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::change_feed::ChangeFeed;
    use crate::domain::student_service::tests::{sample_student, store_class};
    use crate::storage::Repositories;
    use chrono::NaiveDate;
    use shared::{OtherFee, UpsertProfileRequest};

    async fn setup() -> (DocumentService, Student) {
        let repos = Repositories::in_memory().await.unwrap();
        let feed = ChangeFeed::new();
        let class = store_class(&repos, "o", 500.0).await;
        let mut student = sample_student("o", &class.id, "Maya Iyer");
        student.father_name = Some("Ravi Iyer".to_string());
        student.roll_number = Some("7".to_string());
        student.fees.january = Some("500=d=2024-01-04T00:00:00.000Z".to_string());
        student.other_fees = vec![OtherFee { fees_name: "Sports".into(), amount: 75.0, paid_date: None }];
        repos.students.store_student(&student).await.unwrap();

        let profiles = ProfileService::new(repos.profiles.clone(), feed.clone());
        profiles
            .upsert_profile(
                "o",
                UpsertProfileRequest {
                    school_name: "Hill View School".into(),
                    address: "4 Ridge Rd".into(),
                    phone: "555-0100".into(),
                    email: String::new(),
                    logo_path: None,
                    session_year: 2024,
                },
            )
            .await
            .unwrap();
        let fees = FeeService::new(repos.students.clone(), repos.classes.clone(), feed);
        (DocumentService::new(profiles, fees, repos.students.clone(), repos.classes.clone()), student)
    }

    #[test]
    fn test_certificate_kind_parsing() {
        assert_eq!("Transfer".parse::<CertificateKind>().unwrap(), CertificateKind::Transfer);
        assert_eq!(" bonafide ".parse::<CertificateKind>().unwrap(), CertificateKind::Bonafide);
        assert!("leaving".parse::<CertificateKind>().is_err());
    }

    #[tokio::test]
    async fn test_id_card() {
        let (service, student) = setup().await;
        let doc = service.id_card("o", &student.id).await.unwrap();

        assert_eq!(doc.file_name, "id-card-maya-iyer.txt");
        assert!(doc.content.starts_with("HILL VIEW SCHOOL\n4 Ridge Rd\n555-0100\n"));
        assert!(doc.content.contains("Roll No.  : 7"));
        assert!(doc.content.contains("Class     : Class 4"));
    }

    #[tokio::test]
    async fn test_fee_bill_lists_dues() {
        let (service, student) = setup().await;
        let query = DuesQuery { as_of: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(), since_admission: false };
        let doc = service.fee_bill("o", &student.id, query).await.unwrap();

        assert!(doc.content.contains("January"));
        assert!(doc.content.contains("February"));
        assert!(!doc.content.contains("March"));
        assert!(doc.content.contains("Sports"));
        assert!(doc.content.contains("TOTAL DUE                 575.00"));
    }

    #[tokio::test]
    async fn test_certificates_and_missing_student() {
        let (service, student) = setup().await;
        let doc = service.certificate("o", &student.id, CertificateKind::Bonafide).await.unwrap();
        assert!(doc.content.contains("BONAFIDE CERTIFICATE"));
        assert!(doc.content.contains("Maya Iyer, child of Ravi Iyer is a bonafide student"));
        assert_eq!(doc.file_name, "bonafide-maya-iyer.txt");

        assert!(matches!(
            service.certificate("o", "student::missing", CertificateKind::Transfer).await,
            Err(SchoolError::NotFound(_))
        ));
    }
}
