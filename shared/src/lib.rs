use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Build a prefixed row identifier, e.g. `student::7f0c…`
fn prefixed_id(kind: &str) -> String {
    format!("{}::{}", kind, Uuid::new_v4())
}

/// Calendar month; each one owns a fee-status column on the student row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Zero-based position in the calendar year (January = 0)
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Month> {
        Self::ALL.get(index).copied()
    }

    /// One-based month number (January = 1)
    pub fn number(self) -> u32 {
        self.index() as u32 + 1
    }

    pub fn from_number(number: u32) -> Option<Month> {
        number.checked_sub(1).and_then(|i| Self::from_index(i as usize))
    }

    /// Lowercase name, which is also the column name on the students table
    pub fn name(self) -> &'static str {
        match self {
            Month::January => "january",
            Month::February => "february",
            Month::March => "march",
            Month::April => "april",
            Month::May => "may",
            Month::June => "june",
            Month::July => "july",
            Month::August => "august",
            Month::September => "september",
            Month::October => "october",
            Month::November => "november",
            Month::December => "december",
        }
    }

    /// Capitalised name for documents and reports
    pub fn label(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Month {
    type Err = MonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Month::ALL
            .iter()
            .copied()
            .find(|m| m.name() == needle)
            .ok_or_else(|| MonthParseError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthParseError(pub String);

impl fmt::Display for MonthParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown month: {}", self.0)
    }
}

impl std::error::Error for MonthParseError {}

/// The twelve raw month-status strings stored on a student row.
///
/// Each value is empty, `"undefined"`, `"Dues"`, a legacy ISO timestamp, or a
/// `;`-joined list of `"<amount>=d=<timestamp>"` payment entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeLedger {
    #[serde(default)]
    pub january: Option<String>,
    #[serde(default)]
    pub february: Option<String>,
    #[serde(default)]
    pub march: Option<String>,
    #[serde(default)]
    pub april: Option<String>,
    #[serde(default)]
    pub may: Option<String>,
    #[serde(default)]
    pub june: Option<String>,
    #[serde(default)]
    pub july: Option<String>,
    #[serde(default)]
    pub august: Option<String>,
    #[serde(default)]
    pub september: Option<String>,
    #[serde(default)]
    pub october: Option<String>,
    #[serde(default)]
    pub november: Option<String>,
    #[serde(default)]
    pub december: Option<String>,
}

impl FeeLedger {
    fn slot(&self, month: Month) -> &Option<String> {
        match month {
            Month::January => &self.january,
            Month::February => &self.february,
            Month::March => &self.march,
            Month::April => &self.april,
            Month::May => &self.may,
            Month::June => &self.june,
            Month::July => &self.july,
            Month::August => &self.august,
            Month::September => &self.september,
            Month::October => &self.october,
            Month::November => &self.november,
            Month::December => &self.december,
        }
    }

    fn slot_mut(&mut self, month: Month) -> &mut Option<String> {
        match month {
            Month::January => &mut self.january,
            Month::February => &mut self.february,
            Month::March => &mut self.march,
            Month::April => &mut self.april,
            Month::May => &mut self.may,
            Month::June => &mut self.june,
            Month::July => &mut self.july,
            Month::August => &mut self.august,
            Month::September => &mut self.september,
            Month::October => &mut self.october,
            Month::November => &mut self.november,
            Month::December => &mut self.december,
        }
    }

    pub fn get(&self, month: Month) -> Option<&str> {
        self.slot(month).as_deref()
    }

    pub fn set(&mut self, month: Month, value: Option<String>) {
        *self.slot_mut(month) = value;
    }

    /// Iterate over all twelve months in calendar order
    pub fn iter(&self) -> impl Iterator<Item = (Month, Option<&str>)> + '_ {
        Month::ALL.iter().map(move |m| (*m, self.get(*m)))
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// School details printed on every generated document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolProfile {
    pub owner_id: String,
    pub school_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub logo_path: Option<String>,
    pub session_year: i32,
    pub updated_at: String, // RFC 3339 timestamp
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolClass {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub section: Option<String>,
    /// Tuition charged for every calendar month
    pub monthly_fee: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl SchoolClass {
    pub fn generate_id() -> String {
        prefixed_id("class")
    }

    /// "Class 5 - A" style label
    pub fn display_name(&self) -> String {
        match &self.section {
            Some(section) if !section.trim().is_empty() => format!("{} - {}", self.name, section),
            _ => self.name.clone(),
        }
    }
}

/// A one-off fee item (exam fee, transport, uniform …)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherFee {
    pub fees_name: String,
    pub amount: f64,
    /// RFC 3339 timestamp; absent while unpaid
    #[serde(default)]
    pub paid_date: Option<String>,
}

impl OtherFee {
    pub fn is_paid(&self) -> bool {
        self.paid_date.as_deref().map_or(false, |d| !d.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub owner_id: String,
    pub class_id: String,
    pub name: String,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub roll_number: Option<String>,
    pub admission_date: String, // YYYY-MM-DD
    pub photo_path: Option<String>,
    pub transport_driver_id: Option<String>,
    /// Opening balance carried over from a prior session
    pub previous_dues: f64,
    #[serde(default)]
    pub other_fees: Vec<OtherFee>,
    #[serde(flatten)]
    pub fees: FeeLedger,
    pub created_at: String,
    pub updated_at: String,
}

impl Student {
    pub fn generate_id() -> String {
        prefixed_id("student")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub role: String,
    pub phone: Option<String>,
    pub monthly_salary: f64,
    pub join_date: String, // YYYY-MM-DD
    pub photo_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Staff {
    pub fn generate_id() -> String {
        prefixed_id("staff")
    }
}

/// One class's attendance for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub owner_id: String,
    pub class_id: String,
    pub date: String, // YYYY-MM-DD
    /// Comma-joined student ids
    pub present_ids: String,
    /// Comma-joined student ids
    pub absent_ids: String,
    pub created_at: String,
    pub updated_at: String,
}

impl AttendanceRecord {
    pub fn generate_id() -> String {
        prefixed_id("attendance")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRecord {
    pub id: String,
    pub owner_id: String,
    pub staff_id: String,
    pub month: Month,
    pub year: i32,
    pub amount: f64,
    pub paid_date: String, // RFC 3339 timestamp
    pub note: Option<String>,
}

impl SalaryRecord {
    pub fn generate_id() -> String {
        prefixed_id("salary")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub category: String,
    pub amount: f64,
    pub date: String, // YYYY-MM-DD
    pub note: Option<String>,
    pub created_at: String,
}

impl Expense {
    pub fn generate_id() -> String {
        prefixed_id("expense")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectMark {
    pub subject: String,
    pub max_marks: f64,
    pub obtained_marks: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: String,
    pub owner_id: String,
    pub student_id: String,
    pub exam_name: String,
    pub subjects: Vec<SubjectMark>,
    pub created_at: String,
}

impl ExamResult {
    pub fn generate_id() -> String {
        prefixed_id("exam")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub vehicle_number: String,
    pub route: Option<String>,
    pub created_at: String,
}

impl Driver {
    pub fn generate_id() -> String {
        prefixed_id("driver")
    }
}

// ---------------------------------------------------------------------------
// Profile & classes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertProfileRequest {
    pub school_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub logo_path: Option<String>,
    pub session_year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateClassRequest {
    pub name: String,
    pub section: Option<String>,
    pub monthly_fee: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateClassRequest {
    pub name: Option<String>,
    pub section: Option<String>,
    pub monthly_fee: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassResponse {
    pub class: SchoolClass,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassListResponse {
    pub classes: Vec<SchoolClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollNumberSuggestion {
    pub class_id: String,
    pub roll_number: String,
}

// ---------------------------------------------------------------------------
// Students
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStudentRequest {
    pub class_id: String,
    pub name: String,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Suggested from the class roster when omitted
    pub roll_number: Option<String>,
    pub admission_date: String, // YYYY-MM-DD
    pub photo_path: Option<String>,
    #[serde(default)]
    pub previous_dues: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateStudentRequest {
    pub class_id: Option<String>,
    pub name: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub roll_number: Option<String>,
    pub admission_date: Option<String>,
    pub photo_path: Option<String>,
    pub previous_dues: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentResponse {
    pub student: Student,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentListResponse {
    pub students: Vec<Student>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignTransportRequest {
    pub driver_id: String,
}

// ---------------------------------------------------------------------------
// Fees & dues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub month: Month,
    pub amount: f64,
    /// RFC 3339 timestamp; defaults to now
    pub paid_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPaymentResponse {
    pub student: Student,
    pub month: Month,
    pub status: MonthStatus,
    pub paid: f64,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOtherFeeRequest {
    pub fees_name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlePreviousDuesRequest {
    pub amount: f64,
}

/// Payment state of a single month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthStatus {
    Paid,
    Partial,
    Due,
    /// Outside the dues window (future month or before enrollment)
    Upcoming,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthDue {
    pub month: Month,
    pub status: MonthStatus,
    pub paid: f64,
    pub due: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuesBreakdown {
    pub monthly_fee: f64,
    pub months: Vec<MonthDue>,
    pub monthly_total: f64,
    pub other_fees_total: f64,
    pub previous_dues: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDuesSummary {
    pub student_id: String,
    pub student_name: String,
    pub class_id: String,
    pub class_name: String,
    pub roll_number: Option<String>,
    pub phone: Option<String>,
    pub due_months: Vec<Month>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuesListResponse {
    pub as_of: String, // YYYY-MM-DD
    pub students: Vec<StudentDuesSummary>,
    pub grand_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEntryDto {
    pub amount: f64,
    pub paid_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthPayments {
    pub month: Month,
    pub entries: Vec<PaymentEntryDto>,
    /// Stored in the legacy "paid in full" timestamp form
    pub legacy_paid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentHistoryResponse {
    pub student_id: String,
    pub months: Vec<MonthPayments>,
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitAttendanceRequest {
    pub class_id: String,
    pub date: String, // YYYY-MM-DD
    pub present_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub student_id: String,
    pub student_name: String,
    pub days_recorded: u32,
    pub days_present: u32,
    pub days_absent: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassAttendanceSummary {
    pub class_id: String,
    pub from: String,
    pub to: String,
    pub students: Vec<AttendanceSummary>,
}

// ---------------------------------------------------------------------------
// Staff, salary, transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStaffRequest {
    pub name: String,
    pub role: String,
    pub phone: Option<String>,
    pub monthly_salary: f64,
    pub join_date: String,
    pub photo_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateStaffRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub monthly_salary: Option<f64>,
    pub join_date: Option<String>,
    pub photo_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSalaryRequest {
    pub staff_id: String,
    pub month: Month,
    pub year: i32,
    /// Defaults to the staff member's monthly salary
    pub amount: Option<f64>,
    pub paid_date: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDriverRequest {
    pub name: String,
    pub phone: Option<String>,
    pub vehicle_number: String,
    pub route: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateDriverRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub vehicle_number: Option<String>,
    pub route: Option<String>,
}

// ---------------------------------------------------------------------------
// Exams & expenses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordExamResultRequest {
    pub student_id: String,
    pub exam_name: String,
    pub subjects: Vec<SubjectMark>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSummary {
    pub result_id: String,
    pub student_id: String,
    pub exam_name: String,
    pub total_obtained: f64,
    pub total_max: f64,
    pub percentage: f64,
    pub grade: String,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub rank: u32,
    pub student_id: String,
    pub student_name: String,
    pub percentage: f64,
    pub grade: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateExpenseRequest {
    pub title: String,
    pub category: String,
    pub amount: f64,
    pub date: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub month: Month,
    pub year: i32,
    pub fee_income: f64,
    pub other_fee_income: f64,
    pub expenses: f64,
    pub salaries: f64,
    pub net: f64,
}

/// Reply to a successful delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success_message: String,
}

// ---------------------------------------------------------------------------
// Uploads, export, realtime, assistant, logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Public path under `/uploads`
    pub path: String,
    pub size_bytes: usize,
    pub quality: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub classes: usize,
    pub students: usize,
    pub staff: usize,
    pub attendance: usize,
    pub salary_records: usize,
    pub expenses: usize,
    pub exam_results: usize,
    pub drivers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Notification pushed to subscribers after every write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    pub row_id: String,
    pub owner_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendChatMessageRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub session_id: String,
    pub reply: String,
}

/// A log line forwarded by the browser console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: String,
    pub message: String,
    pub component: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_round_trips_through_number_and_name() {
        for month in Month::ALL {
            assert_eq!(Month::from_number(month.number()), Some(month));
            assert_eq!(month.name().parse::<Month>().unwrap(), month);
        }
        assert_eq!(Month::from_number(0), None);
        assert_eq!(Month::from_number(13), None);
        assert_eq!(" February ".parse::<Month>().unwrap(), Month::February);
        assert!("Febuary".parse::<Month>().is_err());
    }

    #[test]
    fn test_fee_ledger_get_and_set() {
        let mut ledger = FeeLedger::default();
        ledger.set(Month::March, Some("500=d=2024-03-01T00:00:00.000Z".to_string()));

        assert_eq!(ledger.get(Month::March), Some("500=d=2024-03-01T00:00:00.000Z"));
        assert_eq!(ledger.get(Month::April), None);
        assert_eq!(ledger.iter().filter(|(_, v)| v.is_some()).count(), 1);
    }

    #[test]
    fn test_student_serializes_months_as_top_level_fields() {
        let mut fees = FeeLedger::default();
        fees.january = Some("Dues".to_string());
        let student = Student {
            id: "student::1".to_string(),
            owner_id: "owner".to_string(),
            class_id: "class::1".to_string(),
            name: "Asha".to_string(),
            father_name: None,
            mother_name: None,
            phone: None,
            address: None,
            roll_number: Some("1".to_string()),
            admission_date: "2024-04-01".to_string(),
            photo_path: None,
            transport_driver_id: None,
            previous_dues: 0.0,
            other_fees: vec![],
            fees,
            created_at: "2024-04-01T00:00:00Z".to_string(),
            updated_at: "2024-04-01T00:00:00Z".to_string(),
        };

        let json = serde_json::to_value(&student).unwrap();
        assert_eq!(json["january"], "Dues");
        assert!(json["february"].is_null());

        let back: Student = serde_json::from_value(json).unwrap();
        assert_eq!(back, student);
    }

    #[test]
    fn test_other_fee_paid_state() {
        let unpaid = OtherFee { fees_name: "Exam".into(), amount: 200.0, paid_date: None };
        let blank = OtherFee { paid_date: Some("  ".into()), ..unpaid.clone() };
        let paid = OtherFee { paid_date: Some("2024-05-01T00:00:00Z".into()), ..unpaid.clone() };
        assert!(!unpaid.is_paid());
        assert!(!blank.is_paid());
        assert!(paid.is_paid());
    }
}
