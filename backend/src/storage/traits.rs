//! # Storage Traits
//!
//! Every trait method takes the caller's owner id; implementations must never
//! return or modify a row that belongs to another owner.

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    AttendanceRecord, Driver, ExamResult, Expense, Month, SalaryRecord, SchoolClass, SchoolProfile,
    Staff, Student,
};

#[async_trait]
pub trait ProfileStorage: Send + Sync {
    async fn get_profile(&self, owner_id: &str) -> Result<Option<SchoolProfile>>;

    /// Insert or replace the owner's single profile row
    async fn upsert_profile(&self, profile: &SchoolProfile) -> Result<()>;
}

#[async_trait]
pub trait ClassStorage: Send + Sync {
    async fn store_class(&self, class: &SchoolClass) -> Result<()>;

    async fn get_class(&self, owner_id: &str, class_id: &str) -> Result<Option<SchoolClass>>;

    /// All classes ordered by name
    async fn list_classes(&self, owner_id: &str) -> Result<Vec<SchoolClass>>;

    async fn update_class(&self, class: &SchoolClass) -> Result<bool>;

    async fn delete_class(&self, owner_id: &str, class_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait StudentStorage: Send + Sync {
    async fn store_student(&self, student: &Student) -> Result<()>;

    async fn get_student(&self, owner_id: &str, student_id: &str) -> Result<Option<Student>>;

    /// Students ordered by name, optionally limited to one class
    async fn list_students(&self, owner_id: &str, class_id: Option<&str>) -> Result<Vec<Student>>;

    async fn list_students_by_driver(&self, owner_id: &str, driver_id: &str) -> Result<Vec<Student>>;

    async fn count_students_in_class(&self, owner_id: &str, class_id: &str) -> Result<i64>;

    /// Write every column except the monthly ledger
    async fn update_student(&self, student: &Student) -> Result<bool>;

    async fn delete_student(&self, owner_id: &str, student_id: &str) -> Result<bool>;

    /// Append a formatted payment entry to a month in a single statement.
    /// Returns false when the row is missing or the month holds the legacy
    /// paid-in-full timestamp.
    async fn append_month_entry(
        &self,
        owner_id: &str,
        student_id: &str,
        month: Month,
        entry: &str,
        updated_at: &str,
    ) -> Result<bool>;

    /// Detach every student from a driver, returning how many were affected
    async fn clear_driver_assignments(&self, owner_id: &str, driver_id: &str) -> Result<u64>;
}

#[async_trait]
pub trait StaffStorage: Send + Sync {
    async fn store_staff(&self, staff: &Staff) -> Result<()>;

    async fn get_staff(&self, owner_id: &str, staff_id: &str) -> Result<Option<Staff>>;

    async fn list_staff(&self, owner_id: &str) -> Result<Vec<Staff>>;

    async fn update_staff(&self, staff: &Staff) -> Result<bool>;

    async fn delete_staff(&self, owner_id: &str, staff_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait AttendanceStorage: Send + Sync {
    /// Insert, or replace the existing record for the same class and date
    async fn upsert_attendance(&self, record: &AttendanceRecord) -> Result<AttendanceRecord>;

    async fn get_attendance(&self, owner_id: &str, class_id: &str, date: &str) -> Result<Option<AttendanceRecord>>;

    /// Records in date order; bounds are inclusive `YYYY-MM-DD` strings
    async fn list_attendance(
        &self,
        owner_id: &str,
        class_id: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Vec<AttendanceRecord>>;
}

#[async_trait]
pub trait SalaryStorage: Send + Sync {
    async fn store_salary(&self, record: &SalaryRecord) -> Result<()>;

    async fn find_salary(&self, owner_id: &str, staff_id: &str, month: Month, year: i32) -> Result<Option<SalaryRecord>>;

    /// Records ordered by year then month, filtered by staff and/or period
    async fn list_salaries(
        &self,
        owner_id: &str,
        staff_id: Option<&str>,
        period: Option<(Month, i32)>,
    ) -> Result<Vec<SalaryRecord>>;

    async fn delete_salaries_for_staff(&self, owner_id: &str, staff_id: &str) -> Result<u64>;
}

#[async_trait]
pub trait ExpenseStorage: Send + Sync {
    async fn store_expense(&self, expense: &Expense) -> Result<()>;

    /// All expenses, newest date first
    async fn list_expenses(&self, owner_id: &str) -> Result<Vec<Expense>>;

    async fn delete_expense(&self, owner_id: &str, expense_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait ExamStorage: Send + Sync {
    async fn store_result(&self, result: &ExamResult) -> Result<()>;

    async fn get_result(&self, owner_id: &str, result_id: &str) -> Result<Option<ExamResult>>;

    async fn list_results(
        &self,
        owner_id: &str,
        student_id: Option<&str>,
        exam_name: Option<&str>,
    ) -> Result<Vec<ExamResult>>;

    async fn delete_results_for_student(&self, owner_id: &str, student_id: &str) -> Result<u64>;
}

#[async_trait]
pub trait DriverStorage: Send + Sync {
    async fn store_driver(&self, driver: &Driver) -> Result<()>;

    async fn get_driver(&self, owner_id: &str, driver_id: &str) -> Result<Option<Driver>>;

    async fn list_drivers(&self, owner_id: &str) -> Result<Vec<Driver>>;

    async fn update_driver(&self, driver: &Driver) -> Result<bool>;

    async fn delete_driver(&self, owner_id: &str, driver_id: &str) -> Result<bool>;
}
