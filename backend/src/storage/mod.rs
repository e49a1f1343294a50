//! Storage layer: SQLite repositories behind async traits, plus the upload store.

pub mod connection;
pub mod repositories;
pub mod traits;
pub mod uploads;

use std::sync::Arc;

pub use connection::DbConnection;
pub use traits::*;
pub use uploads::UploadStore;

use repositories::{
    AttendanceRepository, ClassRepository, DriverRepository, ExamRepository, ExpenseRepository,
    ProfileRepository, SalaryRepository, StaffRepository, StudentRepository,
};

/// One handle per table, shared by every service
#[derive(Clone)]
pub struct Repositories {
    pub profiles: Arc<dyn ProfileStorage>,
    pub classes: Arc<dyn ClassStorage>,
    pub students: Arc<dyn StudentStorage>,
    pub staff: Arc<dyn StaffStorage>,
    pub attendance: Arc<dyn AttendanceStorage>,
    pub salaries: Arc<dyn SalaryStorage>,
    pub expenses: Arc<dyn ExpenseStorage>,
    pub exams: Arc<dyn ExamStorage>,
    pub drivers: Arc<dyn DriverStorage>,
}

impl Repositories {
    pub fn sqlite(db: DbConnection) -> Self {
        Self {
            profiles: Arc::new(ProfileRepository::new(db.clone())),
            classes: Arc::new(ClassRepository::new(db.clone())),
            students: Arc::new(StudentRepository::new(db.clone())),
            staff: Arc::new(StaffRepository::new(db.clone())),
            attendance: Arc::new(AttendanceRepository::new(db.clone())),
            salaries: Arc::new(SalaryRepository::new(db.clone())),
            expenses: Arc::new(ExpenseRepository::new(db.clone())),
            exams: Arc::new(ExamRepository::new(db.clone())),
            drivers: Arc::new(DriverRepository::new(db)),
        }
    }

    /// Fresh in-memory database, used by service tests
    pub async fn in_memory() -> anyhow::Result<Self> {
        Ok(Self::sqlite(DbConnection::init_in_memory().await?))
    }
}
