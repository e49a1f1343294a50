//! SQLite implementations of the storage traits

pub mod attendance_repository;
pub mod class_repository;
pub mod driver_repository;
pub mod exam_repository;
pub mod expense_repository;
pub mod profile_repository;
pub mod salary_repository;
pub mod staff_repository;
pub mod student_repository;

pub use attendance_repository::AttendanceRepository;
pub use class_repository::ClassRepository;
pub use driver_repository::DriverRepository;
pub use exam_repository::ExamRepository;
pub use expense_repository::ExpenseRepository;
pub use profile_repository::ProfileRepository;
pub use salary_repository::SalaryRepository;
pub use staff_repository::StaffRepository;
pub use student_repository::StudentRepository;
