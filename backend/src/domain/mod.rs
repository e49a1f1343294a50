//! # Domain Module
//!
//! Business rules of the school office: classes and students, the monthly
//! fee ledger and dues, attendance, staff and salaries, transport, exams,
//! expenses, reports, documents, uploads, export/import and the help
//! assistant.
//!
//! Services are cheap to clone; each one holds `Arc`s to the storage traits
//! it needs and a handle on the change feed. Every service method takes the
//! owner id of the signed-in account first and never touches another
//! owner's rows.
//!
//! ## Module Organization
//!
//! - **ledger**: payment-string parsing and formatting for one fee month
//! - **dues**: monthly due computation over a ledger
//! - **fee_service**: payments, other fees, previous dues and dues lists
//! - **attendance_service**: presence toggling and attendance summaries
//! - **change_feed**: broadcast of row changes for realtime clients

pub mod assistant_service;
pub mod attendance_service;
pub mod change_feed;
pub mod class_service;
pub mod document_service;
pub mod dues;
pub mod error;
pub mod exam_service;
pub mod expense_service;
pub mod export_service;
pub mod fee_service;
pub mod image_service;
pub mod ledger;
pub mod profile_service;
pub mod report_service;
pub mod salary_service;
pub mod staff_service;
pub mod student_service;
pub mod transport_service;
pub mod validation;

pub use assistant_service::{AssistantService, ChatProvider, HttpChatProvider};
pub use attendance_service::{AttendanceService, DateRange, PresenceSet};
pub use change_feed::ChangeFeed;
pub use class_service::ClassService;
pub use document_service::{CertificateKind, Document, DocumentService};
pub use error::{SchoolError, SchoolResult};
pub use exam_service::ExamService;
pub use expense_service::ExpenseService;
pub use export_service::{ExportDocument, ExportService};
pub use fee_service::{DuesQuery, FeeService};
pub use image_service::{ImageService, UploadKind};
pub use profile_service::ProfileService;
pub use report_service::ReportService;
pub use salary_service::SalaryService;
pub use staff_service::StaffService;
pub use student_service::StudentService;
pub use transport_service::TransportService;
