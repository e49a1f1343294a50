//! # School Admin Backend
//!
//! HTTP backend of a school administration console.
//!
//! ## Architecture
//!
//! ```text
//! Browser client
//!     ↓
//! IO Layer (REST handlers, SSE feed)
//!     ↓
//! Domain Layer (services, ledger and dues rules)
//!     ↓
//! Storage Layer (SQLite repositories, upload directory)
//! ```
//!
//! Every request carries the signed-in account in the `x-owner-id` header
//! and only ever sees that account's rows.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::{
    AssistantService, AttendanceService, ChangeFeed, ChatProvider, ClassService, DocumentService, ExamService,
    ExpenseService, ExportService, FeeService, HttpChatProvider, ImageService, ProfileService, ReportService,
    SalaryService, StaffService, StudentService, TransportService,
};
use crate::io::rest::{
    assistant_apis, attendance_apis, class_apis, document_apis, exam_apis, expense_apis, export_apis, fee_apis,
    logging_apis, profile_apis, realtime_apis, report_apis, staff_apis, student_apis, transport_apis, upload_apis,
};
use crate::storage::uploads::UPLOADS_URL_PREFIX;
use crate::storage::{DbConnection, Repositories, UploadStore};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub profile_service: ProfileService,
    pub class_service: ClassService,
    pub student_service: StudentService,
    pub fee_service: FeeService,
    pub attendance_service: AttendanceService,
    pub staff_service: StaffService,
    pub salary_service: SalaryService,
    pub transport_service: TransportService,
    pub exam_service: ExamService,
    pub expense_service: ExpenseService,
    pub report_service: ReportService,
    pub document_service: DocumentService,
    pub image_service: ImageService,
    pub export_service: ExportService,
    pub assistant_service: AssistantService,
    pub change_feed: ChangeFeed,
}

impl AppState {
    /// Wire every service over one set of repositories and one change feed
    pub fn new(repos: Repositories, uploads: UploadStore, config: &AppConfig, provider: Arc<dyn ChatProvider>) -> Self {
        let feed = ChangeFeed::new();

        let profile_service = ProfileService::new(repos.profiles.clone(), feed.clone());
        let fee_service = FeeService::new(repos.students.clone(), repos.classes.clone(), feed.clone());
        let document_service = DocumentService::new(
            profile_service.clone(),
            fee_service.clone(),
            repos.students.clone(),
            repos.classes.clone(),
        );

        Self {
            class_service: ClassService::new(repos.classes.clone(), repos.students.clone(), feed.clone()),
            student_service: StudentService::new(
                repos.students.clone(),
                repos.classes.clone(),
                repos.exams.clone(),
                feed.clone(),
            ),
            attendance_service: AttendanceService::new(
                repos.attendance.clone(),
                repos.students.clone(),
                repos.classes.clone(),
                feed.clone(),
            ),
            staff_service: StaffService::new(repos.staff.clone(), repos.salaries.clone(), feed.clone()),
            salary_service: SalaryService::new(repos.salaries.clone(), repos.staff.clone(), feed.clone()),
            transport_service: TransportService::new(repos.drivers.clone(), repos.students.clone(), feed.clone()),
            exam_service: ExamService::new(repos.exams.clone(), repos.students.clone(), feed.clone()),
            expense_service: ExpenseService::new(repos.expenses.clone(), feed.clone()),
            report_service: ReportService::new(
                repos.students.clone(),
                repos.classes.clone(),
                repos.expenses.clone(),
                repos.salaries.clone(),
            ),
            image_service: ImageService::new(uploads, config.uploads.clone()),
            assistant_service: AssistantService::new(provider, config.assistant.max_history),
            export_service: ExportService::new(repos, feed.clone()),
            profile_service,
            fee_service,
            document_service,
            change_feed: feed,
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let db = DbConnection::new(&config.database_url).await?;

    info!("Storing uploads under {}", config.upload_dir.display());
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let uploads = UploadStore::new(config.upload_dir.clone());

    if config.assistant.api_key.is_none() {
        warn!("No assistant API key configured; assistant requests will fail");
    }
    let provider: Arc<dyn ChatProvider> = Arc::new(HttpChatProvider::new(config.assistant.clone()));

    info!("Setting up application state");
    Ok(AppState::new(Repositories::sqlite(db), uploads, config, provider))
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin.trim() == "*" {
        AllowOrigin::from(Any)
    } else {
        match origin.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!("Invalid CORS origin {:?} ({}), allowing any origin", origin, e);
                AllowOrigin::from(Any)
            }
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, config: &AppConfig) -> Router {
    let api_routes = Router::new()
        .route("/profile", get(profile_apis::get_profile).put(profile_apis::upsert_profile))
        // Classes
        .route("/classes", get(class_apis::list_classes).post(class_apis::create_class))
        .route(
            "/classes/:id",
            get(class_apis::get_class).put(class_apis::update_class).delete(class_apis::delete_class),
        )
        .route("/classes/:id/roll-number", get(class_apis::suggest_roll_number))
        // Students
        .route("/students", get(student_apis::list_students).post(student_apis::create_student))
        .route(
            "/students/:id",
            get(student_apis::get_student).put(student_apis::update_student).delete(student_apis::delete_student),
        )
        .route(
            "/students/:id/transport",
            put(student_apis::assign_transport).delete(student_apis::unassign_transport),
        )
        // Fees
        .route("/students/:id/dues", get(fee_apis::student_dues))
        .route("/students/:id/payments", get(fee_apis::payment_history).post(fee_apis::record_payment))
        .route("/students/:id/other-fees", post(fee_apis::add_other_fee))
        .route("/students/:id/other-fees/:index/pay", post(fee_apis::pay_other_fee))
        .route("/students/:id/previous-dues/settle", post(fee_apis::settle_previous_dues))
        .route("/dues", get(fee_apis::list_dues))
        .route("/dues/export.csv", get(fee_apis::export_dues_csv))
        // Attendance
        .route("/attendance", get(attendance_apis::get_attendance).post(attendance_apis::submit_attendance))
        .route("/attendance/students/:id/summary", get(attendance_apis::student_summary))
        .route("/attendance/classes/:id/summary", get(attendance_apis::class_summary))
        // Staff and salaries
        .route("/staff", get(staff_apis::list_staff).post(staff_apis::create_staff))
        .route(
            "/staff/:id",
            get(staff_apis::get_staff).put(staff_apis::update_staff).delete(staff_apis::delete_staff),
        )
        .route("/salaries", get(staff_apis::list_salaries).post(staff_apis::record_salary))
        .route("/salaries/unpaid", get(staff_apis::unpaid_staff))
        // Transport
        .route("/drivers", get(transport_apis::list_drivers).post(transport_apis::create_driver))
        .route(
            "/drivers/:id",
            get(transport_apis::get_driver)
                .put(transport_apis::update_driver)
                .delete(transport_apis::delete_driver),
        )
        .route("/drivers/:id/students", get(transport_apis::students_for_driver))
        // Exams
        .route("/exam-results", get(exam_apis::list_results).post(exam_apis::record_result))
        .route("/exam-results/ranking", get(exam_apis::class_ranking))
        .route("/exam-results/:id/summary", get(exam_apis::result_summary))
        // Expenses and reports
        .route("/expenses", get(expense_apis::list_expenses).post(expense_apis::create_expense))
        .route("/expenses/:id", delete(expense_apis::delete_expense))
        .route("/reports/monthly", get(report_apis::monthly_report))
        // Documents
        .route("/documents/id-card/:student_id", get(document_apis::id_card))
        .route("/documents/bill/:student_id", get(document_apis::fee_bill))
        .route("/documents/certificate/:student_id", get(document_apis::certificate))
        // Uploads, export, realtime
        .route(
            "/uploads",
            post(upload_apis::upload_image).layer(DefaultBodyLimit::max(upload_apis::MAX_RAW_UPLOAD_BYTES)),
        )
        .route("/export", get(export_apis::export_data))
        .route("/import", post(export_apis::import_data))
        .route("/realtime", get(realtime_apis::change_stream))
        // Assistant and client logs
        .route("/assistant/sessions", post(assistant_apis::create_session))
        .route("/assistant/sessions/:id", delete(assistant_apis::end_session))
        .route("/assistant/sessions/:id/messages", post(assistant_apis::send_message))
        .route("/logs", post(logging_apis::log_message));

    Router::new()
        .nest("/api", api_routes)
        .nest_service(UPLOADS_URL_PREFIX, ServeDir::new(config.upload_dir.clone()))
        .layer(cors_layer(&config.cors_origin))
        .with_state(app_state)
}
