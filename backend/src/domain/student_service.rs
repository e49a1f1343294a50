use shared::{
    ChangeKind, CreateStudentRequest, FeeLedger, RollNumberSuggestion, Student, StudentListResponse,
    StudentResponse, UpdateStudentRequest,
};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

use super::change_feed::{tables, ChangeFeed};
use super::error::{SchoolError, SchoolResult};
use super::validation::{non_negative_amount, now_timestamp, optional, parse_date, required};
use crate::storage::{ClassStorage, ExamStorage, StudentStorage};

/// Next roll number for a class: highest numeric roll plus one.
/// Non-numeric rolls are ignored; an empty class starts at "1".
pub fn suggest_roll_number<'a>(rolls: impl IntoIterator<Item = Option<&'a str>>) -> String {
    let highest = rolls
        .into_iter()
        .flatten()
        .filter_map(|roll| roll.trim().parse::<u64>().ok())
        .max();

    match highest {
        Some(n) => (n + 1).to_string(),
        None => "1".to_string(),
    }
}

/// Numeric rolls first in numeric order, then anything else, then by name
fn roster_order(a: &Student, b: &Student) -> Ordering {
    let key = |s: &Student| s.roll_number.as_deref().and_then(|r| r.trim().parse::<u64>().ok());
    match (key(a), key(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.name.cmp(&b.name))
}

#[derive(Clone)]
pub struct StudentService {
    students: Arc<dyn StudentStorage>,
    classes: Arc<dyn ClassStorage>,
    exams: Arc<dyn ExamStorage>,
    feed: ChangeFeed,
}

impl StudentService {
    pub fn new(
        students: Arc<dyn StudentStorage>,
        classes: Arc<dyn ClassStorage>,
        exams: Arc<dyn ExamStorage>,
        feed: ChangeFeed,
    ) -> Self {
        Self { students, classes, exams, feed }
    }

    async fn ensure_class(&self, owner_id: &str, class_id: &str) -> SchoolResult<()> {
        match self.classes.get_class(owner_id, class_id).await? {
            Some(_) => Ok(()),
            None => Err(SchoolError::validation(format!("Class does not exist: {}", class_id))),
        }
    }

    pub async fn suggest_roll_number(&self, owner_id: &str, class_id: &str) -> SchoolResult<RollNumberSuggestion> {
        if self.classes.get_class(owner_id, class_id).await?.is_none() {
            return Err(SchoolError::not_found("Class", class_id));
        }
        let roster = self.students.list_students(owner_id, Some(class_id)).await?;
        let roll_number = suggest_roll_number(roster.iter().map(|s| s.roll_number.as_deref()));
        Ok(RollNumberSuggestion { class_id: class_id.to_string(), roll_number })
    }

    pub async fn create_student(&self, owner_id: &str, request: CreateStudentRequest) -> SchoolResult<StudentResponse> {
        info!("Creating student: name={}, class_id={}", request.name, request.class_id);

        let name = required("Student name", &request.name)?;
        let class_id = required("Class", &request.class_id)?;
        let admission = parse_date("Admission date", &request.admission_date)?;
        let previous_dues = non_negative_amount("Previous dues", request.previous_dues)?;
        self.ensure_class(owner_id, &class_id).await?;

        let roll_number = match optional(request.roll_number) {
            Some(roll) => roll,
            None => self.suggest_roll_number(owner_id, &class_id).await?.roll_number,
        };

        let now = now_timestamp();
        let student = Student {
            id: Student::generate_id(),
            owner_id: owner_id.to_string(),
            class_id,
            name,
            father_name: optional(request.father_name),
            mother_name: optional(request.mother_name),
            phone: optional(request.phone),
            address: optional(request.address),
            roll_number: Some(roll_number),
            admission_date: admission.format("%Y-%m-%d").to_string(),
            photo_path: optional(request.photo_path),
            transport_driver_id: None,
            previous_dues,
            other_fees: Vec::new(),
            fees: FeeLedger::default(),
            created_at: now.clone(),
            updated_at: now,
        };

        self.students.store_student(&student).await?;
        self.feed.publish(owner_id, tables::STUDENTS, ChangeKind::Insert, &student.id);

        info!("Created student {} with ID: {}", student.name, student.id);
        Ok(StudentResponse {
            success_message: format!("Student '{}' added successfully", student.name),
            student,
        })
    }

    pub async fn get_student(&self, owner_id: &str, student_id: &str) -> SchoolResult<Student> {
        self.students
            .get_student(owner_id, student_id)
            .await?
            .ok_or_else(|| SchoolError::not_found("Student", student_id))
    }

    pub async fn list_students(&self, owner_id: &str, class_id: Option<&str>) -> SchoolResult<StudentListResponse> {
        let mut students = self.students.list_students(owner_id, class_id).await?;
        students.sort_by(roster_order);
        info!("Found {} students", students.len());
        Ok(StudentListResponse { students })
    }

    pub async fn update_student(
        &self,
        owner_id: &str,
        student_id: &str,
        request: UpdateStudentRequest,
    ) -> SchoolResult<StudentResponse> {
        info!("Updating student: {}", student_id);

        let mut student = self.get_student(owner_id, student_id).await?;

        if let Some(name) = request.name {
            student.name = required("Student name", &name)?;
        }
        if let Some(class_id) = request.class_id {
            let class_id = required("Class", &class_id)?;
            self.ensure_class(owner_id, &class_id).await?;
            student.class_id = class_id;
        }
        if let Some(date) = request.admission_date {
            student.admission_date = parse_date("Admission date", &date)?.format("%Y-%m-%d").to_string();
        }
        if let Some(dues) = request.previous_dues {
            student.previous_dues = non_negative_amount("Previous dues", dues)?;
        }
        if request.father_name.is_some() {
            student.father_name = optional(request.father_name);
        }
        if request.mother_name.is_some() {
            student.mother_name = optional(request.mother_name);
        }
        if request.phone.is_some() {
            student.phone = optional(request.phone);
        }
        if request.address.is_some() {
            student.address = optional(request.address);
        }
        if request.roll_number.is_some() {
            student.roll_number = optional(request.roll_number);
        }
        if request.photo_path.is_some() {
            student.photo_path = optional(request.photo_path);
        }
        student.updated_at = now_timestamp();

        if !self.students.update_student(&student).await? {
            return Err(SchoolError::not_found("Student", student_id));
        }
        self.feed.publish(owner_id, tables::STUDENTS, ChangeKind::Update, &student.id);

        Ok(StudentResponse {
            success_message: format!("Student '{}' updated successfully", student.name),
            student,
        })
    }

    /// Removes the student together with their exam results
    pub async fn delete_student(&self, owner_id: &str, student_id: &str) -> SchoolResult<String> {
        info!("Deleting student: {}", student_id);

        let student = self.get_student(owner_id, student_id).await?;
        let removed_results = self.exams.delete_results_for_student(owner_id, student_id).await?;
        if removed_results > 0 {
            warn!("Removed {} exam result(s) of student {}", removed_results, student_id);
        }

        self.students.delete_student(owner_id, student_id).await?;
        self.feed.publish(owner_id, tables::STUDENTS, ChangeKind::Delete, student_id);

        Ok(format!("Student '{}' deleted successfully", student.name))
    }
}
