use shared::{ChangeKind, ExamResult, ExamSummary, RankingEntry, RecordExamResultRequest, SubjectMark};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use super::change_feed::{tables, ChangeFeed};
use super::dues::round_currency;
use super::error::{SchoolError, SchoolResult};
use super::validation::{now_timestamp, required};
use crate::storage::{ExamStorage, StudentStorage};

/// Minimum percentage that counts as a pass
pub const PASS_PERCENTAGE: f64 = 33.0;

/// Letter grade for a percentage
pub fn grade_for(percentage: f64) -> &'static str {
    match percentage {
        p if p >= 90.0 => "A+",
        p if p >= 75.0 => "A",
        p if p >= 60.0 => "B",
        p if p >= 45.0 => "C",
        p if p >= PASS_PERCENTAGE => "D",
        _ => "F",
    }
}

pub fn summarise(result: &ExamResult) -> ExamSummary {
    let total_obtained: f64 = result.subjects.iter().map(|s| s.obtained_marks).sum();
    let total_max: f64 = result.subjects.iter().map(|s| s.max_marks).sum();
    let percentage = if total_max > 0.0 { round_currency(total_obtained * 100.0 / total_max) } else { 0.0 };

    ExamSummary {
        result_id: result.id.clone(),
        student_id: result.student_id.clone(),
        exam_name: result.exam_name.clone(),
        total_obtained,
        total_max,
        percentage,
        grade: grade_for(percentage).to_string(),
        passed: percentage >= PASS_PERCENTAGE,
    }
}

fn validate_subjects(subjects: Vec<SubjectMark>) -> SchoolResult<Vec<SubjectMark>> {
    if subjects.is_empty() {
        return Err(SchoolError::validation("At least one subject is required"));
    }
    subjects
        .into_iter()
        .map(|mark| {
            let subject = required("Subject", &mark.subject)?;
            if !mark.max_marks.is_finite() || mark.max_marks <= 0.0 {
                return Err(SchoolError::validation(format!("Maximum marks for {} must be positive", subject)));
            }
            if !mark.obtained_marks.is_finite() || mark.obtained_marks < 0.0 || mark.obtained_marks > mark.max_marks {
                return Err(SchoolError::validation(format!(
                    "Marks for {} must be between 0 and {}",
                    subject, mark.max_marks
                )));
            }
            Ok(SubjectMark { subject, ..mark })
        })
        .collect()
}

#[derive(Clone)]
pub struct ExamService {
    exams: Arc<dyn ExamStorage>,
    students: Arc<dyn StudentStorage>,
    feed: ChangeFeed,
}

impl ExamService {
    pub fn new(exams: Arc<dyn ExamStorage>, students: Arc<dyn StudentStorage>, feed: ChangeFeed) -> Self {
        Self { exams, students, feed }
    }

    pub async fn record_result(&self, owner_id: &str, request: RecordExamResultRequest) -> SchoolResult<ExamResult> {
        info!("Recording exam result: student={}, exam={}", request.student_id, request.exam_name);

        let exam_name = required("Exam name", &request.exam_name)?;
        let subjects = validate_subjects(request.subjects)?;
        let student = self
            .students
            .get_student(owner_id, &request.student_id)
            .await?
            .ok_or_else(|| SchoolError::not_found("Student", &request.student_id))?;

        let result = ExamResult {
            id: ExamResult::generate_id(),
            owner_id: owner_id.to_string(),
            student_id: student.id,
            exam_name,
            subjects,
            created_at: now_timestamp(),
        };

        self.exams.store_result(&result).await?;
        self.feed.publish(owner_id, tables::EXAM_RESULTS, ChangeKind::Insert, &result.id);
        Ok(result)
    }

    pub async fn list_results(
        &self,
        owner_id: &str,
        student_id: Option<&str>,
        exam_name: Option<&str>,
    ) -> SchoolResult<Vec<ExamResult>> {
        Ok(self.exams.list_results(owner_id, student_id, exam_name).await?)
    }

    pub async fn result_summary(&self, owner_id: &str, result_id: &str) -> SchoolResult<ExamSummary> {
        let result = self
            .exams
            .get_result(owner_id, result_id)
            .await?
            .ok_or_else(|| SchoolError::not_found("Exam result", result_id))?;
        Ok(summarise(&result))
    }

    /// Class standings for one exam: highest percentage first, equal
    /// percentages share a rank and the next rank skips ahead
    pub async fn class_ranking(&self, owner_id: &str, class_id: &str, exam_name: &str) -> SchoolResult<Vec<RankingEntry>> {
        info!("Ranking class {} for exam {}", class_id, exam_name);

        let exam_name = required("Exam name", exam_name)?;
        let roster = self.students.list_students(owner_id, Some(class_id)).await?;
        let results = self.exams.list_results(owner_id, None, Some(&exam_name)).await?;

        // Results are in creation order, so the latest one per student wins
        let mut latest: HashMap<&str, &ExamResult> = HashMap::new();
        for result in &results {
            latest.insert(result.student_id.as_str(), result);
        }

        let mut scored: Vec<(f64, String, String, String)> = roster
            .iter()
            .filter_map(|student| {
                let summary = summarise(latest.get(student.id.as_str())?);
                Some((summary.percentage, student.name.clone(), student.id.clone(), summary.grade))
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal).then_with(|| a.1.cmp(&b.1)));

        let mut ranking = Vec::with_capacity(scored.len());
        let mut previous: Option<(f64, u32)> = None;
        for (position, (percentage, student_name, student_id, grade)) in scored.into_iter().enumerate() {
            let rank = match previous {
                Some((p, rank)) if p == percentage => rank,
                _ => position as u32 + 1,
            };
            previous = Some((percentage, rank));
            ranking.push(RankingEntry { rank, student_id, student_name, percentage, grade });
        }
        Ok(ranking)
    }
}
