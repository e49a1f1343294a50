//! # Attendance
//!
//! A day's attendance for a class is stored as two comma-joined id lists.
//! [`PresenceSet`] is the in-memory form used while marking: toggle ids,
//! mark the whole roster, and derive the absent list from the roster.

use chrono::NaiveDate;
use shared::{AttendanceRecord, AttendanceSummary, ChangeKind, ClassAttendanceSummary, Student, SubmitAttendanceRequest};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use super::change_feed::{tables, ChangeFeed};
use super::dues::round_currency;
use super::error::{SchoolError, SchoolResult};
use super::validation::{now_timestamp, parse_date, required};
use crate::storage::{AttendanceStorage, ClassStorage, StudentStorage};

const ID_SEPARATOR: char = ',';

/// Set of present student ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceSet {
    ids: BTreeSet<String>,
}

impl PresenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-joined list, ignoring blanks and surrounding spaces
    pub fn from_joined(raw: &str) -> Self {
        Self {
            ids: raw
                .split(ID_SEPARATOR)
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Flip one id; returns whether it is present afterwards
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn mark_all<'a>(&mut self, roster: impl IntoIterator<Item = &'a str>) {
        self.ids.extend(roster.into_iter().map(str::to_string));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Comma-joined in sorted order
    pub fn to_joined(&self) -> String {
        self.ids.iter().map(String::as_str).collect::<Vec<_>>().join(",")
    }

    /// Roster members that are not present
    pub fn absent_from<'a>(&self, roster: impl IntoIterator<Item = &'a str>) -> PresenceSet {
        Self {
            ids: roster
                .into_iter()
                .filter(|id| !self.ids.contains(*id))
                .map(str::to_string)
                .collect(),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for PresenceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { ids: iter.into_iter().map(Into::into).collect() }
    }
}

/// Inclusive date range for summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> SchoolResult<Self> {
        if from > to {
            return Err(SchoolError::validation("Start date must not be after end date"));
        }
        Ok(Self { from, to })
    }

    fn bounds(&self) -> (String, String) {
        (self.from.format("%Y-%m-%d").to_string(), self.to.format("%Y-%m-%d").to_string())
    }
}

#[derive(Clone)]
pub struct AttendanceService {
    attendance: Arc<dyn AttendanceStorage>,
    students: Arc<dyn StudentStorage>,
    classes: Arc<dyn ClassStorage>,
    feed: ChangeFeed,
}

impl AttendanceService {
    pub fn new(
        attendance: Arc<dyn AttendanceStorage>,
        students: Arc<dyn StudentStorage>,
        classes: Arc<dyn ClassStorage>,
        feed: ChangeFeed,
    ) -> Self {
        Self { attendance, students, classes, feed }
    }

    async fn ensure_class(&self, owner_id: &str, class_id: &str) -> SchoolResult<()> {
        match self.classes.get_class(owner_id, class_id).await? {
            Some(_) => Ok(()),
            None => Err(SchoolError::not_found("Class", class_id)),
        }
    }

    /// Save a class's attendance for one day, replacing any earlier submission
    pub async fn submit_attendance(&self, owner_id: &str, request: SubmitAttendanceRequest) -> SchoolResult<AttendanceRecord> {
        info!(
            "Submitting attendance: class={}, date={}, present={}",
            request.class_id,
            request.date,
            request.present_ids.len()
        );

        let class_id = required("Class", &request.class_id)?;
        let date = parse_date("Date", &request.date)?.format("%Y-%m-%d").to_string();
        self.ensure_class(owner_id, &class_id).await?;

        let roster = self.students.list_students(owner_id, Some(&class_id)).await?;
        let roster_ids: PresenceSet = roster.iter().map(|s| s.id.as_str()).collect();
        let present: PresenceSet = request.present_ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()).collect();

        let unknown: Vec<&str> = present.iter().filter(|id| !roster_ids.contains(id)).collect();
        if !unknown.is_empty() {
            warn!("Attendance for class {} names unknown students: {:?}", class_id, unknown);
            return Err(SchoolError::validation(format!(
                "Students not in this class: {}",
                unknown.join(", ")
            )));
        }

        let absent = present.absent_from(roster_ids.iter());
        let now = now_timestamp();
        let record = AttendanceRecord {
            id: AttendanceRecord::generate_id(),
            owner_id: owner_id.to_string(),
            class_id,
            date,
            present_ids: present.to_joined(),
            absent_ids: absent.to_joined(),
            created_at: now.clone(),
            updated_at: now,
        };

        let saved = self.attendance.upsert_attendance(&record).await?;
        let kind = if saved.id == record.id { ChangeKind::Insert } else { ChangeKind::Update };
        self.feed.publish(owner_id, tables::ATTENDANCE, kind, &saved.id);

        info!("Saved attendance {}: {} present, {} absent", saved.id, present.len(), absent.len());
        Ok(saved)
    }

    pub async fn get_attendance(&self, owner_id: &str, class_id: &str, date: &str) -> SchoolResult<AttendanceRecord> {
        let date = parse_date("Date", date)?.format("%Y-%m-%d").to_string();
        self.attendance
            .get_attendance(owner_id, class_id, &date)
            .await?
            .ok_or_else(|| SchoolError::NotFound(format!("No attendance for class {} on {}", class_id, date)))
    }

    pub async fn student_summary(&self, owner_id: &str, student_id: &str, range: DateRange) -> SchoolResult<AttendanceSummary> {
        let student = self
            .students
            .get_student(owner_id, student_id)
            .await?
            .ok_or_else(|| SchoolError::not_found("Student", student_id))?;

        let (from, to) = range.bounds();
        let records = self.attendance.list_attendance(owner_id, None, Some(&from), Some(&to)).await?;
        let parsed = parse_records(&records);
        Ok(summarise(&student, &parsed))
    }

    pub async fn class_summary(&self, owner_id: &str, class_id: &str, range: DateRange) -> SchoolResult<ClassAttendanceSummary> {
        self.ensure_class(owner_id, class_id).await?;

        let (from, to) = range.bounds();
        let records = self
            .attendance
            .list_attendance(owner_id, Some(class_id), Some(&from), Some(&to))
            .await?;
        let parsed = parse_records(&records);

        let mut roster = self.students.list_students(owner_id, Some(class_id)).await?;
        roster.sort_by(|a, b| a.name.cmp(&b.name));
        let students = roster.iter().map(|s| summarise(s, &parsed)).collect();

        Ok(ClassAttendanceSummary { class_id: class_id.to_string(), from, to, students })
    }
}

fn parse_records(records: &[AttendanceRecord]) -> Vec<(PresenceSet, PresenceSet)> {
    records
        .iter()
        .map(|r| (PresenceSet::from_joined(&r.present_ids), PresenceSet::from_joined(&r.absent_ids)))
        .collect()
}

/// Only days on which the student was on the roster count
fn summarise(student: &Student, days: &[(PresenceSet, PresenceSet)]) -> AttendanceSummary {
    let mut present = 0u32;
    let mut absent = 0u32;
    for (p, a) in days {
        if p.contains(&student.id) {
            present += 1;
        } else if a.contains(&student.id) {
            absent += 1;
        }
    }

    let recorded = present + absent;
    let percentage = if recorded == 0 { 0.0 } else { round_currency(present as f64 * 100.0 / recorded as f64) };

    AttendanceSummary {
        student_id: student.id.clone(),
        student_name: student.name.clone(),
        days_recorded: recorded,
        days_present: present,
        days_absent: absent,
        percentage,
    }
}
