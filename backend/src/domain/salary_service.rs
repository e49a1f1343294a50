use chrono::{Datelike, NaiveDate, Utc};
use shared::{ChangeKind, Month, RecordSalaryRequest, SalaryRecord, Staff};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use super::change_feed::{tables, ChangeFeed};
use super::error::{SchoolError, SchoolResult};
use super::ledger::format_timestamp;
use super::validation::{optional, parse_timestamp, positive_amount, required};
use crate::storage::{SalaryStorage, StaffStorage};

#[derive(Clone)]
pub struct SalaryService {
    salaries: Arc<dyn SalaryStorage>,
    staff: Arc<dyn StaffStorage>,
    feed: ChangeFeed,
}

fn validate_year(year: i32) -> SchoolResult<i32> {
    if !(1900..=2200).contains(&year) {
        return Err(SchoolError::validation(format!("Year {} is out of range", year)));
    }
    Ok(year)
}

impl SalaryService {
    pub fn new(salaries: Arc<dyn SalaryStorage>, staff: Arc<dyn StaffStorage>, feed: ChangeFeed) -> Self {
        Self { salaries, staff, feed }
    }

    /// Pay one staff member for one month; a second payment for the same
    /// month is a conflict
    pub async fn record_salary(&self, owner_id: &str, request: RecordSalaryRequest) -> SchoolResult<SalaryRecord> {
        info!("Recording salary: staff={}, period={} {}", request.staff_id, request.month, request.year);

        let staff_id = required("Staff member", &request.staff_id)?;
        let year = validate_year(request.year)?;
        let staff = self
            .staff
            .get_staff(owner_id, &staff_id)
            .await?
            .ok_or_else(|| SchoolError::not_found("Staff member", &staff_id))?;

        let amount = positive_amount("Salary amount", request.amount.unwrap_or(staff.monthly_salary))?;
        let paid_date = match request.paid_date.as_deref() {
            Some(raw) if !raw.trim().is_empty() => format_timestamp(parse_timestamp("Paid date", raw)?),
            _ => format_timestamp(Utc::now()),
        };

        if self.salaries.find_salary(owner_id, &staff_id, request.month, year).await?.is_some() {
            warn!("Salary already recorded for {} in {} {}", staff_id, request.month, year);
            return Err(SchoolError::Conflict(format!(
                "Salary for {} is already recorded for {} {}",
                staff.name, request.month, year
            )));
        }

        let record = SalaryRecord {
            id: SalaryRecord::generate_id(),
            owner_id: owner_id.to_string(),
            staff_id,
            month: request.month,
            year,
            amount,
            paid_date,
            note: optional(request.note),
        };

        self.salaries.store_salary(&record).await?;
        self.feed.publish(owner_id, tables::SALARY_RECORDS, ChangeKind::Insert, &record.id);
        Ok(record)
    }

    pub async fn list_salaries(
        &self,
        owner_id: &str,
        staff_id: Option<&str>,
        period: Option<(Month, i32)>,
    ) -> SchoolResult<Vec<SalaryRecord>> {
        Ok(self.salaries.list_salaries(owner_id, staff_id, period).await?)
    }

    /// Staff employed during the period who have no salary record for it
    pub async fn unpaid_staff(&self, owner_id: &str, month: Month, year: i32) -> SchoolResult<Vec<Staff>> {
        let year = validate_year(year)?;
        let paid: HashSet<String> = self
            .salaries
            .list_salaries(owner_id, None, Some((month, year)))
            .await?
            .into_iter()
            .map(|r| r.staff_id)
            .collect();

        let period_start = NaiveDate::from_ymd_opt(year, month.number(), 1)
            .ok_or_else(|| SchoolError::validation("Invalid salary period"))?;
        let joined_by_period_end = |staff: &Staff| match NaiveDate::parse_from_str(&staff.join_date, "%Y-%m-%d") {
            Ok(joined) => (joined.year(), joined.month()) <= (period_start.year(), period_start.month()),
            Err(_) => true,
        };

        Ok(self
            .staff
            .list_staff(owner_id)
            .await?
            .into_iter()
            .filter(|s| !paid.contains(&s.id) && joined_by_period_end(s))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::staff_service::{tests::request as staff_request, StaffService};
    use crate::storage::Repositories;

    async fn setup() -> (SalaryService, StaffService) {
        let repos = Repositories::in_memory().await.unwrap();
        let feed = ChangeFeed::new();
        (
            SalaryService::new(repos.salaries.clone(), repos.staff.clone(), feed.clone()),
            StaffService::new(repos.staff.clone(), repos.salaries.clone(), feed),
        )
    }

    fn pay(staff_id: &str, month: Month, amount: Option<f64>) -> RecordSalaryRequest {
        RecordSalaryRequest {
            staff_id: staff_id.to_string(),
            month,
            year: 2024,
            amount,
            paid_date: Some("2024-02-01T10:00:00Z".to_string()),
            note: Some(" ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_record_salary_defaults_and_conflicts() {
        let (salaries, staff) = setup().await;
        let neha = staff.create_staff("o", staff_request("Neha", 18000.0, "2023-06-01")).await.unwrap();

        let record = salaries.record_salary("o", pay(&neha.id, Month::January, None)).await.unwrap();
        assert_eq!(record.amount, 18000.0);
        assert_eq!(record.paid_date, "2024-02-01T10:00:00.000Z");
        assert_eq!(record.note, None);

        assert!(matches!(
            salaries.record_salary("o", pay(&neha.id, Month::January, Some(5000.0))).await,
            Err(SchoolError::Conflict(_))
        ));
        assert!(matches!(
            salaries.record_salary("o", pay(&neha.id, Month::February, Some(0.0))).await,
            Err(SchoolError::Validation(_))
        ));
        assert!(matches!(
            salaries.record_salary("o", pay("staff::ghost", Month::February, None)).await,
            Err(SchoolError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unpaid_staff_for_period() {
        let (salaries, staff) = setup().await;
        let neha = staff.create_staff("o", staff_request("Neha", 18000.0, "2023-06-01")).await.unwrap();
        let omar = staff.create_staff("o", staff_request("Omar", 15000.0, "2024-01-15")).await.unwrap();
        staff.create_staff("o", staff_request("Later", 15000.0, "2024-05-01")).await.unwrap();

        salaries.record_salary("o", pay(&neha.id, Month::January, None)).await.unwrap();

        let unpaid = salaries.unpaid_staff("o", Month::January, 2024).await.unwrap();
        assert_eq!(unpaid.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(), vec![omar.id.as_str()]);

        let listed = salaries.list_salaries("o", Some(&neha.id), None).await.unwrap();
        assert_eq!(listed.len(), 1);
    }
}
