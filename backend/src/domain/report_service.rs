use chrono::{DateTime, Datelike};
use shared::{Month, MonthlyReport};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use super::dues::round_currency;
use super::error::SchoolResult;
use super::expense_service::in_period;
use super::ledger::{is_legacy_paid, parse_entries};
use crate::storage::{ClassStorage, ExpenseStorage, SalaryStorage, StudentStorage};

/// Month-level income and spending overview
#[derive(Clone)]
pub struct ReportService {
    students: Arc<dyn StudentStorage>,
    classes: Arc<dyn ClassStorage>,
    expenses: Arc<dyn ExpenseStorage>,
    salaries: Arc<dyn SalaryStorage>,
}

impl ReportService {
    pub fn new(
        students: Arc<dyn StudentStorage>,
        classes: Arc<dyn ClassStorage>,
        expenses: Arc<dyn ExpenseStorage>,
        salaries: Arc<dyn SalaryStorage>,
    ) -> Self {
        Self { students, classes, expenses, salaries }
    }

    /// Fee income counts every ledger payment dated inside the month, whichever
    /// month column it was recorded against. Legacy fully-paid months count
    /// the class fee on their timestamp's month.
    pub async fn monthly_report(&self, owner_id: &str, month: Month, year: i32) -> SchoolResult<MonthlyReport> {
        info!("Building monthly report for {} {}", month, year);

        let fees: HashMap<String, f64> = self
            .classes
            .list_classes(owner_id)
            .await?
            .into_iter()
            .map(|c| (c.id, c.monthly_fee))
            .collect();

        let mut fee_income = 0.0;
        let mut other_fee_income = 0.0;
        for student in self.students.list_students(owner_id, None).await? {
            for (_, raw) in student.fees.iter() {
                match raw {
                    Some(value) if is_legacy_paid(value) => {
                        if in_period(value, month, year) {
                            fee_income += fees.get(&student.class_id).copied().unwrap_or(0.0);
                        }
                    }
                    _ => {
                        fee_income += parse_entries(raw)
                            .iter()
                            .filter(|e| e.paid_at.year() == year && e.paid_at.month() == month.number())
                            .map(|e| e.amount)
                            .sum::<f64>();
                    }
                }
            }
            other_fee_income += student
                .other_fees
                .iter()
                .filter(|f| f.paid_date.as_deref().map_or(false, |d| paid_in(d, month, year)))
                .map(|f| f.amount)
                .sum::<f64>();
        }

        let expenses: f64 = self
            .expenses
            .list_expenses(owner_id)
            .await?
            .iter()
            .filter(|e| in_period(&e.date, month, year))
            .map(|e| e.amount)
            .sum();

        let salaries: f64 = self
            .salaries
            .list_salaries(owner_id, None, Some((month, year)))
            .await?
            .iter()
            .map(|s| s.amount)
            .sum();

        let net = fee_income + other_fee_income - expenses - salaries;
        Ok(MonthlyReport {
            month,
            year,
            fee_income: round_currency(fee_income),
            other_fee_income: round_currency(other_fee_income),
            expenses: round_currency(expenses),
            salaries: round_currency(salaries),
            net: round_currency(net),
        })
    }
}

/// RFC 3339 timestamps are compared in UTC; anything else by its date prefix
fn paid_in(raw: &str, month: Month, year: i32) -> bool {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(at) => {
            let at = at.naive_utc();
            at.year() == year && at.month() == month.number()
        }
        Err(_) => in_period(raw.trim(), month, year),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::student_service::tests::{sample_student, store_class};
    use crate::storage::Repositories;
    use shared::{Expense, OtherFee, SalaryRecord};

    #[tokio::test]
    async fn test_monthly_report_totals() {
        let repos = Repositories::in_memory().await.unwrap();
        let class = store_class(&repos, "o", 1000.0).await;

        let mut student = sample_student("o", &class.id, "Ana");
        // February fee paid late, in March
        student.fees.february = Some("1000=d=2024-03-03T00:00:00.000Z".to_string());
        student.fees.march = Some("400=d=2024-03-10T00:00:00.000Z;600=d=2024-04-01T00:00:00.000Z".to_string());
        student.fees.january = Some("2024-03-15T12:00:00.000Z".to_string());
        student.other_fees = vec![
            OtherFee { fees_name: "Exam".into(), amount: 150.0, paid_date: Some("2024-03-20T00:00:00.000Z".into()) },
            OtherFee { fees_name: "Trip".into(), amount: 300.0, paid_date: None },
        ];
        repos.students.store_student(&student).await.unwrap();

        repos
            .expenses
            .store_expense(&Expense {
                id: "e1".into(),
                owner_id: "o".into(),
                title: "Chalk".into(),
                category: "Supplies".into(),
                amount: 250.0,
                date: "2024-03-05".into(),
                note: None,
                created_at: "t".into(),
            })
            .await
            .unwrap();
        repos
            .salaries
            .store_salary(&SalaryRecord {
                id: "p1".into(),
                owner_id: "o".into(),
                staff_id: "t1".into(),
                month: Month::March,
                year: 2024,
                amount: 1200.0,
                paid_date: "2024-03-31T00:00:00.000Z".into(),
                note: None,
            })
            .await
            .unwrap();

        let service = ReportService::new(
            repos.students.clone(),
            repos.classes.clone(),
            repos.expenses.clone(),
            repos.salaries.clone(),
        );
        let report = service.monthly_report("o", Month::March, 2024).await.unwrap();

        assert_eq!(report.fee_income, 2400.0);
        assert_eq!(report.other_fee_income, 150.0);
        assert_eq!(report.expenses, 250.0);
        assert_eq!(report.salaries, 1200.0);
        assert_eq!(report.net, 1100.0);
    }
}
