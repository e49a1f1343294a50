use chrono::Datelike;
use shared::{ChangeKind, CreateExpenseRequest, Expense, Month};
use std::sync::Arc;
use tracing::info;

use super::change_feed::{tables, ChangeFeed};
use super::error::{SchoolError, SchoolResult};
use super::validation::{now_timestamp, optional, parse_date, positive_amount, required};
use crate::storage::ExpenseStorage;

#[derive(Clone)]
pub struct ExpenseService {
    expenses: Arc<dyn ExpenseStorage>,
    feed: ChangeFeed,
}

impl ExpenseService {
    pub fn new(expenses: Arc<dyn ExpenseStorage>, feed: ChangeFeed) -> Self {
        Self { expenses, feed }
    }

    pub async fn create_expense(&self, owner_id: &str, request: CreateExpenseRequest) -> SchoolResult<Expense> {
        info!("Creating expense: title={}, amount={}", request.title, request.amount);

        let expense = Expense {
            id: Expense::generate_id(),
            owner_id: owner_id.to_string(),
            title: required("Title", &request.title)?,
            category: required("Category", &request.category)?,
            amount: positive_amount("Amount", request.amount)?,
            date: parse_date("Date", &request.date)?.format("%Y-%m-%d").to_string(),
            note: optional(request.note),
            created_at: now_timestamp(),
        };

        self.expenses.store_expense(&expense).await?;
        self.feed.publish(owner_id, tables::EXPENSES, ChangeKind::Insert, &expense.id);
        Ok(expense)
    }

    /// Newest first, optionally limited to one calendar month
    pub async fn list_expenses(&self, owner_id: &str, period: Option<(Month, i32)>) -> SchoolResult<Vec<Expense>> {
        let expenses = self.expenses.list_expenses(owner_id).await?;
        Ok(match period {
            Some((month, year)) => expenses.into_iter().filter(|e| in_period(&e.date, month, year)).collect(),
            None => expenses,
        })
    }

    pub async fn delete_expense(&self, owner_id: &str, expense_id: &str) -> SchoolResult<()> {
        info!("Deleting expense: {}", expense_id);
        if !self.expenses.delete_expense(owner_id, expense_id).await? {
            return Err(SchoolError::not_found("Expense", expense_id));
        }
        self.feed.publish(owner_id, tables::EXPENSES, ChangeKind::Delete, expense_id);
        Ok(())
    }
}

/// Whether a `YYYY-MM-DD` date (or timestamp) falls in the given month
pub(crate) fn in_period(date: &str, month: Month, year: i32) -> bool {
    let day = date.get(..10).unwrap_or(date);
    match chrono::NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(d) => d.year() == year && d.month() == month.number(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Repositories;

    fn request(title: &str, amount: f64, date: &str) -> CreateExpenseRequest {
        CreateExpenseRequest {
            title: title.to_string(),
            category: "Maintenance".to_string(),
            amount,
            date: date.to_string(),
            note: None,
        }
    }

    #[test]
    fn test_in_period() {
        assert!(in_period("2024-03-31", Month::March, 2024));
        assert!(in_period("2024-03-01T10:00:00.000Z", Month::March, 2024));
        assert!(!in_period("2023-03-10", Month::March, 2024));
        assert!(!in_period("garbage", Month::March, 2024));
    }

    #[tokio::test]
    async fn test_expense_lifecycle() {
        let repos = Repositories::in_memory().await.unwrap();
        let service = ExpenseService::new(repos.expenses.clone(), ChangeFeed::new());

        assert!(matches!(
            service.create_expense("o", request("Paint", 0.0, "2024-03-02")).await,
            Err(SchoolError::Validation(_))
        ));

        let paint = service.create_expense("o", request("Paint", 2500.0, "2024-03-02")).await.unwrap();
        service.create_expense("o", request("Repairs", 900.0, "2024-04-11")).await.unwrap();

        assert_eq!(service.list_expenses("o", None).await.unwrap().len(), 2);
        let march = service.list_expenses("o", Some((Month::March, 2024))).await.unwrap();
        assert_eq!(march, vec![paint.clone()]);

        service.delete_expense("o", &paint.id).await.unwrap();
        assert!(matches!(service.delete_expense("o", &paint.id).await, Err(SchoolError::NotFound(_))));
    }
}
