use anyhow::Result;
use async_trait::async_trait;
use shared::Expense;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::storage::connection::DbConnection;
use crate::storage::traits::ExpenseStorage;

#[derive(Clone)]
pub struct ExpenseRepository {
    db: DbConnection,
}

impl ExpenseRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_expense(r: &SqliteRow) -> Result<Expense> {
        Ok(Expense {
            id: r.try_get("id")?,
            owner_id: r.try_get("owner_id")?,
            title: r.try_get("title")?,
            category: r.try_get("category")?,
            amount: r.try_get("amount")?,
            date: r.try_get("date")?,
            note: r.try_get("note")?,
            created_at: r.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl ExpenseStorage for ExpenseRepository {
    async fn store_expense(&self, expense: &Expense) -> Result<()> {
        sqlx::query(
            "INSERT INTO expenses (id, owner_id, title, category, amount, date, note, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&expense.id)
        .bind(&expense.owner_id)
        .bind(&expense.title)
        .bind(&expense.category)
        .bind(expense.amount)
        .bind(&expense.date)
        .bind(&expense.note)
        .bind(&expense.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn list_expenses(&self, owner_id: &str) -> Result<Vec<Expense>> {
        let rows = sqlx::query("SELECT * FROM expenses WHERE owner_id = ? ORDER BY date DESC, created_at DESC")
            .bind(owner_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::row_to_expense).collect()
    }

    async fn delete_expense(&self, owner_id: &str, expense_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE owner_id = ? AND id = ?")
            .bind(owner_id)
            .bind(expense_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(id: &str, date: &str) -> Expense {
        Expense {
            id: id.to_string(),
            owner_id: "o".to_string(),
            title: "Chalk".to_string(),
            category: "Supplies".to_string(),
            amount: 120.0,
            date: date.to_string(),
            note: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_expenses_list_newest_first() {
        let repo = ExpenseRepository::new(DbConnection::init_in_memory().await.unwrap());
        repo.store_expense(&expense("e1", "2024-01-10")).await.unwrap();
        repo.store_expense(&expense("e2", "2024-02-03")).await.unwrap();

        let ids: Vec<String> = repo.list_expenses("o").await.unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["e2", "e1"]);

        assert!(repo.delete_expense("o", "e2").await.unwrap());
        assert!(!repo.delete_expense("o", "e2").await.unwrap());
    }
}
