//! # Dues Calculation
//!
//! Pure computation of what a student still owes, given the month-status
//! strings on their row, the class's monthly fee, their unpaid one-off fees
//! and the balance carried over from a prior session. Nothing here touches
//! storage.

use chrono::{Datelike, NaiveDate};
use shared::{DuesBreakdown, Month, MonthDue, MonthStatus, OtherFee, Student};

use super::ledger::parse_paid_amount;

/// Range of months that count towards dues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuesWindow {
    /// `None` when nothing can be due yet (admission lies in the future)
    start: Option<Month>,
    end: Month,
}

impl DuesWindow {
    /// January through `end`, inclusive
    pub fn through(end: Month) -> Self {
        Self { start: Some(Month::January), end }
    }

    /// January through the month of `as_of`
    pub fn as_of(as_of: NaiveDate) -> Self {
        Self::through(month_of(as_of))
    }

    /// Like [`DuesWindow::as_of`] but starting at the admission month when the
    /// student joined during the same calendar year
    pub fn since_admission(as_of: NaiveDate, admission: NaiveDate) -> Self {
        let end = month_of(as_of);
        let start = if admission > as_of {
            None
        } else if admission.year() == as_of.year() {
            Some(month_of(admission))
        } else {
            Some(Month::January)
        };
        Self { start, end }
    }

    pub fn contains(&self, month: Month) -> bool {
        match self.start {
            Some(start) => start <= month && month <= self.end,
            None => false,
        }
    }
}

fn month_of(date: NaiveDate) -> Month {
    Month::from_number(date.month()).unwrap_or(Month::January)
}

/// Round to cents so float noise never shows up in totals
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Paid amount, shortfall and status for one month's stored value
pub fn assess_month(raw: Option<&str>, monthly_fee: f64) -> (f64, f64, MonthStatus) {
    let fee = monthly_fee.max(0.0);
    let parsed = parse_paid_amount(raw);
    let paid = parsed.resolve(fee);
    let due = (fee - paid).max(0.0);

    let status = if parsed.is_full() || paid >= fee {
        MonthStatus::Paid
    } else if paid > 0.0 {
        MonthStatus::Partial
    } else {
        MonthStatus::Due
    };

    (paid, due, status)
}

/// Sum of one-off fees that have no paid date
pub fn unpaid_other_fees(other_fees: &[OtherFee]) -> f64 {
    other_fees
        .iter()
        .filter(|fee| !fee.is_paid())
        .map(|fee| fee.amount.max(0.0))
        .sum()
}

/// Full dues breakdown for a student against their class fee
pub fn compute_dues(student: &Student, monthly_fee: f64, window: DuesWindow) -> DuesBreakdown {
    let months: Vec<MonthDue> = student
        .fees
        .iter()
        .map(|(month, raw)| {
            let (paid, due, status) = assess_month(raw, monthly_fee);
            if window.contains(month) {
                MonthDue { month, status, paid, due }
            } else {
                MonthDue { month, status: MonthStatus::Upcoming, paid, due: 0.0 }
            }
        })
        .collect();

    let monthly_total: f64 = months.iter().map(|m| m.due).sum();
    let other_fees_total = unpaid_other_fees(&student.other_fees);
    let previous_dues = student.previous_dues.max(0.0);
    let total = monthly_total + other_fees_total + previous_dues;

    DuesBreakdown {
        monthly_fee,
        months,
        monthly_total: round_currency(monthly_total),
        other_fees_total: round_currency(other_fees_total),
        previous_dues: round_currency(previous_dues),
        total: round_currency(total),
    }
}

/// Months inside the window that still have something owing
pub fn due_months(breakdown: &DuesBreakdown) -> Vec<Month> {
    breakdown
        .months
        .iter()
        .filter(|m| m.due > 0.0)
        .map(|m| m.month)
        .collect()
}
