//! Guard-clause helpers shared by the services.

use chrono::{DateTime, NaiveDate, Utc};

use super::error::{SchoolError, SchoolResult};
use super::ledger::format_timestamp;

/// Trimmed value of a required text field
pub fn required(field: &str, value: &str) -> SchoolResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SchoolError::validation(format!("{} cannot be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Optional text with blanks collapsed to `None`
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_date(field: &str, value: &str) -> SchoolResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| SchoolError::validation(format!("{} must be a YYYY-MM-DD date", field)))
}

pub fn parse_timestamp(field: &str, value: &str) -> SchoolResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| SchoolError::validation(format!("{} must be an RFC 3339 timestamp", field)))
}

pub fn positive_amount(field: &str, amount: f64) -> SchoolResult<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(SchoolError::validation(format!("{} must be greater than zero", field)));
    }
    Ok(amount)
}

pub fn non_negative_amount(field: &str, amount: f64) -> SchoolResult<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(SchoolError::validation(format!("{} cannot be negative", field)));
    }
    Ok(amount)
}

/// Current time in the stored timestamp layout
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(required("Name", "  Asha ").unwrap(), "Asha");
        assert!(matches!(required("Name", "   "), Err(SchoolError::Validation(_))));
    }

    #[test]
    fn test_amount_guards() {
        assert!(positive_amount("Amount", 0.0).is_err());
        assert!(positive_amount("Amount", f64::NAN).is_err());
        assert_eq!(positive_amount("Amount", 12.5).unwrap(), 12.5);
        assert!(non_negative_amount("Fee", -1.0).is_err());
        assert_eq!(non_negative_amount("Fee", 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_dates() {
        assert!(parse_date("Date", "2024-02-29").is_ok());
        assert!(parse_date("Date", "2023-02-29").is_err());
        assert!(parse_date("Date", "29/02/2024").is_err());
        assert!(parse_timestamp("Paid at", "2024-01-01T10:00:00.000Z").is_ok());
        assert!(parse_timestamp("Paid at", "yesterday").is_err());
        assert_eq!(optional(Some("  ".into())), None);
    }
}
