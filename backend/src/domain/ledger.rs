//! # Fee Ledger Encoding
//!
//! Every student row stores one text value per calendar month. The value is
//! one of:
//!
//! - empty / absent / `"undefined"` / `"Dues"`: nothing paid yet
//! - a bare timestamp like `2023-05-01T10:00:00.000Z`: paid in full under the
//!   old scheme, amount unknown
//! - `"<amount>=d=<timestamp>"` entries joined by `;`, one per payment
//!
//! Values are only ever appended to. Formatting and parsing here must stay
//! symmetric: an entry produced by [`PaymentEntry::format`] parses back to the
//! same amount, and appending never disturbs earlier entries.

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

pub const DUES_SENTINEL: &str = "Dues";
pub const UNDEFINED_SENTINEL: &str = "undefined";
pub const ENTRY_DELIMITER: &str = "=d=";
pub const ENTRY_SEPARATOR: char = ';';
/// Padding ignored around an unset value; the SQL append trims the same set
pub const BLANK_CHARS: [char; 4] = [' ', '\t', '\r', '\n'];

static LEGACY_PAID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]{3}Z$")
        .expect("Invalid legacy timestamp regex")
});

/// Total paid for a month
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaidAmount {
    Amount(f64),
    /// Legacy "paid in full"; the amount is whatever the fee was
    Full,
}

impl PaidAmount {
    /// Concrete amount paid against the given monthly fee
    pub fn resolve(self, monthly_fee: f64) -> f64 {
        match self {
            PaidAmount::Amount(amount) => amount,
            PaidAmount::Full => monthly_fee,
        }
    }

    pub fn is_full(self) -> bool {
        matches!(self, PaidAmount::Full)
    }
}

/// True when a stored value carries no payment information at all
pub fn is_unset(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(value) => {
            let value = value.trim_matches(&BLANK_CHARS[..]);
            value.is_empty() || value == UNDEFINED_SENTINEL || value == DUES_SENTINEL
        }
    }
}

/// True for the legacy bare-timestamp "paid in full" form (exact match only)
pub fn is_legacy_paid(raw: &str) -> bool {
    LEGACY_PAID_PATTERN.is_match(raw)
}

/// Sum the payments recorded in a month-status string.
pub fn parse_paid_amount(raw: Option<&str>) -> PaidAmount {
    let raw = match raw {
        Some(value) if !value.is_empty() && value != UNDEFINED_SENTINEL && value != DUES_SENTINEL => value,
        _ => return PaidAmount::Amount(0.0),
    };

    if is_legacy_paid(raw) {
        return PaidAmount::Full;
    }

    let total = raw.split(ENTRY_SEPARATOR).map(token_amount).sum();
    PaidAmount::Amount(total)
}

/// Amount contributed by one `;`-separated token; malformed tokens count as zero
fn token_amount(token: &str) -> f64 {
    let parts: Vec<&str> = token.split(ENTRY_DELIMITER).collect();
    if parts.len() != 2 {
        return 0.0;
    }
    parse_amount(parts[0])
}

/// NaN, infinities, negatives and garbage all count as zero
fn parse_amount(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => amount,
        _ => 0.0,
    }
}

/// Render a timestamp the way entries store it: `YYYY-MM-DDTHH:MM:SS.sssZ`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// One recorded payment
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentEntry {
    pub amount: f64,
    pub paid_at: DateTime<Utc>,
}

impl PaymentEntry {
    pub fn new(amount: f64, paid_at: DateTime<Utc>) -> Self {
        Self { amount, paid_at }
    }

    pub fn format(&self) -> String {
        format!("{}{}{}", self.amount, ENTRY_DELIMITER, format_timestamp(self.paid_at))
    }

    /// Parse a single token; `None` unless it is a well-formed positive entry
    pub fn parse(token: &str) -> Option<Self> {
        let parts: Vec<&str> = token.split(ENTRY_DELIMITER).collect();
        if parts.len() != 2 {
            return None;
        }

        let amount = parse_amount(parts[0]);
        if amount <= 0.0 {
            return None;
        }

        let paid_at = DateTime::parse_from_rfc3339(parts[1].trim())
            .ok()?
            .with_timezone(&Utc);
        Some(Self { amount, paid_at })
    }
}

/// Append an entry to a stored value, keeping every earlier token as-is
pub fn append_entry(existing: Option<&str>, entry: &PaymentEntry) -> String {
    match existing {
        Some(value) if !is_unset(Some(value)) => {
            format!("{}{}{}", value, ENTRY_SEPARATOR, entry.format())
        }
        _ => entry.format(),
    }
}

/// Well-formed entries of a stored value, in the order they were appended
pub fn parse_entries(raw: Option<&str>) -> Vec<PaymentEntry> {
    match raw {
        Some(value) if !is_unset(Some(value)) && !is_legacy_paid(value) => value
            .split(ENTRY_SEPARATOR)
            .filter_map(PaymentEntry::parse)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn amount(raw: &str) -> f64 {
        match parse_paid_amount(Some(raw)) {
            PaidAmount::Amount(a) => a,
            PaidAmount::Full => panic!("unexpected full payment for {raw}"),
        }
    }

    #[test]
    fn test_unset_values_parse_to_zero() {
        assert_eq!(parse_paid_amount(None), PaidAmount::Amount(0.0));
        assert_eq!(parse_paid_amount(Some("")), PaidAmount::Amount(0.0));
        assert_eq!(parse_paid_amount(Some("undefined")), PaidAmount::Amount(0.0));
        assert_eq!(parse_paid_amount(Some("Dues")), PaidAmount::Amount(0.0));
    }

    #[test]
    fn test_legacy_timestamp_is_full_payment() {
        assert_eq!(parse_paid_amount(Some("2023-05-01T10:00:00.000Z")), PaidAmount::Full);
        assert!(PaidAmount::Full.is_full());
        assert_eq!(PaidAmount::Full.resolve(1200.0), 1200.0);
    }

    #[test]
    fn test_near_iso_strings_fall_through_to_zero() {
        assert_eq!(amount("2023-05-01T10:00:00Z"), 0.0);
        assert_eq!(amount("2023-05-01 10:00:00.000Z"), 0.0);
        assert_eq!(amount("2023-05-01T10:00:00.000Z "), 0.0);
        assert_eq!(amount("x2023-05-01T10:00:00.000Z"), 0.0);
    }

    #[test]
    fn test_single_and_multiple_entries() {
        assert_eq!(amount("500=d=2023-01-01T00:00:00.000Z"), 500.0);
        assert_eq!(
            amount("500=d=2023-01-01T00:00:00.000Z;300=d=2023-02-01T00:00:00.000Z"),
            800.0
        );
    }

    #[test]
    fn test_malformed_tokens_contribute_nothing() {
        assert_eq!(amount("abc=d=2023-01-01T00:00:00.000Z"), 0.0);
        assert_eq!(amount("500=d=2023-01-01T00:00:00.000Z=d=extra"), 0.0);
        assert_eq!(amount("-200=d=2023-01-01T00:00:00.000Z"), 0.0);
        assert_eq!(amount("NaN=d=2023-01-01T00:00:00.000Z"), 0.0);
        assert_eq!(amount("500"), 0.0);
        assert_eq!(
            amount("garbage;250.5=d=2023-01-01T00:00:00.000Z;;100=d=x"),
            350.5
        );
    }

    #[test]
    fn test_entry_format_matches_stored_layout() {
        let entry = PaymentEntry::new(500.0, at(2023, 1, 1));
        assert_eq!(entry.format(), "500=d=2023-01-01T00:00:00.000Z");

        let fractional = PaymentEntry::new(250.75, at(2024, 2, 29));
        assert_eq!(fractional.format(), "250.75=d=2024-02-29T00:00:00.000Z");
        assert_eq!(PaymentEntry::parse(&fractional.format()), Some(fractional));
    }

    #[test]
    fn test_append_replaces_placeholders() {
        let entry = PaymentEntry::new(100.0, at(2024, 3, 1));
        assert_eq!(append_entry(None, &entry), entry.format());
        assert_eq!(append_entry(Some(""), &entry), entry.format());
        assert_eq!(append_entry(Some("Dues"), &entry), entry.format());
        assert_eq!(append_entry(Some("undefined"), &entry), entry.format());
    }

    #[test]
    fn test_append_preserves_prior_tokens_and_sum() {
        let amounts = [300.0, 150.5, 49.5, 500.0];
        let mut stored: Option<String> = None;

        for (i, a) in amounts.iter().enumerate() {
            let entry = PaymentEntry::new(*a, at(2024, 1, i as u32 + 1));
            let before = stored.clone();
            let after = append_entry(stored.as_deref(), &entry);
            if let Some(prefix) = before {
                assert!(after.starts_with(&format!("{};", prefix)));
            }
            stored = Some(after);
        }

        let stored = stored.unwrap();
        assert_eq!(stored.split(';').count(), amounts.len());
        assert_eq!(amount(&stored), amounts.iter().sum::<f64>());
        assert_eq!(parse_entries(Some(&stored)).len(), amounts.len());
    }

    #[test]
    fn test_parse_entries_skips_junk_and_legacy() {
        let raw = "100=d=2024-01-05T10:00:00.000Z;oops;50=d=not-a-date";
        let entries = parse_entries(Some(raw));
        assert_eq!(entries, vec![PaymentEntry::new(100.0, Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap())]);

        assert!(parse_entries(Some("2023-05-01T10:00:00.000Z")).is_empty());
        assert!(parse_entries(Some("Dues")).is_empty());
    }

    #[test]
    fn test_is_unset() {
        assert!(is_unset(None));
        assert!(is_unset(Some("  ")));
        assert!(is_unset(Some("Dues")));
        assert!(!is_unset(Some("2023-05-01T10:00:00.000Z")));
        assert!(!is_unset(Some("1=d=2023-05-01T10:00:00.000Z")));
        assert!(is_unset(Some("\t\r\n")));
        assert!(is_unset(Some(" Dues\n")));
    }

    #[test]
    fn test_append_replaces_blank_padding() {
        let entry = PaymentEntry::parse("250=d=2024-02-03T00:00:00.000Z").unwrap();
        assert_eq!(append_entry(Some("\t"), &entry), entry.format());
        assert_eq!(append_entry(Some(" undefined\r\n"), &entry), entry.format());
    }
}
