//! Field checks shared by the request DTOs in `handlers`.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use uuid::Uuid;

use crate::database::models::{DateRange, UnknownVariant};

pub const MAX_NAME_LEN: usize = 255;

/// Largest value a `numeric(10,2)` money column holds.
pub const MAX_MONEY: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 2);

/// Accumulates per-field messages; a request is rejected once, with every problem listed.
#[derive(Debug, Default, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Validation failed")]
pub struct ValidationError {
    fields: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first message reported for a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// `Ok(value)` when nothing was reported.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    pub fn into_field_errors(self) -> HashMap<String, String> {
        self.fields.into_iter().collect()
    }

    pub fn required(&mut self, field: &str) {
        self.add(field, format!("{} is required", field));
    }

    pub fn name(&mut self, field: &str, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, format!("{} must not be empty", field));
        } else if trimmed.chars().count() > MAX_NAME_LEN {
            self.add(field, format!("{} must be at most {} characters", field, MAX_NAME_LEN));
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if !is_valid_email(value) {
            self.add(field, "Invalid email address");
        }
    }

    /// Parses a lowercase wire value, reporting the field on failure.
    pub fn parse_enum<T>(&mut self, field: &str, value: &str) -> Option<T>
    where
        T: FromStr<Err = UnknownVariant>,
    {
        match value.parse() {
            Ok(v) => Some(v),
            Err(e) => {
                self.add(field, e.to_string());
                None
            }
        }
    }

    /// Money fields: non-negative, at most two decimal places, within `MAX_MONEY`.
    pub fn money(&mut self, field: &str, value: Option<Decimal>) {
        let Some(v) = value else { return };
        if v.is_sign_negative() && !v.is_zero() {
            self.add(field, format!("{} must not be negative", field));
        } else if v.normalize().scale() > 2 {
            self.add(field, format!("{} must have at most 2 decimal places", field));
        } else if v > MAX_MONEY {
            self.add(field, format!("{} must be at most {}", field, MAX_MONEY));
        }
    }

    pub fn non_negative_count(&mut self, field: &str, value: i64) {
        if value < 0 {
            self.add(field, format!("{} must not be negative", field));
        } else if value > i32::MAX as i64 {
            self.add(field, format!("{} is too large", field));
        }
    }

    pub fn uuid(&mut self, field: &str, value: &str) -> Option<Uuid> {
        match Uuid::parse_str(value.trim()) {
            Ok(id) => Some(id),
            Err(_) => {
                self.add(field, format!("{} must be a valid id", field));
                None
            }
        }
    }

    pub fn date_order(&mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                self.add("endDate", "endDate must not be before startDate");
            }
        }
    }
}

/// One `@`, non-empty local part, dotted domain without empty labels.
pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates. A plain end date
/// covers the whole day.
pub fn parse_date_param(value: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?
    } else {
        NaiveTime::MIN
    };
    Some(date.and_time(time).and_utc())
}

/// Builds a range from optional `startDate` / `endDate` query values.
pub fn parse_date_range(start: Option<&str>, end: Option<&str>) -> Result<DateRange, ValidationError> {
    let mut errors = ValidationError::new();
    let mut parse = |field: &str, raw: Option<&str>, end_of_day: bool| {
        let raw = raw.filter(|s| !s.trim().is_empty())?;
        let parsed = parse_date_param(raw, end_of_day);
        if parsed.is_none() {
            errors.add(field, format!("{} must be a date (YYYY-MM-DD) or RFC 3339 timestamp", field));
        }
        parsed
    };
    let range = DateRange {
        start: parse("startDate", start, false),
        end: parse("endDate", end, true),
    };
    errors.date_order(range.start, range.end);
    errors.finish(range)
}

/// Trims and returns `None` for blank strings.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Platform;
    use chrono::{Duration, TimeZone};

    #[test]
    fn email_rules() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email("ada@example..com"));
        assert!(!is_valid_email("ada lovelace@example.com"));
    }

    #[test]
    fn names_are_bounded() {
        let mut v = ValidationError::new();
        v.name("name", "   ");
        v.name("accountName", &"x".repeat(256));
        v.name("campaignType", "search");
        assert!(v.get("name").is_some());
        assert!(v.get("accountName").is_some());
        assert!(v.get("campaignType").is_none());
    }

    #[test]
    fn enum_parse_reports_field() {
        let mut v = ValidationError::new();
        assert_eq!(v.parse_enum::<Platform>("platform", "google"), Some(Platform::Google));
        assert_eq!(v.parse_enum::<Platform>("platform", "myspace"), None);
        assert_eq!(v.get("platform"), Some("invalid platform value: 'myspace'"));
    }

    #[test]
    fn money_and_dates() {
        let mut v = ValidationError::new();
        v.money("dailyBudget", Some(Decimal::new(-1, 2)));
        v.money("totalBudget", Some(Decimal::ZERO));
        let now = Utc::now();
        v.date_order(Some(now), Some(now - Duration::days(1)));
        assert!(v.get("dailyBudget").is_some());
        assert!(v.get("totalBudget").is_none());
        assert!(v.get("endDate").is_some());
        assert!(v.finish(()).is_err());
    }

    #[test]
    fn money_fits_the_column() {
        let mut v = ValidationError::new();
        v.money("spend", Some(MAX_MONEY));
        v.money("revenue", Some(Decimal::new(1250, 3)));
        assert!(v.is_empty());

        v.money("dailyBudget", Some(Decimal::new(123_456_789_012_345, 3)));
        v.money("totalBudget", MAX_MONEY.checked_add(Decimal::new(1, 2)));
        v.money("spend", Some(Decimal::new(1, 4)));
        assert_eq!(v.get("dailyBudget"), Some("dailyBudget must have at most 2 decimal places"));
        assert_eq!(v.get("totalBudget"), Some("totalBudget must be at most 99999999.99"));
        assert_eq!(v.get("spend"), Some("spend must have at most 2 decimal places"));
    }

    #[test]
    fn date_params() {
        let start = parse_date_param("2024-02-01", false).unwrap();
        let end = parse_date_param("2024-02-01", true).unwrap();
        assert!(end > start);
        assert_eq!(
            parse_date_param("2024-02-01T10:00:00+02:00", false).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap()
        );
        assert!(parse_date_param("yesterday", false).is_none());

        let range = parse_date_range(Some("2024-02-01"), None).unwrap();
        assert_eq!(range.start, Some(start));
        assert_eq!(range.end, None);

        let err = parse_date_range(Some("2024-03-01"), Some("2024-02-01")).unwrap_err();
        assert!(err.get("endDate").is_some());
        assert!(parse_date_range(Some("soon"), None).unwrap_err().get("startDate").is_some());
    }

    #[test]
    fn first_message_wins() {
        let mut v = ValidationError::new();
        v.add("email", "first");
        v.add("email", "second");
        assert_eq!(v.get("email"), Some("first"));
    }
}
