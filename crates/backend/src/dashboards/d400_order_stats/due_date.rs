use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Outcome of reading a free-text next-update-due value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueDate {
    /// Empty or absent: no due date set
    Missing,
    Date(NaiveDate),
    /// Present but in none of the accepted formats
    Unparseable,
}

impl DueDate {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self, DueDate::Date(d) if *d < today)
    }
}

/// Accepted: `YYYY-MM-DD`, RFC 3339 (date taken in UTC), `MM/DD/YYYY`,
/// `YYYY-MM-DD HH:MM:SS`
pub fn parse_due_date(raw: Option<&str>) -> DueDate {
    let Some(value) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DueDate::Missing;
    };

    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return DueDate::Date(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return DueDate::Date(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%m/%d/%Y") {
        return DueDate::Date(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return DueDate::Date(dt.date());
    }
    DueDate::Unparseable
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> DueDate {
        DueDate::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_accepted_formats() {
        assert_eq!(parse_due_date(Some("2024-03-15")), date(2024, 3, 15));
        assert_eq!(parse_due_date(Some("03/15/2024")), date(2024, 3, 15));
        assert_eq!(parse_due_date(Some("2024-03-15 08:30:00")), date(2024, 3, 15));
        assert_eq!(parse_due_date(Some("2024-03-15T23:00:00-05:00")), date(2024, 3, 16));
        assert_eq!(parse_due_date(Some(" 2024-03-15 ")), date(2024, 3, 15));
    }

    #[test]
    fn test_missing_and_garbage() {
        assert_eq!(parse_due_date(None), DueDate::Missing);
        assert_eq!(parse_due_date(Some("   ")), DueDate::Missing);
        assert_eq!(parse_due_date(Some("next week")), DueDate::Unparseable);
        assert_eq!(parse_due_date(Some("2024-13-45")), DueDate::Unparseable);
        assert_eq!(parse_due_date(Some("15.03.2024")), DueDate::Unparseable);
    }

    #[test]
    fn test_overdue_is_strictly_before_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert!(date(2024, 3, 14).is_overdue(today));
        assert!(!date(2024, 3, 15).is_overdue(today));
        assert!(!DueDate::Unparseable.is_overdue(today));
        assert!(!DueDate::Missing.is_overdue(today));
    }
}
