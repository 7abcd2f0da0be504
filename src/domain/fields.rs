use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

/// A `#RRGGBB` color, normalized to upper case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexColor(String);

impl HexColor {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for HexColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .ok_or_else(|| format!("Invalid color: {}. Expected #RRGGBB", s))?;

        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("Invalid color: {}. Expected #RRGGBB", s));
        }

        Ok(HexColor(format!("#{}", digits.to_ascii_uppercase())))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trims and rejects blank titles.
pub fn parse_title(raw: &str) -> Result<String, String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err("Title is required".into());
    }
    Ok(title.to_string())
}

pub fn validate_progress(progress: i64) -> Result<i64, String> {
    if !(0..=100).contains(&progress) {
        return Err(format!("Progress must be between 0 and 100, got {}", progress));
    }
    Ok(progress)
}

/// Accepts a plain date or a full RFC 3339 timestamp and keeps the date part.
pub fn parse_due_date(raw: &str) -> Result<String, String> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.format("%Y-%m-%d").to_string());
    }

    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.date_naive().format("%Y-%m-%d").to_string())
        .map_err(|_| format!("Invalid due date: {}. Expected YYYY-MM-DD", raw))
}

/// Optional text patch semantics: `None` keeps, empty string clears.
pub fn patch_optional(current: Option<String>, patch: Option<String>) -> Option<String> {
    match patch {
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(value),
        None => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_is_normalized() {
        let color: HexColor = " #3b82f6 ".parse().unwrap();
        assert_eq!(color.as_str(), "#3B82F6");
    }

    #[test]
    fn hex_color_rejects_bad_input() {
        assert!("3B82F6".parse::<HexColor>().is_err());
        assert!("#3B82F".parse::<HexColor>().is_err());
        assert!("#GGGGGG".parse::<HexColor>().is_err());
        assert!("red".parse::<HexColor>().is_err());
    }

    #[test]
    fn titles_are_trimmed() {
        assert_eq!(parse_title("  Ship it ").unwrap(), "Ship it");
        assert!(parse_title("   ").is_err());
    }

    #[test]
    fn progress_bounds() {
        assert_eq!(validate_progress(0), Ok(0));
        assert_eq!(validate_progress(100), Ok(100));
        assert!(validate_progress(-1).is_err());
        assert!(validate_progress(101).is_err());
    }

    #[test]
    fn due_date_accepts_date_and_timestamp() {
        assert_eq!(parse_due_date("2025-03-09").unwrap(), "2025-03-09");
        assert_eq!(
            parse_due_date("2025-03-09T10:00:00+00:00").unwrap(),
            "2025-03-09"
        );
        assert!(parse_due_date("next tuesday").is_err());
    }

    #[test]
    fn optional_patch_keeps_sets_and_clears() {
        let current = Some("old".to_string());
        assert_eq!(patch_optional(current.clone(), None), current);
        assert_eq!(patch_optional(current.clone(), Some("new".into())), Some("new".into()));
        assert_eq!(patch_optional(current, Some("".into())), None);
    }
}
