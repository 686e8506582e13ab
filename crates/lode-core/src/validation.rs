use chrono::{NaiveDate, NaiveDateTime};

use crate::error::ConfigurationError;

/// Container subtype aliases accepted in subtype lists.
pub const CONTAINER_ALIASES: &[(&str, i64)] =
    &[("enterprise", 141), ("personal", 142), ("project", 202)];

/// Validator for administrator-supplied filter settings.
pub struct Validator;

impl Validator {
    /// Parse a comma-separated list of non-negative integers.
    ///
    /// Surrounding whitespace and one pair of enclosing braces are ignored;
    /// elements are trimmed individually. Empty elements are rejected, so
    /// `1,,2` and a trailing comma are errors. Blank input is an empty list.
    pub fn sanitize_integer_list(
        setting: &'static str,
        value: &str,
    ) -> Result<Vec<i64>, ConfigurationError> {
        Self::sanitize_list(setting, value, |_| None)
    }

    /// Like [`Validator::sanitize_integer_list`], also accepting container
    /// aliases such as `project` in place of a subtype code.
    pub fn sanitize_subtype_list(
        setting: &'static str,
        value: &str,
    ) -> Result<Vec<i64>, ConfigurationError> {
        Self::sanitize_list(setting, value, |entry| {
            CONTAINER_ALIASES
                .iter()
                .find(|(alias, _)| alias.eq_ignore_ascii_case(entry))
                .map(|(_, subtype)| *subtype)
        })
    }

    fn sanitize_list(
        setting: &'static str,
        value: &str,
        alias: impl Fn(&str) -> Option<i64>,
    ) -> Result<Vec<i64>, ConfigurationError> {
        let trimmed = value.trim();
        let trimmed = trimmed.strip_prefix('{').unwrap_or(trimmed);
        let trimmed = trimmed.strip_suffix('}').unwrap_or(trimmed).trim();

        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        trimmed
            .split(',')
            .map(|entry| {
                let entry = entry.trim();
                if entry.is_empty() {
                    return Err(ConfigurationError::InvalidList {
                        setting,
                        value: value.to_string(),
                    });
                }
                if let Some(subtype) = alias(entry) {
                    return Ok(subtype);
                }
                if !entry.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(ConfigurationError::InvalidEntry {
                        setting,
                        entry: entry.to_string(),
                    });
                }
                entry
                    .parse::<i64>()
                    .map_err(|_| ConfigurationError::InvalidEntry {
                        setting,
                        entry: entry.to_string(),
                    })
            })
            .collect()
    }

    /// Parse a traversal start date, `yyyy-MM-dd HH:mm:ss` or `yyyy-MM-dd`.
    ///
    /// Returns `None` for blank or unparsable input; an unusable start date
    /// means "from the beginning", not a configuration failure.
    pub fn parse_start_date(value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(value, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
    }
}
