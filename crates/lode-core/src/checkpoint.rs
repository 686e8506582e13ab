use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::CheckpointFormatError;

/// Timestamp layout shared by the persisted form and the repository.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Separates the timestamp from the tie-break id in the persisted form.
const DELIMITER: char = ',';

/// A position in delivery order.
///
/// Field order matters: the derived ordering compares the modification time
/// first and falls back to the node id for rows sharing a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cursor {
    pub modified: NaiveDateTime,
    pub id: i64,
}

impl Cursor {
    pub fn new(modified: NaiveDateTime, id: i64) -> Self {
        Self { modified, id }
    }
}

/// Everything delivered so far.
///
/// `None` sorts before every real position, so a traversal starting from it
/// sees the whole repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Checkpoint {
    #[default]
    None,
    At(Cursor),
}

impl Checkpoint {
    /// Starting point for a fresh traversal.
    ///
    /// A start date becomes a cursor just before the first node modified at
    /// that instant, so nodes modified exactly at the start date are included.
    pub fn initial(start_date: Option<NaiveDateTime>) -> Self {
        match start_date {
            Some(date) => Checkpoint::At(Cursor::new(date, i64::MIN)),
            None => Checkpoint::None,
        }
    }

    pub fn cursor(&self) -> Option<Cursor> {
        match self {
            Checkpoint::None => None,
            Checkpoint::At(cursor) => Some(*cursor),
        }
    }

    /// Persisted form: `yyyy-MM-dd HH:mm:ss[.f],<id>`, or empty for `None`.
    pub fn encode(&self) -> String {
        match self {
            Checkpoint::None => String::new(),
            Checkpoint::At(cursor) => format!(
                "{}{}{}",
                cursor.modified.format(TIMESTAMP_FORMAT),
                DELIMITER,
                cursor.id
            ),
        }
    }

    pub fn decode(value: &str) -> Result<Self, CheckpointFormatError> {
        if value.is_empty() {
            return Ok(Checkpoint::None);
        }

        let error = |reason| CheckpointFormatError {
            value: value.to_string(),
            reason,
        };

        let (timestamp, id) = value
            .split_once(DELIMITER)
            .ok_or_else(|| error("missing delimiter"))?;

        let modified = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .map_err(|_| error("invalid timestamp"))?;
        let id = id.parse::<i64>().map_err(|_| error("invalid node id"))?;

        Ok(Checkpoint::At(Cursor::new(modified, id)))
    }
}

impl std::fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Checkpoint::None => write!(f, "none"),
            Checkpoint::At(_) => write!(f, "{}", self.encode()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2007, 9, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_ordering_timestamp_then_id() {
        let early_high = Checkpoint::At(Cursor::new(at(27, 1, 0, 0), 900));
        let late_low = Checkpoint::At(Cursor::new(at(27, 2, 0, 0), 1));
        let late_high = Checkpoint::At(Cursor::new(at(27, 2, 0, 0), 2));

        assert!(early_high < late_low);
        assert!(late_low < late_high);
    }

    #[test]
    fn test_none_sorts_first() {
        let earliest = Checkpoint::At(Cursor::new(NaiveDateTime::MIN, i64::MIN));
        assert!(Checkpoint::None < earliest);
    }

    #[test]
    fn test_initial_without_start_date() {
        assert_eq!(Checkpoint::initial(None), Checkpoint::None);
    }

    #[test]
    fn test_initial_with_start_date_precedes_nodes_at_that_time() {
        let start = at(27, 0, 0, 0);
        let checkpoint = Checkpoint::initial(Some(start));

        assert!(checkpoint < Checkpoint::At(Cursor::new(start, 0)));
        assert!(checkpoint > Checkpoint::At(Cursor::new(at(26, 23, 59, 59), i64::MAX)));
    }

    #[test]
    fn test_encode() {
        let checkpoint = Checkpoint::At(Cursor::new(at(27, 1, 12, 13), 13832));
        assert_eq!(checkpoint.encode(), "2007-09-27 01:12:13,13832");
        assert_eq!(Checkpoint::None.encode(), "");
    }

    #[test]
    fn test_decode_persisted_value() {
        let checkpoint = Checkpoint::decode("2007-09-27 01:12:13,-2000").unwrap();
        assert_eq!(
            checkpoint,
            Checkpoint::At(Cursor::new(at(27, 1, 12, 13), -2000))
        );
        assert_eq!(Checkpoint::decode("").unwrap(), Checkpoint::None);
    }

    #[test]
    fn test_decode_keeps_fractional_seconds() {
        let checkpoint = Checkpoint::decode("2007-09-27 01:12:13.250,7").unwrap();
        let cursor = checkpoint.cursor().unwrap();
        assert_eq!(cursor.modified.and_utc().timestamp_subsec_millis(), 250);
        assert_eq!(checkpoint.encode(), "2007-09-27 01:12:13.250,7");
    }

    #[test]
    fn test_decode_rejects_malformed_values() {
        for value in [
            "2007-09-27 01:12:13",
            "2007-09-27,12",
            "Sep 27 2007,12",
            "2007-09-27 01:12:13,",
            "2007-09-27 01:12:13,abc",
            " 2007-09-27 01:12:13,12",
            "none",
        ] {
            let err = Checkpoint::decode(value).unwrap_err();
            assert_eq!(err.value, value);
        }
    }
}
