/// Virtual directories: blob name prefixes derived from the wall clock
///
/// The service has no directories; `2026/OCTOBER/17/9/5/name.txt` is one blob
/// name. Two runs in the same minute share a prefix.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use serde::Serialize;
use std::fmt;

use crate::storage::DIRECTORY_DELIMITER;

const MONTHS: [&str; 12] = [
    "JANUARY", "FEBRUARY", "MARCH", "APRIL", "MAY", "JUNE", "JULY", "AUGUST", "SEPTEMBER",
    "OCTOBER", "NOVEMBER", "DECEMBER",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VirtualDirectory {
    path: String,
}

impl VirtualDirectory {
    /// `year/MONTH/day/hour/minute`, numbers unpadded
    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        let path = format!(
            "{year}{d}{month}{d}{day}{d}{hour}{d}{minute}",
            year = at.year(),
            month = MONTHS[at.month0() as usize],
            day = at.day(),
            hour = at.hour(),
            minute = at.minute(),
            d = DIRECTORY_DELIMITER,
        );
        Self { path }
    }

    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Prefix that every blob in the directory starts with
    pub fn prefix(&self) -> String {
        format!("{}{}", self.path, DIRECTORY_DELIMITER)
    }

    /// Full blob name for `name` inside this directory
    pub fn blob_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix(), name.trim_start_matches(DIRECTORY_DELIMITER))
    }
}

impl fmt::Display for VirtualDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_path_components() {
        let at = Utc.with_ymd_and_hms(2026, 10, 17, 9, 5, 59).unwrap();
        let dir = VirtualDirectory::from_datetime(&at);
        assert_eq!(dir.path(), "2026/OCTOBER/17/9/5");
        assert_eq!(dir.prefix(), "2026/OCTOBER/17/9/5/");
    }

    #[test]
    fn test_same_minute_same_directory() {
        let a = Utc.with_ymd_and_hms(2024, 1, 2, 23, 59, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 2, 23, 59, 58).unwrap();
        assert_eq!(VirtualDirectory::from_datetime(&a), VirtualDirectory::from_datetime(&b));
        assert_eq!(VirtualDirectory::from_datetime(&a).path(), "2024/JANUARY/2/23/59");
    }

    #[test]
    fn test_uses_local_fields_of_the_given_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let at = offset.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(VirtualDirectory::from_datetime(&at).path(), "2025/DECEMBER/31/0/0");
    }

    #[test]
    fn test_blob_name_joins_once() {
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 0).unwrap();
        let dir = VirtualDirectory::from_datetime(&at);
        assert_eq!(dir.blob_name("sampleFileA.txt"), "2026/MARCH/4/5/6/sampleFileA.txt");
        assert_eq!(dir.blob_name("/x.txt"), "2026/MARCH/4/5/6/x.txt");
    }
}
