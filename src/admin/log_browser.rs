//! Scan log browser
//!
//! Holds the full scan log collection loaded once from the server and
//! derives the filtered, sorted and paginated view from it. Export writes
//! the filtered rows in display order as CSV.

use std::cmp::Ordering;
use std::fmt::Display;
use std::io::Write;
use std::str::FromStr;

use chrono::{NaiveDate, TimeZone};
use serde::Serialize;

use crate::models::ScanLogEntry;

pub const DEFAULT_PAGE_SIZE: usize = 10;

const EXPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const UNKNOWN_OPERATOR: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    TrusteeName,
    Gaam,
    ScanTime,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trustee" | "name" => Ok(SortKey::TrusteeName),
            "gaam" => Ok(SortKey::Gaam),
            "scan_time" | "time" => Ok(SortKey::ScanTime),
            other => Err(format!("unknown sort key '{}' (expected trustee, gaam or scan_time)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One exported CSV line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Trustee")]
    pub trustee: String,
    #[serde(rename = "Gaam")]
    pub gaam: String,
    #[serde(rename = "Scan Time")]
    pub scan_time: String,
    #[serde(rename = "Scanned By")]
    pub scanned_by: String,
}

/// Scan log view in the time zone `Tz`. Each entry is converted with the
/// offset in force at its own scan time.
#[derive(Debug, Clone)]
pub struct LogBrowser<Tz: TimeZone> {
    entries: Vec<ScanLogEntry>,
    tz: Tz,
    page_size: usize,
    search: String,
    date: Option<NaiveDate>,
    sort_key: SortKey,
    direction: SortDirection,
    page: usize,
}

impl<Tz> LogBrowser<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn new(entries: Vec<ScanLogEntry>, tz: Tz, page_size: usize) -> Self {
        Self {
            entries,
            tz,
            page_size: page_size.max(1),
            search: String::new(),
            date: None,
            sort_key: SortKey::ScanTime,
            direction: SortDirection::Descending,
            page: 1,
        }
    }

    /// Free-text filter on trustee name or gaam, case-insensitive
    pub fn set_search(&mut self, term: &str) {
        self.search = term.trim().to_lowercase();
        self.page = 1;
    }

    /// Keep only scans made on the given day
    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.date = date;
        self.page = 1;
    }

    /// Select a sort column. Ascending first; selecting the column again
    /// while ascending switches to descending.
    pub fn request_sort(&mut self, key: SortKey) {
        self.direction = if self.sort_key == key && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        self.sort_key = key;
    }

    pub fn sort(&self) -> (SortKey, SortDirection) {
        (self.sort_key, self.direction)
    }

    /// Go to a 1-based page, clamped to the available pages
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count());
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// Filtered rows in display order
    pub fn filtered(&self) -> Vec<&ScanLogEntry> {
        let mut rows: Vec<&ScanLogEntry> = self.entries.iter().filter(|e| self.matches(e)).collect();
        rows.sort_by(|a, b| {
            let ordering = self.compare(a, b);
            match self.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        rows
    }

    /// Number of pages of the filtered view, at least one
    pub fn page_count(&self) -> usize {
        let count = self.entries.iter().filter(|e| self.matches(e)).count();
        count.div_ceil(self.page_size).max(1)
    }

    /// Rows of the current page
    pub fn current_page(&self) -> Vec<&ScanLogEntry> {
        self.filtered()
            .into_iter()
            .skip((self.page - 1) * self.page_size)
            .take(self.page_size)
            .collect()
    }

    /// Scan time as shown to the operator
    pub fn display_time(&self, entry: &ScanLogEntry) -> String {
        entry
            .scan_time
            .with_timezone(&self.tz)
            .format(EXPORT_TIME_FORMAT)
            .to_string()
    }

    pub fn export_rows(&self) -> Vec<ExportRow> {
        self.filtered()
            .into_iter()
            .map(|entry| ExportRow {
                trustee: entry.trustee.full_name(),
                gaam: entry.trustee.gaam.clone(),
                scan_time: self.display_time(entry),
                scanned_by: entry
                    .scanned_by
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_OPERATOR.to_string()),
            })
            .collect()
    }

    /// Write the filtered rows as CSV with a header line
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize, csv::Error> {
        let rows = self.export_rows();
        let mut wtr = csv::Writer::from_writer(writer);
        for row in &rows {
            wtr.serialize(row)?;
        }
        if rows.is_empty() {
            wtr.write_record(["Trustee", "Gaam", "Scan Time", "Scanned By"])?;
        }
        wtr.flush()?;
        Ok(rows.len())
    }

    fn matches(&self, entry: &ScanLogEntry) -> bool {
        let matches_text = self.search.is_empty()
            || entry.trustee.full_name().to_lowercase().contains(&self.search)
            || entry.trustee.gaam.to_lowercase().contains(&self.search);
        let matches_date = match self.date {
            Some(date) => entry.scan_time.with_timezone(&self.tz).date_naive() == date,
            None => true,
        };
        matches_text && matches_date
    }

    fn compare(&self, a: &ScanLogEntry, b: &ScanLogEntry) -> Ordering {
        match self.sort_key {
            SortKey::TrusteeName => a
                .trustee
                .full_name()
                .to_lowercase()
                .cmp(&b.trustee.full_name().to_lowercase()),
            SortKey::Gaam => a.trustee.gaam.to_lowercase().cmp(&b.trustee.gaam.to_lowercase()),
            SortKey::ScanTime => a.scan_time.cmp(&b.scan_time),
        }
    }
}
