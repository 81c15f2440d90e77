//! Admin tools

pub mod log_browser;

pub use log_browser::{ExportRow, LogBrowser, SortDirection, SortKey, DEFAULT_PAGE_SIZE};
