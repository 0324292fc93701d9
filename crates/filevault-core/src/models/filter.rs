use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

/// Applied search/filter constraints for the file listing. Every field is optional;
/// an unset (or empty) field means "no constraint".
///
/// Size and date bounds are inclusive. `mime_type` is a raw category token
/// (`"image"`, `"text"`, `"application/pdf"`) interpreted by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub uploader_name: Option<String>,
}

impl FilterState {
    /// True when no field constrains the listing.
    pub fn is_empty(&self) -> bool {
        non_empty(&self.filename).is_none()
            && non_empty(&self.mime_type).is_none()
            && self.min_size.is_none()
            && self.max_size.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.tags.iter().all(|t| t.is_empty())
            && non_empty(&self.uploader_name).is_none()
    }
}

/// Returns the string only if it is set and non-empty.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Page window requested from the listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Pagination {
    /// Build a pagination window, clamping to the bounds the backend accepts.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..self
        }
    }
}
