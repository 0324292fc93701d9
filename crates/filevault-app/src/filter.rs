//! Draft filter values as typed by the user.

use chrono::NaiveDate;
use filevault_core::{FilterState, VaultError, VaultResult};

/// Raw, unvalidated filter inputs. Nothing is sent until [`FilterForm::apply`]
/// succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterForm {
    pub filename: String,
    pub mime_type: String,
    pub min_size: String,
    pub max_size: String,
    /// `YYYY-MM-DD`
    pub start_date: String,
    pub end_date: String,
    /// Comma separated.
    pub tags: String,
    pub uploader_name: String,
}

impl FilterForm {
    pub fn from_state(state: &FilterState) -> Self {
        let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        let size = |s: Option<u64>| s.map(|s| s.to_string()).unwrap_or_default();
        Self {
            filename: state.filename.clone().unwrap_or_default(),
            mime_type: state.mime_type.clone().unwrap_or_default(),
            min_size: size(state.min_size),
            max_size: size(state.max_size),
            start_date: date(state.start_date),
            end_date: date(state.end_date),
            tags: state.tags.join(","),
            uploader_name: state.uploader_name.clone().unwrap_or_default(),
        }
    }

    /// Parse the drafts into a filter. Min/max ordering is left to the backend.
    pub fn apply(&self) -> VaultResult<FilterState> {
        Ok(FilterState {
            filename: text(&self.filename),
            mime_type: text(&self.mime_type),
            min_size: parse_size("min_size", &self.min_size)?,
            max_size: parse_size("max_size", &self.max_size)?,
            start_date: parse_date("start_date", &self.start_date)?,
            end_date: parse_date("end_date", &self.end_date)?,
            tags: self
                .tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            uploader_name: text(&self.uploader_name),
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_size(field: &str, raw: &str) -> VaultResult<Option<u64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u64>().map(Some).map_err(|_| {
        VaultError::InvalidInput(format!(
            "{} must be a non-negative number of bytes, got '{}'",
            field, raw
        ))
    })
}

fn parse_date(field: &str, raw: &str) -> VaultResult<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| {
            VaultError::InvalidInput(format!("{} must be a date (YYYY-MM-DD), got '{}'", field, raw))
        })
}
