//! Filter-to-query translation for `GET /files`.
//!
//! Pagination keys always come first and are never overridden by filter fields.
//! Unset or empty filter fields are omitted entirely. Values are passed through
//! without cross-field validation (`min_size > max_size` is sent as-is).

use crate::models::{non_empty, FilterState, Pagination};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Flat, ordered key/value query parameters. `tags` may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(&'static str, String)>);

impl QueryParams {
    pub fn as_slice(&self) -> &[(&'static str, String)] {
        &self.0
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.0.iter().map(|(k, _)| *k).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Percent-encoded `k=v&k=v` form.
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn push(&mut self, key: &'static str, value: impl Into<String>) {
        self.0.push((key, value.into()));
    }
}

/// Translate an applied filter plus pagination into listing query parameters.
pub fn build_query(filter: &FilterState, pagination: Pagination) -> QueryParams {
    let mut params = QueryParams::default();
    params.push("page", pagination.page.to_string());
    params.push("limit", pagination.limit.to_string());

    if let Some(filename) = non_empty(&filter.filename) {
        params.push("filename", filename);
    }
    if let Some(mime_type) = non_empty(&filter.mime_type) {
        params.push("mime_type", mime_type);
    }
    if let Some(min) = filter.min_size {
        params.push("min_size", min.to_string());
    }
    if let Some(max) = filter.max_size {
        params.push("max_size", max.to_string());
    }
    if let Some(start) = filter.start_date {
        params.push("start_date", start.format(DATE_FORMAT).to_string());
    }
    if let Some(end) = filter.end_date {
        params.push("end_date", end.format(DATE_FORMAT).to_string());
    }
    for tag in filter.tags.iter().filter(|t| !t.is_empty()) {
        params.push("tags", tag.as_str());
    }
    if let Some(uploader) = non_empty(&filter.uploader_name) {
        params.push("uploader_name", uploader);
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn empty_filter_yields_only_pagination() {
        let params = build_query(&FilterState::default(), Pagination::default());
        assert_eq!(params.keys(), vec!["page", "limit"]);
        assert_eq!(params.get("page"), Some("1"));
        assert_eq!(params.get("limit"), Some("100"));
    }

    #[test]
    fn empty_strings_are_omitted() {
        let filter = FilterState {
            filename: Some(String::new()),
            mime_type: Some(String::new()),
            uploader_name: Some(String::new()),
            ..Default::default()
        };
        let params = build_query(&filter, Pagination::new(2, 20));
        assert_eq!(params.keys(), vec!["page", "limit"]);
        assert_eq!(params.get("page"), Some("2"));
    }

    #[test]
    fn size_bounds_pass_through_unvalidated() {
        let filter = FilterState {
            min_size: Some(100),
            max_size: Some(50),
            ..Default::default()
        };
        let params = build_query(&filter, Pagination::default());
        assert_eq!(params.get("min_size"), Some("100"));
        assert_eq!(params.get("max_size"), Some("50"));
    }

    #[test]
    fn mime_category_and_dates() {
        let filter = FilterState {
            filename: Some("report".to_string()),
            mime_type: Some("image".to_string()),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31),
            ..Default::default()
        };
        let params = build_query(&filter, Pagination::default());
        assert_eq!(params.get("mime_type"), Some("image"));
        assert_eq!(params.get("start_date"), Some("2024-01-05"));
        assert_eq!(params.get("end_date"), Some("2024-12-31"));
        assert_eq!(
            params.keys(),
            vec!["page", "limit", "filename", "mime_type", "start_date", "end_date"]
        );
    }

    #[test]
    fn tags_repeat_and_encode() {
        let filter = FilterState {
            tags: vec!["work".to_string(), String::new(), "q&a".to_string()],
            mime_type: Some("application/vnd.openxmlformats-officedocument".to_string()),
            ..Default::default()
        };
        let params = build_query(&filter, Pagination::default());
        assert_eq!(params.get_all("tags").collect::<Vec<_>>(), vec!["work", "q&a"]);
        assert_eq!(
            params.to_query_string(),
            "page=1&limit=100&mime_type=application%2Fvnd.openxmlformats-officedocument&tags=work&tags=q%26a"
        );
    }
}
