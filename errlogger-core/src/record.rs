//! Captured errors and the records built from them
//!
//! A [`CapturedError`] is whatever the capture site could tell us. The
//! [`RecordEnvelope`] turns it into an immutable [`ErrorRecord`] by layering
//! three sources of key/value pairs, later layers winning:
//!
//! 1. defaults: `pageUrl`, `time`, `index`
//! 2. the configured static parameters
//! 3. the fields of the captured error itself
//!
//! `index` is never overridable. A key that is overridden keeps the position
//! where it first appeared, so the wire order is stable.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

use crate::config::LoggerConfig;

pub const KEY_PAGE_URL: &str = "pageUrl";
pub const KEY_TIME: &str = "time";
pub const KEY_INDEX: &str = "index";
pub const KEY_MESSAGE: &str = "message";
pub const KEY_SOURCE: &str = "source";
pub const KEY_LINE: &str = "lineno";
pub const KEY_COLUMN: &str = "rowno";

/// Raw fields reported by a capture site
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedError {
    pub message: Option<String>,
    pub source: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    /// Additional per-error fields; these win over every other layer except `index`
    pub extra: BTreeMap<String, String>,
}

impl CapturedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// One queued error, ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    index: u64,
    timestamp: DateTime<Utc>,
    captured: CapturedError,
    fields: Vec<(String, String)>,
}

impl ErrorRecord {
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn captured(&self) -> &CapturedError {
        &self.captured
    }

    /// Merged key/value pairs in wire order
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Defaults and static parameters stamped onto every record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEnvelope {
    page_url: String,
    additional_params: BTreeMap<String, String>,
}

impl RecordEnvelope {
    pub fn new(page_url: impl Into<String>, additional_params: BTreeMap<String, String>) -> Self {
        Self {
            page_url: page_url.into(),
            additional_params,
        }
    }

    pub fn from_config(config: &LoggerConfig) -> Self {
        let page_url = config
            .page_url
            .clone()
            .unwrap_or_else(default_page_url);
        Self::new(page_url, config.additional_params.clone())
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    /// Build a record stamped with the current time
    pub fn build(&self, index: u64, captured: CapturedError) -> ErrorRecord {
        self.build_at(index, captured, Utc::now())
    }

    pub fn build_at(
        &self,
        index: u64,
        captured: CapturedError,
        timestamp: DateTime<Utc>,
    ) -> ErrorRecord {
        let mut fields = Vec::with_capacity(
            7 + self.additional_params.len() + captured.extra.len(),
        );

        upsert(&mut fields, KEY_PAGE_URL, self.page_url.clone());
        upsert(
            &mut fields,
            KEY_TIME,
            timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        upsert(&mut fields, KEY_INDEX, index.to_string());

        for (key, value) in &self.additional_params {
            if key != KEY_INDEX {
                upsert(&mut fields, key, value.clone());
            }
        }

        if let Some(message) = &captured.message {
            upsert(&mut fields, KEY_MESSAGE, message.clone());
        }
        if let Some(source) = &captured.source {
            upsert(&mut fields, KEY_SOURCE, source.clone());
        }
        if let Some(line) = captured.line {
            upsert(&mut fields, KEY_LINE, line.to_string());
        }
        if let Some(column) = captured.column {
            upsert(&mut fields, KEY_COLUMN, column.to_string());
        }
        for (key, value) in &captured.extra {
            if key != KEY_INDEX {
                upsert(&mut fields, key, value.clone());
            }
        }

        ErrorRecord {
            index,
            timestamp,
            captured,
            fields,
        }
    }
}

fn upsert(fields: &mut Vec<(String, String)>, key: &str, value: String) {
    match fields.iter_mut().find(|(k, _)| k == key) {
        Some(slot) => slot.1 = value,
        None => fields.push((key.to_string(), value)),
    }
}

fn default_page_url() -> String {
    std::env::current_exe()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
    }

    fn keys(record: &ErrorRecord) -> Vec<&str> {
        record.fields().iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn test_default_envelope_and_wire_order() {
        let envelope = RecordEnvelope::new("https://shop.example.com/cart", BTreeMap::new());
        let record = envelope.build_at(
            7,
            CapturedError::new("TypeError: x is undefined")
                .with_source("app.js")
                .at(42, 13),
            fixed_time(),
        );

        assert_eq!(record.index(), 7);
        assert_eq!(
            keys(&record),
            vec!["pageUrl", "time", "index", "message", "source", "lineno", "rowno"]
        );
        assert_eq!(record.get(KEY_TIME), Some("2024-03-01T12:30:00.000Z"));
        assert_eq!(record.get(KEY_LINE), Some("42"));
        assert_eq!(record.get(KEY_COLUMN), Some("13"));
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let envelope = RecordEnvelope::new("app", BTreeMap::new());
        let record = envelope.build_at(0, CapturedError::default(), fixed_time());
        assert_eq!(keys(&record), vec!["pageUrl", "time", "index"]);
    }

    #[test]
    fn test_override_order() {
        let mut params = BTreeMap::new();
        params.insert("pageUrl".to_string(), "from-params".to_string());
        params.insert("release".to_string(), "1.0".to_string());
        params.insert("index".to_string(), "999".to_string());

        let envelope = RecordEnvelope::new("default-page", params);
        let record = envelope.build_at(
            3,
            CapturedError::new("boom")
                .with_field("release", "2.0")
                .with_field("index", "1000")
                .with_field("user", "u-17"),
            fixed_time(),
        );

        // params beat defaults, per-error fields beat params, index is fixed
        assert_eq!(record.get(KEY_PAGE_URL), Some("from-params"));
        assert_eq!(record.get("release"), Some("2.0"));
        assert_eq!(record.get(KEY_INDEX), Some("3"));
        assert_eq!(record.get("user"), Some("u-17"));

        // overridden keys keep their original slot
        assert_eq!(
            keys(&record),
            vec!["pageUrl", "time", "index", "release", "message", "user"]
        );
    }

    #[test]
    fn test_envelope_from_config() {
        let mut config = LoggerConfig::new("http://localhost/errors");
        config.page_url = Some("https://app.example.com".to_string());
        config
            .additional_params
            .insert("app".to_string(), "admin".to_string());

        let envelope = RecordEnvelope::from_config(&config);
        assert_eq!(envelope.page_url(), "https://app.example.com");

        let record = envelope.build(0, CapturedError::new("boom"));
        assert_eq!(record.get("app"), Some("admin"));
    }
}
