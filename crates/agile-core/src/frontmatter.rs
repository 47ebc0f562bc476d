//! Narrow frontmatter codec.
//!
//! Only `key: value` scalars and bracketed inline lists (`key: [a, b]`) in a
//! leading `---` block are understood. Reads never fail: absent or malformed
//! fields surface as `None` and callers apply their own defaults. Writes
//! touch only the block, so the markdown body after it is preserved byte for
//! byte.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::str::FromStr;

const DELIMITER: &str = "---";

/// Recognized fields extracted from a frontmatter block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    values: BTreeMap<String, String>,
}

impl Fields {
    /// Raw scalar value. Empty, `null` and `~` count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parse into a closed type; `None` when absent or not parseable.
    pub fn parse<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        self.get(key).and_then(parse_date)
    }

    pub fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get(key).and_then(parse_timestamp)
    }

    /// Bracketed inline list. A bare scalar is treated as a one-element list.
    pub fn list(&self, key: &str) -> Vec<String> {
        let Some(raw) = self.get(key) else {
            return Vec::new();
        };
        let inner = raw
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .unwrap_or(raw);
        inner
            .split(',')
            .map(|item| unquote(item.trim()).to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

/// Byte range of the block content (between the delimiter lines).
fn locate(text: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    let mut content_start = None;
    for line in text.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);
        match content_start {
            None => {
                if bare.trim_end() != DELIMITER {
                    return None;
                }
                content_start = Some(offset + line.len());
            }
            Some(start) => {
                if bare.trim_end() == DELIMITER {
                    return Some((start, offset));
                }
            }
        }
        offset += line.len();
    }
    None
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    if line.starts_with([' ', '\t', '#']) {
        return None;
    }
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// True when `text` opens with a well-formed frontmatter block.
pub fn has_block(text: &str) -> bool {
    locate(text).is_some()
}

/// Extract `keys` from the leading block. Unknown keys are ignored.
pub fn read(text: &str, keys: &[&str]) -> Fields {
    let mut fields = Fields::default();
    let Some((start, end)) = locate(text) else {
        return fields;
    };
    for line in text[start..end].lines() {
        let Some((key, value)) = split_key_value(line) else {
            continue;
        };
        if !keys.contains(&key) || fields.values.contains_key(key) {
            continue;
        }
        let value = unquote(value);
        if value.is_empty() || value == "null" || value == "~" {
            continue;
        }
        fields.values.insert(key.to_string(), value.to_string());
    }
    fields
}

/// Everything after the frontmatter block, or the whole text if there is none.
pub fn body(text: &str) -> &str {
    let Some((_, end)) = locate(text) else {
        return text;
    };
    let rest = &text[end..];
    match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => "",
    }
}

/// Set `field` to `value`.
///
/// The first line with a matching key is replaced in place. If the block
/// exists without the key, the key is appended to the block. Without a block,
/// a new one is synthesized at the top.
pub fn write(text: &str, field: &str, value: &str) -> String {
    let entry = if value.is_empty() {
        format!("{field}:")
    } else {
        format!("{field}: {value}")
    };

    let Some((start, end)) = locate(text) else {
        return format!("{DELIMITER}\n{entry}\n{DELIMITER}\n{text}");
    };

    let content = &text[start..end];
    let mut updated = String::with_capacity(content.len() + entry.len() + 1);
    let mut replaced = false;
    for line in content.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);
        let matches = !replaced
            && split_key_value(bare).is_some_and(|(key, _)| key == field);
        if matches {
            updated.push_str(&entry);
            updated.push_str(&line[bare.len()..]);
            replaced = true;
        } else {
            updated.push_str(line);
        }
    }
    if !replaced {
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&entry);
        updated.push('\n');
    }

    let mut out = String::with_capacity(text.len() + entry.len() + 1);
    out.push_str(&text[..start]);
    out.push_str(&updated);
    out.push_str(&text[end..]);
    out
}

/// Set `field` to a bracketed inline list.
pub fn write_list(text: &str, field: &str, values: &[String]) -> String {
    write(text, field, &format!("[{}]", values.join(", ")))
}

// ---------------------------------------------------------------------------
// Date and timestamp encoding
// ---------------------------------------------------------------------------

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// RFC 3339, UTC, millisecond precision: `2026-10-17T09:30:00.125Z`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part is kept).
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(value).map(|ts| ts.date_naive()))
}

/// Accepts a full RFC 3339 timestamp or a bare date (read as midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC_DOC: &str = "---\nstatus: in-progress\ncreated: 2026-10-01\ncompleted:\ndependencies: [schema, \"api\"]\nowner: ignored\n---\n# Spec: Login form\n\nBody text.\n";

    #[test]
    fn read_extracts_only_requested_keys() {
        let fields = read(SPEC_DOC, &["status", "created", "completed", "dependencies"]);
        assert_eq!(fields.get("status"), Some("in-progress"));
        assert_eq!(fields.date("created"), NaiveDate::from_ymd_opt(2026, 10, 1));
        assert_eq!(fields.get("completed"), None);
        assert_eq!(fields.list("dependencies"), vec!["schema", "api"]);
        assert_eq!(fields.get("owner"), None);
    }

    #[test]
    fn read_without_block_is_empty() {
        let fields = read("# Just a heading\nstatus: completed\n", &["status"]);
        assert_eq!(fields, Fields::default());
    }

    #[test]
    fn read_unclosed_block_is_empty() {
        let fields = read("---\nstatus: completed\n# no closing\n", &["status"]);
        assert_eq!(fields.get("status"), None);
    }

    #[test]
    fn malformed_values_fall_back_to_none() {
        let fields = read("---\ncreated: last tuesday\nstatus: ~\n---\n", &["created", "status"]);
        assert_eq!(fields.date("created"), None);
        assert_eq!(fields.get("status"), None);
        assert!(fields.list("dependencies").is_empty());
    }

    #[test]
    fn write_replaces_in_place() {
        let out = write(SPEC_DOC, "status", "completed");
        assert!(out.starts_with("---\nstatus: completed\ncreated: 2026-10-01\n"));
        assert_eq!(body(&out), body(SPEC_DOC));
    }

    #[test]
    fn write_appends_missing_key_to_block() {
        let text = "---\ntitle: x\n---\nbody\n";
        let out = write(text, "discovery_phase", "persona");
        assert_eq!(out, "---\ntitle: x\ndiscovery_phase: persona\n---\nbody\n");
    }

    #[test]
    fn write_synthesizes_block_when_absent() {
        let out = write("# Feature\n", "discovery_phase", "paths");
        assert_eq!(out, "---\ndiscovery_phase: paths\n---\n# Feature\n");
        assert_eq!(read(&out, &["discovery_phase"]).get("discovery_phase"), Some("paths"));
    }

    #[test]
    fn write_empty_value_clears_field() {
        let text = "---\ncompleted: 2026-10-17T10:00:00.000Z\n---\n";
        let out = write(text, "completed", "");
        assert_eq!(out, "---\ncompleted:\n---\n");
        assert_eq!(read(&out, &["completed"]).get("completed"), None);
    }

    #[test]
    fn write_preserves_crlf_line_endings() {
        let text = "---\r\nstatus: pending\r\n---\r\nbody\r\n";
        let out = write(text, "status", "completed");
        assert_eq!(out, "---\r\nstatus: completed\r\n---\r\nbody\r\n");
    }

    #[test]
    fn write_list_formats_brackets() {
        let out = write_list("---\n---\n", "dependencies", &["a".to_string(), "b".to_string()]);
        assert_eq!(read(&out, &["dependencies"]).list("dependencies"), vec!["a", "b"]);
        assert!(out.contains("dependencies: [a, b]"));
    }

    #[test]
    fn timestamps_round_trip_and_accept_dates() {
        let ts = parse_timestamp("2026-10-17T09:30:00.125Z").unwrap();
        assert_eq!(format_timestamp(ts), "2026-10-17T09:30:00.125Z");
        let midnight = parse_timestamp("2026-10-17").unwrap();
        assert_eq!(format_timestamp(midnight), "2026-10-17T00:00:00.000Z");
        assert_eq!(
            parse_date("2026-10-17T23:59:00Z"),
            NaiveDate::from_ymd_opt(2026, 10, 17)
        );
    }
}
