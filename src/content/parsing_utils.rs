use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Timelike};

use crate::config::ContentOptions;
use crate::error::PostError;

/// Parses `value` with the datetime format when it has a time part, otherwise
/// with the date format, promoting the date to midnight.
pub fn parse_post_date(value: &str, options: &ContentOptions) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.split_whitespace().count() > 1 {
        NaiveDateTime::parse_from_str(value, &options.datetime_format).ok()
    } else {
        NaiveDate::parse_from_str(value, &options.date_format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    }
}

pub fn format_post_date(date: &NaiveDateTime, options: &ContentOptions) -> String {
    date.format(&options.datetime_format).to_string()
}

/// Last modification time of `file_name`, in local time, truncated to whole
/// seconds so it survives a round trip through the datetime format.
pub fn file_date(file_name: &Path) -> Result<NaiveDateTime, PostError> {
    let modified = fs::metadata(file_name)
        .and_then(|meta| meta.modified())
        .map_err(|e| PostError::Io(file_name.to_path_buf(), e))?;
    let local: DateTime<Local> = modified.into();
    let naive = local.naive_local();
    Ok(naive.with_nanosecond(0).unwrap_or(naive))
}

/// Returns the value of a `Label: value` line. The label matches either as
/// written or all lowercase.
pub fn extract_label_value<'a>(label: &str, line: &'a str) -> Option<&'a str> {
    let lower = label.to_lowercase();
    let rest = line
        .strip_prefix(label)
        .or_else(|| line.strip_prefix(lower.as_str()))?;
    rest.strip_prefix(':').map(|value| value.trim())
}

/// Splits `a, b ,c` into trimmed, non-empty, de-duplicated items.
pub fn split_list(value: &str) -> Vec<String> {
    let mut items: Vec<String> = vec![];
    for item in value.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if !items.iter().any(|i| i == item) {
            items.push(item.to_string());
        }
    }
    items
}

/// String form of a scalar header value. `None` for null.
pub fn yaml_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => None,
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        other => serde_yaml::to_string(other).ok().map(|s| s.trim().to_string()),
    }
}

/// A header list may be written as a YAML sequence or as a comma separated
/// string.
pub fn yaml_to_list(value: &serde_yaml::Value) -> Vec<String> {
    match value {
        serde_yaml::Value::Sequence(seq) => {
            let joined: Vec<String> = seq.iter().filter_map(yaml_to_string).collect();
            split_list(&joined.join(","))
        }
        other => yaml_to_string(other).map(|s| split_list(&s)).unwrap_or_default(),
    }
}
