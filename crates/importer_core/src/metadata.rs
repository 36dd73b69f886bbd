use chrono::{DateTime, NaiveDate};

use crate::filename::document_filename;
use crate::model::{FrontMatter, Icon, NormalizedDocument, RemoteEntry};

/// Title used when an entry has no usable title ("untitled").
pub const UNTITLED_PLACEHOLDER: &str = "제목 없음";

/// Pure derivation of the front matter record from an entry's properties.
///
/// Never fails: missing or malformed values fall back to their defaults.
pub fn derive_front_matter(entry: &RemoteEntry) -> FrontMatter {
    let props = &entry.properties;

    let title = props
        .title
        .as_present()
        .filter(|t| !t.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| UNTITLED_PLACEHOLDER.to_string());

    let date = props
        .date
        .as_present()
        .map(|range| range.start.as_str())
        .filter(|start| is_well_formed_date(start))
        .unwrap_or(entry.created_time.as_str())
        .to_string();

    let tags = props
        .tags
        .as_present()
        .map(|tags| tags.iter().map(|t| t.name.clone()).collect())
        .unwrap_or_default();

    let series = props.series.as_present().cloned().unwrap_or_default();

    let emoji = match &entry.icon {
        Some(Icon::Emoji(e)) => e.clone(),
        _ => String::new(),
    };

    FrontMatter {
        title,
        date,
        tags,
        series,
        emoji,
    }
}

/// Assemble the document for an entry from its already converted body.
pub fn normalize_entry(entry: &RemoteEntry, body: String) -> NormalizedDocument {
    let front_matter = derive_front_matter(entry);
    let filename = document_filename(&front_matter.title);
    NormalizedDocument {
        front_matter,
        body,
        filename,
    }
}

/// Accepts a calendar date (`2024-01-01`) or an RFC 3339 timestamp.
fn is_well_formed_date(value: &str) -> bool {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
}
