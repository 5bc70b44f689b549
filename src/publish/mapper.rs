// src/publish/mapper.rs
//! Record → Notion page properties. Pure; no error path.

use serde::Serialize;

use crate::source::Record;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_STATUS: &str = "New";

/// Fixed property schema of the target database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageProperties {
    #[serde(rename = "Name")]
    pub name: TitleProperty,
    #[serde(rename = "Status")]
    pub status: SelectProperty,
    #[serde(rename = "Created At")]
    pub created_at: DateProperty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleProperty {
    pub title: Vec<RichText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichText {
    pub text: TextContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectProperty {
    pub select: SelectOption,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateProperty {
    pub date: DateValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateValue {
    /// Serialized as `null` when the row had no timestamp.
    pub start: Option<String>,
}

impl PageProperties {
    pub fn title(&self) -> &str {
        self.name
            .title
            .first()
            .map(|t| t.text.content.as_str())
            .unwrap_or_default()
    }

    pub fn status(&self) -> &str {
        &self.status.select.name
    }

    pub fn created_at(&self) -> Option<&str> {
        self.created_at.date.start.as_deref()
    }
}

/// `created_at` is forwarded verbatim, null included; a malformed or missing
/// value is the publisher's problem.
pub fn map_record(record: &Record) -> PageProperties {
    PageProperties {
        name: TitleProperty {
            title: vec![RichText {
                text: TextContent {
                    content: or_default(record.name.as_deref(), DEFAULT_TITLE),
                },
            }],
        },
        status: SelectProperty {
            select: SelectOption {
                name: or_default(record.status.as_deref(), DEFAULT_STATUS),
            },
        },
        created_at: DateProperty {
            date: DateValue {
                start: record.created_at.clone(),
            },
        },
    }
}

fn or_default(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}
