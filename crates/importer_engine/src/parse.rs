//! Wire types of the Notion API and their mapping onto the core model.
//!
//! Parsing is lenient on purpose: a property whose shape is not understood
//! is treated as absent, and a block whose payload cannot be read becomes
//! [`BlockKind::Unsupported`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use importer_core::{
    Annotations, BlockKind, DateRange, EntryProperties, Icon, PropertyValue, RemoteEntry,
    RichText, TagRef,
};

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultPage<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPage {
    pub id: String,
    #[serde(default)]
    pub created_time: String,
    #[serde(default)]
    pub icon: Option<Value>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl RawBlock {
    /// Children of these blocks live in another page and are not inlined.
    pub fn owns_children(&self) -> bool {
        self.has_children && !matches!(self.kind.as_str(), "child_page" | "child_database")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawRichText {
    plain_text: String,
    href: Option<String>,
    annotations: RawAnnotations,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawAnnotations {
    bold: bool,
    italic: bool,
    strikethrough: bool,
    underline: bool,
    code: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawIcon {
    Emoji { emoji: String },
    External { external: RawUrl },
    File { file: RawUrl },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawUrl {
    url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawProperty {
    Title {
        title: Vec<RawRichText>,
    },
    RichText {
        rich_text: Vec<RawRichText>,
    },
    Date {
        date: Option<RawDate>,
    },
    MultiSelect {
        multi_select: Vec<RawSelectOption>,
    },
    Select {
        select: Option<RawSelectOption>,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct RawDate {
    start: String,
    #[serde(default)]
    end: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSelectOption {
    name: String,
}

/// Block payload fields. Every block type uses a subset of them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawPayload {
    rich_text: Vec<RawRichText>,
    caption: Vec<RawRichText>,
    checked: bool,
    language: String,
    expression: String,
    url: String,
    title: String,
    icon: Option<Value>,
    has_column_header: bool,
    cells: Vec<Vec<RawRichText>>,
    external: Option<RawUrl>,
    file: Option<RawUrl>,
}

/// Map a database row onto a [`RemoteEntry`]. Blocks are resolved separately.
pub fn parse_entry(page: RawPage) -> RemoteEntry {
    let properties = parse_properties(&page.properties);
    RemoteEntry {
        id: page.id,
        created_time: page.created_time,
        properties,
        icon: page.icon.as_ref().and_then(parse_icon),
        blocks: Vec::new(),
    }
}

fn parse_properties(raw: &Map<String, Value>) -> EntryProperties {
    let mut props = EntryProperties::default();
    for (name, value) in raw {
        let Some(property) = lenient::<RawProperty>(value) else {
            continue;
        };
        let key = name.to_lowercase();
        match property {
            RawProperty::Title { title } if props.title.is_absent() => {
                props.title = PropertyValue::Present(join_plain(&title));
            }
            RawProperty::Date { date: Some(date) } if key == "date" => {
                props.date = PropertyValue::Present(DateRange {
                    start: date.start,
                    end: date.end,
                });
            }
            RawProperty::MultiSelect { multi_select } if key == "tags" => {
                props.tags = PropertyValue::Present(
                    multi_select
                        .into_iter()
                        .map(|o| TagRef { name: o.name })
                        .collect(),
                );
            }
            RawProperty::Select { select: Some(option) } if key == "series" => {
                props.series = PropertyValue::Present(option.name);
            }
            RawProperty::RichText { rich_text } if key == "series" => {
                props.series = PropertyValue::Present(join_plain(&rich_text));
            }
            _ => {}
        }
    }
    props
}

fn parse_icon(value: &Value) -> Option<Icon> {
    lenient::<RawIcon>(value).map(|icon| match icon {
        RawIcon::Emoji { emoji } => Icon::Emoji(emoji),
        RawIcon::External { external } => Icon::External(external.url),
        RawIcon::File { file } => Icon::File(file.url),
    })
}

/// Interpret a block's type-specific payload.
pub fn parse_block_kind(block: &RawBlock) -> BlockKind {
    let kind = block.kind.as_str();
    let Some(payload) = block.payload.get(kind).and_then(lenient::<RawPayload>) else {
        return match kind {
            "divider" => BlockKind::Divider,
            "column_list" => BlockKind::ColumnList,
            "column" => BlockKind::Column,
            _ => BlockKind::Unsupported {
                kind: kind.to_string(),
                text: String::new(),
            },
        };
    };

    match kind {
        "paragraph" => BlockKind::Paragraph {
            text: rich(&payload.rich_text),
        },
        "heading_1" | "heading_2" | "heading_3" => BlockKind::Heading {
            level: kind.as_bytes()[kind.len() - 1] - b'0',
            text: rich(&payload.rich_text),
        },
        "bulleted_list_item" => BlockKind::BulletedListItem {
            text: rich(&payload.rich_text),
        },
        "numbered_list_item" => BlockKind::NumberedListItem {
            text: rich(&payload.rich_text),
        },
        "to_do" => BlockKind::ToDo {
            text: rich(&payload.rich_text),
            checked: payload.checked,
        },
        "quote" => BlockKind::Quote {
            text: rich(&payload.rich_text),
        },
        "callout" => BlockKind::Callout {
            text: rich(&payload.rich_text),
            emoji: payload.icon.as_ref().and_then(parse_icon).and_then(|icon| match icon {
                Icon::Emoji(e) => Some(e),
                _ => None,
            }),
        },
        "toggle" => BlockKind::Toggle {
            text: rich(&payload.rich_text),
        },
        "code" => BlockKind::Code {
            text: rich(&payload.rich_text),
            language: payload.language,
        },
        "equation" => BlockKind::Equation {
            expression: payload.expression,
        },
        "divider" => BlockKind::Divider,
        "image" => BlockKind::Image {
            url: file_url(&payload),
            caption: rich(&payload.caption),
        },
        "bookmark" | "embed" | "link_preview" | "video" | "pdf" | "file" => BlockKind::Bookmark {
            url: file_url(&payload),
            caption: rich(&payload.caption),
        },
        "child_page" | "child_database" => BlockKind::ChildPage {
            title: payload.title,
        },
        "table" => BlockKind::Table {
            has_column_header: payload.has_column_header,
        },
        "table_row" => BlockKind::TableRow {
            cells: payload.cells.iter().map(|cell| rich(cell)).collect(),
        },
        "column_list" => BlockKind::ColumnList,
        "column" => BlockKind::Column,
        _ => BlockKind::Unsupported {
            kind: kind.to_string(),
            text: join_plain(&payload.rich_text),
        },
    }
}

fn file_url(payload: &RawPayload) -> String {
    if !payload.url.is_empty() {
        return payload.url.clone();
    }
    payload
        .external
        .as_ref()
        .or(payload.file.as_ref())
        .map(|u| u.url.clone())
        .unwrap_or_default()
}

fn rich(spans: &[RawRichText]) -> Vec<RichText> {
    spans
        .iter()
        .map(|s| RichText {
            plain_text: s.plain_text.clone(),
            annotations: Annotations {
                bold: s.annotations.bold,
                italic: s.annotations.italic,
                strikethrough: s.annotations.strikethrough,
                underline: s.annotations.underline,
                code: s.annotations.code,
            },
            href: s.href.clone(),
        })
        .collect()
}

fn join_plain(spans: &[RawRichText]) -> String {
    spans.iter().map(|s| s.plain_text.as_str()).collect()
}

fn lenient<T: DeserializeOwned>(value: &Value) -> Option<T> {
    T::deserialize(value).ok()
}
