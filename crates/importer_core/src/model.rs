use serde::{Deserialize, Serialize};

pub type EntryId = String;

/// One database row as fetched from the content source. Read-only to the importer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub id: EntryId,
    pub created_time: String,
    pub properties: EntryProperties,
    pub icon: Option<Icon>,
    pub blocks: Vec<Block>,
}

/// A property that may be missing, empty or of an unexpected shape at the source.
/// Every shape the importer cannot use collapses into `Absent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue<T> {
    Present(T),
    Absent,
}

impl<T> Default for PropertyValue<T> {
    fn default() -> Self {
        PropertyValue::Absent
    }
}

impl<T> PropertyValue<T> {
    pub fn as_present(&self) -> Option<&T> {
        match self {
            PropertyValue::Present(value) => Some(value),
            PropertyValue::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, PropertyValue::Absent)
    }
}

impl<T> From<Option<T>> for PropertyValue<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => PropertyValue::Present(v),
            None => PropertyValue::Absent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryProperties {
    pub title: PropertyValue<String>,
    pub date: PropertyValue<DateRange>,
    pub tags: PropertyValue<Vec<TagRef>>,
    pub series: PropertyValue<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icon {
    Emoji(String),
    External(String),
    File(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RichText {
    pub plain_text: String,
    pub annotations: Annotations,
    pub href: Option<String>,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
            ..Self::default()
        }
    }
}

/// Concatenated plain text of a rich text run, annotations dropped.
pub fn plain_text(spans: &[RichText]) -> String {
    spans.iter().map(|s| s.plain_text.as_str()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: String,
    pub kind: BlockKind,
    pub children: Vec<Block>,
}

impl Block {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph { text: Vec<RichText> },
    Heading { level: u8, text: Vec<RichText> },
    BulletedListItem { text: Vec<RichText> },
    NumberedListItem { text: Vec<RichText> },
    ToDo { text: Vec<RichText>, checked: bool },
    Quote { text: Vec<RichText> },
    Callout { text: Vec<RichText>, emoji: Option<String> },
    Toggle { text: Vec<RichText> },
    Code { text: Vec<RichText>, language: String },
    Equation { expression: String },
    Divider,
    Image { url: String, caption: Vec<RichText> },
    Bookmark { url: String, caption: Vec<RichText> },
    ChildPage { title: String },
    Table { has_column_header: bool },
    TableRow { cells: Vec<Vec<RichText>> },
    ColumnList,
    Column,
    /// A block type the importer has no rendering for. `text` is whatever
    /// plain text could be recovered from its payload.
    Unsupported { kind: String, text: String },
}

/// The fixed-shape metadata header of every written document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrontMatter {
    pub title: String,
    pub date: String,
    pub tags: Vec<String>,
    pub series: String,
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    pub front_matter: FrontMatter,
    pub body: String,
    pub filename: String,
}
