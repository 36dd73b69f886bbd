use importer_core::{plain_text, Block, BlockKind, RichText};
use importer_logging::importer_debug;

const INDENT: &str = "    ";

pub trait Converter: Send + Sync {
    fn to_markdown(&self, blocks: &[Block]) -> String;
}

/// Renders a block tree as Markdown, depth first with siblings in source order.
///
/// Block types without a Markdown form fall back to their raw text, or are
/// dropped when they carry none. Conversion itself cannot fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownConverter;

impl Converter for MarkdownConverter {
    fn to_markdown(&self, blocks: &[Block]) -> String {
        render_siblings(blocks).trim().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListFamily {
    Bullet,
    Ordered,
}

fn list_family(kind: &BlockKind) -> Option<ListFamily> {
    match kind {
        BlockKind::BulletedListItem { .. } | BlockKind::ToDo { .. } => Some(ListFamily::Bullet),
        BlockKind::NumberedListItem { .. } => Some(ListFamily::Ordered),
        _ => None,
    }
}

fn render_siblings(blocks: &[Block]) -> String {
    let mut out = String::new();
    let mut prev_family: Option<ListFamily> = None;
    let mut ordinal = 0usize;

    for block in blocks {
        let family = list_family(&block.kind);
        let next = if family == Some(ListFamily::Ordered) && prev_family == Some(ListFamily::Ordered)
        {
            ordinal + 1
        } else {
            1
        };

        // Skipped blocks leave the running list untouched.
        let Some(rendered) = render_block(block, next) else {
            continue;
        };
        ordinal = next;

        if !out.is_empty() {
            if family.is_some() && family == prev_family {
                out.push('\n');
            } else {
                out.push_str("\n\n");
            }
        }
        out.push_str(&rendered);
        prev_family = family;
    }
    out
}

fn render_block(block: &Block, ordinal: usize) -> Option<String> {
    let rendered = match &block.kind {
        BlockKind::Paragraph { text } => {
            let text = render_rich_text(text);
            if text.is_empty() && block.children.is_empty() {
                return None;
            }
            with_children_after(text, &block.children)
        }
        BlockKind::Heading { level, text } => {
            let marker = "#".repeat(usize::from((*level).clamp(1, 3)));
            with_children_after(
                format!("{marker} {}", render_rich_text(text)),
                &block.children,
            )
        }
        BlockKind::BulletedListItem { text } => {
            list_item(format!("- {}", render_rich_text(text)), &block.children)
        }
        BlockKind::NumberedListItem { text } => list_item(
            format!("{ordinal}. {}", render_rich_text(text)),
            &block.children,
        ),
        BlockKind::ToDo { text, checked } => {
            let mark = if *checked { "x" } else { " " };
            list_item(
                format!("- [{mark}] {}", render_rich_text(text)),
                &block.children,
            )
        }
        BlockKind::Quote { text } => quoted(render_rich_text(text), &block.children),
        BlockKind::Callout { text, emoji } => {
            let text = render_rich_text(text);
            let head = match emoji {
                Some(e) => format!("{e} {text}"),
                None => text,
            };
            quoted(head, &block.children)
        }
        BlockKind::Toggle { text } => {
            let summary = format!("<details>\n<summary>{}</summary>", render_rich_text(text));
            let inner = render_siblings(&block.children);
            if inner.is_empty() {
                format!("{summary}\n</details>")
            } else {
                format!("{summary}\n\n{inner}\n</details>")
            }
        }
        BlockKind::Code { text, language } => {
            let language = match language.as_str() {
                "plain text" => "text",
                other => other,
            };
            format!("```{language}\n{}\n```", plain_text(text))
        }
        BlockKind::Equation { expression } => format!("$$\n{expression}\n$$"),
        BlockKind::Divider => "---".to_string(),
        BlockKind::Image { url, caption } => {
            format!("![{}]({url})", plain_text(caption))
        }
        BlockKind::Bookmark { url, caption } => {
            let label = plain_text(caption);
            let label = if label.trim().is_empty() { url.clone() } else { label };
            format!("[{label}]({url})")
        }
        BlockKind::ChildPage { title } => format!("**{title}**"),
        BlockKind::Table { .. } => render_table(&block.children)?,
        BlockKind::TableRow { cells } => table_row(cells),
        BlockKind::ColumnList | BlockKind::Column => {
            let inner = render_siblings(&block.children);
            if inner.is_empty() {
                return None;
            }
            inner
        }
        BlockKind::Unsupported { kind, text } => {
            importer_debug!("no markdown form for block {} of type {}", block.id, kind);
            let rendered = with_children_after(text.trim().to_string(), &block.children);
            if rendered.is_empty() {
                return None;
            }
            rendered
        }
    };
    Some(rendered)
}

fn with_children_after(head: String, children: &[Block]) -> String {
    let inner = render_siblings(children);
    if inner.is_empty() {
        head
    } else if head.is_empty() {
        inner
    } else {
        format!("{head}\n\n{inner}")
    }
}

fn list_item(head: String, children: &[Block]) -> String {
    let inner = render_siblings(children);
    if inner.is_empty() {
        head
    } else {
        format!("{head}\n{}", indent(&inner))
    }
}

fn quoted(head: String, children: &[Block]) -> String {
    let inner = render_siblings(children);
    let body = if inner.is_empty() {
        head
    } else {
        format!("{head}\n{inner}")
    };
    body.lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{INDENT}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pipe table; the first row always serves as the header row.
fn render_table(rows: &[Block]) -> Option<String> {
    let rows: Vec<&Vec<Vec<RichText>>> = rows
        .iter()
        .filter_map(|row| match &row.kind {
            BlockKind::TableRow { cells } => Some(cells),
            _ => None,
        })
        .collect();
    let (header, body) = rows.split_first()?;

    let mut lines = vec![table_row(header)];
    lines.push(format!("|{}", " --- |".repeat(header.len().max(1))));
    lines.extend(body.iter().map(|cells| table_row(cells)));
    Some(lines.join("\n"))
}

fn table_row(cells: &[Vec<RichText>]) -> String {
    let cells: Vec<String> = cells
        .iter()
        .map(|cell| {
            render_rich_text(cell)
                .replace('|', "\\|")
                .replace('\n', "<br>")
        })
        .collect();
    format!("| {} |", cells.join(" | "))
}

pub(crate) fn render_rich_text(spans: &[RichText]) -> String {
    spans.iter().map(render_span).collect()
}

fn render_span(span: &RichText) -> String {
    let text = span.plain_text.as_str();
    let core = text.trim();
    if core.is_empty() {
        return text.to_string();
    }
    let lead = &text[..text.len() - text.trim_start().len()];
    let trail = &text[text.trim_end().len()..];

    let a = &span.annotations;
    let mut out = core.to_string();
    if a.code {
        out = format!("`{out}`");
    }
    if a.strikethrough {
        out = format!("~~{out}~~");
    }
    if a.italic {
        out = format!("_{out}_");
    }
    if a.bold {
        out = format!("**{out}**");
    }
    if let Some(href) = &span.href {
        out = format!("[{out}]({href})");
    }
    format!("{lead}{out}{trail}")
}
