/// Deterministic output filename for a document title: `{normalized_title}.md`.
pub fn document_filename(title: &str) -> String {
    format!("{}.md", normalize_title(title))
}

/// Lowercase the title and replace every whitespace run with a single hyphen.
///
/// Path separators and control characters also become hyphens so a title can
/// never escape the output directory. Applying this to its own output is a no-op.
pub fn normalize_title(title: &str) -> String {
    let mut normalized = String::with_capacity(title.len());
    let mut in_whitespace = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                normalized.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if is_forbidden(c) {
            normalized.push('-');
        } else {
            normalized.extend(c.to_lowercase());
        }
    }
    normalized
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '/' | '\\' | '\0'..='\u{1F}')
}
