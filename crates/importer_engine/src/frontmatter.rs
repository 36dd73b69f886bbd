use std::fs;
use std::path::Path;

use importer_core::{FrontMatter, NormalizedDocument};

use crate::persist::{AtomicFileWriter, PersistError};
use crate::EntryError;

const DELIMITER: &str = "---";
const EMBEDDED_START: &str = "<!--frontmatter-->";
const EMBEDDED_END: &str = "<!--end-->";

#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    #[error("front matter yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("document does not start with a front matter block")]
    MissingBlock,
    #[error("embedded front matter is not a yaml mapping")]
    NotAMapping,
}

/// `---\n<yaml>---\n<body>\n`
pub fn render_document(doc: &NormalizedDocument) -> Result<String, FrontMatterError> {
    let yaml = serde_yaml::to_string(&doc.front_matter)?;
    Ok(with_header(&yaml, &doc.body))
}

fn with_header(yaml: &str, body: &str) -> String {
    let mut out = String::with_capacity(yaml.len() + body.len() + 16);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(yaml);
    if !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push('\n');
    let body = body.trim_end();
    if !body.is_empty() {
        out.push_str(body);
        out.push('\n');
    }
    out
}

/// Move a `<!--frontmatter-->yaml<!--end-->` block found anywhere in a
/// Markdown text into a leading `---` header. The remaining body is trimmed.
/// Returns `None` when the text carries no such block.
pub fn lift_embedded_front_matter(markdown: &str) -> Result<Option<String>, FrontMatterError> {
    let Some(start) = markdown.find(EMBEDDED_START) else {
        return Ok(None);
    };
    let yaml_start = start + EMBEDDED_START.len();
    let Some(yaml_len) = markdown[yaml_start..].find(EMBEDDED_END) else {
        return Ok(None);
    };
    let end = yaml_start + yaml_len + EMBEDDED_END.len();

    let fields = match serde_yaml::from_str(markdown[yaml_start..yaml_start + yaml_len].trim())? {
        serde_yaml::Value::Null => serde_yaml::Mapping::new(),
        serde_yaml::Value::Mapping(fields) => fields,
        _ => return Err(FrontMatterError::NotAMapping),
    };
    let yaml = serde_yaml::to_string(&fields)?;

    let body = format!("{}{}", &markdown[..start], &markdown[end..]);
    Ok(Some(with_header(&yaml, body.trim_start())))
}

/// Rewrite one Markdown file in place with its embedded front matter lifted.
/// Returns whether the file changed.
pub fn lift_front_matter_in_file(path: &Path) -> Result<bool, EntryError> {
    let content = fs::read_to_string(path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let Some(lifted) = lift_embedded_front_matter(&content)? else {
        return Ok(false);
    };

    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    AtomicFileWriter::new(dir.to_path_buf()).write(&filename, &lifted)?;
    Ok(true)
}

/// Split a rendered document back into its front matter and body.
pub fn parse_document(content: &str) -> Result<(FrontMatter, String), FrontMatterError> {
    let rest = content
        .strip_prefix("---\n")
        .ok_or(FrontMatterError::MissingBlock)?;

    let (yaml, body) = if let Some(idx) = rest.find("\n---\n") {
        (&rest[..idx + 1], &rest[idx + "\n---\n".len()..])
    } else if let Some(yaml) = rest.strip_suffix("\n---") {
        (yaml, "")
    } else {
        return Err(FrontMatterError::MissingBlock);
    };

    let front_matter: FrontMatter = serde_yaml::from_str(yaml)?;
    let body = body.strip_suffix('\n').unwrap_or(body);
    Ok((front_matter, body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_without_block_is_rejected() {
        assert!(matches!(
            parse_document("just text\n"),
            Err(FrontMatterError::MissingBlock)
        ));
        assert!(matches!(
            parse_document("---\ntitle: x\n"),
            Err(FrontMatterError::MissingBlock)
        ));
    }

    #[test]
    fn embedded_block_moves_to_header() {
        let markdown =
            "<!--frontmatter-->\ntitle: Hello\ntags:\n  - a\n  - b\n<!--end-->\n\n# Post\n\nbody\n";
        let lifted = lift_embedded_front_matter(markdown).unwrap().unwrap();
        assert_eq!(
            lifted,
            "---\ntitle: Hello\ntags:\n- a\n- b\n---\n# Post\n\nbody\n"
        );
    }

    #[test]
    fn text_without_markers_is_left_alone() {
        assert!(lift_embedded_front_matter("# Post\n\nbody\n")
            .unwrap()
            .is_none());
        assert!(lift_embedded_front_matter("<!--frontmatter-->\ntitle: x\n")
            .unwrap()
            .is_none());
    }

    #[test]
    fn embedded_scalar_is_rejected() {
        assert!(matches!(
            lift_embedded_front_matter("<!--frontmatter-->just words<!--end-->"),
            Err(FrontMatterError::NotAMapping)
        ));
    }

    #[test]
    fn empty_body_renders_block_only() {
        let doc = NormalizedDocument {
            front_matter: FrontMatter {
                title: "t".into(),
                ..FrontMatter::default()
            },
            body: "  \n".into(),
            filename: "t.md".into(),
        };
        let rendered = render_document(&doc).unwrap();
        assert!(rendered.ends_with("---\n"));
        let (fm, body) = parse_document(&rendered).unwrap();
        assert_eq!(fm, doc.front_matter);
        assert_eq!(body, "");
    }
}
