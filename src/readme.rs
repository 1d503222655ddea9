//! README Updater
//!
//! Splices the hero image reference into README text. Pure and idempotent:
//! running it on its own output changes nothing.
//!
//! Resolution order:
//! 1. An existing reference to `<stem>.<image ext>` near the top is replaced in place
//! 2. Otherwise the reference goes right after the first heading
//! 3. A document without a heading gets it prepended

use std::path::Path;

use regex::Regex;
use tokio::fs;

use crate::constants::readme::{ALT_TEXT, MARKER_SEARCH_LINES};
use crate::types::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadmeOutcome {
    Unchanged,
    Replaced,
    InsertedAfterHeading,
    /// No heading to anchor on; the reference became the first line
    Prepended,
}

impl std::fmt::Display for ReadmeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::Replaced => write!(f, "replaced existing reference"),
            Self::InsertedAfterHeading => write!(f, "inserted after heading"),
            Self::Prepended => write!(f, "prepended"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadmeUpdate {
    pub text: String,
    pub outcome: ReadmeOutcome,
}

/// Markdown image line for `reference`
pub fn image_markdown(reference: &str) -> String {
    format!("![{}]({})", ALT_TEXT, reference)
}

/// Matches `![alt](any/path/<stem>.<ext> "optional title")`
fn marker_regex(stem: &str) -> Option<Regex> {
    Regex::new(&format!(
        r#"!\[[^\]]*\]\(\s*<?[^)\s]*?\b{}\.(?:png|jpe?g|webp|svg|gif)>?(?:\s+"[^"]*")?\s*\)"#,
        regex::escape(stem)
    ))
    .ok()
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

fn is_atx_heading(line: &str) -> bool {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return false;
    }
    let rest = &line[indent..];
    let hashes = rest.chars().take_while(|c| *c == '#').count();
    (1..=6).contains(&hashes)
        && rest[hashes..]
            .chars()
            .next()
            .is_none_or(|c| c == ' ' || c == '\t')
}

/// Splice `reference` (a relative image path) into `existing`.
pub fn update(existing: &str, reference: &str) -> ReadmeUpdate {
    let new_image = image_markdown(reference);
    let eol = if existing.contains("\r\n") { "\r\n" } else { "\n" };
    let trailing_newline = existing.is_empty() || existing.ends_with('\n');

    let body = existing.strip_suffix('\n').unwrap_or(existing);
    let body = body.strip_suffix('\r').unwrap_or(body);
    let mut lines: Vec<String> = if existing.is_empty() {
        Vec::new()
    } else {
        body.split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect()
    };

    // Outside-fence flags, and the first heading outside a fence
    let mut outside = Vec::with_capacity(lines.len());
    let mut in_fence = false;
    let mut heading = None;
    for (idx, line) in lines.iter().enumerate() {
        if is_fence(line) {
            in_fence = !in_fence;
            outside.push(false);
            continue;
        }
        outside.push(!in_fence);
        if !in_fence && heading.is_none() && is_atx_heading(line) {
            heading = Some(idx);
        }
    }

    // Also covers a reference this function inserted after a late heading
    let window = heading.map_or(MARKER_SEARCH_LINES, |h| MARKER_SEARCH_LINES.max(h + 3));

    let stem = Path::new(reference)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(reference);
    let marker = marker_regex(stem);

    let mut outcome = None;
    if let Some(marker) = &marker {
        for idx in 0..lines.len().min(window) {
            if !outside[idx] {
                continue;
            }
            if let Some(found) = marker.find(&lines[idx]) {
                let replaced = format!(
                    "{}{}{}",
                    &lines[idx][..found.start()],
                    new_image,
                    &lines[idx][found.end()..]
                );
                outcome = Some(if replaced == lines[idx] {
                    ReadmeOutcome::Unchanged
                } else {
                    lines[idx] = replaced;
                    ReadmeOutcome::Replaced
                });
                break;
            }
        }
    }

    let outcome = match (outcome, heading) {
        (Some(outcome), _) => outcome,
        (None, Some(h)) => {
            let mut insert = vec![String::new(), new_image];
            let next_is_blank = lines.get(h + 1).is_some_and(|l| l.trim().is_empty());
            if !next_is_blank && h + 1 < lines.len() {
                insert.push(String::new());
            }
            lines.splice(h + 1..h + 1, insert);
            ReadmeOutcome::InsertedAfterHeading
        }
        (None, None) => {
            let mut insert = vec![new_image];
            if !lines.is_empty() {
                insert.push(String::new());
            }
            lines.splice(0..0, insert);
            ReadmeOutcome::Prepended
        }
    };

    if outcome == ReadmeOutcome::Unchanged {
        return ReadmeUpdate {
            text: existing.to_string(),
            outcome,
        };
    }

    let mut text = lines.join(eol);
    if trailing_newline {
        text.push_str(eol);
    }
    ReadmeUpdate { text, outcome }
}

/// README content, or empty text when the file does not exist yet
pub async fn read_readme(path: &Path) -> Result<String> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const REF: &str = "assets/architecture_diagram.png";

    #[test]
    fn test_insert_after_heading() {
        let update = update("# My Project\nSome intro.\n", REF);
        assert_eq!(update.outcome, ReadmeOutcome::InsertedAfterHeading);
        assert_eq!(
            update.text,
            "# My Project\n\n![Architecture](assets/architecture_diagram.png)\n\nSome intro.\n"
        );
    }

    #[test]
    fn test_existing_blank_after_heading_reused() {
        let update = update("# Title\n\nBody\n", REF);
        assert_eq!(
            update.text,
            "# Title\n\n![Architecture](assets/architecture_diagram.png)\n\nBody\n"
        );
    }

    #[test]
    fn test_replace_other_extension_in_place() {
        let text = "# Title\n\nIntro ![Diagram](./docs/architecture_diagram.svg \"old\") here\n";
        let update = update(text, REF);
        assert_eq!(update.outcome, ReadmeOutcome::Replaced);
        assert_eq!(
            update.text,
            "# Title\n\nIntro ![Architecture](assets/architecture_diagram.png) here\n"
        );
    }

    #[test]
    fn test_unrelated_images_untouched() {
        let text = "# Title\n![logo](assets/logo.png)\n![x](assets/my_architecture_diagram.png)\n";
        let update = update(text, REF);
        assert_eq!(update.outcome, ReadmeOutcome::InsertedAfterHeading);
        assert!(update.text.contains("![logo](assets/logo.png)"));
        assert!(update.text.contains("my_architecture_diagram.png"));
    }

    #[test]
    fn test_heading_inside_fence_ignored() {
        let text = "```\n# not a heading\n```\nplain text\n";
        let update = update(text, REF);
        assert_eq!(update.outcome, ReadmeOutcome::Prepended);
        assert!(update.text.starts_with("![Architecture]"));
    }

    #[test]
    fn test_reference_inside_fence_not_replaced() {
        let text = "# T\n```md\n![a](architecture_diagram.png)\n```\n";
        let update = update(text, REF);
        assert_eq!(update.outcome, ReadmeOutcome::InsertedAfterHeading);
        assert!(update.text.contains("![a](architecture_diagram.png)"));
    }

    #[test]
    fn test_empty_document() {
        let update = update("", REF);
        assert_eq!(update.outcome, ReadmeOutcome::Prepended);
        assert_eq!(update.text, "![Architecture](assets/architecture_diagram.png)\n");
    }

    #[test]
    fn test_crlf_and_missing_trailing_newline_preserved() {
        let update = update("# T\r\nbody", REF);
        assert_eq!(
            update.text,
            "# T\r\n\r\n![Architecture](assets/architecture_diagram.png)\r\n\r\nbody"
        );
    }

    #[test]
    fn test_hashtag_is_not_heading() {
        assert!(!is_atx_heading("#hashtag"));
        assert!(is_atx_heading("## Usage"));
        assert!(is_atx_heading("#"));
        assert!(!is_atx_heading("    # indented code"));
    }

    #[tokio::test]
    async fn test_read_missing_readme_is_empty() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let text = read_readme(&temp_dir.path().join("README.md")).await.unwrap();
        assert!(text.is_empty());
    }

    fn arb_document() -> impl Strategy<Value = String> {
        let line = proptest::sample::select(vec![
            "# Title",
            "## Section",
            "plain text",
            "",
            "```",
            "![Architecture](assets/architecture_diagram.svg)",
            "![logo](logo.png)",
            "    indented",
            "#tag",
        ]);
        (
            proptest::collection::vec(line, 0..60),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(lines, crlf, trailing)| {
                let eol = if crlf { "\r\n" } else { "\n" };
                let mut text = lines.join(eol);
                if trailing && !text.is_empty() {
                    text.push_str(eol);
                }
                text
            })
    }

    proptest! {
        #[test]
        fn prop_update_is_idempotent(doc in arb_document()) {
            let once = update(&doc, REF);
            let twice = update(&once.text, REF);
            prop_assert_eq!(&twice.text, &once.text);
            prop_assert_eq!(twice.outcome, ReadmeOutcome::Unchanged);
            prop_assert!(once.text.contains(&image_markdown(REF)));
        }
    }
}
