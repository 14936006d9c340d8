//! Source excerpts attached to bundle nodes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Line cap for header excerpts.
pub const HEADER_MAX_LINES: usize = 40;

/// How much source text a bundle node carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeInclusion {
    None,
    #[default]
    Header,
    Full,
}

impl CodeInclusion {
    pub fn as_str(self) -> &'static str {
        match self {
            CodeInclusion::None => "none",
            CodeInclusion::Header => "header",
            CodeInclusion::Full => "full",
        }
    }

    /// The excerpt of `text` for this mode, before sanitization.
    pub fn excerpt(self, text: &str, is_sfc: bool) -> Option<String> {
        match self {
            CodeInclusion::None => None,
            CodeInclusion::Header => Some(header(text, is_sfc)),
            CodeInclusion::Full => Some(text.to_string()),
        }
    }
}

impl FromStr for CodeInclusion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(CodeInclusion::None),
            "header" => Ok(CodeInclusion::Header),
            "full" => Ok(CodeInclusion::Full),
            other => Err(format!("unknown code mode '{other}', expected none, header or full")),
        }
    }
}

/// The file prologue: leading comments, directives and import statements.
///
/// For single-file components the prologue of the first script block is used.
pub fn header(text: &str, is_sfc: bool) -> String {
    let body = if is_sfc { script_body(text) } else { text };

    let mut kept: Vec<&str> = Vec::new();
    let mut in_block_comment = false;
    let mut in_import = false;

    for line in body.lines().take(HEADER_MAX_LINES) {
        let trimmed = line.trim();
        if in_block_comment {
            kept.push(line);
            in_block_comment = !trimmed.contains("*/");
            continue;
        }
        if in_import {
            kept.push(line);
            in_import = !import_complete(trimmed);
            continue;
        }
        if trimmed.is_empty() || trimmed.starts_with("//") {
            kept.push(line);
            continue;
        }
        if trimmed.starts_with("/*") {
            kept.push(line);
            in_block_comment = !trimmed.contains("*/");
            continue;
        }
        if is_import_start(trimmed) {
            kept.push(line);
            in_import = !import_complete(trimmed);
            continue;
        }
        if is_directive(trimmed) {
            kept.push(line);
            continue;
        }
        break;
    }

    while kept.last().is_some_and(|l| l.trim().is_empty()) {
        kept.pop();
    }
    kept.join("\n")
}

fn script_body(text: &str) -> &str {
    let Some(start) = text.find("<script") else {
        return "";
    };
    let rest = &text[start..];
    let Some(tag_end) = rest.find('>') else {
        return "";
    };
    let body = &rest[tag_end + 1..];
    let end = body.find("</script>").unwrap_or(body.len());
    body[..end].trim_start_matches(['\r', '\n'])
}

fn is_import_start(line: &str) -> bool {
    line.starts_with("import ")
        || line.starts_with("import{")
        || line.starts_with("import\"")
        || line.starts_with("import'")
        || line == "import"
}

fn import_complete(line: &str) -> bool {
    line.ends_with(';')
        || line.contains(" from ")
        || line.contains("from'")
        || line.contains("from\"")
        || line.starts_with("import '")
        || line.starts_with("import \"")
}

fn is_directive(line: &str) -> bool {
    let unterminated = line.trim_end_matches(';');
    (unterminated.starts_with('\'') && unterminated.ends_with('\''))
        || (unterminated.starts_with('"') && unterminated.ends_with('"'))
}
