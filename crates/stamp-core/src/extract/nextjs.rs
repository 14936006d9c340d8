//! App-router annotations: directives, route roles and segment paths.

use crate::entry_id::EntryId;
use crate::model::{FrameworkMeta, MetadataExport, RouteRole};

/// Number of meaningful lines inspected for a directive.
const DIRECTIVE_WINDOW: usize = 5;

const DIRECTIVES: &[&str] = &["use client", "use server"];

/// Meta-framework annotations, or `None` outside an `app/` routing tree.
pub(crate) fn framework_meta(
    entry_id: &EntryId,
    source: &str,
    metadata: Option<MetadataExport>,
) -> Option<FrameworkMeta> {
    let route_segments = app_route_segments(entry_id)?;
    Some(FrameworkMeta {
        directive: directive(source),
        route_role: RouteRole::from_stem(entry_id.file_stem()),
        segment_path: segment_path(&route_segments),
        metadata,
    })
}

/// Folder segments below `app/` or `src/app/`.
fn app_route_segments(entry_id: &EntryId) -> Option<Vec<&str>> {
    let segments: Vec<&str> = entry_id.dir_segments().collect();
    let skip = match segments.as_slice() {
        ["app", ..] => 1,
        ["src", "app", ..] => 2,
        _ => return None,
    };
    Some(segments[skip..].to_vec())
}

fn segment_path(segments: &[&str]) -> String {
    let kept: Vec<&str> = segments
        .iter()
        .copied()
        .filter(|s| !(s.starts_with('(') && s.ends_with(')')))
        .collect();
    format!("/{}", kept.join("/"))
}

/// A `'use client'` / `'use server'` prologue directive.
///
/// Other string directives are skipped; the first real statement ends the scan.
pub(crate) fn directive(source: &str) -> Option<String> {
    let mut in_block_comment = false;
    let mut inspected = 0;

    for line in source.lines() {
        let mut text = line.trim();
        if in_block_comment {
            match text.find("*/") {
                Some(end) => {
                    in_block_comment = false;
                    text = text[end + 2..].trim();
                }
                None => continue,
            }
        }
        if let Some(rest) = text.strip_prefix("/*") {
            match rest.find("*/") {
                Some(end) => text = rest[end + 2..].trim(),
                None => {
                    in_block_comment = true;
                    continue;
                }
            }
        }
        if text.is_empty() || text.starts_with("//") {
            continue;
        }

        inspected += 1;
        if inspected > DIRECTIVE_WINDOW {
            return None;
        }
        let value = string_statement(text)?;
        if DIRECTIVES.contains(&value) {
            return Some(value.to_string());
        }
    }
    None
}

/// The literal of a bare string statement such as `'use client';`.
fn string_statement(text: &str) -> Option<&str> {
    let quote = text.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let rest = &text[1..];
    let end = rest.find(quote)?;
    let tail = rest[end + 1..].trim();
    (tail.is_empty() || tail == ";").then(|| &rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(path: &str) -> EntryId {
        EntryId::new(path).unwrap()
    }

    #[test]
    fn only_inside_app_directories() {
        assert!(framework_meta(&id("src/components/Button.tsx"), "", None).is_none());
        assert!(framework_meta(&id("lib/app/page.tsx"), "", None).is_none());
        assert!(framework_meta(&id("app/page.tsx"), "", None).is_some());
        assert!(framework_meta(&id("src/app/page.tsx"), "", None).is_some());
    }

    #[test]
    fn segment_paths_drop_route_groups() {
        let meta = framework_meta(&id("app/(marketing)/blog/[slug]/page.tsx"), "", None).unwrap();
        assert_eq!(meta.segment_path, "/blog/[slug]");
        assert_eq!(meta.route_role, Some(RouteRole::Page));

        let meta = framework_meta(&id("src/app/layout.tsx"), "", None).unwrap();
        assert_eq!(meta.segment_path, "/");
        assert_eq!(meta.route_role, Some(RouteRole::Layout));

        let meta = framework_meta(&id("app/dashboard/widgets.tsx"), "", None).unwrap();
        assert_eq!(meta.route_role, None);
    }

    #[test]
    fn directive_after_comments() {
        let source = "// Copyright\n/* multi\n line */\n\n'use client';\nimport x from 'x';";
        assert_eq!(directive(source), Some("use client".to_string()));
    }

    #[test]
    fn directive_must_precede_statements() {
        assert_eq!(directive("import x from 'x';\n\"use client\";"), None);
        assert_eq!(directive("'use strict';\n\"use server\""), Some("use server".to_string()));
        assert_eq!(directive("'use cache';"), None);
    }

    #[test]
    fn directive_window_is_bounded() {
        let source = "'a';\n'b';\n'c';\n'd';\n'e';\n'use client';";
        assert_eq!(directive(source), None);
    }
}
