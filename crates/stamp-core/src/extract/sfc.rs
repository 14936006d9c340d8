//! Single File Component (`.vue`) block extraction.
//!
//! Pulls `<script>` / `<script setup>` blocks out of an SFC so they can be
//! parsed as TypeScript, and locates the `<template>` block so markup usage
//! can be detected without an HTML parser.

use memchr::memmem;
use thiserror::Error;

/// Maximum file size in bytes (10 MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Maximum number of script tags to process
pub const MAX_SCRIPT_TAGS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptContext {
    /// `<script setup>` (compile-time macros such as `defineProps`)
    Setup,
    /// Plain `<script>` (options object or shared module code)
    Regular,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBlock<'a> {
    pub source_text: &'a str,
    /// Byte offset of `source_text` in the original file.
    pub source_offset: usize,
    pub context: ScriptContext,
    /// Language attribute (`js`, `ts`, `tsx`, `jsx`).
    pub lang: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SfcBlocks<'a> {
    pub scripts: Vec<ScriptBlock<'a>>,
    pub template: Option<&'a str>,
}

impl<'a> SfcBlocks<'a> {
    /// Script blocks joined into one module, setup block last.
    pub fn combined_script(&self) -> String {
        let mut ordered: Vec<&ScriptBlock<'a>> = self.scripts.iter().collect();
        ordered.sort_by_key(|s| s.context == ScriptContext::Setup);
        ordered
            .iter()
            .map(|s| s.source_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_typescript(&self) -> bool {
        self.scripts.iter().any(|s| s.lang.starts_with("ts"))
    }

    pub fn has_setup(&self) -> bool {
        self.scripts.iter().any(|s| s.context == ScriptContext::Setup)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SfcError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Too many script tags: {count} found (max: {max} allowed)")]
    TooManyScriptTags { count: usize, max: usize },

    #[error("Unclosed {tag} tag starting at byte position {position}")]
    UnclosedTag { tag: &'static str, position: usize },
}

/// Extract script and template blocks from an SFC.
pub fn extract_blocks(source: &str) -> Result<SfcBlocks<'_>, SfcError> {
    if source.len() > MAX_FILE_SIZE {
        return Err(SfcError::FileTooLarge {
            size: source.len(),
            max: MAX_FILE_SIZE,
        });
    }

    let mut scripts = Vec::new();
    let mut pointer = 0;

    while let Some(script) = parse_script(source, &mut pointer)? {
        scripts.push(script);
        if scripts.len() > MAX_SCRIPT_TAGS {
            return Err(SfcError::TooManyScriptTags {
                count: scripts.len(),
                max: MAX_SCRIPT_TAGS,
            });
        }
    }

    Ok(SfcBlocks {
        scripts,
        template: find_template(source)?,
    })
}

fn parse_script<'a>(
    source: &'a str,
    pointer: &mut usize,
) -> Result<Option<ScriptBlock<'a>>, SfcError> {
    let bytes = source.as_bytes();

    loop {
        let Some(script_start) = find_from(bytes, *pointer, b"<script") else {
            return Ok(None);
        };
        *pointer = script_start + "<script".len();

        // `<scripts>` or `<scripting>` are not script tags
        if let Some(&next) = bytes.get(*pointer) {
            if !matches!(next, b' ' | b'\t' | b'\n' | b'\r' | b'>' | b'/') {
                continue;
            }
        }

        let tag_end = find_closing_angle(bytes, *pointer).ok_or(SfcError::UnclosedTag {
            tag: "<script>",
            position: script_start,
        })?;
        let attributes = &source[*pointer..tag_end];
        let context = if attributes.contains("setup") {
            ScriptContext::Setup
        } else {
            ScriptContext::Regular
        };
        let lang = lang_attribute(attributes);

        if tag_end > 0 && bytes[tag_end - 1] == b'/' {
            *pointer = tag_end + 1;
            return Ok(Some(ScriptBlock {
                source_text: "",
                source_offset: tag_end + 1,
                context,
                lang,
            }));
        }

        let content_start = tag_end + 1;
        let script_end = find_from(bytes, content_start, b"</script>").ok_or(
            SfcError::UnclosedTag {
                tag: "<script>",
                position: script_start,
            },
        )?;
        *pointer = script_end + "</script>".len();

        return Ok(Some(ScriptBlock {
            source_text: &source[content_start..script_end],
            source_offset: content_start,
            context,
            lang,
        }));
    }
}

/// Locate the outermost `<template>` block.
///
/// Nested `<template>` tags (slots, `v-if` groups) are balanced by counting.
fn find_template(source: &str) -> Result<Option<&str>, SfcError> {
    let bytes = source.as_bytes();
    let Some(start) = find_from(bytes, 0, b"<template") else {
        return Ok(None);
    };
    let open_end = find_closing_angle(bytes, start + "<template".len()).ok_or(
        SfcError::UnclosedTag {
            tag: "<template>",
            position: start,
        },
    )?;
    let content_start = open_end + 1;

    let mut depth = 1usize;
    let mut cursor = content_start;
    while depth > 0 {
        let next_open = find_from(bytes, cursor, b"<template");
        let next_close = find_from(bytes, cursor, b"</template>").ok_or(
            SfcError::UnclosedTag {
                tag: "<template>",
                position: start,
            },
        )?;
        match next_open {
            Some(open) if open < next_close => {
                depth += 1;
                cursor = open + "<template".len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some(&source[content_start..next_close]));
                }
                cursor = next_close + "</template>".len();
            }
        }
    }
    Ok(None)
}

fn find_from(bytes: &[u8], start: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(start..)
        .and_then(|slice| memmem::find(slice, needle))
        .map(|pos| start + pos)
}

/// Finds the closing `>` of a tag, skipping quoted attribute values.
fn find_closing_angle(bytes: &[u8], start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, &byte) in bytes.get(start..)?.iter().enumerate() {
        match (byte, quote) {
            (b'"' | b'\'', None) => quote = Some(byte),
            (b, Some(q)) if b == q => quote = None,
            (b'>', None) => return Some(start + i),
            _ => {}
        }
    }
    None
}

fn lang_attribute(attributes: &str) -> &str {
    let Some(pos) = attributes.find("lang=") else {
        return "js";
    };
    let value = attributes[pos + "lang=".len()..].trim_start();
    match value.chars().next() {
        Some(quote @ ('"' | '\'')) => value[1..]
            .find(quote)
            .map(|end| &value[1..=end])
            .unwrap_or("js"),
        Some(_) => {
            let end = value
                .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
                .unwrap_or(value.len());
            &value[..end]
        }
        None => "js",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_script_and_template() {
        let vue = r#"
<template><div><Card /></div></template>
<script>
export default { name: 'Test' }
</script>
"#;
        let blocks = extract_blocks(vue).unwrap();
        assert_eq!(blocks.scripts.len(), 1);
        assert_eq!(blocks.scripts[0].context, ScriptContext::Regular);
        assert_eq!(blocks.scripts[0].lang, "js");
        assert!(blocks.scripts[0].source_text.contains("export default"));
        assert_eq!(blocks.template, Some("<div><Card /></div>"));
    }

    #[test]
    fn setup_script_with_lang() {
        let vue = "<script setup lang=\"ts\">\nconst count = ref<number>(0)\n</script>";
        let blocks = extract_blocks(vue).unwrap();
        assert_eq!(blocks.scripts[0].context, ScriptContext::Setup);
        assert_eq!(blocks.scripts[0].lang, "ts");
        assert!(blocks.is_typescript());
        assert!(blocks.has_setup());
        assert!(blocks.template.is_none());
    }

    #[test]
    fn combined_script_puts_setup_last() {
        let vue = "<script setup>const a = 1</script>\n<script>export const b = 2</script>";
        let blocks = extract_blocks(vue).unwrap();
        assert_eq!(blocks.combined_script(), "export const b = 2\nconst a = 1");
    }

    #[test]
    fn nested_templates_are_balanced() {
        let vue = "<template><ul><template v-if=\"x\"><li/></template></ul></template><script></script>";
        let blocks = extract_blocks(vue).unwrap();
        assert_eq!(
            blocks.template,
            Some("<ul><template v-if=\"x\"><li/></template></ul>")
        );
    }

    #[test]
    fn ignores_lookalike_tags() {
        let vue = "<template><scripts-list/></template>";
        let blocks = extract_blocks(vue).unwrap();
        assert!(blocks.scripts.is_empty());
    }

    #[test]
    fn unclosed_script_is_an_error() {
        let err = extract_blocks("<script>const a = 1").unwrap_err();
        assert!(matches!(err, SfcError::UnclosedTag { tag: "<script>", .. }));
    }
}
