//! Source extraction: file text to [`SourceFact`].
//!
//! Extraction is a pure function of the entry id and the file text. Parsing
//! uses oxc; `.vue` files have their script blocks pulled out first. The
//! result carries a [`Kind`] assigned by the ordered rules in [`classify`].

pub mod classify;
mod interface;
mod module;
mod nextjs;
pub mod sfc;
mod visitor;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use oxc_allocator::Allocator;
use oxc_parser::{Parser, ParserReturn};
use oxc_span::SourceType;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::entry_id::EntryId;
use crate::error::{Result, StampError};
use crate::model::{
    ApiSignature, EmitSpec, Exports, FrameworkMeta, Kind, PropSpec,
};

pub use classify::{Rule, Signals, classify};
pub use interface::normalize_type_text;

use interface::InterfaceFacts;
use module::{FunctionRef, ModuleScan};
use visitor::{BodyFacts, FactVisitor};

static TEMPLATE_TAG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<([A-Za-z][A-Za-z0-9_.\-]*)").ok());

/// Template tags that are framework built-ins, not component references.
const TEMPLATE_BUILTINS: &[&str] = &[
    "Template",
    "Slot",
    "Component",
    "Transition",
    "TransitionGroup",
    "KeepAlive",
    "Teleport",
    "Suspense",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractOptions {
    /// Folder names whose files are command-line entry points.
    pub cli_dirs: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            cli_dirs: vec!["cli".into(), "bin".into(), "scripts".into()],
        }
    }
}

/// Everything extracted from one file. Lists are sorted and unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFact {
    pub entry_id: EntryId,
    pub kind: Kind,
    pub imports: Vec<String>,
    pub hooks: Vec<String>,
    pub components: Vec<String>,
    pub functions: Vec<String>,
    pub variables: Vec<String>,
    pub props: BTreeMap<String, PropSpec>,
    pub emits: BTreeMap<String, EmitSpec>,
    pub state: BTreeMap<String, String>,
    pub exports: Exports,
    pub api: Option<ApiSignature>,
    pub framework_meta: Option<FrameworkMeta>,
}

/// Parse `text` and extract its facts.
///
/// Returns [`StampError::Parse`] when the file cannot be parsed; callers
/// record that as a diagnostic and carry on with the remaining files.
pub fn extract(entry_id: &EntryId, text: &str, options: &ExtractOptions) -> Result<SourceFact> {
    let is_vue = entry_id.extension().as_deref() == Some("vue");

    let (script, source_type, template) = if is_vue {
        let blocks = sfc::extract_blocks(text).map_err(|err| StampError::Parse {
            entry_id: entry_id.to_string(),
            message: err.to_string(),
        })?;
        let source_type = if blocks.is_typescript() {
            SourceType::ts()
        } else {
            SourceType::mjs()
        };
        (blocks.combined_script(), source_type, blocks.template)
    } else {
        let source_type = SourceType::from_path(entry_id.as_str()).unwrap_or(SourceType::tsx());
        (text.to_string(), source_type, None)
    };

    let allocator = Allocator::default();
    let ParserReturn {
        program,
        errors,
        panicked,
        ..
    } = Parser::new(&allocator, &script, source_type).parse();
    if let Some(error) = errors.first() {
        let offset = error
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map(|label| label.offset());
        let message = match offset {
            Some(offset) => format!("{} (line {})", error.message, line_of(&script, offset)),
            None => error.message.to_string(),
        };
        return Err(StampError::Parse {
            entry_id: entry_id.to_string(),
            message,
        });
    }
    if panicked {
        return Err(StampError::Parse {
            entry_id: entry_id.to_string(),
            message: "parser gave up on this file".to_string(),
        });
    }

    let scan = ModuleScan::scan(&program, &script);
    let mut body = FactVisitor::new(&script, &scan.types, &scan.namespace_imports).collect(&program);
    if let Some(template) = template {
        body.components.extend(template_components(template));
    }

    let mut imports: Vec<String> = scan
        .imports
        .iter()
        .chain(&body.dynamic_imports)
        .cloned()
        .collect();
    imports.sort();
    imports.dedup();

    let framework = imports.iter().find_map(|s| classify::api_framework(s));
    let api_routes = match framework {
        Some(crate::model::ApiFramework::Nestjs) => body.nest_controller,
        Some(_) => !body.routes.is_empty(),
        None => false,
    };

    let main = scan.main_export();
    let signals = Signals {
        api_routes,
        vue_import: is_vue || imports.iter().any(|s| classify::is_vue_specifier(s)),
        react_import: imports.iter().any(|s| classify::is_react_specifier(s)),
        jsx_file: matches!(entry_id.extension().as_deref(), Some("tsx" | "jsx")),
        main_export_hook: main
            .as_ref()
            .is_some_and(|m| m.is_function && visitor::is_hook_name(&m.name)),
        sole_export_hook: scan
            .sole_export()
            .is_some_and(|m| m.is_function && visitor::is_hook_name(&m.name)),
        markup: body.has_markup() || template.is_some(),
        declares_markup_component: template.is_some()
            || scan
                .function_refs
                .iter()
                .any(|f| is_component_name(&f.name) && body.markup_within(f.span.start, f.span.end)),
        vue_state: body.vue_state,
        vue_registration: body.vue_registration,
        has_hooks: !body.hooks.is_empty(),
        has_components: !body.components.is_empty(),
        create_element: body.create_element,
        component_annotation: scan.component_annotation,
        in_cli_dir: entry_id
            .dir_segments()
            .any(|segment| options.cli_dirs.iter().any(|dir| dir == segment)),
        reads_argv: body.reads_argv,
    };
    let kind = classify(&signals);
    tracing::debug!(
        entry = %entry_id,
        kind = %kind,
        rule = classify::matching_rule(&signals).name,
        "classified"
    );

    let exports = exports_of(&scan);
    let framework_meta = nextjs::framework_meta(entry_id, text, scan.metadata.clone());
    let mut functions = scan.functions.clone();
    functions.sort();
    functions.dedup();
    let mut variables = scan.variables.clone();
    variables.sort();
    variables.dedup();

    if kind == Kind::NodeApi {
        let mut routes = body.routes;
        routes.sort();
        return Ok(SourceFact {
            entry_id: entry_id.clone(),
            kind,
            imports,
            hooks: Vec::new(),
            components: Vec::new(),
            functions,
            variables,
            props: BTreeMap::new(),
            emits: BTreeMap::new(),
            state: BTreeMap::new(),
            exports,
            api: framework.map(|framework| ApiSignature { framework, routes }),
            framework_meta,
        });
    }

    let interface = match kind {
        Kind::VueComponent | Kind::VueComposable => vue_interface(&scan, &body, &script),
        Kind::ReactComponent => react_interface(&scan, &body, &script),
        _ => InterfaceFacts::default(),
    };
    let state = if matches!(kind, Kind::TsModule | Kind::NodeCli) {
        BTreeMap::new()
    } else {
        body.state
    };

    Ok(SourceFact {
        entry_id: entry_id.clone(),
        kind,
        imports,
        hooks: body.hooks.into_iter().collect(),
        components: body.components.into_iter().collect(),
        functions,
        variables,
        props: interface.props,
        emits: interface.emits,
        state,
        exports,
        api: None,
        framework_meta,
    })
}

fn exports_of(scan: &ModuleScan<'_, '_>) -> Exports {
    if scan.has_default {
        Exports::Default
    } else if scan.opaque_reexport {
        Exports::NamedOpaque
    } else if !scan.named_exports.is_empty() {
        Exports::named(scan.named_exports.iter().cloned())
    } else {
        Exports::None
    }
}

fn vue_interface(scan: &ModuleScan<'_, '_>, body: &BodyFacts, source: &str) -> InterfaceFacts {
    let mut out = InterfaceFacts::default();
    if let Some(object) = scan.default_object {
        visitor::component_options(object, source, &mut out);
    }
    out.merge(body.vue_interface.clone());
    out
}

/// Props of the main component: its parameter type, `<Name>Props`, the
/// file's only `*Props` type, then destructured parameter names.
fn react_interface(scan: &ModuleScan<'_, '_>, body: &BodyFacts, source: &str) -> InterfaceFacts {
    let mut out = InterfaceFacts::default();
    let component = main_component(scan, body);

    if let Some(component) = component {
        if let Some(annotation) = component.annotation {
            if interface::from_type(annotation, &scan.types, source, &mut out) {
                return out;
            }
        }
        let param_type = component
            .params
            .items
            .first()
            .and_then(|param| param.pattern.type_annotation.as_ref());
        if let Some(param_type) = param_type {
            if interface::from_type(&param_type.type_annotation, &scan.types, source, &mut out) {
                return out;
            }
        }
        let props_name = format!("{}Props", component.name);
        if let Some(decl) = scan.types.get(props_name.as_str()) {
            interface::from_decl(*decl, &scan.types, source, &mut out, 0);
            return out;
        }
    }

    let mut props_types = scan.type_names.iter().filter(|name| name.ends_with("Props"));
    if let (Some(only), None) = (props_types.next(), props_types.next()) {
        if let Some(decl) = scan.types.get(*only) {
            interface::from_decl(*decl, &scan.types, source, &mut out, 0);
            return out;
        }
    }

    if let Some(param) = component.and_then(|c| c.params.items.first()) {
        interface::from_destructured(&param.pattern, &mut out);
    }
    out
}

fn main_component<'s, 'p, 'a>(
    scan: &'s ModuleScan<'p, 'a>,
    body: &BodyFacts,
) -> Option<&'s FunctionRef<'p, 'a>> {
    scan.main_export()
        .and_then(|main| scan.function_ref(&main.name))
        .filter(|f| is_component_name(&f.name))
        .or_else(|| {
            scan.function_refs.iter().find(|f| {
                is_component_name(&f.name) && body.markup_within(f.span.start, f.span.end)
            })
        })
}

/// PascalCase names, plus anonymous default exports.
fn is_component_name(name: &str) -> bool {
    name == "default" || name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Component references in an SFC template, PascalCase or kebab-case.
fn template_components(template: &str) -> Vec<String> {
    let Some(regex) = TEMPLATE_TAG.as_ref() else {
        return Vec::new();
    };
    regex
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .filter_map(|tag| {
            let tag = tag.as_str();
            let root = tag.split('.').next().unwrap_or(tag);
            if root.contains('-') {
                Some(kebab_to_pascal(root))
            } else if root.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
                Some(root.to_string())
            } else {
                None
            }
        })
        .filter(|name| !TEMPLATE_BUILTINS.contains(&name.as_str()))
        .collect()
}

fn kebab_to_pascal(tag: &str) -> String {
    tag.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn line_of(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    memchr::memchr_iter(b'\n', &source.as_bytes()[..end]).count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ApiFramework;

    fn run(path: &str, text: &str) -> SourceFact {
        extract(&EntryId::new(path).unwrap(), text, &ExtractOptions::default()).unwrap()
    }

    #[test]
    fn react_component_with_typed_props() {
        let fact = run(
            "src/components/Button.tsx",
            r#"
import React from 'react';
import { Icon } from './Icon';

interface ButtonProps {
  label: string;
  variant?: 'primary' | 'ghost';
  onClick?: (e: React.MouseEvent) => void;
}

function format(label: string) { return label.trim(); }

export function Button({ label, onClick }: ButtonProps) {
  const [pressed, setPressed] = useState(false);
  return <button onClick={onClick}><Icon />{format(label)}</button>;
}
"#,
        );
        assert_eq!(fact.kind, Kind::ReactComponent);
        assert_eq!(fact.imports, vec!["./Icon", "react"]);
        assert_eq!(fact.components, vec!["Icon"]);
        assert_eq!(fact.hooks, vec!["useState"]);
        assert_eq!(fact.functions, vec!["Button", "format"]);
        assert_eq!(fact.props["label"], PropSpec::new("string"));
        assert_eq!(fact.props["variant"].literals, vec!["primary", "ghost"]);
        assert_eq!(
            fact.emits["onClick"],
            EmitSpec::new("(e:React.MouseEvent)=>void")
        );
        assert_eq!(fact.state["pressed"], "boolean");
        assert_eq!(fact.exports, Exports::named(["Button"]));
    }

    #[test]
    fn react_hook() {
        let fact = run(
            "src/hooks/useToggle.ts",
            "import { useState } from 'react';\nexport default function useToggle() { const [on, set] = useState(false); return [on, () => set(!on)]; }",
        );
        assert_eq!(fact.kind, Kind::ReactHook);
        assert_eq!(fact.exports, Exports::Default);
        assert!(fact.props.is_empty());
        assert_eq!(fact.state["on"], "boolean");
    }

    #[test]
    fn express_api_skips_frontend_extraction() {
        let fact = run(
            "server/routes/users.ts",
            r#"
import express from 'express';
const router = express.Router();
router.get('/users/:id', getUser);
router.post('/users', createUser);
export default router;
"#,
        );
        assert_eq!(fact.kind, Kind::NodeApi);
        let api = fact.api.unwrap();
        assert_eq!(api.framework, ApiFramework::Express);
        assert_eq!(api.routes.len(), 2);
        assert_eq!(api.routes[0].method, "GET");
        assert!(fact.hooks.is_empty() && fact.components.is_empty());
    }

    #[test]
    fn vue_sfc_component() {
        let fact = run(
            "src/components/TodoItem.vue",
            r#"
<template>
  <li><base-checkbox v-model="done" /><TodoLabel :text="title" /></li>
</template>
<script setup lang="ts">
import { ref } from 'vue';
const props = defineProps<{ title: string }>();
const emit = defineEmits(['toggle']);
const done = ref(false);
</script>
"#,
        );
        assert_eq!(fact.kind, Kind::VueComponent);
        assert_eq!(fact.components, vec!["BaseCheckbox", "TodoLabel"]);
        assert_eq!(fact.props["title"].ty, "string");
        assert!(fact.emits.contains_key("toggle"));
        assert_eq!(fact.state["done"], "boolean");
    }

    #[test]
    fn vue_composable() {
        let fact = run(
            "src/composables/useCounter.ts",
            "import { ref } from 'vue';\nexport function useCounter() { const count = ref(0); return { count }; }",
        );
        assert_eq!(fact.kind, Kind::VueComposable);
    }

    #[test]
    fn several_named_hooks_with_state_are_a_vue_component() {
        let fact = run(
            "src/composables/counters.ts",
            "import { ref } from 'vue';\nexport function useA() { const a = ref(0); return { a }; }\nexport function useB() { return 1; }",
        );
        assert_eq!(fact.kind, Kind::VueComponent);
    }

    #[test]
    fn cli_by_directory_and_module_fallback() {
        let fact = run("scripts/build.ts", "export const x = 1;");
        assert_eq!(fact.kind, Kind::NodeCli);
        let fact = run("src/tools/run.js", "const args = process.argv;");
        assert_eq!(fact.kind, Kind::NodeCli);
        let fact = run("src/utils/math.ts", "export function add(a: number, b: number) { return a + b; }");
        assert_eq!(fact.kind, Kind::TsModule);
        assert_eq!(fact.exports, Exports::named(["add"]));
    }

    #[test]
    fn star_reexport_is_opaque() {
        let fact = run("src/index.ts", "export * from './a';");
        assert_eq!(fact.exports, Exports::NamedOpaque);
        assert_eq!(fact.imports, vec!["./a"]);
    }

    #[test]
    fn parse_failure_is_an_error() {
        let err = extract(
            &EntryId::new("src/broken.ts").unwrap(),
            "export const = ;",
            &ExtractOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StampError::Parse { ref entry_id, .. } if entry_id == "src/broken.ts"));
    }

    #[test]
    fn next_app_page_meta() {
        let fact = run(
            "app/(shop)/products/page.tsx",
            "'use client';\nexport const metadata = { title: 'Products', count: 3 };\nexport default function Page() { return <main />; }",
        );
        let meta = fact.framework_meta.unwrap();
        assert_eq!(meta.directive.as_deref(), Some("use client"));
        assert_eq!(meta.segment_path, "/products");
        let statics = meta.metadata.unwrap().static_fields.unwrap();
        assert_eq!(statics["title"], serde_json::json!("Products"));
        assert_eq!(statics["count"], serde_json::json!(3));
        assert_eq!(serde_json::to_string(&statics["count"]).unwrap(), "3");
    }

    #[test]
    fn template_tags() {
        assert_eq!(
            template_components("<div><router-view/><MyCard.Header/><transition></transition></div>"),
            vec!["RouterView", "MyCard"]
        );
    }
}
