//! Component interface inference: props, emits and state types.
//!
//! Type text is stored whitespace-normalised so formatting-only edits do not
//! move the semantic hash.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use oxc_ast::ast::*;
use oxc_span::GetSpan;
use regex::Regex;

use super::module::{TypeDecl, TypeDecls, unparen};
use crate::model::{EmitSpec, PropSpec};

/// Nesting limit when following type aliases.
const MAX_TYPE_DEPTH: usize = 6;

const LITERAL_UNION: &str = "literal-union";

static CALL_SIGNATURE_EVENT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?s)^\(\s*\w+\??\s*:\s*['"]([^'"]+)['"]\s*,?\s*(.*)\)$"#).ok()
});

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct InterfaceFacts {
    pub props: BTreeMap<String, PropSpec>,
    pub emits: BTreeMap<String, EmitSpec>,
}

impl InterfaceFacts {
    pub fn merge(&mut self, other: InterfaceFacts) {
        self.props.extend(other.props);
        self.emits.extend(other.emits);
    }
}

/// Collapse whitespace and drop separators that only formatting affects.
pub fn normalize_type_text(text: &str) -> String {
    const TIGHT: &[char] = &[
        '{', '}', '(', ')', '[', ']', '<', '>', ':', ';', ',', '|', '&', '=', '?',
    ];

    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let prev_tight = out.chars().last().is_none_or(|p| TIGHT.contains(&p));
            if !prev_tight && !TIGHT.contains(&c) {
                out.push(' ');
            }
            pending_space = false;
        }
        if c == '}' {
            while out.ends_with(';') || out.ends_with(',') {
                out.pop();
            }
        }
        out.push(c);
    }
    while out.ends_with(';') || out.ends_with(',') {
        out.pop();
    }
    out
}

pub(crate) fn is_event_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('o')
        && chars.next() == Some('n')
        && chars.next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Props and emits described by a TypeScript type.
///
/// Returns `false` when the type cannot be resolved to members in this file.
pub(crate) fn from_type(
    ty: &TSType<'_>,
    types: &TypeDecls<'_, '_>,
    source: &str,
    out: &mut InterfaceFacts,
) -> bool {
    from_type_at(ty, types, source, out, 0)
}

fn from_type_at(
    ty: &TSType<'_>,
    types: &TypeDecls<'_, '_>,
    source: &str,
    out: &mut InterfaceFacts,
    depth: usize,
) -> bool {
    if depth > MAX_TYPE_DEPTH {
        return false;
    }
    match ty {
        TSType::TSTypeLiteral(literal) => {
            from_members(&literal.members, source, out);
            true
        }
        TSType::TSTypeReference(reference) => {
            let name = reference.type_name.span().source_text(source);
            if let Some(decl) = types.get(name) {
                return from_decl(*decl, types, source, out, depth + 1);
            }
            // FC<Props>, PropsWithChildren<Props>, Readonly<Props>
            let mut found = false;
            if let Some(args) = &reference.type_arguments {
                for arg in &args.params {
                    found |= from_type_at(arg, types, source, out, depth + 1);
                }
            }
            found
        }
        TSType::TSIntersectionType(intersection) => {
            let mut found = false;
            for part in &intersection.types {
                found |= from_type_at(part, types, source, out, depth + 1);
            }
            found
        }
        TSType::TSParenthesizedType(paren) => {
            from_type_at(&paren.type_annotation, types, source, out, depth + 1)
        }
        _ => false,
    }
}

pub(crate) fn from_decl(
    decl: TypeDecl<'_, '_>,
    types: &TypeDecls<'_, '_>,
    source: &str,
    out: &mut InterfaceFacts,
    depth: usize,
) -> bool {
    match decl {
        TypeDecl::Members(members) => {
            from_members(members, source, out);
            true
        }
        TypeDecl::Alias(ty) => from_type_at(ty, types, source, out, depth),
    }
}

fn from_members(members: &[TSSignature<'_>], source: &str, out: &mut InterfaceFacts) {
    for member in members {
        match member {
            TSSignature::TSPropertySignature(prop) => {
                let Some(name) = prop.key.static_name() else {
                    continue;
                };
                let ty = prop.type_annotation.as_ref().map(|t| &t.type_annotation);
                match ty {
                    Some(fn_ty @ TSType::TSFunctionType(_)) if is_event_name(&name) => {
                        let text = normalize_type_text(fn_ty.span().source_text(source));
                        out.emits.insert(name.to_string(), EmitSpec::new(text));
                    }
                    _ => {
                        out.props
                            .insert(name.to_string(), prop_spec(ty, prop.optional, source));
                    }
                }
            }
            TSSignature::TSMethodSignature(method) => {
                let Some(name) = method.key.static_name() else {
                    continue;
                };
                let signature = method_signature(
                    method.params.span.source_text(source),
                    method
                        .return_type
                        .as_ref()
                        .map(|t| t.type_annotation.span().source_text(source)),
                );
                if is_event_name(&name) {
                    out.emits.insert(name.to_string(), EmitSpec::new(signature));
                } else {
                    out.props.insert(
                        name.to_string(),
                        PropSpec::new(signature).optional(method.optional),
                    );
                }
            }
            _ => {}
        }
    }
}

fn method_signature(params: &str, return_type: Option<&str>) -> String {
    let params = normalize_type_text(params);
    let params = if params.starts_with('(') {
        params
    } else {
        format!("({params})")
    };
    let ret = return_type.map_or_else(|| "void".to_string(), normalize_type_text);
    format!("{params}=>{ret}")
}

fn prop_spec(ty: Option<&TSType<'_>>, optional: bool, source: &str) -> PropSpec {
    let Some(ty) = ty else {
        return PropSpec::new("any").optional(optional);
    };
    if let TSType::TSUnionType(union) = ty {
        if union
            .types
            .iter()
            .all(|t| matches!(t, TSType::TSLiteralType(_)))
        {
            let literals = union
                .types
                .iter()
                .map(|t| strip_quotes(t.span().source_text(source)).to_string())
                .collect();
            return PropSpec {
                ty: LITERAL_UNION.to_string(),
                optional,
                literals,
            };
        }
    }
    PropSpec::new(normalize_type_text(ty.span().source_text(source))).optional(optional)
}

fn strip_quotes(text: &str) -> &str {
    text.trim().trim_matches(|c| c == '\'' || c == '"' || c == '`')
}

/// Props from a destructured first parameter when no type is available.
pub(crate) fn from_destructured(pattern: &BindingPattern<'_>, out: &mut InterfaceFacts) {
    let BindingPatternKind::ObjectPattern(object) = &pattern.kind else {
        return;
    };
    for prop in &object.properties {
        let Some(name) = prop.key.static_name() else {
            continue;
        };
        if is_event_name(&name) {
            out.emits.insert(name.to_string(), EmitSpec::new("any"));
            continue;
        }
        let has_default = matches!(prop.value.kind, BindingPatternKind::AssignmentPattern(_));
        out.props
            .insert(name.to_string(), PropSpec::new("any").optional(has_default));
    }
}

/// Vue runtime prop declarations: `['a', 'b']` or `{ a: String, b: { type: Number, required: true } }`.
pub(crate) fn from_runtime_props(expr: &Expression<'_>, out: &mut InterfaceFacts) {
    match unparen(expr) {
        Expression::ArrayExpression(array) => {
            for element in &array.elements {
                if let ArrayExpressionElement::StringLiteral(lit) = element {
                    out.props
                        .insert(lit.value.to_string(), PropSpec::new("any").optional(true));
                }
            }
        }
        Expression::ObjectExpression(object) => {
            for prop in &object.properties {
                let ObjectPropertyKind::ObjectProperty(prop) = prop else {
                    continue;
                };
                let Some(name) = prop.key.static_name() else {
                    continue;
                };
                out.props.insert(name.to_string(), runtime_prop(&prop.value));
            }
        }
        _ => {}
    }
}

fn runtime_prop(value: &Expression<'_>) -> PropSpec {
    match unparen(value) {
        Expression::ObjectExpression(options) => {
            let mut ty = "any".to_string();
            let mut required = false;
            for option in &options.properties {
                let ObjectPropertyKind::ObjectProperty(option) = option else {
                    continue;
                };
                match option.key.static_name().as_deref() {
                    Some("type") => ty = runtime_type(&option.value),
                    Some("required") => {
                        required = matches!(&option.value, Expression::BooleanLiteral(b) if b.value)
                    }
                    _ => {}
                }
            }
            PropSpec::new(ty).optional(!required)
        }
        other => PropSpec::new(runtime_type(other)).optional(true),
    }
}

fn runtime_type(value: &Expression<'_>) -> String {
    match unparen(value) {
        Expression::Identifier(ident) => ident.name.to_lowercase(),
        Expression::ArrayExpression(array) => {
            let parts: Vec<String> = array
                .elements
                .iter()
                .filter_map(|e| match e {
                    ArrayExpressionElement::Identifier(ident) => Some(ident.name.to_lowercase()),
                    _ => None,
                })
                .collect();
            if parts.is_empty() {
                "any".to_string()
            } else {
                parts.join("|")
            }
        }
        _ => "any".to_string(),
    }
}

/// Vue runtime emit declarations: `['change']` or `{ change: (id) => true }`.
pub(crate) fn from_runtime_emits(expr: &Expression<'_>, source: &str, out: &mut InterfaceFacts) {
    match unparen(expr) {
        Expression::ArrayExpression(array) => {
            for element in &array.elements {
                if let ArrayExpressionElement::StringLiteral(lit) = element {
                    out.emits.insert(lit.value.to_string(), EmitSpec::new("any"));
                }
            }
        }
        Expression::ObjectExpression(object) => {
            for prop in &object.properties {
                let ObjectPropertyKind::ObjectProperty(prop) = prop else {
                    continue;
                };
                let Some(name) = prop.key.static_name() else {
                    continue;
                };
                let signature = match unparen(&prop.value) {
                    Expression::ArrowFunctionExpression(arrow) => {
                        normalize_type_text(arrow.params.span.source_text(source))
                    }
                    Expression::FunctionExpression(func) => {
                        normalize_type_text(func.params.span.source_text(source))
                    }
                    _ => "any".to_string(),
                };
                out.emits.insert(name.to_string(), EmitSpec::new(signature));
            }
        }
        _ => {}
    }
}

/// `defineEmits<{ (e: 'change', id: number): void }>()` and the
/// `defineEmits<{ change: [id: number] }>()` shorthand.
pub(crate) fn from_emit_type(
    ty: &TSType<'_>,
    types: &TypeDecls<'_, '_>,
    source: &str,
    out: &mut InterfaceFacts,
) {
    let members: &[TSSignature<'_>] = match ty {
        TSType::TSTypeLiteral(literal) => &literal.members[..],
        TSType::TSTypeReference(reference) => {
            match types.get(reference.type_name.span().source_text(source)) {
                Some(&TypeDecl::Members(members)) => members,
                Some(&TypeDecl::Alias(TSType::TSTypeLiteral(literal))) => &literal.members[..],
                _ => return,
            }
        }
        _ => return,
    };

    for member in members {
        match member {
            TSSignature::TSCallSignatureDeclaration(call) => {
                let params = call.params.span.source_text(source);
                if let Some((name, rest)) = call_signature_event(params) {
                    out.emits.insert(name, EmitSpec::new(rest));
                }
            }
            TSSignature::TSPropertySignature(prop) => {
                let Some(name) = prop.key.static_name() else {
                    continue;
                };
                let signature = prop
                    .type_annotation
                    .as_ref()
                    .map(|t| normalize_type_text(t.type_annotation.span().source_text(source)))
                    .unwrap_or_else(|| "any".to_string());
                out.emits.insert(name.to_string(), EmitSpec::new(signature));
            }
            _ => {}
        }
    }
}

fn call_signature_event(params: &str) -> Option<(String, String)> {
    let regex = CALL_SIGNATURE_EVENT.as_ref()?;
    let text = params.trim();
    let wrapped;
    let text = if text.starts_with('(') {
        text
    } else {
        wrapped = format!("({text})");
        &wrapped
    };
    let captures = regex.captures(text)?;
    let name = captures.get(1)?.as_str().to_string();
    let rest = captures.get(2).map_or("", |m| m.as_str());
    Some((name, normalize_type_text(&format!("({rest})"))))
}

/// State type from a generic argument or a literal initialiser.
pub(crate) fn infer_state_type(
    type_argument: Option<&TSType<'_>>,
    init: Option<&Expression<'_>>,
    source: &str,
) -> String {
    if let Some(ty) = type_argument {
        return normalize_type_text(ty.span().source_text(source));
    }
    let Some(init) = init else {
        return "undefined".to_string();
    };
    match unparen(init) {
        Expression::StringLiteral(_) | Expression::TemplateLiteral(_) => "string",
        Expression::NumericLiteral(_) => "number",
        Expression::BooleanLiteral(_) => "boolean",
        Expression::NullLiteral(_) => "null",
        Expression::ArrayExpression(_) => "array",
        Expression::ObjectExpression(_) => "object",
        Expression::Identifier(ident) if ident.name.as_str() == "undefined" => "undefined",
        _ => "unknown",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::module::ModuleScan;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    #[test]
    fn normalization_ignores_formatting() {
        let a = "{\n  label: string;\n  size?: 'sm' | 'lg';\n}";
        let b = "{ label : string ; size? : 'sm'|'lg' }";
        assert_eq!(normalize_type_text(a), normalize_type_text(b));
        assert_eq!(normalize_type_text(a), "{label:string;size?:'sm'|'lg'}");
        assert_eq!(normalize_type_text("(e: MouseEvent) => void"), "(e:MouseEvent)=>void");
        assert_eq!(normalize_type_text("Array< string >"), "Array<string>");
        assert_eq!(normalize_type_text("keyof  typeof x"), "keyof typeof x");
    }

    #[test]
    fn event_names() {
        assert!(is_event_name("onClick"));
        assert!(!is_event_name("one"));
        assert!(!is_event_name("on"));
        assert!(!is_event_name("label"));
    }

    #[test]
    fn interface_members_split_into_props_and_emits() {
        let source = r#"
interface Base { id: string }
type ButtonProps = Base & {
  label: string;
  variant?: 'primary' | 'secondary';
  onClick: (e: MouseEvent) => void;
  render(): string;
};
"#;
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::ts()).parse();
        let scan = ModuleScan::scan(&ret.program, source);
        let mut out = InterfaceFacts::default();
        let decl = scan.types["ButtonProps"];
        assert!(from_decl(decl, &scan.types, source, &mut out, 0));

        assert_eq!(out.props["id"], PropSpec::new("string"));
        assert_eq!(out.props["label"], PropSpec::new("string"));
        assert_eq!(
            out.props["variant"],
            PropSpec {
                ty: "literal-union".into(),
                optional: true,
                literals: vec!["primary".into(), "secondary".into()],
            }
        );
        assert_eq!(out.props["render"].ty, "()=>string");
        assert_eq!(out.emits["onClick"], EmitSpec::new("(e:MouseEvent)=>void"));
    }

    #[test]
    fn call_signature_events() {
        assert_eq!(
            call_signature_event("(e: 'change', id: number)"),
            Some(("change".to_string(), "(id:number)".to_string()))
        );
        assert_eq!(
            call_signature_event("(event: \"close\")"),
            Some(("close".to_string(), "()".to_string()))
        );
        assert_eq!(call_signature_event("(id: number)"), None);
    }

    #[test]
    fn state_type_inference() {
        let source = "const a = 'x'; const b = 3; const c = [1]; const d = foo();";
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::ts()).parse();
        let inits: Vec<String> = ret
            .program
            .body
            .iter()
            .filter_map(|stmt| match stmt {
                Statement::VariableDeclaration(var) => var.declarations[0].init.as_ref(),
                _ => None,
            })
            .map(|init| infer_state_type(None, Some(init), source))
            .collect();
        assert_eq!(inits, vec!["string", "number", "array", "unknown"]);
        assert_eq!(infer_state_type(None, None, source), "undefined");
    }
}
