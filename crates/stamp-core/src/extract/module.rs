//! Top-level structure of a parsed module: imports, exports, declarations.
//!
//! Only `program.body` is inspected here. Anything nested inside function
//! bodies (hook calls, markup, route registrations) is collected by
//! [`super::visitor::FactVisitor`].

use std::collections::BTreeMap;

use oxc_ast::ast::*;
use oxc_span::{GetSpan, Span};
use rustc_hash::FxHashMap;

use crate::model::MetadataExport;

/// A type declaration that can describe component props.
#[derive(Clone, Copy)]
pub(crate) enum TypeDecl<'p, 'a> {
    Members(&'p [TSSignature<'a>]),
    Alias(&'p TSType<'a>),
}

pub(crate) type TypeDecls<'p, 'a> = FxHashMap<&'p str, TypeDecl<'p, 'a>>;

/// A named function-like binding declared at the top level.
pub(crate) struct FunctionRef<'p, 'a> {
    pub name: String,
    pub params: &'p FormalParameters<'a>,
    /// Declared type of the binding, e.g. `React.FC<Props>`.
    pub annotation: Option<&'p TSType<'a>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MainExport {
    pub name: String,
    pub is_function: bool,
}

#[derive(Default)]
pub(crate) struct ModuleScan<'p, 'a> {
    /// Module specifiers from `import` declarations, in source order.
    pub imports: Vec<String>,
    /// Local binding name to the specifier it was imported from.
    pub import_bindings: FxHashMap<String, String>,
    /// Locals bound by `import * as ns`.
    pub namespace_imports: Vec<String>,
    pub functions: Vec<String>,
    pub variables: Vec<String>,
    pub function_refs: Vec<FunctionRef<'p, 'a>>,
    pub types: TypeDecls<'p, 'a>,
    pub type_names: Vec<&'p str>,

    pub has_default: bool,
    pub default_name: Option<String>,
    pub default_is_function: bool,
    /// `export default { ... }`, the options object of a Vue component.
    pub default_object: Option<&'p ObjectExpression<'a>>,
    /// Every exported name, including type-only exports.
    pub named_exports: Vec<String>,
    /// Exported value names in source order.
    pub value_exports: Vec<String>,
    /// `export * from '...'` without a namespace alias.
    pub opaque_reexport: bool,

    pub metadata: Option<MetadataExport>,
    pub component_annotation: bool,
}

impl<'p, 'a> ModuleScan<'p, 'a> {
    pub fn scan(program: &'p Program<'a>, source: &str) -> Self {
        let mut scan = Self::default();
        for stmt in &program.body {
            scan.statement(stmt, source);
        }
        if scan.has_default && !scan.default_is_function {
            if let Some(name) = &scan.default_name {
                scan.default_is_function = scan.functions.iter().any(|f| f == name);
            }
        }
        scan
    }

    /// Default export if present, else the first exported value.
    pub fn main_export(&self) -> Option<MainExport> {
        if self.has_default {
            return self.default_name.as_ref().map(|name| MainExport {
                name: name.clone(),
                is_function: self.default_is_function,
            });
        }
        self.value_exports.first().map(|name| MainExport {
            name: name.clone(),
            is_function: self.functions.iter().any(|f| f == name),
        })
    }

    /// Like [`main_export`](Self::main_export), but only when the export is
    /// unambiguous: a default export or exactly one named value export.
    pub fn sole_export(&self) -> Option<MainExport> {
        if self.has_default || self.value_exports.len() == 1 {
            self.main_export()
        } else {
            None
        }
    }

    pub fn function_ref(&self, name: &str) -> Option<&FunctionRef<'p, 'a>> {
        self.function_refs.iter().find(|f| f.name == name)
    }

    fn statement(&mut self, stmt: &'p Statement<'a>, source: &str) {
        if let Some(module_decl) = stmt.as_module_declaration() {
            self.module_declaration(module_decl, source);
            return;
        }

        match stmt {
            Statement::FunctionDeclaration(func) => self.function(func, source),
            Statement::ClassDeclaration(class) => {
                if let Some(id) = &class.id {
                    self.variables.push(id.name.to_string());
                }
            }
            Statement::VariableDeclaration(var) => {
                self.variable_declaration(var, false, source);
            }
            Statement::TSInterfaceDeclaration(iface) => {
                self.add_type(iface.id.name.as_str(), TypeDecl::Members(&iface.body.body));
            }
            Statement::TSTypeAliasDeclaration(alias) => {
                self.add_type(alias.id.name.as_str(), TypeDecl::Alias(&alias.type_annotation));
            }
            Statement::ExpressionStatement(expr) => self.commonjs_export(&expr.expression),
            _ => {}
        }
    }

    fn module_declaration(&mut self, decl: &'p ModuleDeclaration<'a>, source: &str) {
        match decl {
            ModuleDeclaration::ImportDeclaration(import) => {
                let specifier = import.source.value.to_string();
                if let Some(specs) = &import.specifiers {
                    for spec in specs {
                        let local = match spec {
                            ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                                s.local.name.to_string()
                            }
                            ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                                self.namespace_imports.push(s.local.name.to_string());
                                s.local.name.to_string()
                            }
                            ImportDeclarationSpecifier::ImportSpecifier(s) => s.local.name.to_string(),
                        };
                        self.import_bindings.insert(local, specifier.clone());
                    }
                }
                self.imports.push(specifier);
            }
            ModuleDeclaration::ExportDefaultDeclaration(export) => {
                self.has_default = true;
                self.default_export(&export.declaration, source);
            }
            ModuleDeclaration::ExportNamedDeclaration(named) => {
                if let Some(decl) = &named.declaration {
                    self.exported_declaration(decl, source);
                }
                for spec in &named.specifiers {
                    let exported = module_export_name(&spec.exported);
                    if exported == "default" {
                        self.has_default = true;
                        self.default_name = Some(module_export_name(&spec.local));
                    } else {
                        self.named_exports.push(exported.clone());
                        if spec.export_kind.is_value() && named.export_kind.is_value() {
                            self.value_exports.push(exported);
                        }
                    }
                }
                if let Some(src) = &named.source {
                    self.imports.push(src.value.to_string());
                }
            }
            ModuleDeclaration::ExportAllDeclaration(all) => {
                match &all.exported {
                    Some(alias) => {
                        let name = module_export_name(alias);
                        self.named_exports.push(name.clone());
                        self.value_exports.push(name);
                    }
                    None => self.opaque_reexport = true,
                }
                self.imports.push(all.source.value.to_string());
            }
            ModuleDeclaration::TSExportAssignment(assign) => {
                self.has_default = true;
                if let Expression::Identifier(ident) = unparen(&assign.expression) {
                    self.default_name = Some(ident.name.to_string());
                }
            }
            _ => {}
        }
    }

    fn default_export(&mut self, kind: &'p ExportDefaultDeclarationKind<'a>, source: &str) {
        match kind {
            ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                let name = func
                    .id
                    .as_ref()
                    .map_or_else(|| "default".to_string(), |id| id.name.to_string());
                self.default_is_function = true;
                self.default_name = Some(name.clone());
                self.push_function(name, func, None, source);
            }
            ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                let name = class
                    .id
                    .as_ref()
                    .map_or_else(|| "default".to_string(), |id| id.name.to_string());
                self.default_name = Some(name);
            }
            ExportDefaultDeclarationKind::Identifier(ident) => {
                self.default_name = Some(ident.name.to_string());
            }
            ExportDefaultDeclarationKind::ArrowFunctionExpression(arrow) => {
                self.default_is_function = true;
                self.default_name = Some("default".to_string());
                self.function_refs.push(FunctionRef {
                    name: "default".to_string(),
                    params: &arrow.params,
                    annotation: None,
                    span: arrow.span,
                });
            }
            ExportDefaultDeclarationKind::FunctionExpression(func) => {
                self.default_is_function = true;
                let name = func
                    .id
                    .as_ref()
                    .map_or_else(|| "default".to_string(), |id| id.name.to_string());
                self.default_name = Some(name.clone());
                self.push_function(name, func, None, source);
            }
            ExportDefaultDeclarationKind::ObjectExpression(object) => {
                self.default_name = Some("default".to_string());
                self.default_object = Some(&**object);
            }
            ExportDefaultDeclarationKind::CallExpression(call) => {
                // memo(Button), forwardRef(Button), defineComponent({...})
                let wrapped = call.arguments.first().and_then(|arg| match arg {
                    Argument::Identifier(ident) => Some(ident.name.to_string()),
                    _ => None,
                });
                if let Some(Argument::ObjectExpression(object)) = call.arguments.first() {
                    self.default_object = Some(&**object);
                }
                self.default_name = Some(wrapped.unwrap_or_else(|| "default".to_string()));
            }
            _ => {
                self.default_name = Some("default".to_string());
            }
        }
    }

    fn exported_declaration(&mut self, decl: &'p Declaration<'a>, source: &str) {
        match decl {
            Declaration::FunctionDeclaration(func) => {
                if let Some(id) = &func.id {
                    self.named_exports.push(id.name.to_string());
                    self.value_exports.push(id.name.to_string());
                    if id.name.as_str() == "generateMetadata" {
                        self.metadata_mut().dynamic = true;
                    }
                }
                self.function(func, source);
            }
            Declaration::ClassDeclaration(class) => {
                if let Some(id) = &class.id {
                    self.named_exports.push(id.name.to_string());
                    self.value_exports.push(id.name.to_string());
                    self.variables.push(id.name.to_string());
                }
            }
            Declaration::VariableDeclaration(var) => {
                self.variable_declaration(var, true, source);
            }
            Declaration::TSInterfaceDeclaration(iface) => {
                self.named_exports.push(iface.id.name.to_string());
                self.add_type(iface.id.name.as_str(), TypeDecl::Members(&iface.body.body));
            }
            Declaration::TSTypeAliasDeclaration(alias) => {
                self.named_exports.push(alias.id.name.to_string());
                self.add_type(alias.id.name.as_str(), TypeDecl::Alias(&alias.type_annotation));
            }
            Declaration::TSEnumDeclaration(en) => {
                self.named_exports.push(en.id.name.to_string());
                self.value_exports.push(en.id.name.to_string());
                self.variables.push(en.id.name.to_string());
            }
            _ => {}
        }
    }

    fn function(&mut self, func: &'p Function<'a>, source: &str) {
        if let Some(id) = &func.id {
            self.push_function(id.name.to_string(), func, None, source);
        }
    }

    fn push_function(
        &mut self,
        name: String,
        func: &'p Function<'a>,
        annotation: Option<&'p TSType<'a>>,
        source: &str,
    ) {
        let return_type = func.return_type.as_ref().map(|t| &t.type_annotation);
        self.note_annotation(return_type, source);
        self.note_annotation(annotation, source);
        self.functions.push(name.clone());
        self.function_refs.push(FunctionRef {
            name,
            params: &func.params,
            annotation,
            span: func.span,
        });
    }

    fn variable_declaration(&mut self, var: &'p VariableDeclaration<'a>, exported: bool, source: &str) {
        for declarator in &var.declarations {
            let mut names = Vec::new();
            binding_names(&declarator.id, &mut names);
            if exported {
                self.named_exports.extend(names.iter().cloned());
                self.value_exports.extend(names.iter().cloned());
            }

            let BindingPatternKind::BindingIdentifier(ident) = &declarator.id.kind else {
                self.variables.extend(names);
                continue;
            };
            let name = ident.name.to_string();
            let annotation = declarator.id.type_annotation.as_ref().map(|t| &t.type_annotation);

            if exported && name == "metadata" {
                if let Some(Expression::ObjectExpression(object)) =
                    declarator.init.as_ref().map(unparen)
                {
                    self.metadata_mut().static_fields = Some(metadata_fields(object, source));
                }
            }
            if exported && name == "generateMetadata" {
                self.metadata_mut().dynamic = true;
            }

            match declarator.init.as_ref().and_then(|init| function_like(init)) {
                Some(FunctionLike::Arrow(arrow)) => {
                    let return_type = arrow.return_type.as_ref().map(|t| &t.type_annotation);
                    self.note_annotation(annotation, source);
                    self.note_annotation(return_type, source);
                    self.functions.push(name.clone());
                    self.function_refs.push(FunctionRef {
                        name,
                        params: &arrow.params,
                        annotation,
                        span: declarator.span,
                    });
                }
                Some(FunctionLike::Function(func)) => {
                    self.push_function(name, func, annotation, source);
                }
                None => self.variables.push(name),
            }
        }
    }

    fn metadata_mut(&mut self) -> &mut MetadataExport {
        self.metadata.get_or_insert_with(MetadataExport::default)
    }

    /// `module.exports = x`, `exports.name = x`, `module.exports.name = x`
    fn commonjs_export(&mut self, expr: &'p Expression<'a>) {
        let Expression::AssignmentExpression(assign) = expr else {
            return;
        };
        let AssignmentTarget::StaticMemberExpression(member) = &assign.left else {
            return;
        };
        let property = member.property.name.as_str();
        match unparen(&member.object) {
            Expression::Identifier(obj) if obj.name.as_str() == "module" && property == "exports" => {
                self.has_default = true;
                if let Expression::Identifier(ident) = unparen(&assign.right) {
                    self.default_name = Some(ident.name.to_string());
                } else {
                    self.default_name = Some("default".to_string());
                }
            }
            Expression::Identifier(obj) if obj.name.as_str() == "exports" => {
                self.named_exports.push(property.to_string());
                self.value_exports.push(property.to_string());
            }
            Expression::StaticMemberExpression(inner)
                if inner.property.name.as_str() == "exports"
                    && matches!(&inner.object, Expression::Identifier(m) if m.name.as_str() == "module") =>
            {
                self.named_exports.push(property.to_string());
                self.value_exports.push(property.to_string());
            }
            _ => {}
        }
    }

    fn add_type(&mut self, name: &'p str, decl: TypeDecl<'p, 'a>) {
        self.type_names.push(name);
        self.types.insert(name, decl);
    }

    fn note_annotation(&mut self, ty: Option<&TSType<'a>>, source: &str) {
        if let Some(ty) = ty {
            if is_component_type(ty.span().source_text(source)) {
                self.component_annotation = true;
            }
        }
    }
}

pub(crate) enum FunctionLike<'p, 'a> {
    Arrow(&'p ArrowFunctionExpression<'a>),
    Function(&'p Function<'a>),
}

/// Function-valued initialisers, looking through `memo(...)` style wrappers.
pub(crate) fn function_like<'p, 'a>(expr: &'p Expression<'a>) -> Option<FunctionLike<'p, 'a>> {
    match unparen(expr) {
        Expression::ArrowFunctionExpression(arrow) => Some(FunctionLike::Arrow(arrow)),
        Expression::FunctionExpression(func) => Some(FunctionLike::Function(func)),
        Expression::CallExpression(call) if is_component_wrapper(&call.callee) => {
            call.arguments.first().and_then(|arg| match arg {
                Argument::ArrowFunctionExpression(arrow) => Some(FunctionLike::Arrow(arrow)),
                Argument::FunctionExpression(func) => Some(FunctionLike::Function(func)),
                _ => None,
            })
        }
        _ => None,
    }
}

fn is_component_wrapper(callee: &Expression<'_>) -> bool {
    let name = match callee {
        Expression::Identifier(ident) => ident.name.as_str(),
        Expression::StaticMemberExpression(member) => member.property.name.as_str(),
        _ => return false,
    };
    matches!(name, "memo" | "forwardRef" | "observer")
}

fn is_component_type(text: &str) -> bool {
    const MARKERS: &[&str] = &[
        "JSX.Element",
        "ReactElement",
        "ReactNode",
        "React.FC",
        "FC<",
        "FunctionComponent",
        "VNode",
    ];
    text == "FC" || MARKERS.iter().any(|m| text.contains(m))
}

/// Strip parentheses and TypeScript-only wrappers.
pub(crate) fn unparen<'p, 'a>(expr: &'p Expression<'a>) -> &'p Expression<'a> {
    match expr {
        Expression::ParenthesizedExpression(paren) => unparen(&paren.expression),
        Expression::TSAsExpression(e) => unparen(&e.expression),
        Expression::TSSatisfiesExpression(e) => unparen(&e.expression),
        Expression::TSNonNullExpression(e) => unparen(&e.expression),
        _ => expr,
    }
}

pub(crate) fn module_export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

/// Every identifier bound by a pattern, in source order.
pub(crate) fn binding_names(pattern: &BindingPattern<'_>, out: &mut Vec<String>) {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(ident) => out.push(ident.name.to_string()),
        BindingPatternKind::ObjectPattern(object) => {
            for prop in &object.properties {
                binding_names(&prop.value, out);
            }
            if let Some(rest) = &object.rest {
                binding_names(&rest.argument, out);
            }
        }
        BindingPatternKind::ArrayPattern(array) => {
            for element in array.elements.iter().flatten() {
                binding_names(element, out);
            }
            if let Some(rest) = &array.rest {
                binding_names(&rest.argument, out);
            }
        }
        BindingPatternKind::AssignmentPattern(assign) => binding_names(&assign.left, out),
    }
}

fn metadata_fields(object: &ObjectExpression<'_>, source: &str) -> BTreeMap<String, serde_json::Value> {
    let mut fields = BTreeMap::new();
    for prop in &object.properties {
        let ObjectPropertyKind::ObjectProperty(prop) = prop else {
            continue;
        };
        let Some(key) = prop.key.static_name() else {
            continue;
        };
        fields.insert(key.to_string(), literal_value(&prop.value, source));
    }
    fields
}

/// Literal values verbatim, anything else as a bracketed type placeholder.
pub(crate) fn literal_value(expr: &Expression<'_>, source: &str) -> serde_json::Value {
    use serde_json::Value;
    match unparen(expr) {
        Expression::StringLiteral(lit) => Value::from(lit.value.as_str()),
        Expression::NumericLiteral(lit) => number_value(lit.value)
            .unwrap_or_else(|| Value::from(lit.span.source_text(source))),
        Expression::BooleanLiteral(lit) => Value::Bool(lit.value),
        Expression::NullLiteral(_) => Value::Null,
        Expression::TemplateLiteral(tpl) if tpl.expressions.is_empty() => {
            let text = tpl.span.source_text(source);
            Value::from(text.trim_matches('`'))
        }
        Expression::ObjectExpression(_) => Value::from("[object]"),
        Expression::ArrayExpression(_) => Value::from("[array]"),
        Expression::ArrowFunctionExpression(_) | Expression::FunctionExpression(_) => {
            Value::from("[function]")
        }
        _ => Value::from("[expression]"),
    }
}

/// Whole numbers as integers, so `3` stays `3` rather than `3.0`.
fn number_value(value: f64) -> Option<serde_json::Value> {
    const SAFE: f64 = 9_007_199_254_740_991.0;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= SAFE {
        return Some(serde_json::Value::from(value as i64));
    }
    serde_json::Number::from_f64(value).map(serde_json::Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn with_scan(source: &str, check: impl FnOnce(&ModuleScan<'_, '_>)) {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::tsx()).parse();
        assert!(ret.errors.is_empty(), "{:?}", ret.errors);
        let scan = ModuleScan::scan(&ret.program, source);
        check(&scan);
    }

    #[test]
    fn collects_imports_and_bindings() {
        let source = r#"
import React, { useState } from 'react';
import * as UI from './ui';
export { helper } from './helper';
"#;
        with_scan(source, |scan| {
            assert_eq!(scan.imports, vec!["react", "./ui", "./helper"]);
            assert_eq!(scan.import_bindings.get("useState").map(String::as_str), Some("react"));
            assert_eq!(scan.namespace_imports, vec!["UI"]);
            assert_eq!(scan.named_exports, vec!["helper"]);
        });
    }

    #[test]
    fn separates_functions_from_variables() {
        let source = r#"
const LIMIT = 10;
function format(v: string) { return v }
const Button = ({ label }: { label: string }) => <button>{label}</button>;
const Wrapped = memo(function Inner() { return null });
let [a, b] = pair();
"#;
        with_scan(source, |scan| {
            assert_eq!(scan.functions, vec!["format", "Button", "Wrapped"]);
            assert_eq!(scan.variables, vec!["LIMIT", "a", "b"]);
        });
    }

    #[test]
    fn default_function_is_main_export() {
        let source = "export const helper = 1;\nexport default function useCounter() { return 0 }";
        with_scan(source, |scan| {
            assert_eq!(
                scan.main_export(),
                Some(MainExport {
                    name: "useCounter".into(),
                    is_function: true
                })
            );
        });
    }

    #[test]
    fn sole_export_requires_a_single_value_export() {
        with_scan("export function useA() {}\nexport function useB() {}", |scan| {
            assert_eq!(scan.main_export().map(|m| m.name), Some("useA".to_string()));
            assert_eq!(scan.sole_export(), None);
        });
        with_scan("export type Options = {};\nexport function useA() {}", |scan| {
            assert_eq!(scan.sole_export().map(|m| m.name), Some("useA".to_string()));
        });
        with_scan("export function helper() {}\nexport default function useA() {}", |scan| {
            assert_eq!(scan.sole_export().map(|m| m.name), Some("useA".to_string()));
        });
    }

    #[test]
    fn default_identifier_resolves_function_flag() {
        let source = "const Card = () => null;\nexport default Card;";
        with_scan(source, |scan| {
            assert!(scan.has_default);
            assert_eq!(scan.main_export().map(|m| m.is_function), Some(true));
        });
    }

    #[test]
    fn whole_numbers_stay_integers() {
        assert_eq!(number_value(3.0), Some(serde_json::json!(3)));
        assert_eq!(number_value(-40.0), Some(serde_json::json!(-40)));
        assert_eq!(number_value(1.5), Some(serde_json::json!(1.5)));
        assert_eq!(number_value(1e300).map(|v| v.is_f64()), Some(true));
        assert_eq!(number_value(f64::NAN), None);
    }

    #[test]
    fn star_reexport_is_opaque() {
        with_scan("export * from './a';\nexport * as b from './b';", |scan| {
            assert!(scan.opaque_reexport);
            assert_eq!(scan.named_exports, vec!["b"]);
        });
    }

    #[test]
    fn type_exports_are_named_but_not_values() {
        let source = "export interface ButtonProps { label: string }\nexport type Size = 'sm' | 'lg';\nexport function Button() {}";
        with_scan(source, |scan| {
            assert_eq!(scan.named_exports, vec!["ButtonProps", "Size", "Button"]);
            assert_eq!(scan.value_exports, vec!["Button"]);
            assert_eq!(scan.type_names, vec!["ButtonProps", "Size"]);
        });
    }

    #[test]
    fn commonjs_exports() {
        with_scan("module.exports = run;\nexports.helper = 1;", |scan| {
            assert!(scan.has_default);
            assert_eq!(scan.default_name.as_deref(), Some("run"));
            assert_eq!(scan.named_exports, vec!["helper"]);
        });
    }

    #[test]
    fn metadata_object_and_generator() {
        let source = r#"
export const metadata = { title: 'Home', priority: 1, robots: { index: true }, draft: null };
export async function generateMetadata() { return {} }
"#;
        with_scan(source, |scan| {
            let metadata = scan.metadata.as_ref().unwrap();
            assert!(metadata.dynamic);
            let fields = metadata.static_fields.as_ref().unwrap();
            assert_eq!(fields["title"], serde_json::json!("Home"));
            assert_eq!(fields["priority"], serde_json::json!(1.0));
            assert_eq!(fields["robots"], serde_json::json!("[object]"));
            assert_eq!(fields["draft"], serde_json::Value::Null);
        });
    }

    #[test]
    fn component_return_annotation() {
        with_scan("export function Card(): JSX.Element { return null as any }", |scan| {
            assert!(scan.component_annotation);
        });
    }
}
