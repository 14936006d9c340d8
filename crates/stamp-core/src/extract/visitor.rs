//! Body-level fact collection: hook calls, markup, state, routes.

use std::collections::{BTreeMap, BTreeSet};

use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_span::GetSpan;

use super::interface::{self, InterfaceFacts};
use super::module::{TypeDecls, unparen};
use crate::model::ApiRoute;

const ROUTE_VERBS: &[&str] = &[
    "get", "post", "put", "patch", "delete", "options", "head", "all",
];

const NEST_VERBS: &[&str] = &[
    "Get", "Post", "Put", "Patch", "Delete", "Options", "Head", "All",
];

const VUE_STATE_PRIMITIVES: &[&str] = &[
    "ref",
    "shallowRef",
    "reactive",
    "shallowReactive",
    "computed",
    "watch",
    "watchEffect",
];

const VUE_REGISTRATION: &[&str] = &[
    "defineComponent",
    "defineProps",
    "defineEmits",
    "defineExpose",
    "defineOptions",
    "defineSlots",
];

pub(crate) const INLINE_HANDLER: &str = "<inline>";

/// Facts found anywhere in the module, including nested function bodies.
#[derive(Debug, Default)]
pub(crate) struct BodyFacts {
    pub hooks: BTreeSet<String>,
    pub components: BTreeSet<String>,
    /// Start offsets of every JSX element and fragment.
    pub markup_positions: Vec<u32>,
    pub create_element: bool,
    /// `require('x')` and `import('x')` specifiers.
    pub dynamic_imports: Vec<String>,
    pub state: BTreeMap<String, String>,
    pub vue_state: bool,
    pub vue_registration: bool,
    /// Props and emits from `defineProps` / `defineEmits` / `defineComponent`.
    pub vue_interface: InterfaceFacts,
    pub routes: Vec<ApiRoute>,
    pub nest_controller: bool,
    pub reads_argv: bool,
}

impl BodyFacts {
    pub fn has_markup(&self) -> bool {
        !self.markup_positions.is_empty()
    }

    /// Whether any markup starts inside `[start, end)`.
    pub fn markup_within(&self, start: u32, end: u32) -> bool {
        self.markup_positions
            .iter()
            .any(|&pos| pos >= start && pos < end)
    }
}

pub(crate) struct FactVisitor<'s, 'p, 'a> {
    source: &'s str,
    types: &'s TypeDecls<'p, 'a>,
    namespace_imports: &'s [String],
    pub facts: BodyFacts,
}

impl<'s, 'p, 'a> FactVisitor<'s, 'p, 'a> {
    pub fn new(
        source: &'s str,
        types: &'s TypeDecls<'p, 'a>,
        namespace_imports: &'s [String],
    ) -> Self {
        Self {
            source,
            types,
            namespace_imports,
            facts: BodyFacts::default(),
        }
    }

    pub fn collect(mut self, program: &Program<'_>) -> BodyFacts {
        self.visit_program(program);
        self.facts.routes.sort();
        self.facts.routes.dedup();
        self.facts
    }

    fn component_name(&self, tag: &str) -> Option<String> {
        if tag.contains(':') {
            return None;
        }
        let mut segments = tag.split('.');
        let root = segments.next()?;
        let last = segments.last();
        if last == Some("Fragment") {
            return None;
        }
        let name = match last {
            Some(last) if self.namespace_imports.iter().any(|ns| ns == root) => last,
            _ => root,
        };
        let starts_upper = name.chars().next().is_some_and(|c| c.is_ascii_uppercase());
        (starts_upper && name != "Fragment").then(|| name.to_string())
    }

    fn define_call(&mut self, name: &str, call: &CallExpression<'_>) {
        let type_arg = call
            .type_arguments
            .as_ref()
            .and_then(|args| args.params.first());
        let first_arg = call.arguments.first().and_then(Argument::as_expression);
        let out = &mut self.facts.vue_interface;
        match name {
            "defineProps" => {
                if let Some(ty) = type_arg {
                    interface::from_type(ty, self.types, self.source, out);
                } else if let Some(expr) = first_arg {
                    interface::from_runtime_props(expr, out);
                }
            }
            "defineEmits" => {
                if let Some(ty) = type_arg {
                    interface::from_emit_type(ty, self.types, self.source, out);
                } else if let Some(expr) = first_arg {
                    interface::from_runtime_emits(expr, self.source, out);
                }
            }
            "defineComponent" => {
                if let Some(Expression::ObjectExpression(object)) = first_arg.map(unparen) {
                    component_options(object, self.source, out);
                }
            }
            _ => {}
        }
    }

    fn route_call(&mut self, member: &StaticMemberExpression<'_>, call: &CallExpression<'_>) {
        let verb = member.property.name.as_str();
        if !ROUTE_VERBS.contains(&verb) || call.arguments.len() < 2 {
            return;
        }
        let Some(path) = call
            .arguments
            .first()
            .and_then(Argument::as_expression)
            .and_then(string_value)
        else {
            return;
        };
        if !(path.starts_with('/') || path == "*") {
            return;
        }
        let handler = call
            .arguments
            .last()
            .and_then(Argument::as_expression)
            .map_or_else(|| INLINE_HANDLER.to_string(), |e| handler_name(e, self.source));
        self.facts.routes.push(ApiRoute {
            method: verb.to_ascii_uppercase(),
            params: path_params(&path),
            path,
            handler,
        });
    }

    fn nest_routes(&mut self, class: &Class<'_>) {
        let Some(prefix) = class
            .decorators
            .iter()
            .find_map(|d| decorator_call(d, &["Controller"]).map(|(_, arg)| arg))
        else {
            return;
        };
        self.facts.nest_controller = true;

        for element in &class.body.body {
            let ClassElement::MethodDefinition(method) = element else {
                continue;
            };
            let Some((verb, sub_path)) = method
                .decorators
                .iter()
                .find_map(|d| decorator_call(d, NEST_VERBS))
            else {
                continue;
            };
            let path = join_route(prefix.as_deref().unwrap_or(""), sub_path.as_deref().unwrap_or(""));
            let mut params = path_params(&path);
            for param in &method.value.params.items {
                for decorator in &param.decorators {
                    if let Some((_, Some(name))) = decorator_call(decorator, &["Param"]) {
                        if !params.contains(&name) {
                            params.push(name);
                        }
                    }
                }
            }
            let handler = method
                .key
                .static_name()
                .map_or_else(|| INLINE_HANDLER.to_string(), |n| n.to_string());
            self.facts.routes.push(ApiRoute {
                method: verb.to_ascii_uppercase(),
                path,
                params,
                handler,
            });
        }
    }

    fn state_binding(&mut self, declarator: &VariableDeclarator<'_>) {
        let Some(Expression::CallExpression(call)) = declarator.init.as_ref().map(unparen) else {
            return;
        };
        let Some(callee) = callee_name(&call.callee) else {
            return;
        };
        let type_arg = call
            .type_arguments
            .as_ref()
            .and_then(|args| args.params.first());
        let arg = |index: usize| call.arguments.get(index).and_then(Argument::as_expression);

        let (name, init) = match (callee, &declarator.id.kind) {
            ("useState", BindingPatternKind::ArrayPattern(array)) => {
                (first_array_binding(array), arg(0))
            }
            ("useReducer", BindingPatternKind::ArrayPattern(array)) => {
                (first_array_binding(array), arg(1))
            }
            (
                "ref" | "shallowRef" | "reactive" | "shallowReactive" | "computed",
                BindingPatternKind::BindingIdentifier(ident),
            ) => (Some(ident.name.to_string()), arg(0)),
            _ => return,
        };
        if let Some(name) = name {
            let ty = interface::infer_state_type(type_arg, init, self.source);
            self.facts.state.insert(name, ty);
        }
    }
}

impl<'ast> Visit<'ast> for FactVisitor<'_, '_, '_> {
    fn visit_call_expression(&mut self, call: &CallExpression<'ast>) {
        if let Some(name) = callee_name(&call.callee) {
            if is_hook_name(name) {
                self.facts.hooks.insert(name.to_string());
            }
            if name == "createElement" {
                self.facts.create_element = true;
            }
            if VUE_STATE_PRIMITIVES.contains(&name) {
                self.facts.vue_state = true;
            }
            if VUE_REGISTRATION.contains(&name) {
                self.facts.vue_registration = true;
                self.define_call(name, call);
            }
            if name == "require" && matches!(&call.callee, Expression::Identifier(_)) {
                if let Some(spec) = call
                    .arguments
                    .first()
                    .and_then(Argument::as_expression)
                    .and_then(string_value)
                {
                    self.facts.dynamic_imports.push(spec);
                }
            }
        }
        if let Expression::StaticMemberExpression(member) = &call.callee {
            self.route_call(member, call);
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'ast>) {
        if let Some(spec) = string_value(&expr.source) {
            self.facts.dynamic_imports.push(spec);
        }
        walk::walk_import_expression(self, expr);
    }

    fn visit_jsx_opening_element(&mut self, element: &JSXOpeningElement<'ast>) {
        self.facts.markup_positions.push(element.span.start);
        let tag = element.name.span().source_text(self.source);
        if let Some(name) = self.component_name(tag) {
            self.facts.components.insert(name);
        }
        walk::walk_jsx_opening_element(self, element);
    }

    fn visit_jsx_fragment(&mut self, fragment: &JSXFragment<'ast>) {
        self.facts.markup_positions.push(fragment.span.start);
        walk::walk_jsx_fragment(self, fragment);
    }

    fn visit_variable_declarator(&mut self, declarator: &VariableDeclarator<'ast>) {
        self.state_binding(declarator);
        walk::walk_variable_declarator(self, declarator);
    }

    fn visit_class(&mut self, class: &Class<'ast>) {
        self.nest_routes(class);
        walk::walk_class(self, class);
    }

    fn visit_static_member_expression(&mut self, member: &StaticMemberExpression<'ast>) {
        if member.property.name.as_str() == "argv"
            && matches!(&member.object, Expression::Identifier(obj) if obj.name.as_str() == "process")
        {
            self.facts.reads_argv = true;
        }
        walk::walk_static_member_expression(self, member);
    }
}

/// Props and emits from a Vue options object (`export default { props, emits }`).
pub(crate) fn component_options(object: &ObjectExpression<'_>, source: &str, out: &mut InterfaceFacts) {
    for prop in &object.properties {
        let ObjectPropertyKind::ObjectProperty(prop) = prop else {
            continue;
        };
        match prop.key.static_name().as_deref() {
            Some("props") => interface::from_runtime_props(&prop.value, out),
            Some("emits") => interface::from_runtime_emits(&prop.value, source, out),
            _ => {}
        }
    }
}

pub(crate) fn is_hook_name(name: &str) -> bool {
    name.strip_prefix("use")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// `foo(...)` and `React.foo(...)` both report `foo`.
fn callee_name<'e>(callee: &'e Expression<'_>) -> Option<&'e str> {
    match unparen(callee) {
        Expression::Identifier(ident) => Some(ident.name.as_str()),
        Expression::StaticMemberExpression(member) => Some(member.property.name.as_str()),
        _ => None,
    }
}

fn string_value(expr: &Expression<'_>) -> Option<String> {
    match unparen(expr) {
        Expression::StringLiteral(lit) => Some(lit.value.to_string()),
        Expression::TemplateLiteral(tpl) if tpl.expressions.is_empty() => tpl
            .quasis
            .first()
            .map(|q| q.value.raw.to_string()),
        _ => None,
    }
}

fn handler_name(expr: &Expression<'_>, source: &str) -> String {
    match unparen(expr) {
        Expression::Identifier(ident) => ident.name.to_string(),
        Expression::StaticMemberExpression(member) => member.span.source_text(source).to_string(),
        // asyncHandler(listUsers)
        Expression::CallExpression(call) => match call.arguments.first() {
            Some(Argument::Identifier(ident)) => ident.name.to_string(),
            _ => INLINE_HANDLER.to_string(),
        },
        _ => INLINE_HANDLER.to_string(),
    }
}

/// `@Name('arg')` or `@Name()` when `Name` is one of `names`.
fn decorator_call<'d>(
    decorator: &'d Decorator<'_>,
    names: &[&'d str],
) -> Option<(&'d str, Option<String>)> {
    let Expression::CallExpression(call) = &decorator.expression else {
        return None;
    };
    let Expression::Identifier(ident) = &call.callee else {
        return None;
    };
    let name = names.iter().copied().find(|n| *n == ident.name.as_str())?;
    let arg = call
        .arguments
        .first()
        .and_then(Argument::as_expression)
        .and_then(string_value);
    Some((name, arg))
}

fn join_route(prefix: &str, sub_path: &str) -> String {
    let parts: Vec<&str> = [prefix, sub_path]
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect();
    format!("/{}", parts.join("/"))
}

pub(crate) fn path_params(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix(':'))
        .map(|name| name.trim_end_matches('?').to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

fn first_array_binding(array: &ArrayPattern<'_>) -> Option<String> {
    match array.elements.first()?.as_ref()?.kind {
        BindingPatternKind::BindingIdentifier(ref ident) => Some(ident.name.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::module::ModuleScan;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn collect(source: &str) -> BodyFacts {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::tsx()).parse();
        assert!(ret.errors.is_empty(), "{:?}", ret.errors);
        let scan = ModuleScan::scan(&ret.program, source);
        FactVisitor::new(source, &scan.types, &scan.namespace_imports).collect(&ret.program)
    }

    #[test]
    fn hooks_components_and_state() {
        let facts = collect(
            r#"
import * as UI from './ui';
export function Counter() {
  const [count, setCount] = useState<number>(0);
  const [open] = React.useState(false);
  const theme = useTheme();
  return <UI.Card><Button onClick={() => setCount(count + 1)} /><div /></UI.Card>;
}
"#,
        );
        assert_eq!(
            facts.hooks.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["useState", "useTheme"]
        );
        assert_eq!(
            facts.components.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["Button", "Card"]
        );
        assert_eq!(facts.state["count"], "number");
        assert_eq!(facts.state["open"], "boolean");
        assert_eq!(facts.markup_positions.len(), 3);
    }

    #[test]
    fn member_tags_use_root_unless_namespace() {
        let facts = collect("const x = <Menu.Item><React.Fragment /></Menu.Item>;");
        assert!(facts.components.contains("Menu"));
        assert!(!facts.components.contains("Item"));
        assert!(!facts.components.contains("React"));
        assert_eq!(facts.markup_positions.len(), 2);
    }

    #[test]
    fn express_routes() {
        let facts = collect(
            r#"
const app = express();
app.get('/users/:id', auth, getUser);
app.post('/users', async (req, res) => res.send('ok'));
router.delete('/users/:id/:tab?', handlers.remove);
app.get('port');
"#,
        );
        assert_eq!(facts.routes.len(), 3);
        let get = facts.routes.iter().find(|r| r.method == "GET").unwrap();
        assert_eq!(get.path, "/users/:id");
        assert_eq!(get.params, vec!["id"]);
        assert_eq!(get.handler, "getUser");
        let post = facts.routes.iter().find(|r| r.method == "POST").unwrap();
        assert_eq!(post.handler, INLINE_HANDLER);
        let delete = facts.routes.iter().find(|r| r.method == "DELETE").unwrap();
        assert_eq!(delete.params, vec!["id", "tab"]);
        assert_eq!(delete.handler, "handlers.remove");
    }

    #[test]
    fn nest_controller_routes() {
        let facts = collect(
            r#"
@Controller('users')
export class UsersController {
  @Get(':id')
  findOne(@Param('id') id: string, @Query('q') q: string) {}
  @Post()
  create() {}
  helper() {}
}
"#,
        );
        assert!(facts.nest_controller);
        assert_eq!(
            facts.routes,
            vec![
                ApiRoute {
                    method: "GET".into(),
                    path: "/users/:id".into(),
                    params: vec!["id".into()],
                    handler: "findOne".into(),
                },
                ApiRoute {
                    method: "POST".into(),
                    path: "/users".into(),
                    params: vec![],
                    handler: "create".into(),
                },
            ]
        );
    }

    #[test]
    fn vue_define_macros() {
        let facts = collect(
            r#"
const props = defineProps<{ title: string; size?: number }>();
const emit = defineEmits<{ (e: 'close'): void; (e: 'select', id: number): void }>();
const count = ref(0);
"#,
        );
        assert!(facts.vue_registration);
        assert!(facts.vue_state);
        assert_eq!(facts.vue_interface.props["title"].ty, "string");
        assert!(facts.vue_interface.props["size"].optional);
        assert_eq!(facts.vue_interface.emits["select"].signature, "(id:number)");
        assert_eq!(facts.vue_interface.emits["close"].signature, "()");
        assert_eq!(facts.state["count"], "number");
    }

    #[test]
    fn argv_and_dynamic_imports() {
        let facts = collect(
            "const args = process.argv.slice(2); const fs = require('fs'); import('./lazy');",
        );
        assert!(facts.reads_argv);
        assert_eq!(facts.dynamic_imports, vec!["fs", "./lazy"]);
    }

    #[test]
    fn hook_names() {
        assert!(is_hook_name("useState"));
        assert!(is_hook_name("use3D"));
        assert!(!is_hook_name("use"));
        assert!(!is_hook_name("user"));
        assert!(!is_hook_name("useless"));
    }
}
