//! File classification as an ordered decision table.
//!
//! Rules are evaluated top-down and the first match wins. Each rule only reads
//! precomputed [`Signals`], so a rule can be tested without parsing anything.

use crate::model::{ApiFramework, Kind};

/// Boolean facts the classification rules read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    /// Backend framework import plus at least one route registration.
    pub api_routes: bool,
    pub vue_import: bool,
    pub react_import: bool,
    /// `.tsx` / `.jsx` file.
    pub jsx_file: bool,
    /// The main export is a `use`-prefixed function.
    pub main_export_hook: bool,
    /// The default export, or the only named value export, is a
    /// `use`-prefixed function.
    pub sole_export_hook: bool,
    /// Any markup element or fragment anywhere in the file.
    pub markup: bool,
    /// A PascalCase function renders markup, or an SFC has a template.
    pub declares_markup_component: bool,
    pub vue_state: bool,
    pub vue_registration: bool,
    pub has_hooks: bool,
    pub has_components: bool,
    pub create_element: bool,
    /// A binding or return type names a component type (`JSX.Element`, `FC<...>`).
    pub component_annotation: bool,
    pub in_cli_dir: bool,
    pub reads_argv: bool,
}

/// One row of the decision table.
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&Signals) -> bool,
    pub kind: Kind,
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "api-routes",
        applies: |s| s.api_routes,
        kind: Kind::NodeApi,
    },
    Rule {
        name: "vue-composable",
        applies: |s| {
            s.vue_import && s.sole_export_hook && !s.markup && !s.declares_markup_component
        },
        kind: Kind::VueComposable,
    },
    Rule {
        name: "vue-component",
        applies: |s| s.vue_import && (s.vue_state || s.vue_registration || s.declares_markup_component),
        kind: Kind::VueComponent,
    },
    Rule {
        name: "react-hook",
        applies: |s| s.main_export_hook && !s.markup,
        kind: Kind::ReactHook,
    },
    Rule {
        name: "hooks-or-components",
        applies: |s| s.has_hooks || s.has_components,
        kind: Kind::ReactComponent,
    },
    Rule {
        name: "react-markup",
        applies: |s| {
            let react_family = s.react_import || (s.jsx_file && !s.vue_import);
            react_family && (s.markup || s.create_element || s.component_annotation)
        },
        kind: Kind::ReactComponent,
    },
    Rule {
        name: "cli",
        applies: |s| s.in_cli_dir || s.reads_argv,
        kind: Kind::NodeCli,
    },
    Rule {
        name: "module",
        applies: |_| true,
        kind: Kind::TsModule,
    },
];

/// The first matching rule.
pub fn matching_rule(signals: &Signals) -> &'static Rule {
    RULES
        .iter()
        .find(|rule| (rule.applies)(signals))
        .unwrap_or(&RULES[RULES.len() - 1])
}

pub fn classify(signals: &Signals) -> Kind {
    matching_rule(signals).kind
}

/// Backend framework implied by a module specifier.
pub(crate) fn api_framework(specifier: &str) -> Option<ApiFramework> {
    match specifier {
        "express" => Some(ApiFramework::Express),
        "fastify" => Some(ApiFramework::Fastify),
        "koa" | "koa-router" | "@koa/router" => Some(ApiFramework::Koa),
        "hono" => Some(ApiFramework::Hono),
        "@nestjs/common" | "@nestjs/core" => Some(ApiFramework::Nestjs),
        s if s.starts_with("hono/") => Some(ApiFramework::Hono),
        _ => None,
    }
}

pub(crate) fn is_react_specifier(specifier: &str) -> bool {
    matches!(specifier, "react" | "react-dom" | "react-native" | "preact")
        || specifier.starts_with("react/")
        || specifier.starts_with("react-dom/")
        || specifier.starts_with("preact/")
}

pub(crate) fn is_vue_specifier(specifier: &str) -> bool {
    matches!(specifier, "vue" | "nuxt" | "#imports") || specifier.starts_with("@vue/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_wins_over_everything() {
        let signals = Signals {
            api_routes: true,
            react_import: true,
            markup: true,
            has_hooks: true,
            ..Signals::default()
        };
        assert_eq!(classify(&signals), Kind::NodeApi);
    }

    #[test]
    fn vue_composable_needs_hook_export_without_markup() {
        let mut signals = Signals {
            vue_import: true,
            main_export_hook: true,
            sole_export_hook: true,
            vue_state: true,
            ..Signals::default()
        };
        assert_eq!(classify(&signals), Kind::VueComposable);

        signals.declares_markup_component = true;
        assert_eq!(classify(&signals), Kind::VueComponent);
    }

    #[test]
    fn several_hook_exports_are_not_a_composable() {
        let signals = Signals {
            vue_import: true,
            main_export_hook: true,
            sole_export_hook: false,
            vue_state: true,
            ..Signals::default()
        };
        assert_eq!(matching_rule(&signals).name, "vue-component");
        assert_eq!(classify(&signals), Kind::VueComponent);
    }

    #[test]
    fn vue_component_from_state_or_registration() {
        let state = Signals {
            vue_import: true,
            vue_state: true,
            ..Signals::default()
        };
        assert_eq!(matching_rule(&state).name, "vue-component");

        let registration = Signals {
            vue_import: true,
            vue_registration: true,
            ..Signals::default()
        };
        assert_eq!(classify(&registration), Kind::VueComponent);

        // A vue import alone says nothing.
        let bare = Signals {
            vue_import: true,
            ..Signals::default()
        };
        assert_eq!(classify(&bare), Kind::TsModule);
    }

    #[test]
    fn react_hook_requires_no_markup() {
        let mut signals = Signals {
            main_export_hook: true,
            has_hooks: true,
            ..Signals::default()
        };
        assert_eq!(classify(&signals), Kind::ReactHook);

        signals.markup = true;
        assert_eq!(classify(&signals), Kind::ReactComponent);
        assert_eq!(matching_rule(&signals).name, "hooks-or-components");
    }

    #[test]
    fn hooks_or_components_imply_component() {
        let signals = Signals {
            has_components: true,
            ..Signals::default()
        };
        assert_eq!(classify(&signals), Kind::ReactComponent);
    }

    #[test]
    fn react_markup_rule() {
        let annotated = Signals {
            react_import: true,
            component_annotation: true,
            ..Signals::default()
        };
        assert_eq!(matching_rule(&annotated).name, "react-markup");

        let jsx_only = Signals {
            jsx_file: true,
            markup: true,
            ..Signals::default()
        };
        assert_eq!(classify(&jsx_only), Kind::ReactComponent);

        let import_only = Signals {
            react_import: true,
            ..Signals::default()
        };
        assert_eq!(classify(&import_only), Kind::TsModule);
    }

    #[test]
    fn cli_by_directory_or_argv() {
        let dir = Signals {
            in_cli_dir: true,
            ..Signals::default()
        };
        assert_eq!(classify(&dir), Kind::NodeCli);
        let argv = Signals {
            reads_argv: true,
            ..Signals::default()
        };
        assert_eq!(classify(&argv), Kind::NodeCli);
    }

    #[test]
    fn fallback_is_module() {
        assert_eq!(classify(&Signals::default()), Kind::TsModule);
        assert_eq!(RULES.last().map(|r| r.name), Some("module"));
    }

    #[test]
    fn framework_specifiers() {
        assert_eq!(api_framework("express"), Some(ApiFramework::Express));
        assert_eq!(api_framework("@koa/router"), Some(ApiFramework::Koa));
        assert_eq!(api_framework("hono/cors"), Some(ApiFramework::Hono));
        assert_eq!(api_framework("@nestjs/common"), Some(ApiFramework::Nestjs));
        assert_eq!(api_framework("axios"), None);
        assert!(is_react_specifier("react/jsx-runtime"));
        assert!(!is_react_specifier("reactive-utils"));
        assert!(is_vue_specifier("@vue/runtime-core"));
    }
}
