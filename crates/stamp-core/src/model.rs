//! Vocabulary shared by extracted facts and contracts.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Classification of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    #[serde(rename = "react:component")]
    ReactComponent,
    #[serde(rename = "react:hook")]
    ReactHook,
    #[serde(rename = "vue:component")]
    VueComponent,
    #[serde(rename = "vue:composable")]
    VueComposable,
    #[serde(rename = "node:cli")]
    NodeCli,
    #[serde(rename = "node:api")]
    NodeApi,
    #[serde(rename = "ts:module")]
    TsModule,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::ReactComponent => "react:component",
            Kind::ReactHook => "react:hook",
            Kind::VueComponent => "vue:component",
            Kind::VueComposable => "vue:composable",
            Kind::NodeCli => "node:cli",
            Kind::NodeApi => "node:api",
            Kind::TsModule => "ts:module",
        }
    }

    pub fn is_component(self) -> bool {
        matches!(self, Kind::ReactComponent | Kind::VueComponent)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Export shape of a module.
///
/// `NamedOpaque` means the module has named exports whose names cannot be
/// enumerated (for example `export * from './x'`). Consumers that filter by
/// exported name must treat it like `Default` and `None`: not enumerable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Exports {
    #[default]
    None,
    Default,
    Named(Vec<String>),
    NamedOpaque,
}

impl Exports {
    /// Build a `Named` variant with sorted, unique names.
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        Exports::Named(names)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Exports::None)
    }

    /// Names that can be enumerated, if any.
    pub fn enumerable(&self) -> Option<&[String]> {
        match self {
            Exports::Named(names) => Some(names),
            Exports::None | Exports::Default | Exports::NamedOpaque => None,
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        match self {
            Exports::None => serde_json::Value::Null,
            Exports::Default => serde_json::Value::from("default"),
            Exports::NamedOpaque => serde_json::Value::from("named"),
            Exports::Named(names) => serde_json::json!({ "named": names }),
        }
    }
}

impl Serialize for Exports {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Exports::None => serializer.serialize_none(),
            Exports::Default => serializer.serialize_str("default"),
            Exports::NamedOpaque => serializer.serialize_str("named"),
            Exports::Named(names) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("named", names)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Exports {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Tag(String),
            Named { named: Vec<String> },
            Null(()),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Tag(tag) if tag == "default" => Ok(Exports::Default),
            Raw::Tag(tag) if tag == "named" => Ok(Exports::NamedOpaque),
            Raw::Tag(other) => Err(de::Error::custom(format!(
                "unknown exports tag '{other}', expected \"default\" or \"named\""
            ))),
            Raw::Named { named } => Ok(Exports::named(named)),
            Raw::Null(()) => Ok(Exports::None),
        }
    }
}

/// A component prop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropSpec {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub literals: Vec<String>,
}

impl PropSpec {
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            optional: false,
            literals: Vec::new(),
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }
}

/// A component event or callback prop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitSpec {
    pub signature: String,
}

impl EmitSpec {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
        }
    }
}

/// Backend route framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFramework {
    Express,
    Fastify,
    Koa,
    Hono,
    Nestjs,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApiRoute {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub params: Vec<String>,
    pub handler: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSignature {
    pub framework: ApiFramework,
    pub routes: Vec<ApiRoute>,
}

/// Role of a file in directory-based routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteRole {
    Page,
    Layout,
    Loading,
    Error,
    NotFound,
    Template,
    Default,
    Route,
}

impl RouteRole {
    pub fn from_stem(stem: &str) -> Option<Self> {
        Some(match stem {
            "page" => RouteRole::Page,
            "layout" => RouteRole::Layout,
            "loading" => RouteRole::Loading,
            "error" => RouteRole::Error,
            "not-found" => RouteRole::NotFound,
            "template" => RouteRole::Template,
            "default" => RouteRole::Default,
            "route" => RouteRole::Route,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetadataExport {
    #[serde(rename = "static", default, skip_serializing_if = "Option::is_none")]
    pub static_fields: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub dynamic: bool,
}

/// Meta-framework annotations for files under an app-routing directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_role: Option<RouteRole>,
    pub segment_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataExport>,
}

fn is_false(value: &bool) -> bool {
    !*value
}
