//! Attribute lookup hook for documentation builds.
//!
//! For instrument classes, attributes that plain introspection cannot see are
//! recovered from constructor source code and shown as placeholders.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::DOC_EXTENSION_VERSION;
use crate::doc_attrs::class_model::{ClassMember, ClassRegistry};
use crate::doc_attrs::source_scan::{scan_constructor_assignments, PlaceholderValue};

/// Default name of the class every instrument driver derives from.
pub const DEFAULT_INSTRUMENT_BASE: &str = "InstrumentBase";

/// What the documentation shows for an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocValue {
    /// Class-level value found by introspection (normalized source text).
    Value(String),
    Method(String),
    /// Recovered from a constructor assignment.
    Placeholder(PlaceholderValue),
    /// The default handed in by the caller.
    Default(String),
    Missing,
}

impl fmt::Display for DocValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocValue::Value(text) | DocValue::Default(text) => f.write_str(text),
            DocValue::Method(name) => write!(f, "<method {name}>"),
            DocValue::Placeholder(placeholder) => fmt::Display::fmt(placeholder, f),
            DocValue::Missing => f.write_str("<missing>"),
        }
    }
}

/// One attribute lookup.
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    pub registry: &'a ClassRegistry,
    pub owner: &'a str,
    pub attribute: &'a str,
    pub default: Option<&'a str>,
}

/// A step of the resolution chain. Returns `None` to pass the lookup on.
pub trait AttributeResolver {
    fn name(&self) -> &'static str;
    fn resolve(&self, lookup: &Lookup) -> Option<DocValue>;
}

/// Class-level attributes and methods along the MRO.
pub struct IntrospectionResolver;

impl AttributeResolver for IntrospectionResolver {
    fn name(&self) -> &'static str {
        "introspection"
    }

    fn resolve(&self, lookup: &Lookup) -> Option<DocValue> {
        lookup.registry.mro(lookup.owner).iter().find_map(|class| {
            let member = lookup.registry.get(class)?.members.get(lookup.attribute)?;
            Some(match member {
                ClassMember::Value(text) => DocValue::Value(text.clone()),
                ClassMember::Method => DocValue::Method(lookup.attribute.to_string()),
            })
        })
    }
}

/// Constructor assignments, searched from the most-derived class down.
pub struct SourceScanResolver;

impl AttributeResolver for SourceScanResolver {
    fn name(&self) -> &'static str {
        "source scan"
    }

    fn resolve(&self, lookup: &Lookup) -> Option<DocValue> {
        log::debug!(
            "Attempting to load attribute {} on {} via parsing",
            lookup.attribute,
            lookup.owner
        );
        for class in lookup.registry.mro(lookup.owner) {
            // classes outside the scanned sources have no source text
            let Some(def) = lookup.registry.get(&class) else {
                continue;
            };
            let mut found = scan_constructor_assignments(&def.source, &def.name);
            if let Some(placeholder) = found.remove(lookup.attribute) {
                return Some(DocValue::Placeholder(placeholder));
            }
        }
        None
    }
}

/// The generator's own behavior: introspection, then the supplied default.
pub struct DefaultResolver;

impl AttributeResolver for DefaultResolver {
    fn name(&self) -> &'static str {
        "default"
    }

    fn resolve(&self, lookup: &Lookup) -> Option<DocValue> {
        log::debug!(
            "Falling back to default attribute loader for {} on {}",
            lookup.attribute,
            lookup.owner
        );
        Some(plain_resolution(lookup))
    }
}

fn plain_resolution(lookup: &Lookup) -> DocValue {
    IntrospectionResolver
        .resolve(lookup)
        .or_else(|| lookup.default.map(|d| DocValue::Default(d.to_string())))
        .unwrap_or(DocValue::Missing)
}

/// Anything the documentation generator can call for attribute values.
pub trait AttrGetter {
    fn get_attr(&self, owner: &str, attribute: &str, default: Option<&str>) -> DocValue;
}

/// The generator's registration point for attribute getters.
pub trait AttrGetterRegistry {
    fn setup_extension(&mut self, name: &str);
    fn add_attr_getter(&mut self, target: &str, getter: Box<dyn AttrGetter>);
}

/// Resolves attributes of instrument classes through a chain of resolvers.
pub struct ParameterAttrHook {
    registry: ClassRegistry,
    instrument_base: String,
    resolvers: Vec<Box<dyn AttributeResolver>>,
}

impl ParameterAttrHook {
    pub fn new(registry: ClassRegistry) -> Self {
        Self {
            registry,
            instrument_base: DEFAULT_INSTRUMENT_BASE.to_string(),
            resolvers: vec![
                Box::new(IntrospectionResolver),
                Box::new(SourceScanResolver),
                Box::new(DefaultResolver),
            ],
        }
    }

    pub fn with_instrument_base(mut self, base: impl Into<String>) -> Self {
        self.instrument_base = base.into();
        self
    }

    pub fn with_resolvers(mut self, resolvers: Vec<Box<dyn AttributeResolver>>) -> Self {
        self.resolvers = resolvers;
        self
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    fn intercepts(&self, owner: &str, attribute: &str) -> bool {
        !attribute.starts_with('_') && self.registry.is_subclass_of(owner, &self.instrument_base)
    }

    pub fn resolve_attribute(&self, owner: &str, attribute: &str, default: Option<&str>) -> DocValue {
        let lookup = Lookup {
            registry: &self.registry,
            owner,
            attribute,
            default,
        };
        if !self.intercepts(owner, attribute) {
            return plain_resolution(&lookup);
        }
        for resolver in &self.resolvers {
            if let Some(value) = resolver.resolve(&lookup) {
                log::trace!("{owner}.{attribute} resolved by {}", resolver.name());
                return value;
            }
        }
        plain_resolution(&lookup)
    }

    /// Every constructor-assigned attribute visible on `owner`. Derived
    /// classes override their bases.
    pub fn constructor_attributes(&self, owner: &str) -> BTreeMap<String, PlaceholderValue> {
        let mut attributes = BTreeMap::new();
        for class in self.registry.mro(owner).iter().rev() {
            if let Some(def) = self.registry.get(class) {
                attributes.extend(scan_constructor_assignments(&def.source, &def.name));
            }
        }
        attributes.retain(|name, _| !name.starts_with('_'));
        attributes
    }
}

impl AttrGetter for ParameterAttrHook {
    fn get_attr(&self, owner: &str, attribute: &str, default: Option<&str>) -> DocValue {
        self.resolve_attribute(owner, attribute, default)
    }
}

/// Returned to the generator by [`setup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionMetadata {
    pub version: String,
    pub parallel_read_safe: bool,
    pub parallel_write_safe: bool,
}

/// Installs the hook for every class (`object`) and reports the extension metadata.
pub fn setup(app: &mut dyn AttrGetterRegistry, hook: ParameterAttrHook) -> ExtensionMetadata {
    app.setup_extension("autodoc");
    app.add_attr_getter("object", Box::new(hook));
    ExtensionMetadata {
        version: DOC_EXTENSION_VERSION.to_string(),
        parallel_read_safe: true,
        parallel_write_safe: true,
    }
}

/// Minimal in-process registration point, used by the command line tool.
#[derive(Default)]
pub struct AttrGetterTable {
    extensions: Vec<String>,
    getters: Vec<(String, Box<dyn AttrGetter>)>,
}

impl AttrGetterTable {
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Uses the most recently registered getter.
    pub fn get_attr(&self, owner: &str, attribute: &str, default: Option<&str>) -> DocValue {
        match self.getters.last() {
            Some((_, getter)) => getter.get_attr(owner, attribute, default),
            None => default.map_or(DocValue::Missing, |d| DocValue::Default(d.to_string())),
        }
    }
}

impl AttrGetterRegistry for AttrGetterTable {
    fn setup_extension(&mut self, name: &str) {
        if !self.extensions.iter().any(|e| e == name) {
            self.extensions.push(name.to_string());
        }
    }

    fn add_attr_getter(&mut self, target: &str, getter: Box<dyn AttrGetter>) {
        self.getters.push((target.to_string(), getter));
    }
}
