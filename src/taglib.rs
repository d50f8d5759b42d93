//! Tag library descriptors
//!
//! These are the records a loader hands to [`TaglibLookup::register`]. They can
//! be built in code with the `with_*` builders or decoded from TOML:
//!
//! ```toml
//! id = "ui"
//! migrator-path = "./migrate/ui"
//!
//! [tags.button]
//! renderer = "./components/button"
//! attribute-groups = "common"
//!
//! [tags.button.attributes.disabled]
//! type = "boolean"
//!
//! [[tags.button.transformers]]
//! path = "./transform/button"
//! priority = 10
//!
//! [tags.button.tags.icon]
//! renderer = "./components/button-icon"
//!
//! [attribute-groups.common.class]
//! type = "string"
//! ```
//!
//! [`TaglibLookup::register`]: crate::TaglibLookup::register

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::error::DescriptorError;

/// Named bundle of attribute definitions shared between tags
pub type AttributeGroup = IndexMap<String, Attribute>;

/// Regular expression an attribute name is matched against
#[derive(Clone)]
pub struct AttributePattern(Regex);

impl AttributePattern {
    /// Compile a pattern
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    /// Unanchored search, so `^` and `$` must be spelled out
    pub fn is_match(&self, name: &str) -> bool {
        self.0.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AttributePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.as_str())
    }
}

impl PartialEq for AttributePattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for AttributePattern {}

impl<'de> Deserialize<'de> for AttributePattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::new(&source).map_err(serde::de::Error::custom)
    }
}

/// Definition of an attribute a tag accepts
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Attribute {
    pub name: String,
    /// Key into the shared `attributes` map of the merged namespace
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    /// Matches attribute names by pattern instead of by exact name
    pub pattern: Option<AttributePattern>,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub description: Option<String>,
    pub default_value: Option<String>,
    pub required: Option<bool>,
    pub deprecated: Option<bool>,
    /// Replace an existing definition instead of merging into it
    pub no_merge: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a pattern attribute
    pub fn pattern(name: impl Into<String>, pattern: &str) -> Result<Self, DescriptorError> {
        let name = name.into();
        let pattern = AttributePattern::new(pattern).map_err(|source| {
            DescriptorError::InvalidPattern {
                attribute: name.clone(),
                source,
            }
        })?;
        Ok(Self {
            name,
            pattern: Some(pattern),
            ..Self::default()
        })
    }

    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_no_merge(mut self) -> Self {
        self.no_merge = true;
        self
    }

    /// Check the attribute's pattern against a name; plain attributes never match
    pub fn matches(&self, name: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(name))
    }
}

/// Compile-time rewrite step
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Transformer {
    /// Identifier of the rewrite step; required, checked when a chain is built
    pub path: Option<String>,
    /// Lower runs first; absent runs last
    pub priority: Option<i64>,
    pub name: Option<String>,
}

impl Transformer {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.path.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Sort key for chains: absent priority sorts as the maximum value
    pub fn sort_key(&self) -> i64 {
        self.priority.unwrap_or(i64::MAX)
    }
}

/// Legacy-syntax rewrite step, identified by its path
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Migrator {
    pub path: String,
}

impl Migrator {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn is_invocable(&self) -> bool {
        !self.path.trim().is_empty()
    }
}

/// Definition of a custom tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Tag {
    /// Qualified name (`parent:child` for flattened nested tags)
    pub name: String,
    pub description: Option<String>,
    pub renderer: Option<String>,
    pub template: Option<String>,
    pub html: Option<bool>,
    pub open_tag_only: Option<bool>,
    pub deprecated: Option<bool>,
    pub attributes: IndexMap<String, Attribute>,
    /// Group names consulted in order after `attributes`
    #[serde(deserialize_with = "one_or_many")]
    pub attribute_groups: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub pattern_attributes: Vec<Attribute>,
    /// Child tag declarations, keyed by their unqualified name
    #[serde(rename = "tags")]
    pub nested_tags: IndexMap<String, Tag>,
    #[serde(deserialize_with = "one_or_many")]
    pub transformers: Vec<Transformer>,
    #[serde(deserialize_with = "one_or_many")]
    pub migrators: Vec<Migrator>,
    /// Set only on flattened nested tags
    #[serde(skip)]
    pub parent_tag_name: Option<String>,
    /// Replace an existing definition instead of merging into it
    pub no_merge: bool,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_renderer(mut self, renderer: impl Into<String>) -> Self {
        self.renderer = Some(renderer.into());
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.insert(attribute.name.clone(), attribute);
        self
    }

    pub fn with_attribute_group(mut self, group: impl Into<String>) -> Self {
        self.attribute_groups.push(group.into());
        self
    }

    pub fn with_pattern_attribute(mut self, attribute: Attribute) -> Self {
        self.pattern_attributes.push(attribute);
        self
    }

    pub fn with_nested_tag(mut self, tag: Tag) -> Self {
        self.nested_tags.insert(tag.name.clone(), tag);
        self
    }

    pub fn with_transformer(mut self, transformer: Transformer) -> Self {
        self.transformers.push(transformer);
        self
    }

    pub fn with_migrator(mut self, path: impl Into<String>) -> Self {
        self.migrators.push(Migrator::new(path));
        self
    }

    pub fn with_no_merge(mut self) -> Self {
        self.no_merge = true;
        self
    }

    /// Fill empty names from map keys, recursively
    fn fill_names(&mut self, key: &str) {
        if self.name.is_empty() {
            self.name = key.to_string();
        }
        fill_attribute_names(&mut self.attributes);
        for (key, nested) in self.nested_tags.iter_mut() {
            nested.fill_names(key);
        }
    }
}

/// A bundle of tag, attribute and rewrite-step declarations from one source
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TagLibrary {
    pub id: String,
    pub tags: IndexMap<String, Tag>,
    /// Shared definitions reachable through `Attribute::reference`
    pub attributes: IndexMap<String, Attribute>,
    #[serde(deserialize_with = "one_or_many")]
    pub pattern_attributes: Vec<Attribute>,
    pub attribute_groups: IndexMap<String, AttributeGroup>,
    /// Template-scoped transformers
    #[serde(deserialize_with = "one_or_many")]
    pub transformers: Vec<Transformer>,
    /// Transformers applied to text nodes
    #[serde(deserialize_with = "one_or_many")]
    pub text_transformers: Vec<Transformer>,
    /// Migrator applied to every template once this library is registered
    pub migrator_path: Option<String>,
}

impl TagLibrary {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Decode a descriptor from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, DescriptorError> {
        let content = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Decode a descriptor from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, DescriptorError> {
        let mut library: TagLibrary = toml::from_str(content)?;
        library.fill_names();
        Ok(library)
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.insert(tag.name.clone(), tag);
        self
    }

    /// Add a shared attribute definition
    pub fn with_attribute(mut self, key: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(key.into(), attribute);
        self
    }

    pub fn with_pattern_attribute(mut self, attribute: Attribute) -> Self {
        self.pattern_attributes.push(attribute);
        self
    }

    pub fn with_attribute_group(
        mut self,
        name: impl Into<String>,
        attributes: impl IntoIterator<Item = Attribute>,
    ) -> Self {
        let group = attributes
            .into_iter()
            .map(|attribute| (attribute.name.clone(), attribute))
            .collect();
        self.attribute_groups.insert(name.into(), group);
        self
    }

    pub fn with_transformer(mut self, transformer: Transformer) -> Self {
        self.transformers.push(transformer);
        self
    }

    pub fn with_text_transformer(mut self, transformer: Transformer) -> Self {
        self.text_transformers.push(transformer);
        self
    }

    pub fn with_migrator_path(mut self, path: impl Into<String>) -> Self {
        self.migrator_path = Some(path.into());
        self
    }

    fn fill_names(&mut self) {
        for (key, tag) in self.tags.iter_mut() {
            tag.fill_names(key);
        }
        fill_attribute_names(&mut self.attributes);
        for group in self.attribute_groups.values_mut() {
            fill_attribute_names(group);
        }
    }
}

fn fill_attribute_names(attributes: &mut IndexMap<String, Attribute>) {
    for (key, attribute) in attributes.iter_mut() {
        if attribute.name.is_empty() {
            attribute.name = key.clone();
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Accept either a list or a lone value, which becomes a one-element list
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(values) => values,
        OneOrMany::One(value) => vec![value],
    })
}
