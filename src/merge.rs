//! Deep merging of tag library data into one namespace
//!
//! Each record kind folds an incoming value into an existing one with the same
//! rule, applied field by field:
//!
//! - scalar fields: a present incoming value replaces the existing one
//! - list fields: incoming entries are appended after existing entries
//! - map fields: merged key by key; a record flagged `no_merge` replaces the
//!   existing record at its key instead of being merged into it

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::taglib::{Attribute, AttributeGroup, Tag, TagLibrary, Transformer};

/// A record that can absorb another record of the same kind
pub trait Merge {
    /// Fold `incoming` into `self`; incoming values win ties
    fn merge(&mut self, incoming: Self);

    /// Whether this value replaces an existing one wholesale
    fn replaces_existing(&self) -> bool {
        false
    }
}

fn merge_scalar<T>(existing: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *existing = incoming;
    }
}

fn merge_list<T>(existing: &mut Vec<T>, incoming: Vec<T>) {
    existing.extend(incoming);
}

fn merge_name(existing: &mut String, incoming: String) {
    if !incoming.is_empty() {
        *existing = incoming;
    }
}

impl<V: Merge> Merge for IndexMap<String, V> {
    fn merge(&mut self, incoming: Self) {
        for (key, value) in incoming {
            match self.entry(key) {
                Entry::Occupied(mut slot) => {
                    if value.replaces_existing() {
                        slot.insert(value);
                    } else {
                        slot.get_mut().merge(value);
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
            }
        }
    }
}

impl Merge for Attribute {
    fn merge(&mut self, incoming: Self) {
        merge_name(&mut self.name, incoming.name);
        merge_scalar(&mut self.reference, incoming.reference);
        merge_scalar(&mut self.pattern, incoming.pattern);
        merge_scalar(&mut self.type_name, incoming.type_name);
        merge_scalar(&mut self.description, incoming.description);
        merge_scalar(&mut self.default_value, incoming.default_value);
        merge_scalar(&mut self.required, incoming.required);
        merge_scalar(&mut self.deprecated, incoming.deprecated);
    }

    fn replaces_existing(&self) -> bool {
        self.no_merge
    }
}

impl Merge for Tag {
    fn merge(&mut self, incoming: Self) {
        merge_name(&mut self.name, incoming.name);
        merge_scalar(&mut self.description, incoming.description);
        merge_scalar(&mut self.renderer, incoming.renderer);
        merge_scalar(&mut self.template, incoming.template);
        merge_scalar(&mut self.html, incoming.html);
        merge_scalar(&mut self.open_tag_only, incoming.open_tag_only);
        merge_scalar(&mut self.deprecated, incoming.deprecated);
        self.attributes.merge(incoming.attributes);
        merge_list(&mut self.attribute_groups, incoming.attribute_groups);
        merge_list(&mut self.pattern_attributes, incoming.pattern_attributes);
        self.nested_tags.merge(incoming.nested_tags);
        merge_list(&mut self.transformers, incoming.transformers);
        merge_list(&mut self.migrators, incoming.migrators);
        merge_scalar(&mut self.parent_tag_name, incoming.parent_tag_name);
    }

    fn replaces_existing(&self) -> bool {
        self.no_merge
    }
}

/// The union of every registered library's tags, shared attributes and
/// template-scoped rewrite steps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    pub tags: IndexMap<String, Tag>,
    pub attributes: IndexMap<String, Attribute>,
    pub pattern_attributes: Vec<Attribute>,
    pub attribute_groups: IndexMap<String, AttributeGroup>,
    pub transformers: Vec<Transformer>,
    pub text_transformers: Vec<Transformer>,
}

impl Namespace {
    /// The part of a library that is folded into the namespace
    pub fn from_library(library: &TagLibrary) -> Self {
        Self {
            tags: library.tags.clone(),
            attributes: library.attributes.clone(),
            pattern_attributes: library.pattern_attributes.clone(),
            attribute_groups: library.attribute_groups.clone(),
            transformers: library.transformers.clone(),
            text_transformers: library.text_transformers.clone(),
        }
    }
}

impl Merge for Namespace {
    fn merge(&mut self, incoming: Self) {
        self.tags.merge(incoming.tags);
        self.attributes.merge(incoming.attributes);
        merge_list(&mut self.pattern_attributes, incoming.pattern_attributes);
        self.attribute_groups.merge(incoming.attribute_groups);
        merge_list(&mut self.transformers, incoming.transformers);
        merge_list(&mut self.text_transformers, incoming.text_transformers);
    }
}
