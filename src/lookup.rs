//! Unified lookup over every registered tag library
//!
//! Libraries are registered once, during discovery, and folded into one
//! [`Namespace`]. The compiler then asks the lookup, per tag and attribute
//! occurrence, what a name means and which rewrite steps apply to it.
//!
//! # Example
//!
//! ```rust
//! use taglib_lookup::{Attribute, Tag, TagLibrary, TaglibLookup};
//!
//! let mut lookup = TaglibLookup::new();
//! lookup
//!     .register(
//!         TagLibrary::new("ui").with_tag(
//!             Tag::new("button")
//!                 .with_attribute(Attribute::new("disabled"))
//!                 .with_nested_tag(Tag::new("icon")),
//!         ),
//!     )
//!     .unwrap();
//!
//! assert!(lookup.resolve_attribute("button", "disabled").is_some());
//! assert_eq!(
//!     lookup.get_tag("button:icon").unwrap().parent_tag_name.as_deref(),
//!     Some("button")
//! );
//! ```

use std::fmt;
use std::ops::ControlFlow;
use std::sync::OnceLock;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::collate::collate;
use crate::config::{LookupConfig, TagOrdering};
use crate::error::{LookupError, Result, TEMPLATE_SCOPE};
use crate::handle::{AttrRef, TagRef};
use crate::merge::{Merge, Namespace};
use crate::taglib::{Attribute, Migrator, Tag, TagLibrary, Transformer};

/// Tag order computed for one registration version
#[derive(Debug)]
struct SortedIndex {
    version: u64,
    order: Vec<usize>,
}

/// Merged view of all registered tag libraries
#[derive(Debug, Default)]
pub struct TaglibLookup {
    config: LookupConfig,
    merged: Namespace,
    /// Registered libraries, in registration order
    libraries: IndexMap<String, TagLibrary>,
    /// Bumped on every successful registration
    version: u64,
    sorted: OnceLock<SortedIndex>,
}

impl TaglibLookup {
    /// Create an empty lookup with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty lookup with custom configuration
    pub fn with_config(config: LookupConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// The merged namespace
    pub fn namespace(&self) -> &Namespace {
        &self.merged
    }

    /// Registration counter; changes exactly when the namespace changes
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn has_library(&self, library: &TagLibrary) -> bool {
        self.has_library_id(&library.id)
    }

    pub fn has_library_id(&self, id: &str) -> bool {
        self.libraries.contains_key(id)
    }

    /// Registered libraries, in registration order
    pub fn libraries(&self) -> impl Iterator<Item = &TagLibrary> {
        self.libraries.values()
    }

    /// Number of tags in the namespace, flattened nested tags included
    pub fn len(&self) -> usize {
        self.merged.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merged.tags.is_empty()
    }

    /// Fold a tag library into the namespace
    ///
    /// Registering a library whose id is already known does nothing.
    pub fn register(&mut self, library: TagLibrary) -> Result<()> {
        if library.id.is_empty() {
            return Err(LookupError::MissingLibraryId);
        }

        if self.libraries.contains_key(&library.id) {
            trace!(id = %library.id, "tag library already registered");
            return Ok(());
        }

        self.version += 1;
        self.sorted = OnceLock::new();

        self.merged.merge(Namespace::from_library(&library));
        self.flatten_nested_tags(&library);

        debug!(
            id = %library.id,
            tags = library.tags.len(),
            total_tags = self.merged.tags.len(),
            "registered tag library"
        );
        self.libraries.insert(library.id.clone(), library);
        Ok(())
    }

    /// Make every nested tag of `library` addressable as `parent:child`
    fn flatten_nested_tags(&mut self, library: &TagLibrary) {
        for (key, tag) in &library.tags {
            self.flatten_tag(tag, declared_name(key, tag));
        }
    }

    fn flatten_tag(&mut self, tag: &Tag, parent: &str) {
        for (key, nested) in &tag.nested_tags {
            let qualified = self.config.qualify(parent, declared_name(key, nested));
            trace!(tag = %qualified, parent, "flattened nested tag");

            let mut copy = nested.clone();
            copy.parent_tag_name = Some(parent.to_string());
            copy.name = qualified.clone();
            self.merged.tags.insert(qualified.clone(), copy);

            self.flatten_tag(nested, &qualified);
        }
    }

    /// Every tag, sorted by name
    ///
    /// The order is computed on first use and reused until the next
    /// registration.
    pub fn sorted_tags(&self) -> Vec<&Tag> {
        let index = self.sorted.get_or_init(|| self.build_sorted_index());
        debug_assert_eq!(index.version, self.version);
        index
            .order
            .iter()
            .map(|&position| &self.merged.tags[position])
            .collect()
    }

    fn build_sorted_index(&self) -> SortedIndex {
        let tags = &self.merged.tags;
        let mut order: Vec<usize> = (0..tags.len()).collect();
        match self.config.tag_ordering {
            TagOrdering::Collated => order.sort_by(|&a, &b| collate(&tags[a].name, &tags[b].name)),
            TagOrdering::Ordinal => order.sort_by(|&a, &b| tags[a].name.cmp(&tags[b].name)),
        }
        trace!(version = self.version, tags = order.len(), "sorted tag index rebuilt");
        SortedIndex {
            version: self.version,
            order,
        }
    }

    /// Every tag, in registration order
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.merged.tags.values()
    }

    /// Visit tags in registration order until `visit` breaks
    pub fn for_each_tag<F>(&self, mut visit: F)
    where
        F: FnMut(&Tag) -> ControlFlow<()>,
    {
        for tag in self.merged.tags.values() {
            if visit(tag).is_break() {
                break;
            }
        }
    }

    pub fn get_tag<'a>(&self, tag: impl Into<TagRef<'a>>) -> Option<&Tag> {
        let name = tag.into().name()?;
        self.merged.tags.get(name)
    }

    /// Resolve what an attribute means on a tag
    ///
    /// Tries, in order: the attribute on the tag itself, the attribute on the
    /// wildcard tag, and the wildcard attribute on the tag. Shared definitions
    /// behind `ref` are substituted before returning.
    pub fn resolve_attribute<'a, 'b>(
        &self,
        tag: impl Into<TagRef<'a>>,
        attribute: impl Into<AttrRef<'b>>,
    ) -> Option<&Attribute> {
        let tag_name = tag.into().name();
        let attribute_name = attribute.into().name();
        let wildcard = self.config.wildcard_tag.as_str();

        let found = tag_name
            .and_then(|tag_name| self.find_attribute(tag_name, attribute_name))
            .or_else(|| self.find_attribute(wildcard, attribute_name))
            .or_else(|| tag_name.and_then(|tag_name| self.find_attribute(tag_name, wildcard)))?;

        self.dereference(found)
    }

    /// Look up one attribute name on one tag: direct attributes, then the
    /// tag's attribute groups in order, then its pattern attributes
    fn find_attribute(&self, tag_name: &str, attribute_name: &str) -> Option<&Attribute> {
        let tag = self.merged.tags.get(tag_name)?;

        tag.attributes
            .get(attribute_name)
            .or_else(|| {
                tag.attribute_groups
                    .iter()
                    .filter_map(|group| self.merged.attribute_groups.get(group))
                    .find_map(|group| group.get(attribute_name))
            })
            .or_else(|| {
                // The wildcard attribute itself is never matched by pattern
                if attribute_name == self.config.wildcard_tag {
                    return None;
                }
                tag.pattern_attributes
                    .iter()
                    .find(|attribute| attribute.matches(attribute_name))
            })
    }

    /// Substitute the shared definition an attribute refers to
    fn dereference<'s>(&'s self, attribute: &'s Attribute) -> Option<&'s Attribute> {
        match &attribute.reference {
            Some(reference) => {
                let shared = self.merged.attributes.get(reference);
                if shared.is_none() {
                    debug!(attribute = %attribute.name, reference = %reference, "dangling attribute ref");
                }
                shared
            }
            None => Some(attribute),
        }
    }

    /// Visit every attribute that may appear on `tag_name`
    ///
    /// The named tag is visited first, then the wildcard tag. For each, direct
    /// attributes come first, then group members in group order, then pattern
    /// attributes. Dangling refs are skipped.
    pub fn for_each_applicable_attribute<F>(&self, tag_name: &str, mut visit: F)
    where
        F: FnMut(&Attribute, &Tag),
    {
        for name in [tag_name, self.config.wildcard_tag.as_str()] {
            let Some(tag) = self.merged.tags.get(name) else {
                continue;
            };

            let groups = tag
                .attribute_groups
                .iter()
                .filter_map(|group| self.merged.attribute_groups.get(group))
                .flat_map(|group| group.values());

            let candidates = tag
                .attributes
                .values()
                .chain(groups)
                .chain(tag.pattern_attributes.iter());

            for attribute in candidates {
                if let Some(attribute) = self.dereference(attribute) {
                    visit(attribute, tag);
                }
            }
        }
    }

    /// The named tag followed by the wildcard tag, whichever exist
    fn chain_tags(&self, tag_name: Option<&str>) -> impl Iterator<Item = &Tag> + '_ {
        let named = tag_name.and_then(|name| self.merged.tags.get(name));
        let wildcard = self.merged.tags.get(&self.config.wildcard_tag);
        named.into_iter().chain(wildcard)
    }

    /// Transformers for a tag, sorted by priority
    ///
    /// Collects the tag's transformers, then the wildcard tag's, and sorts
    /// them stably so equal priorities keep that order.
    pub fn tag_transformers<'a>(&self, tag: impl Into<TagRef<'a>>) -> Result<Vec<&Transformer>> {
        let mut chain = Vec::new();
        for tag in self.chain_tags(tag.into().name()) {
            collect_transformers(&mut chain, &tag.name, &tag.transformers)?;
        }
        chain.sort_by_key(|transformer| transformer.sort_key());
        Ok(chain)
    }

    pub fn for_each_tag_transformer<'a, F>(&self, tag: impl Into<TagRef<'a>>, mut visit: F) -> Result<()>
    where
        F: FnMut(&Transformer),
    {
        for transformer in self.tag_transformers(tag)? {
            visit(transformer);
        }
        Ok(())
    }

    /// Migrators for a tag, then for the wildcard tag, in declaration order
    pub fn tag_migrators<'a>(&self, tag: impl Into<TagRef<'a>>) -> Result<Vec<&Migrator>> {
        let mut chain = Vec::new();
        for tag in self.chain_tags(tag.into().name()) {
            for (index, migrator) in tag.migrators.iter().enumerate() {
                if !migrator.is_invocable() {
                    return Err(LookupError::invalid_migrator(&tag.name, index));
                }
                chain.push(migrator);
            }
        }
        Ok(chain)
    }

    pub fn for_each_tag_migrator<'a, F>(&self, tag: impl Into<TagRef<'a>>, mut visit: F) -> Result<()>
    where
        F: FnMut(&Migrator),
    {
        for migrator in self.tag_migrators(tag)? {
            visit(migrator);
        }
        Ok(())
    }

    /// Template-scoped transformers of every library, sorted by priority
    pub fn template_transformers(&self) -> Result<Vec<&Transformer>> {
        sorted_chain(&self.merged.transformers)
    }

    pub fn for_each_template_transformer<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&Transformer),
    {
        for transformer in self.template_transformers()? {
            visit(transformer);
        }
        Ok(())
    }

    /// Text-node transformers of every library, sorted by priority
    pub fn text_transformers(&self) -> Result<Vec<&Transformer>> {
        sorted_chain(&self.merged.text_transformers)
    }

    pub fn for_each_text_transformer<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&Transformer),
    {
        for transformer in self.text_transformers()? {
            visit(transformer);
        }
        Ok(())
    }

    /// Visit the migrator path of every library that declares one, in
    /// registration order
    pub fn for_each_template_migrator<F>(&self, mut visit: F)
    where
        F: FnMut(&str),
    {
        for library in self.libraries.values() {
            if let Some(path) = library.migrator_path.as_deref().filter(|p| !p.is_empty()) {
                visit(path);
            }
        }
    }

    /// List registered library ids, for logging
    pub fn describe(&self) -> String {
        let ids: Vec<&str> = self.libraries.keys().map(|id| id.as_str()).collect();
        format!("lookup: {}", ids.join(", "))
    }
}

impl fmt::Display for TaglibLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Name a declared tag goes by, falling back to its map key
fn declared_name<'a>(key: &'a str, tag: &'a Tag) -> &'a str {
    if tag.name.is_empty() {
        key
    } else {
        &tag.name
    }
}

fn collect_transformers<'t>(
    chain: &mut Vec<&'t Transformer>,
    scope: &str,
    transformers: &'t [Transformer],
) -> Result<()> {
    for (index, transformer) in transformers.iter().enumerate() {
        if !transformer.is_valid() {
            return Err(LookupError::invalid_transformer(scope, index));
        }
        chain.push(transformer);
    }
    Ok(())
}

fn sorted_chain(transformers: &[Transformer]) -> Result<Vec<&Transformer>> {
    let mut chain = Vec::with_capacity(transformers.len());
    collect_transformers(&mut chain, TEMPLATE_SCOPE, transformers)?;
    chain.sort_by_key(|transformer| transformer.sort_key());
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::TagHandle;
    use pretty_assertions::assert_eq;

    fn names(tags: &[&Tag]) -> Vec<String> {
        tags.iter().map(|tag| tag.name.clone()).collect()
    }

    fn paths(chain: &[&Transformer]) -> Vec<String> {
        chain
            .iter()
            .map(|t| t.path.clone().unwrap_or_default())
            .collect()
    }

    struct Element {
        tag_name: Option<String>,
    }

    impl TagHandle for Element {
        fn tag_name(&self) -> Option<&str> {
            self.tag_name.as_deref()
        }
    }

    #[test]
    fn test_new_lookup_is_empty() {
        let lookup = TaglibLookup::new();
        assert!(lookup.is_empty());
        assert_eq!(lookup.version(), 0);
        assert_eq!(lookup.get_tag("x"), None);
        assert!(lookup.sorted_tags().is_empty());
        assert_eq!(lookup.describe(), "lookup: ");
    }

    #[test]
    fn test_register_requires_id() {
        let mut lookup = TaglibLookup::new();
        let result = lookup.register(TagLibrary::new("").with_tag(Tag::new("x")));
        assert_eq!(result, Err(LookupError::MissingLibraryId));
        assert!(lookup.is_empty());
    }

    #[test]
    fn test_register_is_idempotent() {
        let library = TagLibrary::new("ui")
            .with_tag(Tag::new("x").with_migrator("./m"))
            .with_transformer(Transformer::new("./t"));

        let mut lookup = TaglibLookup::new();
        lookup.register(library.clone()).unwrap();
        let snapshot = lookup.namespace().clone();
        let version = lookup.version();

        lookup.register(library).unwrap();
        assert_eq!(lookup.namespace(), &snapshot);
        assert_eq!(lookup.version(), version);
        assert_eq!(lookup.libraries().count(), 1);
    }

    #[test]
    fn test_has_library() {
        let library = TagLibrary::new("ui");
        let mut lookup = TaglibLookup::new();
        assert!(!lookup.has_library(&library));
        lookup.register(library.clone()).unwrap();
        assert!(lookup.has_library(&library));
        assert!(lookup.has_library_id("ui"));
    }

    #[test]
    fn test_flatten_nested_tags() {
        let mut lookup = TaglibLookup::new();
        lookup
            .register(TagLibrary::new("ui").with_tag(
                Tag::new("a").with_nested_tag(Tag::new("b").with_nested_tag(Tag::new("c"))),
            ))
            .unwrap();

        let b = lookup.get_tag("a:b").expect("a:b should be registered");
        assert_eq!(b.parent_tag_name.as_deref(), Some("a"));
        let c = lookup.get_tag("a:b:c").expect("a:b:c should be registered");
        assert_eq!(c.name, "a:b:c");
        assert_eq!(c.parent_tag_name.as_deref(), Some("a:b"));
        assert_eq!(lookup.get_tag("a").unwrap().parent_tag_name, None);
    }

    #[test]
    fn test_flatten_with_custom_separator() {
        let mut lookup =
            TaglibLookup::with_config(LookupConfig::new().with_nested_separator("."));
        lookup
            .register(TagLibrary::new("ui").with_tag(Tag::new("a").with_nested_tag(Tag::new("b"))))
            .unwrap();
        assert!(lookup.get_tag("a.b").is_some());
        assert!(lookup.get_tag("a:b").is_none());
    }

    #[test]
    fn test_get_tag_by_handle() {
        let mut lookup = TaglibLookup::new();
        lookup
            .register(TagLibrary::new("ui").with_tag(Tag::new("x")))
            .unwrap();

        let element = Element {
            tag_name: Some("x".to_string()),
        };
        assert!(lookup.get_tag(TagRef::from_handle(&element)).is_some());

        let dynamic = Element { tag_name: None };
        assert!(lookup.get_tag(TagRef::from_handle(&dynamic)).is_none());
    }

    #[test]
    fn test_sorted_tags_cached_until_register() {
        let mut lookup = TaglibLookup::new();
        lookup
            .register(TagLibrary::new("one").with_tag(Tag::new("b")).with_tag(Tag::new("a")))
            .unwrap();

        let first = names(&lookup.sorted_tags());
        assert_eq!(first, vec!["a", "b"]);
        assert_eq!(names(&lookup.sorted_tags()), first);

        lookup
            .register(TagLibrary::new("two").with_tag(Tag::new("aa")))
            .unwrap();
        assert_eq!(names(&lookup.sorted_tags()), vec!["a", "aa", "b"]);
    }

    #[test]
    fn test_sorted_tags_ordinal() {
        let mut lookup =
            TaglibLookup::with_config(LookupConfig::new().with_tag_ordering(TagOrdering::Ordinal));
        lookup
            .register(TagLibrary::new("ui").with_tag(Tag::new("b")).with_tag(Tag::new("B")))
            .unwrap();
        assert_eq!(names(&lookup.sorted_tags()), vec!["B", "b"]);
    }

    #[test]
    fn test_for_each_tag_stops_on_break() {
        let mut lookup = TaglibLookup::new();
        lookup
            .register(
                TagLibrary::new("ui")
                    .with_tag(Tag::new("a"))
                    .with_tag(Tag::new("b"))
                    .with_tag(Tag::new("c")),
            )
            .unwrap();

        let mut visited = Vec::new();
        lookup.for_each_tag(|tag| {
            visited.push(tag.name.clone());
            if visited.len() == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(visited, vec!["a", "b"]);
    }

    #[test]
    fn test_wildcard_attribute_skips_patterns() {
        let mut lookup = TaglibLookup::new();
        lookup
            .register(TagLibrary::new("ui").with_tag(
                Tag::new("x").with_pattern_attribute(Attribute::pattern("any", ".*").unwrap()),
            ))
            .unwrap();

        assert_eq!(lookup.resolve_attribute("x", "foo").unwrap().name, "any");
        assert_eq!(lookup.find_attribute("x", "*"), None);
    }

    #[test]
    fn test_splat_attribute_on_tag() {
        let mut lookup = TaglibLookup::new();
        lookup
            .register(TagLibrary::new("ui").with_tag(
                Tag::new("x").with_attribute(Attribute::new("*").with_type("expression")),
            ))
            .unwrap();

        let resolved = lookup.resolve_attribute("x", "anything").unwrap();
        assert_eq!(resolved.name, "*");
    }

    #[test]
    fn test_dangling_ref_resolves_to_none() {
        let mut lookup = TaglibLookup::new();
        lookup
            .register(TagLibrary::new("ui").with_tag(
                Tag::new("x").with_attribute(Attribute::new("foo").with_ref("missing")),
            ))
            .unwrap();
        assert_eq!(lookup.resolve_attribute("x", "foo"), None);
    }

    #[test]
    fn test_tag_transformers_include_wildcard() {
        let mut lookup = TaglibLookup::new();
        lookup
            .register(
                TagLibrary::new("ui")
                    .with_tag(Tag::new("x").with_transformer(Transformer::new("x1").with_priority(2)))
                    .with_tag(
                        Tag::new("*")
                            .with_transformer(Transformer::new("w1").with_priority(2))
                            .with_transformer(Transformer::new("w0").with_priority(1)),
                    ),
            )
            .unwrap();

        let chain = lookup.tag_transformers("x").unwrap();
        assert_eq!(paths(&chain), vec!["w0", "x1", "w1"]);

        let unknown = lookup.tag_transformers("unknown").unwrap();
        assert_eq!(paths(&unknown), vec!["w0", "w1"]);
    }

    #[test]
    fn test_invalid_transformer_is_fatal() {
        let mut lookup = TaglibLookup::new();
        lookup
            .register(TagLibrary::new("ui").with_tag(
                Tag::new("x")
                    .with_transformer(Transformer::new("ok"))
                    .with_transformer(Transformer::default()),
            ))
            .unwrap();

        let mut visited = 0;
        let result = lookup.for_each_tag_transformer("x", |_| visited += 1);
        assert_eq!(result, Err(LookupError::invalid_transformer("x", 1)));
        assert_eq!(visited, 0);
    }

    #[test]
    fn test_invalid_migrator_is_fatal() {
        let mut lookup = TaglibLookup::new();
        lookup
            .register(TagLibrary::new("ui").with_tag(Tag::new("*").with_migrator("")))
            .unwrap();

        let result = lookup.for_each_tag_migrator("x", |_| {});
        assert_eq!(result, Err(LookupError::invalid_migrator("*", 0)));
    }

    #[test]
    fn test_invalid_template_transformer_is_fatal() {
        let mut lookup = TaglibLookup::new();
        lookup
            .register(TagLibrary::new("ui").with_text_transformer(Transformer::default()))
            .unwrap();

        assert!(lookup.for_each_template_transformer(|_| {}).is_ok());
        assert_eq!(
            lookup.for_each_text_transformer(|_| {}),
            Err(LookupError::invalid_transformer(TEMPLATE_SCOPE, 0))
        );
    }

    #[test]
    fn test_display_matches_describe() {
        let mut lookup = TaglibLookup::new();
        lookup.register(TagLibrary::new("a")).unwrap();
        lookup.register(TagLibrary::new("b")).unwrap();
        assert_eq!(lookup.to_string(), "lookup: a, b");
        assert_eq!(lookup.to_string(), lookup.describe());
    }
}
