//! Configuration for the tag library lookup

/// How `TaglibLookup::sorted_tags` orders tag names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagOrdering {
    /// Human collation: punctuation before digits before letters, case
    /// differences only break ties
    #[default]
    Collated,
    /// Plain byte order
    Ordinal,
}

/// Configuration options for a lookup instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    /// Name of the synthetic tag (and attribute) that applies to every tag
    pub wildcard_tag: String,

    /// Separator between a parent tag name and a nested tag name
    pub nested_separator: String,

    /// Ordering used by the sorted tag index
    pub tag_ordering: TagOrdering,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            wildcard_tag: "*".to_string(),
            nested_separator: ":".to_string(),
            tag_ordering: TagOrdering::Collated,
        }
    }
}

impl LookupConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the wildcard tag name
    pub fn with_wildcard_tag(mut self, name: impl Into<String>) -> Self {
        self.wildcard_tag = name.into();
        self
    }

    /// Set the nested tag separator
    pub fn with_nested_separator(mut self, separator: impl Into<String>) -> Self {
        self.nested_separator = separator.into();
        self
    }

    /// Set the tag ordering
    pub fn with_tag_ordering(mut self, ordering: TagOrdering) -> Self {
        self.tag_ordering = ordering;
        self
    }

    /// Build the qualified name of a nested tag
    pub fn qualify(&self, parent: &str, child: &str) -> String {
        format!("{}{}{}", parent, self.nested_separator, child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LookupConfig::default();
        assert_eq!(config.wildcard_tag, "*");
        assert_eq!(config.nested_separator, ":");
        assert_eq!(config.tag_ordering, TagOrdering::Collated);
    }

    #[test]
    fn test_builder_pattern() {
        let config = LookupConfig::new()
            .with_wildcard_tag("any")
            .with_nested_separator("/")
            .with_tag_ordering(TagOrdering::Ordinal);

        assert_eq!(config.wildcard_tag, "any");
        assert_eq!(config.qualify("a", "b"), "a/b");
        assert_eq!(config.tag_ordering, TagOrdering::Ordinal);
    }

    #[test]
    fn test_qualify_default_separator() {
        assert_eq!(LookupConfig::default().qualify("a:b", "c"), "a:b:c");
    }
}
