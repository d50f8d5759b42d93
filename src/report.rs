//! Plain-text summaries of a lookup, used by the `taglib-lookup` binary

use std::fmt::Write;

use crate::error::Result;
use crate::lookup::TaglibLookup;
use crate::taglib::{Attribute, Transformer};

/// One line per tag, sorted, nested tags marked with their parent
pub fn tag_list(lookup: &TaglibLookup) -> String {
    let mut out = String::new();
    for tag in lookup.sorted_tags() {
        let line = match &tag.parent_tag_name {
            Some(parent) => format!("{} (in {})", tag.name, parent),
            None => tag.name.clone(),
        };
        writeln!(out, "{}", line).ok();
    }
    out
}

/// Attributes and rewrite chains that apply to one tag
///
/// Returns `Ok(None)` when the tag is unknown.
pub fn tag_summary(lookup: &TaglibLookup, tag_name: &str) -> Result<Option<String>> {
    let Some(tag) = lookup.get_tag(tag_name) else {
        return Ok(None);
    };

    let mut out = String::new();
    writeln!(out, "tag {}", tag.name).ok();
    if let Some(parent) = &tag.parent_tag_name {
        writeln!(out, "  parent: {}", parent).ok();
    }
    if let Some(renderer) = &tag.renderer {
        writeln!(out, "  renderer: {}", renderer).ok();
    }

    writeln!(out, "  attributes:").ok();
    lookup.for_each_applicable_attribute(tag_name, |attribute, owner| {
        writeln!(out, "    {} [{}]", describe_attribute(attribute), owner.name).ok();
    });

    writeln!(out, "  transformers:").ok();
    for transformer in lookup.tag_transformers(tag_name)? {
        writeln!(out, "    {}", describe_transformer(transformer)).ok();
    }

    writeln!(out, "  migrators:").ok();
    for migrator in lookup.tag_migrators(tag_name)? {
        writeln!(out, "    {}", migrator.path).ok();
    }

    Ok(Some(out))
}

/// Template-scoped rewrite chains
pub fn template_summary(lookup: &TaglibLookup) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "template transformers:").ok();
    for transformer in lookup.template_transformers()? {
        writeln!(out, "  {}", describe_transformer(transformer)).ok();
    }
    writeln!(out, "text transformers:").ok();
    for transformer in lookup.text_transformers()? {
        writeln!(out, "  {}", describe_transformer(transformer)).ok();
    }
    writeln!(out, "template migrators:").ok();
    lookup.for_each_template_migrator(|path| {
        writeln!(out, "  {}", path).ok();
    });
    Ok(out)
}

pub fn describe_attribute(attribute: &Attribute) -> String {
    let mut text = match &attribute.pattern {
        Some(pattern) => format!("{} /{}/", attribute.name, pattern.as_str()),
        None => attribute.name.clone(),
    };
    if let Some(type_name) = &attribute.type_name {
        text.push_str(": ");
        text.push_str(type_name);
    }
    text
}

fn describe_transformer(transformer: &Transformer) -> String {
    let path = transformer.path.as_deref().unwrap_or("?");
    match transformer.priority {
        Some(priority) => format!("{} (priority {})", path, priority),
        None => path.to_string(),
    }
}
