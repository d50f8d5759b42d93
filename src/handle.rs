//! Name-or-handle arguments
//!
//! The compiler asks about tags and attributes either by bare name or by
//! passing the node it is currently visiting. Both forms are normalized to a
//! plain name once, at the entry of each lookup operation.

use crate::taglib::{Attribute, Tag};

/// Anything that knows the tag name it stands for
///
/// Dynamic tags have no static name, hence the `Option`.
pub trait TagHandle {
    fn tag_name(&self) -> Option<&str>;
}

/// Anything that knows the attribute name it stands for
pub trait AttributeHandle {
    fn attribute_name(&self) -> &str;
}

impl TagHandle for Tag {
    fn tag_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl AttributeHandle for Attribute {
    fn attribute_name(&self) -> &str {
        &self.name
    }
}

/// A tag given by name or by handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRef<'a> {
    ByName(&'a str),
    ByHandle { tag_name: Option<&'a str> },
}

impl<'a> TagRef<'a> {
    pub fn from_handle<H: TagHandle + ?Sized>(handle: &'a H) -> Self {
        Self::ByHandle {
            tag_name: handle.tag_name(),
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        match *self {
            Self::ByName(name) => Some(name),
            Self::ByHandle { tag_name } => tag_name,
        }
    }
}

impl<'a> From<&'a str> for TagRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::ByName(name)
    }
}

impl<'a> From<&'a String> for TagRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::ByName(name)
    }
}

impl<'a> From<&'a Tag> for TagRef<'a> {
    fn from(tag: &'a Tag) -> Self {
        Self::from_handle(tag)
    }
}

/// An attribute given by name or by handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrRef<'a> {
    ByName(&'a str),
    ByHandle { name: &'a str },
}

impl<'a> AttrRef<'a> {
    pub fn from_handle<H: AttributeHandle + ?Sized>(handle: &'a H) -> Self {
        Self::ByHandle {
            name: handle.attribute_name(),
        }
    }

    pub fn name(&self) -> &'a str {
        match *self {
            Self::ByName(name) | Self::ByHandle { name } => name,
        }
    }
}

impl<'a> From<&'a str> for AttrRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::ByName(name)
    }
}

impl<'a> From<&'a String> for AttrRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::ByName(name)
    }
}

impl<'a> From<&'a Attribute> for AttrRef<'a> {
    fn from(attribute: &'a Attribute) -> Self {
        Self::from_handle(attribute)
    }
}
