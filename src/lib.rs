//! Taglib Lookup - merged tag library namespace for template compilers
//!
//! Independently authored tag libraries declare custom tags, attributes,
//! attribute groups, pattern attributes and rewrite steps. This crate folds
//! them into one namespace the compiler can query per tag and attribute
//! occurrence.
//!
//! # Example
//!
//! ```rust
//! use taglib_lookup::{Attribute, Tag, TagLibrary, TaglibLookup, Transformer};
//!
//! let mut lookup = TaglibLookup::new();
//! lookup
//!     .register(
//!         TagLibrary::new("ui")
//!             .with_attribute("shared-label", Attribute::new("label").with_type("string"))
//!             .with_tag(
//!                 Tag::new("button")
//!                     .with_attribute(Attribute::new("label").with_ref("shared-label"))
//!                     .with_transformer(Transformer::new("./transform/button").with_priority(5)),
//!             ),
//!     )
//!     .unwrap();
//!
//! let label = lookup.resolve_attribute("button", "label").unwrap();
//! assert_eq!(label.type_name.as_deref(), Some("string"));
//!
//! let mut chain = Vec::new();
//! lookup
//!     .for_each_tag_transformer("button", |t| chain.push(t.path.clone()))
//!     .unwrap();
//! assert_eq!(chain, vec![Some("./transform/button".to_string())]);
//! ```

pub mod collate;
pub mod config;
pub mod error;
pub mod handle;
pub mod lookup;
pub mod merge;
pub mod report;
pub mod taglib;

pub use config::{LookupConfig, TagOrdering};
pub use error::{DescriptorError, LookupError, Result};
pub use handle::{AttrRef, AttributeHandle, TagHandle, TagRef};
pub use lookup::TaglibLookup;
pub use merge::{Merge, Namespace};
pub use taglib::{
    Attribute, AttributeGroup, AttributePattern, Migrator, Tag, TagLibrary, Transformer,
};
