//! The merge engine.
//!
//! [`ConfigMerger`] runs each [`Document`](crate::document::Document)
//! through [`PathResolver`](crate::path::PathResolver) and
//! [`ResourceNamespacer`], unions the results and hands the merged services
//! to [`PortConflictResolver`](crate::port::PortConflictResolver). Every
//! step records what it did in a [`MergeReport`]; nothing is logged.

pub mod merger;
pub mod namespace;
pub mod report;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use merger::{CollisionPolicy, ConfigMerger, MergeOptions, MergeOutcome, MergedProject};
pub use namespace::{NamespacedDocument, ResourceNamespacer, TranslationTable};
pub use report::{MergeEvent, MergeReport, ReferenceKind, ResourceKind, Severity};
