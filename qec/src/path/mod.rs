//! Path handling for compose documents.
//!
//! Relative paths in a compose file are relative to the file's directory.
//! Once documents from different directories are merged into one file that
//! lives elsewhere, those paths would point at the wrong place, so every
//! relative path is made absolute before merging.
//!
//! All processing here is lexical: `.` and `..` are folded, `~` is expanded,
//! and nothing is looked up on disk.
//!
//! # Examples
//!
//! ```
//! use qec::path::PathResolver;
//! use std::path::Path;
//!
//! let resolved = PathResolver::resolve_build_context(Path::new("/srv/web"), "./app").unwrap();
//! assert_eq!(resolved, "/srv/web/app");
//! ```

pub mod normalize;
pub mod resolver;

pub use resolver::PathResolver;
