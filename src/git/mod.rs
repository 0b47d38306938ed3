//! Git Revision Diffs
//!
//! Reads definition files from revisions of a git repository:
//! - `*.toml` blobs directly under `<rev>:<data_dir>` are loaded as one collection
//! - Notes present at a base revision but gone at the release revision are
//!   reported as removed

mod repository;

pub use repository::*;
