//! Output generation for a finished analysis.
//!
//! # Submodules
//!
//! - [`json`]: Writes the [`RequestState`](crate::models::RequestState) as JSON,
//!   to a file or to stdout
//! - [`markdown`]: Renders a readable report with one table per aspect
//!
//! # Example
//!
//! ```text
//! out/
//! ├── story.json   # --json-output
//! └── story.md     # --markdown-output
//! ```

pub mod json;
pub mod markdown;
