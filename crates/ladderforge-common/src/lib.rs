//! Ladderforge-Common: Shared types and utilities.
//!
//! This crate provides common functionality used across ladderforge:
//!
//! - **Typed IDs**: Type-safe UUID wrappers for jobs and tasks
//! - **Core Types**: Workflow/task status enums, structured video sizes,
//!   and the encoder-family → container mapping
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use ladderforge_common::{JobId, VideoSize, WorkflowStatus, container_extension};
//!
//! let job_id = JobId::new();
//!
//! let size: VideoSize = "1920x1080".parse().unwrap();
//! assert_eq!(size.swapped().to_string(), "1080x1920");
//!
//! assert_eq!(container_extension("libvpx-vp9"), "webm");
//! assert_eq!(WorkflowStatus::New.to_string(), "new");
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
