//! Ladderforge-AV: external media tool mechanics.
//!
//! This crate owns everything that shells out to ffmpeg/ffprobe:
//!
//! - [`ToolCommand`]: async subprocess builder with timeouts, stderr line
//!   streaming (for ffmpeg's `-progress` feed), and cancellation
//! - [`probe`]: ffprobe JSON probing plus pure stream classification
//!   predicates (video/orientation/rotation) and duration extraction
//! - [`encode`]: per-codec-family argument builders, encode execution with
//!   progress callbacks, and screenshot extraction
//! - [`tools`]: `which`-based tool discovery and availability reporting
//!
//! Policy lives above this crate; nothing here touches jobs, tasks, or the
//! store.

pub mod command;
pub mod encode;
pub mod error;
pub mod probe;
pub mod tools;

pub use command::{ToolCommand, ToolOutput};
pub use encode::EncodeParams;
pub use error::{Error, Result};
pub use probe::StreamInfo;
pub use tools::{check_tools, get_tool_path, require_tool, ToolInfo};
