//! Execution bridge: the adapter's narrow view of whatever engine runs the story.

mod replay;

use smol_str::SmolStr;
use tale_eval::Context;
use thiserror::Error;

pub use replay::{ReplayBridge, TracePoint};

/// A pause-point location. Lines are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: String,
    pub line: u32,
}

impl Location {
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

/// One frame of the story's call stack (passage, knot, stitch, tunnel...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    pub name: SmolStr,
    pub location: Location,
}

/// Failures reported by the engine behind the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to load story '{path}': {message}")]
    Load { path: String, message: String },
    #[error("no story loaded")]
    NotLoaded,
    #[error("story runtime error: {0}")]
    Runtime(String),
}

/// Narrow interface to the story engine.
///
/// Every resume method runs the story until its next natural pause point and
/// then returns control to the caller.
pub trait ExecutionBridge {
    /// Loads or starts the story named by the launch configuration.
    fn launch(&mut self, program: Option<&str>) -> Result<(), BridgeError>;

    fn current_location(&self) -> Option<Location>;

    /// Flat snapshot of the story variables at the current pause point.
    fn current_state(&self) -> Context;

    fn continue_run(&mut self) -> Result<(), BridgeError>;
    fn step_into(&mut self) -> Result<(), BridgeError>;
    fn step_over(&mut self) -> Result<(), BridgeError>;
    fn step_out(&mut self) -> Result<(), BridgeError>;

    fn is_terminated(&self) -> bool;

    /// Stops the story and releases engine resources.
    fn terminate(&mut self);

    /// Whether execution can ever pause at `file:line`.
    fn is_valid_location(&self, _file: &str, _line: u32) -> bool {
        true
    }

    /// Call stack, innermost first.
    fn stack_frames(&self) -> Vec<FrameInfo> {
        self.current_location()
            .map(|location| {
                vec![FrameInfo {
                    name: SmolStr::new("story"),
                    location,
                }]
            })
            .unwrap_or_default()
    }
}
