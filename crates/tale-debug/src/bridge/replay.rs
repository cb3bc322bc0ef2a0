//! Replays a recorded story run.
//!
//! A trace is a JSON document `{ "points": [ ... ] }` where each point is a
//! location the engine paused at, with the call depth and the variable state
//! observed there. Stepping follows the recorded depths.

use std::path::Path;

use serde::Deserialize;
use smol_str::SmolStr;
use tale_eval::{Context, Value};
use tracing::{debug, info};

use crate::breakpoints::source_key;

use super::{BridgeError, ExecutionBridge, FrameInfo, Location};

/// One recorded pause point.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TracePoint {
    pub file: String,
    pub line: u32,
    /// Passage or knot name shown in the call stack.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub state: serde_json::Map<String, serde_json::Value>,
    /// Engine error raised on arrival at this point.
    #[serde(default)]
    pub error: Option<String>,
}

impl TracePoint {
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
            name: None,
            depth: 0,
            state: serde_json::Map::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn at_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn with_var(mut self, name: &str, value: serde_json::Value) -> Self {
        self.state.insert(name.to_string(), value);
        self
    }

    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    fn location(&self) -> Location {
        Location::new(self.file.clone(), self.line)
    }
}

#[derive(Debug, Deserialize)]
struct TraceFile {
    points: Vec<TracePoint>,
}

/// [`ExecutionBridge`] over a recorded list of pause points.
#[derive(Debug, Default)]
pub struct ReplayBridge {
    points: Vec<TracePoint>,
    cursor: Option<usize>,
    terminated: bool,
}

impl ReplayBridge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_points(points: Vec<TracePoint>) -> Self {
        Self {
            points,
            cursor: None,
            terminated: false,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, BridgeError> {
        Ok(Self::from_points(load_trace(path)?))
    }

    fn current(&self) -> Option<&TracePoint> {
        if self.terminated {
            return None;
        }
        self.cursor.and_then(|index| self.points.get(index))
    }

    /// Moves forward until `stop_here` accepts a point or the trace ends.
    fn advance_until(
        &mut self,
        stop_here: impl Fn(&TracePoint) -> bool,
    ) -> Result<(), BridgeError> {
        if self.terminated {
            return Ok(());
        }
        let Some(mut index) = self.cursor else {
            return Err(BridgeError::NotLoaded);
        };
        loop {
            index += 1;
            let Some(point) = self.points.get(index) else {
                debug!("replay reached end of trace");
                self.cursor = Some(index);
                self.terminated = true;
                return Ok(());
            };
            if stop_here(point) {
                self.cursor = Some(index);
                return match &point.error {
                    Some(message) => Err(BridgeError::Runtime(message.clone())),
                    None => Ok(()),
                };
            }
        }
    }

    fn current_depth(&self) -> u32 {
        self.current().map_or(0, |point| point.depth)
    }
}

fn load_trace(path: &Path) -> Result<Vec<TracePoint>, BridgeError> {
    let load_error = |message: String| BridgeError::Load {
        path: path.display().to_string(),
        message,
    };
    let text = std::fs::read_to_string(path).map_err(|err| load_error(err.to_string()))?;
    let trace: TraceFile =
        serde_json::from_str(&text).map_err(|err| load_error(err.to_string()))?;
    Ok(trace.points)
}

impl ExecutionBridge for ReplayBridge {
    fn launch(&mut self, program: Option<&str>) -> Result<(), BridgeError> {
        if let Some(program) = program {
            self.points = load_trace(Path::new(program))?;
        } else if self.points.is_empty() {
            return Err(BridgeError::NotLoaded);
        }
        info!(points = self.points.len(), "replay trace loaded");
        self.cursor = Some(0);
        self.terminated = self.points.is_empty();
        Ok(())
    }

    fn current_location(&self) -> Option<Location> {
        self.current().map(TracePoint::location)
    }

    fn current_state(&self) -> Context {
        self.current()
            .map(|point| {
                point
                    .state
                    .iter()
                    .map(|(name, value)| (SmolStr::new(name), Value::from(value.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn continue_run(&mut self) -> Result<(), BridgeError> {
        self.advance_until(|_| true)
    }

    fn step_into(&mut self) -> Result<(), BridgeError> {
        self.advance_until(|_| true)
    }

    fn step_over(&mut self) -> Result<(), BridgeError> {
        let depth = self.current_depth();
        self.advance_until(|point| point.depth <= depth)
    }

    fn step_out(&mut self) -> Result<(), BridgeError> {
        let depth = self.current_depth();
        self.advance_until(|point| point.depth < depth)
    }

    fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn terminate(&mut self) {
        self.terminated = true;
    }

    fn is_valid_location(&self, file: &str, line: u32) -> bool {
        if self.points.is_empty() {
            return true;
        }
        let key = source_key(file);
        self.points
            .iter()
            .any(|point| point.line == line && source_key(&point.file) == key)
    }

    fn stack_frames(&self) -> Vec<FrameInfo> {
        let Some(index) = self.cursor.filter(|_| !self.terminated) else {
            return Vec::new();
        };
        let mut frames = Vec::new();
        let mut wanted = None;
        for point in self.points[..=index.min(self.points.len().saturating_sub(1))]
            .iter()
            .rev()
        {
            if wanted.is_some_and(|depth| point.depth != depth) {
                continue;
            }
            frames.push(FrameInfo {
                name: SmolStr::new(point.name.as_deref().unwrap_or("story")),
                location: point.location(),
            });
            if point.depth == 0 {
                break;
            }
            wanted = Some(point.depth - 1);
        }
        frames
    }
}
