//! Debug adapter module map.
//! - core: main loop, dispatch, protocol envelopes
//! - handlers: DAP request handlers by area
//! - stop: run reports to stopped/output/terminated events
//! - protocol_io: message framing + transcript logging
//! - launch: launch argument helpers
//! - util: small shared helpers
//! - tests: adapter unit tests

mod core;
mod handlers;
mod launch;
mod protocol_io;
mod stop;
mod util;

#[cfg(test)]
mod tests;

use std::cell::Cell;

use serde_json::Value;

use crate::session::Session;

/// Launch bookkeeping between `launch` and `configurationDone`.
#[derive(Debug, Clone, Copy, Default)]
struct LaunchState {
    /// `configurationDone` arrived before `launch`.
    configured: bool,
    stop_on_entry: bool,
    /// `pause` arrived before the story started.
    pause_requested: bool,
}

/// Converts between the client's line/column base and 1-based story lines.
#[derive(Debug, Clone, Copy)]
struct CoordinateConverter {
    lines_start_at1: bool,
    columns_start_at1: bool,
}

impl CoordinateConverter {
    fn new(lines_start_at1: bool, columns_start_at1: bool) -> Self {
        Self {
            lines_start_at1,
            columns_start_at1,
        }
    }

    fn to_client_line(self, line: u32) -> u32 {
        if self.lines_start_at1 {
            line
        } else {
            line.saturating_sub(1)
        }
    }

    fn to_client_column(self, column: u32) -> u32 {
        if self.columns_start_at1 {
            column
        } else {
            column.saturating_sub(1)
        }
    }

    fn to_story_line(self, line: u32) -> u32 {
        if self.lines_start_at1 {
            line
        } else {
            line.saturating_add(1)
        }
    }
}

/// DAP front end over a [`Session`]. Handles one request at a time.
pub struct DebugAdapter {
    session: Session,
    next_seq: Cell<u32>,
    coordinate: CoordinateConverter,
    launch_state: LaunchState,
}

#[derive(Debug, Default)]
struct DispatchOutcome {
    responses: Vec<Value>,
    events: Vec<Value>,
    should_exit: bool,
}
