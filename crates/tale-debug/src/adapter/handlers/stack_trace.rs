//! Stack trace handler.
//! - handle_stack_trace: frames captured at the current stop

use serde_json::Value;

use crate::protocol::{Request, StackFrame, StackTraceArguments, StackTraceResponseBody};

use super::super::stop::source_for_location;
use super::super::{DebugAdapter, DispatchOutcome};

impl DebugAdapter {
    pub(in crate::adapter) fn handle_stack_trace(
        &mut self,
        request: Request<Value>,
    ) -> DispatchOutcome {
        let args = request
            .arguments
            .clone()
            .and_then(|value| serde_json::from_value::<StackTraceArguments>(value).ok())
            .unwrap_or_default();

        let frames = self
            .session
            .stop()
            .map(|stop| stop.frames.as_slice())
            .unwrap_or_default();
        let total = frames.len();
        let start = (args.start_frame.unwrap_or(0) as usize).min(total);
        let levels = match args.levels {
            Some(levels) if levels > 0 => levels as usize,
            _ => total,
        };

        let stack_frames = frames
            .iter()
            .enumerate()
            .skip(start)
            .take(levels)
            .map(|(index, frame)| StackFrame {
                id: u32::try_from(index + 1).unwrap_or(u32::MAX),
                name: frame.name.to_string(),
                source: Some(source_for_location(&frame.location)),
                line: self.to_client_line(frame.location.line),
                column: self.to_client_column(1),
            })
            .collect();

        let body = StackTraceResponseBody {
            stack_frames,
            total_frames: Some(u32::try_from(total).unwrap_or(u32::MAX)),
        };
        DispatchOutcome {
            responses: vec![self.ok_response(&request, Some(body))],
            ..DispatchOutcome::default()
        }
    }
}
