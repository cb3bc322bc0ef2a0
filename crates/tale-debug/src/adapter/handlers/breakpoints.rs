//! Breakpoint handlers.
//! - handle_set_breakpoints: replace a source's breakpoints
//! - handle_set_exception_breakpoints: acknowledged, story errors always stop

use serde_json::Value;
use tracing::debug;

use crate::breakpoints::BreakpointSpec;
use crate::protocol::{
    Breakpoint, Request, SetBreakpointsArguments, SetBreakpointsResponseBody,
};

use super::super::{DebugAdapter, DispatchOutcome};

impl DebugAdapter {
    pub(in crate::adapter) fn handle_set_breakpoints(
        &mut self,
        request: Request<Value>,
    ) -> DispatchOutcome {
        let Some(args) = request
            .arguments
            .clone()
            .and_then(|value| serde_json::from_value::<SetBreakpointsArguments>(value).ok())
        else {
            return DispatchOutcome {
                responses: vec![self.error_response(&request, "invalid setBreakpoints args")],
                ..DispatchOutcome::default()
            };
        };
        let Some(file) = args.source.path.clone().or_else(|| args.source.name.clone()) else {
            return DispatchOutcome {
                responses: vec![self.error_response(&request, "setBreakpoints requires a source path")],
                ..DispatchOutcome::default()
            };
        };

        let body = self.set_breakpoints(&file, &args);
        DispatchOutcome {
            responses: vec![self.ok_response(&request, Some(body))],
            ..DispatchOutcome::default()
        }
    }

    fn set_breakpoints(
        &mut self,
        file: &str,
        args: &SetBreakpointsArguments,
    ) -> SetBreakpointsResponseBody {
        let requested = args.requested();
        let lines: Vec<u32> = requested
            .iter()
            .map(|breakpoint| self.to_story_line(breakpoint.line))
            .collect();
        let specs: Vec<BreakpointSpec> = requested
            .into_iter()
            .map(|breakpoint| BreakpointSpec {
                condition: breakpoint.condition,
                hit_condition: breakpoint.hit_condition,
                log_message: breakpoint.log_message,
            })
            .collect();

        let verifications = self
            .session
            .breakpoints_mut()
            .set_breakpoints(file, &lines, &specs);
        debug!(file, count = verifications.len(), "setBreakpoints");

        let breakpoints = verifications
            .into_iter()
            .map(|verification| {
                let reachable = self
                    .session
                    .bridge()
                    .is_valid_location(file, verification.line);
                let message = if reachable {
                    verification.message
                } else {
                    Some("the story never pauses at this line".to_string())
                };
                Breakpoint {
                    id: Some(verification.id),
                    verified: verification.verified && reachable,
                    message,
                    source: Some(args.source.clone()),
                    line: Some(self.to_client_line(verification.line)),
                }
            })
            .collect();
        SetBreakpointsResponseBody { breakpoints }
    }

    pub(in crate::adapter) fn handle_set_exception_breakpoints(
        &mut self,
        request: Request<Value>,
    ) -> DispatchOutcome {
        let body = SetBreakpointsResponseBody {
            breakpoints: Vec::new(),
        };
        DispatchOutcome {
            responses: vec![self.ok_response(&request, Some(body))],
            ..DispatchOutcome::default()
        }
    }
}
