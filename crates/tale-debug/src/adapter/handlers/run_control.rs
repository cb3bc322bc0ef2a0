//! Continue/pause/step handlers.
//! - handle_continue: run to the next breakpoint or the end
//! - handle_pause: acknowledge or arm a pause before start
//! - handle_next/step_in/step_out: stepping commands

use serde_json::Value;

use crate::protocol::{ContinueResponseBody, Request, ThreadArguments};
use crate::session::{Advance, SessionState};

use super::super::{DebugAdapter, DispatchOutcome};

impl DebugAdapter {
    pub(in crate::adapter) fn handle_continue(
        &mut self,
        request: Request<Value>,
    ) -> DispatchOutcome {
        self.resume(request, Advance::Continue, "invalid continue args")
    }

    pub(in crate::adapter) fn handle_next(&mut self, request: Request<Value>) -> DispatchOutcome {
        self.resume(request, Advance::StepOver, "invalid next args")
    }

    pub(in crate::adapter) fn handle_step_in(
        &mut self,
        request: Request<Value>,
    ) -> DispatchOutcome {
        self.resume(request, Advance::StepIn, "invalid stepIn args")
    }

    pub(in crate::adapter) fn handle_step_out(
        &mut self,
        request: Request<Value>,
    ) -> DispatchOutcome {
        self.resume(request, Advance::StepOut, "invalid stepOut args")
    }

    fn resume(
        &mut self,
        request: Request<Value>,
        how: Advance,
        invalid_args: &str,
    ) -> DispatchOutcome {
        let Some(_args) = request
            .arguments
            .clone()
            .and_then(|value| serde_json::from_value::<ThreadArguments>(value).ok())
        else {
            return DispatchOutcome {
                responses: vec![self.error_response(&request, invalid_args)],
                ..DispatchOutcome::default()
            };
        };
        if !self.session.state().is_stopped() {
            return self.state_error(&request);
        }

        let response = if how == Advance::Continue {
            self.ok_response(
                &request,
                Some(ContinueResponseBody {
                    all_threads_continued: Some(true),
                }),
            )
        } else {
            self.ok_response::<Value>(&request, None)
        };
        let report = self.session.advance(how);
        DispatchOutcome {
            responses: vec![response],
            events: self.run_report_events(report),
            should_exit: false,
        }
    }

    pub(in crate::adapter) fn handle_pause(&mut self, request: Request<Value>) -> DispatchOutcome {
        let Some(_args) = request
            .arguments
            .clone()
            .and_then(|value| serde_json::from_value::<ThreadArguments>(value).ok())
        else {
            return DispatchOutcome {
                responses: vec![self.error_response(&request, "invalid pause args")],
                ..DispatchOutcome::default()
            };
        };

        match self.session.state() {
            SessionState::Stopped(_) => DispatchOutcome {
                responses: vec![self.ok_response::<Value>(&request, None)],
                events: vec![
                    self.debug_output_message("[tale-debug] pause ignored (already stopped)")
                ],
                ..DispatchOutcome::default()
            },
            SessionState::Initialized | SessionState::Launched => {
                self.launch_state.pause_requested = true;
                DispatchOutcome {
                    responses: vec![self.ok_response::<Value>(&request, None)],
                    events: vec![self.debug_output_message("[tale-debug] pause requested")],
                    ..DispatchOutcome::default()
                }
            }
            _ => self.state_error(&request),
        }
    }
}
