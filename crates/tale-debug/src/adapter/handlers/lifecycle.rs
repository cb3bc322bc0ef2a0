//! Adapter lifecycle handlers.
//! - handle_disconnect: tear down session
//! - handle_terminate: stop the story

use serde_json::Value;
use tracing::info;

use crate::protocol::{DisconnectArguments, Request, TerminateArguments, TerminatedEventBody};

use super::super::{DebugAdapter, DispatchOutcome};

impl DebugAdapter {
    pub(in crate::adapter) fn handle_disconnect(
        &mut self,
        request: Request<Value>,
    ) -> DispatchOutcome {
        let args = request
            .arguments
            .clone()
            .and_then(|value| serde_json::from_value::<DisconnectArguments>(value).ok());
        self.shut_down(&request, args.and_then(|args| args.restart), "disconnect")
    }

    pub(in crate::adapter) fn handle_terminate(
        &mut self,
        request: Request<Value>,
    ) -> DispatchOutcome {
        let args = request
            .arguments
            .clone()
            .and_then(|value| serde_json::from_value::<TerminateArguments>(value).ok());
        self.shut_down(&request, args.and_then(|args| args.restart), "terminate")
    }

    fn shut_down(
        &mut self,
        request: &Request<Value>,
        restart: Option<bool>,
        label: &str,
    ) -> DispatchOutcome {
        info!(state = %self.session.state(), "{label}");
        self.session.terminate();
        let terminated_event = self.event("terminated", Some(TerminatedEventBody { restart }));

        DispatchOutcome {
            responses: vec![self.ok_response::<Value>(request, None)],
            events: vec![
                self.debug_output_message(format!("[tale-debug] {label}")),
                terminated_event,
            ],
            should_exit: true,
        }
    }
}
