//! Initialize/launch/configuration handlers.
//! - handle_initialize: client capabilities + coordinate base
//! - handle_launch: hand the program to the bridge (launch and attach)
//! - handle_configuration_done: start the story once both have arrived

use serde_json::Value;
use tracing::info;

use crate::protocol::{
    Capabilities, InitializeArguments, InitializeResponseBody, LaunchArguments, Request,
};
use crate::session::SessionState;

use super::super::launch::{launch_program_path, launch_stop_on_entry};
use super::super::{CoordinateConverter, DebugAdapter, DispatchOutcome, LaunchState};

impl DebugAdapter {
    pub(in crate::adapter) fn handle_initialize(
        &mut self,
        request: Request<Value>,
    ) -> DispatchOutcome {
        if self.session.state() != SessionState::Uninitialized {
            return self.state_error(&request);
        }
        let args = request
            .arguments
            .clone()
            .and_then(|value| serde_json::from_value::<InitializeArguments>(value).ok())
            .unwrap_or_default();

        self.coordinate = CoordinateConverter::new(
            args.lines_start_at1.unwrap_or(true),
            args.columns_start_at1.unwrap_or(true),
        );
        self.launch_state = LaunchState::default();
        self.session.set_state(SessionState::Initialized);
        info!(client = ?args.client_id, "initialize");

        let capabilities = Capabilities {
            supports_configuration_done_request: Some(true),
            supports_conditional_breakpoints: Some(true),
            supports_hit_conditional_breakpoints: Some(true),
            supports_log_points: Some(true),
            supports_evaluate_for_hovers: Some(true),
            supports_set_variable: Some(false),
            supports_terminate_request: Some(true),
        };

        let response = self.ok_response(&request, Some(InitializeResponseBody { capabilities }));
        let initialized_event = self.event("initialized", Option::<Value>::None);

        DispatchOutcome {
            responses: vec![response],
            events: vec![initialized_event],
            should_exit: false,
        }
    }

    pub(in crate::adapter) fn handle_launch(&mut self, request: Request<Value>) -> DispatchOutcome {
        if self.session.state() != SessionState::Initialized {
            return self.state_error(&request);
        }
        let args = request
            .arguments
            .clone()
            .and_then(|value| serde_json::from_value::<LaunchArguments>(value).ok())
            .unwrap_or_default();
        let program = launch_program_path(&args);

        if let Err(err) = self.session.bridge_mut().launch(program.as_deref()) {
            return DispatchOutcome {
                responses: vec![self.error_response(&request, &err.to_string())],
                ..DispatchOutcome::default()
            };
        }
        self.launch_state.stop_on_entry = launch_stop_on_entry(&args);
        self.session.set_state(SessionState::Launched);
        info!(program = ?program, command = %request.command, "story launched");

        let response = self.ok_response::<Value>(&request, None);
        let events = if self.launch_state.configured {
            self.start_story()
        } else {
            Vec::new()
        };
        DispatchOutcome {
            responses: vec![response],
            events,
            should_exit: false,
        }
    }

    pub(in crate::adapter) fn handle_configuration_done(
        &mut self,
        request: Request<Value>,
    ) -> DispatchOutcome {
        match self.session.state() {
            SessionState::Initialized => {
                self.launch_state.configured = true;
                DispatchOutcome {
                    responses: vec![self.ok_response::<Value>(&request, None)],
                    events: vec![self.debug_output_message(
                        "[tale-debug] configuration done; waiting for launch",
                    )],
                    should_exit: false,
                }
            }
            SessionState::Launched => {
                self.launch_state.configured = true;
                let response = self.ok_response::<Value>(&request, None);
                let events = self.start_story();
                DispatchOutcome {
                    responses: vec![response],
                    events,
                    should_exit: false,
                }
            }
            _ => self.state_error(&request),
        }
    }

    fn start_story(&mut self) -> Vec<Value> {
        let LaunchState {
            stop_on_entry,
            pause_requested,
            ..
        } = self.launch_state;
        self.launch_state.pause_requested = false;
        let report = self.session.start(stop_on_entry, pause_requested);
        self.run_report_events(report)
    }
}
