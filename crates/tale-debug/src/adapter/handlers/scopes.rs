//! Scope requests.
//! - handle_scopes: the single `Story` scope of the current stop

use serde_json::Value;

use crate::protocol::{Request, Scope, ScopesArguments, ScopesResponseBody};

use super::super::{DebugAdapter, DispatchOutcome};

impl DebugAdapter {
    pub(in crate::adapter) fn handle_scopes(&mut self, request: Request<Value>) -> DispatchOutcome {
        let Some(_args) = request
            .arguments
            .clone()
            .and_then(|value| serde_json::from_value::<ScopesArguments>(value).ok())
        else {
            return DispatchOutcome {
                responses: vec![self.error_response(&request, "invalid scopes args")],
                ..DispatchOutcome::default()
            };
        };

        let scopes = self
            .session
            .stop()
            .map(|stop| {
                vec![Scope {
                    name: "Story".to_string(),
                    variables_reference: stop.scope_reference,
                    expensive: false,
                    named_variables: u32::try_from(stop.state.len()).ok(),
                }]
            })
            .unwrap_or_default();

        DispatchOutcome {
            responses: vec![self.ok_response(&request, Some(ScopesResponseBody { scopes }))],
            ..DispatchOutcome::default()
        }
    }
}
