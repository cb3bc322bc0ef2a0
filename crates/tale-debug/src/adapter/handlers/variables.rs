//! Variables request.
//! - handle_variables: expand a reference through the Variable Serializer

use serde_json::Value;

use crate::protocol::{Request, VariablesArguments, VariablesResponseBody};

use super::super::{DebugAdapter, DispatchOutcome};

impl DebugAdapter {
    pub(in crate::adapter) fn handle_variables(
        &mut self,
        request: Request<Value>,
    ) -> DispatchOutcome {
        let Some(args) = request
            .arguments
            .clone()
            .and_then(|value| serde_json::from_value::<VariablesArguments>(value).ok())
        else {
            return DispatchOutcome {
                responses: vec![self.error_response(&request, "invalid variables args")],
                ..DispatchOutcome::default()
            };
        };

        let variables = self
            .session
            .variables_mut()
            .get_variables(args.variables_reference);
        DispatchOutcome {
            responses: vec![self.ok_response(&request, Some(VariablesResponseBody { variables }))],
            ..DispatchOutcome::default()
        }
    }
}
