//! Evaluate request.
//! - handle_evaluate: sandboxed expression against the stopped story state

use serde_json::Value;
use tracing::debug;

use crate::protocol::{EvaluateArguments, EvaluateResponseBody, Request};

use super::super::{DebugAdapter, DispatchOutcome};

impl DebugAdapter {
    pub(in crate::adapter) fn handle_evaluate(
        &mut self,
        request: Request<Value>,
    ) -> DispatchOutcome {
        let Some(args) = request
            .arguments
            .clone()
            .and_then(|value| serde_json::from_value::<EvaluateArguments>(value).ok())
        else {
            return DispatchOutcome {
                responses: vec![self.error_response(&request, "invalid evaluate args")],
                ..DispatchOutcome::default()
            };
        };
        let Some(context) = self.session.stop().map(|stop| stop.state.clone()) else {
            return self.state_error(&request);
        };

        let expression = args.expression.trim();
        match self.session.variables().evaluate(expression, &context) {
            Ok(value) => {
                let variable = self.session.variables_mut().serialize(expression, &value);
                let body = EvaluateResponseBody {
                    result: variable.value,
                    r#type: variable.r#type,
                    variables_reference: variable.variables_reference,
                };
                DispatchOutcome {
                    responses: vec![self.ok_response(&request, Some(body))],
                    ..DispatchOutcome::default()
                }
            }
            Err(err) => {
                debug!(expression, error = %err, "evaluate failed");
                DispatchOutcome {
                    responses: vec![self.error_response(&request, &err.to_string())],
                    ..DispatchOutcome::default()
                }
            }
        }
    }
}
