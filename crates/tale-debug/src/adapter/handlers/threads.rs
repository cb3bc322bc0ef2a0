//! Thread requests.
//! - handle_threads: the single story thread

use serde_json::Value;

use crate::protocol::{Request, Thread, ThreadsResponseBody};

use super::super::stop::STORY_THREAD_ID;
use super::super::{DebugAdapter, DispatchOutcome};

impl DebugAdapter {
    pub(in crate::adapter) fn handle_threads(
        &mut self,
        request: Request<Value>,
    ) -> DispatchOutcome {
        let body = ThreadsResponseBody {
            threads: vec![Thread {
                id: STORY_THREAD_ID,
                name: "Story".to_string(),
            }],
        };
        DispatchOutcome {
            responses: vec![self.ok_response(&request, Some(body))],
            ..DispatchOutcome::default()
        }
    }
}
