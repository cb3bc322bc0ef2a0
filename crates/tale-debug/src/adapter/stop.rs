//! Run reports to protocol events.
//! - run_report_events: logpoint output, stopped and terminated events
//! - source_for_location: client source for a story location

use serde_json::Value;

use crate::bridge::Location;
use crate::protocol::{OutputEventBody, Source, StoppedEventBody, TerminatedEventBody};
use crate::session::{RunEnd, RunReport, StopReason};

use super::DebugAdapter;

/// The story runs on a single thread.
pub(super) const STORY_THREAD_ID: u32 = 1;

impl DebugAdapter {
    pub(super) fn run_report_events(&self, report: RunReport) -> Vec<Value> {
        let mut events: Vec<Value> = report
            .logs
            .into_iter()
            .map(|log| {
                let output = if log.message.ends_with('\n') {
                    log.message
                } else {
                    format!("{}\n", log.message)
                };
                let body = OutputEventBody {
                    output,
                    category: Some("console".to_string()),
                    source: Some(source_for_location(&log.location)),
                    line: Some(self.to_client_line(log.location.line)),
                };
                self.event("output", Some(body))
            })
            .collect();

        match report.end {
            RunEnd::Stopped(reason) => {
                let stop = self.session.stop();
                let text = stop.and_then(|stop| stop.text.clone());
                if reason == StopReason::Exception {
                    if let Some(text) = &text {
                        let body = OutputEventBody {
                            output: format!("{text}\n"),
                            category: Some("stderr".to_string()),
                            source: stop
                                .and_then(|stop| stop.location.as_ref())
                                .map(source_for_location),
                            line: stop
                                .and_then(|stop| stop.location.as_ref())
                                .map(|location| self.to_client_line(location.line)),
                        };
                        events.push(self.event("output", Some(body)));
                    }
                }
                let body = StoppedEventBody {
                    reason: reason.as_str().to_string(),
                    description: (reason == StopReason::Exception)
                        .then(|| "Story error".to_string()),
                    thread_id: Some(STORY_THREAD_ID),
                    text,
                    all_threads_stopped: Some(true),
                    hit_breakpoint_ids: stop
                        .and_then(|stop| stop.hit_breakpoint)
                        .into_iter()
                        .collect(),
                };
                events.push(self.event("stopped", Some(body)));
            }
            RunEnd::Terminated => {
                events.push(self.event("terminated", Some(TerminatedEventBody { restart: None })));
            }
        }
        events
    }
}

pub(super) fn source_for_location(location: &Location) -> Source {
    Source::from_path(&location.file)
}
