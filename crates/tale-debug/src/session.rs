//! Debug session state: lifecycle state machine, the story bridge, the
//! Breakpoint Manager and the Variable Serializer.
//!
//! The session knows nothing about the wire protocol. The adapter turns its
//! [`RunReport`]s into `stopped`, `output` and `terminated` events.

use std::fmt;

use tale_eval::Context;
use tracing::{debug, info, warn};

use crate::bridge::{ExecutionBridge, FrameInfo, Location};
use crate::breakpoints::{BreakDecision, BreakpointManager};
use crate::variables::VariableSerializer;

/// Why the story is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Breakpoint,
    Step,
    Entry,
    Exception,
    Pause,
}

impl StopReason {
    /// Reason string used in `stopped` events.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::Breakpoint => "breakpoint",
            StopReason::Step => "step",
            StopReason::Entry => "entry",
            StopReason::Exception => "exception",
            StopReason::Pause => "pause",
        }
    }
}

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    Launched,
    Running,
    Stopped(StopReason),
    Terminated,
}

impl SessionState {
    #[must_use]
    pub fn is_stopped(self) -> bool {
        matches!(self, SessionState::Stopped(_))
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initialized => "initialized",
            SessionState::Launched => "launched",
            SessionState::Running => "running",
            SessionState::Stopped(_) => "stopped",
            SessionState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// How to resume from a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Continue,
    StepIn,
    StepOver,
    StepOut,
}

/// Everything captured when the story pauses.
#[derive(Debug, Clone)]
pub struct StopSnapshot {
    pub reason: StopReason,
    pub location: Option<Location>,
    pub state: Context,
    pub frames: Vec<FrameInfo>,
    /// Reference of the `Story` scope in the Variable Serializer.
    pub scope_reference: u32,
    pub text: Option<String>,
    pub hit_breakpoint: Option<u32>,
}

/// Logpoint message produced while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub location: Location,
    pub message: String,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    Stopped(StopReason),
    Terminated,
}

/// Result of letting the story run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub logs: Vec<LogLine>,
    pub end: RunEnd,
}

/// Process-wide debug session, created by the entry point and owned by the
/// adapter.
pub struct Session {
    state: SessionState,
    bridge: Box<dyn ExecutionBridge>,
    breakpoints: BreakpointManager,
    variables: VariableSerializer,
    stop: Option<StopSnapshot>,
}

impl Session {
    #[must_use]
    pub fn new(bridge: impl ExecutionBridge + 'static) -> Self {
        Self::with_bridge(Box::new(bridge))
    }

    #[must_use]
    pub fn with_bridge(bridge: Box<dyn ExecutionBridge>) -> Self {
        Self {
            state: SessionState::Uninitialized,
            bridge,
            breakpoints: BreakpointManager::new(),
            variables: VariableSerializer::new(),
            stop: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "session state");
        }
        self.state = state;
    }

    #[must_use]
    pub fn bridge(&self) -> &dyn ExecutionBridge {
        self.bridge.as_ref()
    }

    pub fn bridge_mut(&mut self) -> &mut dyn ExecutionBridge {
        self.bridge.as_mut()
    }

    #[must_use]
    pub fn breakpoints(&self) -> &BreakpointManager {
        &self.breakpoints
    }

    pub fn breakpoints_mut(&mut self) -> &mut BreakpointManager {
        &mut self.breakpoints
    }

    #[must_use]
    pub fn variables(&self) -> &VariableSerializer {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut VariableSerializer {
        &mut self.variables
    }

    /// Snapshot of the current stop, if the story is paused.
    #[must_use]
    pub fn stop(&self) -> Option<&StopSnapshot> {
        self.stop.as_ref()
    }

    /// Starts the story after configuration.
    ///
    /// `stop_on_entry` and `pause_requested` halt at the first pause point;
    /// otherwise that point is checked against breakpoints like any other.
    pub fn start(&mut self, stop_on_entry: bool, pause_requested: bool) -> RunReport {
        self.resume();
        if self.bridge.is_terminated() || self.bridge.current_location().is_none() {
            return self.finish(Vec::new());
        }
        if stop_on_entry {
            return self.halt(Vec::new(), StopReason::Entry, None, None);
        }
        if pause_requested {
            return self.halt(Vec::new(), StopReason::Pause, None, None);
        }
        let mut logs = Vec::new();
        if let Some(report) = self.check_location(&mut logs) {
            return report;
        }
        self.run_loop(Advance::Continue, logs)
    }

    /// Resumes from a stop. Steps halt on the next pause point with reason
    /// `step`; continue runs until a breakpoint fires or the story ends.
    pub fn advance(&mut self, how: Advance) -> RunReport {
        self.resume();
        self.run_loop(how, Vec::new())
    }

    fn run_loop(&mut self, how: Advance, mut logs: Vec<LogLine>) -> RunReport {
        loop {
            let result = match how {
                Advance::Continue => self.bridge.continue_run(),
                Advance::StepIn => self.bridge.step_into(),
                Advance::StepOver => self.bridge.step_over(),
                Advance::StepOut => self.bridge.step_out(),
            };
            if let Err(err) = result {
                warn!(error = %err, "story raised an error");
                if self.bridge.is_terminated() {
                    return self.finish(logs);
                }
                return self.halt(logs, StopReason::Exception, Some(err.to_string()), None);
            }
            if self.bridge.is_terminated() {
                return self.finish(logs);
            }
            if how != Advance::Continue {
                return self.halt(logs, StopReason::Step, None, None);
            }
            if let Some(report) = self.check_location(&mut logs) {
                return report;
            }
        }
    }

    /// Asks the Breakpoint Manager about the current pause point.
    fn check_location(&mut self, logs: &mut Vec<LogLine>) -> Option<RunReport> {
        let location = self.bridge.current_location()?;
        let state = self.bridge.current_state();
        match self
            .breakpoints
            .should_break(&location.file, location.line, &state)
        {
            BreakDecision::Pass => None,
            BreakDecision::Log(message) => {
                debug!(file = %location.file, line = location.line, "logpoint");
                logs.push(LogLine { location, message });
                None
            }
            BreakDecision::Halt => {
                let id = self.breakpoints.breakpoint_id(&location.file, location.line);
                Some(self.halt(std::mem::take(logs), StopReason::Breakpoint, None, id))
            }
        }
    }

    fn resume(&mut self) {
        self.stop = None;
        self.variables.clear();
        self.set_state(SessionState::Running);
    }

    fn halt(
        &mut self,
        logs: Vec<LogLine>,
        reason: StopReason,
        text: Option<String>,
        hit_breakpoint: Option<u32>,
    ) -> RunReport {
        self.variables.clear();
        let state = self.bridge.current_state();
        let scope_reference = self.variables.register_scope(&state);
        let location = self.bridge.current_location();
        if let Some(location) = &location {
            info!(reason = reason.as_str(), file = %location.file, line = location.line, "story stopped");
        }
        self.stop = Some(StopSnapshot {
            reason,
            location,
            state,
            frames: self.bridge.stack_frames(),
            scope_reference,
            text,
            hit_breakpoint,
        });
        self.set_state(SessionState::Stopped(reason));
        RunReport {
            logs,
            end: RunEnd::Stopped(reason),
        }
    }

    fn finish(&mut self, logs: Vec<LogLine>) -> RunReport {
        info!("story finished");
        self.stop = None;
        self.variables.clear();
        self.set_state(SessionState::Terminated);
        RunReport {
            logs,
            end: RunEnd::Terminated,
        }
    }

    /// Stops the story and releases the bridge. Valid from any state.
    pub fn terminate(&mut self) {
        self.bridge.terminate();
        self.stop = None;
        self.variables.clear();
        self.set_state(SessionState::Terminated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{ReplayBridge, TracePoint};
    use crate::breakpoints::BreakpointSpec;
    use serde_json::json;

    fn visits_trace() -> Vec<TracePoint> {
        let mut points = vec![TracePoint::new("story.ink", 1)];
        for visits in 1..=3 {
            points.push(TracePoint::new("story.ink", 10).with_var("visits", json!(visits)));
            points.push(TracePoint::new("story.ink", 11).with_var("visits", json!(visits)));
        }
        points
    }

    fn launched(points: Vec<TracePoint>) -> Session {
        let mut bridge = ReplayBridge::from_points(points);
        bridge.launch(None).unwrap();
        let mut session = Session::new(bridge);
        session.set_state(SessionState::Launched);
        session
    }

    fn current_line(session: &Session) -> Option<u32> {
        session
            .stop()
            .and_then(|stop| stop.location.as_ref())
            .map(|location| location.line)
    }

    #[test]
    fn conditional_breakpoint_stops_on_third_reach() {
        let mut session = launched(visits_trace());
        session.breakpoints_mut().set_breakpoints(
            "story.ink",
            &[10],
            &[BreakpointSpec {
                condition: Some("visits > 2".to_string()),
                ..BreakpointSpec::default()
            }],
        );
        let report = session.start(false, false);
        assert_eq!(report.end, RunEnd::Stopped(StopReason::Breakpoint));
        let stop = session.stop().unwrap();
        assert_eq!(stop.state["visits"], tale_eval::Value::Number(3.0));
        assert_eq!(session.breakpoints().hit_count("story.ink", 10), Some(3));

        let report = session.advance(Advance::Continue);
        assert_eq!(report.end, RunEnd::Terminated);
        assert_eq!(session.state(), SessionState::Terminated);
    }

    #[test]
    fn continue_does_not_recheck_the_stop_location() {
        let mut session = launched(vec![
            TracePoint::new("a.ink", 1),
            TracePoint::new("a.ink", 2),
            TracePoint::new("a.ink", 1),
        ]);
        session.breakpoints_mut().set_breakpoints("a.ink", &[1], &[]);
        assert_eq!(
            session.start(false, false).end,
            RunEnd::Stopped(StopReason::Breakpoint)
        );
        assert_eq!(current_line(&session), Some(1));
        assert_eq!(
            session.advance(Advance::Continue).end,
            RunEnd::Stopped(StopReason::Breakpoint)
        );
        assert_eq!(session.breakpoints().hit_count("a.ink", 1), Some(2));
    }

    #[test]
    fn steps_ignore_breakpoints() {
        let mut session = launched(vec![
            TracePoint::new("a.ink", 1),
            TracePoint::new("a.ink", 2),
        ]);
        session.breakpoints_mut().set_breakpoints(
            "a.ink",
            &[2],
            &[BreakpointSpec {
                log_message: Some("never".to_string()),
                ..BreakpointSpec::default()
            }],
        );
        session.start(true, false);
        let report = session.advance(Advance::StepOver);
        assert_eq!(report.end, RunEnd::Stopped(StopReason::Step));
        assert!(report.logs.is_empty());
        assert_eq!(session.breakpoints().hit_count("a.ink", 2), Some(0));
    }

    #[test]
    fn logpoints_are_collected_while_running() {
        let mut session = launched(visits_trace());
        session.breakpoints_mut().set_breakpoints(
            "story.ink",
            &[11],
            &[BreakpointSpec {
                log_message: Some("visits={visits}".to_string()),
                ..BreakpointSpec::default()
            }],
        );
        let report = session.start(false, false);
        assert_eq!(report.end, RunEnd::Terminated);
        let messages: Vec<_> = report.logs.iter().map(|log| log.message.as_str()).collect();
        assert_eq!(messages, vec!["visits=1", "visits=2", "visits=3"]);
    }

    #[test]
    fn entry_and_pause_stop_immediately() {
        let mut session = launched(visits_trace());
        assert_eq!(
            session.start(true, true).end,
            RunEnd::Stopped(StopReason::Entry)
        );
        let mut session = launched(visits_trace());
        assert_eq!(
            session.start(false, true).end,
            RunEnd::Stopped(StopReason::Pause)
        );
        assert_eq!(current_line(&session), Some(1));
    }

    #[test]
    fn bridge_errors_become_exception_stops() {
        let mut session = launched(vec![
            TracePoint::new("a.ink", 1),
            TracePoint::new("a.ink", 5).failing("missing knot 'cellar'"),
        ]);
        session.start(true, false);
        let report = session.advance(Advance::Continue);
        assert_eq!(report.end, RunEnd::Stopped(StopReason::Exception));
        let stop = session.stop().unwrap();
        assert_eq!(
            stop.text.as_deref(),
            Some("story runtime error: missing knot 'cellar'")
        );
        assert_eq!(current_line(&session), Some(5));
    }

    #[test]
    fn each_stop_invalidates_previous_references() {
        let mut session = launched(vec![
            TracePoint::new("a.ink", 1).with_var("bag", json!(["lamp"])),
            TracePoint::new("a.ink", 2).with_var("bag", json!(["lamp", "key"])),
        ]);
        session.start(true, false);
        let scope = session.stop().unwrap().scope_reference;
        let bag = session.variables_mut().get_variables(scope)[0].variables_reference;
        assert_eq!(session.variables_mut().get_variables(bag).len(), 1);

        session.advance(Advance::StepIn);
        let scope = session.stop().unwrap().scope_reference;
        assert_eq!(scope, 1);
        assert!(session.variables_mut().get_variables(bag).is_empty());
    }

    #[test]
    fn terminate_releases_the_bridge() {
        let mut session = launched(visits_trace());
        session.start(true, false);
        session.terminate();
        assert_eq!(session.state(), SessionState::Terminated);
        assert!(session.bridge().is_terminated());
        assert!(session.stop().is_none());
    }
}
