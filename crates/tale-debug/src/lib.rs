//! Debug Adapter Protocol (DAP) support for interactive-fiction stories.

mod adapter;
pub mod bridge;
pub mod breakpoints;
mod protocol;
mod session;
pub mod variables;

pub use adapter::DebugAdapter;
pub use bridge::{BridgeError, ExecutionBridge, FrameInfo, Location, ReplayBridge, TracePoint};
pub use breakpoints::{BreakDecision, BreakpointManager, BreakpointSpec, Verification};
pub use protocol::{
    Breakpoint, Capabilities, ContinueResponseBody, DisconnectArguments, EvaluateArguments,
    EvaluateResponseBody, Event, InitializeArguments, InitializeResponseBody, LaunchArguments,
    MessageType, OutputEventBody, Request, Response, Scope, ScopesArguments, ScopesResponseBody,
    SetBreakpointsArguments, SetBreakpointsResponseBody, Source, SourceBreakpoint, StackFrame,
    StackTraceArguments, StackTraceResponseBody, StoppedEventBody, TerminateArguments,
    TerminatedEventBody, Thread, ThreadArguments, ThreadsResponseBody, Variable,
    VariablesArguments, VariablesResponseBody,
};
pub use session::{
    Advance, LogLine, RunEnd, RunReport, Session, SessionState, StopReason, StopSnapshot,
};
pub use variables::VariableSerializer;
