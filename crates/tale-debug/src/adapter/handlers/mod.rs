//! Request handlers grouped by DAP area.
//! - initialize: initialize/launch/configuration timing
//! - breakpoints: setBreakpoints + exception filters
//! - lifecycle: disconnect/terminate
//! - threads: thread list
//! - stack_trace: stackTrace request
//! - scopes: scope enumeration
//! - variables: reference expansion
//! - evaluate: sandboxed expressions
//! - run_control: continue/pause/step

mod breakpoints;
mod evaluate;
mod initialize;
mod lifecycle;
mod run_control;
mod scopes;
mod stack_trace;
mod threads;
mod variables;
