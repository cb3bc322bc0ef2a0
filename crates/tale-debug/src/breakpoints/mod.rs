//! Breakpoint Manager: per-source breakpoint sets with conditions, hit
//! counts and logpoints.
//!
//! Pure bookkeeping; the adapter asks [`BreakpointManager::should_break`] at
//! every pause point the bridge reports.

mod hit;
mod logpoint;

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use tale_eval::{eval_expr, parse, Context, EvalError, Expr, Value};
use tracing::debug;

pub use hit::{parse_hit_condition, HitCondition};
use logpoint::{format_log_message, parse_log_message, LogFragment};

/// Normalises a source path so client and bridge spellings compare equal.
#[must_use]
pub fn source_key(file: &str) -> String {
    file.replace('\\', "/")
}

/// Optional settings for one requested line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakpointSpec {
    pub condition: Option<String>,
    pub hit_condition: Option<String>,
    pub log_message: Option<String>,
}

/// Result reported back for one requested line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub id: u32,
    pub line: u32,
    pub verified: bool,
    pub message: Option<String>,
}

/// Outcome of a pause-point check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakDecision {
    /// Keep running.
    Pass,
    /// Halt at this location.
    Halt,
    /// Logpoint fired: emit the message and keep running.
    Log(String),
}

impl BreakDecision {
    #[must_use]
    pub fn halts(&self) -> bool {
        matches!(self, BreakDecision::Halt)
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            BreakDecision::Log(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HitRule {
    Always,
    When(HitCondition),
    /// The client supplied a hit condition that does not parse.
    Never,
}

impl HitRule {
    fn is_met(self, hits: u64) -> bool {
        match self {
            HitRule::Always => true,
            HitRule::When(condition) => condition.is_met(hits),
            HitRule::Never => false,
        }
    }
}

#[derive(Debug, Clone)]
struct Breakpoint {
    id: u32,
    enabled: bool,
    condition: Option<Result<Expr, EvalError>>,
    hit_rule: HitRule,
    log_message: Option<Vec<LogFragment>>,
    hits: u64,
}

impl Breakpoint {
    fn condition_passes(&self, state: &Context) -> bool {
        match &self.condition {
            None => true,
            Some(Ok(expr)) => matches!(eval_expr(expr, state), Ok(Value::Bool(true))),
            Some(Err(_)) => false,
        }
    }
}

/// Registry of breakpoints keyed by normalised file and line.
#[derive(Debug, Default)]
pub struct BreakpointManager {
    files: FxHashMap<String, BTreeMap<u32, Breakpoint>>,
    next_id: u32,
}

impl BreakpointManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every breakpoint of `file`.
    ///
    /// `specs[i]` configures `lines[i]`; `specs` may be shorter than `lines`.
    /// One verification is returned per requested line, in request order.
    pub fn set_breakpoints(
        &mut self,
        file: &str,
        lines: &[u32],
        specs: &[BreakpointSpec],
    ) -> Vec<Verification> {
        let key = source_key(file);
        let mut set = BTreeMap::new();
        let mut verifications = Vec::with_capacity(lines.len());

        for (index, &line) in lines.iter().enumerate() {
            let spec = specs.get(index).cloned().unwrap_or_default();
            self.next_id += 1;
            let id = self.next_id;
            let mut problems = Vec::new();

            let condition = spec
                .condition
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(|text| {
                    let compiled = parse(text);
                    if let Err(err) = &compiled {
                        problems.push(format!("condition: {err}"));
                    }
                    compiled
                });

            let hit_rule = match spec
                .hit_condition
                .as_deref()
                .filter(|text| !text.trim().is_empty())
            {
                None => HitRule::Always,
                Some(text) => match parse_hit_condition(text) {
                    Some(condition) => HitRule::When(condition),
                    None => {
                        problems.push(format!("invalid hit condition '{text}'"));
                        HitRule::Never
                    }
                },
            };

            let log_message = spec
                .log_message
                .as_deref()
                .filter(|text| !text.is_empty())
                .map(parse_log_message);

            set.insert(
                line,
                Breakpoint {
                    id,
                    enabled: true,
                    condition,
                    hit_rule,
                    log_message,
                    hits: 0,
                },
            );
            verifications.push(Verification {
                id,
                line,
                verified: true,
                message: (!problems.is_empty()).then(|| problems.join("; ")),
            });
        }

        debug!(file = %key, count = set.len(), "breakpoints replaced");
        if set.is_empty() {
            self.files.remove(&key);
        } else {
            self.files.insert(key, set);
        }
        verifications
    }

    fn enabled(&self, file: &str, line: u32) -> Option<&Breakpoint> {
        self.files
            .get(&source_key(file))
            .and_then(|set| set.get(&line))
            .filter(|breakpoint| breakpoint.enabled)
    }

    fn enabled_mut(&mut self, file: &str, line: u32) -> Option<&mut Breakpoint> {
        self.files
            .get_mut(&source_key(file))
            .and_then(|set| set.get_mut(&line))
            .filter(|breakpoint| breakpoint.enabled)
    }

    /// True only for an enabled breakpoint at exactly `file:line`.
    #[must_use]
    pub fn has_breakpoint(&self, file: &str, line: u32) -> bool {
        self.enabled(file, line).is_some()
    }

    /// Evaluates the breakpoint's condition against `state`.
    ///
    /// No condition passes; a condition that fails to parse or evaluate, or
    /// yields anything but `true`, does not. Without an enabled breakpoint the
    /// answer is `false`.
    #[must_use]
    pub fn check_condition(&self, file: &str, line: u32, state: &Context) -> bool {
        self.enabled(file, line)
            .is_some_and(|breakpoint| breakpoint.condition_passes(state))
    }

    /// Counts one hit and tests the hit condition against the new total.
    pub fn check_hit_count(&mut self, file: &str, line: u32) -> bool {
        let Some(breakpoint) = self.enabled_mut(file, line) else {
            return false;
        };
        breakpoint.hits = breakpoint.hits.saturating_add(1);
        breakpoint.hit_rule.is_met(breakpoint.hits)
    }

    /// Decides what happens when execution reaches `file:line`.
    ///
    /// The hit count advances on every reach of an enabled breakpoint; the
    /// breakpoint fires only when both its condition and its hit condition
    /// pass. Logpoints never halt.
    pub fn should_break(&mut self, file: &str, line: u32, state: &Context) -> BreakDecision {
        if !self.has_breakpoint(file, line) {
            return BreakDecision::Pass;
        }
        let hit_ok = self.check_hit_count(file, line);
        let condition_ok = self.check_condition(file, line, state);
        if !hit_ok || !condition_ok {
            return BreakDecision::Pass;
        }
        match self
            .enabled(file, line)
            .and_then(|breakpoint| breakpoint.log_message.as_ref())
        {
            Some(fragments) => BreakDecision::Log(format_log_message(fragments, state)),
            None => BreakDecision::Halt,
        }
    }

    /// Enables or disables the breakpoint at `file:line`. Hit counts survive.
    pub fn set_enabled(&mut self, file: &str, line: u32, enabled: bool) -> bool {
        let Some(breakpoint) = self
            .files
            .get_mut(&source_key(file))
            .and_then(|set| set.get_mut(&line))
        else {
            return false;
        };
        breakpoint.enabled = enabled;
        true
    }

    pub fn clear_breakpoints(&mut self, file: &str) {
        self.files.remove(&source_key(file));
    }

    /// Id of the breakpoint at `file:line`, enabled or not.
    #[must_use]
    pub fn breakpoint_id(&self, file: &str, line: u32) -> Option<u32> {
        self.files
            .get(&source_key(file))
            .and_then(|set| set.get(&line))
            .map(|breakpoint| breakpoint.id)
    }

    #[must_use]
    pub fn hit_count(&self, file: &str, line: u32) -> Option<u64> {
        self.files
            .get(&source_key(file))
            .and_then(|set| set.get(&line))
            .map(|breakpoint| breakpoint.hits)
    }

    #[must_use]
    pub fn breakpoint_count(&self) -> usize {
        self.files.values().map(BTreeMap::len).sum()
    }
}
