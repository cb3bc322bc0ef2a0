//! Hit-count conditions.

/// Comparator applied to a breakpoint's accumulated hit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitCondition {
    /// Break when the hit count equals the target.
    Equal(u64),
    /// Break when the hit count is at least the target.
    AtLeast(u64),
    /// Break when the hit count is greater than the target.
    GreaterThan(u64),
}

impl HitCondition {
    #[must_use]
    pub fn is_met(self, hits: u64) -> bool {
        match self {
            HitCondition::Equal(target) => hits == target,
            HitCondition::AtLeast(target) => hits >= target,
            HitCondition::GreaterThan(target) => hits > target,
        }
    }
}

/// Parses `"== N"`, `">= N"`, `"> N"` or a bare `"N"` (treated as `==`).
///
/// Returns `None` for empty input, unknown operators, non-numeric targets
/// and a zero target.
pub fn parse_hit_condition(raw: &str) -> Option<HitCondition> {
    let text = raw.trim();
    let operator_len = text
        .find(|ch: char| !matches!(ch, '=' | '>' | '<' | '!'))
        .unwrap_or(text.len());
    let (operator, target) = text.split_at(operator_len);
    let target = target.trim().parse::<u64>().ok().filter(|target| *target > 0)?;
    match operator {
        "" | "==" => Some(HitCondition::Equal(target)),
        ">=" => Some(HitCondition::AtLeast(target)),
        ">" => Some(HitCondition::GreaterThan(target)),
        _ => None,
    }
}
