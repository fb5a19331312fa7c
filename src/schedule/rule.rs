use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::state::RunState;
use crate::error::RuleError;

/// The two actions a run can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Post,
    Panel,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Post => write!(f, "post"),
            ActionKind::Panel => write!(f, "panel"),
        }
    }
}

/// A parsed rule predicate.
///
/// Rule text is data supplied by the catalog, so it is parsed into this closed
/// set of shapes instead of being executed. Evaluation only ever sees the run
/// state and the current instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// Always false; permanently disables the action.
    Never,
    /// Due once at least `hours` have elapsed since the last successful action.
    Interval { hours: f64 },
}

impl Trigger {
    /// Whether the action is due given when it last completed.
    pub fn is_due(&self, last: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match *self {
            Trigger::Never => false,
            Trigger::Interval { hours } => {
                let millis = (hours * 3_600_000.0).round() as i64;
                TimeDelta::try_milliseconds(millis)
                    .and_then(|interval| last.checked_add_signed(interval))
                    .is_some_and(|next| next <= now)
            }
        }
    }
}

impl FromStr for Trigger {
    type Err = RuleError;

    /// Parses `never()`, `never`, `hourInterval(N)` or `interval(N)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expr = s.trim();
        if expr == "never" {
            return Ok(Trigger::Never);
        }

        let (name, rest) = expr
            .split_once('(')
            .ok_or_else(|| RuleError::Malformed(expr.to_string()))?;
        let arg = rest
            .trim_end()
            .strip_suffix(')')
            .ok_or_else(|| RuleError::Malformed(expr.to_string()))?
            .trim();

        match name.trim() {
            "never" if arg.is_empty() => Ok(Trigger::Never),
            "hourInterval" | "interval" => {
                let hours: f64 = arg
                    .parse()
                    .map_err(|_| RuleError::InvalidInterval(arg.to_string()))?;
                if !hours.is_finite() || hours < 0.0 {
                    return Err(RuleError::InvalidInterval(arg.to_string()));
                }
                Ok(Trigger::Interval { hours })
            }
            _ => Err(RuleError::Malformed(expr.to_string())),
        }
    }
}

/// One row of the posting schedule. The latest rule whose `start` is not in
/// the future is the active one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRule {
    pub start: DateTime<Utc>,
    pub post: String,
    #[serde(alias = "sidebar")]
    pub panel: String,
}

impl ScheduleRule {
    #[cfg(test)]
    pub fn new(start: DateTime<Utc>, post: impl Into<String>, panel: impl Into<String>) -> Self {
        Self {
            start,
            post: post.into(),
            panel: panel.into(),
        }
    }

    /// Parse the predicate for one action.
    pub fn trigger(&self, kind: ActionKind) -> Result<Trigger, RuleError> {
        match kind {
            ActionKind::Post => self.post.parse(),
            ActionKind::Panel => self.panel.parse(),
        }
    }
}

/// Which actions are due this run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub post: bool,
    pub panel: bool,
}

impl Decision {
    pub fn any(&self) -> bool {
        self.post || self.panel
    }

    pub fn is_due(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Post => self.post,
            ActionKind::Panel => self.panel,
        }
    }
}

/// Pick the rule with the latest `start` that is `<= now`.
pub fn select_rule(rules: &[ScheduleRule], now: DateTime<Utc>) -> Option<&ScheduleRule> {
    rules
        .iter()
        .filter(|rule| rule.start <= now)
        .max_by_key(|rule| rule.start)
}

/// Decide which actions are due. Both predicates are parsed before anything is
/// returned, so a malformed rule never yields a partial decision.
pub fn evaluate(
    rule: Option<&ScheduleRule>,
    state: &RunState,
    now: DateTime<Utc>,
) -> Result<Decision, RuleError> {
    let Some(rule) = rule else {
        return Ok(Decision::default());
    };

    let post = rule.trigger(ActionKind::Post)?;
    let panel = rule.trigger(ActionKind::Panel)?;

    Ok(Decision {
        post: post.is_due(state.last(ActionKind::Post), now),
        panel: panel.is_due(state.last(ActionKind::Panel), now),
    })
}
