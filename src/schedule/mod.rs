mod phase;
mod rule;
mod state;

pub use phase::{Phase, PhaseTrace};
pub use rule::{ActionKind, Decision, ScheduleRule, Trigger, evaluate, select_rule};
pub use state::RunState;
