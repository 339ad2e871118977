use std::fmt::Display;

use num_format::ToFormattedString;

use crate::config::{user_locale, PosType, StepBig, StepSmall};

/// Why a run was aborted. Both reasons are fatal for the run; the cross-check
/// mismatch in particular signals a correctness bug in a tape backend and
/// must never be silently suppressed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AbortReason {
    /// The head left the fixed capacity of the bit tape.
    TapeBoundReached,
    /// Two lockstep tapes disagree; first differing relative position if the
    /// periodic compare found it, or the head position on a read mismatch.
    TapeMismatch(PosType),
    /// Two lockstep tapes disagree on the head position itself.
    TapeMismatchHead,
}

/// Result state of one machine run.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum RunStatus {
    /// Run can still be stepped (includes a fresh machine).
    #[default]
    Running,
    /// Halted after steps.
    Halted(StepBig),
    /// Halted after steps, non-zero cells at halt.
    HaltedDetail(StepBig, StepSmall),
    /// Step budget exhausted after steps; not an error, the run may continue.
    UndecidedStepLimit(StepBig),
    /// Fatal error after steps, see reason.
    Aborted(StepBig, AbortReason),
}

impl RunStatus {
    pub fn is_halted(&self) -> bool {
        matches!(self, RunStatus::Halted(_) | RunStatus::HaltedDetail(_, _))
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, RunStatus::Aborted(_, _))
    }

    /// Steps walked when this status was recorded; 0 for a fresh run.
    pub fn steps(&self) -> StepBig {
        match self {
            RunStatus::Running => 0,
            RunStatus::Halted(steps)
            | RunStatus::HaltedDetail(steps, _)
            | RunStatus::UndecidedStepLimit(steps)
            | RunStatus::Aborted(steps, _) => *steps,
        }
    }
}

impl Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let locale = user_locale();
        match self {
            RunStatus::Running => write!(f, "Running"),
            RunStatus::Halted(steps) => {
                write!(f, "Halted after {} steps", steps.to_formatted_string(&locale))
            }
            RunStatus::HaltedDetail(steps, nonzero) => write!(
                f,
                "Halted after {} steps, non-zero cells: {}",
                steps.to_formatted_string(&locale),
                nonzero.to_formatted_string(&locale)
            ),
            RunStatus::UndecidedStepLimit(steps) => write!(
                f,
                "Undecided: Step limit reached, machine did not halt for {} steps",
                steps.to_formatted_string(&locale)
            ),
            RunStatus::Aborted(steps, reason) => {
                let steps = steps.to_formatted_string(&locale);
                match reason {
                    AbortReason::TapeBoundReached => {
                        write!(f, "Aborted: Tape bound reached after {steps} steps")
                    }
                    AbortReason::TapeMismatch(pos) => write!(
                        f,
                        "Aborted: Tapes differ at relative position {pos} after {steps} steps"
                    ),
                    AbortReason::TapeMismatchHead => {
                        write!(f, "Aborted: Tape head positions differ after {steps} steps")
                    }
                }
            }
        }
    }
}
