//! Stages of the per-kind interaction state machines.

use std::fmt;
use std::str::FromStr;

use rh_core::InteractionKind;

/// A named sub-step of an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Nothing entered yet.
    Init,
    /// Two-step understanding check.
    Understanding,
    /// Response selection (terminal for one-step, two-step and end-point).
    Response,
    /// Reorder submission (terminal).
    Reorder,
    /// Multichoice submission (terminal).
    Multichoice,
    /// Dialogue line `n`.
    Line(u32),
    /// Completed; nothing more is accepted until the interaction is entered again.
    Done,
}

impl Stage {
    /// Stage an interaction of `kind` starts in.
    pub fn entry(kind: InteractionKind) -> Self {
        match kind {
            InteractionKind::OneStep | InteractionKind::EndPoint => Self::Response,
            InteractionKind::TwoStep => Self::Understanding,
            InteractionKind::Reorder => Self::Reorder,
            InteractionKind::Multichoice => Self::Multichoice,
            InteractionKind::Dialogue => Self::Line(0),
        }
    }

    /// Whether a submission at this stage completes an interaction of `kind`.
    ///
    /// Dialogue lines are terminal only at the last line; see [`Stage::is_last_line`].
    pub fn is_terminal(self, kind: InteractionKind) -> bool {
        matches!(
            (kind, self),
            (
                InteractionKind::OneStep | InteractionKind::TwoStep | InteractionKind::EndPoint,
                Self::Response
            ) | (InteractionKind::Reorder, Self::Reorder)
                | (InteractionKind::Multichoice, Self::Multichoice)
        )
    }

    /// Whether this is the final line of a dialogue with `lines` lines.
    pub fn is_last_line(self, lines: u32) -> bool {
        matches!(self, Self::Line(n) if n + 1 >= lines)
    }

    /// The stage after a two-step understanding submission.
    pub fn after_understanding(function_expected: bool) -> Self {
        if function_expected {
            Self::Response
        } else {
            Self::Understanding
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("init"),
            Self::Understanding => f.write_str("understanding"),
            Self::Response => f.write_str("response"),
            Self::Reorder => f.write_str("reord"),
            Self::Multichoice => f.write_str("multichoice"),
            Self::Line(n) => write!(f, "line_{n}"),
            Self::Done => f.write_str("done"),
        }
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "init" => Ok(Self::Init),
            "understanding" => Ok(Self::Understanding),
            "response" => Ok(Self::Response),
            "reord" => Ok(Self::Reorder),
            "multichoice" => Ok(Self::Multichoice),
            "done" => Ok(Self::Done),
            other => other
                .strip_prefix("line_")
                .and_then(|n| n.parse().ok())
                .map(Self::Line)
                .ok_or_else(|| format!("unknown stage: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_stages() {
        assert_eq!(Stage::entry(InteractionKind::OneStep), Stage::Response);
        assert_eq!(Stage::entry(InteractionKind::TwoStep), Stage::Understanding);
        assert_eq!(Stage::entry(InteractionKind::Dialogue), Stage::Line(0));
    }

    #[test]
    fn terminal_stages() {
        assert!(Stage::Response.is_terminal(InteractionKind::TwoStep));
        assert!(!Stage::Understanding.is_terminal(InteractionKind::TwoStep));
        assert!(Stage::Reorder.is_terminal(InteractionKind::Reorder));
        assert!(!Stage::Response.is_terminal(InteractionKind::Reorder));
        assert!(!Stage::Done.is_terminal(InteractionKind::OneStep));
        assert!(!Stage::Done.is_last_line(3));
        assert!(Stage::Line(2).is_last_line(3));
        assert!(!Stage::Line(1).is_last_line(3));
    }

    #[test]
    fn stage_names_round_trip() {
        for stage in [Stage::Init, Stage::Understanding, Stage::Reorder, Stage::Line(4), Stage::Done] {
            assert_eq!(stage.to_string().parse::<Stage>(), Ok(stage));
        }
        assert!("line_x".parse::<Stage>().is_err());
    }

    #[test]
    fn understanding_transition() {
        assert_eq!(Stage::after_understanding(true), Stage::Response);
        assert_eq!(Stage::after_understanding(false), Stage::Understanding);
    }
}
