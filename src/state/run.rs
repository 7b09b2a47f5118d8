//! Progress of a configuration run.

/// Lifecycle of the whole sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    /// Not started yet.
    #[default]
    Pending,
    /// Executing the step at this index.
    Running(usize),
    /// Every step completed or was skipped.
    Succeeded,
    /// Every step completed, at least one through a best-effort path.
    CompletedWithWarnings,
    /// Halted by the step at this index.
    Failed(usize),
}

impl RunStatus {
    /// Whether the run has reached a terminal state.
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::CompletedWithWarnings | Self::Failed(_)
        )
    }
}

/// Display state of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepStatus {
    #[default]
    NotStarted,
    Running,
    Ok,
    Skipped,
    Warned,
    Err,
}

impl StepStatus {
    /// Glyph shown in the step list.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::NotStarted => "○",
            Self::Running => "◐",
            Self::Ok => "✓",
            Self::Skipped => "↷",
            Self::Warned => "!",
            Self::Err => "✗",
        }
    }

    /// Whether the step reached a terminal state.
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Ok | Self::Skipped | Self::Warned | Self::Err)
    }
}
