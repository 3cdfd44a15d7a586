//! Pipeline state machine.

use std::fmt;

use crate::error::TransferError;

/// Which way settings are moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Host state into an archive
    Export,
    /// Archive into host state
    Import,
}

impl Direction {
    /// Lowercase name for messages.
    pub fn name(&self) -> &'static str {
        match self {
            Direction::Export => "export",
            Direction::Import => "import",
        }
    }
}

/// Interactive stage at which a pipeline can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Export options dialog
    Options,
    /// File picker
    FileLocation,
    /// Import confirmation dialog
    Confirmation,
}

impl Stage {
    /// Lowercase name for messages.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Options => "options dialog",
            Stage::FileLocation => "file picker",
            Stage::Confirmation => "confirmation dialog",
        }
    }
}

/// Where a pipeline run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Waiting for the user to pick categories
    AwaitingOptions,
    /// Waiting for the archive path
    AwaitingPath,
    /// Reading the archive manifest
    Inspecting,
    /// Waiting for the user to confirm the import
    AwaitingConfirmation,
    /// Reading or writing the archive
    Transferring,
    /// Transfer completed
    Done,
    /// User cancelled at an interactive stage
    Cancelled,
    /// Transfer failed
    Failed,
}

impl PipelineState {
    /// Name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::AwaitingOptions => "AwaitingOptions",
            PipelineState::AwaitingPath => "AwaitingPath",
            PipelineState::Inspecting => "Inspecting",
            PipelineState::AwaitingConfirmation => "AwaitingConfirmation",
            PipelineState::Transferring => "Transferring",
            PipelineState::Done => "Done",
            PipelineState::Cancelled => "Cancelled",
            PipelineState::Failed => "Failed",
        }
    }

    /// Check if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Done | PipelineState::Cancelled | PipelineState::Failed
        )
    }

    /// Check if the user can cancel in this state.
    pub fn is_interactive(&self) -> bool {
        matches!(
            self,
            PipelineState::AwaitingOptions
                | PipelineState::AwaitingPath
                | PipelineState::AwaitingConfirmation
        )
    }

    /// Check whether moving to `next` is allowed.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (*self, next) {
            (AwaitingOptions, AwaitingPath)
            | (AwaitingPath, Transferring)
            | (AwaitingPath, Inspecting)
            | (Inspecting, AwaitingConfirmation)
            | (AwaitingConfirmation, Transferring)
            | (Transferring, Done) => true,
            (from, Cancelled) => from.is_interactive(),
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tracks one pipeline run through its states.
#[derive(Debug)]
pub(crate) struct Tracker {
    direction: Direction,
    state: PipelineState,
}

impl Tracker {
    pub(crate) fn new(direction: Direction) -> Self {
        let state = match direction {
            Direction::Export => PipelineState::AwaitingOptions,
            Direction::Import => PipelineState::AwaitingPath,
        };
        log::debug!("{} pipeline started in {}", direction.name(), state);
        Self { direction, state }
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> PipelineState {
        self.state
    }

    /// Move to the next state of the happy path.
    pub(crate) fn advance(&mut self, next: PipelineState) -> Result<(), TransferError> {
        if !self.state.can_transition_to(next) {
            return Err(TransferError::IllegalTransition {
                from: self.state.name(),
                to: next.name(),
            });
        }
        log::debug!("{} pipeline: {} -> {}", self.direction.name(), self.state, next);
        self.state = next;
        Ok(())
    }

    /// Enter a terminal state from wherever the run stopped.
    pub(crate) fn terminate(&mut self, next: PipelineState) {
        debug_assert!(next.is_terminal());
        if !self.state.can_transition_to(next) {
            log::warn!(
                "{} pipeline: unexpected {} -> {}",
                self.direction.name(),
                self.state,
                next
            );
        }
        log::debug!("{} pipeline: {} -> {}", self.direction.name(), self.state, next);
        self.state = next;
    }
}
