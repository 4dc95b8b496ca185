//! Import session: the caller-owned state of one paste-preview-import cycle.
//!
//! ```text
//! Idle ──parse──▶ PreviewReady ──begin_import──▶ Importing ──complete──▶ Imported
//!   ▲                 │  ▲  ▲                        │  │
//!   │                 │  │  └──── abort_import ──────┘  │
//!   │                 │  └───────── retry ──────────────┤
//!   └──── cancel ─────┴─────────────────────────── Failed (batch kept)
//! ```
//!
//! Every transition is a method that checks the current state; an invalid
//! transition returns [`SessionError`] and leaves the state unchanged.
//!
//! Dropping the future returned by [`ImportSession::submit_with`] before it
//! resolves puts the batch back into `PreviewReady`.

use thiserror::Error;

use crate::error::{ParseError, SubmitError};
use crate::preview::PreviewBatch;
use crate::submit::ImportSubmitter;
use crate::transform::pipeline::{ingest, IngestOptions, IngestResult};
use crate::validation::{validate_batch, ValidationReport};

/// Where a session stands.
#[derive(Debug)]
pub enum ImportState {
    Idle,
    /// Transient; only observable while [`ImportSession::parse`] runs.
    Parsing,
    PreviewReady {
        batch: PreviewBatch,
        validation: ValidationReport,
    },
    Importing {
        batch: PreviewBatch,
    },
    Imported {
        count: usize,
    },
    Failed {
        error: SessionFailure,
        /// The batch that failed to import, kept for a retry.
        batch: Option<PreviewBatch>,
    },
}

impl ImportState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Parsing => "parsing",
            Self::PreviewReady { .. } => "preview-ready",
            Self::Importing { .. } => "importing",
            Self::Imported { .. } => "imported",
            Self::Failed { .. } => "failed",
        }
    }
}

/// What sent the session to `Failed`.
#[derive(Debug, Error)]
pub enum SessionFailure {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// A transition that is not allowed from the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("Refusing to import an empty batch")]
    EmptyBatch,

    #[error("Refusing to import: {0}")]
    InvalidBatch(String),
}

#[derive(Debug)]
pub struct ImportSession {
    state: ImportState,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSession {
    pub fn new() -> Self {
        Self {
            state: ImportState::Idle,
        }
    }

    pub fn state(&self) -> &ImportState {
        &self.state
    }

    /// The batch currently under review, importing, or kept after a failure.
    pub fn batch(&self) -> Option<&PreviewBatch> {
        match &self.state {
            ImportState::PreviewReady { batch, .. } | ImportState::Importing { batch } => Some(batch),
            ImportState::Failed { batch, .. } => batch.as_ref(),
            _ => None,
        }
    }

    /// Parse text into a fresh preview, replacing any previous one.
    ///
    /// Allowed from `Idle`, `PreviewReady`, `Imported` and `Failed`. A parse
    /// error moves the session to `Failed` without a batch.
    pub fn parse(&mut self, text: &str, options: &IngestOptions) -> Result<&ImportState, SessionError> {
        match self.state {
            ImportState::Parsing | ImportState::Importing { .. } => {
                return Err(self.invalid("parse"));
            }
            _ => {}
        }

        self.state = ImportState::Parsing;
        self.state = match ingest(text, options) {
            Ok(IngestResult { batch, validation, .. }) => ImportState::PreviewReady { batch, validation },
            Err(e) => ImportState::Failed {
                error: e.into(),
                batch: None,
            },
        };
        Ok(&self.state)
    }

    /// Hand out the batch for submission and move to `Importing`.
    ///
    /// Also retries from `Failed` when a batch was kept.
    pub fn begin_import(&mut self) -> Result<PreviewBatch, SessionError> {
        let checked = match &self.state {
            ImportState::PreviewReady { batch, .. } => batch.check(),
            ImportState::Failed { batch: Some(batch), .. } => batch.check(),
            _ => return Err(self.invalid("import")),
        };
        match checked {
            Ok(()) => {}
            Err(SubmitError::EmptyBatch) => return Err(SessionError::EmptyBatch),
            Err(e) => return Err(SessionError::InvalidBatch(e.to_string())),
        }

        let batch = match std::mem::replace(&mut self.state, ImportState::Idle) {
            ImportState::PreviewReady { batch, .. } | ImportState::Failed { batch: Some(batch), .. } => batch,
            // checked above
            other => {
                self.state = other;
                return Err(self.invalid("import"));
            }
        };

        self.state = ImportState::Importing { batch: batch.clone() };
        Ok(batch)
    }

    /// Record the submission outcome. A failure keeps the batch.
    pub fn complete(&mut self, result: Result<usize, SubmitError>) -> Result<&ImportState, SessionError> {
        if !matches!(self.state, ImportState::Importing { .. }) {
            return Err(self.invalid("complete an import"));
        }

        let batch = match std::mem::replace(&mut self.state, ImportState::Idle) {
            ImportState::Importing { batch } => batch,
            _ => return Err(self.invalid("complete an import")),
        };

        self.state = match result {
            Ok(count) => ImportState::Imported { count },
            Err(e) => ImportState::Failed {
                error: e.into(),
                batch: Some(batch),
            },
        };
        Ok(&self.state)
    }

    /// Give up on a submission that will not be completed and return its
    /// batch to `PreviewReady`, re-validated, so it can be imported again.
    pub fn abort_import(&mut self) -> Result<&ImportState, SessionError> {
        if !matches!(self.state, ImportState::Importing { .. }) {
            return Err(self.invalid("abort an import"));
        }

        let batch = match std::mem::replace(&mut self.state, ImportState::Idle) {
            ImportState::Importing { batch } => batch,
            _ => return Err(self.invalid("abort an import")),
        };

        let validation = validate_batch(&batch.records);
        self.state = ImportState::PreviewReady { batch, validation };
        Ok(&self.state)
    }

    /// Drop whatever is in progress.
    pub fn cancel(&mut self) {
        self.state = ImportState::Idle;
    }

    /// `begin_import`, submit, `complete`.
    ///
    /// Cancel-safe: if the returned future is dropped mid-submission the
    /// session goes back to `PreviewReady` with the same batch.
    pub async fn submit_with<S: ImportSubmitter>(&mut self, submitter: &S) -> Result<&ImportState, SessionError> {
        let batch = self.begin_import()?;
        {
            let mut guard = ImportGuard { session: &mut *self };
            let result = submitter.submit(&batch).await;
            guard.session.complete(result)?;
        }
        Ok(&self.state)
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}

/// Aborts the import if still `Importing` when dropped.
struct ImportGuard<'a> {
    session: &'a mut ImportSession,
}

impl Drop for ImportGuard<'_> {
    fn drop(&mut self) {
        if matches!(self.session.state, ImportState::Importing { .. }) {
            let _ = self.session.abort_import();
        }
    }
}
