//! Failure taxonomy of the judging client.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for client-side operations.
pub type JudgeResult<T> = Result<T, JudgeError>;

/// Any failure a judging surface can surface or log.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Poll(#[from] PollError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl JudgeError {
    /// Message suitable for the inline status area.
    pub fn user_message(&self) -> String {
        match self {
            JudgeError::Validation(err) => err.user_message().to_string(),
            JudgeError::Submit(err) => err.user_message(),
            JudgeError::Poll(_) => "Error loading match data".into(),
            JudgeError::Configuration(err) => err.user_message().to_string(),
        }
    }
}

/// Locally detected problems that block an action until the judge fixes them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing judge name")]
    MissingJudgeName,
    #[error("step {step} ({label}) has no score selected")]
    IncompleteStep { step: usize, label: String },
    #[error("match data is incomplete")]
    IncompleteMatchData,
    #[error("not every category has been scored")]
    IncompleteScores,
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::MissingJudgeName => "Please enter your name before submitting.",
            ValidationError::IncompleteStep { .. } => {
                "Please select a score for this category before proceeding."
            }
            ValidationError::IncompleteMatchData => {
                "Match data is incomplete. Please ensure a match is loaded and scores are complete."
            }
            ValidationError::IncompleteScores => "Please score every category before submitting.",
        }
    }
}

/// The single network attempt of a confirmed submission failed.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Transport failure, non-ok status, embedded `error` field or malformed body.
    #[error("submission failed: {message}")]
    Submission { message: String },
    /// No response within the submission bound.
    #[error("submission timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

impl SubmitError {
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Submission { message } => message.clone(),
            SubmitError::Timeout { .. } => "Submission timed out. Please try again.".into(),
        }
    }
}

/// Transient polling failure; logged and retried on the next interval.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("poll of `{url}` failed with status {status}")]
    Status { url: String, status: u16 },
    #[error("poll of `{url}` could not be sent")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("poll of `{url}` returned an unreadable body")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The page was served without what the submit control needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("no active match")]
    NoActiveMatch,
    #[error("submission endpoint unavailable")]
    MissingSubmitEndpoint,
}

impl ConfigurationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigurationError::NoActiveMatch => "No active match.",
            ConfigurationError::MissingSubmitEndpoint => "Submission endpoint unavailable.",
        }
    }
}

/// A local store backend could not serve a request.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("local store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to access local store at `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("local store at `{path}` is corrupt")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of the HTTP layer before any status code is known.
#[derive(Debug, Error)]
#[error("request to `{url}` failed")]
pub struct TransportError {
    pub url: String,
    #[source]
    pub source: reqwest::Error,
}
