//! Client-side judging core: score sheets, local recovery, submission and
//! version-gated polling, independent of how pages are rendered.

pub mod error;
pub mod http;
pub mod local_store;
pub mod model;
pub mod page;
pub mod panel;
pub mod poller;
pub mod step_flow;
pub mod submission;
pub mod view;

pub use self::error::{
    ConfigurationError, JudgeError, JudgeResult, PollError, StoreError, SubmitError,
    TransportError, ValidationError,
};
pub use self::http::HttpClient;
pub use self::local_store::{JsonFileStore, KeyValueStore, LocalStateStore, MemoryStore};
pub use self::model::{Category, ChipPair, Outcome, ScoreMode, ScoreSheet, Side, Tally};
pub use self::page::{
    Competitor, JudgeIdentity, JudgePageConfig, MatchRef, OverlaySnapshot, RecordedCard,
    StepPageConfig,
};
pub use self::panel::{JudgeCommand, JudgePanel};
pub use self::poller::{LiveSyncPoller, PollerConfig, PollerHandle, StateSource, SyncUpdate};
pub use self::step_flow::{LegacyForm, Step, StepFlow};
pub use self::submission::{SubmissionController, SubmitOutcome, SubmitTransport};
pub use self::view::{JudgeView, PageHost};
