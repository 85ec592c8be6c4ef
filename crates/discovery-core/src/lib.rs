//! Aro discovery questionnaire engine.
//!
//! A fixed catalog of questions grouped into categories, the live form the
//! user fills in, progress derived from that form, and the summary plus
//! deep link produced on submission.
//!
//! Zero I/O. Persistence lives in `discovery-store`; presentation is behind
//! the [`Presenter`] trait.

pub mod answer;
pub mod catalog;
pub mod form;
pub mod notify;
pub mod progress;
pub mod schedule;
pub mod summary;
pub mod time;
pub mod wire;

pub use answer::{Answer, AnswerValue, Snapshot};
pub use catalog::{Catalog, CatalogError, Category, Question, QuestionId, QuestionKind};
pub use form::{Edit, FormError, FormState};
pub use notify::{ConfirmRequest, Confirmation, Level, Presenter, RecordingPresenter};
pub use progress::{
    CategoryProgress, GateRejection, ProgressResult, ProgressTracker, SubmissionGate, percentage,
};
pub use schedule::{CoalescePolicy, Coalescer};
pub use summary::{ARO_KEY_QUESTIONS, KeyQuestion, OutboundLink, SummaryGenerator, UNSPECIFIED};
pub use time::{Timestamp, TimestampError, time_ago};
pub use wire::{
    CURRENT_VERSION, WireError, decode_answers, encode_answers, export_json, import_json,
};
