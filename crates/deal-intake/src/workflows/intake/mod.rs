//! Phased business-sale intake questionnaire.
//!
//! A static [`IntakeSchema`] describes phases, questions, conditionals and logic rules.
//! Sessions walk a respondent through it: answers are validated per phase, rules raise
//! escalations or redirect navigation, and stored answers feed progress and admin views.

pub mod admin;
pub mod domain;
pub mod navigator;
pub mod progress;
pub mod render;
pub mod router;
pub mod rules;
pub mod schema;
pub mod service;
pub mod session;
pub mod store;
pub mod validation;
pub mod visibility;

#[cfg(test)]
mod tests;

pub use admin::{
    build_admin_view, listing_entry, AdminAnswer, AdminAnswerEntry, AdminIntakeView,
    AdminListingEntry, AdminPhaseSection,
};
pub use domain::{
    AnswerMap, AnswerValue, Conditional, FileReference, InputKind, LogicRule, Phase, PhaseId,
    Question, QuestionId, QuestionOption, RespondentId, RuleAction,
};
pub use navigator::{AdvanceOutcome, NavigationError, NavigatorPosition, PhaseNavigator};
pub use progress::{progress, summarize, PhaseProgressEntry, ProgressSummary};
pub use render::{render_phase, FieldControl, FieldView, OptionView, PhaseView};
pub use router::intake_router;
pub use rules::{evaluate, Advisory, AdvisoryKind, RuleOutcome, DEFAULT_ESCALATION_MESSAGE};
pub use schema::{IntakeSchema, SchemaError};
pub use service::{AdvanceView, IntakeService, IntakeServiceError, SessionView};
pub use session::{EscalationFlag, IntakeSession};
pub use store::{
    AnswerError, AnswerStore, DocumentStore, PersistenceError, ProfileStore, StoredDocument,
    UploadError, UploadRequest,
};
pub use validation::{validate, ValidationErrors, REQUIRED_FIELD_MESSAGE};
pub use visibility::{is_visible, visible_questions};
