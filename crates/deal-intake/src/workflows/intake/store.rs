use std::sync::Arc;

use chrono::{DateTime, Utc};
use mime::Mime;
use serde::{Deserialize, Serialize};

use super::domain::{AnswerMap, AnswerValue, FileReference, InputKind, QuestionId, RespondentId};
use super::schema::IntakeSchema;

/// In-memory working copy of one respondent's answers.
#[derive(Debug, Clone)]
pub struct AnswerStore {
    schema: Arc<IntakeSchema>,
    answers: AnswerMap,
    dirty: bool,
}

impl AnswerStore {
    pub fn new(schema: Arc<IntakeSchema>) -> Self {
        Self::with_answers(schema, AnswerMap::new())
    }

    pub fn with_answers(schema: Arc<IntakeSchema>, answers: AnswerMap) -> Self {
        Self {
            schema,
            answers,
            dirty: false,
        }
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    /// Record an answer after checking the question exists and accepts the value's kind.
    /// An empty text clears the answer.
    pub fn set(&mut self, question_id: &str, value: AnswerValue) -> Result<(), AnswerError> {
        let kind = self
            .schema
            .question(question_id)
            .map(|question| question.kind)
            .ok_or_else(|| AnswerError::UnknownQuestion(question_id.to_owned()))?;

        if value.is_empty() {
            self.clear(question_id)?;
            return Ok(());
        }

        if !kind.accepts(&value) {
            return Err(AnswerError::KindMismatch {
                question: question_id.to_owned(),
                expected: kind,
            });
        }

        if self.answers.get(question_id) != Some(&value) {
            self.answers.insert(QuestionId::new(question_id), value);
            self.dirty = true;
        }
        Ok(())
    }

    pub fn clear(&mut self, question_id: &str) -> Result<Option<AnswerValue>, AnswerError> {
        if self.schema.question(question_id).is_none() {
            return Err(AnswerError::UnknownQuestion(question_id.to_owned()));
        }
        let removed = self.answers.remove(question_id);
        if removed.is_some() {
            self.dirty = true;
        }
        Ok(removed)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

/// Rejected answer edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerError {
    #[error("question {0} is not part of the intake")]
    UnknownQuestion(String),
    #[error("question {question} expects a {} answer", .expected.label())]
    KindMismatch {
        question: String,
        expected: InputKind,
    },
}

/// External persistence for answer maps keyed by respondent.
pub trait ProfileStore: Send + Sync {
    fn load_answers(&self, respondent: &RespondentId) -> Result<AnswerMap, PersistenceError>;
    fn save_answers(
        &self,
        respondent: &RespondentId,
        answers: &AnswerMap,
    ) -> Result<(), PersistenceError>;
    /// Respondents that have stored answers.
    fn respondents(&self) -> Result<Vec<RespondentId>, PersistenceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("profile store unavailable: {0}")]
    Unavailable(String),
    #[error("stored intake data is unreadable: {0}")]
    Corrupt(String),
}

/// Upload request handed to the document store.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub respondent: RespondentId,
    pub question_id: QuestionId,
    pub filename: String,
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

/// Metadata the document store keeps about an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub reference: FileReference,
    pub respondent: RespondentId,
    pub content_type: String,
    pub size: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// External file storage; a successful upload yields the reference stored as the answer.
pub trait DocumentStore: Send + Sync {
    fn upload(&self, request: UploadRequest) -> Result<FileReference, UploadError>;
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("uploaded file is empty")]
    EmptyFile,
    #[error("question {0} does not accept file uploads")]
    NotAFileQuestion(String),
    #[error("document store unavailable: {0}")]
    Transport(String),
}
