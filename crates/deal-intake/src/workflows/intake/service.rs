use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use mime::Mime;
use serde::Serialize;
use tracing::{info, warn};

use super::admin::{build_admin_view, listing_entry, AdminIntakeView, AdminListingEntry};
use super::domain::{AnswerMap, AnswerValue, FileReference, InputKind, QuestionId, RespondentId};
use super::navigator::{AdvanceOutcome, NavigationError, NavigatorPosition};
use super::progress::{self, ProgressSummary};
use super::render::PhaseView;
use super::schema::IntakeSchema;
use super::session::{EscalationFlag, IntakeSession};
use super::store::{
    AnswerError, DocumentStore, PersistenceError, ProfileStore, UploadError, UploadRequest,
};

/// Snapshot returned to callers after every wizard interaction.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub respondent: RespondentId,
    pub position: NavigatorPosition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<PhaseView>,
    pub progress: ProgressSummary,
    pub escalations: Vec<EscalationFlag>,
}

impl SessionView {
    fn from_session(session: &IntakeSession) -> Self {
        Self {
            respondent: session.respondent().clone(),
            position: session.position(),
            phase: session.current_view(),
            progress: session.progress(),
            escalations: session.escalations().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvanceView {
    pub outcome: AdvanceOutcome,
    pub session: SessionView,
}

/// Service composing the schema, profile store, document store and open sessions.
pub struct IntakeService<P, D> {
    schema: Arc<IntakeSchema>,
    profiles: Arc<P>,
    documents: Arc<D>,
    sessions: Mutex<HashMap<RespondentId, IntakeSession>>,
}

impl<P, D> IntakeService<P, D>
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    pub fn new(schema: Arc<IntakeSchema>, profiles: Arc<P>, documents: Arc<D>) -> Self {
        Self {
            schema,
            profiles,
            documents,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn schema(&self) -> &Arc<IntakeSchema> {
        &self.schema
    }

    /// Start (or restart) a session from the respondent's stored answers. A failed load is
    /// returned to the caller; a session built on partial answers would overwrite the
    /// stored map on its first flush.
    pub fn open(
        &self,
        respondent: &RespondentId,
        start_phase: Option<usize>,
    ) -> Result<SessionView, IntakeServiceError> {
        let answers = self.profiles.load_answers(respondent).map_err(|err| {
            warn!(%respondent, error = %err, "failed to load stored answers");
            err
        })?;
        let session = match start_phase {
            Some(index) => {
                IntakeSession::resume(respondent.clone(), self.schema.clone(), answers, index)?
            }
            None => IntakeSession::new(respondent.clone(), self.schema.clone(), answers),
        };

        let view = SessionView::from_session(&session);
        self.sessions()?.insert(respondent.clone(), session);
        info!(%respondent, position = ?view.position, "intake session opened");
        Ok(view)
    }

    pub fn view(&self, respondent: &RespondentId) -> Result<SessionView, IntakeServiceError> {
        self.with_session(respondent, |session| Ok(SessionView::from_session(session)))
    }

    pub fn record_answer(
        &self,
        respondent: &RespondentId,
        question_id: &str,
        value: AnswerValue,
    ) -> Result<SessionView, IntakeServiceError> {
        self.with_session(respondent, |session| {
            session.set_answer(question_id, value)?;
            Ok(SessionView::from_session(session))
        })
    }

    pub fn clear_answer(
        &self,
        respondent: &RespondentId,
        question_id: &str,
    ) -> Result<SessionView, IntakeServiceError> {
        self.with_session(respondent, |session| {
            session.clear_answer(question_id)?;
            Ok(SessionView::from_session(session))
        })
    }

    /// Store the file, then record its reference as the answer. On failure the
    /// field keeps whatever value it had.
    pub fn upload(
        &self,
        respondent: &RespondentId,
        question_id: &str,
        filename: &str,
        content_type: Mime,
        bytes: Vec<u8>,
    ) -> Result<FileReference, IntakeServiceError> {
        let question = self
            .schema
            .question(question_id)
            .ok_or_else(|| AnswerError::UnknownQuestion(question_id.to_owned()))?;
        if question.kind != InputKind::File {
            return Err(UploadError::NotAFileQuestion(question_id.to_owned()).into());
        }
        if bytes.is_empty() {
            return Err(UploadError::EmptyFile.into());
        }
        if !self.sessions()?.contains_key(respondent) {
            return Err(IntakeServiceError::SessionNotFound(respondent.clone()));
        }

        let reference = self
            .documents
            .upload(UploadRequest {
                respondent: respondent.clone(),
                question_id: QuestionId::new(question_id),
                filename: filename.to_owned(),
                content_type,
                bytes,
            })
            .map_err(|err| {
                warn!(%respondent, question = question_id, error = %err, "document upload failed");
                err
            })?;

        self.with_session(respondent, |session| {
            session.set_answer(question_id, AnswerValue::File(reference.clone()))?;
            Ok(())
        })?;
        Ok(reference)
    }

    /// Validate and leave the current phase. When the phase changes, unsaved answers are
    /// flushed to the profile store on a best-effort basis, outside the sessions lock.
    pub fn advance(&self, respondent: &RespondentId) -> Result<AdvanceView, IntakeServiceError> {
        let (outcome, unsaved) = self.with_session(respondent, |session| {
            let outcome = session.advance()?;
            let unsaved = (!outcome.is_blocked() && session.has_unsaved_changes())
                .then(|| session.answers().clone());
            Ok((outcome, unsaved))
        })?;

        if let Some(answers) = unsaved {
            self.flush(respondent, &answers);
        }
        if let AdvanceOutcome::Submitted { .. } = outcome {
            info!(%respondent, "intake submitted");
        }

        Ok(AdvanceView {
            outcome,
            session: self.view(respondent)?,
        })
    }

    pub fn back(&self, respondent: &RespondentId) -> Result<SessionView, IntakeServiceError> {
        self.with_session(respondent, |session| {
            session.back();
            Ok(SessionView::from_session(session))
        })
    }

    pub fn jump_to(
        &self,
        respondent: &RespondentId,
        index: usize,
    ) -> Result<SessionView, IntakeServiceError> {
        self.with_session(respondent, |session| {
            session.jump_to(index)?;
            Ok(SessionView::from_session(session))
        })
    }

    /// Progress from the open session, or from stored answers when none is open.
    pub fn progress(&self, respondent: &RespondentId) -> Result<ProgressSummary, IntakeServiceError> {
        if let Some(session) = self.sessions()?.get(respondent) {
            return Ok(session.progress());
        }
        let answers = self.profiles.load_answers(respondent)?;
        Ok(progress::summarize(&self.schema, &answers))
    }

    /// Read-only listing of stored answers for administrators.
    pub fn admin_view(&self, respondent: &RespondentId) -> Result<AdminIntakeView, IntakeServiceError> {
        let answers = self.profiles.load_answers(respondent)?;
        Ok(build_admin_view(&self.schema, respondent, &answers))
    }

    /// Every respondent with stored answers and their completion, ordered by id.
    pub fn admin_listing(&self) -> Result<Vec<AdminListingEntry>, IntakeServiceError> {
        let mut respondents = self.profiles.respondents()?;
        respondents.sort();
        respondents
            .into_iter()
            .map(|respondent| {
                let answers = self.profiles.load_answers(&respondent)?;
                Ok(listing_entry(&self.schema, respondent, &answers))
            })
            .collect()
    }

    /// The session is only marked saved if nothing changed while the store was writing.
    fn flush(&self, respondent: &RespondentId, answers: &AnswerMap) {
        if let Err(err) = self.profiles.save_answers(respondent, answers) {
            warn!(
                %respondent,
                error = %err,
                "failed to persist intake answers; continuing with in-memory state"
            );
            return;
        }

        if let Ok(mut sessions) = self.sessions() {
            if let Some(session) = sessions.get_mut(respondent) {
                if session.answers() == answers {
                    session.mark_saved();
                }
            }
        }
    }

    fn sessions(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<RespondentId, IntakeSession>>, IntakeServiceError> {
        self.sessions
            .lock()
            .map_err(|_| IntakeServiceError::SessionsUnavailable)
    }

    fn with_session<T>(
        &self,
        respondent: &RespondentId,
        action: impl FnOnce(&mut IntakeSession) -> Result<T, IntakeServiceError>,
    ) -> Result<T, IntakeServiceError> {
        let mut sessions = self.sessions()?;
        let session = sessions
            .get_mut(respondent)
            .ok_or_else(|| IntakeServiceError::SessionNotFound(respondent.clone()))?;
        action(session)
    }
}

/// Error raised by the intake service.
#[derive(Debug, thiserror::Error)]
pub enum IntakeServiceError {
    #[error("no open intake session for respondent {0}")]
    SessionNotFound(RespondentId),
    #[error("intake sessions are unavailable")]
    SessionsUnavailable,
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
