use std::sync::Arc;

use serde::Serialize;

use super::domain::{AnswerMap, AnswerValue, PhaseId, RespondentId};
use super::navigator::{AdvanceOutcome, NavigationError, NavigatorPosition, PhaseNavigator};
use super::progress::{self, ProgressSummary};
use super::render::{render_phase, PhaseView};
use super::schema::IntakeSchema;
use super::store::{AnswerError, AnswerStore};
use super::validation::ValidationErrors;

/// An escalation raised while leaving a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EscalationFlag {
    pub phase_id: PhaseId,
    pub message: String,
}

/// One respondent's wizard state: answers, position, last errors and raised flags.
#[derive(Debug, Clone)]
pub struct IntakeSession {
    respondent: RespondentId,
    store: AnswerStore,
    navigator: PhaseNavigator,
    errors: ValidationErrors,
    escalations: Vec<EscalationFlag>,
}

impl IntakeSession {
    pub fn new(respondent: RespondentId, schema: Arc<IntakeSchema>, answers: AnswerMap) -> Self {
        Self {
            respondent,
            store: AnswerStore::with_answers(schema.clone(), answers),
            navigator: PhaseNavigator::new(schema),
            errors: ValidationErrors::default(),
            escalations: Vec::new(),
        }
    }

    pub fn resume(
        respondent: RespondentId,
        schema: Arc<IntakeSchema>,
        answers: AnswerMap,
        start_index: usize,
    ) -> Result<Self, NavigationError> {
        let navigator = PhaseNavigator::starting_at(schema.clone(), start_index)?;
        Ok(Self {
            respondent,
            store: AnswerStore::with_answers(schema, answers),
            navigator,
            errors: ValidationErrors::default(),
            escalations: Vec::new(),
        })
    }

    pub fn respondent(&self) -> &RespondentId {
        &self.respondent
    }

    pub fn answers(&self) -> &AnswerMap {
        self.store.answers()
    }

    pub fn position(&self) -> NavigatorPosition {
        self.navigator.position()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn escalations(&self) -> &[EscalationFlag] {
        &self.escalations
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.store.is_dirty()
    }

    pub(crate) fn mark_saved(&mut self) {
        self.store.mark_clean();
    }

    /// Edit a field; a pending error on that field is dropped.
    pub fn set_answer(&mut self, question_id: &str, value: AnswerValue) -> Result<(), AnswerError> {
        self.store.set(question_id, value)?;
        self.errors.clear_field(question_id);
        Ok(())
    }

    pub fn clear_answer(&mut self, question_id: &str) -> Result<(), AnswerError> {
        self.store.clear(question_id)?;
        self.errors.clear_field(question_id);
        Ok(())
    }

    pub fn advance(&mut self) -> Result<AdvanceOutcome, NavigationError> {
        let outcome = self.navigator.advance(self.store.answers())?;

        match &outcome {
            AdvanceOutcome::Blocked { errors } => {
                self.errors = errors.clone();
            }
            AdvanceOutcome::Moved { from, rules, .. } | AdvanceOutcome::Submitted { from, rules } => {
                self.errors = ValidationErrors::default();
                let phase_id = self.phase_id(*from);
                self.escalations
                    .extend(rules.escalations.iter().map(|message| EscalationFlag {
                        phase_id: phase_id.clone(),
                        message: message.clone(),
                    }));
            }
        }

        Ok(outcome)
    }

    pub fn back(&mut self) -> NavigatorPosition {
        self.errors = ValidationErrors::default();
        self.navigator.back()
    }

    pub fn jump_to(&mut self, index: usize) -> Result<NavigatorPosition, NavigationError> {
        let position = self.navigator.jump_to(index)?;
        self.errors = ValidationErrors::default();
        Ok(position)
    }

    /// Render model of the current phase, or `None` once submitted.
    pub fn current_view(&self) -> Option<PhaseView> {
        let index = self.navigator.current_index()?;
        let schema = self.navigator.schema();
        let phase = schema.phase(index)?;
        Some(render_phase(
            phase,
            index,
            schema.phase_count(),
            self.store.answers(),
            &self.errors,
        ))
    }

    pub fn progress(&self) -> ProgressSummary {
        progress::summarize(self.navigator.schema(), self.store.answers())
    }

    fn phase_id(&self, index: usize) -> PhaseId {
        self.navigator
            .schema()
            .phase(index)
            .map(|phase| phase.id.clone())
            .unwrap_or_else(|| PhaseId::new(format!("#{index}")))
    }
}
