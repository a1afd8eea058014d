use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::domain::AnswerMap;
use super::rules::{self, RuleOutcome};
use super::schema::IntakeSchema;
use super::validation::{validate, ValidationErrors};

/// Where a respondent currently is in the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "index", rename_all = "snake_case")]
pub enum NavigatorPosition {
    Phase(usize),
    Submitted,
}

/// Result of asking the navigator to move forward.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// Required questions are missing; the position did not change.
    Blocked { errors: ValidationErrors },
    Moved {
        from: usize,
        to: usize,
        rules: RuleOutcome,
    },
    Submitted { from: usize, rules: RuleOutcome },
}

impl AdvanceOutcome {
    pub fn rules(&self) -> Option<&RuleOutcome> {
        match self {
            AdvanceOutcome::Blocked { .. } => None,
            AdvanceOutcome::Moved { rules, .. } | AdvanceOutcome::Submitted { rules, .. } => {
                Some(rules)
            }
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, AdvanceOutcome::Blocked { .. })
    }
}

/// State machine over the schema's phase indexes with a terminal submitted state.
#[derive(Debug, Clone)]
pub struct PhaseNavigator {
    schema: Arc<IntakeSchema>,
    position: NavigatorPosition,
}

impl PhaseNavigator {
    pub fn new(schema: Arc<IntakeSchema>) -> Self {
        Self {
            schema,
            position: NavigatorPosition::Phase(0),
        }
    }

    /// Resume at a bookmarked phase.
    pub fn starting_at(schema: Arc<IntakeSchema>, index: usize) -> Result<Self, NavigationError> {
        let phase_count = schema.phase_count();
        if index >= phase_count {
            return Err(NavigationError::OutOfRange { index, phase_count });
        }
        Ok(Self {
            schema,
            position: NavigatorPosition::Phase(index),
        })
    }

    pub fn position(&self) -> NavigatorPosition {
        self.position
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.position {
            NavigatorPosition::Phase(index) => Some(index),
            NavigatorPosition::Submitted => None,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.position == NavigatorPosition::Submitted
    }

    pub fn schema(&self) -> &Arc<IntakeSchema> {
        &self.schema
    }

    /// Validate the current phase, then apply its rules to pick the next phase.
    pub fn advance(&mut self, answers: &AnswerMap) -> Result<AdvanceOutcome, NavigationError> {
        let from = self.current_index().ok_or(NavigationError::Submitted)?;
        let phase = self
            .schema
            .phase(from)
            .ok_or(NavigationError::OutOfRange {
                index: from,
                phase_count: self.schema.phase_count(),
            })?;

        let errors = validate(phase, answers);
        if !errors.is_empty() {
            debug!(phase = %phase.id, missing = errors.len(), "advance blocked by validation");
            return Ok(AdvanceOutcome::Blocked { errors });
        }

        let outcome = rules::evaluate(&self.schema, phase, answers);
        let next = outcome
            .next_phase_override
            .as_ref()
            .and_then(|target| self.schema.phase_position(target.as_str()))
            .unwrap_or(from + 1);

        if next >= self.schema.phase_count() {
            self.position = NavigatorPosition::Submitted;
            return Ok(AdvanceOutcome::Submitted {
                from,
                rules: outcome,
            });
        }

        self.position = NavigatorPosition::Phase(next);
        Ok(AdvanceOutcome::Moved {
            from,
            to: next,
            rules: outcome,
        })
    }

    /// Step back one phase without validating or evaluating rules. No-op at phase 0.
    pub fn back(&mut self) -> NavigatorPosition {
        if let NavigatorPosition::Phase(index) = self.position {
            if index > 0 {
                self.position = NavigatorPosition::Phase(index - 1);
            }
        }
        self.position
    }

    /// Deep link to any phase, bypassing validation.
    pub fn jump_to(&mut self, index: usize) -> Result<NavigatorPosition, NavigationError> {
        if self.is_submitted() {
            return Err(NavigationError::Submitted);
        }
        let phase_count = self.schema.phase_count();
        if index >= phase_count {
            return Err(NavigationError::OutOfRange { index, phase_count });
        }
        self.position = NavigatorPosition::Phase(index);
        Ok(self.position)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("phase index {index} is outside the questionnaire (0..{phase_count})")]
    OutOfRange { index: usize, phase_count: usize },
    #[error("the intake has already been submitted")]
    Submitted,
}
