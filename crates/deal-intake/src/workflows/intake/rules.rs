use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{AnswerMap, Phase, PhaseId, QuestionId, RuleAction};
use super::schema::IntakeSchema;

pub const DEFAULT_ESCALATION_MESSAGE: &str = "Escalation Required";

/// Informational rule outcome that never alters navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advisory {
    pub question_id: QuestionId,
    pub kind: AdvisoryKind,
    pub targets: Vec<QuestionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    RevealQuestions,
    RequireUpload,
}

/// Everything the rules of one phase produced for the current answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    pub escalations: Vec<String>,
    pub next_phase_override: Option<PhaseId>,
    pub advisories: Vec<Advisory>,
}

/// Scan the phase's answered questions in declaration order, then each question's rules in
/// declaration order. Escalations accumulate; the last matching jump wins.
pub fn evaluate(schema: &IntakeSchema, phase: &Phase, answers: &AnswerMap) -> RuleOutcome {
    let mut outcome = RuleOutcome::default();

    for question in &phase.questions {
        if question.logic.is_empty() {
            continue;
        }
        let Some(answer) = answers.answered(question.id.as_str()) else {
            continue;
        };

        for rule in question.logic.iter().filter(|rule| rule.matches(answer)) {
            match rule.action {
                RuleAction::FlagEscalation => {
                    let message = rule
                        .message
                        .clone()
                        .unwrap_or_else(|| DEFAULT_ESCALATION_MESSAGE.to_string());
                    outcome.escalations.push(message);
                }
                RuleAction::JumpToPhase => match &rule.target_phase {
                    Some(target) if schema.phase_position(target.as_str()).is_some() => {
                        debug!(question = %question.id, target = %target, "phase jump matched");
                        outcome.next_phase_override = Some(target.clone());
                    }
                    Some(target) => {
                        warn!(question = %question.id, target = %target, "ignoring jump to unknown phase");
                    }
                    None => {
                        warn!(question = %question.id, "ignoring jump rule without a target phase");
                    }
                },
                RuleAction::RevealQuestions => outcome.advisories.push(Advisory {
                    question_id: question.id.clone(),
                    kind: AdvisoryKind::RevealQuestions,
                    targets: rule.target_questions.clone(),
                    message: rule.message.clone(),
                }),
                RuleAction::RequireUpload => outcome.advisories.push(Advisory {
                    question_id: question.id.clone(),
                    kind: AdvisoryKind::RequireUpload,
                    targets: rule.target_questions.clone(),
                    message: rule.message.clone(),
                }),
            }
        }
    }

    outcome
}
