use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{AnswerValue, InputKind, Phase, PhaseId, Question, QuestionId, RuleAction};

const STANDARD_SCHEMA: &str = include_str!("../../../data/business_sale_intake.json");

/// Immutable questionnaire definition: ordered phases, their questions, conditionals and rules.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeSchema {
    phases: Vec<Phase>,
    #[serde(skip)]
    phase_index: HashMap<PhaseId, usize>,
    #[serde(skip)]
    question_index: HashMap<QuestionId, (usize, usize)>,
}

#[derive(Deserialize)]
struct SchemaDocument {
    phases: Vec<Phase>,
}

impl IntakeSchema {
    /// The business-sale questionnaire bundled with the crate.
    pub fn standard() -> Result<Self, SchemaError> {
        Self::from_json(STANDARD_SCHEMA)
    }

    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        let document: SchemaDocument = serde_json::from_str(raw)?;
        Self::new(document.phases)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SchemaError> {
        let document: SchemaDocument = serde_json::from_reader(reader)?;
        Self::new(document.phases)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let file = File::open(path.as_ref()).map_err(SchemaError::Io)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Build a schema, enforcing id uniqueness and backward-only dependencies.
    pub fn new(phases: Vec<Phase>) -> Result<Self, SchemaError> {
        if phases.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut phase_index = HashMap::with_capacity(phases.len());
        let mut question_index: HashMap<QuestionId, (usize, usize)> = HashMap::new();

        for (p_idx, phase) in phases.iter().enumerate() {
            if phase_index.insert(phase.id.clone(), p_idx).is_some() {
                return Err(SchemaError::DuplicatePhase(phase.id.0.clone()));
            }

            for (q_idx, question) in phase.questions.iter().enumerate() {
                if let Some(conditional) = &question.conditional {
                    if conditional.depends_on == question.id {
                        return Err(SchemaError::SelfDependency(question.id.0.clone()));
                    }
                    // Only questions already indexed are "earlier" in declaration order.
                    let Some(&(dp, dq)) = question_index.get(conditional.depends_on.as_str())
                    else {
                        return Err(SchemaError::ForwardDependency {
                            question: question.id.0.clone(),
                            depends_on: conditional.depends_on.0.clone(),
                        });
                    };
                    let dependency: &Question = &phases[dp].questions[dq];
                    if !conditional_can_match(dependency, &conditional.value) {
                        warn!(
                            question = %question.id,
                            depends_on = %conditional.depends_on,
                            dependency_kind = dependency.kind.label(),
                            "conditional value never matches the dependency's answers"
                        );
                    }
                }

                if question_index
                    .insert(question.id.clone(), (p_idx, q_idx))
                    .is_some()
                {
                    return Err(SchemaError::DuplicateQuestion(question.id.0.clone()));
                }
            }
        }

        let schema = Self {
            phases,
            phase_index,
            question_index,
        };
        schema.warn_unresolved_jumps();
        Ok(schema)
    }

    fn warn_unresolved_jumps(&self) {
        for phase in &self.phases {
            for question in &phase.questions {
                for rule in &question.logic {
                    if rule.action != RuleAction::JumpToPhase {
                        continue;
                    }
                    match &rule.target_phase {
                        Some(target) if self.phase_position(target.as_str()).is_none() => warn!(
                            question = %question.id,
                            target = %target,
                            "jump rule targets an unknown phase and will be ignored"
                        ),
                        None => warn!(
                            question = %question.id,
                            "jump rule without a target phase will be ignored"
                        ),
                        _ => {}
                    }
                }
            }
        }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    pub fn phase(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    pub fn phase_position(&self, phase_id: &str) -> Option<usize> {
        self.phase_index.get(phase_id).copied()
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.question_index
            .get(question_id)
            .map(|&(p, q)| &self.phases[p].questions[q])
    }

    pub fn question_count(&self) -> usize {
        self.question_index.len()
    }
}

/// Multi-select answers are lists, which a scalar conditional value never equals; any
/// other dependency must store values of the conditional's kind.
pub(crate) fn conditional_can_match(dependency: &Question, value: &AnswerValue) -> bool {
    dependency.kind != InputKind::MultiSelect && dependency.kind.accepts(value)
}

/// Errors raised while loading a questionnaire definition.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("unable to read intake schema: {0}")]
    Io(#[source] std::io::Error),
    #[error("malformed intake schema: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("intake schema declares no phases")]
    Empty,
    #[error("phase id {0} is declared more than once")]
    DuplicatePhase(String),
    #[error("question id {0} is declared more than once")]
    DuplicateQuestion(String),
    #[error("question {0} cannot depend on itself")]
    SelfDependency(String),
    #[error("question {question} depends on {depends_on}, which is not declared earlier")]
    ForwardDependency { question: String, depends_on: String },
}
