use serde::Serialize;

use super::domain::{AnswerMap, Phase, PhaseId};
use super::schema::IntakeSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseProgressEntry {
    pub phase_id: PhaseId,
    pub index: usize,
    pub title: String,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub percent: u8,
    pub completed_phases: usize,
    pub total_phases: usize,
    pub phases: Vec<PhaseProgressEntry>,
}

/// A phase counts as done as soon as any one of its questions holds an answer.
pub fn phase_has_answers(phase: &Phase, answers: &AnswerMap) -> bool {
    phase
        .questions
        .iter()
        .any(|question| answers.is_answered(question.id.as_str()))
}

/// Completion percentage in `[0, 100]`, rounded half up.
pub fn progress(schema: &IntakeSchema, answers: &AnswerMap) -> u8 {
    let completed = schema
        .phases()
        .iter()
        .filter(|phase| phase_has_answers(phase, answers))
        .count();
    percent(completed, schema.phase_count())
}

pub fn summarize(schema: &IntakeSchema, answers: &AnswerMap) -> ProgressSummary {
    let phases: Vec<PhaseProgressEntry> = schema
        .phases()
        .iter()
        .enumerate()
        .map(|(index, phase)| PhaseProgressEntry {
            phase_id: phase.id.clone(),
            index,
            title: phase.title.clone(),
            done: phase_has_answers(phase, answers),
        })
        .collect();

    let completed_phases = phases.iter().filter(|entry| entry.done).count();
    let total_phases = phases.len();

    ProgressSummary {
        percent: percent(completed_phases, total_phases),
        completed_phases,
        total_phases,
        phases,
    }
}

fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let rounded = (200 * completed + total) / (2 * total);
    rounded.min(100) as u8
}
