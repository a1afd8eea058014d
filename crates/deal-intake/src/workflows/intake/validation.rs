use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{AnswerMap, Phase, QuestionId};
use super::visibility::is_visible;

pub const REQUIRED_FIELD_MESSAGE: &str = "This field is required";

/// Field-level errors keyed by question id. Empty means the phase may be left.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<QuestionId, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.0.get(question_id).map(String::as_str)
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.0.contains_key(question_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &str)> {
        self.0.iter().map(|(id, message)| (id, message.as_str()))
    }

    pub(crate) fn clear_field(&mut self, question_id: &str) {
        self.0.remove(question_id);
    }
}

/// Flag every visible, required question of `phase` that has no answer.
pub fn validate(phase: &Phase, answers: &AnswerMap) -> ValidationErrors {
    let errors = phase
        .questions
        .iter()
        .filter(|question| question.required)
        .filter(|question| is_visible(question, answers))
        .filter(|question| !answers.is_answered(question.id.as_str()))
        .map(|question| (question.id.clone(), REQUIRED_FIELD_MESSAGE.to_string()))
        .collect();

    ValidationErrors(errors)
}
