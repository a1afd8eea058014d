use super::domain::{AnswerMap, Phase, Question};

/// A question without a conditional is always shown; otherwise the dependency's
/// stored answer must equal the declared value exactly, kind included.
pub fn is_visible(question: &Question, answers: &AnswerMap) -> bool {
    match &question.conditional {
        None => true,
        Some(conditional) => answers
            .get(conditional.depends_on.as_str())
            .map(|answer| answer == &conditional.value)
            .unwrap_or(false),
    }
}

/// Questions of `phase` that are currently shown, in declaration order.
pub fn visible_questions<'p, 'a>(
    phase: &'p Phase,
    answers: &'a AnswerMap,
) -> impl Iterator<Item = &'p Question> + 'a
where
    'p: 'a,
{
    phase
        .questions
        .iter()
        .filter(move |question| is_visible(question, answers))
}
