use serde::Serialize;

use super::domain::{
    AnswerMap, AnswerValue, FileReference, InputKind, Phase, PhaseId, Question, QuestionId,
};
use super::validation::ValidationErrors;
use super::visibility::visible_questions;

const TEXT_AREA_ROWS: u8 = 4;

/// Everything a UI needs to draw one phase of the wizard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseView {
    pub phase_id: PhaseId,
    pub index: usize,
    pub phase_count: usize,
    pub title: String,
    pub description: String,
    pub is_last: bool,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub question_id: QuestionId,
    pub label: String,
    pub required: bool,
    pub control: FieldControl,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<AnswerValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub label: String,
    pub value: String,
    pub selected: bool,
}

/// Widget chosen from the question's input kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum FieldControl {
    Input {
        input_type: &'static str,
        placeholder: String,
    },
    TextArea {
        rows: u8,
        placeholder: String,
    },
    Select {
        options: Vec<OptionView>,
    },
    YesNo {
        selected: Option<bool>,
    },
    CheckboxGroup {
        options: Vec<OptionView>,
    },
    FileUpload {
        #[serde(skip_serializing_if = "Option::is_none")]
        uploaded: Option<FileReference>,
    },
}

/// Build the render model for `phase`: one field per visible question, in order.
pub fn render_phase(
    phase: &Phase,
    index: usize,
    phase_count: usize,
    answers: &AnswerMap,
    errors: &ValidationErrors,
) -> PhaseView {
    let fields = visible_questions(phase, answers)
        .map(|question| field_view(question, answers, errors))
        .collect();

    PhaseView {
        phase_id: phase.id.clone(),
        index,
        phase_count,
        title: phase.title.clone(),
        description: phase.description.clone(),
        is_last: index + 1 == phase_count,
        fields,
    }
}

fn field_view(question: &Question, answers: &AnswerMap, errors: &ValidationErrors) -> FieldView {
    let value = answers.answered(question.id.as_str());

    FieldView {
        question_id: question.id.clone(),
        label: question.label.clone(),
        required: question.required,
        control: control_for(question, value),
        value: value.cloned(),
        error: errors.get(question.id.as_str()).map(str::to_owned),
    }
}

fn control_for(question: &Question, value: Option<&AnswerValue>) -> FieldControl {
    let placeholder = || {
        question
            .placeholder
            .clone()
            .unwrap_or_else(|| format!("Enter {}...", question.label.to_lowercase()))
    };

    let input = |input_type: &'static str| FieldControl::Input {
        input_type,
        placeholder: placeholder(),
    };

    match question.kind {
        InputKind::ShortText => input("text"),
        InputKind::Phone => input("tel"),
        InputKind::Email => input("email"),
        InputKind::Number => input("number"),
        InputKind::Date => input("date"),
        InputKind::Url => input("url"),
        InputKind::LongText => FieldControl::TextArea {
            rows: TEXT_AREA_ROWS,
            placeholder: placeholder(),
        },
        InputKind::SingleSelect => {
            let selected = match value {
                Some(AnswerValue::Text(text)) => Some(text.as_str()),
                _ => None,
            };
            FieldControl::Select {
                options: option_views(question, |option| Some(option) == selected),
            }
        }
        InputKind::MultiSelect => {
            let checked: &[String] = match value {
                Some(AnswerValue::List(items)) => items,
                _ => &[],
            };
            FieldControl::CheckboxGroup {
                options: option_views(question, |option| {
                    checked.iter().any(|item| item == option)
                }),
            }
        }
        InputKind::YesNo => FieldControl::YesNo {
            selected: match value {
                Some(AnswerValue::Bool(flag)) => Some(*flag),
                _ => None,
            },
        },
        InputKind::File => FieldControl::FileUpload {
            uploaded: value.and_then(AnswerValue::as_file).cloned(),
        },
    }
}

fn option_views(question: &Question, is_selected: impl Fn(&str) -> bool) -> Vec<OptionView> {
    question
        .options
        .iter()
        .map(|option| OptionView {
            label: option.label().to_string(),
            value: option.value().to_string(),
            selected: is_selected(option.value()),
        })
        .collect()
}
