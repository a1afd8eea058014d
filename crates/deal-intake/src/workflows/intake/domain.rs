use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for questionnaire questions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuestionId(pub String);

/// Identifier wrapper for questionnaire phases.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhaseId(pub String);

/// Identity of the respondent who owns an answer map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RespondentId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(QuestionId);
string_id!(PhaseId);
string_id!(RespondentId);

/// Input widget families supported by the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    ShortText,
    Phone,
    Email,
    YesNo,
    SingleSelect,
    LongText,
    Number,
    MultiSelect,
    File,
    Date,
    Url,
}

impl InputKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ShortText => "Short text",
            Self::Phone => "Phone",
            Self::Email => "Email",
            Self::YesNo => "Yes / No",
            Self::SingleSelect => "Single select",
            Self::LongText => "Long text",
            Self::Number => "Number",
            Self::MultiSelect => "Multi select",
            Self::File => "File upload",
            Self::Date => "Date",
            Self::Url => "URL",
        }
    }

    /// Whether a value has the shape this kind of question stores.
    pub fn accepts(self, value: &AnswerValue) -> bool {
        match (self, value) {
            (Self::File, AnswerValue::File(_)) => true,
            (Self::File, _) | (_, AnswerValue::File(_)) => false,
            (Self::MultiSelect, AnswerValue::List(_)) => true,
            (Self::MultiSelect, _) => false,
            (Self::YesNo, AnswerValue::Bool(_)) => true,
            (Self::YesNo, _) => false,
            (_, AnswerValue::Text(_) | AnswerValue::Number(_)) => true,
            (_, AnswerValue::Bool(_) | AnswerValue::List(_)) => false,
        }
    }
}

/// Select option, either a bare value or a label/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionOption {
    Bare(String),
    Labeled { label: String, value: String },
}

impl QuestionOption {
    pub fn label(&self) -> &str {
        match self {
            QuestionOption::Bare(value) => value,
            QuestionOption::Labeled { label, .. } => label,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            QuestionOption::Bare(value) => value,
            QuestionOption::Labeled { value, .. } => value,
        }
    }
}

/// Single-dependency visibility rule tying a question to an exact prior answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditional {
    pub depends_on: QuestionId,
    pub value: AnswerValue,
}

/// Side effect raised when a question's answer matches a trigger value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    RevealQuestions,
    JumpToPhase,
    FlagEscalation,
    RequireUpload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicRule {
    pub trigger: AnswerValue,
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_questions: Vec<QuestionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_phase: Option<PhaseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LogicRule {
    /// Multi-select answers match when they contain the trigger, scalars on strict equality.
    pub fn matches(&self, answer: &AnswerValue) -> bool {
        match answer {
            AnswerValue::List(items) => match &self.trigger {
                AnswerValue::Text(trigger) => items.iter().any(|item| item == trigger),
                _ => false,
            },
            other => other == &self.trigger,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub label: String,
    pub kind: InputKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Conditional>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logic: Vec<LogicRule>,
}

/// Named, ordered group of questions presented together as one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub id: PhaseId,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
}

/// Opaque handle returned by the document store for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileReference {
    pub id: String,
    pub filename: String,
}

/// Stored answer for a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    File(FileReference),
}

impl AnswerValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Empty strings count as unanswered; every other value counts as an answer.
    pub fn is_empty(&self) -> bool {
        matches!(self, AnswerValue::Text(text) if text.is_empty())
    }

    pub fn as_file(&self) -> Option<&FileReference> {
        match self {
            AnswerValue::File(reference) => Some(reference),
            _ => None,
        }
    }

    /// Human readable rendering used by admin listings.
    pub fn display_text(&self) -> String {
        match self {
            AnswerValue::Bool(true) => "Yes".to_string(),
            AnswerValue::Bool(false) => "No".to_string(),
            AnswerValue::Number(number) => format_number(*number),
            AnswerValue::Text(text) => text.clone(),
            AnswerValue::List(items) => items.join(", "),
            AnswerValue::File(reference) => reference.filename.clone(),
        }
    }
}

fn format_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<FileReference> for AnswerValue {
    fn from(value: FileReference) -> Self {
        Self::File(value)
    }
}

/// One respondent's answers, keyed by question id.
///
/// Serialized as a flat JSON object; `null` entries are dropped when loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<QuestionId, Option<AnswerValue>>",
    into = "BTreeMap<QuestionId, AnswerValue>"
)]
pub struct AnswerMap {
    values: BTreeMap<QuestionId, AnswerValue>,
}

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.values.get(question_id)
    }

    /// Returns the answer only when it counts as answered.
    pub fn answered(&self, question_id: &str) -> Option<&AnswerValue> {
        self.get(question_id).filter(|value| !value.is_empty())
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answered(question_id).is_some()
    }

    pub fn insert(
        &mut self,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Option<AnswerValue> {
        self.values.insert(question_id, value)
    }

    pub fn remove(&mut self, question_id: &str) -> Option<AnswerValue> {
        self.values.remove(question_id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &AnswerValue)> {
        self.values.iter()
    }
}

impl From<BTreeMap<QuestionId, Option<AnswerValue>>> for AnswerMap {
    fn from(raw: BTreeMap<QuestionId, Option<AnswerValue>>) -> Self {
        let values = raw
            .into_iter()
            .filter_map(|(id, value)| value.map(|value| (id, value)))
            .collect();
        Self { values }
    }
}

impl From<AnswerMap> for BTreeMap<QuestionId, AnswerValue> {
    fn from(map: AnswerMap) -> Self {
        map.values
    }
}

impl FromIterator<(QuestionId, AnswerValue)> for AnswerMap {
    fn from_iter<T: IntoIterator<Item = (QuestionId, AnswerValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[(&str, AnswerValue); N]> for AnswerMap {
    fn from(entries: [(&str, AnswerValue); N]) -> Self {
        entries
            .into_iter()
            .map(|(id, value)| (QuestionId::new(id), value))
            .collect()
    }
}
