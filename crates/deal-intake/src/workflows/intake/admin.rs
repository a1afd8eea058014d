use std::fmt::Write as _;
use std::io::Write;

use serde::Serialize;

use super::domain::{AnswerMap, AnswerValue, PhaseId, QuestionId, RespondentId};
use super::progress::{phase_has_answers, progress};
use super::schema::IntakeSchema;
use super::visibility::is_visible;

pub const DOCUMENT_ROUTE_PREFIX: &str = "/api/v1/documents";
pub const NOT_ANSWERED: &str = "Not answered";

/// Read-only rendering of a respondent's stored intake.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminIntakeView {
    pub respondent: RespondentId,
    pub started: bool,
    pub progress_percent: u8,
    pub sections: Vec<AdminPhaseSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminPhaseSection {
    pub phase_id: PhaseId,
    pub title: String,
    pub description: String,
    pub has_answers: bool,
    pub entries: Vec<AdminAnswerEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminAnswerEntry {
    pub question_id: QuestionId,
    pub label: String,
    pub answer: AdminAnswer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdminAnswer {
    NotAnswered,
    Text { text: String },
    Download { href: String, filename: String },
}

impl AdminAnswer {
    pub fn display(&self) -> String {
        match self {
            AdminAnswer::NotAnswered => NOT_ANSWERED.to_string(),
            AdminAnswer::Text { text } => text.clone(),
            AdminAnswer::Download { href, filename } => format!("{filename} <{href}>"),
        }
    }
}

/// One row of the admin respondent listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminListingEntry {
    pub respondent: RespondentId,
    pub started: bool,
    pub progress_percent: u8,
}

pub fn listing_entry(
    schema: &IntakeSchema,
    respondent: RespondentId,
    answers: &AnswerMap,
) -> AdminListingEntry {
    AdminListingEntry {
        respondent,
        started: has_started(answers),
        progress_percent: progress(schema, answers),
    }
}

fn has_started(answers: &AnswerMap) -> bool {
    answers.iter().any(|(_, value)| !value.is_empty())
}

/// List every question whose conditional (if any) holds for the stored answers.
/// Questions hidden by an unmet conditional are omitted entirely.
pub fn build_admin_view(
    schema: &IntakeSchema,
    respondent: &RespondentId,
    answers: &AnswerMap,
) -> AdminIntakeView {
    let sections = schema
        .phases()
        .iter()
        .map(|phase| AdminPhaseSection {
            phase_id: phase.id.clone(),
            title: phase.title.clone(),
            description: phase.description.clone(),
            has_answers: phase_has_answers(phase, answers),
            entries: phase
                .questions
                .iter()
                .filter(|question| is_visible(question, answers))
                .map(|question| AdminAnswerEntry {
                    question_id: question.id.clone(),
                    label: question.label.clone(),
                    answer: format_answer(answers.answered(question.id.as_str())),
                })
                .collect(),
        })
        .collect();

    AdminIntakeView {
        respondent: respondent.clone(),
        started: has_started(answers),
        progress_percent: progress(schema, answers),
        sections,
    }
}

/// Legacy text values on file questions fall through to plain text.
fn format_answer(value: Option<&AnswerValue>) -> AdminAnswer {
    match value {
        None => AdminAnswer::NotAnswered,
        Some(AnswerValue::File(reference)) => AdminAnswer::Download {
            href: format!("{DOCUMENT_ROUTE_PREFIX}/{}", reference.id),
            filename: reference.filename.clone(),
        },
        Some(other) => AdminAnswer::Text {
            text: other.display_text(),
        },
    }
}

impl AdminIntakeView {
    /// Plain-text rendering for terminals and logs.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Intake for {} ({}% complete)",
            self.respondent, self.progress_percent
        );
        if !self.started {
            let _ = writeln!(out, "Respondent has not started the intake process.");
            return out;
        }

        for section in self.sections.iter().filter(|section| section.has_answers) {
            let _ = writeln!(out, "\n{}", section.title);
            for entry in &section.entries {
                let _ = writeln!(out, "- {}: {}", entry.label, entry.answer.display());
            }
        }
        out
    }

    /// Export `phase, question_id, question, answer` rows.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut rows = csv::Writer::from_writer(writer);
        rows.write_record(["phase", "question_id", "question", "answer"])?;
        for section in &self.sections {
            for entry in &section.entries {
                rows.write_record([
                    section.title.as_str(),
                    entry.question_id.as_str(),
                    entry.label.as_str(),
                    entry.answer.display().as_str(),
                ])?;
            }
        }
        rows.flush()?;
        Ok(())
    }
}
