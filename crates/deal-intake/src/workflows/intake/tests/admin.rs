use super::common::*;
use crate::workflows::intake::admin::{build_admin_view, AdminAnswer, NOT_ANSWERED};
use crate::workflows::intake::domain::{AnswerMap, AnswerValue};

#[test]
fn unstarted_respondent_reports_not_started() {
    let schema = sample_schema();

    let view = build_admin_view(&schema, &respondent(), &AnswerMap::new());

    assert!(!view.started);
    assert_eq!(view.progress_percent, 0);
    assert!(view
        .render_text()
        .contains("Respondent has not started the intake process."));
}

#[test]
fn entries_format_each_answer_kind() {
    let schema = sample_schema();
    let answers = AnswerMap::from([
        ("owner_name", AnswerValue::text("Dana Reyes")),
        ("owners_agree", AnswerValue::Bool(false)),
        ("asset_types", AnswerValue::list(["Equipment", "Inventory"])),
        ("annual_revenue", AnswerValue::Number(1_250_000.0)),
        (
            "title_deed",
            AnswerValue::File(file_reference("doc-4", "deed.pdf")),
        ),
    ]);

    let view = build_admin_view(&schema, &respondent(), &answers);
    let answer_for = |id: &str| {
        view.sections
            .iter()
            .flat_map(|section| section.entries.iter())
            .find(|entry| entry.question_id.as_str() == id)
            .map(|entry| entry.answer.clone())
    };

    assert_eq!(
        answer_for("owners_agree"),
        Some(AdminAnswer::Text {
            text: "No".to_string()
        })
    );
    assert_eq!(
        answer_for("asset_types").map(|answer| answer.display()),
        Some("Equipment, Inventory".to_string())
    );
    assert_eq!(
        answer_for("annual_revenue").map(|answer| answer.display()),
        Some("1250000".to_string())
    );
    assert_eq!(
        answer_for("liens"),
        Some(AdminAnswer::NotAnswered)
    );
    assert_eq!(
        answer_for("title_deed").map(|answer| answer.display()),
        Some("deed.pdf </api/v1/documents/doc-4>".to_string())
    );
    assert_eq!(answer_for("partner_name"), None, "hidden questions are omitted");
}

#[test]
fn legacy_text_on_file_question_is_shown_as_text() {
    let schema = sample_schema();
    let answers = AnswerMap::from([("title_deed", AnswerValue::text("mailed a paper copy"))]);

    let view = build_admin_view(&schema, &respondent(), &answers);

    assert_eq!(
        view.sections[3].entries[1].answer,
        AdminAnswer::Text {
            text: "mailed a paper copy".to_string()
        }
    );
}

#[test]
fn text_rendering_lists_only_phases_with_answers() {
    let schema = sample_schema();
    let answers = AnswerMap::from([("annual_revenue", AnswerValue::Number(98.5))]);

    let text = build_admin_view(&schema, &respondent(), &answers).render_text();

    assert!(text.starts_with("Intake for seller-42 (25% complete)"));
    assert!(text.contains("Financials"));
    assert!(text.contains("- annual revenue: 98.5"));
    assert!(text.contains(&format!("- notes: {NOT_ANSWERED}")));
    assert!(!text.contains("Seller Basics"));
}

#[test]
fn csv_export_writes_header_and_one_row_per_entry() {
    let schema = sample_schema();
    let view = build_admin_view(&schema, &respondent(), &basics_answers());

    let mut buffer = Vec::new();
    view.write_csv(&mut buffer).expect("csv export");
    let csv = String::from_utf8(buffer).expect("utf8 output");
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "phase,question_id,question,answer");
    assert_eq!(lines[1], "Seller Basics,owner_name,owner name,Dana Reyes");
    let entry_count: usize = view.sections.iter().map(|section| section.entries.len()).sum();
    assert_eq!(lines.len(), entry_count + 1);
}
