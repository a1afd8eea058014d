use crate::infra::{InMemoryDocumentStore, InMemoryProfileStore};
use clap::Args;
use deal_intake::error::AppError;
use deal_intake::workflows::intake::{
    AdvanceOutcome, AdvanceView, AnswerValue, IntakeSchema, IntakeService, RespondentId,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Respondent id used for the scripted session.
    #[arg(long, default_value = "demo-seller")]
    pub(crate) respondent: String,
    /// Skip the Real Estate branch (assets phase continues to Employees & HR).
    #[arg(long)]
    pub(crate) no_real_estate: bool,
    /// Print the admin listing once the walk-through finishes.
    #[arg(long)]
    pub(crate) show_admin: bool,
}

type DemoService = IntakeService<InMemoryProfileStore, InMemoryDocumentStore>;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        respondent,
        no_real_estate,
        show_admin,
    } = args;

    let schema = Arc::new(IntakeSchema::standard()?);
    let profiles = Arc::new(InMemoryProfileStore::default());
    let documents = Arc::new(InMemoryDocumentStore::default());
    let service = IntakeService::new(schema, profiles, documents);
    let respondent = RespondentId::new(respondent);

    println!("Business-sale intake demo");
    let view = service.open(&respondent, None)?;
    if let Some(phase) = &view.phase {
        println!(
            "- Opened session for {} at phase {} of {}: {}",
            respondent,
            phase.index + 1,
            phase.phase_count,
            phase.title
        );
    }

    println!("\nAttempting to continue with an empty first phase");
    report(&service.advance(&respondent)?);

    println!("\nAnswering initial screening");
    answer(
        &service,
        &respondent,
        &[
            ("q1_1", AnswerValue::text("Morgan Ellis")),
            ("q1_2", AnswerValue::text("Ellis Hardware LLC")),
            ("q1_3", AnswerValue::text("555-0142")),
            ("q1_4", AnswerValue::text("morgan@ellishardware.example")),
            ("q1_5", AnswerValue::text("Email")),
            ("q1_6", AnswerValue::Bool(false)),
            ("q1_8", AnswerValue::text("3–12 months")),
            ("q1_9", AnswerValue::Bool(true)),
            ("q1_10", AnswerValue::text("Second store in Ankeny")),
            ("q1_11", AnswerValue::text("Fully operational")),
        ],
    )?;
    report(&service.advance(&respondent)?);

    answer(
        &service,
        &respondent,
        &[
            ("q2_business_desc", AnswerValue::text("Neighbourhood hardware and garden store")),
            ("q2_competitive_adv", AnswerValue::text("Forty years of contractor accounts")),
            ("q2_has_website", AnswerValue::Bool(true)),
            ("q2_website_url", AnswerValue::text("https://ellishardware.example")),
        ],
    )?;
    report(&service.advance(&respondent)?);

    println!("\nOwners disagree about the sale (attorney escalation expected)");
    answer(
        &service,
        &respondent,
        &[
            ("q3_1", AnswerValue::text("LLC")),
            ("q3_5", AnswerValue::text("Morgan Ellis 60%, Riley Ellis 40%")),
            ("q3_6", AnswerValue::Bool(false)),
            ("q3_7", AnswerValue::Bool(false)),
        ],
    )?;
    report(&service.advance(&respondent)?);

    println!("\nFinancials: statements on file, liens outstanding");
    answer(
        &service,
        &respondent,
        &[
            ("q4_1", AnswerValue::Bool(true)),
            ("q4_3", AnswerValue::Number(1_840_000.0)),
            ("q4_4", AnswerValue::Number(212_000.0)),
            ("q4_5", AnswerValue::Bool(false)),
            ("q4_7", AnswerValue::Bool(true)),
        ],
    )?;
    let reference = service.upload(
        &respondent,
        "q4_1_upload",
        "financials-2021-2023.pdf",
        mime::APPLICATION_PDF,
        b"%PDF-1.7 demo statements".to_vec(),
    )?;
    println!(
        "- Uploaded {} as document {}",
        reference.filename, reference.id
    );
    report(&service.advance(&respondent)?);

    let mut assets = vec!["Equipment", "Inventory"];
    if !no_real_estate {
        assets.push("Real Estate");
    }
    println!("\nAssets being sold: {}", assets.join(", "));
    answer(
        &service,
        &respondent,
        &[("q5_1", AnswerValue::list(assets))],
    )?;
    let view = service.advance(&respondent)?;
    report(&view);

    println!("\nEscalations raised so far:");
    if view.session.escalations.is_empty() {
        println!("  none");
    }
    for flag in &view.session.escalations {
        println!("  - [{}] {}", flag.phase_id, flag.message);
    }

    let progress = service.progress(&respondent)?;
    println!(
        "\nProgress: {}% ({} of {} phases started)",
        progress.percent, progress.completed_phases, progress.total_phases
    );

    if show_admin {
        println!("\nAdmin view");
        print!("{}", service.admin_view(&respondent)?.render_text());
    }

    Ok(())
}

fn answer(
    service: &DemoService,
    respondent: &RespondentId,
    answers: &[(&str, AnswerValue)],
) -> Result<(), AppError> {
    for (question_id, value) in answers {
        service.record_answer(respondent, question_id, value.clone())?;
    }
    Ok(())
}

fn report(view: &AdvanceView) {
    match &view.outcome {
        AdvanceOutcome::Blocked { errors } => {
            println!("- Blocked: {} required field(s) missing", errors.len());
            for (question_id, message) in errors.iter() {
                println!("    {question_id}: {message}");
            }
        }
        AdvanceOutcome::Moved { from, to, rules } => {
            let title = view
                .session
                .phase
                .as_ref()
                .map(|phase| phase.title.as_str())
                .unwrap_or("");
            if *to != from + 1 {
                println!("- Branch taken: phase {} -> phase {} ({title})", from + 1, to + 1);
            } else {
                println!("- Continued to phase {} ({title})", to + 1);
            }
            for message in &rules.escalations {
                println!("    escalation: {message}");
            }
            for advisory in &rules.advisories {
                if let Some(message) = &advisory.message {
                    println!("    note: {message}");
                }
            }
        }
        AdvanceOutcome::Submitted { .. } => println!("- Intake submitted"),
    }
}
