use crate::infra::{load_answers_file, load_schema};
use clap::Args;
use deal_intake::config::AppConfig;
use deal_intake::error::AppError;
use deal_intake::workflows::intake::{
    build_admin_view, summarize, AnswerMap, IntakeSchema, RespondentId, RuleAction,
    DEFAULT_ESCALATION_MESSAGE,
};
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ProgressArgs {
    /// Stored answers (flat JSON object keyed by question id)
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Questionnaire definition; defaults to INTAKE_SCHEMA_PATH or the bundled schema
    #[arg(long)]
    pub(crate) schema: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct AdminArgs {
    /// Stored answers (flat JSON object keyed by question id)
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Questionnaire definition; defaults to INTAKE_SCHEMA_PATH or the bundled schema
    #[arg(long)]
    pub(crate) schema: Option<PathBuf>,
    /// Respondent name shown in the header
    #[arg(long, default_value = "respondent")]
    pub(crate) respondent: String,
    /// Emit CSV rows instead of the text listing
    #[arg(long)]
    pub(crate) csv: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SchemaArgs {
    /// Questionnaire definition; defaults to INTAKE_SCHEMA_PATH or the bundled schema
    #[arg(long)]
    pub(crate) schema: Option<PathBuf>,
}

pub(crate) fn run_progress(args: ProgressArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let schema = load_schema(&config.intake, args.schema.as_deref())?;
    let answers = load_answers_file(&args.answers)?;

    print!("{}", progress_report(&schema, &answers));
    Ok(())
}

pub(crate) fn run_admin(args: AdminArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let schema = load_schema(&config.intake, args.schema.as_deref())?;
    let answers = load_answers_file(&args.answers)?;
    let view = build_admin_view(&schema, &RespondentId::new(args.respondent), &answers);

    if args.csv {
        view.write_csv(std::io::stdout().lock())?;
    } else {
        print!("{}", view.render_text());
    }
    Ok(())
}

pub(crate) fn run_check_schema(args: SchemaArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let schema = load_schema(&config.intake, args.schema.as_deref())?;

    print!("{}", schema_report(&schema));
    Ok(())
}

pub(crate) fn progress_report(schema: &IntakeSchema, answers: &AnswerMap) -> String {
    let summary = summarize(schema, answers);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Progress: {}% ({} of {} phases started)",
        summary.percent, summary.completed_phases, summary.total_phases
    );
    for entry in &summary.phases {
        let marker = if entry.done { "x" } else { " " };
        let _ = writeln!(out, "  [{marker}] {}. {}", entry.index + 1, entry.title);
    }
    out
}

pub(crate) fn schema_report(schema: &IntakeSchema) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Schema OK: {} phases, {} questions",
        schema.phase_count(),
        schema.question_count()
    );
    for phase in schema.phases() {
        let required = phase.questions.iter().filter(|q| q.required).count();
        let conditional = phase
            .questions
            .iter()
            .filter(|q| q.conditional.is_some())
            .count();
        let _ = writeln!(
            out,
            "- {} ({}): {} questions, {} required, {} conditional",
            phase.title,
            phase.id,
            phase.questions.len(),
            required,
            conditional
        );
        for question in &phase.questions {
            for rule in &question.logic {
                match rule.action {
                    RuleAction::FlagEscalation => {
                        let message = rule
                            .message
                            .as_deref()
                            .unwrap_or(DEFAULT_ESCALATION_MESSAGE);
                        let _ = writeln!(out, "    {} flags \"{}\"", question.id, message);
                    }
                    RuleAction::JumpToPhase => {
                        let target = rule
                            .target_phase
                            .as_ref()
                            .map(|target| target.as_str())
                            .unwrap_or("<none>");
                        let _ = writeln!(out, "    {} jumps to {}", question.id, target);
                    }
                    RuleAction::RevealQuestions | RuleAction::RequireUpload => {}
                }
            }
        }
    }
    out
}
