use crate::demo::{run_demo, DemoArgs};
use crate::reports::{
    run_admin, run_check_schema, run_progress, AdminArgs, ProgressArgs, SchemaArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use deal_intake::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Deal Intake",
    about = "Serve and inspect the phased business-sale intake questionnaire",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect stored intake answers or a questionnaire definition
    Intake {
        #[command(subcommand)]
        command: IntakeCommand,
    },
    /// Walk through the standard questionnaire, showing branching and escalations
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum IntakeCommand {
    /// Print completion progress for a stored answers file
    Progress(ProgressArgs),
    /// Render the admin view of a stored answers file
    Admin(AdminArgs),
    /// Validate a questionnaire definition and summarise its phases
    CheckSchema(SchemaArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Intake { command } => match command {
            IntakeCommand::Progress(args) => run_progress(args),
            IntakeCommand::Admin(args) => run_admin(args),
            IntakeCommand::CheckSchema(args) => run_check_schema(args),
        },
        Command::Demo(args) => run_demo(args),
    }
}
