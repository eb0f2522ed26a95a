use crate::demo::{run_demo, run_nudge_batch, run_score, DemoArgs, NudgeRunArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use mindpulse::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "MindPulse",
    about = "Run the MindPulse wellbeing service or its batch jobs from the command line",
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
    /// Compute a moodmeter score with its component breakdown
    Score(ScoreArgs),
    /// Nudge generation jobs
    Nudges {
        #[command(subcommand)]
        command: NudgesCommand,
    },
    /// Walk a sample team through check-ins, surveys, nudges, and the manager overview
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum NudgesCommand {
    /// Run the nudge batch once over a store snapshot
    Run(NudgeRunArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON store snapshot used to seed the in-memory store
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        // the chat-completions client blocks, so keep it off the async worker
        Command::Nudges {
            command: NudgesCommand::Run(args),
        } => tokio::task::block_in_place(|| run_nudge_batch(args)),
        Command::Demo(args) => tokio::task::block_in_place(|| run_demo(args)),
    }
}
