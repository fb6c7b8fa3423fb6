use crate::demo::{run_demo, run_harvest_assessment, DemoArgs, HarvestAssessArgs};
use crate::error::AppError;
use crate::server;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "CropPulse Decision Service",
    about = "Run and demonstrate the CropPulse decision engines from the command line",
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
    /// Harvest logistics utilities
    Harvest {
        #[command(subcommand)]
        command: HarvestCommand,
    },
    /// Run an end-to-end demo: credit score, claim verdict, harvest plan
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum HarvestCommand {
    /// Assess harvest timing and road risk against the seeded forecast
    Assess(HarvestAssessArgs),
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
        Command::Harvest {
            command: HarvestCommand::Assess(args),
        } => run_harvest_assessment(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
