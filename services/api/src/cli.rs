use crate::demo::{run_compute, run_demo, run_evaluate, run_gaps, DemoArgs, EvaluateArgs, SessionArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use taxcheck::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "taxcheck",
    about = "Estimate a federal and state return, check it against the rule catalog, and list open questions",
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
    /// Compute the filing for a session JSON file
    Compute(SessionArgs),
    /// Compute, then run the rule catalog and print the scored report
    Evaluate(EvaluateArgs),
    /// List follow-up questions that still apply to a session
    Gaps(SessionArgs),
    /// Walk a sample W-2 filer through computation, rules and gap questions
    Demo(DemoArgs),
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
        Command::Compute(args) => run_compute(args),
        Command::Evaluate(args) => run_evaluate(args),
        Command::Gaps(args) => run_gaps(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use taxcheck::workflows::filing::Scenario;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn evaluate_accepts_scenario_and_csv() {
        let cli = Cli::try_parse_from([
            "taxcheck",
            "evaluate",
            "--session",
            "session.json",
            "--scenario",
            "ny-1099",
            "--csv",
            "rules.csv",
        ])
        .expect("arguments parse");
        match cli.command {
            Some(Command::Evaluate(args)) => {
                assert_eq!(args.scenario, Some(Scenario::Ny1099));
                assert_eq!(
                    args.csv.as_deref(),
                    Some(std::path::Path::new("rules.csv"))
                );
            }
            other => panic!("expected evaluate, got {other:?}"),
        }
    }

    #[test]
    fn unknown_scenario_is_rejected() {
        let parsed = Cli::try_parse_from([
            "taxcheck",
            "evaluate",
            "--session",
            "session.json",
            "--scenario",
            "tx-w2",
        ]);
        assert!(parsed.is_err());
    }
}
