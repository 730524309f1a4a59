// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and hands off to Layer 2.
//
//   1. `train` — train a classifier or autoencoder, keep the
//                best checkpoint, append the result ledgers
//   2. `eval`  — score a checkpoint directory, print JSON
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvalArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "dytb",
    version,
    about = "Train and evaluate neural-network models with checkpointing and best-model selection."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Eval(args)  => run_eval(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training {} on {}", args.model, args.dataset);

    let outcome = TrainUseCase::new(args.into()).execute()?;

    println!("Best validation value: {}", outcome.best_validation);
    match outcome.test {
        Some(test) => println!("Test value of best model: {test}"),
        None       => println!("No test split; test evaluation skipped."),
    }
    Ok(())
}

fn run_eval(args: EvalArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let stats = EvaluateUseCase::new(args.into()).execute()?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
