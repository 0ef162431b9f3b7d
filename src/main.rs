use clap::{Parser, Subcommand};
use mutator_quality::analyze;
use mutator_quality::config::{
    AnalysisConfig, CoverageBasis, MutantSelection, SolverConfig, SolverKind,
    DEFAULT_SOLVER_TIMEOUT,
};
use mutator_quality::report::OutputFormat;
use mutator_quality::Result;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mutator-quality")]
#[command(about = "Coverage quality of mutation operators from Stryker reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the coverage quality of every mutation operator
    Run {
        /// Mutation report(s), or directories containing them
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// File to write the results to
        #[arg(short, long)]
        output: PathBuf,

        /// Set-cover formulation used to minimize the test suite
        #[arg(short, long, value_enum, default_value_t = SolverKind::Exact)]
        solver: SolverKind,

        /// Solver time budget in seconds (0 = no limit)
        #[arg(long, default_value_t = DEFAULT_SOLVER_TIMEOUT.as_secs())]
        timeout: u64,

        /// Only use killed mutants
        #[arg(short, long)]
        killed_only: bool,

        /// Include static mutants
        #[arg(short = 't', long = "static")]
        include_static: bool,

        /// Split Stryker mutators into fine-grained operators (e.g. ArithmeticOperator+To-)
        #[arg(long)]
        deduce_operators: bool,

        /// Mutants a covering test is credited for in the quality denominator
        #[arg(long, value_enum, default_value_t = CoverageBasis::Equivalent)]
        coverage_basis: CoverageBasis,

        /// Output format (defaults to json for a .json output path, text otherwise)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Test the effectiveness of a mutation level
    Test {
        /// File listing the level's operators, one per line
        #[arg(short, long)]
        level: PathBuf,

        /// Mutation report to test the level against
        #[arg(short, long)]
        input: PathBuf,

        /// File to write the summary to
        #[arg(short, long)]
        output: PathBuf,

        /// Set-cover formulation used to minimize the test suite
        #[arg(short, long, value_enum, default_value_t = SolverKind::Exact)]
        solver: SolverKind,

        /// Solver time budget in seconds (0 = no limit)
        #[arg(long, default_value_t = DEFAULT_SOLVER_TIMEOUT.as_secs())]
        timeout: u64,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output,
            solver,
            timeout,
            killed_only,
            include_static,
            deduce_operators,
            coverage_basis,
            format,
            verbose,
        } => {
            init_logging(verbose);

            let config = AnalysisConfig {
                solver: SolverConfig::with_timeout_secs(solver, timeout),
                basis: coverage_basis,
                selection: MutantSelection {
                    killed_only,
                    include_static,
                },
                deduce_operators,
            };
            let format = OutputFormat::resolve(format, &output);

            analyze::run_analysis(&input, &output, format, config).await?;
        }
        Commands::Test {
            level,
            input,
            output,
            solver,
            timeout,
            verbose,
        } => {
            init_logging(verbose);

            let summary = analyze::run_level_test(
                &level,
                &input,
                &output,
                SolverConfig::with_timeout_secs(solver, timeout),
            )
            .await?;
            println!(
                "Mutation level effectiveness: {:.0}%",
                summary.effectiveness()
            );
        }
    }

    Ok(())
}

/// `RUST_LOG` wins over `--verbose` when set.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(filter)
        .init();
}
