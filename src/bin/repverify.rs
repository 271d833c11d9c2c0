//! repverify CLI - Analytic consistency checks for hashed representations
//!
//! Runs the equation suites of the four representation variants for one
//! parameter set, or evaluates a single equation with diagnostics.
//!
//! Exit codes: 0 when everything checked holds, 1 when an equation does
//! not hold, 2 on invalid input or a numerical failure.

use clap::{Args, Parser, Subcommand, ValueEnum};
use repverify::config::{CheckConfig, ConfigOverrides};
use repverify::core::comparison::ComparisonPolicy;
use repverify::core::{
    evaluate, DerivedCounts, EquationId, Parameters, Sharing, SuiteReport, SuiteRunner, Variant,
    Verdict,
};
use repverify::events::observers::{
    ConsoleReporter, LoggingObserver, SuiteSummary, SummaryObserver,
};
use repverify::events::EventBus;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

/// repverify - Check binomial consistency equations of hashed representations
#[derive(Parser)]
#[command(name = "repverify")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses
#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for programmatic use
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the six equations of one representation variant
    Check {
        /// Representation variant (overrides the config file)
        #[arg(long, value_enum)]
        variant: Option<VariantArg>,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Run all four representation variants
    All {
        #[command(flatten)]
        params: ParamArgs,
    },

    /// Evaluate a single equation, e.g. 2.3'' or 2.1'
    Equation {
        /// Equation label
        label: String,

        /// Collision sum used by 2.3''
        #[arg(long, value_enum, default_value = "shared")]
        sharing: SharingArg,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Print the resolved configuration and derived values
    ShowConfig {
        #[command(flatten)]
        params: ParamArgs,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parameter flags shared by the checking commands
#[derive(Args)]
struct ParamArgs {
    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Population size n
    #[arg(short = 'n', long)]
    population: Option<i64>,

    /// Per-trial success probability p
    #[arg(short = 'p', long, conflicts_with = "density")]
    probability: Option<f64>,

    /// Density d, giving p = d / n
    #[arg(short = 'd', long)]
    density: Option<f64>,

    /// Threshold k (k_a for one-step mechanisms)
    #[arg(short = 'k', long)]
    threshold: Option<i64>,

    /// Membership threshold multiplier, k_m = round(k_adj * k)
    #[arg(long)]
    k_adj: Option<f64>,

    /// Candidate count r
    #[arg(short = 'r', long)]
    candidates: Option<i64>,

    /// Insertion attempts t
    #[arg(short = 't', long)]
    attempts: Option<i64>,

    /// Tolerance multiplier c_1
    #[arg(long = "c1")]
    c_1: Option<f64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum VariantArg {
    TwoStepDisjoint,
    TwoStepShared,
    OneStepShared,
    OneStepDisjoint,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::TwoStepDisjoint => Variant::TwoStepDisjoint,
            VariantArg::TwoStepShared => Variant::TwoStepShared,
            VariantArg::OneStepShared => Variant::OneStepShared,
            VariantArg::OneStepDisjoint => Variant::OneStepDisjoint,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SharingArg {
    Shared,
    Disjoint,
}

impl From<SharingArg> for Sharing {
    fn from(arg: SharingArg) -> Self {
        match arg {
            SharingArg::Shared => Sharing::Shared,
            SharingArg::Disjoint => Sharing::Disjoint,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
#[allow(clippy::enum_variant_names)]
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

// ============================================================================
// Response Types
// ============================================================================

/// Response from the all command
#[derive(Serialize)]
struct AllResponse {
    /// One report per variant, in reporting order
    reports: Vec<SuiteReport>,
    /// Passed only if every variant passed
    verdict: Verdict,
    /// Tallies across the four suites
    summary: SuiteSummary,
}

/// Response from the equation command with diagnostics
#[derive(Serialize)]
struct EquationResponse {
    equation: EquationId,
    variant: Variant,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'static str>,
    passed: bool,
    expected: f64,
    observed: f64,
    policy: ComparisonPolicy,
    derived: DerivedCounts,
    k_m: u64,
    elapsed_ms: u64,
}

/// Response from the show-config command
#[derive(Serialize)]
struct ConfigResponse {
    config: CheckConfig,
    parameters: Parameters,
    density: u64,
    k_m: u64,
    derived: DerivedCounts,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Commands::Check { variant, params } => execute_check(cli.format, variant, &params),
        Commands::All { params } => execute_all(cli.format, &params),
        Commands::Equation {
            label,
            sharing,
            params,
        } => execute_equation(cli.format, &label, sharing.into(), &params),
        Commands::ShowConfig { params } => execute_show_config(cli.format, &params),
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

fn execute_check(
    format: OutputFormat,
    variant: Option<VariantArg>,
    args: &ParamArgs,
) -> Result<ExitCode, String> {
    let mut config = load_config(args)?;
    if let Some(variant) = variant {
        config.variant = variant.into();
    }
    let params = config.resolve().map_err(|e| e.to_string())?;

    let mut runner = SuiteRunner::new(report_bus(format));
    let report = runner
        .run(config.variant, &params)
        .map_err(|e| e.to_string())?;

    if let OutputFormat::Json = format {
        output_json(&report)?;
    }
    Ok(verdict_code(report.verdict))
}

fn execute_all(format: OutputFormat, args: &ParamArgs) -> Result<ExitCode, String> {
    let params = load_config(args)?.resolve().map_err(|e| e.to_string())?;

    let summary = SummaryObserver::new();
    let handle = summary.summary_handle();
    let mut runner = SuiteRunner::new(report_bus(format).with_observer(summary));
    let reports = runner.run_all(&params).map_err(|e| e.to_string())?;

    let summary = handle
        .lock()
        .map_err(|_| "summary lock poisoned".to_string())?
        .clone();
    let verdict = if summary.all_passed() {
        Verdict::Passed
    } else {
        Verdict::Failed
    };

    match format {
        OutputFormat::Json => output_json(&AllResponse {
            reports,
            verdict,
            summary,
        })?,
        OutputFormat::Text => {
            print!("{}", summary.report());
            println!("Overall: {}", verdict);
        }
    }
    Ok(verdict_code(verdict))
}

fn execute_equation(
    format: OutputFormat,
    label: &str,
    sharing: Sharing,
    args: &ParamArgs,
) -> Result<ExitCode, String> {
    let equation: EquationId = label.parse()?;
    let params = load_config(args)?.resolve().map_err(|e| e.to_string())?;
    let variant = Variant::for_equation(equation, sharing);

    let started = Instant::now();
    let result = evaluate(variant, equation.number, &params).map_err(|e| e.to_string())?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let derived = DerivedCounts::new(params.n, params.r).map_err(|e| e.to_string())?;

    let response = EquationResponse {
        equation: result.equation,
        variant,
        note: variant.note(equation.number),
        passed: result.passed,
        expected: result.expected,
        observed: result.observed,
        policy: result.policy,
        derived,
        k_m: params.k_m(),
        elapsed_ms,
    };
    output_response(format, &response)?;

    Ok(if result.passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn execute_show_config(format: OutputFormat, args: &ParamArgs) -> Result<ExitCode, String> {
    let config = load_config(args)?;
    let parameters = config.resolve().map_err(|e| e.to_string())?;
    let derived = DerivedCounts::new(parameters.n, parameters.r).map_err(|e| e.to_string())?;

    let response = ConfigResponse {
        density: parameters.density(),
        k_m: parameters.k_m(),
        config,
        parameters,
        derived,
    };
    output_response(format, &response)?;
    Ok(ExitCode::SUCCESS)
}

fn generate_completions(shell: Shell) {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as ClapShell};

    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => ClapShell::Bash,
        Shell::Zsh => ClapShell::Zsh,
        Shell::Fish => ClapShell::Fish,
        Shell::PowerShell => ClapShell::PowerShell,
    };
    generate(shell, &mut cmd, "repverify", &mut io::stdout());
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Start from the config file (or defaults) and apply the flags.
fn load_config(args: &ParamArgs) -> Result<CheckConfig, String> {
    let mut config = match &args.config {
        Some(path) => CheckConfig::from_file(path).map_err(|e| e.to_string())?,
        None => CheckConfig::default(),
    };
    config.apply(&ConfigOverrides {
        variant: None,
        n: args.population,
        p: args.probability,
        d: args.density,
        k: args.threshold,
        k_adj: args.k_adj,
        r: args.candidates,
        t: args.attempts,
        c_1: args.c_1,
    });
    Ok(config)
}

/// Bus with the logging observer, plus the console report for text output.
fn report_bus(format: OutputFormat) -> EventBus {
    let bus = EventBus::new().with_observer(LoggingObserver::new());
    match format {
        OutputFormat::Text => bus.with_observer(ConsoleReporter::stdout().with_progress(true)),
        OutputFormat::Json => bus,
    }
}

fn verdict_code(verdict: Verdict) -> ExitCode {
    if verdict.is_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn output_json<T: Serialize>(response: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| format!("Failed to serialize response: {}", e))?;
    println!("{}", json);
    Ok(())
}

/// Output a response in the specified format.
///
/// JSON is pretty-printed; text prints the same structure as indented
/// `key: value` lines.
fn output_response<T: Serialize>(format: OutputFormat, response: &T) -> Result<(), String> {
    match format {
        OutputFormat::Json => output_json(response)?,
        OutputFormat::Text => {
            let value = serde_json::to_value(response)
                .map_err(|e| format!("Failed to serialize response: {}", e))?;
            print_value(&value, 0);
        }
    }
    Ok(())
}

/// Recursively print a JSON value with indentation for human-readable output.
fn print_value(value: &serde_json::Value, indent: usize) {
    let prefix = "  ".repeat(indent);
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                match val {
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        println!("{}{}:", prefix, key);
                        print_value(val, indent + 1);
                    }
                    _ => println!("{}{}: {}", prefix, key, format_simple_value(val)),
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for val in arr {
                match val {
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        print_value(val, indent + 1)
                    }
                    _ => println!("{}- {}", prefix, format_simple_value(val)),
                }
            }
        }
        _ => println!("{}{}", prefix, format_simple_value(value)),
    }
}

fn format_simple_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        _ => value.to_string(),
    }
}
