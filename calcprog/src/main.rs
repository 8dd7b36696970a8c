//! calcprog CLI

use calcprog::error::report_error;
use calcprog::{EngineConfig, Program, RunError, Scope, StoredExpression};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "calcprog", version, about = "Calculation programs over {{variable}} expressions")]
struct Cli {
    /// Engine config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report the variables an expression uses and its first problem
    Analyze {
        /// Expression source, e.g. "{{a}} + 1"
        source: String,
    },
    /// Evaluate an expression
    Eval {
        /// Expression source
        source: String,
        /// Scope binding, repeatable
        #[arg(short, long = "var", value_name = "NAME=VALUE", value_parser = parse_binding)]
        vars: Vec<(String, f64)>,
    },
    /// Validate a program file (JSON)
    Check {
        /// Program file
        file: PathBuf,
    },
    /// Run a program file (JSON) and print its outputs
    Run {
        /// Program file
        file: PathBuf,
        /// Also print step values and the final scope
        #[arg(long)]
        trace: bool,
    },
    /// Interactive scope builder
    Repl,
}

fn parse_binding(arg: &str) -> Result<(String, f64), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{arg}`"))?;
    let name = name.trim();
    if !calcprog::template::is_identifier(name) {
        return Err(format!("`{name}` is not a valid variable name"));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for `{name}`: {e}"))?;
    Ok((name.to_string(), value))
}

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Command::Analyze { source } => analyze(&source, &config),
        Command::Eval { source, vars } => eval(&source, vars, &config),
        Command::Check { file } => check_file(&file, &config),
        Command::Run { file, trace } => run_file(&file, trace, &config),
        Command::Repl => repl(config),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn load_config(path: Option<&Path>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    debug!("config: {:?}", config);
    Ok(config)
}

fn analyze(source: &str, config: &EngineConfig) -> CliResult {
    let analysis = calcprog::analyze_with(source, config);
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

fn eval(source: &str, vars: Vec<(String, f64)>, config: &EngineConfig) -> CliResult {
    let scope: Scope = vars.into_iter().collect();
    match calcprog::evaluate_with(&StoredExpression::new(source), &scope, config) {
        Ok(value) => {
            println!("{value}");
            Ok(())
        }
        Err(err) => {
            report_error("<expr>", source, &err)?;
            std::process::exit(1);
        }
    }
}

fn read_program(path: &Path) -> Result<Program, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(Program::from_json(&json)?)
}

fn check_file(path: &Path, config: &EngineConfig) -> CliResult {
    let program = read_program(path)?;
    calcprog::validate_program_with(&program, config)?;
    println!("✓ {} is a valid program", path.display());
    Ok(())
}

fn run_file(path: &Path, trace: bool, config: &EngineConfig) -> CliResult {
    let program = read_program(path)?;
    let result = calcprog::run_program_traced(&program, config);

    if let Err(RunError::Step { index, source, .. }) = &result {
        let step_source = program.steps[*index]
            .expression
            .as_ref()
            .and_then(|expr| match expr {
                calcprog::program::StepExpression::Stored(stored) => Some(stored.source.as_str()),
                calcprog::program::StepExpression::Tree(_) => None,
            });
        if let Some(step_source) = step_source {
            report_error(&format!("step {index}"), step_source, source)?;
            std::process::exit(1);
        }
    }

    let run = result?;
    if trace {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&run.outputs)?);
    }
    Ok(())
}

fn repl(config: EngineConfig) -> CliResult {
    let mut repl = calcprog::repl::Repl::new(config)?;
    repl.run()?;
    Ok(())
}
