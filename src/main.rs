//! StepRunner CLI Entry Point
//!
//! Provides a command-line interface for editing and running workflows.
//!
//! # Usage
//!
//! ```bash
//! # Execute a workflow
//! steprunner run health-check.yaml
//!
//! # Check a definition without running it
//! steprunner validate health-check.yaml
//!
//! # Start a new workflow file
//! steprunner create health-check.yaml "Health Check" --description "Ping the API"
//!
//! # Add a step at position 2, then change it
//! steprunner add-step health-check.yaml delay seconds=1.5 --position 2
//! steprunner edit-step health-check.yaml 2 delay seconds=0.5
//!
//! # Reorder and delete steps
//! steprunner move-up health-check.yaml 3
//! steprunner remove-step health-check.yaml 1
//!
//! # Show recorded runs
//! steprunner history health-check.yaml --state-dir /var/lib/steprunner
//!
//! # Delete the workflow file and its runs
//! steprunner delete health-check.yaml
//! ```

use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use log::{error, info, warn};
use serde_json::Value;

use steprunner::execution::{ExecutorRegistry, RunnerConfig, WorkflowRunner};
use steprunner::ledger::{
    format_entry, render_run, FileStore, LogEntry, LogLevel, Run, RunStatus, RunStore,
    DEFAULT_STATE_DIR,
};
use steprunner::workflow::validator::{validate_details, validate_position, validate_step};
use steprunner::workflow::{
    load_workflow, save_workflow, validate_workflow, Step, StepConfig, StepId, StepKind,
    ValidationError, Workflow, WorkflowError,
};
use steprunner::{APP_NAME, VERSION};

/// Subcommand selected on the command line.
#[derive(Debug, PartialEq)]
enum Command {
    Run,
    Validate,
    Create(String),
    Rename(String),
    AddStep {
        kind: String,
        pairs: Vec<String>,
    },
    EditStep {
        position: u32,
        kind: String,
        pairs: Vec<String>,
    },
    MoveUp(u32),
    MoveDown(u32),
    RemoveStep(u32),
    Show,
    History,
    Delete,
}

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    command: Command,
    workflow_path: String,
    position: Option<u32>,
    description: Option<String>,
    state_dir: PathBuf,
    runner: RunnerConfig,
    verbose: bool,
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME, VERSION);
    println!("Sequential Workflow Runner");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: steprunner <COMMAND> <WORKFLOW_FILE> [ARGS] [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  run <FILE>                         Execute the workflow");
    println!("  validate <FILE>                    Check names, kinds and step configs");
    println!("  create <FILE> <NAME>               Write a new, empty workflow file");
    println!("  rename <FILE> <NAME>               Change the name (and --description)");
    println!("  add-step <FILE> <KIND> [KEY=VALUE]...");
    println!("                                     Add a step (--position N, default last)");
    println!("  edit-step <FILE> <POSITION> <KIND> [KEY=VALUE]...");
    println!("                                     Replace a step's kind and config");
    println!("  move-up <FILE> <POSITION>          Move a step one place earlier");
    println!("  move-down <FILE> <POSITION>        Move a step one place later");
    println!("  remove-step <FILE> <POSITION>      Delete a step");
    println!("  show <FILE>                        List the steps");
    println!("  history <FILE>                     List recorded runs");
    println!("  delete <FILE>                      Delete the workflow file and its runs");
    println!();
    println!("Options:");
    println!("  --position N        Insert position for add-step");
    println!("  --description TEXT  Description for create and rename");
    println!("  --state-dir PATH    Directory for run records (default: {})", DEFAULT_STATE_DIR);
    println!("  --max-delay SECS    Ceiling for delay steps (default: 2)");
    println!("  --http-timeout SECS Timeout for HTTP checks (default: 2)");
    println!("  --verify-tls        Verify TLS certificates of HTTP check targets");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Examples:");
    println!("  steprunner run health-check.yaml");
    println!("  steprunner add-step health-check.yaml http_check url=https://example.com");
    println!("  steprunner add-step health-check.yaml delay seconds=1 --position 1");
}

fn option_value<'a>(args: &'a [String], i: usize, name: &str) -> Result<&'a str, String> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires a value", name))
}

fn parse_seconds(raw: &str, name: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s >= 0.0)
        .ok_or_else(|| format!("Invalid {} value: {}", name, raw))
}

fn parse_position(raw: &str) -> Result<u32, String> {
    raw.parse()
        .map_err(|_| format!("Invalid position: {}", raw))
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut positional: Vec<String> = Vec::new();
    let mut position = None;
    let mut description = None;
    let mut state_dir = PathBuf::from(DEFAULT_STATE_DIR);
    let mut runner = RunnerConfig::default();
    let mut verbose = false;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--verbose" | "-v" => {
                verbose = true;
            }
            "--verify-tls" => {
                runner = runner.verify_tls(true);
            }
            "--position" => {
                i += 1;
                position = Some(parse_position(option_value(args, i, "--position")?)?);
            }
            "--description" => {
                i += 1;
                description = Some(option_value(args, i, "--description")?.to_string());
            }
            "--state-dir" => {
                i += 1;
                state_dir = PathBuf::from(option_value(args, i, "--state-dir")?);
            }
            "--max-delay" => {
                i += 1;
                let seconds = parse_seconds(option_value(args, i, "--max-delay")?, "--max-delay")?;
                runner = runner.max_delay_seconds(seconds);
            }
            "--http-timeout" => {
                i += 1;
                let raw = option_value(args, i, "--http-timeout")?;
                let timeout = Duration::try_from_secs_f64(parse_seconds(raw, "--http-timeout")?)
                    .map_err(|_| format!("Invalid --http-timeout value: {}", raw))?;
                runner = runner.http_timeout(timeout);
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => positional.push(arg.clone()),
        }
        i += 1;
    }

    let mut positional = positional.into_iter();
    let name = positional.next().ok_or("Missing command")?;
    let workflow_path = positional
        .next()
        .ok_or_else(|| format!("'{}' requires a workflow file", name))?;
    let rest: Vec<String> = positional.collect();

    let single_position = |rest: &[String]| -> Result<u32, String> {
        match rest {
            [raw] => parse_position(raw),
            _ => Err(format!("'{}' requires exactly one POSITION argument", name)),
        }
    };

    let command = match name.as_str() {
        "run" | "validate" | "show" | "history" | "delete" if !rest.is_empty() => {
            return Err(format!("Unexpected argument: {}", rest[0]));
        }
        "run" => Command::Run,
        "validate" => Command::Validate,
        "show" => Command::Show,
        "history" => Command::History,
        "delete" => Command::Delete,
        "create" | "rename" => {
            let workflow_name = match rest.as_slice() {
                [workflow_name] => workflow_name.clone(),
                _ => return Err(format!("'{}' requires exactly one NAME argument", name)),
            };
            if name == "create" {
                Command::Create(workflow_name)
            } else {
                Command::Rename(workflow_name)
            }
        }
        "add-step" => {
            let mut rest = rest.into_iter();
            let kind = rest.next().ok_or("'add-step' requires a step KIND")?;
            Command::AddStep {
                kind,
                pairs: rest.collect(),
            }
        }
        "edit-step" => {
            let mut rest = rest.into_iter();
            let position = parse_position(&rest.next().ok_or("'edit-step' requires a POSITION")?)?;
            let kind = rest.next().ok_or("'edit-step' requires a step KIND")?;
            Command::EditStep {
                position,
                kind,
                pairs: rest.collect(),
            }
        }
        "move-up" => Command::MoveUp(single_position(&rest)?),
        "move-down" => Command::MoveDown(single_position(&rest)?),
        "remove-step" => Command::RemoveStep(single_position(&rest)?),
        other => return Err(format!("Unknown command: {}", other)),
    };

    Ok(Config {
        command,
        workflow_path,
        position,
        description,
        state_dir,
        runner,
        verbose,
    })
}

/// Parses `KEY=VALUE` pairs into a step configuration.
///
/// Values that parse as JSON keep their type (`seconds=1.5` is a number);
/// anything else is stored as a string.
fn parse_config_pairs(pairs: &[String]) -> Result<StepConfig, String> {
    let mut config = StepConfig::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| format!("Expected KEY=VALUE, got: {}", pair))?;
        if key.trim().is_empty() {
            return Err(format!("Empty key in: {}", pair));
        }
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        config.insert(key.trim().to_string(), value);
    }
    Ok(config)
}

/// Resolves a 1-based position to the step id found there.
fn step_id_at(workflow: &Workflow, position: u32) -> Result<StepId, Box<dyn Error>> {
    workflow
        .step_at(position)
        .map(|step| step.id)
        .ok_or_else(|| WorkflowError::NoStepAtPosition(position).into())
}

/// Logs each validation error and fails if there were any.
fn reject_invalid(errors: Vec<ValidationError>, subject: &str) -> Result<(), Box<dyn Error>> {
    if errors.is_empty() {
        return Ok(());
    }
    for e in &errors {
        warn!("{}", e);
    }
    Err(format!("{} rejected with {} error(s)", subject, errors.len()).into())
}

/// Saves a changed workflow, assigning it an identity first if needed.
fn save_changes(workflow: &mut Workflow, path: &str) -> Result<(), Box<dyn Error>> {
    if workflow.ensure_id() {
        info!("Assigned workflow id {}", workflow.id);
    }
    save_workflow(workflow, path)
}

fn print_steps(workflow: &Workflow) {
    println!("{}", workflow.name.bold());
    if let Some(description) = &workflow.description {
        println!("{}", description);
    }
    println!();

    if workflow.is_empty() {
        println!("  (no steps)");
        return;
    }

    for step in workflow.steps() {
        let config = serde_json::to_string(&step.config).unwrap_or_default();
        println!("  {:>3}. {:<12} {}", step.position, step.kind.label(), config);
    }
}

fn print_entry(entry: &LogEntry, workflow: &Workflow) {
    let line = format_entry(entry, Some(workflow));
    match entry.level {
        LogLevel::Info => println!("{}", line),
        LogLevel::Warn => println!("{}", line.yellow()),
        LogLevel::Error => println!("{}", line.red()),
    }
}

fn status_text(run: &Run) -> colored::ColoredString {
    match run.status {
        RunStatus::Succeeded => run.status.label().green(),
        RunStatus::Failed => run.status.label().red(),
        _ => run.status.label().yellow(),
    }
}

fn open_store(config: &Config) -> Result<FileStore, Box<dyn Error>> {
    FileStore::open(&config.state_dir).map_err(|e| {
        format!(
            "Could not open run store at '{}': {}",
            config.state_dir.display(),
            e
        )
        .into()
    })
}

fn run_workflow(config: &Config, mut workflow: Workflow) -> Result<ExitCode, Box<dyn Error>> {
    if workflow.is_empty() {
        return Err("Cannot run a workflow with no steps. Add steps first.".into());
    }

    if workflow.ensure_id() {
        save_workflow(&workflow, &config.workflow_path)?;
        info!("Assigned workflow id {}", workflow.id);
    }

    let store = Arc::new(open_store(config)?);
    let registry = ExecutorRegistry::with_config(config.runner.clone());
    let runner = WorkflowRunner::new(registry, store.clone());

    info!("Running workflow '{}' ({} steps)", workflow.name, workflow.len());
    let run = runner.execute(&workflow)?;

    println!();
    for entry in store.logs(run.id)? {
        print_entry(&entry, &workflow);
    }
    println!();
    println!(
        "Run {} {} in {}",
        run.id,
        status_text(&run),
        run.formatted_duration()
    );

    Ok(if run.status == RunStatus::Succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn create_workflow(config: &Config, name: &str) -> Result<(), Box<dyn Error>> {
    if Path::new(&config.workflow_path).exists() {
        return Err(format!("'{}' already exists", config.workflow_path).into());
    }
    reject_invalid(
        validate_details(name, config.description.as_deref()),
        "Workflow",
    )?;

    let mut workflow = Workflow::new(name);
    workflow.update_details(name, config.description.clone());
    save_changes(&mut workflow, &config.workflow_path)?;
    info!("Created workflow '{}' in {}", workflow.name, config.workflow_path);
    print_steps(&workflow);
    Ok(())
}

fn delete_workflow(config: &Config, workflow: &Workflow) -> Result<(), Box<dyn Error>> {
    if !workflow.id.is_nil() {
        let store = open_store(config)?;
        let removed = store.delete_workflow_runs(workflow.id)?;
        info!("Deleted {} run(s) of '{}'", removed, workflow.name);
    }

    fs::remove_file(&config.workflow_path)?;
    println!("Deleted workflow '{}' ({})", workflow.name, config.workflow_path);
    Ok(())
}

fn show_history(config: &Config, workflow: &Workflow) -> Result<(), Box<dyn Error>> {
    if workflow.id.is_nil() {
        println!("No runs recorded for '{}'", workflow.name);
        return Ok(());
    }

    let store = open_store(config)?;
    let runs = store.runs_for_workflow(workflow.id)?;
    if runs.is_empty() {
        println!("No runs recorded for '{}'", workflow.name);
        return Ok(());
    }

    println!("{} run(s) of '{}':", runs.len(), workflow.name);
    for run in &runs {
        println!(
            "  {}  {:<10}  {}  {}",
            run.id,
            status_text(run),
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            run.formatted_duration()
        );
    }

    let latest = &runs[0];
    let entries = store.logs(latest.id)?;
    print!("{}", render_run(latest, &entries, Some(workflow)));
    Ok(())
}

/// Main application entry point.
fn run() -> Result<ExitCode, Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);
    print_banner();

    if let Command::Create(name) = &config.command {
        create_workflow(&config, name)?;
        return Ok(ExitCode::SUCCESS);
    }

    info!("Loading workflow: {}", config.workflow_path);
    let mut workflow = load_workflow(&config.workflow_path).map_err(|e| {
        error!("Failed to load workflow: {}", e);
        format!(
            "Could not load workflow from '{}': {}",
            config.workflow_path, e
        )
    })?;

    match &config.command {
        Command::Run => return run_workflow(&config, workflow),
        Command::Validate => match validate_workflow(&workflow) {
            Ok(()) => println!("{} '{}' is valid", "OK".green(), workflow.name),
            Err(errors) => {
                for e in &errors {
                    println!("  {} {}", "-".red(), e);
                }
                return Err(format!("Workflow has {} validation error(s)", errors.len()).into());
            }
        },
        Command::Create(_) => {}
        Command::Rename(name) => {
            let description = config
                .description
                .clone()
                .or_else(|| workflow.description.clone());
            reject_invalid(validate_details(name, description.as_deref()), "Workflow")?;

            workflow.update_details(name.as_str(), description);
            save_changes(&mut workflow, &config.workflow_path)?;
            print_steps(&workflow);
        }
        Command::AddStep { kind, pairs } => {
            let kind = StepKind::from(kind.as_str());
            let step_config = parse_config_pairs(pairs)?;

            let mut errors = validate_step(&kind, &step_config);
            errors.extend(validate_position(config.position));
            reject_invalid(errors, "Step")?;

            let step = Step::new(kind).with_config_map(step_config);
            workflow.insert_step(step, config.position)?;
            save_changes(&mut workflow, &config.workflow_path)?;
            print_steps(&workflow);
        }
        Command::EditStep {
            position,
            kind,
            pairs,
        } => {
            let id = step_id_at(&workflow, *position)?;
            let kind = StepKind::from(kind.as_str());
            let step_config = parse_config_pairs(pairs)?;
            reject_invalid(validate_step(&kind, &step_config), "Step")?;

            workflow.update_step(id, kind, step_config)?;
            save_changes(&mut workflow, &config.workflow_path)?;
            print_steps(&workflow);
        }
        Command::MoveUp(position) => {
            let id = step_id_at(&workflow, *position)?;
            if !workflow.move_up(id)? {
                info!("Step {} is already first", position);
            }
            save_changes(&mut workflow, &config.workflow_path)?;
            print_steps(&workflow);
        }
        Command::MoveDown(position) => {
            let id = step_id_at(&workflow, *position)?;
            if !workflow.move_down(id)? {
                info!("Step {} is already last", position);
            }
            save_changes(&mut workflow, &config.workflow_path)?;
            print_steps(&workflow);
        }
        Command::RemoveStep(position) => {
            let id = step_id_at(&workflow, *position)?;
            let removed = workflow.remove_step(id)?;
            info!("Removed {} step from position {}", removed.kind, position);
            save_changes(&mut workflow, &config.workflow_path)?;
            print_steps(&workflow);
        }
        Command::Show => print_steps(&workflow),
        Command::History => show_history(&config, &workflow)?,
        Command::Delete => delete_workflow(&config, &workflow)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
