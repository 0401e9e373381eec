use std::{
    env, io,
    path::{Path, PathBuf},
    process::exit,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lesion_adapters::{
    adapter::{lookup, Descriptor, CATALOGUE},
    config::{read_config, Config},
    contract::{Requirement, Value, Values},
    history::{self, RunRecord},
    RScriptRunner,
};
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lesion-adapters")]
#[command(about = "Run R lesion analysis routines as workflow steps", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file, defaults to the platform configuration directory
    #[arg(long, env = "LESION_ADAPTERS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the adapters with their parameters and results
    List,

    /// Print the script an adapter would run, without running it
    Render(InvocationArgs),

    /// Run an adapter and print the paths of its outputs
    Run(InvocationArgs),

    /// Show recent runs
    History {
        /// Number of runs to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Args)]
struct InvocationArgs {
    /// Adapter name, see `list`
    adapter: String,

    /// Inputs, e.g. t1=t1.nii.gz tissue=true cores=4
    #[arg(value_name = "NAME=VALUE")]
    inputs: Vec<String>,

    /// Directory relative paths resolve against and the script runs in
    #[arg(long)]
    workdir: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        error!("lesion-adapters did not complete");
        eprintln!("{:#}", err);

        exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::List => {
            list();
            Ok(())
        }
        Commands::Render(args) => render(&args),
        Commands::Run(args) => execute(&args, &load_config(cli.config.as_deref())?),
        Commands::History { limit } => show_history(&load_config(cli.config.as_deref())?, limit),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    read_config(path).context("unable to read configuration")
}

fn list() {
    for descriptor in CATALOGUE {
        println!("{}", descriptor.name);

        for parameter in descriptor.parameters {
            let requirement = match parameter.requirement {
                Requirement::Mandatory => "required".to_owned(),
                Requirement::Optional => "optional".to_owned(),
                Requirement::Default(literal) => format!("default {}", literal),
            };
            let existing = if parameter.must_exist { ", must exist" } else { "" };

            println!(
                "  {:<24}{:<9}{}{}",
                parameter.name, parameter.kind, requirement, existing
            );
        }

        for result in descriptor.results {
            let checked = if result.must_exist { "required" } else { "optional" };
            println!("  -> {:<21}{}", result.name, checked);
        }
    }
}

fn render(args: &InvocationArgs) -> Result<()> {
    let descriptor = find_adapter(&args.adapter)?;
    let mut adapter = descriptor.build(&working_directory(args)?)?;

    adapter.configure_values(parse_inputs(descriptor, &args.inputs)?)?;

    print!("{}", adapter.render_script()?);

    Ok(())
}

fn execute(args: &InvocationArgs, config: &Config) -> Result<()> {
    let descriptor = find_adapter(&args.adapter)?;
    let mut adapter = descriptor.build(&working_directory(args)?)?;

    adapter.configure_values(parse_inputs(descriptor, &args.inputs)?)?;

    let runner = RScriptRunner::from_config(&config.runner);
    let result = adapter.execute(&runner);

    let mut run = RunRecord::new(descriptor.name, adapter.state().as_str());
    run.exit_code = adapter.report().and_then(|report| report.exit_code);
    match &result {
        Ok(outputs) => {
            run.outputs = outputs
                .iter()
                .map(|(name, path)| (name.to_owned(), path.to_string_lossy().to_string()))
                .collect()
        }
        Err(err) => run.error = Some(err.to_string()),
    }

    if config.history.enabled {
        if let Err(err) = store_run(config, &run) {
            warn!("unable to record run {} in history: {}", run.id, err);
        }
    }

    let outputs = result?;
    info!("{} wrote {} outputs", descriptor.name, outputs.len());

    for (name, path) in outputs.iter() {
        println!("{}\t{}", name, path.display());
    }

    Ok(())
}

fn show_history(config: &Config, limit: usize) -> Result<()> {
    let connection =
        history::open(config.history.path.as_deref()).context("unable to open run history")?;

    for run in history::recent(&connection, limit)? {
        let exit_code = run
            .exit_code
            .map(|code| code.to_string())
            .unwrap_or_else(|| "-".to_owned());

        println!(
            "{}  {}  {:<26}{:<11}{}",
            run.recorded_at.as_deref().unwrap_or("-"),
            run.id,
            run.adapter,
            run.state,
            exit_code
        );

        if let Some(error) = &run.error {
            println!("    {}", error.lines().next().unwrap_or_default());
        }
        for (name, path) in &run.outputs {
            println!("    {} = {}", name, path);
        }
    }

    Ok(())
}

fn store_run(config: &Config, run: &RunRecord) -> Result<()> {
    let mut connection = history::open(config.history.path.as_deref())?;
    history::record(&mut connection, run)?;

    Ok(())
}

fn find_adapter(name: &str) -> Result<&'static Descriptor> {
    lookup(name).with_context(|| {
        let known: Vec<&str> = CATALOGUE.iter().map(|descriptor| descriptor.name).collect();
        format!(
            "unknown adapter \"{}\", expected one of: {}",
            name,
            known.join(", ")
        )
    })
}

fn working_directory(args: &InvocationArgs) -> Result<PathBuf> {
    match &args.workdir {
        Some(directory) => Ok(directory.clone()),
        None => env::current_dir().context("unable to determine the current directory"),
    }
}

/// Parse `NAME=VALUE` arguments using the declared kind of each parameter
fn parse_inputs(descriptor: &Descriptor, assignments: &[String]) -> Result<Values> {
    assignments
        .iter()
        .map(|assignment| {
            let (name, text) = assignment
                .split_once('=')
                .with_context(|| format!("expected NAME=VALUE, got \"{}\"", assignment))?;

            let parameter = descriptor.parameter(name).with_context(|| {
                format!("{} has no parameter \"{}\"", descriptor.name, name)
            })?;

            let value = Value::parse(parameter.kind, text)
                .with_context(|| format!("invalid value for \"{}\"", name))?;

            Ok((name.to_owned(), value))
        })
        .collect()
}
