//! docket CLI
//!
//! Loads tool schemas, workflows and training configs once and reports on
//! them.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use docket_config::{ConfigLoader, training_defaults};
use docket_core::{parse_document, section};
use docket_plan::WorkflowGraph;
use docket_tool::SchemaRegistry;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docket")]
#[command(about = "docket - tool schemas, workflows and training configs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load tool schemas and check workflows against them
    CheckSchema {
        /// Path to JSON document
        #[arg(short, long)]
        file: PathBuf,
        /// JSON pointer to the tools section
        #[arg(long, default_value = "")]
        tools: String,
        /// JSON pointer to the workflows section
        #[arg(long)]
        workflows: Option<String>,
    },
    /// Load a training config and print the merged result
    CheckConfig {
        /// Path to JSON document
        #[arg(short, long)]
        file: PathBuf,
        /// Merge over an empty mapping instead of the built-in defaults
        #[arg(long)]
        no_defaults: bool,
    },
    /// Validate call arguments against a tool schema
    ValidateCall {
        /// Path to JSON document
        #[arg(short, long)]
        file: PathBuf,
        /// JSON pointer to the tools section
        #[arg(long, default_value = "")]
        tools: String,
        /// Tool name
        #[arg(long)]
        tool: String,
        /// Arguments as JSON text
        #[arg(long)]
        args: String,
    },
    /// Print the ordered steps of a workflow
    Steps {
        /// Path to JSON document
        #[arg(short, long)]
        file: PathBuf,
        /// JSON pointer to the workflows section
        #[arg(long, default_value = "")]
        workflows: String,
        /// Workflow name
        #[arg(long)]
        workflow: String,
    },
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docket=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ok = match cli.command {
        Commands::CheckSchema {
            file,
            tools,
            workflows,
        } => check_schema(&file, &tools, workflows.as_deref())?,
        Commands::CheckConfig { file, no_defaults } => check_config(&file, no_defaults)?,
        Commands::ValidateCall {
            file,
            tools,
            tool,
            args,
        } => validate_call(&file, &tools, &tool, &args)?,
        Commands::Steps {
            file,
            workflows,
            workflow,
        } => steps(&file, &workflows, &workflow)?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Read a JSON file
fn read_document(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    parse_document(&text).wrap_err_with(|| format!("failed to parse {}", path.display()))
}

fn load_registry(document: &Value, pointer: &str) -> Result<SchemaRegistry> {
    let tools = section(document, pointer)?;
    Ok(SchemaRegistry::load(tools)?)
}

fn check_schema(file: &Path, tools: &str, workflows: Option<&str>) -> Result<bool> {
    let document = read_document(file)?;
    let registry = load_registry(&document, tools)?;
    println!("{} tools loaded", registry.len());

    let Some(pointer) = workflows else {
        return Ok(true);
    };
    let graph = WorkflowGraph::load(section(&document, pointer)?)?;
    let resolution = graph.validate(&registry);
    for (name, missing) in &resolution {
        if missing.is_empty() {
            println!("ok {}", name);
        } else {
            println!("unresolved {}", name);
            for step in missing {
                println!("  {}", step);
            }
        }
    }
    Ok(docket_plan::is_resolved(&resolution))
}

fn check_config(file: &Path, no_defaults: bool) -> Result<bool> {
    let document = read_document(file)?;
    let defaults = if no_defaults {
        json!({})
    } else {
        training_defaults()
    };
    let config = ConfigLoader::new().load(&document, &defaults)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(true)
}

fn validate_call(file: &Path, tools: &str, tool: &str, args: &str) -> Result<bool> {
    let registry = load_registry(&read_document(file)?, tools)?;
    let arguments = parse_document(args).wrap_err("failed to parse --args")?;
    let violations = registry.validate_call(tool, &arguments)?;
    if violations.is_empty() {
        println!("valid");
    }
    for violation in &violations {
        println!("{}", violation);
    }
    Ok(violations.is_empty())
}

fn steps(file: &Path, workflows: &str, workflow: &str) -> Result<bool> {
    let document = read_document(file)?;
    let graph = WorkflowGraph::load(section(&document, workflows)?)?;
    for step in graph.steps(workflow)? {
        println!("{}", step);
    }
    Ok(true)
}
