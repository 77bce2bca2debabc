//! lattice-cli: CLI entry point for the Lattice code-graph engine.
//!
//! Exit codes: 0 success, 1 invalid arguments, 2 no graph.

mod visualize;

use clap::{Parser, Subcommand};
use colored::Colorize;
use lattice_core::{ChangeKind, LatticeConfig};
use lattice_engine::persistence::SnapshotStore;
use lattice_engine::Engine;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "lattice", about = "Incremental code-graph engine for coding assistants")]
#[command(version, propagate_version = true)]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Emit raw JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the project and build (or refresh) the graph
    Scan,

    /// Who calls/imports/inherits this entity?
    Callers { name: String },

    /// What does this entity call/import/inherit?
    Callees { name: String },

    /// Forward file dependencies
    Deps { file: String },

    /// Reverse file dependencies
    Rdeps { file: String },

    /// All entities in a file
    File { file: String },

    /// Full detail for an entity
    Entity { name: String },

    /// Impact analysis: files affected by a change
    Impact {
        file: String,
        /// Restrict to one changed name
        name: Option<String>,
    },

    /// Dead code detection
    Dead,

    /// Shortest dependency path between two entities
    Path { source: String, target: String },

    /// Regex entity search
    Search { pattern: String },

    /// Circular file dependencies
    Cycles,

    /// Module exports (explicit marker or top-level fallback)
    Exports { file: String },

    /// Graph and resolution statistics
    Stats,

    /// Mermaid dependency diagram for a file
    Visualize { file: String },

    /// Architecture overview
    Summary,

    /// Process a host hook payload from stdin
    Hook,

    /// Apply one file change (delete with --delete)
    Update {
        file: String,
        #[arg(long)]
        delete: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap help/version requests are not argument errors.
            if err.use_stderr() {
                eprintln!("{err}");
                return ExitCode::from(1);
            }
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
    };

    let project = cli
        .project
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let store = SnapshotStore::for_project(&project);
    let config = LatticeConfig::load_or_default();

    match run(cli, project, store, config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err}", "error:".red());
            ExitCode::from(1)
        }
    }
}

fn run(
    cli: Cli,
    project: PathBuf,
    store: SnapshotStore,
    config: LatticeConfig,
) -> Result<ExitCode, lattice_core::LatticeError> {
    // Commands that build state work without an existing graph.
    match &cli.command {
        Commands::Scan => {
            let mut engine = Engine::with_store(config, store);
            let report = engine.scan_project(&project)?;
            engine.shutdown();
            println!(
                "{} {} files indexed ({} seen{})",
                "scanned:".green(),
                report.files_indexed,
                report.files_seen,
                if report.truncated { ", truncated" } else { "" }
            );
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Hook => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            let mut engine = Engine::with_store(config, store);
            let response = match lattice_hooks::parse_payload(&input) {
                Ok(payload) => lattice_hooks::dispatch(&mut engine, payload),
                Err(err) => {
                    println!(
                        "{}",
                        serde_json::json!({"status": "error", "message": err.to_string()})
                    );
                    return Ok(ExitCode::SUCCESS);
                }
            };
            if !engine.is_closed() {
                engine.shutdown();
            }
            println!("{}", serde_json::to_string(&response)?);
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Update { file, delete } => {
            let mut engine = Engine::with_store(config, store);
            let report = if *delete {
                engine.process_change(file, None, ChangeKind::Delete)?
            } else {
                let absolute = project.join(file);
                match std::fs::read_to_string(&absolute) {
                    Ok(text) => engine.process_change(file, Some(&text), ChangeKind::Edit)?,
                    // A missing file on edit is a delete.
                    Err(_) => engine.process_change(file, None, ChangeKind::Delete)?,
                }
            };
            engine.shutdown();
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    if !store.exists() {
        eprintln!(
            "{} no graph for {} — run `lattice scan` first",
            "error:".red(),
            project.display()
        );
        return Ok(ExitCode::from(2));
    }
    let engine = Engine::with_store(config, store);

    let (command, args): (&str, Vec<String>) = match &cli.command {
        Commands::Callers { name } => ("callers", vec![name.clone()]),
        Commands::Callees { name } => ("callees", vec![name.clone()]),
        Commands::Deps { file } => ("deps", vec![file.clone()]),
        Commands::Rdeps { file } => ("rdeps", vec![file.clone()]),
        Commands::File { file } => ("file", vec![file.clone()]),
        Commands::Entity { name } => ("entity", vec![name.clone()]),
        Commands::Impact { file, name } => {
            let mut args = vec![file.clone()];
            if let Some(name) = name {
                args.push(name.clone());
            }
            ("impact", args)
        }
        Commands::Dead => ("dead", vec![]),
        Commands::Path { source, target } => ("path", vec![source.clone(), target.clone()]),
        Commands::Search { pattern } => ("search", vec![pattern.clone()]),
        Commands::Cycles => ("cycles", vec![]),
        Commands::Exports { file } => ("exports", vec![file.clone()]),
        Commands::Stats => ("stats", vec![]),
        Commands::Summary => ("summary", vec![]),
        Commands::Visualize { file } => {
            println!("{}", visualize::mermaid_for_file(engine.graph(), file));
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Scan | Commands::Hook | Commands::Update { .. } => unreachable!(),
    };

    let value = engine.query(command, &args)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_human(command, &value);
    }
    Ok(ExitCode::SUCCESS)
}

/// Human-readable rendering for the common result shapes.
fn print_human(command: &str, value: &serde_json::Value) {
    match command {
        "callers" | "callees" | "entity" => {
            if value["found"] != true {
                println!("{} no entity matched '{}'", "miss:".yellow(), value["query"]);
                return;
            }
            for node in value["nodes"].as_array().into_iter().flatten() {
                println!(
                    "{} {} ({}:{})",
                    node["node"]["entity_type"].as_str().unwrap_or("?").cyan(),
                    node["node"]["name"].as_str().unwrap_or("?").bold(),
                    node["node"]["file_path"].as_str().unwrap_or("?"),
                    node["node"]["line_start"]
                );
                for edge in node["edges"].as_array().into_iter().flatten() {
                    let arrow = if command == "callees" { "-->" } else { "<--" };
                    println!(
                        "  {}{}{} {} [{}]",
                        arrow,
                        edge["kind"].as_str().unwrap_or("?"),
                        arrow,
                        edge["other_name"].as_str().unwrap_or("?"),
                        edge["confidence"].as_str().unwrap_or("?")
                    );
                }
            }
        }
        "deps" | "rdeps" | "impact" | "exports" => {
            let items = value.as_array().cloned().unwrap_or_default();
            if items.is_empty() {
                println!("(none)");
            }
            for item in items {
                println!("{}", item.as_str().unwrap_or("?"));
            }
        }
        "dead" | "file" | "search" => {
            let items = value.as_array().cloned().unwrap_or_default();
            if items.is_empty() {
                println!("(none)");
            }
            for item in items {
                println!(
                    "{:10} {:40} {}:{}",
                    item["entity_type"].as_str().unwrap_or("?"),
                    item["name"].as_str().unwrap_or("?"),
                    item["file_path"].as_str().unwrap_or("?"),
                    item["line_start"]
                );
            }
        }
        "path" => match value.as_array() {
            Some(path) => {
                let rendered: Vec<&str> = path.iter().filter_map(|p| p.as_str()).collect();
                println!("{}", rendered.join(" -> "));
            }
            None => println!("no path found"),
        },
        "cycles" => {
            let cycles = value.as_array().cloned().unwrap_or_default();
            if cycles.is_empty() {
                println!("no cycles");
            }
            for cycle in cycles {
                let files: Vec<&str> = cycle
                    .as_array()
                    .into_iter()
                    .flatten()
                    .filter_map(|f| f.as_str())
                    .collect();
                println!("{} {}", "cycle:".red(), files.join(" <-> "));
            }
        }
        _ => {
            println!(
                "{}",
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            );
        }
    }
}
