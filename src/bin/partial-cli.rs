use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use partial::config::load_config;
use partial::observability::logging;
use partial::routing::RouteTable;
use partial::template::compile;
use partial::{Framework, FrameworkConfig, HandlerResult};

#[derive(Parser)]
#[command(name = "partial-cli")]
#[command(about = "Inspect routes, render templates and fetch data", long_about = None)]
struct Cli {
    /// Framework configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the routes matching a path, in dispatch order
    Match {
        /// Route pattern, repeatable
        #[arg(short, long = "route", required = true)]
        routes: Vec<String>,
        path: String,
    },
    /// Render a template file against a JSON model file
    Render {
        template: PathBuf,
        model: PathBuf,
        /// JSON file for the wrapper regions
        #[arg(long)]
        repository: Option<PathBuf>,
    },
    /// GET a URL through the configured transport
    Fetch { url: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FrameworkConfig::default(),
    };
    logging::init(&config.observability);

    match cli.command {
        Commands::Match { routes, path } => {
            let mut table = RouteTable::new();
            for pattern in &routes {
                table.register(pattern, Arc::new(noop), Vec::new(), false)?;
            }

            let found = table.find(&path);
            let matches: Vec<Value> = found
                .routes
                .iter()
                .map(|route| {
                    json!({
                        "pattern": route.pattern(),
                        "priority": route.priority(),
                        "params": route.params(&found.tokens),
                    })
                })
                .collect();

            print_json(&json!({
                "path": path,
                "tokens": found.tokens,
                "matches": matches,
                "not_found": found.not_found,
            }))?;
        }
        Commands::Render {
            template,
            model,
            repository,
        } => {
            let compiled = compile(&fs::read_to_string(&template)?)?;
            let model = read_json(&model)?;
            let repository = repository.as_deref().map(read_json).transpose()?;
            println!("{}", compiled.render(&model, repository.as_ref()));
        }
        Commands::Fetch { url } => {
            let framework = Framework::new(config)?;
            let mut body = None;
            framework
                .get(&url, None, |value| body = Some(value.clone()))
                .await;

            match body {
                Some(value) => print_json(&value)?,
                None => {
                    let message = framework
                        .errors()
                        .last()
                        .map(|e| e.message.clone())
                        .unwrap_or_else(|| "no response".to_string());
                    eprintln!("Error: {}", message);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn noop(_: &Framework, _: &[String]) -> HandlerResult {
    Ok(())
}

fn read_json(path: &Path) -> Result<Value, Box<dyn Error>> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

fn print_json(value: &Value) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
