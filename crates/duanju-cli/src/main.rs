mod cli;

use clap::Parser;
use duanju_core::config::AppConfig;
use duanju_core::error::CoreError;
use duanju_core::DuanjuPlugin;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

const DEFAULT_LOG_FILTER: &str = "duanju=info,duanju_api=info,duanju_core=info";

#[tokio::main]
async fn main() -> Result<(), CoreError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    tracing::debug!(path = ?cli.config, base_url = %config.api.base_url, "config loaded");

    let plugin = DuanjuPlugin::initialize(&config)?;
    let result = run(&plugin, &config, cli.command).await;
    plugin.terminate();
    result
}

async fn run(
    plugin: &DuanjuPlugin,
    config: &AppConfig,
    command: Commands,
) -> Result<(), CoreError> {
    match command {
        Commands::Say { text } => say(plugin, &text.join(" ")).await,
        Commands::Tool { name, args } => {
            let arguments = match args.as_deref() {
                Some(raw) => serde_json::from_str(raw)
                    .map_err(|e| CoreError::Config(format!("--args is not valid JSON: {e}")))?,
                None => Value::Null,
            };
            println!("{}", plugin.handle_tool_call(&name, &arguments).await);
        }
        Commands::Tools => {
            let defs = serde_json::to_string_pretty(plugin.tool_definitions())
                .map_err(|e| CoreError::Config(e.to_string()))?;
            println!("{defs}");
        }
        Commands::Commands => print_commands(plugin),
        Commands::InitConfig => init_config(config)?,
        Commands::Shell => {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let line = line.trim();
                match line {
                    "" => continue,
                    "help" | "帮助" => print_commands(plugin),
                    _ => say(plugin, line).await,
                }
            }
        }
    }
    Ok(())
}

fn init_config(config: &AppConfig) -> Result<(), CoreError> {
    config.save()?;
    println!("{}", AppConfig::config_path().display());
    Ok(())
}

async fn say(plugin: &DuanjuPlugin, text: &str) {
    match plugin.handle_message(text).await {
        Some(replies) => {
            for reply in replies {
                println!("{}\n", reply.text());
            }
        }
        None => println!("未知命令，输入 help 查看可用命令\n"),
    }
}

fn print_commands(plugin: &DuanjuPlugin) {
    for spec in plugin.command_specs() {
        println!(
            "{:<24} {}  (别名: {})",
            spec.usage,
            spec.description,
            spec.aliases.join(", ")
        );
    }
}
