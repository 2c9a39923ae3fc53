use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Terminal host for the short-drama catalog bot
#[derive(Parser)]
#[command(name = "duanju")]
#[command(about = "Search the short-drama catalog from chat commands or tool calls", long_about = None)]
pub struct Cli {
    /// Config file to use instead of the per-user one
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the catalog API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one chat command, e.g. `duanju say 搜索短剧 总裁`
    Say {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Dispatch one tool call
    Tool {
        /// Tool name, e.g. search_dramas
        name: String,
        /// Arguments as a JSON object
        #[arg(short, long)]
        args: Option<String>,
    },
    /// Print the tool definitions
    Tools,
    /// List chat commands and their aliases
    Commands,
    /// Read chat commands from stdin, one per line
    Shell,
    /// Write the effective config to the per-user config file
    InitConfig,
}
