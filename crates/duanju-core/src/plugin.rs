use duanju_api::Gateway;
use serde_json::Value;

use crate::commands::{self, CommandSpec, Reply, COMMANDS};
use crate::config::{AppConfig, DisplayConfig};
use crate::error::CoreError;
use crate::tools::{ToolDefinition, ToolRegistry};

/// The host-facing plugin.
///
/// Created by [`initialize`](Self::initialize), which acquires the HTTP
/// connection pool, and torn down by [`terminate`](Self::terminate), which
/// releases it. Everything in between borrows the plugin immutably.
pub struct DuanjuPlugin {
    gateway: Gateway,
    tools: ToolRegistry,
    display: DisplayConfig,
}

impl DuanjuPlugin {
    pub fn initialize(config: &AppConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let client = config.api.build_client()?;
        let plugin = Self::with_gateway(Gateway::new(client), config.display)?;
        tracing::info!(base_url = %config.api.base_url, "短剧搜索插件初始化完成");
        Ok(plugin)
    }

    pub fn with_gateway(gateway: Gateway, display: DisplayConfig) -> Result<Self, CoreError> {
        Ok(Self {
            gateway,
            tools: ToolRegistry::new()?,
            display,
        })
    }

    pub fn terminate(self) {
        drop(self);
        tracing::info!("短剧搜索插件已关闭");
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn command_specs(&self) -> &'static [CommandSpec] {
        COMMANDS
    }

    /// Handle a chat message. `None` when it addresses none of our commands.
    pub async fn handle_message(&self, text: &str) -> Option<Vec<Reply>> {
        let (spec, rest) = commands::resolve(text)?;
        let reply = match commands::parse(spec.command, rest) {
            Ok(invocation) => commands::run(&self.gateway, &self.display, &invocation).await,
            Err(e) => {
                tracing::debug!(command = spec.name, error = %e, "rejected command arguments");
                e.to_string()
            }
        };
        Some(vec![Reply::Plain(reply)])
    }

    pub fn tool_definitions(&self) -> &[ToolDefinition] {
        self.tools.definitions()
    }

    pub async fn handle_tool_call(&self, name: &str, arguments: &Value) -> String {
        self.tools.call(&self.gateway, name, arguments).await
    }
}
