//! Bot commands and their transport-independent handling.

use crate::config::{parse_setup_args, SetupError, SETUP_EXAMPLE};
use crate::db::Database;
use crate::notifier::format_thousands;
use async_trait::async_trait;
use buyalert_core::{abbreviate_address, DestinationConfig, DestinationId};
use buyalert_engine::StoreResult;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html;
use tracing::{error, info};

/// Bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Show the welcome message")]
    Start,
    #[command(description = "Show help")]
    Help,
    #[command(description = "Configure monitoring. Usage: /setup ADDRESS SYMBOL DEX SUPPLY THRESHOLD")]
    Setup(String),
    #[command(description = "Show current configuration")]
    Status,
    #[command(description = "Pause alerts")]
    Pause,
    #[command(description = "Resume alerts")]
    Resume,
    #[command(description = "Show how to change the configuration")]
    Edit,
}

/// Where a command came from.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub destination_id: DestinationId,
    /// Group or supergroup chat.
    pub is_group: bool,
    /// Sender is an administrator or the creator of the chat.
    pub is_admin: bool,
}

/// Write side of the destination registry.
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn save_destination(&self, config: &DestinationConfig) -> StoreResult<()>;

    async fn get_destination(
        &self,
        destination_id: &DestinationId,
    ) -> StoreResult<Option<DestinationConfig>>;

    /// Returns false when the destination is unknown.
    async fn set_active(&self, destination_id: &DestinationId, active: bool) -> StoreResult<bool>;
}

#[async_trait]
impl Registrar for Database {
    async fn save_destination(&self, config: &DestinationConfig) -> StoreResult<()> {
        Ok(Database::save_destination(self, config).await?)
    }

    async fn get_destination(
        &self,
        destination_id: &DestinationId,
    ) -> StoreResult<Option<DestinationConfig>> {
        Ok(Database::get_destination(self, destination_id).await?)
    }

    async fn set_active(&self, destination_id: &DestinationId, active: bool) -> StoreResult<bool> {
        Ok(Database::set_active(self, destination_id, active).await?)
    }
}

pub const START_MESSAGE: &str = "🤖 <b>Starknet Token Alert Bot</b>\n\n\
    I monitor token purchases on Starknet and post buy alerts in this chat.\n\n\
    <b>Commands:</b>\n\
    • /setup - Configure monitoring in one command\n\
    • /status - Show current configuration\n\
    • /pause - Pause alerts\n\
    • /resume - Resume alerts\n\
    • /edit - Edit configuration\n\n\
    <b>Setup format:</b>\n\
    <code>/setup TOKEN_ADDRESS SYMBOL DEX SUPPLY THRESHOLD</code>";

pub const WELCOME_MESSAGE: &str = "🎉 Thanks for adding me to this group!\n\n\
    I watch a Starknet token and post an alert here for every buy above your threshold.\n\n\
    To get started, an admin should run:\n\
    <code>/setup TOKEN_ADDRESS SYMBOL DEX SUPPLY THRESHOLD</code>\n\n\
    Type /help to see all commands.";

const SETUP_PARAMS: &str = "<b>Parameters:</b>\n\
    • TOKEN_ADDRESS: token contract address on Starknet\n\
    • SYMBOL: token symbol (e.g. ETH, USDC)\n\
    • DEX: trading venue (Ekubo, JediSwap, ...)\n\
    • SUPPLY: total token supply\n\
    • THRESHOLD: minimum buy in USD (0 for all buys)";

/// Maps commands to registry operations and reply texts (HTML).
pub struct CommandRouter<R: Registrar> {
    registrar: R,
}

impl<R: Registrar> CommandRouter<R> {
    pub fn new(registrar: R) -> Self {
        Self { registrar }
    }

    pub fn registrar(&self) -> &R {
        &self.registrar
    }

    /// Handle one command and return the reply.
    pub async fn handle(&self, ctx: &CommandContext, cmd: Command) -> String {
        let result = match cmd {
            Command::Start => Ok(START_MESSAGE.to_string()),
            Command::Help => Ok(help_message()),
            Command::Setup(args) => self.setup(ctx, &args).await,
            Command::Status => self.status(ctx).await,
            Command::Pause => self.toggle(ctx, false).await,
            Command::Resume => self.toggle(ctx, true).await,
            Command::Edit => Ok("🔧 To edit your configuration, run /setup again.\n\n\
                 <b>Format:</b> <code>/setup TOKEN_ADDRESS SYMBOL DEX SUPPLY THRESHOLD</code>"
                .to_string()),
        };

        result.unwrap_or_else(|e| {
            error!(destination = %ctx.destination_id, error = %e, "Command failed");
            "❌ Something went wrong. Please try again.".to_string()
        })
    }

    async fn setup(&self, ctx: &CommandContext, args: &str) -> StoreResult<String> {
        if ctx.is_group && !ctx.is_admin {
            return Ok("❌ Only group admins can setup the bot.".to_string());
        }

        let config = match parse_setup_args(ctx.destination_id.clone(), args) {
            Ok(config) => config,
            Err(SetupError::MissingArgs(_)) => return Ok(setup_usage()),
            Err(e) => {
                return Ok(format!(
                    "❌ <b>Error:</b> {}\n\nPlease check your inputs and try again.",
                    html::escape(&e.to_string())
                ))
            }
        };

        self.registrar.save_destination(&config).await?;
        info!(
            destination = %config.destination_id,
            token = %config.token_symbol,
            venue = %config.venue_name,
            threshold = config.min_buy_threshold,
            "Destination configured"
        );

        Ok(format!(
            "🎉 <b>Setup Complete!</b>\n\n\
             Your token monitoring is now active:\n\n\
             {}\n\n\
             I'll post buy alerts here! 🚀\n\n\
             <b>Commands:</b>\n\
             • /status - View current config\n\
             • /pause - Pause alerts\n\
             • /resume - Resume alerts\n\
             • /setup - Change config",
            config_summary(&config)
        ))
    }

    async fn status(&self, ctx: &CommandContext) -> StoreResult<String> {
        let Some(config) = self.registrar.get_destination(&ctx.destination_id).await? else {
            return Ok("❌ No configuration found. Use /setup to configure monitoring.".to_string());
        };

        let (icon, label) = if config.is_active {
            ("✅", "Active")
        } else {
            ("⏸️", "Paused")
        };

        Ok(format!(
            "{icon} <b>Bot Status: {label}</b>\n\n\
             {}\n\n\
             Use /pause or /resume to control alerts.\n\
             Use /edit to modify configuration.",
            config_summary(&config)
        ))
    }

    async fn toggle(&self, ctx: &CommandContext, active: bool) -> StoreResult<String> {
        if !self.registrar.set_active(&ctx.destination_id, active).await? {
            return Ok("❌ No configuration found. Use /setup to configure monitoring.".to_string());
        }
        info!(destination = %ctx.destination_id, active, "Destination toggled");
        Ok(if active {
            "▶️ Alerts resumed for this chat!".to_string()
        } else {
            "⏸️ Alerts paused for this chat.".to_string()
        })
    }
}

fn config_summary(config: &DestinationConfig) -> String {
    format!(
        "<b>Token:</b> {}\n\
         <b>Address:</b> <code>{}</code>\n\
         <b>DEX:</b> {}\n\
         <b>Total Supply:</b> {}\n\
         <b>Min. Threshold:</b> ${}\n\
         <b>Alert Frequency:</b> {}",
        html::escape(&config.token_symbol),
        html::escape(&abbreviate_address(&config.token_address)),
        html::escape(&config.venue_name),
        format_thousands(config.total_supply as f64, 0),
        config.min_buy_threshold,
        config.alert_frequency.label()
    )
}

fn setup_usage() -> String {
    format!(
        "❌ <b>Setup usage:</b>\n\
         <code>/setup TOKEN_ADDRESS SYMBOL DEX SUPPLY THRESHOLD</code>\n\n\
         {SETUP_PARAMS}\n\n\
         <b>Example:</b>\n<code>{SETUP_EXAMPLE}</code>"
    )
}

fn help_message() -> String {
    format!(
        "{}\n\n{SETUP_PARAMS}\n\n<b>Example:</b>\n<code>{SETUP_EXAMPLE}</code>\n\n\
         The bot watches buys in real time and posts an alert for every transaction \
         at or above your threshold.",
        html::escape(&Command::descriptions().to_string())
    )
}
