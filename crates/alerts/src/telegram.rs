//! Telegram bot handlers.

use crate::commands::{Command, CommandContext, CommandRouter, WELCOME_MESSAGE};
use crate::db::Database;
use buyalert_core::DestinationId;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, User};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
}

/// Telegram front-end: receives updates and replies through the command router.
pub struct TelegramBot {
    bot: Bot,
    router: CommandRouter<Database>,
}

impl TelegramBot {
    /// Create a new bot with the given token.
    pub fn new(token: &str, db: Database) -> Self {
        Self {
            bot: Bot::new(token),
            router: CommandRouter::new(db),
        }
    }

    /// Get the underlying bot for sending messages.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Run the update dispatcher until Ctrl+C.
    pub async fn run(self: Arc<Self>) {
        let bot = self.bot.clone();
        let commands = Arc::clone(&self);
        let members = Arc::clone(&self);

        let handler = Update::filter_message()
            .branch(dptree::entry().filter_command::<Command>().endpoint(
                move |bot: Bot, msg: Message, cmd: Command| {
                    let this = Arc::clone(&commands);
                    async move { this.handle_command(bot, msg, cmd).await }
                },
            ))
            .branch(
                dptree::filter(|msg: Message| msg.new_chat_members().is_some()).endpoint(
                    move |bot: Bot, msg: Message| {
                        let this = Arc::clone(&members);
                        async move { this.handle_new_members(bot, msg).await }
                    },
                ),
            );

        info!("Starting Telegram dispatcher");
        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    async fn handle_command(
        &self,
        bot: Bot,
        msg: Message,
        cmd: Command,
    ) -> Result<(), TelegramError> {
        let is_group = msg.chat.is_group() || msg.chat.is_supergroup();

        // Only /setup is restricted, so only it pays for the lookup
        let is_admin = match (&cmd, is_group, msg.from.as_ref()) {
            (Command::Setup(_), true, Some(user)) => self.is_admin(&bot, msg.chat.id, user).await,
            (Command::Setup(_), true, None) => false,
            _ => true,
        };

        let ctx = CommandContext {
            destination_id: DestinationId::from(msg.chat.id.0),
            is_group,
            is_admin,
        };

        let reply = self.router.handle(&ctx, cmd).await;
        bot.send_message(msg.chat.id, reply)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn is_admin(&self, bot: &Bot, chat_id: ChatId, user: &User) -> bool {
        match bot.get_chat_member(chat_id, user.id).await {
            Ok(member) => member.kind.is_privileged(),
            Err(e) => {
                warn!(chat = %chat_id, user = %user.id, error = %e, "Failed to check admin status");
                false
            }
        }
    }

    async fn handle_new_members(&self, bot: Bot, msg: Message) -> Result<(), TelegramError> {
        let me = bot.get_me().await?;
        let added = msg
            .new_chat_members()
            .is_some_and(|members| members.iter().any(|m| m.id == me.id));

        if added {
            info!(chat = %msg.chat.id, "Added to a new group");
            bot.send_message(msg.chat.id, WELCOME_MESSAGE)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Ok(())
    }
}
