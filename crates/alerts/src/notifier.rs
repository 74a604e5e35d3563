//! Alert rendering and delivery.

use async_trait::async_trait;
use buyalert_core::{abbreviate_address, AlertPayload, DestinationId};
use buyalert_engine::{AlertSink, DeliveryError};
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::html;
use tracing::{debug, info};

/// Format `value` with `decimals` places and comma thousands separators.
pub fn format_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Render a buy alert as Telegram HTML.
pub fn format_buy_alert(payload: &AlertPayload) -> String {
    let symbol = html::escape(&payload.token_symbol);
    let holders = payload
        .holder_count
        .map(|h| format_thousands(h as f64, 0))
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "🗡🗡🗡🗡🗡🗡🗡🗡\n\n\
         👊 <b>{symbol} BUY</b> 👊\n\n\
         💸 <b>Spent:</b> ${:.2} ({:.4} {})\n\
         💰 <b>Bought:</b> {:.1}K {symbol} / {:.4}% of the supply\n\
         📊 <b>Price:</b> ${:.8}\n\
         🏦 <b>Market Cap:</b> ${}\n\
         💯 <b>Total supply:</b> {}\n\
         🦶 <b>Holders:</b> {holders}\n\n\
         🔗 <code>{}</code>\n\
         ⏰ {}\n\n\
         🗡🗡🗡🗡🗡🗡🗡🗡",
        payload.spent_quote,
        payload.spent_base,
        html::escape(&payload.base_currency),
        payload.bought_amount / 1000.0,
        payload.supply_percentage,
        payload.price_usd,
        format_thousands(payload.market_cap, 2),
        format_thousands(payload.total_supply as f64, 0),
        html::escape(&abbreviate_address(&payload.event_hash)),
        payload.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

/// Sends alerts to Telegram chats. The destination id is the chat id.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl AlertSink for TelegramNotifier {
    async fn notify(
        &self,
        destination_id: &DestinationId,
        payload: &AlertPayload,
    ) -> Result<(), DeliveryError> {
        let chat_id: i64 = destination_id.as_str().parse().map_err(|_| {
            DeliveryError::Rejected(format!("Invalid chat id: {destination_id}"))
        })?;

        self.bot
            .send_message(ChatId(chat_id), format_buy_alert(payload))
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| DeliveryError::Rejected(e.to_string()))?;

        debug!(destination = %destination_id, tx_hash = %payload.event_hash, "Alert delivered");
        Ok(())
    }
}

/// Logs rendered alerts instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn notify(
        &self,
        destination_id: &DestinationId,
        payload: &AlertPayload,
    ) -> Result<(), DeliveryError> {
        info!(
            destination = %destination_id,
            tx_hash = %payload.event_hash,
            message = %format_buy_alert(payload),
            "Dry run alert"
        );
        Ok(())
    }
}
