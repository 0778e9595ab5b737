//! Notification dispatch: actually sends summaries to configured channels.
//! Supports: Telegram Bot API, generic HTTP webhook (Discord / Slack compatible).

use std::time::Duration;

use supakeeper_core::{KeeperConfig, KeeperError, Result};

use crate::notify::{Notification, NotifyLevel};

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Notification target configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyTarget {
    /// Telegram Bot API: send via `sendMessage`.
    Telegram {
        bot_token: String,
        chat_id: String,
        /// Bot API root, `https://api.telegram.org` outside of tests.
        api_base: String,
    },
    /// Generic HTTP webhook: POST with a Discord embed plus Slack `text`.
    Webhook { url: String },
}

impl NotifyTarget {
    pub fn telegram(bot_token: &str, chat_id: &str) -> Self {
        NotifyTarget::Telegram {
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NotifyTarget::Telegram { .. } => "telegram",
            NotifyTarget::Webhook { .. } => "webhook",
        }
    }
}

/// Dispatch a notification to a target channel.
pub async fn dispatch(client: &reqwest::Client, notification: &Notification, target: &NotifyTarget) -> Result<()> {
    match target {
        NotifyTarget::Telegram { bot_token, chat_id, api_base } => {
            send_telegram(client, api_base, bot_token, chat_id, notification).await
        }
        NotifyTarget::Webhook { url } => send_webhook(client, url, notification).await,
    }
}

/// Send notification via Telegram Bot API.
async fn send_telegram(
    client: &reqwest::Client,
    api_base: &str,
    bot_token: &str,
    chat_id: &str,
    notification: &Notification,
) -> Result<()> {
    let url = format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), bot_token);

    let resp = client
        .post(&url)
        .json(&serde_json::json!({
            "chat_id": chat_id,
            "text": telegram_text(notification),
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        }))
        .timeout(SEND_TIMEOUT)
        .send()
        .await
        // The URL carries the bot token.
        .map_err(|e| KeeperError::Notify(format!("Telegram send failed: {}", e.without_url())))?;

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.unwrap_or_default();
    let ok = body.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);

    if status.is_success() && ok {
        tracing::info!("✅ Telegram notification sent: {}", notification.title);
        Ok(())
    } else {
        let description = body
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown error");
        Err(KeeperError::Notify(format!("Telegram API error {status}: {description}")))
    }
}

/// Send notification via generic HTTP webhook.
async fn send_webhook(client: &reqwest::Client, url: &str, notification: &Notification) -> Result<()> {
    let resp = client
        .post(url)
        .json(&webhook_payload(notification))
        .timeout(SEND_TIMEOUT)
        .send()
        .await
        .map_err(|e| KeeperError::Notify(format!("Webhook send failed: {}", e.without_url())))?;

    if resp.status().is_success() {
        tracing::info!("✅ Webhook notification sent: {}", notification.title);
        Ok(())
    } else {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(KeeperError::Notify(format!("Webhook error {status}: {body}")))
    }
}

/// Telegram Markdown message text.
pub fn telegram_text(notification: &Notification) -> String {
    format!(
        "*{}*\n\n{}\n\n_{}_",
        escape_markdown(&notification.title),
        escape_markdown(&notification.body),
        notification.formatted_time()
    )
}

/// Discord embed (also accepted by most webhook consumers) with a Slack `text` fallback.
pub fn webhook_payload(notification: &Notification) -> serde_json::Value {
    let color = match notification.level {
        NotifyLevel::Success => 0x57F287, // Green
        NotifyLevel::Failure => 0xED4245, // Red
    };
    serde_json::json!({
        "embeds": [{
            "title": notification.title,
            "description": notification.body,
            "color": color,
            "footer": { "text": format!("Supakeeper | {}", notification.formatted_time()) },
        }],
        "text": notification.headline,
    })
}

/// Escape Telegram MarkdownV1 special characters.
fn escape_markdown(s: &str) -> String {
    s.replace('_', "\\_")
        .replace('*', "\\*")
        .replace('[', "\\[")
        .replace('`', "\\`")
}

/// Build notify targets from the resolved config.
/// Telegram needs both token and chat id; a half-configured bot is ignored.
pub fn targets_from_config(config: &KeeperConfig) -> Vec<NotifyTarget> {
    let mut targets = Vec::new();

    if let (Some(token), Some(chat_id)) = (&config.telegram_bot_token, &config.telegram_chat_id) {
        targets.push(NotifyTarget::telegram(token, chat_id));
    }

    if let Some(url) = &config.webhook_url {
        targets.push(NotifyTarget::Webhook { url: url.clone() });
    }

    targets
}
