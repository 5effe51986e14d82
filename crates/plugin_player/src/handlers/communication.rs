//! # Communication Handler
//!
//! While manual chat routing is on the server no longer relays chat by
//! itself. Every chat line then comes through here and is forwarded to each
//! player in the format they picked with `/chatformat`.

use crate::chat::{ChatFormat, ChatJson, ChatRoster};
use crate::player::PlayerCache;
use paddock_event_system::{CommandContext, CommandError, EventError, PlayerChatEvent, RemoteClient};
use tracing::{debug, info};

pub const CHAT_USAGE: &str = "Usage: /chat [on/off]";
pub const CHAT_FORMAT_USAGE: &str = "Usage: /chatformat [text/json]";

/// Relays a chat line to every player. Does nothing unless routing is on.
pub async fn handle_chat(
    event: &PlayerChatEvent,
    client: &dyn RemoteClient,
    cache: &PlayerCache,
    roster: &ChatRoster,
) -> Result<bool, EventError> {
    if !roster.is_routing() {
        return Ok(false);
    }

    let nickname = match cache.nickname(&event.login) {
        Some(nickname) => nickname,
        None => client.get_player_info(&event.login).await?.nickname,
    };

    let message = ChatJson {
        login: Some(event.login.clone()),
        nickname: Some(nickname.clone()),
        clubtag: None,
        text: event.text.clone(),
    };
    let text_line = format!("{}$g$z: {}", nickname, event.text.trim());

    debug!("💬 Relaying chat from {}", event.login);
    roster.deliver(client, &message, &text_line).await?;
    Ok(true)
}

/// `/chat [on|off]`: toggles manual chat routing and reports the state.
pub async fn chat_command(ctx: &CommandContext, roster: &ChatRoster) -> Result<(), CommandError> {
    if ctx.args.len() > 1 {
        return ctx.reply(CHAT_USAGE).await;
    }

    match ctx.arg(0) {
        Some("on") => {
            ctx.client.chat_enable_manual_routing(true, false).await?;
            roster.set_routing(true);
            info!("💬 Chat routing enabled by {}", ctx.login);
        }
        Some("off") => {
            ctx.client.chat_enable_manual_routing(false, false).await?;
            roster.set_routing(false);
            info!("💬 Chat routing disabled by {}", ctx.login);
        }
        _ => {}
    }

    let state = if roster.is_routing() { "on" } else { "off" };
    ctx.reply(&format!("Chat is {}", state)).await
}

/// `/chatformat text|json`: picks how the invoking player receives chat.
pub async fn chat_format_command(
    ctx: &CommandContext,
    roster: &ChatRoster,
) -> Result<(), CommandError> {
    let format = match ctx.args.as_slice() {
        [format] => format.parse::<ChatFormat>().ok(),
        _ => None,
    };
    let Some(format) = format else {
        return ctx.reply(CHAT_FORMAT_USAGE).await;
    };

    if roster.set_format(&ctx.login, format) {
        ctx.reply(&format!("Chat format set to {}", format)).await
    } else {
        Ok(())
    }
}
