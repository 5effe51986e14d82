//! Chat command implementations.

use crate::admins::AdminList;
use paddock_event_system::remote::decode;
use paddock_event_system::serde_json::{self, Value};
use paddock_event_system::{CommandContext, CommandError, RemoteError};
use serde::Deserialize;
use tracing::{debug, info};

pub const NO_ACCESS: &str = "You do not have access to this command";
pub const RUN_USAGE: &str = "Run - Usage: /run method [options..]";
pub const KICK_USAGE: &str = "Kick - Usage: /kick <login/nick>";
pub const ADD_ADMIN_USAGE: &str = "Usage: /addadmin <login>";
pub const NOTICE_USAGE: &str = "Usage: /notice <message>";

/// Server state as returned by `GetStatus`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ServerStatus {
    #[serde(rename = "Code")]
    pub code: i32,
    #[serde(rename = "Name")]
    pub name: String,
}

/// `Pong`, followed by the quoted arguments when there are any.
pub fn ping_message(args: &[String]) -> String {
    if args.is_empty() {
        return "Pong".to_string();
    }

    let quoted: Vec<String> = args.iter().map(|arg| format!("\"{}\"", arg)).collect();
    format!("Pong - {}", quoted.join(", "))
}

/// Interprets a `/run` argument as a boolean, then an integer, then a string.
pub fn coerce_arg(arg: &str) -> Value {
    if arg.eq_ignore_ascii_case("true") {
        Value::Bool(true)
    } else if arg.eq_ignore_ascii_case("false") {
        Value::Bool(false)
    } else if let Ok(number) = arg.parse::<i32>() {
        Value::from(number)
    } else {
        Value::String(arg.to_string())
    }
}

/// Replies with [`NO_ACCESS`] and returns false unless the caller is an admin.
async fn require_admin(ctx: &CommandContext, admins: &AdminList) -> Result<bool, CommandError> {
    if admins.is_admin(&ctx.login) {
        return Ok(true);
    }

    debug!("🔑 {} tried /{} without admin rights", ctx.login, ctx.command);
    ctx.reply(NO_ACCESS).await?;
    Ok(false)
}

pub async fn ping(ctx: CommandContext) -> Result<(), CommandError> {
    ctx.reply(&ping_message(&ctx.args)).await
}

/// Lists every bound command with its aliases.
pub async fn help(ctx: CommandContext) -> Result<(), CommandError> {
    let lines: Vec<String> = ctx
        .registry()
        .all_commands()
        .iter()
        .map(|binding| {
            let aliases: Vec<&str> = binding.aliases().collect();
            if aliases.is_empty() {
                format!("- {}", binding.name())
            } else {
                format!("- {} ({})", binding.name(), aliases.join(", "))
            }
        })
        .collect();

    ctx.reply("All commands:").await?;
    for line in lines {
        ctx.reply(&line).await?;
    }
    Ok(())
}

pub async fn players(ctx: CommandContext) -> Result<(), CommandError> {
    let players = ctx.client.get_player_list(-1, 0, 1).await?;
    if players.is_empty() {
        return ctx.reply("No players online").await;
    }

    for player in players {
        ctx.reply(&format!("- {} - {}", player.login, player.nickname))
            .await?;
    }
    Ok(())
}

pub async fn status(ctx: CommandContext) -> Result<(), CommandError> {
    let status: ServerStatus = decode(ctx.client.call("GetStatus", Vec::new()).await?)?;
    ctx.reply(&format!("{} - {}", status.code, status.name)).await
}

/// `/run <method> [args..]`: calls an arbitrary remote method.
pub async fn run(ctx: CommandContext, admins: &AdminList) -> Result<(), CommandError> {
    if !require_admin(&ctx, admins).await? {
        return Ok(());
    }

    let Some((method, rest)) = ctx.args.split_first() else {
        return ctx.reply(RUN_USAGE).await;
    };
    let params: Vec<Value> = rest.iter().map(|arg| coerce_arg(arg)).collect();

    match ctx.client.call(method, params).await {
        Ok(result) => {
            info!("🔧 {} ran {}", ctx.login, method);
            ctx.reply(&format!("Run - {}", ctx.args.join(" "))).await?;
            let rendered = serde_json::to_string(&result).map_err(RemoteError::from)?;
            ctx.reply(&rendered).await
        }
        Err(RemoteError::Fault { code, message }) => {
            ctx.reply(&format!("Run - Fault - {}: {}", code, message)).await
        }
        Err(e) => Err(e.into()),
    }
}

/// `/kick <login|nick>`: kicks a player matched by login or nickname.
pub async fn kick(ctx: CommandContext, admins: &AdminList) -> Result<(), CommandError> {
    if !require_admin(&ctx, admins).await? {
        return Ok(());
    }

    let [target] = ctx.args.as_slice() else {
        return ctx.reply(KICK_USAGE).await;
    };

    let players = ctx.client.get_player_list(-1, 0, 1).await?;
    let Some(player) = players
        .iter()
        .find(|player| player.login == *target || player.nickname == *target)
    else {
        return ctx
            .reply(&format!("Kick - Unknown login/nick '{}'", target))
            .await;
    };

    match ctx.client.kick(&player.login, "").await {
        Ok(()) => {
            info!("🔧 {} kicked {}", ctx.login, player.login);
            ctx.reply(&format!("Kick - Kicked '{}'", target)).await
        }
        Err(RemoteError::Fault { message, .. }) => {
            debug!("Kick of {} refused: {}", player.login, message);
            ctx.reply(&format!("Kick - Could not kick '{}'", target)).await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn add_admin(ctx: CommandContext, admins: &AdminList) -> Result<(), CommandError> {
    if !require_admin(&ctx, admins).await? {
        return Ok(());
    }

    let [login] = ctx.args.as_slice() else {
        return ctx.reply(ADD_ADMIN_USAGE).await;
    };

    if admins.add(login) {
        ctx.reply(&format!("Added {} as an admin", login)).await
    } else {
        ctx.reply(&format!("{} is already an admin", login)).await
    }
}

/// `/notice <message>`: broadcasts a server message.
pub async fn notice(ctx: CommandContext, admins: &AdminList) -> Result<(), CommandError> {
    if !require_admin(&ctx, admins).await? {
        return Ok(());
    }

    if ctx.args.is_empty() {
        return ctx.reply(NOTICE_USAGE).await;
    }

    ctx.client
        .chat_send_server_message(ctx.args.join(" ").trim())
        .await?;
    Ok(())
}
