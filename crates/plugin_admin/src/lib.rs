//! # Admin Plugin
//!
//! Server administration from the in-game chat.
//!
//! Everyone can use `/ping`, `/help`, `/players` and `/status`. The commands
//! that act on the server (`/run`, `/kick`, `/addadmin` and `/notice`) are
//! limited to the logins in the plugin's [`AdminList`].

use paddock_event_system::{CommandContext, Plugin, PluginError, Registrar};
use std::sync::Arc;
use tracing::info;

pub mod admins;
pub mod commands;

pub use admins::AdminList;

pub struct AdminPlugin {
    name: String,
    admins: Arc<AdminList>,
}

impl AdminPlugin {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: "admin".to_string(),
            admins: Arc::new(AdminList::new(admins)),
        }
    }

    pub fn admins(&self) -> Arc<AdminList> {
        Arc::clone(&self.admins)
    }
}

impl Plugin for AdminPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn register(&self, registrar: &mut Registrar<'_>) -> Result<(), PluginError> {
        registrar.command("ping", &[], commands::ping)?;
        registrar.command("help", &[], commands::help)?;
        registrar.command("players", &["list", "online"], commands::players)?;
        registrar.command("status", &[], commands::status)?;

        let admins = self.admins();
        registrar.command("run", &[], move |ctx: CommandContext| {
            let admins = admins.clone();
            async move { commands::run(ctx, &admins).await }
        })?;

        let admins = self.admins();
        registrar.command("kick", &[], move |ctx: CommandContext| {
            let admins = admins.clone();
            async move { commands::kick(ctx, &admins).await }
        })?;

        let admins = self.admins();
        registrar.command("addadmin", &[], move |ctx: CommandContext| {
            let admins = admins.clone();
            async move { commands::add_admin(ctx, &admins).await }
        })?;

        let admins = self.admins();
        registrar.command("notice", &["n", "not"], move |ctx: CommandContext| {
            let admins = admins.clone();
            async move { commands::notice(ctx, &admins).await }
        })?;

        info!(
            "🔧 AdminPlugin: ✅ Registered admin commands for {} admin(s)",
            self.admins.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests;
