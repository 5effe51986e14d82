use paddock_event_system::{
    CommandContext, CommandError, DialogError, Plugin, PluginError, PlayerJoinEvent, Registrar,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

// ============================================================================
// Greeter Plugin
// ============================================================================

/// Welcomes players and shows the server rules on request.
pub struct GreeterPlugin {
    name: String,
    rules: Vec<String>,
    rules_timeout: Duration,
}

impl GreeterPlugin {
    pub fn new() -> Self {
        info!("🎉 GreeterPlugin: Creating new instance");
        Self {
            name: "greeter".to_string(),
            rules: vec![
                "Be nice to other players.".to_string(),
                "No cheating or exploiting.".to_string(),
                "Have fun!".to_string(),
            ],
            rules_timeout: Duration::from_secs(30),
        }
    }

    /// Replaces the rule lines shown by `/rules`.
    pub fn with_rules(mut self, rules: Vec<String>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_rules_timeout(mut self, timeout: Duration) -> Self {
        self.rules_timeout = timeout;
        self
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// How long `/rules` waits for accept or decline.
    pub fn rules_timeout(&self) -> Duration {
        self.rules_timeout
    }
}

impl Default for GreeterPlugin {
    fn default() -> Self {
        Self::new()
    }
}

/// Join announcement for a player.
pub fn greeting(nickname: &str, is_spectator: bool) -> String {
    if is_spectator {
        format!("{} has joined as a spectator", nickname)
    } else {
        format!("{} has joined the server", nickname)
    }
}

/// Dialog page listing `rules` with accept and decline buttons.
pub fn rules_page(rules: &[String], accept: i32, decline: i32) -> String {
    let mut page = String::from(
        "<manialink version=\"3\" id=\"paddock.rules\">\n  <frame pos=\"-40 30\">\n    <label text=\"Server rules\" textsize=\"4\"/>\n",
    );
    for (line, rule) in rules.iter().enumerate() {
        page.push_str(&format!(
            "    <label pos=\"0 {}\" text=\"{}. {}\"/>\n",
            -8 - (line as i32) * 5,
            line + 1,
            escape(rule)
        ));
    }
    page.push_str(&format!(
        "    <label pos=\"0 -40\" text=\"Accept\" action=\"{}\"/>\n    <label pos=\"30 -40\" text=\"Decline\" action=\"{}\"/>\n  </frame>\n</manialink>",
        accept, decline
    ));
    page
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl Plugin for GreeterPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn register(&self, registrar: &mut Registrar<'_>) -> Result<(), PluginError> {
        info!("👋 GreeterPlugin: Registering event handlers...");

        let client = registrar.context().client();
        registrar.on(move |event: Arc<PlayerJoinEvent>| {
            let client = Arc::clone(&client);
            async move {
                debug!("👋 GreeterPlugin: {} joined (spectator: {})", event.login, event.is_spectator);
                let info = client.get_player_info(&event.login).await?;
                client
                    .chat_send_server_message(&greeting(&info.nickname, event.is_spectator))
                    .await?;
                Ok(true)
            }
        });

        registrar.command("simple", &[], |ctx: CommandContext| async move {
            ctx.client
                .chat_send_server_message_to_login("simple command :)", &ctx.login)
                .await?;
            Ok(())
        })?;

        let rules = Arc::new(self.rules.clone());
        let timeout = self.rules_timeout;
        let dialogs = registrar.context().dialogs();
        registrar.command("rules", &[], move |ctx: CommandContext| {
            let rules = Arc::clone(&rules);
            let dialogs = Arc::clone(&dialogs);
            async move {
                let accept = dialogs.next_action_id();
                let decline = dialogs.next_action_id();
                let page = rules_page(&rules, accept, decline);

                match dialogs.ask(&ctx.login, &page, &[accept, decline], timeout).await {
                    Ok(choice) if choice == accept => {
                        info!("👋 GreeterPlugin: {} accepted the rules", ctx.login);
                        ctx.reply("Thanks for accepting the rules, have fun!").await
                    }
                    Ok(_) => ctx.reply("You declined the rules.").await,
                    Err(DialogError::TimedOut) => {
                        ctx.reply("No answer received, type /rules to see them again.").await
                    }
                    Err(e) => Err(CommandError::from(e)),
                }
            }
        })?;

        info!("👋 GreeterPlugin: ✅ All handlers registered successfully!");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paddock_event_system::serde_json::json;
    use paddock_event_system::testing::PluginHarness;
    use paddock_event_system::{DialogAnswerEvent, EventError, RouteOutcome, ShutdownState};

    #[test]
    fn test_greeting_text() {
        assert_eq!(greeting("Alice", false), "Alice has joined the server");
        assert_eq!(greeting("Bob", true), "Bob has joined as a spectator");
    }

    #[test]
    fn test_rules_page_carries_actions_and_escapes() {
        let page = rules_page(&["Keep <it> \"clean\"".to_string()], 4, 5);
        assert!(page.contains("action=\"4\""));
        assert!(page.contains("action=\"5\""));
        assert!(page.contains("1. Keep &lt;it&gt; &quot;clean&quot;"));
    }

    #[tokio::test]
    async fn test_join_is_announced_with_nickname() {
        let plugin = GreeterPlugin::new();
        let harness = PluginHarness::new(&plugin).expect("registers");
        harness.client.respond_to(
            "GetPlayerInfo",
            "alice",
            json!({"Login": "alice", "NickName": "$f00Alice", "PlayerId": 3}),
        );

        let report = harness
            .emit(PlayerJoinEvent {
                login: "alice".to_string(),
                is_spectator: false,
            })
            .await
            .expect("dispatch");

        assert_eq!(report.handled, 1);
        assert_eq!(
            harness.client.broadcasts(),
            vec!["$f00Alice has joined the server".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unknown_player_fails_the_handler() {
        let plugin = GreeterPlugin::new();
        let harness = PluginHarness::new(&plugin).expect("registers");
        harness.client.fail_with("GetPlayerInfo", -1000, "Login unknown.");

        let err = harness
            .emit(PlayerJoinEvent {
                login: "ghost".to_string(),
                is_spectator: true,
            })
            .await
            .expect_err("handler fails");

        assert!(matches!(err, EventError::HandlersFailed { .. }));
        assert!(harness.client.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn test_simple_command_answers_by_login() {
        let plugin = GreeterPlugin::new();
        let harness = PluginHarness::new(&plugin).expect("registers");

        let outcome = harness.chat(2, "bob", "/simple").await.expect("routes");
        assert!(matches!(outcome, RouteOutcome::Executed { .. }));

        let calls = harness.client.calls_to("ChatSendServerMessageToLogin");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].str_arg(0), Some("simple command :)"));
        assert_eq!(calls[0].str_arg(1), Some("bob"));
    }

    #[tokio::test]
    async fn test_rules_accept_through_dialog() {
        let plugin = GreeterPlugin::new();
        let harness = Arc::new(PluginHarness::new(&plugin).expect("registers"));

        let command = tokio::spawn({
            let harness = Arc::clone(&harness);
            async move { harness.chat(7, "carol", "/rules").await }
        });

        let dialogs = harness.context.dialogs();
        while dialogs.pending_count().await == 0 {
            tokio::task::yield_now().await;
        }

        // A fresh correlator mints 0 for accept and 1 for decline.
        harness
            .emit(DialogAnswerEvent {
                player_id: 7,
                login: "carol".to_string(),
                answer: "0".to_string(),
                entries: Vec::new(),
            })
            .await
            .expect("dispatch");

        command.await.expect("command task").expect("command succeeds");
        assert_eq!(
            harness.replies_to(7),
            vec!["Thanks for accepting the rules, have fun!".to_string()]
        );
        assert_eq!(harness.client.calls_to("SendDisplayManialinkPageToLogin").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rules_timeout_is_reported() {
        let plugin = GreeterPlugin::new().with_rules_timeout(Duration::from_millis(200));
        let harness = PluginHarness::new(&plugin).expect("registers");
        let _reaper = harness.context.dialogs().spawn_reaper(ShutdownState::new());

        let outcome = harness.chat(8, "dave", "/rules").await.expect("routes");
        assert!(matches!(outcome, RouteOutcome::Executed { .. }));
        assert_eq!(
            harness.replies_to(8),
            vec!["No answer received, type /rules to see them again.".to_string()]
        );
    }
}
