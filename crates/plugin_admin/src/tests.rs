use super::*;
use crate::commands::{KICK_USAGE, NOTICE_USAGE, NO_ACCESS, RUN_USAGE};
use paddock_event_system::serde_json::json;
use paddock_event_system::testing::PluginHarness;
use paddock_event_system::RouteOutcome;

fn harness() -> (AdminPlugin, PluginHarness) {
    let plugin = AdminPlugin::new(["root"]);
    let harness = PluginHarness::new(&plugin).expect("registers");
    harness.client.respond_with(
        "GetPlayerList",
        json!([
            {"Login": "alice", "NickName": "Alice", "PlayerId": 1},
            {"Login": "bob", "NickName": "$f00Bob", "PlayerId": 2}
        ]),
    );
    (plugin, harness)
}

#[tokio::test]
async fn test_ping_echoes_arguments() {
    let (_plugin, harness) = harness();

    harness.chat(1, "alice", "/ping").await.expect("routes");
    harness.chat(1, "alice", "/ping a b").await.expect("routes");

    assert_eq!(
        harness.replies_to(1),
        vec!["Pong".to_string(), "Pong - \"a\", \"b\"".to_string()]
    );
}

#[tokio::test]
async fn test_help_lists_commands_with_aliases() {
    let (_plugin, harness) = harness();

    harness.chat(1, "alice", "/help").await.expect("routes");

    let replies = harness.replies_to(1);
    assert_eq!(replies[0], "All commands:");
    assert!(replies.contains(&"- ping".to_string()));
    assert!(replies.contains(&"- players (list, online)".to_string()));
    assert!(replies.contains(&"- notice (n, not)".to_string()));
    assert_eq!(replies.len(), 1 + harness.registry().len());
}

#[tokio::test]
async fn test_players_alias_lists_everyone() {
    let (_plugin, harness) = harness();

    let outcome = harness.chat(1, "alice", "/online").await.expect("routes");
    assert!(matches!(outcome, RouteOutcome::Executed { ref command, .. } if command == "players"));
    assert_eq!(
        harness.replies_to(1),
        vec!["- alice - Alice".to_string(), "- bob - $f00Bob".to_string()]
    );
}

#[tokio::test]
async fn test_status_reports_code_and_name() {
    let (_plugin, harness) = harness();
    harness
        .client
        .respond_with("GetStatus", json!({"Code": 4, "Name": "Running - Play"}));

    harness.chat(1, "alice", "/status").await.expect("routes");
    assert_eq!(harness.replies_to(1), vec!["4 - Running - Play".to_string()]);
}

#[tokio::test]
async fn test_admin_commands_refuse_other_players() {
    let (_plugin, harness) = harness();

    for line in ["/run GetStatus", "/kick bob", "/addadmin alice", "/n hello"] {
        harness.chat(1, "alice", line).await.expect("routes");
    }

    assert_eq!(harness.replies_to(1), vec![NO_ACCESS.to_string(); 4]);
    assert!(harness.client.calls_to("Kick").is_empty());
    assert!(harness.client.broadcasts().is_empty());
}

#[tokio::test]
async fn test_run_coerces_arguments_and_prints_result() {
    let (_plugin, harness) = harness();
    harness
        .client
        .respond_with("SetServerOptions", json!({"ok": true}));

    harness.chat(9, "root", "/run").await.expect("routes");
    harness
        .chat(9, "root", "/run SetServerOptions TRUE 12 name")
        .await
        .expect("routes");

    let call = &harness.client.calls_to("SetServerOptions")[0];
    assert_eq!(call.args, vec![json!(true), json!(12), json!("name")]);
    assert_eq!(
        harness.replies_to(9),
        vec![
            RUN_USAGE.to_string(),
            "Run - SetServerOptions TRUE 12 name".to_string(),
            r#"{"ok":true}"#.to_string()
        ]
    );
}

#[tokio::test]
async fn test_run_reports_faults() {
    let (_plugin, harness) = harness();
    harness.client.fail_with("NoSuchMethod", -32601, "method not found");

    let outcome = harness.chat(9, "root", "/run NoSuchMethod").await;
    assert!(outcome.is_ok());
    assert_eq!(
        harness.replies_to(9),
        vec!["Run - Fault - -32601: method not found".to_string()]
    );
}

#[tokio::test]
async fn test_kick_matches_login_or_nickname() {
    let (_plugin, harness) = harness();

    harness.chat(9, "root", "/kick").await.expect("routes");
    harness.chat(9, "root", "/kick $f00Bob").await.expect("routes");
    harness.chat(9, "root", "/kick carol").await.expect("routes");

    let kicks = harness.client.calls_to("Kick");
    assert_eq!(kicks.len(), 1);
    assert_eq!(kicks[0].str_arg(0), Some("bob"));
    assert_eq!(
        harness.replies_to(9),
        vec![
            KICK_USAGE.to_string(),
            "Kick - Kicked '$f00Bob'".to_string(),
            "Kick - Unknown login/nick 'carol'".to_string()
        ]
    );
}

#[tokio::test]
async fn test_kick_refused_by_server() {
    let (_plugin, harness) = harness();
    harness.client.fail_with("Kick", -1000, "Login unknown.");

    harness.chat(9, "root", "/kick alice").await.expect("routes");
    assert_eq!(
        harness.replies_to(9),
        vec!["Kick - Could not kick 'alice'".to_string()]
    );
}

#[tokio::test]
async fn test_added_admin_gains_access() {
    let (plugin, harness) = harness();

    harness.chat(9, "root", "/addadmin alice").await.expect("routes");
    assert_eq!(
        harness.replies_to(9),
        vec!["Added alice as an admin".to_string()]
    );
    assert!(plugin.admins().is_admin("alice"));

    harness.chat(1, "alice", "/notice  server restart soon ").await.expect("routes");
    assert_eq!(
        harness.client.broadcasts(),
        vec!["server restart soon".to_string()]
    );
}

#[tokio::test]
async fn test_notice_without_message_prints_usage() {
    let (_plugin, harness) = harness();

    harness.chat(9, "root", "/not").await.expect("routes");
    assert_eq!(harness.replies_to(9), vec![NOTICE_USAGE.to_string()]);
    assert!(harness.client.broadcasts().is_empty());
}
