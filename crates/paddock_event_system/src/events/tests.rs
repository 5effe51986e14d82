#[cfg(test)]
mod tests {
    use crate::events::*;
    use std::sync::Arc;

    fn sample_waypoint(is_end_race: bool) -> WaypointEvent {
        WaypointEvent {
            login: "speedy".to_string(),
            account_id: "acc-1".to_string(),
            speed: 212.5,
            race_time: 31_250,
            lap_time: 31_250,
            checkpoint_in_race: 4,
            checkpoint_in_lap: 4,
            block_id: "#8".to_string(),
            server_time: 99_000,
            is_end_lap: is_end_race,
            is_end_race,
        }
    }

    #[test]
    fn test_event_kind_matches_variant() {
        let join = Event::new(PlayerJoinEvent {
            login: "alice".to_string(),
            is_spectator: false,
        });
        assert_eq!(join.kind(), EventKind::Join);

        let finish = Event::new(FinishEvent(sample_waypoint(true)));
        assert_eq!(finish.kind(), EventKind::Finish);

        let custom: Event = CustomEvent::new("records:new_best", serde_json::json!({"time": 1})).into();
        assert_eq!(custom.kind(), EventKind::Custom);
    }

    #[test]
    fn test_payload_extraction_is_kind_checked() {
        let event = Event::new(PlayerChatEvent {
            login: "bob".to_string(),
            player_id: 7,
            text: "hello".to_string(),
        });

        let chat = event.payload::<PlayerChatEvent>().expect("chat payload");
        assert_eq!(chat.player_id, 7);
        assert!(event.payload::<PlayerJoinEvent>().is_none());
    }

    #[test]
    fn test_clones_share_the_same_instance() {
        let event = Event::new(sample_waypoint(false));
        let copy = event.clone();

        let a = event.payload::<WaypointEvent>().expect("waypoint");
        let b = copy.payload::<WaypointEvent>().expect("waypoint");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_finish_derefs_to_race_progress() {
        let finish = FinishEvent(sample_waypoint(true));
        assert_eq!(finish.race_time, 31_250);
        assert!(finish.is_end_race);
        assert_eq!(finish.login, "speedy");
    }

    #[test]
    fn test_custom_events_get_distinct_ids() {
        let a = CustomEvent::new("ping", serde_json::Value::Null);
        let b = CustomEvent::new("ping", serde_json::Value::Null);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_every_kind_has_a_unique_name() {
        let mut names: Vec<&str> = EventKind::ALL.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), EventKind::ALL.len());
    }

    #[tokio::test]
    async fn test_typed_handler_rejects_wrong_kind() {
        let handler = TypedEventHandler::new(
            "test::join".to_string(),
            |_event: Arc<PlayerJoinEvent>| async { Ok(true) },
        );

        let wrong = Event::new(UnloadEvent);
        match handler.handle(&wrong).await {
            Err(EventError::KindMismatch { expected, actual }) => {
                assert_eq!(expected, EventKind::Join);
                assert_eq!(actual, EventKind::Unload);
            }
            other => panic!("expected kind mismatch, got {:?}", other),
        }

        let right = Event::new(PlayerJoinEvent {
            login: "carol".to_string(),
            is_spectator: true,
        });
        assert!(handler.handle(&right).await.expect("handled"));
    }

    #[test]
    fn test_aggregated_failure_message_lists_handlers() {
        let error = EventError::HandlersFailed {
            kind: EventKind::Chat,
            total: 3,
            failures: vec![
                HandlerFailure {
                    handler: "chat::relay".to_string(),
                    error: "boom".to_string(),
                },
                HandlerFailure {
                    handler: "chat::log".to_string(),
                    error: "disk full".to_string(),
                },
            ],
        };

        let message = error.to_string();
        assert!(message.starts_with("2 of 3 handler(s) failed for chat event"));
        assert!(message.contains("chat::relay: boom"));
        assert!(message.contains("chat::log: disk full"));
    }
}
