//! Tests for event registration and dispatch

#[cfg(test)]
mod tests {
    use crate::events::*;
    use crate::EventSystem;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn chat(text: &str) -> PlayerChatEvent {
        PlayerChatEvent {
            login: "alice".to_string(),
            player_id: 3,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_without_handlers_is_noop() {
        let events = EventSystem::new();
        let report = events.emit(LoadEvent).await.expect("no-op dispatch");

        assert_eq!(report.kind, EventKind::Load);
        assert_eq!(report.handlers_invoked, 0);
        assert_eq!(report.handled, 0);
        assert_eq!(events.get_stats().events_dispatched, 1);
    }

    #[tokio::test]
    async fn test_every_handler_runs_exactly_once() {
        let events = EventSystem::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for i in 0..5 {
            let calls = calls.clone();
            events.on(&format!("plugin{}", i), move |_event: Arc<PlayerChatEvent>| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(i % 2 == 0)
                }
            });
        }

        let report = events.emit(chat("hi")).await.expect("dispatch succeeds");
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(report.handlers_invoked, 5);
        assert_eq!(report.handled, 3);
    }

    #[tokio::test]
    async fn test_handlers_only_see_their_kind() {
        let events = EventSystem::new();
        let joins = Arc::new(AtomicUsize::new(0));

        let counter = joins.clone();
        events.on("greeter", move |_event: Arc<PlayerJoinEvent>| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
        });

        events.emit(chat("not a join")).await.expect("dispatch");
        assert_eq!(joins.load(Ordering::SeqCst), 0);
        assert_eq!(events.handler_count(EventKind::Join), 1);
        assert_eq!(events.handler_count(EventKind::Chat), 0);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_stop_siblings() {
        let events = EventSystem::new();
        let completed = Arc::new(AtomicUsize::new(0));

        events.on("broken", |_event: Arc<PlayerChatEvent>| async {
            Err(EventError::HandlerExecution("database offline".to_string()))
        });

        let counter = completed.clone();
        events.on("slow", move |_event: Arc<PlayerChatEvent>| {
            let counter = counter.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
        });

        let result = events.emit(chat("hello")).await;

        // dispatch only returns after the slow sibling finished
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        match result {
            Err(EventError::HandlersFailed { kind, total, failures }) => {
                assert_eq!(kind, EventKind::Chat);
                assert_eq!(total, 2);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].handler, "broken::chat");
                assert!(failures[0].error.contains("database offline"));
            }
            other => panic!("expected aggregated failure, got {:?}", other),
        }
        assert_eq!(events.get_stats().handler_failures, 1);
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let events = EventSystem::new();
        let survived = Arc::new(AtomicUsize::new(0));

        events.on("explosive", |_event: Arc<UnloadEvent>| async {
            if true {
                panic!("handler blew up");
            }
            Ok(true)
        });

        let counter = survived.clone();
        events.on("records", move |_event: Arc<UnloadEvent>| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
        });

        let result = events.emit(UnloadEvent).await;
        assert_eq!(survived.load(Ordering::SeqCst), 1);
        match result {
            Err(EventError::HandlersFailed { failures, .. }) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].handler, "explosive::unload");
            }
            other => panic!("expected panic to be reported, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_all_handlers_receive_the_same_instance() {
        let events = EventSystem::new();
        let seen: Arc<Mutex<Vec<Arc<WaypointEvent>>>> = Arc::new(Mutex::new(Vec::new()));

        for owner in ["a", "b"] {
            let seen = seen.clone();
            events.on(owner, move |event: Arc<WaypointEvent>| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(event);
                    Ok(false)
                }
            });
        }

        events.emit(WaypointEvent::default()).await.expect("dispatch");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(Arc::ptr_eq(&seen[0], &seen[1]));
    }

    #[tokio::test]
    async fn test_registration_order_is_kept() {
        let events = EventSystem::new();
        events.on("first", |_e: Arc<LoadEvent>| async { Ok(true) });
        events.on("second", |_e: Arc<LoadEvent>| async { Ok(true) });
        events.on("third", |_e: Arc<LoadEvent>| async { Ok(true) });

        assert_eq!(
            events.handler_names(EventKind::Load),
            vec!["first::load", "second::load", "third::load"]
        );
        assert_eq!(events.get_stats().total_handlers, 3);
    }
}
