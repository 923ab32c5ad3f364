//! End-to-end controller flows against a scripted backend.
//!
//! Time is paused, so timer-driven behavior (reveal ticks, fades, tweens)
//! runs deterministically.

use std::sync::Arc;
use std::time::Duration;

use greengarden_api::GameState;
use greengarden_core::affection::{INDICATOR_DURATION, TWEEN_DURATION};
use greengarden_core::controller::FADE_DURATION;
use greengarden_core::reveal::REVEAL_INTERVAL;
use greengarden_core::{
    ChatPhase, Controller, EntryKind, MockBackend, ScreenView, Sentiment, Tier, Update,
};
use tokio::time::Instant;

fn state(closeness: i64) -> GameState {
    GameState::default()
        .with_closeness(closeness)
        .with_relationship("Acquaintance")
        .with_scene("Bakery Club booth")
}

/// Let the clock run forward and give the controller a frame.
async fn advance(controller: &mut Controller<MockBackend>, by: Duration) {
    tokio::time::advance(by).await;
    controller.on_frame(Instant::now());
}

/// Run the start flow to the game screen.
async fn start(controller: &mut Controller<MockBackend>) {
    assert!(controller.start_game());
    let update = controller.next_update().await.expect("start update");
    assert!(matches!(update, Update::Started(_)));
    controller.handle_update(update, Instant::now());
    advance(controller, FADE_DURATION).await;
    advance(controller, FADE_DURATION).await;
}

/// Handle updates until the chat reply has been processed.
async fn wait_for_reply(controller: &mut Controller<MockBackend>) {
    loop {
        let update = controller.next_update().await.expect("update");
        let is_reply = matches!(update, Update::Replied(_));
        controller.handle_update(update, Instant::now());
        if is_reply {
            return;
        }
    }
}

/// Handle updates until the running reveal finishes. Returns the text of
/// the revealing entry after every tick.
async fn run_reveal(controller: &mut Controller<MockBackend>) -> Vec<String> {
    let mut renders = Vec::new();
    while controller.is_revealing() {
        let update = controller.next_update().await.expect("update");
        let is_tick = matches!(update, Update::RevealTick { .. });
        controller.handle_update(update, Instant::now());
        if is_tick {
            let last = controller.entries().last().expect("entry");
            renders.push(last.text.clone());
        }
    }
    renders
}

#[tokio::test(start_paused = true)]
async fn test_start_game_flow() {
    let backend = Arc::new(MockBackend::new().with_intro(
        "You walk across the busy campus...",
        state(30),
    ));
    let mut controller = Controller::new(Arc::clone(&backend));

    assert_eq!(controller.snapshot(Instant::now()).screen, ScreenView::Welcome);
    assert!(controller.start_game());
    assert!(controller.is_loading());

    let update = controller.next_update().await.unwrap();
    controller.handle_update(update, Instant::now());
    assert!(!controller.is_loading());
    assert!(!controller.session().game_started);
    assert!(matches!(
        controller.snapshot(Instant::now()).screen,
        ScreenView::FadingOut { .. }
    ));

    // The intro lands when the welcome screen has faded out.
    advance(&mut controller, FADE_DURATION).await;
    assert!(controller.session().game_started);
    assert!(controller.session().initialized);
    assert!(controller.take_focus_request());
    assert!(!controller.take_focus_request());
    assert_eq!(controller.entries().len(), 1);
    assert_eq!(controller.entries()[0].kind, EntryKind::System);
    assert_eq!(controller.entries()[0].text, "You walk across the busy campus...");
    assert_eq!(controller.session().relationship, "Acquaintance");
    assert_eq!(controller.session().scene, "Bakery Club booth");

    advance(&mut controller, FADE_DURATION).await;
    assert_eq!(controller.snapshot(Instant::now()).screen, ScreenView::Game);
    assert_eq!(backend.start_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_second_start_issues_no_request() {
    let backend = Arc::new(MockBackend::new().with_intro("Hello.", state(30)));
    let mut controller = Controller::new(Arc::clone(&backend));

    assert!(controller.start_game());
    assert!(!controller.start_game(), "start already in flight");

    let update = controller.next_update().await.unwrap();
    controller.handle_update(update, Instant::now());
    assert!(!controller.start_game(), "welcome screen fading out");

    advance(&mut controller, FADE_DURATION).await;
    advance(&mut controller, FADE_DURATION).await;
    assert!(!controller.start_game(), "game already started");

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.start_calls(), 1);
    assert!(controller.try_next_update().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_start_failure_notifies_and_allows_retry() {
    let backend = Arc::new(
        MockBackend::new()
            .with_start_failure("connection refused")
            .with_intro("Second try.", state(30)),
    );
    let mut controller = Controller::new(Arc::clone(&backend));

    assert!(controller.start_game());
    let update = controller.next_update().await.unwrap();
    controller.handle_update(update, Instant::now());

    assert!(!controller.is_loading());
    assert_eq!(
        controller.notification(),
        Some("Unable to start game: Network error: connection refused")
    );
    assert_eq!(controller.snapshot(Instant::now()).screen, ScreenView::Welcome);

    controller.dismiss_notification();
    assert!(controller.notification().is_none());
    start(&mut controller).await;
    assert!(controller.session().game_started);
    assert_eq!(backend.start_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_blank_input_is_ignored() {
    let backend = Arc::new(MockBackend::new());
    let mut controller = Controller::new(Arc::clone(&backend));
    start(&mut controller).await;
    let entries_before = controller.entries().len();

    assert!(!controller.send_message("", Instant::now()));
    assert!(!controller.send_message("   \t\n ", Instant::now()));

    assert_eq!(controller.entries().len(), entries_before);
    assert!(!controller.is_typing());
    assert_eq!(controller.phase(), ChatPhase::Idle);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.chat_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_send_shows_user_entry_and_typing() {
    let backend = Arc::new(
        MockBackend::new()
            .with_latency(Duration::from_secs(2))
            .with_reply("Hi!", state(30)),
    );
    let mut controller = Controller::new(Arc::clone(&backend));
    start(&mut controller).await;

    let tail_before = controller.snapshot(Instant::now()).follow_tail;
    assert!(controller.send_message("  Nice to meet you  ", Instant::now()));

    let last = controller.entries().last().unwrap();
    assert_eq!(last.kind, EntryKind::User);
    assert_eq!(last.text, "Nice to meet you");
    assert!(controller.is_typing());
    assert_eq!(controller.phase(), ChatPhase::AwaitingResponse);

    let snapshot = controller.snapshot(Instant::now());
    assert!(snapshot.typing.is_some());
    assert!(snapshot.follow_tail > tail_before);

    wait_for_reply(&mut controller).await;
    assert!(!controller.is_typing());
    assert_eq!(controller.phase(), ChatPhase::Revealing);
    assert_eq!(
        backend.sent_messages().await,
        vec!["Nice to meet you".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_reveal_hello_world() {
    let backend = Arc::new(
        MockBackend::new()
            .with_intro("Intro", state(30))
            .with_reply("Hello\nWorld", state(45)),
    );
    let mut controller = Controller::new(Arc::clone(&backend));
    start(&mut controller).await;
    let syncs_before = controller.state_syncs();

    controller.send_message("Hi", Instant::now());
    wait_for_reply(&mut controller).await;

    let reply_at = Instant::now();
    let last = controller.entries().last().unwrap();
    assert_eq!(last.kind, EntryKind::Assistant);
    assert!(last.text.is_empty());

    let renders = run_reveal(&mut controller).await;

    assert_eq!(renders.len(), 11);
    assert_eq!(Instant::now() - reply_at, REVEAL_INTERVAL * 11);
    for (i, render) in renders.iter().enumerate() {
        assert!("Hello\nWorld".starts_with(render.as_str()));
        assert_eq!(render.chars().count(), i + 1);
    }
    let last = controller.entries().last().unwrap();
    assert_eq!(last.lines(), vec!["Hello", "World"]);

    // State lands once, only after the last character.
    assert_eq!(controller.state_syncs(), syncs_before + 1);
    assert_eq!(controller.session().closeness, 45);
    assert_eq!(controller.phase(), ChatPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_state_not_applied_mid_reveal() {
    let backend = Arc::new(
        MockBackend::new()
            .with_intro("Intro", state(30))
            .with_reply("abcd", state(60)),
    );
    let mut controller = Controller::new(Arc::clone(&backend));
    start(&mut controller).await;
    let syncs_before = controller.state_syncs();

    controller.send_message("Hi", Instant::now());
    wait_for_reply(&mut controller).await;

    while controller.is_revealing() {
        assert_eq!(controller.state_syncs(), syncs_before);
        assert_eq!(controller.meter().displayed_closeness(), 30);
        let update = controller.next_update().await.unwrap();
        controller.handle_update(update, Instant::now());
    }
    assert_eq!(controller.state_syncs(), syncs_before + 1);
}

#[tokio::test(start_paused = true)]
async fn test_closeness_rises_to_45() {
    let backend = Arc::new(
        MockBackend::new()
            .with_intro("Intro", state(30))
            .with_reply("Sure!", state(45)),
    );
    let mut controller = Controller::new(Arc::clone(&backend));
    start(&mut controller).await;

    controller.send_message("Want to grab cake?", Instant::now());
    wait_for_reply(&mut controller).await;
    run_reveal(&mut controller).await;
    controller.on_frame(Instant::now());

    let snapshot = controller.snapshot(Instant::now());
    assert_eq!(snapshot.meter.tier, Tier::Warning);
    assert_eq!(snapshot.meter.label, 30);
    assert_eq!(snapshot.indicators.len(), 1);
    assert_eq!(snapshot.indicators[0].text, "+15");
    assert_eq!(snapshot.indicators[0].sentiment, Sentiment::Success);
    assert_eq!(controller.meter().indicators_spawned(), 1);

    advance(&mut controller, TWEEN_DURATION).await;
    let snapshot = controller.snapshot(Instant::now());
    assert_eq!(snapshot.meter.label, 45);
    assert_eq!(snapshot.meter.bar_width, 45.0);
    assert_eq!(snapshot.indicators.len(), 1);

    advance(&mut controller, INDICATOR_DURATION - TWEEN_DURATION).await;
    assert!(controller.snapshot(Instant::now()).indicators.is_empty());
    assert_eq!(controller.meter().indicators_spawned(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_closeness_drops_to_20() {
    let backend = Arc::new(
        MockBackend::new()
            .with_intro("Intro", state(30))
            .with_reply("Hmph.", state(20)),
    );
    let mut controller = Controller::new(Arc::clone(&backend));
    start(&mut controller).await;

    controller.send_message("Your cake is bad", Instant::now());
    wait_for_reply(&mut controller).await;
    run_reveal(&mut controller).await;

    let snapshot = controller.snapshot(Instant::now());
    assert_eq!(snapshot.meter.tier, Tier::Danger);
    assert_eq!(snapshot.indicators[0].text, "-10");
    assert_eq!(snapshot.indicators[0].sentiment, Sentiment::Danger);

    advance(&mut controller, INDICATOR_DURATION).await;
    let snapshot = controller.snapshot(Instant::now());
    assert_eq!(snapshot.meter.label, 20);
    assert!(snapshot.indicators.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_closeness_has_no_indicator() {
    let backend = Arc::new(
        MockBackend::new()
            .with_intro("Intro", state(30))
            .with_reply("Okay.", state(30)),
    );
    let mut controller = Controller::new(Arc::clone(&backend));
    start(&mut controller).await;

    controller.send_message("Hello", Instant::now());
    wait_for_reply(&mut controller).await;
    run_reveal(&mut controller).await;

    let snapshot = controller.snapshot(Instant::now());
    assert!(snapshot.indicators.is_empty());
    assert_eq!(snapshot.meter.label, 30);
    assert_eq!(snapshot.meter.bar_width, 30.0);
    assert_eq!(controller.meter().indicators_spawned(), 0);
    assert!(!controller.meter().is_animating());
}

#[tokio::test(start_paused = true)]
async fn test_chat_failure_cleans_up() {
    let backend = Arc::new(MockBackend::new().with_chat_failure("connection reset"));
    let mut controller = Controller::new(Arc::clone(&backend));
    start(&mut controller).await;
    let entries_before = controller.entries().len();

    controller.send_message("Hello?", Instant::now());
    assert!(controller.is_typing());
    wait_for_reply(&mut controller).await;

    assert!(!controller.is_typing());
    assert!(!controller.is_revealing());
    assert_eq!(controller.phase(), ChatPhase::Idle);
    assert_eq!(controller.entries().len(), entries_before + 1);
    assert_eq!(
        controller.notification(),
        Some("Failed to send message: Network error: connection reset")
    );
}

#[tokio::test(start_paused = true)]
async fn test_new_send_completes_running_reveal() {
    let backend = Arc::new(
        MockBackend::new()
            .with_intro("Intro", state(30))
            .with_reply("This is a fairly long reply.", state(50))
            .with_reply("Ok", state(60)),
    );
    let mut controller = Controller::new(Arc::clone(&backend));
    start(&mut controller).await;
    let syncs_before = controller.state_syncs();

    controller.send_message("Tell me about the club", Instant::now());
    wait_for_reply(&mut controller).await;

    // Let a few characters through, then interrupt.
    let mut ticks = 0;
    while ticks < 3 {
        let update = controller.next_update().await.unwrap();
        if matches!(update, Update::RevealTick { .. }) {
            ticks += 1;
        }
        controller.handle_update(update, Instant::now());
    }
    assert!(controller.is_revealing());

    controller.send_message("Cool", Instant::now());
    let first_reply = &controller.entries()[controller.entries().len() - 2];
    assert_eq!(first_reply.text, "This is a fairly long reply.");
    assert_eq!(controller.state_syncs(), syncs_before + 1);
    assert_eq!(controller.session().closeness, 50);

    wait_for_reply(&mut controller).await;
    let renders = run_reveal(&mut controller).await;
    assert_eq!(renders, vec!["O".to_string(), "Ok".to_string()]);
    assert_eq!(controller.state_syncs(), syncs_before + 2);
    assert_eq!(controller.session().closeness, 60);
}

#[tokio::test(start_paused = true)]
async fn test_typing_returns_while_second_reply_pending() {
    let backend = Arc::new(
        MockBackend::new()
            .with_intro("Intro", state(30))
            .with_reply("Hi", state(35))
            .with_reply("Bye", state(40))
            .with_latency(Duration::from_secs(2)),
    );
    let mut controller = Controller::new(Arc::clone(&backend));
    start(&mut controller).await;

    controller.send_message("first", Instant::now());
    // Let the first request reach the server before time moves.
    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_secs(1)).await;
    controller.send_message("second", Instant::now());
    assert!(controller.is_typing());

    wait_for_reply(&mut controller).await;
    assert!(controller.is_revealing());
    assert!(!controller.is_typing());

    run_reveal(&mut controller).await;
    assert_eq!(controller.phase(), ChatPhase::AwaitingResponse);
    assert!(controller.is_typing());
    assert_eq!(controller.session().closeness, 35);

    wait_for_reply(&mut controller).await;
    assert!(!controller.is_typing());
    run_reveal(&mut controller).await;
    assert_eq!(controller.phase(), ChatPhase::Idle);
    assert!(!controller.is_typing());
    assert_eq!(controller.session().closeness, 40);
}

#[tokio::test(start_paused = true)]
async fn test_reply_without_state_keeps_meter() {
    let backend = Arc::new(
        MockBackend::new()
            .with_intro("Intro", state(40))
            .with_stateless_reply("..."),
    );
    let mut controller = Controller::new(Arc::clone(&backend)).with_portrait_base("http://game");
    start(&mut controller).await;
    let syncs_before = controller.state_syncs();

    controller.send_message("Hi", Instant::now());
    wait_for_reply(&mut controller).await;
    run_reveal(&mut controller).await;

    assert_eq!(controller.state_syncs(), syncs_before);
    assert_eq!(controller.session().closeness, 40);
    assert_eq!(
        controller.portrait(),
        Some("http://game/static/images/SuTang.jpg")
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_reply_applies_state_on_first_tick() {
    let backend = Arc::new(
        MockBackend::new()
            .with_intro("Intro", state(30))
            .with_reply("", state(35)),
    );
    let mut controller = Controller::new(Arc::clone(&backend));
    start(&mut controller).await;

    controller.send_message("...", Instant::now());
    wait_for_reply(&mut controller).await;
    let reply_at = Instant::now();
    let renders = run_reveal(&mut controller).await;

    assert_eq!(renders, vec![String::new()]);
    assert_eq!(Instant::now() - reply_at, REVEAL_INTERVAL);
    assert_eq!(controller.session().closeness, 35);
}

#[tokio::test(start_paused = true)]
async fn test_save_and_load() {
    let backend = Arc::new(
        MockBackend::new()
            .with_intro("Intro", state(30))
            .with_save(true)
            .with_load(Some(state(70)))
            .with_load(None),
    );
    let mut controller = Controller::new(Arc::clone(&backend));

    assert!(!controller.save_game(1), "nothing to save before starting");
    assert!(!controller.load_game(1));
    start(&mut controller).await;

    assert!(controller.save_game(1));
    let update = controller.next_update().await.unwrap();
    controller.handle_update(update, Instant::now());
    assert_eq!(controller.status(), Some("Saved to slot 1"));

    assert!(controller.load_game(1));
    let update = controller.next_update().await.unwrap();
    controller.handle_update(update, Instant::now());
    assert_eq!(controller.session().closeness, 70);
    assert_eq!(controller.meter().tier(), Tier::Info);
    assert_eq!(
        controller.entries().last().unwrap().text,
        "Loaded save slot 1."
    );

    assert!(controller.load_game(2));
    let update = controller.next_update().await.unwrap();
    controller.handle_update(update, Instant::now());
    assert_eq!(controller.status(), Some("No save in slot 2"));
    assert_eq!(controller.session().closeness, 70);

    assert_eq!(backend.save_calls(), 1);
    assert_eq!(backend.load_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_load_failure_notifies() {
    let backend = Arc::new(MockBackend::new().with_load_failure("timeout"));
    let mut controller = Controller::new(Arc::clone(&backend));
    start(&mut controller).await;

    controller.load_game(3);
    let update = controller.next_update().await.unwrap();
    controller.handle_update(update, Instant::now());
    assert_eq!(
        controller.notification(),
        Some("Failed to load game: Network error: timeout")
    );
}

#[tokio::test(start_paused = true)]
async fn test_resize_recomputes_chat_height() {
    let backend = Arc::new(MockBackend::new());
    let mut controller = Controller::new(backend);

    assert_eq!(controller.resize(40), 35);
    assert_eq!(controller.snapshot(Instant::now()).chat_height, 35);
    assert_eq!(controller.resize(4), 0);
    assert_eq!(controller.snapshot(Instant::now()).chat_height, 0);
}
