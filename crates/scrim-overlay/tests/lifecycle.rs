//! End-to-end lifecycle tests for the overlay engine.
//!
//! Every test drives a [`ScriptedHost`] and a [`ManualClock`], so transition
//! timing, auto-dismiss timers, and gesture velocity are deterministic.

#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use proptest::prelude::*;
use scrim_core::testing::ScriptedHost;
use scrim_core::{
    CloseReason, DismissTrigger, ElementId, Host, InputEvent, Key, ManualClock, OpenOptions,
    OverlayConfig, OverlayErrorKind, OverlayId, OverlayStatus, Point, PointerId, QueuePolicy,
    ScrollPosition, TransitionAck, TransitionPhase, Variant,
};
use scrim_overlay::{OverlayEngine, OverlayEvent, variants};
use serde_json::json;
use tracing_test::traced_test;

// =============================================================================
// Helpers
// =============================================================================

fn engine(config: OverlayConfig) -> (OverlayEngine<ScriptedHost>, ManualClock) {
    let clock = ManualClock::default();
    let engine = OverlayEngine::builder(ScriptedHost::new())
        .config(config)
        .clock(clock.clone())
        .build()
        .unwrap();
    (engine, clock)
}

fn open(engine: &mut OverlayEngine<ScriptedHost>, variant: Variant) -> OverlayId {
    engine
        .open(variant, json!({}), OpenOptions::new())
        .unwrap()
        .id()
}

fn record_events(
    engine: &OverlayEngine<ScriptedHost>,
) -> (Rc<RefCell<Vec<OverlayEvent>>>, impl Sized + use<>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let sub = engine
        .events()
        .subscribe(move |event: &OverlayEvent| sink.borrow_mut().push(event.clone()));
    (log, sub)
}

fn escape() -> InputEvent {
    InputEvent::Key(Key::Escape)
}

// =============================================================================
// Stacking
// =============================================================================

proptest! {
    #[test]
    fn z_order_survives_out_of_order_closes(
        closes in proptest::collection::vec(any::<bool>(), 1..12),
    ) {
        let (mut engine, _) = engine(OverlayConfig::default().max_stack_depth(16));
        let ids: Vec<OverlayId> = closes.iter().map(|_| open(&mut engine, Variant::Form)).collect();
        for (id, close) in ids.iter().zip(&closes) {
            if *close {
                engine.close(*id);
            }
        }

        let survivors: Vec<OverlayId> = ids
            .iter()
            .zip(&closes)
            .filter(|(_, close)| !**close)
            .map(|(id, _)| *id)
            .collect();
        let stack = engine.views().stack().get();
        prop_assert_eq!(stack.iter().map(|item| item.id).collect::<Vec<_>>(), survivors.clone());
        for (i, item) in stack.iter().enumerate() {
            prop_assert_eq!(item.z_index, 1000 + 10 * i as i32);
            prop_assert_eq!(engine.query(item.id).unwrap().z_index, Some(item.z_index));
        }
        prop_assert_eq!(engine.is_scroll_locked(), !survivors.is_empty());
    }
}

#[test]
fn closed_instances_lose_their_z_index() {
    let (mut engine, _) = engine(OverlayConfig::default());
    let a = open(&mut engine, Variant::Confirmation);
    let b = open(&mut engine, Variant::Form);
    assert_eq!(engine.query(b).unwrap().z_index, Some(1010));

    engine.close(a);
    let snapshot = engine.query(a).unwrap();
    assert_eq!(snapshot.z_index, None);
    assert_eq!(
        snapshot.close_reason,
        Some(CloseReason::Dismissed {
            trigger: DismissTrigger::Programmatic
        })
    );
    assert_eq!(engine.query(b).unwrap().z_index, Some(1000));
}

#[test]
fn lifecycle_events_arrive_in_order() {
    let (mut engine, _) = engine(OverlayConfig::default());
    let (log, _sub) = record_events(&engine);
    let id = open(&mut engine, Variant::Video);
    engine.close(id);

    let kinds: Vec<&'static str> = log
        .borrow()
        .iter()
        .map(|event| match event {
            OverlayEvent::Queued { .. } => "queued",
            OverlayEvent::Entering { .. } => "entering",
            OverlayEvent::Opened { .. } => "opened",
            OverlayEvent::Exiting { .. } => "exiting",
            OverlayEvent::Closed { .. } => "closed",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, ["queued", "entering", "opened", "exiting", "closed"]);
    assert!(log.borrow().iter().all(|e| e.overlay() == Some(id)));
}

// =============================================================================
// Focus
// =============================================================================

#[test]
fn focus_moves_in_and_returns_to_the_trigger() {
    let (mut engine, _) = engine(OverlayConfig::default());
    let button = ElementId(7);
    engine.host_mut().attach(button);
    engine.host_mut().set_active(Some(button));

    let confirm = variants::confirmation(&mut engine, json!({ "msg": "Delete?" }))
        .unwrap()
        .id();
    let confirm_items = ScriptedHost::generated_focusables(confirm);
    assert_eq!(engine.host().active_element(), Some(confirm_items[0]));

    let form = variants::form(&mut engine, json!({})).unwrap().id();
    let form_items = ScriptedHost::generated_focusables(form);
    assert_eq!(engine.focus_owner(), Some(form));
    assert!(engine.handle_input(InputEvent::Key(Key::Tab)));
    assert_eq!(engine.host().active_element(), Some(form_items[1]));
    assert!(engine.handle_input(InputEvent::Key(Key::BackTab)));
    assert!(engine.handle_input(InputEvent::Key(Key::BackTab)));
    assert_eq!(engine.host().active_element(), Some(form_items[2]));

    assert!(engine.handle_input(escape()));
    assert_eq!(engine.status(form), Some(OverlayStatus::Closed));
    assert_eq!(engine.host().active_element(), Some(confirm_items[0]));
    assert_eq!(engine.focus_owner(), Some(confirm));

    assert!(engine.handle_input(escape()));
    assert_eq!(engine.host().active_element(), Some(button));
    assert_eq!(engine.focus_owner(), None);
}

#[test]
fn detached_trigger_falls_back_to_default_target() {
    let (mut engine, _) = engine(OverlayConfig::default());
    let button = ElementId(7);
    engine.host_mut().attach(button);
    engine.host_mut().set_active(Some(button));
    engine.host_mut().set_default_focus(ElementId(99));

    let id = open(&mut engine, Variant::Confirmation);
    engine.host_mut().detach(button);
    engine.close(id);
    assert_eq!(engine.host().active_element(), Some(ElementId(99)));
}

#[test]
fn focus_escaping_the_trap_is_pulled_back() {
    let (mut engine, _) = engine(OverlayConfig::default());
    let id = open(&mut engine, Variant::Form);
    let items = ScriptedHost::generated_focusables(id);

    assert!(engine.handle_input(InputEvent::FocusIn(ElementId(500))));
    assert_eq!(engine.host().active_element(), Some(items[0]));
    assert!(!engine.handle_input(InputEvent::FocusIn(items[2])));
}

// =============================================================================
// Scroll lock
// =============================================================================

#[test]
fn scroll_lock_spans_the_whole_busy_period() {
    let (mut engine, _) = engine(OverlayConfig::default());
    engine.host_mut().set_scroll(ScrollPosition::new(0.0, 420.0));
    engine.host_mut().set_scrollbar_width(15.0);

    open(&mut engine, Variant::Confirmation);
    open(&mut engine, Variant::Gallery);
    assert!(engine.host().is_scroll_locked());
    assert_eq!(engine.host().compensation(), 15.0);
    assert!(engine.views().scroll_locked().get());

    engine.close_all();
    assert!(engine.stack_ids().is_empty());
    assert_eq!(engine.host().lock_calls(), [true, false]);
    assert_eq!(engine.host().scroll(), ScrollPosition::new(0.0, 420.0));
    assert!(!engine.views().scroll_locked().get());
}

#[test]
fn serial_handoff_keeps_the_lock() {
    let (mut engine, _) = engine(OverlayConfig::default().queue_policy(QueuePolicy::Serial));
    let first = open(&mut engine, Variant::Notification);
    let second = open(&mut engine, Variant::Notification);
    engine.close(first);
    assert_eq!(engine.status(second), Some(OverlayStatus::Open));
    assert_eq!(engine.host().lock_calls(), [true]);
}

#[test]
fn derived_views_track_serial_handoff() {
    let (mut engine, _) = engine(OverlayConfig::default().queue_policy(QueuePolicy::Serial));
    let busy = engine.views().is_busy();
    let top = engine.views().top_variant();
    assert!(!busy.get());

    let form = open(&mut engine, Variant::Form);
    let gallery = open(&mut engine, Variant::Gallery);
    assert_eq!(engine.status(gallery), Some(OverlayStatus::Queued));
    assert_eq!(top.get(), Some(Variant::Form));
    assert_eq!(engine.views().depth().get(), 1);

    engine.close(form);
    assert_eq!(top.get(), Some(Variant::Gallery));
    assert!(busy.get());

    engine.close(gallery);
    assert!(!busy.get());
    assert_eq!(top.get(), None);
}

// =============================================================================
// Dismissal
// =============================================================================

#[test]
fn loading_ignores_user_dismissal() {
    let (mut engine, _) = engine(OverlayConfig::default().max_stack_depth(2));
    let confirm = variants::confirmation(&mut engine, json!({})).unwrap().id();
    let loading = variants::loading(&mut engine, json!({ "label": "Saving" }))
        .unwrap()
        .id();
    assert_eq!(engine.stack_ids(), vec![confirm, loading]);
    assert_eq!(engine.top(), Some(loading));
    assert_eq!(engine.focus_owner(), Some(loading));
    assert!(engine.query(confirm).unwrap().z_index < engine.query(loading).unwrap().z_index);

    assert!(!engine.handle_input(escape()));
    assert!(!engine.handle_input(InputEvent::BackdropClick { target: loading }));
    // Only the top overlay's backdrop counts.
    assert!(!engine.handle_input(InputEvent::BackdropClick { target: confirm }));
    assert_eq!(engine.status(loading), Some(OverlayStatus::Open));

    let form = open(&mut engine, Variant::Form);
    assert_eq!(engine.status(form), Some(OverlayStatus::Queued));

    engine.close(loading);
    assert_eq!(engine.status(form), Some(OverlayStatus::Open));
    assert_eq!(engine.stack_ids(), vec![confirm, form]);
    assert_eq!(engine.query(form).unwrap().z_index, Some(1010));
}

#[test]
fn backdrop_click_closes_the_top() {
    let (mut engine, _) = engine(OverlayConfig::default());
    let id = variants::video(&mut engine, json!({ "src": "intro.mp4" }))
        .unwrap()
        .id();
    assert!(engine.handle_input(InputEvent::BackdropClick { target: id }));
    assert_eq!(
        engine.query(id).unwrap().close_reason,
        Some(CloseReason::Dismissed {
            trigger: DismissTrigger::Backdrop
        })
    );
    assert_eq!(engine.analytics().summary().dismissals_by(DismissTrigger::Backdrop), 1);
}

#[test]
fn global_switches_gate_escape_and_backdrop() {
    let mut config = OverlayConfig::default();
    config.dismiss_on_escape = false;
    config.dismiss_on_backdrop_click = false;
    let (mut engine, _) = engine(config);
    let id = variants::gallery(&mut engine, json!({})).unwrap().id();
    assert!(!engine.handle_input(escape()));
    assert!(!engine.handle_input(InputEvent::BackdropClick { target: id }));
    assert_eq!(engine.status(id), Some(OverlayStatus::Open));
}

#[test]
fn notifications_auto_dismiss() {
    let (mut engine, clock) = engine(OverlayConfig::default());
    let toast = variants::notification(&mut engine, json!({ "text": "Saved" }))
        .unwrap()
        .id();
    let sticky = engine
        .open(
            Variant::Notification,
            json!({ "text": "Offline" }),
            OpenOptions::new().auto_dismiss(Duration::ZERO),
        )
        .unwrap()
        .id();

    clock.advance_ms(4999);
    engine.tick();
    assert_eq!(engine.status(toast), Some(OverlayStatus::Open));

    clock.advance_ms(1);
    engine.tick();
    assert_eq!(engine.status(toast), Some(OverlayStatus::Closed));
    assert_eq!(engine.status(sticky), Some(OverlayStatus::Open));
    assert_eq!(
        engine.analytics().summary().dismissals_by(DismissTrigger::AutoDismiss),
        1
    );
}

// =============================================================================
// Gestures
// =============================================================================

fn drag(
    engine: &mut OverlayEngine<ScriptedHost>,
    clock: &ManualClock,
    target: OverlayId,
    path: &[f64],
) -> bool {
    let pointer = PointerId(1);
    engine.handle_input(InputEvent::PointerDown {
        target,
        pointer,
        position: Point::new(0.0, 0.0),
    });
    let (last, moves) = path.split_last().unwrap();
    for y in moves {
        clock.advance_ms(100);
        engine.handle_input(InputEvent::PointerMove {
            pointer,
            position: Point::new(0.0, *y),
        });
    }
    clock.advance_ms(100);
    engine.handle_input(InputEvent::PointerUp {
        pointer,
        position: Point::new(0.0, *last),
    })
}

#[test]
fn short_slow_drag_snaps_back() {
    let (mut engine, clock) = engine(OverlayConfig::default());
    let id = variants::notification(&mut engine, json!({})).unwrap().id();
    engine.host_mut().set_extent(id, 400.0);
    let (log, _sub) = record_events(&engine);

    assert!(drag(&mut engine, &clock, id, &[50.0, 60.0]));
    assert_eq!(engine.status(id), Some(OverlayStatus::Open));
    assert!(engine.gesture_state().is_none());
    assert!(log.borrow().contains(&OverlayEvent::DragReleased {
        id,
        committed: false
    }));
}

#[test]
fn long_drag_commits_with_the_gesture_preset() {
    let (mut engine, clock) = engine(OverlayConfig::default());
    let id = variants::notification(&mut engine, json!({})).unwrap().id();
    engine.host_mut().set_extent(id, 400.0);

    assert!(drag(&mut engine, &clock, id, &[100.0, 160.0]));
    assert_eq!(
        engine.query(id).unwrap().close_reason,
        Some(CloseReason::Dismissed {
            trigger: DismissTrigger::Gesture
        })
    );
    let exit = engine.host().transitions().last().unwrap();
    assert_eq!(exit.phase, TransitionPhase::Exit);
    assert_eq!(exit.preset, "gesture-dismiss");
}

#[test]
fn fast_short_flick_commits_on_velocity() {
    let (mut engine, clock) = engine(OverlayConfig::default());
    let id = variants::notification(&mut engine, json!({})).unwrap().id();
    engine.host_mut().set_extent(id, 400.0);

    // 120px is under 0.35 * 400, but 120px in 100ms is 1200px/s.
    assert!(drag(&mut engine, &clock, id, &[120.0]));
    assert_eq!(engine.status(id), Some(OverlayStatus::Closed));
    assert_eq!(
        engine.query(id).unwrap().close_reason,
        Some(CloseReason::Dismissed {
            trigger: DismissTrigger::Gesture
        })
    );
}

#[test]
fn covered_overlay_drag_snaps_back() {
    let (mut engine, clock) = engine(OverlayConfig::default());
    let lower = variants::notification(&mut engine, json!({})).unwrap().id();
    engine.host_mut().set_extent(lower, 400.0);
    let (log, _sub) = record_events(&engine);
    let pointer = PointerId(1);
    assert!(engine.handle_input(InputEvent::PointerDown {
        target: lower,
        pointer,
        position: Point::new(0.0, 0.0),
    }));

    let upper = variants::confirmation(&mut engine, json!({})).unwrap().id();
    assert_eq!(engine.top(), Some(upper));
    assert!(engine.gesture_state().is_none());
    assert!(log.borrow().contains(&OverlayEvent::DragReleased {
        id: lower,
        committed: false
    }));

    // The rest of the abandoned drag goes nowhere.
    clock.advance_ms(100);
    assert!(!engine.handle_input(InputEvent::PointerMove {
        pointer,
        position: Point::new(0.0, 100.0),
    }));
    clock.advance_ms(100);
    assert!(!engine.handle_input(InputEvent::PointerUp {
        pointer,
        position: Point::new(0.0, 300.0),
    }));
    assert_eq!(engine.status(lower), Some(OverlayStatus::Open));
    assert_eq!(engine.status(upper), Some(OverlayStatus::Open));
}

#[test]
fn gestures_need_the_policy_flag() {
    let (mut engine, clock) = engine(OverlayConfig::default());
    let id = variants::confirmation(&mut engine, json!({})).unwrap().id();
    assert!(!drag(&mut engine, &clock, id, &[300.0, 500.0]));
    assert_eq!(engine.status(id), Some(OverlayStatus::Open));
}

#[traced_test]
#[test]
fn second_pointer_is_a_conflict() {
    let (mut engine, _) = engine(OverlayConfig::default());
    let id = variants::gallery(&mut engine, json!({})).unwrap().id();
    assert!(engine.handle_input(InputEvent::PointerDown {
        target: id,
        pointer: PointerId(1),
        position: Point::default(),
    }));
    assert!(!engine.handle_input(InputEvent::PointerDown {
        target: id,
        pointer: PointerId(2),
        position: Point::default(),
    }));
    assert_eq!(
        engine
            .analytics()
            .summary()
            .errors_of(OverlayErrorKind::GestureConflict),
        1
    );
    assert!(logs_contain("conflicting gesture"));
    // The first drag is untouched.
    assert_eq!(engine.gesture_state().unwrap().overlay, id);
    assert!(engine.handle_input(InputEvent::PointerCancel {
        pointer: PointerId(1)
    }));
    assert!(engine.gesture_state().is_none());
}

// =============================================================================
// Queueing
// =============================================================================

#[test]
fn serial_policy_is_fifo_within_priority() {
    let (mut engine, _) = engine(OverlayConfig::default().queue_policy(QueuePolicy::Serial));
    let n1 = open(&mut engine, Variant::Notification);
    let n2 = open(&mut engine, Variant::Notification);
    let n3 = open(&mut engine, Variant::Notification);
    let urgent = engine
        .open(Variant::Notification, json!({}), OpenOptions::new().priority(5))
        .unwrap()
        .id();
    assert_eq!(engine.queue_len(), 3);
    assert_eq!(engine.views().queue_len().get(), 3);

    engine.close(n1);
    assert_eq!(engine.status(urgent), Some(OverlayStatus::Open));
    engine.close(urgent);
    assert_eq!(engine.status(n2), Some(OverlayStatus::Open));
    engine.close(n2);
    assert_eq!(engine.status(n3), Some(OverlayStatus::Open));
    assert_eq!(engine.queue_len(), 0);
}

#[test]
fn dedupe_returns_the_live_instance() {
    let (mut engine, _) = engine(OverlayConfig::default());
    let (log, _sub) = record_events(&engine);
    let options = || OpenOptions::new().dedupe_key("settings");
    let first = engine.open(Variant::Form, json!({ "v": 1 }), options()).unwrap();
    let again = engine.open(Variant::Form, json!({ "v": 2 }), options()).unwrap();
    assert_eq!(first, again);
    assert_eq!(engine.query(first.id()).unwrap().props, json!({ "v": 2 }));
    assert!(log.borrow().contains(&OverlayEvent::Refreshed { id: first.id() }));
    assert_eq!(engine.analytics().summary().requested, 1);

    first.close(&mut engine);
    let fresh = engine.open(Variant::Form, json!({ "v": 3 }), options()).unwrap();
    assert_ne!(fresh, first);
}

#[test]
fn dedupe_without_refresh_keeps_props() {
    let mut config = OverlayConfig::default();
    config.refresh_on_dedupe = false;
    let (mut engine, _) = engine(config);
    let options = || OpenOptions::new().dedupe_key("k");
    let first = engine.open(Variant::Form, json!({ "v": 1 }), options()).unwrap();
    engine.open(Variant::Form, json!({ "v": 2 }), options()).unwrap();
    assert_eq!(engine.query(first.id()).unwrap().props, json!({ "v": 1 }));
}

#[test]
fn overflow_drops_the_newest_lowest_priority_request() {
    let (mut engine, _) = engine(
        OverlayConfig::default()
            .queue_policy(QueuePolicy::Serial)
            .queue_capacity(2),
    );
    open(&mut engine, Variant::Notification);
    let kept = open(&mut engine, Variant::Notification);
    let important = engine
        .open(Variant::Notification, json!({}), OpenOptions::new().priority(1))
        .unwrap()
        .id();
    let dropped = open(&mut engine, Variant::Notification);

    assert_eq!(engine.status(kept), Some(OverlayStatus::Queued));
    assert_eq!(engine.status(important), Some(OverlayStatus::Queued));
    assert_eq!(
        engine.query(dropped).unwrap().close_reason,
        Some(CloseReason::QueueOverflow)
    );
    assert_eq!(
        engine
            .analytics()
            .summary()
            .errors_of(OverlayErrorKind::QueueOverflow),
        1
    );
}

#[test]
fn close_all_discards_the_queue() {
    let (mut engine, clock) = engine(OverlayConfig::default());
    engine.host_mut().set_transition_ack(TransitionAck::Timed);
    let entering = open(&mut engine, Variant::Form);
    let waiting = open(&mut engine, Variant::Gallery);

    engine.close_all();
    assert_eq!(
        engine.query(waiting).unwrap().close_reason,
        Some(CloseReason::Cancelled)
    );
    assert_eq!(engine.status(entering), Some(OverlayStatus::Entering));

    for _ in 0..4 {
        clock.advance_ms(250);
        engine.tick();
    }
    assert_eq!(engine.status(entering), Some(OverlayStatus::Closed));
    assert!(!engine.is_scroll_locked());
    assert_eq!(engine.queue_len(), 0);
}

// =============================================================================
// Failures
// =============================================================================

#[traced_test]
#[test]
fn callback_timeout_is_recorded_once() {
    let (mut engine, clock) = engine(OverlayConfig::default());
    engine.host_mut().set_transition_ack(TransitionAck::Callback);
    let id = open(&mut engine, Variant::Form);

    clock.advance_ms(1149);
    engine.tick();
    assert_eq!(engine.status(id), Some(OverlayStatus::Entering));

    clock.advance_ms(1);
    engine.tick();
    assert_eq!(engine.status(id), Some(OverlayStatus::Open));
    // A late host callback changes nothing.
    engine.transition_finished(id);

    let summary = engine.analytics().summary().clone();
    assert_eq!(summary.errors_of(OverlayErrorKind::AnimationTimeout), 1);
    assert_eq!(
        engine.analytics().instance(id).unwrap().errors,
        vec![OverlayErrorKind::AnimationTimeout]
    );
    assert!(logs_contain(&format!("enter transition of {id} timed out")));
}

#[test]
fn callback_completion_settles_early() {
    let (mut engine, clock) = engine(OverlayConfig::default());
    engine.host_mut().set_transition_ack(TransitionAck::Callback);
    let id = open(&mut engine, Variant::Form);
    assert_eq!(engine.active_transition().unwrap().overlay, id);

    clock.advance_ms(40);
    engine.transition_finished(id);
    assert_eq!(engine.status(id), Some(OverlayStatus::Open));
    assert!(engine.active_transition().is_none());
    assert_eq!(engine.analytics().summary().total_errors(), 0);
}

#[test]
fn mount_failure_closes_without_side_effects() {
    let (mut engine, _) = engine(OverlayConfig::default());
    engine.host_mut().fail_mounts(true);
    let (log, _sub) = record_events(&engine);

    let failed = open(&mut engine, Variant::Confirmation);
    let snapshot = engine.query(failed).unwrap();
    assert_eq!(snapshot.status, OverlayStatus::Closed);
    assert!(matches!(snapshot.close_reason, Some(CloseReason::MountFailed { .. })));
    assert!(engine.host().lock_calls().is_empty());
    assert!(engine.stack_ids().is_empty());
    assert!(
        log.borrow()
            .iter()
            .any(|e| matches!(e, OverlayEvent::Error(err) if err.kind() == OverlayErrorKind::Mount))
    );

    engine.host_mut().fail_mounts(false);
    let ok = open(&mut engine, Variant::Confirmation);
    assert_eq!(engine.status(ok), Some(OverlayStatus::Open));
    assert_eq!(engine.host().live_roots(), 1);
}

#[test]
fn portal_roots_are_shared_and_removed_last() {
    let (mut engine, _) = engine(OverlayConfig::default());
    let a = open(&mut engine, Variant::Confirmation);
    let b = open(&mut engine, Variant::Form);
    assert_eq!(engine.host().created_roots().len(), 1);
    engine.close(a);
    assert_eq!(engine.host().live_roots(), 1);
    engine.close(b);
    assert_eq!(engine.host().live_roots(), 0);
}

#[test]
fn analytics_measure_time_to_mount_and_open_time() {
    let (mut engine, clock) = engine(OverlayConfig::default());
    engine.host_mut().set_transition_ack(TransitionAck::Timed);
    let id = open(&mut engine, Variant::Form);
    clock.advance_ms(150);
    engine.tick();
    clock.advance_ms(1000);
    engine.close(id);
    clock.advance_ms(120);
    engine.tick();

    let summary = engine.views().analytics().get();
    assert_eq!(summary.opened, 1);
    assert_eq!(summary.closed, 1);
    assert_eq!(summary.mean_time_to_mount(), Some(Duration::from_millis(150)));
    assert_eq!(summary.mean_open_time(), Some(Duration::from_millis(1120)));
}
