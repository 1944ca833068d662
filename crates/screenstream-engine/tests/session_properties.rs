//! Model-based checks over random host and OS interleavings.

mod common;

use std::time::{Duration, Instant};

use common::Harness;
use proptest::prelude::*;
use screenstream_capture::PlatformError;
use screenstream_ipc::{SessionCommand, SessionConfig, SessionEvent, SessionState};

#[derive(Debug, Clone)]
enum Op {
    Start,
    Stop,
    Confirm,
    Cancel,
    Started,
    Finished,
    Failed,
    Paused,
    Resumed,
    Frames(u8),
    Deadline,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Start),
        2 => Just(Op::Stop),
        3 => Just(Op::Confirm),
        1 => Just(Op::Cancel),
        3 => Just(Op::Started),
        2 => Just(Op::Finished),
        1 => Just(Op::Failed),
        1 => Just(Op::Paused),
        1 => Just(Op::Resumed),
        4 => (0u8..20).prop_map(Op::Frames),
        1 => Just(Op::Deadline),
    ]
}

fn harness() -> Harness {
    Harness::with_config(SessionConfig {
        frame_update_interval: 3,
        transition_timeout_ms: Some(1_000),
        ..Default::default()
    })
}

fn apply(h: &mut Harness, op: &Op) {
    match op {
        Op::Start => h.start(),
        Op::Stop => h.stop(),
        Op::Confirm => {
            h.os(|p| p.confirm_picker());
        }
        Op::Cancel => h.os(|p| p.cancel_picker()),
        Op::Started => h.os(|p| p.broadcast_started()),
        Op::Finished => h.os(|p| p.broadcast_finished()),
        Op::Failed => h.os(|p| p.broadcast_failed(PlatformError::ExtensionCrashed)),
        Op::Paused => h.os(|p| p.broadcast_paused()),
        Op::Resumed => h.os(|p| p.broadcast_resumed()),
        Op::Frames(n) => h.os(|p| p.deliver_frames(u64::from(*n))),
        Op::Deadline => h
            .controller
            .check_deadline(Instant::now() + Duration::from_secs(3_600)),
    }
}

fn unreleased(h: &Harness) -> u64 {
    (1..=h.platform.controllers_created())
        .map(|id| 1 - u64::from(h.releases(id)))
        .sum()
}

fn check_handles(h: &Harness) -> Result<(), TestCaseError> {
    for id in 1..=h.platform.controllers_created() {
        prop_assert!(h.releases(id) <= 1, "controller {} released twice", id);
    }

    let holds = h.controller.holds_handle();
    prop_assert_eq!(unreleased(h), u64::from(holds));

    let state = h.state();
    let expects_handle = matches!(
        state,
        SessionState::Starting | SessionState::Streaming | SessionState::Stopping
    );
    prop_assert_eq!(holds, expects_handle, "state {:?}", state);

    let snapshot = h.controller.snapshot();
    prop_assert_eq!(snapshot.session.is_some(), state.is_active());
    Ok(())
}

/// Walk the event stream and check ordering between sessions.
fn check_events(events: &[SessionEvent]) -> Result<(), TestCaseError> {
    let mut live = false;
    let mut last_count = 0;

    for event in events {
        match event {
            SessionEvent::Started => {
                prop_assert!(!live, "second Started without a terminal event");
                live = true;
                last_count = 0;
            }
            SessionEvent::FrameCountUpdated { frame_count } => {
                prop_assert!(live, "frame update outside a live session");
                prop_assert!(*frame_count > last_count);
                prop_assert_eq!(frame_count % 3, 0);
                last_count = *frame_count;
            }
            SessionEvent::Stopped { frame_count } => {
                if live {
                    prop_assert!(*frame_count >= last_count);
                } else {
                    prop_assert_eq!(*frame_count, 0);
                }
                live = false;
            }
            SessionEvent::Paused | SessionEvent::Resumed => {
                prop_assert!(live, "pause change outside a live session");
            }
            other if other.is_terminal() => live = false,
            _ => {}
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_random_interleavings_keep_invariants(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut h = harness();
        let mut events = Vec::new();

        for op in &ops {
            apply(&mut h, op);
            check_handles(&h)?;
            events.extend(h.events());
        }

        prop_assert!(!h.command(SessionCommand::Shutdown));
        events.extend(h.events());

        check_events(&events)?;
        prop_assert!(h.state().is_idle());
        for id in 1..=h.platform.controllers_created() {
            prop_assert_eq!(h.releases(id), 1, "controller {} not released exactly once", id);
        }
    }

    #[test]
    fn test_frames_are_counted_only_while_streaming(batches in prop::collection::vec(0u8..20, 1..10)) {
        let mut h = harness();
        h.os(|p| p.deliver_frames(5));
        prop_assert!(h.events().is_empty());

        h.start_streaming();
        let total: u64 = batches.iter().map(|&n| u64::from(n)).sum();
        for n in &batches {
            h.os(|p| p.deliver_frames(u64::from(*n)));
        }
        prop_assert_eq!(h.controller.snapshot().frame_count, total);

        h.stop();
        h.os(|p| p.deliver_frames(7));
        h.os(|p| p.broadcast_finished());

        let events = h.events();
        prop_assert_eq!(events.last(), Some(&SessionEvent::Stopped { frame_count: total }));
        let updates = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::FrameCountUpdated { .. }))
            .count() as u64;
        prop_assert_eq!(updates, total / 3);
    }
}
