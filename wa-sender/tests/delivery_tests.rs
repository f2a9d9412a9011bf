mod common;

use std::path::PathBuf;
use std::sync::Arc;

use common::{instant_config, setup_logging, Call, RecordingEngine};
use wa_sender::config::SenderConfigBuilder;
use wa_sender::{Deliver, DeliveryEngine, Destination, Region, SenderError};

fn key(name: &str) -> Call {
    Call::Key(name.to_string())
}

fn combo(keys: &[&str]) -> Call {
    Call::Combo(keys.iter().map(|k| k.to_string()).collect())
}

/// The ladder up to (not including) the image rung, on a 1920x1080 screen.
fn ladder_head() -> Vec<Call> {
    vec![
        Call::ScreenSize,
        Call::Move(1824, 1026),
        Call::Click,
        key("enter"),
        key("enter"),
        key("enter"),
        combo(&["ctrl", "enter"]),
    ]
}

fn ladder_tail() -> Vec<Call> {
    vec![Call::ScreenSize, Call::Move(1881, 972), Call::Click, key("enter")]
}

#[test]
fn contact_attempt_runs_full_sequence() {
    setup_logging();
    let engine = Arc::new(RecordingEngine::default());
    let delivery = DeliveryEngine::new(engine.clone(), instant_config());

    delivery
        .attempt(&Destination::contact("+14155551234"), "Hola Ana")
        .unwrap();

    let mut expected = vec![Call::OpenContact {
        phone: "+14155551234".to_string(),
        message: "Hola Ana".to_string(),
    }];
    expected.extend(ladder_head());
    // the image cannot be loaded; the ladder moves on
    expected.push(Call::Locate(PathBuf::from("send_button.png")));
    expected.extend(ladder_tail());
    expected.push(combo(&["ctrl", "w"]));
    assert_eq!(engine.calls(), expected);
}

#[test]
fn visible_send_button_is_clicked_at_its_center() {
    let engine = Arc::new(RecordingEngine {
        image_region: Some(Region {
            left: 100,
            top: 200,
            width: 40,
            height: 20,
        }),
        ..Default::default()
    });
    let delivery = DeliveryEngine::new(engine.clone(), instant_config());

    delivery
        .attempt(&Destination::contact("+14155551234"), "hi")
        .unwrap();

    let calls = engine.calls();
    let locate = calls
        .iter()
        .position(|c| matches!(c, Call::Locate(_)))
        .unwrap();
    assert_eq!(calls[locate + 1], Call::ClickAt(120, 210));
}

#[test]
fn early_rung_failures_do_not_abort_the_attempt() {
    let engine = Arc::new(RecordingEngine {
        fail_screen_size: true,
        fail_combos: true,
        ..Default::default()
    });
    let config = SenderConfigBuilder::from_config(instant_config())
        .close_tab(false)
        .build()
        .unwrap();
    let delivery = DeliveryEngine::new(engine.clone(), config);

    delivery
        .attempt(&Destination::contact("+14155551234"), "hi")
        .unwrap();

    // every rung was still tried, and the final enter went through
    let calls = engine.calls();
    assert_eq!(calls.iter().filter(|c| **c == Call::ScreenSize).count(), 2);
    assert!(!calls.iter().any(|c| matches!(c, Call::Move(..) | Call::Click)));
    assert_eq!(calls.last(), Some(&key("enter")));
}

#[test]
fn final_rung_failure_fails_the_attempt() {
    let engine = Arc::new(RecordingEngine {
        fail_keys: true,
        ..Default::default()
    });
    let delivery = DeliveryEngine::new(engine.clone(), instant_config());

    let err = delivery
        .attempt(&Destination::contact("+14155551234"), "hi")
        .unwrap_err();
    match err {
        SenderError::Delivery { destination, .. } => {
            assert_eq!(destination, "contact +14155551234")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // the tab is left open when the attempt fails
    assert!(!engine.calls().contains(&combo(&["ctrl", "w"])));
}

#[test]
fn open_failure_skips_the_ladder() {
    let engine = Arc::new(RecordingEngine {
        failing_phones: ["+14155551234".to_string()].into_iter().collect(),
        ..Default::default()
    });
    let delivery = DeliveryEngine::new(engine.clone(), instant_config());

    let result = delivery.attempt(&Destination::contact("+14155551234"), "hi");
    assert!(matches!(result, Err(SenderError::Delivery { .. })));
    assert_eq!(engine.calls().len(), 1);
}

#[test]
fn keeping_the_tab_open_skips_the_close_combo() {
    let engine = Arc::new(RecordingEngine::default());
    let config = SenderConfigBuilder::from_config(instant_config())
        .close_tab(false)
        .send_button_image(None)
        .build()
        .unwrap();
    let delivery = DeliveryEngine::new(engine.clone(), config);

    delivery
        .attempt(&Destination::contact("+14155551234"), "hi")
        .unwrap();

    let mut expected = vec![Call::OpenContact {
        phone: "+14155551234".to_string(),
        message: "hi".to_string(),
    }];
    expected.extend(ladder_head());
    expected.extend(ladder_tail());
    assert_eq!(engine.calls(), expected);
}

#[test]
fn group_attempt_confirms_with_an_extra_enter() {
    let engine = Arc::new(RecordingEngine::default());
    let config = SenderConfigBuilder::from_config(instant_config())
        .send_button_image(None)
        .build()
        .unwrap();
    let delivery = DeliveryEngine::new(engine.clone(), config);

    delivery
        .attempt(&Destination::group("AbC123"), "Hola a todos")
        .unwrap();

    let mut expected = vec![Call::OpenGroup {
        group_id: "AbC123".to_string(),
        message: "Hola a todos".to_string(),
    }];
    expected.extend(ladder_head());
    expected.extend(ladder_tail());
    expected.push(key("enter"));
    expected.push(combo(&["ctrl", "w"]));
    assert_eq!(engine.calls(), expected);
}
