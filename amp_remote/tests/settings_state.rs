use amp_protocol::{parse_response, Effect, EffectFlags, Param};
use amp_remote::{AmpConfig, SettingsState};
use std::time::Duration;

#[test]
fn session_starts_with_every_effect_on_and_default_values() {
    let state = SettingsState::new();
    assert_eq!(state.flags(), EffectFlags::ALL_ON);
    assert_eq!(state.mode().value(), 7);
    assert_eq!(state.get(Param::Rate), 5.0);
    assert_eq!(state.get(Param::Depth), 50.0);
    assert_eq!(state.get(Param::Delay), 500.0);
    assert_eq!(state.get(Param::Feedback), 50.0);
    assert_eq!(state.get(Param::Gain), 5.0);
    assert_eq!(state.get(Param::Mix), 50.0);
    assert!(state.is_first_exchange());
    assert!(!state.is_dirty());
    assert_eq!(state.request_line(), "GET /putsets HTTP/1.1\r\n");
}

#[test]
fn edits_are_clamped_and_mark_the_state_dirty() {
    let mut state = SettingsState::new();
    assert_eq!(state.set_param(Param::Delay, 0.0), 1.0);
    assert_eq!(state.set_param(Param::Delay, -3.0), 1.0);
    assert!(state.is_dirty());
    assert_eq!(state.set_param(Param::Mix, 12.0), 12.0);

    state.mark_sent();
    assert!(!state.is_dirty());
    assert!(!state.toggle_effect(Effect::Tremolo));
    assert!(state.is_dirty());
    assert_eq!(state.mode().value(), 6);
}

#[test]
fn request_switches_to_apply_after_the_first_exchange() {
    let mut state = SettingsState::new();
    state.toggle_effect(Effect::Echo);
    state.complete_exchange();
    assert_eq!(
        state.request_line(),
        "GET /getsets/ 5 5 0.5 24000 0.5 6.5 0.1 HTTP/1.1\r\n"
    );
}

#[test]
fn labels_follow_request_order() {
    let state = SettingsState::new();
    assert_eq!(
        state.labels(),
        vec![
            "Rate: 5 cps",
            "Depth: 50 %",
            "Delay: 500 ms",
            "Feedback: 50 %",
            "Gain: 5 %",
            "Mix: 50 %",
        ]
    );
}

#[test]
fn config_defaults_point_at_the_access_point() {
    let config = AmpConfig::default();
    assert_eq!(config.endpoint(), "192.168.4.1:80");
    assert_eq!(config.exit_grace, Duration::from_secs(5));

    let config = config.with_endpoint("127.0.0.1", 8080);
    assert_eq!(config.endpoint(), "127.0.0.1:8080");
}

#[test]
fn device_values_outside_the_ui_range_are_clamped_on_apply() {
    // 0 and 24 both decode below the 1 ms delay floor; gain 20 decodes to 20.
    for (raw, delay) in [
        ("HTTP/1.1 200 OK SETS 7 0 5 6.5 0.5 0.5 0.1", 0.0),
        ("HTTP/1.1 200 OK SETS 7 24 5 6.5 0.5 0.5 0.1", 0.5),
    ] {
        let decoded = parse_response(raw).expect("well-formed response");
        assert_eq!(decoded.params.delay, delay);

        let mut state = SettingsState::new();
        let stored = state.apply_device_settings(decoded);
        assert_eq!(stored.params.delay, 1.0);
        assert_eq!(state.get(Param::Delay), 1.0);

        state.complete_exchange();
        assert_eq!(
            state.request_line(),
            "GET /getsets/ 7 5 0.5 48 0.5 6.5 0.1 HTTP/1.1\r\n"
        );
    }

    let decoded =
        parse_response("HTTP/1.1 200 OK SETS 7 24000 5 20 0.5 0.5 0.1").expect("well-formed");
    let mut state = SettingsState::new();
    assert_eq!(state.apply_device_settings(decoded).params.gain, 10.0);
}
