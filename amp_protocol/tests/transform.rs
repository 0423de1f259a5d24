use amp_protocol::{round_decimal, to_device, to_ui, Param};

fn ui_steps(param: Param) -> Vec<f64> {
    let range = param.ui_range();
    let mut v = *range.start();
    let mut out = Vec::new();
    while v <= *range.end() {
        out.push(v);
        v += param.ui_step();
    }
    out
}

#[test]
fn every_ui_step_survives_the_device_round_trip() {
    for param in Param::ALL {
        for v in ui_steps(param) {
            let back = to_ui(param, to_device(param, v));
            assert_eq!(back, round_decimal(v, 2), "{param} at {v}");
        }
    }
}

#[test]
fn device_transforms_match_the_parameter_table() {
    assert_eq!(to_device(Param::Rate, 7.0), 7.0);
    assert_eq!(to_device(Param::Depth, 50.0), 0.5);
    assert_eq!(to_device(Param::Delay, 500.0), 24000.0);
    assert_eq!(to_device(Param::Feedback, 95.0), 0.95);
    assert_eq!(to_device(Param::Gain, 5.0), 6.5);
    assert_eq!(to_device(Param::Gain, 0.0), 2.0);
    assert_eq!(to_device(Param::Mix, 50.0), 0.1);
}

#[test]
fn to_ui_rounds_to_two_decimals() {
    assert_eq!(to_ui(Param::Delay, 1000.0), 20.83);
    assert_eq!(to_ui(Param::Gain, 3.0), 1.11);
    assert_eq!(to_ui(Param::Rate, 2.345), 2.35);
}

#[test]
fn rounding_uses_the_decimal_representation() {
    // 1.005 is stored as 1.00499999999999989... in binary.
    assert_eq!(round_decimal(1.005, 2), 1.01);
    assert_eq!(round_decimal(2.675, 2), 2.68);
    assert_eq!(round_decimal(-1.005, 2), -1.01);
    assert_eq!(round_decimal(0.125, 2), 0.13);
    assert_eq!(round_decimal(1234.5678, 2), 1234.57);
    assert_eq!(round_decimal(-0.001, 2), 0.0);
    assert!(round_decimal(f64::NAN, 2).is_nan());
}

#[test]
fn delay_is_clamped_to_one_before_transform() {
    assert_eq!(Param::Delay.clamp_ui(0.0), 1.0);
    assert_eq!(Param::Delay.clamp_ui(-25.0), 1.0);
    assert_eq!(Param::Delay.clamp_ui(f64::NAN), 1.0);
    assert_eq!(to_device(Param::Delay, Param::Delay.clamp_ui(0.0)), 48.0);
    assert_eq!(Param::Delay.clamp_ui(2000.0), 1000.0);
    assert_eq!(Param::Feedback.clamp_ui(99.0), 95.0);
}

#[test]
fn labels_carry_units() {
    assert_eq!(Param::Rate.label(5.0), "Rate: 5 cps");
    assert_eq!(Param::Delay.label(500.0), "Delay: 500 ms");
    assert_eq!(Param::Gain.label(5.56), "Gain: 5.56 %");
}

#[test]
fn params_parse_by_name() {
    assert_eq!("Delay".parse::<Param>(), Ok(Param::Delay));
    assert_eq!(" mix ".parse::<Param>(), Ok(Param::Mix));
    assert!("volume".parse::<Param>().is_err());
}
