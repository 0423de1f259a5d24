use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// The six continuous effect parameters, in request field order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    Rate,
    Depth,
    Delay,
    Feedback,
    Gain,
    Mix,
}

impl Param {
    pub const ALL: [Param; 6] = [
        Param::Rate,
        Param::Depth,
        Param::Delay,
        Param::Feedback,
        Param::Gain,
        Param::Mix,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Param::Rate => "rate",
            Param::Depth => "depth",
            Param::Delay => "delay",
            Param::Feedback => "feedback",
            Param::Gain => "gain",
            Param::Mix => "mix",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Param::Rate => "Rate",
            Param::Depth => "Depth",
            Param::Delay => "Delay",
            Param::Feedback => "Feedback",
            Param::Gain => "Gain",
            Param::Mix => "Mix",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Param::Rate => "cps",
            Param::Delay => "ms",
            Param::Depth | Param::Feedback | Param::Gain | Param::Mix => "%",
        }
    }

    pub fn ui_range(self) -> RangeInclusive<f64> {
        match self {
            Param::Rate => 1.0..=10.0,
            Param::Depth => 0.0..=100.0,
            Param::Delay => 1.0..=1000.0,
            Param::Feedback => 0.0..=95.0,
            Param::Gain => 0.0..=10.0,
            Param::Mix => 0.0..=100.0,
        }
    }

    pub fn ui_step(self) -> f64 {
        1.0
    }

    pub fn default_value(self) -> f64 {
        match self {
            Param::Rate => 5.0,
            Param::Depth => 50.0,
            Param::Delay => 500.0,
            Param::Feedback => 50.0,
            Param::Gain => 5.0,
            Param::Mix => 50.0,
        }
    }

    /// Clamps a UI value into the parameter's range. NaN maps to the lower bound,
    /// so delay can never reach the device as zero or negative.
    pub fn clamp_ui(self, value: f64) -> f64 {
        let range = self.ui_range();
        if value.is_nan() {
            return *range.start();
        }
        value.clamp(*range.start(), *range.end())
    }

    /// Renders the label shown next to a control, e.g. `Delay: 500 ms`.
    pub fn label(self, value: f64) -> String {
        format!("{}: {} {}", self.display_name(), value, self.unit())
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Param {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        Param::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(t))
            .ok_or_else(|| format!("unknown parameter: {t}"))
    }
}

/// Maps a UI value to device units. Callers clamp first (see [`Param::clamp_ui`]).
pub fn to_device(param: Param, ui: f64) -> f64 {
    match param {
        Param::Rate => ui,
        Param::Depth => ui / 100.0,
        Param::Delay => ui * 48.0,
        Param::Feedback => ui / 100.0,
        Param::Gain => (ui * 0.9) + 2.0,
        Param::Mix => ui / 500.0,
    }
}

/// Maps a device value back to UI units, rounded to two decimals.
pub fn to_ui(param: Param, device: f64) -> f64 {
    let ui = match param {
        Param::Rate => device,
        Param::Depth => device * 100.0,
        Param::Delay => device / 48.0,
        Param::Feedback => device * 100.0,
        Param::Gain => (device - 2.0) / 0.9,
        Param::Mix => device * 500.0,
    };
    round_decimal(ui, 2)
}

/// Rounds half away from zero at `places` decimals, operating on the shortest decimal
/// representation of `value` rather than its binary expansion: `1.005` becomes `1.01`.
pub fn round_decimal(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let shifted = shift_exponent(value, places).round();
    // `+ 0.0` folds a negative zero into zero.
    shift_exponent(shifted, -places) + 0.0
}

fn shift_exponent(value: f64, places: i32) -> f64 {
    let repr = format!("{value:e}");
    let (mantissa, exp) = repr.split_once('e').unwrap_or((repr.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    format!("{mantissa}e{}", exp + places)
        .parse()
        .unwrap_or(value)
}
