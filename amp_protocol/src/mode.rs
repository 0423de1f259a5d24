use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Tremolo,
    Echo,
    Distortion,
}

impl Effect {
    pub const ALL: [Effect; 3] = [Effect::Tremolo, Effect::Echo, Effect::Distortion];

    pub fn display_name(self) -> &'static str {
        match self {
            Effect::Tremolo => "Tremolo",
            Effect::Echo => "Echo",
            Effect::Distortion => "Distortion",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Effect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        Effect::ALL
            .into_iter()
            .find(|e| e.display_name().eq_ignore_ascii_case(t))
            .ok_or_else(|| format!("unknown effect: {t}"))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EffectFlags {
    pub tremolo: bool,
    pub echo: bool,
    pub distortion: bool,
}

impl EffectFlags {
    pub const ALL_ON: EffectFlags = EffectFlags::new(true, true, true);

    pub const fn new(tremolo: bool, echo: bool, distortion: bool) -> Self {
        Self {
            tremolo,
            echo,
            distortion,
        }
    }

    pub fn is_enabled(&self, effect: Effect) -> bool {
        match effect {
            Effect::Tremolo => self.tremolo,
            Effect::Echo => self.echo,
            Effect::Distortion => self.distortion,
        }
    }

    pub fn set(&mut self, effect: Effect, enabled: bool) {
        match effect {
            Effect::Tremolo => self.tremolo = enabled,
            Effect::Echo => self.echo = enabled,
            Effect::Distortion => self.distortion = enabled,
        }
    }

    /// Flips one effect and returns its new state.
    pub fn toggle(&mut self, effect: Effect) -> bool {
        let enabled = !self.is_enabled(effect);
        self.set(effect, enabled);
        enabled
    }
}

/// Device mode number: one of eight fixed codes, one per effect combination.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "i64", into = "u8")]
pub struct ModeCode(u8);

// Singles, then pairs, then the triple. Not a bitmask.
const MODE_TABLE: [(EffectFlags, u8); 8] = [
    (EffectFlags::new(false, false, false), 0),
    (EffectFlags::new(true, false, false), 1),
    (EffectFlags::new(false, true, false), 2),
    (EffectFlags::new(false, false, true), 3),
    (EffectFlags::new(true, true, false), 4),
    (EffectFlags::new(true, false, true), 5),
    (EffectFlags::new(false, true, true), 6),
    (EffectFlags::new(true, true, true), 7),
];

impl ModeCode {
    pub fn new(code: i64) -> Result<Self, ProtocolError> {
        decode(code).map(encode)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn flags(self) -> EffectFlags {
        MODE_TABLE
            .iter()
            .find(|(_, c)| *c == self.0)
            .map(|(flags, _)| *flags)
            .unwrap_or_default()
    }
}

impl From<EffectFlags> for ModeCode {
    fn from(flags: EffectFlags) -> Self {
        encode(flags)
    }
}

impl From<ModeCode> for u8 {
    fn from(code: ModeCode) -> Self {
        code.0
    }
}

impl TryFrom<i64> for ModeCode {
    type Error = ProtocolError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        ModeCode::new(code)
    }
}

impl fmt::Display for ModeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn encode(flags: EffectFlags) -> ModeCode {
    MODE_TABLE
        .iter()
        .find(|(f, _)| *f == flags)
        .map(|(_, code)| ModeCode(*code))
        .unwrap_or(ModeCode(0))
}

pub fn decode(code: i64) -> Result<EffectFlags, ProtocolError> {
    MODE_TABLE
        .iter()
        .find(|(_, c)| i64::from(*c) == code)
        .map(|(flags, _)| *flags)
        .ok_or(ProtocolError::InvalidModeCode(code))
}
