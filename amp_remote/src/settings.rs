use amp_protocol::{codec, mode, DeviceSettings, Effect, EffectFlags, ModeCode, Param, ParameterSet};
use serde::Serialize;

/// In-memory record of what the user sees: effect flags, parameter values, and
/// whether the next exchange is the start-up fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsState {
    flags: EffectFlags,
    params: ParameterSet,
    first_exchange: bool,
    dirty: bool,
}

impl Default for SettingsState {
    fn default() -> Self {
        Self {
            flags: EffectFlags::ALL_ON,
            params: ParameterSet::default(),
            first_exchange: true,
            dirty: false,
        }
    }
}

impl SettingsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(&self) -> EffectFlags {
        self.flags
    }

    pub fn mode(&self) -> ModeCode {
        mode::encode(self.flags)
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn get(&self, param: Param) -> f64 {
        self.params.get(param)
    }

    pub fn is_first_exchange(&self) -> bool {
        self.first_exchange
    }

    /// True when the user has edited something that has not been sent yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn toggle_effect(&mut self, effect: Effect) -> bool {
        self.dirty = true;
        self.flags.toggle(effect)
    }

    /// Stores a clamped UI value and returns what was stored.
    pub fn set_param(&mut self, param: Param, value: f64) -> f64 {
        let value = param.clamp_ui(value);
        self.params.set(param, value);
        self.dirty = true;
        value
    }

    pub fn device_settings(&self) -> DeviceSettings {
        DeviceSettings {
            flags: self.flags,
            params: self.params,
        }
    }

    pub fn request_line(&self) -> String {
        codec::build_request(self.first_exchange, &self.device_settings())
    }

    /// Replaces flags and parameters with what the device reported, clamped to
    /// the UI ranges. Returns what was stored.
    pub fn apply_device_settings(&mut self, settings: DeviceSettings) -> DeviceSettings {
        self.flags = settings.flags;
        for (param, value) in settings.params.iter() {
            self.params.set(param, param.clamp_ui(value));
        }
        self.device_settings()
    }

    pub fn mark_sent(&mut self) {
        self.dirty = false;
    }

    pub fn complete_exchange(&mut self) {
        self.first_exchange = false;
    }

    pub fn labels(&self) -> Vec<String> {
        self.params.iter().map(|(p, v)| p.label(v)).collect()
    }
}
