use crate::error::ProtocolError;
use crate::mode::{self, EffectFlags};
use crate::transform::{to_device, to_ui, Param};
use serde::{Deserialize, Serialize};

/// First request of a session: asks the device for its current settings.
pub const FETCH_REQUEST: &str = "GET /putsets HTTP/1.1\r\n";
pub const RESPONSE_TOKENS: usize = 11;

const APPLY_PREFIX: &str = "GET /getsets/";
const FETCH_PATH: &str = "/putsets";
const HTTP_SUFFIX: &str = "HTTP/1.1";
const RESPONSE_PREAMBLE: &str = "HTTP/1.1 200 OK SETS";
const RESPONSE_MODE_TOKEN: usize = 4;

// Replies use a different field order than requests.
const RESPONSE_FIELDS: [(Param, usize); 6] = [
    (Param::Delay, 5),
    (Param::Rate, 6),
    (Param::Gain, 7),
    (Param::Feedback, 8),
    (Param::Depth, 9),
    (Param::Mix, 10),
];

/// UI-facing parameter values.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    pub rate: f64,
    pub depth: f64,
    pub delay: f64,
    pub feedback: f64,
    pub gain: f64,
    pub mix: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            rate: Param::Rate.default_value(),
            depth: Param::Depth.default_value(),
            delay: Param::Delay.default_value(),
            feedback: Param::Feedback.default_value(),
            gain: Param::Gain.default_value(),
            mix: Param::Mix.default_value(),
        }
    }
}

impl ParameterSet {
    pub fn get(&self, param: Param) -> f64 {
        match param {
            Param::Rate => self.rate,
            Param::Depth => self.depth,
            Param::Delay => self.delay,
            Param::Feedback => self.feedback,
            Param::Gain => self.gain,
            Param::Mix => self.mix,
        }
    }

    pub fn set(&mut self, param: Param, value: f64) {
        match param {
            Param::Rate => self.rate = value,
            Param::Depth => self.depth = value,
            Param::Delay => self.delay = value,
            Param::Feedback => self.feedback = value,
            Param::Gain => self.gain = value,
            Param::Mix => self.mix = value,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Param, f64)> + '_ {
        Param::ALL.into_iter().map(|p| (p, self.get(p)))
    }
}

/// Everything one exchange carries: the effect flags and the parameter values.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceSettings {
    pub flags: EffectFlags,
    pub params: ParameterSet,
}

/// Builds the request line for the next exchange.
pub fn build_request(first_exchange: bool, settings: &DeviceSettings) -> String {
    if first_exchange {
        return FETCH_REQUEST.to_string();
    }
    format_apply_request(settings)
}

pub fn format_apply_request(settings: &DeviceSettings) -> String {
    let code = mode::encode(settings.flags);
    let fields: Vec<String> = settings
        .params
        .iter()
        .map(|(p, v)| to_device(p, v).to_string())
        .collect();
    format!("{APPLY_PREFIX} {code} {} {HTTP_SUFFIX}\r\n", fields.join(" "))
}

/// Parses a device reply. Tokens 0-3 are framing and are not inspected.
pub fn parse_response(raw: &str) -> Result<DeviceSettings, ProtocolError> {
    let tokens: Vec<&str> = raw.split(' ').collect();
    if tokens.len() != RESPONSE_TOKENS {
        return Err(ProtocolError::MalformedResponse(format!(
            "expected {RESPONSE_TOKENS} tokens, got {}",
            tokens.len()
        )));
    }

    let mode_token = tokens[RESPONSE_MODE_TOKEN].trim();
    let code = parse_mode(mode_token).ok_or_else(|| {
        ProtocolError::MalformedResponse(format!("mode is not a whole number: {mode_token:?}"))
    })?;
    let flags = mode::decode(code).map_err(|e| ProtocolError::MalformedResponse(e.to_string()))?;

    let mut params = ParameterSet::default();
    for (param, idx) in RESPONSE_FIELDS {
        let device = parse_number(tokens[idx]).ok_or_else(|| {
            ProtocolError::MalformedResponse(format!("{param} is not a number: {:?}", tokens[idx]))
        })?;
        params.set(param, to_ui(param, device));
    }

    Ok(DeviceSettings { flags, params })
}

/// A request as seen from the device side.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceRequest {
    Fetch,
    Apply(DeviceSettings),
}

pub fn parse_request(line: &str) -> Result<DeviceRequest, ProtocolError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["GET", FETCH_PATH, HTTP_SUFFIX] => Ok(DeviceRequest::Fetch),
        ["GET", "/getsets/", code, rate, depth, delay, feedback, gain, mix, HTTP_SUFFIX] => {
            let code: i64 = code
                .parse()
                .map_err(|_| ProtocolError::MalformedRequest(format!("bad mode: {code:?}")))?;
            let flags = mode::decode(code)?;
            let mut params = ParameterSet::default();
            for (param, raw) in Param::ALL
                .into_iter()
                .zip([rate, depth, delay, feedback, gain, mix])
            {
                let device = parse_number(raw).ok_or_else(|| {
                    ProtocolError::MalformedRequest(format!("{param} is not a number: {raw:?}"))
                })?;
                params.set(param, to_ui(param, device));
            }
            Ok(DeviceRequest::Apply(DeviceSettings { flags, params }))
        }
        _ => Err(ProtocolError::MalformedRequest(line.trim().to_string())),
    }
}

/// Builds the 11-token reply a device sends for `settings`.
pub fn encode_response(settings: &DeviceSettings) -> String {
    let code = mode::encode(settings.flags);
    let values: Vec<String> = RESPONSE_FIELDS
        .iter()
        .map(|(param, _)| to_device(*param, settings.params.get(*param)).to_string())
        .collect();
    format!("{RESPONSE_PREAMBLE} {code} {}\r\n", values.join(" "))
}

fn parse_number(token: &str) -> Option<f64> {
    token.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts `7` as well as `7.0`; fractional or non-finite values are rejected.
fn parse_mode(token: &str) -> Option<i64> {
    if let Ok(code) = token.parse::<i64>() {
        return Some(code);
    }
    let value = parse_number(token)?;
    if value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}
