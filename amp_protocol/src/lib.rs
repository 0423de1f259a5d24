//! Wire protocol and parameter mapping for the amplifier effects unit.
//!
//! The device speaks a line-oriented pseudo-HTTP over raw TCP. Requests carry the
//! effect mode and six parameters in device units; replies carry the same data back
//! in a different field order.

pub mod codec;
pub mod error;
pub mod mode;
pub mod transform;

pub use codec::{
    build_request, encode_response, format_apply_request, parse_request, parse_response,
    DeviceRequest, DeviceSettings, ParameterSet, FETCH_REQUEST, RESPONSE_TOKENS,
};
pub use error::ProtocolError;
pub use mode::{decode, encode, Effect, EffectFlags, ModeCode};
pub use transform::{round_decimal, to_device, to_ui, Param};
