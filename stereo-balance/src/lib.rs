//! Stereo Balance - Library
//!
//! Computes and sets the left/right balance of a Windows audio endpoint or
//! audio stream on top of the Core Audio volume interfaces.
//!
//! ## Features
//!
//! - Balance codec for master-relative (endpoint) and self-normalizing
//!   (stream, session) volume controls
//! - Configurable left/right channel mapping
//! - Memoized default render endpoint with an injectable resolver
//! - Core Audio adapters for IAudioEndpointVolume, IAudioStreamVolume and
//!   IChannelAudioVolume

#[cfg(windows)]
pub mod audio;
pub mod balance;
pub mod device;
pub mod error;

pub use balance::{
    get_balance, set_balance, BalanceCodec, ChannelMap, ChannelVolume, MasterRelativeVolume,
    VolumeControl,
};
pub use device::{DefaultDevice, DeviceRole, Endpoint, EndpointResolver};
pub use error::BalanceError;

#[cfg(windows)]
pub use audio::{
    ComGuard, DeviceEnumerator, EndpointVolume, RenderEndpoint, SessionChannelVolume,
    StreamVolume,
};
