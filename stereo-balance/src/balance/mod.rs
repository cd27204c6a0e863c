//! Stereo balance codec.
//!
//! Balance is a value in [-1, 1]: -1 is full left, 1 is full right and 0 is
//! centered. It is never stored; it is computed from the left and right
//! channel levels of a volume control and written back into them.

pub mod channels;
pub mod codec;
pub mod control;

pub use channels::ChannelMap;
pub use codec::{
    channel_factors, clamp_balance, decode_master_relative, decode_self_normalizing,
    SILENCE_EPSILON,
};
pub use control::{
    get_balance, set_balance, BalanceCodec, ChannelVolume, MasterRelativeVolume, VolumeControl,
};
