//! Stream and session channel volumes.
//!
//! Neither IAudioStreamVolume nor IChannelAudioVolume has a master level,
//! so both are self-normalizing.

use crate::balance::ChannelVolume;
use crate::error::BalanceError;
use windows::Win32::Media::Audio::{IAudioClient, IAudioStreamVolume, IChannelAudioVolume};

/// Per-stream channel volume of an initialized audio client.
pub struct StreamVolume {
    stream_volume: IAudioStreamVolume,
}

impl StreamVolume {
    /// Obtain the stream volume service of an initialized client.
    pub fn from_client(client: &IAudioClient) -> Result<Self, BalanceError> {
        unsafe {
            let stream_volume: IAudioStreamVolume = client.GetService().map_err(|e| {
                tracing::debug!(error = %e, "IAudioStreamVolume not available");
                BalanceError::VolumeNotAvailable
            })?;
            Ok(Self { stream_volume })
        }
    }
}

impl From<IAudioStreamVolume> for StreamVolume {
    fn from(stream_volume: IAudioStreamVolume) -> Self {
        Self { stream_volume }
    }
}

impl ChannelVolume for StreamVolume {
    fn channel_count(&self) -> Result<u32, BalanceError> {
        unsafe {
            self.stream_volume
                .GetChannelCount()
                .map_err(BalanceError::WindowsError)
        }
    }

    fn channel_volume(&self, channel: u32) -> Result<f32, BalanceError> {
        unsafe {
            self.stream_volume
                .GetChannelVolume(channel)
                .map_err(BalanceError::WindowsError)
        }
    }

    fn set_channel_volume(&self, channel: u32, level: f32) -> Result<(), BalanceError> {
        unsafe {
            self.stream_volume
                .SetChannelVolume(channel, level)
                .map_err(BalanceError::WindowsError)
        }
    }
}

/// Channel volume of the audio session an initialized client belongs to.
pub struct SessionChannelVolume {
    channel_volume: IChannelAudioVolume,
}

impl SessionChannelVolume {
    /// Obtain the session channel volume service of an initialized client.
    pub fn from_client(client: &IAudioClient) -> Result<Self, BalanceError> {
        unsafe {
            let channel_volume: IChannelAudioVolume = client.GetService().map_err(|e| {
                tracing::debug!(error = %e, "IChannelAudioVolume not available");
                BalanceError::VolumeNotAvailable
            })?;
            Ok(Self { channel_volume })
        }
    }
}

impl From<IChannelAudioVolume> for SessionChannelVolume {
    fn from(channel_volume: IChannelAudioVolume) -> Self {
        Self { channel_volume }
    }
}

impl ChannelVolume for SessionChannelVolume {
    fn channel_count(&self) -> Result<u32, BalanceError> {
        unsafe {
            self.channel_volume
                .GetChannelCount()
                .map_err(BalanceError::WindowsError)
        }
    }

    fn channel_volume(&self, channel: u32) -> Result<f32, BalanceError> {
        unsafe {
            self.channel_volume
                .GetChannelVolume(channel)
                .map_err(BalanceError::WindowsError)
        }
    }

    fn set_channel_volume(&self, channel: u32, level: f32) -> Result<(), BalanceError> {
        unsafe {
            self.channel_volume
                .SetChannelVolume(channel, level, std::ptr::null())
                .map_err(BalanceError::WindowsError)
        }
    }
}
