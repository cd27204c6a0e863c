//! Endpoint volume control using IAudioEndpointVolume.
//!
//! The endpoint exposes a master level and per-channel levels scaled
//! against it.

use crate::balance::{ChannelVolume, MasterRelativeVolume};
use crate::error::BalanceError;
use windows::Win32::Media::Audio::{Endpoints::IAudioEndpointVolume, IMMDevice};
use windows::Win32::System::Com::CLSCTX_ALL;

/// Volume controller for a specific endpoint.
pub struct EndpointVolume {
    endpoint_volume: IAudioEndpointVolume,
}

impl EndpointVolume {
    /// Create a new EndpointVolume for the given device.
    pub fn new(device: &IMMDevice) -> Result<Self, BalanceError> {
        unsafe {
            let endpoint_volume: IAudioEndpointVolume = device
                .Activate(CLSCTX_ALL, None)
                .map_err(|e| {
                    tracing::debug!(error = %e, "IAudioEndpointVolume activation failed");
                    BalanceError::VolumeNotAvailable
                })?;

            Ok(Self { endpoint_volume })
        }
    }

    /// Get the raw IAudioEndpointVolume interface.
    pub fn raw_endpoint_volume(&self) -> &IAudioEndpointVolume {
        &self.endpoint_volume
    }
}

impl From<IAudioEndpointVolume> for EndpointVolume {
    fn from(endpoint_volume: IAudioEndpointVolume) -> Self {
        Self { endpoint_volume }
    }
}

impl ChannelVolume for EndpointVolume {
    fn channel_count(&self) -> Result<u32, BalanceError> {
        unsafe {
            self.endpoint_volume
                .GetChannelCount()
                .map_err(BalanceError::WindowsError)
        }
    }

    fn channel_volume(&self, channel: u32) -> Result<f32, BalanceError> {
        unsafe {
            self.endpoint_volume
                .GetChannelVolumeLevelScalar(channel)
                .map_err(BalanceError::WindowsError)
        }
    }

    fn set_channel_volume(&self, channel: u32, level: f32) -> Result<(), BalanceError> {
        unsafe {
            self.endpoint_volume
                .SetChannelVolumeLevelScalar(channel, level, std::ptr::null())
                .map_err(BalanceError::WindowsError)
        }
    }
}

impl MasterRelativeVolume for EndpointVolume {
    fn master_volume(&self) -> Result<f32, BalanceError> {
        unsafe {
            self.endpoint_volume
                .GetMasterVolumeLevelScalar()
                .map_err(BalanceError::WindowsError)
        }
    }
}
