//! Error types shared by the codec, the device resolver and the Windows adapters.

use thiserror::Error;

/// Balance service error types.
#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("No volume control was supplied")]
    NullInput,

    #[error("The audio endpoint does not expose left/right volume channels ({channels} channel(s) available)")]
    UnsupportedChannelLayout { channels: u32 },

    #[error("No default render device available")]
    NoDefaultDevice,

    #[error("Device not found: {device_id}")]
    DeviceNotFound { device_id: String },

    #[error("Volume control not available for device")]
    VolumeNotAvailable,

    #[error("String conversion error: {0}")]
    StringConversion(String),

    #[error("Windows Core Audio is not available on this platform")]
    PlatformUnsupported,

    #[cfg(windows)]
    #[error("COM initialization failed: {0}")]
    ComInitFailed(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Failed to enumerate devices: {0}")]
    EnumerationFailed(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsError(#[source] windows::core::Error),
}

impl BalanceError {
    /// True for errors raised by input validation, before any volume is touched.
    pub fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            BalanceError::NullInput | BalanceError::UnsupportedChannelLayout { .. }
        )
    }
}
