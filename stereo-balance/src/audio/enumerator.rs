//! Device enumeration using Windows MMDevice API.
//!
//! Provides COM initialization and render endpoint resolution.

use super::endpoint::RenderEndpoint;
use crate::device::{DeviceRole, EndpointResolver};
use crate::error::BalanceError;
use windows::core::PCWSTR;
use windows::Win32::Media::Audio::{
    eCommunications, eConsole, eMultimedia, eRender, ERole, IMMDeviceEnumerator,
    MMDeviceEnumerator,
};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_ALL, COINIT_APARTMENTTHREADED,
};

/// COM initialization guard that uninitializes COM on drop.
pub struct ComGuard {
    initialized: bool,
}

impl ComGuard {
    /// Initialize COM for the current thread.
    pub fn new() -> Result<Self, BalanceError> {
        unsafe {
            CoInitializeEx(None, COINIT_APARTMENTTHREADED)
                .ok()
                .map_err(BalanceError::ComInitFailed)?;
        }
        Ok(Self { initialized: true })
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.initialized {
            unsafe {
                CoUninitialize();
            }
        }
    }
}

/// Render endpoint enumerator using Windows MMDevice API.
pub struct DeviceEnumerator {
    enumerator: IMMDeviceEnumerator,
}

impl DeviceEnumerator {
    /// Create a new DeviceEnumerator.
    ///
    /// Note: COM must be initialized before calling this function.
    pub fn new() -> Result<Self, BalanceError> {
        unsafe {
            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                    .map_err(BalanceError::EnumerationFailed)?;

            Ok(Self { enumerator })
        }
    }

    /// Get the default render endpoint for a role.
    pub fn default_endpoint(&self, role: DeviceRole) -> Result<RenderEndpoint, BalanceError> {
        unsafe {
            let device = self
                .enumerator
                .GetDefaultAudioEndpoint(eRender, to_erole(role))
                .map_err(|e| {
                    tracing::debug!(?role, error = %e, "no default render endpoint");
                    BalanceError::NoDefaultDevice
                })?;

            Ok(RenderEndpoint::new(device))
        }
    }

    /// Get a specific endpoint by its device ID.
    pub fn get_device(&self, device_id: &str) -> Result<RenderEndpoint, BalanceError> {
        unsafe {
            let device_id_wide: Vec<u16> =
                device_id.encode_utf16().chain(std::iter::once(0)).collect();

            let device = self
                .enumerator
                .GetDevice(PCWSTR::from_raw(device_id_wide.as_ptr()))
                .map_err(|_| BalanceError::DeviceNotFound {
                    device_id: device_id.to_string(),
                })?;

            Ok(RenderEndpoint::new(device))
        }
    }
}

impl EndpointResolver for DeviceEnumerator {
    type Handle = RenderEndpoint;

    fn resolve_default_render_endpoint(
        &self,
        role: DeviceRole,
    ) -> Result<RenderEndpoint, BalanceError> {
        self.default_endpoint(role)
    }
}

fn to_erole(role: DeviceRole) -> ERole {
    match role {
        DeviceRole::Console => eConsole,
        DeviceRole::Multimedia => eMultimedia,
        DeviceRole::Communications => eCommunications,
    }
}
