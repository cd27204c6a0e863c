//! A resolved render endpoint.

use super::volume::EndpointVolume;
use crate::device::Endpoint;
use crate::error::BalanceError;
use windows::Win32::Devices::Properties::DEVPKEY_Device_FriendlyName;
use windows::Win32::Media::Audio::{IAudioClient, IMMDevice};
use windows::Win32::System::Com::{CLSCTX_ALL, STGM};
use windows::Win32::UI::Shell::PropertiesSystem::{IPropertyStore, PROPERTYKEY};

/// Render endpoint backed by an IMMDevice.
#[derive(Clone)]
pub struct RenderEndpoint {
    device: IMMDevice,
}

impl RenderEndpoint {
    pub(crate) fn new(device: IMMDevice) -> Self {
        Self { device }
    }

    /// Windows device ID (opaque string from IMMDevice::GetId).
    pub fn id(&self) -> Result<String, BalanceError> {
        unsafe {
            let id = self.device.GetId().map_err(BalanceError::WindowsError)?;
            id.to_string()
                .map_err(|e| BalanceError::StringConversion(e.to_string()))
        }
    }

    /// Friendly name from the device property store.
    pub fn name(&self) -> Option<String> {
        unsafe {
            let props: IPropertyStore = self.device.OpenPropertyStore(STGM(0)).ok()?;

            // Convert DEVPROPKEY to PROPERTYKEY
            let key = PROPERTYKEY {
                fmtid: DEVPKEY_Device_FriendlyName.fmtid,
                pid: DEVPKEY_Device_FriendlyName.pid,
            };

            let name = props.GetValue(&key).ok()?.to_string();
            if name.is_empty() {
                None
            } else {
                Some(name)
            }
        }
    }

    /// Activate an IAudioClient for stream and session volume access.
    ///
    /// The client must be initialized by the caller before its stream
    /// services can be obtained.
    pub fn audio_client(&self) -> Result<IAudioClient, BalanceError> {
        unsafe {
            self.device
                .Activate(CLSCTX_ALL, None)
                .map_err(BalanceError::WindowsError)
        }
    }

    /// Get the raw IMMDevice.
    pub fn raw_device(&self) -> &IMMDevice {
        &self.device
    }
}

impl Endpoint for RenderEndpoint {
    type Volume = EndpointVolume;

    fn volume_control(&self) -> Result<EndpointVolume, BalanceError> {
        EndpointVolume::new(&self.device)
    }
}
