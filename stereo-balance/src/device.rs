//! Default render endpoint resolution.
//!
//! The resolver is injected so the memoized handle can be backed by the
//! Windows device enumerator or by a fake in tests.

use crate::balance::MasterRelativeVolume;
use crate::error::BalanceError;
use std::sync::OnceLock;

/// Audio device role (maps to Windows ERole enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum DeviceRole {
    /// Used by games, system sounds, most general applications
    Console = 0,

    /// Used by music players, video players
    #[default]
    Multimedia = 1,

    /// Used by Teams, Zoom, Discord, and other VoIP applications
    Communications = 2,
}

impl DeviceRole {
    /// Parse a role from its numeric ERole value.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(DeviceRole::Console),
            1 => Some(DeviceRole::Multimedia),
            2 => Some(DeviceRole::Communications),
            _ => None,
        }
    }
}

impl std::str::FromStr for DeviceRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "console" => Ok(DeviceRole::Console),
            "multimedia" => Ok(DeviceRole::Multimedia),
            "communications" => Ok(DeviceRole::Communications),
            other => Err(format!("unknown device role: {other}")),
        }
    }
}

/// Resolves the default render endpoint for a role.
pub trait EndpointResolver {
    type Handle;

    fn resolve_default_render_endpoint(
        &self,
        role: DeviceRole,
    ) -> Result<Self::Handle, BalanceError>;
}

/// An endpoint that exposes an endpoint-level volume control.
pub trait Endpoint {
    type Volume: MasterRelativeVolume;

    fn volume_control(&self) -> Result<Self::Volume, BalanceError>;
}

/// Lazily resolved default render endpoint.
///
/// The first successful resolution is cached for the lifetime of this
/// value and never refreshed. A failed resolution is not cached.
pub struct DefaultDevice<R: EndpointResolver> {
    resolver: R,
    role: DeviceRole,
    handle: OnceLock<R::Handle>,
}

impl<R: EndpointResolver> DefaultDevice<R> {
    /// Default device for the multimedia role.
    pub fn new(resolver: R) -> Self {
        Self::with_role(resolver, DeviceRole::Multimedia)
    }

    pub fn with_role(resolver: R, role: DeviceRole) -> Self {
        Self {
            resolver,
            role,
            handle: OnceLock::new(),
        }
    }

    pub fn role(&self) -> DeviceRole {
        self.role
    }

    /// Whether the handle has been resolved yet.
    pub fn is_resolved(&self) -> bool {
        self.handle.get().is_some()
    }

    /// The cached handle, resolving it on first use.
    pub fn handle(&self) -> Result<&R::Handle, BalanceError> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }

        let resolved = self.resolver.resolve_default_render_endpoint(self.role)?;
        tracing::debug!(role = ?self.role, "resolved default render endpoint");

        // A concurrent first access may have won; either value is equivalent.
        Ok(self.handle.get_or_init(|| resolved))
    }
}

impl<R> DefaultDevice<R>
where
    R: EndpointResolver,
    R::Handle: Endpoint,
{
    /// Endpoint volume of the default device.
    pub fn volume_endpoint(&self) -> Result<<R::Handle as Endpoint>::Volume, BalanceError> {
        self.handle()?.volume_control()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::{get_balance, set_balance, ChannelVolume, VolumeControl};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Debug)]
    struct FakeEndpoint {
        role: DeviceRole,
        channels: Rc<RefCell<[f32; 2]>>,
    }

    struct FakeEndpointVolume {
        channels: Rc<RefCell<[f32; 2]>>,
    }

    impl ChannelVolume for FakeEndpointVolume {
        fn channel_count(&self) -> Result<u32, BalanceError> {
            Ok(2)
        }

        fn channel_volume(&self, channel: u32) -> Result<f32, BalanceError> {
            Ok(self.channels.borrow()[channel as usize])
        }

        fn set_channel_volume(&self, channel: u32, level: f32) -> Result<(), BalanceError> {
            self.channels.borrow_mut()[channel as usize] = level;
            Ok(())
        }
    }

    impl MasterRelativeVolume for FakeEndpointVolume {
        fn master_volume(&self) -> Result<f32, BalanceError> {
            Ok(0.5)
        }
    }

    impl Endpoint for FakeEndpoint {
        type Volume = FakeEndpointVolume;

        fn volume_control(&self) -> Result<Self::Volume, BalanceError> {
            Ok(FakeEndpointVolume {
                channels: Rc::clone(&self.channels),
            })
        }
    }

    #[derive(Default)]
    struct CountingResolver {
        calls: Cell<usize>,
        fail_first: Cell<bool>,
    }

    impl EndpointResolver for CountingResolver {
        type Handle = FakeEndpoint;

        fn resolve_default_render_endpoint(
            &self,
            role: DeviceRole,
        ) -> Result<FakeEndpoint, BalanceError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_first.replace(false) {
                return Err(BalanceError::NoDefaultDevice);
            }
            Ok(FakeEndpoint {
                role,
                channels: Rc::new(RefCell::new([0.5, 0.5])),
            })
        }
    }

    #[test]
    fn test_handle_is_memoized() {
        let device = DefaultDevice::new(CountingResolver::default());
        assert!(!device.is_resolved());

        let first = device.handle().unwrap();
        let second = device.handle().unwrap();

        assert!(std::ptr::eq(first, second));
        assert_eq!(device.resolver.calls.get(), 1);
        assert!(device.is_resolved());
    }

    #[test]
    fn test_default_role_is_multimedia() {
        let device = DefaultDevice::new(CountingResolver::default());
        assert_eq!(device.role(), DeviceRole::Multimedia);
        assert_eq!(device.handle().unwrap().role, DeviceRole::Multimedia);

        let device = DefaultDevice::with_role(CountingResolver::default(), DeviceRole::Console);
        assert_eq!(device.handle().unwrap().role, DeviceRole::Console);
    }

    #[test]
    fn test_failed_resolution_is_not_cached() {
        let resolver = CountingResolver::default();
        resolver.fail_first.set(true);
        let device = DefaultDevice::new(resolver);

        assert!(matches!(device.handle(), Err(BalanceError::NoDefaultDevice)));
        assert!(!device.is_resolved());
        assert!(device.handle().is_ok());
        assert_eq!(device.resolver.calls.get(), 2);
    }

    #[test]
    fn test_volume_endpoint_shares_cached_device() {
        let device = DefaultDevice::new(CountingResolver::default());

        let volume = device.volume_endpoint().unwrap();
        set_balance(Some(VolumeControl::MasterRelative(&volume)), 1.0).unwrap();

        let again = device.volume_endpoint().unwrap();
        let balance = get_balance(Some(VolumeControl::MasterRelative(&again))).unwrap();
        assert!((balance - 1.0).abs() < 1e-5);
        assert_eq!(device.resolver.calls.get(), 1);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Console".parse::<DeviceRole>(), Ok(DeviceRole::Console));
        assert_eq!(
            "communications".parse::<DeviceRole>(),
            Ok(DeviceRole::Communications)
        );
        assert!("speakers".parse::<DeviceRole>().is_err());
        assert_eq!(DeviceRole::from_u32(1), Some(DeviceRole::Multimedia));
        assert_eq!(DeviceRole::from_u32(7), None);
    }
}
