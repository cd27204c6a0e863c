//! Volume capabilities and the balance codec that drives them.

use super::channels::ChannelMap;
use super::codec::{channel_factors, decode_master_relative, decode_self_normalizing};
use crate::error::BalanceError;

/// Per-channel volume access. On its own this is the self-normalizing
/// capability: channel levels are the only signal.
pub trait ChannelVolume {
    /// Number of channels exposed.
    fn channel_count(&self) -> Result<u32, BalanceError>;

    /// Linear level of a channel (0.0 to 1.0).
    fn channel_volume(&self, channel: u32) -> Result<f32, BalanceError>;

    /// Set the linear level of a channel (0.0 to 1.0).
    fn set_channel_volume(&self, channel: u32, level: f32) -> Result<(), BalanceError>;
}

/// Channel volume with an independent master level that channel levels are
/// scaled against.
pub trait MasterRelativeVolume: ChannelVolume {
    /// Linear master level (0.0 to 1.0).
    fn master_volume(&self) -> Result<f32, BalanceError>;
}

/// A volume control of either shape.
#[derive(Clone, Copy)]
pub enum VolumeControl<'a> {
    MasterRelative(&'a dyn MasterRelativeVolume),
    SelfNormalizing(&'a dyn ChannelVolume),
}

impl VolumeControl<'_> {
    fn channel_count(&self) -> Result<u32, BalanceError> {
        match self {
            VolumeControl::MasterRelative(volume) => volume.channel_count(),
            VolumeControl::SelfNormalizing(volume) => volume.channel_count(),
        }
    }

    fn channel_volume(&self, channel: u32) -> Result<f32, BalanceError> {
        match self {
            VolumeControl::MasterRelative(volume) => volume.channel_volume(channel),
            VolumeControl::SelfNormalizing(volume) => volume.channel_volume(channel),
        }
    }

    fn set_channel_volume(&self, channel: u32, level: f32) -> Result<(), BalanceError> {
        match self {
            VolumeControl::MasterRelative(volume) => volume.set_channel_volume(channel, level),
            VolumeControl::SelfNormalizing(volume) => volume.set_channel_volume(channel, level),
        }
    }

    /// Balance with the default channel map.
    pub fn balance(self) -> Result<f32, BalanceError> {
        BalanceCodec::default().get_balance(Some(self))
    }

    /// Set the balance with the default channel map.
    pub fn set_balance(self, balance: f32) -> Result<(), BalanceError> {
        BalanceCodec::default().set_balance(Some(self), balance)
    }
}

impl std::fmt::Debug for VolumeControl<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VolumeControl::MasterRelative(_) => f.write_str("VolumeControl::MasterRelative"),
            VolumeControl::SelfNormalizing(_) => f.write_str("VolumeControl::SelfNormalizing"),
        }
    }
}

/// Reads and writes balance through a volume control using a fixed
/// channel map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceCodec {
    channels: ChannelMap,
}

impl BalanceCodec {
    pub fn new(channels: ChannelMap) -> Self {
        Self { channels }
    }

    pub fn channel_map(&self) -> ChannelMap {
        self.channels
    }

    /// Ratio of volume across the left and right channels, from -1 (left)
    /// to 1 (right). 0 is centered.
    pub fn get_balance(&self, control: Option<VolumeControl<'_>>) -> Result<f32, BalanceError> {
        let control = self.verify(control)?;
        let left = control.channel_volume(self.channels.left())?;
        let right = control.channel_volume(self.channels.right())?;

        match control {
            VolumeControl::MasterRelative(volume) => {
                let master = volume.master_volume()?;
                Ok(decode_master_relative(master, left, right))
            }
            VolumeControl::SelfNormalizing(_) => Ok(decode_self_normalizing(left, right)),
        }
    }

    /// Set the balance. Values outside [-1, 1] are clamped.
    ///
    /// Both channels are written only after validation succeeds.
    pub fn set_balance(
        &self,
        control: Option<VolumeControl<'_>>,
        balance: f32,
    ) -> Result<(), BalanceError> {
        let control = self.verify(control)?;
        let (left_factor, right_factor) = channel_factors(balance);

        let scale = match control {
            VolumeControl::MasterRelative(volume) => volume.master_volume()?,
            VolumeControl::SelfNormalizing(_) => 1.0,
        };

        control.set_channel_volume(self.channels.left(), left_factor * scale)?;
        control.set_channel_volume(self.channels.right(), right_factor * scale)?;
        Ok(())
    }

    fn verify<'a>(
        &self,
        control: Option<VolumeControl<'a>>,
    ) -> Result<VolumeControl<'a>, BalanceError> {
        let control = control.ok_or(BalanceError::NullInput)?;
        let channels = control.channel_count()?;
        if channels < self.channels.required_channels() {
            return Err(BalanceError::UnsupportedChannelLayout { channels });
        }
        Ok(control)
    }
}

/// Balance of a control using the default channel map.
pub fn get_balance(control: Option<VolumeControl<'_>>) -> Result<f32, BalanceError> {
    BalanceCodec::default().get_balance(control)
}

/// Set the balance of a control using the default channel map.
pub fn set_balance(control: Option<VolumeControl<'_>>, balance: f32) -> Result<(), BalanceError> {
    BalanceCodec::default().set_balance(control, balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    const TOLERANCE: f32 = 1e-5;

    struct FakeVolume {
        master: Option<f32>,
        channels: RefCell<Vec<f32>>,
        writes: Cell<usize>,
    }

    impl FakeVolume {
        fn endpoint(master: f32, channels: &[f32]) -> Self {
            Self {
                master: Some(master),
                channels: RefCell::new(channels.to_vec()),
                writes: Cell::new(0),
            }
        }

        fn stream(channels: &[f32]) -> Self {
            Self {
                master: None,
                channels: RefCell::new(channels.to_vec()),
                writes: Cell::new(0),
            }
        }

        fn level(&self, channel: usize) -> f32 {
            self.channels.borrow()[channel]
        }
    }

    impl ChannelVolume for FakeVolume {
        fn channel_count(&self) -> Result<u32, BalanceError> {
            Ok(self.channels.borrow().len() as u32)
        }

        fn channel_volume(&self, channel: u32) -> Result<f32, BalanceError> {
            Ok(self.channels.borrow()[channel as usize])
        }

        fn set_channel_volume(&self, channel: u32, level: f32) -> Result<(), BalanceError> {
            self.writes.set(self.writes.get() + 1);
            self.channels.borrow_mut()[channel as usize] = level;
            Ok(())
        }
    }

    impl MasterRelativeVolume for FakeVolume {
        fn master_volume(&self) -> Result<f32, BalanceError> {
            self.master.ok_or(BalanceError::VolumeNotAvailable)
        }
    }

    fn endpoint(volume: &FakeVolume) -> Option<VolumeControl<'_>> {
        Some(VolumeControl::MasterRelative(volume))
    }

    fn stream(volume: &FakeVolume) -> Option<VolumeControl<'_>> {
        Some(VolumeControl::SelfNormalizing(volume))
    }

    #[test]
    fn test_round_trip_master_relative() {
        for master in [0.05f32, 0.3, 0.5, 1.0] {
            for step in 0..=20 {
                let balance = -1.0 + step as f32 * 0.1;
                let volume = FakeVolume::endpoint(master, &[master, master]);
                set_balance(endpoint(&volume), balance).unwrap();
                let decoded = get_balance(endpoint(&volume)).unwrap();
                assert!(
                    (decoded - balance).abs() < TOLERANCE,
                    "master {master}, balance {balance}, decoded {decoded}"
                );
            }
        }
    }

    #[test]
    fn test_round_trip_self_normalizing() {
        for step in 0..=20 {
            let balance = -1.0 + step as f32 * 0.1;
            let volume = FakeVolume::stream(&[0.2, 0.9]);
            set_balance(stream(&volume), balance).unwrap();
            let decoded = get_balance(stream(&volume)).unwrap();
            assert!((decoded - balance).abs() < TOLERANCE);
        }
    }

    #[test]
    fn test_centering() {
        let volume = FakeVolume::endpoint(0.6, &[0.1, 0.4]);
        set_balance(endpoint(&volume), 0.0).unwrap();
        assert_eq!(volume.level(0), 0.6);
        assert_eq!(volume.level(1), 0.6);

        let volume = FakeVolume::stream(&[0.1, 0.4]);
        set_balance(stream(&volume), 0.0).unwrap();
        assert_eq!(volume.level(0), 1.0);
        assert_eq!(volume.level(1), 1.0);
    }

    #[test]
    fn test_extremes_master_relative() {
        let volume = FakeVolume::endpoint(0.7, &[0.7, 0.7]);
        set_balance(endpoint(&volume), 1.0).unwrap();
        assert_eq!(volume.level(0), 0.0);
        assert_eq!(volume.level(1), 0.7);

        set_balance(endpoint(&volume), -1.0).unwrap();
        assert_eq!(volume.level(0), 0.7);
        assert_eq!(volume.level(1), 0.0);
    }

    #[test]
    fn test_extremes_self_normalizing() {
        let volume = FakeVolume::stream(&[0.5, 0.5]);
        set_balance(stream(&volume), 1.0).unwrap();
        assert_eq!(volume.level(0), 0.0);
        assert_eq!(volume.level(1), 1.0);

        set_balance(stream(&volume), -1.0).unwrap();
        assert_eq!(volume.level(0), 1.0);
        assert_eq!(volume.level(1), 0.0);
    }

    #[test]
    fn test_clamping_matches_extremes() {
        let clamped = FakeVolume::endpoint(0.4, &[0.4, 0.4]);
        let extreme = FakeVolume::endpoint(0.4, &[0.4, 0.4]);

        set_balance(endpoint(&clamped), 2.5).unwrap();
        set_balance(endpoint(&extreme), 1.0).unwrap();
        assert_eq!(*clamped.channels.borrow(), *extreme.channels.borrow());

        set_balance(endpoint(&clamped), -7.0).unwrap();
        set_balance(endpoint(&extreme), -1.0).unwrap();
        assert_eq!(*clamped.channels.borrow(), *extreme.channels.borrow());
    }

    #[test]
    fn test_silent_stream_is_centered() {
        let volume = FakeVolume::stream(&[0.0, 0.0]);
        assert_eq!(get_balance(stream(&volume)).unwrap(), 0.0);
    }

    #[test]
    fn test_missing_control_is_null_input() {
        assert!(matches!(get_balance(None), Err(BalanceError::NullInput)));
        assert!(matches!(set_balance(None, 0.0), Err(BalanceError::NullInput)));
    }

    #[test]
    fn test_mono_control_rejected_without_writes() {
        let mono = FakeVolume::endpoint(0.5, &[0.5]);
        assert!(matches!(
            get_balance(endpoint(&mono)),
            Err(BalanceError::UnsupportedChannelLayout { channels: 1 })
        ));
        assert!(matches!(
            set_balance(endpoint(&mono), 0.5),
            Err(BalanceError::UnsupportedChannelLayout { channels: 1 })
        ));
        assert_eq!(mono.writes.get(), 0);

        let mono = FakeVolume::stream(&[0.5]);
        assert!(matches!(
            set_balance(stream(&mono), -0.5),
            Err(BalanceError::UnsupportedChannelLayout { channels: 1 })
        ));
        assert_eq!(mono.writes.get(), 0);
    }

    #[test]
    fn test_master_relative_decode_is_not_clamped() {
        // Channels louder than master are passed through as-is.
        let volume = FakeVolume::endpoint(0.25, &[0.0, 0.75]);
        let balance = get_balance(endpoint(&volume)).unwrap();
        assert!((balance - 3.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_master_read_failure_aborts_before_writes() {
        let volume = FakeVolume::stream(&[0.5, 0.5]);
        let control = Some(VolumeControl::MasterRelative(&volume));
        assert!(matches!(
            set_balance(control, 0.5),
            Err(BalanceError::VolumeNotAvailable)
        ));
        assert_eq!(volume.writes.get(), 0);
    }

    #[test]
    fn test_swapped_channel_map_is_consistent() {
        let codec = BalanceCodec::new(ChannelMap::new(1, 0).unwrap());
        let volume = FakeVolume::stream(&[1.0, 1.0]);

        codec.set_balance(stream(&volume), 1.0).unwrap();
        // Right speaker is channel 0 under this map.
        assert_eq!(volume.level(0), 1.0);
        assert_eq!(volume.level(1), 0.0);
        assert!((codec.get_balance(stream(&volume)).unwrap() - 1.0).abs() < TOLERANCE);
        assert!((get_balance(stream(&volume)).unwrap() + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_channel_map_beyond_channel_count_rejected() {
        let codec = BalanceCodec::new(ChannelMap::new(0, 4).unwrap());
        let volume = FakeVolume::stream(&[1.0, 1.0]);
        assert!(matches!(
            codec.get_balance(stream(&volume)),
            Err(BalanceError::UnsupportedChannelLayout { channels: 2 })
        ));
    }

    #[test]
    fn test_volume_control_methods() {
        let volume = FakeVolume::endpoint(1.0, &[1.0, 1.0]);
        let control = VolumeControl::MasterRelative(&volume);
        control.set_balance(-0.5).unwrap();
        assert!((control.balance().unwrap() + 0.5).abs() < TOLERANCE);
        assert!((volume.level(1) - 0.5).abs() < TOLERANCE);
    }
}
