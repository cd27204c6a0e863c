//! Assignment of channel indices to the left and right speakers.

/// Channel indices used as left and right.
///
/// Most drivers expose left as channel 0 and right as channel 1, but some
/// swap them. A map is immutable so reads and writes through one codec
/// always agree on which side is which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelMap {
    left: u32,
    right: u32,
}

impl ChannelMap {
    /// Left on channel 0, right on channel 1.
    pub const STEREO: ChannelMap = ChannelMap { left: 0, right: 1 };

    /// Create a map. Returns `None` when both sides name the same channel.
    pub fn new(left: u32, right: u32) -> Option<Self> {
        if left == right {
            None
        } else {
            Some(Self { left, right })
        }
    }

    pub fn left(&self) -> u32 {
        self.left
    }

    pub fn right(&self) -> u32 {
        self.right
    }

    /// Minimum channel count a control needs for this map.
    pub fn required_channels(&self) -> u32 {
        self.left.max(self.right) + 1
    }
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self::STEREO
    }
}
