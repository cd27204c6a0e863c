//! Audio module for Windows Core Audio API interactions.
//!
//! This module adapts endpoint, stream and session volume interfaces to the
//! balance volume capabilities, and resolves render endpoints.

pub mod endpoint;
pub mod enumerator;
pub mod stream;
pub mod volume;

pub use endpoint::RenderEndpoint;
pub use enumerator::{ComGuard, DeviceEnumerator};
pub use stream::{SessionChannelVolume, StreamVolume};
pub use volume::EndpointVolume;
