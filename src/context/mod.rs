use std::fmt::Debug;
use tracing::{debug, warn};
use crate::core::*;

flat_mod!(scope);

/// Exclusive ownership of one platform context bound to one device.
///
/// Everything derived from a context (queues, programs, kernels and buffers) borrows it, so the
/// context is always created first and released last.
pub struct Context<'a, P: Platform> {
    platform: &'a P,
    id: P::Context,
    device: P::DeviceId
}

impl<'a, P: Platform> Context<'a, P> {
    pub fn new (platform: &'a P, device: P::DeviceId) -> Result<Self> {
        let id = tri!("clCreateContext", platform.create_context(device));
        debug!(context = ?id, ?device, "created context");
        Ok(Self { platform, id, device })
    }

    #[inline(always)]
    pub fn from_descriptor (platform: &'a P, desc: &DeviceDescriptor<P::DeviceId>) -> Result<Self> {
        Self::new(platform, desc.id)
    }

    #[inline(always)]
    pub fn platform (&self) -> &'a P {
        self.platform
    }

    #[inline(always)]
    pub fn id (&self) -> P::Context {
        self.id
    }

    #[inline(always)]
    pub fn device (&self) -> P::DeviceId {
        self.device
    }
}

impl<P: Platform> Debug for Context<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("device", &self.device)
            .finish()
    }
}

impl<P: Platform> Drop for Context<'_, P> {
    fn drop(&mut self) {
        match self.platform.release_context(self.id) {
            Ok(()) => debug!(context = ?self.id, "released context"),
            Err(status) => warn!(context = ?self.id, %status, "clReleaseContext failed")
        }
    }
}
