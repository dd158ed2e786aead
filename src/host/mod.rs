use std::{cell::RefCell, collections::HashMap};
use crate::core::*;

mod device;
pub use self::device::*;
flat_mod!(kernels, memory);
mod platform;
mod source;

use platform::State;

macro_rules! handles {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            #[repr(transparent)]
            pub struct $name (pub(crate) u32);
        )+
    };
}

handles! {
    /// Emulated platform handle
    PlatformId,
    /// Emulated device handle
    DeviceId,
    /// Emulated context handle
    ContextId,
    /// Emulated command queue handle
    QueueId,
    /// Emulated program handle
    ProgramId,
    /// Emulated kernel handle
    KernelId,
    /// Emulated memory object handle
    MemId
}

/// In-process emulated platform.
///
/// Every call of the [`Platform`] contract is counted by the name of the OpenCL function it stands
/// for, and can be made to fail with [`Host::fail`]. Transfers and dispatches are queued and run in
/// submission order when the queue is finished, unless they are blocking. Programs build when every
/// kernel they declare has a host implementation with a matching parameter count; `mx_mul` is built in.
#[derive(Debug)]
pub struct Host {
    platforms: Vec<HostPlatform>,
    devices: Vec<(PlatformId, HostDevice)>,
    kernels: HashMap<String, HostKernel>,
    calls: RefCell<HashMap<&'static str, usize>>,
    faults: RefCell<HashMap<&'static str, Status>>,
    state: RefCell<State>
}

impl Host {
    pub fn new (platforms: Vec<HostPlatform>) -> Self {
        let devices = platforms.iter()
            .enumerate()
            .flat_map(|(i, p)| p.devices.iter().cloned().map(move |d| (PlatformId(i as u32), d)))
            .collect();

        let kernels = BUILTINS.iter()
            .map(|(name, kernel)| (name.to_string(), *kernel))
            .collect();

        Self {
            platforms,
            devices,
            kernels,
            calls: RefCell::default(),
            faults: RefCell::default(),
            state: RefCell::default()
        }
    }

    /// A host with no platforms at all.
    #[inline(always)]
    pub fn empty () -> Self {
        Self::new(Vec::new())
    }

    /// Makes the kernel `name` buildable.
    #[inline]
    pub fn register (&mut self, name: impl Into<String>, kernel: HostKernel) {
        self.kernels.insert(name.into(), kernel);
    }

    #[inline]
    pub fn platforms (&self) -> &[HostPlatform] {
        &self.platforms
    }

    /// Number of calls made to `function`.
    #[inline]
    pub fn calls (&self, function: &str) -> usize {
        self.calls.borrow().get(function).copied().unwrap_or_default()
    }

    #[inline]
    pub fn total_calls (&self) -> usize {
        self.calls.borrow().values().sum()
    }

    #[inline]
    pub fn reset_calls (&self) {
        self.calls.borrow_mut().clear()
    }

    /// Makes every later call to `function` fail with `status`, until [`clear_faults`](Host::clear_faults).
    #[inline]
    pub fn fail (&self, function: &'static str, status: Status) {
        self.faults.borrow_mut().insert(function, status);
    }

    #[inline]
    pub fn clear_faults (&self) {
        self.faults.borrow_mut().clear()
    }

    /// Number of contexts, queues, programs, kernels and memory objects not yet released.
    #[inline]
    pub fn live_objects (&self) -> usize {
        self.state.borrow().live()
    }

    /// Counts a call to `function`, failing if a fault is injected for it.
    fn enter (&self, function: &'static str) -> RawResult<()> {
        *self.calls.borrow_mut().entry(function).or_default() += 1;
        match self.faults.borrow().get(function) {
            Some(&status) => Err(status),
            None => Ok(())
        }
    }

    fn device (&self, id: DeviceId) -> RawResult<&HostDevice> {
        self.devices.get(id.0 as usize).map(|(_, d)| d).ok_or(CL_INVALID_DEVICE)
    }
}

impl Default for Host {
    /// A single platform with one CPU device, with a compute unit per available hardware thread.
    fn default() -> Self {
        let units = std::thread::available_parallelism().map_or(1, |n| n.get() as u32);
        Self::new(vec![HostPlatform::new(vec![HostDevice::cpu("Host CPU", units)])])
    }
}
