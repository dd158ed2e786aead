use std::fmt::Debug;
use crate::buffer::MemAccess;
use super::{Status, DeviceType};

/// Result of a single call against the platform contract.
pub type RawResult<T> = ::std::result::Result<T, Status>;

/// Device attributes queried by the enumeration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceInfo {
    /// `char[]`
    Name,
    /// `cl_uint`
    MaxComputeUnits,
    /// `cl_device_type`
    Type,
    /// `cl_device_fp_config`
    DoubleFpConfig,
    /// `size_t`
    MaxWorkGroupSize,
    /// `cl_device_local_mem_type`
    LocalMemType,
    /// `cl_ulong`
    LocalMemSize,
    /// `cl_bool`
    HostUnifiedMemory,
}

/// Program build attributes, queried per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildInfo {
    /// `cl_build_status`
    Status,
    /// `char[]`
    Options,
    /// `char[]`
    Log,
}

/// Value bound to a kernel parameter.
#[derive(Debug, Clone, Copy)]
pub enum KernelArg<'a, M> {
    /// Plain value, passed by bytes.
    Value (&'a [u8]),
    /// Device memory object.
    Mem (M)
}

/// The narrow call contract against a compute platform (an OpenCL ICD, or the in-process [`Host`](crate::host::Host) emulator).
///
/// Every call is fallible and returns the raw platform [`Status`] on failure. Handles are opaque and
/// owned by the safe wrappers in this crate, which release each one exactly once.
///
/// Info queries follow the two-call protocol: with `dst = None` they return the number of bytes
/// required, with `dst = Some(..)` they fill the destination and return the number of bytes written.
pub trait Platform {
    type PlatformId: Copy + Debug;
    type DeviceId: Copy + Debug;
    type Context: Copy + Debug;
    type Queue: Copy + Debug;
    type Program: Copy + Debug;
    type Kernel: Copy + Debug;
    type Mem: Copy + Debug;

    /* ENUMERATION */
    fn platform_count (&self) -> RawResult<u32>;
    fn platform_ids (&self, count: u32) -> RawResult<Vec<Self::PlatformId>>;
    fn device_count (&self, platform: Self::PlatformId, ty: DeviceType) -> RawResult<u32>;
    fn device_ids (&self, platform: Self::PlatformId, ty: DeviceType, count: u32) -> RawResult<Vec<Self::DeviceId>>;
    fn device_info (&self, device: Self::DeviceId, param: DeviceInfo, dst: Option<&mut [u8]>) -> RawResult<usize>;

    /* CONTEXT */
    fn create_context (&self, device: Self::DeviceId) -> RawResult<Self::Context>;
    fn release_context (&self, context: Self::Context) -> RawResult<()>;

    /* QUEUE */
    fn create_command_queue (&self, context: Self::Context, device: Self::DeviceId) -> RawResult<Self::Queue>;
    fn release_command_queue (&self, queue: Self::Queue) -> RawResult<()>;

    /* PROGRAM */
    fn create_program_with_source (&self, context: Self::Context, source: &str) -> RawResult<Self::Program>;
    fn build_program (&self, program: Self::Program, device: Self::DeviceId, options: Option<&str>) -> RawResult<()>;
    fn program_build_info (&self, program: Self::Program, device: Self::DeviceId, param: BuildInfo, dst: Option<&mut [u8]>) -> RawResult<usize>;
    fn release_program (&self, program: Self::Program) -> RawResult<()>;

    /* KERNEL */
    fn create_kernel (&self, program: Self::Program, name: &str) -> RawResult<Self::Kernel>;
    fn set_kernel_arg (&self, kernel: Self::Kernel, index: u32, arg: KernelArg<'_, Self::Mem>) -> RawResult<()>;
    fn release_kernel (&self, kernel: Self::Kernel) -> RawResult<()>;

    /* MEMORY */
    fn create_buffer (&self, context: Self::Context, access: MemAccess, size: usize) -> RawResult<Self::Mem>;
    fn release_mem_object (&self, mem: Self::Mem) -> RawResult<()>;

    /* COMMANDS */

    /// Enqueues a host-to-device copy of `size` bytes.
    /// # Safety
    /// `src` must be valid for `size` bytes of reads until the copy completes: on return if `blocking`,
    /// otherwise until the next [`finish`](Platform::finish) on `queue`.
    unsafe fn enqueue_write_buffer (&self, queue: Self::Queue, mem: Self::Mem, blocking: bool, offset: usize, size: usize, src: *const u8) -> RawResult<()>;

    /// Enqueues a device-to-host copy of `size` bytes.
    /// # Safety
    /// `dst` must be valid for `size` bytes of writes, and not otherwise accessed, until the copy completes:
    /// on return if `blocking`, otherwise until the next [`finish`](Platform::finish) on `queue`.
    unsafe fn enqueue_read_buffer (&self, queue: Self::Queue, mem: Self::Mem, blocking: bool, offset: usize, size: usize, dst: *mut u8) -> RawResult<()>;

    fn enqueue_nd_range_kernel (&self, queue: Self::Queue, kernel: Self::Kernel, global: &[usize], local: Option<&[usize]>) -> RawResult<()>;
    fn flush (&self, queue: Self::Queue) -> RawResult<()>;
    fn finish (&self, queue: Self::Queue) -> RawResult<()>;
}
