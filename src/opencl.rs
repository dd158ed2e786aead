use std::{ffi::{c_void, CString}, os::raw::c_char, ptr::{addr_of_mut, null, null_mut}};
use opencl_sys::{
    cl_int, cl_device_info, cl_program_build_info, cl_platform_id, cl_device_id, cl_context, cl_command_queue, cl_program, cl_kernel, cl_mem,
    clGetPlatformIDs, clGetDeviceIDs, clGetDeviceInfo, clCreateContext, clReleaseContext, clCreateCommandQueue, clReleaseCommandQueue,
    clCreateProgramWithSource, clBuildProgram, clGetProgramBuildInfo, clReleaseProgram, clCreateKernel, clSetKernelArg, clReleaseKernel,
    clCreateBuffer, clReleaseMemObject, clEnqueueWriteBuffer, clEnqueueReadBuffer, clEnqueueNDRangeKernel, clFlush, clFinish,
    CL_SUCCESS, CL_TRUE, CL_FALSE, CL_DEVICE_NAME, CL_DEVICE_MAX_COMPUTE_UNITS, CL_DEVICE_TYPE, CL_DEVICE_DOUBLE_FP_CONFIG,
    CL_DEVICE_MAX_WORK_GROUP_SIZE, CL_DEVICE_LOCAL_MEM_TYPE, CL_DEVICE_LOCAL_MEM_SIZE, CL_PROGRAM_BUILD_STATUS, CL_PROGRAM_BUILD_OPTIONS,
    CL_PROGRAM_BUILD_LOG
};
use crate::{buffer::MemAccess, core::*};

const CL_DEVICE_HOST_UNIFIED_MEMORY: cl_device_info = 0x1035;

macro_rules! check {
    ($e:expr) => {{
        let err: cl_int = $e;
        if err != CL_SUCCESS {
            return Err(Status::new(err))
        }
    }};
}

/// Calls a constructor that reports its status through its last argument.
macro_rules! create {
    (|$err:ident| $e:expr) => {{
        let mut $err: cl_int = CL_SUCCESS;
        let id = $e;
        if $err != CL_SUCCESS {
            return Err(Status::new($err))
        }
        id
    }};
}

/// The system OpenCL platform, through the ICD loader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OpenCl;

impl OpenCl {
    #[inline]
    fn device_param (param: DeviceInfo) -> cl_device_info {
        match param {
            DeviceInfo::Name => CL_DEVICE_NAME,
            DeviceInfo::MaxComputeUnits => CL_DEVICE_MAX_COMPUTE_UNITS,
            DeviceInfo::Type => CL_DEVICE_TYPE,
            DeviceInfo::DoubleFpConfig => CL_DEVICE_DOUBLE_FP_CONFIG,
            DeviceInfo::MaxWorkGroupSize => CL_DEVICE_MAX_WORK_GROUP_SIZE,
            DeviceInfo::LocalMemType => CL_DEVICE_LOCAL_MEM_TYPE,
            DeviceInfo::LocalMemSize => CL_DEVICE_LOCAL_MEM_SIZE,
            DeviceInfo::HostUnifiedMemory => CL_DEVICE_HOST_UNIFIED_MEMORY
        }
    }

    #[inline]
    fn build_param (param: BuildInfo) -> cl_program_build_info {
        match param {
            BuildInfo::Status => CL_PROGRAM_BUILD_STATUS,
            BuildInfo::Options => CL_PROGRAM_BUILD_OPTIONS,
            BuildInfo::Log => CL_PROGRAM_BUILD_LOG
        }
    }
}

#[inline]
fn c_string (s: &str) -> RawResult<CString> {
    CString::new(s).map_err(|_| CL_INVALID_VALUE)
}

#[inline]
fn dst_parts (dst: Option<&mut [u8]>) -> (usize, *mut c_void) {
    match dst {
        Some(dst) => (dst.len(), dst.as_mut_ptr().cast()),
        None => (0, null_mut())
    }
}

impl Platform for OpenCl {
    type PlatformId = cl_platform_id;
    type DeviceId = cl_device_id;
    type Context = cl_context;
    type Queue = cl_command_queue;
    type Program = cl_program;
    type Kernel = cl_kernel;
    type Mem = cl_mem;

    fn platform_count (&self) -> RawResult<u32> {
        let mut count = 0;
        unsafe { check!(clGetPlatformIDs(0, null_mut(), addr_of_mut!(count))) }
        Ok(count)
    }

    fn platform_ids (&self, count: u32) -> RawResult<Vec<cl_platform_id>> {
        let mut result = vec![null_mut(); count as usize];
        unsafe { check!(clGetPlatformIDs(count, result.as_mut_ptr(), null_mut())) }
        Ok(result)
    }

    fn device_count (&self, platform: cl_platform_id, ty: DeviceType) -> RawResult<u32> {
        let mut count = 0;
        unsafe { check!(clGetDeviceIDs(platform, ty.bits(), 0, null_mut(), addr_of_mut!(count))) }
        Ok(count)
    }

    fn device_ids (&self, platform: cl_platform_id, ty: DeviceType, count: u32) -> RawResult<Vec<cl_device_id>> {
        let mut result = vec![null_mut(); count as usize];
        unsafe { check!(clGetDeviceIDs(platform, ty.bits(), count, result.as_mut_ptr(), null_mut())) }
        Ok(result)
    }

    fn device_info (&self, device: cl_device_id, param: DeviceInfo, dst: Option<&mut [u8]>) -> RawResult<usize> {
        let (size, ptr) = dst_parts(dst);
        let mut len = 0;
        unsafe { check!(clGetDeviceInfo(device, Self::device_param(param), size, ptr, addr_of_mut!(len))) }
        Ok(len)
    }

    fn create_context (&self, device: cl_device_id) -> RawResult<cl_context> {
        Ok(create!(|err| unsafe { clCreateContext(null(), 1, &device, None, null_mut(), addr_of_mut!(err)) }))
    }

    fn release_context (&self, context: cl_context) -> RawResult<()> {
        unsafe { check!(clReleaseContext(context)) }
        Ok(())
    }

    #[allow(deprecated)]
    fn create_command_queue (&self, context: cl_context, device: cl_device_id) -> RawResult<cl_command_queue> {
        Ok(create!(|err| unsafe { clCreateCommandQueue(context, device, 0, addr_of_mut!(err)) }))
    }

    fn release_command_queue (&self, queue: cl_command_queue) -> RawResult<()> {
        unsafe { check!(clReleaseCommandQueue(queue)) }
        Ok(())
    }

    fn create_program_with_source (&self, context: cl_context, source: &str) -> RawResult<cl_program> {
        let len = source.len();
        let strings: *const c_char = source.as_ptr().cast();
        Ok(create!(|err| unsafe { clCreateProgramWithSource(context, 1, &strings, &len, addr_of_mut!(err)) }))
    }

    fn build_program (&self, program: cl_program, device: cl_device_id, options: Option<&str>) -> RawResult<()> {
        let options = options.map(c_string).transpose()?;
        let options = options.as_ref().map_or(null(), |o| o.as_ptr());
        unsafe { check!(clBuildProgram(program, 1, &device, options, None, null_mut())) }
        Ok(())
    }

    fn program_build_info (&self, program: cl_program, device: cl_device_id, param: BuildInfo, dst: Option<&mut [u8]>) -> RawResult<usize> {
        let (size, ptr) = dst_parts(dst);
        let mut len = 0;
        unsafe { check!(clGetProgramBuildInfo(program, device, Self::build_param(param), size, ptr, addr_of_mut!(len))) }
        Ok(len)
    }

    fn release_program (&self, program: cl_program) -> RawResult<()> {
        unsafe { check!(clReleaseProgram(program)) }
        Ok(())
    }

    fn create_kernel (&self, program: cl_program, name: &str) -> RawResult<cl_kernel> {
        let name = c_string(name).map_err(|_| CL_INVALID_KERNEL_NAME)?;
        Ok(create!(|err| unsafe { clCreateKernel(program, name.as_ptr(), addr_of_mut!(err)) }))
    }

    fn set_kernel_arg (&self, kernel: cl_kernel, index: u32, arg: KernelArg<'_, cl_mem>) -> RawResult<()> {
        match arg {
            KernelArg::Value(bytes) => unsafe { check!(clSetKernelArg(kernel, index, bytes.len(), bytes.as_ptr().cast())) },
            KernelArg::Mem(mem) => unsafe { check!(clSetKernelArg(kernel, index, std::mem::size_of::<cl_mem>(), (&mem as *const cl_mem).cast())) }
        }
        Ok(())
    }

    fn release_kernel (&self, kernel: cl_kernel) -> RawResult<()> {
        unsafe { check!(clReleaseKernel(kernel)) }
        Ok(())
    }

    fn create_buffer (&self, context: cl_context, access: MemAccess, size: usize) -> RawResult<cl_mem> {
        Ok(create!(|err| unsafe { clCreateBuffer(context, access.to_bits(), size, null_mut(), addr_of_mut!(err)) }))
    }

    fn release_mem_object (&self, mem: cl_mem) -> RawResult<()> {
        unsafe { check!(clReleaseMemObject(mem)) }
        Ok(())
    }

    unsafe fn enqueue_write_buffer (&self, queue: cl_command_queue, mem: cl_mem, blocking: bool, offset: usize, size: usize, src: *const u8) -> RawResult<()> {
        let blocking = if blocking { CL_TRUE } else { CL_FALSE };
        check!(clEnqueueWriteBuffer(queue, mem, blocking, offset, size, src.cast(), 0, null(), null_mut()));
        Ok(())
    }

    unsafe fn enqueue_read_buffer (&self, queue: cl_command_queue, mem: cl_mem, blocking: bool, offset: usize, size: usize, dst: *mut u8) -> RawResult<()> {
        let blocking = if blocking { CL_TRUE } else { CL_FALSE };
        check!(clEnqueueReadBuffer(queue, mem, blocking, offset, size, dst.cast(), 0, null(), null_mut()));
        Ok(())
    }

    fn enqueue_nd_range_kernel (&self, queue: cl_command_queue, kernel: cl_kernel, global: &[usize], local: Option<&[usize]>) -> RawResult<()> {
        if local.map_or(false, |l| l.len() != global.len()) {
            return Err(CL_INVALID_WORK_DIMENSION)
        }

        let work_dim = u32::try_from(global.len()).map_err(|_| CL_INVALID_WORK_DIMENSION)?;
        let local = local.map_or(null(), <[usize]>::as_ptr);
        unsafe { check!(clEnqueueNDRangeKernel(queue, kernel, work_dim, null(), global.as_ptr(), local, 0, null(), null_mut())) }
        Ok(())
    }

    fn flush (&self, queue: cl_command_queue) -> RawResult<()> {
        unsafe { check!(clFlush(queue)) }
        Ok(())
    }

    fn finish (&self, queue: cl_command_queue) -> RawResult<()> {
        unsafe { check!(clFinish(queue)) }
        Ok(())
    }
}
