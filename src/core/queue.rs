use bytemuck::Pod;
use tracing::{debug, trace, warn};
use crate::{buffer::Buffer, context::Context};
use super::*;

/// Global or local extent of a dispatch, in one or two dimensions.
pub trait WorkDims: sealed::Sealed + Copy {
    fn dims (&self) -> &[usize];
}

impl WorkDims for [usize; 1] {
    #[inline(always)]
    fn dims (&self) -> &[usize] {
        self
    }
}

impl WorkDims for [usize; 2] {
    #[inline(always)]
    fn dims (&self) -> &[usize] {
        self
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for [usize; 1] {}
    impl Sealed for [usize; 2] {}
}

/// In-order command queue on a context's device.
pub struct CommandQueue<'ctx, P: Platform> {
    ctx: &'ctx Context<'ctx, P>,
    id: P::Queue
}

impl<'ctx, P: Platform> CommandQueue<'ctx, P> {
    pub fn new (ctx: &'ctx Context<'ctx, P>) -> Result<Self> {
        let id = tri!("clCreateCommandQueue", ctx.platform().create_command_queue(ctx.id(), ctx.device()));
        debug!(queue = ?id, "created command queue");
        Ok(Self { ctx, id })
    }

    #[inline(always)]
    pub fn id (&self) -> P::Queue {
        self.id
    }

    #[inline(always)]
    pub fn context (&self) -> &'ctx Context<'ctx, P> {
        self.ctx
    }

    /// Enqueues a copy of `src` into `buffer`, starting `offset` bytes in. Returns the number of bytes enqueued.
    /// # Safety
    /// If `synchronous` is `false`, `src` must stay alive and unmodified until the queue has been
    /// [`finish`](CommandQueue::finish)ed. Prefer [`write_blocking`](CommandQueue::write_blocking) or
    /// [`Scope::write`](crate::context::Scope::write).
    pub unsafe fn write<T: Pod> (&self, buffer: &Buffer<'_, P>, offset: usize, src: &[T], synchronous: bool) -> Result<usize> {
        let src = bytemuck::cast_slice::<T, u8>(src);
        tri!(
            "clEnqueueWriteBuffer",
            self.platform().enqueue_write_buffer(self.id, buffer.id(), synchronous, offset, src.len(), src.as_ptr())
        );

        trace!(queue = ?self.id, mem = ?buffer.id(), offset, size = src.len(), synchronous, "enqueued write");
        Ok(src.len())
    }

    /// Enqueues a copy from `buffer`, starting `offset` bytes in, into `dst`. Returns the number of bytes enqueued.
    /// # Safety
    /// If `synchronous` is `false`, `dst` must stay alive and must not be accessed until the queue has been
    /// [`finish`](CommandQueue::finish)ed. Prefer [`read_blocking`](CommandQueue::read_blocking) or
    /// [`Scope::read`](crate::context::Scope::read).
    pub unsafe fn read<T: Pod> (&self, buffer: &Buffer<'_, P>, offset: usize, dst: &mut [T], synchronous: bool) -> Result<usize> {
        let dst = bytemuck::cast_slice_mut::<T, u8>(dst);
        tri!(
            "clEnqueueReadBuffer",
            self.platform().enqueue_read_buffer(self.id, buffer.id(), synchronous, offset, dst.len(), dst.as_mut_ptr())
        );

        trace!(queue = ?self.id, mem = ?buffer.id(), offset, size = dst.len(), synchronous, "enqueued read");
        Ok(dst.len())
    }

    #[inline(always)]
    pub fn write_blocking<T: Pod> (&self, buffer: &Buffer<'_, P>, offset: usize, src: &[T]) -> Result<usize> {
        unsafe { self.write(buffer, offset, src, true) }
    }

    #[inline(always)]
    pub fn read_blocking<T: Pod> (&self, buffer: &Buffer<'_, P>, offset: usize, dst: &mut [T]) -> Result<usize> {
        unsafe { self.read(buffer, offset, dst, true) }
    }

    /// Enqueues `kernel` over a `global` range, optionally split in `local` work groups.
    /// The arguments of `kernel` are captured at enqueue time.
    pub fn dispatch<D: WorkDims> (&self, kernel: &Kernel<'_, P>, global: D, local: Option<D>) -> Result<()> {
        let local = local.as_ref().map(WorkDims::dims);
        tri!("clEnqueueNDRangeKernel", self.platform().enqueue_nd_range_kernel(self.id, kernel.id(), global.dims(), local));
        trace!(queue = ?self.id, kernel = kernel.name(), global = ?global.dims(), ?local, "enqueued dispatch");
        Ok(())
    }

    #[inline(always)]
    pub fn flush (&self) -> Result<()> {
        tri!("clFlush", self.platform().flush(self.id));
        Ok(())
    }

    #[inline(always)]
    pub fn finish (&self) -> Result<()> {
        tri!("clFinish", self.platform().finish(self.id));
        Ok(())
    }

    /// Flushes the queue, then blocks until every enqueued command has completed.
    #[inline]
    pub fn drain (&self) -> Result<()> {
        self.flush()?;
        self.finish()
    }

    #[inline(always)]
    fn platform (&self) -> &'ctx P {
        self.ctx.platform()
    }
}

impl<P: Platform> std::fmt::Debug for CommandQueue<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue")
            .field("id", &self.id)
            .field("context", &self.ctx.id())
            .finish()
    }
}

impl<P: Platform> Drop for CommandQueue<'_, P> {
    fn drop(&mut self) {
        match self.platform().release_command_queue(self.id) {
            Ok(()) => debug!(queue = ?self.id, "released command queue"),
            Err(status) => warn!(queue = ?self.id, %status, "clReleaseCommandQueue failed")
        }
    }
}
