use std::fmt::Debug;
use tracing::{debug, warn};
use crate::{context::Context, core::*};

flat_mod!(flags);

/// A device memory buffer of a fixed byte size, owned by a [`Context`].
pub struct Buffer<'ctx, P: Platform> {
    ctx: &'ctx Context<'ctx, P>,
    id: P::Mem,
    access: MemAccess,
    size: usize
}

impl<'ctx, P: Platform> Buffer<'ctx, P> {
    /// Allocates `size` bytes of device memory.
    pub fn new (ctx: &'ctx Context<'ctx, P>, access: MemAccess, size: usize) -> Result<Self> {
        let id = tri!("clCreateBuffer", ctx.platform().create_buffer(ctx.id(), access, size));
        debug!(mem = ?id, size, ?access, "created buffer");
        Ok(Self { ctx, id, access, size })
    }

    /// Allocates room for `len` values of `T`.
    pub fn with_len<T> (ctx: &'ctx Context<'ctx, P>, access: MemAccess, len: usize) -> Result<Self> {
        match len.checked_mul(std::mem::size_of::<T>()) {
            Some(size) => Self::new(ctx, access, size),
            None => Err(Error::platform("clCreateBuffer", CL_INVALID_BUFFER_SIZE).attach(format_args!("{len} elements overflow usize")))
        }
    }

    #[inline(always)]
    pub fn id (&self) -> P::Mem {
        self.id
    }

    #[inline(always)]
    pub fn access (&self) -> MemAccess {
        self.access
    }

    /// Size in bytes.
    #[inline(always)]
    pub fn size (&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn context (&self) -> &'ctx Context<'ctx, P> {
        self.ctx
    }
}

impl<P: Platform> Debug for Buffer<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("access", &self.access)
            .field("size", &self.size)
            .finish()
    }
}

impl<P: Platform> Drop for Buffer<'_, P> {
    fn drop(&mut self) {
        match self.ctx.platform().release_mem_object(self.id) {
            Ok(()) => debug!(mem = ?self.id, "released buffer"),
            Err(status) => warn!(mem = ?self.id, %status, "clReleaseMemObject failed")
        }
    }
}
