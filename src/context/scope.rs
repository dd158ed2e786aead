use std::{marker::PhantomData, panic::{catch_unwind, resume_unwind, AssertUnwindSafe}};
use bytemuck::Pod;
use tracing::warn;
use crate::{buffer::Buffer, core::*};

/// A region in which asynchronous transfers may borrow host memory.\
/// See [`CommandQueue::scope`]
pub struct Scope<'scope, 'env: 'scope, P: Platform> {
    queue: &'env CommandQueue<'env, P>,
    scope: PhantomData<&'scope mut &'scope ()>,
    env: PhantomData<&'env mut &'env ()>
}

impl<'scope, 'env: 'scope, P: Platform> Scope<'scope, 'env, P> {
    #[inline(always)]
    pub fn queue (&self) -> &'env CommandQueue<'env, P> {
        self.queue
    }

    /// Enqueues an asynchronous copy of `src` into `buffer` at `offset` bytes, returning the number of bytes enqueued.
    #[inline(always)]
    pub fn write<T: Pod> (&'scope self, buffer: &'env Buffer<'env, P>, offset: usize, src: &'env [T]) -> Result<usize> {
        // SAFETY: `src` and `buffer` outlive the scope, which drains the queue before returning.
        unsafe { self.queue.write(buffer, offset, src, false) }
    }

    /// Enqueues an asynchronous copy from `buffer` at `offset` bytes into `dst`, returning the number of bytes enqueued.
    /// `dst` holds its final contents once the scope has drained.
    #[inline(always)]
    pub fn read<T: Pod> (&'scope self, buffer: &'env Buffer<'env, P>, offset: usize, dst: &'env mut [T]) -> Result<usize> {
        // SAFETY: `dst` stays mutably borrowed until the scope drains the queue.
        unsafe { self.queue.read(buffer, offset, dst, false) }
    }

    #[inline(always)]
    pub fn dispatch<D: WorkDims> (&'scope self, kernel: &Kernel<'_, P>, global: D, local: Option<D>) -> Result<()> {
        self.queue.dispatch(kernel, global, local)
    }

    /// Blocks until everything enqueued so far has completed.
    #[inline(always)]
    pub fn drain (&'scope self) -> Result<()> {
        self.queue.drain()
    }
}

impl<'ctx, P: Platform> CommandQueue<'ctx, P> {
    /// Runs `f` in a [`Scope`] over this queue. The queue is drained before returning, whether `f`
    /// succeeds, fails or panics, so host memory borrowed by asynchronous transfers is never released early.
    ///
    /// An error returned by `f` takes precedence over a failure of the final drain.
    pub fn scope<'env, T, F> (&'env self, f: F) -> Result<T> where F: for<'scope> FnOnce(&'scope Scope<'scope, 'env, P>) -> Result<T> {
        let scope = Scope {
            queue: self,
            scope: PhantomData,
            env: PhantomData
        };

        let result = catch_unwind(AssertUnwindSafe(|| f(&scope)));
        let drained = self.drain();

        match result {
            Err(payload) => resume_unwind(payload),
            Ok(Err(e)) => {
                if let Err(ref drain) = drained {
                    warn!(error = %drain, "drain failed after scope error");
                }
                Err(e)
            },
            Ok(Ok(v)) => drained.map(|_| v)
        }
    }
}
