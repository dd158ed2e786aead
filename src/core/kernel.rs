use bytemuck::Pod;
use tracing::{debug, warn};
use crate::buffer::Buffer;
use super::*;

/// A named entry point of a built [`Program`], with its arguments.
pub struct Kernel<'a, P: Platform> {
    program: &'a Program<'a, P>,
    id: P::Kernel,
    name: String
}

impl<'a, P: Platform> Kernel<'a, P> {
    pub fn new (program: &'a Program<'a, P>, name: &str) -> Result<Self> {
        let platform = program.context().platform();
        let id = match platform.create_kernel(program.id(), name) {
            Ok(id) => id,
            Err(status) => return Err(Error::platform("clCreateKernel", status).attach(format_args!("kernel name: {name}")))
        };

        debug!(kernel = ?id, name, "created kernel");
        Ok(Self { program, id, name: name.to_string() })
    }

    #[inline(always)]
    pub fn id (&self) -> P::Kernel {
        self.id
    }

    #[inline(always)]
    pub fn name (&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn program (&self) -> &'a Program<'a, P> {
        self.program
    }

    /// Binds a raw argument.
    /// # Safety
    /// A memory object passed through [`KernelArg::Mem`] must stay alive for as long as this kernel may be dispatched.
    #[inline]
    pub unsafe fn set_argument (&mut self, index: u32, arg: KernelArg<'_, P::Mem>) -> Result<()> {
        tri!("clSetKernelArg", self.program.context().platform().set_kernel_arg(self.id, index, arg));
        Ok(())
    }

    /// Binds a plain value, passed by bytes.
    #[inline(always)]
    pub fn set_value<T: Pod> (&mut self, index: u32, value: &T) -> Result<()> {
        unsafe { self.set_argument(index, KernelArg::Value(bytemuck::bytes_of(value))) }
    }

    /// Binds a buffer. The buffer is borrowed for as long as the kernel lives.
    #[inline(always)]
    pub fn set_buffer (&mut self, index: u32, buffer: &'a Buffer<'a, P>) -> Result<()> {
        unsafe { self.set_argument(index, KernelArg::Mem(buffer.id())) }
    }
}

impl<P: Platform> std::fmt::Debug for Kernel<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("program", &self.program.id())
            .finish()
    }
}

impl<P: Platform> Drop for Kernel<'_, P> {
    fn drop(&mut self) {
        match self.program.context().platform().release_kernel(self.id) {
            Ok(()) => debug!(kernel = ?self.id, name = %self.name, "released kernel"),
            Err(status) => warn!(kernel = ?self.id, %status, "clReleaseKernel failed")
        }
    }
}
