use num_enum::FromPrimitive;
use tracing::{debug, error, warn};
use crate::context::Context;
use super::*;
use super::device::trim_nul;

/// Outcome of the last build of a program for a device (`cl_build_status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(i32)]
pub enum BuildStatus {
    Success = 0,
    None = -1,
    Error = -2,
    InProgress = -3,
    #[num_enum(default)]
    Unknown = 1
}

impl BuildStatus {
    #[inline]
    pub const fn name (self) -> &'static str {
        match self {
            Self::Success => "CL_BUILD_SUCCESS",
            Self::None => "CL_BUILD_NONE",
            Self::Error => "CL_BUILD_ERROR",
            Self::InProgress => "CL_BUILD_IN_PROGRESS",
            Self::Unknown => "<unknown>"
        }
    }
}

/// A program created from source text and built for its context's device.
pub struct Program<'ctx, P: Platform> {
    ctx: &'ctx Context<'ctx, P>,
    id: P::Program
}

impl<'ctx, P: Platform> Program<'ctx, P> {
    /// Creates a program from `source` and builds it for the context's device.
    ///
    /// If the build fails, the returned error carries the build status, the options and the build
    /// log. If one of those diagnostic queries fails itself, that failure is returned instead.
    pub fn from_source (ctx: &'ctx Context<'ctx, P>, source: &str, options: Option<&str>) -> Result<Self> {
        let platform = ctx.platform();
        let id = tri!("clCreateProgramWithSource", platform.create_program_with_source(ctx.id(), source));
        let this = Self { ctx, id };

        if let Err(status) = platform.build_program(id, ctx.device(), options) {
            let err = this.diagnose(Error::platform("clBuildProgram", status))?;
            error!(program = ?id, error = %err, "program build failed");
            return Err(err)
        }

        debug!(program = ?id, "built program");
        Ok(this)
    }

    #[inline(always)]
    pub fn id (&self) -> P::Program {
        self.id
    }

    #[inline(always)]
    pub fn context (&self) -> &'ctx Context<'ctx, P> {
        self.ctx
    }

    #[inline(always)]
    pub fn kernel (&self, name: &str) -> Result<Kernel<'_, P>> {
        Kernel::new(self, name)
    }

    #[inline]
    pub fn build_status (&self) -> Result<BuildStatus> {
        let mut bytes = [0u8; std::mem::size_of::<i32>()];
        tri!("clGetProgramBuildInfo", self.platform().program_build_info(self.id, self.ctx.device(), BuildInfo::Status, Some(&mut bytes)));
        Ok(BuildStatus::from_primitive(i32::from_ne_bytes(bytes)))
    }

    #[inline(always)]
    pub fn build_options (&self) -> Result<String> {
        self.build_info_string(BuildInfo::Options)
    }

    #[inline(always)]
    pub fn build_log (&self) -> Result<String> {
        self.build_info_string(BuildInfo::Log)
    }

    fn build_info_string (&self, param: BuildInfo) -> Result<String> {
        let device = self.ctx.device();
        let len = tri!("clGetProgramBuildInfo", self.platform().program_build_info(self.id, device, param, None));
        let mut bytes = vec![0u8; len];
        tri!("clGetProgramBuildInfo", self.platform().program_build_info(self.id, device, param, Some(&mut bytes)));
        Ok(trim_nul(bytes))
    }

    fn diagnose (&self, err: Error) -> Result<Error> {
        let status = self.build_status()?;
        let options = self.build_options()?;
        let log = self.build_log()?;

        Ok(err
            .attach(format_args!("status:  {}", status.name()))
            .attach(format_args!("options: {options}"))
            .attach(format_args!("log:\n{log}"))
        )
    }

    #[inline(always)]
    fn platform (&self) -> &'ctx P {
        self.ctx.platform()
    }
}

impl<P: Platform> std::fmt::Debug for Program<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("id", &self.id)
            .field("context", &self.ctx.id())
            .finish()
    }
}

impl<P: Platform> Drop for Program<'_, P> {
    fn drop(&mut self) {
        match self.platform().release_program(self.id) {
            Ok(()) => debug!(program = ?self.id, "released program"),
            Err(status) => warn!(program = ?self.id, %status, "clReleaseProgram failed")
        }
    }
}
