#![allow(clippy::all)]
#![allow(clippy::needless_return)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! Compute device ranking and a resource-managed offload pipeline over OpenCL-style platforms.
//!
//! Devices are enumerated across every platform and ranked best-first ([`core::device`]). A
//! [`Context`](context::Context) bound to the chosen device owns everything derived from it:
//! [`CommandQueue`](core::CommandQueue)s, [`Program`](core::Program)s, [`Kernel`](core::Kernel)s and
//! [`Buffer`](buffer::Buffer)s. Each wrapper acquires exactly one platform resource when constructed
//! and releases it exactly once when dropped, and the borrow checker keeps every derived handle
//! inside its context's scope.
//!
//! Platform calls go through the [`Platform`](core::Platform) contract. Two implementations ship:
//! [`OpenCl`](opencl::OpenCl) (feature `opencl`) and the in-process [`Host`](host::Host) emulator.
//!
//! ```rust
//! use clpipe::prelude::*;
//!
//! # fn main () -> Result<()> {
//! let host = Host::default();
//! let device = best_device(&host)?;
//!
//! let a = Matrix::<f32>::from_fn(8, 8, |i, j| (i + j) as f32);
//! let bt = a.transpose();
//!
//! let report = offload_multiply(&host, device.id, &a, &bt, &OffloadConfig::default())?;
//! assert_eq!(report.result, Matrix::transpose_multiply(&a, &bt)?);
//! # Ok(())
//! # }
//! ```

macro_rules! flat_mod {
    ($($i:ident),+) => {
        $(
            mod $i;
            pub use $i::*;
        )+
    };
}

macro_rules! tri {
    ($f:literal, $e:expr) => {
        match $e {
            Ok(v) => v,
            Err(status) => return Err($crate::core::Error::platform($f, status))
        }
    };
}

pub mod prelude {
    pub use crate::buffer::{Buffer, MemAccess};
    pub use crate::context::{Context, Scope};
    pub use crate::core::*;
    pub use crate::host::{Host, HostDevice, HostPlatform};
    pub use crate::matrix::Matrix;
    pub use crate::offload::*;
    #[cfg(feature = "opencl")]
    pub use crate::opencl::OpenCl;
}

/// Device memory buffers
pub mod buffer;
/// Compute contexts and asynchronous transfer scopes
pub mod context;
/// Platform contract, error model, device ranking and resource handles
pub mod core;
/// In-process emulated platform
pub mod host;
/// Dense row-major matrices and the reference multiplication
pub mod matrix;
/// Matrix multiplication offload
pub mod offload;

#[cfg_attr(docsrs, doc(cfg(feature = "opencl")))]
#[cfg(feature = "opencl")]
pub mod opencl;
