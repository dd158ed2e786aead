use std::{collections::HashMap, fmt::Debug, rc::Rc};
use bytemuck::Pod;
use once_cell::sync::Lazy;
use crate::{core::*, offload::MX_MUL};
use super::HostMemory;

/// Kind of one kernel parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    /// Plain value of the given byte size.
    Value (usize),
    /// Memory object.
    Mem
}

/// Host implementation of a kernel entry point.
#[derive(Clone, Copy)]
pub struct HostKernel {
    pub params: &'static [Param],
    pub run: fn(&Invocation<'_>) -> RawResult<()>
}

impl Debug for HostKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostKernel").field("params", &self.params).finish_non_exhaustive()
    }
}

/// Argument captured when a dispatch is enqueued.
#[derive(Debug, Clone)]
pub(super) enum ArgValue {
    Value (Vec<u8>),
    Mem (Rc<HostMemory>)
}

/// One dispatch, as seen by a [`HostKernel`].
#[derive(Debug)]
pub struct Invocation<'a> {
    pub global: &'a [usize],
    pub local: Option<&'a [usize]>,
    /// Compute units of the device the dispatch runs on.
    pub units: u32,
    pub(super) args: &'a [ArgValue]
}

impl<'a> Invocation<'a> {
    pub fn value<T: Pod> (&self, index: usize) -> RawResult<T> {
        match self.args.get(index) {
            Some(ArgValue::Value(bytes)) => bytemuck::try_pod_read_unaligned(bytes).map_err(|_| CL_INVALID_ARG_SIZE),
            Some(ArgValue::Mem(_)) => Err(CL_INVALID_ARG_VALUE),
            None => Err(CL_INVALID_ARG_INDEX)
        }
    }

    pub fn mem (&self, index: usize) -> RawResult<&'a HostMemory> {
        match self.args.get(index) {
            Some(ArgValue::Mem(mem)) => Ok(&**mem),
            Some(ArgValue::Value(_)) => Err(CL_INVALID_MEM_OBJECT),
            None => Err(CL_INVALID_ARG_INDEX)
        }
    }
}

/// Kernels every [`Host`](super::Host) can build.
pub(super) static BUILTINS: Lazy<HashMap<&'static str, HostKernel>> = Lazy::new(|| {
    let mut kernels = HashMap::new();
    kernels.insert(MX_MUL, HostKernel {
        params: &[Param::Value(4), Param::Value(4), Param::Value(4), Param::Mem, Param::Mem, Param::Mem],
        run: mx_mul
    });
    kernels
});

/// `C[i * cols + j] = sum(A[i * to_sum + k] * B[j * to_sum + k])` over the global range, rows split between the device's units.
fn mx_mul (inv: &Invocation<'_>) -> RawResult<()> {
    let cols = usize::try_from(inv.value::<i32>(1)?).map_err(|_| CL_INVALID_ARG_VALUE)?;
    let to_sum = usize::try_from(inv.value::<i32>(2)?).map_err(|_| CL_INVALID_ARG_VALUE)?;

    let (gi, gj) = match *inv.global {
        [i] => (i, 1),
        [i, j] => (i, j),
        _ => return Err(CL_INVALID_WORK_DIMENSION)
    };

    let a = inv.mem(3)?.bytes()?;
    let b = inv.mem(4)?.bytes()?;
    let mut c = inv.mem(5)?.bytes_mut()?;

    let a = bytemuck::try_cast_slice::<u8, f32>(&a).map_err(|_| CL_INVALID_MEM_OBJECT)?;
    let b = bytemuck::try_cast_slice::<u8, f32>(&b).map_err(|_| CL_INVALID_MEM_OBJECT)?;
    let c = bytemuck::try_cast_slice_mut::<u8, f32>(&mut c).map_err(|_| CL_INVALID_MEM_OBJECT)?;

    // out of bounds accesses
    if gj > cols || a.len() < gi * to_sum || b.len() < gj * to_sum || c.len() < gi * cols {
        return Err(CL_OUT_OF_RESOURCES)
    }

    let workers = (inv.units.max(1) as usize).min(gi);
    let per_worker = (gi + workers - 1) / workers;

    crossbeam::thread::scope(|s| {
        for (chunk, out) in c[..gi * cols].chunks_mut(per_worker * cols).enumerate() {
            s.spawn(move |_| {
                for (r, out) in out.chunks_mut(cols).enumerate() {
                    let i = chunk * per_worker + r;
                    let row = &a[i * to_sum..(i + 1) * to_sum];

                    for (j, cell) in out[..gj].iter_mut().enumerate() {
                        let col = &b[j * to_sum..(j + 1) * to_sum];
                        let mut x = 0f32;
                        for k in 0..to_sum {
                            x += row[k] * col[k];
                        }
                        *cell = x;
                    }
                }
            });
        }
    }).map_err(|_| CL_OUT_OF_RESOURCES)
}
