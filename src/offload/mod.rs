use tracing::{debug, error, info};
use crate::{buffer::{Buffer, MemAccess}, context::Context, core::*, matrix::Matrix};

flat_mod!(config, timer);

/// Entry point of [`MX_MUL_SOURCE`].
pub const MX_MUL: &str = "mx_mul";

/// Multiplies `A` (`rows x to_sum`) by `B`, given as its transpose (`cols x to_sum`), into `C` (`rows x cols`).
/// One work item per output cell.
pub const MX_MUL_SOURCE: &str = r#"
__kernel void mx_mul(int rows, int cols, int to_sum, __global const float *A, __global const float *B, __global float *C)
{
    int i = get_global_id(0);
    int j = get_global_id(1);

    float x = 0;

    for (int k = 0; k < to_sum; ++k)
        x += A[i * to_sum + k] * B[j * to_sum + k];

    C[i * cols + j] = x;
}
"#;

/// Result of [`offload_multiply`].
#[derive(Debug, Clone, PartialEq)]
pub struct OffloadReport<T = f32> {
    pub result: Matrix<T>,
    /// Time spent in dispatch and completion of the kernel, excluding transfers.
    pub kernel_ms: f64
}

/// Multiplies `a` by the matrix whose transpose is `bt` on `device`.
///
/// Row and column counts of the product must be multiples of `config.tile`. This is checked before
/// any platform call is made.
///
/// # Errors
/// - [`ErrorKind::ShapeUnsupported`] if the operands can't be offloaded.
/// - The first failing platform call, unchanged. It is logged before being returned.
pub fn offload_multiply<P: Platform> (platform: &P, device: P::DeviceId, a: &Matrix<f32>, bt: &Matrix<f32>, config: &OffloadConfig) -> Result<OffloadReport> {
    let shape = check_shape(a, bt, config)?;

    match multiply(platform, device, a, bt, config, shape) {
        Ok(report) => {
            info!(rows = shape.rows, cols = shape.cols, to_sum = shape.to_sum, kernel_ms = report.kernel_ms, "offload complete");
            Ok(report)
        },

        Err(e) => {
            if let ErrorKind::Platform { function, status } = e.kind {
                error!(function, code = status.code(), status = status.name(), "offload failed");
            }
            Err(e)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Shape {
    rows: i32,
    cols: i32,
    to_sum: i32,
    /// Cells of the product.
    cells: usize
}

#[inline]
fn check_shape (a: &Matrix<f32>, bt: &Matrix<f32>, config: &OffloadConfig) -> Result<Shape> {
    if a.cols() != bt.cols() {
        return Err(Error::new(ErrorKind::ShapeUnsupported, format!("shared dimension mismatch: {} vs {}", a.cols(), bt.cols())))
    }
    check_dims(a.rows(), bt.rows(), a.cols(), config)
}

/// Validates a `rows x cols` product over a shared dimension of `to_sum`.
fn check_dims (rows: usize, cols: usize, to_sum: usize, config: &OffloadConfig) -> Result<Shape> {
    config.validate()?;
    let tile = config.tile;

    if rows == 0 || cols == 0 || to_sum == 0 {
        return Err(Error::new(ErrorKind::ShapeUnsupported, "empty operand"))
    }

    if rows % tile != 0 || cols % tile != 0 {
        return Err(Error::new(
            ErrorKind::ShapeUnsupported,
            format!("can't multiply matrices whose sizes are not divisible by {tile} (rows={rows}, cols={cols})")
        ))
    }

    let int = |v: usize| i32::try_from(v)
        .map_err(|_| Error::new(ErrorKind::ShapeUnsupported, format!("dimension {v} overflows a kernel int")));

    let cells = rows.checked_mul(cols)
        .filter(|cells| cells.checked_mul(std::mem::size_of::<f32>()).is_some())
        .ok_or_else(|| Error::new(ErrorKind::ShapeUnsupported, format!("a {rows}x{cols} product overflows usize")))?;

    Ok(Shape { rows: int(rows)?, cols: int(cols)?, to_sum: int(to_sum)?, cells })
}

fn multiply<P: Platform> (platform: &P, device: P::DeviceId, a: &Matrix<f32>, bt: &Matrix<f32>, config: &OffloadConfig, shape: Shape) -> Result<OffloadReport> {
    let ctx = Context::new(platform, device)?;
    let lhs = Buffer::with_len::<f32>(&ctx, MemAccess::ReadOnly, a.as_slice().len())?;
    let rhs = Buffer::with_len::<f32>(&ctx, MemAccess::ReadOnly, bt.as_slice().len())?;
    let out = Buffer::with_len::<f32>(&ctx, MemAccess::WriteOnly, shape.cells)?;

    let queue = CommandQueue::new(&ctx)?;
    let program = Program::from_source(&ctx, &config.source, config.options.as_deref())?;
    let mut kernel = program.kernel(&config.entry)?;

    kernel.set_value(0, &shape.rows)?;
    kernel.set_value(1, &shape.cols)?;
    kernel.set_value(2, &shape.to_sum)?;
    kernel.set_buffer(3, &lhs)?;
    kernel.set_buffer(4, &rhs)?;
    kernel.set_buffer(5, &out)?;

    queue.scope(|s| {
        let mut offset = 0;
        for row in a.row_iter() {
            offset += s.write(&lhs, offset, row)?;
        }

        offset = 0;
        for row in bt.row_iter() {
            offset += s.write(&rhs, offset, row)?;
        }

        debug!(lhs = lhs.size(), rhs = rhs.size(), "operands enqueued");
        Ok(())
    })?;

    let mut timer = Timer::start();
    queue.dispatch(&kernel, [a.rows(), bt.rows()], Some([config.tile, config.tile]))?;
    queue.drain()?;
    let kernel_ms = timer.stop();

    let mut result = Matrix::zeros(a.rows(), bt.rows());
    queue.scope(|s| {
        let mut offset = 0;
        for row in result.row_iter_mut() {
            offset += s.read(&out, offset, row)?;
        }
        Ok(())
    })?;

    Ok(OffloadReport { result, kernel_ms })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_aligned_dims () -> Result<()> {
        let shape = check_dims(16, 24, 5, &OffloadConfig::default())?;
        assert_eq!((shape.rows, shape.cols, shape.to_sum, shape.cells), (16, 24, 5, 384));
        Ok(())
    }

    #[test]
    fn oversized_dims () {
        let config = OffloadConfig::default();
        let huge = usize::MAX / 8 * 8;

        for (rows, cols) in [(huge, 8), (8, huge)] {
            let err = check_dims(rows, cols, 8, &config).unwrap_err();
            assert_eq!(err.kind, ErrorKind::ShapeUnsupported);
        }
    }

    #[test]
    fn unaligned_dims () {
        let err = check_dims(10, 16, 16, &OffloadConfig::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ShapeUnsupported);
        assert!(err.to_string().contains("rows=10"));
    }
}
