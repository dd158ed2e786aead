#![cfg(feature = "opencl")]

use clpipe::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

#[test]
#[ignore = "needs an OpenCL driver"]
fn enumerate () -> Result<()> {
    for device in enumerate_devices(&OpenCl)? {
        println!("{device}");
    }
    Ok(())
}

#[test]
#[ignore = "needs an OpenCL driver"]
fn multiply () -> Result<()> {
    let device = best_device(&OpenCl)?;
    let mut rng = StdRng::seed_from_u64(1024);
    let a = Matrix::<f32>::random(256, 256, &mut rng);
    let bt = Matrix::<f32>::random(256, 256, &mut rng);

    let report = offload_multiply(&OpenCl, device.id, &a, &bt, &OffloadConfig::default())?;
    let reference = Matrix::transpose_multiply(&a, &bt)?;
    assert!(reference.max_abs_diff(&report.result)? < 1e-2);
    Ok(())
}

#[test]
#[ignore = "needs an OpenCL driver"]
fn build_log () -> Result<()> {
    let device = best_device(&OpenCl)?;
    let ctx = Context::from_descriptor(&OpenCl, &device)?;

    let err = Program::from_source(&ctx, "__kernel void broken(int x { }", None).unwrap_err();
    assert!(err.is_build_failure());
    println!("{err}");
    Ok(())
}
