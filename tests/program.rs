use clpipe::prelude::*;
use clpipe::host::{HostKernel, Invocation, Param};

const FILL: &str = "kernel void fill(global int* out, int value) { out[get_global_id(0)] = value; }";

fn fill (inv: &Invocation<'_>) -> RawResult<()> {
    let value = inv.value::<i32>(1)?;
    let mut out = inv.mem(0)?.bytes_mut()?;
    let out = bytemuck::try_cast_slice_mut::<u8, i32>(&mut out).map_err(|_| CL_INVALID_MEM_OBJECT)?;
    out.iter_mut().take(inv.global[0]).for_each(|x| *x = value);
    Ok(())
}

fn fill_host () -> Host {
    let mut host = Host::default();
    host.register("fill", HostKernel { params: &[Param::Mem, Param::Value(4)], run: fill });
    host
}

#[test]
fn build_and_run () -> Result<()> {
    let host = fill_host();
    let device = best_device(&host)?;
    let ctx = Context::from_descriptor(&host, &device)?;
    let queue = CommandQueue::new(&ctx)?;
    let buf = Buffer::with_len::<i32>(&ctx, MemAccess::WriteOnly, 16)?;

    let program = Program::from_source(&ctx, FILL, Some("-cl-fast-relaxed-math"))?;
    assert_eq!(program.build_status()?, BuildStatus::Success);
    assert_eq!(program.build_options()?, "-cl-fast-relaxed-math");

    let mut kernel = program.kernel("fill")?;
    assert!(format!("{kernel:?}").contains("\"fill\""));
    assert!(format!("{program:?} {queue:?}").starts_with("Program"));
    kernel.set_buffer(0, &buf)?;
    kernel.set_value(1, &42i32)?;

    queue.dispatch(&kernel, [16], None)?;
    queue.drain()?;

    let mut out = [0i32; 16];
    queue.read_blocking(&buf, 0, &mut out)?;
    assert_eq!(out, [42; 16]);
    Ok(())
}

#[test]
fn invalid_source () -> Result<()> {
    let host = Host::default();
    let device = best_device(&host)?;
    let ctx = Context::from_descriptor(&host, &device)?;

    let err = Program::from_source(&ctx, "__kernel void mx_mul(int rows {\n}\n", None).unwrap_err();
    assert!(err.is_build_failure());
    assert_eq!(err.function(), Some("clBuildProgram"));

    let desc = err.desc.as_deref().unwrap_or_default();
    assert!(desc.contains("status:  CL_BUILD_ERROR"), "{desc}");
    assert!(desc.contains("<kernel>:1:"), "{desc}");
    assert!(err.to_string().starts_with("Function clBuildProgram code CL_BUILD_PROGRAM_FAILURE (-11)"));

    assert_eq!(host.live_objects(), 1);
    Ok(())
}

#[test]
fn unknown_kernel_fails_build () -> Result<()> {
    let host = Host::default();
    let device = best_device(&host)?;
    let ctx = Context::from_descriptor(&host, &device)?;

    let err = Program::from_source(&ctx, FILL, None).unwrap_err();
    assert!(err.is_build_failure());
    assert!(err.desc.as_deref().unwrap_or_default().contains("'fill'"));
    Ok(())
}

#[test]
fn invalid_options () -> Result<()> {
    let host = fill_host();
    let device = best_device(&host)?;
    let ctx = Context::from_descriptor(&host, &device)?;

    let err = Program::from_source(&ctx, FILL, Some("fast")).unwrap_err();
    assert_eq!(err.status(), Some(CL_INVALID_BUILD_OPTIONS));
    Ok(())
}

#[test]
fn failing_diagnostics () -> Result<()> {
    let host = Host::default();
    let device = best_device(&host)?;
    let ctx = Context::from_descriptor(&host, &device)?;
    host.fail("clGetProgramBuildInfo", CL_OUT_OF_HOST_MEMORY);

    let err = Program::from_source(&ctx, "kernel void f( {}", None).unwrap_err();
    assert_eq!(err.function(), Some("clGetProgramBuildInfo"));
    assert_eq!(err.status(), Some(CL_OUT_OF_HOST_MEMORY));
    Ok(())
}

#[test]
fn unknown_kernel_name () -> Result<()> {
    let host = Host::default();
    let device = best_device(&host)?;
    let ctx = Context::from_descriptor(&host, &device)?;
    let program = Program::from_source(&ctx, MX_MUL_SOURCE, None)?;

    let err = program.kernel("mx_add").unwrap_err();
    assert_eq!(err.function(), Some("clCreateKernel"));
    assert_eq!(err.status(), Some(CL_INVALID_KERNEL_NAME));
    assert!(err.to_string().contains("kernel name: mx_add"));
    Ok(())
}

#[test]
fn invalid_arguments () -> Result<()> {
    let host = Host::default();
    let device = best_device(&host)?;
    let ctx = Context::from_descriptor(&host, &device)?;
    let program = Program::from_source(&ctx, MX_MUL_SOURCE, None)?;
    let mut kernel = program.kernel(MX_MUL)?;

    let err = kernel.set_value(6, &0i32).unwrap_err();
    assert_eq!(err.status(), Some(CL_INVALID_ARG_INDEX));

    let err = kernel.set_value(0, &0i64).unwrap_err();
    assert_eq!(err.status(), Some(CL_INVALID_ARG_SIZE));
    assert_eq!(err.function(), Some("clSetKernelArg"));
    Ok(())
}

#[test]
fn release_order () -> Result<()> {
    let host = Host::default();
    {
        let device = best_device(&host)?;
        let ctx = Context::from_descriptor(&host, &device)?;
        let program = Program::from_source(&ctx, MX_MUL_SOURCE, None)?;
        let _kernel = program.kernel(MX_MUL)?;
        assert_eq!(host.live_objects(), 3);
    }

    assert_eq!(host.live_objects(), 0);
    assert_eq!(host.calls("clReleaseKernel"), 1);
    assert_eq!(host.calls("clReleaseProgram"), 1);
    Ok(())
}
