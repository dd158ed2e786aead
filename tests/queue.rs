use clpipe::prelude::*;

const N: usize = 16;

fn with_mx_mul<F> (host: &Host, f: F) -> Result<()> where F: FnOnce(&CommandQueue<'_, Host>, &Kernel<'_, Host>) -> Result<()> {
    let device = best_device(host)?;
    let ctx = Context::from_descriptor(host, &device)?;
    let a = Buffer::with_len::<f32>(&ctx, MemAccess::ReadOnly, N * N)?;
    let b = Buffer::with_len::<f32>(&ctx, MemAccess::ReadOnly, N * N)?;
    let c = Buffer::with_len::<f32>(&ctx, MemAccess::WriteOnly, N * N)?;

    let queue = CommandQueue::new(&ctx)?;
    let program = Program::from_source(&ctx, MX_MUL_SOURCE, None)?;
    let mut kernel = program.kernel(MX_MUL)?;

    kernel.set_value(0, &(N as i32))?;
    kernel.set_value(1, &(N as i32))?;
    kernel.set_value(2, &(N as i32))?;
    kernel.set_buffer(3, &a)?;
    kernel.set_buffer(4, &b)?;
    kernel.set_buffer(5, &c)?;

    f(&queue, &kernel)
}

#[test]
fn tiled_dispatch () -> Result<()> {
    let host = Host::default();
    with_mx_mul(&host, |queue, kernel| {
        queue.dispatch(kernel, [N, N], Some([8, 8]))?;
        queue.dispatch(kernel, [N, N], None)?;
        queue.drain()
    })?;

    assert_eq!(host.calls("clEnqueueNDRangeKernel"), 2);
    Ok(())
}

#[test]
fn tile_must_divide_global () -> Result<()> {
    let host = Host::default();
    with_mx_mul(&host, |queue, kernel| {
        let err = queue.dispatch(kernel, [N, N], Some([3, 3])).unwrap_err();
        assert_eq!(err.function(), Some("clEnqueueNDRangeKernel"));
        assert_eq!(err.status(), Some(CL_INVALID_WORK_GROUP_SIZE));
        Ok(())
    })
}

#[test]
fn tile_over_device_limit () -> Result<()> {
    let host = Host::new(vec![HostPlatform::new(vec![HostDevice::cpu("tiny", 2).with_max_work_group(32)])]);
    with_mx_mul(&host, |queue, kernel| {
        let err = queue.dispatch(kernel, [N, N], Some([8, 8])).unwrap_err();
        assert_eq!(err.status(), Some(CL_INVALID_WORK_GROUP_SIZE));

        queue.dispatch(kernel, [N, N], Some([4, 8]))
    })
}

#[test]
fn empty_global_range () -> Result<()> {
    let host = Host::default();
    with_mx_mul(&host, |queue, kernel| {
        let err = queue.dispatch(kernel, [0, N], None).unwrap_err();
        assert_eq!(err.status(), Some(CL_INVALID_GLOBAL_WORK_SIZE));
        Ok(())
    })
}

#[test]
fn unset_arguments () -> Result<()> {
    let host = Host::default();
    let device = best_device(&host)?;
    let ctx = Context::from_descriptor(&host, &device)?;
    let queue = CommandQueue::new(&ctx)?;
    let program = Program::from_source(&ctx, MX_MUL_SOURCE, None)?;
    let mut kernel = program.kernel(MX_MUL)?;
    kernel.set_value(0, &8i32)?;

    let err = queue.dispatch(&kernel, [8, 8], Some([8, 8])).unwrap_err();
    assert_eq!(err.status(), Some(CL_INVALID_KERNEL_ARGS));
    Ok(())
}

#[test]
fn failing_finish () -> Result<()> {
    let host = Host::default();
    with_mx_mul(&host, |queue, _| {
        host.fail("clFinish", CL_OUT_OF_RESOURCES);
        let err = queue.drain().unwrap_err();
        assert_eq!(err.function(), Some("clFinish"));
        host.clear_faults();
        Ok(())
    })?;

    assert_eq!(host.live_objects(), 0);
    Ok(())
}
