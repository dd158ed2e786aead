use clpipe::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

#[test]
fn blocking_round_trip () -> Result<()> {
    let host = Host::default();
    let device = best_device(&host)?;
    let ctx = Context::from_descriptor(&host, &device)?;
    let queue = CommandQueue::new(&ctx)?;

    let mut rng = StdRng::seed_from_u64(16);
    let src = (0..256).map(|_| rng.gen::<f32>()).collect::<Vec<_>>();
    let buf = Buffer::with_len::<f32>(&ctx, MemAccess::ReadOnly, src.len())?;
    assert_eq!(buf.size(), 1024);

    assert_eq!(queue.write_blocking(&buf, 0, &src)?, 1024);

    let mut dst = vec![0f32; 256];
    assert_eq!(queue.read_blocking(&buf, 0, &mut dst)?, 1024);
    assert_eq!(src, dst);

    let mut tail = [0f32; 4];
    queue.read_blocking(&buf, 252 * 4, &mut tail)?;
    assert_eq!(&tail, &src[252..]);
    Ok(())
}

#[test]
fn scoped_round_trip () -> Result<()> {
    let host = Host::default();
    let device = best_device(&host)?;
    let ctx = Context::from_descriptor(&host, &device)?;
    let queue = CommandQueue::new(&ctx)?;

    let mut rng = StdRng::seed_from_u64(32);
    let m = Matrix::<f32>::random(16, 16, &mut rng);
    let buf = Buffer::with_len::<f32>(&ctx, MemAccess::ReadOnly, 256)?;

    queue.scope(|s| {
        for (i, row) in m.row_iter().enumerate() {
            s.write(&buf, i * 16 * 4, row)?;
        }
        Ok(())
    })?;

    let mut out = Matrix::<f32>::zeros(16, 16);
    queue.scope(|s| {
        for (i, row) in out.row_iter_mut().enumerate() {
            s.read(&buf, i * 16 * 4, row)?;
        }
        Ok(())
    })?;

    assert_eq!(m, out);
    Ok(())
}

#[test]
fn async_read_completes_on_drain () -> Result<()> {
    let host = Host::default();
    let device = best_device(&host)?;
    let ctx = Context::from_descriptor(&host, &device)?;
    let queue = CommandQueue::new(&ctx)?;

    let buf = Buffer::with_len::<u32>(&ctx, MemAccess::WriteOnly, 4)?;
    queue.write_blocking(&buf, 0, &[1u32, 2, 3, 4])?;

    let mut dst = [0u32; 4];
    unsafe {
        queue.read(&buf, 0, &mut dst, false)?;
        assert_eq!(host.calls("clFinish"), 0);
        queue.drain()?;
    }

    assert_eq!(dst, [1, 2, 3, 4]);
    assert_eq!(host.calls("clFlush"), 1);
    assert_eq!(host.calls("clFinish"), 1);
    Ok(())
}

#[test]
fn blocking_read_waits_for_queued_writes () -> Result<()> {
    let host = Host::default();
    let device = best_device(&host)?;
    let ctx = Context::from_descriptor(&host, &device)?;
    let queue = CommandQueue::new(&ctx)?;

    let buf = Buffer::with_len::<i32>(&ctx, MemAccess::ReadOnly, 3)?;
    let src = [7i32, 8, 9];

    let mut dst = [0i32; 3];
    queue.scope(|s| {
        s.write(&buf, 0, &src)?;
        s.queue().read_blocking(&buf, 0, &mut dst)?;
        Ok(())
    })?;

    assert_eq!(dst, src);
    Ok(())
}

#[test]
fn out_of_range_transfer () -> Result<()> {
    let host = Host::default();
    let device = best_device(&host)?;
    let ctx = Context::from_descriptor(&host, &device)?;
    let queue = CommandQueue::new(&ctx)?;
    let buf = Buffer::new(&ctx, MemAccess::ReadOnly, 8)?;

    let err = queue.write_blocking(&buf, 4, &[0u32; 2]).unwrap_err();
    assert_eq!(err.function(), Some("clEnqueueWriteBuffer"));
    assert_eq!(err.status(), Some(CL_INVALID_VALUE));
    Ok(())
}

#[test]
fn zero_sized_buffer () -> Result<()> {
    let host = Host::default();
    let device = best_device(&host)?;
    let ctx = Context::from_descriptor(&host, &device)?;

    let err = Buffer::new(&ctx, MemAccess::WriteOnly, 0).unwrap_err();
    assert_eq!(err.function(), Some("clCreateBuffer"));
    assert_eq!(err.status(), Some(CL_INVALID_BUFFER_SIZE));
    Ok(())
}

#[test]
fn scope_drains_on_error () -> Result<()> {
    let host = Host::default();
    let device = best_device(&host)?;
    let ctx = Context::from_descriptor(&host, &device)?;
    let queue = CommandQueue::new(&ctx)?;
    let buf = Buffer::with_len::<f32>(&ctx, MemAccess::ReadOnly, 2)?;

    let src = [1f32, 2.];
    let result = queue.scope(|s| {
        s.write(&buf, 0, &src)?;
        Err::<(), _>(Error::from_kind(ErrorKind::ShapeUnsupported))
    });

    assert_eq!(result.unwrap_err().kind, ErrorKind::ShapeUnsupported);
    assert_eq!(host.calls("clFinish"), 1);

    let mut dst = [0f32; 2];
    queue.read_blocking(&buf, 0, &mut dst)?;
    assert_eq!(dst, src);
    Ok(())
}

#[test]
fn everything_is_released () -> Result<()> {
    let host = Host::default();
    {
        let device = best_device(&host)?;
        let ctx = Context::from_descriptor(&host, &device)?;
        let _queue = CommandQueue::new(&ctx)?;
        let _a = Buffer::new(&ctx, MemAccess::ReadOnly, 64)?;
        let _b = Buffer::new(&ctx, MemAccess::WriteOnly, 64)?;
        assert_eq!(host.live_objects(), 4);
    }

    assert_eq!(host.live_objects(), 0);
    assert_eq!(host.calls("clReleaseMemObject"), 2);
    assert_eq!(host.calls("clReleaseCommandQueue"), 1);
    assert_eq!(host.calls("clReleaseContext"), 1);
    Ok(())
}
