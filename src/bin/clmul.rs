//! Multiplies two random square matrices on a compute device and checks the result on the CPU.
//!
//! ```bash
//! clmul 512 --seed 7
//! clmul --list
//! RUST_LOG=debug clmul 2048 --backend host --cpu-max 0
//! ```

use anyhow::{bail, Context as _, Result};
use cfg_if::cfg_if;
use clap::{Parser, ValueEnum};
use clpipe::prelude::{enumerate_devices, offload_multiply, ErrorKind, Host, Matrix, OffloadConfig, Platform, Timer};
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// In-process emulated platform
    Host,
    /// System OpenCL driver
    #[cfg(feature = "opencl")]
    Opencl
}

impl Default for Backend {
    fn default() -> Self {
        cfg_if! {
            if #[cfg(feature = "opencl")] {
                Self::Opencl
            } else {
                Self::Host
            }
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "clmul", version, about = "Offloaded matrix multiplication")]
struct Args {
    /// Side of the square matrices
    #[arg(default_value_t = 1024, env = "CLMUL_DIM", value_parser = clap::value_parser!(u32).range(1..))]
    dim: u32,

    #[arg(long, value_enum, default_value_t = Backend::default(), env = "CLMUL_BACKEND")]
    backend: Backend,

    /// Index into the ranked device list, 0 being the best device
    #[arg(long, default_value_t = 0)]
    device: usize,

    /// Largest dimension still checked against the CPU reference
    #[arg(long, default_value_t = 2048)]
    cpu_max: u32,

    /// Seed for the input matrices, random if absent
    #[arg(long, env = "CLMUL_SEED")]
    seed: Option<u64>,

    /// Print the ranked devices and exit
    #[arg(long)]
    list: bool
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.backend {
        Backend::Host => run(&Host::default(), &args),
        #[cfg(feature = "opencl")]
        Backend::Opencl => run(&clpipe::opencl::OpenCl, &args)
    }
}

fn run<P: Platform> (platform: &P, args: &Args) -> Result<()> {
    let devices = enumerate_devices(platform).context("device enumeration failed")?;
    if args.list {
        for (idx, device) in devices.iter().enumerate() {
            println!("{idx}: {device}");
        }
        return Ok(())
    }

    if devices.is_empty() {
        return Err(clpipe::prelude::Error::from_kind(ErrorKind::NoDevices).into())
    }

    let Some(device) = devices.get(args.device) else {
        bail!("device index {} out of range, {} device(s) found", args.device, devices.len())
    };
    info!(device = %device.name, units = device.units, "using device");

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy()
    };

    let dim = args.dim as usize;
    let m1 = Matrix::<f32>::random(dim, dim, &mut rng);
    let m2 = Matrix::<f32>::random(dim, dim, &mut rng);
    let m2t = m2.transpose();

    let mut whole = Timer::start();
    let report = offload_multiply(platform, device.id, &m1, &m2t, &OffloadConfig::default())?;
    println!("OCL: {}ms kernel time; {} ms whole time", report.kernel_ms, whole.ms());

    if args.dim > args.cpu_max {
        return Ok(())
    }

    let mut cpu = Timer::start();
    let reference = Matrix::transpose_multiply(&m1, &m2t)?;
    println!("CPU: {}ms", cpu.ms());

    if reference == report.result {
        println!("res_ref == res_ocl");
    } else {
        println!("res_ref != res_ocl, max diff = {}", reference.max_abs_diff(&report.result)?);
    }

    Ok(())
}
