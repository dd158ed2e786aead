use std::{cmp::Ordering, fmt::Display};
use bytemuck::Pod;
use num_enum::FromPrimitive;
use tracing::{debug, info, warn};
use super::*;

bitflags::bitflags! {
    /// Device class bitmask (`cl_device_type`).
    #[repr(transparent)]
    pub struct DeviceType: u64 {
        const DEFAULT = 1 << 0;
        const CPU = 1 << 1;
        const GPU = 1 << 2;
        const ACCELERATOR = 1 << 3;
        const CUSTOM = 1 << 4;
        const ALL = 0xFFFF_FFFF;
    }
}

bitflags::bitflags! {
    /// Floating-point capability bitmask (`cl_device_fp_config`).
    #[repr(transparent)]
    pub struct FpConfig: u64 {
        const DENORM = 1 << 0;
        const INF_NAN = 1 << 1;
        const ROUND_TO_NEAREST = 1 << 2;
        const ROUND_TO_ZERO = 1 << 3;
        const ROUND_TO_INF = 1 << 4;
        const FMA = 1 << 5;
        const SOFT_FLOAT = 1 << 6;
        const CORRECTLY_ROUNDED_DIVIDE_SQRT = 1 << 7;
    }
}

/// Kind of local memory backing a device (`cl_device_local_mem_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u32)]
pub enum LocalMemKind {
    /// Dedicated local storage.
    Local = 1,
    /// Emulated on top of global memory.
    Global = 2,
    #[num_enum(default)]
    Unknown = 0
}

/// Dominant class of a device, in descending order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceClass {
    Cpu,
    Gpu,
    Accelerator,
    Custom,
    Other
}

impl DeviceType {
    /// Picks the dominant class bit. A device reporting several bits is classified by the first of
    /// CPU, GPU, ACCELERATOR, CUSTOM it carries.
    #[inline]
    pub fn class (self) -> DeviceClass {
        if self.contains(Self::CPU) {
            DeviceClass::Cpu
        } else if self.contains(Self::GPU) {
            DeviceClass::Gpu
        } else if self.contains(Self::ACCELERATOR) {
            DeviceClass::Accelerator
        } else if self.contains(Self::CUSTOM) {
            DeviceClass::Custom
        } else {
            DeviceClass::Other
        }
    }
}

/// Identity and capability snapshot of one compute device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor<D> {
    pub id: D,
    pub name: String,
    pub units: u32,
    pub ty: DeviceType,
    pub double_fp: FpConfig,
    pub max_work_group: usize,
    pub local_memory_type: LocalMemKind,
    pub local_memory_size: u64,
    /// `true` if the device shares memory with the host.
    pub integrated: bool,
}

impl<D: Copy> DeviceDescriptor<D> {
    /// Fetches every attribute of `id`. Any failing query aborts the whole descriptor.
    pub fn fetch<P: Platform<DeviceId = D>> (platform: &P, id: D) -> Result<Self> {
        Ok(Self {
            id,
            name: info_string(platform, id, DeviceInfo::Name)?,
            units: info_pod::<P, u32>(platform, id, DeviceInfo::MaxComputeUnits)?,
            ty: DeviceType::from_bits_truncate(info_pod::<P, u64>(platform, id, DeviceInfo::Type)?),
            double_fp: FpConfig::from_bits_truncate(info_pod::<P, u64>(platform, id, DeviceInfo::DoubleFpConfig)?),
            max_work_group: info_pod::<P, usize>(platform, id, DeviceInfo::MaxWorkGroupSize)?,
            local_memory_type: LocalMemKind::from_primitive(info_pod::<P, u32>(platform, id, DeviceInfo::LocalMemType)?),
            local_memory_size: info_pod::<P, u64>(platform, id, DeviceInfo::LocalMemSize)?,
            integrated: info_bool(platform, id, DeviceInfo::HostUnifiedMemory)?,
        })
    }
}

impl<D> DeviceDescriptor<D> {
    #[inline(always)]
    pub fn class (&self) -> DeviceClass {
        self.ty.class()
    }
}

impl<D> Display for DeviceDescriptor<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, units={}, double={}, type={} ( ", self.name, self.units, self.double_fp.bits(), self.ty.bits())?;
        for (flag, name) in [
            (DeviceType::GPU, "gpu"),
            (DeviceType::CPU, "cpu"),
            (DeviceType::ACCELERATOR, "accelerator"),
            (DeviceType::DEFAULT, "default"),
            (DeviceType::CUSTOM, "custom")
        ] {
            if self.ty.contains(flag) {
                write!(f, "{name} ")?;
            }
        }

        f.write_str(") ")?;
        f.write_str(if self.integrated { "integrated " } else { "discrete " })?;

        let local = match self.local_memory_type {
            LocalMemKind::Local => "local",
            LocalMemKind::Global => "global",
            LocalMemKind::Unknown => "unknown"
        };

        write!(
            f, "max_work_group={}, local_memory_type={} ({local}), local_memory_size={}",
            self.max_work_group, self.local_memory_type as u32, self.local_memory_size
        )
    }
}

/* RANKING */

/// Three-way preference between two devices. [`Ordering::Greater`] means `x` is preferred over `y`.
///
/// - CPU vs CPU: more compute units wins.
/// - CPU vs GPU: the CPU wins.
/// - GPU vs GPU: discrete beats integrated, then more compute units wins.
/// - Accelerator, custom and unclassified devices rank after CPUs and GPUs (in that order) and compare
///   equal within their class, so a stable sort keeps them in enumeration order.
pub fn rank<D> (x: &DeviceDescriptor<D>, y: &DeviceDescriptor<D>) -> Ordering {
    let (cx, cy) = (x.class(), y.class());
    if cx != cy {
        return cy.cmp(&cx)
    }

    match cx {
        DeviceClass::Cpu => x.units.cmp(&y.units),
        DeviceClass::Gpu => match (x.integrated, y.integrated) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => x.units.cmp(&y.units)
        },
        _ => Ordering::Equal
    }
}

/// Strict "ranks below" relation derived from [`rank`].
#[inline(always)]
pub fn ranks_below<D> (x: &DeviceDescriptor<D>, y: &DeviceDescriptor<D>) -> bool {
    rank(x, y) == Ordering::Less
}

/// Sorts devices best-first. Stable: devices that rank equal keep their relative order.
#[inline]
pub fn sort_by_rank<D> (devices: &mut [DeviceDescriptor<D>]) {
    devices.sort_by(|x, y| rank(y, x))
}

/* ENUMERATION */

/// Enumerates every device of every platform, best-ranked first.
///
/// # Errors
/// - [`ErrorKind::BackendUnavailable`] if the platform query fails or reports no platforms.
/// - A platform error if any attribute query of any device fails.
///
/// A platform whose device query fails is skipped. An empty result is not an error.
pub fn enumerate_devices<P: Platform> (platform: &P) -> Result<Vec<DeviceDescriptor<P::DeviceId>>> {
    let count = match platform.platform_count() {
        Ok(0) => return Err(Error::new(ErrorKind::BackendUnavailable, "no platforms found")),
        Ok(count) => count,
        Err(status) => return Err(Error::new(ErrorKind::BackendUnavailable, format!("clGetPlatformIDs returned {status}")))
    };

    let platforms = platform.platform_ids(count)
        .map_err(|status| Error::new(ErrorKind::BackendUnavailable, format!("clGetPlatformIDs returned {status}")))?;

    let mut result = Vec::new();
    for pid in platforms {
        let ids = match platform_devices(platform, pid) {
            Ok(ids) => ids,
            Err(status) => {
                warn!(platform = ?pid, %status, "skipping platform, device query failed");
                continue
            }
        };

        for id in ids {
            let desc = DeviceDescriptor::fetch(platform, id)?;
            debug!(device = %desc, "found device");
            result.push(desc);
        }
    }

    sort_by_rank(&mut result);
    Ok(result)
}

/// Enumerates devices and returns the best ranked one.
///
/// # Errors
/// Everything [`enumerate_devices`] raises, plus [`ErrorKind::NoDevices`] on an empty enumeration.
pub fn best_device<P: Platform> (platform: &P) -> Result<DeviceDescriptor<P::DeviceId>> {
    let device = enumerate_devices(platform)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::from_kind(ErrorKind::NoDevices))?;

    info!(device = %device.name, units = device.units, "selected device");
    Ok(device)
}

#[inline]
fn platform_devices<P: Platform> (platform: &P, pid: P::PlatformId) -> RawResult<Vec<P::DeviceId>> {
    let count = platform.device_count(pid, DeviceType::ALL)?;
    if count == 0 {
        return Ok(Vec::new())
    }
    platform.device_ids(pid, DeviceType::ALL, count)
}

/* ATTRIBUTE FETCH */

/// Fixed-size attribute, read in one call.
pub fn info_pod<P: Platform, T: Pod> (platform: &P, id: P::DeviceId, param: DeviceInfo) -> Result<T> {
    let mut bytes = vec![0u8; std::mem::size_of::<T>()];
    tri!("clGetDeviceInfo", platform.device_info(id, param, Some(&mut bytes)));
    Ok(bytemuck::pod_read_unaligned(&bytes))
}

/// `cl_bool` attribute.
#[inline]
pub fn info_bool<P: Platform> (platform: &P, id: P::DeviceId, param: DeviceInfo) -> Result<bool> {
    info_pod::<P, u32>(platform, id, param).map(|v| v != 0)
}

/// String attribute, read with the measure-then-fill protocol. Trailing NUL bytes are trimmed.
pub fn info_string<P: Platform> (platform: &P, id: P::DeviceId, param: DeviceInfo) -> Result<String> {
    let len = tri!("clGetDeviceInfo", platform.device_info(id, param, None));
    let mut bytes = vec![0u8; len];
    tri!("clGetDeviceInfo", platform.device_info(id, param, Some(&mut bytes)));
    Ok(trim_nul(bytes))
}

pub(crate) fn trim_nul (mut bytes: Vec<u8>) -> String {
    while bytes.last() == Some(&0) {
        bytes.pop();
    }

    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device (ty: DeviceType, units: u32, integrated: bool) -> DeviceDescriptor<u32> {
        DeviceDescriptor {
            id: 0,
            name: String::from("test"),
            units,
            ty,
            double_fp: FpConfig::empty(),
            max_work_group: 256,
            local_memory_type: LocalMemKind::Local,
            local_memory_size: 32 * 1024,
            integrated,
        }
    }

    #[test]
    fn class_precedence () {
        assert_eq!((DeviceType::CPU | DeviceType::GPU).class(), DeviceClass::Cpu);
        assert_eq!((DeviceType::GPU | DeviceType::DEFAULT).class(), DeviceClass::Gpu);
        assert_eq!(DeviceType::DEFAULT.class(), DeviceClass::Other);
    }

    #[test]
    fn display_matches_report_format () {
        let desc = device(DeviceType::GPU | DeviceType::DEFAULT, 20, false);
        assert_eq!(
            desc.to_string(),
            "test, units=20, double=0, type=5 ( gpu default ) discrete max_work_group=256, local_memory_type=1 (local), local_memory_size=32768"
        );
    }

    #[test]
    fn trim_trailing_nul () {
        assert_eq!(trim_nul(b"Tesla\0\0".to_vec()), "Tesla");
        assert_eq!(trim_nul(Vec::new()), "");
    }

    #[test]
    fn local_mem_kind_fallback () {
        assert_eq!(LocalMemKind::from_primitive(1), LocalMemKind::Local);
        assert_eq!(LocalMemKind::from_primitive(2), LocalMemKind::Global);
        assert_eq!(LocalMemKind::from_primitive(7), LocalMemKind::Unknown);
    }

    #[test]
    fn accelerators_keep_input_order () {
        let mut devices = vec![
            DeviceDescriptor { id: 1, ..device(DeviceType::ACCELERATOR, 2, false) },
            DeviceDescriptor { id: 2, ..device(DeviceType::ACCELERATOR, 64, false) },
            DeviceDescriptor { id: 3, ..device(DeviceType::GPU, 4, true) },
        ];

        sort_by_rank(&mut devices);
        assert_eq!(devices.iter().map(|d| d.id).collect::<Vec<_>>(), vec![3, 1, 2]);
    }
}
