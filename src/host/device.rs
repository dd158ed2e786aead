use crate::core::{DeviceType, FpConfig, LocalMemKind, Status};

/// Attributes reported by an emulated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDevice {
    pub name: String,
    pub units: u32,
    pub ty: DeviceType,
    pub double_fp: FpConfig,
    pub max_work_group: usize,
    pub local_memory_type: LocalMemKind,
    pub local_memory_size: u64,
    pub integrated: bool
}

impl HostDevice {
    pub fn cpu (name: impl Into<String>, units: u32) -> Self {
        Self {
            name: name.into(),
            units,
            ty: DeviceType::CPU,
            double_fp: FpConfig::DENORM | FpConfig::INF_NAN | FpConfig::ROUND_TO_NEAREST | FpConfig::ROUND_TO_ZERO | FpConfig::ROUND_TO_INF | FpConfig::FMA,
            max_work_group: 8192,
            local_memory_type: LocalMemKind::Global,
            local_memory_size: 32 * 1024,
            integrated: true
        }
    }

    pub fn gpu (name: impl Into<String>, units: u32, integrated: bool) -> Self {
        Self {
            name: name.into(),
            units,
            ty: DeviceType::GPU,
            double_fp: FpConfig::DENORM | FpConfig::INF_NAN | FpConfig::ROUND_TO_NEAREST | FpConfig::ROUND_TO_ZERO | FpConfig::ROUND_TO_INF | FpConfig::FMA,
            max_work_group: 1024,
            local_memory_type: LocalMemKind::Local,
            local_memory_size: 48 * 1024,
            integrated
        }
    }

    pub fn accelerator (name: impl Into<String>, units: u32) -> Self {
        Self {
            name: name.into(),
            units,
            ty: DeviceType::ACCELERATOR,
            double_fp: FpConfig::empty(),
            max_work_group: 256,
            local_memory_type: LocalMemKind::Local,
            local_memory_size: 16 * 1024,
            integrated: false
        }
    }

    #[inline(always)]
    pub fn with_type (self, ty: DeviceType) -> Self {
        Self { ty, ..self }
    }

    #[inline(always)]
    pub fn with_max_work_group (self, max_work_group: usize) -> Self {
        Self { max_work_group, ..self }
    }
}

/// An emulated platform: a list of devices, or a device query that always fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    pub devices: Vec<HostDevice>,
    /// Status returned by every device query on this platform, if any.
    pub broken: Option<Status>
}

impl HostPlatform {
    #[inline(always)]
    pub fn new (devices: Vec<HostDevice>) -> Self {
        Self { devices, broken: None }
    }

    /// A platform whose device queries fail with `status`.
    #[inline(always)]
    pub fn broken (status: Status) -> Self {
        Self { devices: Vec::new(), broken: Some(status) }
    }
}
