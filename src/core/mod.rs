flat_mod!(status, error, platform, program, kernel, queue);

pub mod device;
pub use device::{DeviceDescriptor, DeviceType, DeviceClass, FpConfig, LocalMemKind, enumerate_devices, best_device};
