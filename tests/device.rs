use std::cmp::Ordering;
use clpipe::prelude::*;
use clpipe::core::device::{rank, ranks_below, sort_by_rank};
use proptest::prelude::*;

fn descriptor (id: u32, ty: DeviceType, units: u32, integrated: bool) -> DeviceDescriptor<u32> {
    DeviceDescriptor {
        id,
        name: format!("device {id}"),
        units,
        ty,
        double_fp: FpConfig::empty(),
        max_work_group: 256,
        local_memory_type: LocalMemKind::Local,
        local_memory_size: 0,
        integrated
    }
}

fn device_type () -> impl Strategy<Value = DeviceType> {
    prop_oneof![
        Just(DeviceType::CPU),
        Just(DeviceType::GPU),
        Just(DeviceType::ACCELERATOR),
        Just(DeviceType::CUSTOM),
        Just(DeviceType::DEFAULT),
        Just(DeviceType::GPU | DeviceType::DEFAULT),
    ]
}

fn any_descriptor () -> impl Strategy<Value = DeviceDescriptor<u32>> {
    (any::<u32>(), device_type(), 1..256u32, any::<bool>())
        .prop_map(|(id, ty, units, integrated)| descriptor(id, ty, units, integrated))
}

proptest! {
    #[test]
    fn more_cpu_units_rank_higher (x in 1..512u32, y in 1..512u32) {
        let (a, b) = (descriptor(0, DeviceType::CPU, x, true), descriptor(1, DeviceType::CPU, y, true));
        prop_assert_eq!(x < y, ranks_below(&a, &b));
    }

    #[test]
    fn cpu_beats_gpu (cpu_units in 1..512u32, gpu_units in 1..512u32, integrated in any::<bool>()) {
        let cpu = descriptor(0, DeviceType::CPU, cpu_units, true);
        let gpu = descriptor(1, DeviceType::GPU, gpu_units, integrated);
        prop_assert!(ranks_below(&gpu, &cpu));
        prop_assert!(!ranks_below(&cpu, &gpu));
    }

    #[test]
    fn discrete_gpu_beats_integrated (x in 1..512u32, y in 1..512u32) {
        let discrete = descriptor(0, DeviceType::GPU, x, false);
        let integrated = descriptor(1, DeviceType::GPU, y, true);
        prop_assert!(ranks_below(&integrated, &discrete));
    }

    #[test]
    fn rank_is_antisymmetric (x in any_descriptor(), y in any_descriptor()) {
        prop_assert_eq!(rank(&x, &y), rank(&y, &x).reverse());
        prop_assert!(!(ranks_below(&x, &y) && ranks_below(&y, &x)));
    }

    #[test]
    fn sorted_best_first (mut devices in proptest::collection::vec(any_descriptor(), 0..16)) {
        sort_by_rank(&mut devices);
        for pair in devices.windows(2) {
            prop_assert_ne!(rank(&pair[0], &pair[1]), Ordering::Less);
        }
    }
}

#[test]
fn equal_devices_keep_order () {
    let mut devices = vec![
        descriptor(0, DeviceType::ACCELERATOR, 4, false),
        descriptor(1, DeviceType::ACCELERATOR, 64, false),
        descriptor(2, DeviceType::CUSTOM, 8, false),
        descriptor(3, DeviceType::ACCELERATOR, 1, false),
    ];

    sort_by_rank(&mut devices);
    assert_eq!(devices.iter().map(|d| d.id).collect::<Vec<_>>(), vec![0, 1, 3, 2]);
}

#[test]
fn rank_by_handle_of_any_type () {
    let with_name = |d: DeviceDescriptor<u32>| DeviceDescriptor {
        id: d.name.clone(),
        name: d.name,
        units: d.units,
        ty: d.ty,
        double_fp: d.double_fp,
        max_work_group: d.max_work_group,
        local_memory_type: d.local_memory_type,
        local_memory_size: d.local_memory_size,
        integrated: d.integrated
    };
    let mut devices = vec![
        with_name(descriptor(0, DeviceType::GPU, 8, true)),
        with_name(descriptor(1, DeviceType::CPU, 4, true)),
    ];

    sort_by_rank(&mut devices);
    assert_eq!(devices[0].id, "device 1");
    assert!(ranks_below(&devices[1], &devices[0]));
}

#[test]
fn mixed_host () -> Result<()> {
    let host = Host::new(vec![
        HostPlatform::new(vec![
            HostDevice::gpu("igpu", 24, true),
            HostDevice::accelerator("fpga", 2),
        ]),
        HostPlatform::new(vec![
            HostDevice::gpu("dgpu", 16, false),
            HostDevice::cpu("small cpu", 4),
            HostDevice::cpu("big cpu", 32),
        ])
    ]);

    let devices = enumerate_devices(&host)?;
    let names = devices.iter().map(|d| d.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["big cpu", "small cpu", "dgpu", "igpu", "fpga"]);

    assert_eq!(best_device(&host)?.name, "big cpu");
    Ok(())
}

#[test]
fn descriptor_attributes () -> Result<()> {
    let host = Host::new(vec![HostPlatform::new(vec![HostDevice::gpu("dgpu", 16, false).with_max_work_group(512)])]);
    let device = best_device(&host)?;

    assert_eq!(device.units, 16);
    assert_eq!(device.class(), DeviceClass::Gpu);
    assert_eq!(device.max_work_group, 512);
    assert_eq!(device.local_memory_type, LocalMemKind::Local);
    assert!(!device.integrated);

    let line = device.to_string();
    assert!(line.starts_with("dgpu, units=16"), "{line}");
    assert!(line.contains("( gpu ) discrete"), "{line}");
    assert!(line.contains("local_memory_type=1 (local)"), "{line}");
    Ok(())
}

#[test]
fn no_platforms () {
    let err = enumerate_devices(&Host::empty()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::BackendUnavailable);
}

#[test]
fn platform_without_devices () -> Result<()> {
    let host = Host::new(vec![HostPlatform::new(Vec::new())]);
    assert!(enumerate_devices(&host)?.is_empty());

    let err = best_device(&host).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoDevices);
    Ok(())
}

#[test]
fn broken_platform_is_skipped () -> Result<()> {
    let host = Host::new(vec![
        HostPlatform::broken(CL_OUT_OF_HOST_MEMORY),
        HostPlatform::new(vec![HostDevice::cpu("cpu", 8)]),
    ]);

    let devices = enumerate_devices(&host)?;
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].name, "cpu");
    Ok(())
}

#[test]
fn failing_attribute_query_aborts () {
    let host = Host::default();
    host.fail("clGetDeviceInfo", CL_INVALID_VALUE);

    let err = enumerate_devices(&host).unwrap_err();
    assert_eq!(err.function(), Some("clGetDeviceInfo"));
    assert_eq!(err.status(), Some(CL_INVALID_VALUE));
}

#[test]
fn failing_platform_query () {
    let host = Host::default();
    host.fail("clGetPlatformIDs", CL_OUT_OF_HOST_MEMORY);

    let err = best_device(&host).unwrap_err();
    assert_eq!(err.kind, ErrorKind::BackendUnavailable);
}
