use std::{collections::{HashMap, VecDeque}, rc::Rc};
use tracing::{trace, warn};
use crate::buffer::MemAccess;
use super::{*, source::Declaration};

/// Largest buffer the emulator allocates.
const MAX_ALLOC_SIZE: usize = 1 << 31;

#[derive(Debug, Default)]
pub(super) struct State {
    last_id: u32,
    contexts: HashMap<ContextId, DeviceId>,
    queues: HashMap<QueueId, QueueObject>,
    programs: HashMap<ProgramId, ProgramObject>,
    kernels: HashMap<KernelId, KernelObject>,
    mems: HashMap<MemId, MemObject>
}

impl State {
    #[inline]
    fn next_id (&mut self) -> u32 {
        self.last_id += 1;
        self.last_id
    }

    #[inline]
    pub(super) fn live (&self) -> usize {
        self.contexts.len() + self.queues.len() + self.programs.len() + self.kernels.len() + self.mems.len()
    }

    #[inline]
    fn queue (&self, id: QueueId) -> RawResult<&QueueObject> {
        self.queues.get(&id).ok_or(CL_INVALID_COMMAND_QUEUE)
    }

    #[inline]
    fn program (&self, id: ProgramId) -> RawResult<&ProgramObject> {
        self.programs.get(&id).ok_or(CL_INVALID_PROGRAM)
    }

    #[inline]
    fn mem (&self, id: MemId) -> RawResult<&MemObject> {
        self.mems.get(&id).ok_or(CL_INVALID_MEM_OBJECT)
    }
}

#[derive(Debug)]
struct QueueObject {
    context: ContextId,
    device: DeviceId,
    pending: VecDeque<Command>
}

#[derive(Debug)]
struct ProgramObject {
    context: ContextId,
    device: DeviceId,
    source: String,
    status: BuildStatus,
    options: String,
    log: String,
    declarations: Vec<Declaration>
}

#[derive(Debug)]
struct KernelObject {
    program: ProgramId,
    context: ContextId,
    name: String,
    host: HostKernel,
    args: Vec<Option<ArgValue>>
}

#[derive(Debug)]
struct MemObject {
    context: ContextId,
    data: Rc<HostMemory>
}

#[derive(Debug)]
enum Command {
    Write { mem: Rc<HostMemory>, offset: usize, src: *const u8, size: usize },
    Read { mem: Rc<HostMemory>, offset: usize, dst: *mut u8, size: usize },
    Dispatch { name: String, kernel: HostKernel, args: Vec<ArgValue>, global: Vec<usize>, local: Option<Vec<usize>>, units: u32 }
}

impl Command {
    /// # Safety
    /// Host pointers of transfers must still be valid, as required by the enqueue calls.
    unsafe fn run (self) -> RawResult<()> {
        match self {
            Self::Write { mem, offset, src, size } => {
                let src = std::slice::from_raw_parts(src, size);
                mem.bytes_mut()?[offset..offset + size].copy_from_slice(src);
                Ok(())
            },

            Self::Read { mem, offset, dst, size } => {
                let dst = std::slice::from_raw_parts_mut(dst, size);
                dst.copy_from_slice(&mem.bytes()?[offset..offset + size]);
                Ok(())
            },

            Self::Dispatch { name, kernel, args, global, local, units } => {
                trace!(kernel = %name, ?global, ?local, "running kernel");
                (kernel.run)(&Invocation { global: &global, local: local.as_deref(), units, args: &args })
            }
        }
    }
}

impl Host {
    fn platform_devices (&self, platform: PlatformId, ty: DeviceType) -> RawResult<Vec<DeviceId>> {
        let desc = self.platforms.get(platform.0 as usize).ok_or(CL_INVALID_PLATFORM)?;
        if let Some(status) = desc.broken {
            return Err(status)
        }

        let ids = self.devices.iter()
            .enumerate()
            .filter(|(_, (p, d))| *p == platform && (ty == DeviceType::ALL || d.ty.intersects(ty)))
            .map(|(i, _)| DeviceId(i as u32))
            .collect::<Vec<_>>();

        match ids.is_empty() {
            true => Err(CL_DEVICE_NOT_FOUND),
            false => Ok(ids)
        }
    }

    fn check_build (&self, decls: &[Declaration]) -> std::result::Result<(), String> {
        let mut errors = Vec::new();
        for decl in decls {
            match self.kernels.get(&decl.name) {
                None => errors.push(format!("<kernel>:{}: error: no host implementation for kernel '{}'", decl.line, decl.name)),
                Some(host) if host.params.len() != decl.params => errors.push(format!(
                    "<kernel>:{}: error: kernel '{}' declares {} parameters, the host implementation takes {}",
                    decl.line, decl.name, decl.params, host.params.len()
                )),
                Some(_) => {}
            }
        }

        if errors.is_empty() {
            return Ok(())
        }

        errors.push(format!("{} error{} generated.", errors.len(), if errors.len() == 1 { "" } else { "s" }));
        Err(errors.join("\n"))
    }

    /// Runs every pending command of `queue` in submission order. The first failure discards the rest.
    fn run_pending (&self, queue: QueueId) -> RawResult<()> {
        let pending = {
            let mut state = self.state.borrow_mut();
            let queue = state.queues.get_mut(&queue).ok_or(CL_INVALID_COMMAND_QUEUE)?;
            std::mem::take(&mut queue.pending)
        };

        for command in pending {
            // SAFETY: the enqueue contract keeps host pointers valid until the queue is finished.
            unsafe { command.run()? }
        }

        Ok(())
    }

    /// Validates a transfer and either queues it or, if `blocking`, runs it after everything already queued.
    unsafe fn transfer (&self, queue: QueueId, mem: MemId, blocking: bool, offset: usize, size: usize, ptr_null: bool, f: impl FnOnce(Rc<HostMemory>) -> Command) -> RawResult<()> {
        let command = {
            let state = self.state.borrow();
            let q = state.queue(queue)?;
            let m = state.mem(mem)?;

            if q.context != m.context {
                return Err(CL_INVALID_CONTEXT)
            }

            if ptr_null && size > 0 {
                return Err(CL_INVALID_VALUE)
            }

            m.data.check_range(offset, size)?;
            f(m.data.clone())
        };

        if blocking {
            self.run_pending(queue)?;
            return command.run()
        }

        let mut state = self.state.borrow_mut();
        match state.queues.get_mut(&queue) {
            Some(q) => q.pending.push_back(command),
            None => return Err(CL_INVALID_COMMAND_QUEUE)
        }

        Ok(())
    }
}

/// Two-call protocol over an attribute value.
fn fill (value: &[u8], dst: Option<&mut [u8]>) -> RawResult<usize> {
    match dst {
        None => Ok(value.len()),
        Some(dst) if dst.len() < value.len() => Err(CL_INVALID_VALUE),
        Some(dst) => {
            dst[..value.len()].copy_from_slice(value);
            Ok(value.len())
        }
    }
}

#[inline]
fn c_string (s: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(s.len() + 1);
    bytes.extend_from_slice(s.as_bytes());
    bytes.push(0);
    bytes
}

impl Platform for Host {
    type PlatformId = PlatformId;
    type DeviceId = DeviceId;
    type Context = ContextId;
    type Queue = QueueId;
    type Program = ProgramId;
    type Kernel = KernelId;
    type Mem = MemId;

    fn platform_count (&self) -> RawResult<u32> {
        self.enter("clGetPlatformIDs")?;
        match self.platforms.len() {
            0 => Err(CL_PLATFORM_NOT_FOUND_KHR),
            n => Ok(n as u32)
        }
    }

    fn platform_ids (&self, count: u32) -> RawResult<Vec<PlatformId>> {
        self.enter("clGetPlatformIDs")?;
        if count == 0 {
            return Err(CL_INVALID_VALUE)
        }
        if self.platforms.is_empty() {
            return Err(CL_PLATFORM_NOT_FOUND_KHR)
        }

        let count = count.min(self.platforms.len() as u32);
        Ok((0..count).map(PlatformId).collect())
    }

    fn device_count (&self, platform: PlatformId, ty: DeviceType) -> RawResult<u32> {
        self.enter("clGetDeviceIDs")?;
        self.platform_devices(platform, ty).map(|ids| ids.len() as u32)
    }

    fn device_ids (&self, platform: PlatformId, ty: DeviceType, count: u32) -> RawResult<Vec<DeviceId>> {
        self.enter("clGetDeviceIDs")?;
        if count == 0 {
            return Err(CL_INVALID_VALUE)
        }

        let mut ids = self.platform_devices(platform, ty)?;
        ids.truncate(count as usize);
        Ok(ids)
    }

    fn device_info (&self, device: DeviceId, param: DeviceInfo, dst: Option<&mut [u8]>) -> RawResult<usize> {
        self.enter("clGetDeviceInfo")?;
        let d = self.device(device)?;

        let value = match param {
            DeviceInfo::Name => c_string(&d.name),
            DeviceInfo::MaxComputeUnits => d.units.to_ne_bytes().to_vec(),
            DeviceInfo::Type => d.ty.bits().to_ne_bytes().to_vec(),
            DeviceInfo::DoubleFpConfig => d.double_fp.bits().to_ne_bytes().to_vec(),
            DeviceInfo::MaxWorkGroupSize => d.max_work_group.to_ne_bytes().to_vec(),
            DeviceInfo::LocalMemType => (d.local_memory_type as u32).to_ne_bytes().to_vec(),
            DeviceInfo::LocalMemSize => d.local_memory_size.to_ne_bytes().to_vec(),
            DeviceInfo::HostUnifiedMemory => (d.integrated as u32).to_ne_bytes().to_vec()
        };

        fill(&value, dst)
    }

    fn create_context (&self, device: DeviceId) -> RawResult<ContextId> {
        self.enter("clCreateContext")?;
        self.device(device)?;

        let mut state = self.state.borrow_mut();
        let id = ContextId(state.next_id());
        state.contexts.insert(id, device);
        Ok(id)
    }

    fn release_context (&self, context: ContextId) -> RawResult<()> {
        self.enter("clReleaseContext")?;
        self.state.borrow_mut().contexts.remove(&context).map(|_| ()).ok_or(CL_INVALID_CONTEXT)
    }

    fn create_command_queue (&self, context: ContextId, device: DeviceId) -> RawResult<QueueId> {
        self.enter("clCreateCommandQueue")?;

        let mut state = self.state.borrow_mut();
        match state.contexts.get(&context) {
            Some(&d) if d == device => {},
            Some(_) => return Err(CL_INVALID_DEVICE),
            None => return Err(CL_INVALID_CONTEXT)
        }

        let id = QueueId(state.next_id());
        state.queues.insert(id, QueueObject { context, device, pending: VecDeque::new() });
        Ok(id)
    }

    fn release_command_queue (&self, queue: QueueId) -> RawResult<()> {
        self.enter("clReleaseCommandQueue")?;
        let queue_obj = self.state.borrow_mut().queues.remove(&queue).ok_or(CL_INVALID_COMMAND_QUEUE)?;

        if !queue_obj.pending.is_empty() {
            warn!(?queue, dropped = queue_obj.pending.len(), "released queue with unfinished commands");
        }

        Ok(())
    }

    fn create_program_with_source (&self, context: ContextId, source: &str) -> RawResult<ProgramId> {
        self.enter("clCreateProgramWithSource")?;
        if source.is_empty() {
            return Err(CL_INVALID_VALUE)
        }

        let mut state = self.state.borrow_mut();
        let device = *state.contexts.get(&context).ok_or(CL_INVALID_CONTEXT)?;
        let id = ProgramId(state.next_id());

        state.programs.insert(id, ProgramObject {
            context,
            device,
            source: source.to_string(),
            status: BuildStatus::None,
            options: String::new(),
            log: String::new(),
            declarations: Vec::new()
        });

        Ok(id)
    }

    fn build_program (&self, program: ProgramId, device: DeviceId, options: Option<&str>) -> RawResult<()> {
        self.enter("clBuildProgram")?;

        let mut state = self.state.borrow_mut();
        if state.kernels.values().any(|k| k.program == program) {
            return Err(CL_INVALID_OPERATION)
        }

        let obj = state.programs.get_mut(&program).ok_or(CL_INVALID_PROGRAM)?;
        if obj.device != device {
            return Err(CL_INVALID_DEVICE)
        }

        let options = options.unwrap_or_default();
        if options.split_whitespace().any(|opt| !opt.starts_with('-')) {
            return Err(CL_INVALID_BUILD_OPTIONS)
        }

        obj.options = options.to_string();
        let scanned = source::scan(&obj.source).and_then(|decls| self.check_build(&decls).map(|_| decls));

        match scanned {
            Ok(decls) => {
                obj.status = BuildStatus::Success;
                obj.log.clear();
                obj.declarations = decls;
                Ok(())
            },

            Err(log) => {
                obj.status = BuildStatus::Error;
                obj.log = log;
                obj.declarations.clear();
                Err(CL_BUILD_PROGRAM_FAILURE)
            }
        }
    }

    fn program_build_info (&self, program: ProgramId, device: DeviceId, param: BuildInfo, dst: Option<&mut [u8]>) -> RawResult<usize> {
        self.enter("clGetProgramBuildInfo")?;

        let state = self.state.borrow();
        let obj = state.program(program)?;
        if obj.device != device {
            return Err(CL_INVALID_DEVICE)
        }

        let value = match param {
            BuildInfo::Status => (obj.status as i32).to_ne_bytes().to_vec(),
            BuildInfo::Options => c_string(&obj.options),
            BuildInfo::Log => c_string(&obj.log)
        };

        fill(&value, dst)
    }

    fn release_program (&self, program: ProgramId) -> RawResult<()> {
        self.enter("clReleaseProgram")?;
        self.state.borrow_mut().programs.remove(&program).map(|_| ()).ok_or(CL_INVALID_PROGRAM)
    }

    fn create_kernel (&self, program: ProgramId, name: &str) -> RawResult<KernelId> {
        self.enter("clCreateKernel")?;

        let mut state = self.state.borrow_mut();
        let obj = state.program(program)?;
        if obj.status != BuildStatus::Success {
            return Err(CL_INVALID_PROGRAM_EXECUTABLE)
        }

        if !obj.declarations.iter().any(|d| d.name == name) {
            return Err(CL_INVALID_KERNEL_NAME)
        }

        let host = *self.kernels.get(name).ok_or(CL_INVALID_KERNEL_NAME)?;
        let context = obj.context;
        let id = KernelId(state.next_id());

        state.kernels.insert(id, KernelObject {
            program,
            context,
            name: name.to_string(),
            host,
            args: vec![None; host.params.len()]
        });

        Ok(id)
    }

    fn set_kernel_arg (&self, kernel: KernelId, index: u32, arg: KernelArg<'_, MemId>) -> RawResult<()> {
        self.enter("clSetKernelArg")?;

        let mut state = self.state.borrow_mut();
        let obj = state.kernels.get(&kernel).ok_or(CL_INVALID_KERNEL)?;
        let param = *obj.host.params.get(index as usize).ok_or(CL_INVALID_ARG_INDEX)?;

        let value = match (param, arg) {
            (Param::Value(size), KernelArg::Value(bytes)) if bytes.len() == size => ArgValue::Value(bytes.to_vec()),
            (Param::Value(_), _) => return Err(CL_INVALID_ARG_SIZE),
            (Param::Mem, KernelArg::Mem(mem)) => {
                let m = state.mem(mem)?;
                if m.context != obj.context {
                    return Err(CL_INVALID_MEM_OBJECT)
                }
                ArgValue::Mem(m.data.clone())
            },
            (Param::Mem, KernelArg::Value(_)) => return Err(CL_INVALID_ARG_VALUE)
        };

        if let Some(obj) = state.kernels.get_mut(&kernel) {
            obj.args[index as usize] = Some(value);
        }

        Ok(())
    }

    fn release_kernel (&self, kernel: KernelId) -> RawResult<()> {
        self.enter("clReleaseKernel")?;
        self.state.borrow_mut().kernels.remove(&kernel).map(|_| ()).ok_or(CL_INVALID_KERNEL)
    }

    fn create_buffer (&self, context: ContextId, access: MemAccess, size: usize) -> RawResult<MemId> {
        self.enter("clCreateBuffer")?;

        let mut state = self.state.borrow_mut();
        if !state.contexts.contains_key(&context) {
            return Err(CL_INVALID_CONTEXT)
        }

        if size == 0 || size > MAX_ALLOC_SIZE {
            return Err(CL_INVALID_BUFFER_SIZE)
        }

        let id = MemId(state.next_id());
        trace!(mem = ?id, ?access, size, "allocated host memory");
        state.mems.insert(id, MemObject { context, data: Rc::new(HostMemory::new(size)) });
        Ok(id)
    }

    fn release_mem_object (&self, mem: MemId) -> RawResult<()> {
        self.enter("clReleaseMemObject")?;
        self.state.borrow_mut().mems.remove(&mem).map(|_| ()).ok_or(CL_INVALID_MEM_OBJECT)
    }

    unsafe fn enqueue_write_buffer (&self, queue: QueueId, mem: MemId, blocking: bool, offset: usize, size: usize, src: *const u8) -> RawResult<()> {
        self.enter("clEnqueueWriteBuffer")?;
        self.transfer(queue, mem, blocking, offset, size, src.is_null(), |mem| Command::Write { mem, offset, src, size })
    }

    unsafe fn enqueue_read_buffer (&self, queue: QueueId, mem: MemId, blocking: bool, offset: usize, size: usize, dst: *mut u8) -> RawResult<()> {
        self.enter("clEnqueueReadBuffer")?;
        self.transfer(queue, mem, blocking, offset, size, dst.is_null(), |mem| Command::Read { mem, offset, dst, size })
    }

    fn enqueue_nd_range_kernel (&self, queue: QueueId, kernel: KernelId, global: &[usize], local: Option<&[usize]>) -> RawResult<()> {
        self.enter("clEnqueueNDRangeKernel")?;

        let mut state = self.state.borrow_mut();
        let q = state.queue(queue)?;
        let k = state.kernels.get(&kernel).ok_or(CL_INVALID_KERNEL)?;
        if q.context != k.context {
            return Err(CL_INVALID_CONTEXT)
        }

        if global.is_empty() || global.len() > 3 || local.map_or(false, |l| l.len() != global.len()) {
            return Err(CL_INVALID_WORK_DIMENSION)
        }

        if global.contains(&0) {
            return Err(CL_INVALID_GLOBAL_WORK_SIZE)
        }

        let device = self.device(q.device)?;
        if let Some(local) = local {
            let divides = local.iter().zip(global).all(|(&l, &g)| l != 0 && g % l == 0);
            let size = local.iter().try_fold(1usize, |acc, &l| acc.checked_mul(l));

            if !divides || size.map_or(true, |size| size > device.max_work_group) {
                return Err(CL_INVALID_WORK_GROUP_SIZE)
            }
        }

        let args = k.args.iter().cloned().collect::<Option<Vec<_>>>().ok_or(CL_INVALID_KERNEL_ARGS)?;
        let command = Command::Dispatch {
            name: k.name.clone(),
            kernel: k.host,
            args,
            global: global.to_vec(),
            local: local.map(<[usize]>::to_vec),
            units: device.units
        };

        match state.queues.get_mut(&queue) {
            Some(q) => q.pending.push_back(command),
            None => return Err(CL_INVALID_COMMAND_QUEUE)
        }

        Ok(())
    }

    fn flush (&self, queue: QueueId) -> RawResult<()> {
        self.enter("clFlush")?;
        self.state.borrow().queue(queue).map(|_| ())
    }

    fn finish (&self, queue: QueueId) -> RawResult<()> {
        self.enter("clFinish")?;
        self.run_pending(queue)
    }
}
