/// `cl_mem_flags`
pub type MemFlagBits = u64;

pub const CL_MEM_WRITE_ONLY: MemFlagBits = 1 << 1;
pub const CL_MEM_READ_ONLY: MemFlagBits = 1 << 2;

/// How kernels may access a buffer. Host transfers are allowed either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemAccess {
    /// Only read by kernels. Kernel operands go here.
    ReadOnly,
    /// Only written by kernels. Kernel results go here.
    WriteOnly
}

impl MemAccess {
    /// Decodes the access bits of `flags`. Returns `None` unless exactly one access bit is set.
    #[inline]
    pub const fn from_bits (flags: MemFlagBits) -> Option<Self> {
        match (flags & CL_MEM_READ_ONLY != 0, flags & CL_MEM_WRITE_ONLY != 0) {
            (true, false) => Some(Self::ReadOnly),
            (false, true) => Some(Self::WriteOnly),
            _ => None
        }
    }

    #[inline(always)]
    pub const fn to_bits (self) -> MemFlagBits {
        match self {
            Self::ReadOnly => CL_MEM_READ_ONLY,
            Self::WriteOnly => CL_MEM_WRITE_ONLY
        }
    }
}

impl From<MemAccess> for MemFlagBits {
    #[inline(always)]
    fn from (access: MemAccess) -> Self {
        access.to_bits()
    }
}
