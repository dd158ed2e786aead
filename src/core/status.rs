use std::fmt::{Debug, Display};

/// Raw status code returned by every call of the platform contract.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Status (i32);

impl Status {
    #[inline(always)]
    pub const fn new (code: i32) -> Self {
        Self(code)
    }

    #[inline(always)]
    pub const fn code (self) -> i32 {
        self.0
    }

    /// Symbolic name of the code, or `"<unknown error code>"`.
    #[inline(always)]
    pub const fn name (self) -> &'static str {
        decode(self.0)
    }

    #[inline(always)]
    pub const fn is_success (self) -> bool {
        self.0 == CL_SUCCESS.0
    }
}

impl From<i32> for Status {
    #[inline(always)]
    fn from (code: i32) -> Self {
        Self(code)
    }
}

impl From<Status> for i32 {
    #[inline(always)]
    fn from (status: Status) -> Self {
        status.0
    }
}

impl Debug for Status {
    #[inline(always)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Status {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

macro_rules! status_codes {
    ($($name:ident = $value:literal),+ $(,)?) => {
        $(
            pub const $name : Status = Status($value);
        )+

        /// Maps a platform status code to its symbolic name. Total over `i32`: codes outside the
        /// known table decode to `"<unknown error code>"`.
        pub const fn decode (code: i32) -> &'static str {
            match code {
                $($value => stringify!($name),)+
                _ => "<unknown error code>"
            }
        }
    };
}

status_codes! {
    CL_SUCCESS = 0,

    // cl.h
    CL_DEVICE_NOT_FOUND = -1,
    CL_DEVICE_NOT_AVAILABLE = -2,
    CL_COMPILER_NOT_AVAILABLE = -3,
    CL_MEM_OBJECT_ALLOCATION_FAILURE = -4,
    CL_OUT_OF_RESOURCES = -5,
    CL_OUT_OF_HOST_MEMORY = -6,
    CL_PROFILING_INFO_NOT_AVAILABLE = -7,
    CL_MEM_COPY_OVERLAP = -8,
    CL_IMAGE_FORMAT_MISMATCH = -9,
    CL_IMAGE_FORMAT_NOT_SUPPORTED = -10,
    CL_BUILD_PROGRAM_FAILURE = -11,
    CL_MAP_FAILURE = -12,
    CL_MISALIGNED_SUB_BUFFER_OFFSET = -13,
    CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST = -14,
    CL_COMPILE_PROGRAM_FAILURE = -15,
    CL_LINKER_NOT_AVAILABLE = -16,
    CL_LINK_PROGRAM_FAILURE = -17,
    CL_DEVICE_PARTITION_FAILED = -18,
    CL_KERNEL_ARG_INFO_NOT_AVAILABLE = -19,

    CL_INVALID_VALUE = -30,
    CL_INVALID_DEVICE_TYPE = -31,
    CL_INVALID_PLATFORM = -32,
    CL_INVALID_DEVICE = -33,
    CL_INVALID_CONTEXT = -34,
    CL_INVALID_QUEUE_PROPERTIES = -35,
    CL_INVALID_COMMAND_QUEUE = -36,
    CL_INVALID_HOST_PTR = -37,
    CL_INVALID_MEM_OBJECT = -38,
    CL_INVALID_IMAGE_FORMAT_DESCRIPTOR = -39,
    CL_INVALID_IMAGE_SIZE = -40,
    CL_INVALID_SAMPLER = -41,
    CL_INVALID_BINARY = -42,
    CL_INVALID_BUILD_OPTIONS = -43,
    CL_INVALID_PROGRAM = -44,
    CL_INVALID_PROGRAM_EXECUTABLE = -45,
    CL_INVALID_KERNEL_NAME = -46,
    CL_INVALID_KERNEL_DEFINITION = -47,
    CL_INVALID_KERNEL = -48,
    CL_INVALID_ARG_INDEX = -49,
    CL_INVALID_ARG_VALUE = -50,
    CL_INVALID_ARG_SIZE = -51,
    CL_INVALID_KERNEL_ARGS = -52,
    CL_INVALID_WORK_DIMENSION = -53,
    CL_INVALID_WORK_GROUP_SIZE = -54,
    CL_INVALID_WORK_ITEM_SIZE = -55,
    CL_INVALID_GLOBAL_OFFSET = -56,
    CL_INVALID_EVENT_WAIT_LIST = -57,
    CL_INVALID_EVENT = -58,
    CL_INVALID_OPERATION = -59,
    CL_INVALID_GL_OBJECT = -60,
    CL_INVALID_BUFFER_SIZE = -61,
    CL_INVALID_MIP_LEVEL = -62,
    CL_INVALID_GLOBAL_WORK_SIZE = -63,
    CL_INVALID_PROPERTY = -64,
    CL_INVALID_IMAGE_DESCRIPTOR = -65,
    CL_INVALID_COMPILER_OPTIONS = -66,
    CL_INVALID_LINKER_OPTIONS = -67,
    CL_INVALID_DEVICE_PARTITION_COUNT = -68,
    CL_INVALID_PIPE_SIZE = -69,
    CL_INVALID_DEVICE_QUEUE = -70,
    CL_INVALID_SPEC_ID = -71,
    CL_MAX_SIZE_RESTRICTION_EXCEEDED = -72,

    // cl_gl.h
    CL_INVALID_GL_SHAREGROUP_REFERENCE_KHR = -1000,

    // cl_ext.h
    CL_PLATFORM_NOT_FOUND_KHR = -1001,
    CL_DEVICE_PARTITION_FAILED_EXT = -1057,
    CL_INVALID_PARTITION_COUNT_EXT = -1058,
    CL_INVALID_PARTITION_NAME_EXT = -1059,

    // cl_egl.h
    CL_EGL_RESOURCE_NOT_ACQUIRED_KHR = -1092,
    CL_INVALID_EGL_OBJECT_KHR = -1093,

    CL_INVALID_ACCELERATOR_INTEL = -1094,
    CL_INVALID_ACCELERATOR_TYPE_INTEL = -1095,
    CL_INVALID_ACCELERATOR_DESCRIPTOR_INTEL = -1096,
    CL_ACCELERATOR_TYPE_NOT_SUPPORTED_INTEL = -1097,
    CL_COMMAND_TERMINATED_ITSELF_WITH_FAILURE_ARM = -1108,
    CL_CONTEXT_TERMINATED_KHR = -1121,
    CL_INVALID_COMMAND_BUFFER_KHR = -1138,
    CL_INVALID_SYNC_POINT_WAIT_LIST_KHR = -1139,
    CL_INCOMPATIBLE_COMMAND_QUEUE_KHR = -1140,
    CL_INVALID_SEMAPHORE_KHR = -1142,
    CL_GRALLOC_RESOURCE_NOT_ACQUIRED_IMG = -6000,
    CL_INVALID_GRALLOC_OBJECT_IMG = -6001,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_known_codes () {
        assert_eq!(decode(0), "CL_SUCCESS");
        assert_eq!(decode(-11), "CL_BUILD_PROGRAM_FAILURE");
        assert_eq!(decode(-54), "CL_INVALID_WORK_GROUP_SIZE");
        assert_eq!(decode(-1001), "CL_PLATFORM_NOT_FOUND_KHR");
        assert_eq!(CL_INVALID_KERNEL_NAME.name(), "CL_INVALID_KERNEL_NAME");
    }

    #[test]
    fn decode_is_total () {
        assert_eq!(decode(-29), "<unknown error code>");
        assert_eq!(decode(42), "<unknown error code>");
        assert_eq!(decode(i32::MIN), "<unknown error code>");
    }

    #[test]
    fn status_display () {
        assert_eq!(CL_OUT_OF_RESOURCES.to_string(), "CL_OUT_OF_RESOURCES (-5)");
        assert!(CL_SUCCESS.is_success());
        assert!(!Status::new(-5).is_success());
        assert_eq!(i32::from(CL_OUT_OF_RESOURCES), -5);
    }
}
