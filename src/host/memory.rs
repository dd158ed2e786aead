use std::cell::{Ref, RefCell, RefMut};
use crate::core::*;

/// Backing store of an emulated buffer. Word-aligned, so any [`Pod`](bytemuck::Pod) view up to 8-byte alignment is valid.
#[derive(Debug)]
pub struct HostMemory {
    size: usize,
    words: RefCell<Vec<u64>>
}

impl HostMemory {
    pub(super) fn new (size: usize) -> Self {
        Self {
            size,
            words: RefCell::new(vec![0; (size + 7) / 8])
        }
    }

    /// Size in bytes.
    #[inline(always)]
    pub fn size (&self) -> usize {
        self.size
    }

    /// Borrows the contents. Fails with [`CL_INVALID_MEM_OBJECT`] if they are mutably borrowed.
    pub fn bytes (&self) -> RawResult<Ref<'_, [u8]>> {
        let size = self.size;
        let words = self.words.try_borrow().map_err(|_| CL_INVALID_MEM_OBJECT)?;
        Ok(Ref::map(words, |w| &bytemuck::cast_slice::<u64, u8>(w)[..size]))
    }

    /// Mutably borrows the contents. Fails with [`CL_INVALID_MEM_OBJECT`] if they are already borrowed.
    pub fn bytes_mut (&self) -> RawResult<RefMut<'_, [u8]>> {
        let size = self.size;
        let words = self.words.try_borrow_mut().map_err(|_| CL_INVALID_MEM_OBJECT)?;
        Ok(RefMut::map(words, |w| &mut bytemuck::cast_slice_mut::<u64, u8>(w)[..size]))
    }

    pub(super) fn check_range (&self, offset: usize, size: usize) -> RawResult<()> {
        match offset.checked_add(size) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(CL_INVALID_VALUE)
        }
    }
}
