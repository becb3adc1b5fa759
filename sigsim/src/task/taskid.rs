use core::sync::atomic::{AtomicUsize, Ordering};

pub type Tid = usize;

/// monotonic task id allocator
/// ids are never recycled within a run, the pending-owner policies
/// rely on creation order staying meaningful
pub(crate) struct TidAllocator(AtomicUsize);

impl TidAllocator {
    pub const fn new() -> Self {
        Self(AtomicUsize::new(1))
    }

    pub fn alloc(&self) -> Tid {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}
