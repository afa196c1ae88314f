//! Frame scheduling.
//!
//! Mutations only mark the scheduler dirty; a flush performs at most one
//! repaint no matter how many mutations preceded it. A paint-only change
//! (a line transform on a `text` element) reuses the previous layout.

use bitflags::bitflags;

bitflags! {
    /// What the next flush has to redo.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Dirty: u8 {
        /// Tree or style changed; layout must be recomputed.
        const LAYOUT = 1 << 0;
        /// Output must be repainted.
        const PAINT = 1 << 1;
        const ALL = Self::LAYOUT.bits() | Self::PAINT.bits();
    }
}

#[derive(Debug, Default)]
pub struct FrameScheduler {
    dirty: Dirty,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, dirty: Dirty) {
        self.dirty |= dirty;
    }

    /// Clear and return the pending work.
    pub fn take(&mut self) -> Dirty {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_coalesce() {
        let mut scheduler = FrameScheduler::new();
        scheduler.mark(Dirty::LAYOUT);
        scheduler.mark(Dirty::PAINT);
        scheduler.mark(Dirty::LAYOUT);

        assert_eq!(scheduler.take(), Dirty::ALL);
        assert_eq!(scheduler.take(), Dirty::empty());
    }

    #[test]
    fn test_paint_only_stays_paint_only() {
        let mut scheduler = FrameScheduler::new();
        assert!(scheduler.take().is_empty());

        scheduler.mark(Dirty::PAINT);
        scheduler.mark(Dirty::empty());
        let pending = scheduler.take();
        assert!(pending.contains(Dirty::PAINT));
        assert!(!pending.contains(Dirty::LAYOUT));
    }
}
