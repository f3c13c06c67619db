//! Single-use rendezvous between the engine's render thread and the request
//! thread.
//!
//! The render thread asks for a buffer (`on_buffer_request`), fills it, then
//! reports it presented (`on_frame_presented`). The request thread blocks in
//! `wait_for_frame` until the first presentation or the deadline. All state
//! lives behind one mutex; the condvar is signalled once, on the single
//! `completed` transition.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use framegrab_core::frame::{FrameLayout, RawFrame};
use tracing::debug;

/// What the request thread saw when its wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureState {
    pub completed: bool,
    pub success: bool,
    pub width: u32,
    pub height: u32,
    /// Whether the render thread ever asked for a buffer.
    pub frame_allocated: bool,
}

#[derive(Debug, Default)]
struct Slot {
    completed: bool,
    success: bool,
    frame: Option<RawFrame>,
    allocations: usize,
    presentations: usize,
}

#[derive(Debug)]
pub struct FrameCaptureSync {
    layout: FrameLayout,
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl FrameCaptureSync {
    pub fn new(layout: FrameLayout) -> Self {
        Self {
            layout,
            slot: Mutex::new(Slot::default()),
            ready: Condvar::new(),
        }
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    pub fn width(&self) -> u32 {
        self.layout.width()
    }

    pub fn height(&self) -> u32 {
        self.layout.height()
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        // A panicking callback cannot leave the slot half-written: every
        // mutation is a single field store.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Render-thread callback: return the buffer to draw into.
    ///
    /// The first call allocates; every later call returns the same buffer.
    /// The pointer stays valid until [`FrameCaptureSync::take_frame`] moves
    /// the frame out, which the caller only does after playback has stopped.
    pub fn on_buffer_request(&self) -> *mut u8 {
        let mut slot = self.slot();
        if slot.frame.is_none() {
            slot.frame = Some(RawFrame::alloc(self.layout));
            slot.allocations += 1;
            debug!(
                width = self.width(),
                height = self.height(),
                bytes = self.layout.len(),
                "allocated capture buffer"
            );
        }
        match slot.frame.as_mut() {
            Some(frame) => frame.as_mut_ptr(),
            None => std::ptr::null_mut(),
        }
    }

    /// Render-thread callback: the buffer now holds a complete picture.
    ///
    /// Only the first presentation after a buffer exists completes the
    /// capture and wakes the waiter; the rest are counted and ignored.
    pub fn on_frame_presented(&self) {
        let mut slot = self.slot();
        slot.presentations += 1;
        if slot.completed || slot.frame.is_none() {
            return;
        }
        slot.success = true;
        slot.completed = true;
        debug!("frame presented");
        self.ready.notify_all();
    }

    /// Block until a frame is presented or `timeout` elapses.
    pub fn wait_for_frame(&self, timeout: Duration) -> CaptureState {
        let slot = self.slot();
        let (slot, result) = self
            .ready
            .wait_timeout_while(slot, timeout, |s| !s.completed)
            .unwrap_or_else(|e| e.into_inner());
        if result.timed_out() && !slot.completed {
            debug!(?timeout, "capture wait timed out");
        }
        self.snapshot(&slot)
    }

    /// Current state without waiting.
    pub fn state(&self) -> CaptureState {
        let slot = self.slot();
        self.snapshot(&slot)
    }

    fn snapshot(&self, slot: &Slot) -> CaptureState {
        CaptureState {
            completed: slot.completed,
            success: slot.success,
            width: self.width(),
            height: self.height(),
            frame_allocated: slot.frame.is_some(),
        }
    }

    /// Move the buffer out, whether or not a frame was presented.
    ///
    /// Must only be called once the engine can no longer call back, i.e. after
    /// the player has been stopped and released.
    pub fn take_frame(&self) -> Option<RawFrame> {
        self.slot().frame.take()
    }

    pub fn allocation_count(&self) -> usize {
        self.slot().allocations
    }

    pub fn presentation_count(&self) -> usize {
        self.slot().presentations
    }
}
