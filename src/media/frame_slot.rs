// SPDX-License-Identifier: GPL-3.0-only

//! Single-slot "latest frame wins" handoff between capture and display
//!
//! The capture thread owns a [`FramePublisher`] and replaces the slot
//! contents with every converted frame. Display threads hold
//! [`FrameReader`]s and copy the current frame out whenever they are ready
//! to draw. Nothing is queued: a slow reader misses frames, a fast reader
//! sees the same frame again (same [`RgbaFrame::sequence`]).
//!
//! ```text
//! capture ──publish──▶ [ Mutex<Option<RgbaFrame>> ] ──take_latest──▶ render
//! ```
//!
//! The lock is held only to swap the frame in and to clone it out, never
//! across conversion or drawing.

use super::frame::RgbaFrame;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct Slot {
    frame: Option<RgbaFrame>,
    next_sequence: u64,
}

type SharedSlot = Arc<Mutex<Slot>>;

/// Create an empty slot and its two handles
pub fn channel() -> (FramePublisher, FrameReader) {
    let slot = Arc::new(Mutex::new(Slot {
        frame: None,
        next_sequence: 1,
    }));
    (
        FramePublisher {
            slot: Arc::clone(&slot),
        },
        FrameReader { slot },
    )
}

// Every critical section leaves the slot either untouched or holding a whole
// frame, so a panic on another thread can't expose a torn value.
fn lock(slot: &SharedSlot) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Producer side of the slot (one per slot, not cloneable)
pub struct FramePublisher {
    slot: SharedSlot,
}

impl FramePublisher {
    /// Install `frame` as the latest frame, dropping the previous one
    ///
    /// Never waits for readers beyond the pointer swap. Returns the sequence
    /// number stamped on the frame.
    pub fn publish(&self, mut frame: RgbaFrame) -> u64 {
        let (sequence, displaced) = {
            let mut slot = lock(&self.slot);
            let sequence = slot.next_sequence;
            slot.next_sequence += 1;
            frame.set_sequence(sequence);
            (sequence, slot.frame.replace(frame))
        };
        // Free the old buffer outside the lock
        drop(displaced);
        sequence
    }

    /// A new reader for this slot
    pub fn reader(&self) -> FrameReader {
        FrameReader {
            slot: Arc::clone(&self.slot),
        }
    }
}

/// Consumer side of the slot
#[derive(Clone)]
pub struct FrameReader {
    slot: SharedSlot,
}

impl FrameReader {
    /// Independent copy of the latest frame, or `None` before the first publish
    pub fn take_latest(&self) -> Option<RgbaFrame> {
        lock(&self.slot).frame.clone()
    }

    /// Sequence of the frame currently in the slot, without copying pixels
    pub fn latest_sequence(&self) -> Option<u64> {
        lock(&self.slot).frame.as_ref().map(RgbaFrame::sequence)
    }
}

impl std::fmt::Debug for FrameReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReader")
            .field("latest_sequence", &self.latest_sequence())
            .finish()
    }
}
