// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the latest-frame slot under concurrent use

use camview::media::frame_slot::channel;
use camview::media::{FrameGeometry, RgbaFrame};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

const PUBLISHES: u64 = 2_000;
const READERS: usize = 4;

/// Frame whose every byte is the tag
fn tagged_frame(tag: u8) -> RgbaFrame {
    let g = FrameGeometry::new(64, 48).unwrap();
    RgbaFrame::from_raw(g, vec![tag; g.rgba_len()]).unwrap()
}

fn tag_for(index: u64) -> u8 {
    (index % 251) as u8
}

#[test]
fn test_concurrent_readers_never_see_torn_frames() {
    let (publisher, reader) = channel();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let reader = reader.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut seen = 0u64;
                let mut last_sequence = 0u64;
                while !done.load(Ordering::SeqCst) {
                    let Some(frame) = reader.take_latest() else {
                        continue;
                    };
                    let first = frame.data()[0];
                    assert!(
                        frame.data().iter().all(|&b| b == first),
                        "frame {} mixes content",
                        frame.sequence()
                    );
                    // Sequence n carries the tag of publish n - 1
                    assert_eq!(first, tag_for(frame.sequence() - 1));
                    assert!(frame.sequence() >= last_sequence, "sequence went backwards");
                    last_sequence = frame.sequence();
                    seen += 1;
                }
                seen
            })
        })
        .collect();

    for i in 0..PUBLISHES {
        assert_eq!(publisher.publish(tagged_frame(tag_for(i))), i + 1);
    }
    done.store(true, Ordering::SeqCst);

    for handle in readers {
        handle.join().expect("reader thread panicked");
    }

    let last = reader.take_latest().unwrap();
    assert_eq!(last.sequence(), PUBLISHES);
    assert_eq!(last.data()[0], tag_for(PUBLISHES - 1));
}

#[test]
fn test_publisher_on_other_thread() {
    let (publisher, reader) = channel();

    let handle = thread::spawn(move || {
        for i in 0..10 {
            publisher.publish(tagged_frame(i));
        }
    });
    handle.join().unwrap();

    // Publisher is gone; the last frame stays readable
    let frame = reader.take_latest().unwrap();
    assert_eq!(frame.sequence(), 10);
    assert_eq!(frame.data()[0], 9);
}
