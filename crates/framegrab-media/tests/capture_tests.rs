use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use framegrab_core::frame::FrameLayout;
use framegrab_media::capture::FrameCaptureSync;

fn layout(width: u32, height: u32) -> FrameLayout {
    FrameLayout::new(width, height).unwrap()
}

#[test]
fn test_repeated_callbacks_deliver_once() {
    let sync = Arc::new(FrameCaptureSync::new(layout(32, 24)));

    let addresses: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sync = Arc::clone(&sync);
                s.spawn(move || {
                    let mut seen = Vec::new();
                    for _ in 0..50 {
                        seen.push(sync.on_buffer_request() as usize);
                        sync.on_frame_presented();
                    }
                    seen
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let state = sync.wait_for_frame(Duration::from_secs(1));
    assert!(state.completed);
    assert!(state.success);
    assert_eq!(sync.allocation_count(), 1);
    assert_eq!(sync.presentation_count(), 200);
    assert!(addresses.iter().all(|&a| a == addresses[0]));

    let frame = sync.take_frame().unwrap();
    assert_eq!(frame.data().as_ptr() as usize, addresses[0]);
    assert!(sync.take_frame().is_none());
}

#[test]
fn test_wait_is_bounded_without_callbacks() {
    let sync = FrameCaptureSync::new(layout(16, 16));
    let start = Instant::now();
    let state = sync.wait_for_frame(Duration::from_millis(100));
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(5), "wait overran: {elapsed:?}");
    assert!(!state.success);
    assert!(!state.completed);
}

#[test]
fn test_allocated_but_unpresented_buffer_is_returned() {
    let sync = FrameCaptureSync::new(layout(16, 16));
    sync.on_buffer_request();

    let state = sync.wait_for_frame(Duration::from_millis(20));
    assert!(!state.success);
    assert!(state.frame_allocated);
    // The caller still owns and frees the buffer.
    assert!(sync.take_frame().is_some());
}

#[test]
fn test_wait_after_completion_returns_immediately() {
    let sync = FrameCaptureSync::new(layout(4, 4));
    sync.on_buffer_request();
    sync.on_frame_presented();

    let start = Instant::now();
    let state = sync.wait_for_frame(Duration::from_secs(10));
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(state.success);
}

#[test]
fn test_producer_after_waiter_starts() {
    let sync = Arc::new(FrameCaptureSync::new(layout(10, 10)));
    let producer = {
        let sync = Arc::clone(&sync);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            for _ in 0..3 {
                sync.on_buffer_request();
            }
            sync.on_frame_presented();
            sync.on_frame_presented();
        })
    };

    let state = sync.wait_for_frame(Duration::from_secs(5));
    producer.join().unwrap();
    assert!(state.success);
    assert_eq!(sync.allocation_count(), 1);
    assert_eq!(sync.presentation_count(), 2);
}
