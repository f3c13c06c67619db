use crate::stub_engine::StubCounts;

/// Assert every engine object the stub handed out was released exactly once.
pub fn assert_session_balanced(counts: &StubCounts) {
    assert_eq!(
        counts.instances_created, counts.instances_released,
        "instances created {} != released {}",
        counts.instances_created, counts.instances_released
    );
    assert_eq!(
        counts.media_created, counts.media_released,
        "media created {} != released {}",
        counts.media_created, counts.media_released
    );
    assert_eq!(
        counts.players_created, counts.players_released,
        "players created {} != released {}",
        counts.players_created, counts.players_released
    );
    assert_eq!(
        counts.players_created, counts.stops,
        "every player must be stopped before release"
    );
}

/// Assert the render thread was always handed one and the same buffer.
pub fn assert_single_buffer(counts: &StubCounts) {
    if let Some(first) = counts.buffer_addresses.first() {
        assert!(
            counts.buffer_addresses.iter().all(|a| a == first),
            "buffer requests returned different buffers: {:?}",
            counts.buffer_addresses
        );
    }
}

/// Decode `bytes` and assert the image has the given dimensions.
pub fn assert_image_dimensions(bytes: &[u8], width: u32, height: u32) {
    let img = image::load_from_memory(bytes).expect("thumbnail bytes should decode as an image");
    assert_eq!(
        (img.width(), img.height()),
        (width, height),
        "decoded image is {}x{}, expected {width}x{height}",
        img.width(),
        img.height()
    );
}

/// Assert `bytes` start with the JPEG SOI marker.
pub fn assert_jpeg(bytes: &[u8]) {
    assert!(
        bytes.len() >= 3 && bytes[..3] == [0xFF, 0xD8, 0xFF],
        "not a JPEG: {:02X?}",
        &bytes[..bytes.len().min(3)]
    );
}

/// Assert `bytes` start with the PNG signature.
pub fn assert_png(bytes: &[u8]) {
    assert!(
        bytes.starts_with(&[0x89, b'P', b'N', b'G']),
        "not a PNG: {:02X?}",
        &bytes[..bytes.len().min(4)]
    );
}
