use std::sync::Arc;

use framegrab_core::media::MediaSource;

use crate::capture::FrameCaptureSync;
use crate::error::Result;

/// The playback engine as seen by a thumbnail request, enabling test mocking.
///
/// Handles are owned values: whoever receives one from a `new_*` call must hand
/// it back to the matching `release_*` call exactly once.
pub trait Engine: Send + Sync {
    type Instance;
    type Media;
    type Player;

    fn new_instance(&self, args: &[String]) -> Option<Self::Instance>;

    fn release_instance(&self, instance: Self::Instance);

    fn new_media(&self, instance: &Self::Instance, source: &MediaSource) -> Option<Self::Media>;

    fn release_media(&self, media: Self::Media);

    fn new_player(&self, media: &Self::Media) -> Option<Self::Player>;

    fn release_player(&self, player: Self::Player);

    /// Fix the pixel layout the render thread writes in.
    fn set_video_format(
        &self,
        player: &mut Self::Player,
        chroma: &str,
        width: u32,
        height: u32,
        pitch: u32,
    );

    /// Route the render thread's buffer-request and present callbacks to `sink`.
    fn set_video_callbacks(&self, player: &mut Self::Player, sink: Arc<FrameCaptureSync>);

    /// Start playback. Returns the engine's status code, `0` on success.
    fn play(&self, player: &mut Self::Player) -> i32;

    /// Stop playback. No render callback runs after this returns.
    fn stop(&self, player: &mut Self::Player);

    fn is_playing(&self, player: &Self::Player) -> bool;

    /// Total length in milliseconds, `<= 0` when unknown.
    fn length_ms(&self, player: &Self::Player) -> i64;

    fn set_time_ms(&self, player: &mut Self::Player, time_ms: i64);

    /// Register the application identity. Returns false when the engine
    /// lacks the capability.
    fn set_app_id(&self, _instance: &Self::Instance, _id: &str, _version: &str) -> bool {
        false
    }

    /// Attach an auxiliary interface. Returns false when the engine lacks the
    /// capability or refuses the interface.
    fn add_interface(&self, _instance: &Self::Instance, _name: &str) -> bool {
        false
    }

    /// Engine version string, when the engine reports one.
    fn version(&self) -> Option<String> {
        None
    }
}

/// Produces a ready-to-use engine, binding it first if needed.
pub trait EngineProvider: Send + Sync {
    type Engine: Engine;

    fn engine(&self) -> Result<Self::Engine>;
}

impl<T: EngineProvider> EngineProvider for &T {
    type Engine = T::Engine;

    fn engine(&self) -> Result<Self::Engine> {
        (**self).engine()
    }
}
