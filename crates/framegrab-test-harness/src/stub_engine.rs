use std::cell::Cell;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use framegrab_core::media::MediaSource;
use framegrab_media::capture::FrameCaptureSync;
use framegrab_media::engine::{Engine, EngineProvider};
use framegrab_media::error::{MediaError, Result};

/// What the stub render thread does once playback starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameScript {
    /// No callbacks at all.
    Never,
    /// Request a buffer but never present it.
    AllocateOnly,
    /// Request the buffer `buffer_requests` times (filling it with `fill`),
    /// then present `presentations` times.
    Deliver {
        buffer_requests: u32,
        presentations: u32,
        fill: u8,
    },
}

/// Scripted engine behavior.
#[derive(Debug, Clone)]
pub struct StubScript {
    pub bind_fails: bool,
    pub instance_fails: bool,
    pub media_fails: bool,
    pub player_fails: bool,
    /// Status returned from `play`.
    pub play_code: i32,
    /// `is_playing` answers false this many times, then true. `None`: never.
    pub playing_after_polls: Option<u32>,
    pub length_ms: i64,
    pub frames: FrameScript,
    pub app_identity: bool,
    pub version: Option<String>,
}

impl Default for StubScript {
    /// A healthy 60 second video.
    fn default() -> Self {
        Self {
            bind_fails: false,
            instance_fails: false,
            media_fails: false,
            player_fails: false,
            play_code: 0,
            playing_after_polls: Some(2),
            length_ms: 60_000,
            frames: FrameScript::Deliver {
                buffer_requests: 2,
                presentations: 3,
                fill: 0x80,
            },
            app_identity: true,
            version: Some("3.0.20 Vetinari".to_string()),
        }
    }
}

impl StubScript {
    pub fn never_playing() -> Self {
        Self {
            playing_after_polls: None,
            ..Self::default()
        }
    }

    pub fn unknown_duration() -> Self {
        Self {
            length_ms: 0,
            ..Self::default()
        }
    }

    pub fn no_frames() -> Self {
        Self {
            frames: FrameScript::Never,
            ..Self::default()
        }
    }
}

/// Everything the stub was asked to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StubCounts {
    pub bind_calls: u32,
    pub instances_created: u32,
    pub instances_released: u32,
    pub media_created: u32,
    pub media_released: u32,
    pub players_created: u32,
    pub players_released: u32,
    pub plays: u32,
    pub stops: u32,
    pub is_playing_polls: u32,
    pub seeks: Vec<i64>,
    /// (chroma, width, height, pitch) per `set_video_format` call.
    pub video_formats: Vec<(String, u32, u32, u32)>,
    pub engine_args: Vec<Vec<String>>,
    pub sources: Vec<MediaSource>,
    pub app_ids: Vec<String>,
    pub interfaces: Vec<String>,
    /// Buffer address returned by each `on_buffer_request`.
    pub buffer_addresses: Vec<usize>,
}

/// In-process engine double. Clones share one script and one set of counts.
#[derive(Debug, Clone)]
pub struct StubEngine {
    script: Arc<StubScript>,
    counts: Arc<Mutex<StubCounts>>,
}

pub struct StubInstance(u32);

pub struct StubMedia(u32);

impl StubInstance {
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl StubMedia {
    pub fn id(&self) -> u32 {
        self.0
    }
}

pub struct StubPlayer {
    id: u32,
    polls: Cell<u32>,
    sink: Option<Arc<FrameCaptureSync>>,
    render: Option<JoinHandle<()>>,
}

impl StubPlayer {
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl StubEngine {
    pub fn new(script: StubScript) -> Self {
        Self {
            script: Arc::new(script),
            counts: Arc::new(Mutex::new(StubCounts::default())),
        }
    }

    pub fn script(&self) -> &StubScript {
        &self.script
    }

    pub fn counts(&self) -> StubCounts {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, StubCounts> {
        self.counts.lock().unwrap()
    }

    fn join_render(player: &mut StubPlayer) {
        if let Some(handle) = player.render.take() {
            handle.join().expect("stub render thread panicked");
        }
    }
}

impl Default for StubEngine {
    fn default() -> Self {
        Self::new(StubScript::default())
    }
}

impl Engine for StubEngine {
    type Instance = StubInstance;
    type Media = StubMedia;
    type Player = StubPlayer;

    fn new_instance(&self, args: &[String]) -> Option<StubInstance> {
        let mut counts = self.lock();
        counts.engine_args.push(args.to_vec());
        if self.script.instance_fails {
            return None;
        }
        counts.instances_created += 1;
        Some(StubInstance(counts.instances_created))
    }

    fn release_instance(&self, _instance: StubInstance) {
        self.lock().instances_released += 1;
    }

    fn new_media(&self, _instance: &StubInstance, source: &MediaSource) -> Option<StubMedia> {
        let mut counts = self.lock();
        counts.sources.push(source.clone());
        if self.script.media_fails {
            return None;
        }
        counts.media_created += 1;
        Some(StubMedia(counts.media_created))
    }

    fn release_media(&self, _media: StubMedia) {
        self.lock().media_released += 1;
    }

    fn new_player(&self, _media: &StubMedia) -> Option<StubPlayer> {
        if self.script.player_fails {
            return None;
        }
        let mut counts = self.lock();
        counts.players_created += 1;
        Some(StubPlayer {
            id: counts.players_created,
            polls: Cell::new(0),
            sink: None,
            render: None,
        })
    }

    fn release_player(&self, mut player: StubPlayer) {
        Self::join_render(&mut player);
        self.lock().players_released += 1;
    }

    fn set_video_format(
        &self,
        _player: &mut StubPlayer,
        chroma: &str,
        width: u32,
        height: u32,
        pitch: u32,
    ) {
        self.lock()
            .video_formats
            .push((chroma.to_string(), width, height, pitch));
    }

    fn set_video_callbacks(&self, player: &mut StubPlayer, sink: Arc<FrameCaptureSync>) {
        player.sink = Some(sink);
    }

    fn play(&self, player: &mut StubPlayer) -> i32 {
        self.lock().plays += 1;
        if self.script.play_code != 0 {
            return self.script.play_code;
        }
        let Some(sink) = player.sink.clone() else {
            return 0;
        };

        let frames = self.script.frames.clone();
        let counts = Arc::clone(&self.counts);
        player.render = Some(std::thread::spawn(move || {
            render(&frames, &sink, &counts);
        }));
        0
    }

    fn stop(&self, player: &mut StubPlayer) {
        // Joining the render thread mirrors the real engine: no callback
        // runs once stop returns.
        Self::join_render(player);
        self.lock().stops += 1;
    }

    fn is_playing(&self, player: &StubPlayer) -> bool {
        self.lock().is_playing_polls += 1;
        let polls = player.polls.get();
        player.polls.set(polls + 1);
        match self.script.playing_after_polls {
            Some(n) => polls >= n,
            None => false,
        }
    }

    fn length_ms(&self, _player: &StubPlayer) -> i64 {
        self.script.length_ms
    }

    fn set_time_ms(&self, _player: &mut StubPlayer, time_ms: i64) {
        self.lock().seeks.push(time_ms);
    }

    fn set_app_id(&self, _instance: &StubInstance, id: &str, _version: &str) -> bool {
        if !self.script.app_identity {
            return false;
        }
        self.lock().app_ids.push(id.to_string());
        true
    }

    fn add_interface(&self, _instance: &StubInstance, name: &str) -> bool {
        self.lock().interfaces.push(name.to_string());
        true
    }

    fn version(&self) -> Option<String> {
        self.script.version.clone()
    }
}

fn render(frames: &FrameScript, sink: &FrameCaptureSync, counts: &Mutex<StubCounts>) {
    let len = sink.layout().len();

    match *frames {
        FrameScript::Never => {}
        FrameScript::AllocateOnly => {
            let ptr = sink.on_buffer_request();
            counts.lock().unwrap().buffer_addresses.push(ptr as usize);
        }
        FrameScript::Deliver {
            buffer_requests,
            presentations,
            fill,
        } => {
            for _ in 0..buffer_requests {
                let ptr = sink.on_buffer_request();
                assert!(!ptr.is_null());
                // SAFETY: the capture sync hands out a live buffer of exactly
                // width * height * 4 bytes that nothing else touches until
                // playback stops, and stop joins this thread first.
                unsafe { std::ptr::write_bytes(ptr, fill, len) };
                counts.lock().unwrap().buffer_addresses.push(ptr as usize);
            }
            for _ in 0..presentations {
                sink.on_frame_presented();
            }
        }
    }
}

impl EngineProvider for StubEngine {
    type Engine = StubEngine;

    fn engine(&self) -> Result<StubEngine> {
        self.lock().bind_calls += 1;
        if self.script.bind_fails {
            return Err(MediaError::LibraryNotFound {
                tried: "stub: binding disabled".into(),
            });
        }
        Ok(self.clone())
    }
}
