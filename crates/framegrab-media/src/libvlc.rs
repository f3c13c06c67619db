//! [`Engine`] implementation over a runtime-bound libvlc 3.x.

use std::ffi::{CStr, CString, c_char, c_int, c_uint, c_void};
use std::ptr::NonNull;
use std::sync::Arc;

use framegrab_core::media::MediaSource;
use serde::Serialize;
use tracing::debug;

use crate::binder::{CapabilityTable, SymbolSet};
use crate::capture::FrameCaptureSync;
use crate::engine::Engine;
use crate::error::{MediaError, Result};

pub const SYMBOLS: SymbolSet = SymbolSet {
    required: &[
        "libvlc_new",
        "libvlc_release",
        "libvlc_media_new_location",
        "libvlc_media_new_path",
        "libvlc_media_release",
        "libvlc_media_player_new_from_media",
        "libvlc_media_player_release",
        "libvlc_video_set_callbacks",
        "libvlc_video_set_format",
        "libvlc_media_player_play",
        "libvlc_media_player_stop",
        "libvlc_media_player_set_position",
        "libvlc_media_player_is_playing",
        "libvlc_media_player_get_length",
        "libvlc_media_player_set_time",
    ],
    optional: &["libvlc_set_app_id", "libvlc_add_intf", "libvlc_get_version"],
};

#[repr(C)]
pub struct RawInstance {
    _private: [u8; 0],
}

#[repr(C)]
pub struct RawMedia {
    _private: [u8; 0],
}

#[repr(C)]
pub struct RawPlayer {
    _private: [u8; 0],
}

type LockCb = unsafe extern "C" fn(*mut c_void, *mut *mut c_void) -> *mut c_void;
type UnlockCb = unsafe extern "C" fn(*mut c_void, *mut c_void, *const *mut c_void);
type DisplayCb = unsafe extern "C" fn(*mut c_void, *mut c_void);

type NewFn = unsafe extern "C" fn(c_int, *const *const c_char) -> *mut RawInstance;
type ReleaseFn = unsafe extern "C" fn(*mut RawInstance);
type MediaNewFn = unsafe extern "C" fn(*mut RawInstance, *const c_char) -> *mut RawMedia;
type MediaReleaseFn = unsafe extern "C" fn(*mut RawMedia);
type PlayerNewFn = unsafe extern "C" fn(*mut RawMedia) -> *mut RawPlayer;
type PlayerFn = unsafe extern "C" fn(*mut RawPlayer);
type PlayerIntFn = unsafe extern "C" fn(*mut RawPlayer) -> c_int;
type SetCallbacksFn = unsafe extern "C" fn(
    *mut RawPlayer,
    Option<LockCb>,
    Option<UnlockCb>,
    Option<DisplayCb>,
    *mut c_void,
);
type SetFormatFn = unsafe extern "C" fn(*mut RawPlayer, *const c_char, c_uint, c_uint, c_uint);
type GetLengthFn = unsafe extern "C" fn(*mut RawPlayer) -> i64;
type SetTimeFn = unsafe extern "C" fn(*mut RawPlayer, i64);
type SetAppIdFn =
    unsafe extern "C" fn(*mut RawInstance, *const c_char, *const c_char, *const c_char);
type AddIntfFn = unsafe extern "C" fn(*mut RawInstance, *const c_char) -> c_int;
type GetVersionFn = unsafe extern "C" fn() -> *const c_char;

#[derive(Clone, Copy)]
struct VlcApi {
    new: NewFn,
    release: ReleaseFn,
    media_new_path: MediaNewFn,
    media_new_location: MediaNewFn,
    media_release: MediaReleaseFn,
    player_new_from_media: PlayerNewFn,
    player_release: PlayerFn,
    set_callbacks: SetCallbacksFn,
    set_format: SetFormatFn,
    play: PlayerIntFn,
    stop: PlayerFn,
    is_playing: PlayerIntFn,
    get_length: GetLengthFn,
    set_time: SetTimeFn,
    set_app_id: Option<SetAppIdFn>,
    add_intf: Option<AddIntfFn>,
    get_version: Option<GetVersionFn>,
}

fn required<F: Copy>(table: &CapabilityTable, name: &'static str) -> Result<F> {
    let sym = table.required(name).ok_or_else(|| MediaError::MissingSymbol {
        library: table.library_name().to_string(),
        symbol: name,
    })?;
    // SAFETY: each call site names the libvlc 3.x signature of `name`.
    Ok(unsafe { sym.cast::<F>() })
}

fn optional<F: Copy>(table: &CapabilityTable, name: &'static str) -> Option<F> {
    // SAFETY: as for `required`.
    table.optional(name).map(|sym| unsafe { sym.cast::<F>() })
}

impl VlcApi {
    fn from_table(table: &CapabilityTable) -> Result<Self> {
        Ok(Self {
            new: required(table, "libvlc_new")?,
            release: required(table, "libvlc_release")?,
            media_new_path: required(table, "libvlc_media_new_path")?,
            media_new_location: required(table, "libvlc_media_new_location")?,
            media_release: required(table, "libvlc_media_release")?,
            player_new_from_media: required(table, "libvlc_media_player_new_from_media")?,
            player_release: required(table, "libvlc_media_player_release")?,
            set_callbacks: required(table, "libvlc_video_set_callbacks")?,
            set_format: required(table, "libvlc_video_set_format")?,
            play: required(table, "libvlc_media_player_play")?,
            stop: required(table, "libvlc_media_player_stop")?,
            is_playing: required(table, "libvlc_media_player_is_playing")?,
            get_length: required(table, "libvlc_media_player_get_length")?,
            set_time: required(table, "libvlc_media_player_set_time")?,
            set_app_id: optional(table, "libvlc_set_app_id"),
            add_intf: optional(table, "libvlc_add_intf"),
            get_version: optional(table, "libvlc_get_version"),
        })
    }
}

/// libvlc bound through a [`CapabilityTable`].
#[derive(Clone)]
pub struct LibVlc {
    table: Arc<CapabilityTable>,
    api: VlcApi,
}

pub struct VlcInstance(NonNull<RawInstance>);

pub struct VlcMedia(NonNull<RawMedia>);

pub struct VlcPlayer {
    raw: NonNull<RawPlayer>,
    /// Strong reference lent to the render callbacks, reclaimed on release.
    sink: Option<*const FrameCaptureSync>,
}

impl LibVlc {
    pub fn new(table: Arc<CapabilityTable>) -> Result<Self> {
        let api = VlcApi::from_table(&table)?;
        Ok(Self { table, api })
    }

    pub fn table(&self) -> &CapabilityTable {
        &self.table
    }

    pub fn info(&self) -> EngineInfo {
        let version_string = self.version();
        EngineInfo {
            library: self.table.library_name().to_string(),
            version: version_string.as_deref().and_then(parse_engine_version),
            version_string,
            app_identity: self.api.set_app_id.is_some(),
            extra_interfaces: self.api.add_intf.is_some(),
        }
    }
}

impl Engine for LibVlc {
    type Instance = VlcInstance;
    type Media = VlcMedia;
    type Player = VlcPlayer;

    fn new_instance(&self, args: &[String]) -> Option<VlcInstance> {
        let args = args
            .iter()
            .map(|a| CString::new(a.as_str()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .ok()?;
        let argv: Vec<*const c_char> = args.iter().map(|a| a.as_ptr()).collect();
        let argc = c_int::try_from(argv.len()).ok()?;
        // SAFETY: argv points at `argc` NUL-terminated strings that outlive the call.
        let raw = unsafe { (self.api.new)(argc, argv.as_ptr()) };
        NonNull::new(raw).map(VlcInstance)
    }

    fn release_instance(&self, instance: VlcInstance) {
        // SAFETY: the handle came from `libvlc_new` and is released once.
        unsafe { (self.api.release)(instance.0.as_ptr()) }
    }

    fn new_media(&self, instance: &VlcInstance, source: &MediaSource) -> Option<VlcMedia> {
        let (ctor, arg) = match source {
            MediaSource::Path(p) => (self.api.media_new_path, p.to_string_lossy().to_string()),
            MediaSource::Location(l) => (self.api.media_new_location, l.clone()),
        };
        let arg = CString::new(arg).ok()?;
        // SAFETY: live instance handle and a NUL-terminated string.
        let raw = unsafe { ctor(instance.0.as_ptr(), arg.as_ptr()) };
        NonNull::new(raw).map(VlcMedia)
    }

    fn release_media(&self, media: VlcMedia) {
        // SAFETY: the handle came from a media constructor and is released once.
        unsafe { (self.api.media_release)(media.0.as_ptr()) }
    }

    fn new_player(&self, media: &VlcMedia) -> Option<VlcPlayer> {
        // SAFETY: live media handle; the player takes its own reference.
        let raw = unsafe { (self.api.player_new_from_media)(media.0.as_ptr()) };
        NonNull::new(raw).map(|raw| VlcPlayer { raw, sink: None })
    }

    fn release_player(&self, player: VlcPlayer) {
        // SAFETY: the handle came from `libvlc_media_player_new_from_media`.
        // Releasing joins the video output, so no callback runs afterwards.
        unsafe { (self.api.player_release)(player.raw.as_ptr()) }
        if let Some(sink) = player.sink {
            // SAFETY: produced by `Arc::into_raw` in `set_video_callbacks`.
            drop(unsafe { Arc::from_raw(sink) });
        }
    }

    fn set_video_format(
        &self,
        player: &mut VlcPlayer,
        chroma: &str,
        width: u32,
        height: u32,
        pitch: u32,
    ) {
        let Ok(chroma) = CString::new(chroma) else {
            return;
        };
        // SAFETY: live player handle; libvlc copies the chroma string.
        unsafe {
            (self.api.set_format)(player.raw.as_ptr(), chroma.as_ptr(), width, height, pitch)
        }
    }

    fn set_video_callbacks(&self, player: &mut VlcPlayer, sink: Arc<FrameCaptureSync>) {
        let opaque = Arc::into_raw(sink);
        // SAFETY: `opaque` stays valid until `release_player` reclaims it,
        // which happens after libvlc stops calling back.
        unsafe {
            (self.api.set_callbacks)(
                player.raw.as_ptr(),
                Some(lock_frame),
                Some(unlock_frame),
                Some(display_frame),
                opaque as *mut c_void,
            )
        }
        if let Some(previous) = player.sink.replace(opaque) {
            // SAFETY: playback has not started, so libvlc never saw this one in use.
            drop(unsafe { Arc::from_raw(previous) });
        }
    }

    fn play(&self, player: &mut VlcPlayer) -> i32 {
        // SAFETY: live player handle.
        unsafe { (self.api.play)(player.raw.as_ptr()) }
    }

    fn stop(&self, player: &mut VlcPlayer) {
        // SAFETY: live player handle. Blocks until the decoder threads are joined.
        unsafe { (self.api.stop)(player.raw.as_ptr()) }
    }

    fn is_playing(&self, player: &VlcPlayer) -> bool {
        // SAFETY: live player handle.
        unsafe { (self.api.is_playing)(player.raw.as_ptr()) != 0 }
    }

    fn length_ms(&self, player: &VlcPlayer) -> i64 {
        // SAFETY: live player handle.
        unsafe { (self.api.get_length)(player.raw.as_ptr()) }
    }

    fn set_time_ms(&self, player: &mut VlcPlayer, time_ms: i64) {
        // SAFETY: live player handle.
        unsafe { (self.api.set_time)(player.raw.as_ptr(), time_ms) }
    }

    fn set_app_id(&self, instance: &VlcInstance, id: &str, version: &str) -> bool {
        let Some(set_app_id) = self.api.set_app_id else {
            return false;
        };
        let (Ok(id), Ok(version)) = (CString::new(id), CString::new(version)) else {
            return false;
        };
        // SAFETY: live instance, NUL-terminated strings; libvlc copies them.
        unsafe { set_app_id(instance.0.as_ptr(), id.as_ptr(), version.as_ptr(), c"".as_ptr()) };
        true
    }

    fn add_interface(&self, instance: &VlcInstance, name: &str) -> bool {
        let Some(add_intf) = self.api.add_intf else {
            return false;
        };
        let Ok(name) = CString::new(name) else {
            return false;
        };
        // SAFETY: live instance and a NUL-terminated module name.
        let rc = unsafe { add_intf(instance.0.as_ptr(), name.as_ptr()) };
        if rc != 0 {
            debug!(interface = ?name, rc, "engine refused interface");
        }
        rc == 0
    }

    fn version(&self) -> Option<String> {
        let get_version = self.api.get_version?;
        // SAFETY: libvlc returns a static NUL-terminated string.
        let raw = unsafe { get_version() };
        if raw.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned())
    }
}

unsafe extern "C" fn lock_frame(opaque: *mut c_void, planes: *mut *mut c_void) -> *mut c_void {
    // SAFETY: `opaque` is the `FrameCaptureSync` lent in `set_video_callbacks`.
    let sync = unsafe { &*(opaque as *const FrameCaptureSync) };
    let buffer = sync.on_buffer_request();
    // SAFETY: libvlc passes an array with room for at least one plane.
    unsafe { *planes = buffer.cast() };
    std::ptr::null_mut()
}

unsafe extern "C" fn unlock_frame(
    _opaque: *mut c_void,
    _picture: *mut c_void,
    _planes: *const *mut c_void,
) {
}

unsafe extern "C" fn display_frame(opaque: *mut c_void, _picture: *mut c_void) {
    // SAFETY: as in `lock_frame`.
    let sync = unsafe { &*(opaque as *const FrameCaptureSync) };
    sync.on_frame_presented();
}

/// What the bound engine library offers.
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub library: String,
    pub version_string: Option<String>,
    pub version: Option<semver::Version>,
    pub app_identity: bool,
    pub extra_interfaces: bool,
}

/// Parse the leading version token of strings like `3.0.20 Vetinari`.
pub fn parse_engine_version(raw: &str) -> Option<semver::Version> {
    let token = raw.split_whitespace().next()?;
    semver::Version::parse(token).ok()
}
