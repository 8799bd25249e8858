//! Local and remote media streams
//!
//! Streams are shared (`Arc`) between the connection manager, the peer
//! connection backend and whatever renders them. A [`VideoSink`] stands in for
//! a video element: it can be recreated and re-pointed at an existing stream
//! without capturing media again.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Media-related errors
#[derive(Error, Debug, Clone)]
pub enum MediaError {
    /// Device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Constraints cannot be satisfied by any device
    #[error("Constraints not satisfiable: {0}")]
    Overconstrained(String),

    /// Stream error
    #[error("Stream error: {0}")]
    StreamError(String),
}

/// Kind of a media track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Microphone or remote audio
    Audio,
    /// Camera or remote video
    Video,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Audio => f.write_str("audio"),
            Self::Video => f.write_str("video"),
        }
    }
}

/// Single audio or video track
#[derive(Debug)]
pub struct MediaTrack {
    id: String,
    kind: MediaKind,
    enabled: AtomicBool,
    ended: AtomicBool,
}

impl MediaTrack {
    /// Create a live, enabled track
    pub fn new(id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            kind,
            enabled: AtomicBool::new(true),
            ended: AtomicBool::new(false),
        }
    }

    /// Track identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Track kind
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Whether the track currently produces media
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Mute or unmute the track
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Whether the track has been stopped
    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    /// Stop the track permanently
    pub fn stop(&self) {
        self.ended.store(true, Ordering::SeqCst);
    }
}

/// Ordered set of tracks sharing one stream id
#[derive(Debug)]
pub struct MediaStream {
    id: String,
    tracks: RwLock<Vec<Arc<MediaTrack>>>,
}

impl MediaStream {
    /// Create an empty stream
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tracks: RwLock::new(Vec::new()),
        }
    }

    /// Create a stream from existing tracks
    pub fn with_tracks(id: impl Into<String>, tracks: Vec<Arc<MediaTrack>>) -> Self {
        Self {
            id: id.into(),
            tracks: RwLock::new(tracks),
        }
    }

    /// Stream identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Add a track
    pub fn add_track(&self, track: Arc<MediaTrack>) {
        self.tracks.write().push(track);
    }

    /// Snapshot of all tracks
    pub fn tracks(&self) -> Vec<Arc<MediaTrack>> {
        self.tracks.read().clone()
    }

    /// Snapshot of the tracks of one kind
    pub fn tracks_of(&self, kind: MediaKind) -> Vec<Arc<MediaTrack>> {
        self.tracks
            .read()
            .iter()
            .filter(|t| t.kind() == kind)
            .cloned()
            .collect()
    }

    /// Stop every track
    pub fn stop_all(&self) {
        for track in self.tracks.read().iter() {
            track.stop();
        }
    }
}

/// Render target for a stream, the equivalent of a video element
pub trait VideoSink: Send + Sync {
    /// Point the sink at a stream (`None` detaches it)
    fn attach(&self, stream: Option<Arc<MediaStream>>);
}

/// Video constraint values, each an "ideal" hint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConstraints {
    /// Ideal width in pixels
    pub width: Option<u32>,
    /// Ideal height in pixels
    pub height: Option<u32>,
    /// Ideal frame rate
    pub frame_rate: Option<u32>,
    /// Camera facing mode (`user` / `environment`)
    pub facing_mode: Option<String>,
}

/// Audio processing constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConstraints {
    /// Echo cancellation
    pub echo_cancellation: bool,
    /// Noise suppression
    pub noise_suppression: bool,
    /// Automatic gain control
    pub auto_gain_control: bool,
}

/// Either a plain on/off switch or detailed constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackConstraint<T> {
    /// `true` / `false`
    Enabled(bool),
    /// Detailed constraint object
    Detailed(T),
}

impl<T> TrackConstraint<T> {
    /// Whether the track kind is requested at all
    pub fn is_requested(&self) -> bool {
        !matches!(self, Self::Enabled(false))
    }
}

/// Constraints passed to [`MediaDevices::get_user_media`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaConstraints {
    /// Video request
    pub video: TrackConstraint<VideoConstraints>,
    /// Audio request
    pub audio: TrackConstraint<AudioConstraints>,
}

impl MediaConstraints {
    /// Simplest request: any camera, any microphone
    pub fn basic() -> Self {
        Self {
            video: TrackConstraint::Enabled(true),
            audio: TrackConstraint::Enabled(true),
        }
    }

    /// Video with the given ideal resolution and processed audio
    pub fn video_profile(width: u32, height: u32, frame_rate: Option<u32>, processed_audio: bool) -> Self {
        let audio = if processed_audio {
            TrackConstraint::Detailed(AudioConstraints {
                echo_cancellation: true,
                noise_suppression: true,
                auto_gain_control: true,
            })
        } else {
            TrackConstraint::Enabled(true)
        };
        Self {
            video: TrackConstraint::Detailed(VideoConstraints {
                width: Some(width),
                height: Some(height),
                frame_rate,
                facing_mode: Some("user".to_string()),
            }),
            audio,
        }
    }

    /// Prioritized fallback ladder, most specific first
    pub fn default_profiles() -> Vec<Self> {
        vec![
            Self::video_profile(1280, 720, Some(30), true),
            Self::video_profile(640, 480, Some(30), true),
            Self::video_profile(320, 240, None, false),
            Self::basic(),
        ]
    }

    /// Whether video is requested
    pub fn has_video(&self) -> bool {
        self.video.is_requested()
    }

    /// Whether audio is requested
    pub fn has_audio(&self) -> bool {
        self.audio.is_requested()
    }
}

/// Access to capture devices
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Capture a stream matching the constraints
    async fn get_user_media(&self, constraints: &MediaConstraints) -> Result<Arc<MediaStream>, MediaError>;
}

/// Media device events
#[derive(Debug, Clone)]
pub enum MediaEvent {
    /// Device connected
    DeviceConnected {
        /// Device ID
        device_id: String,
    },
    /// Stream captured
    StreamCaptured {
        /// Stream ID
        stream_id: String,
    },
}

/// Capture device description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDevice {
    /// Device ID
    pub id: String,
    /// Human readable label
    pub label: String,
    /// What the device captures
    pub kind: MediaKind,
}

/// Device set that fabricates silent audio and blank video tracks
///
/// Used where no capture hardware exists (CLI loopback runs, headless hosts).
pub struct SyntheticMediaDevices {
    devices: Vec<MediaDevice>,
    captured: AtomicUsize,
    event_sender: broadcast::Sender<MediaEvent>,
}

impl SyntheticMediaDevices {
    /// Create the default device set: one camera, one microphone
    #[must_use]
    pub fn new() -> Self {
        let (event_sender, _) = broadcast::channel(100);
        Self {
            devices: vec![
                MediaDevice {
                    id: "default-audio".to_string(),
                    label: "Default Audio Device".to_string(),
                    kind: MediaKind::Audio,
                },
                MediaDevice {
                    id: "default-video".to_string(),
                    label: "Default Video Device".to_string(),
                    kind: MediaKind::Video,
                },
            ],
            captured: AtomicUsize::new(0),
            event_sender,
        }
    }

    /// Enumerate available devices
    #[must_use]
    pub fn enumerate(&self) -> &[MediaDevice] {
        for device in &self.devices {
            let _ = self.event_sender.send(MediaEvent::DeviceConnected {
                device_id: device.id.clone(),
            });
        }
        &self.devices
    }

    /// Subscribe to media events
    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<MediaEvent> {
        self.event_sender.subscribe()
    }
}

impl Default for SyntheticMediaDevices {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaDevices for SyntheticMediaDevices {
    #[tracing::instrument(skip(self, constraints), fields(video = constraints.has_video(), audio = constraints.has_audio()))]
    async fn get_user_media(&self, constraints: &MediaConstraints) -> Result<Arc<MediaStream>, MediaError> {
        if !constraints.has_video() && !constraints.has_audio() {
            return Err(MediaError::Overconstrained(
                "at least one of audio or video must be requested".to_string(),
            ));
        }

        let n = self.captured.fetch_add(1, Ordering::SeqCst);
        let stream = MediaStream::new(format!("local-{n}"));
        if constraints.has_audio() {
            stream.add_track(Arc::new(MediaTrack::new(format!("audio-{n}"), MediaKind::Audio)));
        }
        if constraints.has_video() {
            stream.add_track(Arc::new(MediaTrack::new(format!("video-{n}"), MediaKind::Video)));
        }

        let _ = self.event_sender.send(MediaEvent::StreamCaptured {
            stream_id: stream.id().to_string(),
        });
        tracing::debug!(stream_id = %stream.id(), tracks = stream.tracks().len(), "Synthetic stream captured");
        Ok(Arc::new(stream))
    }
}
