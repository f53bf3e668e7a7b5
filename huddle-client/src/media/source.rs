use crate::error::MediaError;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

pub type LocalTrack = Arc<dyn TrackLocal + Send + Sync>;

/// The local capture handle: track handles shared read-only with every peer
/// transport, plus the enabled flags the capture pipeline consults.
///
/// Toggling is pure local state; the already-attached transports reflect the
/// flags through the capture pipeline, with no network effect.
pub struct MediaSource {
    tracks: Vec<LocalTrack>,
    audio_enabled: Arc<AtomicBool>,
    video_enabled: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

impl MediaSource {
    pub fn new(tracks: Vec<LocalTrack>) -> Self {
        Self {
            tracks,
            audio_enabled: Arc::new(AtomicBool::new(true)),
            video_enabled: Arc::new(AtomicBool::new(true)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled.load(Ordering::Relaxed)
    }

    pub fn video_enabled(&self) -> bool {
        self.video_enabled.load(Ordering::Relaxed)
    }

    /// Flip the microphone flag; returns the new state.
    pub fn toggle_audio(&self) -> bool {
        !self.audio_enabled.fetch_xor(true, Ordering::Relaxed)
    }

    /// Flip the camera flag; returns the new state.
    pub fn toggle_video(&self) -> bool {
        !self.video_enabled.fetch_xor(true, Ordering::Relaxed)
    }

    /// Flags shared with the capture pipeline: (audio, video, stopped).
    pub fn shared_flags(&self) -> (Arc<AtomicBool>, Arc<AtomicBool>, Arc<AtomicBool>) {
        (
            Arc::clone(&self.audio_enabled),
            Arc::clone(&self.video_enabled),
            Arc::clone(&self.stopped),
        )
    }

    /// Tell the capture pipeline to stop feeding the tracks.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

/// Supplies the local capture handle at join time.
///
/// Acquisition may fail (permission denied, no device); that failure is
/// fatal to joining and is surfaced to the user, never retried automatically.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    async fn acquire(&self) -> Result<MediaSource, MediaError>;
}

/// Default provider: one Opus audio track and one VP8 video track backed by
/// static-sample writers. The capture pipeline pushes samples into them and
/// honors the shared enabled/stopped flags.
pub struct StaticMediaProvider {
    stream_id: String,
}

impl StaticMediaProvider {
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
        }
    }
}

impl Default for StaticMediaProvider {
    fn default() -> Self {
        Self::new("huddle")
    }
}

#[async_trait]
impl MediaProvider for StaticMediaProvider {
    async fn acquire(&self) -> Result<MediaSource, MediaError> {
        let audio = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                ..Default::default()
            },
            "audio".to_owned(),
            self.stream_id.clone(),
        ));
        let video = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                ..Default::default()
            },
            "video".to_owned(),
            self.stream_id.clone(),
        ));
        Ok(MediaSource::new(vec![audio, video]))
    }
}
