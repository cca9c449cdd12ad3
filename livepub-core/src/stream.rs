//! Local media stream handle

use uuid::Uuid;

/// Kind of a media track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    /// Audio track
    Audio,
    /// Video track
    Video,
}

/// One track inside a captured stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTrackInfo {
    /// Track ID assigned by the device layer
    pub id: String,
    /// Track kind
    pub kind: TrackKind,
    /// Device label
    pub label: String,
}

/// Opaque handle to a captured local stream.
///
/// The media itself stays with the device layer; this is what gets passed
/// to the publisher and the preview view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStream {
    id: String,
    tracks: Vec<MediaTrackInfo>,
}

impl MediaStream {
    /// Create a stream with a fresh ID
    pub fn new(tracks: Vec<MediaTrackInfo>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), tracks)
    }

    /// Create a stream with a device-assigned ID
    pub fn with_id(id: impl Into<String>, tracks: Vec<MediaTrackInfo>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    /// Get stream ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get all tracks
    pub fn tracks(&self) -> &[MediaTrackInfo] {
        &self.tracks
    }

    /// Whether the stream carries video
    pub fn has_video(&self) -> bool {
        self.tracks.iter().any(|t| t.kind == TrackKind::Video)
    }

    /// Whether the stream carries audio
    pub fn has_audio(&self) -> bool {
        self.tracks.iter().any(|t| t.kind == TrackKind::Audio)
    }
}
