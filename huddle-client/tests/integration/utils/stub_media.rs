use async_trait::async_trait;
use huddle_client::{MediaError, MediaProvider, MediaSource};

/// Media provider with no real tracks; optionally fails like a denied
/// camera/microphone permission.
#[derive(Default)]
pub struct StubMediaProvider {
    deny: bool,
}

impl StubMediaProvider {
    pub fn denied() -> Self {
        Self { deny: true }
    }
}

#[async_trait]
impl MediaProvider for StubMediaProvider {
    async fn acquire(&self) -> Result<MediaSource, MediaError> {
        if self.deny {
            return Err(MediaError::Unavailable("permission denied".to_owned()));
        }
        Ok(MediaSource::new(Vec::new()))
    }
}
