//! Answer media archival.
//!
//! Audio/video blobs from the multipart answer endpoint are copied to object
//! storage for later review. Archival is best-effort: the answer text is
//! authoritative, so an upload failure never fails the turn.

use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    fn file_name(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio.webm",
            MediaKind::Video => "video.webm",
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio/webm",
            MediaKind::Video => "video/webm",
        }
    }
}

#[derive(Clone)]
pub struct MediaArchive {
    s3: aws_sdk_s3::Client,
    bucket: String,
}

impl MediaArchive {
    pub fn new(s3: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { s3, bucket }
    }

    /// Uploads one answer blob and returns its object key. The key is stored
    /// on the turn, so the session document is the source of association.
    pub async fn archive(
        &self,
        session_id: Uuid,
        kind: MediaKind,
        data: Bytes,
    ) -> Result<String> {
        let key = format!(
            "interviews/{session_id}/{}/{}",
            Uuid::new_v4(),
            kind.file_name()
        );

        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(kind.content_type())
            .body(ByteStream::from(data))
            .send()
            .await
            .with_context(|| format!("failed to upload {key}"))?;

        Ok(key)
    }
}
