use async_trait::async_trait;
use std::path::Path;

use crate::StageError;

pub mod youtube;

pub use youtube::YtDlpSource;

/// Trait for retrieving media from an external video host.
///
/// The pipeline only needs two things from a host: fetch the best-available
/// encoding of an item to a local path, and tell retrievable failures apart
/// from everything else via [`StageError`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Retrieve the best-available encoding for `source_id` into `dest`.
    ///
    /// Returns [`StageError::SourceUnavailable`] when the host reports the
    /// item cannot be retrieved (removed, private, geo-blocked).
    async fn fetch(&self, source_id: &str, dest: &Path) -> Result<(), StageError>;

    /// Get the name of this platform
    fn platform_name(&self) -> &'static str;
}
