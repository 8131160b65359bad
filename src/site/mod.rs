//! Publishing activity entries into the site's HTML document
//!
//! The document is treated as plain text: the entry is spliced in after the
//! container's opening tag and the whole file is written back, conditional
//! on the revision that was read.

pub mod entry;

use async_trait::async_trait;

use crate::error::PublishError;
use crate::models::DisplayFields;

pub use entry::{render_entry, splice_entry};

/// File content together with its revision marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    pub content: String,
    pub sha: String,
}

/// Remote file storage with optimistic concurrency.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read(&self, path: &str) -> Result<RemoteDocument, PublishError>;

    /// Replace `path`, failing with [`PublishError::Conflict`] if it is no
    /// longer at revision `sha`.
    async fn write(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: &str,
    ) -> Result<(), PublishError>;
}

/// Where in the store the entry goes.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub path: &'a str,
    pub marker: &'a str,
}

/// Prepend a log entry for the activity into the target document.
pub async fn publish(
    store: &impl DocumentStore,
    target: Target<'_>,
    fields: &DisplayFields,
    route_svg: Option<&str>,
) -> Result<(), PublishError> {
    let document = store.read(target.path).await?;
    tracing::debug!(
        "Read {} ({} bytes, sha {})",
        target.path,
        document.content.len(),
        document.sha
    );

    let fragment = render_entry(fields, route_svg);
    let updated = splice_entry(&document.content, target.marker, &fragment).ok_or_else(|| {
        PublishError::MissingMarker {
            marker: target.marker.to_string(),
            path: target.path.to_string(),
        }
    })?;

    let message = format!("Add activity log: {}", fields.name);
    store
        .write(target.path, &updated, &message, &document.sha)
        .await?;
    tracing::info!("Committed {} ({})", target.path, message);
    Ok(())
}
