use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use url::Url;

use super::{dir::DirInner, rename_node, NodeCore, SftpDirectory, SftpResource};
use crate::{
    attrs::Attributes,
    channel::{ByteReader, ByteWriter, SftpChannel, WriteMode},
    error::Result,
    path,
};

/// A leaf node: metadata from its listing snapshot, byte streams on
/// demand.
///
/// Streams are never cached; every acquisition opens a fresh one on
/// the shared channel.
#[derive(Clone)]
pub struct SftpItem {
    inner: Arc<NodeCore>,
}

impl SftpItem {
    pub(crate) fn new(
        channel: Arc<dyn SftpChannel>,
        uri: Url,
        absolute: bool,
        parent: Option<Weak<DirInner>>,
        attrs: Attributes,
    ) -> Self {
        Self {
            inner: Arc::new(NodeCore::new(channel, uri, absolute, parent, attrs)),
        }
    }

    pub(crate) fn core(&self) -> &NodeCore {
        &self.inner
    }

    pub fn uri(&self) -> Url {
        self.inner.uri()
    }

    pub fn name(&self) -> String {
        path::name(&self.remote_path()).to_string()
    }

    pub fn remote_path(&self) -> String {
        self.inner.remote_path(false)
    }

    pub fn parent(&self) -> Option<SftpDirectory> {
        self.inner.parent()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.inner.attrs
    }

    /// This node as a tree handle.
    pub fn as_resource(&self) -> SftpResource {
        SftpResource::Item(self.clone())
    }

    /// Guessed from the file name alone, never from remote content.
    pub fn content_type(&self) -> Option<String> {
        mime_guess::from_path(self.name())
            .first()
            .map(|mime| mime.essence_str().to_string())
    }

    /// Size from the listing snapshot, `None` when the server did not
    /// report one. Distinct from a reported zero length.
    pub fn size(&self) -> Option<u64> {
        self.inner.attrs.size
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.inner.attrs.modified()
    }

    pub fn accessed(&self) -> Option<DateTime<Utc>> {
        self.inner.attrs.accessed()
    }

    /// Opens a fresh read stream on this item's remote path.
    pub async fn reader(&self) -> Result<ByteReader> {
        self.inner.channel.get(&self.remote_path()).await
    }

    /// Opens a fresh write stream, truncating the remote content.
    pub async fn writer(&self) -> Result<ByteWriter> {
        self.inner
            .channel
            .put(&self.remote_path(), WriteMode::Overwrite)
            .await
    }

    /// Opens a fresh write stream past the current remote content.
    pub async fn appender(&self) -> Result<ByteWriter> {
        self.inner
            .channel
            .put(&self.remote_path(), WriteMode::Append)
            .await
    }

    /// Renames this item in place and moves the parent's cache entry
    /// along.
    pub async fn rename(&self, new_name: &str) -> Result<()> {
        rename_node(&self.inner, false, new_name).await
    }

    /// Closes the shared channel and session of the whole tree.
    pub async fn close(&self) -> Result<()> {
        self.inner.channel.close().await
    }
}
