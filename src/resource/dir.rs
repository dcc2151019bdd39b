use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, Weak};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use url::Url;

use super::{rename_node, NodeCore, SftpItem, SftpResource, CONTENT_TYPE_DIRECTORY};
use crate::{
    attrs::Attributes,
    channel::{SftpChannel, WriteMode},
    error::{Error, Result},
    path,
};

pub(crate) struct DirInner {
    pub(crate) core: NodeCore,
    /// `None` until the first listing. Replaced wholesale on reload,
    /// never patched entry by entry
    children: RwLock<Option<HashMap<String, SftpResource>>>,
    /// Serializes reloads so concurrent callers see either the old or
    /// the new map
    load_guard: Mutex<()>,
    caching: AtomicBool,
}

impl DirInner {
    fn map(&self) -> Option<HashMap<String, SftpResource>> {
        match self.children.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn store(&self, map: HashMap<String, SftpResource>) {
        match self.children.write() {
            Ok(mut guard) => *guard = Some(map),
            Err(poisoned) => *poisoned.into_inner() = Some(map),
        }
    }

    /// Moves the cache entry for a child that already renamed itself
    /// remotely. Degrades silently when the map was never loaded or
    /// the old name is unknown.
    pub(crate) fn note_renamed(&self, old_name: &str, new_name: &str) {
        let mut guard = match self.children.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(map) = guard.as_mut() {
            if let Some(node) = map.remove(old_name) {
                let _ = map.insert(new_name.to_string(), node);
            }
        }
    }
}

/// A container node: a lazily listed, optionally cached map of child
/// nodes keyed by base name.
#[derive(Clone)]
pub struct SftpDirectory {
    inner: Arc<DirInner>,
}

impl SftpDirectory {
    pub(crate) fn new(
        channel: Arc<dyn SftpChannel>,
        uri: Url,
        absolute: bool,
        parent: Option<Weak<DirInner>>,
        attrs: Attributes,
    ) -> Self {
        Self {
            inner: Arc::new(DirInner {
                core: NodeCore::new(channel, uri, absolute, parent, attrs),
                children: RwLock::new(None),
                load_guard: Mutex::new(()),
                caching: AtomicBool::new(false),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<DirInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn core(&self) -> &NodeCore {
        &self.inner.core
    }

    pub fn uri(&self) -> Url {
        self.inner.core.uri()
    }

    pub fn name(&self) -> String {
        path::name(&self.remote_path()).to_string()
    }

    pub fn remote_path(&self) -> String {
        self.inner.core.remote_path(true)
    }

    pub fn parent(&self) -> Option<SftpDirectory> {
        self.inner.core.parent()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.inner.core.attrs
    }

    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE_DIRECTORY
    }

    /// This node as a tree handle.
    pub fn as_resource(&self) -> SftpResource {
        SftpResource::Directory(self.clone())
    }

    /// Whether the child map, once loaded, is reused across calls.
    pub fn is_caching(&self) -> bool {
        self.inner.caching.load(Ordering::Relaxed)
    }

    /// Toggles child-map caching. With caching off every access lists
    /// the remote side again.
    pub fn set_caching(&self, caching: bool) {
        self.inner.caching.store(caching, Ordering::Relaxed);
    }

    /// Forces an unconditional reload of the child map, regardless of
    /// the caching flag.
    pub async fn reset_cache(&self) -> Result<()> {
        let _guard = self.inner.load_guard.lock().await;
        let map = self.load_children().await?;
        self.inner.store(map);
        Ok(())
    }

    /// Looks `name` up in the (possibly freshly listed) child map.
    pub async fn child(&self, name: &str) -> Result<Option<SftpResource>> {
        Ok(self.children().await?.get(name).cloned())
    }

    /// Snapshot of the children at the time of the call.
    pub async fn list(&self) -> Result<Vec<SftpResource>> {
        Ok(self.children().await?.into_values().collect())
    }

    /// Creates a child entry. A directory content type maps to a
    /// remote mkdir, anything else to a zero-length overwrite. The
    /// cache reloads afterwards so the new child resolves with a
    /// fresh snapshot.
    pub async fn create(&self, name: &str, content_type: &str) -> Result<SftpResource> {
        let target = format!("{}/{}", self.remote_path(), name);
        if content_type == CONTENT_TYPE_DIRECTORY {
            self.inner.core.channel.mkdir(&target).await?;
        } else {
            let mut writer = self
                .inner
                .core
                .channel
                .put(&target, WriteMode::Overwrite)
                .await?;
            writer.shutdown().await?;
        }

        self.reset_cache().await?;
        self.child(name)
            .await?
            .ok_or_else(|| Error::Remote(format!("created entry {name} is not listed")))
    }

    /// Deletes the child called `name`, dispatching on its node type.
    ///
    /// Resolves against the lazily loaded map without forcing a
    /// reload; an unknown name is a silent no-op (long-standing
    /// behaviour callers rely on). The cache is not updated here, the
    /// next listing reconciles.
    pub async fn delete(&self, name: &str) -> Result<()> {
        match self.child(name).await? {
            Some(SftpResource::Item(item)) => {
                self.inner.core.channel.remove(&item.remote_path()).await
            }
            Some(SftpResource::Directory(dir)) => {
                self.inner.core.channel.rmdir(&dir.remote_path()).await
            }
            None => Ok(()),
        }
    }

    /// Renames this directory in place and moves the parent's cache
    /// entry along.
    pub async fn rename(&self, new_name: &str) -> Result<()> {
        rename_node(&self.inner.core, true, new_name).await
    }

    /// Closes the shared channel and session of the whole tree.
    pub async fn close(&self) -> Result<()> {
        self.inner.core.channel.close().await
    }

    /// Check before and after taking the guard: another caller may
    /// have finished the load while this one waited.
    async fn children(&self) -> Result<HashMap<String, SftpResource>> {
        if self.is_caching() {
            if let Some(map) = self.inner.map() {
                return Ok(map);
            }
        }

        let _guard = self.inner.load_guard.lock().await;
        if self.is_caching() {
            if let Some(map) = self.inner.map() {
                return Ok(map);
            }
        }

        let map = self.load_children().await?;
        self.inner.store(map.clone());
        Ok(map)
    }

    async fn load_children(&self) -> Result<HashMap<String, SftpResource>> {
        let remote_path = self.remote_path();
        let listing = self
            .inner
            .core
            .channel
            .list(&remote_path)
            .await
            .map_err(|err| Error::Listing(format!("{remote_path}: {err}")))?;

        debug!("listed {} entries under {}", listing.len(), remote_path);

        let uri = self.inner.core.uri();
        let absolute = self.inner.core.absolute;
        let parent = Some(Arc::downgrade(&self.inner));
        let mut children = HashMap::with_capacity(listing.len());

        for (file_name, attrs) in listing {
            if file_name == "." || file_name == ".." {
                continue;
            }
            let child_uri = path::child(&uri, &file_name);
            let node = if attrs.is_dir {
                SftpResource::Directory(Self::new(
                    self.inner.core.channel.clone(),
                    child_uri,
                    absolute,
                    parent.clone(),
                    attrs,
                ))
            } else {
                SftpResource::Item(SftpItem::new(
                    self.inner.core.channel.clone(),
                    child_uri,
                    absolute,
                    parent.clone(),
                    attrs,
                ))
            };
            let _ = children.insert(file_name, node);
        }

        Ok(children)
    }
}
