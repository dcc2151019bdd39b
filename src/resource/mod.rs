//! Resource nodes of a resolved remote hierarchy.
//!
//! A tree starts at the node produced by [`resolve`] and fans out
//! through [`SftpDirectory`] listings. All nodes of one tree share one
//! channel; closing any node closes them all.
//!
//! [`resolve`]: crate::resolver::resolve

mod dir;
mod item;

pub use dir::SftpDirectory;
pub use item::SftpItem;

use std::sync::{Arc, RwLock, Weak};

use url::Url;

use crate::{attrs::Attributes, channel::SftpChannel, error::Result, path};

use self::dir::DirInner;

/// Content type reported by directory nodes.
pub const CONTENT_TYPE_DIRECTORY: &str = "inode/directory";

/// State every node carries, directory and item alike.
pub(crate) struct NodeCore {
    pub(crate) channel: Arc<dyn SftpChannel>,
    /// Mutated exactly once per successful rename, otherwise fixed
    uri: RwLock<Url>,
    /// Inherited from the root, never re-derived
    pub(crate) absolute: bool,
    /// Non-owning, used only to propagate renames into the parent's
    /// cache
    pub(crate) parent: Option<Weak<DirInner>>,
    pub(crate) attrs: Attributes,
}

impl NodeCore {
    pub(crate) fn new(
        channel: Arc<dyn SftpChannel>,
        uri: Url,
        absolute: bool,
        parent: Option<Weak<DirInner>>,
        attrs: Attributes,
    ) -> Self {
        Self {
            channel,
            uri: RwLock::new(uri),
            absolute,
            parent,
            attrs,
        }
    }

    pub(crate) fn uri(&self) -> Url {
        match self.uri.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_uri(&self, uri: Url) {
        match self.uri.write() {
            Ok(mut guard) => *guard = uri,
            Err(poisoned) => *poisoned.into_inner() = uri,
        }
    }

    pub(crate) fn remote_path(&self, container: bool) -> String {
        path::remote_path(self.uri().path(), self.absolute, container)
    }

    pub(crate) fn parent(&self) -> Option<SftpDirectory> {
        self.parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(SftpDirectory::from_inner)
    }
}

/// Renames the node addressed by `core` to a sibling with `new_name`.
///
/// The remote rename happens first; only on success does the URI swap
/// in place and the parent's cache entry move. A failed call leaves
/// the node exactly as it was.
pub(crate) async fn rename_node(core: &NodeCore, container: bool, new_name: &str) -> Result<()> {
    let uri = core.uri();
    let new_uri = path::sibling(&uri, new_name);
    let old_path = path::remote_path(uri.path(), core.absolute, container);
    let new_path = path::remote_path(new_uri.path(), core.absolute, container);
    let old_name = path::name(&old_path).to_string();

    core.channel.rename(&old_path, &new_path).await?;

    core.set_uri(new_uri);
    if let Some(parent) = core.parent.as_ref().and_then(Weak::upgrade) {
        parent.note_renamed(&old_name, new_name);
    }
    Ok(())
}

/// An addressable entity in the resolved remote hierarchy.
///
/// Clones are cheap handles onto the same node.
#[derive(Clone)]
pub enum SftpResource {
    Directory(SftpDirectory),
    Item(SftpItem),
}

impl SftpResource {
    fn core(&self) -> &NodeCore {
        match self {
            Self::Directory(dir) => dir.core(),
            Self::Item(item) => item.core(),
        }
    }

    /// Node identity. Credentials never appear here.
    pub fn uri(&self) -> Url {
        self.core().uri()
    }

    /// Base name of the node's remote path.
    pub fn name(&self) -> String {
        path::name(&self.remote_path()).to_string()
    }

    /// The path string sent to the remote protocol for this node.
    pub fn remote_path(&self) -> String {
        self.core().remote_path(self.is_directory())
    }

    pub fn parent(&self) -> Option<SftpDirectory> {
        self.core().parent()
    }

    /// The attribute snapshot taken when this node was listed.
    pub fn attributes(&self) -> &Attributes {
        &self.core().attrs
    }

    pub fn content_type(&self) -> Option<String> {
        match self {
            Self::Directory(_) => Some(CONTENT_TYPE_DIRECTORY.to_string()),
            Self::Item(item) => item.content_type(),
        }
    }

    pub const fn is_directory(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    pub const fn as_directory(&self) -> Option<&SftpDirectory> {
        match self {
            Self::Directory(dir) => Some(dir),
            Self::Item(_) => None,
        }
    }

    pub const fn as_item(&self) -> Option<&SftpItem> {
        match self {
            Self::Item(item) => Some(item),
            Self::Directory(_) => None,
        }
    }

    /// Renames this node in place; see [`SftpDirectory::rename`] and
    /// [`SftpItem::rename`].
    pub async fn rename(&self, new_name: &str) -> Result<()> {
        rename_node(self.core(), self.is_directory(), new_name).await
    }

    /// Closes the shared channel and session of the whole tree this
    /// node belongs to, not just this node.
    pub async fn close(&self) -> Result<()> {
        self.core().channel.close().await
    }
}
