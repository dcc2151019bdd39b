//! The remote-operation seam between resource nodes and the SFTP
//! subsystem.
//!
//! Every node of one resolved tree shares a single channel; closing it
//! through any node tears the whole tree's connection down.

mod russh;

pub use self::russh::RusshChannel;
pub(crate) use self::russh::ClientHandler;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::{attrs::Attributes, error::Result};

/// Read half of a freshly opened remote stream.
pub type ByteReader = Box<dyn AsyncRead + Send + Unpin>;
/// Write half of a freshly opened remote stream.
pub type ByteWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// How [`SftpChannel::put`] opens its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate the target, creating it when absent
    Overwrite,
    /// Keep existing content and write past its end
    Append,
}

/// Operations the resource layer needs from a connected file-transfer
/// channel.
///
/// The channel serializes its own remote calls; callers get no
/// ordering promise beyond that. Implementations must make [`close`]
/// safe to call more than once.
///
/// [`close`]: SftpChannel::close
#[async_trait]
pub trait SftpChannel: Send + Sync {
    /// Stats `path`. `Ok(None)` when the remote reports no such file,
    /// which is an answer, not an error.
    async fn stat(&self, path: &str) -> Result<Option<Attributes>>;

    /// Raw listing of the entries under `path`. May include the
    /// current and parent self-references.
    async fn list(&self, path: &str) -> Result<Vec<(String, Attributes)>>;

    /// Opens a fresh read stream on `path`.
    async fn get(&self, path: &str) -> Result<ByteReader>;

    /// Opens a fresh write stream on `path`.
    async fn put(&self, path: &str, mode: WriteMode) -> Result<ByteWriter>;

    async fn mkdir(&self, path: &str) -> Result<()>;

    async fn rmdir(&self, path: &str) -> Result<()>;

    async fn remove(&self, path: &str) -> Result<()>;

    async fn rename(&self, oldpath: &str, newpath: &str) -> Result<()>;

    /// Tears down the channel and disconnects the session it rides on.
    async fn close(&self) -> Result<()>;
}
