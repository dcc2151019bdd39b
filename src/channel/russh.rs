use std::sync::atomic::{AtomicBool, Ordering};

use russh::client::{self, Handle};
use russh::Disconnect;
use russh_keys::key;
use russh_sftp::client::error::Error as ClientError;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::{OpenFlags, StatusCode};

use super::{ByteReader, ByteWriter, SftpChannel, WriteMode};
use crate::{attrs::Attributes, error::Result};

/// Transport event handler for the SSH session under the channel.
///
/// Host keys are accepted unconditionally, which matches the
/// historical `StrictHostKeyChecking=no` behaviour of this resolver.
pub(crate) struct ClientHandler;

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        self,
        server_public_key: &key::PublicKey,
    ) -> std::result::Result<(Self, bool), Self::Error> {
        debug!("accepting server key {:?}", server_public_key.name());
        Ok((self, true))
    }
}

/// [`SftpChannel`] over a Russh SSH session carrying the `sftp`
/// subsystem.
pub struct RusshChannel {
    ssh: Handle<ClientHandler>,
    sftp: SftpSession,
    closed: AtomicBool,
}

impl RusshChannel {
    pub(crate) fn new(ssh: Handle<ClientHandler>, sftp: SftpSession) -> Self {
        Self {
            ssh,
            sftp,
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl SftpChannel for RusshChannel {
    async fn stat(&self, path: &str) -> Result<Option<Attributes>> {
        match self.sftp.symlink_metadata(path).await {
            Ok(metadata) => Ok(Some(Attributes::from(&metadata))),
            Err(ClientError::Status(status)) if status.status_code == StatusCode::NoSuchFile => {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn list(&self, path: &str) -> Result<Vec<(String, Attributes)>> {
        let entries = self.sftp.read_dir(path).await?;
        Ok(entries
            .map(|entry| {
                let attrs = Attributes::from(&entry.metadata());
                (entry.file_name(), attrs)
            })
            .collect())
    }

    async fn get(&self, path: &str) -> Result<ByteReader> {
        let file = self.sftp.open(path).await?;
        Ok(Box::new(file))
    }

    async fn put(&self, path: &str, mode: WriteMode) -> Result<ByteWriter> {
        let flags = match mode {
            WriteMode::Overwrite => OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
            WriteMode::Append => OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::APPEND,
        };
        let file = self.sftp.open_with_flags(path, flags).await?;
        Ok(Box::new(file))
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        Ok(self.sftp.create_dir(path).await?)
    }

    async fn rmdir(&self, path: &str) -> Result<()> {
        Ok(self.sftp.remove_dir(path).await?)
    }

    async fn remove(&self, path: &str) -> Result<()> {
        Ok(self.sftp.remove_file(path).await?)
    }

    async fn rename(&self, oldpath: &str, newpath: &str) -> Result<()> {
        Ok(self.sftp.rename(oldpath, newpath).await?)
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.sftp.close().await?;
        self.ssh
            .disconnect(Disconnect::ByApplication, "", "English")
            .await?;

        debug!("channel and session closed");
        Ok(())
    }
}
