use chrono::{DateTime, Utc};
use russh_sftp::protocol::FileAttributes;

/// Point-in-time capture of a remote entry's attributes.
///
/// Fields the server did not report stay `None`; an absent size or
/// timestamp is never collapsed to zero. A snapshot is taken when the
/// entry is listed or stat'ed and is not refreshed afterwards.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    pub size: Option<u64>,
    /// Last modification time, seconds since the epoch
    pub mtime: Option<u32>,
    /// Last access time, seconds since the epoch
    pub atime: Option<u32>,
    pub permissions: Option<u32>,
    pub is_dir: bool,
}

impl Attributes {
    /// Returns the last modification time, or `None` if the server
    /// did not report one
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.mtime
            .and_then(|secs| DateTime::from_timestamp(i64::from(secs), 0))
    }

    /// Returns the last access time, or `None` if the server did not
    /// report one
    pub fn accessed(&self) -> Option<DateTime<Utc>> {
        self.atime
            .and_then(|secs| DateTime::from_timestamp(i64::from(secs), 0))
    }
}

impl From<&FileAttributes> for Attributes {
    fn from(attrs: &FileAttributes) -> Self {
        Self {
            size: attrs.size,
            mtime: attrs.mtime,
            atime: attrs.atime,
            permissions: attrs.permissions,
            is_dir: attrs.is_dir(),
        }
    }
}
