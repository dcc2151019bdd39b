//! In-memory stand-in for a connected SFTP channel, so directory and
//! item semantics are testable without a server.

use std::collections::HashMap;
use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use tokio::io::AsyncWrite;
use url::Url;

use crate::attrs::Attributes;
use crate::channel::{ByteReader, ByteWriter, SftpChannel, WriteMode};
use crate::error::{Error, Result};
use crate::resource::SftpDirectory;

#[derive(Clone, Default)]
struct Entry {
    dir: bool,
    data: Vec<u8>,
    /// When set, the fake server reports no size or timestamps
    hide_attrs: bool,
    mtime: Option<u32>,
    atime: Option<u32>,
}

impl Entry {
    fn attrs(&self) -> Attributes {
        if self.hide_attrs {
            return Attributes {
                is_dir: self.dir,
                ..Attributes::default()
            };
        }
        Attributes {
            size: Some(self.data.len() as u64),
            mtime: self.mtime,
            atime: self.atime,
            permissions: None,
            is_dir: self.dir,
        }
    }
}

#[derive(Default)]
struct State {
    entries: HashMap<String, Entry>,
    list_count: usize,
    stream_count: usize,
    close_count: usize,
    closed: bool,
}

/// Shared fake remote; clones observe the same state.
#[derive(Clone, Default)]
pub(crate) struct MemoryChannel {
    state: Arc<Mutex<State>>,
}

/// Normalizes the paths nodes produce ("." for the root, "./x" below
/// it, "/x" in absolute mode) onto plain storage keys.
fn norm(path: &str) -> String {
    let path = path.strip_prefix("./").unwrap_or(path);
    let path = if path == "." { "" } else { path };
    path.trim_matches('/').to_string()
}

fn parent_of(key: &str) -> &str {
    match key.rfind('/') {
        Some(index) => &key[..index],
        None => "",
    }
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn add_file(&self, path: &str, data: &[u8]) {
        let _ = self.lock().entries.insert(
            norm(path),
            Entry {
                data: data.to_vec(),
                ..Entry::default()
            },
        );
    }

    pub fn add_file_without_size(&self, path: &str) {
        let _ = self.lock().entries.insert(
            norm(path),
            Entry {
                hide_attrs: true,
                ..Entry::default()
            },
        );
    }

    pub fn add_dir(&self, path: &str) {
        let _ = self.lock().entries.insert(
            norm(path),
            Entry {
                dir: true,
                ..Entry::default()
            },
        );
    }

    pub fn remove_entry(&self, path: &str) {
        let _ = self.lock().entries.remove(&norm(path));
    }

    pub fn list_count(&self) -> usize {
        self.lock().list_count
    }

    pub fn stream_count(&self) -> usize {
        self.lock().stream_count
    }

    pub fn close_count(&self) -> usize {
        self.lock().close_count
    }
}

#[async_trait]
impl SftpChannel for MemoryChannel {
    async fn stat(&self, path: &str) -> Result<Option<Attributes>> {
        let key = norm(path);
        let state = self.lock();
        if key.is_empty() {
            // the login directory always exists
            return Ok(Some(Attributes {
                is_dir: true,
                ..Attributes::default()
            }));
        }
        Ok(state.entries.get(&key).map(Entry::attrs))
    }

    async fn list(&self, path: &str) -> Result<Vec<(String, Attributes)>> {
        let key = norm(path);
        let mut state = self.lock();
        if !key.is_empty() && !state.entries.get(&key).is_some_and(|e| e.dir) {
            return Err(Error::Remote(format!("not a directory: {path}")));
        }
        state.list_count += 1;

        let dir_attrs = Attributes {
            is_dir: true,
            ..Attributes::default()
        };
        let mut entries = vec![
            (".".to_string(), dir_attrs.clone()),
            ("..".to_string(), dir_attrs),
        ];
        for (entry_key, entry) in &state.entries {
            if parent_of(entry_key) == key {
                let name = match entry_key.rfind('/') {
                    Some(index) => entry_key[index + 1..].to_string(),
                    None => entry_key.clone(),
                };
                entries.push((name, entry.attrs()));
            }
        }
        Ok(entries)
    }

    async fn get(&self, path: &str) -> Result<ByteReader> {
        let key = norm(path);
        let mut state = self.lock();
        let entry = state
            .entries
            .get(&key)
            .ok_or_else(|| Error::Remote(format!("no such file: {path}")))?
            .clone();
        state.stream_count += 1;
        Ok(Box::new(Cursor::new(entry.data)))
    }

    async fn put(&self, path: &str, mode: WriteMode) -> Result<ByteWriter> {
        let key = norm(path);
        self.lock().stream_count += 1;
        Ok(Box::new(MemoryWriter {
            state: self.state.clone(),
            key,
            append: mode == WriteMode::Append,
            buffer: Vec::new(),
            committed: false,
        }))
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let key = norm(path);
        let mut state = self.lock();
        if state.entries.contains_key(&key) {
            return Err(Error::Remote(format!("already exists: {path}")));
        }
        let _ = state.entries.insert(
            key,
            Entry {
                dir: true,
                ..Entry::default()
            },
        );
        Ok(())
    }

    async fn rmdir(&self, path: &str) -> Result<()> {
        let key = norm(path);
        let mut state = self.lock();
        match state.entries.get(&key) {
            Some(entry) if entry.dir => {
                let _ = state.entries.remove(&key);
                Ok(())
            }
            _ => Err(Error::Remote(format!("no such directory: {path}"))),
        }
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let key = norm(path);
        let mut state = self.lock();
        match state.entries.get(&key) {
            Some(entry) if !entry.dir => {
                let _ = state.entries.remove(&key);
                Ok(())
            }
            _ => Err(Error::Remote(format!("no such file: {path}"))),
        }
    }

    async fn rename(&self, oldpath: &str, newpath: &str) -> Result<()> {
        let old = norm(oldpath);
        let new = norm(newpath);
        let mut state = self.lock();
        if !state.entries.contains_key(&old) {
            return Err(Error::Remote(format!("no such entry: {oldpath}")));
        }

        let prefix = format!("{old}/");
        let moved: Vec<String> = state
            .entries
            .keys()
            .filter(|key| *key == &old || key.starts_with(&prefix))
            .cloned()
            .collect();
        for key in moved {
            if let Some(entry) = state.entries.remove(&key) {
                let renamed = format!("{new}{}", &key[old.len()..]);
                let _ = state.entries.insert(renamed, entry);
            }
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.lock();
        if !state.closed {
            state.closed = true;
            state.close_count += 1;
        }
        Ok(())
    }
}

struct MemoryWriter {
    state: Arc<Mutex<State>>,
    key: String,
    append: bool,
    buffer: Vec<u8>,
    committed: bool,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.buffer.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if !self.committed {
            self.committed = true;
            let buffer = std::mem::take(&mut self.buffer);
            let key = self.key.clone();
            let append = self.append;
            let mut state = match self.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let entry = state.entries.entry(key).or_default();
            if append {
                entry.data.extend_from_slice(&buffer);
            } else {
                entry.data = buffer;
            }
        }
        Poll::Ready(Ok(()))
    }
}

/// Root directory node over the fake remote, relative addressing.
pub(crate) fn root_directory(remote: &MemoryChannel) -> SftpDirectory {
    let uri = Url::parse("sftp://host/").expect("static url");
    SftpDirectory::new(
        Arc::new(remote.clone()),
        uri,
        false,
        None,
        Attributes {
            is_dir: true,
            ..Attributes::default()
        },
    )
}
