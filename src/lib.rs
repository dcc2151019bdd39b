//! Hierarchical resource layer over SFTP.
//!
//! [`resolve`] turns a `sftp://` URL plus credentials into the root
//! node of a remote tree: a [`SftpDirectory`] with a lazily listed,
//! optionally cached child map, or a [`SftpItem`] whose byte streams
//! open on demand. Nothing at the target path resolves to `Ok(None)`
//! rather than an error.
//!
//! The SSH transport and the SFTP wire protocol are carried by
//! `russh` and `russh-sftp`; this crate only layers the resource
//! model on top.

#[macro_use]
extern crate log;
#[macro_use]
extern crate async_trait;

mod attrs;
/// The seam to the remote file-transfer channel
pub mod channel;
mod error;
/// URI to remote path mapping
pub mod path;
/// Connection bootstrap
pub mod resolver;
/// Resource node types
pub mod resource;
#[cfg(test)]
mod test_support;

pub use attrs::Attributes;
pub use error::{Error, Result};
pub use resolver::{resolve, Credentials};
pub use resource::{SftpDirectory, SftpItem, SftpResource, CONTENT_TYPE_DIRECTORY};
