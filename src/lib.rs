pub mod config;
pub mod csfs;
pub mod util;

pub use crate::config::Config;
pub use crate::csfs::errno::Errno;
pub use crate::csfs::fs::{DirEntry, Filesystem, PermissionMode, Usage};

// vim:ts=2 sw=2
