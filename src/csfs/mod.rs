//! Single-file virtual filesystem: a directory hierarchy, its inodes,
//! free lists and users, all stored inside one host file.

pub mod backing;
pub mod dentry;
pub mod errno;
pub mod fs;
pub mod free_list;
pub mod index;
pub mod inode;
pub mod layout;
pub mod path;
pub mod superblock;
pub mod users;


// vim:ts=2 sw=2
