use fancy_regex::Regex;

use super::dentry::DirectoryTree;
use super::errno::Errno;
use super::layout::{InodeNumber, MAX_NAME_LEN, ROOT_INODE_NUMBER};

/// Characters that may not appear in an object name, control characters
/// included
const RESERVED_CHARACTERS: &str = r##"[\x00-\x1f \\/,*'"#\[\]]"##;

/// Walk `tree` from root (leading `/`) or from `base`.
///
/// A single trailing slash is ignored, `.` and `..` step in place and up.
pub fn resolve(tree: &DirectoryTree, pathname: &str, base: InodeNumber) -> Result<InodeNumber, Errno> {
  // Guard for empty or blank path
  if pathname.is_empty() {
    return Err(Errno::InvalidPath("path: zero-length path"));
  }
  if pathname.contains(' ') {
    return Err(Errno::InvalidPath("path: blank in path"));
  }

  // Base case: root directory
  if pathname == "/" {
    return Ok(ROOT_INODE_NUMBER);
  }

  let pathname = pathname.strip_suffix('/').unwrap_or(pathname);
  let (mut current, relative) = match pathname.strip_prefix('/') {
    Some(relative) => (ROOT_INODE_NUMBER, relative),
    None => (base, pathname),
  };

  for component in relative.split('/') {
    current = match component {
      "" => return Err(Errno::InvalidPath("path: empty component")),
      "." => current,
      ".." => tree.parent_of(current)?,
      name => tree
        .lookup(current, name)
        .ok_or(Errno::InvalidPath("path: no such file or directory"))?,
    };
  }

  Ok(current)
}

/// Split off the last component: `"docs/a.txt"` gives
/// `(Some("docs"), "a.txt")`, `"/a"` gives `(Some("/"), "a")`, `"a"`
/// gives `(None, "a")`.
pub fn split_last(pathname: &str) -> Result<(Option<&str>, &str), Errno> {
  let trimmed = match pathname {
    "/" => pathname,
    _ => pathname.strip_suffix('/').unwrap_or(pathname),
  };

  let (directory, name) = match trimmed.rsplit_once('/') {
    Some(("", name)) => (Some("/"), name),
    Some((directory, name)) => (Some(directory), name),
    None => (None, trimmed),
  };

  // Guard for missing final component
  if name.is_empty() {
    return Err(Errno::InvalidPath("path: missing final component"));
  }

  Ok((directory, name))
}

/// Object names are 1..=64 bytes, not `.`/`..`, and avoid the reserved
/// characters.
pub fn validate_name(name: &str) -> Result<(), Errno> {
  if name.is_empty() || name.len() > MAX_NAME_LEN {
    return Err(Errno::InvalidArgument("path: name must be 1-64 bytes"));
  }
  if name == "." || name == ".." {
    return Err(Errno::InvalidArgument("path: '.' and '..' are reserved"));
  }

  let reserved = Regex::new(RESERVED_CHARACTERS)
    .map_err(|_| Errno::InvalidArgument("path: bad reserved set"))?;
  if reserved.is_match(name).unwrap_or(true) {
    return Err(Errno::InvalidArgument("path: name contains a reserved character"));
  }

  Ok(())
}


// vim:ts=2 sw=2
