use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use itertools::Itertools;
use log::{debug, info};

use crate::util::Timestamp;

use super::backing::BackingStore;
use super::dentry::DirectoryTree;
use super::errno::Errno;
use super::inode::{FileType, INode};
use super::layout::*;
use super::path::{resolve, split_last, validate_name};
use super::superblock::Superblock;

/// Access granted by a permission change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionMode {
  None,
  ReadOnly,
  ReadWrite,
}

impl FromStr for PermissionMode {
  type Err = Errno;

  /// `00`, `10` or `11`: read bit then write bit
  fn from_str(code: &str) -> Result<Self, Self::Err> {
    match code {
      "00" => Ok(PermissionMode::None),
      "10" => Ok(PermissionMode::ReadOnly),
      "11" => Ok(PermissionMode::ReadWrite),
      _ => Err(Errno::InvalidArgument("fs: permission code must be 00, 10 or 11")),
    }
  }
}

/// One line of a detailed listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
  pub number: InodeNumber,
  pub file_type: FileType,
  pub permissions: String,
  pub size: u32,
  pub modified: Timestamp,
  pub name: String,
}

impl DirEntry {
  /// Directories render bracketed
  pub fn display_name(&self) -> String {
    match self.file_type {
      FileType::Directory => format!("[{}]", self.name),
      FileType::File => self.name.clone(),
    }
  }
}

impl fmt::Display for DirEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {:>6} {} {}", self.permissions, self.size, self.modified, self.display_name())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
  pub used_blocks: usize,
  pub total_blocks: usize,
  pub used_inodes: usize,
  pub total_inodes: usize,
  pub used_index: usize,
  pub total_index: usize,
  pub users: usize,
  pub max_users: usize,
  pub last_mount: Timestamp,
  pub last_modified: Timestamp,
}

impl fmt::Display for Usage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "blocks    {:>5} / {}", self.used_blocks, self.total_blocks)?;
    writeln!(f, "inodes    {:>5} / {}", self.used_inodes, self.total_inodes)?;
    writeln!(f, "index     {:>5} / {}", self.used_index, self.total_index)?;
    writeln!(f, "users     {:>5} / {}", self.users, self.max_users)?;
    writeln!(f, "mounted   {}", self.last_mount)?;
    write!(f, "modified  {}", self.last_modified)
  }
}

/// A mounted image: backing file, superblock, directory tree, and the
/// session state (current directory and acting user).
#[derive(Debug)]
pub struct Filesystem {
  store: BackingStore,
  superblock: Superblock,
  tree: DirectoryTree,
  cwd: InodeNumber,
  user: UserIndex,
}

impl Filesystem {
  /// Format `realpath` as an empty filesystem and mount it
  pub fn mkfs(realpath: &Path) -> Result<Self, Errno> {
    let mut store = BackingStore::create(realpath)?;
    let superblock = Superblock::initialize_empty(&mut store)?;

    Self::assemble(store, superblock)
  }

  pub fn mount(realpath: &Path) -> Result<Self, Errno> {
    let mut store = BackingStore::open(realpath)?;
    let superblock = Superblock::load(&mut store)?;

    Self::assemble(store, superblock)
  }

  fn assemble(store: BackingStore, superblock: Superblock) -> Result<Self, Errno> {
    let tree = DirectoryTree::rebuild(&superblock.inodes)?;

    Ok(Self {
      store,
      superblock,
      tree,
      cwd: ROOT_INODE_NUMBER,
      user: ADMIN_INDEX,
    })
  }

  pub fn superblock(&self) -> &Superblock {
    &self.superblock
  }

  pub fn tree(&self) -> &DirectoryTree {
    &self.tree
  }

  pub fn inode(&self, number: InodeNumber) -> Result<&INode, Errno> {
    self.superblock.inode(number)
  }

  pub fn cwd(&self) -> InodeNumber {
    self.cwd
  }

  pub fn resolve_absolute(&self, pathname: &str) -> Result<InodeNumber, Errno> {
    // Guard for relative path
    if !pathname.starts_with('/') {
      return Err(Errno::InvalidPath("fs: path must start with '/'"));
    }

    resolve(&self.tree, pathname, ROOT_INODE_NUMBER)
  }

  pub fn resolve_relative(&self, pathname: &str) -> Result<InodeNumber, Errno> {
    resolve(&self.tree, pathname, self.cwd)
  }

  fn require_read(&self, number: InodeNumber, context: &'static str) -> Result<&INode, Errno> {
    let inode = self.superblock.inode(number)?;
    match inode.has_read(self.user) {
      true => Ok(inode),
      false => Err(Errno::PermissionDenied(context)),
    }
  }

  fn require_write(&self, number: InodeNumber, context: &'static str) -> Result<&INode, Errno> {
    let inode = self.superblock.inode(number)?;
    match inode.has_write(self.user) {
      true => Ok(inode),
      false => Err(Errno::PermissionDenied(context)),
    }
  }

  fn require_directory(&self, number: InodeNumber) -> Result<(), Errno> {
    match self.tree.is_dir(number) {
      true => Ok(()),
      false => Err(Errno::InvalidArgument("fs: not a directory")),
    }
  }

  fn require_file(&self, number: InodeNumber) -> Result<(), Errno> {
    match self.tree.is_dir(number) {
      true => Err(Errno::InvalidArgument("fs: is a directory")),
      false => Ok(()),
    }
  }

  fn flush_inode(&mut self, number: InodeNumber) -> Result<(), Errno> {
    self.superblock.inode(number)?.write_to(&mut self.store)
  }

  /// Both allocation lists, then the superblock counting them
  fn flush_free_lists(&mut self) -> Result<(), Errno> {
    self.superblock.write_block_list(&mut self.store)?;
    self.superblock.write_inode_list(&mut self.store)?;
    self.superblock.write_superblock(&mut self.store)
  }

  /// Attach `child` under `parent` as `name`. Every parent/child change
  /// goes through `link`, `unlink` or `rename_entry` so the inode and the
  /// tree agree.
  fn link(&mut self, parent: InodeNumber, child: InodeNumber, name: &str) -> Result<(), Errno> {
    self.tree.insert(parent, child, name)?;

    let inode = self.superblock.inode_mut(child)?;
    inode.parent = parent;
    inode.name = name.to_owned();

    Ok(())
  }

  fn unlink(&mut self, child: InodeNumber) -> Result<InodeNumber, Errno> {
    let parent = self.superblock.inode(child)?.parent;
    self.tree.remove(parent, child)?;

    Ok(parent)
  }

  fn rename_entry(&mut self, child: InodeNumber, name: &str) -> Result<(), Errno> {
    let parent = self.superblock.inode(child)?.parent;
    self.tree.rename(parent, child, name)?;
    self.superblock.inode_mut(child)?.name = name.to_owned();

    Ok(())
  }

  pub fn list_directory(&self, pathname: Option<&str>) -> Result<Vec<String>, Errno> {
    Ok(self.list_directory_detailed(pathname)?
      .iter()
      .map(DirEntry::display_name)
      .collect())
  }

  /// Entries of `pathname` (or the current directory), directories first
  pub fn list_directory_detailed(&self, pathname: Option<&str>) -> Result<Vec<DirEntry>, Errno> {
    let directory = match pathname {
      Some(pathname) => self.resolve_relative(pathname)?,
      None => self.cwd,
    };
    self.require_directory(directory)?;

    let entries = self.tree
      .entries(directory)?
      .into_iter()
      .map(|(number, name)| -> Result<DirEntry, Errno> {
        let inode = self.superblock.inode(number)?;
        Ok(DirEntry {
          number,
          file_type: inode.file_type,
          permissions: inode.permission_string(self.user),
          size: inode.size,
          modified: inode.mtime,
          name,
        })
      })
      .collect::<Result<Vec<DirEntry>, Errno>>()?;

    Ok(entries
      .into_iter()
      .sorted_by_key(|entry| entry.file_type != FileType::Directory)
      .collect())
  }

  /// Parent directory and new name for `pathname`, checked for
  /// permission and collisions
  fn prepare_create(&self, pathname: &str) -> Result<(InodeNumber, String), Errno> {
    let (directory, name) = split_last(pathname)?;
    let parent = match directory {
      Some(directory) => self.resolve_relative(directory)?,
      None => self.cwd,
    };

    // Guard for file in the middle of the path
    if !self.tree.is_dir(parent) {
      return Err(Errno::InvalidPath("fs: parent is not a directory"));
    }
    validate_name(name)?;
    self.require_write(parent, "fs: no write permission on parent directory")?;
    if self.tree.contains_name(parent, name) {
      return Err(Errno::AlreadyExists("fs: name already exists"));
    }

    Ok((parent, name.to_owned()))
  }

  fn create(&mut self, parent: InodeNumber, name: &str, file_type: FileType) -> Result<InodeNumber, Errno> {
    let number = self.superblock.fetch_inode()?;
    let user = self.user;

    let inode = self.superblock.inode_mut(number)?;
    inode.file_type = file_type;
    inode.grant_read(&[user]);
    inode.grant_write(&[user]);
    inode.stamp_created();

    if file_type == FileType::Directory {
      self.tree.add_directory(number, parent);
    }
    self.link(parent, number, name)?;

    self.flush_inode(number)?;
    self.superblock.write_inode_list(&mut self.store)?;
    self.superblock.write_superblock(&mut self.store)?;

    debug!("fs: created {file_type:?} '{name}' as inode #{number} under #{parent}");
    Ok(number)
  }

  /// Validate every path, then create them all
  fn create_batch(&mut self, pathnames: &[&str], file_type: FileType) -> Result<Vec<InodeNumber>, Errno> {
    let prepared = pathnames
      .iter()
      .map(|pathname| self.prepare_create(pathname))
      .collect::<Result<Vec<(InodeNumber, String)>, Errno>>()?;

    // Guard for the same name twice in one batch
    if !prepared.iter().all_unique() {
      return Err(Errno::AlreadyExists("fs: name repeated in batch"));
    }
    if prepared.len() > self.superblock.free_inodes() {
      return Err(Errno::ResourceExhausted("fs: not enough free inodes"));
    }

    let mut created = Vec::with_capacity(prepared.len());
    for (parent, name) in prepared {
      created.push(self.create(parent, &name, file_type)?);
    }

    Ok(created)
  }

  pub fn create_file(&mut self, pathname: &str) -> Result<InodeNumber, Errno> {
    let (parent, name) = self.prepare_create(pathname)?;
    self.create(parent, &name, FileType::File)
  }

  pub fn create_files(&mut self, pathnames: &[&str]) -> Result<Vec<InodeNumber>, Errno> {
    self.create_batch(pathnames, FileType::File)
  }

  pub fn create_directory(&mut self, pathname: &str) -> Result<InodeNumber, Errno> {
    let (parent, name) = self.prepare_create(pathname)?;
    self.create(parent, &name, FileType::Directory)
  }

  pub fn create_directories(&mut self, pathnames: &[&str]) -> Result<Vec<InodeNumber>, Errno> {
    self.create_batch(pathnames, FileType::Directory)
  }

  fn prepare_remove(&self, number: InodeNumber) -> Result<(), Errno> {
    // Guard for root
    if number == ROOT_INODE_NUMBER {
      return Err(Errno::InvalidArgument("fs: cannot remove root"));
    }

    let parent = self.superblock.inode(number)?.parent;
    self.require_write(parent, "fs: no write permission on parent directory")?;

    Ok(())
  }

  /// Drop `number` from the tree and give back its blocks and inode slot
  fn destroy(&mut self, number: InodeNumber) -> Result<(), Errno> {
    self.unlink(number)?;
    if self.tree.is_dir(number) {
      self.tree.remove_directory(number);
    }
    self.superblock.release_data_blocks(number)?;
    self.superblock.release_inode(number)?;

    Ok(())
  }

  fn fall_back_to_root(&mut self) {
    if !self.superblock.inodes.contains_key(&self.cwd) {
      self.cwd = ROOT_INODE_NUMBER;
    }
  }

  pub fn remove(&mut self, pathname: &str) -> Result<(), Errno> {
    let number = self.resolve_relative(pathname)?;
    self.prepare_remove(number)?;

    // Guard for populated directory
    if !self.tree.is_empty(number) {
      return Err(Errno::NotEmpty("fs: directory is not empty"));
    }

    self.destroy(number)?;
    self.flush_free_lists()?;
    self.fall_back_to_root();

    debug!("fs: removed inode #{number}");
    Ok(())
  }

  /// Remove `pathname` and everything below it. The acting user needs
  /// write permission on every member; nothing is touched otherwise.
  pub fn remove_recursive(&mut self, pathname: &str) -> Result<(), Errno> {
    let number = self.resolve_relative(pathname)?;
    self.prepare_remove(number)?;

    let mut subtree = Vec::new();
    let mut queue = VecDeque::from([number]);
    while let Some(current) = queue.pop_front() {
      self.require_write(current, "fs: no write permission inside subtree")?;
      subtree.push(current);

      if self.tree.is_dir(current) {
        queue.extend(self.tree.dentry(current)?.children.iter().copied());
      }
    }

    // Leaves first so every parent still has its dentry
    for &member in subtree.iter().rev() {
      self.destroy(member)?;
    }
    self.flush_free_lists()?;
    self.fall_back_to_root();

    debug!("fs: removed {} inodes under #{number}", subtree.len());
    Ok(())
  }

  pub fn change_directory(&mut self, pathname: &str) -> Result<(), Errno> {
    let number = self.resolve_relative(pathname)?;
    self.require_directory(number)?;
    self.require_read(number, "fs: no read permission on directory")?;

    self.cwd = number;
    Ok(())
  }

  /// Replace the content of file `number`. Capacity is checked before
  /// its old blocks are released.
  fn store_content(&mut self, number: InodeNumber, data: &[u8]) -> Result<(), Errno> {
    // Guard for content beyond the direct pointers
    if data.len() >= MAX_FILE_SIZE {
      return Err(Errno::UnsupportedOperation("fs: file must be smaller than 65536 bytes"));
    }

    let needed = blocks_for(data.len());
    let held = self.superblock.inode(number)?.data_blocks().len();
    if needed > self.superblock.free_blocks() + held {
      return Err(Errno::ResourceExhausted("fs: not enough free data blocks"));
    }

    self.superblock.release_data_blocks(number)?;
    let blocks = self.superblock.fetch_data_blocks(needed)?;

    let inode = self.superblock.inode_mut(number)?;
    inode.set_data_blocks(&blocks);
    inode.size = data.len() as u32;
    inode.stamp_modified();

    let inode = self.superblock.inode(number)?;
    inode.write_data(&mut self.store, data)?;
    inode.write_to(&mut self.store)?;
    self.superblock.write_block_list(&mut self.store)?;
    self.superblock.write_superblock(&mut self.store)?;

    debug!("fs: stored {} bytes in inode #{number} ({blocks:?})", data.len());
    Ok(())
  }

  /// Copy a host file into the current directory under its own name,
  /// overwriting a same-named file
  pub fn import_file(&mut self, host_path: &Path) -> Result<InodeNumber, Errno> {
    let name = host_path
      .file_name()
      .and_then(|name| name.to_str())
      .ok_or(Errno::InvalidArgument("fs: host path has no usable file name"))?;
    validate_name(name)?;

    // Guard for oversized host file, before loading it
    if fs::metadata(host_path)?.len() >= MAX_FILE_SIZE as u64 {
      return Err(Errno::UnsupportedOperation("fs: file must be smaller than 65536 bytes"));
    }
    let data = fs::read(host_path)?;
    if data.len() >= MAX_FILE_SIZE {
      return Err(Errno::UnsupportedOperation("fs: file must be smaller than 65536 bytes"));
    }

    let number = match self.tree.lookup(self.cwd, name) {
      Some(existing) => {
        // Guard for directory in the way
        if self.tree.is_dir(existing) {
          return Err(Errno::AlreadyExists("fs: a directory with that name exists"));
        }
        self.require_write(existing, "fs: no write permission on file")?;
        self.store_content(existing, &data)?;
        existing
      }
      None => {
        if blocks_for(data.len()) > self.superblock.free_blocks() {
          return Err(Errno::ResourceExhausted("fs: not enough free data blocks"));
        }
        let (parent, name) = self.prepare_create(name)?;
        let number = self.create(parent, &name, FileType::File)?;
        if !data.is_empty() {
          self.store_content(number, &data)?;
        }
        number
      }
    };

    info!("fs: imported {} ({} bytes) as inode #{number}", host_path.display(), data.len());
    Ok(number)
  }

  /// Write a file out to `host_dir` under its own name; returns the host
  /// path written
  pub fn export_file(&mut self, pathname: &str, host_dir: &Path) -> Result<PathBuf, Errno> {
    let number = self.resolve_relative(pathname)?;

    // Guard for directory
    if self.tree.is_dir(number) {
      return Err(Errno::UnsupportedOperation("fs: cannot export a directory"));
    }
    self.require_read(number, "fs: no read permission on file")?;
    let inode = self.require_write(number, "fs: no write permission on file")?;

    let target = host_dir.join(&inode.name);
    if target.exists() {
      return Err(Errno::AlreadyExists("fs: host file already exists"));
    }

    let data = self.superblock.inode(number)?.read_data(&mut self.store)?;
    fs::write(&target, &data)?;

    info!("fs: exported inode #{number} to {}", target.display());
    Ok(target)
  }

  /// Replace the whole content of an existing file
  pub fn write_file(&mut self, pathname: &str, data: &[u8]) -> Result<(), Errno> {
    let number = self.resolve_relative(pathname)?;
    self.require_file(number)?;
    self.require_write(number, "fs: no write permission on file")?;

    self.store_content(number, data)
  }

  /// Move `source` into the directory `destination`, or rename it in
  /// place when `destination` does not exist yet
  pub fn move_entry(&mut self, source: &str, destination: &str) -> Result<(), Errno> {
    let number = self.resolve_relative(source)?;

    // Guard for root
    if number == ROOT_INODE_NUMBER {
      return Err(Errno::InvalidArgument("fs: cannot move root"));
    }
    let parent = self.superblock.inode(number)?.parent;
    self.require_write(parent, "fs: no write permission on source directory")?;
    self.require_write(number, "fs: no write permission on source")?;

    match self.resolve_relative(destination) {
      Ok(target) if self.tree.is_dir(target) => {
        if self.tree.is_ancestor(number, target) {
          return Err(Errno::InvalidArgument("fs: cannot move a directory into itself"));
        }
        self.require_write(target, "fs: no write permission on destination")?;

        let name = self.superblock.inode(number)?.name.clone();
        if self.tree.contains_name(target, &name) {
          return Err(Errno::AlreadyExists("fs: name already exists at destination"));
        }

        self.unlink(number)?;
        self.link(target, number, &name)?;
      }
      Ok(_) => return Err(Errno::AlreadyExists("fs: destination is an existing file")),
      Err(Errno::InvalidPath(_)) => {
        let (directory, name) = split_last(destination)?;
        if let Some(directory) = directory {
          // Guard for rename into another directory
          if self.resolve_relative(directory)? != parent {
            return Err(Errno::InvalidPath("fs: no such destination directory"));
          }
        }
        validate_name(name)?;
        self.rename_entry(number, name)?;
      }
      Err(errno) => return Err(errno),
    }

    self.superblock.inode_mut(number)?.stamp_modified();
    self.flush_inode(number)?;

    debug!("fs: moved '{source}' to '{destination}'");
    Ok(())
  }

  /// Copy file `source` into directory `destination` under the same name
  pub fn copy(&mut self, source: &str, destination: &str) -> Result<InodeNumber, Errno> {
    let number = self.resolve_relative(source)?;

    // Guard for directory
    if self.tree.is_dir(number) {
      return Err(Errno::UnsupportedOperation("fs: cannot copy a directory"));
    }
    let original = self.require_read(number, "fs: no read permission on source")?.clone();

    let target = self.resolve_relative(destination)?;
    self.require_directory(target)?;
    self.require_write(target, "fs: no write permission on destination")?;
    if self.tree.contains_name(target, &original.name) {
      return Err(Errno::AlreadyExists("fs: name already exists at destination"));
    }

    // Guard for capacity, before anything is allocated
    if self.superblock.free_inodes() == 0 {
      return Err(Errno::ResourceExhausted("fs: no free inode"));
    }
    if original.data_blocks().len() > self.superblock.free_blocks() {
      return Err(Errno::ResourceExhausted("fs: not enough free data blocks"));
    }

    let data = original.read_data(&mut self.store)?;
    let copy = self.create(target, &original.name, FileType::File)?;

    let inode = self.superblock.inode_mut(copy)?;
    inode.read_mask |= original.read_mask;
    inode.write_mask |= original.write_mask;
    inode.edit_flag = original.edit_flag;
    self.store_content(copy, &data)?;

    debug!("fs: copied inode #{number} to #{copy}");
    Ok(copy)
  }

  /// Content of every file in `pathnames`, all checked before any is read
  pub fn read_files(&mut self, pathnames: &[&str]) -> Result<Vec<Vec<u8>>, Errno> {
    let numbers = pathnames
      .iter()
      .map(|pathname| -> Result<InodeNumber, Errno> {
        let number = self.resolve_relative(pathname)?;
        self.require_file(number)?;
        self.require_read(number, "fs: no read permission on file")?;
        Ok(number)
      })
      .collect::<Result<Vec<InodeNumber>, Errno>>()?;

    let mut contents = Vec::with_capacity(numbers.len());
    for number in numbers {
      contents.push(self.superblock.inode(number)?.read_data(&mut self.store)?);
      self.superblock.inode_mut(number)?.stamp_accessed();
      self.flush_inode(number)?;
    }

    Ok(contents)
  }

  pub fn change_permission(
    &mut self,
    pathname: &str,
    mode: PermissionMode,
    users: &[UserIndex],
  ) -> Result<(), Errno> {
    // Guard for user index out of range
    if users.iter().any(|&index| index as usize >= MAX_USERS) {
      return Err(Errno::InvalidArgument("fs: user index must be 0-7"));
    }

    let number = self.resolve_relative(pathname)?;
    self.require_write(number, "fs: no write permission on target")?;

    let inode = self.superblock.inode_mut(number)?;
    match mode {
      PermissionMode::None => {
        inode.revoke_read(users);
        inode.revoke_write(users);
      }
      PermissionMode::ReadOnly => {
        inode.grant_read(users);
        inode.revoke_write(users);
      }
      PermissionMode::ReadWrite => {
        inode.grant_read(users);
        inode.grant_write(users);
      }
    }
    self.flush_inode(number)?;

    debug!("fs: set {mode:?} on inode #{number} for users {users:?}");
    Ok(())
  }

  pub fn list_users(&self) -> Vec<(UserIndex, String)> {
    self.superblock.users.users()
  }

  pub fn add_user(&mut self, name: &str, password: &str) -> Result<UserIndex, Errno> {
    let index = self.superblock.add_user(self.user, name, password)?;
    self.superblock.write_superblock(&mut self.store)?;

    Ok(index)
  }

  /// Free the user's slot and clear its bits from every inode
  pub fn delete_user(&mut self, name: &str) -> Result<UserIndex, Errno> {
    let index = self.superblock.delete_user(self.user, name)?;

    let affected = self.superblock.inodes
      .values()
      .filter(|inode| inode.has_read(index) || inode.has_write(index))
      .map(|inode| inode.number)
      .collect::<Vec<InodeNumber>>();
    for number in affected {
      let inode = self.superblock.inode_mut(number)?;
      inode.revoke_read(&[index]);
      inode.revoke_write(&[index]);
      self.flush_inode(number)?;
    }
    self.superblock.write_superblock(&mut self.store)?;

    Ok(index)
  }

  pub fn authenticate(&self, name: &str, password: &str) -> Result<UserIndex, Errno> {
    self.superblock
      .check_credentials(name, password)
      .ok_or(Errno::PermissionDenied("fs: wrong user name or password"))
  }

  pub fn set_current_user(&mut self, index: UserIndex) -> Result<(), Errno> {
    // Guard for empty slot
    if self.superblock.users.name_of(index).is_none() {
      return Err(Errno::InvalidArgument("fs: no such user"));
    }

    self.user = index;
    Ok(())
  }

  pub fn current_user(&self) -> UserIndex {
    self.user
  }

  pub fn current_user_name(&self) -> Option<&str> {
    self.superblock.users.name_of(self.user)
  }

  /// Absolute path of the current directory
  pub fn current_path(&self) -> String {
    let mut names = Vec::new();
    let mut current = self.cwd;

    while current != ROOT_INODE_NUMBER {
      match self.superblock.inode(current) {
        Ok(inode) => {
          names.push(inode.name.as_str());
          current = inode.parent;
        }
        Err(_) => break,
      }
    }

    format!("/{}", names.iter().rev().join("/"))
  }

  pub fn usage(&self) -> Usage {
    Usage {
      used_blocks: self.superblock.used_blocks as usize,
      total_blocks: TOTAL_BLOCKS,
      used_inodes: self.superblock.used_inodes as usize,
      total_inodes: TOTAL_INODES,
      used_index: self.superblock.used_index as usize,
      total_index: TOTAL_INDEX,
      users: self.superblock.users.count(),
      max_users: MAX_USERS,
      last_mount: self.superblock.last_mount,
      last_modified: self.superblock.last_modified,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn permission_codes() {
    assert_eq!("00".parse::<PermissionMode>(), Ok(PermissionMode::None));
    assert_eq!("10".parse::<PermissionMode>(), Ok(PermissionMode::ReadOnly));
    assert_eq!("11".parse::<PermissionMode>(), Ok(PermissionMode::ReadWrite));

    for code in ["01", "1", "111", "rw", ""] {
      assert!(matches!(code.parse::<PermissionMode>(), Err(Errno::InvalidArgument(_))), "{code}");
    }
  }

  #[test]
  fn dir_entry_renders_brackets() {
    let entry = DirEntry {
      number: 1,
      file_type: FileType::Directory,
      permissions: String::from("drw"),
      size: 0,
      modified: Timestamp([26, 10, 18, 9, 5, 0]),
      name: String::from("docs"),
    };

    assert_eq!(entry.display_name(), "[docs]");
    assert_eq!(entry.to_string(), "drw      0 18 Oct 26 09:05 [docs]");
  }
}

// vim:ts=2 sw=2
