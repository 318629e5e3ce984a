use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::util::Timestamp;

use super::backing::BackingStore;
use super::errno::Errno;
use super::free_list::FreeList;
use super::index::IndexBlock;
use super::inode::INode;
use super::layout::*;
use super::users::UserTable;

/// Filesystem-wide metadata, the three free lists, and the cache of
/// every occupied inode.
///
/// Record layout (512 bytes):
///   tag (2) | superblock size | used blocks | bytes/block | total blocks
///   | used inodes | bytes/inode | total inodes | used index | total index
///   (2 each) | last mount (6) | last modified (6) | user count (2)
///   | max users (2) | 8 names (16 each) | 8 passwords (16 each)
///   | reserved (220)
#[derive(Debug)]
pub struct Superblock {
  pub used_blocks: u16,
  pub used_inodes: u16,
  pub used_index: u16,
  pub last_mount: Timestamp,
  pub last_modified: Timestamp,
  pub users: UserTable,
  pub block_list: FreeList,
  pub inode_list: FreeList,
  pub index_list: FreeList,
  /// Occupied inodes keyed by number
  pub inodes: BTreeMap<InodeNumber, INode>,
}

impl Superblock {
  /// Empty filesystem state: nothing allocated except reserved block 0
  fn new() -> Self {
    let now = Timestamp::now();

    Self {
      used_blocks: 1,
      used_inodes: 0,
      used_index: 0,
      last_mount: now,
      last_modified: now,
      users: UserTable::default(),
      block_list: FreeList::seeded(TOTAL_BLOCKS, BLOCK_LIST_ENTRY_WIDTH, 1),
      inode_list: FreeList::seeded(TOTAL_INODES, INODE_LIST_ENTRY_WIDTH, 0),
      index_list: FreeList::seeded(TOTAL_INDEX, INDEX_LIST_ENTRY_WIDTH, 0),
      inodes: BTreeMap::new(),
    }
  }

  /// Format every region of `store` and allocate the root directory
  pub fn initialize_empty(store: &mut BackingStore) -> Result<Self, Errno> {
    let mut superblock = Self::new();

    superblock.write_superblock(store)?;
    superblock.write_block_list(store)?;
    superblock.write_inode_list(store)?;
    Self::format_inode_table(store)?;
    superblock.write_index_list(store)?;
    IndexBlock::format_table(store)?;

    let root = superblock.fetch_inode()?;
    superblock.inode_mut(root)?.stamp_created();
    superblock.inode(root)?.write_to(store)?;
    superblock.write_inode_list(store)?;
    superblock.write_superblock(store)?;
    store.flush()?;

    info!("superblock: formatted {}", store.realpath().display());
    Ok(superblock)
  }

  /// Read every metadata region and the occupied inodes, then check them
  /// against each other
  pub fn load(store: &mut BackingStore) -> Result<Self, Errno> {
    let bytes = store.read_at(SUPERBLOCK_OFFSET, SUPERBLOCK_SIZE)?;
    let mut superblock = Self::from_bytes(&bytes)?;

    superblock.block_list = FreeList::from_bytes(
      &store.read_at(BLOCK_LIST_OFFSET, BLOCK_LIST_SIZE)?,
      TOTAL_BLOCKS,
      BLOCK_LIST_ENTRY_WIDTH,
    )?;
    superblock.inode_list = FreeList::from_bytes(
      &store.read_at(INODE_LIST_OFFSET, INODE_LIST_SIZE)?,
      TOTAL_INODES,
      INODE_LIST_ENTRY_WIDTH,
    )?;
    superblock.index_list = FreeList::from_bytes(
      &store.read_at(INDEX_LIST_OFFSET, INDEX_LIST_SIZE)?,
      TOTAL_INDEX,
      INDEX_LIST_ENTRY_WIDTH,
    )?;

    let occupied = superblock.inode_list.used_slots().collect::<Vec<InodeNumber>>();
    for number in occupied {
      let inode = INode::read_from(store, number)?;

      // Guard for misplaced record
      if inode.number != number {
        return Err(Errno::CorruptImage("superblock: inode number does not match its slot"));
      }
      superblock.inodes.insert(number, inode);
    }

    superblock.check_consistency()?;

    superblock.last_mount = Timestamp::now();
    superblock.write_superblock(store)?;

    info!(
      "superblock: mounted {} ({} inodes, {} blocks in use)",
      store.realpath().display(),
      superblock.used_inodes,
      superblock.used_blocks,
    );
    Ok(superblock)
  }

  fn check_consistency(&self) -> Result<(), Errno> {
    let lists = [
      (&self.block_list, self.used_blocks, "data block"),
      (&self.inode_list, self.used_inodes, "inode"),
      (&self.index_list, self.used_index, "index"),
    ];
    for (list, used, label) in lists {
      let free = list.free_count()?;
      if list.used_count() + free != list.capacity() {
        warn!("superblock: {label} list leaks slots");
        return Err(Errno::CorruptImage("superblock: free list does not cover every slot"));
      }
      if list.used_count() != used as usize {
        warn!("superblock: {label} counter {used} != {} occupied", list.used_count());
        return Err(Errno::CorruptImage("superblock: usage counter does not match free list"));
      }
    }

    // Guard for missing root
    match self.inodes.get(&ROOT_INODE_NUMBER) {
      Some(root) if root.is_dir() => (),
      _ => return Err(Errno::CorruptImage("superblock: root directory is missing")),
    }

    for inode in self.inodes.values() {
      if inode.number != ROOT_INODE_NUMBER {
        match self.inodes.get(&inode.parent) {
          Some(parent) if parent.is_dir() => (),
          _ => return Err(Errno::CorruptImage("superblock: inode parent is not a live directory")),
        }
      }

      if inode.data_blocks().len() != inode.blocks_allocated as usize {
        return Err(Errno::CorruptImage("superblock: block count does not match pointers"));
      }
      if inode.data_blocks()
        .iter()
        .any(|&block| !self.block_list.is_used(block as u32))
      {
        return Err(Errno::CorruptImage("superblock: inode points at a free block"));
      }
    }

    // Guard for detached cycles: every parent chain ends at root
    for &number in self.inodes.keys() {
      let mut current = number;
      let mut steps = 0;
      while current != ROOT_INODE_NUMBER {
        steps += 1;
        current = match self.inodes.get(&current) {
          Some(inode) if steps <= self.inodes.len() => inode.parent,
          _ => return Err(Errno::CorruptImage("superblock: inode is unreachable from root")),
        };
      }
    }

    Ok(())
  }

  pub fn to_bytes(&self) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(SUPERBLOCK_SIZE);

    bytes.extend_from_slice(&FILESYSTEM_TAG);
    for field in [
      SUPERBLOCK_SIZE as u16,
      self.used_blocks,
      BYTES_PER_BLOCK as u16,
      TOTAL_BLOCKS as u16,
      self.used_inodes,
      BYTES_PER_INODE as u16,
      TOTAL_INODES as u16,
      self.used_index,
      TOTAL_INDEX as u16,
    ] {
      bytes.extend_from_slice(&field.to_be_bytes());
    }
    bytes.extend_from_slice(&self.last_mount.to_bytes());
    bytes.extend_from_slice(&self.last_modified.to_bytes());
    bytes.extend_from_slice(&(self.users.count() as u16).to_be_bytes());
    bytes.extend_from_slice(&(MAX_USERS as u16).to_be_bytes());
    bytes.extend_from_slice(&self.users.to_bytes());

    bytes.resize(SUPERBLOCK_SIZE, 0);
    bytes
  }

  /// Parse the superblock record; free lists and inodes are left empty
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, Errno> {
    // Guard for truncated record
    if bytes.len() < SUPERBLOCK_SIZE {
      return Err(Errno::CorruptImage("superblock: record too short"));
    }
    // Guard for foreign image
    if bytes[0..2] != FILESYSTEM_TAG {
      return Err(Errno::CorruptImage("superblock: not a csfs image"));
    }

    let u16_at = |offset: usize| u16::from_be_bytes([bytes[offset], bytes[offset + 1]]) as usize;

    let geometry = [
      (u16_at(2), SUPERBLOCK_SIZE),
      (u16_at(6), BYTES_PER_BLOCK),
      (u16_at(8), TOTAL_BLOCKS),
      (u16_at(12), BYTES_PER_INODE),
      (u16_at(14), TOTAL_INODES),
      (u16_at(18), TOTAL_INDEX),
    ];
    if geometry.iter().any(|(stored, expected)| stored != expected) {
      return Err(Errno::CorruptImage("superblock: unsupported geometry"));
    }

    let users = UserTable::from_bytes(&bytes[36..], u16_at(34))?;

    Ok(Self {
      used_blocks: u16_at(4) as u16,
      used_inodes: u16_at(10) as u16,
      used_index: u16_at(16) as u16,
      last_mount: Timestamp::from_bytes(&bytes[20..26]),
      last_modified: Timestamp::from_bytes(&bytes[26..32]),
      users,
      ..Self::new()
    })
  }

  pub fn inode(&self, number: InodeNumber) -> Result<&INode, Errno> {
    self.inodes
      .get(&number)
      .ok_or(Errno::InvalidPath("superblock: no such inode"))
  }

  pub fn inode_mut(&mut self, number: InodeNumber) -> Result<&mut INode, Errno> {
    self.inodes
      .get_mut(&number)
      .ok_or(Errno::InvalidPath("superblock: no such inode"))
  }

  pub fn free_inodes(&self) -> usize {
    TOTAL_INODES - self.used_inodes as usize
  }

  pub fn free_blocks(&self) -> usize {
    TOTAL_BLOCKS - self.used_blocks as usize
  }

  /// Allocate an inode slot and cache a fresh record for it
  pub fn fetch_inode(&mut self) -> Result<InodeNumber, Errno> {
    // Guard for full table
    if self.used_inodes as usize >= TOTAL_INODES {
      return Err(Errno::ResourceExhausted("superblock: no free inode"));
    }

    let number = self.inode_list
      .allocate()
      .ok_or(Errno::ResourceExhausted("superblock: no free inode"))?;
    self.used_inodes += 1;
    self.inodes.insert(number, INode::new(number));

    debug!("superblock: fetched inode #{number}");
    Ok(number)
  }

  pub fn release_inode(&mut self, number: InodeNumber) -> Result<(), Errno> {
    self.inode_list.release(number)?;
    self.used_inodes -= 1;
    self.inodes.remove(&number);

    debug!("superblock: released inode #{number}");
    Ok(())
  }

  /// Allocate `count` data blocks, all or nothing
  pub fn fetch_data_blocks(&mut self, count: usize) -> Result<Vec<BlockNumber>, Errno> {
    // Guard for insufficient space
    if count > self.free_blocks() {
      return Err(Errno::ResourceExhausted("superblock: not enough free data blocks"));
    }

    let mut blocks = Vec::with_capacity(count);
    for _ in 0..count {
      let block = self.block_list
        .allocate()
        .ok_or(Errno::ResourceExhausted("superblock: not enough free data blocks"))?;
      blocks.push(block as BlockNumber);
    }
    self.used_blocks += count as u16;

    debug!("superblock: fetched data blocks {blocks:?}");
    Ok(blocks)
  }

  /// Return every block of inode `number` and leave it empty
  pub fn release_data_blocks(&mut self, number: InodeNumber) -> Result<(), Errno> {
    let blocks = self.inode(number)?.data_blocks();

    for &block in &blocks {
      self.block_list.release(block as u32)?;
      self.used_blocks -= 1;
    }

    let inode = self.inode_mut(number)?;
    inode.set_data_blocks(&[]);
    inode.size = 0;

    if !blocks.is_empty() {
      debug!("superblock: released data blocks {blocks:?} of inode #{number}");
    }
    Ok(())
  }

  pub fn add_user(&mut self, actor: UserIndex, name: &str, password: &str) -> Result<UserIndex, Errno> {
    // Guard for non-admin
    if actor != ADMIN_INDEX {
      return Err(Errno::PermissionDenied("only admin can add users"));
    }

    let index = self.users.add(name, password)?;
    info!("superblock: added user '{name}' at slot {index}");
    Ok(index)
  }

  pub fn delete_user(&mut self, actor: UserIndex, name: &str) -> Result<UserIndex, Errno> {
    // Guard for non-admin
    if actor != ADMIN_INDEX {
      return Err(Errno::PermissionDenied("only admin can delete users"));
    }

    let index = self.users.remove(name)?;
    info!("superblock: deleted user '{name}' from slot {index}");
    Ok(index)
  }

  pub fn check_credentials(&self, name: &str, password: &str) -> Option<UserIndex> {
    self.users.check_credentials(name, password)
  }

  pub fn write_superblock(&mut self, store: &mut BackingStore) -> Result<(), Errno> {
    self.last_modified = Timestamp::now();
    debug!("superblock: flush record");
    store.write_at(SUPERBLOCK_OFFSET, &self.to_bytes())
  }

  pub fn write_block_list(&self, store: &mut BackingStore) -> Result<(), Errno> {
    debug!("superblock: flush data block list (head {})", self.block_list.head());
    store.write_at(BLOCK_LIST_OFFSET, &self.block_list.to_bytes())
  }

  pub fn write_inode_list(&self, store: &mut BackingStore) -> Result<(), Errno> {
    debug!("superblock: flush inode list (head {})", self.inode_list.head());
    store.write_at(INODE_LIST_OFFSET, &self.inode_list.to_bytes())
  }

  pub fn write_index_list(&self, store: &mut BackingStore) -> Result<(), Errno> {
    debug!("superblock: flush index list (head {})", self.index_list.head());
    store.write_at(INDEX_LIST_OFFSET, &self.index_list.to_bytes())
  }

  /// Default records for every slot, numbered in place
  fn format_inode_table(store: &mut BackingStore) -> Result<(), Errno> {
    let table = (0..TOTAL_INODES as InodeNumber)
      .flat_map(|number| INode::new(number).to_bytes())
      .collect::<Vec<u8>>();

    store.write_at(INODE_TABLE_OFFSET, &table)
  }
}


// vim:ts=2 sw=2
