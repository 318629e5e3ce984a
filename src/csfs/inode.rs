use std::convert::TryFrom;

use log::debug;

use crate::util::Timestamp;

use super::backing::BackingStore;
use super::errno::Errno;
use super::layout::{
  block_offset, inode_offset, BlockNumber, InodeNumber, UserIndex, BYTES_PER_BLOCK,
  BYTES_PER_INODE, DIRECT_POINTERS, INDIRECT_POINTERS, MAX_NAME_LEN, ROOT_INODE_NUMBER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
  Directory = 0,
  File = 1,
}

impl TryFrom<u8> for FileType {
  type Error = Errno;

  fn try_from(raw: u8) -> Result<Self, Self::Error> {
    match raw {
      0 => Ok(FileType::Directory),
      1 => Ok(FileType::File),
      _ => Err(Errno::CorruptImage("inode: unknown file type")),
    }
  }
}

/// Bit for user `index` in a permission mask, zero when out of range
fn user_bit(index: UserIndex) -> u8 {
  1u8.checked_shl(index as u32).unwrap_or(0)
}

///   byte  field
///   0     read mask          bit i = user i may read, bit 0 = admin
///   1     write mask         same layout
///   2     edit flag          reserved for checkout
///   3     inode number (4)
///   7     parent inode (4)
///   11    type               0 = directory, 1 = file
///   12    size in bytes (4)
///   16    creation time (6)
///   22    access time (6)
///   28    modify time (6)
///   34    blocks allocated (4)
///   38    direct pointers (16 x 2)
///   70    indirect pointers (16 x 2), unused
///   102   name (64), null padded
///   166   reserved (90)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct INode {
  pub read_mask: u8,
  pub write_mask: u8,
  pub edit_flag: u8,
  pub number: InodeNumber,
  pub parent: InodeNumber,
  pub file_type: FileType,
  pub size: u32,
  pub ctime: Timestamp,
  pub atime: Timestamp,
  pub mtime: Timestamp,
  pub blocks_allocated: u32,
  pub direct_blocks: [BlockNumber; DIRECT_POINTERS],
  pub indirect_blocks: [u16; INDIRECT_POINTERS],
  pub name: String,
}

impl INode {
  /// Admin-only directory with no content, parented to root
  pub fn new(number: InodeNumber) -> Self {
    Self {
      read_mask: user_bit(0),
      write_mask: user_bit(0),
      edit_flag: 0,
      number,
      parent: ROOT_INODE_NUMBER,
      file_type: FileType::Directory,
      size: 0,
      ctime: Timestamp::default(),
      atime: Timestamp::default(),
      mtime: Timestamp::default(),
      blocks_allocated: 0,
      direct_blocks: [0; DIRECT_POINTERS],
      indirect_blocks: [0; INDIRECT_POINTERS],
      name: String::new(),
    }
  }

  pub fn is_dir(&self) -> bool {
    self.file_type == FileType::Directory
  }

  pub fn has_read(&self, index: UserIndex) -> bool {
    self.read_mask & user_bit(index) != 0
  }

  pub fn has_write(&self, index: UserIndex) -> bool {
    self.write_mask & user_bit(index) != 0
  }

  pub fn grant_read(&mut self, indices: &[UserIndex]) {
    for &index in indices {
      self.read_mask |= user_bit(index);
    }
  }

  pub fn grant_write(&mut self, indices: &[UserIndex]) {
    for &index in indices {
      self.write_mask |= user_bit(index);
    }
  }

  /// Bit 0 (admin) survives every revoke
  pub fn revoke_read(&mut self, indices: &[UserIndex]) {
    for &index in indices {
      self.read_mask &= !user_bit(index) | user_bit(0);
    }
  }

  pub fn revoke_write(&mut self, indices: &[UserIndex]) {
    for &index in indices {
      self.write_mask &= !user_bit(index) | user_bit(0);
    }
  }

  /// `drw` style summary for user `index`
  pub fn permission_string(&self, index: UserIndex) -> String {
    let kind = if self.is_dir() { 'd' } else { '-' };
    let read = if self.has_read(index) { 'r' } else { '-' };
    let write = if self.has_write(index) { 'w' } else { '-' };

    [kind, read, write].iter().collect()
  }

  pub fn stamp_created(&mut self) {
    let now = Timestamp::now();
    self.ctime = now;
    self.atime = now;
    self.mtime = now;
  }

  pub fn stamp_modified(&mut self) {
    self.mtime = Timestamp::now();
  }

  pub fn stamp_accessed(&mut self) {
    self.atime = Timestamp::now();
  }

  /// Non-zero direct pointers, in order
  pub fn data_blocks(&self) -> Vec<BlockNumber> {
    self.direct_blocks
      .iter()
      .copied()
      .filter(|&block| block != 0)
      .collect()
  }

  /// Point the inode at `blocks`, keeping `blocks_allocated` in step
  pub fn set_data_blocks(&mut self, blocks: &[BlockNumber]) {
    self.direct_blocks = [0; DIRECT_POINTERS];
    self.direct_blocks[..blocks.len()].copy_from_slice(blocks);
    self.blocks_allocated = blocks.len() as u32;
  }

  pub fn to_bytes(&self) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(BYTES_PER_INODE);

    bytes.push(self.read_mask);
    bytes.push(self.write_mask);
    bytes.push(self.edit_flag);
    bytes.extend_from_slice(&self.number.to_be_bytes());
    bytes.extend_from_slice(&self.parent.to_be_bytes());
    bytes.push(self.file_type as u8);
    bytes.extend_from_slice(&self.size.to_be_bytes());
    bytes.extend_from_slice(&self.ctime.to_bytes());
    bytes.extend_from_slice(&self.atime.to_bytes());
    bytes.extend_from_slice(&self.mtime.to_bytes());
    bytes.extend_from_slice(&self.blocks_allocated.to_be_bytes());
    bytes.extend(self.direct_blocks.iter().flat_map(|block| block.to_be_bytes()));
    bytes.extend(self.indirect_blocks.iter().flat_map(|block| block.to_be_bytes()));

    let mut name = [0u8; MAX_NAME_LEN];
    let name_bytes = self.name.as_bytes();
    let name_len = name_bytes.len().min(MAX_NAME_LEN);
    name[..name_len].copy_from_slice(&name_bytes[..name_len]);
    bytes.extend_from_slice(&name);

    bytes.resize(BYTES_PER_INODE, 0);
    bytes
  }

  pub fn from_bytes(bytes: &[u8]) -> Result<Self, Errno> {
    // Guard for truncated record
    if bytes.len() < BYTES_PER_INODE {
      return Err(Errno::CorruptImage("inode: record too short"));
    }

    let u32_at = |offset: usize| {
      u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    };
    let u16_at = |offset: usize| u16::from_be_bytes([bytes[offset], bytes[offset + 1]]);

    let mut direct_blocks = [0; DIRECT_POINTERS];
    for (i, block) in direct_blocks.iter_mut().enumerate() {
      *block = u16_at(38 + i * 2);
    }
    let mut indirect_blocks = [0; INDIRECT_POINTERS];
    for (i, block) in indirect_blocks.iter_mut().enumerate() {
      *block = u16_at(70 + i * 2);
    }

    // Padding may sit on either side of the name
    let name = std::str::from_utf8(&bytes[102..102 + MAX_NAME_LEN])
      .map_err(|_| Errno::CorruptImage("inode: name is not utf-8"))?
      .trim_matches('\0')
      .to_owned();

    Ok(Self {
      read_mask: bytes[0],
      write_mask: bytes[1],
      edit_flag: bytes[2],
      number: u32_at(3),
      parent: u32_at(7),
      file_type: FileType::try_from(bytes[11])?,
      size: u32_at(12),
      ctime: Timestamp::from_bytes(&bytes[16..22]),
      atime: Timestamp::from_bytes(&bytes[22..28]),
      mtime: Timestamp::from_bytes(&bytes[28..34]),
      blocks_allocated: u32_at(34),
      direct_blocks,
      indirect_blocks,
      name,
    })
  }

  pub fn write_to(&self, store: &mut BackingStore) -> Result<(), Errno> {
    debug!("inode: flush #{} '{}'", self.number, self.name);
    store.write_at(inode_offset(self.number), &self.to_bytes())
  }

  pub fn read_from(store: &mut BackingStore, number: InodeNumber) -> Result<Self, Errno> {
    let bytes = store.read_at(inode_offset(number), BYTES_PER_INODE)?;
    Self::from_bytes(&bytes)
  }

  /// `size` fits the allocated blocks with a non-empty last block
  fn extent_is_consistent(&self) -> bool {
    let n = self.blocks_allocated as usize;
    let size = self.size as usize;

    n <= DIRECT_POINTERS && size <= n * BYTES_PER_BLOCK && (n == 0 || size > (n - 1) * BYTES_PER_BLOCK)
  }

  /// Byte count stored in block `i` of `blocks_allocated`
  fn chunk_len(&self, i: usize) -> usize {
    let n = self.blocks_allocated as usize;
    if i + 1 < n {
      BYTES_PER_BLOCK
    } else {
      self.size as usize - (n - 1) * BYTES_PER_BLOCK
    }
  }

  /// Reassemble the content of a file. Directories and files without
  /// blocks read as empty.
  pub fn read_data(&self, store: &mut BackingStore) -> Result<Vec<u8>, Errno> {
    if self.is_dir() || self.blocks_allocated == 0 {
      return Ok(Vec::new());
    }

    // Guard for size/pointer drift
    if !self.extent_is_consistent() {
      return Err(Errno::CorruptImage("inode: size does not match allocated blocks"));
    }

    let mut data = Vec::with_capacity(self.size as usize);
    for i in 0..self.blocks_allocated as usize {
      let chunk = store.read_at(block_offset(self.direct_blocks[i]), self.chunk_len(i))?;
      data.extend_from_slice(&chunk);
    }

    Ok(data)
  }

  /// Scatter `data` over the direct blocks. The caller sizes the pointers
  /// and `size` to `data` beforehand.
  pub fn write_data(&self, store: &mut BackingStore, data: &[u8]) -> Result<(), Errno> {
    // Guard for unsized pointers
    if data.len() != self.size as usize || !self.extent_is_consistent() {
      return Err(Errno::InvalidArgument("inode: data does not match allocated blocks"));
    }

    let mut offset = 0;
    for i in 0..self.blocks_allocated as usize {
      let len = self.chunk_len(i);
      store.write_at(block_offset(self.direct_blocks[i]), &data[offset..offset + len])?;
      offset += len;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::csfs::layout::IMAGE_SIZE;
  use crate::util::mktemp;

  fn sample() -> INode {
    let mut inode = INode::new(42);
    inode.read_mask = 0b0000_0101;
    inode.write_mask = 0b1000_0001;
    inode.edit_flag = 3;
    inode.parent = 7;
    inode.file_type = FileType::File;
    inode.size = 9000;
    inode.ctime = Timestamp([23, 1, 2, 3, 4, 5]);
    inode.atime = Timestamp([23, 6, 7, 8, 9, 10]);
    inode.mtime = Timestamp([24, 11, 12, 13, 14, 15]);
    inode.set_data_blocks(&[5, 9, 11]);
    inode.indirect_blocks[15] = 0xbeef;
    inode.name = String::from("notes.txt");
    inode
  }

  #[test]
  fn record_is_256_bytes() {
    assert_eq!(INode::new(0).to_bytes().len(), BYTES_PER_INODE);
  }

  #[test]
  fn round_trip_keeps_every_field() {
    let inode = sample();
    assert_eq!(INode::from_bytes(&inode.to_bytes()).unwrap(), inode);
  }

  #[test]
  fn name_field_layout() {
    let bytes = sample().to_bytes();
    assert_eq!(&bytes[102..111], b"notes.txt");
    assert!(bytes[111..166].iter().all(|&byte| byte == 0));
  }

  #[test]
  fn left_padded_name_is_stripped() {
    let mut bytes = sample().to_bytes();
    let mut name = [0u8; 64];
    name[60..].copy_from_slice(b"abcd");
    bytes[102..166].copy_from_slice(&name);

    assert_eq!(INode::from_bytes(&bytes).unwrap().name, "abcd");
  }

  #[test]
  fn bad_type_is_corrupt() {
    let mut bytes = sample().to_bytes();
    bytes[11] = 7;
    assert_eq!(
      INode::from_bytes(&bytes),
      Err(Errno::CorruptImage("inode: unknown file type"))
    );
  }

  #[test]
  fn permission_bits() {
    let mut inode = INode::new(1);
    assert!(inode.has_read(0) && inode.has_write(0));
    assert!(!inode.has_read(3));

    inode.grant_read(&[3, 5]);
    inode.grant_write(&[3]);
    assert!(inode.has_read(3) && inode.has_read(5) && inode.has_write(3));
    assert_eq!(inode.permission_string(3), "drw");
    assert_eq!(inode.permission_string(5), "dr-");

    inode.revoke_read(&[0, 3]);
    inode.revoke_write(&[0, 3]);
    assert!(inode.has_read(0) && inode.has_write(0));
    assert!(!inode.has_read(3) && !inode.has_write(3));
    assert!(inode.has_read(5));
  }

  #[test]
  fn data_spans_blocks() {
    let tempfile = mktemp();
    let mut store = BackingStore::create(tempfile.path()).unwrap();
    let data = (0..9000u32).map(|i| (i % 251) as u8).collect::<Vec<u8>>();

    let mut inode = INode::new(1);
    inode.file_type = FileType::File;
    inode.size = data.len() as u32;
    inode.set_data_blocks(&[3, 1, 2]);

    inode.write_data(&mut store, &data).unwrap();
    assert_eq!(inode.read_data(&mut store).unwrap(), data);

    // Last block only carries the tail
    let tail = store.read_at(block_offset(2), 4096).unwrap();
    assert_eq!(&tail[..9000 - 8192], &data[8192..]);
    assert!(store.read_at(IMAGE_SIZE - 1, 1).is_ok());
  }

  #[test]
  fn directory_reads_empty() {
    let tempfile = mktemp();
    let mut store = BackingStore::create(tempfile.path()).unwrap();
    let mut inode = INode::new(1);
    inode.set_data_blocks(&[4]);
    inode.size = 10;

    assert!(inode.read_data(&mut store).unwrap().is_empty());
  }

  #[test]
  fn write_data_checks_sizing() {
    let tempfile = mktemp();
    let mut store = BackingStore::create(tempfile.path()).unwrap();
    let mut inode = INode::new(1);
    inode.file_type = FileType::File;
    inode.size = 5000;
    inode.set_data_blocks(&[1]);

    assert!(matches!(
      inode.write_data(&mut store, &[0u8; 5000]),
      Err(Errno::InvalidArgument(_))
    ));
  }
}

// vim:ts=2 sw=2
