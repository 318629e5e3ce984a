//! Fixed on-disk layout of a csfs image.
//!
//! ```text
//! | superblock | block list | inode list | inode table | index list | index table | data blocks |
//! 0            512          33284        35336         297480       299532        1348108
//! ```
//!
//! All integers are big-endian.

pub type InodeNumber = u32;
pub type BlockNumber = u16;
pub type UserIndex = u8;

pub const FILESYSTEM_TAG: [u8; 2] = *b"CS";

pub const SUPERBLOCK_SIZE: usize = 512;
pub const BYTES_PER_BLOCK: usize = 4096;
pub const TOTAL_BLOCKS: usize = 16384;
pub const TOTAL_INODES: usize = 1024;
pub const TOTAL_INDEX: usize = 512;
pub const BYTES_PER_INODE: usize = 256;
pub const INDEX_POINTERS: usize = 1024;
pub const INDEX_ENTRY_SIZE: usize = INDEX_POINTERS * 2;

pub const DIRECT_POINTERS: usize = 16;
pub const INDIRECT_POINTERS: usize = 16;
pub const MAX_NAME_LEN: usize = 64;
/// Largest file the direct pointers can address, exclusive
pub const MAX_FILE_SIZE: usize = DIRECT_POINTERS * BYTES_PER_BLOCK;

pub const MAX_USERS: usize = 8;
pub const USER_FIELD_LEN: usize = 16;
pub const ADMIN_INDEX: UserIndex = 0;

pub const ROOT_INODE_NUMBER: InodeNumber = 0;
/// Block 0 doubles as the "no block" pointer value and never holds content
pub const RESERVED_BLOCK: BlockNumber = 0;

/// 2-byte list size + 2-byte head + entries
pub const fn free_list_region_size(capacity: usize, entry_width: usize) -> usize {
  4 + capacity * entry_width
}

pub const BLOCK_LIST_ENTRY_WIDTH: usize = 2;
pub const INODE_LIST_ENTRY_WIDTH: usize = 2;
pub const INDEX_LIST_ENTRY_WIDTH: usize = 4;

pub const SUPERBLOCK_OFFSET: u64 = 0;
pub const BLOCK_LIST_OFFSET: u64 = SUPERBLOCK_OFFSET + SUPERBLOCK_SIZE as u64;
pub const BLOCK_LIST_SIZE: usize = free_list_region_size(TOTAL_BLOCKS, BLOCK_LIST_ENTRY_WIDTH);
pub const INODE_LIST_OFFSET: u64 = BLOCK_LIST_OFFSET + BLOCK_LIST_SIZE as u64;
pub const INODE_LIST_SIZE: usize = free_list_region_size(TOTAL_INODES, INODE_LIST_ENTRY_WIDTH);
pub const INODE_TABLE_OFFSET: u64 = INODE_LIST_OFFSET + INODE_LIST_SIZE as u64;
pub const INODE_TABLE_SIZE: usize = TOTAL_INODES * BYTES_PER_INODE;
pub const INDEX_LIST_OFFSET: u64 = INODE_TABLE_OFFSET + INODE_TABLE_SIZE as u64;
pub const INDEX_LIST_SIZE: usize = free_list_region_size(TOTAL_INDEX, INDEX_LIST_ENTRY_WIDTH);
pub const INDEX_TABLE_OFFSET: u64 = INDEX_LIST_OFFSET + INDEX_LIST_SIZE as u64;
pub const INDEX_TABLE_SIZE: usize = TOTAL_INDEX * INDEX_ENTRY_SIZE;
pub const DATA_OFFSET: u64 = INDEX_TABLE_OFFSET + INDEX_TABLE_SIZE as u64;
pub const DATA_SIZE: usize = TOTAL_BLOCKS * BYTES_PER_BLOCK;
pub const IMAGE_SIZE: u64 = DATA_OFFSET + DATA_SIZE as u64;

pub fn inode_offset(number: InodeNumber) -> u64 {
  INODE_TABLE_OFFSET + number as u64 * BYTES_PER_INODE as u64
}

pub fn index_offset(entry: u32) -> u64 {
  INDEX_TABLE_OFFSET + entry as u64 * INDEX_ENTRY_SIZE as u64
}

pub fn block_offset(block: BlockNumber) -> u64 {
  DATA_OFFSET + block as u64 * BYTES_PER_BLOCK as u64
}

/// Blocks needed to hold `size` bytes
pub fn blocks_for(size: usize) -> usize {
  (size + BYTES_PER_BLOCK - 1) / BYTES_PER_BLOCK
}


// vim:ts=2 sw=2
