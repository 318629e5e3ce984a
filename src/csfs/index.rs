use log::debug;

use super::backing::BackingStore;
use super::errno::Errno;
use super::layout::{INDEX_ENTRY_SIZE, INDEX_POINTERS, INDEX_TABLE_OFFSET, TOTAL_INDEX};

/// Secondary pointer table, one per index entry.
///
/// The region is formatted and its free list is maintained, but no file
/// operation addresses data through it: files stay within their direct
/// pointers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBlock {
  pub data_pointers: [u16; INDEX_POINTERS],
}

impl Default for IndexBlock {
  fn default() -> Self {
    Self {
      data_pointers: [0; INDEX_POINTERS],
    }
  }
}

impl IndexBlock {
  pub fn to_bytes(&self) -> Vec<u8> {
    self.data_pointers
      .iter()
      .flat_map(|pointer| pointer.to_be_bytes())
      .collect()
  }

  /// Write every entry of the index-block table as empty
  pub fn format_table(store: &mut BackingStore) -> Result<(), Errno> {
    let table = (0..TOTAL_INDEX)
      .flat_map(|_| IndexBlock::default().to_bytes())
      .collect::<Vec<u8>>();

    debug!("index: formatting {} entries", TOTAL_INDEX);
    store.write_at(INDEX_TABLE_OFFSET, &table)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::mktemp;

  #[test]
  fn entry_is_2048_bytes() {
    assert_eq!(IndexBlock::default().to_bytes().len(), INDEX_ENTRY_SIZE);
  }

  #[test]
  fn format_zeroes_the_table() {
    let tempfile = mktemp();
    let mut store = BackingStore::create(tempfile.path()).unwrap();
    store.write_at(INDEX_TABLE_OFFSET + 10, &[0xff; 4]).unwrap();

    IndexBlock::format_table(&mut store).unwrap();

    let entry = store.read_at(INDEX_TABLE_OFFSET, INDEX_ENTRY_SIZE).unwrap();
    assert!(entry.iter().all(|&byte| byte == 0));
  }
}

// vim:ts=2 sw=2
