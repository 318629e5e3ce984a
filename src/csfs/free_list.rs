use log::debug;

use super::errno::Errno;

/// Array-encoded singly linked list of free slots.
///
/// `next[i] == i` marks slot `i` as in use, otherwise `next[i]` is the
/// free slot after `i`. The chain starts at `head` and ends at the
/// out-of-range sentinel `capacity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeList {
  next: Vec<u32>,
  head: u32,
  entry_width: usize,
}

impl FreeList {
  /// Fully free sequential chain where the first `reserved` slots are
  /// permanently in use.
  pub fn seeded(capacity: usize, entry_width: usize, reserved: usize) -> Self {
    let next = (0..capacity as u32)
      .map(|slot| {
        if (slot as usize) < reserved {
          slot
        } else {
          slot + 1
        }
      })
      .collect();

    Self {
      next,
      head: reserved as u32,
      entry_width,
    }
  }

  pub fn capacity(&self) -> usize {
    self.next.len()
  }

  pub fn head(&self) -> u32 {
    self.head
  }

  fn sentinel(&self) -> u32 {
    self.next.len() as u32
  }

  pub fn is_exhausted(&self) -> bool {
    self.head == self.sentinel()
  }

  pub fn is_used(&self, slot: u32) -> bool {
    self.next
      .get(slot as usize)
      .map_or(false, |&next| next == slot)
  }

  /// Occupied slots, ascending
  pub fn used_slots(&self) -> impl Iterator<Item = u32> + '_ {
    self.next
      .iter()
      .enumerate()
      .filter(|&(slot, &next)| slot as u32 == next)
      .map(|(slot, _)| slot as u32)
  }

  pub fn used_count(&self) -> usize {
    self.used_slots().count()
  }

  /// Pop the head slot and mark it used
  pub fn allocate(&mut self) -> Option<u32> {
    if self.is_exhausted() {
      return None;
    }

    let slot = self.head;
    self.head = self.next[slot as usize];
    self.next[slot as usize] = slot;

    Some(slot)
  }

  /// Push `slot` back as the new head.
  ///
  /// Refuses slots that are out of range or not currently in use, so a
  /// double release cannot splice a cycle into the chain.
  pub fn release(&mut self, slot: u32) -> Result<(), Errno> {
    // Guard for out of range slot
    if slot >= self.sentinel() {
      return Err(Errno::InvalidArgument("free_list: slot out of range"));
    }

    // Guard for double release
    if !self.is_used(slot) {
      return Err(Errno::InvalidArgument("free_list: slot is not allocated"));
    }

    self.next[slot as usize] = self.head;
    self.head = slot;

    Ok(())
  }

  /// Walk the chain from `head` and count free slots, rejecting chains
  /// that leave the array, touch a used slot, or loop.
  pub fn free_count(&self) -> Result<usize, Errno> {
    let sentinel = self.sentinel();
    let mut current = self.head;
    let mut visited = 0usize;

    while current != sentinel {
      // Guard for chain escaping the array
      if current > sentinel {
        return Err(Errno::CorruptImage("free_list: pointer out of range"));
      }

      let next = self.next[current as usize];
      if next == current {
        return Err(Errno::CorruptImage("free_list: chain reaches a used slot"));
      }

      visited += 1;
      if visited > self.next.len() {
        return Err(Errno::CorruptImage("free_list: chain loops"));
      }

      current = next;
    }

    Ok(visited)
  }

  /// `size (2) | head (2) | entries (entry_width each)`
  pub fn to_bytes(&self) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(4 + self.next.len() * self.entry_width);

    bytes.extend_from_slice(&(self.next.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&(self.head as u16).to_be_bytes());
    for &next in &self.next {
      match self.entry_width {
        2 => bytes.extend_from_slice(&(next as u16).to_be_bytes()),
        _ => bytes.extend_from_slice(&next.to_be_bytes()),
      }
    }

    bytes
  }

  pub fn from_bytes(bytes: &[u8], capacity: usize, entry_width: usize) -> Result<Self, Errno> {
    // Guard for truncated region
    if bytes.len() < 4 + capacity * entry_width {
      return Err(Errno::CorruptImage("free_list: region too short"));
    }

    let size = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    let head = u16::from_be_bytes([bytes[2], bytes[3]]) as u32;

    // Guard for foreign geometry
    if size != capacity {
      return Err(Errno::CorruptImage("free_list: unexpected list size"));
    }
    if head > capacity as u32 {
      return Err(Errno::CorruptImage("free_list: head out of range"));
    }

    let next = bytes[4..4 + capacity * entry_width]
      .chunks_exact(entry_width)
      .map(|chunk| match entry_width {
        2 => u16::from_be_bytes([chunk[0], chunk[1]]) as u32,
        _ => u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
      })
      .collect::<Vec<u32>>();

    if next.iter().any(|&slot| slot > capacity as u32) {
      return Err(Errno::CorruptImage("free_list: entry out of range"));
    }

    debug!("free_list: loaded {capacity} entries, head {head}");

    Ok(Self {
      next,
      head,
      entry_width,
    })
  }
}


// vim:ts=2 sw=2
