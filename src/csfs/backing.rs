use std::fs::{File, OpenOptions};
use std::io::prelude::*;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use log::debug;

use super::errno::Errno;
use super::layout::IMAGE_SIZE;

/// The host file holding the entire image.
///
/// Owned exclusively by one mounted [`Filesystem`](super::fs::Filesystem);
/// every access is a blocking seek followed by a full read or write.
#[derive(Debug)]
pub struct BackingStore {
  realfile: File,
  realpath: PathBuf,
}

impl BackingStore {
  /// Create (or truncate) the host file and size it to a full image.
  pub fn create(realpath: &Path) -> Result<Self, Errno> {
    let realfile = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(true)
      .open(realpath)?;
    realfile.set_len(IMAGE_SIZE)?;

    debug!("backing: created {} ({IMAGE_SIZE} bytes)", realpath.display());

    Ok(Self {
      realfile,
      realpath: realpath.to_owned(),
    })
  }

  pub fn open(realpath: &Path) -> Result<Self, Errno> {
    let realfile = OpenOptions::new()
      .read(true)
      .write(true)
      .open(realpath)?;

    // Guard for truncated image
    if realfile.metadata()?.len() < IMAGE_SIZE {
      return Err(Errno::CorruptImage("backing file is smaller than an image"));
    }

    Ok(Self {
      realfile,
      realpath: realpath.to_owned(),
    })
  }

  pub fn realpath(&self) -> &Path {
    &self.realpath
  }

  pub fn read_at(&mut self, offset: u64, count: usize) -> Result<Vec<u8>, Errno> {
    let mut bytes = vec![0u8; count];

    self.realfile.seek(SeekFrom::Start(offset))?;
    self.realfile.read_exact(&mut bytes)?;

    Ok(bytes)
  }

  pub fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<(), Errno> {
    self.realfile.seek(SeekFrom::Start(offset))?;
    self.realfile.write_all(bytes)?;

    Ok(())
  }

  pub fn flush(&mut self) -> Result<(), Errno> {
    self.realfile.flush()?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::mktemp;

  #[test]
  fn write_then_read_back() {
    let tempfile = mktemp();
    let mut store = BackingStore::create(tempfile.path()).unwrap();

    store.write_at(1000, b"csfs").unwrap();
    assert_eq!(store.read_at(1000, 4).unwrap(), b"csfs");
    assert_eq!(store.read_at(0, 2).unwrap(), vec![0, 0]);
  }

  #[test]
  fn read_past_end_is_corrupt_image() {
    let tempfile = mktemp();
    let mut store = BackingStore::create(tempfile.path()).unwrap();

    match store.read_at(IMAGE_SIZE - 2, 4) {
      Err(errno) => assert_eq!(errno, Errno::CorruptImage("short read from backing store")),
      _ => unreachable!(),
    }
  }

  #[test]
  fn open_rejects_short_file() {
    let tempfile = mktemp();
    std::fs::write(tempfile.path(), b"CS").unwrap();

    assert!(matches!(
      BackingStore::open(tempfile.path()),
      Err(Errno::CorruptImage(_))
    ));
  }
}

// vim:ts=2 sw=2
