use std::collections::BTreeMap;

use super::errno::Errno;
use super::inode::INode;
use super::layout::{InodeNumber, ROOT_INODE_NUMBER};

/// Children of one directory. `children` and `names` are positionally
/// paired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dentry {
  pub parent: InodeNumber,
  pub children: Vec<InodeNumber>,
  pub names: Vec<String>,
}

impl Dentry {
  pub fn new(parent: InodeNumber) -> Self {
    Self {
      parent,
      children: Vec::new(),
      names: Vec::new(),
    }
  }

  fn position_of_name(&self, name: &str) -> Option<usize> {
    self.names.iter().position(|entry| entry == name)
  }

  fn position_of_child(&self, child: InodeNumber) -> Option<usize> {
    self.children.iter().position(|&entry| entry == child)
  }
}

/// In-memory directory structure, one `Dentry` per live directory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryTree {
  dentries: BTreeMap<InodeNumber, Dentry>,
}

impl DirectoryTree {
  /// Rebuild from inode parent pointers. Children are ordered by inode
  /// number.
  pub fn rebuild(inodes: &BTreeMap<InodeNumber, INode>) -> Result<Self, Errno> {
    let mut tree = Self::default();

    for inode in inodes.values().filter(|inode| inode.is_dir()) {
      let parent = if inode.number == ROOT_INODE_NUMBER {
        ROOT_INODE_NUMBER
      } else {
        inode.parent
      };
      tree.add_directory(inode.number, parent);
    }

    for inode in inodes.values().filter(|inode| inode.number != ROOT_INODE_NUMBER) {
      tree.insert(inode.parent, inode.number, &inode.name)
        .map_err(|_| Errno::CorruptImage("dentry: duplicate or orphaned entry"))?;
    }

    Ok(tree)
  }

  pub fn add_directory(&mut self, number: InodeNumber, parent: InodeNumber) {
    self.dentries.insert(number, Dentry::new(parent));
  }

  pub fn remove_directory(&mut self, number: InodeNumber) {
    self.dentries.remove(&number);
  }

  pub fn is_dir(&self, number: InodeNumber) -> bool {
    self.dentries.contains_key(&number)
  }

  pub fn dentry(&self, number: InodeNumber) -> Result<&Dentry, Errno> {
    self.dentries
      .get(&number)
      .ok_or(Errno::InvalidPath("dentry: not a directory"))
  }

  fn dentry_mut(&mut self, number: InodeNumber) -> Result<&mut Dentry, Errno> {
    self.dentries
      .get_mut(&number)
      .ok_or(Errno::InvalidPath("dentry: not a directory"))
  }

  /// Parent of directory `number`; root is its own parent
  pub fn parent_of(&self, number: InodeNumber) -> Result<InodeNumber, Errno> {
    Ok(self.dentry(number)?.parent)
  }

  pub fn lookup(&self, directory: InodeNumber, name: &str) -> Option<InodeNumber> {
    let dentry = self.dentries.get(&directory)?;
    dentry.position_of_name(name).map(|i| dentry.children[i])
  }

  pub fn contains_name(&self, directory: InodeNumber, name: &str) -> bool {
    self.lookup(directory, name).is_some()
  }

  /// `(child, name)` pairs in insertion order
  pub fn entries(&self, directory: InodeNumber) -> Result<Vec<(InodeNumber, String)>, Errno> {
    let dentry = self.dentry(directory)?;

    Ok(dentry.children
      .iter()
      .copied()
      .zip(dentry.names.iter().cloned())
      .collect())
  }

  pub fn is_empty(&self, directory: InodeNumber) -> bool {
    self.dentries
      .get(&directory)
      .map_or(true, |dentry| dentry.children.is_empty())
  }

  pub fn insert(&mut self, directory: InodeNumber, child: InodeNumber, name: &str) -> Result<(), Errno> {
    let dentry = self.dentry_mut(directory)?;

    // Guard for sibling with the same name
    if dentry.position_of_name(name).is_some() {
      return Err(Errno::AlreadyExists("dentry: name already taken"));
    }

    dentry.children.push(child);
    dentry.names.push(name.to_owned());

    if let Some(moved) = self.dentries.get_mut(&child) {
      moved.parent = directory;
    }

    Ok(())
  }

  pub fn remove(&mut self, directory: InodeNumber, child: InodeNumber) -> Result<(), Errno> {
    let dentry = self.dentry_mut(directory)?;
    let i = dentry.position_of_child(child)
      .ok_or(Errno::InvalidPath("dentry: no such entry"))?;

    dentry.children.remove(i);
    dentry.names.remove(i);

    Ok(())
  }

  pub fn rename(&mut self, directory: InodeNumber, child: InodeNumber, name: &str) -> Result<(), Errno> {
    let dentry = self.dentry_mut(directory)?;

    if dentry.position_of_name(name).is_some() {
      return Err(Errno::AlreadyExists("dentry: name already taken"));
    }

    let i = dentry.position_of_child(child)
      .ok_or(Errno::InvalidPath("dentry: no such entry"))?;
    dentry.names[i] = name.to_owned();

    Ok(())
  }

  /// True when `ancestor` is `number` or lies on its path to root
  pub fn is_ancestor(&self, ancestor: InodeNumber, number: InodeNumber) -> bool {
    let mut current = number;

    loop {
      if current == ancestor {
        return true;
      }
      match self.dentries.get(&current) {
        Some(dentry) if current != ROOT_INODE_NUMBER => current = dentry.parent,
        _ => return false,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::csfs::inode::FileType;

  fn inode(number: InodeNumber, parent: InodeNumber, name: &str, file_type: FileType) -> INode {
    INode {
      parent,
      name: name.to_owned(),
      file_type,
      ..INode::new(number)
    }
  }

  fn sample() -> BTreeMap<InodeNumber, INode> {
    [
      inode(0, 0, "", FileType::Directory),
      inode(1, 0, "docs", FileType::Directory),
      inode(2, 1, "a.txt", FileType::File),
      inode(3, 0, "b.txt", FileType::File),
    ]
    .into_iter()
    .map(|inode| (inode.number, inode))
    .collect()
  }

  #[test]
  fn rebuild_links_every_child() {
    let tree = DirectoryTree::rebuild(&sample()).unwrap();

    assert_eq!(
      tree.entries(0).unwrap(),
      vec![(1, String::from("docs")), (3, String::from("b.txt"))]
    );
    assert_eq!(tree.lookup(1, "a.txt"), Some(2));
    assert_eq!(tree.parent_of(1).unwrap(), 0);
    assert_eq!(tree.parent_of(0).unwrap(), 0);
    assert!(!tree.is_dir(2));
  }

  #[test]
  fn rebuild_rejects_duplicate_names() {
    let mut inodes = sample();
    inodes.insert(4, inode(4, 0, "docs", FileType::File));

    assert!(matches!(DirectoryTree::rebuild(&inodes), Err(Errno::CorruptImage(_))));
  }

  #[test]
  fn insert_and_remove_keep_pairs_aligned() {
    let mut tree = DirectoryTree::rebuild(&sample()).unwrap();

    assert_eq!(
      tree.insert(0, 9, "docs"),
      Err(Errno::AlreadyExists("dentry: name already taken"))
    );
    tree.insert(0, 9, "c.txt").unwrap();
    tree.remove(0, 1).unwrap();

    let dentry = tree.dentry(0).unwrap();
    assert_eq!(dentry.children, vec![3, 9]);
    assert_eq!(dentry.names, vec!["b.txt", "c.txt"]);
  }

  #[test]
  fn rename_refuses_collision() {
    let mut tree = DirectoryTree::rebuild(&sample()).unwrap();

    assert!(tree.rename(0, 3, "docs").is_err());
    tree.rename(0, 3, "renamed").unwrap();
    assert_eq!(tree.lookup(0, "renamed"), Some(3));
    assert_eq!(tree.lookup(0, "b.txt"), None);
  }

  #[test]
  fn ancestry() {
    let mut inodes = sample();
    inodes.insert(5, inode(5, 1, "deep", FileType::Directory));
    let tree = DirectoryTree::rebuild(&inodes).unwrap();

    assert!(tree.is_ancestor(1, 5));
    assert!(tree.is_ancestor(0, 5));
    assert!(tree.is_ancestor(5, 5));
    assert!(!tree.is_ancestor(5, 1));
  }
}

// vim:ts=2 sw=2
