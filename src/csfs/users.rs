use fancy_regex::Regex;
use itertools::Itertools;
use sha2::{Digest, Sha256};

use super::errno::Errno;
use super::layout::{UserIndex, ADMIN_INDEX, MAX_USERS, USER_FIELD_LEN};

pub const ADMIN_NAME: &str = "admin";
pub const ADMIN_DEFAULT_PASSWORD: &str = "admin";
/// Name and password of an unused slot
pub const FREE_SLOT: &str = "0";

/// One slot of the user table. `password` holds a digest, never the
/// password itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passwd {
  pub name: String,
  pub password: String,
}

impl Passwd {
  fn free() -> Self {
    Self {
      name: FREE_SLOT.to_owned(),
      password: FREE_SLOT.to_owned(),
    }
  }

  pub fn is_free(&self) -> bool {
    self.name == FREE_SLOT
  }

  /// First 8 bytes of SHA-256, hex encoded to fill a 16-byte field
  pub fn digest(password: &str) -> String {
    let hash = Sha256::digest(password.as_bytes());
    hex::encode(&hash[..USER_FIELD_LEN / 2])
  }
}

/// Fixed table of `MAX_USERS` slots; slot 0 is always `admin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTable {
  slots: Vec<Passwd>,
}

impl Default for UserTable {
  fn default() -> Self {
    let admin = Passwd {
      name: ADMIN_NAME.to_owned(),
      password: Passwd::digest(ADMIN_DEFAULT_PASSWORD),
    };

    Self {
      slots: std::iter::once(admin)
        .chain((1..MAX_USERS).map(|_| Passwd::free()))
        .collect(),
    }
  }
}

impl UserTable {
  /// Printable ASCII, 1..=16 characters
  fn is_valid_name(name: &str) -> bool {
    let printable = Regex::new(r"^[\x21-\x7e]{1,16}$")
      .and_then(|re| re.is_match(name))
      .unwrap_or(false);

    printable && name != FREE_SLOT
  }

  pub fn count(&self) -> usize {
    self.slots.iter().filter(|slot| !slot.is_free()).count()
  }

  /// Active user names with their slot index
  pub fn users(&self) -> Vec<(UserIndex, String)> {
    self.slots
      .iter()
      .enumerate()
      .filter(|(_, slot)| !slot.is_free())
      .map(|(index, slot)| (index as UserIndex, slot.name.clone()))
      .collect()
  }

  pub fn name_of(&self, index: UserIndex) -> Option<&str> {
    self.slots
      .get(index as usize)
      .filter(|slot| !slot.is_free())
      .map(|slot| slot.name.as_str())
  }

  pub fn index_of(&self, name: &str) -> Option<UserIndex> {
    if name == FREE_SLOT {
      return None;
    }

    self.slots
      .iter()
      .position(|slot| slot.name == name)
      .map(|index| index as UserIndex)
  }

  pub fn check_credentials(&self, name: &str, password: &str) -> Option<UserIndex> {
    let index = self.index_of(name)?;
    let digest = Passwd::digest(password);

    (self.slots[index as usize].password == digest).then(|| index)
  }

  pub fn add(&mut self, name: &str, password: &str) -> Result<UserIndex, Errno> {
    // Guard for malformed name
    if !Self::is_valid_name(name) {
      return Err(Errno::InvalidArgument("users: name must be 1-16 printable characters"));
    }
    if password.is_empty() {
      return Err(Errno::InvalidArgument("users: empty password"));
    }
    // Guard for duplicate
    if self.index_of(name).is_some() {
      return Err(Errno::InvalidArgument("users: name already taken"));
    }

    let index = self.slots
      .iter()
      .position(Passwd::is_free)
      .ok_or(Errno::ResourceExhausted("users: no free user slot"))?;

    self.slots[index] = Passwd {
      name: name.to_owned(),
      password: Passwd::digest(password),
    };

    Ok(index as UserIndex)
  }

  pub fn remove(&mut self, name: &str) -> Result<UserIndex, Errno> {
    let index = self.index_of(name)
      .ok_or(Errno::InvalidArgument("users: no such user"))?;

    // Guard for admin
    if index == ADMIN_INDEX {
      return Err(Errno::InvalidArgument("users: admin cannot be deleted"));
    }

    self.slots[index as usize] = Passwd::free();

    Ok(index)
  }

  /// Names then passwords, each right-justified in a 16-byte field
  pub fn to_bytes(&self) -> Vec<u8> {
    let field = |value: &String| format!("{value:>16}").into_bytes();

    self.slots
      .iter()
      .map(|slot| field(&slot.name))
      .chain(self.slots.iter().map(|slot| field(&slot.password)))
      .concat()
  }

  pub fn from_bytes(bytes: &[u8], max_users: usize) -> Result<Self, Errno> {
    // Guard for geometry
    if max_users != MAX_USERS || bytes.len() < 2 * MAX_USERS * USER_FIELD_LEN {
      return Err(Errno::CorruptImage("users: unexpected user table size"));
    }

    let fields = bytes
      .chunks_exact(USER_FIELD_LEN)
      .take(2 * MAX_USERS)
      .map(|field| {
        String::from_utf8_lossy(field)
          .trim_matches(|c: char| c == ' ' || c == '\0')
          .to_owned()
      })
      .collect::<Vec<String>>();

    let (names, passwords) = fields.split_at(MAX_USERS);
    let slots = names
      .iter()
      .zip(passwords)
      .map(|(name, password)| Passwd {
        name: name.clone(),
        password: password.clone(),
      })
      .collect::<Vec<Passwd>>();

    // Guard for missing admin
    if slots[ADMIN_INDEX as usize].name != ADMIN_NAME {
      return Err(Errno::CorruptImage("users: slot 0 is not admin"));
    }

    Ok(Self { slots })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_table_has_only_admin() {
    let users = UserTable::default();

    assert_eq!(users.count(), 1);
    assert_eq!(users.users(), vec![(0, String::from("admin"))]);
    assert_eq!(users.check_credentials("admin", "admin"), Some(0));
    assert_eq!(users.check_credentials("admin", "nimda"), None);
    assert_eq!(users.index_of("0"), None);
  }

  #[test]
  fn add_fills_first_free_slot() {
    let mut users = UserTable::default();

    assert_eq!(users.add("alice", "pw1").unwrap(), 1);
    assert_eq!(users.add("bob", "pw2").unwrap(), 2);
    users.remove("alice").unwrap();
    assert_eq!(users.add("carol", "pw3").unwrap(), 1);
    assert_eq!(users.check_credentials("carol", "pw3"), Some(1));
  }

  #[test]
  fn add_rejects_bad_names() {
    let mut users = UserTable::default();

    for name in ["", "0", "has space", "seventeen-chars-x", "admin"] {
      assert!(matches!(users.add(name, "pw"), Err(Errno::InvalidArgument(_))), "{name}");
    }
    assert!(matches!(users.add("dave", ""), Err(Errno::InvalidArgument(_))));
  }

  #[test]
  fn table_fills_up() {
    let mut users = UserTable::default();
    for i in 1..MAX_USERS {
      users.add(&format!("user{i}"), "pw").unwrap();
    }

    assert_eq!(
      users.add("late", "pw"),
      Err(Errno::ResourceExhausted("users: no free user slot"))
    );
  }

  #[test]
  fn admin_is_permanent() {
    let mut users = UserTable::default();
    assert_eq!(
      users.remove("admin"),
      Err(Errno::InvalidArgument("users: admin cannot be deleted"))
    );
  }

  #[test]
  fn bytes_are_right_justified() {
    let mut users = UserTable::default();
    users.add("bob", "secret").unwrap();

    let bytes = users.to_bytes();
    assert_eq!(bytes.len(), 256);
    assert_eq!(&bytes[0..16], b"           admin");
    assert_eq!(&bytes[32..48], b"               0");
    assert_eq!(UserTable::from_bytes(&bytes, MAX_USERS).unwrap(), users);
  }

  #[test]
  fn digest_fills_the_field() {
    assert_eq!(Passwd::digest("admin").len(), USER_FIELD_LEN);
    assert_ne!(Passwd::digest("admin"), Passwd::digest("admin "));
  }
}

// vim:ts=2 sw=2
