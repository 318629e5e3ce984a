use std::fmt;

use chrono::{Datelike, Local, Timelike};

const MONTHS: [&str; 12] = [
  "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// `[year % 2000, month, day, hour, minute, second]`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(pub [u8; 6]);

impl Timestamp {
  pub fn now() -> Self {
    let now = Local::now();

    Self([
      (now.year() % 2000) as u8,
      now.month() as u8,
      now.day() as u8,
      now.hour() as u8,
      now.minute() as u8,
      now.second() as u8,
    ])
  }

  pub fn to_bytes(&self) -> [u8; 6] {
    self.0
  }

  pub fn from_bytes(bytes: &[u8]) -> Self {
    let mut raw = [0u8; 6];
    raw.copy_from_slice(&bytes[..6]);
    Self(raw)
  }
}

/// `DD Mon YY HH:MM`, or dashes for a never-set stamp
impl fmt::Display for Timestamp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let [year, month, day, hour, minute, _second] = self.0;

    match MONTHS.get((month as usize).wrapping_sub(1)) {
      Some(month) => write!(f, "{day:2} {month} {year:02} {hour:02}:{minute:02}"),
      None => write!(f, "-- --- -- --:--"),
    }
  }
}

/// Temporary backing file removed on drop
#[cfg(test)]
pub struct TempFile(std::path::PathBuf);

#[cfg(test)]
impl TempFile {
  pub fn path(&self) -> &std::path::Path {
    &self.0
  }
}

#[cfg(test)]
impl Drop for TempFile {
  fn drop(&mut self) {
    let _ = std::fs::remove_file(&self.0);
  }
}

#[cfg(test)]
pub fn mktemp() -> TempFile {
  let name = format!("csfs-{}.img", uuid::Uuid::new_v4());
  TempFile(std::env::temp_dir().join(name))
}

/// Unique empty directory, for host-side import/export tests
#[cfg(test)]
pub fn mktempdir() -> std::path::PathBuf {
  let path = std::env::temp_dir().join(format!("csfs-{}", uuid::Uuid::new_v4()));
  std::fs::create_dir_all(&path).unwrap();
  path
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamp_display() {
    assert_eq!(Timestamp([23, 10, 5, 14, 7, 59]).to_string(), " 5 Oct 23 14:07");
    assert_eq!(Timestamp::default().to_string(), "-- --- -- --:--");
  }

  #[test]
  fn now_is_in_range() {
    let Timestamp([_, month, day, hour, minute, second]) = Timestamp::now();
    assert!((1..=12).contains(&month));
    assert!((1..=31).contains(&day));
    assert!(hour < 24 && minute < 60 && second < 61);
  }
}

// vim:ts=2 sw=2
