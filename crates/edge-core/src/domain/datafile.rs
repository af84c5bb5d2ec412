//! Datafile identifiers and naming.
//!
//! A datafile belongs to exactly one user and is named
//! `{username}-{fileID}.txt`.  The client keeps it in its working directory;
//! the server keeps it under a per-user directory.  Because the username is
//! baked into the name, there is no path by which one user reaches another
//! user's data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a fileID string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileIdError {
    #[error("{0:?} is not an integer")]
    NotInteger(String),
    #[error("{0} is not a positive integer")]
    NotPositive(i64),
}

/// A positive datafile identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    /// Wraps `id`, rejecting zero.
    pub fn new(id: u32) -> Option<Self> {
        (id >= 1).then_some(Self(id))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for FileId {
    type Err = FileIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: i64 = s
            .trim()
            .parse()
            .map_err(|_| FileIdError::NotInteger(s.to_string()))?;
        if n < 1 {
            return Err(FileIdError::NotPositive(n));
        }
        u32::try_from(n)
            .map(Self)
            .map_err(|_| FileIdError::NotInteger(s.to_string()))
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the canonical datafile name, e.g. `alice-3.txt`.
pub fn datafile_name(username: &str, file_id: FileId) -> String {
    format!("{username}-{file_id}.txt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_positive_integers() {
        assert_eq!("7".parse::<FileId>().map(FileId::get), Ok(7));
        assert_eq!(" 12 ".parse::<FileId>().map(FileId::get), Ok(12));
    }

    #[test]
    fn test_parse_rejects_zero_and_negative() {
        assert_eq!("0".parse::<FileId>(), Err(FileIdError::NotPositive(0)));
        assert_eq!("-4".parse::<FileId>(), Err(FileIdError::NotPositive(-4)));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(matches!("abc".parse::<FileId>(), Err(FileIdError::NotInteger(_))));
        assert!(matches!("1.5".parse::<FileId>(), Err(FileIdError::NotInteger(_))));
        assert!(matches!("99999999999".parse::<FileId>(), Err(FileIdError::NotInteger(_))));
    }

    #[test]
    fn test_new_rejects_zero() {
        assert!(FileId::new(0).is_none());
        assert_eq!(FileId::new(1).map(FileId::get), Some(1));
    }

    #[test]
    fn test_datafile_name_format() {
        let id = FileId::new(3).unwrap();
        assert_eq!(datafile_name("Supersmartwatch", id), "Supersmartwatch-3.txt");
    }
}
