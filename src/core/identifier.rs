//! Student identifier (USN) arithmetic.
//!
//! An identifier is everything before its trailing run of digits (the prefix)
//! followed by that run read as a number. Derived identifiers are always
//! rendered with a three digit suffix, whatever the width of the input was.

use crate::utils::error::{AllocError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Width every numeric suffix is padded to when rendered.
pub const IDENTIFIER_WIDTH: usize = 3;

// 前綴用非貪婪比對，尾端整段數字才會落在第二組
static IDENTIFIER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)([0-9]+)$").expect("identifier pattern compiles"));

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    prefix: String,
    numeric: u64,
    width: usize,
}

impl Identifier {
    /// Splits `raw` at the start of its trailing digit run.
    ///
    /// The digit run is held as a `u64`. A run too large for it (about 20
    /// digits or more) is rejected with `InvalidFormat`, the same as a
    /// missing run.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let caps = IDENTIFIER_PATTERN.captures(trimmed).ok_or_else(|| {
            AllocError::invalid_format("identifier", raw, "expected a trailing numeric part")
        })?;

        let numeric = caps[2].parse::<u64>().map_err(|e| {
            AllocError::invalid_format("identifier", raw, format!("numeric part: {}", e))
        })?;

        Ok(Self {
            prefix: caps[1].to_string(),
            numeric,
            width: IDENTIFIER_WIDTH,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn numeric(&self) -> u64 {
        self.numeric
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Identifier `increment` positions after this one.
    pub fn next(&self, increment: u64) -> Result<Self> {
        let numeric = self.numeric.checked_add(increment).ok_or_else(|| {
            AllocError::invalid_format(
                "identifier",
                self.to_string(),
                format!("cannot advance by {}", increment),
            )
        })?;

        Ok(Self {
            prefix: self.prefix.clone(),
            numeric,
            width: self.width,
        })
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:0width$}", self.prefix, self.numeric, width = self.width)
    }
}

impl FromStr for Identifier {
    type Err = AllocError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// String-level shortcut for `Identifier::parse(raw)?.next(increment)`.
pub fn next_identifier(raw: &str, increment: u64) -> Result<String> {
    Ok(Identifier::parse(raw)?.next(increment)?.to_string())
}
