/*!
 * Inline Strings
 * Short text carried by messages and error reports, stored without a heap
 * allocation when it fits
 */

use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;
use std::fmt;
use std::ops::Deref;

/// Text that stays inline up to 23 bytes and spills to the heap beyond
///
/// Message kinds such as `"update-request"` always fit; panic payloads
/// usually do.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InlineString(SmartString);

impl InlineString {
    /// Copy at most `max_bytes` of `text`, cut back to a char boundary
    pub fn bounded(text: &str, max_bytes: usize) -> Self {
        if text.len() <= max_bytes {
            return Self::from(text);
        }
        let mut end = max_bytes;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        Self::from(&text[..end])
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether the text lives in the struct itself
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.0.is_inline()
    }
}

impl From<&str> for InlineString {
    #[inline]
    fn from(text: &str) -> Self {
        Self(SmartString::from(text))
    }
}

impl From<String> for InlineString {
    #[inline]
    fn from(text: String) -> Self {
        Self(SmartString::from(text))
    }
}

impl Deref for InlineString {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for InlineString {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for InlineString {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for InlineString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
