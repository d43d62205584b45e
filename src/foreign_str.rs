//! Defensive access to string fields read out of a loaded asset dump.
//!
//! Names in the object model come from deserialized, possibly truncated or hostile
//! package data. A field is modelled as a byte buffer plus the number of bytes that
//! can actually be read; touching a byte past that point is the equivalent of an
//! invalid memory access and turns the whole field invalid instead of faulting.

use serde::{Deserialize, Deserializer};

/// Upper bound for the nul-terminator scan.
pub const MAX_NAME_SCAN: usize = 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ForeignStr {
    #[default]
    Absent,
    Raw { bytes: Vec<u8>, readable: usize },
}

impl ForeignStr {
    /// Well-formed, nul-terminated text.
    pub fn text(value: &str) -> Self {
        let mut bytes = Vec::with_capacity(value.len() + 1);
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(0);
        let readable = bytes.len();
        Self::Raw { bytes, readable }
    }

    /// Raw bytes exactly as found, with no terminator appended.
    pub fn raw(bytes: Vec<u8>) -> Self {
        let readable = bytes.len();
        Self::Raw { bytes, readable }
    }

    /// Raw bytes of which only the first `readable` can be touched.
    pub fn truncated(bytes: Vec<u8>, readable: usize) -> Self {
        let readable = readable.min(bytes.len());
        Self::Raw { bytes, readable }
    }

    /// A pointer into memory that cannot be read at all.
    pub fn unreadable() -> Self {
        Self::Raw {
            bytes: Vec::new(),
            readable: 0,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Reads one byte, `None` meaning the read would fault.
    fn byte_at(&self, index: usize) -> Option<u8> {
        match self {
            Self::Absent => None,
            Self::Raw { bytes, readable } => {
                if index >= *readable {
                    None
                } else {
                    bytes.get(index).copied()
                }
            }
        }
    }

    fn terminator_within(&self, max_len: usize) -> Option<usize> {
        (0..max_len)
            .map(|i| self.byte_at(i).map(|b| (i, b)))
            .take_while(Option::is_some)
            .flatten()
            .find(|(_, b)| *b == 0)
            .map(|(i, _)| i)
    }
}

/// True when a nul terminator is reachable within `max_len` bytes without reading
/// past the readable part of the field.
pub fn is_valid_string(field: &ForeignStr, max_len: usize) -> bool {
    field.terminator_within(max_len).is_some()
}

/// Validated reader for name fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameReader {
    pub limit: usize,
}

impl Default for NameReader {
    fn default() -> Self {
        Self {
            limit: MAX_NAME_SCAN,
        }
    }
}

impl NameReader {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn is_valid(&self, field: &ForeignStr) -> bool {
        is_valid_string(field, self.limit)
    }

    /// The text before the terminator, or `None` for absent or corrupt fields.
    pub fn read(&self, field: &ForeignStr) -> Option<String> {
        let end = field.terminator_within(self.limit)?;
        match field {
            ForeignStr::Raw { bytes, .. } => {
                Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
            }
            ForeignStr::Absent => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ForeignStrRepr {
    Text(String),
    Raw {
        bytes: Vec<u8>,
        #[serde(default)]
        readable: Option<usize>,
    },
}

impl<'de> Deserialize<'de> for ForeignStr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = Option::<ForeignStrRepr>::deserialize(deserializer)?;
        Ok(match repr {
            None => ForeignStr::Absent,
            Some(ForeignStrRepr::Text(s)) => ForeignStr::text(&s),
            Some(ForeignStrRepr::Raw { bytes, readable }) => {
                let readable = readable.unwrap_or(bytes.len());
                ForeignStr::truncated(bytes, readable)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminated_text_is_valid() {
        let reader = NameReader::default();
        let name = ForeignStr::text("Wall_D");
        assert!(reader.is_valid(&name));
        assert_eq!(reader.read(&name).as_deref(), Some("Wall_D"));
    }

    #[test]
    fn empty_text_is_valid() {
        assert_eq!(NameReader::default().read(&ForeignStr::text("")).as_deref(), Some(""));
    }

    #[test]
    fn absent_and_unreadable_are_invalid() {
        assert!(!is_valid_string(&ForeignStr::Absent, MAX_NAME_SCAN));
        assert!(!is_valid_string(&ForeignStr::unreadable(), MAX_NAME_SCAN));
    }

    #[test]
    fn unterminated_buffer_is_invalid() {
        let field = ForeignStr::raw(b"Rock_N".to_vec());
        assert!(!is_valid_string(&field, MAX_NAME_SCAN));
    }

    #[test]
    fn terminator_beyond_readable_region_is_invalid() {
        let field = ForeignStr::truncated(b"Rock_N\0".to_vec(), 4);
        assert!(!is_valid_string(&field, MAX_NAME_SCAN));
        assert!(NameReader::default().read(&field).is_none());
    }

    #[test]
    fn terminator_beyond_scan_limit_is_invalid() {
        let mut bytes = vec![b'a'; 2000];
        bytes.push(0);
        let field = ForeignStr::raw(bytes);
        assert!(!is_valid_string(&field, MAX_NAME_SCAN));
        assert!(is_valid_string(&field, 4096));
    }

    #[test]
    fn invalid_utf8_is_read_lossily() {
        let field = ForeignStr::raw(vec![b'T', 0xFF, b'x', 0]);
        let got = NameReader::default().read(&field).unwrap();
        assert!(got.starts_with('T'));
        assert!(got.ends_with('x'));
    }

    #[test]
    fn deserializes_all_forms() {
        let fields: Vec<ForeignStr> = serde_json::from_str(
            r#"[null, "Wall_D", {"bytes": [65, 66]}, {"bytes": [65, 0], "readable": 1}]"#,
        )
        .unwrap();
        let reader = NameReader::default();
        assert!(fields[0].is_absent());
        assert_eq!(reader.read(&fields[1]).as_deref(), Some("Wall_D"));
        assert!(reader.read(&fields[2]).is_none());
        assert!(reader.read(&fields[3]).is_none());
    }
}
