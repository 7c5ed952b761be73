//! Hierarchical names.
//!
//! A [`Name`] is an ordered list of opaque byte [`Component`]s. The consumer
//! appends one sequence-number component to its prefix for every request and
//! reads it back from the reply's name.
//!
//! Sequence-number components use the marker convention: a `0x00` marker byte
//! followed by a big-endian non-negative integer of 1, 2, 4 or 8 bytes.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::core::NameError;
use crate::core::constants::SEQUENCE_NUMBER_MARKER;

/// A single name component.
///
/// Components order canonically: shorter components first, equal lengths
/// compared byte by byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Component(Vec<u8>);

impl Component {
    /// Create a component from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Encode a sequence number component.
    pub fn from_sequence_number(sequence: u64) -> Self {
        let mut bytes = Vec::with_capacity(9);
        bytes.push(SEQUENCE_NUMBER_MARKER);
        if sequence <= u8::MAX as u64 {
            bytes.push(sequence as u8);
        } else if sequence <= u16::MAX as u64 {
            bytes.extend_from_slice(&(sequence as u16).to_be_bytes());
        } else if sequence <= u32::MAX as u64 {
            bytes.extend_from_slice(&(sequence as u32).to_be_bytes());
        } else {
            bytes.extend_from_slice(&sequence.to_be_bytes());
        }
        Self(bytes)
    }

    /// Raw component bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether this component carries a sequence number.
    pub fn is_sequence_number(&self) -> bool {
        self.to_sequence_number().is_ok()
    }

    /// Decode the sequence number carried by this component.
    pub fn to_sequence_number(&self) -> Result<u64, NameError> {
        let Some((&marker, value)) = self.0.split_first() else {
            return Err(NameError::NotSequenceNumber);
        };
        if marker != SEQUENCE_NUMBER_MARKER {
            return Err(NameError::NotSequenceNumber);
        }
        match value.len() {
            1 | 2 | 4 | 8 => Ok(value
                .iter()
                .fold(0u64, |acc, &byte| (acc << 8) | byte as u64)),
            _ => Err(NameError::NotSequenceNumber),
        }
    }

    fn decode_uri(text: &str) -> Result<Self, NameError> {
        let raw = text.as_bytes();
        let mut bytes = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'%' {
                let hex = raw
                    .get(i + 1..i + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| NameError::InvalidEscape(text.to_string()))?;
                bytes.push(hex);
                i += 3;
            } else {
                bytes.push(raw[i]);
                i += 1;
            }
        }
        Ok(Self(bytes))
    }
}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Component {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "%{:02X}", byte)?;
            }
        }
        Ok(())
    }
}

/// A hierarchical name.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name {
    components: Vec<Component>,
}

impl Name {
    /// The empty name (`/`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a name from components.
    pub fn from_components(components: Vec<Component>) -> Self {
        Self { components }
    }

    /// Append a component.
    pub fn push(&mut self, component: Component) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Append a sequence-number component.
    pub fn append_sequence_number(&mut self, sequence: u32) -> &mut Self {
        self.push(Component::from_sequence_number(sequence as u64))
    }

    /// Copy of this name with a sequence-number component appended.
    pub fn with_sequence_number(&self, sequence: u32) -> Self {
        let mut name = self.clone();
        name.append_sequence_number(sequence);
        name
    }

    /// Sequence number carried by the trailing component.
    pub fn sequence_number(&self) -> Result<u32, NameError> {
        let last = self.last().ok_or(NameError::MissingComponent)?;
        let value = last.to_sequence_number()?;
        u32::try_from(value).map_err(|_| NameError::NotSequenceNumber)
    }

    /// Component at `index`.
    pub fn get(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    /// Trailing component.
    pub fn last(&self) -> Option<&Component> {
        self.components.last()
    }

    /// All components.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether this is the empty name.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Whether `self` is a prefix of `other`.
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        other.components.starts_with(&self.components)
    }
}

impl FromStr for Name {
    type Err = NameError;

    /// Parse a URI such as `/video/seg` or `ndn:/video/%00%05`.
    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let path = uri.strip_prefix("ndn:").unwrap_or(uri);
        let components = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(Component::decode_uri)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { components })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("/");
        }
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_component_widths() {
        assert_eq!(Component::from_sequence_number(5).as_bytes(), &[0x00, 0x05]);
        assert_eq!(
            Component::from_sequence_number(0x0102).as_bytes(),
            &[0x00, 0x01, 0x02]
        );
        assert_eq!(
            Component::from_sequence_number(0x0001_0000).as_bytes(),
            &[0x00, 0x00, 0x01, 0x00, 0x00]
        );
        assert_eq!(Component::from_sequence_number(1 << 40).as_bytes().len(), 9);
    }

    #[test]
    fn test_sequence_component_decode() {
        for seq in [0u64, 255, 256, 65_535, 65_536, u32::MAX as u64, 1 << 40] {
            let component = Component::from_sequence_number(seq);
            assert_eq!(component.to_sequence_number(), Ok(seq));
        }
    }

    #[test]
    fn test_non_sequence_component_rejected() {
        assert_eq!(
            Component::new("seg").to_sequence_number(),
            Err(NameError::NotSequenceNumber)
        );
        // Marker with a 3-byte integer is not a valid width
        assert_eq!(
            Component::new(vec![0x00, 1, 2, 3]).to_sequence_number(),
            Err(NameError::NotSequenceNumber)
        );
        assert!(!Component::new(Vec::new()).is_sequence_number());
    }

    #[test]
    fn test_name_parse_and_display() {
        let name: Name = "/video/seg".parse().unwrap();
        assert_eq!(name.len(), 2);
        assert_eq!(name.to_string(), "/video/seg");

        let with_scheme: Name = "ndn:/video//seg/".parse().unwrap();
        assert_eq!(with_scheme, name);

        let root: Name = "/".parse().unwrap();
        assert!(root.is_empty());
        assert_eq!(root.to_string(), "/");
    }

    #[test]
    fn test_name_percent_escapes() {
        let name = Name::new().with_sequence_number(7);
        assert_eq!(name.to_string(), "/%00%07");

        let parsed: Name = "/%00%07".parse().unwrap();
        assert_eq!(parsed.sequence_number(), Ok(7));

        assert!(matches!(
            "/bad%zz".parse::<Name>(),
            Err(NameError::InvalidEscape(_))
        ));
        assert!(matches!(
            "/bad%4".parse::<Name>(),
            Err(NameError::InvalidEscape(_))
        ));
    }

    #[test]
    fn test_trailing_sequence_number() {
        let prefix: Name = "/prefix".parse().unwrap();
        let name = prefix.with_sequence_number(300);
        assert_eq!(name.sequence_number(), Ok(300));
        assert!(prefix.is_prefix_of(&name));
        assert!(!name.is_prefix_of(&prefix));

        assert_eq!(prefix.sequence_number(), Err(NameError::NotSequenceNumber));
        assert_eq!(Name::new().sequence_number(), Err(NameError::MissingComponent));

        // 8-byte sequence numbers do not fit the consumer's u32 space
        let mut big = prefix.clone();
        big.push(Component::from_sequence_number(1 << 40));
        assert_eq!(big.sequence_number(), Err(NameError::NotSequenceNumber));
    }

    #[test]
    fn test_canonical_component_order() {
        let short = Component::new("zz");
        let long = Component::new("aaa");
        assert!(short < long);

        let a = Name::new().with_sequence_number(1);
        let b = Name::new().with_sequence_number(2);
        let c = Name::new().with_sequence_number(256);
        assert!(a < b && b < c);
    }
}
