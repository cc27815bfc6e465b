//! A fixed-capacity buffer holding one serialized JSON document.

use heapless::Vec;
use serde::{Deserialize, Serialize};

/// The default capacity (in bytes) of a [`JsonDocument`].
pub const MSG_SIZE: usize = 256;

/// Errors produced while filling or reading a [`JsonDocument`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DocumentError {
    /// The serialized document does not fit in the buffer's capacity.
    ///
    /// Documents are never truncated.
    Overflow,
    /// The value could not be serialized as JSON.
    Serialize,
    /// The buffer does not hold valid JSON for the requested type.
    Deserialize,
}

/// A serialized JSON document of at most `N` bytes.
///
/// The transport treats the content as opaque bytes; the schema is up to the
/// application. Any [`serde`] type can be stored and restored:
/// ```
/// use rf24_transmitter::document::JsonDocument;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, PartialEq, Debug)]
/// struct Reading {
///     temperature: i16,
/// }
///
/// let doc: JsonDocument = JsonDocument::from_value(&Reading { temperature: 21 }).unwrap();
/// assert_eq!(doc.as_bytes(), br#"{"temperature":21}"#);
/// assert_eq!(doc.deserialize::<Reading>().unwrap(), Reading { temperature: 21 });
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JsonDocument<const N: usize = MSG_SIZE> {
    bytes: Vec<u8, N>,
}

impl<const N: usize> JsonDocument<N> {
    /// Create an empty document.
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Create a document holding the JSON serialization of `value`.
    pub fn from_value<T: Serialize + ?Sized>(value: &T) -> Result<Self, DocumentError> {
        let mut doc = Self::new();
        doc.serialize(value)?;
        Ok(doc)
    }

    /// Replace the content with the JSON serialization of `value`.
    ///
    /// Returns the serialized length. On error the document is left empty.
    pub fn serialize<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<usize, DocumentError> {
        self.bytes.clear();
        // cannot fail: the length equals the capacity
        let _ = self.bytes.resize_default(N);
        match serde_json_core::to_slice(value, &mut self.bytes) {
            Ok(len) => {
                self.bytes.truncate(len);
                Ok(len)
            }
            Err(serde_json_core::ser::Error::BufferFull) => {
                self.bytes.clear();
                Err(DocumentError::Overflow)
            }
            #[allow(unreachable_patterns)]
            Err(_) => {
                self.bytes.clear();
                Err(DocumentError::Serialize)
            }
        }
    }

    /// Parse the content as a `T`, which may borrow strings from the document.
    pub fn deserialize<'de, T: Deserialize<'de>>(&'de self) -> Result<T, DocumentError> {
        serde_json_core::from_slice::<T>(&self.bytes)
            .map(|(value, _)| value)
            .map_err(|_| DocumentError::Deserialize)
    }

    /// Replace the content with raw `bytes`.
    ///
    /// Fails with [`DocumentError::Overflow`] and leaves the document
    /// untouched if `bytes` exceeds the capacity.
    pub fn set_bytes(&mut self, bytes: &[u8]) -> Result<(), DocumentError> {
        if bytes.len() > N {
            return Err(DocumentError::Overflow);
        }
        self.bytes.clear();
        self.bytes
            .extend_from_slice(bytes)
            .map_err(|_| DocumentError::Overflow)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The content as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.bytes).ok()
    }

    /// Does the content contain `needle` anywhere?
    pub fn contains(&self, needle: &[u8]) -> bool {
        !needle.is_empty() && self.bytes.windows(needle.len()).any(|w| w == needle)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}
