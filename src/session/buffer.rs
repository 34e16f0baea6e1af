//! Fixed-capacity buffer protocol at the engine boundary.
//!
//! The engine writes into host-allocated buffers whose size is fixed per
//! operation and reports how much it used. Raw integers (packed lengths,
//! signed byte counts) are decoded here once and never leave this layer.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::abi::RESPONSE_SIZE;
use crate::error::UsageError;

bitflags! {
    /// Status bits returned alongside each batch of engine messages.
    ///
    /// The host does not act on these; they are passed through for the layer
    /// that interprets the message stream. Bits without a name here are kept.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ProcessFlags: u16 {
        /// The engine is waiting for a response before it can continue.
        const WAITING = 0x1;
        /// The duel has finished.
        const END = 0x2;
    }
}

impl Default for ProcessFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl ProcessFlags {
    #[must_use]
    pub const fn is_waiting(self) -> bool {
        self.contains(Self::WAITING)
    }

    #[must_use]
    pub const fn is_end(self) -> bool {
        self.contains(Self::END)
    }
}

/// Decoded return value of the engine's `process`.
///
/// ```
/// use ocg_host::session::PackedProcess;
///
/// let packed = PackedProcess::decode(0x0002_0005);
/// assert_eq!(packed.length, 5);
/// assert_eq!(packed.flags.bits(), 2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedProcess {
    /// Bytes of message data waiting in the engine, low 16 bits.
    pub length: usize,
    /// Status flags, high 16 bits.
    pub flags: ProcessFlags,
}

impl PackedProcess {
    #[must_use]
    pub const fn decode(raw: i32) -> Self {
        let raw = raw as u32;
        Self {
            length: (raw & 0xFFFF) as usize,
            flags: ProcessFlags::from_bits_retain((raw >> 16) as u16),
        }
    }
}

/// One `process` step: the messages the engine produced and its flags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub messages: Vec<u8>,
    pub flags: ProcessFlags,
}

/// Exactly one response block as the engine consumes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseBuffer([u8; RESPONSE_SIZE]);

impl ResponseBuffer {
    #[must_use]
    pub const fn new(bytes: [u8; RESPONSE_SIZE]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; RESPONSE_SIZE] {
        &self.0
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        self.0.as_mut_ptr()
    }
}

impl TryFrom<&[u8]> for ResponseBuffer {
    type Error = UsageError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; RESPONSE_SIZE]>::try_from(bytes)
            .map(Self)
            .map_err(|_| UsageError::ResponseSize { len: bytes.len() })
    }
}

/// Allocate a zeroed output buffer of `capacity` bytes.
pub(crate) fn output_buffer(capacity: usize) -> Vec<u8> {
    vec![0; capacity]
}

/// Trim `buffer` to the length the engine reported, clamped to capacity.
///
/// Negative lengths are treated as empty.
pub(crate) fn trim_to_reported(
    mut buffer: Vec<u8>,
    reported: i64,
    operation: &'static str,
) -> Vec<u8> {
    let capacity = buffer.len();
    let length = usize::try_from(reported).unwrap_or(0);
    if length > capacity {
        warn!(operation, reported, capacity, "engine reported more data than the buffer holds");
    }
    buffer.truncate(length.min(capacity));
    buffer
}

/// Decode a NUL-terminated string the engine wrote into `buffer`.
pub(crate) fn c_text(buffer: &[u8]) -> String {
    let end = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_packed_process() {
        let packed = PackedProcess::decode(0x0002_0005);
        assert_eq!(packed.length, 5);
        assert_eq!(packed.flags, ProcessFlags::END);
        assert!(packed.flags.is_end());
        assert!(!packed.flags.is_waiting());
    }

    #[test]
    fn test_decode_waiting_with_full_length() {
        let packed = PackedProcess::decode(0x0001_FFFF);
        assert_eq!(packed.length, 0xFFFF);
        assert!(packed.flags.is_waiting());
    }

    #[test]
    fn test_decode_high_bit_flags() {
        let packed = PackedProcess::decode(i32::MIN | 3);
        assert_eq!(packed.length, 3);
        assert_eq!(packed.flags.bits(), 0x8000);
        assert!(!packed.flags.is_waiting());
    }

    #[test]
    fn test_unnamed_engine_bits_are_kept() {
        let packed = PackedProcess::decode(0x0005_0000);
        assert!(packed.flags.is_waiting());
        assert_eq!(packed.flags.bits(), 0x5);
        assert_eq!(packed.flags & ProcessFlags::all(), ProcessFlags::WAITING);
        let names: Vec<&str> = packed.flags.iter_names().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["WAITING"]);
    }

    #[test]
    fn test_flags_combine() {
        let flags = ProcessFlags::WAITING | ProcessFlags::END;
        assert!(flags.is_waiting() && flags.is_end());
        assert_eq!(flags.bits(), 0x3);
        assert_eq!(ProcessFlags::default(), ProcessFlags::empty());
    }

    #[test]
    fn test_response_must_be_exact() {
        assert!(ResponseBuffer::try_from(&[0u8; 64][..]).is_ok());
        assert_eq!(
            ResponseBuffer::try_from(&[0u8; 63][..]),
            Err(UsageError::ResponseSize { len: 63 })
        );
        assert_eq!(
            ResponseBuffer::try_from(&[0u8; 65][..]),
            Err(UsageError::ResponseSize { len: 65 })
        );
        assert_eq!(
            ResponseBuffer::try_from(&[0u8; 0][..]),
            Err(UsageError::ResponseSize { len: 0 })
        );
    }

    #[test]
    fn test_trim_clamps_to_capacity() {
        assert_eq!(trim_to_reported(vec![1, 2, 3, 4], 2, "test"), vec![1, 2]);
        assert_eq!(trim_to_reported(vec![1, 2, 3, 4], 10, "test"), vec![1, 2, 3, 4]);
        assert!(trim_to_reported(vec![1, 2, 3, 4], -1, "test").is_empty());
    }

    #[test]
    fn test_c_text() {
        let mut buffer = [0u8; 16];
        buffer[..5].copy_from_slice(b"hello");
        assert_eq!(c_text(&buffer), "hello");
        assert_eq!(c_text(b"no terminator"), "no terminator");
        assert_eq!(c_text(&[0; 4]), "");
    }

    proptest! {
        #[test]
        fn prop_packed_round_trip(length in 0u32..=0xFFFF, flags in any::<u16>()) {
            let raw = ((flags as u32) << 16 | length) as i32;
            let packed = PackedProcess::decode(raw);
            prop_assert_eq!(packed.length, length as usize);
            prop_assert_eq!(packed.flags.bits(), flags);
        }
    }
}
