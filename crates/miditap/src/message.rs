use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::EndpointId;

/// Decoded MIDI message tagged with its source endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiMessage {
    /// Endpoint the message arrived from.
    pub source: EndpointId,
    /// MIDI status byte.
    pub status: u8,
    /// First data byte.
    pub data1: u8,
    /// Second data byte.
    pub data2: u8,
}

impl MidiMessage {
    /// Create a message from its four fields.
    pub fn new(source: EndpointId, status: u8, data1: u8, data2: u8) -> Self {
        Self {
            source,
            status,
            data1,
            data2,
        }
    }

    /// Decode a raw hardware event: status in bits 0-7, data1 in 8-15,
    /// data2 in 16-23 of `raw`.
    pub fn from_raw(source: EndpointId, raw: u32) -> Self {
        Self {
            source,
            status: raw as u8,
            data1: (raw >> 8) as u8,
            data2: (raw >> 16) as u8,
        }
    }

    /// Canonical 64-bit wire encoding: bits 0-31 source, 32-39 status,
    /// 40-47 data1, 48-55 data2, rest zero. Consumers round-trip this
    /// bit-for-bit, with 0 reserved to mean "queue empty".
    pub fn packed(&self) -> u64 {
        self.source as u64
            | (self.status as u64) << 32
            | (self.data1 as u64) << 40
            | (self.data2 as u64) << 48
    }

    /// Inverse of [`packed`](Self::packed). Returns `None` for the
    /// reserved empty value.
    pub fn from_packed(value: u64) -> Option<Self> {
        if value == 0 {
            return None;
        }
        Some(Self {
            source: value as EndpointId,
            status: (value >> 32) as u8,
            data1: (value >> 40) as u8,
            data2: (value >> 48) as u8,
        })
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:X}) {:02X} {:02X} {:02X}",
            self.source, self.status, self.data1, self.data2
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_layout_matches_contract() {
        let msg = MidiMessage::new(0xAABB_CCDD, 0x90, 0x3C, 0x7F);
        assert_eq!(
            msg.packed(),
            0xAABB_CCDD | (0x90u64 << 32) | (0x3Cu64 << 40) | (0x7Fu64 << 48)
        );
    }

    #[test]
    fn packed_round_trips() {
        let msg = MidiMessage::new(1, 0xB0, 0x07, 0x64);
        assert_eq!(MidiMessage::from_packed(msg.packed()), Some(msg));
    }

    #[test]
    fn packed_zero_is_the_empty_sentinel() {
        assert_eq!(MidiMessage::from_packed(0), None);
    }

    #[test]
    fn raw_event_decodes_low_byte_first() {
        let msg = MidiMessage::from_raw(0xAABB_CCDD, 0x0080_7F3C);
        assert_eq!(msg.status, 0x3C);
        assert_eq!(msg.data1, 0x7F);
        assert_eq!(msg.data2, 0x80);
        assert_eq!(msg.packed() & 0xFFFF_FFFF, 0xAABB_CCDD);
    }

    #[test]
    fn display_renders_hex_form() {
        let msg = MidiMessage::new(0x2A, 0x90, 0x3C, 0x7F);
        assert_eq!(msg.to_string(), "(2A) 90 3C 7F");
    }
}
