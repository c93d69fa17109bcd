// Module library header table
// One 4-byte entry per mode: offset (u16 LE) then length (u16 LE)

use super::constants::{HEADER_ENTRY_SIZE, LOAD_ADDRESS_SIZE};
use crate::exceptions::{Result, SfxError};
use serde::Serialize;

/// Location of one compiled module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeaderEntry {
    /// Address (or offset) of the module, biased by the layout's base offset
    pub offset: u16,
    /// Module size in bytes
    pub length: u16,
}

impl HeaderEntry {
    pub fn pack(&self) -> [u8; HEADER_ENTRY_SIZE] {
        let mut bytes = [0u8; HEADER_ENTRY_SIZE];
        bytes[0..2].copy_from_slice(&self.offset.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.length.to_le_bytes());
        bytes
    }

    pub fn unpack(data: &[u8]) -> Option<Self> {
        if data.len() != HEADER_ENTRY_SIZE {
            return None;
        }
        Some(HeaderEntry {
            offset: u16::from_le_bytes([data[0], data[1]]),
            length: u16::from_le_bytes([data[2], data[3]]),
        })
    }
}

/// Shape of a packed blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PackLayout {
    /// Number of header slots
    pub mode_count: usize,
    /// Offset recorded for the first byte of the data region
    pub base_offset: u32,
    /// Load address written in front of the header, if any
    pub load_address: Option<u16>,
}

impl PackLayout {
    /// Size of the header table in bytes
    pub fn header_size(&self) -> usize {
        self.mode_count * HEADER_ENTRY_SIZE
    }

    /// Size of the load address prefix in bytes
    pub fn prefix_size(&self) -> usize {
        if self.load_address.is_some() {
            LOAD_ADDRESS_SIZE
        } else {
            0
        }
    }

    /// File position of the first module byte
    pub fn data_start(&self) -> usize {
        self.prefix_size() + self.header_size()
    }
}

/// Header table with one entry per mode index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderTable {
    entries: Vec<HeaderEntry>,
}

impl HeaderTable {
    /// Zero-filled table; unwritten slots stay zero
    pub fn new(mode_count: usize) -> Self {
        HeaderTable {
            entries: vec![HeaderEntry::default(); mode_count],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HeaderEntry] {
        &self.entries
    }

    pub fn get(&self, slot: usize) -> Option<HeaderEntry> {
        self.entries.get(slot).copied()
    }

    pub fn set(&mut self, slot: usize, entry: HeaderEntry) -> Result<()> {
        let count = self.entries.len();
        let target = self.entries.get_mut(slot).ok_or_else(|| {
            SfxError::Packing(format!("Header slot {slot} out of range (table has {count})"))
        })?;
        *target = entry;
        Ok(())
    }

    /// Pack table to bytes
    pub fn pack(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.entries.len() * HEADER_ENTRY_SIZE);
        for entry in &self.entries {
            bytes.extend_from_slice(&entry.pack());
        }
        bytes
    }

    /// Unpack a table of `mode_count` entries
    pub fn unpack(data: &[u8], mode_count: usize) -> Result<Self> {
        let expected = mode_count * HEADER_ENTRY_SIZE;
        if data.len() != expected {
            return Err(SfxError::Format(format!(
                "Invalid header table size: {} != {}",
                data.len(),
                expected
            )));
        }

        let entries = data
            .chunks_exact(HEADER_ENTRY_SIZE)
            .filter_map(HeaderEntry::unpack)
            .collect();
        Ok(HeaderTable { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_is_little_endian() {
        let entry = HeaderEntry {
            offset: 0x2100,
            length: 0x01A3,
        };
        assert_eq!(entry.pack(), [0x00, 0x21, 0xA3, 0x01]);
        assert_eq!(HeaderEntry::unpack(&[0x00, 0x21, 0xA3, 0x01]), Some(entry));
        assert_eq!(HeaderEntry::unpack(&[0x00, 0x21]), None);
    }

    #[test]
    fn test_table_size_is_four_bytes_per_mode() {
        assert_eq!(HeaderTable::new(64).pack().len(), 256);
        assert_eq!(HeaderTable::new(128).pack().len(), 512);
    }

    #[test]
    fn test_set_out_of_range() {
        let mut table = HeaderTable::new(3);
        assert!(table.set(3, HeaderEntry::default()).is_err());
        table
            .set(
                2,
                HeaderEntry {
                    offset: 7,
                    length: 1,
                },
            )
            .unwrap();
        let unpacked = HeaderTable::unpack(&table.pack(), 3).unwrap();
        assert_eq!(unpacked.get(2).unwrap().offset, 7);
        assert_eq!(unpacked.get(0), Some(HeaderEntry::default()));
    }

    #[test]
    fn test_unpack_wrong_size() {
        assert!(matches!(
            HeaderTable::unpack(&[0u8; 10], 3),
            Err(SfxError::Format(_))
        ));
    }

    #[test]
    fn test_layout_sizes() {
        let layout = PackLayout {
            mode_count: 64,
            base_offset: 0x2100,
            load_address: Some(0x2000),
        };
        assert_eq!(layout.header_size(), 256);
        assert_eq!(layout.prefix_size(), 2);
        assert_eq!(layout.data_start(), 258);
    }
}
