//! Blob packer: header table plus concatenated modules

use super::Family;
use super::index::{HeaderEntry, HeaderTable, PackLayout};
use crate::exceptions::{Result, SfxError};
use log::{debug, trace};

/// Accumulates compiled modules in mode order
#[derive(Debug)]
pub struct BlobPacker {
    layout: PackLayout,
    header: HeaderTable,
    data: Vec<u8>,
    running_offset: u32,
    next_slot: usize,
}

impl BlobPacker {
    pub fn new(layout: PackLayout) -> Self {
        BlobPacker {
            layout,
            header: HeaderTable::new(layout.mode_count),
            data: Vec::new(),
            running_offset: layout.base_offset,
            next_slot: 0,
        }
    }

    pub fn for_family(family: Family) -> Self {
        Self::new(family.layout())
    }

    pub fn layout(&self) -> &PackLayout {
        &self.layout
    }

    /// True once every slot has been filled
    pub fn is_complete(&self) -> bool {
        self.next_slot == self.layout.mode_count
    }

    /// Append the module for `slot`; slots must arrive as 0, 1, 2, ...
    pub fn push(&mut self, slot: usize, module: &[u8]) -> Result<HeaderEntry> {
        if slot != self.next_slot {
            return Err(SfxError::Packing(format!(
                "Module for slot {slot} pushed out of order (expected slot {})",
                self.next_slot
            )));
        }
        if slot >= self.layout.mode_count {
            return Err(SfxError::Packing(format!(
                "Slot {slot} exceeds table size {}",
                self.layout.mode_count
            )));
        }

        let offset = u16::try_from(self.running_offset).map_err(|_| {
            SfxError::Packing(format!(
                "Offset {:#x} of slot {slot} does not fit in 16 bits",
                self.running_offset
            ))
        })?;
        let length = u16::try_from(module.len()).map_err(|_| {
            SfxError::Packing(format!(
                "Module for slot {slot} is {} bytes, limit is 65535",
                module.len()
            ))
        })?;

        let entry = HeaderEntry { offset, length };
        self.header.set(slot, entry)?;
        self.data.extend_from_slice(module);
        self.running_offset += u32::from(length);
        self.next_slot += 1;

        trace!(
            "📍 Packed slot {}: offset={:#06x}, length={}",
            slot, offset, length
        );
        Ok(entry)
    }

    /// Assemble the final blob; fails unless every slot was pushed
    pub fn finish(self) -> Result<PackedBlob> {
        if !self.is_complete() {
            return Err(SfxError::Packing(format!(
                "Header table incomplete: {} of {} modules packed",
                self.next_slot, self.layout.mode_count
            )));
        }

        let mut bytes = Vec::with_capacity(self.layout.data_start() + self.data.len());
        if let Some(load_address) = self.layout.load_address {
            bytes.extend_from_slice(&load_address.to_le_bytes());
        }
        bytes.extend_from_slice(&self.header.pack());
        bytes.extend_from_slice(&self.data);

        debug!(
            "📦 Packed {} modules: header={} bytes, data={} bytes, total={} bytes",
            self.layout.mode_count,
            self.layout.header_size(),
            self.data.len(),
            bytes.len()
        );

        Ok(PackedBlob {
            layout: self.layout,
            header: self.header,
            bytes,
        })
    }
}

/// Finished module library, ready for compression
#[derive(Debug, Clone)]
pub struct PackedBlob {
    layout: PackLayout,
    header: HeaderTable,
    bytes: Vec<u8>,
}

impl PackedBlob {
    pub fn layout(&self) -> &PackLayout {
        &self.layout
    }

    pub fn header(&self) -> &HeaderTable {
        &self.header
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
