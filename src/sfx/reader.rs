// Module library reader
// Locates a module by mode index the same way the runtime loader does:
// file position = prefix + header + (offset - base)

use super::Family;
use super::index::{HeaderEntry, HeaderTable, PackLayout};
use crate::exceptions::{Result, SfxError};
use log::{debug, trace};

/// Read-only view of a packed (uncompressed) module library
#[derive(Debug)]
pub struct ModuleLibrary<'a> {
    layout: PackLayout,
    header: HeaderTable,
    data: &'a [u8],
}

impl<'a> ModuleLibrary<'a> {
    /// Parse a blob with the given layout
    pub fn parse(bytes: &'a [u8], layout: PackLayout) -> Result<Self> {
        let data_start = layout.data_start();
        if bytes.len() < data_start {
            return Err(SfxError::Format(format!(
                "Blob is {} bytes, header alone needs {}",
                bytes.len(),
                data_start
            )));
        }

        if let Some(expected) = layout.load_address {
            let found = u16::from_le_bytes([bytes[0], bytes[1]]);
            if found != expected {
                return Err(SfxError::Format(format!(
                    "Load address {found:#06x} does not match expected {expected:#06x}"
                )));
            }
        }

        let header = HeaderTable::unpack(
            &bytes[layout.prefix_size()..data_start],
            layout.mode_count,
        )?;
        trace!(
            "🔍 Parsed header table: {} entries, {} data bytes",
            header.len(),
            bytes.len() - data_start
        );

        Ok(ModuleLibrary {
            layout,
            header,
            data: &bytes[data_start..],
        })
    }

    /// Parse a blob produced for `family`
    pub fn parse_family(bytes: &'a [u8], family: Family) -> Result<Self> {
        Self::parse(bytes, family.layout())
    }

    pub fn layout(&self) -> &PackLayout {
        &self.layout
    }

    pub fn entries(&self) -> &[HeaderEntry] {
        self.header.entries()
    }

    /// Size of the data region following the header
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Bytes of the module stored in `slot`
    pub fn module(&self, slot: usize) -> Result<&'a [u8]> {
        let entry = self.header.get(slot).ok_or_else(|| {
            SfxError::Format(format!(
                "Slot {slot} out of range (library has {} modules)",
                self.header.len()
            ))
        })?;

        let start = u32::from(entry.offset)
            .checked_sub(self.layout.base_offset)
            .ok_or_else(|| {
                SfxError::Format(format!(
                    "Slot {slot} offset {:#06x} lies below the data region base {:#06x}",
                    entry.offset, self.layout.base_offset
                ))
            })? as usize;
        let end = start + entry.length as usize;
        if end > self.data.len() {
            return Err(SfxError::Format(format!(
                "Slot {slot} spans {start}..{end} but only {} data bytes exist",
                self.data.len()
            )));
        }

        Ok(&self.data[start..end])
    }

    /// Check that modules are contiguous, in slot order, and fill the data region
    pub fn verify(&self) -> Result<()> {
        let mut expected = self.layout.base_offset;
        for (slot, entry) in self.header.entries().iter().enumerate() {
            if u32::from(entry.offset) != expected {
                return Err(SfxError::Format(format!(
                    "Slot {slot} starts at {:#06x}, expected {expected:#06x}",
                    entry.offset
                )));
            }
            expected += u32::from(entry.length);
        }

        let covered = (expected - self.layout.base_offset) as usize;
        if covered != self.data.len() {
            return Err(SfxError::Format(format!(
                "Header covers {covered} data bytes but blob holds {}",
                self.data.len()
            )));
        }

        debug!(
            "✅ Module library verified: {} modules, {} data bytes",
            self.header.len(),
            covered
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sfx::packer::BlobPacker;

    fn m0_blob() -> Vec<u8> {
        let mut packer = BlobPacker::for_family(Family::M0);
        for slot in 0..Family::M0.mode_count() {
            packer.push(slot, &vec![slot as u8; 20 + slot]).unwrap();
        }
        packer.finish().unwrap().into_bytes()
    }

    #[test]
    fn test_m0_module_lookup_matches_loader_arithmetic() {
        let bytes = m0_blob();
        let library = ModuleLibrary::parse_family(&bytes, Family::M0).unwrap();
        library.verify().unwrap();

        // Loader: entry at 2 + mode*4, module at (offset - $2000) + 2
        let mode = 37;
        let p = 2 + mode * 4;
        let offset = u16::from_le_bytes([bytes[p], bytes[p + 1]]) as usize;
        let length = u16::from_le_bytes([bytes[p + 2], bytes[p + 3]]) as usize;
        let start = offset - 0x2000 + 2;
        assert_eq!(library.module(mode).unwrap(), &bytes[start..start + length]);
        assert_eq!(library.module(mode).unwrap(), vec![37u8; 57].as_slice());
    }

    #[test]
    fn test_wrong_load_address_rejected() {
        let mut bytes = m0_blob();
        bytes[1] = 0x30;
        assert!(matches!(
            ModuleLibrary::parse_family(&bytes, Family::M0),
            Err(SfxError::Format(_))
        ));
    }

    #[test]
    fn test_truncated_blob_rejected() {
        let bytes = m0_blob();
        assert!(ModuleLibrary::parse_family(&bytes[..100], Family::M0).is_err());

        let truncated = &bytes[..bytes.len() - 1];
        let library = ModuleLibrary::parse_family(truncated, Family::M0).unwrap();
        assert!(library.verify().is_err());
        assert!(library.module(63).is_err());
        assert!(library.module(0).is_ok());
    }

    #[test]
    fn test_gap_in_table_rejected() {
        let mut bytes = m0_blob();
        // Bump slot 5's offset by one
        let p = 2 + 5 * 4;
        let offset = u16::from_le_bytes([bytes[p], bytes[p + 1]]) + 1;
        bytes[p..p + 2].copy_from_slice(&offset.to_le_bytes());
        let library = ModuleLibrary::parse_family(&bytes, Family::M0).unwrap();
        let err = library.verify().unwrap_err().to_string();
        assert!(err.contains("Slot 5 starts at"), "{err}");
    }

    #[test]
    fn test_unfilled_table_fails_verification() {
        // A zeroed header never describes a finished M0 library
        let mut bytes = 0x2000u16.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 256]);
        let library = ModuleLibrary::parse_family(&bytes, Family::M0).unwrap();
        assert!(library.verify().is_err());
        assert!(library.module(0).is_err());
    }
}
