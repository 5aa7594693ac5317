//! # Memory Image
//!
//! An in-memory [`MemoryOracle`] backed by byte segments, a symbol table and
//! a register map.
//!
//! This is how the engine inspects a target without a live probe: load the
//! firmware ELF (symbols plus initialized sections), overlay RAM dumps taken
//! from the halted target, and supply the core registers the probe reported.
//! Tests build synthetic kernels the same way, writing structures into blank
//! segments at offsets taken from [`KernelLayout`](crate::KernelLayout).
//!
//! ## Overlay order
//!
//! Segments added later take precedence over earlier ones, so a RAM dump
//! replaces the ELF's initial `.data` contents at the same addresses.
//!
//! ## Example
//!
//! ```rust
//! use mdsview_core::image::{Endian, MemoryImage};
//! use mdsview_core::oracle::MemoryOracle;
//! use mdsview_core::types::Address;
//!
//! let mut image = MemoryImage::new(Endian::Little);
//! image.add_segment(Address::new(0x2000_0000), vec![0; 0x100]);
//! image.write_scalar(Address::new(0x2000_0010), 4, 0xDEAD_BEEF).unwrap();
//! image.add_symbol("g_objectList", Address::new(0x2000_0000), 0x50);
//!
//! assert_eq!(image.read_scalar(Address::new(0x2000_0010), 4).unwrap(), 0xDEAD_BEEF);
//! assert_eq!(
//!     image.resolve_symbol(Address::new(0x2000_0008)).unwrap().as_deref(),
//!     Some("g_objectList+0x8")
//! );
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use object::{Object, ObjectSection, ObjectSymbol, SectionKind, SymbolKind};
use tracing::debug;

use crate::error::{InspectError, Result};
use crate::oracle::MemoryOracle;
use crate::types::Address;

/// Byte order of the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian
{
    #[default]
    Little,
    Big,
}

#[derive(Debug, Clone)]
struct Segment
{
    base: u64,
    data: Vec<u8>,
}

impl Segment
{
    fn range(&self, address: u64, len: usize) -> Option<std::ops::Range<usize>>
    {
        let start = usize::try_from(address.checked_sub(self.base)?).ok()?;
        let end = start.checked_add(len)?;
        (end <= self.data.len()).then_some(start..end)
    }
}

#[derive(Debug, Clone)]
struct SymbolEntry
{
    name: String,
    size: u64,
}

/// In-memory target snapshot
#[derive(Debug, Clone, Default)]
pub struct MemoryImage
{
    endian: Endian,
    segments: Vec<Segment>,
    by_name: HashMap<String, Address>,
    by_address: BTreeMap<u64, SymbolEntry>,
    registers: HashMap<String, u64>,
}

impl MemoryImage
{
    /// Create an empty image
    pub fn new(endian: Endian) -> Self
    {
        Self {
            endian,
            ..Self::default()
        }
    }

    /// Load symbols and allocated sections from an ELF file
    ///
    /// ## Errors
    ///
    /// - `Io`: the file could not be read
    /// - `Image`: the file is not a parseable object file
    pub fn from_elf(path: impl AsRef<Path>) -> Result<Self>
    {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let image = Self::parse_elf(&bytes)?;
        debug!(
            path = %path.display(),
            segments = image.segments.len(),
            symbols = image.by_name.len(),
            "Loaded ELF image"
        );
        Ok(image)
    }

    /// Build an image from ELF bytes already in memory
    pub fn parse_elf(bytes: &[u8]) -> Result<Self>
    {
        let file = object::File::parse(bytes)?;
        let endian = if file.is_little_endian() {
            Endian::Little
        } else {
            Endian::Big
        };
        // Thumb function symbols carry the interworking bit
        let thumb = matches!(file.architecture(), object::Architecture::Arm);

        let mut image = Self::new(endian);
        for section in file.sections() {
            if section.address() == 0 {
                continue;
            }
            match section.kind() {
                SectionKind::Text | SectionKind::Data | SectionKind::ReadOnlyData | SectionKind::ReadOnlyString => {
                    let data = section.uncompressed_data()?;
                    image.add_segment(Address::new(section.address()), data.into_owned());
                }
                SectionKind::UninitializedData => {
                    let size = usize::try_from(section.size())
                        .map_err(|_| InspectError::Image(format!("section at 0x{:X} too large", section.address())))?;
                    image.add_segment(Address::new(section.address()), vec![0; size]);
                }
                _ => {}
            }
        }

        for symbol in file.symbols() {
            let Ok(name) = symbol.name() else { continue };
            if name.is_empty() || !matches!(symbol.kind(), SymbolKind::Text | SymbolKind::Data) {
                continue;
            }
            let mut address = symbol.address();
            if thumb && symbol.kind() == SymbolKind::Text {
                address &= !1;
            }
            image.add_symbol(name, Address::new(address), symbol.size());
        }

        Ok(image)
    }

    /// Byte order used for scalar reads and writes
    pub fn endian(&self) -> Endian
    {
        self.endian
    }

    /// Map `data` at `base`, shadowing earlier segments that overlap it
    pub fn add_segment(&mut self, base: Address, data: Vec<u8>)
    {
        self.segments.push(Segment {
            base: base.value(),
            data,
        });
    }

    /// Map the contents of a raw memory dump file at `base`
    pub fn load_dump(&mut self, base: Address, path: impl AsRef<Path>) -> Result<()>
    {
        let path = path.as_ref();
        let data = fs::read(path)?;
        debug!(path = %path.display(), base = %base, len = data.len(), "Loaded memory dump");
        self.add_segment(base, data);
        Ok(())
    }

    /// Register a symbol covering `size` bytes from `address`
    ///
    /// When two symbols share an address the first sized one wins for
    /// reverse lookups.
    pub fn add_symbol(&mut self, name: &str, address: Address, size: u64)
    {
        self.by_name.insert(name.to_string(), address);
        let replace = self
            .by_address
            .get(&address.value())
            .is_none_or(|existing| existing.size == 0 && size > 0);
        if replace {
            self.by_address.insert(
                address.value(),
                SymbolEntry {
                    name: name.to_string(),
                    size,
                },
            );
        }
    }

    /// Set the live value of a core register
    pub fn set_register(&mut self, name: &str, value: u64)
    {
        self.registers.insert(name.to_lowercase(), value);
    }

    /// Borrow `len` bytes at `address`
    ///
    /// The range must lie inside a single segment; the newest matching
    /// segment is used.
    pub fn read_bytes(&self, address: Address, len: usize) -> Result<&[u8]>
    {
        self.segments
            .iter()
            .rev()
            .find_map(|segment| segment.range(address.value(), len).map(|range| &segment.data[range]))
            .ok_or(InspectError::MemoryRead { address, width: len })
    }

    /// Overwrite bytes at `address` in the newest segment covering them
    pub fn write_bytes(&mut self, address: Address, bytes: &[u8]) -> Result<()>
    {
        let (segment, range) = self
            .segments
            .iter_mut()
            .rev()
            .find_map(|segment| {
                let range = segment.range(address.value(), bytes.len())?;
                Some((segment, range))
            })
            .ok_or(InspectError::MemoryRead {
                address,
                width: bytes.len(),
            })?;
        segment.data[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Write an unsigned scalar of `width` bytes in the image's byte order
    pub fn write_scalar(&mut self, address: Address, width: usize, value: u64) -> Result<()>
    {
        check_width(width)?;
        let bytes = match self.endian {
            Endian::Little => value.to_le_bytes()[..width].to_vec(),
            Endian::Big => value.to_be_bytes()[8 - width..].to_vec(),
        };
        self.write_bytes(address, &bytes)
    }

    /// Write `s` followed by a NUL, truncated to `max_len` bytes in total
    ///
    /// A string of exactly `max_len` bytes is written without its NUL, the
    /// way the kernel fills fixed-size name buffers.
    pub fn write_c_string(&mut self, address: Address, s: &str, max_len: usize) -> Result<()>
    {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        bytes.truncate(max_len);
        self.write_bytes(address, &bytes)
    }
}

fn check_width(width: usize) -> Result<()>
{
    if matches!(width, 1 | 2 | 4 | 8) {
        Ok(())
    } else {
        Err(InspectError::InvalidArgument(format!("unsupported scalar width {width}")))
    }
}

impl MemoryOracle for MemoryImage
{
    fn read_scalar(&self, address: Address, width: usize) -> Result<u64>
    {
        check_width(width)?;
        let bytes = self.read_bytes(address, width)?;
        let mut buf = [0u8; 8];
        let value = match self.endian {
            Endian::Little => {
                buf[..width].copy_from_slice(bytes);
                u64::from_le_bytes(buf)
            }
            Endian::Big => {
                buf[8 - width..].copy_from_slice(bytes);
                u64::from_be_bytes(buf)
            }
        };
        Ok(value)
    }

    fn read_c_string(&self, address: Address, max_len: usize) -> Result<String>
    {
        let mut bytes = Vec::with_capacity(max_len);
        for idx in 0..max_len as u64 {
            let byte = self.read_bytes(address + idx, 1)?[0];
            if byte == 0 {
                break;
            }
            bytes.push(byte);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn symbol_address(&self, name: &str) -> Result<Option<Address>>
    {
        Ok(self.by_name.get(name).copied())
    }

    fn symbol_size(&self, address: Address) -> Result<Option<u64>>
    {
        Ok(self
            .by_address
            .get(&address.value())
            .map(|entry| entry.size)
            .filter(|size| *size > 0))
    }

    fn resolve_symbol(&self, address: Address) -> Result<Option<String>>
    {
        let target = address.value();
        let Some((&start, entry)) = self.by_address.range(..=target).next_back() else {
            return Ok(None);
        };
        let offset = target - start;
        if offset == 0 {
            return Ok(Some(entry.name.clone()));
        }
        if offset < entry.size {
            return Ok(Some(format!("{}+0x{:X}", entry.name, offset)));
        }
        Ok(None)
    }

    fn core_register(&self, name: &str) -> Result<Option<u64>>
    {
        Ok(self.registers.get(&name.to_lowercase()).copied())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn image(endian: Endian) -> MemoryImage
    {
        let mut image = MemoryImage::new(endian);
        image.add_segment(Address::new(0x1000), vec![0; 0x40]);
        image
    }

    #[test]
    fn test_scalar_little_endian()
    {
        let mut image = image(Endian::Little);
        image.write_scalar(Address::new(0x1000), 4, 0x1122_3344).unwrap();
        assert_eq!(image.read_bytes(Address::new(0x1000), 4).unwrap(), &[0x44, 0x33, 0x22, 0x11]);
        assert_eq!(image.read_scalar(Address::new(0x1000), 4).unwrap(), 0x1122_3344);
        assert_eq!(image.read_scalar(Address::new(0x1000), 2).unwrap(), 0x3344);
    }

    #[test]
    fn test_scalar_big_endian()
    {
        let mut image = image(Endian::Big);
        image.write_scalar(Address::new(0x1008), 4, 0x1122_3344).unwrap();
        assert_eq!(image.read_bytes(Address::new(0x1008), 4).unwrap(), &[0x11, 0x22, 0x33, 0x44]);
        assert_eq!(image.read_scalar(Address::new(0x1008), 4).unwrap(), 0x1122_3344);
    }

    #[test]
    fn test_unmapped_read_fails()
    {
        let image = image(Endian::Little);
        let err = image.read_scalar(Address::new(0x103E), 4).unwrap_err();
        assert!(matches!(err, InspectError::MemoryRead { width: 4, .. }));
        assert!(image.read_scalar(Address::new(0x2000), 1).is_err());
    }

    #[test]
    fn test_invalid_width()
    {
        let image = image(Endian::Little);
        assert!(matches!(
            image.read_scalar(Address::new(0x1000), 3),
            Err(InspectError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_later_segment_shadows_earlier()
    {
        let mut image = image(Endian::Little);
        image.add_segment(Address::new(0x1010), vec![0xAA; 4]);
        assert_eq!(image.read_scalar(Address::new(0x1010), 1).unwrap(), 0xAA);
        assert_eq!(image.read_scalar(Address::new(0x1014), 1).unwrap(), 0);
    }

    #[test]
    fn test_c_string_bounded()
    {
        let mut image = image(Endian::Little);
        image.write_c_string(Address::new(0x1000), "idle", 7).unwrap();
        assert_eq!(image.read_c_string(Address::new(0x1000), 7).unwrap(), "idle");

        image.write_c_string(Address::new(0x1010), "timer_worker", 7).unwrap();
        assert_eq!(image.read_c_string(Address::new(0x1010), 7).unwrap(), "timer_w");
    }

    #[test]
    fn test_resolve_symbol()
    {
        let mut image = image(Endian::Little);
        image.add_symbol("main", Address::new(0x800), 0x20);
        image.add_symbol("marker", Address::new(0x900), 0);

        assert_eq!(image.resolve_symbol(Address::new(0x800)).unwrap().as_deref(), Some("main"));
        assert_eq!(image.resolve_symbol(Address::new(0x810)).unwrap().as_deref(), Some("main+0x10"));
        assert_eq!(image.resolve_symbol(Address::new(0x820)).unwrap(), None);
        assert_eq!(image.resolve_symbol(Address::new(0x900)).unwrap().as_deref(), Some("marker"));
        assert_eq!(image.resolve_symbol(Address::new(0x7FF)).unwrap(), None);
        assert_eq!(image.symbol_address("main").unwrap(), Some(Address::new(0x800)));
        assert_eq!(image.symbol_address("nope").unwrap(), None);

        assert_eq!(image.symbol_size(Address::new(0x800)).unwrap(), Some(0x20));
        assert_eq!(image.symbol_size(Address::new(0x810)).unwrap(), None);
        assert_eq!(image.symbol_size(Address::new(0x900)).unwrap(), None);
    }

    #[test]
    fn test_registers_case_insensitive()
    {
        let mut image = image(Endian::Little);
        image.set_register("GP", 0x2000_0800);
        assert_eq!(image.core_register("gp").unwrap(), Some(0x2000_0800));
        assert_eq!(image.core_register("tp").unwrap(), None);
    }

    #[test]
    fn test_parse_elf_rejects_garbage()
    {
        assert!(matches!(MemoryImage::parse_elf(b"not an elf"), Err(InspectError::Image(_))));
    }
}
