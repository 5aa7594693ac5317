//! Device decoding.
//!
//! `MDS_Device_t` is embedded at the start of three larger structs. Which one
//! a device really is comes from the device's own `flags` word (the object
//! header only records that it is a device), and only then is it safe to read
//! the extension fields:
//!
//! - module: `driver`, `handle`
//! - adapter: `driver`, `handle`, `owner`
//! - peripheral: `mount`

use super::flags::{DeviceFlags, DeviceKind};
use super::format::SymbolRef;
use super::{Decoder, PayloadRow};
use crate::error::Result;
use crate::oracle::MemoryOracle;
use crate::types::Address;

/// `MDS_Device_t` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo
{
    pub flags: DeviceFlags,
    pub driver: Option<SymbolRef>,
    pub handle: Option<SymbolRef>,
    /// Owning thread of an adapter, or the adapter a peripheral is mounted on
    pub owner_or_mount: Option<Address>,
}

impl PayloadRow for DeviceInfo
{
    fn cells(&self) -> Vec<String>
    {
        let optional = |value: Option<String>| value.unwrap_or_default();
        vec![
            self.flags.to_string(),
            optional(self.driver.as_ref().map(ToString::to_string)),
            optional(self.handle.as_ref().map(ToString::to_string)),
            optional(self.owner_or_mount.map(|address| address.to_string())),
        ]
    }
}

impl<O: MemoryOracle + ?Sized> Decoder<'_, O>
{
    pub(crate) fn device(&self, device: Address) -> Result<DeviceInfo>
    {
        let reader = self.reader();
        let layout = &self.layout().device;
        let flags = DeviceFlags::from_bits_retain(reader.read(device, &layout.flags)? as u8);

        let (driver, handle, owner_or_mount) = match flags.kind() {
            DeviceKind::Module => (
                Some(reader.read_address(device, &layout.module_driver)?),
                Some(reader.read_address(device, &layout.module_handle)?),
                None,
            ),
            DeviceKind::Adapter => (
                Some(reader.read_address(device, &layout.adapter_driver)?),
                Some(reader.read_address(device, &layout.adapter_handle)?),
                Some(reader.read_address(device, &layout.adapter_owner)?),
            ),
            DeviceKind::Peripheral => (None, None, Some(reader.read_address(device, &layout.periph_mount)?)),
            DeviceKind::Unknown => (None, None, None),
        };

        Ok(DeviceInfo {
            flags,
            driver: driver.map(|address| self.symbol(address)).transpose()?,
            handle: handle.map(|address| self.symbol(address)).transpose()?,
            owner_or_mount,
        })
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_peripheral_cells()
    {
        let info = DeviceInfo {
            flags: DeviceFlags::OPENED | DeviceFlags::PERIPHERAL,
            driver: None,
            handle: None,
            owner_or_mount: Some(Address::new(0x2000_0300)),
        };
        assert_eq!(info.cells(), ["Opened|Peripheral", "", "", "0x20000300"]);
    }

    #[test]
    fn test_module_cells_with_symbols()
    {
        let info = DeviceInfo {
            flags: DeviceFlags::MODULE,
            driver: Some(SymbolRef::new(Address::new(0x0800_2000), Some("G_DEV_UART".into()))),
            handle: Some(SymbolRef::new(Address::new(0x4001_3800), None)),
            owner_or_mount: None,
        };
        assert_eq!(info.cells(), ["Closed|Module", "G_DEV_UART(0x8002000)", "0x40013800", ""]);
    }
}
