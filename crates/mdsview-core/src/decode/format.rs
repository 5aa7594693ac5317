//! Cell formatting shared by the decoders.
//!
//! Every address is rendered as uppercase hex with a `0x` prefix and no
//! padding. Pointers that may name code or data (entry points, callback
//! arguments, drivers) render as `name(0xADDR)` when the target resolves them.

use std::fmt;

use crate::types::Address;

/// A pointer together with the symbol it resolved to, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRef
{
    pub address: Address,
    pub symbol: Option<String>,
}

impl SymbolRef
{
    /// Pair `address` with a lookup result; empty names count as unresolved
    pub fn new(address: Address, symbol: Option<String>) -> Self
    {
        Self {
            address,
            symbol: symbol.filter(|name| !name.is_empty()),
        }
    }
}

/// `name(0xADDR)` or `0xADDR`
impl fmt::Display for SymbolRef
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match &self.symbol {
            Some(name) => write!(f, "{name}({})", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// Signed hex: `0x80`, `-0x80`
pub fn signed_hex(value: i128) -> String
{
    if value < 0 {
        format!("-0x{:X}", value.unsigned_abs())
    } else {
        format!("0x{value:X}")
    }
}

/// Stack bound cell: `0xBOUND(0xOFFSET)`
pub fn stack_cell(bound: Address, offset: i128) -> String
{
    format!("{bound}({})", signed_hex(offset))
}

/// Comma-separated addresses, empty for an empty list
pub fn address_list(addresses: &[Address]) -> String
{
    addresses.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_symbol_ref()
    {
        let addr = Address::new(0x0800_1234);
        assert_eq!(SymbolRef::new(addr, Some("main".into())).to_string(), "main(0x8001234)");
        assert_eq!(SymbolRef::new(addr, None).to_string(), "0x8001234");
        assert_eq!(SymbolRef::new(addr, Some(String::new())).to_string(), "0x8001234");
    }

    #[test]
    fn test_signed_hex()
    {
        assert_eq!(signed_hex(0x180), "0x180");
        assert_eq!(signed_hex(-0x20), "-0x20");
        assert_eq!(signed_hex(0), "0x0");
    }

    #[test]
    fn test_stack_cell()
    {
        assert_eq!(stack_cell(Address::new(0x1000), 0x80), "0x1000(0x80)");
        assert_eq!(stack_cell(Address::new(0x1200), -0x10), "0x1200(-0x10)");
    }

    #[test]
    fn test_address_list()
    {
        assert_eq!(address_list(&[]), "");
        assert_eq!(
            address_list(&[Address::new(0x2000_0100), Address::new(0xAB)]),
            "0x20000100,0xAB"
        );
    }
}
