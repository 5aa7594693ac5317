//! Parsing of command-line values: addresses, register assignments and
//! memory segment specs.

use std::path::PathBuf;

/// Command-line value parsing error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError
{
    #[error("Empty value")]
    Empty,

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    /// `KEY<sep>VALUE` without the separator or one of its halves
    #[error("Expected KEY{separator}VALUE, got '{input}'")]
    MissingSeparator
    {
        input: String,
        separator: char,
    },
}

/// Parse an unsigned number: `0x` hex, `0b` binary or decimal
///
/// Underscores are ignored, so `0x2000_0000` works.
///
/// ```rust
/// use mdsview_utils::parse_u64;
///
/// assert_eq!(parse_u64("0x2000_0000").unwrap(), 0x2000_0000);
/// assert_eq!(parse_u64("42").unwrap(), 42);
/// ```
pub fn parse_u64(input: &str) -> Result<u64, ParseError>
{
    let cleaned: String = input.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err(ParseError::Empty);
    }

    let lower = cleaned.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u64::from_str_radix(bin, 2)
    } else {
        lower.parse()
    };
    parsed.map_err(|_| ParseError::InvalidNumber(input.to_string()))
}

fn split_pair(input: &str, separator: char) -> Result<(&str, &str), ParseError>
{
    let missing = || ParseError::MissingSeparator {
        input: input.to_string(),
        separator,
    };
    let (key, value) = input.split_once(separator).ok_or_else(missing)?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(missing());
    }
    Ok((key, value))
}

/// Parse a register assignment `NAME=VALUE`; the name is lowercased
pub fn parse_register(input: &str) -> Result<(String, u64), ParseError>
{
    let (name, value) = split_pair(input, '=')?;
    Ok((name.to_ascii_lowercase(), parse_u64(value)?))
}

/// Parse a memory segment `ADDRESS:PATH`
///
/// Only the first `:` separates, so Windows drive letters survive in the path.
pub fn parse_segment(input: &str) -> Result<(u64, PathBuf), ParseError>
{
    let (address, path) = split_pair(input, ':')?;
    Ok((parse_u64(address)?, PathBuf::from(path)))
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_parse_u64_radixes()
    {
        assert_eq!(parse_u64("0X1F"), Ok(0x1F));
        assert_eq!(parse_u64("0b1010"), Ok(10));
        assert_eq!(parse_u64(" 1_000 "), Ok(1000));
        assert_eq!(parse_u64(""), Err(ParseError::Empty));
        assert!(matches!(parse_u64("0xZZ"), Err(ParseError::InvalidNumber(_))));
        assert!(matches!(parse_u64("-1"), Err(ParseError::InvalidNumber(_))));
    }

    #[test]
    fn test_parse_register()
    {
        assert_eq!(parse_register("GP=0x20000800"), Ok(("gp".to_string(), 0x2000_0800)));
        assert!(matches!(parse_register("sp"), Err(ParseError::MissingSeparator { .. })));
        assert!(matches!(parse_register("=1"), Err(ParseError::MissingSeparator { .. })));
    }

    #[test]
    fn test_parse_segment()
    {
        let (base, path) = parse_segment("0x20000000:dumps/ram.bin").unwrap();
        assert_eq!(base, 0x2000_0000);
        assert_eq!(path, PathBuf::from("dumps/ram.bin"));

        let (_, windows) = parse_segment("0x0:C:\\dump.bin").unwrap();
        assert_eq!(windows, PathBuf::from("C:\\dump.bin"));
    }
}
