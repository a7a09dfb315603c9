//! Address trace input: whitespace separated hexadecimal 32-bit addresses,
//! each optionally prefixed with `0x`.

use winnow::ascii::{hex_digit1, multispace0};
use winnow::combinator::{alt, cut_err, eof, opt, preceded, repeat_till};
use winnow::error::{ContextError, ParseError, StrContext, StrContextValue};
use winnow::{ModalResult, Parser};

#[derive(Debug)]
pub struct TraceParseError<'a>(ParseError<&'a str, ContextError>);

impl std::fmt::Display for TraceParseError<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}", self.0))
    }
}

impl std::error::Error for TraceParseError<'_> {}

impl From<TraceParseError<'_>> for crate::error::Error {
    fn from(e: TraceParseError<'_>) -> Self {
        crate::error::Error::Trace(e.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressTrace {
    addresses: Vec<u32>,
}

impl AddressTrace {
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

impl<'a> TryFrom<&'a str> for AddressTrace {
    type Error = TraceParseError<'a>;

    fn try_from(input: &'a str) -> Result<Self, Self::Error> {
        addresses
            .parse(input)
            .map(|addresses| Self { addresses })
            .map_err(TraceParseError)
    }
}

impl IntoIterator for AddressTrace {
    type Item = u32;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.addresses.into_iter()
    }
}

fn addresses(input: &mut &str) -> ModalResult<Vec<u32>> {
    repeat_till(0.., preceded(multispace0, address), (multispace0, eof))
        .parse_next(input)
        .map(|(addresses, _)| addresses)
}

fn address(input: &mut &str) -> ModalResult<u32> {
    // only called on a non-blank token, anything but hex digits is an error
    preceded(
        opt(alt(("0x", "0X"))),
        cut_err(hex_digit1.try_map(|digits| u32::from_str_radix(digits, 16))),
    )
    .context(StrContext::Label("address"))
    .context(StrContext::Expected(StrContextValue::Description(
        "a hexadecimal 32-bit address ( 0x1f40 )",
    )))
    .parse_next(input)
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(input: &str) -> Vec<u32> {
        AddressTrace::try_from(input).unwrap().into_iter().collect()
    }

    #[test]
    fn hex_tokens() {
        assert_eq!(
            parse("0x1f40 1F40\n0X0\tdeadbeef\r\n  ffffffff\n"),
            [0x1F40, 0x1F40, 0, 0xDEAD_BEEF, u32::MAX]
        );
    }

    #[test]
    fn leading_zero_without_prefix() {
        assert_eq!(parse("0abc 00"), [0xABC, 0]);
    }

    #[test]
    fn empty_trace() {
        assert!(AddressTrace::try_from("").unwrap().is_empty());
        assert!(AddressTrace::try_from(" \n\n\t").unwrap().is_empty());
    }

    #[test]
    fn rejects_invalid_token() {
        let error = AddressTrace::try_from("0x10\n0x20\nxyz\n").unwrap_err();
        assert!(
            error
                .to_string()
                .contains("expected a hexadecimal 32-bit address")
        );

        let error = AddressTrace::try_from("0x0 0x").unwrap_err();
        assert!(error.to_string().contains("invalid address"));

        assert!(AddressTrace::try_from("0x10 0x").is_err());
        assert!(AddressTrace::try_from("0x10, 0x20").is_err());
    }

    #[test]
    fn rejects_address_wider_than_32_bits() {
        let error = AddressTrace::try_from("0x1 100000000").unwrap_err();
        assert!(
            error
                .to_string()
                .contains("expected a hexadecimal 32-bit address")
        );
    }
}
