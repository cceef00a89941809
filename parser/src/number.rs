//! Numeric literal grammar
//!
//! The lexer captures a maximal numeric span; this module decides whether
//! that span is a well-formed literal. Each radix has its own digit set and
//! exponent marker: `e` for decimal, `p` (power of two) for hex, binary and
//! octal.

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, opt, peek},
    error::{Error, ErrorKind},
    sequence::{pair, preceded, terminated},
    IResult, Parser,
};

type NResult<'a, O> = IResult<&'a str, O>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Binary,
    Octal,
    Decimal,
    Hexadecimal,
}

impl Radix {
    pub fn base(self) -> u32 {
        match self {
            Radix::Binary => 2,
            Radix::Octal => 8,
            Radix::Decimal => 10,
            Radix::Hexadecimal => 16,
        }
    }

    fn exponent_markers(self) -> &'static str {
        match self {
            Radix::Decimal => "eE",
            _ => "pP",
        }
    }
}

/// A classified literal, borrowing its digit runs from the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberLiteral<'a> {
    pub radix: Radix,
    pub integer: &'a str,
    pub fraction: Option<&'a str>,
    /// (negative, decimal digits)
    pub exponent: Option<(bool, &'a str)>,
}

impl NumberLiteral<'_> {
    /// Literals without a fraction or exponent are integers
    pub fn is_integer(&self) -> bool {
        self.fraction.is_none() && self.exponent.is_none()
    }

    pub fn value(&self) -> f64 {
        let base = f64::from(self.radix.base());
        let mut value = self
            .integer
            .chars()
            .fold(0.0, |acc, c| acc * base + digit_value(c, self.radix) as f64);

        if let Some(fraction) = self.fraction {
            let mut scale = 1.0 / base;
            for c in fraction.chars() {
                value += digit_value(c, self.radix) as f64 * scale;
                scale /= base;
            }
        }

        if let Some((negative, digits)) = self.exponent {
            let magnitude = digits.parse::<i32>().unwrap_or(i32::MAX);
            let exp = if negative { -magnitude } else { magnitude };
            let scale_base: f64 = if self.radix == Radix::Decimal { 10.0 } else { 2.0 };
            value *= scale_base.powi(exp);
        }
        value
    }

    /// Integer value; integral literals wrap on overflow, others truncate toward zero
    pub fn to_i64(&self) -> i64 {
        if self.is_integer() {
            let base = i64::from(self.radix.base());
            self.integer.chars().fold(0i64, |acc, c| {
                acc.wrapping_mul(base)
                    .wrapping_add(i64::from(digit_value(c, self.radix)))
            })
        } else {
            self.value() as i64
        }
    }
}

fn digit_value(c: char, radix: Radix) -> u32 {
    c.to_digit(radix.base()).unwrap_or(0)
}

/// Digits, optional `.digits`, optional exponent for one radix
fn radix_body<'a>(radix: Radix) -> impl Fn(&'a str) -> NResult<'a, NumberLiteral<'a>> {
    move |input: &'a str| {
        let is_digit = move |c: char| c.is_digit(radix.base());
        let (input, integer) = take_while(is_digit).parse(input)?;
        let (input, fraction) = opt(preceded(char('.'), take_while1(is_digit))).parse(input)?;
        if integer.is_empty() && fraction.is_none() {
            return Err(nom::Err::Error(Error::new(input, ErrorKind::Digit)));
        }
        let (input, exponent) = opt(preceded(
            one_of(radix.exponent_markers()),
            pair(opt(one_of("+-")), digit1),
        ))
        .parse(input)?;

        Ok((
            input,
            NumberLiteral {
                radix,
                integer,
                fraction,
                exponent: exponent.map(|(sign, digits)| (sign == Some('-'), digits)),
            },
        ))
    }
}

/// Classify a whole numeric span. `None` means the span is malformed.
pub fn parse_number(text: &str) -> Option<NumberLiteral<'_>> {
    let hex = preceded(tag_no_case("0x"), radix_body(Radix::Hexadecimal));
    let bin = preceded(tag_no_case("0b"), radix_body(Radix::Binary));
    let oct = preceded(
        terminated(char('0'), peek(one_of("01234567"))),
        radix_body(Radix::Octal),
    );
    let dec = radix_body(Radix::Decimal);

    let result: NResult<'_, NumberLiteral<'_>> = alt((
        all_consuming(hex),
        all_consuming(bin),
        all_consuming(oct),
        all_consuming(dec),
    ))
    .parse(text);

    result.ok().map(|(_, literal)| literal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> (Radix, f64, bool) {
        let literal = parse_number(text).unwrap_or_else(|| panic!("'{}' should be a number", text));
        (literal.radix, literal.value(), literal.is_integer())
    }

    #[test]
    fn test_decimal() {
        assert_eq!(classify("0"), (Radix::Decimal, 0.0, true));
        assert_eq!(classify("42"), (Radix::Decimal, 42.0, true));
        assert_eq!(classify("0.5"), (Radix::Decimal, 0.5, false));
        assert_eq!(classify(".25"), (Radix::Decimal, 0.25, false));
        assert_eq!(classify("1e3"), (Radix::Decimal, 1000.0, false));
        assert_eq!(classify("25E-1"), (Radix::Decimal, 2.5, false));
    }

    #[test]
    fn test_hex_binary_octal() {
        assert_eq!(classify("0x1F"), (Radix::Hexadecimal, 31.0, true));
        assert_eq!(classify("0X1e5"), (Radix::Hexadecimal, 485.0, true));
        assert_eq!(classify("0x1p4"), (Radix::Hexadecimal, 16.0, false));
        assert_eq!(classify("0b101"), (Radix::Binary, 5.0, true));
        assert_eq!(classify("0b1.1"), (Radix::Binary, 1.5, false));
        assert_eq!(classify("017"), (Radix::Octal, 15.0, true));
        assert_eq!(classify("01p-1"), (Radix::Octal, 0.5, false));
    }

    #[test]
    fn test_malformed() {
        assert!(parse_number("0x").is_none());
        assert!(parse_number("0b2").is_none());
        assert!(parse_number("1e").is_none());
        assert!(parse_number("12abc").is_none());
        assert!(parse_number("1p3").is_none());
        assert!(parse_number("0x1e+5").is_none());
    }

    #[test]
    fn test_to_i64() {
        assert_eq!(parse_number("0xff").unwrap().to_i64(), 255);
        assert_eq!(parse_number("2.9").unwrap().to_i64(), 2);
        assert_eq!(parse_number("010").unwrap().to_i64(), 8);
    }
}
