//! Hex color parsing for the replacement background.

use std::str::FromStr;

use super::BackgroundError;

/// A 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl BackgroundColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or the `#RGB` shorthand, case-insensitively.
    ///
    /// The leading `#` is required and no surrounding whitespace is allowed.
    pub fn parse(input: &str) -> Result<Self, BackgroundError> {
        let invalid = || BackgroundError::InvalidColor(input.to_string());

        let hex = input.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        match hex.len() {
            6 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
                match (channel(0), channel(2), channel(4)) {
                    (Ok(r), Ok(g), Ok(b)) => Ok(Self::new(r, g, b)),
                    _ => Err(invalid()),
                }
            }
            3 => {
                // #abc expands to #aabbcc
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|v| v * 17);
                match (channel(0), channel(1), channel(2)) {
                    (Ok(r), Ok(g), Ok(b)) => Ok(Self::new(r, g, b)),
                    _ => Err(invalid()),
                }
            }
            _ => Err(invalid()),
        }
    }

    #[inline]
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl FromStr for BackgroundColor {
    type Err = BackgroundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_form() {
        assert_eq!(
            BackgroundColor::parse("#00FF00").unwrap(),
            BackgroundColor::new(0, 255, 0)
        );
        assert_eq!(
            BackgroundColor::parse("#1a2B3c").unwrap(),
            BackgroundColor::new(0x1a, 0x2b, 0x3c)
        );
    }

    #[test]
    fn test_parse_shorthand() {
        assert_eq!(
            BackgroundColor::parse("#fff").unwrap(),
            BackgroundColor::new(255, 255, 255)
        );
        assert_eq!(
            BackgroundColor::parse("#0a0").unwrap(),
            BackgroundColor::new(0, 0xaa, 0)
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "", "#", "00FF00", "#00FF0", "#00FF000", "#GG0000", " #00FF00", "#00FF00 ", "green",
            "#+1+2+3",
        ] {
            let err = BackgroundColor::parse(bad).unwrap_err();
            assert!(
                matches!(err, BackgroundError::InvalidColor(ref s) if s == bad),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_from_str() {
        let c: BackgroundColor = "#102030".parse().unwrap();
        assert_eq!(c.to_array(), [0x10, 0x20, 0x30]);
    }
}
