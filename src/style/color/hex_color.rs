use std::borrow::Cow;

use super::Color;

/// A hex color literal kept alongside its decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexColor<'a> {
    raw: Cow<'a, str>,
    value: Option<[u8; 4]>,
}

impl<'a> HexColor<'a> {
    pub fn new(hex: impl Into<Cow<'a, str>>) -> Self {
        let raw = hex.into();
        let value = Self::decode(raw.trim().as_bytes());
        Self { raw, value }
    }

    fn decode(bytes: &[u8]) -> Option<[u8; 4]> {
        if !Self::validate(bytes) {
            return None;
        }
        let value = match bytes.len() {
            4 => [
                hex_1_to_u8(bytes[1]) * 17,
                hex_1_to_u8(bytes[2]) * 17,
                hex_1_to_u8(bytes[3]) * 17,
                255,
            ],
            5 => [
                hex_1_to_u8(bytes[1]) * 17,
                hex_1_to_u8(bytes[2]) * 17,
                hex_1_to_u8(bytes[3]) * 17,
                hex_1_to_u8(bytes[4]) * 17,
            ],
            7 => [
                hex_2_to_u8(bytes[1], bytes[2]),
                hex_2_to_u8(bytes[3], bytes[4]),
                hex_2_to_u8(bytes[5], bytes[6]),
                255,
            ],
            9 => [
                hex_2_to_u8(bytes[1], bytes[2]),
                hex_2_to_u8(bytes[3], bytes[4]),
                hex_2_to_u8(bytes[5], bytes[6]),
                hex_2_to_u8(bytes[7], bytes[8]),
            ],
            _ => return None,
        };
        Some(value)
    }

    fn validate(bytes: &[u8]) -> bool {
        let length = bytes.len();

        if length == 0 || bytes[0] != b'#' {
            return false;
        }

        if length != 4 && length != 5 && length != 7 && length != 9 {
            return false;
        }

        bytes[1..].iter().all(u8::is_ascii_hexdigit)
    }

    pub fn get_raw(&self) -> &str {
        &self.raw
    }

    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }

    pub fn to_color(&self) -> Option<Color> {
        self.value.map(|[r, g, b, a]| Color::rgba(r, g, b, a))
    }
}

fn hex_1_to_u8(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}

fn hex_2_to_u8(c1: u8, c2: u8) -> u8 {
    (hex_1_to_u8(c1) << 4) | hex_1_to_u8(c2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_raw_text_even_when_invalid() {
        let color = HexColor::new("#zzz");
        assert_eq!(color.get_raw(), "#zzz");
        assert!(!color.is_valid());
        assert_eq!(color.to_color(), None);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let color = HexColor::new(String::from("  #102030 "));
        assert_eq!(color.to_color(), Some(Color::rgb(0x10, 0x20, 0x30)));
    }
}
