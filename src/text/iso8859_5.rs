// ABOUTME: ISO 8859-5 (Latin/Cyrillic) codec
// ABOUTME: The 0xA1..=0xFF block shifts to U+0401.. with three irregular slots

/// Encode to ISO 8859-5. Unmappable characters become '?'.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}

/// Decode from ISO 8859-5; every octet is defined.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| decode_byte(b)).collect()
}

fn encode_char(c: char) -> u8 {
    let cp = c as u32;
    match cp {
        0x00..=0x9F => cp as u8,
        0xA0 => 0xA0,        // NBSP
        0xAD => 0xAD,        // soft hyphen
        0xA7 => 0xFD,        // §
        0x2116 => 0xF0,      // №
        // Ё..Џ, А..я, ё..џ sit at a constant offset from their octets.
        0x0401..=0x045F => match cp - 0x360 {
            b @ 0xA1..=0xFF if b != 0xAD && b != 0xF0 && b != 0xFD => b as u8,
            _ => b'?',
        },
        _ => b'?',
    }
}

fn decode_byte(b: u8) -> char {
    match b {
        0x00..=0x9F => b as char,
        0xA0 => '\u{A0}',
        0xAD => '\u{AD}',
        0xF0 => '№',
        0xFD => '§',
        // The regular Cyrillic block.
        _ => char::from_u32(b as u32 + 0x360).unwrap_or('?'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyrillic_roundtrip() {
        let text = "Привет, мир! Ёё ЪъЬь";
        assert_eq!(decode(&encode(text)), text);
    }

    #[test]
    fn irregular_slots() {
        assert_eq!(encode("№"), vec![0xF0]);
        assert_eq!(encode("§"), vec![0xFD]);
        assert_eq!(decode(&[0xF0, 0xFD, 0xA0, 0xAD]), "№§\u{A0}\u{AD}");
    }

    #[test]
    fn exact_bytes() {
        // 'А' (U+0410) is 0xB0, 'я' (U+044F) is 0xEF.
        assert_eq!(encode("Ая"), vec![0xB0, 0xEF]);
        assert_eq!(decode(&[0xB0, 0xEF]), "Ая");
    }

    #[test]
    fn ascii_passthrough() {
        assert_eq!(encode("abc 123"), b"abc 123".to_vec());
    }

    #[test]
    fn unmappable_substitutes() {
        assert_eq!(encode("€"), vec![b'?']);
        assert_eq!(encode("ä"), vec![b'?']);
    }
}
