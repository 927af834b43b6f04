// ABOUTME: GSM 03.38 default-alphabet codec with extension-table escapes
// ABOUTME: Includes septet packing/unpacking with a fill-bit offset for UDH alignment

/// Escape septet announcing an extension-table character.
pub const ESCAPE: u8 = 0x1B;

/// Substitution for characters outside the alphabet.
const SUBSTITUTE: u8 = 0x3F; // '?'

/// GSM 03.38 default alphabet, indexed by septet value.
const ALPHABET: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å', //
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1b}', 'Æ', 'æ', 'ß', 'É', //
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§', //
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à',
];

/// Extension table (reached through [`ESCAPE`]).
const EXTENSION: [(u8, char); 10] = [
    (0x0A, '\u{0C}'), // form feed
    (0x14, '^'),
    (0x28, '{'),
    (0x29, '}'),
    (0x2F, '\\'),
    (0x3C, '['),
    (0x3D, '~'),
    (0x3E, ']'),
    (0x40, '|'),
    (0x65, '€'),
];

fn default_septet(c: char) -> Option<u8> {
    // '?' and the escape value itself resolve through the table like any
    // other character; ESCAPE never comes back because 0x1B maps to itself
    // only via the char '\u{1b}', which is not addressable text.
    ALPHABET.iter().position(|&a| a == c).map(|i| i as u8)
}

fn extension_septet(c: char) -> Option<u8> {
    EXTENSION.iter().find(|(_, e)| *e == c).map(|(s, _)| *s)
}

fn extension_char(septet: u8) -> Option<char> {
    EXTENSION.iter().find(|(s, _)| *s == septet).map(|(_, c)| *c)
}

/// True when every character of `text` is expressible in GSM7.
pub fn is_representable(text: &str) -> bool {
    text.chars()
        .all(|c| default_septet(c).is_some() || extension_septet(c).is_some())
}

/// Encode to unpacked septets (one per octet). Extension characters emit
/// the 0x1B escape plus their extension septet; anything outside both
/// tables becomes '?'.
pub fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        if c == '\u{1b}' {
            // The raw escape is not addressable text.
            out.push(SUBSTITUTE);
        } else if let Some(septet) = default_septet(c) {
            out.push(septet);
        } else if let Some(ext) = extension_septet(c) {
            out.push(ESCAPE);
            out.push(ext);
        } else {
            out.push(SUBSTITUTE);
        }
    }
    out
}

/// Decode unpacked septets. An escape followed by an unknown extension
/// septet falls back to the default table for that septet, per GSM 03.38
/// display rules; a trailing lone escape decodes as '?'.
pub fn decode(septets: &[u8]) -> String {
    let mut out = String::with_capacity(septets.len());
    let mut iter = septets.iter();
    while let Some(&septet) = iter.next() {
        if septet == ESCAPE {
            match iter.next() {
                Some(&ext) => match extension_char(ext) {
                    Some(c) => out.push(c),
                    None => out.push(ALPHABET[(ext & 0x7F) as usize]),
                },
                None => out.push('?'),
            }
        } else {
            out.push(ALPHABET[(septet & 0x7F) as usize]);
        }
    }
    out
}

/// Number of septets `text` occupies once encoded (extension chars cost 2).
pub fn encoded_len(text: &str) -> usize {
    text.chars()
        .map(|c| if extension_septet(c).is_some() { 2 } else { 1 })
        .sum()
}

/// Pack septets into octets, GSM 03.38 style: septets fill octets from the
/// least significant bit upward. `fill_bits` zero bits are inserted first
/// so that text following a UDH can start on a septet boundary.
pub fn pack(septets: &[u8], fill_bits: u8) -> Vec<u8> {
    let total_bits = fill_bits as usize + septets.len() * 7;
    let mut out = vec![0u8; total_bits.div_ceil(8)];
    let mut bit = fill_bits as usize;
    for &septet in septets {
        let value = (septet & 0x7F) as u16;
        let byte = bit / 8;
        let offset = bit % 8;
        out[byte] |= (value << offset) as u8;
        if offset > 1 {
            out[byte + 1] |= (value >> (8 - offset)) as u8;
        }
        bit += 7;
    }
    out
}

/// Unpack octets into septets, skipping `fill_bits` padding bits first.
/// The septet count is everything that fits; a final partial septet is
/// padding and is discarded.
pub fn unpack(octets: &[u8], fill_bits: u8) -> Vec<u8> {
    let total_bits = octets.len() * 8;
    let available = total_bits.saturating_sub(fill_bits as usize);
    let count = available / 7;
    let mut out = Vec::with_capacity(count);
    let mut bit = fill_bits as usize;
    for _ in 0..count {
        let byte = bit / 8;
        let offset = bit % 8;
        let mut value = (octets[byte] >> offset) as u16;
        if offset > 1 {
            value |= (octets[byte + 1] as u16) << (8 - offset);
        }
        out.push((value & 0x7F) as u8);
        bit += 7;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_roundtrip() {
        let text = "Hello SMPP world 123";
        assert_eq!(decode(&encode(text)), text);
    }

    #[test]
    fn national_characters_roundtrip() {
        let text = "Åh é ñ ü Ω £5";
        assert!(is_representable(text));
        assert_eq!(decode(&encode(text)), text);
    }

    #[test]
    fn extension_characters_escape() {
        let encoded = encode("€");
        assert_eq!(encoded, vec![ESCAPE, 0x65]);
        assert_eq!(decode(&encoded), "€");

        let brackets = "[]{}|~\\^";
        assert!(is_representable(brackets));
        assert_eq!(encoded_len(brackets), 16);
        assert_eq!(decode(&encode(brackets)), brackets);
    }

    #[test]
    fn out_of_alphabet_substitutes() {
        assert_eq!(decode(&encode("漢字")), "??");
        assert!(!is_representable("漢字"));
    }

    #[test]
    fn unknown_extension_falls_back_to_default_table() {
        // ESC 'A' is not a defined extension pair; displays as 'A'.
        assert_eq!(decode(&[ESCAPE, 0x41]), "A");
    }

    #[test]
    fn trailing_escape() {
        assert_eq!(decode(&[0x48, ESCAPE]), "H?");
    }

    #[test]
    fn pack_reference_vector() {
        // "hello" packs to e8 32 9b fd 06 (GSM 03.38 worked example).
        let packed = pack(&encode("hello"), 0);
        assert_eq!(packed, vec![0xE8, 0x32, 0x9B, 0xFD, 0x06]);
    }

    #[test]
    fn pack_unpack_roundtrip() {
        let septets = encode("The quick brown fox jumps over the lazy dog");
        let unpacked = unpack(&pack(&septets, 0), 0);
        // A trailing partial septet may be discarded; content must match.
        assert_eq!(&unpacked[..septets.len()], &septets[..]);
    }

    #[test]
    fn pack_with_fill_bits() {
        let septets = encode("Hi");
        let packed = pack(&septets, 1);
        let unpacked = unpack(&packed, 1);
        assert_eq!(&unpacked[..2], &septets[..]);
    }

    #[test]
    fn full_segment_is_exactly_140_octets() {
        let septets = vec![0x41u8; 160];
        assert_eq!(pack(&septets, 0).len(), 140);
    }
}
