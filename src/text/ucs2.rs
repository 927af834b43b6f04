// ABOUTME: UCS-2 / UTF-16 big-endian codec
// ABOUTME: Covers all of Unicode through surrogate pairs, so it never substitutes

/// Encode to UTF-16 big-endian octets.
pub fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

/// Decode UTF-16BE octets. Unpaired surrogates become U+FFFD; a dangling
/// trailing octet is dropped.
pub fn decode(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmp_roundtrip() {
        let text = "Olá मनीष عالم";
        assert_eq!(decode(&encode(text)), text);
    }

    #[test]
    fn astral_roundtrip() {
        let text = "🎉 emoji 😊 pair";
        assert_eq!(decode(&encode(text)), text);
    }

    #[test]
    fn reference_bytes() {
        // "你好 😊" - the emoji needs a surrogate pair.
        let bytes = encode("你好 😊");
        assert_eq!(
            bytes,
            vec![0x4F, 0x60, 0x59, 0x7D, 0x00, 0x20, 0xD8, 0x3D, 0xDE, 0x0A]
        );
        assert_eq!(decode(&bytes), "你好 😊");
    }

    #[test]
    fn big_endian_not_little() {
        assert_eq!(encode("A"), vec![0x00, 0x41]);
    }

    #[test]
    fn dangling_octet_dropped() {
        assert_eq!(decode(&[0x00, 0x41, 0x00]), "A");
    }
}
