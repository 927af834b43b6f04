// ABOUTME: ISO 8859-1 codec - code points 0x00..=0xFF map 1:1 to octets

/// Encode to Latin-1. Characters above U+00FF become '?'.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) <= 0xFF { c as u8 } else { b'?' })
        .collect()
}

/// Decode from Latin-1; every octet is a valid code point.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let text = "Olá, señor Müller — nope, that dash is out";
        // The em-dash is outside Latin-1; everything else survives.
        let decoded = decode(&encode(text));
        assert_eq!(decoded, text.replace('—', "?"));
    }

    #[test]
    fn high_half_roundtrip() {
        let text = "çãõéêíóúÀÈÌÒÙ¡¿ÿ";
        assert_eq!(decode(&encode(text)), text);
    }

    #[test]
    fn exact_bytes() {
        assert_eq!(encode("Aé"), vec![0x41, 0xE9]);
        assert_eq!(decode(&[0x41, 0xE9]), "Aé");
    }
}
