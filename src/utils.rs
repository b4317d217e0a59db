/// Hex helpers for signatures, small enough not to need another dependency.
pub mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string such as `c0a8` or `c0:a8` / `c0 a8`.
    ///
    /// Returns None on odd length or non-hex characters.
    pub fn decode(text: &str) -> Option<Vec<u8>> {
        let digits: Vec<char> = text
            .chars()
            .filter(|c| !matches!(c, ':' | ' ' | '-'))
            .collect();

        if digits.len() % 2 != 0 {
            return None;
        }

        digits
            .chunks(2)
            .map(|pair| {
                let high = pair[0].to_digit(16)?;
                let low = pair[1].to_digit(16)?;
                Some((high * 16 + low) as u8)
            })
            .collect()
    }
}

/// Split `ip:port` into its parts.
pub fn parse_host_port(text: &str) -> Option<(std::net::Ipv4Addr, u16)> {
    let (host, port) = text.trim().rsplit_once(':')?;
    let host = host.trim().parse().ok()?;
    let port = port.trim().parse().ok()?;
    Some((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_hex_roundtrip_forms() {
        assert_eq!(hex::decode("c0a8"), Some(vec![0xc0, 0xa8]));
        assert_eq!(hex::decode("C0:A8"), Some(vec![0xc0, 0xa8]));
        assert_eq!(hex::decode("c0 a8 01"), Some(vec![0xc0, 0xa8, 0x01]));
        assert_eq!(hex::encode(&[0xc0, 0xa8]), "c0a8");
    }

    #[test]
    fn test_hex_rejects_bad_input() {
        assert_eq!(hex::decode("c0a"), None);
        assert_eq!(hex::decode("zz"), None);
        assert_eq!(hex::decode(""), Some(vec![]));
    }

    #[test]
    fn test_parse_host_port() {
        assert_eq!(
            parse_host_port("219.84.200.54:6900"),
            Some((Ipv4Addr::new(219, 84, 200, 54), 6900))
        );
        assert_eq!(parse_host_port(" 10.0.0.1 : 80 "), Some((Ipv4Addr::new(10, 0, 0, 1), 80)));
        assert_eq!(parse_host_port("example.com:80"), None);
        assert_eq!(parse_host_port("10.0.0.1"), None);
        assert_eq!(parse_host_port("10.0.0.1:99999"), None);
    }
}
