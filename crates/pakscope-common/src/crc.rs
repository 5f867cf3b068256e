//! CRC32 hashing utilities.
//!
//! Valve VPK directories store an IEEE CRC32 for every entry payload
//! (preload bytes followed by archive bytes).

/// Compute the CRC32 of a byte slice.
#[inline]
pub fn hash_bytes(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Compute the CRC32 of several byte slices as if they were concatenated.
pub fn hash_chunks<'a, I>(chunks: I) -> u32
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = crc32fast::Hasher::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_hash() {
        assert_eq!(hash_bytes(&[]), 0);
    }

    #[test]
    fn test_known_hash() {
        // Standard check value for CRC-32/ISO-HDLC
        assert_eq!(hash_bytes(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_chunks_match_whole() {
        assert_eq!(
            hash_chunks([&b"1234"[..], &b""[..], &b"56789"[..]]),
            hash_bytes(b"123456789")
        );
    }
}
