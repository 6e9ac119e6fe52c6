use crate::error::{LinkError, Result};

/// Pack up to 16 bits into an integer, first bit most significant
pub fn pack_bits(bits: &[bool]) -> u16 {
    debug_assert!(bits.len() <= 16);
    bits.iter().fold(0u16, |acc, &bit| (acc << 1) | bit as u16)
}

/// Unpack the low `width` bits of `value`, most significant first
pub fn unpack_bits(value: u16, width: usize) -> Vec<bool> {
    debug_assert!(width <= 16);
    (0..width)
        .rev()
        .map(|shift| (value >> shift) & 1 == 1)
        .collect()
}

/// Reject streams whose length is not a whole number of groups
pub fn check_group(stage: &'static str, len: usize, group: usize) -> Result<()> {
    if len % group != 0 {
        return Err(LinkError::InvalidInputSize { stage, len, group });
    }
    Ok(())
}

/// Convert 0/1 integers into a bit stream (test vectors, report files)
pub fn bits_from_u8(values: &[u8]) -> Vec<bool> {
    values.iter().map(|&v| v != 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_is_big_endian() {
        assert_eq!(pack_bits(&[true, false, false, true]), 0b1001);
        assert_eq!(pack_bits(&[false, true, false, true]), 0b0101);
        assert_eq!(pack_bits(&[]), 0);
    }

    #[test]
    fn test_unpack_matches_pack() {
        for value in 0u16..16 {
            assert_eq!(pack_bits(&unpack_bits(value, 4)), value);
        }
        assert_eq!(
            unpack_bits(0b1010_0000_0001, 12),
            bits_from_u8(&[1, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 1])
        );
    }

    #[test]
    fn test_check_group() {
        assert!(check_group("test", 24, 8).is_ok());
        assert!(check_group("test", 0, 12).is_ok());
        assert_eq!(
            check_group("test", 13, 4),
            Err(LinkError::InvalidInputSize {
                stage: "test",
                len: 13,
                group: 4
            })
        );
    }
}
