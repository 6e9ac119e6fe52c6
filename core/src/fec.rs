use crate::bits::{check_group, pack_bits, unpack_bits};
use crate::error::Result;
use crate::{FEC_CODE_BITS, FEC_INFO_BITS};

// (12,8) systematic block code
//
// Codeword bit 0 is the most significant of the 12 bits. Information words
// are Gray-style differentially coded before multiplication by the
// generator, and the differential coding is undone after correction.

/// Generator matrix rows [I8 | P], one 12-bit row per information bit
const GENERATOR: [u16; 8] = [
    0b1000_0000_1110,
    0b0100_0000_1001,
    0b0010_0000_0101,
    0b0001_0000_1101,
    0b0000_1000_0011,
    0b0000_0100_1011,
    0b0000_0010_0111,
    0b0000_0001_1111,
];

/// Parity-check matrix rows [P^T | I4]
const PARITY_CHECK: [u16; 4] = [
    0b1101_0101_1000,
    0b1011_0011_0100,
    0b1000_1111_0010,
    0b0111_1111_0001,
];

/// Syndrome -> error pattern. Singles cover all 12 positions; the three
/// remaining weights map to double errors in the first three parity bits.
const SYNDROME_TABLE: [Option<u16>; 16] = [
    None,                    // 0000: nothing to correct
    Some(0b0000_0000_0001),  // 0001
    Some(0b0000_0000_0010),  // 0010
    Some(0b0000_1000_0000),  // 0011
    Some(0b0000_0000_0100),  // 0100
    Some(0b0010_0000_0000),  // 0101
    Some(0b0000_0000_0110),  // 0110
    Some(0b0000_0010_0000),  // 0111
    Some(0b0000_0000_1000),  // 1000
    Some(0b0100_0000_0000),  // 1001
    Some(0b0000_0000_1010),  // 1010
    Some(0b0000_0100_0000),  // 1011
    Some(0b0000_0000_1100),  // 1100
    Some(0b0001_0000_0000),  // 1101
    Some(0b1000_0000_0000),  // 1110
    Some(0b0000_0001_0000),  // 1111
];

/// Outcome of the syndrome check on one codeword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Zero syndrome, codeword taken as received
    Clean,
    /// The table pattern was XOR-ed into the codeword
    Corrected { syndrome: u8, pattern: u16 },
    /// Non-zero syndrome without a table entry; bits pass through unchanged
    Uncorrectable { syndrome: u8 },
}

/// Per-stream decode statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FecStats {
    pub codewords: usize,
    pub corrected: usize,
    pub uncorrectable: usize,
}

impl FecStats {
    fn record(&mut self, correction: Correction) {
        self.codewords += 1;
        match correction {
            Correction::Clean => {}
            Correction::Corrected { .. } => self.corrected += 1,
            Correction::Uncorrectable { .. } => self.uncorrectable += 1,
        }
    }
}

fn parity(value: u16) -> u16 {
    (value.count_ones() & 1) as u16
}

/// Each bit becomes the XOR of itself and the previous original bit
fn differential_encode(word: u8) -> u8 {
    word ^ (word >> 1)
}

/// Each output bit is the XOR of the coded bit and the previous output bit
fn differential_decode(coded: u8) -> u8 {
    let mut word = coded & 0x80;
    for shift in (0..7).rev() {
        let previous = (word >> (shift + 1)) & 1;
        let bit = ((coded >> shift) & 1) ^ previous;
        word |= bit << shift;
    }
    word
}

/// 4-bit syndrome of a 12-bit codeword, first check row most significant
pub fn syndrome(codeword: u16) -> u8 {
    PARITY_CHECK
        .iter()
        .fold(0u16, |acc, &row| (acc << 1) | parity(row & codeword)) as u8
}

/// Error pattern registered for a syndrome, if any
pub fn lookup_syndrome(syndrome: u8) -> Option<u16> {
    SYNDROME_TABLE.get(syndrome as usize).copied().flatten()
}

/// Encode one 8-bit information word into a 12-bit codeword
pub fn encode_word(info: u8) -> u16 {
    let coded = differential_encode(info);
    GENERATOR
        .iter()
        .enumerate()
        .filter(|(i, _)| (coded >> (7 - i)) & 1 == 1)
        .fold(0u16, |acc, (_, &row)| acc ^ row)
}

/// Correct and decode one 12-bit codeword
///
/// Works on a copy: the caller's codeword is never modified.
pub fn decode_word(codeword: u16) -> (u8, Correction) {
    let codeword = codeword & 0x0FFF;
    let syndrome = syndrome(codeword);

    let (corrected, correction) = if syndrome == 0 {
        (codeword, Correction::Clean)
    } else {
        match lookup_syndrome(syndrome) {
            Some(pattern) => (codeword ^ pattern, Correction::Corrected { syndrome, pattern }),
            None => (codeword, Correction::Uncorrectable { syndrome }),
        }
    };

    let info = differential_decode((corrected >> 4) as u8);
    (info, correction)
}

/// Block encoder over bit streams (8 information bits -> 12 code bits)
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockEncoder;

impl BlockEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, bits: &[bool]) -> Result<Vec<bool>> {
        check_group("block encode", bits.len(), FEC_INFO_BITS)?;

        let mut encoded = Vec::with_capacity(bits.len() / FEC_INFO_BITS * FEC_CODE_BITS);
        for chunk in bits.chunks(FEC_INFO_BITS) {
            let codeword = encode_word(pack_bits(chunk) as u8);
            encoded.extend(unpack_bits(codeword, FEC_CODE_BITS));
        }
        Ok(encoded)
    }
}

/// Syndrome-table decoder over bit streams (12 code bits -> 8 information bits)
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockDecoder;

impl BlockDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, bits: &[bool]) -> Result<Vec<bool>> {
        self.decode_with_stats(bits).map(|(decoded, _)| decoded)
    }

    /// Decode and report how many codewords needed (or failed) correction
    pub fn decode_with_stats(&self, bits: &[bool]) -> Result<(Vec<bool>, FecStats)> {
        check_group("block decode", bits.len(), FEC_CODE_BITS)?;

        let mut stats = FecStats::default();
        let mut decoded = Vec::with_capacity(bits.len() / FEC_CODE_BITS * FEC_INFO_BITS);
        for chunk in bits.chunks(FEC_CODE_BITS) {
            let (info, correction) = decode_word(pack_bits(chunk));
            stats.record(correction);
            decoded.extend(unpack_bits(info as u16, FEC_INFO_BITS));
        }

        log::debug!(
            "block decoded {} codewords ({} corrected, {} uncorrectable)",
            stats.codewords,
            stats.corrected,
            stats.uncorrectable
        );
        Ok((decoded, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::bits_from_u8;
    use crate::error::LinkError;

    #[test]
    fn test_generator_and_parity_check_agree() {
        for &row in GENERATOR.iter() {
            assert_eq!(syndrome(row), 0, "row {:012b}", row);
        }
    }

    #[test]
    fn test_differential_coding() {
        assert_eq!(differential_encode(0b0000_0010), 0b0000_0011);
        assert_eq!(differential_encode(0b1111_1111), 0b1000_0000);
        for word in 0u8..=255 {
            assert_eq!(differential_decode(differential_encode(word)), word);
        }
    }

    #[test]
    fn test_known_codewords() {
        assert_eq!(encode_word(0b0000_0000), 0);
        assert_eq!(encode_word(0b0000_0001), 0b0000_0001_1111);
        assert_eq!(encode_word(0b0000_0010), 0b0000_0011_1000);
    }

    #[test]
    fn test_clean_roundtrip() {
        for word in 0u8..=255 {
            assert_eq!(decode_word(encode_word(word)), (word, Correction::Clean));
        }
    }

    #[test]
    fn test_every_single_bit_error_is_corrected() {
        for word in 0u8..=255 {
            let codeword = encode_word(word);
            for position in 0..FEC_CODE_BITS {
                let flipped = codeword ^ (1 << position);
                let (decoded, correction) = decode_word(flipped);
                assert_eq!(decoded, word, "word {} position {}", word, position);
                assert!(matches!(correction, Correction::Corrected { pattern, .. } if pattern == 1 << position));
            }
        }
    }

    #[test]
    fn test_double_parity_errors_in_table_are_corrected() {
        let codeword = encode_word(0xA5);
        for pattern in [0b1100u16, 0b1010, 0b0110] {
            let (decoded, correction) = decode_word(codeword ^ pattern);
            assert_eq!(decoded, 0xA5);
            assert!(matches!(correction, Correction::Corrected { .. }));
        }
    }

    #[test]
    fn test_syndrome_table_has_no_entry_for_zero() {
        assert_eq!(lookup_syndrome(0), None);
        assert_eq!((1u8..16).filter(|&s| lookup_syndrome(s).is_some()).count(), 15);
        for s in 1u8..16 {
            let pattern = lookup_syndrome(s).unwrap();
            assert_eq!(syndrome(pattern), s);
        }
    }

    #[test]
    fn test_stream_with_flipped_bit() {
        let info = bits_from_u8(&[
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0,
            0, 0, 1, 1,
        ]);
        let mut encoded = BlockEncoder::new().encode(&info).unwrap();
        assert_eq!(encoded.len(), 48);

        encoded[12] = !encoded[12];
        let (decoded, stats) = BlockDecoder::new().decode_with_stats(&encoded).unwrap();
        assert_eq!(decoded, info);
        assert_eq!(
            stats,
            FecStats {
                codewords: 4,
                corrected: 1,
                uncorrectable: 0
            }
        );
    }

    #[test]
    fn test_invalid_lengths() {
        assert!(matches!(
            BlockEncoder::new().encode(&[true; 9]),
            Err(LinkError::InvalidInputSize { group: 8, .. })
        ));
        assert!(matches!(
            BlockDecoder::new().decode(&[true; 16]),
            Err(LinkError::InvalidInputSize { group: 12, .. })
        ));
    }
}
