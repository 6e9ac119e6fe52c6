use crate::bits::check_group;
use crate::error::{LinkError, Result};
use crate::PCM_BITS_PER_SAMPLE;
use std::io::{self, Write};
use std::time::Duration;

/// Companded-codeword error count between a reference and a received stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorReport {
    /// Codewords with at least one wrong bit
    pub codeword_errors: usize,
    pub codewords: usize,
    pub bit_errors: usize,
}

impl ErrorReport {
    pub fn codeword_error_rate(&self) -> f64 {
        if self.codewords == 0 {
            0.0
        } else {
            self.codeword_errors as f64 / self.codewords as f64
        }
    }

    pub fn bit_error_rate(&self) -> f64 {
        let bits = self.codewords * PCM_BITS_PER_SAMPLE;
        if bits == 0 {
            0.0
        } else {
            self.bit_errors as f64 / bits as f64
        }
    }

    /// Plain-text report: error count and error rate on their own lines,
    /// then the elapsed time when one is given
    pub fn write_plain<W: Write>(&self, writer: &mut W, elapsed: Option<Duration>) -> io::Result<()> {
        writeln!(writer, "{}", self.codeword_errors)?;
        writeln!(writer, "{}", self.codeword_error_rate())?;
        if let Some(elapsed) = elapsed {
            writeln!(writer, "time cost:{}", elapsed.as_secs_f64())?;
        }
        Ok(())
    }
}

fn check_lengths(reference: &[bool], received: &[bool]) -> Result<()> {
    if reference.len() != received.len() {
        return Err(LinkError::LengthMismatch {
            left: reference.len(),
            right: received.len(),
        });
    }
    Ok(())
}

/// Raw bit mismatches between two equally long streams
pub fn bit_errors(reference: &[bool], received: &[bool]) -> Result<usize> {
    check_lengths(reference, received)?;
    Ok(reference.iter().zip(received).filter(|(a, b)| a != b).count())
}

/// Compare two companded streams codeword by codeword
pub fn codeword_errors(reference: &[bool], received: &[bool]) -> Result<ErrorReport> {
    check_lengths(reference, received)?;
    check_group("codeword comparison", reference.len(), PCM_BITS_PER_SAMPLE)?;

    let codeword_errors = reference
        .chunks(PCM_BITS_PER_SAMPLE)
        .zip(received.chunks(PCM_BITS_PER_SAMPLE))
        .filter(|(a, b)| a != b)
        .count();

    Ok(ErrorReport {
        codeword_errors,
        codewords: reference.len() / PCM_BITS_PER_SAMPLE,
        bit_errors: bit_errors(reference, received)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::bits_from_u8;

    #[test]
    fn test_counts_codewords_not_bits() {
        let reference = bits_from_u8(&[0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1]);
        let received = bits_from_u8(&[0, 1, 1, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1]);
        let report = codeword_errors(&reference, &received).unwrap();
        assert_eq!(report.codeword_errors, 1);
        assert_eq!(report.codewords, 2);
        assert_eq!(report.bit_errors, 2);
        assert_eq!(report.codeword_error_rate(), 0.5);
        assert_eq!(report.bit_error_rate(), 0.125);
    }

    #[test]
    fn test_plain_report_format() {
        let report = ErrorReport {
            codeword_errors: 3,
            codewords: 12,
            bit_errors: 5,
        };
        let mut out = Vec::new();
        report.write_plain(&mut out, None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "3\n0.25\n");

        let mut out = Vec::new();
        report
            .write_plain(&mut out, Some(Duration::from_millis(1500)))
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "3\n0.25\ntime cost:1.5\n");
    }

    #[test]
    fn test_empty_and_mismatched_inputs() {
        let report = codeword_errors(&[], &[]).unwrap();
        assert_eq!(report.codeword_error_rate(), 0.0);
        assert_eq!(
            bit_errors(&[true], &[true, false]),
            Err(LinkError::LengthMismatch { left: 1, right: 2 })
        );
        assert!(codeword_errors(&[true; 4], &[true; 4]).is_err());
    }
}
