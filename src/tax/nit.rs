//! NIT check digit (DV) computation
//!
//! The DV is a weighted modulus-11 checksum: the digits are read right to
//! left, multiplied by a fixed table of primes, summed and reduced mod 11.

/// Weights applied to the digits, rightmost digit first
pub const NIT_WEIGHTS: [u32; 15] = [3, 7, 13, 17, 19, 23, 29, 37, 41, 43, 47, 53, 59, 67, 71];

/// Longest NIT the weight table can cover
pub const MAX_NIT_DIGITS: usize = NIT_WEIGHTS.len();

/// Strip the usual thousands separators and check that only digits remain
pub fn normalize_nit(nit: &str) -> Result<String, NitError> {
    let mut digits = String::with_capacity(nit.len());

    for c in nit.trim().chars() {
        match c {
            '0'..='9' => digits.push(c),
            '.' | ',' | ' ' => {}
            other => return Err(NitError::InvalidCharacter(other)),
        }
    }

    if digits.is_empty() {
        return Err(NitError::Empty);
    }

    if digits.len() > MAX_NIT_DIGITS {
        return Err(NitError::TooLong(digits.len()));
    }

    Ok(digits)
}

/// Compute the check digit for a NIT.
///
/// Inputs longer than 15 digits are rejected rather than partially weighted.
pub fn check_digit(nit: &str) -> Result<u8, NitError> {
    let digits = normalize_nit(nit)?;

    let sum: u32 = digits
        .bytes()
        .rev()
        .zip(NIT_WEIGHTS.iter())
        .map(|(b, w)| u32::from(b - b'0') * w)
        .sum();

    let remainder = sum % 11;
    let dv = match remainder {
        0 | 1 => remainder,
        r => 11 - r,
    };

    Ok(dv as u8)
}

/// Render a NIT with its check digit, e.g. `"900123456-8"`
pub fn format_nit(nit: &str) -> Result<String, NitError> {
    let digits = normalize_nit(nit)?;
    let dv = check_digit(&digits)?;
    Ok(format!("{digits}-{dv}"))
}

/// Verify a `"NIT-DV"` string
pub fn verify_nit(nit_with_dv: &str) -> Result<(), NitError> {
    let (nit, dv) = nit_with_dv
        .rsplit_once('-')
        .ok_or(NitError::MissingCheckDigit)?;

    let given = match dv.trim() {
        d if d.len() == 1 && d.as_bytes()[0].is_ascii_digit() => d.as_bytes()[0] - b'0',
        _ => return Err(NitError::MissingCheckDigit),
    };

    let expected = check_digit(nit)?;
    if given != expected {
        return Err(NitError::Mismatch { expected, given });
    }

    Ok(())
}

/// NIT-related errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NitError {
    #[error("NIT is empty")]
    Empty,
    #[error("invalid character {0:?} in NIT")]
    InvalidCharacter(char),
    #[error("NIT has {0} digits, at most 15 are supported")]
    TooLong(usize),
    #[error("missing check digit, expected NIT-DV")]
    MissingCheckDigit,
    #[error("check digit mismatch: expected {expected}, got {given}")]
    Mismatch { expected: u8, given: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(check_digit("900123456").unwrap(), 8);
        // DIAN's own NIT
        assert_eq!(check_digit("800197268").unwrap(), 4);
    }

    #[test]
    fn test_remainder_zero_and_one_map_to_themselves() {
        // 4*3 = 12, 12 % 11 = 1
        assert_eq!(check_digit("4").unwrap(), 1);
        // 0 * 3 = 0
        assert_eq!(check_digit("0").unwrap(), 0);
        // 1*3 + 1*7 = 10, 11 - 10 = 1
        assert_eq!(check_digit("11").unwrap(), 1);
    }

    #[test]
    fn test_separators_ignored() {
        assert_eq!(check_digit("900.123.456").unwrap(), 8);
        assert_eq!(check_digit(" 900,123,456 ").unwrap(), 8);
    }

    #[test]
    fn test_invalid_input() {
        assert_eq!(check_digit(""), Err(NitError::Empty));
        assert_eq!(check_digit(" . "), Err(NitError::Empty));
        assert_eq!(check_digit("90012A456"), Err(NitError::InvalidCharacter('A')));
    }

    #[test]
    fn test_fifteen_digits_accepted_sixteen_rejected() {
        assert!(check_digit("123456789012345").is_ok());
        assert_eq!(check_digit("1234567890123456"), Err(NitError::TooLong(16)));
    }

    #[test]
    fn test_format_and_verify() {
        assert_eq!(format_nit("900.123.456").unwrap(), "900123456-8");
        assert!(verify_nit("900123456-8").is_ok());
        assert!(verify_nit("800.197.268-4").is_ok());
        assert_eq!(
            verify_nit("900123456-3"),
            Err(NitError::Mismatch {
                expected: 8,
                given: 3
            })
        );
        assert_eq!(verify_nit("900123456"), Err(NitError::MissingCheckDigit));
    }
}
