//! HMAC-based ([RFC 4226](https://datatracker.ietf.org/doc/html/rfc4226)) and time-based
//! ([RFC 6238](https://datatracker.ietf.org/doc/html/rfc6238)) one-time password generation
//! from raw secret bytes.
//!
//! The free functions [`hotp::generate`] and [`totp::generate`] are the whole computation;
//! [`hotp::Hotp`] and [`totp::Totp`] bundle a secret with its parameters for callers that
//! keep them together.

pub mod hotp;
pub mod totp;

use std::{fmt::Display, str::FromStr};

use hmac::{digest::KeyInit, Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

/// Smallest accepted number of digits in a code.
pub const MIN_DIGITS: u32 = 1;

/// Largest accepted number of digits in a code.
///
/// The truncated value is at most 31 bits wide, which is ten decimal digits.
pub const MAX_DIGITS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("Invalid number of digits, found {0}. Expected a value between 1 and 10")]
    InvalidDigits(u32),
    #[error("The interval must be greater than zero")]
    ZeroInterval,
    #[error("The secret must not be empty")]
    EmptySecret,
    #[error("Invalid hashing algorithm, found {0}. Expected one of: SHA1, SHA256 or SHA512")]
    InvalidHashingAlgorithm(String),
    #[error("The secret could not be used as an HMAC key, length: {0}")]
    InvalidKeyLength(usize),
    #[error("Invalid digest")]
    InvalidDigest(Vec<u8>),
}

/// Broad classification of an [`OtpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied a value the algorithm cannot work with.
    InvalidParameter,
    /// The keyed hash produced something dynamic truncation cannot read.
    InvalidDigest,
}

impl OtpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDigits(_)
            | Self::ZeroInterval
            | Self::EmptySecret
            | Self::InvalidHashingAlgorithm(_)
            | Self::InvalidKeyLength(_) => ErrorKind::InvalidParameter,
            Self::InvalidDigest(_) => ErrorKind::InvalidDigest,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtpHashAlgorithm {
    #[default]
    SHA1,
    SHA256,
    SHA512,
}

impl OtpHashAlgorithm {
    /// Length in bytes of the HMAC output for this algorithm.
    pub const fn digest_len(self) -> usize {
        match self {
            Self::SHA1 => 20,
            Self::SHA256 => 32,
            Self::SHA512 => 64,
        }
    }
}

impl Display for OtpHashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SHA1 => write!(f, "SHA1"),
            Self::SHA256 => write!(f, "SHA256"),
            Self::SHA512 => write!(f, "SHA512"),
        }
    }
}

impl FromStr for OtpHashAlgorithm {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_uppercase();

        match normalized.as_str() {
            "SHA1" => Ok(Self::SHA1),
            "SHA256" => Ok(Self::SHA256),
            "SHA512" => Ok(Self::SHA512),
            _ => Err(OtpError::InvalidHashingAlgorithm(s.to_string())),
        }
    }
}

/// Parameters shared by HOTP and TOTP generation.
///
/// Defaults to a 6-digit code over HMAC-SHA1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpConfig {
    pub(crate) digits: u32,
    pub(crate) algorithm: OtpHashAlgorithm,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            digits: 6,
            algorithm: OtpHashAlgorithm::SHA1,
        }
    }
}

impl OtpConfig {
    pub const fn new(digits: u32, algorithm: OtpHashAlgorithm) -> Self {
        Self { digits, algorithm }
    }

    ///  Sets hashing algorithm
    pub fn with_algorithm(&mut self, algorithm: OtpHashAlgorithm) -> &mut Self {
        self.algorithm = algorithm;

        self
    }

    ///  Sets the number of digits to generate
    pub fn with_digits(&mut self, digits: u32) -> &mut Self {
        self.digits = digits;

        self
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    pub fn algorithm(&self) -> OtpHashAlgorithm {
        self.algorithm
    }

    /// Checks that the digit count is within [`MIN_DIGITS`]..=[`MAX_DIGITS`]
    pub fn validate(&self) -> Result<(), OtpError> {
        if !(MIN_DIGITS..=MAX_DIGITS).contains(&self.digits) {
            return Err(OtpError::InvalidDigits(self.digits));
        }

        Ok(())
    }
}

/// A generated code together with the width it must be displayed at.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OtpCode {
    code: u32,
    digits: u32,
}

impl OtpCode {
    pub fn integer(&self) -> u32 {
        self.code
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    /// Compares the zero-padded code with `candidate` in constant time
    pub fn matches(&self, candidate: &str) -> bool {
        let expected = self.to_string();
        if expected.len() != candidate.len() {
            return false;
        }

        expected.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl Display for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:0padding$}",
            self.code,
            padding = (self.digits as usize)
        )
    }
}

/// Validates the parameters and computes the code for a single counter value.
pub(crate) fn generate_code(
    secret: &[u8],
    counter: u64,
    config: &OtpConfig,
) -> Result<OtpCode, OtpError> {
    config.validate()?;
    if secret.is_empty() {
        return Err(OtpError::EmptySecret);
    }

    log::trace!(
        "Generating a {}-digit code with HMAC-{}",
        config.digits,
        config.algorithm
    );

    let digest = calc_digest(secret, config.algorithm, counter)?;
    let code = encode_digest_truncated(&digest, config.digits)?;

    Ok(OtpCode {
        code,
        digits: config.digits,
    })
}

/// Calculates the HMAC digest of the big-endian counter keyed with the secret.
pub(crate) fn calc_digest(
    secret: &[u8],
    algorithm: OtpHashAlgorithm,
    data: u64,
) -> Result<Vec<u8>, OtpError> {
    let data = data.to_be_bytes();

    match algorithm {
        OtpHashAlgorithm::SHA1 => sign::<Hmac<Sha1>>(secret, &data),
        OtpHashAlgorithm::SHA256 => sign::<Hmac<Sha256>>(secret, &data),
        OtpHashAlgorithm::SHA512 => sign::<Hmac<Sha512>>(secret, &data),
    }
}

fn sign<M: Mac + KeyInit>(secret: &[u8], data: &[u8]) -> Result<Vec<u8>, OtpError> {
    let mut mac = <M as KeyInit>::new_from_slice(secret)
        .map_err(|_| OtpError::InvalidKeyLength(secret.len()))?;
    mac.update(data);

    Ok(mac.finalize().into_bytes().to_vec())
}

/// Encodes the HMAC digest into a truncated integer.
///
/// When `10^digits` does not fit in a `u32` the reduction is skipped, the 31-bit
/// value already being smaller than it.
pub(crate) fn encode_digest_truncated(
    digest: &[u8],
    target_digits_count: u32,
) -> Result<u32, OtpError> {
    // The last byte tells us the offset for any algorithm
    let offset = match digest.last() {
        Some(x) => *x & 0xf,
        None => return Err(OtpError::InvalidDigest(Vec::from(digest))),
    } as usize;

    // Gets the 4 bytes that will compose the code
    let code_bytes: [u8; 4] = match digest
        .get(offset..offset + 4)
        .and_then(|bytes| bytes.try_into().ok())
    {
        Some(x) => x,
        None => return Err(OtpError::InvalidDigest(Vec::from(digest))),
    };

    let code = u32::from_be_bytes(code_bytes) & 0x7fff_ffff;

    Ok(match 10_u32.checked_pow(target_digits_count) {
        Some(truncation_factor) => code % truncation_factor,
        None => code,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    // RFC 4226 section 5.4
    const RFC4226_EXAMPLE_DIGEST: [u8; 20] = [
        0x1f, 0x86, 0x98, 0x69, 0x0e, 0x02, 0xca, 0x16, 0x61, 0x85, 0x50, 0xef, 0x7f, 0x19, 0xda,
        0x8e, 0x94, 0x5b, 0x55, 0x5a,
    ];

    #[rstest]
    #[case(6, 872921)]
    #[case(8, 57872921)]
    #[case(9, 357872921)]
    #[case(10, 1357872921)]
    fn truncates_rfc_example(#[case] digits: u32, #[case] expected: u32) {
        assert_eq!(
            encode_digest_truncated(&RFC4226_EXAMPLE_DIGEST, digits).unwrap(),
            expected
        );
    }

    #[test]
    fn truncation_masks_the_sign_bit() {
        let mut digest = [0xffu8; 20];
        digest[19] = 0x00;

        assert_eq!(encode_digest_truncated(&digest, 10).unwrap(), 0x7fff_ffff);
    }

    #[rstest]
    #[case(&[])]
    #[case(&[0x0f; 16])]
    fn truncation_rejects_short_digests(#[case] digest: &[u8]) {
        let err = encode_digest_truncated(digest, 6).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDigest);
    }

    #[rstest]
    #[case(OtpHashAlgorithm::SHA1)]
    #[case(OtpHashAlgorithm::SHA256)]
    #[case(OtpHashAlgorithm::SHA512)]
    fn digest_length_follows_algorithm(#[case] algorithm: OtpHashAlgorithm) {
        let digest = calc_digest(b"12345678901234567890", algorithm, 0).unwrap();
        assert_eq!(digest.len(), algorithm.digest_len());
    }

    #[rstest]
    #[case("sha1", OtpHashAlgorithm::SHA1)]
    #[case("SHA256", OtpHashAlgorithm::SHA256)]
    #[case("Sha512", OtpHashAlgorithm::SHA512)]
    fn parses_algorithm_names(#[case] name: &str, #[case] expected: OtpHashAlgorithm) {
        assert_eq!(name.parse::<OtpHashAlgorithm>().unwrap(), expected);
        assert_eq!(expected.to_string(), name.to_uppercase());
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let err = "md5".parse::<OtpHashAlgorithm>().unwrap_err();
        assert!(matches!(err, OtpError::InvalidHashingAlgorithm(ref name) if name == "md5"));
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[rstest]
    #[case(0)]
    #[case(11)]
    #[case(u32::MAX)]
    fn config_rejects_out_of_range_digits(#[case] digits: u32) {
        let mut config = OtpConfig::default();
        config.with_digits(digits);

        assert!(matches!(config.validate(), Err(OtpError::InvalidDigits(d)) if d == digits));
    }

    #[test]
    fn config_defaults() {
        let config = OtpConfig::default();

        assert_eq!(config.digits(), 6);
        assert_eq!(config.algorithm(), OtpHashAlgorithm::SHA1);
        assert_eq!(config, OtpConfig::new(6, OtpHashAlgorithm::SHA1));
    }

    #[rstest]
    #[case(5924, 6, "005924")]
    #[case(0, 1, "0")]
    #[case(137359152, 10, "0137359152")]
    fn code_is_zero_padded(#[case] code: u32, #[case] digits: u32, #[case] expected: &str) {
        let code = OtpCode { code, digits };

        assert_eq!(code.to_string(), expected);
        assert_eq!(code.digits() as usize, expected.len());
        assert!(code.matches(expected));
    }

    #[rstest]
    #[case("5924")]
    #[case("005925")]
    #[case("0005924")]
    #[case("")]
    fn code_rejects_other_candidates(#[case] candidate: &str) {
        let code = OtpCode {
            code: 5924,
            digits: 6,
        };

        assert!(!code.matches(candidate));
    }

    #[test]
    fn empty_secret_is_rejected_before_hashing() {
        let err = generate_code(&[], 0, &OtpConfig::default()).unwrap_err();

        assert!(matches!(err, OtpError::EmptySecret));
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }
}
