use crate::{generate_code, OtpCode, OtpConfig, OtpError, OtpHashAlgorithm};

/// Default length of a time step, in seconds
pub const DEFAULT_PERIOD: u64 = 30;

/// Returns the number of whole `interval`s elapsed at `timestamp`
pub fn counter_at(interval: u64, timestamp: u64) -> Result<u64, OtpError> {
    if interval == 0 {
        return Err(OtpError::ZeroInterval);
    }

    Ok(timestamp / interval)
}

/// Returns the seconds left before the time step containing `timestamp` ends
pub fn remaining_seconds(interval: u64, timestamp: u64) -> Result<u64, OtpError> {
    if interval == 0 {
        return Err(OtpError::ZeroInterval);
    }

    Ok(interval - timestamp % interval)
}

/// Generates the [Time-based One-time Password](http://en.wikipedia.org/wiki/Time-based_One-time_Password_Algorithm)
/// for the time step containing `timestamp` (seconds since the UNIX epoch)
pub fn generate(
    secret: &[u8],
    interval: u64,
    timestamp: u64,
    config: &OtpConfig,
) -> Result<String, OtpError> {
    let counter = counter_at(interval, timestamp)?;

    crate::hotp::generate(secret, counter, config)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Totp {
    pub(crate) secret: Vec<u8>,
    pub(crate) config: OtpConfig,
    pub(crate) period: u64,
}

impl Totp {
    /// Creates the config for the TOTP given the raw secret bytes
    ///
    /// Obs.: This method defaults to the SHA1 hash, a 6-digit code and a period of 30 seconds
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            config: OtpConfig::default(),
            period: DEFAULT_PERIOD,
        }
    }

    ///  Sets hashing algorithm
    pub fn with_algorithm(&mut self, algorithm: OtpHashAlgorithm) -> &mut Self {
        self.config.with_algorithm(algorithm);

        self
    }

    ///  Sets the period in seconds
    pub fn with_period(&mut self, period: u64) -> &mut Self {
        self.period = period;

        self
    }

    ///  Sets the number of digits to generate
    pub fn with_digits(&mut self, digits: u32) -> &mut Self {
        self.config.with_digits(digits);

        self
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    /// Generates a Totp from the provided seconds since the UNIX epoch
    /// truncated to the specified number of digits
    pub fn generate(&self, seconds_since_epoch: u64) -> Result<OtpCode, OtpError> {
        let counter = counter_at(self.period, seconds_since_epoch)?;

        generate_code(&self.secret, counter, &self.config)
    }

    /// Seconds until the code returned by `generate` changes
    pub fn remaining_seconds(&self, seconds_since_epoch: u64) -> Result<u64, OtpError> {
        remaining_seconds(self.period, seconds_since_epoch)
    }

    /// Validates a code in the given window of time steps
    /// Returning the time step that it was found or None if the code is invalid
    ///
    /// Obs.: the RFC recommends a window of 1 step in the future and 1 in the past,
    /// but this function accepts any window you would like
    pub fn validate_window(
        &self,
        code: &str,
        seconds_since_epoch: u64,
        past_steps: u64,
        future_steps: u64,
    ) -> Result<Option<u64>, OtpError> {
        let current = counter_at(self.period, seconds_since_epoch)?;
        let first = current.saturating_sub(past_steps);
        let last = current.saturating_add(future_steps);

        let mut found = None;
        // Every step in the window is checked so the timing does not reveal the match
        for step in first..=last {
            if generate_code(&self.secret, step, &self.config)?.matches(code) && found.is_none() {
                found = Some(step);
            }
        }

        match found {
            Some(step) => log::debug!("TOTP code matched time step {step} (current {current})"),
            None => log::debug!("TOTP code did not match steps {first}..={last}"),
        }

        Ok(found)
    }
}
