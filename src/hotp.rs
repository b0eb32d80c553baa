use crate::{generate_code, OtpCode, OtpConfig, OtpError, OtpHashAlgorithm};

/// Generates the [HMAC-based One-time Password](http://en.wikipedia.org/wiki/HMAC-based_One-time_Password_Algorithm)
/// for `counter`, zero-padded to the configured number of digits
pub fn generate(secret: &[u8], counter: u64, config: &OtpConfig) -> Result<String, OtpError> {
    generate_code(secret, counter, config).map(|code| code.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hotp {
    pub(crate) secret: Vec<u8>,
    pub(crate) config: OtpConfig,
    // The next counter value expected by `validate`
    pub(crate) counter: u64,
    // Set once `u64::MAX` has been accepted, no counter is left after it
    pub(crate) exhausted: bool,
}

impl Hotp {
    /// Creates the config for the HOTP given the raw secret bytes
    ///
    /// Obs.: This method defaults to the SHA1 hash and a 6-digit code
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            config: OtpConfig::default(),
            counter: 0,
            exhausted: false,
        }
    }

    ///  Sets hashing algorithm
    pub fn with_algorithm(&mut self, algorithm: OtpHashAlgorithm) -> &mut Self {
        self.config.with_algorithm(algorithm);

        self
    }

    ///  Sets the number of digits to generate
    pub fn with_digits(&mut self, digits: u32) -> &mut Self {
        self.config.with_digits(digits);

        self
    }

    ///  Sets the internal counter
    pub fn with_counter(&mut self, counter: u64) -> &mut Self {
        self.counter = counter;
        self.exhausted = false;

        self
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Generates a HOTP from the provided counter
    /// truncated to the specified number of digits
    pub fn generate(&self, counter: u64) -> Result<OtpCode, OtpError> {
        generate_code(&self.secret, counter, &self.config)
    }

    /// Generates a HOTP from the provided counter
    /// truncated to the specified number of digits
    ///
    /// Also updates the internal counter
    pub fn generate_and_update_counter(&mut self, counter: u64) -> Result<OtpCode, OtpError> {
        self.with_counter(counter);
        self.generate(counter)
    }

    /// Looks for `code` among the internal counter and the next `look_ahead` values.
    ///
    /// On a match the internal counter moves past the matching value, which is returned.
    /// Once the code for `u64::MAX` has been accepted nothing validates anymore.
    pub fn validate(&mut self, code: &str, look_ahead: u64) -> Result<Option<u64>, OtpError> {
        if self.exhausted {
            log::debug!("HOTP counter is exhausted");
            return Ok(None);
        }

        let last = self.counter.saturating_add(look_ahead);

        let mut found = None;
        // Every counter in the window is checked so the timing does not reveal the match
        for counter in self.counter..=last {
            if self.generate(counter)?.matches(code) && found.is_none() {
                found = Some(counter);
            }
        }

        match found {
            Some(counter) => {
                log::debug!("HOTP code matched {} steps ahead", counter - self.counter);
                match counter.checked_add(1) {
                    Some(next) => self.counter = next,
                    None => self.exhausted = true,
                }
            }
            None => log::debug!("HOTP code did not match within {look_ahead} steps"),
        }

        Ok(found)
    }
}
