use std::time::SystemTime;

use otpgen::totp::Totp;

pub fn main() -> anyhow::Result<()> {
    // Initialize the TOTP with the defaults (SHA1 hash, 6-digits and 30 seconds period)
    let totp = Totp::new(b"12345678901234567890".to_vec());

    // Calculate time since Unix Epoch
    let now = SystemTime::now();
    let time_since_epoch = now.duration_since(SystemTime::UNIX_EPOCH)?;

    // Generate the code with the seconds
    let code = totp.generate(time_since_epoch.as_secs())?;

    println!(
        "Code: {}, Remaining time: {}",
        code,
        totp.remaining_seconds(time_since_epoch.as_secs())?
    );

    Ok(())
}
