//! TOTP (Time-based One-Time Password) field parsing
//!
//! Bitwarden stores the TOTP field of a login either as a bare base32
//! secret or as an `otpauth://` key URI. The vault store keeps the secret
//! and the `period;digits` settings as two separate entry properties.

use url::Url;

/// Default time step in seconds
pub const DEFAULT_TOTP_PERIOD: u32 = 30;

/// Default code length
pub const DEFAULT_TOTP_DIGITS: u32 = 6;

/// Parsed TOTP configuration
///
/// `period` and `digits` are kept as the text found in the URI so unusual
/// values survive the migration unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpSettings {
    pub secret: String,
    pub period: String,
    pub digits: String,
}

impl TotpSettings {
    /// Settings value in the `"{period};{digits}"` form
    pub fn settings_value(&self) -> String {
        format!("{};{}", self.period, self.digits)
    }
}

/// Parse a TOTP field.
///
/// # Arguments
/// * `field` - The raw TOTP field of a login
///
/// # Returns
/// * `Some(TotpSettings)` - For any non-empty field
/// * `None` - If the field is empty
///
/// # Example
/// ```
/// use vaultport_shared::utils::totp::parse_totp;
///
/// let totp = parse_totp("otpauth://totp/X?secret=ABC&period=45&digits=8").unwrap();
/// assert_eq!(totp.secret, "ABC");
/// assert_eq!(totp.settings_value(), "45;8");
/// ```
pub fn parse_totp(field: &str) -> Option<TotpSettings> {
    if field.is_empty() {
        return None;
    }

    let mut settings = TotpSettings {
        secret: field.to_string(),
        period: DEFAULT_TOTP_PERIOD.to_string(),
        digits: DEFAULT_TOTP_DIGITS.to_string(),
    };

    let uri = match Url::parse(field) {
        Ok(uri) if uri.scheme().eq_ignore_ascii_case("otpauth") => uri,
        _ => return Some(settings),
    };

    // Later occurrences override earlier ones; blank values are ignored
    for (key, value) in uri.query_pairs() {
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            "secret" => settings.secret = value.into_owned(),
            "period" => settings.period = value.into_owned(),
            "digits" => settings.digits = value.into_owned(),
            _ => {}
        }
    }

    Some(settings)
}
