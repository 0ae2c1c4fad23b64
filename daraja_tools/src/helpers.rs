use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0} is not a valid payer phone number")]
pub struct PhoneFormatError(pub String);

/// Normalize a payer phone number into canonical MSISDN form (country prefix + 9 digits).
///
/// Accepted inputs, for a prefix of `254`:
/// * `0712345678` — leading zero replaced with the prefix
/// * `712345678` / `110123456` — bare subscriber number, prefix prepended
/// * `+254712345678` / `254 712 345-678` — `+`, spaces and dashes stripped
///
/// Anything that does not land on exactly `prefix + 9` digits is rejected.
pub fn normalize_phone(raw: &str, prefix: &str) -> Result<String, PhoneFormatError> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '+' | ' ' | '-')).collect();
    let msisdn = if let Some(rest) = cleaned.strip_prefix('0') {
        format!("{prefix}{rest}")
    } else if cleaned.starts_with(prefix) {
        cleaned
    } else if cleaned.starts_with('7') || cleaned.starts_with('1') {
        format!("{prefix}{cleaned}")
    } else {
        cleaned
    };
    let valid = msisdn.len() == prefix.len() + 9 && msisdn.starts_with(prefix) && msisdn.chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(msisdn)
    } else {
        Err(PhoneFormatError(raw.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::normalize_phone;

    #[test]
    fn canonical_forms() {
        for input in ["0712345678", "712345678", "+254712345678", "254712345678", "0712 345-678"] {
            assert_eq!(normalize_phone(input, "254").unwrap(), "254712345678", "input was {input}");
        }
    }

    #[test]
    fn safaricom_110_range() {
        assert_eq!(normalize_phone("0110123456", "254").unwrap(), "254110123456");
        assert_eq!(normalize_phone("110123456", "254").unwrap(), "254110123456");
    }

    #[test]
    fn rejects_bad_numbers() {
        for input in ["", "12345", "07123456789", "2547123456", "07123A5678", "861234567"] {
            assert!(normalize_phone(input, "254").is_err(), "input was {input}");
        }
    }
}
