use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Email shape check used by booking and application forms
    /// - Valid: "a@b.com", "first.last@consulate.gov.uk"
    /// - Invalid: "a@b", "@b.com", "a b@c.com"
    pub static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    /// Passport numbers: 6-12 uppercase letters or digits
    pub static ref PASSPORT_NUMBER_REGEX: Regex = Regex::new(r"^[A-Z0-9]{6,12}$").unwrap();

    /// 24-hour clock time, "HH:MM"
    pub static ref TIME_OF_DAY_REGEX: Regex =
        Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").unwrap();

    /// Phone numbers: optional leading '+', then digits, spaces or hyphens
    pub static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9][0-9 \-]{5,19}$").unwrap();

    /// Notification template keys: "appointment_confirmed"
    pub static ref TEMPLATE_KEY_REGEX: Regex = Regex::new(r"^[a-z][a-z0-9_]{2,63}$").unwrap();
}

/// Email check shared by non-derive validation paths
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_regex() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email(" first.last@consulate.gov.uk "));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_passport_number_regex() {
        assert!(PASSPORT_NUMBER_REGEX.is_match("A1234567"));
        assert!(!PASSPORT_NUMBER_REGEX.is_match("a1234567")); // lowercase
        assert!(!PASSPORT_NUMBER_REGEX.is_match("A12")); // too short
    }

    #[test]
    fn test_time_of_day_regex() {
        assert!(TIME_OF_DAY_REGEX.is_match("09:30"));
        assert!(TIME_OF_DAY_REGEX.is_match("23:59"));
        assert!(!TIME_OF_DAY_REGEX.is_match("24:00"));
        assert!(!TIME_OF_DAY_REGEX.is_match("9:30"));
    }

    #[test]
    fn test_phone_regex() {
        assert!(PHONE_REGEX.is_match("+254 700 123456"));
        assert!(!PHONE_REGEX.is_match("call me"));
    }
}
