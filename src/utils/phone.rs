use crate::error::{AppError, AppResult};
use regex::Regex;

/// Validate an Indian phone number (+91 followed by 10 digits)
pub fn validate_in_phone(phone: &str) -> AppResult<()> {
    let phone_regex = Regex::new(r"^\+91\d{10}$").unwrap();

    if !phone_regex.is_match(phone) {
        return Err(AppError::ValidationError(
            "Invalid phone number, expected an Indian phone number (+91xxxxxxxxxx)".to_string(),
        ));
    }

    Ok(())
}

/// Normalize a phone number to +91 form
pub fn format_in_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() == 12 && digits.starts_with("91") {
        format!("+{}", digits)
    } else if digits.len() == 10 {
        format!("+91{}", digits)
    } else {
        phone.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_in_phone() {
        assert!(validate_in_phone("+919876543210").is_ok());
        assert!(validate_in_phone("+911234567890").is_ok());
        assert!(validate_in_phone("+91987654321").is_err()); // too short
        assert!(validate_in_phone("+9198765432100").is_err()); // too long
        assert!(validate_in_phone("9876543210").is_err()); // missing country code
        assert!(validate_in_phone("+129876543210").is_err());
    }

    #[test]
    fn test_format_in_phone() {
        assert_eq!(format_in_phone("9876543210"), "+919876543210");
        assert_eq!(format_in_phone("919876543210"), "+919876543210");
        assert_eq!(format_in_phone("+919876543210"), "+919876543210");
        assert_eq!(format_in_phone("98765 43210"), "+919876543210");
    }
}
