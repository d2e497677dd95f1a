//! Input validation and normalization for usernames, emails, passwords,
//! idea headlines and domain names.
use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::ServiceError;

pub const USERNAME_MIN_LEN: usize = 4;
pub const USERNAME_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const HEADLINE_MAX_LEN: usize = 100;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref HOSTNAME_LABEL_REGEX: Regex =
        Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").unwrap();
}

pub fn validate_username(username: &str) -> Result<(), ServiceError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len)
        || username.chars().any(char::is_whitespace)
    {
        return Err(ServiceError::bad_request(format!(
            "Username must be {USERNAME_MIN_LEN} to {USERNAME_MAX_LEN} characters without spaces"
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ServiceError> {
    if !EMAIL_REGEX.is_match(email.trim()) {
        return Err(ServiceError::bad_request("Invalid email address"));
    }
    Ok(())
}

/// Requires at least eight characters with a lowercase letter, an uppercase
/// letter and a digit or symbol.
pub fn validate_password(password: &str) -> Result<(), ServiceError> {
    let strong = password.chars().count() >= PASSWORD_MIN_LEN
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| !c.is_alphabetic());
    if !strong {
        return Err(ServiceError::bad_request(
            "Password must have at least 8 characters with upper and lower case letters \
             and a digit or symbol",
        ));
    }
    Ok(())
}

pub fn validate_headline(headline: &str) -> Result<(), ServiceError> {
    let headline = headline.trim();
    if headline.is_empty() {
        return Err(ServiceError::bad_request("Headline is required"));
    }
    if headline.chars().count() > HEADLINE_MAX_LEN {
        return Err(ServiceError::bad_request(format!(
            "Headline must be at most {HEADLINE_MAX_LEN} characters"
        )));
    }
    Ok(())
}

pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Normalizes an email address for uniqueness checks.
///
/// Gmail ignores dots and `+tag` suffixes in the local part, and
/// `googlemail.com` is an alias of `gmail.com`. Other providers only get the
/// `+tag` suffix removed.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim().to_lowercase();
    let Some((local, domain)) = email.rsplit_once('@') else {
        return email;
    };

    let local = local.split('+').next().unwrap_or(local);
    match domain {
        "gmail.com" | "googlemail.com" => format!("{}@gmail.com", local.replace('.', "")),
        _ => format!("{local}@{domain}"),
    }
}

/// Lowercases `name`, strips a trailing dot and checks it is a valid hostname.
pub fn normalize_hostname(name: &str) -> Result<String, ServiceError> {
    let name = name.trim().to_lowercase();
    let name = name.strip_suffix('.').unwrap_or(&name).to_string();

    let valid = !name.is_empty()
        && name.len() <= 253
        && name.split('.').all(|label| HOSTNAME_LABEL_REGEX.is_match(label))
        && name
            .rsplit('.')
            .next()
            .is_some_and(|tld| !tld.chars().all(|c| c.is_ascii_digit()));
    if !valid {
        return Err(ServiceError::bad_request("Invalid domain name"));
    }
    Ok(name)
}

/// Returns `true` if `hostname` has exactly two labels, like `example.com`.
///
/// Multi-label public suffixes such as `co.uk` are not recognised.
pub fn is_second_level(hostname: &str) -> bool {
    hostname.split('.').count() == 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_length_bounds() {
        assert!(validate_username("abc").is_err());
        assert!(validate_username("abcd").is_ok());
        assert!(validate_username(&"a".repeat(20)).is_ok());
        assert!(validate_username(&"a".repeat(21)).is_err());
        assert!(validate_username("ab cd").is_err());
    }

    #[test]
    fn test_email_shape() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("alice@example").is_err());
        assert!(validate_email("alice.example.com").is_err());
        assert!(validate_email("al ice@example.com").is_err());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password("Passw0rd").is_ok());
        assert!(validate_password("Password!").is_ok());
        assert!(validate_password("Pa55").is_err());
        assert!(validate_password("password1").is_err());
        assert!(validate_password("PASSWORD1").is_err());
        assert!(validate_password("Password").is_err());
    }

    #[test]
    fn test_headline_bounds() {
        assert!(validate_headline("   ").is_err());
        assert!(validate_headline("Dark mode").is_ok());
        assert!(validate_headline(&"x".repeat(100)).is_ok());
        assert!(validate_headline(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(" Alice@Example.com "), "alice@example.com");
        assert_eq!(normalize_email("a.li.ce+news@gmail.com"), "alice@gmail.com");
        assert_eq!(normalize_email("alice@googlemail.com"), "alice@gmail.com");
        assert_eq!(normalize_email("first.last+tag@example.com"), "first.last@example.com");
    }

    #[test]
    fn test_normalize_hostname() {
        assert_eq!(normalize_hostname("Example.COM.").unwrap(), "example.com");
        assert!(normalize_hostname("exa_mple.com").is_err());
        assert!(normalize_hostname("-example.com").is_err());
        assert!(normalize_hostname("127.0.0.1").is_err());
        assert!(normalize_hostname("").is_err());
    }

    #[test]
    fn test_is_second_level() {
        assert!(is_second_level("example.com"));
        assert!(!is_second_level("www.example.com"));
        assert!(!is_second_level("com"));
    }
}
