use lazy_static::lazy_static;
use regex::Regex;

pub(crate) const EMAIL_RULE: &str = "Email format is invalid.";
pub(crate) const USERNAME_RULE: &str = "Username must be between 3 and 30 characters.";
pub(crate) const PASSWORD_RULE: &str =
    "Password must be at least 8 characters and contain both letters and numbers.";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn is_valid_username(username: &str) -> bool {
    let len = username.chars().count();
    (3..=30).contains(&len)
}

// At least 8 chars with one letter and one digit. The regex crate has no
// lookahead, so this is a plain scan.
fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// First failing rule wins; rules run in a fixed order so clients always see
/// the same message for the same bad payload.
pub(crate) fn validate_signup(
    email: &str,
    username: &str,
    password: &str,
) -> Result<(), &'static str> {
    if !is_valid_email(email) {
        return Err(EMAIL_RULE);
    }
    if !is_valid_username(username) {
        return Err(USERNAME_RULE);
    }
    if !is_valid_password(password) {
        return Err(PASSWORD_RULE);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_well_formed_signup() {
        assert!(validate_signup("user@example.com", "toothfairy", "hunter4242").is_ok());
    }

    #[test]
    fn rejects_bad_email_format() {
        for email in ["plainaddress", "no@tld", "two@@example.com", "spa ce@example.com"] {
            assert_eq!(
                validate_signup(email, "toothfairy", "hunter4242"),
                Err(EMAIL_RULE),
                "email {email:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_username_outside_bounds() {
        assert_eq!(
            validate_signup("user@example.com", "ab", "hunter4242"),
            Err(USERNAME_RULE)
        );
        let long = "x".repeat(31);
        assert_eq!(
            validate_signup("user@example.com", &long, "hunter4242"),
            Err(USERNAME_RULE)
        );
        assert!(validate_signup("user@example.com", "abc", "hunter4242").is_ok());
        let edge = "x".repeat(30);
        assert!(validate_signup("user@example.com", &edge, "hunter4242").is_ok());
    }

    #[test]
    fn rejects_weak_passwords() {
        // too short, no digit, no letter
        for password in ["ab1", "lettersonly", "1234567890"] {
            assert_eq!(
                validate_signup("user@example.com", "toothfairy", password),
                Err(PASSWORD_RULE),
                "password {password:?} should be rejected"
            );
        }
    }

    #[test]
    fn first_failing_rule_wins() {
        assert_eq!(validate_signup("bad", "ab", "short"), Err(EMAIL_RULE));
        assert_eq!(
            validate_signup("user@example.com", "ab", "short"),
            Err(USERNAME_RULE)
        );
    }
}
