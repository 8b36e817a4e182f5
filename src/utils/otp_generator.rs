// utils/otp_generator.rs
use rand::Rng;

/// Six-digit numeric login code, emailed as the second factor.
pub fn generate_login_code() -> String {
    let mut rng = rand::rng();
    format!("{:06}", rng.random_range(100000..999999))
}

/// Random temporary password for admin-created installer accounts.
/// The account is flagged password_reset_required until changed.
pub fn generate_temp_password() -> String {
    use rand::distr::Alphanumeric;
    use rand::{rng, Rng};

    let mut rng = rng();
    (0..12)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_code_is_six_digits() {
        for _ in 0..50 {
            let code = generate_login_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn temp_password_is_twelve_alphanumeric_chars() {
        let pw = generate_temp_password();
        assert_eq!(pw.len(), 12);
        assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
