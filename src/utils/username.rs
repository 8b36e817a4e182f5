// utils/username.rs
use rand::Rng;

use crate::models::usermodel::UserRole;

/// Generate a friendly, role-prefixed username, e.g. "CUS-Jane-4821".
/// Only the alphabetic characters of the first name are kept.
pub fn generate_username(full_name: &str, role: UserRole) -> String {
    let first_word = full_name.split_whitespace().next().unwrap_or("");
    let letters: String = first_word.chars().filter(|c| c.is_alphabetic()).collect();

    let mut chars = letters.chars();
    let first_name = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => "User".to_string(),
    };

    let mut rng = rand::rng();
    let random_digits = rng.random_range(1000..9999);

    format!("{}-{}-{}", role.username_prefix(), first_name, random_digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_usernames_are_cus_prefixed() {
        let username = generate_username("jane wanjiku", UserRole::Customer);
        assert!(username.starts_with("CUS-Jane-"));
    }

    #[test]
    fn non_alphabetic_characters_are_stripped() {
        let username = generate_username("o'brien solar ltd.", UserRole::Installer);
        assert!(username.starts_with("INS-Obrien-"));
    }

    #[test]
    fn empty_name_still_produces_a_username() {
        let username = generate_username("", UserRole::Customer);
        assert!(username.starts_with("CUS-User-"));
    }

    #[test]
    fn suffix_is_four_digits() {
        let username = generate_username("Amina", UserRole::Admin);
        let suffix = username.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }
}
