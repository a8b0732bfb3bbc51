//! crates/lehrjournal_core/src/credentials.rs
//!
//! Derivation and generation of account credentials, plus password hashing
//! for the identity adapters.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::Rng;

/// Domain used for derived apprentice emails unless configured otherwise.
pub const DEFAULT_APPRENTICE_DOMAIN: &str = "lernende.ch";

/// The 69 characters generated passwords are drawn from.
pub const PASSWORD_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%&*";

pub const PASSWORD_LENGTH: usize = 12;

/// Join-code alphabet without the look-alikes 0/O and 1/I/L.
pub const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

pub const JOIN_CODE_LENGTH: usize = 8;

//=========================================================================================
// Deterministic Derivation
//=========================================================================================

/// Folds diacritics, lowercases and strips everything that is not `[a-z0-9]`.
pub fn normalize_for_email(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars().flat_map(char::to_lowercase) {
        match c {
            'a'..='z' | '0'..='9' => out.push(c),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            other => {
                if let Some(base) = fold_diacritic(other) {
                    out.push(base);
                }
            }
        }
    }
    out
}

/// Keeps printable ASCII, folds diacritics and replaces anything else with `_`.
/// Case is preserved; quotes and backslashes are replaced too.
pub fn fold_to_ascii(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
            out.push(c);
            continue;
        }
        let lower = c.to_lowercase().next().unwrap_or(c);
        let folded = match lower {
            'ß' => "ss".to_string(),
            'æ' => "ae".to_string(),
            'œ' => "oe".to_string(),
            other => match fold_diacritic(other) {
                Some(base) => base.to_string(),
                None => "_".to_string(),
            },
        };
        if c.is_uppercase() {
            out.push_str(&folded.to_uppercase());
        } else {
            out.push_str(&folded);
        }
    }
    out
}

fn fold_diacritic(c: char) -> Option<char> {
    let base = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' | 'ń' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'š' | 'ś' => 's',
        'ž' | 'ź' | 'ż' => 'z',
        _ => return None,
    };
    Some(base)
}

/// The login email of an apprentice: normalized name and company, then the domain.
///
/// Two apprentices with the same name at the same company derive the same
/// address; the identity provider rejects the second one.
pub fn derive_apprentice_email(name: &str, company_name: &str, domain: &str) -> String {
    format!(
        "{}{}@{}",
        normalize_for_email(name),
        normalize_for_email(company_name),
        domain
    )
}

/// The login email belonging to a join code.
pub fn join_code_email(code: &str, domain: &str) -> String {
    format!("{}@{}", code.to_lowercase(), domain)
}

/// Normalizes user input of a join code (trims, uppercases).
pub fn canonical_join_code(input: &str) -> String {
    input.trim().to_uppercase()
}

/// True when the input has the shape of a join code.
pub fn is_join_code(code: &str) -> bool {
    code.len() == JOIN_CODE_LENGTH && code.bytes().all(|b| JOIN_CODE_ALPHABET.contains(&b))
}

//=========================================================================================
// Random Generation
//=========================================================================================

fn random_string(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(alphabet[rng.random_range(0..alphabet.len())]))
        .collect()
}

/// A fresh password for a provisioned account. Never checked for uniqueness.
pub fn generate_password() -> String {
    random_string(PASSWORD_ALPHABET, PASSWORD_LENGTH)
}

pub fn generate_join_code() -> String {
    random_string(JOIN_CODE_ALPHABET, JOIN_CODE_LENGTH)
}

//=========================================================================================
// Password Hashing
//=========================================================================================

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| format!("Failed to hash password: {}", e))
}

/// Returns false for a wrong password; errors only on an unreadable hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, String> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| format!("Failed to parse password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_has_69_distinct_characters() {
        let mut chars = PASSWORD_ALPHABET.to_vec();
        chars.sort_unstable();
        chars.dedup();
        assert_eq!(chars.len(), 69);
        assert_eq!(PASSWORD_ALPHABET.len(), 69);
    }

    #[test]
    fn derived_email_has_no_umlauts_or_punctuation() {
        let email = derive_apprentice_email("Ä. Müller", "Müller AG", DEFAULT_APPRENTICE_DOMAIN);
        assert_eq!(email, "amullermullerag@lernende.ch");
        assert!(email.is_ascii());
        assert_eq!(email.matches('@').count(), 1);
        assert_eq!(email.matches('.').count(), 1);
        assert!(email
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '@' || c == '.'));
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_apprentice_email("Zoë Strässle", "Holzbau Zürich GmbH", "x.ch");
        let b = derive_apprentice_email("Zoë Strässle", "Holzbau Zürich GmbH", "x.ch");
        assert_eq!(a, b);
        assert_eq!(a, "zoestrassleholzbauzurichgmbh@x.ch");
    }

    #[test]
    fn ascii_folding_keeps_case_and_drops_quotes() {
        assert_eq!(fold_to_ascii("Zoë_Strässle.pdf"), "Zoe_Strassle.pdf");
        assert_eq!(fold_to_ascii("ÄRGER"), "ARGER");
        assert_eq!(fold_to_ascii("Jo \"Jo\" Ng"), "Jo _Jo_ Ng");
        assert_eq!(fold_to_ascii("王伟"), "__");
    }

    #[test]
    fn generated_passwords_use_the_alphabet() {
        let password = generate_password();
        assert_eq!(password.len(), PASSWORD_LENGTH);
        assert!(password.bytes().all(|b| PASSWORD_ALPHABET.contains(&b)));
    }

    #[test]
    fn join_codes() {
        let code = generate_join_code();
        assert!(is_join_code(&code));
        assert!(!is_join_code("ABC"));
        assert!(!is_join_code("ABCDEFG0"));
        assert_eq!(canonical_join_code(" abcd2345 "), "ABCD2345");
        assert_eq!(join_code_email("ABCD2345", "lernende.ch"), "abcd2345@lernende.ch");
    }

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("geheim").unwrap();
        assert!(verify_password("geheim", &hash).unwrap());
        assert!(!verify_password("falsch", &hash).unwrap());
        assert!(verify_password("geheim", "not-a-hash").is_err());
    }
}
