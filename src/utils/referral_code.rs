// utils/referral_code.rs
use rand::Rng;

const CODE_LEN: usize = 8;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 8-character uppercase token. Uniqueness is enforced by the store's
/// unique index; callers retry on collision.
pub fn generate_referral_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_shape() {
        let code = generate_referral_code();
        assert_eq!(code.len(), 8);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn codes_vary() {
        let a = generate_referral_code();
        let mut distinct = false;
        for _ in 0..16 {
            if generate_referral_code() != a {
                distinct = true;
                break;
            }
        }
        assert!(distinct);
    }
}
