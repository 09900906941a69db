/// Single-use lifecycle tokens (email verification, password reset).
///
/// An opaque random string paired with an absolute UTC expiry. The store
/// persists both together and clears both together; the constructors here
/// fix the lifetimes: 48 hours for verification, 2 hours for reset.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

const TOKEN_LENGTH: usize = 43; // ~256 bits over the alphanumeric alphabet

const VERIFICATION_TTL_HOURS: i64 = 48;
const RESET_TTL_HOURS: i64 = 2;

#[derive(Clone, Debug)]
pub struct LifecycleToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl LifecycleToken {
    fn new(ttl: Duration) -> Self {
        let token = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();

        Self {
            token,
            expires_at: Utc::now() + ttl,
        }
    }

    /// Token for the register -> verify-email transition.
    pub fn verification() -> Self {
        Self::new(Duration::hours(VERIFICATION_TTL_HOURS))
    }

    /// Token for the forgot-password -> reset-password transition.
    pub fn reset() -> Self {
        Self::new(Duration::hours(RESET_TTL_HOURS))
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_token_lives_two_days() {
        let token = LifecycleToken::verification();
        let ttl = token.expires_at() - Utc::now();

        assert!(ttl > Duration::hours(47));
        assert!(ttl <= Duration::hours(48));
        assert!(!token.is_expired());
    }

    #[test]
    fn reset_token_lives_two_hours() {
        let token = LifecycleToken::reset();
        let ttl = token.expires_at() - Utc::now();

        assert!(ttl > Duration::minutes(119));
        assert!(ttl <= Duration::hours(2));
    }

    #[test]
    fn tokens_are_opaque_random_strings() {
        let a = LifecycleToken::verification();
        let b = LifecycleToken::verification();

        assert_eq!(a.token().len(), 43);
        assert!(a.token().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a.token(), b.token());
    }
}
