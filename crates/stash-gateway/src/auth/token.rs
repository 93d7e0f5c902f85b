//! Stateless signed session tokens
//!
//! A token is `"{t}.{hex(mac)}"` where `t` is the issue time in unix seconds
//! and `mac` is the keyed BLAKE3 hash of the decimal `t` under the server
//! secret. Validity depends only on the token, the secret and the clock.

use crate::credentials::CredentialStore;
use crate::error::AuthError;
use stash_crypto::mac;
use std::sync::Arc;
use std::time::Duration;

/// Issues and validates signed tokens
pub struct TokenAuthenticator {
    credentials: Arc<CredentialStore>,
    session_duration: Duration,
}

impl TokenAuthenticator {
    pub fn new(credentials: Arc<CredentialStore>, session_duration: Duration) -> Self {
        Self {
            credentials,
            session_duration,
        }
    }

    pub fn session_duration(&self) -> Duration {
        self.session_duration
    }

    /// Token issued at unix second `t`
    pub fn issue_at(&self, t: i64) -> String {
        let tag = mac::sign(&self.credentials.secret(), t.to_string().as_bytes());
        format!("{}.{}", t, tag.to_hex())
    }

    /// Check a token at unix second `now`
    pub fn validate_at(&self, token: &str, now: i64) -> Result<(), AuthError> {
        let mut fields = token.split('.');
        let (timestamp, signature) = match (fields.next(), fields.next(), fields.next()) {
            (Some(timestamp), Some(signature), None) => (timestamp, signature),
            _ => return Err(AuthError::Malformed),
        };

        mac::verify(&self.credentials.secret(), timestamp.as_bytes(), signature)
            .map_err(|_| AuthError::BadSignature)?;

        let issued: i64 = timestamp.parse().map_err(|_| AuthError::Malformed)?;
        let lifetime = i64::try_from(self.session_duration.as_secs()).unwrap_or(i64::MAX);
        if now.saturating_sub(issued) >= lifetime {
            return Err(AuthError::Expired);
        }

        Ok(())
    }

    /// Constant-time comparison of a presented hex secret with the server secret
    pub fn check_secret(&self, presented: &str) -> bool {
        self.credentials.secret().matches_hex(presented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfigStore;
    use rstest::rstest;

    const HOUR: u64 = 60 * 60;
    const ISSUED: i64 = 1_700_000_000;

    async fn authenticator() -> (Arc<CredentialStore>, TokenAuthenticator) {
        let credentials = Arc::new(
            CredentialStore::load(Arc::new(MemoryConfigStore::default()))
                .await
                .unwrap(),
        );
        let tokens = TokenAuthenticator::new(credentials.clone(), Duration::from_secs(12 * HOUR));
        (credentials, tokens)
    }

    #[tokio::test]
    async fn test_token_shape() {
        let (_, tokens) = authenticator().await;
        let token = tokens.issue_at(ISSUED);

        let (timestamp, signature) = token.split_once('.').unwrap();
        assert_eq!(timestamp, "1700000000");
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[rstest]
    #[case(0, true)]
    #[case(1, true)]
    #[case(12 * 60 * 60 - 1, true)]
    #[case(12 * 60 * 60, false)]
    #[case(30 * 24 * 60 * 60, false)]
    #[tokio::test]
    async fn test_validity_window(#[case] age: i64, #[case] valid: bool) {
        let (_, tokens) = authenticator().await;
        let token = tokens.issue_at(ISSUED);

        let result = tokens.validate_at(&token, ISSUED + age);
        if valid {
            assert!(result.is_ok());
        } else {
            assert_eq!(result, Err(AuthError::Expired));
        }
    }

    #[tokio::test]
    async fn test_every_signature_bit_flip_is_rejected() {
        let (credentials, tokens) = authenticator().await;
        let tag = mac::sign(&credentials.secret(), ISSUED.to_string().as_bytes());

        for byte in 0..32 {
            for bit in 0..8 {
                let mut flipped = *tag.as_bytes();
                flipped[byte] ^= 1 << bit;
                let hex: String = flipped.iter().map(|b| format!("{b:02x}")).collect();
                let token = format!("{ISSUED}.{hex}");

                assert_eq!(
                    tokens.validate_at(&token, ISSUED),
                    Err(AuthError::BadSignature),
                    "byte {byte} bit {bit}"
                );
            }
        }
    }

    #[rstest]
    #[case("")]
    #[case("1700000000")]
    #[case("1700000000.aa.bb")]
    #[case("...")]
    #[tokio::test]
    async fn test_malformed_tokens(#[case] token: &str) {
        let (_, tokens) = authenticator().await;
        assert_eq!(tokens.validate_at(token, ISSUED), Err(AuthError::Malformed));
    }

    #[tokio::test]
    async fn test_unparseable_signature_is_bad_signature() {
        let (_, tokens) = authenticator().await;
        assert_eq!(
            tokens.validate_at("1700000000.not-hex", ISSUED),
            Err(AuthError::BadSignature)
        );
        assert_eq!(
            tokens.validate_at("1700000000.", ISSUED),
            Err(AuthError::BadSignature)
        );
    }

    #[tokio::test]
    async fn test_signed_non_integer_timestamp_is_malformed() {
        let (credentials, tokens) = authenticator().await;
        let tag = mac::sign(&credentials.secret(), b"yesterday");

        let token = format!("yesterday.{}", tag.to_hex());
        assert_eq!(tokens.validate_at(&token, ISSUED), Err(AuthError::Malformed));
    }

    #[tokio::test]
    async fn test_rotation_invalidates_outstanding_tokens() {
        let (credentials, tokens) = authenticator().await;
        let token = tokens.issue_at(ISSUED);
        assert!(tokens.validate_at(&token, ISSUED + 1).is_ok());

        credentials.rotate_secret().await.unwrap();
        assert_eq!(
            tokens.validate_at(&token, ISSUED + 1),
            Err(AuthError::BadSignature)
        );
    }

    #[tokio::test]
    async fn test_check_secret() {
        let (credentials, tokens) = authenticator().await;
        let hex = credentials.secret().to_hex();

        assert!(tokens.check_secret(&hex));
        assert!(tokens.check_secret(&hex.to_uppercase()));
        assert!(!tokens.check_secret(&hex[..63]));
        assert!(!tokens.check_secret(""));
    }
}
