//! Reservation management links
//!
//! `/reservations/{code}/{mac}` where `mac` is the lowercase hex
//! HMAC-SHA256 of `"{code}:{email}"` under the server secret. No session
//! state is kept; changing the email invalidates every issued link.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use thiserror::Error;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("Reservation link secret is empty")]
    EmptySecret,

    #[error("Reservation link signing failed")]
    Signing,
}

/// Signs and checks management links
#[derive(Clone)]
pub struct LinkSigner {
    secret: Arc<Zeroizing<Vec<u8>>>,
    base_url: String,
}

impl std::fmt::Debug for LinkSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSigner")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl LinkSigner {
    pub fn new(secret: impl AsRef<[u8]>, base_url: impl Into<String>) -> Result<Self, LinkError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(LinkError::EmptySecret);
        }
        Ok(Self {
            secret: Arc::new(Zeroizing::new(secret.to_vec())),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn mac(&self, code: &str, email: &str) -> Result<HmacSha256, LinkError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|_| LinkError::Signing)?;
        mac.update(code.as_bytes());
        mac.update(b":");
        mac.update(email.as_bytes());
        Ok(mac)
    }

    /// Lowercase hex tag for `code` + `email`
    pub fn sign(&self, code: &str, email: &str) -> Result<String, LinkError> {
        Ok(hex::encode(self.mac(code, email)?.finalize().into_bytes()))
    }

    /// Constant-time check of a presented tag
    pub fn verify(&self, code: &str, email: &str, presented: &str) -> bool {
        let Ok(tag) = hex::decode(presented) else {
            return false;
        };
        match self.mac(code, email) {
            Ok(mac) => mac.verify_slice(&tag).is_ok(),
            Err(_) => false,
        }
    }

    /// `/reservations/{code}/{mac}`
    pub fn path(code: &str, mac: &str) -> String {
        format!("/reservations/{}/{}", code, mac)
    }

    /// Absolute management URL for a reservation
    pub fn url(&self, code: &str, email: &str) -> Result<String, LinkError> {
        let mac = self.sign(code, email)?;
        Ok(format!("{}{}", self.base_url, Self::path(code, &mac)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> LinkSigner {
        LinkSigner::new("test-secret", "https://book.example.com/").unwrap()
    }

    #[test]
    fn test_known_vector() {
        let mac = signer().sign("abc12345", "ann@example.com").unwrap();
        assert_eq!(
            mac,
            "b7b8e2af243c15bcd7592f460c209a3f33c677364c85402425394f34368d5976"
        );
    }

    #[test]
    fn test_round_trip() {
        let s = signer();
        for (code, email) in [
            ("abc12345", "ann@example.com"),
            ("zz9yy8xx", "Bob.Smith+tag@example.org"),
            ("00000000", ""),
        ] {
            let mac = s.sign(code, email).unwrap();
            assert!(s.verify(code, email, &mac));
        }
    }

    #[test]
    fn test_changed_inputs_fail() {
        let s = signer();
        let mac = s.sign("abc12345", "ann@example.com").unwrap();
        assert!(!s.verify("abc12346", "ann@example.com", &mac));
        assert!(!s.verify("abc12345", "ann@example.net", &mac));
        assert!(!s.verify("abc12345", "ann@example.com", &mac[..62]));
        assert!(!s.verify("abc12345", "ann@example.com", "not-hex"));
    }

    #[test]
    fn test_different_secret_fails() {
        let mac = signer().sign("abc12345", "ann@example.com").unwrap();
        let other = LinkSigner::new("other-secret", "https://book.example.com").unwrap();
        assert!(!other.verify("abc12345", "ann@example.com", &mac));
    }

    #[test]
    fn test_url_shape() {
        let s = signer();
        let mac = s.sign("abc12345", "ann@example.com").unwrap();
        assert_eq!(
            s.url("abc12345", "ann@example.com").unwrap(),
            format!("https://book.example.com/reservations/abc12345/{mac}")
        );
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert_eq!(LinkSigner::new("", "x").unwrap_err(), LinkError::EmptySecret);
    }
}
