//! One-time account activation tokens.
//!
//! Token format is `{unix_timestamp}-{hex(HMAC-SHA256)}`. The MAC covers user id, issue time,
//! activation flag and password hash, so the token stops working once the account is activated
//! or its password changes.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// User state the token is bound to
#[derive(Debug, Clone, Copy)]
pub struct TokenSubject<'a> {
    pub user_id: i64,
    pub is_active: bool,
    pub password_hash: Option<&'a str>,
}

pub struct ActivationTokens {
    secret: Vec<u8>,
    validity: Duration,
}

impl ActivationTokens {
    pub fn new(secret: impl AsRef<[u8]>, validity: Duration) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            validity,
        }
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    pub fn issue(&self, subject: &TokenSubject) -> Result<String> {
        self.issue_at(subject, now_secs()?)
    }

    fn issue_at(&self, subject: &TokenSubject, timestamp: u64) -> Result<String> {
        let signature = self.mac(subject, timestamp)?.finalize().into_bytes();
        Ok(format!(
            "{timestamp}-{}",
            base16ct::lower::encode_string(&signature)
        ))
    }

    pub fn check(&self, subject: &TokenSubject, token: &str) -> Result<()> {
        self.check_at(subject, token, now_secs()?)
    }

    fn check_at(&self, subject: &TokenSubject, token: &str, now: u64) -> Result<()> {
        let (timestamp, signature) = token
            .split_once('-')
            .ok_or(Error::MalformedToken("missing separator"))?;
        let timestamp: u64 = timestamp
            .parse()
            .map_err(|_| Error::MalformedToken("invalid timestamp"))?;
        let signature = base16ct::mixed::decode_vec(signature)
            .map_err(|_| Error::MalformedToken("invalid signature encoding"))?;
        self.mac(subject, timestamp)?
            .verify_slice(&signature)
            .map_err(|_| Error::InvalidSignature)?;

        if now.saturating_sub(timestamp) > self.validity.as_secs() {
            debug!("Activation token for user {} expired", subject.user_id);
            return Err(Error::Expired);
        }
        Ok(())
    }

    fn mac(&self, subject: &TokenSubject, timestamp: u64) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)?;
        mac.update(subject.user_id.to_string().as_bytes());
        mac.update(b":");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b":");
        mac.update(if subject.is_active { b"1" } else { b"0" });
        mac.update(b":");
        mac.update(subject.password_hash.unwrap_or_default().as_bytes());
        Ok(mac)
    }
}

fn now_secs() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// URL safe base64 of decimal user id, as used in activation links
pub fn encode_uid(user_id: i64) -> String {
    URL_SAFE_NO_PAD.encode(user_id.to_string())
}

pub fn decode_uid(uid: &str) -> Result<i64> {
    let bytes = URL_SAFE_NO_PAD
        .decode(uid)
        .map_err(|e| Error::InvalidUid(e.to_string()))?;
    let text = std::str::from_utf8(&bytes).map_err(|e| Error::InvalidUid(e.to_string()))?;
    text.parse().map_err(|_| Error::InvalidUid(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: u64 = 24 * 3600;

    fn inactive(password_hash: &str) -> TokenSubject<'_> {
        TokenSubject {
            user_id: 42,
            is_active: false,
            password_hash: Some(password_hash),
        }
    }

    #[test]
    fn test_token_roundtrip() {
        let tokens = ActivationTokens::new("secret", Duration::from_secs(3 * DAY));
        let subject = inactive("$argon2id$hash");
        let token = tokens.issue(&subject).unwrap();
        assert!(tokens.check(&subject, &token).is_ok());
    }

    #[test]
    fn test_token_invalid_after_activation() {
        let tokens = ActivationTokens::new("secret", Duration::from_secs(3 * DAY));
        let subject = inactive("$argon2id$hash");
        let token = tokens.issue(&subject).unwrap();
        let activated = TokenSubject {
            is_active: true,
            ..subject
        };
        assert!(matches!(
            tokens.check(&activated, &token),
            Err(Error::InvalidSignature)
        ));
        let other_password = inactive("$argon2id$other");
        assert!(tokens.check(&other_password, &token).is_err());
    }

    #[test]
    fn test_token_expiration() {
        let tokens = ActivationTokens::new("secret", Duration::from_secs(3 * DAY));
        let subject = inactive("hash");
        let issued = 1_700_000_000;
        let token = tokens.issue_at(&subject, issued).unwrap();
        assert!(tokens.check_at(&subject, &token, issued + 2 * DAY).is_ok());
        assert!(matches!(
            tokens.check_at(&subject, &token, issued + 4 * DAY),
            Err(Error::Expired)
        ));
    }

    #[test]
    fn test_malformed_and_foreign_tokens() {
        let tokens = ActivationTokens::new("secret", Duration::from_secs(DAY));
        let subject = inactive("hash");
        assert!(matches!(
            tokens.check(&subject, "garbage"),
            Err(Error::MalformedToken(_))
        ));
        assert!(matches!(
            tokens.check(&subject, "123-zz"),
            Err(Error::MalformedToken(_))
        ));

        let other = ActivationTokens::new("other secret", Duration::from_secs(DAY));
        let token = other.issue(&subject).unwrap();
        assert!(matches!(
            tokens.check(&subject, &token),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn test_uid() {
        let uid = encode_uid(17);
        assert_eq!(uid, "MTc");
        assert_eq!(decode_uid(&uid).unwrap(), 17);
        assert!(decode_uid("!!").is_err());
        assert!(decode_uid(&URL_SAFE_NO_PAD.encode("abc")).is_err());
    }
}
