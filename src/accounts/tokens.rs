use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::config::JwtConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload: subject and expiry only.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id, hyphenated UUID
    pub exp: usize,  // expires at (unix timestamp)
}

/// Access/refresh pair handed out after register or login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign {kind:?} token: {source}")]
    Sign {
        kind: TokenKind,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
    #[error("{kind:?} token expiry is out of range")]
    ExpiryOutOfRange { kind: TokenKind },
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// HS256 signer. New tokens use the current secret; decoding also accepts
/// previous secrets so keys can be rotated without logging everyone out.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: Vec<DecodingKey>,
    access_ttl: TimeDuration,
    refresh_ttl: TimeDuration,
}

impl TokenIssuer {
    pub fn new(cfg: &JwtConfig) -> Self {
        let decoding = std::iter::once(&cfg.secret)
            .chain(cfg.previous_secrets.iter())
            .map(|s| DecodingKey::from_secret(s.as_bytes()))
            .collect();
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding,
            access_ttl: TimeDuration::seconds(cfg.access_ttl_minutes.saturating_mul(60)),
            refresh_ttl: TimeDuration::seconds(cfg.refresh_ttl_minutes.saturating_mul(60)),
        }
    }

    /// Signs both tokens; either failing fails the whole pair.
    pub fn issue(&self, user_id: Uuid) -> Result<TokenPair, TokenError> {
        let access_token = self.sign_with_kind(user_id, TokenKind::Access)?;
        let refresh_token = self.sign_with_kind(user_id, TokenKind::Refresh)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    fn sign_with_kind(&self, user_id: Uuid, kind: TokenKind) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = OffsetDateTime::now_utc()
            .checked_add(ttl)
            .ok_or(TokenError::ExpiryOutOfRange { kind })?;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|source| TokenError::Sign { kind, source })?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    /// Checks signature and expiry against the current, then previous, secrets.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let mut last_err = None;
        for key in &self.decoding {
            match decode::<Claims>(token, key, &validation) {
                Ok(data) => return Ok(data.claims),
                Err(e) if matches!(e.kind(), ErrorKind::InvalidSignature) => last_err = Some(e),
                Err(e) => return Err(e.into()),
            }
        }
        Err(last_err
            .unwrap_or_else(|| ErrorKind::InvalidSignature.into())
            .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str, previous: &[&str]) -> JwtConfig {
        JwtConfig {
            secret: secret.into(),
            previous_secrets: previous.iter().map(|s| s.to_string()).collect(),
            access_ttl_minutes: 24 * 60,
            refresh_ttl_minutes: 72 * 60,
        }
    }

    fn now() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }

    #[test]
    fn issued_pair_decodes_with_subject_and_expiry() {
        let issuer = TokenIssuer::new(&config("dev-secret", &[]));
        let user_id = Uuid::new_v4();
        let pair = issuer.issue(user_id).expect("issue");

        let access = issuer.decode(&pair.access_token).expect("decode access");
        let refresh = issuer.decode(&pair.refresh_token).expect("decode refresh");
        assert_eq!(access.sub, user_id.to_string());
        assert_eq!(refresh.sub, user_id.to_string());

        let access_left = access.exp as i64 - now();
        let refresh_left = refresh.exp as i64 - now();
        assert!((24 * 3600 - 5..=24 * 3600).contains(&access_left), "{access_left}");
        assert!((72 * 3600 - 5..=72 * 3600).contains(&refresh_left), "{refresh_left}");
    }

    #[test]
    fn payload_carries_only_sub_and_exp() {
        let issuer = TokenIssuer::new(&config("dev-secret", &[]));
        let pair = issuer.issue(Uuid::new_v4()).unwrap();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        let raw = decode::<serde_json::Value>(
            &pair.access_token,
            &DecodingKey::from_secret(b"dev-secret"),
            &validation,
        )
        .unwrap();
        let mut keys: Vec<_> = raw.claims.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["exp", "sub"]);
        assert_eq!(raw.header.alg, Algorithm::HS256);
    }

    #[test]
    fn rejects_token_signed_with_unknown_secret() {
        let ours = TokenIssuer::new(&config("ours", &[]));
        let theirs = TokenIssuer::new(&config("theirs", &[]));
        let pair = theirs.issue(Uuid::new_v4()).unwrap();
        let err = ours.decode(&pair.access_token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn accepts_tokens_from_previous_secret_after_rotation() {
        let before = TokenIssuer::new(&config("old-secret", &[]));
        let after = TokenIssuer::new(&config("new-secret", &["old-secret"]));
        let user_id = Uuid::new_v4();
        let pair = before.issue(user_id).unwrap();
        let claims = after.decode(&pair.refresh_token).expect("old token still valid");
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[test]
    fn oversized_lifetime_fails_issue_without_panicking() {
        let mut cfg = config("dev-secret", &[]);
        cfg.refresh_ttl_minutes = i64::MAX;
        let issuer = TokenIssuer::new(&cfg);
        let err = issuer.issue(Uuid::new_v4()).unwrap_err();
        assert!(matches!(
            err,
            TokenError::ExpiryOutOfRange {
                kind: TokenKind::Refresh
            }
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let issuer = TokenIssuer::new(&config("dev-secret", &[]));
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            exp: (now() - 3600) as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert!(issuer.decode(&token).is_err());
    }
}
