use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use aurora_core::UserId;

use crate::Role;

/// Access-token claims.
///
/// Timestamps travel as the standard numeric `iat`/`exp` claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the user the token was issued to.
    pub sub: UserId,

    /// Roles granted to the subject.
    #[serde(default)]
    pub roles: Vec<Role>,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("malformed or badly signed token: {0}")]
    Malformed(String),
}

/// Deterministically validate the claims' time window against `now`.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn claims(iat: DateTime<Utc>, exp: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(),
            roles: vec![Role::USER],
            issued_at: iat,
            expires_at: exp,
        }
    }

    #[test]
    fn window_checks() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let c = claims(t0, t0 + Duration::minutes(10));

        assert_eq!(validate_claims(&c, t0 + Duration::minutes(1)), Ok(()));
        assert_eq!(validate_claims(&c, t0 - Duration::seconds(1)), Err(TokenValidationError::NotYetValid));
        assert_eq!(validate_claims(&c, t0 + Duration::minutes(10)), Err(TokenValidationError::Expired));

        let inverted = claims(t0, t0);
        assert_eq!(validate_claims(&inverted, t0), Err(TokenValidationError::InvalidTimeWindow));
    }

    #[test]
    fn timestamps_serialize_as_numeric_claims() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let c = claims(t0, t0 + Duration::seconds(60));
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["iat"], t0.timestamp());
        assert_eq!(json["exp"], t0.timestamp() + 60);
        assert_eq!(json["roles"][0], "user");
    }
}
