use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use time::{Duration, OffsetDateTime};

pub const ACTIVATION_TTL: Duration = Duration::hours(1);

#[derive(Debug, Clone)]
pub struct ActivationToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// 32 random bytes, hex-encoded, valid for [`ACTIVATION_TTL`].
pub fn issue_activation_token(now: OffsetDateTime) -> ActivationToken {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    ActivationToken {
        token: hex::encode(bytes),
        expires_at: now + ACTIVATION_TTL,
    }
}

/// Shape check done before any lookup: 64 lowercase hex characters.
pub fn is_well_formed(token: &str) -> bool {
    lazy_static! {
        static ref TOKEN_RE: Regex = Regex::new(r"^[0-9a-f]{64}$").expect("token regex compiles");
    }
    TOKEN_RE.is_match(token)
}

pub fn is_expired(expires_at: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    match expires_at {
        Some(at) => at < now,
        None => true,
    }
}

pub fn activation_link(base_url: &str, token: &str) -> String {
    format!("{}/api/auth/activate/{}", base_url.trim_end_matches('/'), token)
}
