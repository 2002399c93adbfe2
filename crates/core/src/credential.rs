//! Password digests stored by the credential store.
//!
//! Two formats are accepted:
//! - `sha256:<64 hex chars>`: hex SHA-256 of the password
//! - Argon2 PHC strings (`$argon2id$v=19$...`)

use argon2::password_hash::{PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, Params, PasswordVerifier};
use sha2::{Digest, Sha256};
use std::fmt;

const SHA256_PREFIX: &str = "sha256:";

/// Digest compared against when the username is unknown, so the failure path
/// still performs one verification.
const DUMMY_SHA256: [u8; 32] = [0u8; 32];

/// Input to the Argon2 placeholder digest.
const DUMMY_PASSWORD: &[u8] = b"aumeta-placeholder-password";
const DUMMY_SALT: &[u8] = b"aumeta-placeholder-salt";

/// A parsed password digest.
#[derive(Clone, PartialEq, Eq)]
pub enum PasswordDigest {
    /// Raw SHA-256 of the password.
    Sha256([u8; 32]),
    /// Argon2 PHC string.
    Argon2(String),
}

impl PasswordDigest {
    /// Parse a stored digest.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if let Some(hex) = s.strip_prefix(SHA256_PREFIX) {
            let hex = hex.to_ascii_lowercase();
            if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(crate::Error::InvalidPasswordHash(
                    "expected sha256: followed by 64 hex chars".to_string(),
                ));
            }
            let mut bytes = [0u8; 32];
            for (i, byte) in bytes.iter_mut().enumerate() {
                *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|e| {
                    crate::Error::InvalidPasswordHash(format!("invalid hex digest: {e}"))
                })?;
            }
            return Ok(Self::Sha256(bytes));
        }

        if s.starts_with("$argon2") {
            let parsed = PasswordHash::new(s).map_err(|e| {
                crate::Error::InvalidPasswordHash(format!("invalid PHC string: {e}"))
            })?;
            if parsed.salt.is_none() || parsed.hash.is_none() {
                return Err(crate::Error::InvalidPasswordHash(
                    "PHC string has no salt or hash".to_string(),
                ));
            }
            Params::try_from(&parsed).map_err(|e| {
                crate::Error::InvalidPasswordHash(format!("invalid argon2 parameters: {e}"))
            })?;
            return Ok(Self::Argon2(s.to_string()));
        }

        Err(crate::Error::InvalidPasswordHash(
            "unsupported digest format (expected sha256:<hex> or an argon2 PHC string)"
                .to_string(),
        ))
    }

    /// Build a SHA-256 digest for a plaintext password.
    pub fn sha256_of(password: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        Self::Sha256(hasher.finalize().into())
    }

    /// Placeholder digest used when no user matches.
    pub fn dummy() -> Self {
        Self::Sha256(DUMMY_SHA256)
    }

    /// Placeholder digest as costly to verify as the most expensive of
    /// `digests`: an Argon2 digest with the same parameters when any digest is
    /// Argon2, the SHA-256 placeholder otherwise.
    pub fn dummy_matching<'a, I>(digests: I) -> Self
    where
        I: IntoIterator<Item = &'a PasswordDigest>,
    {
        let mut phcs: Vec<&str> = digests
            .into_iter()
            .filter_map(|digest| match digest {
                Self::Argon2(phc) => Some(phc.as_str()),
                Self::Sha256(_) => None,
            })
            .collect();
        phcs.sort_by_key(|phc| {
            PasswordHash::new(phc)
                .ok()
                .and_then(|parsed| Params::try_from(&parsed).ok())
                .map_or(0, |p| u64::from(p.m_cost()) * u64::from(p.t_cost()))
        });

        match phcs.last().map(|phc| argon2_dummy(phc)) {
            Some(Ok(dummy)) => dummy,
            _ => Self::dummy(),
        }
    }

    /// Verify a plaintext password against this digest.
    pub fn verify(&self, password: &str) -> bool {
        match self {
            Self::Sha256(expected) => {
                let mut hasher = Sha256::new();
                hasher.update(password.as_bytes());
                let actual: [u8; 32] = hasher.finalize().into();
                // Accumulate over every byte so the comparison does not exit early.
                expected
                    .iter()
                    .zip(actual.iter())
                    .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                    == 0
            }
            Self::Argon2(phc) => match PasswordHash::new(phc) {
                Ok(parsed) => Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok(),
                Err(_) => false,
            },
        }
    }
}

/// Hash a fixed password with the algorithm and parameters of `phc`.
fn argon2_dummy(phc: &str) -> crate::Result<PasswordDigest> {
    let invalid = |e: argon2::password_hash::Error| {
        crate::Error::InvalidPasswordHash(format!("cannot derive placeholder: {e}"))
    };
    let template = PasswordHash::new(phc).map_err(invalid)?;
    let params = Params::try_from(&template).map_err(invalid)?;
    let salt = SaltString::encode_b64(DUMMY_SALT).map_err(invalid)?;
    let hash = Argon2::default()
        .hash_password_customized(
            DUMMY_PASSWORD,
            Some(template.algorithm),
            template.version,
            params,
            &salt,
        )
        .map_err(invalid)?;
    Ok(PasswordDigest::Argon2(hash.to_string()))
}

impl fmt::Display for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256(bytes) => {
                write!(f, "{SHA256_PREFIX}")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Self::Argon2(phc) => write!(f, "{phc}"),
        }
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Sha256(_) => "sha256",
            Self::Argon2(_) => "argon2",
        };
        f.debug_tuple("PasswordDigest").field(&kind).finish()
    }
}
