//! Credential policy and salted digests.

use sha2::{Digest, Sha256};

use crate::config::CredentialRule;
use crate::error::ValidationError;

/// Decides whether a new secret is acceptable.
pub trait CredentialPolicy: Send + Sync {
    fn check(&self, credential: &str) -> Result<(), ValidationError>;
}

/// Exactly `digits` ASCII digits.
#[derive(Debug, Clone, Copy)]
pub struct PhoneDigits {
    pub digits: usize,
}

impl Default for PhoneDigits {
    fn default() -> Self {
        Self {
            digits: crate::validate::PHONE_DIGITS,
        }
    }
}

impl CredentialPolicy for PhoneDigits {
    fn check(&self, credential: &str) -> Result<(), ValidationError> {
        if credential.len() == self.digits && credential.bytes().all(|b| b.is_ascii_digit()) {
            Ok(())
        } else {
            Err(ValidationError::CredentialShape(format!(
                "must be exactly {} digits",
                self.digits
            )))
        }
    }
}

/// Any secret of at least `min` characters.
#[derive(Debug, Clone, Copy)]
pub struct MinLength {
    pub min: usize,
}

impl CredentialPolicy for MinLength {
    fn check(&self, credential: &str) -> Result<(), ValidationError> {
        if credential.chars().count() >= self.min.max(1) {
            Ok(())
        } else {
            Err(ValidationError::CredentialShape(format!(
                "must be at least {} characters",
                self.min.max(1)
            )))
        }
    }
}

impl CredentialRule {
    /// Build the policy this rule describes.
    pub fn policy(&self) -> Box<dyn CredentialPolicy> {
        match *self {
            CredentialRule::PhoneDigits { digits } => Box::new(PhoneDigits { digits }),
            CredentialRule::MinLength { min } => Box::new(MinLength { min }),
        }
    }
}

/// What is persisted for a secret: never the secret itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub salt: String,
    pub digest: String,
}

impl StoredCredential {
    /// Derive a fresh salted digest.
    pub fn derive(secret: &str) -> Self {
        let salt = uuid::Uuid::new_v4().to_string();
        let digest = digest(&salt, secret);
        Self { salt, digest }
    }

    /// Constant-time comparison against a presented secret.
    pub fn verify(&self, secret: &str) -> bool {
        let presented = digest(&self.salt, secret);
        if presented.len() != self.digest.len() {
            return false;
        }
        presented
            .bytes()
            .zip(self.digest.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

fn digest(salt: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
