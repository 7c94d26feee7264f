use secrecy::SecretString;
use serde::Deserialize;

/// Shared secret used to verify the bearer tokens issued by the auth provider.
#[derive(Debug, Deserialize)]
pub struct JwtSettings {
    pub secret: SecretString,
}

impl JwtSettings {
    pub fn new(secret: String) -> Self {
        Self {
            secret: SecretString::new(secret.into_boxed_str()),
        }
    }
}
