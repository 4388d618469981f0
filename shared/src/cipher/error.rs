use thiserror::Error;

/// Errors that can occur during key exchange or chunk encryption
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// No mutual key has been derived yet
    #[error("Cipher session is not ready. A remote public key must be set before encrypting")]
    NotReady,

    /// The system random source failed while generating a key pair
    #[error("Failed to generate an ephemeral key pair")]
    KeyGeneration,

    /// The remote public key has the wrong size
    #[error("Invalid remote public key of {len} bytes. Expected {expected} bytes")]
    InvalidRemoteKey { len: usize, expected: usize },

    /// Key agreement with the remote public key failed
    #[error("Key agreement failed. The remote public key was rejected")]
    KeyAgreement,

    /// The AEAD seal operation failed
    #[error("Failed to seal chunk of {len} bytes")]
    Seal { len: usize },

    /// Every nonce for this key has been used
    #[error("Nonce counter exhausted. A new key exchange is required")]
    NonceExhausted,
}
