use log::{trace, warn};
use ring::{
    aead::{self, Aad, LessSafeKey, Nonce, UnboundKey, CHACHA20_POLY1305, NONCE_LEN},
    agreement::{self, EphemeralPrivateKey, UnparsedPublicKey, X25519},
    digest::{self, SHA256},
    rand::SystemRandom,
};

use super::error::CipherError;

/// Size of the nonce counter prefixed to every encrypted datagram.
pub const COUNTER_SIZE: usize = 8;

/// Size of the authentication tag appended to every encrypted datagram.
pub const TAG_SIZE: usize = aead::MAX_TAG_LEN;

const PUBLIC_KEY_SIZE: usize = 32;

/// Key exchange and symmetric encryption for one channel.
///
/// Both sides publish an X25519 public key. Once the remote key is set the
/// session derives the mutual key (SHA-256 of the shared secret) and seals
/// chunks with ChaCha20-Poly1305. An encrypted datagram is
/// `counter u64 | ciphertext | tag`.
///
/// The nonce is the counter plus a direction byte, which the two peers
/// derive from the order of their public keys so that each direction uses
/// its own nonce space under the shared key.
pub struct CipherSession {
    rng: SystemRandom,
    private_key: Option<EphemeralPrivateKey>,
    public_key: Vec<u8>,
    remote_key: Vec<u8>,
    mutual_key: Vec<u8>,
    key: Option<LessSafeKey>,
    direction: u8,
    counter: u64,
    loss_count: usize,
}

impl CipherSession {
    /// Try to create a new session with a fresh key pair
    pub fn try_new() -> Result<Self, CipherError> {
        let mut session = Self {
            rng: SystemRandom::new(),
            private_key: None,
            public_key: Vec::new(),
            remote_key: Vec::new(),
            mutual_key: Vec::new(),
            key: None,
            direction: 0,
            counter: 0,
            loss_count: 0,
        };
        session.generate_keys()?;
        Ok(session)
    }

    /// Create a new session with a fresh key pair
    ///
    /// # Panics
    /// Panics if the system random source is unavailable
    pub fn new() -> Self {
        Self::try_new().expect("Failed to create CipherSession")
    }

    /// The local public key to send to the peer.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn remote_key(&self) -> &[u8] {
        &self.remote_key
    }

    pub fn mutual_key(&self) -> &[u8] {
        &self.mutual_key
    }

    pub fn is_ready(&self) -> bool {
        self.key.is_some()
    }

    /// Bytes lost to datagrams that failed to decrypt.
    pub fn loss_count(&self) -> usize {
        self.loss_count
    }

    pub fn reset_loss_count(&mut self) {
        self.loss_count = 0;
    }

    /// Derive the mutual key from the peer's public key.
    ///
    /// The local key pair is consumed and replaced with a fresh one, so read
    /// [`CipherSession::public_key`] before calling this when replying to an
    /// offer.
    pub fn set_remote_key(&mut self, key: &[u8]) -> Result<(), CipherError> {
        if key.len() != PUBLIC_KEY_SIZE {
            return Err(CipherError::InvalidRemoteKey {
                len: key.len(),
                expected: PUBLIC_KEY_SIZE,
            });
        }

        let private_key = match self.private_key.take() {
            Some(private_key) => private_key,
            None => {
                self.generate_keys()?;
                self.private_key.take().ok_or(CipherError::KeyGeneration)?
            }
        };

        let mutual_key = agreement::agree_ephemeral(
            private_key,
            &UnparsedPublicKey::new(&X25519, key),
            CipherError::KeyAgreement,
            |secret| Ok(digest::digest(&SHA256, secret).as_ref().to_vec()),
        );

        let local_key = std::mem::take(&mut self.public_key);

        // A fresh pair is needed for the next exchange even if this one failed.
        self.generate_keys()?;

        let mutual_key = mutual_key?;
        let unbound = UnboundKey::new(&CHACHA20_POLY1305, &mutual_key)
            .map_err(|_| CipherError::KeyAgreement)?;

        self.direction = u8::from(local_key.as_slice() < key);
        self.remote_key = key.to_vec();
        self.mutual_key = mutual_key;
        self.key = Some(LessSafeKey::new(unbound));
        self.counter = 0;

        trace!("Mutual key: {:02x?}", self.mutual_key);
        Ok(())
    }

    /// Seal a plain chunk into a datagram.
    pub fn encrypt(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CipherError> {
        let key = self.key.as_ref().ok_or(CipherError::NotReady)?;

        let counter = self.counter;
        self.counter = counter.checked_add(1).ok_or(CipherError::NonceExhausted)?;

        let mut sealed = chunk.to_vec();
        key.seal_in_place_append_tag(
            Self::nonce(self.direction, counter),
            Aad::empty(),
            &mut sealed,
        )
        .map_err(|_| CipherError::Seal { len: chunk.len() })?;

        let mut datagram = Vec::with_capacity(COUNTER_SIZE + sealed.len());
        datagram.extend_from_slice(&counter.to_le_bytes());
        datagram.extend_from_slice(&sealed);
        Ok(datagram)
    }

    /// Open a datagram. Passes the bytes through unchanged while no mutual
    /// key exists; returns an empty vector if authentication fails.
    pub fn decrypt(&mut self, datagram: &[u8]) -> Vec<u8> {
        let Some(key) = &self.key else {
            return datagram.to_vec();
        };

        if datagram.len() < COUNTER_SIZE + TAG_SIZE {
            warn!("Dropping datagram of {} bytes: too short to be encrypted", datagram.len());
            self.loss_count += datagram.len();
            return Vec::new();
        }

        let mut counter = [0; COUNTER_SIZE];
        counter.copy_from_slice(&datagram[..COUNTER_SIZE]);
        let counter = u64::from_le_bytes(counter);

        let mut sealed = datagram[COUNTER_SIZE..].to_vec();
        let opened = key.open_in_place(
            Self::nonce(1 - self.direction, counter),
            Aad::empty(),
            &mut sealed,
        );

        match opened {
            Ok(plain) => plain.to_vec(),
            Err(_) => {
                warn!("Dropping datagram of {} bytes: authentication failed", datagram.len());
                self.loss_count += datagram.len();
                Vec::new()
            }
        }
    }

    fn generate_keys(&mut self) -> Result<(), CipherError> {
        let private_key = EphemeralPrivateKey::generate(&X25519, &self.rng)
            .map_err(|_| CipherError::KeyGeneration)?;
        let public_key = private_key
            .compute_public_key()
            .map_err(|_| CipherError::KeyGeneration)?;

        self.public_key = public_key.as_ref().to_vec();
        self.private_key = Some(private_key);
        Ok(())
    }

    fn nonce(direction: u8, counter: u64) -> Nonce {
        let mut nonce = [0; NONCE_LEN];
        nonce[0] = direction;
        nonce[NONCE_LEN - COUNTER_SIZE..].copy_from_slice(&counter.to_le_bytes());
        Nonce::assume_unique_for_key(nonce)
    }
}

impl Default for CipherSession {
    fn default() -> Self {
        Self::new()
    }
}
