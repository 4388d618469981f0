mod cipher_session;
mod error;

pub use cipher_session::{CipherSession, COUNTER_SIZE, TAG_SIZE};
pub use error::CipherError;
