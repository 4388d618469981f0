pub mod channel_config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod event_queue;
