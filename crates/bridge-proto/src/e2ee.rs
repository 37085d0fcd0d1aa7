//! End-to-end encryption options.

use serde::{Deserialize, Serialize};

/// Default salt used when ratcheting frame keys.
pub const DEFAULT_RATCHET_SALT: &[u8] = b"LKFrameEncryptionKey";

/// Default magic bytes marking unencrypted frames.
pub const DEFAULT_MAGIC_BYTES: &[u8] = b"LK-ROCKS";

/// Default number of ratchet steps tried before giving up on a key.
pub const DEFAULT_RATCHET_WINDOW_SIZE: i32 = 16;

/// Frame encryption scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionType {
    /// No encryption.
    None,

    /// AES-GCM frame encryption.
    #[default]
    Gcm,

    /// Application-provided scheme.
    Custom,
}

/// Per-participant encryption state reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum E2eeState {
    New,
    Ok,
    EncryptionFailed,
    DecryptionFailed,
    MissingKey,
    KeyRatcheted,
    InternalError,
}

/// Key provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyProviderOptions {
    /// Key shared by every participant, if any.
    pub shared_key: Option<Vec<u8>>,

    /// Salt used when ratcheting.
    pub ratchet_salt: Vec<u8>,

    /// Magic bytes marking frames that were left unencrypted.
    pub uncrypted_magic_bytes: Vec<u8>,

    /// Ratchet window size.
    pub ratchet_window_size: i32,
}

impl Default for KeyProviderOptions {
    fn default() -> Self {
        Self {
            shared_key: None,
            ratchet_salt: DEFAULT_RATCHET_SALT.to_vec(),
            uncrypted_magic_bytes: DEFAULT_MAGIC_BYTES.to_vec(),
            ratchet_window_size: DEFAULT_RATCHET_WINDOW_SIZE,
        }
    }
}

/// End-to-end encryption configuration for a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct E2eeOptions {
    /// Encryption scheme.
    pub encryption_type: EncryptionType,

    /// Key provider configuration.
    pub key_provider_options: KeyProviderOptions,
}

impl E2eeOptions {
    /// GCM encryption with a key shared by every participant.
    pub fn with_shared_key(key: impl Into<Vec<u8>>) -> Self {
        Self {
            encryption_type: EncryptionType::Gcm,
            key_provider_options: KeyProviderOptions {
                shared_key: Some(key.into()),
                ..Default::default()
            },
        }
    }
}
