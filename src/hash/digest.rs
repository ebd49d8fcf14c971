// Content digests for duplicate detection
// SHA-256 streamed in fixed-size chunks, never reading a whole file into memory

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::cancel::CancelToken;
use crate::error::{Result, SurgeError};

/// Read buffer size for hashing.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// A 256-bit content digest. Serialized as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = SurgeError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SurgeError::invalid_request(format!("invalid content hash: {}", s));
        if s.len() != 64 || !s.is_ascii() {
            return Err(invalid());
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Hash a file's content. The token is checked between chunks.
pub fn hash_file(path: &Path, cancel: &CancelToken) -> Result<ContentHash> {
    let mut file = File::open(path)
        .map_err(|e| SurgeError::from_io_error(e, "opening for hashing", Some(path.to_path_buf())))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        cancel.check()?;
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| SurgeError::from_io_error(e, "reading for hashing", Some(path.to_path_buf())))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(ContentHash(hasher.finalize().into()))
}
