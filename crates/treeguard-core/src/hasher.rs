//! Streaming content digests.
//!
//! The scanner only ever sees a [`ContentHasher`]; which algorithm sits
//! behind it is chosen at startup from [`HashAlgorithm`].

use crate::error::ConfigError;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

/// Default buffer size for streaming reads (64KB)
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Maps file contents to a stable, opaque digest string.
pub trait ContentHasher: Send + Sync {
    /// Algorithm name, shown in the startup banner.
    fn name(&self) -> &str;

    fn hash_reader(&self, reader: &mut dyn Read) -> io::Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Blake3,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blake3 => "blake3",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blake3" => Ok(Self::Blake3),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads input in `buffer_size` chunks and feeds the selected algorithm.
#[derive(Debug, Clone)]
pub struct StreamHasher {
    algorithm: HashAlgorithm,
    buffer_size: usize,
}

impl StreamHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            buffer_size: BUFFER_SIZE,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    fn stream_blake3(&self, reader: &mut dyn Read) -> io::Result<String> {
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.buffer_size];
        loop {
            match reader.read(&mut buffer)? {
                0 => break,
                n => {
                    hasher.update(&buffer[..n]);
                }
            }
        }
        Ok(hasher.finalize().to_hex().to_string())
    }

    fn stream_sha2<D: Digest>(&self, reader: &mut dyn Read) -> io::Result<String> {
        let mut hasher = D::new();
        let mut buffer = vec![0u8; self.buffer_size];
        loop {
            match reader.read(&mut buffer)? {
                0 => break,
                n => hasher.update(&buffer[..n]),
            }
        }
        Ok(hex::encode(hasher.finalize()))
    }
}

impl ContentHasher for StreamHasher {
    fn name(&self) -> &str {
        self.algorithm.as_str()
    }

    fn hash_reader(&self, reader: &mut dyn Read) -> io::Result<String> {
        match self.algorithm {
            HashAlgorithm::Blake3 => self.stream_blake3(reader),
            HashAlgorithm::Sha256 => self.stream_sha2::<Sha256>(reader),
            HashAlgorithm::Sha512 => self.stream_sha2::<Sha512>(reader),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn digest(alg: HashAlgorithm, data: &[u8]) -> String {
        StreamHasher::new(alg)
            .hash_reader(&mut Cursor::new(data.to_vec()))
            .unwrap()
    }

    #[test]
    fn known_sha256_vector() {
        assert_eq!(
            digest(HashAlgorithm::Sha256, b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn blake3_matches_one_shot() {
        let data = vec![7u8; 200_000];
        assert_eq!(
            digest(HashAlgorithm::Blake3, &data),
            blake3::hash(&data).to_hex().to_string()
        );
    }

    #[test]
    fn chunk_size_does_not_change_digest() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let small = StreamHasher::new(HashAlgorithm::Sha512)
            .with_buffer_size(7)
            .hash_reader(&mut Cursor::new(data.clone()))
            .unwrap();
        assert_eq!(small, digest(HashAlgorithm::Sha512, &data));
        assert_eq!(small.len(), 128);
    }

    #[test]
    fn parses_algorithm_names() {
        assert_eq!("SHA-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("blake3".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Blake3);
        assert!(matches!(
            "md4".parse::<HashAlgorithm>(),
            Err(ConfigError::UnknownAlgorithm(name)) if name == "md4"
        ));
    }
}
