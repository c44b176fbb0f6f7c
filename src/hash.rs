//! SHA256 digests of downloaded sources

use sha2::{Digest, Sha256};
use std::io::Read;

/// Chunk size for reading while hashing (1MB)
const CHUNK_SIZE: usize = 1024 * 1024;

/// Lowercase hex SHA256 of everything `reader` yields.
///
/// `on_chunk` is called with the size of each chunk as it is consumed.
pub fn sha256_reader(reader: &mut impl Read, mut on_chunk: impl FnMut(u64)) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        on_chunk(n as u64);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        // SHA256 of "hello world"
        assert_eq!(
            sha256_reader(&mut &b"hello world"[..], |_| {}).unwrap(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            sha256_reader(&mut &b""[..], |_| {}).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_progress_callback_sees_all_bytes() {
        let data = vec![7u8; CHUNK_SIZE + 10];
        let mut chunks = Vec::new();
        sha256_reader(&mut &data[..], |n| chunks.push(n)).unwrap();
        assert_eq!(chunks.iter().sum::<u64>(), data.len() as u64);
        assert!(chunks.len() >= 2);
    }
}
