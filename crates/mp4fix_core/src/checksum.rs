//! MD5 checksums of large files.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const BLOCK_SIZE: usize = 64 * 1024;

/// Hex MD5 digest of the file at `path`, read in blocks.
pub fn md5_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut context = md5::Context::new();
    let mut buf = vec![0u8; BLOCK_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        context.consume(&buf[..n]);
    }

    Ok(format!("{:x}", context.compute()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn matches_known_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, b"hello world").unwrap();

        assert_eq!(md5_file(&path).unwrap(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn spans_multiple_blocks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let data = vec![7u8; BLOCK_SIZE * 2 + 11];
        std::fs::write(&path, &data).unwrap();

        assert_eq!(md5_file(&path).unwrap(), format!("{:x}", md5::compute(&data)));
    }

    #[test]
    fn missing_file_errors() {
        assert!(md5_file(Path::new("/nonexistent/mp4fix/file")).is_err());
    }
}
