//! Opens possibly-compressed files, guessing the codec from the extension.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;

/// Buffer size for the underlying file reads.
pub const DEFAULT_BUFFER_SIZE: usize = 65536;

/// Opens `path` for buffered reading, transparently decompressing `.gz`,
/// `.bz2` and `.bzip2` files. A corrupt compressed stream surfaces as an
/// `io::Error` from the returned reader.
pub fn open(path: impl AsRef<Path>) -> io::Result<Box<dyn Read>> {
    open_buffered(path, DEFAULT_BUFFER_SIZE)
}

/// As [`open`], with an explicit buffer size.
pub fn open_buffered(path: impl AsRef<Path>, buffer_size: usize) -> io::Result<Box<dyn Read>> {
    let path = path.as_ref();
    let file = BufReader::with_capacity(buffer_size, File::open(path)?);

    let reader: Box<dyn Read> = match path.extension().and_then(|ext| ext.to_str()) {
        Some("gz") => Box::new(GzDecoder::new(file)),
        Some("bz2") | Some("bzip2") => Box::new(BzDecoder::new(file)),
        _ => Box::new(file),
    };
    Ok(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tatami-compfile-{}-{}", std::process::id(), name))
    }

    fn read_all(path: &Path) -> Vec<u8> {
        let mut out = Vec::new();
        open(path).unwrap().read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_plain_file() {
        let path = scratch_path("plain.ttyrec");
        fs::write(&path, b"plain contents").unwrap();
        assert_eq!(read_all(&path), b"plain contents");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_gzip_file() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let path = scratch_path("rec.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"gzipped contents").unwrap();
        encoder.finish().unwrap();

        assert_eq!(read_all(&path), b"gzipped contents");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_bzip2_file() {
        use bzip2::write::BzEncoder;
        use bzip2::Compression;

        let path = scratch_path("rec.bz2");
        let mut encoder = BzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"bzipped contents").unwrap();
        encoder.finish().unwrap();

        assert_eq!(read_all(&path), b"bzipped contents");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file() {
        assert!(open(scratch_path("does-not-exist")).is_err());
    }

    #[test]
    fn test_corrupt_gzip_fails_on_read() {
        let path = scratch_path("bogus.gz");
        fs::write(&path, b"this is not gzip").unwrap();
        let mut out = Vec::new();
        assert!(open(&path).unwrap().read_to_end(&mut out).is_err());
        let _ = fs::remove_file(&path);
    }
}
