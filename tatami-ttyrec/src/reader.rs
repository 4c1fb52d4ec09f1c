//! Streaming reader for the ttyrec recording format.
//!
//! A ttyrec is a sequence of frames, each introduced by a 12-byte header of
//! three little-endian `u32` fields: seconds, microseconds, body length.
//! The body is raw terminal output.

use std::io::{self, Read};

use chrono::{DateTime, Utc};

use crate::error::TtyrecError;

pub const HEADER_SIZE: usize = 12;

/// Frames larger than this are rejected as corrupt.
pub const MAX_FRAME_SIZE: u32 = 1_000_000;

/// A single timestamped chunk of terminal output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub time: DateTime<Utc>,
    pub body: Vec<u8>,
}

/// Reads successive frames from any byte source.
pub struct FrameReader<R> {
    inner: R,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        FrameReader { inner }
    }

    /// Reads the next frame. Returns `Ok(None)` at a clean end of stream;
    /// a stream that ends mid-header or mid-body is an error.
    pub fn read_frame(&mut self) -> Result<Option<Frame>, TtyrecError> {
        let mut header = [0u8; HEADER_SIZE];
        if !self.fill_header(&mut header)? {
            return Ok(None);
        }

        let sec = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let usec = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let length = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);

        if length > MAX_FRAME_SIZE {
            return Err(TtyrecError::FrameTooLarge { length });
        }

        let mut body = vec![0u8; length as usize];
        self.inner.read_exact(&mut body)?;
        Ok(Some(Frame {
            time: frame_time(sec, usec),
            body,
        }))
    }

    /// Fills the header buffer. Returns false on end-of-stream before the
    /// first byte; a partial header is an `UnexpectedEof` error.
    fn fill_header(&mut self, buf: &mut [u8; HEADER_SIZE]) -> Result<bool, TtyrecError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    if filled == 0 {
                        return Ok(false);
                    }
                    return Err(TtyrecError::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "truncated ttyrec header",
                    )));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(TtyrecError::Io(e)),
            }
        }
        Ok(true)
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<Frame, TtyrecError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// ttyrec timestamps are Unix seconds plus microseconds, UTC.
fn frame_time(sec: u32, usec: u32) -> DateTime<Utc> {
    let secs = i64::from(sec) + i64::from(usec / 1_000_000);
    let nanos = (usec % 1_000_000) * 1000;
    DateTime::from_timestamp(secs, nanos).unwrap_or(DateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn frame_bytes(sec: u32, usec: u32, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
        out.extend_from_slice(&sec.to_le_bytes());
        out.extend_from_slice(&usec.to_le_bytes());
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn test_read_two_frames() {
        let mut image = frame_bytes(1_425_436_272, 467_019, &vec![b'x'; 0x96]);
        image.extend(frame_bytes(1_425_436_273, 629_597, &vec![b'y'; 0x20]));

        let mut reader = FrameReader::new(Cursor::new(image));

        let first = reader.read_frame().unwrap().unwrap();
        assert_eq!(
            first.time,
            "2015-03-04T02:31:12.467019Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(first.body.len(), 0x96);

        let second = reader.read_frame().unwrap().unwrap();
        assert_eq!(
            second.time,
            "2015-03-04T02:31:13.629597Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(second.body.len(), 0x20);

        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_empty_stream() {
        let mut reader = FrameReader::new(Cursor::new(Vec::new()));
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_oversize_frame_rejected() {
        let image = frame_bytes(0, 0, &[]);
        let mut oversize = image.clone();
        oversize[8..12].copy_from_slice(&(MAX_FRAME_SIZE + 1).to_le_bytes());

        let mut reader = FrameReader::new(Cursor::new(oversize));
        match reader.read_frame() {
            Err(TtyrecError::FrameTooLarge { length }) => {
                assert_eq!(length, MAX_FRAME_SIZE + 1);
            }
            other => panic!("expected FrameTooLarge, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_truncated_header() {
        let mut reader = FrameReader::new(Cursor::new(vec![0u8; 5]));
        match reader.read_frame() {
            Err(TtyrecError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected truncation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_truncated_body() {
        let mut image = frame_bytes(0, 0, b"full body");
        image.truncate(HEADER_SIZE + 3);
        let mut reader = FrameReader::new(Cursor::new(image));
        assert!(matches!(reader.read_frame(), Err(TtyrecError::Io(_))));
    }

    #[test]
    fn test_iterator_adapter() {
        let mut image = frame_bytes(10, 0, b"one");
        image.extend(frame_bytes(11, 0, b"two"));

        let frames: Vec<Frame> = FrameReader::new(Cursor::new(image))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].body, b"one");
        assert_eq!(frames[1].body, b"two");
    }

    #[test]
    fn test_microsecond_overflow_normalizes() {
        // 1.5 million microseconds carry into the seconds field.
        let image = frame_bytes(100, 1_500_000, b"");
        let frame = FrameReader::new(Cursor::new(image))
            .read_frame()
            .unwrap()
            .unwrap();
        assert_eq!(frame.time, DateTime::from_timestamp(101, 500_000_000).unwrap());
    }
}
