//! End-to-end: a compressed recording drives the screen model.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use flate2::write::GzEncoder;
use flate2::Compression;
use tatami_ttyrec::{compfile, FrameReader};
use tatami_vt::{Point, Term};

fn frame(sec: u32, usec: u32, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&sec.to_le_bytes());
    out.extend_from_slice(&usec.to_le_bytes());
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    out
}

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("tatami-replay-{}-{}", std::process::id(), name))
}

#[test]
fn replay_gzipped_recording() {
    let mut image = frame(100, 0, b"Hello");
    image.extend(frame(101, 250_000, b"\x1b[2;1Hworld"));
    image.extend(frame(102, 500_000, b"\x1b[1;31m!"));

    let path = scratch_path("session.gz");
    let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    encoder.write_all(&image).unwrap();
    encoder.finish().unwrap();

    let mut term = Term::with_size(Point::new(20, 5));
    let mut reader = FrameReader::new(compfile::open(&path).unwrap());
    let mut frames = 0;
    while let Some(frame) = reader.read_frame().unwrap() {
        term.write(&frame.body);
        frames += 1;
    }
    let _ = std::fs::remove_file(&path);

    assert_eq!(frames, 3);
    assert_eq!(term.text_at(Point::new(0, 0), 5), "Hello");
    assert_eq!(term.text_at(Point::new(0, 1), 6), "world!");
    assert_eq!(term.cursor(), Point::new(6, 1));
    // The styled cell carries bold red; its neighbors are untouched.
    let cell = term.get(Point::new(5, 1));
    assert_eq!(cell.attr.fg(), 1);
    assert!(cell.attr.contains(tatami_vt::Attribute::BOLD));
}
