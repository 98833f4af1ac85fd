//! MJPEG streaming and single-frame capture.
//!
//! Both paths pull JPEG frames from a [`FrameSource`] and push bytes into a
//! [`FrameSink`]. The stream is a `multipart/x-mixed-replace` response where
//! every part is one complete JPEG:
//!
//! ```text
//! Content-Type: image/jpeg\r\n
//! Content-Length: 1234\r\n
//! \r\n
//! <jpeg bytes>
//! \r\n--123456789000000000000987654321\r\n
//! ```
//!
//! The loop has no cancellation signal. It ends when a write fails (client
//! disconnected) or the camera stops producing frames.

use core::fmt::Debug;

use thiserror::Error;

use crate::traits::{Clock, FrameSink, FrameSource};

/// Multipart boundary token.
pub const PART_BOUNDARY: &str = "123456789000000000000987654321";

/// `Content-Type` of the `/stream` response.
pub const STREAM_CONTENT_TYPE: &str =
    "multipart/x-mixed-replace;boundary=123456789000000000000987654321";

/// Boundary line written after every part.
pub const STREAM_BOUNDARY: &str = "\r\n--123456789000000000000987654321\r\n";

/// `Content-Disposition` of the `/capture` response.
pub const CAPTURE_DISPOSITION: &str = "inline; filename=capture.jpg";

/// Part header announcing one JPEG of `len` bytes.
///
/// ```
/// use rs_rover::stream::part_header;
///
/// assert_eq!(
///     part_header(512),
///     "Content-Type: image/jpeg\r\nContent-Length: 512\r\n\r\n"
/// );
/// ```
pub fn part_header(len: usize) -> String {
    format!("Content-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n", len)
}

/// Why a capture or stream ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum StreamStop {
    /// A write to the client failed.
    #[error("client disconnected")]
    Disconnected,

    /// The camera returned no frame.
    #[error("camera capture failed")]
    CaptureFailed,
}

/// Sink wrapper that counts the bytes it forwards.
#[derive(Debug)]
pub struct CountingSink<S> {
    inner: S,
    written: usize,
}

impl<S> CountingSink<S> {
    /// Wraps `inner` with a zero count.
    pub fn new(inner: S) -> Self {
        Self { inner, written: 0 }
    }

    /// Total bytes accepted so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Unwraps the inner sink.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: FrameSink> FrameSink for CountingSink<S> {
    type Error = S::Error;

    fn accept(&mut self, chunk: &[u8]) -> Result<(), Self::Error> {
        self.inner.accept(chunk)?;
        self.written += chunk.len();
        Ok(())
    }
}

/// Write one multipart part: header, JPEG, boundary.
pub fn send_part<S: FrameSink>(sink: &mut S, jpeg: &[u8]) -> Result<(), S::Error> {
    sink.accept(part_header(jpeg.len()).as_bytes())?;
    sink.accept(jpeg)?;
    sink.accept(STREAM_BOUNDARY.as_bytes())
}

/// Capture one frame and write it to `sink`. Returns the JPEG size.
pub fn capture<F, S, C>(source: &mut F, sink: &mut S, clock: &C) -> Result<usize, StreamStop>
where
    F: FrameSource,
    F::Error: Debug,
    S: FrameSink,
    S::Error: Debug,
    C: Clock,
{
    let start = clock.now_ms();
    let frame = source.capture().map_err(|e| {
        log::error!("Camera capture failed: {:?}", e);
        StreamStop::CaptureFailed
    })?;
    let jpeg = frame.as_ref();
    let len = jpeg.len();

    let mut counted = CountingSink::new(sink);
    counted.accept(jpeg).map_err(|e| {
        log::warn!("capture write failed: {:?}", e);
        StreamStop::Disconnected
    })?;
    drop(frame);

    log::info!("JPG: {}B {}ms", counted.written(), clock.now_ms() - start);
    Ok(len)
}

/// Stream frames until the client goes away or the camera fails.
///
/// Blocks the calling thread for the lifetime of the stream.
pub fn run_stream<F, S, C>(source: &mut F, sink: &mut S, clock: &C) -> StreamStop
where
    F: FrameSource,
    F::Error: Debug,
    S: FrameSink,
    S::Error: Debug,
    C: Clock,
{
    let mut last_frame = clock.now_ms();
    loop {
        let frame = match source.capture() {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("Camera capture failed: {:?}", e);
                return StreamStop::CaptureFailed;
            }
        };
        let jpeg_len = frame.as_ref().len();
        let sent = send_part(sink, frame.as_ref());
        drop(frame);

        if let Err(e) = sent {
            log::info!("stream closed: {:?}", e);
            return StreamStop::Disconnected;
        }

        let now = clock.now_ms();
        let frame_time = now.saturating_sub(last_frame);
        last_frame = now;
        let fps = if frame_time > 0 {
            1000.0 / frame_time as f32
        } else {
            0.0
        };
        log::info!("MJPG: {}B {}ms ({:.1}fps)", jpeg_len, frame_time, fps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{FailingSink, MockClock, MockFrames};

    const JPEG_A: &[u8] = &[0xFF, 0xD8, 0x01, 0xFF, 0xD9];
    const JPEG_B: &[u8] = &[0xFF, 0xD8, 0x02, 0x03, 0xFF, 0xD9];

    #[test]
    fn content_type_carries_boundary() {
        assert!(STREAM_CONTENT_TYPE.ends_with(PART_BOUNDARY));
        assert_eq!(STREAM_BOUNDARY, format!("\r\n--{}\r\n", PART_BOUNDARY));
    }

    #[test]
    fn part_layout() {
        let mut buf = Vec::new();
        send_part(&mut buf, JPEG_A).unwrap();

        let header = part_header(JPEG_A.len());
        assert!(buf.starts_with(header.as_bytes()));
        assert_eq!(&buf[header.len()..header.len() + JPEG_A.len()], JPEG_A);
        assert!(buf.ends_with(STREAM_BOUNDARY.as_bytes()));
        assert_eq!(
            buf.len(),
            header.len() + JPEG_A.len() + STREAM_BOUNDARY.len()
        );
    }

    #[test]
    fn counting_sink_counts() {
        let mut sink = CountingSink::new(Vec::new());
        sink.accept(b"abc").unwrap();
        sink.accept(b"de").unwrap();
        assert_eq!(sink.written(), 5);
        assert_eq!(sink.into_inner(), b"abcde");
    }

    #[test]
    fn capture_writes_bare_jpeg() {
        let mut frames = MockFrames::new(vec![JPEG_A.to_vec()]);
        let mut out = Vec::new();
        let len = capture(&mut frames, &mut out, &MockClock::new()).unwrap();
        assert_eq!(len, JPEG_A.len());
        assert_eq!(out, JPEG_A);
        assert_eq!(frames.released, 1);
    }

    #[test]
    fn capture_without_frame_fails() {
        let mut frames = MockFrames::new(Vec::new());
        let mut out = Vec::new();
        assert_eq!(
            capture(&mut frames, &mut out, &MockClock::new()),
            Err(StreamStop::CaptureFailed)
        );
        assert!(out.is_empty());
    }

    #[test]
    fn stream_ends_when_camera_runs_dry() {
        let mut frames = MockFrames::new(vec![JPEG_A.to_vec(), JPEG_B.to_vec()]);
        let mut out = Vec::new();
        let stop = run_stream(&mut frames, &mut out, &MockClock::new());
        assert_eq!(stop, StreamStop::CaptureFailed);

        let mut expected = Vec::new();
        send_part(&mut expected, JPEG_A).unwrap();
        send_part(&mut expected, JPEG_B).unwrap();
        assert_eq!(out, expected);
        assert_eq!(frames.released, 2);
    }

    #[test]
    fn stream_ends_on_disconnect() {
        let mut frames = MockFrames::repeating(JPEG_A.to_vec());
        // Room for the first part header only
        let mut sink = FailingSink::after_bytes(part_header(JPEG_A.len()).len());
        let stop = run_stream(&mut frames, &mut sink, &MockClock::new());
        assert_eq!(stop, StreamStop::Disconnected);
        assert_eq!(frames.released, 1);
    }
}
