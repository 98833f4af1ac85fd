//! Chunk sink abstraction for encoded image output.
//!
//! Capture and streaming write their bytes through [`FrameSink`], one chunk
//! at a time, without knowing whether the bytes end up in an HTTP response,
//! a socket, or a test buffer.

/// Accepts encoded output one chunk at a time.
///
/// An `Err` means the transport is gone (typically the client hung up) and
/// the caller should stop producing.
pub trait FrameSink {
    /// Error type for a failed write.
    type Error;

    /// Accept one chunk of output.
    fn accept(&mut self, chunk: &[u8]) -> Result<(), Self::Error>;
}

impl FrameSink for Vec<u8> {
    type Error = core::convert::Infallible;

    fn accept(&mut self, chunk: &[u8]) -> Result<(), Self::Error> {
        self.extend_from_slice(chunk);
        Ok(())
    }
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    type Error = S::Error;

    fn accept(&mut self, chunk: &[u8]) -> Result<(), Self::Error> {
        (**self).accept(chunk)
    }
}

/// Adapts any [`std::io::Write`] into a [`FrameSink`].
#[derive(Debug)]
pub struct IoSink<W>(pub W);

impl<W: std::io::Write> FrameSink for IoSink<W> {
    type Error = std::io::Error;

    fn accept(&mut self, chunk: &[u8]) -> Result<(), Self::Error> {
        self.0.write_all(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_appends() {
        let mut buf = Vec::new();
        buf.accept(b"ab").unwrap();
        buf.accept(b"cd").unwrap();
        assert_eq!(buf, b"abcd");
    }

    #[test]
    fn io_sink_writes_through() {
        let mut sink = IoSink(Vec::new());
        sink.accept(b"\xFF\xD8").unwrap();
        assert_eq!(sink.0, b"\xFF\xD8");
    }

    #[test]
    fn io_sink_reports_write_failure() {
        struct Closed;
        impl std::io::Write for Closed {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut sink = IoSink(Closed);
        let err = sink.accept(b"x").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    }
}
