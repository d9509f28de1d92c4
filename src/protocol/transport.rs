use std::io::{self, BufRead, BufReader, Read, Write};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport IO Error: {0}")]
    Io(#[from] io::Error),
    #[error("connection closed by peer")]
    Closed,
}

/// A duplex channel carrying one message per line. The executor only
/// depends on this trait, so it can be driven by scripted transports in
/// tests.
pub trait Transport: Send {
    fn send_line(&mut self, line: &str) -> Result<(), TransportError>;
    fn recv_line(&mut self) -> Result<String, TransportError>;
}

pub struct LineTransport<T: Read + Write> {
    stream: BufReader<T>,
}

impl<T: Read + Write> LineTransport<T> {
    pub fn new(stream: T) -> Self {
        Self {
            stream: BufReader::new(stream),
        }
    }
}

impl<T: Read + Write + Send> Transport for LineTransport<T> {
    fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        let stream = self.stream.get_mut();
        stream.write_all(line.as_bytes())?;
        stream.write_all(b"\n")?;
        stream.flush()?;
        Ok(())
    }

    fn recv_line(&mut self) -> Result<String, TransportError> {
        let mut line = String::new();
        if self.stream.read_line(&mut line)? == 0 {
            return Err(TransportError::Closed);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }
}
