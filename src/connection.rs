// ABOUTME: Transport injection seam plus framed reader/writer halves
// ABOUTME: The session drives both halves from one select! loop, hence the split

use crate::codec::CodecError;
use crate::pdu::Pdu;
use bytes::{Buf, Bytes, BytesMut};
use std::future::Future;
use std::io::{self, Cursor};
use std::pin::Pin;
use tokio::io::{
    AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter, ReadHalf, WriteHalf,
};
use tokio::net::TcpStream;

/// Anything the session can speak SMPP over. TLS, SOCKS or instrumentation
/// layers wrap the inner stream and hand ownership of the composite back.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// Produces a fresh transport for every (re)connection attempt.
pub trait Dialer: Send + Sync {
    fn dial(&self) -> Pin<Box<dyn Future<Output = io::Result<Box<dyn Transport>>> + Send + '_>>;
}

/// Plain TCP with Nagle disabled; the default dialer.
#[derive(Debug, Clone)]
pub struct TcpDialer {
    pub addr: String,
}

impl TcpDialer {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl Dialer for TcpDialer {
    fn dial(&self) -> Pin<Box<dyn Future<Output = io::Result<Box<dyn Transport>>> + Send + '_>> {
        Box::pin(async move {
            let stream = TcpStream::connect(&self.addr).await?;
            stream.set_nodelay(true)?;
            Ok(Box::new(stream) as Box<dyn Transport>)
        })
    }
}

/// Read side: accumulates bytes and yields whole PDUs.
///
/// Two-phase parse: [`Pdu::check`] establishes that a complete frame is
/// buffered before any body structures are allocated; only then does
/// [`Pdu::parse`] run. A frame that parses as garbage is skipped (its
/// length is trusted); a length field outside bounds poisons the stream.
pub struct FrameReader {
    half: ReadHalf<Box<dyn Transport>>,
    buffer: BytesMut,
}

/// One reader event.
#[derive(Debug)]
pub enum ReadEvent {
    Pdu(Pdu),
    /// A complete frame arrived but its body would not decode; the stream
    /// is still framed correctly, so the connection survives.
    Skipped(CodecError),
    /// Clean EOF from the peer.
    Closed,
}

impl FrameReader {
    pub fn new(half: ReadHalf<Box<dyn Transport>>) -> Self {
        Self {
            half,
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Next event off the wire. `Err` means the connection is unusable
    /// (I/O failure, torn frame at EOF, or unrecoverable framing).
    pub async fn read(&mut self) -> io::Result<ReadEvent> {
        loop {
            match Pdu::check(&Cursor::new(&self.buffer[..])) {
                Ok(frame_len) => {
                    let frame = &self.buffer[..frame_len];
                    let event = match Pdu::parse(frame) {
                        Ok(pdu) => ReadEvent::Pdu(pdu),
                        Err(e) => ReadEvent::Skipped(e),
                    };
                    self.buffer.advance(frame_len);
                    return Ok(event);
                }
                // Not enough buffered yet; fall through to the read.
                Err(CodecError::ShortPdu) => {}
                // The length field is implausible. There is no way to find
                // the next frame boundary, so the connection must die.
                Err(e) => {
                    return Err(io::Error::new(io::ErrorKind::InvalidData, e));
                }
            }

            if 0 == self.half.read_buf(&mut self.buffer).await? {
                return if self.buffer.is_empty() {
                    Ok(ReadEvent::Closed)
                } else {
                    // Peer closed mid-frame.
                    Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection reset inside a PDU",
                    ))
                };
            }
        }
    }
}

/// Write side: the single serialization point for outgoing bytes. Every
/// PDU is written and flushed whole, so frames never interleave.
pub struct FrameWriter {
    half: BufWriter<WriteHalf<Box<dyn Transport>>>,
}

impl FrameWriter {
    pub fn new(half: WriteHalf<Box<dyn Transport>>) -> Self {
        Self {
            half: BufWriter::new(half),
        }
    }

    pub async fn write(&mut self, bytes: &Bytes) -> io::Result<()> {
        self.half.write_all(bytes).await?;
        self.half.flush().await
    }

    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.half.shutdown().await
    }
}

/// Split a freshly dialed transport into its framed halves.
pub fn split(transport: Box<dyn Transport>) -> (FrameReader, FrameWriter) {
    let (read, write) = tokio::io::split(transport);
    (FrameReader::new(read), FrameWriter::new(write))
}
