//! Stream and datagram transports.
//!
//! The codec stays pure; these wrappers move its bytes. Socket failures
//! and peer closes surface as [`WireError::BadRead`], which callers treat
//! as routine connection termination, not a crash.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, UdpSocket};

use crate::buffer::{Reader, Writer};
use crate::error::{WireError, WireResult};
use crate::types::Wire;
use crate::{TCP_BUFFER_SIZE, UDP_DATAGRAM_MAX};

/// Receiving half of a TCP message stream.
///
/// Messages are self-delimiting, so there is no length framing: `recv`
/// decodes the buffered prefix and pulls more bytes from the socket until
/// the message completes. EOF or a socket error mid-message is `BadRead`.
pub struct TcpReader {
    half: OwnedReadHalf,
    buf: Vec<u8>,
}

impl TcpReader {
    /// Wraps an owned read half.
    pub fn new(half: OwnedReadHalf) -> Self {
        Self {
            half,
            buf: Vec::with_capacity(TCP_BUFFER_SIZE),
        }
    }

    /// Receives the next message, suspending until it is complete.
    pub async fn recv<T: Wire>(&mut self) -> WireResult<T> {
        loop {
            if !self.buf.is_empty() {
                let mut reader = Reader::new(&self.buf);
                match T::decode(&mut reader) {
                    Ok(msg) => {
                        let consumed = reader.position();
                        self.buf.drain(..consumed);
                        return Ok(msg);
                    }
                    // An incomplete prefix just means the rest of the
                    // message is still in flight.
                    Err(WireError::BadRead) => {}
                    Err(e) => return Err(e),
                }
            }

            let mut chunk = [0u8; TCP_BUFFER_SIZE];
            let n = self
                .half
                .read(&mut chunk)
                .await
                .map_err(|_| WireError::BadRead)?;
            if n == 0 {
                return Err(WireError::BadRead);
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}

/// Sending half of a TCP message stream.
pub struct TcpWriter {
    half: OwnedWriteHalf,
}

impl TcpWriter {
    /// Wraps an owned write half.
    pub fn new(half: OwnedWriteHalf) -> Self {
        Self { half }
    }

    /// Encodes and sends one message, suspending until fully written.
    pub async fn send<T: Wire>(&mut self, msg: &T) -> WireResult<()> {
        let mut writer = Writer::new();
        msg.encode(&mut writer)?;
        self.half
            .write_all(&writer.finish())
            .await
            .map_err(|_| WireError::BadRead)
    }
}

/// Splits a connected stream into message halves, disabling Nagle.
pub fn split_stream(stream: TcpStream) -> std::io::Result<(TcpReader, TcpWriter)> {
    stream.set_nodelay(true)?;
    let (read, write) = stream.into_split();
    Ok((TcpReader::new(read), TcpWriter::new(write)))
}

/// One bound UDP socket addressed to one remote endpoint.
///
/// The socket is shared: the two client loops each hold their own
/// transport over the same `Arc`'d socket.
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
    buf: Vec<u8>,
}

impl UdpTransport {
    /// Creates a transport over `socket`, sending to `peer`.
    pub fn new(socket: Arc<UdpSocket>, peer: SocketAddr) -> Self {
        Self {
            socket,
            peer,
            buf: vec![0; UDP_DATAGRAM_MAX],
        }
    }

    /// Receives exactly one datagram and decodes it as one message.
    ///
    /// Malformed payloads (bad discriminant, truncation, trailing bytes)
    /// return an error without disturbing later datagrams; callers skip
    /// and keep receiving.
    pub async fn recv<T: Wire>(&mut self) -> WireResult<T> {
        let (n, _from) = self
            .socket
            .recv_from(&mut self.buf)
            .await
            .map_err(|_| WireError::BadRead)?;
        let mut reader = Reader::new(&self.buf[..n]);
        let msg = T::decode(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(WireError::BadRead);
        }
        Ok(msg)
    }

    /// Encodes and sends one message as one datagram.
    ///
    /// Messages over the datagram cap fail with `BadWrite` before
    /// anything is sent.
    pub async fn send<T: Wire>(&self, msg: &T) -> WireResult<()> {
        let mut writer = Writer::with_capacity_limit(UDP_DATAGRAM_MAX);
        msg.encode(&mut writer)?;
        self.socket
            .send_to(&writer.finish(), self.peer)
            .await
            .map_err(|_| WireError::BadRead)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ClientMessage;
    use crate::types::Direction;
    use tokio::net::TcpListener;

    async fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (client, server)
    }

    #[tokio::test]
    async fn tcp_roundtrip() {
        let (a, b) = tcp_pair().await;
        let (_reader_a, mut writer_a) = split_stream(a).unwrap();
        let (mut reader_b, _writer_b) = split_stream(b).unwrap();

        let msg = ClientMessage::Join {
            name: "alice".into(),
        };
        writer_a.send(&msg).await.unwrap();
        let got: ClientMessage = reader_b.recv().await.unwrap();
        assert_eq!(got, msg);
    }

    #[tokio::test]
    async fn tcp_reassembles_split_message() {
        let (a, b) = tcp_pair().await;
        let (mut reader_b, _writer_b) = split_stream(b).unwrap();

        // Encode a message and deliver it one byte at a time.
        let mut w = Writer::new();
        ClientMessage::Move {
            direction: Direction::Up,
        }
        .encode(&mut w)
        .unwrap();
        let bytes = w.finish();

        let feeder = tokio::spawn(async move {
            let mut a = a;
            for byte in bytes {
                a.write_all(&[byte]).await.unwrap();
                a.flush().await.unwrap();
                tokio::task::yield_now().await;
            }
            a
        });

        let got: ClientMessage = reader_b.recv().await.unwrap();
        assert_eq!(
            got,
            ClientMessage::Move {
                direction: Direction::Up
            }
        );
        feeder.await.unwrap();
    }

    #[tokio::test]
    async fn tcp_delivers_concatenated_messages_in_order() {
        let (a, b) = tcp_pair().await;
        let (mut reader_b, _writer_b) = split_stream(b).unwrap();

        // Two messages in a single write: no framing, self-delimiting.
        let mut w = Writer::new();
        ClientMessage::PlaceBomb.encode(&mut w).unwrap();
        ClientMessage::Join {
            name: "bob".into(),
        }
        .encode(&mut w)
        .unwrap();
        let mut a = a;
        a.write_all(&w.finish()).await.unwrap();

        let first: ClientMessage = reader_b.recv().await.unwrap();
        let second: ClientMessage = reader_b.recv().await.unwrap();
        assert_eq!(first, ClientMessage::PlaceBomb);
        assert_eq!(second, ClientMessage::Join { name: "bob".into() });
    }

    #[tokio::test]
    async fn tcp_eof_is_bad_read() {
        let (a, b) = tcp_pair().await;
        let (mut reader_b, _writer_b) = split_stream(b).unwrap();
        drop(a);
        let got: WireResult<ClientMessage> = reader_b.recv().await;
        assert_eq!(got.unwrap_err(), WireError::BadRead);
    }

    #[tokio::test]
    async fn udp_skips_malformed_then_accepts_next() {
        let receiver = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let recv_addr = receiver.local_addr().unwrap();
        let sender = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());

        let mut transport = UdpTransport::new(receiver, sender.local_addr().unwrap());

        // Unknown discriminant, then a valid message.
        sender.send_to(&[9], recv_addr).await.unwrap();
        sender.send_to(&[0], recv_addr).await.unwrap();

        let first: WireResult<crate::gui::InputMessage> = transport.recv().await;
        assert_eq!(first.unwrap_err(), WireError::BadType(9));
        let second: crate::gui::InputMessage = transport.recv().await.unwrap();
        assert_eq!(second, crate::gui::InputMessage::PlaceBomb);
    }

    #[tokio::test]
    async fn udp_rejects_trailing_bytes() {
        let receiver = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let recv_addr = receiver.local_addr().unwrap();
        let sender = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let mut transport = UdpTransport::new(receiver, sender.local_addr().unwrap());

        // Valid PlaceBomb followed by junk in the same datagram.
        sender.send_to(&[0, 1, 2], recv_addr).await.unwrap();
        let got: WireResult<crate::gui::InputMessage> = transport.recv().await;
        assert_eq!(got.unwrap_err(), WireError::BadRead);
    }
}
