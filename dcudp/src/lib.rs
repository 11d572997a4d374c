//! A thin non-blocking UDP socket wrapper.
//!
//! Distinguishes transient (`WouldBlock`) send/receive errors, which the
//! caller drops and relies on NACK/retransmission to recover, from fatal
//! socket errors, which end the session. No framing, retries, or buffering
//! lives here; that belongs to `dcrecovery` and the binary crate's network
//! workers.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use dcbase::constants::SEND_BUFFER_SIZE;
use socket2::Socket;

/// A bound, non-blocking UDP socket with the fixed send buffer size the
/// protocol requires for bursty per-frame transmission.
#[derive(Debug)]
pub struct DcSocket {
    inner: UdpSocket,
}

impl DcSocket {
    /// Bind to `addr`, switch to non-blocking mode, and request
    /// [`SEND_BUFFER_SIZE`] bytes of send buffer from the OS. The OS is free
    /// to clamp the request; failure to honor it exactly is not fatal.
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let inner = UdpSocket::bind(addr)?;
        inner.set_nonblocking(true)?;
        let socket2 = Socket::from(inner);
        if let Err(err) = socket2.set_send_buffer_size(SEND_BUFFER_SIZE) {
            tracing::warn!(error = %err, "failed to set send buffer size");
        }
        Ok(Self {
            inner: socket2.into(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Send `buf` to `target`. A `WouldBlock` error (see [`is_transient`])
    /// means the caller should drop this datagram for the current iteration
    /// rather than retry inline.
    pub fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.inner.send_to(buf, target)
    }

    /// Receive one datagram without blocking. A `WouldBlock` error means no
    /// datagram is currently available.
    pub fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.inner.recv_from(buf)
    }
}

/// Whether `err` is the transient "nothing to do right now" condition of a
/// non-blocking socket, as opposed to a fatal I/O failure.
pub fn is_transient(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
}
