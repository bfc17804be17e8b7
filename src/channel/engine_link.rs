//! Byte transport between the bridge and the engine.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use log::{debug, info};

use crate::bridge_errors::{BridgeError, BridgeResult};

/// Receive buffer size used by both ends of the protocol.
pub const MESSAGE_BUFFER_SIZE: usize = 1024;

/// A connected, bidirectional byte channel.
pub trait EngineLink {
    /// Write all of `bytes`.
    fn send(&mut self, bytes: &[u8]) -> BridgeResult<()>;

    /// Block until at least one byte arrives, returning at most `max_bytes`.
    ///
    /// `timeout: None` waits forever. Expiry is `BridgeError::Timeout`; a
    /// closed peer is `BridgeError::ConnectionClosed`.
    fn receive(&mut self, max_bytes: usize, timeout: Option<Duration>) -> BridgeResult<Vec<u8>>;

    /// Shut the connection down. Closing twice is not an error.
    fn close(&mut self) -> BridgeResult<()>;
}

/// `EngineLink` over a blocking TCP stream.
#[derive(Debug)]
pub struct TcpEngineLink {
    stream: TcpStream,
}

impl TcpEngineLink {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    /// Engine side: dial the bridge.
    pub fn connect(address: &str, port: u16) -> BridgeResult<Self> {
        let stream = TcpStream::connect((address, port))?;
        stream.set_nodelay(true)?;
        info!("connected to bridge at {address}:{port}");
        Ok(Self::new(stream))
    }
}

impl EngineLink for TcpEngineLink {
    fn send(&mut self, bytes: &[u8]) -> BridgeResult<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        Ok(())
    }

    fn receive(&mut self, max_bytes: usize, timeout: Option<Duration>) -> BridgeResult<Vec<u8>> {
        // A zero read timeout is rejected by the OS; treat it as the smallest wait.
        let timeout = timeout.map(|t| t.max(Duration::from_millis(1)));
        self.stream.set_read_timeout(timeout)?;

        let mut buffer = vec![0u8; max_bytes.max(1)];
        match self.stream.read(&mut buffer) {
            Ok(0) => Err(BridgeError::ConnectionClosed),
            Ok(n) => {
                buffer.truncate(n);
                Ok(buffer)
            }
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Err(BridgeError::Timeout {
                    waiting_for: "engine data",
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn close(&mut self) -> BridgeResult<()> {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Listening endpoint the engine connects to. One connection per session.
#[derive(Debug)]
pub struct EngineListener {
    listener: TcpListener,
}

impl EngineListener {
    /// Port 0 picks a free port; see `local_addr`.
    pub fn bind(address: &str, port: u16) -> BridgeResult<Self> {
        let listener = TcpListener::bind((address, port))?;
        info!("listening for engine on {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> BridgeResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Block until the engine connects.
    pub fn accept(&self) -> BridgeResult<TcpEngineLink> {
        let (stream, peer) = self.listener.accept()?;
        stream.set_nodelay(true)?;
        info!("engine connected from {peer}");
        Ok(TcpEngineLink::new(stream))
    }

    /// Dropping the listener closes the socket; this only makes it explicit.
    pub fn close(self) {
        debug!("closing engine listener");
        drop(self.listener);
    }
}
