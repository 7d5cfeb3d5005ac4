//! Outbound connection to one peer.

use crate::error::{NodeError, Result};
use crate::message::{GossipMessage, Request, Response, Version};
use crate::transport::{read_frame, write_frame};
use blocker_core::{Block, Transaction};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;

/// A TCP connection carrying one request at a time.
#[derive(Debug)]
pub struct PeerClient {
    addr: String,
    stream: Mutex<TcpStream>,
    rpc_timeout: Duration,
}

impl PeerClient {
    pub async fn connect(addr: &str, dial_timeout: Duration, rpc_timeout: Duration) -> Result<Self> {
        let stream = timeout(dial_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| NodeError::Timeout(dial_timeout))??;
        stream.set_nodelay(true)?;
        Ok(Self {
            addr: addr.to_string(),
            stream: Mutex::new(stream),
            rpc_timeout,
        })
    }

    /// The address this client dialed.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn call(&self, request: &Request) -> Result<Response> {
        let mut stream = self.stream.lock().await;
        let exchange = async {
            write_frame(&mut *stream, request).await?;
            read_frame::<_, Response>(&mut *stream)
                .await?
                .ok_or(NodeError::ConnectionClosed)
        };
        timeout(self.rpc_timeout, exchange)
            .await
            .map_err(|_| NodeError::Timeout(self.rpc_timeout))?
    }

    async fn call_ack(&self, request: Request) -> Result<()> {
        let name = request.name();
        match self.call(&request).await? {
            Response::Ack => Ok(()),
            Response::Error(e) => Err(NodeError::Remote(e)),
            Response::Version(_) => Err(NodeError::UnexpectedResponse(name)),
        }
    }

    pub async fn handshake(&self, local: Version) -> Result<Version> {
        match self.call(&Request::Handshake(local)).await? {
            Response::Version(remote) => Ok(remote),
            Response::Error(e) => Err(NodeError::Remote(e)),
            Response::Ack => Err(NodeError::UnexpectedResponse("handshake")),
        }
    }

    pub async fn handle_transaction(&self, tx: Transaction) -> Result<()> {
        self.call_ack(Request::HandleTransaction(tx)).await
    }

    pub async fn handle_block(&self, block: Block) -> Result<()> {
        self.call_ack(Request::HandleBlock(block)).await
    }

    pub async fn send(&self, msg: GossipMessage) -> Result<()> {
        self.call_ack(msg.into()).await
    }
}
