use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use iroh::endpoint::{Connection, Endpoint, RecvStream, SendStream};
use iroh::EndpointId;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::error::TransportError;
use crate::sim::Role;

const ALPN: &[u8] = b"goliath-proto";

/// Sent by the host as the first frame; the guest refuses anything else.
pub const PROTOCOL_TAG: &str = "goliath/1";

/// Upper bound on a single frame's payload.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Frames waiting for the writer. Once full, new sends are dropped, so a stalled
/// peer never builds up a backlog of stale snapshots.
pub const OUTBOUND_QUEUE: usize = 8;

/// The ordered byte-message pipe the session talks through.
pub trait Transport {
    /// Polled before every send.
    fn is_open(&self) -> bool;

    /// Queues `msg` for the peer. Silently dropped when the channel is not open.
    fn send(&self, msg: String);
}

/// What the link reports back to the frame loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    Message(String),
    Closed,
}

/// Cheap handle onto the iroh-backed link. Sends go to a writer task.
#[derive(Debug, Clone)]
pub struct PeerChannel {
    outbound: mpsc::Sender<String>,
    open: Arc<AtomicBool>,
}

impl Transport for PeerChannel {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn send(&self, msg: String) {
        if !self.is_open() {
            return;
        }
        if let Err(mpsc::error::TrySendError::Full(_)) = self.outbound.try_send(msg) {
            trace!("outbound queue full, frame dropped");
        }
    }
}

/// Writes one length-prefixed frame.
pub async fn write_frame<W>(w: &mut W, text: &str) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = text.as_bytes();
    if bytes.len() > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge(bytes.len()));
    }
    w.write_u32(bytes.len() as u32).await?;
    w.write_all(bytes).await?;
    w.flush().await?;
    Ok(())
}

/// Reads one length-prefixed frame. `Ok(None)` means the peer finished the stream
/// cleanly between frames.
pub async fn read_frame<R>(r: &mut R) -> Result<Option<String>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let len = match r.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if len > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge(len));
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).await?;
    Ok(Some(String::from_utf8(buf)?))
}

pub struct Bound;

pub struct Connected {
    conn: Connection,
    send: SendStream,
    recv: RecvStream,
}

pub struct NetworkManager<S> {
    endpoint: Endpoint,
    local_endpoint_id: EndpointId,
    state: S,
}

impl<S> NetworkManager<S> {
    /// Our own endpoint id. This is what the host hands to the guest out of band.
    pub fn local_id(&self) -> EndpointId {
        self.local_endpoint_id
    }
}

impl NetworkManager<Bound> {
    pub async fn bind() -> Result<Self> {
        let endpoint = Endpoint::builder()
            .alpns(vec![ALPN.to_vec()])
            .bind()
            .await?;
        let local_endpoint_id = endpoint.id();
        info!(endpoint = %local_endpoint_id, "endpoint bound");
        Ok(Self {
            endpoint,
            local_endpoint_id,
            state: Bound,
        })
    }

    /// Host: waits for the guest to dial in. Guest: dials `peer`.
    pub async fn establish(self, role: Role, peer: Option<EndpointId>) -> Result<NetworkManager<Connected>> {
        let conn = match role {
            Role::Host => {
                info!("waiting for a guest to connect");
                let incoming = self.endpoint.accept().await.ok_or_else(|| anyhow!("endpoint closed"))?;
                incoming.accept()?.await?
            }
            Role::Guest => {
                let peer = peer.ok_or_else(|| anyhow!("missing host endpoint id"))?;
                info!(host = %peer, "connecting to host");
                self.endpoint.connect(peer, ALPN).await?
            }
        };
        info!(remote = %conn.remote_id(), "peer connected");

        // Host opens, guest accepts. The stream only becomes visible to the guest
        // once the host writes, which the handshake does straight away.
        let (send, recv) = match role {
            Role::Host => conn.open_bi().await?,
            Role::Guest => conn.accept_bi().await?,
        };

        Ok(NetworkManager {
            endpoint: self.endpoint,
            local_endpoint_id: self.local_endpoint_id,
            state: Connected { conn, send, recv },
        })
    }
}

impl NetworkManager<Connected> {
    pub fn remote_id(&self) -> EndpointId {
        self.state.conn.remote_id()
    }

    pub async fn handshake(mut self, role: Role) -> Result<Self> {
        match role {
            Role::Host => {
                write_frame(&mut self.state.send, PROTOCOL_TAG).await?;
                debug!("handshake sent");
            }
            Role::Guest => {
                let tag = read_frame(&mut self.state.recv)
                    .await?
                    .ok_or_else(|| anyhow!("host closed the stream during handshake"))?;
                if tag != PROTOCOL_TAG {
                    return Err(TransportError::ProtocolMismatch(tag).into());
                }
                debug!("handshake verified");
            }
        }
        Ok(self)
    }

    /// Shuttles frames until either direction fails or the peer finishes.
    async fn pump(
        mut self,
        mut outbound: mpsc::Receiver<String>,
        events: &mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<(), TransportError> {
        let Connected { conn, send, recv } = &mut self.state;

        let reader = async {
            while let Some(text) = read_frame(&mut *recv).await? {
                if events.send(TransportEvent::Message(text)).is_err() {
                    break;
                }
            }
            Ok::<_, TransportError>(())
        };
        let writer = async {
            while let Some(text) = outbound.recv().await {
                write_frame(&mut *send, &text).await?;
            }
            Ok::<_, TransportError>(())
        };

        let result = tokio::select! {
            r = reader => r,
            w = writer => w,
        };
        conn.close(0u32.into(), b"bye");
        self.endpoint.close().await;
        result
    }
}

/// Starts the link in the background and hands back the channel the session
/// sends through, plus the stream of link events. The channel reports closed
/// until the handshake completes.
pub fn spawn_link(
    net: NetworkManager<Bound>,
    role: Role,
    peer: Option<EndpointId>,
) -> (PeerChannel, mpsc::UnboundedReceiver<TransportEvent>) {
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let open = Arc::new(AtomicBool::new(false));

    let channel = PeerChannel {
        outbound: outbound_tx,
        open: open.clone(),
    };

    tokio::spawn(async move {
        let link = async {
            let net = net.establish(role, peer).await?.handshake(role).await?;
            info!(remote = %net.remote_id(), "channel open");
            open.store(true, Ordering::Release);
            let _ = event_tx.send(TransportEvent::Open);
            net.pump(outbound_rx, &event_tx).await?;
            Ok::<_, anyhow::Error>(())
        };
        match link.await {
            Ok(()) => info!("peer link closed"),
            Err(e) => warn!(error = %e, "peer link failed"),
        }
        open.store(false, Ordering::Release);
        let _ = event_tx.send(TransportEvent::Closed);
    });

    (channel, event_rx)
}
