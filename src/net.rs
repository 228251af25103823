//! The TCP accept loop and per-connection packet pump. Grounded on
//! `valence_network`'s `do_accept_loop`/per-connection task split in
//! `crates/valence_network/src/connect.rs`: one task accepts connections and
//! hands each off to its own task, which owns that connection's read/write
//! halves for its lifetime.
//!
//! [`Frame`] itself only knows synchronous `Read`/`Write`; the header and
//! payload are read here directly off the async socket instead of bridging
//! through a blocking adapter, keeping the connection task fully
//! non-blocking.

use std::sync::Arc;

use dashmap::DashMap;
use thornmere_protocol::{frame::MAX_PAYLOAD_LEN, ClientMessage, Envelope, PacketType, ServerMessage, SessionKeys};
use thornmere_server::auth::AuthProvider;
use thornmere_server::gameloop::InboundPacket;
use thornmere_server::ids::{CharacterId, SessionId};
use thornmere_server::session::Session;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

pub type SessionRegistry = Arc<DashMap<SessionId, Session>>;

pub async fn accept_loop(
    addr: std::net::SocketAddr,
    auth: Arc<dyn AuthProvider>,
    inbound: mpsc::UnboundedSender<InboundPacket>,
    sequence_window: u32,
    nonce_expiry_ms: u64,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    let sessions: SessionRegistry = Arc::new(DashMap::new());
    debug!(%addr, "listening for connections");

    loop {
        let (socket, peer) = listener.accept().await?;
        let auth = auth.clone();
        let inbound = inbound.clone();
        let sessions = sessions.clone();
        tokio::spawn(async move {
            if let Err(err) =
                handle_connection(socket, auth, inbound, sessions, sequence_window, nonce_expiry_ms).await
            {
                warn!(%peer, error = %err, "connection closed with error");
            }
        });
    }
}

async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> anyhow::Result<(PacketType, u32, Vec<u8>)> {
    let len = reader.read_u16().await? as usize;
    let packet_type = reader.read_u16().await?;
    let sequence = reader.read_u32().await?;
    if len > MAX_PAYLOAD_LEN {
        anyhow::bail!("frame payload exceeds maximum length");
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok((PacketType(packet_type), sequence, payload))
}

async fn write_frame<W: tokio::io::AsyncWrite + Unpin>(
    writer: &mut W,
    packet_type: PacketType,
    sequence: u32,
    payload: &[u8],
) -> anyhow::Result<()> {
    if payload.len() > u16::MAX as usize {
        anyhow::bail!("outbound payload too large to frame");
    }
    writer.write_u16(payload.len() as u16).await?;
    writer.write_u16(packet_type.0).await?;
    writer.write_u32(sequence).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

async fn write_message<W: tokio::io::AsyncWrite + Unpin>(writer: &mut W, message: &ServerMessage) -> anyhow::Result<()> {
    let payload = serde_json::to_vec(message)?;
    write_frame(writer, PacketType::AUTH_RESPONSE, 0, &payload).await
}

async fn handle_connection(
    socket: TcpStream,
    auth: Arc<dyn AuthProvider>,
    inbound: mpsc::UnboundedSender<InboundPacket>,
    sessions: SessionRegistry,
    sequence_window: u32,
    nonce_expiry_ms: u64,
) -> anyhow::Result<()> {
    let (read_half, write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let mut writer = BufWriter::new(write_half);

    let (_, _, payload) = read_frame(&mut reader).await?;
    let ClientMessage::Auth(request) = serde_json::from_slice::<ClientMessage>(&payload)? else {
        anyhow::bail!("first packet on a connection must be Auth");
    };

    let authenticated = auth.authenticate(&request.access_token, &request.access_token).await;
    let identity = match authenticated {
        Ok(identity) => identity,
        Err(err) => {
            write_message(
                &mut writer,
                &ServerMessage::AuthResponse(thornmere_protocol::AuthResponse {
                    ok: false,
                    session_id: None,
                    error: Some(err.to_string()),
                }),
            )
            .await?;
            return Ok(());
        }
    };
    debug!(account = %identity.account_id, "authenticated");

    let keys = SessionKeys::generate();
    let character = request.character_id.map(CharacterId).unwrap_or_else(CharacterId::new);
    let now = thornmere_server::tick::now_ms();
    let session = Session::new(character, keys.clone(), now, sequence_window, nonce_expiry_ms);
    let session_id = session.id;
    sessions.insert(session_id, session);

    write_message(
        &mut writer,
        &ServerMessage::AuthResponse(thornmere_protocol::AuthResponse {
            ok: true,
            session_id: Some(session_id.0),
            error: None,
        }),
    )
    .await?;
    write_message(
        &mut writer,
        &ServerMessage::SessionEstablished {
            session_id: session_id.0,
            expires_at_ms: now + 3_600_000,
        },
    )
    .await?;

    loop {
        let (packet_type, _sequence, payload) = match read_frame(&mut reader).await {
            Ok(frame) => frame,
            Err(_) => break,
        };

        if packet_type == PacketType::PING {
            write_message(
                &mut writer,
                &ServerMessage::Pong {
                    server_time_ms: thornmere_server::tick::now_ms(),
                },
            )
            .await?;
            continue;
        }

        let Ok(envelope) = serde_json::from_slice::<Envelope>(&payload) else {
            continue;
        };

        let plaintext = {
            let Some(mut session_ref) = sessions.get_mut(&session_id) else {
                break;
            };
            let now = thornmere_server::tick::now_ms();
            if session_ref.validate_envelope(&envelope, now, 30_000, 5_000).is_err() {
                continue;
            }
            let Ok(plaintext) = envelope.open(&session_ref.keys) else {
                continue;
            };
            plaintext
        };

        if inbound.send(InboundPacket { character, payload: plaintext }).is_err() {
            error!("game loop inbound channel closed, dropping connection");
            break;
        }
    }

    sessions.remove(&session_id);
    Ok(())
}
