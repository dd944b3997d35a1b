mod digest;
mod packets;
mod state;

pub use digest::{
    detect_scheme, install_digest, verify_digest, DigestScheme, FLASH_PLAYER_KEY,
    MEDIA_SERVER_KEY,
};
pub use packets::{HandshakePacket, HANDSHAKE_SIZE, RANDOM_SIZE, RTMP_VERSION};
pub use state::{HandshakeEvent, HandshakeState};

use crate::utils::current_timestamp;
use crate::{Error, Result};
use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Run the client side of the handshake.
///
/// Sends C0+C1, reads S0+S1+S2, answers with C2. Returns the epoch
/// timestamp all relative chunk timestamps are measured against.
pub async fn initiate<S>(stream: &mut S) -> Result<u32>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut state = HandshakeState::new();
    let epoch = current_timestamp();
    let c1 = HandshakePacket::fresh(epoch);

    stream.write_all(&[RTMP_VERSION]).await?;
    stream.write_all(&c1.encode()).await?;
    stream.flush().await?;
    state.transition(HandshakeEvent::SentVersion)?;

    let mut version = [0u8; 1];
    stream.read_exact(&mut version).await?;
    if version[0] != RTMP_VERSION {
        state.transition(HandshakeEvent::Error).ok();
        return Err(Error::handshake(format!(
            "Unsupported RTMP version from peer: {}",
            version[0]
        )));
    }

    let mut buf = [0u8; HANDSHAKE_SIZE];
    stream.read_exact(&mut buf).await?;
    let s1 = HandshakePacket::parse(&buf)?;

    stream.write_all(&s1.echo().encode()).await?;
    stream.flush().await?;
    state.transition(HandshakeEvent::SentAck)?;

    stream.read_exact(&mut buf).await?;
    let s2 = HandshakePacket::parse(&buf)?;
    if !c1.matches_echo(&s2) {
        // Plenty of servers echo loosely; proceed anyway
        warn!("S2 does not echo C1, continuing");
    }
    state.transition(HandshakeEvent::PeerAckValidated)?;

    debug!("Handshake complete as initiator, epoch={}", epoch);
    Ok(epoch)
}

/// Run the server side of the handshake.
///
/// Reads C0+C1, sends S0+S1+S2 (signing S1 when the peer used a
/// digest-style C1), validates the C2 echo. Returns the epoch timestamp.
pub async fn respond<S>(stream: &mut S) -> Result<u32>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut state = HandshakeState::new();

    let mut version = [0u8; 1];
    stream.read_exact(&mut version).await?;
    if version[0] != RTMP_VERSION {
        state.transition(HandshakeEvent::Error).ok();
        return Err(Error::handshake(format!(
            "Unsupported RTMP version from peer: {}",
            version[0]
        )));
    }

    let mut buf = [0u8; HANDSHAKE_SIZE];
    stream.read_exact(&mut buf).await?;
    let c1 = HandshakePacket::parse(&buf)?;
    let scheme = detect_scheme(&buf);

    let epoch = current_timestamp();
    let s1 = HandshakePacket::fresh(epoch);
    let mut s1_bytes = s1.encode();
    if let Some(scheme) = scheme {
        debug!("Digest-style peer detected, scheme {:?}", scheme);
        install_digest(&mut s1_bytes, MEDIA_SERVER_KEY, scheme);
    }

    stream.write_all(&[RTMP_VERSION]).await?;
    stream.write_all(&s1_bytes).await?;
    stream.write_all(&c1.echo().encode()).await?;
    stream.flush().await?;
    state.transition(HandshakeEvent::SentVersion)?;

    stream.read_exact(&mut buf).await?;
    let c2 = HandshakePacket::parse(&buf)?;
    // Digest peers do not echo S1 verbatim, so only hold plain peers
    // to a strict echo
    if scheme.is_none() && !s1.matches_echo(&c2) {
        state.transition(HandshakeEvent::Error).ok();
        return Err(Error::handshake("C2 does not echo S1"));
    }
    state.transition(HandshakeEvent::PeerAckValidated)?;

    debug!("Handshake complete as responder, epoch={}", epoch);
    Ok(epoch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_both_roles_complete_against_each_other() {
        let (mut client, mut server) = tokio::io::duplex(8192);
        let (initiated, responded) =
            tokio::join!(initiate(&mut client), respond(&mut server));
        initiated.unwrap();
        responded.unwrap();
    }

    #[tokio::test]
    async fn test_initiator_rejects_bad_version() {
        let (mut client, mut server) = tokio::io::duplex(8192);

        let fake_server = tokio::spawn(async move {
            let mut sink = vec![0u8; 1 + HANDSHAKE_SIZE];
            server.read_exact(&mut sink).await.unwrap();
            server.write_all(&[6]).await.unwrap();
            let s1 = HandshakePacket::fresh(0).encode();
            server.write_all(&s1).await.unwrap();
            server.write_all(&s1).await.unwrap();
        });

        assert!(initiate(&mut client).await.is_err());
        fake_server.await.unwrap();
    }

    #[tokio::test]
    async fn test_responder_rejects_bad_echo() {
        let (mut client, mut server) = tokio::io::duplex(8192);

        let fake_client = tokio::spawn(async move {
            client.write_all(&[RTMP_VERSION]).await.unwrap();
            client
                .write_all(&HandshakePacket::fresh(5).encode())
                .await
                .unwrap();
            let mut sink = vec![0u8; 1 + HANDSHAKE_SIZE * 2];
            client.read_exact(&mut sink).await.unwrap();
            // Send a fresh packet instead of echoing S1
            client
                .write_all(&HandshakePacket::fresh(9).encode())
                .await
                .unwrap();
        });

        assert!(respond(&mut server).await.is_err());
        fake_client.await.unwrap();
    }
}
