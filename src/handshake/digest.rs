//! Digest-style handshake interop.
//!
//! Flash Player 9+ peers replace part of the random payload with an
//! HMAC-SHA256 digest and expect one back. The digest block sits at one
//! of two positions (scheme 0 at offset 8, scheme 1 at offset 772); the
//! first four bytes of the block select where inside it the 32-byte
//! digest lives.

use crate::handshake::packets::HANDSHAKE_SIZE;
use crate::utils::calculate_hmac_sha256;

pub const FLASH_PLAYER_KEY: &[u8; 30] = b"Genuine Adobe Flash Player 001";
pub const MEDIA_SERVER_KEY: &[u8; 36] = b"Genuine Adobe Flash Media Server 001";

const DIGEST_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestScheme {
    Scheme0,
    Scheme1,
}

fn digest_offset(packet: &[u8], scheme: DigestScheme) -> usize {
    let base = match scheme {
        DigestScheme::Scheme0 => 8,
        DigestScheme::Scheme1 => 772,
    };
    let sum: usize = packet[base..base + 4].iter().map(|&b| b as usize).sum();
    base + 4 + (sum % 728)
}

fn packet_without_digest(packet: &[u8], offset: usize) -> Vec<u8> {
    let mut joined = Vec::with_capacity(HANDSHAKE_SIZE - DIGEST_SIZE);
    joined.extend_from_slice(&packet[..offset]);
    joined.extend_from_slice(&packet[offset + DIGEST_SIZE..]);
    joined
}

/// Check whether `packet` carries a valid digest for `key` at the
/// position `scheme` selects
pub fn verify_digest(packet: &[u8], key: &[u8], scheme: DigestScheme) -> bool {
    if packet.len() < HANDSHAKE_SIZE {
        return false;
    }
    let offset = digest_offset(packet, scheme);
    let expected = calculate_hmac_sha256(key, &packet_without_digest(packet, offset));
    expected[..] == packet[offset..offset + DIGEST_SIZE]
}

/// Detect whether a C1 packet came from a digest-style peer.
///
/// Plain peers zero the second u32 field; digest peers put their player
/// version there and sign the packet.
pub fn detect_scheme(c1: &[u8]) -> Option<DigestScheme> {
    if c1.len() < HANDSHAKE_SIZE || c1[4..8] == [0, 0, 0, 0] {
        return None;
    }
    if verify_digest(c1, FLASH_PLAYER_KEY, DigestScheme::Scheme1) {
        Some(DigestScheme::Scheme1)
    } else if verify_digest(c1, FLASH_PLAYER_KEY, DigestScheme::Scheme0) {
        Some(DigestScheme::Scheme0)
    } else {
        None
    }
}

/// Sign `packet` in place at the position `scheme` selects
pub fn install_digest(packet: &mut [u8], key: &[u8], scheme: DigestScheme) {
    let offset = digest_offset(packet, scheme);
    let digest = calculate_hmac_sha256(key, &packet_without_digest(packet, offset));
    packet[offset..offset + DIGEST_SIZE].copy_from_slice(&digest);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::packets::HandshakePacket;

    fn signed_c1(scheme: DigestScheme) -> Vec<u8> {
        let mut packet = HandshakePacket::fresh(100);
        // Digest peers advertise a player version in the second field
        packet.time2 = 0x0A_00_2D_02;
        let mut bytes = packet.encode();
        install_digest(&mut bytes, FLASH_PLAYER_KEY, scheme);
        bytes
    }

    #[test]
    fn test_install_then_verify() {
        for scheme in [DigestScheme::Scheme0, DigestScheme::Scheme1] {
            let bytes = signed_c1(scheme);
            assert!(verify_digest(&bytes, FLASH_PLAYER_KEY, scheme));
            assert_eq!(detect_scheme(&bytes), Some(scheme));
        }
    }

    #[test]
    fn test_plain_packet_not_detected() {
        let bytes = HandshakePacket::fresh(100).encode();
        assert_eq!(detect_scheme(&bytes), None);
    }

    #[test]
    fn test_wrong_key_fails_verification() {
        let bytes = signed_c1(DigestScheme::Scheme0);
        assert!(!verify_digest(&bytes, MEDIA_SERVER_KEY, DigestScheme::Scheme0));
    }

    #[test]
    fn test_tampered_payload_fails_verification() {
        let mut bytes = signed_c1(DigestScheme::Scheme1);
        bytes[HANDSHAKE_SIZE - 1] ^= 0xFF;
        assert!(!verify_digest(&bytes, FLASH_PLAYER_KEY, DigestScheme::Scheme1));
    }
}
