use rand::{Rng, rng};
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;

/// Fill the random portion of a handshake packet
pub fn generate_random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rng().fill_bytes(&mut bytes);
    bytes
}

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 over data, used to recognize digest-format handshake peers
pub fn calculate_hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key)
        .expect("HMAC can take key of any size");
    mac.update(data);

    let result = mac.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result.into_bytes());
    output
}
