use rand::RngCore;

/// 32 random bytes, hex encoded. Used for one-shot magic links.
pub fn generate_magic_token() -> String {
    let mut buf = [0u8; 32];
    rand::rng().fill_bytes(&mut buf);
    hex::encode(buf)
}
