use ring::digest::{Context, SHA256};

/// Width of every block digest in bytes
pub const DIGEST_LEN: usize = 32;

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

/// Digest over several byte slices, fed in order without separators
pub fn sha256_digest_parts(parts: &[&[u8]]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    for part in parts {
        context.update(part);
    }
    context.finish().as_ref().to_vec()
}
