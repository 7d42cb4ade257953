use sha2::{Digest, Sha256};

/// 计算内容的 SHA-256（小写十六进制）
pub fn compute_sha256(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
