//! 远程管理令牌校验
//!
//! 两边都用同一把进程内随机密钥算 HMAC-SHA256，再用 `verify_slice` 做常量时间比较。

use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

static COMPARE_KEY: Lazy<[u8; 32]> = Lazy::new(rand::random);

fn tag(value: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(COMPARE_KEY.as_slice()).ok()?;
    mac.update(value.as_bytes());
    Some(mac)
}

/// 常量时间比较两个令牌
pub fn tokens_match(provided: &str, expected: &str) -> bool {
    if provided.is_empty() || expected.is_empty() {
        return false;
    }
    let (Some(provided), Some(expected)) = (tag(provided), tag(expected)) else {
        return false;
    };
    let expected = expected.finalize().into_bytes();
    provided.verify_slice(&expected).is_ok()
}

/// 是否等于任一可接受的令牌
pub fn is_accepted(provided: &str, accepted: &[String]) -> bool {
    // 不短路，每个候选都比较一次
    accepted
        .iter()
        .fold(false, |found, token| tokens_match(provided, token) | found)
}

/// 日志中代替令牌本身的短指纹
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..4])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("s3cret-token", "s3cret-token"));
        assert!(!tokens_match("s3cret-token", "s3cret-tokeN"));
        assert!(!tokens_match("short", "short-but-longer"));
        assert!(!tokens_match("", ""));
    }

    #[test]
    fn test_is_accepted_any_of() {
        let accepted = vec!["prod-token".to_string(), "sandbox-token".to_string()];
        assert!(is_accepted("sandbox-token", &accepted));
        assert!(is_accepted("prod-token", &accepted));
        assert!(!is_accepted("admin-token", &accepted));
        assert!(!is_accepted("prod-token", &[]));
    }

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
        assert_eq!(fingerprint("abc").len(), 8);
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
    }
}
