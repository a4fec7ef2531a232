//! 指纹编解码
//!
//! 派生规则（与 LessPass 主密码指纹一致）：
//! - 以候选字节串为密钥、空消息计算 HMAC-SHA256；
//! - 摘要的十六进制表示中取前 18 个字符，按 6 个字符一段切成 3 段；
//! - 每段按 16 进制解析后对 46 取模，得到图标编号。
//!
//! 2^24 不是 46 的整数倍，取模存在轻微偏差；为兼容既有指纹，保持原样。
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::fmt;

use crate::error::FingerprintError;
use crate::vocabulary::{Vocabulary, VOCABULARY_SIZE};

type HmacSha256 = Hmac<Sha256>;

/// 每个指纹包含的图标数
pub const FINGERPRINT_LEN: usize = 3;
/// 每个图标消耗的十六进制字符数
const SLICE_HEX_CHARS: usize = 6;
const SLICE_BYTES: usize = SLICE_HEX_CHARS / 2;

/// 三个图标编号组成的有序指纹，逐位比较；序列化为编号数组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// 由图标编号构造；编号必须落在词表范围内
    pub fn new(indices: [usize; FINGERPRINT_LEN]) -> Result<Self, FingerprintError> {
        let mut out = [0u8; FINGERPRINT_LEN];
        for (slot, &idx) in out.iter_mut().zip(indices.iter()) {
            if idx >= VOCABULARY_SIZE {
                return Err(FingerprintError::IndexOutOfRange(idx));
            }
            *slot = idx as u8;
        }
        Ok(Self(out))
    }

    /// 由候选字节串派生指纹（纯函数）
    pub fn derive(candidate: &[u8]) -> Self {
        let digest = digest(candidate);
        let mut out = [0u8; FINGERPRINT_LEN];
        for (i, chunk) in digest.chunks_exact(SLICE_BYTES).take(FINGERPRINT_LEN).enumerate() {
            // 3 字节即 6 个十六进制字符
            let value = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
            out[i] = (value % VOCABULARY_SIZE as u32) as u8;
        }
        Self(out)
    }

    /// 解析人工输入的目标指纹（空白分隔的 3 个图标）
    pub fn parse_target(expression: &str, vocab: &Vocabulary) -> Result<Self, FingerprintError> {
        let tokens: Vec<&str> = expression.split_whitespace().collect();
        if tokens.len() != FINGERPRINT_LEN {
            return Err(FingerprintError::InvalidFingerprintFormat { count: tokens.len() });
        }
        let mut indices = [0usize; FINGERPRINT_LEN];
        for (slot, token) in indices.iter_mut().zip(tokens) {
            *slot = vocab
                .index_of(token)
                .ok_or_else(|| FingerprintError::UnknownSymbol(token.to_string()))?;
        }
        Self::new(indices)
    }

    pub fn indices(&self) -> [usize; FINGERPRINT_LEN] {
        self.0.map(usize::from)
    }

    /// 以空格拼接图标，可被 `parse_target` 还原
    pub fn render(&self, vocab: &Vocabulary) -> String {
        self.0
            .iter()
            .filter_map(|&i| vocab.symbol(usize::from(i)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "({a}, {b}, {c})")
    }
}

/// HMAC-SHA256（候选为密钥，消息为空）
///
/// HMAC 接受任意长度的密钥：超过分组长度（64 字节）的密钥先做一次 SHA-256，
/// 因此 `new_from_slice` 对任何候选都不会失败。
fn digest(candidate: &[u8]) -> [u8; 32] {
    let mac = HmacSha256::new_from_slice(candidate)
        .unwrap_or_else(|_| unreachable!("HMAC key length is unrestricted"));
    let bytes = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    out
}

/// 摘要的小写十六进制表示
pub fn digest_hex(candidate: &[u8]) -> String {
    hex::encode(digest(candidate))
}
