//! 错误类型（扫描开始前即可判定的致命错误）
use std::path::PathBuf;
use thiserror::Error;

/// 目标指纹解析 / 构造失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FingerprintError {
    /// 图标个数不是 3
    #[error("there should be 3 icons ({count} provided)")]
    InvalidFingerprintFormat { count: usize },
    /// 图标不在词表中
    #[error("invalid fingerprint icon - {0}")]
    UnknownSymbol(String),
    #[error("icon index {0} is out of range")]
    IndexOutOfRange(usize),
}

/// 扫描输入相关错误
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("the file \"{}\" does not exist", .0.display())]
    InputSourceMissing(PathBuf),
}
