//! LessPass 指纹字典匹配核心库
//!
//! 设计要点：
//! - 候选口令以 HMAC-SHA256（口令为密钥、消息为空）派生 3 图标指纹，与目标指纹逐位比较。
//! - 词表、目标指纹均为显式构造的不可变值，按引用传入扫描流程，无全局状态。
//! - 按行以字节读取字典，非法 UTF-8 行按 `DecodePolicy` 处理，永不终止扫描。
//! - 并行扫描时由单一 Writer 按输入顺序写出命中；“命中即停”为协作式取消。

mod candidate;
mod config;
mod error;
mod fingerprint;
mod options;
mod scan;
mod sink;
mod vocabulary;

pub use candidate::{decode_candidate, DecodePolicy};
pub use config::{
    load_config, parse_threads, FileConfig, RunSettings, ScanOverrides, ScanSection, ThreadsSetting, DEFAULT_OUTPUT,
};
pub use error::{FingerprintError, ScanError};
pub use fingerprint::{digest_hex, Fingerprint, FINGERPRINT_LEN};
pub use options::{ScanOptions, ScanOutcome, ScanStats, DEFAULT_BATCH_SIZE};
pub use scan::{check_input, prepare_scan, scan, scan_path};
pub use sink::{LiveReport, MatchRecord, MatchSink, OutputFormat, ResultStore, Tee};
pub use vocabulary::{Vocabulary, VOCABULARY_SIZE};
