//! 扫描选项与统计信息（模块）
use crate::candidate::DecodePolicy;

/// 并行路径下每批候选行数
pub const DEFAULT_BATCH_SIZE: usize = 4096;

/// 扫描选项
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// 命中第一条后停止（协作式取消）
    pub stop_at_first: bool,
    /// 线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
    /// 非法 UTF-8 行的处理策略
    pub decode: DecodePolicy,
    /// 并行路径下每批行数
    pub batch_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            stop_at_first: false,
            threads: None,
            decode: DecodePolicy::Skip,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ScanOptions {
    /// 实际使用的线程数
    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// 扫描终态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanOutcome {
    /// 输入耗尽
    #[default]
    Completed,
    /// 首条命中后提前停止
    StoppedEarly,
}

/// 扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone)]
pub struct ScanStats {
    /// 已读取的候选行数（含被跳过的行）
    pub candidates_total: usize,
    /// 因解码失败被跳过的行数
    pub candidates_skipped: usize,
    pub matches_written: usize,
    pub outcome: ScanOutcome,
}
