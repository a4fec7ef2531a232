//! 扫描主流程与并行调度
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::candidate::{decode_candidate, read_line, DecodePolicy};
use crate::error::ScanError;
use crate::fingerprint::Fingerprint;
use crate::options::{ScanOptions, ScanOutcome, ScanStats};
use crate::sink::{MatchRecord, MatchSink};
use crate::vocabulary::Vocabulary;

/// 校验输入文件存在（扫描开始前调用）
pub fn check_input(path: &Path) -> Result<(), ScanError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ScanError::InputSourceMissing(path.to_path_buf()))
    }
}

/// 扫描前的致命错误校验，顺序固定：指纹图标个数 → 图标是否在词表中 → 字典文件是否存在。
/// 全部通过才返回目标指纹；调用方在此之后才创建结果文件。
pub fn prepare_scan(expression: &str, wordlist: &Path, vocab: &Vocabulary) -> Result<Fingerprint> {
    let target = Fingerprint::parse_target(expression, vocab)?;
    check_input(wordlist)?;
    Ok(target)
}

/// 打开字典文件并扫描
pub fn scan_path(path: &Path, target: &Fingerprint, sink: &mut dyn MatchSink, opts: &ScanOptions) -> Result<ScanStats> {
    check_input(path)?;
    let file = File::open(path).with_context(|| format!("open wordlist {}", path.display()))?;
    scan(BufReader::new(file), target, sink, opts)
}

/// 逐行扫描 `input`，指纹与 `target` 相同的候选按源顺序写入 `sink`
///
/// 稳定性保证：
/// - 无论串行还是并行，命中都严格按输入行顺序写出
/// - `stop_at_first` 时只写出第一条命中，其后不再派发任何候选
/// - 无法解码的行按 `DecodePolicy` 处理，永不终止扫描
pub fn scan<R: BufRead + Send>(input: R, target: &Fingerprint, sink: &mut dyn MatchSink, opts: &ScanOptions) -> Result<ScanStats> {
    let threads = opts.effective_threads();
    debug!(%target, threads, stop_at_first = opts.stop_at_first, "scanning");

    let stats = if threads > 1 {
        scan_parallel(input, target, sink, opts, threads)?
    } else {
        scan_serial(input, target, sink, opts)?
    };
    sink.finish()?;

    debug!(
        candidates = stats.candidates_total,
        skipped = stats.candidates_skipped,
        matches = stats.matches_written,
        outcome = ?stats.outcome,
        "scan done"
    );
    Ok(stats)
}

/// 串行路径：一次一行
fn scan_serial<R: BufRead>(mut input: R, target: &Fingerprint, sink: &mut dyn MatchSink, opts: &ScanOptions) -> Result<ScanStats> {
    let mut stats = ScanStats::default();
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        if read_line(&mut input, &mut buf).context("read wordlist")? == 0 {
            break;
        }
        line_no += 1;
        stats.candidates_total += 1;

        let candidate = match decode_candidate(&buf, opts.decode) {
            Some(c) => c,
            None => {
                stats.candidates_skipped += 1;
                debug!(line = line_no, "skip undecodable candidate");
                continue;
            }
        };
        if Fingerprint::derive(candidate.as_bytes()) == *target {
            sink.record(&MatchRecord { line: line_no, candidate: candidate.into_owned() })?;
            stats.matches_written += 1;
            if opts.stop_at_first {
                stats.outcome = ScanOutcome::StoppedEarly;
                return Ok(stats);
            }
        }
    }

    Ok(stats)
}

/// 一批连续的原始行
struct Batch {
    idx: usize,
    /// 本批第一行的行号（从 1 开始）
    first_line: usize,
    lines: Vec<Vec<u8>>,
}

/// 一批的处理结果
struct BatchResult {
    idx: usize,
    scanned: usize,
    skipped: usize,
    matches: Vec<MatchRecord>,
}

/// 并行调度：
/// - 读线程按批切分输入，经有界通道派发
/// - Rayon 线程池并行计算指纹
/// - 当前线程作为唯一 Writer，按批次 idx 重排后写出，保证稳定顺序
fn scan_parallel<R: BufRead + Send>(
    input: R,
    target: &Fingerprint,
    sink: &mut dyn MatchSink,
    opts: &ScanOptions,
    threads: usize,
) -> Result<ScanStats> {
    use crossbeam_channel as channel;
    use rayon::prelude::*;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("build rayon pool")?;

    let target = *target;
    let decode = opts.decode;
    let stop_at_first = opts.stop_at_first;
    let batch_size = opts.batch_size.max(1);
    let cancel = AtomicBool::new(false);

    let (job_tx, job_rx) = channel::bounded::<Batch>(threads * 2);
    let (res_tx, res_rx) = channel::bounded::<BatchResult>(threads * 2);

    let mut stats = ScanStats::default();

    std::thread::scope(|s| -> Result<()> {
        let cancel = &cancel;
        let pool = &pool;

        let reader = s.spawn(move || read_batches(input, batch_size, job_tx, cancel));
        s.spawn(move || {
            pool.install(|| {
                job_rx.into_iter().par_bridge().for_each(|batch| {
                    // 取消后不再处理新批次，仅排空通道
                    if cancel.load(Ordering::Relaxed) { return; }
                    let _ = res_tx.send(match_batch(batch, &target, decode, stop_at_first));
                });
            });
            // 结束后 Sender 全部被丢弃，Receiver 将收到关闭信号
        });

        // Writer 返回时 res_rx 已被丢弃；置位取消标志，让读线程与 worker 尽快退出
        let written = write_in_order(res_rx, sink, stop_at_first, &mut stats);
        cancel.store(true, Ordering::Relaxed);

        let read = reader.join().map_err(|_| anyhow!("wordlist reader panicked"))?;
        written?;
        read
    })?;

    Ok(stats)
}

/// 读线程：按 `batch_size` 行切分输入
fn read_batches<R: BufRead>(
    mut input: R,
    batch_size: usize,
    tx: crossbeam_channel::Sender<Batch>,
    cancel: &AtomicBool,
) -> Result<()> {
    let mut idx = 0usize;
    let mut next_line = 1usize;

    while !cancel.load(Ordering::Relaxed) {
        let mut lines = Vec::with_capacity(batch_size);
        while lines.len() < batch_size {
            let mut buf = Vec::new();
            if read_line(&mut input, &mut buf).context("read wordlist")? == 0 {
                break;
            }
            lines.push(buf);
        }
        if lines.is_empty() {
            break;
        }

        let eof = lines.len() < batch_size;
        let count = lines.len();
        if tx.send(Batch { idx, first_line: next_line, lines }).is_err() {
            break;
        }
        idx += 1;
        next_line += count;
        if eof {
            break;
        }
    }

    debug!(batches = idx, "wordlist reader finished");
    Ok(())
}

/// 对一批候选计算指纹；`stop_at_first` 时本批在首条命中处停止
fn match_batch(batch: Batch, target: &Fingerprint, decode: DecodePolicy, stop_at_first: bool) -> BatchResult {
    let mut res = BatchResult { idx: batch.idx, scanned: 0, skipped: 0, matches: Vec::new() };

    for (offset, raw) in batch.lines.iter().enumerate() {
        res.scanned += 1;
        let candidate = match decode_candidate(raw, decode) {
            Some(c) => c,
            None => {
                res.skipped += 1;
                continue;
            }
        };
        if Fingerprint::derive(candidate.as_bytes()) == *target {
            res.matches.push(MatchRecord { line: batch.first_line + offset, candidate: candidate.into_owned() });
            if stop_at_first {
                break;
            }
        }
    }

    res
}

/// Writer：维护 next_idx 与缓存，按序输出
fn write_in_order(
    rx: crossbeam_channel::Receiver<BatchResult>,
    sink: &mut dyn MatchSink,
    stop_at_first: bool,
    stats: &mut ScanStats,
) -> Result<()> {
    let mut next_idx = 0usize;
    let mut buffer: BTreeMap<usize, BatchResult> = BTreeMap::new();

    while let Ok(res) = rx.recv() {
        buffer.insert(res.idx, res);
        // 尝试从 next_idx 开始顺序冲刷
        while let Some(res) = buffer.remove(&next_idx) {
            stats.candidates_total += res.scanned;
            stats.candidates_skipped += res.skipped;
            for m in &res.matches {
                sink.record(m)?;
                stats.matches_written += 1;
                if stop_at_first {
                    stats.outcome = ScanOutcome::StoppedEarly;
                    return Ok(());
                }
            }
            next_idx += 1;
        }
    }

    Ok(())
}
