//! 命中记录与输出端（结果文件 + 实时输出）
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// 单条命中（对应结果文件中的一行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// 在输入中的行号（从 1 开始）
    pub line: usize,
    pub candidate: String,
}

/// 结果文件格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// 每行一个候选（与原工具的 match.txt 一致）
    #[default]
    Text,
    /// 每行一个 JSON 对象：{"line":..,"candidate":..}
    Jsonl,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "jsonl" => Ok(Self::Jsonl),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// 命中接收端。扫描引擎按源顺序逐条调用 `record`，结束时调用 `finish`。
pub trait MatchSink {
    fn record(&mut self, m: &MatchRecord) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl MatchSink for Vec<MatchRecord> {
    fn record(&mut self, m: &MatchRecord) -> Result<()> {
        self.push(m.clone());
        Ok(())
    }
}

fn write_record(out: &mut dyn Write, m: &MatchRecord, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", m.candidate)?,
        OutputFormat::Jsonl => {
            serde_json::to_writer(&mut *out, m)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// 结果文件：每次运行重新创建（截断），之后按命中顺序追加
pub struct ResultStore<W: Write = BufWriter<File>> {
    out: W,
    format: OutputFormat,
}

impl ResultStore<BufWriter<File>> {
    /// 创建（或截断）结果文件
    pub fn create(path: &Path, format: OutputFormat) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("create output file {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file), format))
    }
}

impl<W: Write> ResultStore<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MatchSink for ResultStore<W> {
    fn record(&mut self, m: &MatchRecord) -> Result<()> {
        write_record(&mut self.out, m, self.format).context("write result store")
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().context("flush result store")
    }
}

/// 实时输出：每条命中立即写出并 flush
pub struct LiveReport<W: Write> {
    out: W,
}

impl<W: Write> LiveReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> MatchSink for LiveReport<W> {
    fn record(&mut self, m: &MatchRecord) -> Result<()> {
        writeln!(self.out, "{}", m.candidate)?;
        self.out.flush()?;
        Ok(())
    }
}

/// 依次转发给两个接收端（先实时输出，再结果文件），两端顺序一致
pub struct Tee<A, B> {
    pub first: A,
    pub second: B,
}

impl<A: MatchSink, B: MatchSink> Tee<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: MatchSink, B: MatchSink> MatchSink for Tee<A, B> {
    fn record(&mut self, m: &MatchRecord) -> Result<()> {
        self.first.record(m)?;
        self.second.record(m)
    }

    fn finish(&mut self) -> Result<()> {
        let a = self.first.finish();
        let b = self.second.finish();
        a.and(b)
    }
}
