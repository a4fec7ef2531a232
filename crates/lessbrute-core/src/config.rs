//! 配置文件加载（TOML）
//!
//! 所有字段均可选；命令行参数优先于配置文件。
//!
//! ```toml
//! [scan]
//! output = "match.txt"
//! first = false
//! threads = "auto"      # 或具体数值
//! decode = "skip"       # skip / ignore / lossy
//! format = "text"       # text / jsonl
//! batch_size = 4096
//! ```
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::candidate::DecodePolicy;
use crate::options::{ScanOptions, DEFAULT_BATCH_SIZE};
use crate::sink::OutputFormat;

/// 未指定 `-o` 且配置文件未给出 output 时的结果文件
pub const DEFAULT_OUTPUT: &str = "match.txt";

/// 线程配置：数值或 "auto"
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ThreadsSetting {
    Count(usize),
    Named(String),
}

impl ThreadsSetting {
    /// None 表示自动；0 或无法识别的取值报错
    pub fn resolve(&self) -> Result<Option<usize>> {
        match self {
            Self::Count(0) => bail!("threads must be at least 1"),
            Self::Count(n) => Ok(Some(*n)),
            Self::Named(s) => parse_threads(s),
        }
    }
}

/// `[scan]` 段
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanSection {
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub first: Option<bool>,
    #[serde(default)]
    pub threads: Option<ThreadsSetting>,
    #[serde(default)]
    pub decode: Option<DecodePolicy>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub batch_size: Option<usize>,
}

/// 命令行给出的覆盖值；None 表示未指定，沿用配置文件
#[derive(Debug, Clone, Default)]
pub struct ScanOverrides {
    pub output: Option<PathBuf>,
    /// `--first` 为 Some(true)，`--no-first` 为 Some(false)
    pub first: Option<bool>,
    pub threads: Option<String>,
    pub decode: Option<DecodePolicy>,
    pub format: Option<OutputFormat>,
    pub batch_size: Option<usize>,
}

/// 合并后的运行参数
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub output: PathBuf,
    pub format: OutputFormat,
    pub options: ScanOptions,
}

impl ScanSection {
    /// 检查取值合法性（配置错误属于扫描前的致命错误）
    pub fn validate(&self) -> Result<()> {
        if let Some(threads) = &self.threads {
            threads.resolve().context("invalid [scan] threads")?;
        }
        if self.batch_size == Some(0) {
            bail!("invalid [scan] batch_size: must be at least 1");
        }
        Ok(())
    }

    /// 命令行参数优先，其次配置文件，最后默认值
    pub fn merge(self, cli: ScanOverrides) -> Result<RunSettings> {
        let threads = match cli.threads {
            Some(s) => parse_threads(&s).context("invalid --threads")?,
            None => match &self.threads {
                Some(t) => t.resolve().context("invalid [scan] threads")?,
                None => None,
            },
        };
        let batch_size = cli.batch_size.or(self.batch_size).unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            bail!("batch size must be at least 1");
        }

        Ok(RunSettings {
            output: cli.output.or(self.output).unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            format: cli.format.or(self.format).unwrap_or_default(),
            options: ScanOptions {
                stop_at_first: cli.first.or(self.first).unwrap_or(false),
                threads,
                decode: cli.decode.or(self.decode).unwrap_or_default(),
                batch_size,
            },
        })
    }
}

/// 顶层配置文件结构
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub scan: ScanSection,
}

impl FileConfig {
    pub fn from_toml(txt: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(txt)?;
        cfg.scan.validate()?;
        Ok(cfg)
    }
}

/// 读取并解析配置文件
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let txt = std::fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    FileConfig::from_toml(&txt).with_context(|| format!("parse config {}", path.display()))
}

/// 解析线程参数："auto" 表示自动（等于 CPU 核数）；其他为不小于 1 的数值
pub fn parse_threads(s: &str) -> Result<Option<usize>> {
    if s.eq_ignore_ascii_case("auto") { return Ok(None); }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(Some(n)),
        _ => bail!("expected \"auto\" or a thread count >= 1, got {s:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_section() {
        let cfg = FileConfig::from_toml(
            r#"
            [scan]
            output = "hits.jsonl"
            first = true
            threads = 4
            decode = "ignore"
            format = "jsonl"
            batch_size = 128
            "#,
        )
        .unwrap();
        assert_eq!(cfg.scan.output, Some(PathBuf::from("hits.jsonl")));
        assert_eq!(cfg.scan.first, Some(true));
        assert_eq!(cfg.scan.threads.as_ref().unwrap().resolve().unwrap(), Some(4));
        assert_eq!(cfg.scan.decode, Some(DecodePolicy::Ignore));
        assert_eq!(cfg.scan.format, Some(OutputFormat::Jsonl));
        assert_eq!(cfg.scan.batch_size, Some(128));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = FileConfig::from_toml("").unwrap();
        assert!(cfg.scan.output.is_none());
        assert!(cfg.scan.threads.is_none());

        let run = cfg.scan.merge(ScanOverrides::default()).unwrap();
        assert_eq!(run.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(run.format, OutputFormat::Text);
        assert!(!run.options.stop_at_first);
        assert_eq!(run.options.threads, None);
        assert_eq!(run.options.decode, DecodePolicy::Skip);
        assert_eq!(run.options.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn threads_auto() {
        let cfg = FileConfig::from_toml("[scan]\nthreads = \"auto\"\n").unwrap();
        assert_eq!(cfg.scan.threads, Some(ThreadsSetting::Named("auto".into())));
        assert_eq!(cfg.scan.threads.unwrap().resolve().unwrap(), None);
        assert_eq!(parse_threads("8").unwrap(), Some(8));
        assert_eq!(parse_threads("AUTO").unwrap(), None);
    }

    #[test]
    fn rejects_bad_thread_counts() {
        assert!(FileConfig::from_toml("[scan]\nthreads = \"eight\"\n").is_err());
        assert!(FileConfig::from_toml("[scan]\nthreads = 0\n").is_err());
        assert!(FileConfig::from_toml("[scan]\nthreads = \"0\"\n").is_err());
        assert!(parse_threads("0").is_err());
        assert!(parse_threads("-2").is_err());
    }

    #[test]
    fn rejects_zero_batch_size() {
        assert!(FileConfig::from_toml("[scan]\nbatch_size = 0\n").is_err());
        let cli = ScanOverrides { batch_size: Some(0), ..ScanOverrides::default() };
        assert!(ScanSection::default().merge(cli).is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(FileConfig::from_toml("[scan]\nthread = 2\n").is_err());
    }

    #[test]
    fn command_line_overrides_file() {
        let cfg = FileConfig::from_toml(
            r#"
            [scan]
            output = "file.txt"
            first = true
            threads = 4
            decode = "ignore"
            format = "jsonl"
            batch_size = 128
            "#,
        )
        .unwrap();
        let cli = ScanOverrides {
            output: Some(PathBuf::from("cli.txt")),
            first: Some(false),
            threads: Some("1".into()),
            decode: Some(DecodePolicy::Lossy),
            format: Some(OutputFormat::Text),
            batch_size: Some(7),
        };
        let run = cfg.scan.merge(cli).unwrap();
        assert_eq!(run.output, PathBuf::from("cli.txt"));
        assert_eq!(run.format, OutputFormat::Text);
        assert!(!run.options.stop_at_first);
        assert_eq!(run.options.threads, Some(1));
        assert_eq!(run.options.decode, DecodePolicy::Lossy);
        assert_eq!(run.options.batch_size, 7);
    }

    #[test]
    fn file_values_fill_unset_flags() {
        let cfg = FileConfig::from_toml("[scan]\nfirst = true\nthreads = 3\nformat = \"jsonl\"\n").unwrap();
        let cli = ScanOverrides { output: Some(PathBuf::from("cli.txt")), ..ScanOverrides::default() };
        let run = cfg.scan.merge(cli).unwrap();
        assert_eq!(run.output, PathBuf::from("cli.txt"));
        assert_eq!(run.format, OutputFormat::Jsonl);
        assert!(run.options.stop_at_first);
        assert_eq!(run.options.threads, Some(3));
    }

    #[test]
    fn bad_thread_flag_is_an_error() {
        let cli = ScanOverrides { threads: Some("many".into()), ..ScanOverrides::default() };
        assert!(ScanSection::default().merge(cli).is_err());
    }
}
