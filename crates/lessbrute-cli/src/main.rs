use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lessbrute_core::{
    load_config, prepare_scan, scan_path, DecodePolicy, FileConfig, Fingerprint, LiveReport, OutputFormat,
    ResultStore, ScanOutcome, ScanOverrides, Tee, Vocabulary,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "lessbrute", version, about = "Filter a wordlist by LessPass fingerprint")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描字典，输出指纹匹配的候选
    Scan {
        /// 字典文件路径（每行一个候选）
        wordlist: PathBuf,

        /// 目标指纹（空格分隔的 3 个图标，例如 "💴 📈 ₿"）
        fingerprint: String,

        /// 输出文件（默认 match.txt，每次运行重新创建）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 命中第一条后停止
        #[arg(short, long, overrides_with = "no_first")]
        first: bool,

        /// 扫描到输入结束（覆盖配置文件中的 first = true）
        #[arg(long, overrides_with = "first")]
        no_first: bool,

        /// 线程数（"auto"=CPU 核心数，1 为串行）
        #[arg(long)]
        threads: Option<String>,

        /// 非法 UTF-8 行处理：skip / ignore / lossy
        #[arg(long)]
        decode: Option<DecodePolicy>,

        /// 输出格式：text / jsonl
        #[arg(long)]
        format: Option<OutputFormat>,

        /// 并行扫描时每批行数
        #[arg(long)]
        batch_size: Option<usize>,

        /// 配置文件路径（TOML）
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// 列出全部可用图标
    Icons,
    /// 计算单个候选的指纹
    Fingerprint {
        candidate: String,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();
    let vocab = Vocabulary::lesspass();

    match cli.command {
        Commands::Icons => {
            println!("{}", vocab.render("/"));
        }
        Commands::Fingerprint { candidate } => {
            let fp = Fingerprint::derive(candidate.as_bytes());
            println!("{} {}", fp.render(&vocab), fp);
        }
        Commands::Scan {
            wordlist,
            fingerprint,
            output,
            first,
            no_first,
            threads,
            decode,
            format,
            batch_size,
            config,
        } => {
            let start = Instant::now();

            // 致命错误在扫描开始前全部校验：指纹格式 → 图标 → 字典文件 → 配置
            let target = prepare_scan(&fingerprint, &wordlist, &vocab).context("invalid scan input")?;
            let file_cfg = match &config {
                Some(path) => load_config(path)?,
                None => FileConfig::default(),
            };
            let overrides = ScanOverrides {
                output,
                first: first_flag(first, no_first),
                threads,
                decode,
                format,
                batch_size,
            };
            let run = file_cfg.scan.merge(overrides)?;
            let (output, format, opts) = (run.output, run.format, run.options);

            info!(?wordlist, ?output, "searching for fingerprint: {}", fingerprint.trim());

            let store = ResultStore::create(&output, format)?;
            let live = LiveReport::new(std::io::stdout().lock());
            let mut sink = Tee::new(live, store);
            let stats = scan_path(&wordlist, &target, &mut sink, &opts).context("scan failed")?;

            info!(
                candidates = stats.candidates_total,
                skipped = stats.candidates_skipped,
                matches = stats.matches_written,
                stopped_early = stats.outcome == ScanOutcome::StoppedEarly,
                "processing time: {:.2} seconds",
                start.elapsed().as_secs_f64()
            );
        }
    }

    Ok(())
}

/// `--first` / `--no-first` 映射为可选覆盖值；都未给出时沿用配置文件
fn first_flag(first: bool, no_first: bool) -> Option<bool> {
    match (first, no_first) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 日志写 stderr，stdout 只输出命中结果
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_scan(args: &[&str]) -> Option<bool> {
        let mut argv = vec!["lessbrute", "scan", "words.txt", "💴 📈 ₿"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Scan { first, no_first, .. } => first_flag(first, no_first),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn first_flags_map_to_overrides() {
        assert_eq!(parse_scan(&[]), None);
        assert_eq!(parse_scan(&["-f"]), Some(true));
        assert_eq!(parse_scan(&["--no-first"]), Some(false));
        // 后出现的参数生效
        assert_eq!(parse_scan(&["--first", "--no-first"]), Some(false));
        assert_eq!(parse_scan(&["--no-first", "--first"]), Some(true));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
