//! 候选行解码（字节 → 文本）
use serde::Deserialize;
use std::borrow::Cow;
use std::io::{self, BufRead};

/// 非法 UTF-8 行的处理策略
/// - Skip：整行跳过（计入 skipped），不终止扫描
/// - Ignore：丢弃非法字节序列，保留其余字符
/// - Lossy：非法序列替换为 U+FFFD
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    #[default]
    Skip,
    Ignore,
    Lossy,
}

impl std::str::FromStr for DecodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "ignore" => Ok(Self::Ignore),
            "lossy" => Ok(Self::Lossy),
            other => Err(format!("unknown decode policy: {other}")),
        }
    }
}

/// 解码单行候选：先去掉行尾换行与空白，再按策略处理非法字节。
/// 返回 None 表示该行被跳过。
pub fn decode_candidate(raw: &[u8], policy: DecodePolicy) -> Option<Cow<'_, str>> {
    let text: Cow<'_, str> = match std::str::from_utf8(raw) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => match policy {
            DecodePolicy::Skip => return None,
            DecodePolicy::Ignore => Cow::Owned(strip_invalid(raw)),
            DecodePolicy::Lossy => String::from_utf8_lossy(raw),
        },
    };
    Some(match text {
        Cow::Borrowed(s) => Cow::Borrowed(s.trim_end()),
        Cow::Owned(s) => {
            let trimmed = s.trim_end();
            if trimmed.len() == s.len() { Cow::Owned(s) } else { Cow::Owned(trimmed.to_string()) }
        }
    })
}

/// 读取一行原始字节（含行尾），返回读取的字节数；0 表示输入结束
///
/// 行尾按通用换行处理：`\n`、`\r\n` 与单独的 `\r` 都结束一行。
pub(crate) fn read_line<R: BufRead + ?Sized>(input: &mut R, buf: &mut Vec<u8>) -> io::Result<usize> {
    let mut read = 0usize;
    // 上一块以 `\r` 结尾，需要看下一个字节是否为 `\n`
    let mut pending_cr = false;

    loop {
        let available = match input.fill_buf() {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            return Ok(read);
        }
        if pending_cr {
            if available[0] == b'\n' {
                buf.push(b'\n');
                input.consume(1);
                read += 1;
            }
            return Ok(read);
        }

        let (used, terminator) = match available.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(i) => (i + 1, Some(available[i])),
            None => (available.len(), None),
        };
        buf.extend_from_slice(&available[..used]);
        input.consume(used);
        read += used;

        match terminator {
            Some(b'\n') => return Ok(read),
            Some(_) => pending_cr = true,
            None => {}
        }
    }
}

/// 丢弃所有非法 UTF-8 序列
fn strip_invalid(mut raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    loop {
        match std::str::from_utf8(raw) {
            Ok(s) => {
                out.push_str(s);
                return out;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                // valid_up_to 之前的前缀必然合法
                out.push_str(std::str::from_utf8(&raw[..valid]).unwrap_or_default());
                match e.error_len() {
                    Some(bad) => raw = &raw[valid + bad..],
                    // 末尾截断的多字节序列
                    None => return out,
                }
            }
        }
    }
}
