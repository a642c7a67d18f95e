//! Purpose: Parse `cmdring exec` scripts into device operations.
//! Exports: `Op`, `Step`, `parse_script`.
//! Role: Keeps the line grammar out of `main.rs`; no device access here.
//! Invariants: Blank lines and `#` comments are skipped; line numbers are 1-based.
//! Invariants: `write` text is taken verbatim after one space, then unescaped (`\n`, `\xNN`, ...).
use bstr::ByteVec;
use cmdring::api::{Error, ErrorKind, SeekMode};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Op {
    Write(Vec<u8>),
    Read(usize),
    Seek(SeekMode, i64),
    SeekTo { command: u32, offset: u32 },
    Stats,
    Dump,
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Write(_) => "write",
            Op::Read(_) => "read",
            Op::Seek(..) => "seek",
            Op::SeekTo { .. } => "seekto",
            Op::Stats => "stats",
            Op::Dump => "dump",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Step {
    pub line: usize,
    pub op: Op,
}

pub fn parse_script(text: &str) -> Result<Vec<Step>, Error> {
    let mut steps = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let op = parse_line(raw).map_err(|message| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("script line {line}: {message}"))
                .with_hint("Operations: write <text>, read <n>, seek <set|cur|end> <n>, seekto <cmd> <off>, stats, dump.")
        })?;
        if let Some(op) = op {
            steps.push(Step { line, op });
        }
    }
    Ok(steps)
}

fn parse_line(raw: &str) -> Result<Option<Op>, String> {
    let line = raw.trim_start();
    if line.trim_end().is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = line.split_once(' ').unwrap_or((line.trim_end(), ""));
    let op = match word {
        "write" => {
            if rest.is_empty() {
                return Err("write needs text".to_string());
            }
            Op::Write(<Vec<u8>>::unescape_bytes(rest))
        }
        "read" => Op::Read(parse_number(rest, "read count")?),
        "seek" => {
            let mut args = rest.split_whitespace();
            let mode = match args.next() {
                Some("set") => SeekMode::Absolute,
                Some("cur") => SeekMode::Relative,
                Some("end") => SeekMode::FromEnd,
                Some(other) => return Err(format!("unknown seek mode '{other}'")),
                None => return Err("seek needs a mode and an offset".to_string()),
            };
            let offset = parse_number(args.next().unwrap_or(""), "seek offset")?;
            expect_end(args)?;
            Op::Seek(mode, offset)
        }
        "seekto" => {
            let mut args = rest.split_whitespace();
            let command = parse_number(args.next().unwrap_or(""), "command index")?;
            let offset = parse_number(args.next().unwrap_or(""), "command offset")?;
            expect_end(args)?;
            Op::SeekTo { command, offset }
        }
        "stats" => Op::Stats,
        "dump" => Op::Dump,
        other => return Err(format!("unknown operation '{other}'")),
    };
    if matches!(op, Op::Stats | Op::Dump) && !rest.trim().is_empty() {
        return Err(format!("{word} takes no arguments"));
    }
    Ok(Some(op))
}

fn parse_number<T: std::str::FromStr>(text: &str, what: &str) -> Result<T, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(format!("missing {what}"));
    }
    text.parse()
        .map_err(|_| format!("invalid {what} '{text}'"))
}

fn expect_end<'a>(mut args: impl Iterator<Item = &'a str>) -> Result<(), String> {
    match args.next() {
        Some(extra) => Err(format!("unexpected argument '{extra}'")),
        None => Ok(()),
    }
}
