//! Purpose: `cmdring` CLI entry point.
//! Role: Binary crate root; parses args, builds one device, runs `feed` or `exec`.
//! Invariants: Fatal errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: `exec` reports per-operation failures in-line and keeps going.
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bstr::ByteSlice;
use clap::{Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod script;

use cmdring::api::{
    Device, DeviceConfig, Error, ErrorKind, Handle, IOC_SEEKTO, SeekTo, to_errno, to_exit_code,
};
use script::{Op, Step, parse_script};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Use `cmdring --help` for usage."));
            }
        },
    };

    init_tracing();
    let config = resolve_config(cli.config.as_deref(), cli.capacity)?;
    let device = Arc::new(Device::with_config(&config)?);
    info!(capacity = config.capacity, "device ready");

    let outcome = match cli.command {
        Command::Feed { chunk_size, input } => feed(&device, chunk_size, input)?,
        Command::Exec { script } => exec(&device, script)?,
    };

    let teardown = device.shutdown()?;
    info!(
        records = teardown.released_records,
        bytes = teardown.released_bytes,
        pending = teardown.discarded_pending,
        "device released"
    );
    Ok(outcome)
}

#[derive(Parser)]
#[command(
    name = "cmdring",
    version,
    about = "Fixed-capacity command log read back as one seekable byte stream",
    long_about = None,
    after_help = r#"EXAMPLES
  $ printf 'ls\ncd /tmp\n' | cmdring feed
  $ cmdring --capacity 2 exec script.txt

Script operations (one per line, `#` comments allowed):
  write <text>              text is unescaped: \n, \t, \xNN
  read <count>
  seek <set|cur|end> <offset>
  seekto <command> <offset>
  stats
  dump"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(long, help = "JSON device config file", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
    #[arg(long, help = "Record slots in the ring (overrides --config)")]
    capacity: Option<usize>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write input into the device, then print the whole stream.
    Feed {
        #[arg(long, default_value_t = 4096, help = "Bytes handed to each device write")]
        chunk_size: usize,
        #[arg(help = "Input file (default: stdin)", value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
    },
    /// Run a script of device operations, one JSON result per line.
    Exec {
        #[arg(help = "Script file (default: stdin)", value_hint = ValueHint::FilePath)]
        script: Option<PathBuf>,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn resolve_config(path: Option<&Path>, capacity: Option<usize>) -> Result<DeviceConfig, Error> {
    let mut config = match path {
        Some(path) => DeviceConfig::load(path)?,
        None => DeviceConfig::default(),
    };
    if let Some(capacity) = capacity {
        config.capacity = capacity;
    }
    config.validate().map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(err.message().unwrap_or("invalid config").to_string())
            .with_hint("Capacity must be at least 1.")
    })?;
    Ok(config)
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>, Error> {
    match path {
        Some(path) => {
            let file = File::open(path).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message(format!("failed to open {}", path.display()))
                    .with_source(err)
            })?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin())),
    }
}

fn io_error(err: io::Error, message: &str) -> Error {
    Error::new(ErrorKind::Io)
        .with_message(message)
        .with_source(err)
}

fn feed(
    device: &Arc<Device>,
    chunk_size: usize,
    input: Option<PathBuf>,
) -> Result<RunOutcome, Error> {
    if chunk_size == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("chunk size must be at least 1")
            .with_hint("Omit --chunk-size to use 4096-byte writes."));
    }
    let mut reader = open_input(input.as_deref())?;
    let mut buf = vec![0u8; chunk_size];
    let mut writes = 0u64;
    loop {
        let filled = fill_chunk(reader.as_mut(), &mut buf)
            .map_err(|err| io_error(err, "failed to read input"))?;
        if filled == 0 {
            break;
        }
        device.write_bytes(&buf[..filled])?;
        writes += 1;
    }

    let stats = device.stats()?;
    info!(
        writes,
        live = stats.live_records,
        stream_len = stats.stream_len,
        pending = stats.pending_len,
        "input consumed"
    );

    let stream = Handle::open(device).read_stream()?;
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&stream)
        .and_then(|()| stdout.flush())
        .map_err(|err| io_error(err, "failed to write output"))?;
    Ok(RunOutcome::ok())
}

/// Reads until `buf` is full or the input ends, so every write but the last
/// carries exactly `buf.len()` bytes.
fn fill_chunk(reader: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

fn exec(device: &Arc<Device>, script: Option<PathBuf>) -> Result<RunOutcome, Error> {
    let text = match script.as_ref() {
        Some(path) => fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read script {}", path.display()))
                .with_source(err)
        })?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| io_error(err, "failed to read script"))?;
            text
        }
    };
    let steps = parse_script(&text)?;

    let mut handle = Handle::open(device);
    let mut failed = 0u64;
    for step in &steps {
        let value = match run_step(&mut handle, step) {
            Ok(fields) => step_json(step, fields),
            Err(err) => {
                failed += 1;
                let mut fields = Map::new();
                fields.insert("error".to_string(), op_error_json(&err));
                step_json(step, fields)
            }
        };
        emit_json(value);
    }
    info!(steps = steps.len(), failed, "script finished");
    Ok(RunOutcome::ok())
}

fn run_step(handle: &mut Handle, step: &Step) -> Result<Map<String, Value>, Error> {
    let mut fields = Map::new();
    match &step.op {
        Op::Write(bytes) => {
            let consumed = handle.device().write_bytes(bytes)?;
            let stats = handle.device().stats()?;
            fields.insert("consumed".to_string(), json!(consumed));
            fields.insert("live_records".to_string(), json!(stats.live_records));
            fields.insert("pending_len".to_string(), json!(stats.pending_len));
        }
        Op::Read(count) => {
            let data = handle.read_chunk(*count)?;
            fields.insert("data".to_string(), json!(data.to_str_lossy()));
            fields.insert("len".to_string(), json!(data.len()));
            fields.insert("position".to_string(), json!(handle.position()));
        }
        Op::Seek(mode, offset) => {
            let position = handle.seek_to(*mode, *offset)?;
            fields.insert("position".to_string(), json!(position));
        }
        Op::SeekTo { command, offset } => {
            let request = SeekTo::new(*command, *offset).encode();
            let position = handle.ioctl(IOC_SEEKTO, &mut &request[..])?;
            fields.insert("position".to_string(), json!(position));
            if let Some(located) = handle.device().locate(handle.cursor())? {
                fields.insert("record".to_string(), json!(located.record_index));
            }
        }
        Op::Stats => {
            let stats = handle.device().stats()?;
            let value = serde_json::to_value(stats).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode stats")
                    .with_source(err)
            })?;
            if let Value::Object(map) = value {
                fields.extend(map);
            }
        }
        Op::Dump => {
            let records = handle.device().records()?;
            let texts: Vec<Value> = records
                .iter()
                .map(|record| json!(record.as_bytes().to_str_lossy()))
                .collect();
            fields.insert("records".to_string(), Value::Array(texts));
        }
    }
    Ok(fields)
}

fn step_json(step: &Step, fields: Map<String, Value>) -> Value {
    let mut out = Map::new();
    out.insert("op".to_string(), json!(step.op.name()));
    out.insert("line".to_string(), json!(step.line));
    out.extend(fields);
    Value::Object(out)
}

fn op_error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("errno".to_string(), json!(to_errno(err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    Value::Object(inner)
}

fn emit_json(value: Value) {
    let json = serde_json::to_string(&value)
        .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    err.message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", err.kind()))
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(index) = err.index() {
        inner.insert("index".to_string(), json!(index));
    }
    if let Some(offset) = err.offset() {
        let offset = i64::try_from(offset)
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(offset.to_string()));
        inner.insert("offset".to_string(), offset);
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut current = std::error::Error::source(err);
    while let Some(source) = current {
        causes.push(source.to_string());
        current = source.source();
    }
    causes
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error: ").to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}
