//! File-backed subscriber.
//!
//! Every event is serialized by [`JsonLayer`] and appended to a single JSONL
//! file. Writes are flushed per line so that several processes (UI shell,
//! background sync) can share the file.

use crate::json_layer::JsonLayer;
use crate::{default_log_path, LogConfig};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Append-only writer for the central log file.
#[derive(Clone)]
pub struct CentralLogWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl CentralLogWriter {
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
        })
    }
}

impl Write for CentralLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let written = guard.write(buf)?;
        guard.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// MakeWriter implementation for tracing-subscriber.
#[derive(Clone)]
pub struct WriterFactory {
    writer: CentralLogWriter,
}

impl<'a> MakeWriter<'a> for WriterFactory {
    type Writer = CentralLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer.clone()
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn stderr_layer<S>() -> impl Layer<S> + Send + Sync + 'static
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_writer(io::stderr)
        .with_ansi(true)
}

/// JSONL file layer with the optional stderr layer on top.
fn file_subscriber(
    config: &LogConfig,
    writer: CentralLogWriter,
) -> impl Subscriber + Send + Sync + 'static {
    let json_layer = JsonLayer::new(config.service_name.clone(), WriterFactory { writer });
    let stderr = config
        .also_stderr
        .then(|| stderr_layer().with_filter(env_filter("info")));

    tracing_subscriber::registry()
        .with(json_layer.with_filter(env_filter(&config.default_level)))
        .with(stderr)
}

/// Install the JSONL file layer plus the optional stderr layer.
pub fn init_file_subscriber(config: &LogConfig) {
    let log_path = config.log_path.clone().unwrap_or_else(default_log_path);

    let writer = match CentralLogWriter::new(&log_path) {
        Ok(writer) => writer,
        Err(err) => {
            // No usable log file: keep stderr so nothing is silently lost.
            let _ = tracing_subscriber::registry()
                .with(stderr_layer().with_filter(env_filter(&config.default_level)))
                .try_init();
            tracing::warn!(
                log_path = %log_path.display(),
                error = %err,
                "central log file unavailable, logging to stderr only"
            );
            return;
        }
    };

    if file_subscriber(config, writer).try_init().is_ok() {
        tracing::info!(log_path = %log_path.display(), "observability initialized");
    }
}
