use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use thiserror::Error;

use super::models::{progress_reporting_args, DownloadOptions, ProgressReport};
use super::MediaDownloader;
use crate::utils::failure_message;

/// How many trailing stderr lines are kept for the failure message.
const STDERR_TAIL_LINES: usize = 200;

#[derive(Error, Debug)]
pub enum DownloaderError {
    #[error("Failed to start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read downloader output: {0}")]
    Io(#[from] io::Error),

    #[error("{message}")]
    Exited { code: Option<i32>, message: String },
}

/// Runs the `yt-dlp` executable as a child process.
#[derive(Debug, Clone)]
pub struct YtDlpClient {
    program: PathBuf,
    leading_args: Vec<OsString>,
}

impl YtDlpClient {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Arguments placed before everything else, e.g. `-m yt_dlp` when the
    /// program is a Python interpreter.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command_args(&self, url: &str, options: &DownloadOptions) -> Vec<OsString> {
        let mut args = self.leading_args.clone();
        args.extend(progress_reporting_args());
        args.extend(options.to_args());
        // Everything after `--` is a URL, even if it starts with a dash.
        args.push("--".into());
        args.push(url.into());
        args
    }
}

impl MediaDownloader for YtDlpClient {
    fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        on_progress: &mut dyn FnMut(ProgressReport),
    ) -> Result<(), DownloaderError> {
        let args = self.command_args(url, options);
        tracing::debug!(program = %self.program.display(), ?args, "spawning yt-dlp");

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .env("PYTHONIOENCODING", "UTF-8")
            .env("PYTHONUTF8", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            // CREATE_NO_WINDOW
            command.creation_flags(0x08000000);
        }

        let mut child = command.spawn().map_err(|source| DownloaderError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(DownloaderError::Io(io::Error::other(
                "child process pipes were not captured",
            )));
        };

        let stderr_handle = thread::Builder::new()
            .name("yt-dlp-stderr".to_string())
            .spawn(move || collect_tail(stderr, STDERR_TAIL_LINES))?;

        let mut reader = BufReader::new(stdout);
        let mut buffer = Vec::new();
        loop {
            match read_lossy_line(&mut reader, &mut buffer) {
                Ok(Some(line)) => match ProgressReport::parse_line(&line) {
                    Some(report) => on_progress(report),
                    None => tracing::trace!(target: "yt_dlp::stdout", "{}", line),
                },
                Ok(None) => break,
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(DownloaderError::Io(err));
                }
            }
        }

        let status = child.wait()?;
        let stderr_lines = stderr_handle.join().unwrap_or_default();

        if status.success() {
            tracing::debug!("yt-dlp exited successfully");
            return Ok(());
        }

        let message = failure_message(&stderr_lines)
            .unwrap_or_else(|| format!("{} exited with {}", self.program.display(), status));
        tracing::warn!(code = ?status.code(), %message, "yt-dlp failed");
        Err(DownloaderError::Exited {
            code: status.code(),
            message,
        })
    }
}

/// Drains `stream`, keeping only its last `limit` lines.
fn collect_tail(stream: impl Read, limit: usize) -> Vec<String> {
    let mut reader = BufReader::new(stream);
    let mut buffer = Vec::new();
    let mut tail = VecDeque::with_capacity(limit);
    while let Ok(Some(line)) = read_lossy_line(&mut reader, &mut buffer) {
        tracing::trace!(target: "yt_dlp::stderr", "{}", line);
        if tail.len() == limit {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail.into()
}

/// Reads one line, tolerating output that is not valid UTF-8.
fn read_lossy_line(reader: &mut impl BufRead, buffer: &mut Vec<u8>) -> io::Result<Option<String>> {
    buffer.clear();
    if reader.read_until(b'\n', buffer)? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buffer);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
