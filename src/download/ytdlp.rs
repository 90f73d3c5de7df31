//! yt-dlp invocation: job description, argument rendering and the blocking run.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::core::error::AppError;
use crate::download::error::DownloadError;

/// Best video joined with best audio, else the best single file.
pub const FORMAT_SELECTOR: &str = "bv*+ba/best";

/// Container every relayed video ends up in.
pub const OUTPUT_CONTAINER: &str = "mp4";

/// How often the worker checks whether yt-dlp has exited.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Keeps error messages short enough for logs.
const MAX_STDERR_CHARS: usize = 600;

/// How long to wait for yt-dlp's helpers (ffmpeg) to exit after a group kill.
const GROUP_EXIT_WAIT: Duration = Duration::from_secs(2);

/// Post-processing steps applied after the download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Postprocessor {
    /// Re-encode into the given container if the source is something else
    ConvertVideo(&'static str),
    /// Write title/uploader into the container metadata
    Metadata,
    /// Embed subtitles when the platform provides them
    EmbedSubtitles,
}

impl Postprocessor {
    fn push_args(&self, args: &mut Vec<String>) {
        match self {
            Postprocessor::ConvertVideo(container) => {
                args.push("--recode-video".to_string());
                args.push((*container).to_string());
            }
            Postprocessor::Metadata => args.push("--embed-metadata".to_string()),
            Postprocessor::EmbedSubtitles => args.push("--embed-subs".to_string()),
        }
    }
}

/// One download request. Built per message and consumed by the dispatcher.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub id: Uuid,
    pub source_url: String,
    pub cookie_file: Option<PathBuf>,
    pub download_dir: PathBuf,
    /// yt-dlp output template, always inside `download_dir`
    pub output_template: String,
    pub format: &'static str,
    pub merge_format: &'static str,
    pub postprocessors: Vec<Postprocessor>,
    pub user_agent: String,
}

impl DownloadJob {
    /// Prefix shared by every file this job writes.
    pub fn file_prefix(&self) -> String {
        format!("{}_", self.id)
    }

    /// Renders the yt-dlp command line (without the binary).
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            self.output_template.clone(),
            "-f".to_string(),
            self.format.to_string(),
            "--merge-output-format".to_string(),
            self.merge_format.to_string(),
        ];
        for postprocessor in &self.postprocessors {
            postprocessor.push_args(&mut args);
        }
        args.push("--add-header".to_string());
        args.push(format!("User-Agent:{}", self.user_agent));
        if let Some(cookie_file) = &self.cookie_file {
            args.push("--cookies".to_string());
            args.push(cookie_file.display().to_string());
        }
        args.extend(
            [
                "--quiet",
                "--no-warnings",
                "--no-playlist",
                "--print",
                "after_move:filepath",
                "--no-simulate",
                "--",
            ]
            .map(String::from),
        );
        args.push(self.source_url.clone());
        args
    }
}

/// The blocking extraction call. Runs on a worker thread, never on the runtime.
pub trait Extractor: Send + Sync + 'static {
    /// Downloads the job and returns the path of the produced file.
    /// Must give up (and clean up its process) once `timeout` has elapsed.
    fn extract(&self, job: &DownloadJob, timeout: Duration) -> Result<PathBuf, DownloadError>;
}

/// Extractor backed by the yt-dlp command line tool.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    bin: String,
}

impl YtDlpExtractor {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

impl Extractor for YtDlpExtractor {
    fn extract(&self, job: &DownloadJob, timeout: Duration) -> Result<PathBuf, DownloadError> {
        let args = job.to_args();
        log::debug!("Running {} {}", self.bin, args.join(" "));

        let mut command = Command::new(&self.bin);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group, so a timeout also takes down the ffmpeg children
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let child = command
            .spawn()
            .map_err(|e| DownloadError::Process(format!("failed to spawn {}: {}", self.bin, e)))?;

        let output = wait_with_output_timeout(child, timeout)?;
        if !output.success {
            return Err(DownloadError::YtDlp(truncate_tail(output.stderr.trim(), MAX_STDERR_CHARS)));
        }

        let path = parse_printed_path(&output.stdout)
            .ok_or_else(|| DownloadError::FileNotFound("yt-dlp did not report an output file".to_string()))?;
        Ok(absolutize(&job.download_dir, path))
    }
}

struct ProcessOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

fn spawn_reader<R: Read + Send + 'static>(stream: Option<R>) -> Option<JoinHandle<String>> {
    stream.map(|mut stream| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stream.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Kills the child together with everything it started, then reaps it.
///
/// The child must lead its own process group. Returns once the group is
/// gone (or after `GROUP_EXIT_WAIT`), so no helper can write into the
/// download folder after the caller's cleanup.
#[cfg(unix)]
fn kill_process_tree(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let group = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(group, Signal::SIGKILL) {
        log::warn!("Failed to kill process group {}: {}", group, e);
        let _ = child.kill();
    }
    let _ = child.wait(); // Reap the zombie

    let deadline = Instant::now() + GROUP_EXIT_WAIT;
    while killpg(group, None).is_ok() {
        if Instant::now() >= deadline {
            log::warn!("Process group {} still alive after SIGKILL", group);
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Wait for a child process with a timeout. Kills the child's process tree
/// on timeout.
///
/// stdout/stderr are drained on helper threads so a chatty process cannot
/// block on a full pipe while we poll.
fn wait_with_output_timeout(mut child: Child, timeout: Duration) -> Result<ProcessOutput, DownloadError> {
    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());
    let deadline = Instant::now() + timeout;

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if Instant::now() >= deadline {
                    log::error!("yt-dlp process timed out after {}s, killing", timeout.as_secs());
                    kill_process_tree(&mut child);
                    return Err(DownloadError::Timeout(timeout));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                kill_process_tree(&mut child);
                return Err(DownloadError::Process(format!("failed to wait for yt-dlp: {}", e)));
            }
        }
    };

    Ok(ProcessOutput {
        success: status.success(),
        stdout: join_reader(stdout),
        stderr: join_reader(stderr),
    })
}

/// The final path is the last non-empty line yt-dlp printed.
fn parse_printed_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(PathBuf::from)
}

fn absolutize(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    // yt-dlp prints paths relative to its working directory (ours)
    std::env::current_dir()
        .map(|cwd| cwd.join(&path))
        .unwrap_or_else(|_| base.join(path.file_name().unwrap_or_default()))
}

/// Keeps the last `max_chars` characters, where yt-dlp puts the actual error.
fn truncate_tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - max_chars).collect();
    format!("…{}", tail)
}

/// Prints the installed yt-dlp version (used by the `ytdlp-version` subcommand).
pub fn print_ytdlp_version(bin: &str) -> Result<(), AppError> {
    let output = Command::new(bin)
        .arg("--version")
        .output()
        .map_err(|e| DownloadError::Process(format!("Failed to get yt-dlp version: {}", e)))?;

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if version.is_empty() {
        return Err(DownloadError::Process("yt-dlp is not installed or --version produced no output".to_string()).into());
    }

    println!("yt-dlp version: {}", version);
    log::info!("yt-dlp version: {}", version);
    Ok(())
}
