use super::{ClientDiag, ReportSource};
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Invokes the `bkr` command-line client (from the beaker-client
/// package). The client must already be configured; this code never
/// retries a failed invocation and propagates the client's own error
/// output verbatim.
pub struct BkrClient {
    cfg: Config,
    bkr_exe: PathBuf,
}

impl BkrClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let bkr_exe = resolve_bkr_exe(&cfg.client.bkr_exe);
        Ok(Self {
            cfg: cfg.clone(),
            bkr_exe,
        })
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        debug!(
            "bkr run {} {:?} timeout={}s",
            self.bkr_exe.display(),
            args,
            self.cfg.client.timeout_seconds
        );
        let mut cmd = Command::new(&self.bkr_exe);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        for (k, v) in &self.cfg.client.env {
            cmd.env(k, v);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning bkr: {}", self.bkr_exe.display()))?;

        let output = if self.cfg.client.timeout_seconds > 0 {
            wait_with_timeout(
                &mut child,
                Duration::from_secs(self.cfg.client.timeout_seconds),
            )?
        } else {
            child.wait_with_output().with_context(|| "waiting for bkr")?
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "bkr {} failed ({}):\n{}",
                args.first().unwrap_or(&""),
                output.status,
                stderr
            ));
        }

        if self.cfg.debug.keep_client_stderr && !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("bkr stderr: {}", stderr.trim());
        }

        Ok(output)
    }
}

impl ReportSource for BkrClient {
    fn doctor(&self) -> Result<ClientDiag> {
        // Missing or unconfigured bkr is a diagnostic result, not a
        // hard failure.
        match self.run(&["--version"]) {
            Ok(out) => Ok(ClientDiag {
                bkr_exe: self.bkr_exe.display().to_string(),
                version: Some(String::from_utf8_lossy(&out.stdout).trim().to_string()),
                ok: true,
                error: None,
            }),
            Err(err) => Ok(ClientDiag {
                bkr_exe: self.bkr_exe.display().to_string(),
                version: None,
                ok: false,
                error: Some(format!("{err:#}")),
            }),
        }
    }

    fn job_results(&self, taskspec: &str) -> Result<Vec<u8>> {
        let mut args = vec!["job-results"];
        for extra in &self.cfg.client.extra_args {
            args.push(extra.as_str());
        }
        args.push(taskspec);
        let output = self
            .run(&args)
            .with_context(|| format!("bkr job-results {taskspec}"))?;
        Ok(output.stdout)
    }
}

fn resolve_bkr_exe(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto") {
        if let Ok(env_val) = std::env::var("BKR") {
            let p = expand_tilde(&env_val);
            if p.exists() {
                return p;
            }
        }
        return PathBuf::from("bkr");
    }
    expand_tilde(raw)
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Output> {
    // Drain pipes while waiting so a chatty client can't deadlock on a
    // full stdout/stderr buffer.
    let stdout_reader = child.stdout.take();
    let stderr_reader = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_reader {
            out.read_to_end(&mut buf).with_context(|| "read stdout")?;
        }
        Ok(buf)
    });

    let stderr_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            err.read_to_end(&mut buf).with_context(|| "read stderr")?;
        }
        Ok(buf)
    });

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().with_context(|| "try_wait")? {
            let stdout = stdout_thread
                .join()
                .map_err(|_| anyhow!("stdout reader thread panicked"))??;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            return Ok(Output {
                status,
                stdout,
                stderr,
            });
        }

        if start.elapsed() > timeout {
            warn!("bkr timed out after {:?}", timeout);
            let _ = child.kill();
            let _ = child.wait().with_context(|| "wait after kill")?;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            let _ = stdout_thread.join();
            return Err(anyhow!(
                "bkr exceeded timeout ({:?}); stderr: {}",
                timeout,
                String::from_utf8_lossy(&stderr)
            ));
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}
