// Keyforge - External Tool Runner
//
// Narrow seam around child processes: (program, args, timeout) in,
// (exit code, stdout, stderr) out. The pipeline only talks to tools through
// `ToolRunner`, so tests can substitute a fake implementation.

use std::fmt;
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use super::ToolError;

/// Flags whose following argument is a secret and must never be logged.
const SECRET_FLAGS: &[&str] = &[
    "-storepass",
    "-keypass",
    "-srcstorepass",
    "-deststorepass",
    "-passin",
    "-passout",
];

/// A single external command.
#[derive(Clone)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a flag and its value.
    pub fn opt(self, flag: &str, value: impl Into<String>) -> Self {
        self.arg(flag).arg(value)
    }

    /// Value following `flag`, if present.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

/// Renders the command line with secret values masked.
impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        let mut mask_next = false;
        for arg in &self.args {
            if mask_next {
                f.write_str(" ****")?;
                mask_next = false;
            } else {
                write!(f, " {}", arg)?;
                mask_next = SECRET_FLAGS.contains(&arg.as_str());
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ToolInvocation({}, timeout={:?})", self, self.timeout)
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Runs external commands. Implementations must honor `invocation.timeout`.
pub trait ToolRunner: Send + Sync {
    fn run(
        &self,
        invocation: &ToolInvocation,
    ) -> impl Future<Output = Result<ToolOutput, ToolError>> + Send;
}

/// Run and turn a non-zero exit into `ToolError::Failed`.
pub async fn run_checked<R: ToolRunner>(
    runner: &R,
    invocation: &ToolInvocation,
) -> Result<ToolOutput, ToolError> {
    tracing::debug!(command = %invocation, "Running external tool");
    let output = runner.run(invocation).await?;

    if !output.success() {
        let code = output
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        tracing::warn!(
            command = %invocation,
            code = %code,
            stderr = %output.stderr.trim(),
            stdout = %output.stdout.trim(),
            "External tool failed"
        );
        return Err(ToolError::Failed {
            program: invocation.program.clone(),
            code,
            stderr: output.stderr.trim().to_string(),
        });
    }

    Ok(output)
}

// ─── Process Implementation ──────────────────────────────────────────────────

/// Runs commands as real child processes. The child is killed if it
/// outlives its timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        let program = invocation.program.clone();

        let child = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ToolError::NotFound(program.clone()),
                _ => ToolError::Spawn {
                    program: program.clone(),
                    source: e,
                },
            })?;

        match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ToolOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) => Err(ToolError::Spawn { program, source: e }),
            Err(_) => Err(ToolError::TimedOut {
                program,
                secs: invocation.timeout.as_secs(),
            }),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn secret_invocation() -> ToolInvocation {
        ToolInvocation::new("keytool", Duration::from_secs(5))
            .arg("-genkeypair")
            .opt("-alias", "key0")
            .opt("-storepass", "hunter22")
            .opt("-keypass", "hunter22")
            .opt("-passin", "pass:hunter22")
    }

    #[test]
    fn test_display_masks_secrets() {
        let rendered = secret_invocation().to_string();
        assert!(!rendered.contains("hunter22"), "Secrets leaked: {}", rendered);
        assert!(rendered.contains("-alias key0"));
        assert!(rendered.contains("-storepass ****"));
    }

    #[test]
    fn test_debug_masks_secrets() {
        let rendered = format!("{:?}", secret_invocation());
        assert!(!rendered.contains("hunter22"));
    }

    #[test]
    fn test_value_of() {
        let inv = secret_invocation();
        assert_eq!(inv.value_of("-alias"), Some("key0"));
        assert_eq!(inv.value_of("-missing"), None);
        assert!(inv.has_arg("-genkeypair"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_found() {
        let inv = ToolInvocation::new("keyforge-no-such-binary-xyz", Duration::from_secs(5));
        let err = SystemToolRunner.run(&inv).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(ref p) if p == "keyforge-no-such-binary-xyz"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_output_and_exit_code() {
        let inv = ToolInvocation::new("sh", Duration::from_secs(5))
            .arg("-c")
            .arg("echo out; echo err 1>&2; exit 3");
        let output = SystemToolRunner.run(&inv).await.unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");

        let err = run_checked(&SystemToolRunner, &inv).await.unwrap_err();
        assert!(matches!(err, ToolError::Failed { ref code, .. } if code == "3"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_child() {
        let inv = ToolInvocation::new("sleep", Duration::from_millis(100)).arg("5");
        let started = std::time::Instant::now();
        let err = SystemToolRunner.run(&inv).await.unwrap_err();
        assert!(matches!(err, ToolError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
