use std::process::Stdio;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

use wavecrew_core::runner::{RunOutcome, RunnerPlugin, RunnerSession, RunnerStartArgs, Signal};

/// Spawns the agent CLI as a child process in the task's working directory.
pub struct ProcessRunnerPlugin {}

impl ProcessRunnerPlugin {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ProcessRunnerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunnerPlugin for ProcessRunnerPlugin {
    fn name(&self) -> &str {
        "process"
    }

    async fn start_session(&self, args: &RunnerStartArgs) -> Result<Box<dyn RunnerSession>> {
        let mut cmd = Command::new(&args.cmd);
        cmd.args(&args.args)
            .current_dir(&args.cwd)
            .envs(&args.envs)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so a terminate reaches tools the agent spawned.
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn()?;
        tracing::debug!(pid = child.id(), cmd = %args.cmd, "agent process spawned");
        Ok(Box::new(ProcessRunnerSession { child }))
    }
}

struct ProcessRunnerSession {
    child: Child,
}

impl ProcessRunnerSession {
    #[cfg(unix)]
    fn signal_group(&self, sig: libc::c_int) -> Result<()> {
        let Some(pid) = self.child.id() else {
            // Already reaped.
            return Ok(());
        };
        let rc = unsafe { libc::kill(-(pid as libc::pid_t), sig) };
        if rc == -1 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::ESRCH) {
                return Err(err.into());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RunnerSession for ProcessRunnerSession {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    async fn signal(&mut self, signal: Signal) -> Result<()> {
        match signal {
            #[cfg(unix)]
            Signal::Term => self.signal_group(libc::SIGTERM),
            #[cfg(not(unix))]
            Signal::Term => {
                self.child.start_kill()?;
                Ok(())
            }
            Signal::Kill => {
                #[cfg(unix)]
                self.signal_group(libc::SIGKILL)?;
                if self.child.id().is_some() {
                    self.child.start_kill()?;
                }
                Ok(())
            }
        }
    }

    async fn wait(&mut self) -> Result<RunOutcome> {
        let status = self.child.wait().await?;
        Ok(RunOutcome {
            exit_code: status.code().unwrap_or(-1),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    fn sh(script: &str, cwd: &std::path::Path) -> RunnerStartArgs {
        RunnerStartArgs {
            cmd: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            cwd: cwd.to_path_buf(),
            envs: HashMap::from([("WAVECREW_TEST".to_string(), "yes".to_string())]),
        }
    }

    #[tokio::test]
    async fn runs_in_cwd_with_env_and_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = ProcessRunnerPlugin::new();
        let mut session = plugin
            .start_session(&sh("pwd; echo $WAVECREW_TEST; echo oops >&2; exit 3", dir.path()))
            .await
            .unwrap();

        let mut out = String::new();
        session.stdout().unwrap().read_to_string(&mut out).await.unwrap();
        let mut err = String::new();
        session.stderr().unwrap().read_to_string(&mut err).await.unwrap();
        let outcome = session.wait().await.unwrap();

        let canonical = dir.path().canonicalize().unwrap();
        let mut lines = out.lines();
        assert_eq!(
            std::path::Path::new(lines.next().unwrap()).canonicalize().unwrap(),
            canonical
        );
        assert_eq!(lines.next(), Some("yes"));
        assert_eq!(err, "oops\n");
        assert_eq!(outcome.exit_code, 3);
    }

    #[tokio::test]
    async fn term_stops_a_sleeping_process() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = ProcessRunnerPlugin::new();
        let mut session = plugin
            .start_session(&sh("sleep 30", dir.path()))
            .await
            .unwrap();

        session.signal(Signal::Term).await.unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(5), session.wait())
            .await
            .expect("process should exit after SIGTERM")
            .unwrap();
        assert_ne!(outcome.exit_code, 0);
    }

    #[tokio::test]
    async fn missing_binary_fails_to_start() {
        let plugin = ProcessRunnerPlugin::new();
        let args = RunnerStartArgs {
            cmd: "wavecrew-definitely-not-installed".to_string(),
            args: Vec::new(),
            cwd: std::env::temp_dir(),
            envs: HashMap::new(),
        };
        assert!(plugin.start_session(&args).await.is_err());
    }
}
