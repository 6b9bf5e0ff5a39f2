#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::AsyncRead;
use tokio::sync::watch;

use wavecrew_core::agents::{
    AgentConfig, AgentDiscoverer, AgentDiscovery, AgentScope, AgentSource,
};
use wavecrew_core::config::{ControlConfig, RunnerConfig};
use wavecrew_core::runner::{
    AgentSupervisor, RunOutcome, RunnerPlugin, RunnerSession, RunnerStartArgs, Signal,
};
use wavecrew_core::workflow::{ApprovalUi, TaskSpec, WaveSpec, WorkflowEngine, WorkflowPlan};

pub const WORKER_PROMPT: &str = "Execute the task now and return JSON only.";
pub const CRITIC_PROMPT: &str = "Review the worker output and return JSON only.";
pub const PLANNER_PROMPT: &str = "Create a wave-based plan now and return JSON only.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Worker,
    Critic,
    Planner,
}

#[derive(Debug, Clone)]
enum Behaviour {
    Finish,
    /// Stays alive until signalled; `ignore_term` makes only a kill stop it.
    Hang { ignore_term: bool },
}

/// One scripted agent process.
#[derive(Debug, Clone)]
pub struct Reply {
    stdout: String,
    stderr: String,
    exit_code: i32,
    behaviour: Behaviour,
}

pub fn assistant_line(text: &str, input: u64) -> String {
    json!({
        "type": "message_end",
        "message": {
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "usage": {
                "input": input, "output": 5, "cacheRead": 2, "cacheWrite": 1,
                "totalTokens": input + 5, "cost": {"total": 0.25}
            },
            "stopReason": "stop"
        }
    })
    .to_string()
}

impl Reply {
    pub fn raw(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
            behaviour: Behaviour::Finish,
        }
    }

    /// An assistant answering with `text`, 10 input tokens per turn.
    pub fn text(text: &str) -> Self {
        Self::raw(format!("{}\n", assistant_line(text, 10)))
    }

    pub fn json(value: Value) -> Self {
        Self::text(&value.to_string())
    }

    pub fn with_tool(self, tool: &str) -> Self {
        let line = json!({"type": "tool_execution_start", "toolName": tool}).to_string();
        Self {
            stdout: format!("{line}\n{}", self.stdout),
            ..self
        }
    }

    pub fn fail(exit_code: i32, stderr: &str) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code,
            behaviour: Behaviour::Finish,
        }
    }

    pub fn hang() -> Self {
        Self {
            behaviour: Behaviour::Hang { ignore_term: false },
            ..Self::raw(String::new())
        }
    }

    pub fn stubborn() -> Self {
        Self {
            behaviour: Behaviour::Hang { ignore_term: true },
            ..Self::raw(String::new())
        }
    }
}

pub fn worker_ok(summary: &str) -> Reply {
    Reply::json(json!({"status": "completed", "summary": summary, "filesTouched": ["src/lib.rs"]}))
}

pub fn worker_blocked(blockers: &[&str]) -> Reply {
    Reply::json(json!({"status": "blocked", "summary": "could not finish", "blockers": blockers}))
}

pub fn critic_approve() -> Reply {
    Reply::json(json!({"decision": "approve", "rationale": "ok"}))
}

pub fn critic_revise(issues: &[&str]) -> Reply {
    Reply::json(json!({"decision": "revise", "rationale": "needs work", "issues": issues}))
}

#[derive(Debug, Clone)]
pub struct Call {
    pub role: Role,
    pub task_id: Option<String>,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Call {
    pub fn system_prompt(&self) -> &str {
        self.args
            .iter()
            .position(|a| a == "--system-prompt")
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Fake runner answering from per-role (optionally per-task) reply queues.
#[derive(Default)]
pub struct ScriptedRunner {
    replies: Mutex<HashMap<(Role, Option<String>), VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
    signals: Arc<Mutex<Vec<Signal>>>,
    crash_for: Mutex<Option<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, role: Role, reply: Reply) -> &Self {
        self.push_key(role, None, reply)
    }

    pub fn push_for(&self, role: Role, task_id: &str, reply: Reply) -> &Self {
        self.push_key(role, Some(task_id.to_string()), reply)
    }

    fn push_key(&self, role: Role, task_id: Option<String>, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry((role, task_id))
            .or_default()
            .push_back(reply);
        self
    }

    /// Starting an agent for `task_id` panics instead of spawning.
    pub fn crash_on(&self, task_id: &str) -> &Self {
        *self.crash_for.lock().unwrap() = Some(task_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, role: Role) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.role == role).collect()
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.signals.lock().unwrap().clone()
    }

    fn next_reply(&self, role: Role, task_id: &Option<String>) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        if let Some(reply) = replies
            .get_mut(&(role, task_id.clone()))
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        replies
            .get_mut(&(role, None))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Reply::fail(1, "no scripted reply"))
    }
}

fn role_of(args: &[String]) -> Role {
    match args.last().map(String::as_str) {
        Some(WORKER_PROMPT) => Role::Worker,
        Some(CRITIC_PROMPT) => Role::Critic,
        Some(PLANNER_PROMPT) => Role::Planner,
        other => panic!("unexpected task prompt: {other:?}"),
    }
}

fn task_id_of(call_args: &[String]) -> Option<String> {
    let prompt = call_args
        .iter()
        .position(|a| a == "--system-prompt")
        .and_then(|i| call_args.get(i + 1))?;
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("TASK ID: "))
        .map(|id| id.trim().to_string())
}

#[async_trait]
impl RunnerPlugin for ScriptedRunner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn start_session(&self, args: &RunnerStartArgs) -> anyhow::Result<Box<dyn RunnerSession>> {
        let role = role_of(&args.args);
        let task_id = task_id_of(&args.args);
        self.calls.lock().unwrap().push(Call {
            role,
            task_id: task_id.clone(),
            args: args.args.clone(),
            cwd: args.cwd.clone(),
        });
        let crash = self.crash_for.lock().unwrap().clone();
        if let (Some(crash), Some(id)) = (crash, task_id.as_deref()) {
            if crash == id {
                panic!("scripted runner crashed on {id}");
            }
        }
        let reply = self.next_reply(role, &task_id);
        Ok(Box::new(ScriptedSession::new(reply, self.signals.clone())))
    }
}

pub struct ScriptedSession {
    stdout: Option<Box<dyn AsyncRead + Unpin + Send>>,
    stderr: Option<Box<dyn AsyncRead + Unpin + Send>>,
    exit_code: i32,
    behaviour: Behaviour,
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
    hold_stdout: Option<tokio::io::DuplexStream>,
    signals: Arc<Mutex<Vec<Signal>>>,
}

impl ScriptedSession {
    fn new(reply: Reply, signals: Arc<Mutex<Vec<Signal>>>) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (stdout, hold_stdout): (Box<dyn AsyncRead + Unpin + Send>, _) = match reply.behaviour {
            Behaviour::Finish => (Box::new(Cursor::new(reply.stdout.into_bytes())), None),
            Behaviour::Hang { .. } => {
                let (writer, reader) = tokio::io::duplex(64);
                (Box::new(reader), Some(writer))
            }
        };
        Self {
            stdout: Some(stdout),
            stderr: Some(Box::new(Cursor::new(reply.stderr.into_bytes()))),
            exit_code: reply.exit_code,
            behaviour: reply.behaviour,
            stop_tx,
            stop_rx,
            hold_stdout,
            signals,
        }
    }
}

#[async_trait]
impl RunnerSession for ScriptedSession {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stdout.take()
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stderr.take()
    }

    async fn signal(&mut self, signal: Signal) -> anyhow::Result<()> {
        self.signals.lock().unwrap().push(signal);
        let stops = match (&self.behaviour, signal) {
            (Behaviour::Hang { ignore_term: true }, Signal::Term) => false,
            _ => true,
        };
        if stops {
            self.hold_stdout = None;
            let _ = self.stop_tx.send(true);
        }
        Ok(())
    }

    async fn wait(&mut self) -> anyhow::Result<RunOutcome> {
        if let Behaviour::Hang { .. } = self.behaviour {
            let stopped = self.stop_rx.wait_for(|stopped| *stopped).await.is_ok();
            return Ok(RunOutcome {
                exit_code: if stopped { -1 } else { 1 },
            });
        }
        Ok(RunOutcome {
            exit_code: self.exit_code,
        })
    }
}

/// Fixed agent set, ignoring cwd and scope.
pub struct StaticAgents {
    pub agents: Vec<AgentConfig>,
    pub project_dir: Option<PathBuf>,
}

impl AgentDiscoverer for StaticAgents {
    fn discover(&self, _cwd: &Path, _scope: AgentScope) -> AgentDiscovery {
        AgentDiscovery {
            agents: self.agents.clone(),
            project_agents_dir: self.project_dir.clone(),
        }
    }
}

pub fn default_agents() -> StaticAgents {
    StaticAgents {
        agents: vec![
            AgentConfig::new("implementer", "You write code.", AgentSource::User),
            AgentConfig::new("critic", "You review code.", AgentSource::User),
            AgentConfig::new("planner", "You plan work.", AgentSource::User),
        ],
        project_dir: None,
    }
}

pub fn fast_control() -> ControlConfig {
    ControlConfig {
        abort_grace_ms: 200,
        ..ControlConfig::default()
    }
}

pub fn supervisor(runner: Arc<ScriptedRunner>) -> AgentSupervisor {
    AgentSupervisor::new(runner, RunnerConfig::default(), fast_control())
}

pub fn project_root() -> PathBuf {
    std::env::temp_dir().join("wavecrew-tests")
}

pub fn engine(
    runner: Arc<ScriptedRunner>,
    agents: StaticAgents,
    approval: Arc<dyn ApprovalUi>,
) -> WorkflowEngine {
    WorkflowEngine::new(supervisor(runner), Arc::new(agents), approval, project_root())
}

pub fn task(id: &str) -> TaskSpec {
    TaskSpec {
        id: id.to_string(),
        objective: format!("complete task {id}"),
        acceptance_criteria: vec!["tests pass".to_string()],
        files: Vec::new(),
        constraints: Vec::new(),
        context: Vec::new(),
        cwd: None,
    }
}

pub fn plan(waves: Vec<Vec<TaskSpec>>) -> WorkflowPlan {
    WorkflowPlan {
        goal: "ship the feature".to_string(),
        waves: waves
            .into_iter()
            .map(|tasks| WaveSpec { name: None, tasks })
            .collect(),
    }
}
