//! Seam to the external narrative-generation service. The core hands it a
//! natural-language instruction and decodes whatever comes back; callers
//! always hold a structured fallback for undecodable answers.

use std::io::Write;
use std::process::{Command, Stdio};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Result, SleuthError};
use crate::settings::Settings;

pub const SUMMARIZER: &str = "anomaly-summarizer";
pub const REPORTER: &str = "report-writer";

pub trait Agent {
    fn ask(&self, agent_id: &str, instruction: &str) -> Result<String>;
}

/// Answers nothing, so every stage uses its local fallback.
pub struct OfflineAgent;

impl Agent for OfflineAgent {
    fn ask(&self, agent_id: &str, _instruction: &str) -> Result<String> {
        debug!(agent = agent_id, "offline agent, no response");
        Ok(String::new())
    }
}

/// Runs an external program: the agent id is appended as the last argument,
/// the instruction goes to stdin and stdout is the response.
pub struct CommandAgent {
    program: String,
    args: Vec<String>,
}

impl CommandAgent {
    pub fn new(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| SleuthError::Settings("agent_command is empty".into()))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl Agent for CommandAgent {
    fn ask(&self, agent_id: &str, instruction: &str) -> Result<String> {
        let fail = |message: String| SleuthError::Collaborator {
            agent: agent_id.to_string(),
            message,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(agent_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| fail(format!("failed to start '{}': {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(instruction.as_bytes())
                .map_err(|e| fail(format!("failed to send instruction: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| fail(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fail(format!("exited with {}: {}", output.status, stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

pub fn build(settings: &Settings) -> Result<Box<dyn Agent>> {
    match settings.agent_command.as_deref().map(str::trim) {
        Some(cmd) if !cmd.is_empty() => Ok(Box::new(CommandAgent::new(cmd)?)),
        _ => Ok(Box::new(OfflineAgent)),
    }
}

/// Decode a JSON response, tolerating a surrounding ```json fence.
pub fn decode<T: DeserializeOwned>(response: &str) -> Option<T> {
    let trimmed = response.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(body.trim()).ok()
}
