//! Scripted command runner for tests.
//!
//! `ScriptedRunner` answers each command from the first rule whose prefix
//! matches the rendered command line, and records every invocation.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::commands::{CommandOutput, CommandRunner, CommandSpec, RunnerError};

struct Rule {
    prefix: String,
    responses: VecDeque<CommandOutput>,
}

#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `prefix` with `output`, every time.
    #[must_use]
    pub fn on(self, prefix: &str, output: CommandOutput) -> Self {
        self.on_sequence(prefix, vec![output])
    }

    /// Answer successive matching commands with `outputs` in order; the last
    /// response repeats once the others are used up.
    #[must_use]
    pub fn on_sequence(self, prefix: &str, outputs: Vec<CommandOutput>) -> Self {
        self.rules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(Rule {
                prefix: prefix.to_string(),
                responses: outputs.into(),
            });
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect()
    }

    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        !self.calls_starting_with(prefix).is_empty()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunnerError> {
        let line = spec.to_string();
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(line.clone());

        let mut rules = self
            .rules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(rule) = rules.iter_mut().find(|rule| line.starts_with(&rule.prefix)) else {
            return Ok(CommandOutput::ok(""));
        };

        let output = if rule.responses.len() > 1 {
            rule.responses.pop_front()
        } else {
            rule.responses.front().cloned()
        };
        Ok(output.unwrap_or_else(|| CommandOutput::ok("")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unmatched_commands_succeed_silently() {
        let runner = ScriptedRunner::new();

        let output = runner
            .run(&CommandSpec::new("true"))
            .await
            .expect("fake never fails to spawn");

        assert!(output.success());
        assert_eq!(runner.calls(), vec!["true".to_string()]);
    }

    #[tokio::test]
    async fn sequences_advance_then_repeat_last() {
        let runner = ScriptedRunner::new().on_sequence(
            "apt-get install",
            vec![CommandOutput::failed(100, "boom"), CommandOutput::ok("done")],
        );
        let spec = CommandSpec::new("apt-get").args(["install", "-y", "x"]);

        let first = runner.run(&spec).await.expect("first call");
        let second = runner.run(&spec).await.expect("second call");
        let third = runner.run(&spec).await.expect("third call");

        assert!(!first.success());
        assert!(second.success());
        assert!(third.success());
    }

    #[tokio::test]
    async fn first_matching_rule_wins() {
        let runner = ScriptedRunner::new()
            .on("sudo apt-get install -y curl", CommandOutput::failed(1, "no"))
            .on("sudo apt-get install", CommandOutput::ok(""));

        let curl = CommandSpec::new("apt-get")
            .args(["install", "-y", "curl"])
            .elevated(true);
        let git = CommandSpec::new("apt-get")
            .args(["install", "-y", "git"])
            .elevated(true);

        assert!(!runner.run(&curl).await.expect("curl").success());
        assert!(runner.run(&git).await.expect("git").success());
        assert_eq!(runner.calls_starting_with("sudo apt-get install").len(), 2);
    }
}
