use serde_derive::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// What a step launches. A TOML string goes through the host shell, an array
/// is spawned directly as an argument vector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StepCommand {
    Shell(String),
    Argv(Vec<String>),
}

impl fmt::Display for StepCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepCommand::Shell(line) => f.write_str(line),
            StepCommand::Argv(args) => f.write_str(&args.join(" ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    pub label: Option<String>,
    pub command: StepCommand,
    #[serde(default)]
    pub continue_on_failure: bool,
    /// Printed when this step stops the run.
    pub abort_message: Option<String>,
}

#[cfg(test)]
impl Step {
    pub fn shell(label: &str, command: &str) -> Self {
        Step {
            label: Some(label.to_owned()),
            command: StepCommand::Shell(command.to_owned()),
            continue_on_failure: false,
            abort_message: None,
        }
    }

    pub fn continue_on_failure(mut self) -> Self {
        self.continue_on_failure = true;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pipeline {
    pub name: String,
    pub title: Option<String>,
    pub artifact_dir: Option<PathBuf>,
    #[serde(default)]
    pub artifact_extensions: Vec<String>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Pipeline {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}
