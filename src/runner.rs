//! Sequential step runner.
//!
//! Steps run one at a time as child processes that inherit the terminal, so
//! tool output shows up live. The first failure of a step that is not marked
//! `continue_on_failure` stops the run. A Ctrl-C stops it as well, and the
//! caller is expected to exit without a summary.

use crate::interrupt::InterruptFlag;
use crate::models::Step;
use crate::output::{format_seconds, Palette};
use crate::shell;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub palette: Palette,
    pub working_dir: PathBuf,
    /// Overrides the platform shell used for string commands.
    pub shell: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepStatus {
    Succeeded,
    Exited(i32),
    LaunchFailed(String),
    /// Killed by a signal other than an interrupt.
    Terminated,
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub index: usize,
    pub label: Option<String>,
    pub command: String,
    pub status: StepStatus,
    pub elapsed: Duration,
    pub continue_on_failure: bool,
}

impl StepResult {
    pub fn succeeded(&self) -> bool {
        self.status == StepStatus::Succeeded
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            StepStatus::Succeeded => Some(0),
            StepStatus::Exited(code) => Some(code),
            _ => None,
        }
    }

    pub fn interrupted(&self) -> bool {
        self.status == StepStatus::Interrupted
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// A failure that does not count against the run.
    pub fn tolerated(&self) -> bool {
        !self.succeeded() && !self.interrupted() && self.continue_on_failure
    }

    fn ok_for_run(&self) -> bool {
        self.succeeded() || self.tolerated()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunState {
    Completed,
    Aborted { index: usize },
    Interrupted { index: usize },
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub results: Vec<StepResult>,
    pub total_elapsed: Duration,
    pub state: RunState,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        match self.state {
            RunState::Interrupted { .. } => false,
            _ => self.results.iter().all(StepResult::ok_for_run),
        }
    }

    pub fn interrupted(&self) -> bool {
        matches!(self.state, RunState::Interrupted { .. })
    }

    pub fn total_elapsed_seconds(&self) -> f64 {
        self.total_elapsed.as_secs_f64()
    }
}

pub struct Runner<W: Write> {
    config: RunnerConfig,
    interrupt: InterruptFlag,
    out: W,
}

impl<W: Write> Runner<W> {
    pub fn new(config: RunnerConfig, interrupt: InterruptFlag, out: W) -> Self {
        Runner {
            config,
            interrupt,
            out,
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    pub fn run(&mut self, steps: &[Step]) -> RunReport {
        let started = Instant::now();
        let mut results = Vec::with_capacity(steps.len());
        let mut state = RunState::Completed;

        for (index, step) in steps.iter().enumerate() {
            let result = if self.interrupt.is_raised() {
                StepResult {
                    index,
                    label: step.label.clone(),
                    command: step.command.to_string(),
                    status: StepStatus::Interrupted,
                    elapsed: Duration::default(),
                    continue_on_failure: step.continue_on_failure,
                }
            } else {
                self.run_step(index, step)
            };
            let stop = if result.interrupted() {
                self.say(self.config.palette.warn("Interrupted by user."));
                Some(RunState::Interrupted { index })
            } else if !result.ok_for_run() {
                let message = step
                    .abort_message
                    .clone()
                    .unwrap_or_else(|| format!("Step {} failed. Aborting.", index + 1));
                self.say(self.config.palette.error(&message));
                Some(RunState::Aborted { index })
            } else {
                None
            };
            results.push(result);

            if let Some(stop) = stop {
                state = stop;
                break;
            }
        }

        RunReport {
            results,
            total_elapsed: started.elapsed(),
            state,
        }
    }

    fn run_step(&mut self, index: usize, step: &Step) -> StepResult {
        let palette = self.config.palette;
        if let Some(label) = &step.label {
            self.say(palette.step(label));
        }
        let command_line = step.command.to_string();
        self.say(palette.command(&command_line));
        let _ = self.out.flush();

        let started = Instant::now();
        let status = self.launch(index, step);
        let elapsed = started.elapsed();
        debug!(index, status = ?status, elapsed = elapsed.as_secs_f64(), "step finished");

        match &status {
            StepStatus::Succeeded => {
                self.say(palette.success(&format!(
                    "Done in {}",
                    format_seconds(elapsed.as_secs_f64())
                )));
                self.say(String::new());
            }
            StepStatus::Exited(code) => {
                self.say(palette.error(&format!("Command failed with exit code {}", code)))
            }
            StepStatus::LaunchFailed(reason) => {
                self.say(palette.error(&format!("Failed to launch command: {}", reason)))
            }
            StepStatus::Terminated => self.say(palette.error("Command terminated by a signal")),
            StepStatus::Interrupted => {}
        }
        let failed = !matches!(status, StepStatus::Succeeded | StepStatus::Interrupted);
        if failed && step.continue_on_failure {
            self.say(palette.warn("Continuing despite failure."));
            self.say(String::new());
        }

        StepResult {
            index,
            label: step.label.clone(),
            command: command_line,
            status,
            elapsed,
            continue_on_failure: step.continue_on_failure,
        }
    }

    fn launch(&self, index: usize, step: &Step) -> StepStatus {
        let mut command = match shell::command(
            &step.command,
            self.config.shell.as_deref(),
            &self.config.working_dir,
        ) {
            Some(command) => command,
            None => return StepStatus::LaunchFailed("empty command".to_owned()),
        };
        debug!(index, command = ?command, "spawning step");

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return StepStatus::LaunchFailed(e.to_string()),
        };

        // Poll so an interrupt can stop a child that ignores or never sees it.
        loop {
            if self.interrupt.is_raised() {
                debug!(index, pid = child.id(), "killing step after interrupt");
                let _ = child.kill();
                let _ = child.wait();
                return StepStatus::Interrupted;
            }
            match child.try_wait() {
                Ok(Some(exit)) => return self.classify(exit),
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return StepStatus::LaunchFailed(e.to_string());
                }
            }
        }
    }

    fn classify(&self, exit: ExitStatus) -> StepStatus {
        if self.interrupt.is_raised() || killed_by_interrupt(&exit) {
            return StepStatus::Interrupted;
        }
        match exit.code() {
            Some(0) => StepStatus::Succeeded,
            Some(code) => StepStatus::Exited(code),
            None => StepStatus::Terminated,
        }
    }

    // Progress lines are best-effort; a closed stdout must not fail the run.
    fn say(&mut self, line: String) {
        let _ = writeln!(self.out, "{}", line);
    }
}

#[cfg(unix)]
fn killed_by_interrupt(exit: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    const SIGINT: i32 = 2;
    exit.signal() == Some(SIGINT)
}

#[cfg(windows)]
fn killed_by_interrupt(exit: &ExitStatus) -> bool {
    const STATUS_CONTROL_C_EXIT: u32 = 0xC000_013A;
    exit.code() == Some(STATUS_CONTROL_C_EXIT as i32)
}

#[cfg(not(any(unix, windows)))]
fn killed_by_interrupt(_exit: &ExitStatus) -> bool {
    false
}
