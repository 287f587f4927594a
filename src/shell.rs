use crate::models::StepCommand;
use std::path::Path;
use std::process::Command;

/// Builds the child process for a step. Shell commands run through `shell`
/// when given, otherwise the platform default.
pub fn command(step: &StepCommand, shell: Option<&str>, working_dir: &Path) -> Option<Command> {
    let mut command = match step {
        StepCommand::Shell(line) => {
            let (program, args) = shell_invocation(shell);
            let mut command = Command::new(program);
            command.args(args).arg(line);
            command
        }
        StepCommand::Argv(args) => {
            let (program, rest) = args.split_first()?;
            let mut command = Command::new(program);
            command.args(rest);
            command
        }
    };
    command.current_dir(working_dir);
    Some(command)
}

fn shell_invocation(shell: Option<&str>) -> (String, Vec<&'static str>) {
    if let Some(shell) = shell {
        let args = if shell.contains("powershell") || shell.contains("pwsh") {
            vec!["-NoProfile", "-Command"]
        } else if shell.contains("cmd") {
            vec!["/C"]
        } else {
            vec!["-c"]
        };
        return (shell.to_owned(), args);
    }

    if cfg!(windows) {
        ("cmd.exe".to_owned(), vec!["/C"])
    } else {
        ("/bin/sh".to_owned(), vec!["-c"])
    }
}
