use crate::output::{format_bytes, format_seconds, symbols, Palette};
use crate::runner::{RunReport, RunState, StepResult};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub name: String,
    pub size_bytes: u64,
}

/// Outcome of looking for build outputs. Only `Found` lists anything; the
/// other variants are reported as warnings.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactScan {
    Found(Vec<Artifact>),
    NoMatches,
    MissingDir,
    Unreadable(String),
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub artifacts: Option<ArtifactScan>,
    pub text: String,
}

/// Lists regular files directly inside `dir` whose names end with one of
/// `extensions`, sorted by name. Subdirectories are not searched.
pub fn scan(dir: &Path, extensions: &[String]) -> ArtifactScan {
    if !dir.is_dir() {
        return ArtifactScan::MissingDir;
    }
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => return ArtifactScan::Unreadable(e.to_string()),
    };

    let mut artifacts: Vec<Artifact> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            // Follows symlinks, so a linked installer is listed with its target's size.
            let metadata = std::fs::metadata(entry.path()).ok()?;
            if !metadata.is_file() {
                return None;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
                return None;
            }
            Some(Artifact {
                name,
                size_bytes: metadata.len(),
            })
        })
        .collect();
    debug!(dir = %dir.display(), count = artifacts.len(), "scanned artifact directory");

    if artifacts.is_empty() {
        ArtifactScan::NoMatches
    } else {
        artifacts.sort_by(|a, b| a.name.cmp(&b.name));
        ArtifactScan::Found(artifacts)
    }
}

pub fn summarize(
    report: &RunReport,
    artifact_dir: Option<&Path>,
    extensions: &[String],
    palette: &Palette,
) -> Summary {
    let elapsed = format_seconds(report.total_elapsed_seconds());
    let mut lines = vec![String::new()];

    if report.succeeded() {
        lines.push(palette.success_banner(&format!("Build complete! ({})", elapsed)));
    } else {
        lines.push(palette.error_banner(&format!("Build failed ({})", elapsed)));
    }
    lines.push(String::new());

    for result in &report.results {
        lines.push(step_line(result, palette));
    }
    match report.state {
        RunState::Aborted { index } | RunState::Interrupted { index } => {
            lines.push(palette.error(&format!("Stopped at step {}", index + 1)))
        }
        RunState::Completed => {}
    }
    if !report.results.is_empty() {
        lines.push(String::new());
    }

    let artifacts = artifact_dir.map(|dir| {
        let scan = scan(dir, extensions);
        match &scan {
            ArtifactScan::Found(found) => {
                lines.push(palette.success(&format!("Artifact(s) found in {}:", dir.display())));
                for artifact in found {
                    lines.push(format!(
                        "    {} {}  ({})",
                        symbols::PACKAGE,
                        artifact.name,
                        format_bytes(artifact.size_bytes)
                    ));
                }
            }
            ArtifactScan::NoMatches => lines.push(palette.warn(&format!(
                "No artifact files found in {}. Check the build output.",
                dir.display()
            ))),
            ArtifactScan::MissingDir => lines.push(palette.warn(&format!(
                "Artifact directory not found: {}",
                dir.display()
            ))),
            ArtifactScan::Unreadable(reason) => lines.push(palette.warn(&format!(
                "Could not read artifact directory {}: {}",
                dir.display(),
                reason
            ))),
        }
        lines.push(String::new());
        scan
    });

    Summary {
        artifacts,
        text: lines.join("\n"),
    }
}

fn step_line(result: &StepResult, palette: &Palette) -> String {
    let name = result.label.as_deref().unwrap_or(&result.command);
    let elapsed = format_seconds(result.elapsed_seconds());
    let msg = match result.exit_code() {
        Some(code) if code != 0 => {
            format!("{}. {}  ({}, exit {})", result.index + 1, name, elapsed, code)
        }
        _ => format!("{}. {}  ({})", result.index + 1, name, elapsed),
    };
    if result.succeeded() {
        palette.success(&msg)
    } else if result.tolerated() || result.interrupted() {
        palette.warn(&msg)
    } else {
        palette.error(&msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::StepStatus;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn result(index: usize, label: &str, status: StepStatus) -> StepResult {
        StepResult {
            index,
            label: Some(label.to_owned()),
            command: format!("npm run {}", label),
            status,
            elapsed: Duration::from_millis(1500),
            continue_on_failure: false,
        }
    }

    fn report(results: Vec<StepResult>, state: RunState) -> RunReport {
        RunReport {
            results,
            total_elapsed: Duration::from_secs(3),
            state,
        }
    }

    fn release_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("a.exe"))
            .unwrap()
            .set_len(2 * 1024 * 1024)
            .unwrap();
        std::fs::write(dir.path().join("b.txt"), "notes").unwrap();
        dir
    }

    #[test]
    fn scan_filters_by_extension() {
        let dir = release_dir();
        let scan = scan(dir.path(), &exts(&[".exe", ".msi"]));
        assert_eq!(
            scan,
            ArtifactScan::Found(vec![Artifact {
                name: "a.exe".to_owned(),
                size_bytes: 2_097_152,
            }])
        );
    }

    #[test]
    fn scan_is_shallow_and_sorted() {
        let dir = release_dir();
        std::fs::write(dir.path().join("0-first.msi"), "x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("deep.exe"), "x").unwrap();
        std::fs::create_dir(dir.path().join("folder.exe")).unwrap();

        match scan(dir.path(), &exts(&[".exe", ".msi"])) {
            ArtifactScan::Found(found) => {
                let names: Vec<&str> = found.iter().map(|a| a.name.as_str()).collect();
                assert_eq!(names, vec!["0-first.msi", "a.exe"]);
            }
            other => panic!("unexpected scan {:?}", other),
        }
    }

    #[test]
    fn scan_without_matches() {
        let dir = release_dir();
        assert_eq!(scan(dir.path(), &exts(&[".dmg"])), ArtifactScan::NoMatches);
        assert_eq!(scan(dir.path(), &[]), ArtifactScan::NoMatches);
    }

    #[cfg(unix)]
    #[test]
    fn scan_follows_symlinks() {
        let dir = release_dir();
        let target = TempDir::new().unwrap();
        let installer = target.path().join("setup.msi");
        File::create(&installer).unwrap().set_len(4096).unwrap();
        std::os::unix::fs::symlink(&installer, dir.path().join("setup.msi")).unwrap();
        std::os::unix::fs::symlink(target.path(), dir.path().join("linked.exe")).unwrap();

        match scan(dir.path(), &exts(&[".exe", ".msi"])) {
            ArtifactScan::Found(found) => {
                assert_eq!(found.len(), 2);
                assert_eq!(found[1].name, "setup.msi");
                assert_eq!(found[1].size_bytes, 4096);
            }
            other => panic!("unexpected scan {:?}", other),
        }
    }

    #[test]
    fn scan_missing_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("release");
        assert_eq!(scan(&missing, &exts(&[".exe"])), ArtifactScan::MissingDir);
    }

    #[test]
    fn summarize_success_with_artifacts() {
        let dir = release_dir();
        let report = report(
            vec![result(0, "install", StepStatus::Succeeded)],
            RunState::Completed,
        );
        let summary = summarize(
            &report,
            Some(dir.path()),
            &exts(&[".exe", ".msi"]),
            &Palette::plain(),
        );

        assert!(summary.text.contains("Build complete! (3.0s)"));
        assert!(summary.text.contains("✓ 1. install  (1.5s)"));
        assert!(summary.text.contains("📦 a.exe  (2.0 MB)"));
        assert!(!summary.text.contains("b.txt"));
        match summary.artifacts {
            Some(ArtifactScan::Found(ref found)) => assert_eq!(found.len(), 1),
            ref other => panic!("unexpected scan {:?}", other),
        }
    }

    #[test]
    fn summarize_missing_dir_warns() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("release");
        let report = report(vec![], RunState::Completed);
        let summary = summarize(&report, Some(&missing), &exts(&[".exe"]), &Palette::plain());

        assert_eq!(summary.artifacts, Some(ArtifactScan::MissingDir));
        assert!(summary.text.contains("⚠ Artifact directory not found"));
    }

    #[test]
    fn summarize_no_matches_warns() {
        let dir = release_dir();
        let report = report(vec![], RunState::Completed);
        let summary = summarize(&report, Some(dir.path()), &exts(&[".dmg"]), &Palette::plain());

        assert_eq!(summary.artifacts, Some(ArtifactScan::NoMatches));
        assert!(summary.text.contains("⚠ No artifact files found in"));
        assert!(summary.text.contains("Build complete!"));
        assert!(!summary.text.contains("📦"));
    }

    #[test]
    fn summarize_failed_run() {
        let mut tolerated = result(0, "lint", StepStatus::Exited(1));
        tolerated.continue_on_failure = true;
        let report = report(
            vec![tolerated, result(1, "build", StepStatus::Exited(2))],
            RunState::Aborted { index: 1 },
        );
        let summary = summarize(&report, None, &[], &Palette::plain());

        assert!(summary.artifacts.is_none());
        assert!(summary.text.contains("Build failed (3.0s)"));
        assert!(summary.text.contains("⚠ 1. lint  (1.5s, exit 1)"));
        assert!(summary.text.contains("✗ 2. build  (1.5s, exit 2)"));
        assert!(summary.text.contains("✗ Stopped at step 2"));
    }

    #[test]
    fn unlabeled_step_shows_command() {
        let mut unlabeled = result(0, "dev", StepStatus::Succeeded);
        unlabeled.label = None;
        let report = report(vec![unlabeled], RunState::Completed);
        let summary = summarize(&report, None, &[], &Palette::plain());
        assert!(summary.text.contains("✓ 1. npm run dev  (1.5s)"));
    }
}
