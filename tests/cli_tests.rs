mod common;

use common::SAMPLE_TEXT;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct TestContext {
    dir: TempDir,
    corpus: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus.txt");
        fs::write(&corpus, SAMPLE_TEXT).unwrap();
        Self { dir, corpus }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_keyforge-evolve"))
            .arg("--corpus")
            .arg(&self.corpus)
            .args(args)
            .output()
            .expect("failed to launch binary")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_score_known_layouts() {
    let ctx = TestContext::new();
    let output = ctx.run(&["score"]);
    assert!(output.status.success(), "{:?}", output);

    let text = stdout(&output);
    for name in ["qwerty", "dvorak", "colemak", "workman"] {
        assert!(text.contains(name), "missing {} in\n{}", name, text);
    }
}

#[test]
fn test_score_rejects_bad_layout() {
    let ctx = TestContext::new();
    let output = ctx.run(&["score", "--layout", "abc"]);
    assert!(!output.status.success());
}

#[test]
fn test_evolve_then_resume() {
    let ctx = TestContext::new();
    let state = ctx.path("state.json");
    let state_arg = state.to_str().unwrap();

    let output = ctx.run(&[
        "evolve",
        "--population-size",
        "6",
        "--max-iterations",
        "2",
        "--workers",
        "2",
        "--seed",
        "3",
        "--state",
        state_arg,
    ]);
    assert!(output.status.success(), "{:?}", output);
    assert!(state.exists());
    assert!(stdout(&output).contains("completed"));

    let output = ctx.run(&["resume", "--from", state_arg, "--generations", "1"]);
    assert!(output.status.success(), "{:?}", output);

    let resumed = keyforge_evolve::state::RunState::load(&state).unwrap();
    assert_eq!(resumed.generation, 3);
    assert!(resumed.parent_run.is_some());
}

#[test]
fn test_missing_corpus_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_keyforge-evolve"))
        .args(["--corpus", "/definitely/not/here.txt", "score"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
