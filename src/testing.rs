//! Scripted stand-ins for the terminal, the environment, and the probe.

use std::{
    collections::VecDeque,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{
    env::{appended_path, prepended_path, EnvContext, EnvError},
    operator::{is_yes, Operator},
    platform::PlatformProfile,
    probe::{ProbeStatus, Prober},
    tool::{InstallRecipe, ToolRequirement},
};

/// Replays canned answers. An exhausted script behaves like closed input.
#[derive(Default)]
pub struct ScriptedOperator {
    answers: Mutex<VecDeque<String>>,
    pub questions: Mutex<Vec<String>>,
    pub messages: Mutex<Vec<String>>,
    progress: Mutex<usize>,
    hang_when_empty: bool,
}

impl ScriptedOperator {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            ..Self::default()
        }
    }

    /// Like `new`, but once the script runs out a prompt waits forever, the
    /// way a terminal does while nobody types.
    pub fn hanging(answers: &[&str]) -> Self {
        Self {
            hang_when_empty: true,
            ..Self::new(answers)
        }
    }

    async fn next_answer(&self, question: &str) -> Option<String> {
        self.questions.lock().unwrap().push(question.to_string());
        let answer = self.answers.lock().unwrap().pop_front();
        if answer.is_none() && self.hang_when_empty {
            std::future::pending::<()>().await;
        }
        answer
    }

    pub fn said(&self, text: &str) -> bool {
        self.messages.lock().unwrap().iter().any(|m| m.contains(text))
    }

    pub fn asked(&self) -> usize {
        self.questions.lock().unwrap().len()
    }

    pub fn progress_calls(&self) -> usize {
        *self.progress.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Operator for ScriptedOperator {
    async fn ask_yes_no(&self, question: &str) -> bool {
        self.next_answer(question).await.map_or(false, |a| is_yes(&a))
    }

    async fn ask_line(&self, prompt: &str) -> Option<String> {
        self.next_answer(prompt).await.map(|a| a.trim().to_string())
    }

    fn show_progress(&self, _received: u64, _total: Option<u64>) {
        *self.progress.lock().unwrap() += 1;
    }

    fn show_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// In-memory search path; persisted directories are recorded instead of
/// written anywhere.
#[derive(Default)]
pub struct FakeEnv {
    pub search_path: OsString,
    pub persisted: Vec<PathBuf>,
    pub refuse_persist: bool,
}

impl FakeEnv {
    pub fn contains(&self, dir: &Path) -> bool {
        std::env::split_paths(&self.search_path).any(|p| p == dir)
    }
}

#[async_trait::async_trait]
impl EnvContext for FakeEnv {
    fn search_path(&self) -> OsString {
        self.search_path.clone()
    }

    fn append_to_search_path(&mut self, dir: &Path) -> Result<(), EnvError> {
        self.search_path = appended_path(&self.search_path, dir)?;
        Ok(())
    }

    fn prepend_to_search_path(&mut self, dir: &Path) -> Result<(), EnvError> {
        self.search_path = prepended_path(&self.search_path, dir)?;
        Ok(())
    }

    async fn persist_search_path(&mut self, dir: &Path) -> Result<(), EnvError> {
        if self.refuse_persist {
            return Err(EnvError::Unsupported(PlatformProfile::LinuxLike));
        }
        self.persisted.push(dir.to_path_buf());
        Ok(())
    }
}

/// A tool counts as present when a search path directory holds a file named
/// after it (or after each of its archive executables), or when it is listed
/// in `installed`. Tools in `absent_once` are reported missing on their first
/// probe and present afterwards. Files found first in one of `broken_dirs`
/// make the tool `Broken`.
#[derive(Default)]
pub struct FakeProber {
    pub installed: Mutex<Vec<String>>,
    pub absent_once: Mutex<Vec<String>>,
    pub broken_dirs: Vec<PathBuf>,
    pub probes: Mutex<Vec<String>>,
}

impl FakeProber {
    pub fn with(installed: &[&str]) -> Self {
        Self {
            installed: Mutex::new(installed.iter().map(|s| s.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn probe_count(&self) -> usize {
        self.probes.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Prober for FakeProber {
    async fn probe(&self, tool: &ToolRequirement, search_path: &OsStr) -> ProbeStatus {
        self.probes.lock().unwrap().push(tool.name.clone());

        {
            let mut absent_once = self.absent_once.lock().unwrap();
            if let Some(i) = absent_once.iter().position(|t| *t == tool.name) {
                absent_once.remove(i);
                self.installed.lock().unwrap().push(tool.name.clone());
                return ProbeStatus::Absent;
            }
        }

        if self.installed.lock().unwrap().contains(&tool.name) {
            return ProbeStatus::Present {
                version: "1.0".to_string(),
            };
        }

        let files = match &tool.recipe {
            InstallRecipe::Archive { executables, .. } => executables.clone(),
            InstallRecipe::PythonPackage { .. } => vec![tool.name.clone()],
        };
        let found = std::env::split_paths(search_path)
            .find(|dir| files.iter().all(|f| dir.join(f).is_file()));

        match found {
            Some(dir) if self.broken_dirs.contains(&dir) => ProbeStatus::Broken {
                reason: format!("{} exited with 1", dir.display()),
            },
            Some(_) => ProbeStatus::Present {
                version: "1.0".to_string(),
            },
            None => ProbeStatus::Absent,
        }
    }
}
