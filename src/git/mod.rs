use std::path::{Path, PathBuf};
use std::process::Command;

use crate::prompt::build_commit_prompt;

/// Result of one git invocation, with stdout/stderr already trimmed.
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

pub fn git_available() -> bool {
    which::which("git").is_ok()
}

/// Run a git command in `cwd`. A missing git binary degrades to exit code
/// 127 rather than an error, mirroring shell behavior.
pub fn run_git(args: &[&str], cwd: &Path) -> GitOutput {
    match Command::new("git").args(args).current_dir(cwd).output() {
        Ok(output) => GitOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        },
        Err(_) => GitOutput {
            code: 127,
            stdout: String::new(),
            stderr: "git not found in PATH".to_string(),
        },
    }
}

pub fn is_git_repo(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    let out = run_git(&["rev-parse", "--is-inside-work-tree"], path);
    out.success() && out.stdout == "true"
}

pub fn current_branch(repo: &Path) -> Option<String> {
    let out = run_git(&["rev-parse", "--abbrev-ref", "HEAD"], repo);
    if out.success() && !out.stdout.is_empty() {
        Some(out.stdout)
    } else {
        None
    }
}

/// Derive a checkout directory name from a clone URL.
pub fn derive_repo_name(url: &str) -> String {
    let base = url.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    let base = base.strip_suffix(".git").unwrap_or(base);
    if base.is_empty() {
        "repo".to_string()
    } else {
        base.to_string()
    }
}

/// Read a key from the global git config, empty string when unset.
pub fn read_git_config(key: &str) -> String {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let out = run_git(&["config", "--global", key], &cwd);
    if out.success() {
        out.stdout
    } else {
        String::new()
    }
}

/// Paths of the usual ssh keys that exist on this machine.
pub fn ssh_key_status() -> Vec<PathBuf> {
    let Some(base) = directories::BaseDirs::new() else {
        return Vec::new();
    };
    ["id_ed25519", "id_rsa"]
        .iter()
        .map(|name| base.home_dir().join(".ssh").join(name))
        .filter(|path| path.exists())
        .collect()
}

/// Gather the short status and diff for `repo` and build the suggestion
/// prompt from them. The staged diff is preferred; the working-tree diff is
/// the fallback when nothing is staged.
pub fn collect_commit_context(repo: &Path) -> String {
    let status = run_git(&["status", "-s"], repo);
    let staged = run_git(&["diff", "--cached"], repo);
    let diff = if staged.stdout.is_empty() {
        run_git(&["diff"], repo).stdout
    } else {
        staged.stdout
    };
    build_commit_prompt(&status.stdout, &diff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_repo_name_basic() {
        assert_eq!(derive_repo_name("https://github.com/example/repo.git"), "repo");
        assert_eq!(derive_repo_name("https://github.com/example/repo/"), "repo");
        assert_eq!(derive_repo_name("repo"), "repo");
    }

    #[test]
    fn test_derive_repo_name_ssh_url() {
        assert_eq!(derive_repo_name("git@github.com:example/tools.git"), "tools");
    }

    #[test]
    fn test_derive_repo_name_empty_falls_back() {
        assert_eq!(derive_repo_name(""), "repo");
        assert_eq!(derive_repo_name("///"), "repo");
    }

    #[test]
    fn test_is_git_repo_rejects_plain_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_git_repo(dir.path()));
        assert!(!is_git_repo(&dir.path().join("missing")));
    }
}
