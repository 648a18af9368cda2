use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellType {
    Bash,
    Zsh,
    /// POSIX sh and anything unrecognised, configured through `~/.profile`.
    Sh,
}

impl ShellType {
    /// Classify a login shell path such as `/usr/bin/zsh`.
    #[must_use]
    pub fn from_shell_path(shell: Option<&str>) -> Self {
        let name = shell
            .and_then(|shell| Path::new(shell).file_name())
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        match name {
            "bash" => ShellType::Bash,
            "zsh" => ShellType::Zsh,
            _ => ShellType::Sh,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ShellType::Bash => "bash",
            ShellType::Zsh => "zsh",
            ShellType::Sh => "sh",
        }
    }

    /// Candidate startup files in order of preference.
    #[must_use]
    pub fn config_files(&self, home: &Path) -> Vec<PathBuf> {
        match self {
            ShellType::Bash => vec![
                home.join(".bashrc"),
                home.join(".bash_profile"),
                home.join(".profile"),
            ],
            ShellType::Zsh => vec![home.join(".zshrc"), home.join(".zprofile")],
            ShellType::Sh => vec![home.join(".profile")],
        }
    }

    /// The first existing startup file, or the preferred one when none exist.
    #[must_use]
    pub fn profile_path(&self, home: &Path) -> PathBuf {
        let candidates = self.config_files(home);
        candidates
            .iter()
            .find(|path| path.exists())
            .cloned()
            .unwrap_or_else(|| candidates[0].clone())
    }
}
