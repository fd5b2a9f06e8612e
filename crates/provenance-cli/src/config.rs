// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Configuration for the provenance binary
//!
//! This module provides the command-line configuration: which repository to
//! read, which backend reads it, how dirty work trees are flagged, logging
//! verbosity, and the report subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use provenance_git::Backend;
use provenance_git::description::DEFAULT_DIRTY_SUFFIX;
use provenance_git::process::DEFAULT_PROGRAM;
use provenance_git::repository::DEFAULT_HEAD;

/// Default `strftime` format for dates in reports
pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y %I:%M %p %z";

/// Provenance - build metadata and history reports from git
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "provenance")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Report to produce (defaults to `info`)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Work tree (or any directory inside it) to read
    ///
    /// Defaults to the current working directory.
    #[arg(short, long, env = "PROVENANCE_REPOSITORY")]
    pub repository: Option<PathBuf>,

    /// Explicit git metadata directory
    ///
    /// Skips discovery; `--repository` is then used as the work tree.
    #[arg(long, env = "PROVENANCE_GIT_DIR")]
    pub git_dir: Option<PathBuf>,

    /// Backend used to read the repository
    #[arg(long, value_enum, default_value_t, env = "PROVENANCE_BACKEND")]
    pub backend: BackendKind,

    /// Git executable used by the process backend
    #[arg(long, env = "PROVENANCE_GIT_PROGRAM")]
    pub git_program: Option<String>,

    /// Ref treated as the current commit
    #[arg(long, env = "PROVENANCE_HEAD")]
    pub head: Option<String>,

    /// Suffix appended to ids and descriptions of a dirty work tree
    ///
    /// The literal values `false` and `null` disable the dirty check.
    #[arg(long, env = "PROVENANCE_DIRTY_FLAG")]
    pub dirty_flag: Option<String>,

    /// Ignore untracked files when deciding whether the work tree is dirty
    #[arg(long, default_value = "false")]
    pub ignore_untracked: bool,

    /// Print nothing and succeed when no repository is found
    #[arg(long, default_value = "false", env = "PROVENANCE_SKIP_NO_GIT")]
    pub skip_no_git: bool,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr so report output on stdout stays clean.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

/// Backend selection on the command line
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Embedded git2 library
    #[default]
    Library,
    /// External `git` executable
    Process,
}

/// Available reports
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Build information: branch, commit ids, describe string, dirty flag
    Info {
        /// Emit JSON instead of `key=value` lines
        #[arg(long)]
        json: bool,

        /// `strftime` format for the commit timestamps
        #[arg(long, default_value = DEFAULT_DATE_FORMAT)]
        date_format: String,
    },

    /// Changelog grouped by tagged versions
    Changelog {
        /// Print only the version lines of tagged commits, not their subjects
        #[arg(long)]
        skip_tagged: bool,

        /// Leave out commits whose message matches this regular expression
        #[arg(long)]
        skip_commits_matching: Option<String>,

        /// `strftime` format for tag dates
        #[arg(long, default_value = DEFAULT_DATE_FORMAT)]
        date_format: String,

        /// Stop after this many commits
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Contributors ranked by commits
    Contributors {
        /// Sort order
        #[arg(long, value_enum, default_value_t)]
        sort: ContributorSort,

        /// Show each contributor's email address
        #[arg(long)]
        show_email: bool,

        /// Hide commit counts
        #[arg(long)]
        no_counts: bool,
    },

    /// Fail unless the repository is in a releasable state
    Check {
        /// Branch HEAD must be on
        #[arg(long)]
        branch: Option<String>,

        /// Allow a dirty work tree
        #[arg(long)]
        allow_dirty: bool,

        /// Regular expression the HEAD commit message must match
        #[arg(long)]
        commit_message: Option<String>,

        /// Require HEAD to carry an annotated tag
        #[arg(long)]
        require_tag: bool,
    },
}

/// Contributor ordering
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContributorSort {
    /// Most commits first
    #[default]
    Count,
    /// Alphabetically by canonical name
    Name,
    /// Earliest first commit first
    Date,
}

impl Default for Command {
    fn default() -> Self {
        Self::Info {
            json: false,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl Config {
    /// The report to run, `info` when none was given
    #[must_use]
    pub fn report(&self) -> Command {
        self.command.clone().unwrap_or_default()
    }

    /// Get the repository path, using current directory as default
    ///
    /// Returns `None` if no repository is specified and the current
    /// directory cannot be determined.
    #[must_use]
    pub fn repository_path(&self) -> Option<PathBuf> {
        self.repository
            .clone()
            .or_else(|| std::env::current_dir().ok())
    }

    /// The repository backend described by `--backend` and `--git-program`
    #[must_use]
    pub fn backend(&self) -> Backend {
        match self.backend {
            BackendKind::Library => Backend::Library,
            BackendKind::Process => Backend::Process {
                program: self
                    .git_program
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PROGRAM.to_string()),
            },
        }
    }

    /// Ref treated as HEAD
    #[must_use]
    pub fn head_ref(&self) -> &str {
        self.head.as_deref().unwrap_or(DEFAULT_HEAD)
    }

    /// Dirty suffix, or `None` when the dirty check is disabled
    #[must_use]
    pub fn dirty_suffix(&self) -> Option<&str> {
        match self.dirty_flag.as_deref() {
            None => Some(DEFAULT_DIRTY_SUFFIX),
            Some("false" | "null") => None,
            Some(flag) => Some(flag),
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the repository or git directory is specified
    /// but doesn't exist or isn't a directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref repository) = self.repository {
            if !repository.exists() {
                return Err(ConfigError::RepositoryNotFound(repository.clone()));
            }
            if !repository.is_dir() {
                return Err(ConfigError::RepositoryNotDirectory(repository.clone()));
            }
        }

        if let Some(ref git_dir) = self.git_dir {
            if !git_dir.is_dir() {
                return Err(ConfigError::GitDirNotDirectory(git_dir.clone()));
            }
        }

        if self.git_program.is_some() && self.backend != BackendKind::Process {
            return Err(ConfigError::GitProgramWithoutProcessBackend);
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Repository path not found
    #[error("Repository path not found: {0}")]
    RepositoryNotFound(PathBuf),

    /// Repository path is not a directory
    #[error("Repository path is not a directory: {0}")]
    RepositoryNotDirectory(PathBuf),

    /// Git directory missing or not a directory
    #[error("Git directory is not a directory: {0}")]
    GitDirNotDirectory(PathBuf),

    /// `--git-program` given while reading through the library
    #[error("--git-program requires --backend process")]
    GitProgramWithoutProcessBackend,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.command.is_none());
        assert!(config.repository.is_none());
        assert!(config.git_dir.is_none());
        assert_eq!(config.backend, BackendKind::Library);
        assert!(!config.verbose);
        assert!(!config.quiet);
        assert!(!config.skip_no_git);
        assert!(!config.ignore_untracked);
    }

    #[test]
    fn test_default_command_is_info() {
        let config = Config::default();
        assert!(matches!(config.report(), Command::Info { json: false, .. }));
    }

    #[test]
    fn test_repository_path_default() {
        let config = Config::default();
        // Should fallback to current directory
        assert!(config.repository_path().is_some());
    }

    #[test]
    fn test_repository_path_custom() {
        let custom = PathBuf::from("/tmp");
        let config = Config {
            repository: Some(custom.clone()),
            ..Default::default()
        };
        assert_eq!(config.repository_path(), Some(custom));
    }

    #[test]
    fn test_backend_library_default() {
        assert_eq!(Config::default().backend(), Backend::Library);
    }

    #[test]
    fn test_backend_process_program() {
        let config = Config {
            backend: BackendKind::Process,
            ..Default::default()
        };
        assert_eq!(config.backend(), Backend::process());

        let config = Config {
            backend: BackendKind::Process,
            git_program: Some("/opt/git/bin/git".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.backend(),
            Backend::Process {
                program: "/opt/git/bin/git".to_string()
            }
        );
    }

    #[test]
    fn test_head_ref_default() {
        assert_eq!(Config::default().head_ref(), "HEAD");
        let config = Config {
            head: Some("release".to_string()),
            ..Default::default()
        };
        assert_eq!(config.head_ref(), "release");
    }

    #[test]
    fn test_dirty_suffix() {
        assert_eq!(Config::default().dirty_suffix(), Some("-dirty"));
        for disabled in ["false", "null"] {
            let config = Config {
                dirty_flag: Some(disabled.to_string()),
                ..Default::default()
            };
            assert_eq!(config.dirty_suffix(), None);
        }
        let config = Config {
            dirty_flag: Some("+wip".to_string()),
            ..Default::default()
        };
        assert_eq!(config.dirty_suffix(), Some("+wip"));
    }

    #[test]
    fn test_log_level_default() {
        let config = Config::default();
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_log_level_verbose() {
        let config = Config {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_log_level_quiet() {
        let config = Config {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(config.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_validate_nonexistent_repository() {
        let config = Config {
            repository: Some(PathBuf::from("/nonexistent/path/12345")),
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::RepositoryNotFound(_))));
    }

    #[test]
    fn test_validate_repository_is_file() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let config = Config {
            repository: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::RepositoryNotDirectory(_))));
    }

    #[test]
    fn test_validate_valid_repository() {
        let config = Config {
            repository: Some(PathBuf::from("/tmp")),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_git_dir() {
        let config = Config {
            git_dir: Some(PathBuf::from("/nonexistent/.git")),
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::GitDirNotDirectory(_))));
    }

    #[test]
    fn test_validate_git_program_needs_process_backend() {
        let config = Config {
            git_program: Some("git".to_string()),
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::GitProgramWithoutProcessBackend)
        ));
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
