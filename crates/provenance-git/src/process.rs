// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Repository backend driving the `git` executable
//!
//! Every read runs one `git` plumbing command and parses its output. The
//! parsers are public so they can be fuzzed without a repository.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use chrono::{DateTime, FixedOffset};
use tracing::{debug, trace, warn};

use crate::commit::{Commit, Identity, Signature, normalize_message, timestamp};
use crate::description::{DescribeOptions, TagDescription};
use crate::error::GitError;
use crate::library::MIN_ABBREV;
use crate::mailmap::MailMap;
use crate::repository::{DEFAULT_HEAD, GitRepository, HandleState, check_layout, short_ref_name};
use crate::tag::{Tag, TagDetails};
use crate::walk::{CommitWalkAction, WalkOptions, WalkSummary, walk};

/// Executable used when none is configured
pub const DEFAULT_PROGRAM: &str = "git";

/// Commits read per `git log` call when filling the commit cache
const PREFETCH_BATCH: usize = 1000;

const FIELD: char = '\x1f';
const RECORD: char = '\x1e';

const LOG_FORMAT: &str = "--format=%H%x1f%P%x1f%an%x1f%ae%x1f%ad%x1f%cn%x1f%ce%x1f%cd%x1f%B";
const TAG_STUB_FORMAT: &str = "--format=%(refname)%1f%(objecttype)%1f%(objectname)%1f%(*objecttype)%1f%(*objectname)%1e";
const TAG_DETAIL_FORMAT: &str = "--format=%(refname)%1f%(objecttype)%1f%(creatordate:raw)%1f%(taggername)%1f%(taggeremail)%1f%(contents)%1e";

/// How to run `git` against one repository
#[derive(Debug, Clone)]
struct Invocation {
    program: String,
    global: Vec<OsString>,
}

impl Invocation {
    fn in_directory(program: &str, path: &Path) -> Self {
        Self {
            program: program.to_string(),
            global: vec!["-C".into(), path.into()],
        }
    }

    fn with_git_dir(program: &str, git_dir: &Path, work_tree: Option<&Path>) -> Self {
        let mut global = vec![path_flag("--git-dir=", git_dir)];
        if let Some(work_tree) = work_tree {
            global.push(path_flag("--work-tree=", work_tree));
        }
        Self {
            program: program.to_string(),
            global,
        }
    }

    /// Run a command and return its raw output whatever the exit status
    fn output(&self, args: &[&str]) -> Result<Output, GitError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.global)
            .args(["-c", "color.ui=false", "-c", "log.showSignature=false"])
            .args(args)
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_OPTIONAL_LOCKS", "0")
            .env("GIT_NO_REPLACE_OBJECTS", "1");
        for variable in ["GIT_DIR", "GIT_WORK_TREE", "GIT_INDEX_FILE", "GIT_COMMON_DIR"] {
            cmd.env_remove(variable);
        }

        trace!(cmd = %self.display(args), "running git command");

        cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                warn!(program = %self.program, "git not found in PATH");
                GitError::ExecutableNotFound {
                    program: self.program.clone(),
                }
            } else {
                GitError::Io(e)
            }
        })
    }

    /// Run a command that must succeed and return its raw standard output
    fn run_bytes(&self, args: &[&str]) -> Result<Vec<u8>, GitError> {
        let output = self.output(args)?;
        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(self.failure(args, &output))
        }
    }

    /// Run a command that must succeed and return its standard output
    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        self.run_bytes(args).and_then(utf8)
    }

    /// Like `run`, but trims the output
    fn run_line(&self, args: &[&str]) -> Result<String, GitError> {
        self.run(args).map(|out| out.trim().to_string())
    }

    /// Run a quiet query; exit status 1 means "no answer"
    fn query(&self, args: &[&str]) -> Result<Option<String>, GitError> {
        let output = self.output(args)?;
        match output.status.code() {
            Some(0) => utf8(output.stdout).map(|out| Some(out.trim().to_string())),
            Some(1) => Ok(None),
            _ => Err(self.failure(args, &output)),
        }
    }

    fn failure(&self, args: &[&str], output: &Output) -> GitError {
        GitError::CommandFailed {
            command: self.display(args),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    fn display(&self, args: &[&str]) -> String {
        let global: Vec<_> = self.global.iter().map(|a| a.to_string_lossy()).collect();
        format!("{} {} {}", self.program, global.join(" "), args.join(" "))
    }
}

fn path_flag(flag: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push(path);
    arg
}

/// A repository read by running `git`
pub struct ProcessRepository {
    invocation: Invocation,
    git_dir: PathBuf,
    common_dir: PathBuf,
    work_tree: Option<PathBuf>,
    state: HandleState,
}

impl ProcessRepository {
    /// Discover the repository containing `path` using `git` from `PATH`
    ///
    /// # Errors
    ///
    /// `RepositoryNotFound` if `path` is not inside a repository,
    /// `ExecutableNotFound` if `git` cannot be started.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        Self::open_with(DEFAULT_PROGRAM, path)
    }

    /// Discover the repository containing `path` using the given executable
    ///
    /// # Errors
    ///
    /// See [`ProcessRepository::open`].
    pub fn open_with(program: &str, path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(not_found(path));
        }
        let discovery = Invocation::in_directory(program, path);
        let (git_dir, common_dir, bare) = locate(&discovery, path)?;
        let work_tree = if bare {
            None
        } else {
            Some(PathBuf::from(
                discovery
                    .run_line(&["rev-parse", "--show-toplevel"])
                    .map_err(|e| not_found_unless_missing(e, path))?,
            ))
        };
        Ok(Self::located(program, git_dir, common_dir, work_tree))
    }

    /// Open a repository from an explicit metadata directory
    ///
    /// Without a work tree, a non-bare repository uses the parent of
    /// `git_dir`.
    ///
    /// # Errors
    ///
    /// See [`ProcessRepository::open`].
    pub fn open_with_git_dir(
        program: &str,
        git_dir: impl AsRef<Path>,
        work_tree: Option<&Path>,
    ) -> Result<Self, GitError> {
        let git_dir = git_dir.as_ref();
        if !git_dir.is_dir() {
            return Err(not_found(git_dir));
        }
        if let Some(work_tree) = work_tree.filter(|dir| !dir.is_dir()) {
            return Err(not_found(work_tree));
        }
        let probe = Invocation::with_git_dir(program, git_dir, work_tree);
        let (git_dir, common_dir, bare) = locate(&probe, git_dir)?;
        let work_tree = match work_tree {
            Some(dir) => Some(dir.to_path_buf()),
            None if bare => None,
            None => git_dir.parent().map(Path::to_path_buf),
        };
        Ok(Self::located(program, git_dir, common_dir, work_tree))
    }

    fn located(
        program: &str,
        git_dir: PathBuf,
        common_dir: PathBuf,
        work_tree: Option<PathBuf>,
    ) -> Self {
        debug!(
            git_dir = %git_dir.display(),
            work_tree = ?work_tree,
            program,
            "opened repository with git executable"
        );
        Self {
            invocation: Invocation::with_git_dir(program, &git_dir, work_tree.as_deref()),
            git_dir,
            common_dir,
            work_tree,
            state: HandleState::new(),
        }
    }

    /// The invocation, provided the handle may be read
    fn git(&self) -> Result<&Invocation, GitError> {
        self.state.ensure_readable()?;
        Ok(&self.invocation)
    }

    /// Load `id` and up to a batch of its ancestors into the commit cache
    fn prefetch(&self, id: &str) -> Result<(), GitError> {
        let max_count = format!("--max-count={PREFETCH_BATCH}");
        let output = self
            .git()?
            .run(&[
                "log",
                "-z",
                "--date=raw",
                "--encoding=UTF-8",
                LOG_FORMAT,
                &max_count,
                id,
                "--",
            ])
            .map_err(|e| match e {
                GitError::CommandFailed { stderr, .. } => GitError::unresolvable(id, stderr),
                other => other,
            })?;
        let commits = parse_log_records(&output)?;
        debug!(from = %id, count = commits.len(), "prefetched commits");
        for commit in commits {
            self.state.cache_commit(commit);
        }
        Ok(())
    }

    fn tag_ref(tag: &Tag) -> String {
        format!("refs/tags/{}", tag.name)
    }
}

/// Decode captured output, which must be UTF-8
fn utf8(bytes: Vec<u8>) -> Result<String, GitError> {
    String::from_utf8(bytes).map_err(|e| GitError::parse("git output", e.to_string()))
}

/// Ask `git` where the metadata lives
fn locate(invocation: &Invocation, path: &Path) -> Result<(PathBuf, PathBuf, bool), GitError> {
    let output = invocation
        .run(&[
            "rev-parse",
            "--path-format=absolute",
            "--git-dir",
            "--git-common-dir",
            "--is-bare-repository",
        ])
        .map_err(|e| not_found_unless_missing(e, path))?;
    let mut lines = output.lines();
    let (Some(git_dir), Some(common_dir), Some(bare)) = (lines.next(), lines.next(), lines.next())
    else {
        return Err(GitError::parse("rev-parse output", output));
    };
    Ok((PathBuf::from(git_dir), PathBuf::from(common_dir), bare == "true"))
}

fn not_found(path: &Path) -> GitError {
    GitError::RepositoryNotFound {
        path: path.display().to_string(),
    }
}

fn not_found_unless_missing(error: GitError, path: &Path) -> GitError {
    match error {
        GitError::CommandFailed { stderr, .. } => {
            debug!(path = %path.display(), stderr = %stderr, "not a git repository");
            not_found(path)
        }
        other => other,
    }
}

impl GitRepository for ProcessRepository {
    fn check(&mut self) -> Result<(), GitError> {
        self.state.ensure_open()?;
        check_layout(&self.git_dir, &self.common_dir)?;
        self.invocation
            .run(&["rev-parse", "--git-dir"])
            .map_err(|e| GitError::RepositoryCorrupt {
                path: self.git_dir.display().to_string(),
                reason: e.to_string(),
            })?;
        self.state.mark_checked();
        debug!(git_dir = %self.git_dir.display(), "repository checked");
        Ok(())
    }

    fn is_checked(&self) -> bool {
        self.state.is_checked()
    }

    fn close(&mut self) {
        if !self.state.is_closed() {
            debug!(git_dir = %self.git_dir.display(), "closed repository");
        }
        self.state.close();
    }

    fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    fn head_ref(&self) -> &str {
        self.state.head_ref()
    }

    fn set_head_ref(&mut self, head_ref: &str) {
        self.state.set_head_ref(head_ref);
    }

    fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn work_tree(&self) -> Option<&Path> {
        self.work_tree.as_deref()
    }

    fn branch(&self) -> Result<String, GitError> {
        let git = self.git()?;
        if let Some(target) = git.query(&["symbolic-ref", "-q", DEFAULT_HEAD])? {
            return Ok(short_ref_name(&target).to_string());
        }
        git.query(&["rev-parse", "--verify", "-q", DEFAULT_HEAD])?
            .ok_or_else(|| GitError::unresolvable(DEFAULT_HEAD, "HEAD has no target"))
    }

    fn is_on_unborn_branch(&self) -> Result<bool, GitError> {
        let git = self.git()?;
        if self.head_ref() != DEFAULT_HEAD {
            self.resolve_commit_id(self.head_ref())?;
            return Ok(false);
        }
        let Some(target) = git.query(&["symbolic-ref", "-q", DEFAULT_HEAD])? else {
            return Ok(false);
        };
        Ok(git
            .query(&["show-ref", "--verify", "--quiet", &target])?
            .is_none())
    }

    fn resolve_commit_id(&self, reference: &str) -> Result<String, GitError> {
        let spec = format!("{reference}^{{commit}}");
        self.git()?
            .query(&["rev-parse", "--verify", "-q", &spec])?
            .filter(|id| Commit::is_valid_id(id))
            .ok_or_else(|| GitError::unresolvable(reference, "not a commit"))
    }

    fn find_commit(&self, id: &str) -> Result<Commit, GitError> {
        self.state.ensure_readable()?;
        if !Commit::is_valid_id(id) {
            return Err(GitError::unresolvable(id, "not a full commit id"));
        }
        if let Some(commit) = self.state.cached_commit(id) {
            return Ok(commit);
        }
        self.prefetch(id)?;
        self.state
            .cached_commit(id)
            .ok_or_else(|| GitError::unresolvable(id, "missing commit"))
    }

    fn abbreviated_commit_id(&self, commit: &Commit) -> Result<String, GitError> {
        let git = self.git()?;
        if let Some(abbreviation) = self.state.cached_abbreviation(&commit.id) {
            return Ok(abbreviation);
        }
        let short = format!("--short={MIN_ABBREV}");
        let abbreviation = git.run_line(&["rev-parse", &short, &commit.id])?;
        if abbreviation.len() < MIN_ABBREV || !commit.id.starts_with(&abbreviation) {
            return Err(GitError::parse("abbreviated id", abbreviation));
        }
        self.state.cache_abbreviation(&commit.id, &abbreviation);
        Ok(abbreviation)
    }

    fn is_dirty(&self, include_untracked: bool) -> Result<bool, GitError> {
        let untracked = if include_untracked {
            "--untracked-files=normal"
        } else {
            "--untracked-files=no"
        };
        // Paths may not be UTF-8; only emptiness matters
        let output = self.git()?.run_bytes(&[
            "status",
            "--porcelain",
            "-z",
            "--ignore-submodules=all",
            untracked,
        ])?;
        let dirty = !output.is_empty();
        debug!(dirty, include_untracked, "checked work tree status");
        Ok(dirty)
    }

    fn tags(&self) -> Result<Vec<Tag>, GitError> {
        let output = self.git()?.run(&["for-each-ref", TAG_STUB_FORMAT, "refs/tags"])?;
        let mut tags = parse_tag_stubs(&output)?;
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(count = tags.len(), "listed tags");
        Ok(tags)
    }

    fn load_tag(&self, tag: &mut Tag) -> Result<(), GitError> {
        let git = self.git()?;
        if tag.is_loaded() {
            return Ok(());
        }
        let ref_name = Self::tag_ref(tag);
        let output = git.run(&["for-each-ref", TAG_DETAIL_FORMAT, &ref_name])?;
        let record = parse_tag_records(&output)?
            .into_iter()
            .find(|record| record.ref_name == ref_name)
            .ok_or_else(|| GitError::unresolvable(&ref_name, "tag not found"))?;

        let date = match record.date {
            Some(date) => date,
            None => self.find_commit(&tag.target)?.committer.time,
        };
        let details = if tag.annotated {
            TagDetails {
                date,
                tagger: record.tagger,
                message: record.message,
            }
        } else {
            TagDetails {
                date,
                tagger: None,
                message: None,
            }
        };
        tag.hydrate(details);
        trace!(tag = %tag.name, "loaded tag");
        Ok(())
    }

    fn mail_map(&self) -> Result<&MailMap, GitError> {
        self.state.mail_map(self.work_tree())
    }

    fn describe_with(&self, options: &DescribeOptions) -> Result<TagDescription, GitError> {
        crate::describe::describe(self, options)
    }

    fn walk_commits_with(
        &self,
        options: &WalkOptions,
        action: &mut dyn CommitWalkAction,
    ) -> Result<WalkSummary, GitError> {
        walk(self, options, action)
    }
}

/// Parse a `--date=raw` value such as `1700000000 +0100`
///
/// # Errors
///
/// Returns `GitError::Parse` for anything else.
pub fn parse_raw_date(raw: &str) -> Result<DateTime<FixedOffset>, GitError> {
    let invalid = || GitError::parse("raw date", raw);
    let (seconds, zone) = raw.trim().split_once(' ').ok_or_else(invalid)?;
    let seconds: i64 = seconds.parse().map_err(|_| invalid())?;

    let (sign, digits) = match zone.as_bytes().first() {
        Some(b'+') => (1, &zone[1..]),
        Some(b'-') => (-1, &zone[1..]),
        _ => return Err(invalid()),
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    timestamp(seconds, sign * (hours * 60 + minutes))
}

fn parse_signature(name: &str, email: &str, date: &str) -> Result<Signature, GitError> {
    Ok(Signature {
        name: name.to_string(),
        email: email.to_string(),
        time: parse_raw_date(date)?,
    })
}

/// Parse the output of `git log -z` run with the backend's log format
///
/// # Errors
///
/// Returns `GitError::Parse` if a record is truncated or malformed.
pub fn parse_log_records(output: &str) -> Result<Vec<Commit>, GitError> {
    output
        .split('\0')
        .map(|record| record.trim_start_matches('\n'))
        .filter(|record| !record.is_empty())
        .map(|record| {
            let fields: Vec<&str> = record.splitn(9, FIELD).collect();
            let [id, parents, an, ae, ad, cn, ce, cd, message] = fields[..] else {
                return Err(GitError::parse("log record", record));
            };
            if !Commit::is_valid_id(id) {
                return Err(GitError::parse("commit id", id));
            }
            Ok(Commit {
                id: id.to_string(),
                parents: parents.split_whitespace().map(str::to_string).collect(),
                author: parse_signature(an, ae, ad)?,
                committer: parse_signature(cn, ce, cd)?,
                message: normalize_message(message),
            })
        })
        .collect()
}

/// Split `for-each-ref` output into records of exactly `width` fields
fn ref_records(output: &str, width: usize) -> Result<Vec<Vec<&str>>, GitError> {
    output
        .split(RECORD)
        .map(|record| record.trim_start_matches('\n'))
        .filter(|record| !record.is_empty())
        .map(|record| {
            let fields: Vec<&str> = record.splitn(width, FIELD).collect();
            if fields.len() == width {
                Ok(fields)
            } else {
                Err(GitError::parse("ref record", record))
            }
        })
        .collect()
}

/// Parse tag stubs listed by `for-each-ref`
///
/// Tags that do not resolve to a commit in at most one step are skipped.
///
/// # Errors
///
/// Returns `GitError::Parse` if a record is malformed.
pub fn parse_tag_stubs(output: &str) -> Result<Vec<Tag>, GitError> {
    let mut tags = Vec::new();
    for fields in ref_records(output, 5)? {
        let [ref_name, kind, target, peeled_kind, peeled_target] = fields[..] else {
            continue;
        };
        let name = short_ref_name(ref_name);
        match (kind, peeled_kind) {
            ("commit", _) => tags.push(Tag::stub(name, target, false)),
            ("tag", "commit") => tags.push(Tag::stub(name, peeled_target, true)),
            _ => trace!(tag = name, "skipping tag not pointing at a commit"),
        }
    }
    Ok(tags)
}

/// Tag metadata as printed by `for-each-ref`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    /// Full ref name, e.g. `refs/tags/v1.0.0`
    pub ref_name: String,
    /// Creator date; `None` for tag objects without a tagger
    pub date: Option<DateTime<FixedOffset>>,
    /// Tagger of a tag object
    pub tagger: Option<Identity>,
    /// Message of a tag object
    pub message: Option<String>,
}

/// Parse tag metadata listed by `for-each-ref`
///
/// # Errors
///
/// Returns `GitError::Parse` if a record or date is malformed.
pub fn parse_tag_records(output: &str) -> Result<Vec<TagRecord>, GitError> {
    ref_records(output, 6)?
        .into_iter()
        .filter_map(|fields| match fields[..] {
            [ref_name, kind, date, name, email, contents] => {
                Some((ref_name, kind, date, name, email, contents))
            }
            _ => None,
        })
        .map(|(ref_name, kind, date, name, email, contents)| {
            let annotated = kind == "tag";
            let email = email.trim().trim_start_matches('<').trim_end_matches('>');
            Ok(TagRecord {
                ref_name: ref_name.to_string(),
                date: match date.trim() {
                    "" => None,
                    raw => Some(parse_raw_date(raw)?),
                },
                tagger: (annotated && !(name.is_empty() && email.is_empty()))
                    .then(|| Identity::new(name, email)),
                message: if annotated {
                    Some(normalize_message(contents)).filter(|m| !m.is_empty())
                } else {
                    None
                },
            })
        })
        .collect()
}
