//! Polling file watcher.
//!
//! Snapshots modification times under a set of roots and reports files that
//! were created or modified. A changed file is only reported once its stamp
//! has held still for a full poll, so files still being written are left
//! alone.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

/// Decides which changed paths trigger a reaction.
#[derive(Debug, Clone)]
pub struct PathFilter {
    regex: Regex,
}

impl PathFilter {
    /// Match paths against a regular expression anchored at the start of the
    /// path.
    pub fn from_regex(expr: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{})", expr))
            .with_context(|| format!("Invalid regex: {}", expr))?;
        Ok(Self { regex })
    }

    /// Match whole paths against a shell pattern (`*`, `?`, `[seq]`, `[!seq]`).
    ///
    /// `*` also matches `/`, so `*.html` selects HTML files at any depth.
    pub fn from_pattern(pattern: &str) -> Result<Self> {
        let translated = translate_pattern(pattern);
        let regex = Regex::new(&translated)
            .with_context(|| format!("Invalid pattern: {}", pattern))?;
        Ok(Self { regex })
    }

    /// Filter that accepts every path.
    pub fn any() -> Self {
        Self {
            regex: Regex::new(".*").expect("static regex"),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.regex.is_match(&path.to_string_lossy())
    }
}

/// Translate a shell pattern into an anchored regular expression.
pub fn translate_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let n = chars.len();
    let mut out = String::new();
    let mut i = 0;

    while i < n {
        let c = chars[i];
        i += 1;
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut j = i;
                if j < n && chars[j] == '!' {
                    j += 1;
                }
                if j < n && chars[j] == ']' {
                    j += 1;
                }
                while j < n && chars[j] != ']' {
                    j += 1;
                }
                if j >= n {
                    out.push_str(r"\[");
                } else {
                    let stuff: String = chars[i..j].iter().collect();
                    let stuff = stuff.replace('\\', r"\\");
                    i = j + 1;
                    out.push('[');
                    if let Some(rest) = stuff.strip_prefix('!') {
                        out.push('^');
                        out.push_str(rest);
                    } else {
                        if stuff.starts_with('^') || stuff.starts_with('[') {
                            out.push('\\');
                        }
                        out.push_str(&stuff);
                    }
                    out.push(']');
                }
            }
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }

    format!(r"^(?s:{})\z", out)
}

/// File identity used to detect modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    modified: SystemTime,
    len: u64,
}

fn stamp(path: &Path) -> Option<Stamp> {
    let metadata = std::fs::metadata(path).ok()?;
    Some(Stamp {
        modified: metadata.modified().ok()?,
        len: metadata.len(),
    })
}

/// Watches directory trees by polling.
pub struct Watcher {
    roots: Vec<PathBuf>,
    filter: PathFilter,
    interval: Duration,
    snapshot: HashMap<PathBuf, Stamp>,
    /// Changed files waiting for their stamp to settle.
    pending: HashMap<PathBuf, Stamp>,
}

impl Watcher {
    /// Create a watcher and take the initial snapshot. Files that already
    /// exist do not trigger until they change.
    pub fn new(roots: Vec<PathBuf>, filter: PathFilter, interval: Duration) -> Self {
        let mut watcher = Self {
            roots,
            filter,
            interval,
            snapshot: HashMap::new(),
            pending: HashMap::new(),
        };
        watcher.snapshot = watcher.scan();
        watcher
    }

    fn scan(&self) -> HashMap<PathBuf, Stamp> {
        let mut files = HashMap::new();
        for root in &self.roots {
            for entry in WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Some(s) = stamp(entry.path()) {
                    files.insert(entry.path().to_path_buf(), s);
                }
            }
        }
        files
    }

    /// Rescan and return matching files that changed and then stayed
    /// unchanged for one poll, sorted by path.
    pub fn changes(&mut self) -> Vec<PathBuf> {
        let current = self.scan();
        let mut ready = Vec::new();
        let mut pending = HashMap::new();

        for (path, s) in &current {
            if !self.filter.matches(path) {
                continue;
            }
            match self.pending.get(path) {
                Some(previous) if previous == s => ready.push(path.clone()),
                Some(_) => {
                    pending.insert(path.clone(), *s);
                }
                None if self.snapshot.get(path) != Some(s) => {
                    pending.insert(path.clone(), *s);
                }
                None => {}
            }
        }
        ready.sort();

        let removed = self
            .snapshot
            .keys()
            .filter(|p| !current.contains_key(*p))
            .count();
        if removed > 0 {
            log::debug!("{} watched files removed", removed);
        }

        self.snapshot = current;
        self.pending = pending;
        ready
    }

    /// Run `react` on every settled changed file once. `react` returns
    /// whether it rewrote the file, in which case the new stamp is recorded
    /// so the watcher does not react to its own write.
    ///
    /// Errors from `react` are logged and do not stop the poll; the file is
    /// dropped from the snapshot so a later poll retries it. Returns the
    /// number of files handed to `react`.
    pub fn poll<F>(&mut self, mut react: F) -> usize
    where
        F: FnMut(&Path) -> Result<bool>,
    {
        let changed = self.changes();
        for path in &changed {
            match react(path) {
                Ok(true) => {
                    if let Some(s) = stamp(path) {
                        self.snapshot.insert(path.clone(), s);
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    log::error!("{}: {:#}", path.display(), e);
                    self.snapshot.remove(path);
                }
            }
        }
        changed.len()
    }

    /// Poll forever, sleeping for the configured interval between scans.
    pub fn run<F>(&mut self, mut react: F) -> !
    where
        F: FnMut(&Path) -> Result<bool>,
    {
        loop {
            std::thread::sleep(self.interval);
            self.poll(&mut react);
        }
    }
}
