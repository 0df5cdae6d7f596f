//! Harness configuration.
//!
//! Defaults reproduce the stock integration run: fixtures under `integration/tests`, the subject
//! compiler at `zig-out/bin/glinka`, `node` as the runtime and the TypeScript transpiler as the
//! reference. Environment variables override defaults; CLI flags override both.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{HarnessError, HarnessResult};

pub const ENV_TESTS: &str = "CROSSCHECK_TESTS";
pub const ENV_EXT: &str = "CROSSCHECK_EXT";
pub const ENV_SUBJECT: &str = "CROSSCHECK_SUBJECT";
pub const ENV_RUNTIME: &str = "CROSSCHECK_RUNTIME";
pub const ENV_REFERENCE: &str = "CROSSCHECK_REFERENCE";
pub const ENV_TIMEOUT_SECS: &str = "CROSSCHECK_TIMEOUT_SECS";
pub const ENV_JOBS: &str = "CROSSCHECK_JOBS";

/// Reads stdin, transpiles to CommonJS with the `typescript` package, writes stdout.
const TRANSPILE_SCRIPT: &str = concat!(
    "let s='';process.stdin.setEncoding('utf8');",
    "process.stdin.on('data',d=>s+=d).on('end',()=>process.stdout.write(",
    "require('typescript').transpileModule(s,{compilerOptions:{module:1}}).outputText));"
);

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a command line on whitespace. No quoting rules are applied.
    pub fn parse(line: &str) -> HarnessResult<Self> {
        let mut words = line.split_whitespace();
        let Some(program) = words.next() else {
            return Err(HarnessError::Config("command must not be empty".to_string()));
        };
        Ok(Self::new(program, words))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Everything a run needs to know.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Directory scanned for fixtures (not recursive)
    pub tests_dir: PathBuf,
    /// Fixture file extension, without the dot
    pub extension: String,
    /// Subject compiler: source on stdin, generated code on stdout
    pub subject: CommandSpec,
    /// Runtime: generated program on stdin
    pub runtime: CommandSpec,
    /// Reference translator: source on stdin, generated code on stdout
    pub reference: CommandSpec,
    /// Per-process time limit for subject compilations and runtime executions
    pub timeout: Option<Duration>,
    /// Maximum number of fixtures in flight
    pub jobs: Option<usize>,
    /// Clear the terminal before each table render
    pub redraw: bool,
    /// Write a JSON report here after the run
    pub json_report: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tests_dir: PathBuf::from("integration/tests"),
            extension: "ts".to_string(),
            subject: CommandSpec::new("zig-out/bin/glinka", ["-"]),
            runtime: CommandSpec::new("node", ["-"]),
            reference: CommandSpec::new("node", ["-e", TRANSPILE_SCRIPT]),
            timeout: None,
            jobs: None,
            redraw: true,
            json_report: None,
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> HarnessResult<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup` (keyed by the `CROSSCHECK_*` names).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> HarnessResult<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(dir) = get(ENV_TESTS) {
            self.tests_dir = PathBuf::from(dir);
        }
        if let Some(ext) = get(ENV_EXT) {
            self.extension = normalize_extension(&ext);
        }
        if let Some(line) = get(ENV_SUBJECT) {
            self.subject = CommandSpec::parse(&line)?;
        }
        if let Some(line) = get(ENV_RUNTIME) {
            self.runtime = CommandSpec::parse(&line)?;
        }
        if let Some(line) = get(ENV_REFERENCE) {
            self.reference = CommandSpec::parse(&line)?;
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            self.timeout = Some(parse_timeout(&secs)?);
        }
        if let Some(jobs) = get(ENV_JOBS) {
            self.jobs = Some(parse_jobs(&jobs)?);
        }
        Ok(self)
    }

    pub fn with_tests_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tests_dir = dir.into();
        self
    }

    pub fn with_extension(mut self, ext: &str) -> Self {
        self.extension = normalize_extension(ext);
        self
    }

    pub fn with_subject(mut self, command: CommandSpec) -> Self {
        self.subject = command;
        self
    }

    pub fn with_runtime(mut self, command: CommandSpec) -> Self {
        self.runtime = command;
        self
    }

    pub fn with_reference(mut self, command: CommandSpec) -> Self {
        self.reference = command;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_redraw(mut self, redraw: bool) -> Self {
        self.redraw = redraw;
        self
    }

    pub fn with_json_report(mut self, path: Option<PathBuf>) -> Self {
        self.json_report = path;
        self
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_string()
}

fn parse_timeout(value: &str) -> HarnessResult<Duration> {
    match value.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(HarnessError::Config(format!(
            "timeout must be a positive number of seconds, got '{value}'"
        ))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
    }
}

fn parse_jobs(value: &str) -> HarnessResult<usize> {
    match value.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(HarnessError::Config(format!("jobs must be a positive integer, got '{value}'"))),
        Ok(jobs) => Ok(jobs),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_matches_stock_run() {
        let config = HarnessConfig::default();
        assert_eq!(config.tests_dir, PathBuf::from("integration/tests"));
        assert_eq!(config.extension, "ts");
        assert_eq!(config.subject.to_string(), "zig-out/bin/glinka -");
        assert_eq!(config.runtime.to_string(), "node -");
        assert_eq!(config.reference.program, "node");
        assert!(config.timeout.is_none());
        assert!(config.jobs.is_none());
        assert!(config.redraw);
    }

    #[test]
    fn test_command_spec_parse() {
        let spec = CommandSpec::parse("  ./glinka   --emit js -  ").unwrap();
        assert_eq!(spec.program, "./glinka");
        assert_eq!(spec.args, vec!["--emit", "js", "-"]);
    }

    #[test]
    fn test_command_spec_parse_empty() {
        assert!(matches!(CommandSpec::parse("   "), Err(HarnessError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let config = HarnessConfig::default()
            .with_overrides(lookup(&[
                (ENV_TESTS, "fixtures"),
                (ENV_EXT, ".tsx"),
                (ENV_SUBJECT, "target/glinka -"),
                (ENV_TIMEOUT_SECS, "30"),
                (ENV_JOBS, "4"),
            ]))
            .unwrap();
        assert_eq!(config.tests_dir, PathBuf::from("fixtures"));
        assert_eq!(config.extension, "tsx");
        assert_eq!(config.subject.program, "target/glinka");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.jobs, Some(4));
        // Untouched values keep their defaults
        assert_eq!(config.runtime.to_string(), "node -");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let config = HarnessConfig::default().with_overrides(lookup(&[(ENV_RUNTIME, "  ")])).unwrap();
        assert_eq!(config.runtime.to_string(), "node -");
    }

    #[test]
    fn test_invalid_env_values_are_rejected() {
        assert!(HarnessConfig::default().with_overrides(lookup(&[(ENV_TIMEOUT_SECS, "soon")])).is_err());
        assert!(HarnessConfig::default().with_overrides(lookup(&[(ENV_JOBS, "0")])).is_err());
    }

    #[test]
    fn test_builder_chain() {
        let config = HarnessConfig::new()
            .with_tests_dir("corpus")
            .with_extension("js")
            .with_runtime(CommandSpec::new("sh", Vec::<String>::new()))
            .with_jobs(Some(2))
            .with_redraw(false);
        assert_eq!(config.tests_dir, PathBuf::from("corpus"));
        assert_eq!(config.extension, "js");
        assert_eq!(config.runtime.to_string(), "sh");
        assert_eq!(config.jobs, Some(2));
        assert!(!config.redraw);
    }
}
