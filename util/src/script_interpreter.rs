//! # Command script interpreter module
//!
//! This module provides an interpreter for timed command scripts, allowing
//! commands to be executed at fixed times after the start of a run.
//!
//! A script is a sequence of entries of the form `<time_s>: <json>;`, where
//! the JSON payload is deserialised into the command type `T`. Everything
//! outside an entry (including `#` comment lines) is ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use serde::de::DeserializeOwned;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
struct Command<T> {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    cmd: T
}

/// A script interpreter.
///
/// After loading the script use `.get_pending` to acquire a list of commands
/// that need executing.
pub struct ScriptInterpreter<T> {
    script_path: Option<PathBuf>,
    cmds: VecDeque<Command<T>>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid command at {0} s: {1}")]
    InvalidCmd(f64, serde_json::Error),

    #[error("Script commands are out of order ({1} s follows {0} s)")]
    OutOfOrder(f64, f64)
}

/// Commands due for execution.
#[derive(Debug, PartialEq)]
pub enum PendingCmds<T> {
    None,
    Some(Vec<T>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> ScriptInterpreter<T>
where
    T: DeserializeOwned
{

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        let path = PathBuf::from(script_path.as_ref());

        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        let script = fs::read_to_string(&path)
            .map_err(ScriptError::ScriptLoadError)?;

        let mut si = Self::parse_script(&script)?;
        si.script_path = Some(path);

        Ok(si)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn parse_script(script: &str) -> Result<Self, ScriptError> {

        let mut cmd_queue: VecDeque<Command<T>> = VecDeque::new();

        // Timestamp, colon, then everything up to the terminating semicolon
        let re = RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .expect("script regex is valid");

        for cap in re.captures_iter(script) {
            let exec_time_s: f64 = cap[1]
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            let cmd = serde_json::from_str(&cap[3])
                .map_err(|e| ScriptError::InvalidCmd(exec_time_s, e))?;

            if let Some(prev) = cmd_queue.back() {
                if prev.exec_time_s > exec_time_s {
                    return Err(ScriptError::OutOfOrder(prev.exec_time_s, exec_time_s))
                }
            }

            cmd_queue.push_back(Command {
                exec_time_s,
                cmd
            });
        }

        if cmd_queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(ScriptInterpreter {
            script_path: None,
            cmds: cmd_queue
        })
    }
}

impl<T> ScriptInterpreter<T> {

    /// Return the commands whose execution time has passed at
    /// `current_time_s`, in script order.
    pub fn get_pending(&mut self, current_time_s: f64) -> PendingCmds<T> {

        if self.cmds.is_empty() {
            return PendingCmds::EndOfScript
        }

        let mut cmd_vec: Vec<T> = vec![];

        while let Some(front) = self.cmds.front() {
            if front.exec_time_s > current_time_s {
                break;
            }

            if let Some(c) = self.cmds.pop_front() {
                cmd_vec.push(c.cmd);
            }
        }

        if cmd_vec.is_empty() {
            PendingCmds::None
        }
        else {
            PendingCmds::Some(cmd_vec)
        }
    }

    /// Get the number of commands remaining in the script
    pub fn get_num_cmds(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }

    /// Get the path the script was loaded from, if any.
    pub fn script_path(&self) -> Option<&Path> {
        self.script_path.as_deref()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(tag = "type")]
    enum TestCmd {
        Go { speed: f64 },
        Halt,
    }

    const SCRIPT: &str = r#"
# Drive forward then stop
0.0: {"type": "Go", "speed": 1.0};
0.5: {"type": "Go", "speed": 2.0};
2.0: {"type": "Halt"};
"#;

    #[test]
    fn test_pending() {
        let mut si = ScriptInterpreter::<TestCmd>::parse_script(SCRIPT).unwrap();
        assert_eq!(si.get_num_cmds(), 3);
        assert_eq!(si.get_duration(), 2.0);
        assert!(si.script_path().is_none());

        assert_eq!(
            si.get_pending(0.6),
            PendingCmds::Some(vec![TestCmd::Go { speed: 1.0 }, TestCmd::Go { speed: 2.0 }])
        );
        assert_eq!(si.get_pending(1.0), PendingCmds::None);
        assert_eq!(si.get_pending(2.0), PendingCmds::Some(vec![TestCmd::Halt]));
        assert_eq!(si.get_pending(3.0), PendingCmds::EndOfScript);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            ScriptInterpreter::<TestCmd>::parse_script("# nothing here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::<TestCmd>::parse_script("1.0: {\"type\": \"Fly\"};"),
            Err(ScriptError::InvalidCmd(t, _)) if t == 1.0
        ));
        assert!(matches!(
            ScriptInterpreter::<TestCmd>::parse_script(
                "2.0: {\"type\": \"Halt\"};\n1.0: {\"type\": \"Halt\"};"
            ),
            Err(ScriptError::OutOfOrder(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::<TestCmd>::new("/no/such/script.txt"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}
