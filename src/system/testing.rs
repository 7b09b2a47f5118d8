//! Scripted adapters replaying captured tool output in tests.

use super::{CommandOutput, HttpProbe, Opener, Shell};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Mutex;
use std::time::Duration;

/// [`Shell`] that answers from a script of canned outputs.
///
/// Exact command lines are matched first, then prefixes in registration
/// order. Registering the same key several times queues the outputs; the
/// last one repeats forever. Unknown commands fail as if not installed.
#[derive(Default)]
pub struct FakeShell {
    exact: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
    prefixes: Mutex<Vec<(String, VecDeque<CommandOutput>)>>,
    calls: Mutex<Vec<String>>,
    spawned: Mutex<Vec<String>>,
}

impl FakeShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the exact command line `program arg...` with `output`.
    pub fn on(self, command_line: &str, output: CommandOutput) -> Self {
        self.exact
            .lock()
            .unwrap()
            .entry(command_line.to_string())
            .or_default()
            .push_back(output);
        self
    }

    /// Answer every command line starting with `prefix` with `output`.
    pub fn on_prefix(self, prefix: &str, output: CommandOutput) -> Self {
        {
            let mut prefixes = self.prefixes.lock().unwrap();
            if let Some((_, queue)) = prefixes.iter_mut().find(|(p, _)| p == prefix) {
                queue.push_back(output);
            } else {
                prefixes.push((prefix.to_string(), VecDeque::from([output])));
            }
        }
        self
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Whether any command line started with `prefix`.
    pub fn was_called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    /// Command lines started through `spawn_detached`.
    pub fn spawned(&self) -> Vec<String> {
        self.spawned.lock().unwrap().clone()
    }

    fn next(queue: &mut VecDeque<CommandOutput>) -> Option<CommandOutput> {
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Shell for FakeShell {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let line = command_line(program, args);
        self.calls.lock().unwrap().push(line.clone());

        if let Some(queue) = self.exact.lock().unwrap().get_mut(&line) {
            if let Some(output) = Self::next(queue) {
                return Ok(output);
            }
        }

        let mut prefixes = self.prefixes.lock().unwrap();
        for (prefix, queue) in prefixes.iter_mut() {
            if line.starts_with(prefix.as_str()) {
                if let Some(output) = Self::next(queue) {
                    return Ok(output);
                }
            }
        }

        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{program}: command not found"),
        ))
    }

    fn spawn_detached(&self, program: &str, args: &[&str]) -> io::Result<u32> {
        self.spawned.lock().unwrap().push(command_line(program, args));
        Ok(4242)
    }
}

/// [`HttpProbe`] answering from a fixed url-to-status table.
#[derive(Default)]
pub struct FakeHttp {
    statuses: HashMap<String, u16>,
    calls: Mutex<Vec<String>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, status: u16) -> Self {
        self.statuses.insert(url.to_string(), status);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl HttpProbe for FakeHttp {
    fn status(&self, url: &str, _timeout: Duration) -> Option<u16> {
        self.calls.lock().unwrap().push(url.to_string());
        self.statuses.get(url).copied()
    }
}

/// [`Opener`] that records its targets.
#[derive(Default)]
pub struct FakeOpener {
    opened: Mutex<Vec<String>>,
}

impl FakeOpener {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl Opener for FakeOpener {
    fn open(&self, target: &str) -> io::Result<()> {
        self.opened.lock().unwrap().push(target.to_string());
        Ok(())
    }
}
