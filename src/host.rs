// The I/O/error-reporting collaborator the core consumes but never
// owns (§6). Plays the role of the teacher's `Output` trait in
// `vm.rs`, generalized to also carry line input and the three error
// kinds rather than just a single `write` method.

use std::io::{self, BufRead, Write};

use crate::error::ErrorKind;

pub trait Host {
    fn output(&mut self, s: &str);
    fn get_input(&mut self) -> String;
    fn error(&mut self, kind: ErrorKind, message: &str);
}

// Reference implementation wired to process stdio, the same role
// `vm.rs`'s `Stdout` plays in its own tests alongside a `Vec<Value>`
// recording stub.
pub struct StdioHost;

impl Host for StdioHost {
    fn output(&mut self, s: &str) {
        println!("{}", s);
    }

    fn get_input(&mut self) -> String {
        io::stdout().flush().ok();
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok();
        line.trim_end_matches(|c| c == '\n' || c == '\r').to_string()
    }

    fn error(&mut self, kind: ErrorKind, message: &str) {
        eprintln!("{}: {}", kind, message);
    }
}

// Records everything instead of touching the terminal -- the
// evaluator tests below, and `interp`'s own, drive this rather than
// `StdioHost`.
#[derive(Default)]
pub struct RecordingHost {
    pub lines: Vec<String>,
    pub inputs: Vec<String>,
    pub error: Option<(ErrorKind, String)>,
}

impl RecordingHost {
    pub fn with_inputs(inputs: Vec<String>) -> RecordingHost {
        RecordingHost {
            lines: Vec::new(),
            inputs,
            error: None,
        }
    }
}

impl Host for RecordingHost {
    fn output(&mut self, s: &str) {
        self.lines.push(s.to_string());
    }

    fn get_input(&mut self) -> String {
        if self.inputs.is_empty() {
            String::new()
        } else {
            self.inputs.remove(0)
        }
    }

    fn error(&mut self, kind: ErrorKind, message: &str) {
        self.error = Some((kind, message.to_string()));
    }
}
