//! Headless host for the command line: no document, notifications on
//! stdout, confirmation on stdin.

use std::io::{self, BufRead, Write};

use super::EditorHost;
use crate::error::HostError;

pub struct TerminalHost {
    assume_yes: bool,
}

impl TerminalHost {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl EditorHost for TerminalHost {
    fn evaluate_script(&self, _script: &str) -> Result<serde_json::Value, HostError> {
        Err(HostError::Unsupported("script evaluation"))
    }

    fn show_notification(&self, message: &str) {
        println!("{message}");
    }

    fn confirm(&self, title: &str, message: &str) -> bool {
        println!("== {title} ==\n{message}");
        if self.assume_yes {
            return true;
        }

        print!("[y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}
