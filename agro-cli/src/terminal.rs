use agro_core::{Coordinates, Notice, Page, ResultArea};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    io::IsTerminal,
    sync::atomic::{AtomicBool, Ordering},
};

/// Page backed by the terminal: fields come from command-line flags,
/// results go to stdout, failures and alerts to stderr.
#[derive(Debug, Default)]
pub struct TerminalPage {
    fields: HashMap<String, String>,
    position: Option<Coordinates>,
    failed: AtomicBool,
}

impl TerminalPage {
    pub fn new(fields: HashMap<String, String>, position: Option<Coordinates>) -> Self {
        Self { fields, position, failed: AtomicBool::new(false) }
    }

    /// Whether anything on the page ended in a failure or alert.
    pub fn had_failure(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }

    fn print_error(&self, message: &str) {
        self.failed.store(true, Ordering::Relaxed);
        if std::io::stderr().is_terminal() {
            eprintln!("\x1b[31m{message}\x1b[0m");
        } else {
            eprintln!("{message}");
        }
    }
}

#[async_trait]
impl Page for TerminalPage {
    fn field(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    fn show(&self, _area: ResultArea, notice: Notice) {
        match notice {
            Notice::Success(lines) => lines.iter().for_each(|line| println!("{line}")),
            Notice::Failure(message) => self.print_error(message),
        }
    }

    fn append(&self, _area: ResultArea, lines: Vec<String>) {
        lines.iter().for_each(|line| println!("{line}"));
    }

    fn alert(&self, message: &str) {
        self.print_error(message);
    }

    async fn current_position(&self) -> Option<Coordinates> {
        self.position
    }
}
