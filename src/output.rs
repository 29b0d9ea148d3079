use std::sync::Mutex;

/// Where user-facing progress goes: the terminal for the binary, a buffer for library callers
pub trait OutputHandler: Send + Sync {
    fn success(&self, message: &str);

    fn error(&self, message: &str);

    fn info(&self, message: &str);

    fn warning(&self, message: &str);

    fn heading(&self, message: &str);

    /// A right-aligned verb followed by its subject, e.g. `Created users`
    fn status(&self, action: &str, subject: &str);

    /// A migration file was written (or stored) under `identifier`
    fn migration_written(&self, identifier: &str) {
        self.status("Created", identifier);
    }

    /// A migration was recorded in the log table
    fn migration_logged(&self, identifier: &str, batch: i32) {
        self.status("Logged", &format!("{identifier} (batch {batch})"));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    Success(String),
    Error(String),
    Info(String),
    Warning(String),
    Heading(String),
    Status { action: String, subject: String },
}

/// Buffers every message so library callers and tests can inspect what happened
#[derive(Debug, Default)]
pub struct CollectingOutputHandler {
    events: Mutex<Vec<OutputEvent>>,
}

impl CollectingOutputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OutputEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Subjects of every `Created` status, in order
    pub fn written_migrations(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                OutputEvent::Status { action, subject } if action == "Created" => Some(subject),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                OutputEvent::Warning(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: OutputEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

impl OutputHandler for CollectingOutputHandler {
    fn success(&self, message: &str) {
        self.push(OutputEvent::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(OutputEvent::Error(message.to_string()));
    }

    fn info(&self, message: &str) {
        self.push(OutputEvent::Info(message.to_string()));
    }

    fn warning(&self, message: &str) {
        self.push(OutputEvent::Warning(message.to_string()));
    }

    fn heading(&self, message: &str) {
        self.push(OutputEvent::Heading(message.to_string()));
    }

    fn status(&self, action: &str, subject: &str) {
        self.push(OutputEvent::Status {
            action: action.to_string(),
            subject: subject.to_string(),
        });
    }
}

/// Colored terminal output for the binary
#[cfg(feature = "cli")]
pub struct CliOutputHandler;

#[cfg(feature = "cli")]
impl OutputHandler for CliOutputHandler {
    fn success(&self, message: &str) {
        use owo_colors::OwoColorize;
        println!("{} {}", "✓".green(), message);
    }

    fn error(&self, message: &str) {
        crate::logging::output::error(message);
    }

    fn info(&self, message: &str) {
        println!("{}", message);
    }

    fn warning(&self, message: &str) {
        use owo_colors::OwoColorize;
        println!("{} {}", "⚠".yellow(), message);
    }

    fn heading(&self, message: &str) {
        crate::logging::output::header(message);
    }

    fn status(&self, action: &str, subject: &str) {
        use owo_colors::OwoColorize;
        println!("{:>12} {}", action.green().bold(), subject);
    }
}

pub struct SilentOutputHandler;

impl OutputHandler for SilentOutputHandler {
    fn success(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn heading(&self, _message: &str) {}
    fn status(&self, _action: &str, _subject: &str) {}
}
