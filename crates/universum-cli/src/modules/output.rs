//! Block and step reporting for a run.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde_json::json;
use universum_common::error::UniversumError;
use universum_common::types::StepStatus;
use universum_gravity::arguments::{ArgumentError, ArgumentScope};
use universum_gravity::{Component, Declaration, InitContext, OptionSpec, Result};

/// Report layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Indented, numbered blocks for a terminal.
    Term,
    /// One JSON object per event.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term => write!(f, "term"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = UniversumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "term" => Ok(Self::Term),
            "json" => Ok(Self::Json),
            other => Err(UniversumError::Config {
                message: format!("unsupported output type \"{other}\""),
            }),
        }
    }
}

#[derive(Default)]
struct Blocks {
    open: Vec<(String, String)>,
    counters: Vec<usize>,
}

impl Blocks {
    fn open(&mut self, name: &str) -> String {
        let level = self.open.len();
        self.counters.truncate(level + 1);
        if self.counters.len() == level {
            self.counters.push(0);
        }
        self.counters[level] += 1;
        let number = self.counters.iter().map(|n| format!("{n}.")).collect::<String>();
        self.open.push((number.clone(), name.to_owned()));
        number
    }
}

/// Reports run progress to stdout or a supplied writer.
pub struct Output {
    format: OutputFormat,
    sink: RefCell<Box<dyn Write>>,
    blocks: RefCell<Blocks>,
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl Output {
    /// Creates a reporter writing to `sink`.
    pub fn with_writer(format: OutputFormat, sink: Box<dyn Write>) -> Self {
        Self {
            format,
            sink: RefCell::new(sink),
            blocks: RefCell::new(Blocks::default()),
        }
    }

    /// Selected layout.
    pub const fn format(&self) -> OutputFormat {
        self.format
    }

    /// Opens a nested, numbered block.
    pub fn open_block(&self, name: &str) {
        let number = self.blocks.borrow_mut().open(name);
        let indent = self.indent_of(1);
        self.emit(
            &format!("{indent}{number} {name}"),
            json!({ "event": "open_block", "number": number, "name": name }),
        );
    }

    /// Closes the innermost block with its outcome.
    pub fn close_block(&self, status: StepStatus) {
        let closed = self.blocks.borrow_mut().open.pop();
        let Some((number, name)) = closed else {
            tracing::warn!("close_block without an open block");
            return;
        };
        let indent = self.indent_of(0);
        self.emit(
            &format!("{indent} \u{2514} [{status}]\n"),
            json!({ "event": "close_block", "number": number, "name": name, "status": status }),
        );
    }

    /// Reports a finished step inside the current block.
    pub fn report_step(&self, message: &str, status: StepStatus) {
        let indent = self.indent_of(1);
        self.emit(
            &format!("{indent}  {message} - {status}"),
            json!({ "event": "step", "message": message, "status": status }),
        );
    }

    /// Logs a line inside the current block.
    pub fn log(&self, line: &str) {
        let indent = self.indent_of(1);
        self.emit(
            &format!("{indent}  ==> {line}"),
            json!({ "event": "log", "message": line }),
        );
    }

    /// Logs an error inside the current block.
    pub fn log_error(&self, line: &str) {
        let indent = self.indent_of(1);
        self.emit(
            &format!("{indent}  Error: {line}"),
            json!({ "event": "error", "message": line }),
        );
    }

    /// Announces the start of a run.
    pub fn log_execution_start(&self, title: &str, version: &str) {
        self.log(&format!("{title} {version} started execution"));
    }

    /// Announces the end of a run.
    pub fn log_execution_finish(&self, title: &str, version: &str, elapsed: &str) {
        self.log(&format!("{title} {version} finished execution in {elapsed}"));
    }

    fn indent_of(&self, skip: usize) -> String {
        "  ".repeat(self.blocks.borrow().open.len().saturating_sub(skip))
    }

    fn emit(&self, text: &str, event: serde_json::Value) {
        let line = match self.format {
            OutputFormat::Term => text.to_owned(),
            OutputFormat::Json => {
                let mut event = event;
                event["timestamp"] = json!(chrono::Utc::now().to_rfc3339());
                event.to_string()
            }
        };
        if let Err(e) = writeln!(self.sink.borrow_mut(), "{line}") {
            tracing::warn!(error = %e, "cannot write report");
        }
    }
}

impl Component for Output {
    const NAME: &'static str = "Output";

    fn declare(decl: &mut Declaration) {
        let _ = decl.takes_settings();
    }

    fn define_arguments(args: &mut ArgumentScope<'_>) -> std::result::Result<(), ArgumentError> {
        args.group("Output").add_argument(
            OptionSpec::new("--out-type")
                .short('o')
                .dest("type")
                .env("OUTPUT")
                .choices(["term", "json"])
                .default_value("term")
                .help("Type of output to produce: indented terminal blocks or JSON events"),
        )
    }

    fn construct(ctx: &mut InitContext<'_, '_>) -> Result<Self> {
        let format = ctx
            .settings()?
            .get_parsed::<OutputFormat>("type")?
            .unwrap_or(OutputFormat::Term);
        Ok(Self::with_writer(format, Box::new(std::io::stdout())))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Rc<RefCell<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).expect("utf-8")
        }
    }

    #[test]
    fn term_blocks_are_numbered_and_nested() {
        let captured = Captured::default();
        let output = Output::with_writer(OutputFormat::Term, Box::new(captured.clone()));
        output.open_block("Preparing repository");
        output.log("copying");
        output.open_block("Copying files");
        output.close_block(StepStatus::Success);
        output.close_block(StepStatus::Success);
        output.open_block("Reporting");
        output.close_block(StepStatus::Failed);

        let text = captured.text();
        assert_eq!(
            text,
            "1. Preparing repository\n  ==> copying\n  1.1. Copying files\n   \u{2514} [Success]\n\n \u{2514} [Success]\n\n2. Reporting\n \u{2514} [Failed]\n\n"
        );
    }

    #[test]
    fn json_events_are_one_per_line() {
        let captured = Captured::default();
        let output = Output::with_writer(OutputFormat::Json, Box::new(captured.clone()));
        output.open_block("Preparing repository");
        output.report_step("copy", StepStatus::Skipped);
        output.close_block(StepStatus::Success);

        let events: Vec<serde_json::Value> = captured
            .text()
            .lines()
            .map(|l| serde_json::from_str(l).expect("json line"))
            .collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["event"], "open_block");
        assert_eq!(events[0]["number"], "1.");
        assert_eq!(events[1]["status"], "skipped");
        assert_eq!(events[2]["status"], "success");
        assert!(events[2]["timestamp"].is_string());
    }

    #[test]
    fn unbalanced_close_is_ignored() {
        let captured = Captured::default();
        let output = Output::with_writer(OutputFormat::Term, Box::new(captured.clone()));
        output.close_block(StepStatus::Success);
        assert!(captured.text().is_empty());
    }

    #[test]
    fn output_format_rejects_unknown() {
        assert!("html".parse::<OutputFormat>().is_err());
        assert_eq!("json".parse::<OutputFormat>().expect("json"), OutputFormat::Json);
    }
}
