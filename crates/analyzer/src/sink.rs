use crate::report::Report;
use std::io::{self, IsTerminal, Write};
use std::sync::Mutex;

/// Where finished reports go. Each call replaces what was shown before.
pub trait DisplaySink: Send + Sync {
    fn publish(&self, report: &Report);
}

/// Writes reports to stdout, bold headers included when stdout is a terminal.
pub struct TerminalSink {
    styled: bool,
}

impl TerminalSink {
    pub fn stdout() -> Self {
        Self {
            styled: io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { styled: false }
    }

    pub fn render(&self, report: &Report) -> String {
        if self.styled {
            report.to_ansi()
        } else {
            report.to_plain_text()
        }
    }
}

impl DisplaySink for TerminalSink {
    fn publish(&self, report: &Report) {
        let text = self.render(report);
        let mut out = io::stdout().lock();
        if let Err(e) = writeln!(out, "{text}").and_then(|_| out.flush()) {
            tracing::warn!(error = %e, "Failed to write report to stdout");
        }
    }
}

/// Keeps every published report in memory. The last one is what a user
/// would currently see.
#[derive(Default)]
pub struct MemorySink {
    published: Mutex<Vec<Report>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<Report> {
        self.published
            .lock()
            .ok()
            .and_then(|reports| reports.last().cloned())
    }

    pub fn history(&self) -> Vec<Report> {
        self.published
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }

    pub fn publish_count(&self) -> usize {
        self.published.lock().map(|reports| reports.len()).unwrap_or(0)
    }
}

impl DisplaySink for MemorySink {
    fn publish(&self, report: &Report) {
        match self.published.lock() {
            Ok(mut reports) => reports.push(report.clone()),
            Err(_) => tracing::warn!("Report history poisoned, dropping report"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{MAIN_HEADER, SectionKind, Segment};

    fn sample() -> Report {
        let mut report = Report::new();
        report
            .append_section(
                SectionKind::Main,
                vec![Segment::bold(MAIN_HEADER), Segment::plain("x\n")],
            )
            .unwrap();
        report
    }

    #[test]
    fn test_plain_terminal_render() {
        assert_eq!(TerminalSink::plain().render(&sample()), "Main Prediction:\nx\n");
    }

    #[test]
    fn test_memory_sink_last_call_wins() {
        let sink = MemorySink::new();
        assert!(sink.latest().is_none());

        sink.publish(&Report::notice("first"));
        sink.publish(&sample());

        assert_eq!(sink.publish_count(), 2);
        assert_eq!(sink.latest().unwrap(), sample());
        assert_eq!(sink.history()[0].to_plain_text(), "first");
    }
}
