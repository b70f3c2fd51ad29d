use std::fmt;
use thiserror::Error;

pub const MAIN_HEADER: &str = "Main Prediction:\n";
pub const OTHER_HEADER: &str = "Other Predictions:\n";
pub const NO_CONFIDENT_MATCH: &str = "Custom model did not find a confident match.";
pub const MODEL_UNAVAILABLE: &str = "Model or labels not loaded properly.";
pub const PREDICTION_FAILED: &str = "Prediction failed.";
pub const LABELING_FAILED: &str = "ML Kit prediction failed.";
pub const IMAGE_LOAD_FAILED: &str = "Error loading image.";
pub const MODEL_LOAD_FAILED: &str = "Error loading model or labels.";

const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Bold,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: Style,
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Style::Plain,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Style::Bold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Main,
    Other,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReportError {
    #[error("{0:?} section already written")]
    AlreadyWritten(SectionKind),

    #[error("Other section cannot precede the main section")]
    OutOfOrder,
}

/// Append-only styled text for one analysis request.
///
/// The main section is written first, the other section second, and neither
/// is ever rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    segments: Vec<Segment>,
    main_written: bool,
    other_written: bool,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// A standalone status line, outside of any section.
    pub fn notice(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::plain(text)],
            ..Self::default()
        }
    }

    pub fn append_section(
        &mut self,
        kind: SectionKind,
        segments: Vec<Segment>,
    ) -> Result<(), ReportError> {
        match kind {
            SectionKind::Main if self.main_written => Err(ReportError::AlreadyWritten(kind)),
            SectionKind::Other if self.other_written => Err(ReportError::AlreadyWritten(kind)),
            SectionKind::Other if !self.main_written => Err(ReportError::OutOfOrder),
            SectionKind::Main => {
                self.main_written = true;
                self.segments.extend(segments);
                Ok(())
            }
            SectionKind::Other => {
                self.other_written = true;
                self.segments.extend(segments);
                Ok(())
            }
        }
    }

    pub fn has_section(&self, kind: SectionKind) -> bool {
        match kind {
            SectionKind::Main => self.main_written,
            SectionKind::Other => self.other_written,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn to_plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Render with ANSI bold for terminals.
    pub fn to_ansi(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment.style {
                Style::Plain => out.push_str(&segment.text),
                Style::Bold => {
                    out.push_str(ANSI_BOLD);
                    out.push_str(&segment.text);
                    out.push_str(ANSI_RESET);
                }
            }
        }
        out
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            f.write_str(&segment.text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_append_in_order() {
        let mut report = Report::new();
        report
            .append_section(
                SectionKind::Main,
                vec![Segment::bold(MAIN_HEADER), Segment::plain("rose (Confidence: 0.5)\n")],
            )
            .unwrap();
        report
            .append_section(SectionKind::Other, vec![Segment::plain(LABELING_FAILED)])
            .unwrap();

        assert_eq!(
            report.to_plain_text(),
            "Main Prediction:\nrose (Confidence: 0.5)\nML Kit prediction failed."
        );
        assert_eq!(report.to_string(), report.to_plain_text());
        assert!(report.has_section(SectionKind::Main));
        assert!(report.has_section(SectionKind::Other));
    }

    #[test]
    fn test_sections_are_never_rewritten() {
        let mut report = Report::new();
        report
            .append_section(SectionKind::Main, vec![Segment::plain("a")])
            .unwrap();

        assert_eq!(
            report.append_section(SectionKind::Main, vec![Segment::plain("b")]),
            Err(ReportError::AlreadyWritten(SectionKind::Main))
        );
        assert_eq!(report.to_plain_text(), "a");
    }

    #[test]
    fn test_other_cannot_precede_main() {
        let mut report = Report::new();
        assert_eq!(
            report.append_section(SectionKind::Other, vec![Segment::plain("x")]),
            Err(ReportError::OutOfOrder)
        );
        assert!(report.is_empty());
    }

    #[test]
    fn test_ansi_rendering_bolds_headers_only() {
        let mut report = Report::new();
        report
            .append_section(
                SectionKind::Main,
                vec![Segment::bold("H:\n"), Segment::plain("body\n")],
            )
            .unwrap();

        assert_eq!(report.to_ansi(), "\x1b[1mH:\n\x1b[0mbody\n");
    }

    #[test]
    fn test_notice_has_no_sections() {
        let report = Report::notice(IMAGE_LOAD_FAILED);
        assert_eq!(report.to_plain_text(), "Error loading image.");
        assert!(!report.has_section(SectionKind::Main));
        assert_eq!(report.segments()[0].style, Style::Plain);
    }
}
