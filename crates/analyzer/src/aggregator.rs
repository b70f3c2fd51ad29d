use crate::classifier::ClassifyError;
use crate::report::{
    LABELING_FAILED, MAIN_HEADER, MODEL_UNAVAILABLE, NO_CONFIDENT_MATCH, OTHER_HEADER,
    PREDICTION_FAILED, Report, SectionKind, Segment,
};
use crate::requests::{RequestTicket, RequestTracker};
use crate::sink::DisplaySink;
use common::Prediction;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorPhase {
    /// Neither branch has reported.
    Waiting,
    /// Main section written, other branch still running.
    MainWritten,
    /// Other branch finished first, its section is held back.
    OtherDeferred,
    /// Both sections written and the report handed to the sink.
    Published,
    /// The request went stale; nothing more will be written.
    Discarded,
}

pub type BranchResult = Result<Vec<Prediction>, ClassifyError>;

/// Segments for the main section.
pub fn main_section(result: &BranchResult) -> Vec<Segment> {
    let body = match result {
        Ok(predictions) if predictions.is_empty() => format!("{NO_CONFIDENT_MATCH}\n"),
        Ok(predictions) => predictions.iter().map(|p| format!("{p}\n")).collect(),
        Err(ClassifyError::Unavailable) => format!("{MODEL_UNAVAILABLE}\n"),
        Err(_) => format!("{PREDICTION_FAILED}\n"),
    };
    vec![Segment::bold(MAIN_HEADER), Segment::plain(body)]
}

/// Segments for the other section. A failure replaces the whole section.
pub fn other_section(result: &BranchResult) -> Vec<Segment> {
    match result {
        Ok(predictions) => {
            let body: String = predictions
                .iter()
                .map(|p| format!("{} (Confidence: {:.2})\n", p.label, p.confidence))
                .collect();
            vec![Segment::bold(OTHER_HEADER), Segment::plain(body)]
        }
        Err(_) => vec![Segment::plain(LABELING_FAILED)],
    }
}

/// Merges the two branch results of one request into a single report.
///
/// The main section always precedes the other section. The report is
/// published exactly once, when the other section lands. Results for a
/// request that is no longer current are dropped; the final currency check
/// and the publish happen under the tracker's gate.
pub struct ResultAggregator<S: ?Sized> {
    ticket: RequestTicket,
    tracker: RequestTracker,
    sink: Arc<S>,
    report: Report,
    phase: AggregatorPhase,
    deferred_other: Option<Vec<Segment>>,
}

impl<S: DisplaySink + ?Sized> ResultAggregator<S> {
    pub fn new(ticket: RequestTicket, tracker: RequestTracker, sink: Arc<S>) -> Self {
        Self {
            ticket,
            tracker,
            sink,
            report: Report::new(),
            phase: AggregatorPhase::Waiting,
            deferred_other: None,
        }
    }

    /// Record the main branch. Returns the new phase if it changed.
    pub fn record_main(&mut self, result: BranchResult) -> Option<AggregatorPhase> {
        let old_phase = self.phase;
        if let Err(e) = &result {
            tracing::warn!(request_id = self.ticket.id(), error = %e, "Main branch failed");
        }

        match self.phase {
            AggregatorPhase::Waiting | AggregatorPhase::OtherDeferred => {
                if self.discard_if_stale() {
                    return self.transition(old_phase);
                }
                self.write(SectionKind::Main, main_section(&result));
                match self.deferred_other.take() {
                    Some(other) => {
                        self.write(SectionKind::Other, other);
                        self.publish();
                    }
                    None => self.phase = AggregatorPhase::MainWritten,
                }
            }
            AggregatorPhase::MainWritten | AggregatorPhase::Published => {
                tracing::warn!(request_id = self.ticket.id(), "Main branch reported twice");
            }
            AggregatorPhase::Discarded => {}
        }

        self.transition(old_phase)
    }

    /// Record the other branch. Returns the new phase if it changed.
    pub fn record_other(&mut self, result: BranchResult) -> Option<AggregatorPhase> {
        let old_phase = self.phase;
        if let Err(e) = &result {
            tracing::warn!(request_id = self.ticket.id(), error = %e, "Labeling branch failed");
        }

        match self.phase {
            AggregatorPhase::Waiting => {
                if !self.discard_if_stale() {
                    self.deferred_other = Some(other_section(&result));
                    self.phase = AggregatorPhase::OtherDeferred;
                }
            }
            AggregatorPhase::MainWritten => {
                if !self.discard_if_stale() {
                    self.write(SectionKind::Other, other_section(&result));
                    self.publish();
                }
            }
            AggregatorPhase::OtherDeferred | AggregatorPhase::Published => {
                tracing::warn!(request_id = self.ticket.id(), "Labeling branch reported twice");
            }
            AggregatorPhase::Discarded => {}
        }

        self.transition(old_phase)
    }

    pub fn phase(&self) -> AggregatorPhase {
        self.phase
    }

    pub fn ticket(&self) -> RequestTicket {
        self.ticket
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn into_report(self) -> Report {
        self.report
    }

    fn transition(&self, old_phase: AggregatorPhase) -> Option<AggregatorPhase> {
        if old_phase != self.phase {
            Some(self.phase)
        } else {
            None
        }
    }

    fn discard_if_stale(&mut self) -> bool {
        if self.tracker.is_current(self.ticket) {
            return false;
        }
        tracing::debug!(
            request_id = self.ticket.id(),
            current = self.tracker.current_id(),
            "Dropping results of a superseded request"
        );
        self.phase = AggregatorPhase::Discarded;
        self.deferred_other = None;
        true
    }

    fn write(&mut self, kind: SectionKind, segments: Vec<Segment>) {
        if let Err(e) = self.report.append_section(kind, segments) {
            tracing::warn!(request_id = self.ticket.id(), error = %e, "Rejected report section");
        }
    }

    fn publish(&mut self) {
        let (sink, report) = (&self.sink, &self.report);
        match self.tracker.run_if_current(self.ticket, || sink.publish(report)) {
            Some(()) => self.phase = AggregatorPhase::Published,
            None => {
                self.discard_if_stale();
            }
        }
    }
}
