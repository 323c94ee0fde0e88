//! Passive diagnostics for the analysis stages.
//!
//! Nothing in the pipeline depends on what an observer does with an event;
//! callers that do not care pass [`NoopObserver`].

use serde::Serialize;

use crate::roles::Role;

/// Why a paragraph refused a word that no existing line accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// The word starts too far below the paragraph's bottom edge.
    TooFarBelow,
    /// Close enough vertically but aligned with neither edge.
    NotAligned,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AssemblyEvent {
    CharSpacing {
        page: u32,
        spacing: i32,
        gaps: usize,
    },
    WordEmitted {
        page: u32,
        text: String,
    },
    RunSkipped {
        page: u32,
        reason: String,
    },
    NewParagraph {
        page: u32,
    },
    WordRejected {
        reason: RejectReason,
    },
    LinesCombined {
        kept: usize,
        removed: usize,
    },
    RoleAssigned {
        role: Role,
    },
}

pub trait AssemblyObserver {
    fn observe(&mut self, event: &AssemblyEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl AssemblyObserver for NoopObserver {
    fn observe(&mut self, _event: &AssemblyEvent) {}
}

/// Records every event it sees.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<AssemblyEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AssemblyEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn words_emitted(&self) -> usize {
        self.count(|e| matches!(e, AssemblyEvent::WordEmitted { .. }))
    }

    pub fn rejections(&self, reason: RejectReason) -> usize {
        self.count(|e| matches!(e, AssemblyEvent::WordRejected { reason: r } if *r == reason))
    }
}

impl AssemblyObserver for EventLog {
    fn observe(&mut self, event: &AssemblyEvent) {
        self.events.push(event.clone());
    }
}

impl<O: AssemblyObserver + ?Sized> AssemblyObserver for &mut O {
    fn observe(&mut self, event: &AssemblyEvent) {
        (**self).observe(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_counts() {
        let mut log = EventLog::new();
        log.observe(&AssemblyEvent::WordEmitted {
            page: 1,
            text: "a".to_string(),
        });
        log.observe(&AssemblyEvent::WordRejected {
            reason: RejectReason::NotAligned,
        });
        log.observe(&AssemblyEvent::WordRejected {
            reason: RejectReason::TooFarBelow,
        });
        assert_eq!(log.words_emitted(), 1);
        assert_eq!(log.rejections(RejectReason::NotAligned), 1);
        assert_eq!(log.events.len(), 3);
    }

    #[test]
    fn test_events_serialize() {
        let json = serde_json::to_string(&AssemblyEvent::NewParagraph { page: 3 }).unwrap();
        assert_eq!(json, r#"{"NewParagraph":{"page":3}}"#);
    }
}
