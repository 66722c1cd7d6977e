//! Refresh scheduling: decides when the marker pipeline runs and keeps it
//! idempotent across repeated runs.
//!
//! # State machine
//!
//! ```text
//! Idle --navigation signal--> Scheduled --timer--> Running --done--> Idle
//! ```
//!
//! Signals arriving while `Scheduled` or `Running` coalesce into a single
//! pending run. The controller never touches a clock or a timer itself: it
//! tells the driver *when to arm* the debounce timer ([`ScheduleAction`]) and
//! the driver calls back on expiry. A run is consumed in slices
//! ([`RefreshController::run_slice`]) so the driver can spread work across
//! deferred callbacks instead of blocking navigation rendering; each marker
//! is fully processed within its slice.
//!
//! # Idempotence
//!
//! A marker produces at most one widget per page render. Two guards, checked
//! per marker: membership of its [`MarkerId`] in the processed set, and
//! whether a widget element already sits immediately after the marker in the
//! document. The processed set is cleared when the visible route changes and
//! survives content-mutation re-runs within the same route.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::EmbedError;
use crate::marker::{EmbedMarker, MarkerId, parse_marker};
use crate::resolve::{ResolvedDemo, resolve_demo};
use crate::scaffold::WidgetIds;

/// A navigation event surfaced to the controller.
///
/// The DOM layer merges its raw sources (hash changes, content mutations,
/// host lifecycle notifications) into this one signal type; the controller
/// subscribes to nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationSignal {
    /// First render after the plugin mounted.
    InitialLoad,
    /// The visible route changed; widget bookkeeping must reset.
    RouteChanged,
    /// Content under the scan root changed without a route change.
    ContentMutated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Scheduled,
    Running,
}

/// What the driver must do after reporting a signal.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleAction {
    /// Arm the debounce timer; call [`RefreshController::timer_fired`] when
    /// it expires.
    ArmTimer { delay_ms: u32 },
    /// A run is already scheduled or running; the signal was folded into it.
    Coalesced,
}

/// Outcome of one processing slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceOutcome {
    /// Markers remain; schedule another slice on a deferred callback.
    More,
    /// The run is complete. When `rearm` is set, triggers arrived during the
    /// run and the driver must arm the debounce timer again.
    Finished { report: RunReport, rearm: bool },
}

/// Counters for one pipeline run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Markers considered.
    pub scanned: usize,
    /// Widgets built.
    pub built: usize,
    /// Markers skipped because they were already processed or already had a
    /// widget.
    pub skipped: usize,
    /// Markers that failed to parse, resolve, or build.
    pub failed: usize,
}

/// The document surface the pipeline runs against.
///
/// The browser implementation wraps the live DOM; tests use an in-memory
/// stand-in. `Anchor` is an opaque handle to a marker's position (a comment
/// node in the DOM case) that stays valid for the duration of one run.
pub trait DocumentHost {
    type Anchor;

    /// The page's absolute URL, fragment included.
    fn page_url(&self) -> String;

    /// Every comment node under the scan root that looks like an embed
    /// marker candidate, in document order, with its raw text.
    fn collect_comments(&mut self) -> Vec<(Self::Anchor, String)>;

    /// Whether a widget container already sits immediately after the marker.
    fn widget_follows(&self, anchor: &Self::Anchor) -> bool;

    /// Build a widget for the resolved demo and insert it as the marker's
    /// next sibling.
    fn build_widget(
        &mut self,
        anchor: &Self::Anchor,
        demo: &ResolvedDemo,
        ids: &WidgetIds,
    ) -> Result<(), EmbedError>;
}

/// Owns the pipeline schedule and all widget bookkeeping.
///
/// The processed set lives here and nowhere else; no other component writes
/// to it.
pub struct RefreshController<H: DocumentHost> {
    state: RefreshState,
    debounce_ms: u32,
    processed: HashSet<MarkerId>,
    queue: VecDeque<(H::Anchor, EmbedMarker)>,
    page_url: String,
    route: String,
    report: RunReport,
    /// A signal arrived while `Scheduled` or `Running`.
    pending: bool,
    /// The route changed; clear the processed set before the next run.
    reset_queued: bool,
    generation: u64,
    seq: usize,
}

impl<H: DocumentHost> RefreshController<H> {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            state: RefreshState::Idle,
            debounce_ms,
            processed: HashSet::new(),
            queue: VecDeque::new(),
            page_url: String::new(),
            route: String::new(),
            report: RunReport::default(),
            pending: false,
            reset_queued: false,
            generation: 0,
            seq: 0,
        }
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    /// Report a navigation signal.
    ///
    /// Must never be called synchronously from inside a navigation event
    /// handler's critical path; the returned action defers all real work to
    /// a timer callback.
    pub fn notify(&mut self, signal: NavigationSignal) -> ScheduleAction {
        if matches!(
            signal,
            NavigationSignal::InitialLoad | NavigationSignal::RouteChanged
        ) {
            self.reset_queued = true;
        }

        match self.state {
            RefreshState::Idle => {
                self.state = RefreshState::Scheduled;
                tracing::debug!(?signal, "pipeline run scheduled");
                ScheduleAction::ArmTimer {
                    delay_ms: self.debounce_ms,
                }
            }
            RefreshState::Scheduled => ScheduleAction::Coalesced,
            RefreshState::Running => {
                self.pending = true;
                ScheduleAction::Coalesced
            }
        }
    }

    /// Debounce timer expiry: start a run by staging every marker currently
    /// in the document.
    ///
    /// Returns `false` for a stale timer (the controller was not waiting for
    /// one); the driver must then not call [`Self::run_slice`].
    pub fn timer_fired(&mut self, host: &mut H) -> bool {
        if self.state != RefreshState::Scheduled {
            return false;
        }
        self.state = RefreshState::Running;

        if self.reset_queued {
            self.processed.clear();
            self.reset_queued = false;
        }
        self.generation += 1;
        self.seq = 0;
        self.report = RunReport::default();
        self.page_url = host.page_url();
        self.route = self
            .page_url
            .split_once('#')
            .map(|(_, fragment)| fragment.to_string())
            .unwrap_or_default();

        // Stage markers with occurrence ordinals so duplicated marker text
        // keeps distinct identities.
        let mut occurrences: HashMap<u64, u32> = HashMap::new();
        self.queue = host
            .collect_comments()
            .into_iter()
            .map(|(anchor, text)| {
                let trimmed = text.trim();
                let count = occurrences
                    .entry(crate::marker::fingerprint(trimmed))
                    .or_insert(0);
                let marker = EmbedMarker::new(trimmed, *count);
                *count += 1;
                (anchor, marker)
            })
            .collect();

        true
    }

    /// Process up to `budget` markers. Call repeatedly from deferred
    /// callbacks until it returns [`SliceOutcome::Finished`].
    pub fn run_slice(&mut self, host: &mut H, budget: usize) -> SliceOutcome {
        if self.state != RefreshState::Running {
            return SliceOutcome::Finished {
                report: RunReport::default(),
                rearm: false,
            };
        }

        for _ in 0..budget.max(1) {
            let Some((anchor, marker)) = self.queue.pop_front() else {
                break;
            };
            self.report.scanned += 1;

            let id = marker.id();
            if self.processed.contains(&id) {
                self.report.skipped += 1;
                continue;
            }
            if host.widget_follows(&anchor) {
                self.processed.insert(id);
                self.report.skipped += 1;
                continue;
            }

            match self.process_marker(host, &anchor, &marker) {
                Ok(()) => self.report.built += 1,
                Err(err) => {
                    self.report.failed += 1;
                    tracing::warn!(marker = marker.text(), %err, "embed marker skipped");
                }
            }
            self.processed.insert(id);
        }

        if !self.queue.is_empty() {
            return SliceOutcome::More;
        }

        let report = self.report;
        let rearm = self.pending;
        self.pending = false;
        self.state = if rearm {
            RefreshState::Scheduled
        } else {
            RefreshState::Idle
        };
        tracing::debug!(?report, rearm, "pipeline run finished");
        SliceOutcome::Finished { report, rearm }
    }

    fn process_marker(
        &mut self,
        host: &mut H,
        anchor: &H::Anchor,
        marker: &EmbedMarker,
    ) -> Result<(), EmbedError> {
        let request = parse_marker(marker.text(), &self.route)?;
        let demo = resolve_demo(&request, &self.page_url);
        let ids = WidgetIds::new(&demo.scene_label, self.generation, self.seq);
        self.seq += 1;
        host.build_widget(anchor, &demo, &ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory document: a list of comment texts, each with an optional
    /// widget slot "after" it.
    struct MockHost {
        page_url: String,
        comments: Vec<String>,
        widgets: Vec<Option<String>>,
        builds: usize,
        fail_on: Option<usize>,
    }

    impl MockHost {
        fn new(page_url: &str, comments: &[&str]) -> Self {
            Self {
                page_url: page_url.to_string(),
                comments: comments.iter().map(|s| s.to_string()).collect(),
                widgets: vec![None; comments.len()],
                builds: 0,
                fail_on: None,
            }
        }
    }

    impl DocumentHost for MockHost {
        type Anchor = usize;

        fn page_url(&self) -> String {
            self.page_url.clone()
        }

        fn collect_comments(&mut self) -> Vec<(usize, String)> {
            self.comments.iter().cloned().enumerate().collect()
        }

        fn widget_follows(&self, anchor: &usize) -> bool {
            self.widgets[*anchor].is_some()
        }

        fn build_widget(
            &mut self,
            anchor: &usize,
            demo: &ResolvedDemo,
            _ids: &WidgetIds,
        ) -> Result<(), EmbedError> {
            if self.fail_on == Some(*anchor) {
                return Err(EmbedError::DomUnavailable {
                    what: "test".to_string(),
                });
            }
            self.builds += 1;
            self.widgets[*anchor] = Some(demo.url.clone());
            Ok(())
        }
    }

    type Controller = RefreshController<MockHost>;

    /// Arm, fire, and drain one full run.
    fn drive(ctl: &mut Controller, host: &mut MockHost) -> RunReport {
        assert!(ctl.timer_fired(host));
        loop {
            match ctl.run_slice(host, 2) {
                SliceOutcome::More => {}
                SliceOutcome::Finished { report, .. } => return report,
            }
        }
    }

    #[test]
    fn test_full_run_builds_widgets() {
        let mut host = MockHost::new(
            "https://x.io/index.html#/demo/readme",
            &["embed-demo: scenes/animation/tween/tween", "embed-demo"],
        );
        let mut ctl = Controller::new(150);

        assert_eq!(
            ctl.notify(NavigationSignal::InitialLoad),
            ScheduleAction::ArmTimer { delay_ms: 150 }
        );
        let report = drive(&mut ctl, &mut host);

        assert_eq!(report.built, 2);
        assert_eq!(
            host.widgets[0].as_deref(),
            Some("https://x.io/demo/exports/web/?scene=animation%2Ftween")
        );
        assert_eq!(host.widgets[1].as_deref(), Some("https://x.io/demo/exports/web/"));
    }

    #[test]
    fn test_triggers_within_debounce_collapse_into_one_run() {
        let mut host = MockHost::new("https://x.io/", &["embed-demo"]);
        let mut ctl = Controller::new(150);

        assert!(matches!(
            ctl.notify(NavigationSignal::InitialLoad),
            ScheduleAction::ArmTimer { .. }
        ));
        assert_eq!(
            ctl.notify(NavigationSignal::ContentMutated),
            ScheduleAction::Coalesced
        );
        assert_eq!(
            ctl.notify(NavigationSignal::ContentMutated),
            ScheduleAction::Coalesced
        );

        drive(&mut ctl, &mut host);
        assert_eq!(host.builds, 1);
        assert_eq!(ctl.state(), RefreshState::Idle);

        // The coalesced triggers armed exactly one timer; a stray second
        // expiry is stale and must not start a run.
        assert!(!ctl.timer_fired(&mut host));
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let mut host = MockHost::new("https://x.io/", &["embed-demo", "embed-other"]);
        let mut ctl = Controller::new(150);

        let _ = ctl.notify(NavigationSignal::InitialLoad);
        drive(&mut ctl, &mut host);
        assert_eq!(host.builds, 2);

        let _ = ctl.notify(NavigationSignal::ContentMutated);
        let report = drive(&mut ctl, &mut host);
        assert_eq!(host.builds, 2, "second run must not build anything");
        assert_eq!(report.built, 0);
        assert_eq!(report.skipped, 2);
    }

    #[test]
    fn test_existing_widget_detected_without_processed_set() {
        // Route change clears the processed set, so only the widget-presence
        // check stands between a re-run and a duplicate.
        let mut host = MockHost::new("https://x.io/", &["embed-demo"]);
        let mut ctl = Controller::new(150);

        let _ = ctl.notify(NavigationSignal::InitialLoad);
        drive(&mut ctl, &mut host);
        assert_eq!(host.builds, 1);

        let _ = ctl.notify(NavigationSignal::RouteChanged);
        let report = drive(&mut ctl, &mut host);
        assert_eq!(host.builds, 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_signal_while_running_requests_rearm() {
        let mut host = MockHost::new("https://x.io/", &["embed-demo", "embed-other"]);
        let mut ctl = Controller::new(150);

        let _ = ctl.notify(NavigationSignal::InitialLoad);
        assert!(ctl.timer_fired(&mut host));

        // First slice leaves the run in progress; a trigger lands meanwhile.
        assert!(matches!(ctl.run_slice(&mut host, 1), SliceOutcome::More));
        assert_eq!(
            ctl.notify(NavigationSignal::ContentMutated),
            ScheduleAction::Coalesced
        );

        match ctl.run_slice(&mut host, 8) {
            SliceOutcome::Finished { rearm, .. } => assert!(rearm),
            other => panic!("expected Finished, got {other:?}"),
        }
        assert_eq!(ctl.state(), RefreshState::Scheduled);

        // The re-armed timer drives a follow-up run, which finds nothing new.
        let report = drive(&mut ctl, &mut host);
        assert_eq!(report.built, 0);
        assert_eq!(host.builds, 2);
    }

    #[test]
    fn test_one_bad_marker_does_not_abort_the_run() {
        let mut host = MockHost::new(
            "https://x.io/",
            &[
                "embed-demo: scenes/animation",          // too few segments
                "start-embed-demo-scenes/a/b/c",         // legacy syntax
                "embed-demo",                            // fine
            ],
        );
        let mut ctl = Controller::new(150);

        let _ = ctl.notify(NavigationSignal::InitialLoad);
        let report = drive(&mut ctl, &mut host);

        assert_eq!(report.failed, 2);
        assert_eq!(report.built, 1);
        assert!(host.widgets[2].is_some());
    }

    #[test]
    fn test_build_failure_is_scoped_to_its_marker() {
        let mut host = MockHost::new("https://x.io/", &["embed-a", "embed-b"]);
        host.fail_on = Some(0);
        let mut ctl = Controller::new(150);

        let _ = ctl.notify(NavigationSignal::InitialLoad);
        let report = drive(&mut ctl, &mut host);

        assert_eq!(report.failed, 1);
        assert_eq!(report.built, 1);
        assert!(host.widgets[0].is_none());
        assert!(host.widgets[1].is_some());
    }

    #[test]
    fn test_duplicate_marker_text_builds_one_widget_each() {
        let mut host = MockHost::new("https://x.io/", &["embed-demo", "embed-demo"]);
        let mut ctl = Controller::new(150);

        let _ = ctl.notify(NavigationSignal::InitialLoad);
        let report = drive(&mut ctl, &mut host);
        assert_eq!(report.built, 2);
    }

    #[test]
    fn test_zero_markers_is_a_noop() {
        let mut host = MockHost::new("https://x.io/", &[]);
        let mut ctl = Controller::new(150);

        let _ = ctl.notify(NavigationSignal::InitialLoad);
        let report = drive(&mut ctl, &mut host);
        assert_eq!(report, RunReport::default());
        assert_eq!(ctl.state(), RefreshState::Idle);
    }

    #[test]
    fn test_template_marker_uses_current_route() {
        let mut host = MockHost::new(
            "https://x.io/index.html#/demo/scenes/physics/bounce/readme",
            &["embed-demo: {$PATH}/foo"],
        );
        let mut ctl = Controller::new(150);

        let _ = ctl.notify(NavigationSignal::InitialLoad);
        let report = drive(&mut ctl, &mut host);
        assert_eq!(report.built, 1);
        assert_eq!(
            host.widgets[0].as_deref(),
            Some("https://x.io/demo/exports/web/?scene=physics%2Fbounce")
        );
    }
}
