//! Offline replay of scene feeds against a recording surface.
//!
//! Input is JSON lines, one scene feed per line. Blank lines and lines starting
//! with `#` are skipped.

use std::fmt;
use std::io::BufRead;

use formats::{FeedError, SceneFeed, build_scene};
use overlay::{OverlayConfig, Reconciler, TickReport};
use runtime::{Event, MetricsSnapshot};
use scene::Scene;
use serde::Serialize;
use surface::{RecordingSurface, SurfaceCall};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Scenes submitted before the surface reports ready; 0 means ready at start.
    pub ready_after: usize,
    /// Tear the overlay down after the last scene.
    pub teardown: bool,
}

/// One adapter call attributed to the tick that issued it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayLine {
    pub tick: u64,
    #[serde(flatten)]
    pub call: SurfaceCall,
}

#[derive(Debug)]
pub struct Replay {
    pub lines: Vec<ReplayLine>,
    pub reports: Vec<TickReport>,
    pub metrics: MetricsSnapshot,
    pub events: Vec<Event>,
}

#[derive(Debug)]
pub enum ReplayError {
    Read { line: usize, source: std::io::Error },
    Feed { line: usize, source: FeedError },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::Read { line, source } => write!(f, "line {line}: read failed: {source}"),
            ReplayError::Feed { line, source } => write!(f, "line {line}: {source}"),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplayError::Read { source, .. } => Some(source),
            ReplayError::Feed { source, .. } => Some(source),
        }
    }
}

pub fn replay(
    input: impl BufRead,
    config: OverlayConfig,
    options: &ReplayOptions,
) -> Result<Replay, ReplayError> {
    let mut engine = Reconciler::new(RecordingSurface::new(), config);
    let mut lines = Vec::new();
    let mut reports = Vec::new();
    let mut submitted = 0usize;
    let mut previous: Option<Scene> = None;

    if options.ready_after == 0 {
        engine.mark_ready();
    }

    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| ReplayError::Read {
            line: line_no,
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let feed = SceneFeed::from_json_str(trimmed).map_err(|source| ReplayError::Feed {
            line: line_no,
            source,
        })?;

        if !engine.is_ready() && submitted == options.ready_after {
            if let Some(report) = engine.mark_ready() {
                drain(&mut engine, report.tick, &mut lines);
                reports.push(report);
            }
        }

        let scene = build_scene(&feed);
        let changes = previous.as_ref().map(|p| scene.changes_since(p));
        debug!(line = line_no, ?changes, intent = ?scene.viewport_intent(), "scene parsed");
        previous = Some(scene.clone());

        let report = engine.submit(scene);
        submitted += 1;
        debug!(line = line_no, tick = report.tick, buffered = report.buffered, "scene replayed");
        drain(&mut engine, report.tick, &mut lines);
        reports.push(report);
    }

    if !engine.is_ready() {
        if let Some(report) = engine.mark_ready() {
            drain(&mut engine, report.tick, &mut lines);
            reports.push(report);
        }
    }

    let metrics = engine.metrics().snapshot();
    if options.teardown {
        let removed = engine.teardown();
        let tick = engine.tick();
        drain(&mut engine, tick, &mut lines);
        info!(removed, "overlay torn down");
    }

    let events = engine.events_mut().drain();
    info!(
        scenes = submitted,
        calls = lines.len(),
        events = events.len(),
        "replay finished"
    );
    Ok(Replay {
        lines,
        reports,
        metrics,
        events,
    })
}

fn drain(engine: &mut Reconciler<RecordingSurface>, tick: u64, out: &mut Vec<ReplayLine>) {
    out.extend(
        engine
            .surface_mut()
            .take_calls()
            .into_iter()
            .map(|call| ReplayLine { tick, call }),
    );
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{ReplayError, ReplayOptions, replay};
    use overlay::OverlayConfig;
    use pretty_assertions::assert_eq;
    use surface::CallKind;

    const FEEDS: &str = r#"
# two shelters, then one moves out
{"markers": [{"id": 1, "lat": 1, "lng": 1, "title": "a"}, {"id": 2, "lat": 2, "lng": 2, "title": "b"}]}
{"markers": [{"id": 1, "lat": 1, "lng": 1, "title": "a"}]}
"#;

    #[test]
    fn replays_each_scene_as_a_tick() {
        let out = replay(Cursor::new(FEEDS), OverlayConfig::default(), &ReplayOptions::default())
            .unwrap();
        assert_eq!(out.reports.len(), 2);
        let kinds: Vec<_> = out.lines.iter().map(|l| (l.tick, l.call.kind())).collect();
        assert_eq!(
            kinds,
            vec![
                (1, CallKind::AddMarker),
                (1, CallKind::AddMarker),
                (1, CallKind::FitBounds),
                (2, CallKind::RemoveMarker),
                (2, CallKind::FlyTo),
            ]
        );
    }

    #[test]
    fn late_ready_renders_only_the_last_buffered_scene() {
        let opts = ReplayOptions {
            ready_after: 5,
            teardown: true,
        };
        let out = replay(Cursor::new(FEEDS), OverlayConfig::default(), &opts).unwrap();
        assert!(out.reports[..2].iter().all(|r| r.buffered));
        let adds = out.lines.iter().filter(|l| l.call.kind().is_add()).count();
        let removes = out.lines.iter().filter(|l| l.call.kind().is_remove()).count();
        assert_eq!((adds, removes), (1, 1));
        assert_eq!(out.events.len(), 2);
    }

    #[test]
    fn bad_line_reports_its_number() {
        let input = "{}\nnot json\n";
        let err = replay(Cursor::new(input), OverlayConfig::default(), &ReplayOptions::default())
            .unwrap_err();
        assert!(matches!(err, ReplayError::Feed { line: 2, .. }));
    }

    #[test]
    fn lines_serialize_flat() {
        let out = replay(
            Cursor::new(r#"{"locationPin": {"lat": 1, "lng": 2}}"#),
            OverlayConfig::default(),
            &ReplayOptions::default(),
        )
        .unwrap();
        let first = serde_json::to_value(&out.lines[0]).unwrap();
        assert_eq!(first["tick"], 1);
        assert_eq!(first["call"], "add_marker");
    }
}
