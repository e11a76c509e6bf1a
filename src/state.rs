use std::fmt;
use std::time::Instant;

// ---------------------------------------------------------------------------
// Invocation state
// ---------------------------------------------------------------------------

/// Where one report invocation is. Stages only move forward; `Failed` and
/// `Done` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Loading,
    Aggregating,
    Charting,
    Templating,
    Rendering,
    Done,
    Failed,
}

impl Stage {
    /// Position among the five working stages, for `[n/5]` progress lines.
    pub fn step(self) -> Option<usize> {
        match self {
            Stage::Loading => Some(1),
            Stage::Aggregating => Some(2),
            Stage::Charting => Some(3),
            Stage::Templating => Some(4),
            Stage::Rendering => Some(5),
            Stage::Done | Stage::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Loading => "loading data",
            Stage::Aggregating => "computing KPIs",
            Stage::Charting => "drawing charts",
            Stage::Templating => "filling template",
            Stage::Rendering => "rendering PDF",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Progress of a single invocation, independent of what it produces.
#[derive(Debug)]
pub struct RunState {
    stage: Stage,
    /// Last working stage entered, reported when the run fails.
    last_step: Stage,
    started: Instant,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            stage: Stage::Loading,
            last_step: Stage::Loading,
            started: Instant::now(),
        }
    }
}

impl RunState {
    /// A fresh run, already in `Loading`.
    pub fn new() -> Self {
        let state = Self::default();
        log::info!("[1/5] {}...", Stage::Loading);
        state
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Move to the next working stage or to `Done`. Moves backwards and moves
    /// out of a terminal stage are ignored.
    pub fn advance(&mut self, next: Stage) {
        if self.stage.is_terminal() || next <= self.stage || next == Stage::Failed {
            log::debug!("ignoring stage change {} -> {}", self.stage, next);
            return;
        }
        self.stage = next;
        match next.step() {
            Some(n) => {
                self.last_step = next;
                log::info!("[{n}/5] {next}...");
            }
            None => log::info!(
                "report finished in {:.2?}",
                self.started.elapsed()
            ),
        }
    }

    /// Enter the absorbing `Failed` stage.
    pub fn fail(&mut self, reason: &dyn fmt::Display) {
        if self.stage.is_terminal() {
            return;
        }
        log::error!("report failed while {}: {reason}", self.last_step);
        self.stage = Stage::Failed;
    }
}
