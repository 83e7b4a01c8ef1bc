use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::calibration::{Anchor, Calibration};
use crate::config::{ConfigSource, GridConfig, JitterPolicy};
use crate::error::{Error, InputError};
use crate::geometry::{Grid, JitterOffset, Point};
use crate::input::InputSimulator;
use crate::scan::{self, Cell};
use crate::timing::TimingModel;

/// Upper bound on how long a stop request can go unnoticed during a wait.
pub const WAIT_SLICE: Duration = Duration::from_millis(25);

/// Everything the hotkeys and the panel can ask for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    Capture(Anchor, Point),
    Start,
    Stop,
    Reload,
    Shutdown,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Idle,
    /// Start accepted, pre-run pause in progress.
    Armed,
    Running,
    /// Releasing the modifier.
    Stopping,
}

impl RunState {
    pub fn label(self) -> &'static str {
        match self {
            RunState::Idle => "Idle",
            RunState::Armed => "Starting…",
            RunState::Running => "Running",
            RunState::Stopping => "Stopping",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    EmergencyStop,
    FailSafe,
    Shutdown,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::EmergencyStop => "emergency stop",
            StopReason::FailSafe => "fail-safe",
            StopReason::Shutdown => "shutdown",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    Completed { clicks: usize },
    Stopped { clicks: usize, reason: StopReason },
    /// Nothing was pressed or clicked.
    Rejected(Error),
    Failed { clicks: usize, error: Error },
}

/// Snapshot published for the control panel.
#[derive(Clone, Debug, Default)]
pub struct Status {
    pub state: RunState,
    pub calibration: Calibration,
    pub config: GridConfig,
    pub clicks: usize,
    pub cells: usize,
    pub last_report: Option<String>,
}

pub type StatusBoard = Arc<Mutex<Status>>;

struct RunPlan {
    grid: Grid,
    config: GridConfig,
    sequence: Vec<Cell>,
    pinned: Option<Vec<JitterOffset>>,
}

/// Owns calibration, config and run state, and is the only thing that
/// touches the input simulator.
pub struct RunController<I, S> {
    input: I,
    source: S,
    calibration: Calibration,
    config: GridConfig,
    state: RunState,
    timing: TimingModel,
    rng: StdRng,
    pinned: Option<(Grid, Vec<JitterOffset>)>,
    board: StatusBoard,
    shutdown: bool,
}

impl<I: InputSimulator, S: ConfigSource> RunController<I, S> {
    pub fn new(input: I, mut source: S, timing: TimingModel, board: StatusBoard) -> Self {
        let config = source.load();
        let controller = Self {
            input,
            source,
            calibration: Calibration::new(),
            config,
            state: RunState::Idle,
            timing,
            rng: StdRng::from_entropy(),
            pinned: None,
            board,
            shutdown: false,
        };
        controller.publish();
        controller
    }

    pub fn state(&self) -> RunState { self.state }
    pub fn calibration(&self) -> &Calibration { &self.calibration }
    pub fn config(&self) -> &GridConfig { &self.config }
    pub fn input(&self) -> &I { &self.input }
    pub fn is_shut_down(&self) -> bool { self.shutdown }

    /// Process events until `Shutdown` or until every sender is gone.
    pub fn run_forever(&mut self, events: Receiver<Event>) {
        while !self.shutdown {
            match events.recv() {
                Ok(event) => { self.handle(event, &events); }
                Err(_) => break,
            }
        }
        info!("Controller stopped");
    }

    /// Applies one event while idle. `Start` runs the whole scan before
    /// returning; events arriving meanwhile are taken from `events`.
    pub fn handle(&mut self, event: Event, events: &Receiver<Event>) -> Option<RunOutcome> {
        match event {
            Event::Capture(anchor, point) => self.capture(anchor, point),
            Event::Reload => self.reload(),
            Event::Stop => debug!("Stop requested while idle"),
            Event::Shutdown => self.shutdown = true,
            Event::Start => return Some(self.start(events)),
        }
        None
    }

    pub fn start(&mut self, events: &Receiver<Event>) -> RunOutcome {
        {
            let mut status = self.board.lock();
            status.clicks = 0;
            status.cells = 0;
        }
        let outcome = match self.arm() {
            Ok(plan) => self.execute(plan, events),
            Err(e) => RunOutcome::Rejected(e),
        };
        self.set_state(RunState::Idle);
        self.report(&outcome);
        outcome
    }

    fn capture(&mut self, anchor: Anchor, point: Point) {
        self.calibration.set(anchor, point);
        self.pinned = None;
        info!("Captured {} ({}) = ({:.0}, {:.0})", anchor, anchor.describe(), point.x, point.y);
        self.publish();
    }

    fn reload(&mut self) {
        self.config = self.source.load();
        self.pinned = None;
        info!("Config reloaded (applies to next run)");
        self.publish();
    }

    // IDLE -> ARMED, then everything that can fail before any input is simulated.
    fn arm(&mut self) -> Result<RunPlan, Error> {
        if !self.calibration.is_complete() {
            return Err(Error::CalibrationIncomplete { missing: self.calibration.missing() });
        }
        self.config.validate()?;

        let config = self.config;
        self.set_state(RunState::Armed);
        let grid = Grid::from_calibration(&self.calibration, config.rows, config.columns)?;
        let sequence = scan::plan(config.rows, config.columns, config.scan_order, &mut self.rng);
        let pinned = match config.jitter {
            JitterPolicy::PerClick => None,
            JitterPolicy::Pinned => Some(self.pinned_offsets(&grid)),
        };
        Ok(RunPlan { grid, config, sequence, pinned })
    }

    fn pinned_offsets(&mut self, grid: &Grid) -> Vec<JitterOffset> {
        if let Some((pinned_grid, offsets)) = &self.pinned {
            if pinned_grid == grid {
                return offsets.clone();
            }
        }
        let offsets: Vec<_> = (0..grid.cell_count()).map(|_| JitterOffset::random(&mut self.rng)).collect();
        self.pinned = Some((*grid, offsets.clone()));
        offsets
    }

    fn execute(&mut self, plan: RunPlan, events: &Receiver<Event>) -> RunOutcome {
        let start_delay = self.timing.start_delay();
        info!(
            "Starting in {:.1}s ... cell = {:.2}×{:.2}px | speed={} | order={}",
            start_delay.as_secs_f64(),
            plan.grid.col_step().length(),
            plan.grid.row_step().length(),
            plan.config.speed.code(),
            plan.config.scan_order.label(),
        );
        self.board.lock().cells = plan.sequence.len();
        if let Err(reason) = self.wait(events, start_delay) {
            return RunOutcome::Stopped { clicks: 0, reason };
        }

        let modifier = plan.config.modifier;
        let outcome = match self.input.key_down(modifier) {
            Ok(()) => {
                self.set_state(RunState::Running);
                self.scan(&plan, events)
            }
            Err(e) => input_outcome(0, e),
        };

        self.set_state(RunState::Stopping);
        if let Err(e) = self.input.key_up(modifier) {
            warn!("Failed to release {}: {e}", modifier.name());
        }
        outcome
    }

    fn scan(&mut self, plan: &RunPlan, events: &Receiver<Event>) -> RunOutcome {
        let speed = plan.config.speed;
        let mut clicks = 0;
        for (idx, &cell) in plan.sequence.iter().enumerate() {
            let offset = match &plan.pinned {
                Some(offsets) => offsets[(cell.row * plan.grid.columns() + cell.col) as usize],
                None => JitterOffset::random(&mut self.rng),
            };
            let (x, y) = plan.grid.jittered_center(cell, offset).to_pixel();

            let delay = self.timing.next_delay(speed);
            if let Err(reason) = self.wait(events, delay) {
                return RunOutcome::Stopped { clicks, reason };
            }
            let travel = self.timing.travel_time(speed);
            if let Err(e) = self.input.move_and_click(x, y, travel) {
                return input_outcome(clicks, e);
            }
            clicks += 1;
            self.board.lock().clicks = clicks;

            let last = idx + 1 == plan.sequence.len();
            if !last && scan::ends_unit(plan.config.scan_order, &plan.sequence, idx) {
                let rest = self.timing.unit_rest();
                if let Err(reason) = self.wait(events, rest) {
                    return RunOutcome::Stopped { clicks, reason };
                }
            }
        }
        RunOutcome::Completed { clicks }
    }

    /// Sleeps for `total` in slices, handling incoming events and the input
    /// fail-safe between slices. Errs with the reason the run must stop.
    fn wait(&mut self, events: &Receiver<Event>, total: Duration) -> Result<(), StopReason> {
        let deadline = Instant::now() + total;
        loop {
            while let Ok(event) = events.try_recv() {
                self.absorb(event)?;
            }
            if self.input.fail_safe_tripped() {
                return Err(StopReason::FailSafe);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            let slice = (deadline - now).min(WAIT_SLICE);
            match events.recv_timeout(slice) {
                Ok(event) => self.absorb(event)?,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => thread::sleep(slice),
            }
        }
    }

    // Events that arrive while a run is in progress. The run works on its
    // own snapshot, so captures and reloads only affect later runs.
    fn absorb(&mut self, event: Event) -> Result<(), StopReason> {
        match event {
            Event::Stop => return Err(StopReason::EmergencyStop),
            Event::Shutdown => {
                self.shutdown = true;
                return Err(StopReason::Shutdown);
            }
            Event::Start => warn!("Run already in progress"),
            Event::Capture(anchor, point) => self.capture(anchor, point),
            Event::Reload => self.reload(),
        }
        Ok(())
    }

    fn set_state(&mut self, state: RunState) {
        self.state = state;
        self.board.lock().state = state;
    }

    fn publish(&self) {
        let mut status = self.board.lock();
        status.state = self.state;
        status.calibration = self.calibration;
        status.config = self.config;
    }

    fn report(&self, outcome: &RunOutcome) {
        let message = match outcome {
            RunOutcome::Completed { clicks } => {
                info!("Done. Total clicks: {clicks}");
                format!("Done. Total clicks: {clicks}")
            }
            RunOutcome::Stopped { clicks, reason } => {
                warn!("Run stopped by {reason} after {clicks} clicks");
                format!("Stopped by {reason} after {clicks} clicks")
            }
            RunOutcome::Rejected(e) => {
                warn!("Start rejected: {e}");
                format!("Start rejected: {e}")
            }
            RunOutcome::Failed { clicks, error } => {
                warn!("Run aborted after {clicks} clicks: {error}");
                format!("Aborted after {clicks} clicks: {error}")
            }
        };
        self.board.lock().last_report = Some(message);
    }
}

fn input_outcome(clicks: usize, error: InputError) -> RunOutcome {
    match error {
        InputError::FailSafe => RunOutcome::Stopped { clicks, reason: StopReason::FailSafe },
        other => RunOutcome::Failed { clicks, error: other.into() },
    }
}
