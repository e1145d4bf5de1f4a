pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyCode, KeyModifiers, MouseButton, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use movelab::{
    conditions::generate_conditions,
    config::{Config, ConfigStore, FileConfigStore},
    experiment::ExperimentKind,
    results::SessionSummary,
    runtime::{ArmTimer, CrosstermEventSource, FixedTicker, InputEvent, Runner},
    session::{Phase, Session, TrialOutcome},
    TICK_RATE_MS,
};
use rand::Rng;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Position, Rect},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::{Duration, Instant},
};

/// terminal human-performance experiments with visualized regression results
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Runs reaction-time, fitts-law pointing and steering-law path experiments in the terminal, aggregates per-difficulty movement times and fits MT = a + b ID over the session."
)]
pub struct Cli {
    /// experiment to run
    #[clap(short = 'e', long, value_enum)]
    experiment: Option<ExperimentKind>,

    /// how many times each condition is repeated
    #[clap(short = 'r', long)]
    repetitions: Option<usize>,

    /// target distances (fitts) / path amplitudes (steering), px
    #[clap(short = 'd', long, value_delimiter = ',')]
    distances: Option<Vec<u32>>,

    /// target and tunnel widths, px
    #[clap(short = 'w', long, value_delimiter = ',')]
    widths: Option<Vec<u32>>,

    /// minimum arming delay for the reaction test, seconds
    #[clap(long)]
    min_delay: Option<u64>,

    /// maximum arming delay for the reaction test, seconds
    #[clap(long)]
    max_delay: Option<u64>,
}

/// Effective settings for this run: CLI flags over persisted config.
#[derive(Debug, Clone)]
pub struct Settings {
    pub experiment: ExperimentKind,
    pub repetitions: usize,
    pub distances: Vec<u32>,
    pub widths: Vec<u32>,
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,
}

impl Settings {
    fn merge(cli: &Cli, config: Config) -> Self {
        let experiment = cli.experiment.unwrap_or_else(|| {
            ExperimentKind::from_str(&config.experiment, true).unwrap_or(ExperimentKind::Fitts)
        });
        let min_delay_secs = cli.min_delay.unwrap_or(config.min_delay_secs);
        let max_delay_secs = cli
            .max_delay
            .unwrap_or(config.max_delay_secs)
            .max(min_delay_secs);

        Self {
            experiment,
            repetitions: cli.repetitions.unwrap_or(config.repetitions),
            distances: cli.distances.clone().unwrap_or(config.distances),
            widths: cli.widths.clone().unwrap_or(config.widths),
            min_delay_secs,
            max_delay_secs,
        }
    }
}

impl From<&Settings> for Config {
    fn from(settings: &Settings) -> Self {
        Self {
            experiment: settings.experiment.to_string(),
            repetitions: settings.repetitions,
            distances: settings.distances.clone(),
            widths: settings.widths.clone(),
            min_delay_secs: settings.min_delay_secs,
            max_delay_secs: settings.max_delay_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Running,
    Results,
}

#[derive(Debug)]
pub struct App {
    pub settings: Settings,
    pub session: Session,
    pub arm_timer: ArmTimer,
    pub state: AppState,
    pub summary: Option<SessionSummary>,
    pub feedback: Option<String>,
    pub last_reaction_ms: Option<f64>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let mut rng = rand::thread_rng();
        let factor_sets = settings
            .experiment
            .factor_sets(&settings.distances, &settings.widths);
        let conditions = generate_conditions(&factor_sets, settings.repetitions, &mut rng);

        let mut app = Self {
            session: Session::new(settings.experiment, conditions),
            settings,
            arm_timer: ArmTimer::default(),
            state: AppState::Running,
            summary: None,
            feedback: None,
            last_reaction_ms: None,
        };
        app.arm_if_needed(Instant::now());
        app
    }

    /// New randomized queue with the same settings; drops the old session
    /// state and cancels any pending arm deadline.
    pub fn reset(&mut self) {
        *self = App::new(self.settings.clone());
    }

    fn arm_if_needed(&mut self, now: Instant) {
        if self.settings.experiment == ExperimentKind::Reaction
            && self.session.phase() == Phase::Idle
        {
            let mut rng = rand::thread_rng();
            let delay = rng.gen_range(self.settings.min_delay_secs..=self.settings.max_delay_secs);
            self.arm_timer.schedule(now + Duration::from_secs(delay));
        }
    }

    fn finish(&mut self) {
        self.arm_timer.cancel();
        match SessionSummary::from_session(&self.session) {
            Ok(summary) => {
                let _ = summary.save_log();
                self.summary = Some(summary);
            }
            Err(err) => self.feedback = Some(err.to_string()),
        }
        self.state = AppState::Results;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let settings = Settings::merge(&cli, store.load());
    let _ = store.save(&Config::from(&settings));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(settings);
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| draw(app, f))?;

        match runner.step() {
            InputEvent::Tick => {
                let now = Instant::now();
                if app.arm_timer.fire_if_due(now) {
                    app.session.trial_start(now);
                    app.feedback = None;
                }
            }
            InputEvent::Resize => {}
            InputEvent::Mouse(mouse) => {
                let size = terminal.size()?;
                handle_mouse(app, mouse, Rect::new(0, 0, size.width, size.height));
            }
            InputEvent::Key(key) => match key.code {
                KeyCode::Esc => break,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                KeyCode::Char('r') if app.state == AppState::Results => app.reset(),
                _ => {}
            },
        }

        if app.state == AppState::Running && app.session.is_complete() {
            app.finish();
        }
    }

    Ok(())
}

fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn current_levels(session: &Session) -> Option<(u32, u32)> {
    let condition = session.current_condition()?;
    Some((condition.level(0)?, condition.level(1)?))
}

fn handle_mouse(app: &mut App, mouse: MouseEvent, area: Rect) {
    if app.state != AppState::Running {
        return;
    }
    let now = Instant::now();

    match app.settings.experiment {
        ExperimentKind::Reaction => {
            if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
                return;
            }
            match app.session.phase() {
                Phase::Running => match app.session.trial_end(now) {
                    TrialOutcome::Recorded { elapsed_ms } => {
                        app.last_reaction_ms = Some(elapsed_ms);
                        app.arm_if_needed(now);
                    }
                    TrialOutcome::Finished { elapsed_ms } => {
                        app.last_reaction_ms = Some(elapsed_ms);
                    }
                    TrialOutcome::Ignored => {}
                },
                Phase::Idle => {
                    // clicked before the signal; re-arm with a fresh delay
                    app.feedback = Some(String::from("too soon"));
                    app.arm_timer.cancel();
                    app.arm_if_needed(now);
                }
                _ => {}
            }
        }
        ExperimentKind::Fitts => {
            if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
                return;
            }
            let Some((distance, width)) = current_levels(&app.session) else {
                return;
            };
            let (start, target) = ui::fitts_layout(distance, width, area);
            let position = Position::new(mouse.column, mouse.row);
            if start.contains(position) {
                app.session.trial_start(now);
            } else if target.contains(position) {
                let _ = app.session.trial_end(now);
            }
        }
        ExperimentKind::Steering => {
            if !matches!(mouse.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
                return;
            }
            let Some((amplitude, width)) = current_levels(&app.session) else {
                return;
            };
            let layout = ui::steering_layout(amplitude, width, area);
            let region = ui::steering_region_at(mouse.column, mouse.row, &layout);
            let _ = app.session.region_enter(region, now);
        }
    }
}
