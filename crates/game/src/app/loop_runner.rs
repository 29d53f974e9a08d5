use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use super::bootstrap::AppWiring;
use super::campaign::{Session, StepOutcome};
use super::collaborators::TracingCanvas;
use super::metrics::MetricsAccumulator;
use super::AppError;

#[derive(Debug, Clone)]
pub(crate) struct LoopConfig {
    pub(crate) target_tps: u32,
    pub(crate) max_frame_delta: Duration,
    pub(crate) max_ticks_per_frame: u32,
    pub(crate) metrics_log_interval: Duration,
    /// Headless runs stop here even if the campaign is unfinished.
    pub(crate) max_ticks: Option<u64>,
    /// Pace ticks against the wall clock instead of running flat out.
    pub(crate) realtime: bool,
    pub(crate) seed: u64,
}

impl LoopConfig {
    fn metrics_interval(&self) -> Duration {
        if self.metrics_log_interval.is_zero() {
            Self::default().metrics_log_interval
        } else {
            self.metrics_log_interval
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 50,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_ticks: Some(15_000),
            realtime: false,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunEnd {
    CampaignComplete,
    TickLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RunSummary {
    pub(crate) end: RunEnd,
    pub(crate) ticks: u64,
    pub(crate) levels_completed: usize,
    pub(crate) restarts: u32,
    pub(crate) overall_loot: u32,
    pub(crate) pockets_picked: u32,
    pub(crate) kills: usize,
    pub(crate) deaths: u32,
    pub(crate) times_spotted: u32,
    pub(crate) events_fired: u32,
    pub(crate) frames_drawn: u64,
    pub(crate) sprites_drawn: u64,
    pub(crate) dropped_backlog_ms: u64,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match run_campaign(app) {
        Ok(summary) => {
            info!(
                end = ?summary.end,
                ticks = summary.ticks,
                levels_completed = summary.levels_completed,
                restarts = summary.restarts,
                overall_loot = summary.overall_loot,
                pockets_picked = summary.pockets_picked,
                kills = summary.kills,
                deaths = summary.deaths,
                times_spotted = summary.times_spotted,
                events_fired = summary.events_fired,
                frames_drawn = summary.frames_drawn,
                sprites_drawn = summary.sprites_drawn,
                dropped_backlog_ms = summary.dropped_backlog_ms,
                "run_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "run_failed");
            ExitCode::FAILURE
        }
    }
}

pub(crate) fn run_campaign(app: AppWiring) -> Result<RunSummary, AppError> {
    let AppWiring {
        loop_config: config,
        sim_config,
        campaign,
        script,
    } = app;
    let mut session = Session::start(sim_config, config.seed, campaign)?;

    let mut pacer = TickPacer::new(&config, Instant::now());
    info!(
        target_tps = config.target_tps.max(1),
        max_frame_delta_ms = pacer.max_frame_delta.as_millis() as u64,
        max_ticks_per_frame = pacer.max_ticks_per_frame,
        max_ticks = ?config.max_ticks,
        realtime = config.realtime,
        seed = config.seed,
        scripted_ticks = ?script.last_tick(),
        "loop_config"
    );

    let mut canvas = TracingCanvas::default();
    let mut metrics = MetricsAccumulator::new(config.metrics_interval(), Instant::now());
    let mut ticks = 0u64;

    let end = 'frames: loop {
        for _ in 0..pacer.ticks_for_frame(Instant::now()) {
            if config.max_ticks.is_some_and(|limit| ticks >= limit) {
                break 'frames RunEnd::TickLimit;
            }
            let input = script.snapshot_for_tick(ticks);
            let outcome = session.step(pacer.dt_seconds(), &input)?;
            ticks += 1;
            metrics.record_tick(session.world().entity_count());
            match outcome {
                StepOutcome::Continue => {}
                StepOutcome::LevelAdvanced => {
                    info!(tick = ticks, level = session.current_level(), "level_advanced");
                    pacer.resync(Instant::now());
                    break;
                }
                StepOutcome::LevelRestarted => {
                    info!(tick = ticks, restarts = session.restarts(), "level_restarted");
                    pacer.resync(Instant::now());
                    break;
                }
                StepOutcome::CampaignComplete => break 'frames RunEnd::CampaignComplete,
            }
        }

        canvas.begin_frame();
        session.draw(&mut canvas);

        if let Some(snapshot) = metrics.maybe_snapshot(Instant::now()) {
            let score = session.scoreboard();
            info!(
                tps = snapshot.tps,
                mean_entities = snapshot.mean_entities,
                peak_entities = snapshot.peak_entities,
                tick = ticks,
                health = score.health_fraction,
                daggers = score.daggers,
                loot = score.loot,
                looting = ?score.looting_fraction,
                won_level = score.won_level,
                "loop_metrics"
            );
        }

        let idle = pacer.idle_time();
        if idle > Duration::ZERO {
            thread::sleep(idle);
        }
    };

    Ok(RunSummary {
        end,
        ticks,
        levels_completed: session.current_level(),
        restarts: session.restarts(),
        overall_loot: session.scoreboard().overall_loot,
        pockets_picked: session.scoreboard().pockets_picked,
        kills: session.scoreboard().killed_names.len(),
        deaths: session.scoreboard().deaths,
        times_spotted: session.events().fired("player_spotted"),
        events_fired: session.events().total_fired(),
        frames_drawn: canvas.frames,
        sprites_drawn: canvas.sprites,
        dropped_backlog_ms: pacer.dropped.as_millis() as u64,
    })
}

/// Decides how many fixed ticks each frame runs. Headless runs always take the frame cap;
/// realtime runs bank wall-clock time and drop whatever backlog the cap cannot absorb.
#[derive(Debug)]
struct TickPacer {
    realtime: bool,
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    last_frame: Instant,
    backlog: Duration,
    dropped: Duration,
}

impl TickPacer {
    fn new(config: &LoopConfig, now: Instant) -> Self {
        let max_frame_delta = if config.max_frame_delta.is_zero() {
            LoopConfig::default().max_frame_delta
        } else {
            config.max_frame_delta
        };
        Self {
            realtime: config.realtime,
            fixed_dt: Duration::from_secs_f64(1.0 / f64::from(config.target_tps.max(1))),
            max_frame_delta,
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            last_frame: now,
            backlog: Duration::ZERO,
            dropped: Duration::ZERO,
        }
    }

    fn dt_seconds(&self) -> f32 {
        self.fixed_dt.as_secs_f32()
    }

    fn ticks_for_frame(&mut self, now: Instant) -> u32 {
        if !self.realtime {
            return self.max_ticks_per_frame;
        }
        let elapsed = now
            .saturating_duration_since(self.last_frame)
            .min(self.max_frame_delta);
        self.last_frame = now;
        self.backlog = self.backlog.saturating_add(elapsed);

        let due = u32::try_from(self.backlog.as_nanos() / self.fixed_dt.as_nanos())
            .unwrap_or(u32::MAX);
        let ticks = due.min(self.max_ticks_per_frame);
        self.backlog = self.backlog.saturating_sub(self.fixed_dt * ticks);
        if ticks < due {
            warn!(
                dropped_backlog_ms = self.backlog.as_millis() as u64,
                max_ticks_per_frame = self.max_ticks_per_frame,
                "tick_backlog_dropped"
            );
            self.dropped = self.dropped.saturating_add(self.backlog);
            self.backlog = Duration::ZERO;
        }
        ticks
    }

    /// Forgets the time spent loading a level so the new one does not start with a burst.
    fn resync(&mut self, now: Instant) {
        self.last_frame = now;
        self.backlog = Duration::ZERO;
    }

    fn idle_time(&self) -> Duration {
        if self.realtime {
            self.fixed_dt.saturating_sub(self.backlog)
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use stealth_engine::SimConfig;

    use super::super::campaign::Campaign;
    use super::super::script::InputScript;
    use super::*;

    fn realtime(max_ticks_per_frame: u32) -> LoopConfig {
        LoopConfig {
            realtime: true,
            max_ticks_per_frame,
            ..LoopConfig::default()
        }
    }

    #[test]
    fn headless_frames_run_the_full_cap() {
        let mut pacer = TickPacer::new(&LoopConfig::default(), Instant::now());
        assert_eq!(pacer.ticks_for_frame(Instant::now()), 5);
        assert_eq!(pacer.idle_time(), Duration::ZERO);
        assert!((pacer.dt_seconds() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn realtime_frames_bank_the_remainder() {
        let start = Instant::now();
        let mut pacer = TickPacer::new(&realtime(5), start);
        assert_eq!(pacer.ticks_for_frame(start + Duration::from_millis(50)), 2);
        assert_eq!(pacer.idle_time(), Duration::from_millis(10));
        assert_eq!(pacer.ticks_for_frame(start + Duration::from_millis(60)), 1);
        assert_eq!(pacer.dropped, Duration::ZERO);
    }

    #[test]
    fn backlog_beyond_the_cap_is_dropped() {
        let start = Instant::now();
        let mut pacer = TickPacer::new(&realtime(3), start);
        assert_eq!(pacer.ticks_for_frame(start + Duration::from_millis(130)), 3);
        assert_eq!(pacer.dropped, Duration::from_millis(70));
        assert_eq!(pacer.idle_time(), Duration::from_millis(20));
    }

    #[test]
    fn stalled_frames_are_clamped_before_banking() {
        let start = Instant::now();
        let mut pacer = TickPacer::new(&realtime(20), start);
        // 600 ms clamps to the 250 ms frame limit: twelve ticks and 10 ms left over.
        assert_eq!(pacer.ticks_for_frame(start + Duration::from_millis(600)), 12);
        assert_eq!(pacer.idle_time(), Duration::from_millis(10));
    }

    #[test]
    fn resync_discards_level_loading_time() {
        let start = Instant::now();
        let mut pacer = TickPacer::new(&realtime(5), start);
        let loaded = start + Duration::from_secs(2);
        pacer.resync(loaded);
        assert_eq!(pacer.ticks_for_frame(loaded + Duration::from_millis(20)), 1);
        assert_eq!(pacer.dropped, Duration::ZERO);
    }

    #[test]
    fn zero_durations_fall_back_to_defaults() {
        let config = LoopConfig {
            max_frame_delta: Duration::ZERO,
            metrics_log_interval: Duration::ZERO,
            target_tps: 0,
            ..realtime(5)
        };
        let pacer = TickPacer::new(&config, Instant::now());
        assert_eq!(pacer.max_frame_delta, Duration::from_millis(250));
        assert_eq!(pacer.fixed_dt, Duration::from_secs(1));
        assert_eq!(config.metrics_interval(), Duration::from_secs(1));
    }

    fn wiring(level: &str, script: &str, max_ticks: Option<u64>) -> (tempfile::TempDir, AppWiring) {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("1.txt"), level).expect("write level");
        let campaign = Campaign::discover(dir.path()).expect("campaign");
        let wiring = AppWiring {
            loop_config: LoopConfig {
                max_ticks,
                ..LoopConfig::default()
            },
            sim_config: SimConfig::default(),
            campaign,
            script: InputScript::parse(script).expect("script"),
        };
        (dir, wiring)
    }

    #[test]
    fn scripted_looting_completes_the_campaign() {
        // At 50 tps the 2 s loot needs 101 ticks of holding loot.
        let (_dir, app) = wiring(
            "player 340 240\nhouse 300 300 2\n",
            r#"[{ "from_tick": 0, "to_tick": 200, "actions": ["loot"] }]"#,
            None,
        );
        let summary = run_campaign(app).expect("run");
        assert_eq!(summary.end, RunEnd::CampaignComplete);
        assert_eq!(summary.levels_completed, 1);
        assert!(summary.overall_loot >= 90 && summary.overall_loot <= 110);
        assert!(summary.ticks > 100 && summary.ticks < 110);
        assert!(summary.frames_drawn > 0);
        assert!(summary.sprites_drawn >= summary.frames_drawn);
    }

    #[test]
    fn idle_runs_stop_at_the_tick_limit() {
        let (_dir, app) = wiring("player 340 240\nhouse 300 300 2\n", "[]", Some(42));
        let summary = run_campaign(app).expect("run");
        assert_eq!(summary.end, RunEnd::TickLimit);
        assert_eq!(summary.ticks, 42);
        assert_eq!(summary.levels_completed, 0);
    }
}
