use std::fs;
use std::path::{Path, PathBuf};

use stealth_engine::SimConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::campaign::Campaign;
use super::loop_runner::LoopConfig;
use super::script::InputScript;
use super::AppError;

pub(crate) struct AppWiring {
    pub(crate) loop_config: LoopConfig,
    pub(crate) sim_config: SimConfig,
    pub(crate) campaign: Campaign,
    pub(crate) script: InputScript,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CliArgs {
    pub(crate) levels: PathBuf,
    pub(crate) script: Option<PathBuf>,
    pub(crate) config: Option<PathBuf>,
    pub(crate) seed: Option<u64>,
    pub(crate) max_ticks: Option<u64>,
    pub(crate) realtime: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    Run(CliArgs),
    Help,
}

pub(crate) fn build_app(args: CliArgs) -> Result<AppWiring, AppError> {
    info!("=== Stealth Game Startup ===");

    let sim_config = match &args.config {
        Some(path) => load_sim_config(path)?,
        None => SimConfig::default(),
    };
    sim_config.validate()?;

    let script = match &args.script {
        Some(path) => InputScript::load(path)?,
        None => InputScript::default(),
    };
    let campaign = Campaign::discover(&args.levels)?;
    info!(
        levels = ?campaign.level_names(),
        scripted = !script.is_empty(),
        "campaign_ready"
    );

    let defaults = LoopConfig::default();
    let loop_config = LoopConfig {
        max_ticks: args.max_ticks.or(defaults.max_ticks),
        realtime: args.realtime,
        seed: args.seed.unwrap_or(defaults.seed),
        ..defaults
    };

    Ok(AppWiring {
        loop_config,
        sim_config,
        campaign,
        script,
    })
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Partial JSON overrides on top of the defaults.
pub(crate) fn load_sim_config(path: &Path) -> Result<SimConfig, AppError> {
    let text = fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut deserializer = serde_json::Deserializer::from_str(&text);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|err| AppError::ConfigFormat {
        path: path.to_path_buf(),
        field: err.path().to_string(),
        source: err.into_inner(),
    })
}

pub(crate) fn parse_args(args: &[String]) -> Result<CliCommand, String> {
    let mut levels = None;
    let mut script = None;
    let mut config = None;
    let mut seed = None;
    let mut max_ticks = None;
    let mut realtime = false;

    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "--script" => {
                script = Some(PathBuf::from(flag_value(args, index, "--script")?));
                index += 2;
            }
            "--config" => {
                config = Some(PathBuf::from(flag_value(args, index, "--config")?));
                index += 2;
            }
            "--seed" => {
                let value = flag_value(args, index, "--seed")?;
                seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("invalid --seed value '{value}' (expected u64)"))?,
                );
                index += 2;
            }
            "--max-ticks" => {
                let value = flag_value(args, index, "--max-ticks")?;
                max_ticks = Some(value.parse::<u64>().map_err(|_| {
                    format!("invalid --max-ticks value '{value}' (expected u64)")
                })?);
                index += 2;
            }
            "--realtime" => {
                realtime = true;
                index += 1;
            }
            other if other.starts_with("--") => return Err(format!("unknown option '{other}'")),
            other => {
                if levels.is_some() {
                    return Err(format!("unexpected argument '{other}'"));
                }
                levels = Some(PathBuf::from(other));
                index += 1;
            }
        }
    }

    let levels = levels.ok_or_else(|| "missing level file or directory".to_string())?;
    Ok(CliCommand::Run(CliArgs {
        levels,
        script,
        config,
        seed,
        max_ticks,
        realtime,
    }))
}

fn flag_value<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str, String> {
    args.get(index + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for {flag}"))
}

pub(crate) fn usage_text() -> String {
    [
        "usage: stealth_game <level-or-dir> [options]",
        "",
        "options:",
        "  --script PATH     JSON input script to replay",
        "  --config PATH     JSON tuning overrides",
        "  --seed N          random seed (default 0)",
        "  --max-ticks N     stop after N ticks (default 15000)",
        "  --realtime        pace ticks against the wall clock",
        "",
        "RUST_LOG controls log verbosity (default info).",
    ]
    .join("\n")
}
