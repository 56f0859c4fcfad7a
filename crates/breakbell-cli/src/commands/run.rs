//! Foreground host: drives the engine from a tokio interval and takes
//! commands on stdin.
//!
//! stdout carries one JSON event per line. Without a notification surface
//! alerts ring the terminal bell on stderr instead. The config file is
//! watched, so `breakbell reminder ...` and `breakbell config set` take
//! effect while the host runs.

use breakbell_core::calendar::{CalendarGate, HolidayCache};
use breakbell_core::error::Result;
use breakbell_core::{Config, EngineSetup, Event, ReminderEngine};
use chrono::Local;
use clap::Args;
use std::io::Write;
use std::time::{Duration, SystemTime};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use super::{CmdResult, ConfigStore};

#[derive(Args)]
pub struct RunArgs {
    /// No notification surface is attached; ring the terminal bell
    #[arg(long)]
    no_surface: bool,
    /// Exit after this many seconds
    #[arg(long)]
    exit_after: Option<u64>,
}

/// A line typed on stdin.
#[derive(Debug, PartialEq)]
enum HostCommand {
    /// The surface acknowledged an alert.
    Dismiss(String),
    Start,
    Pause,
    Resume,
    Toggle,
    Reset,
    /// The host woke from sleep.
    Wake,
    /// Re-read the config file now.
    Reload,
    Status,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<HostCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let cmd = match verb {
        "dismiss" => match words.next() {
            Some(id) => HostCommand::Dismiss(id.to_string()),
            None => return Err("dismiss needs an id".into()),
        },
        "start" => HostCommand::Start,
        "pause" => HostCommand::Pause,
        "resume" => HostCommand::Resume,
        "toggle" => HostCommand::Toggle,
        "reset" => HostCommand::Reset,
        "wake" => HostCommand::Wake,
        "reload" => HostCommand::Reload,
        "status" => HostCommand::Status,
        "quit" | "exit" => HostCommand::Quit,
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(Some(cmd))
}

fn emit(events: &[Event]) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    for event in events {
        if let Event::Chime { .. } = event {
            let mut err = std::io::stderr().lock();
            err.write_all(b"\x07")?;
            err.flush()?;
        }
        serde_json::to_writer(&mut out, event)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

/// The host's copy of the settings store.
///
/// Edits made by other `breakbell` invocations while the host runs are
/// picked up at the next tick boundary and merged into the engine before
/// anything is written back.
struct Settings<'a> {
    store: &'a ConfigStore,
    config: Config,
    stamp: Option<SystemTime>,
    no_surface: bool,
}

impl<'a> Settings<'a> {
    fn load(store: &'a ConfigStore, no_surface: bool) -> Result<Self> {
        let config = store.load()?;
        Ok(Self {
            store,
            config,
            stamp: store.modified(),
            no_surface,
        })
    }

    /// `--no-surface` holds for this session only and is never saved.
    fn engine_setup(&self) -> EngineSetup {
        let mut setup = self.config.engine_setup();
        if self.no_surface {
            setup.external_surface = false;
        }
        setup
    }

    fn changed_on_disk(&self) -> bool {
        self.store.modified() != self.stamp
    }

    /// Re-read the store and route it through the engine. A file that
    /// fails to load or validate leaves the engine as it was.
    fn reload(&mut self, engine: &mut ReminderEngine, holidays: &HolidayCache) -> Vec<Event> {
        self.stamp = self.store.modified();
        let fresh = match self.store.load() {
            Ok(config) => config,
            Err(e) => {
                warn!("settings not reloaded: {e}");
                return Vec::new();
            }
        };
        let previous = std::mem::replace(&mut self.config, fresh);
        let outcome = match engine.apply_setup(self.engine_setup(), Local::now()) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("settings rejected, keeping the previous ones: {e}");
                self.config = previous;
                return Vec::new();
            }
        };
        holidays.set_source(self.config.holiday_source());
        info!(reminders = engine.reminders().len(), "settings reloaded");
        if outcome.definitions_changed {
            self.persist(engine);
        }
        outcome.events
    }

    fn persist(&mut self, engine: &ReminderEngine) {
        self.config.reminders = engine.reminders().to_vec();
        if let Err(e) = self.store.save(&self.config) {
            warn!("failed to save reminders: {e}");
        }
        self.stamp = self.store.modified();
    }
}

pub fn run(args: RunArgs, store: &ConfigStore) -> CmdResult {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(serve(args, store))
}

async fn serve(args: RunArgs, store: &ConfigStore) -> CmdResult {
    let mut settings = Settings::load(store, args.no_surface)?;

    let holidays = HolidayCache::global();
    holidays.set_source(settings.config.holiday_source());
    let mut engine = ReminderEngine::new(
        settings.engine_setup(),
        CalendarGate::new(holidays.clone()),
        Local::now(),
    );

    let poll = Duration::from_millis(settings.config.engine.poll_interval_ms.max(10));
    let mut ticker = tokio::time::interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let deadline = args.exit_after.map(|s| Instant::now() + Duration::from_secs(s));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    info!(poll_ms = poll.as_millis() as u64, "breakbell running");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if settings.changed_on_disk() {
                    let events = settings.reload(&mut engine, holidays);
                    emit(&events)?;
                }
                let outcome = engine.tick();
                emit(&outcome.events)?;
                if outcome.definitions_changed {
                    settings.persist(&engine);
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };
                let cmd = match parse_command(&line) {
                    Ok(Some(cmd)) => cmd,
                    Ok(None) => continue,
                    Err(msg) => {
                        warn!("{msg}");
                        continue;
                    }
                };
                let now = Local::now();
                let events: Vec<Event> = match cmd {
                    HostCommand::Dismiss(id) => {
                        let outcome = engine.dismiss(&id, true, now);
                        if outcome.definitions_changed {
                            settings.persist(&engine);
                        }
                        outcome.events
                    }
                    HostCommand::Start => engine.start(now).into_iter().collect(),
                    HostCommand::Pause => engine.pause(now).into_iter().collect(),
                    HostCommand::Resume => engine.resume(now).into_iter().collect(),
                    HostCommand::Toggle => engine.toggle(now).into_iter().collect(),
                    HostCommand::Reset => engine.reset(now).into_iter().collect(),
                    HostCommand::Wake => {
                        engine.on_system_resume(now);
                        Vec::new()
                    }
                    HostCommand::Reload => settings.reload(&mut engine, holidays),
                    HostCommand::Status => {
                        println!("{}", serde_json::to_string(&engine.status())?);
                        Vec::new()
                    }
                    HostCommand::Quit => break,
                };
                emit(&events)?;
            }
        }
    }

    if settings.changed_on_disk() {
        let events = settings.reload(&mut engine, holidays);
        emit(&events)?;
    }
    settings.persist(&engine);
    info!("breakbell stopped");
    Ok(())
}
