//! Periodic tick driver with pause / resume / stop control.
//!
//! The simulation lives behind a mutex shared with a tokio task that wakes
//! on a fixed interval and runs each tick on the blocking pool. The host
//! observes progress through a broadcast channel of [`HostEvent`]s.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};
use std::time::Duration;

use anyhow::{bail, Result};
use serde::Serialize;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::{
    census::Census,
    config::SimulationConfig,
    engine::{Engine, EngineBuilder, EngineSettings, TickOutcome, TickReport},
    world::{WorldMap, WorldSnapshot},
};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    Stopped,
    Extinction,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    Tick(TickReport),
    Closed { reason: CloseReason },
}

struct Simulation {
    engine: Engine,
    map: WorldMap,
}

impl Simulation {
    fn standard(config: &SimulationConfig, map: WorldMap) -> Self {
        Self {
            engine: EngineBuilder::standard(EngineSettings::from_config(config)).build(),
            map,
        }
    }
}

struct Shared {
    sim: Mutex<Simulation>,
    paused: AtomicBool,
    extinct: AtomicBool,
    closed: AtomicBool,
    events: broadcast::Sender<HostEvent>,
}

impl Shared {
    // a panicking tick poisons the lock; the registry is still usable
    fn lock(&self) -> MutexGuard<'_, Simulation> {
        self.sim.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn tick(&self) -> Result<TickOutcome> {
        let mut guard = self.lock();
        let Simulation { engine, map } = &mut *guard;
        engine.tick(map)
    }

    fn notify(&self, event: HostEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    /// At most one close notification per run
    fn close(&self, reason: CloseReason) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.notify(HostEvent::Closed { reason });
        }
    }
}

struct Driver {
    handle: JoinHandle<()>,
    stop_tx: watch::Sender<bool>,
}

pub struct Scheduler {
    shared: Arc<Shared>,
    driver: Option<Driver>,
    config: SimulationConfig,
    launches: u64,
}

impl Scheduler {
    pub fn new(config: &SimulationConfig, map: WorldMap) -> Self {
        let engine = EngineBuilder::standard(EngineSettings::from_config(config)).build();
        Self::with_engine(config, engine, map)
    }

    /// Drive a custom-built engine. `reset` goes back to the standard
    /// system set.
    pub fn with_engine(config: &SimulationConfig, engine: Engine, map: WorldMap) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                sim: Mutex::new(Simulation { engine, map }),
                paused: AtomicBool::new(false),
                extinct: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                events,
            }),
            driver: None,
            config: config.clone(),
            launches: 0,
        }
    }

    /// Bootstrap a fresh world from `config` and wrap it
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        let map = config.build_world()?;
        Ok(Self::new(config, map))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.shared.events.subscribe()
    }

    fn driver_active(&self) -> bool {
        self.driver
            .as_ref()
            .is_some_and(|driver| !driver.handle.is_finished())
    }

    pub fn state(&self) -> SchedulerState {
        if !self.driver_active() {
            SchedulerState::Idle
        } else if self.shared.paused.load(Ordering::SeqCst) {
            SchedulerState::Paused
        } else {
            SchedulerState::Running
        }
    }

    /// Begin ticking. Resumes when paused; a no-op while running or after
    /// the run has ended in extinction. Must be called inside a tokio
    /// runtime.
    pub fn start(&mut self) -> SchedulerState {
        if self.shared.extinct.load(Ordering::SeqCst) {
            warn!("start ignored: the run ended in extinction, reset first");
            return self.state();
        }
        match self.state() {
            SchedulerState::Running => {}
            SchedulerState::Paused => self.resume(),
            SchedulerState::Idle => self.launch(),
        }
        self.state()
    }

    fn launch(&mut self) {
        self.shared.paused.store(false, Ordering::SeqCst);
        self.shared.closed.store(false, Ordering::SeqCst);
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(drive(
            Arc::clone(&self.shared),
            self.config.tick_interval(),
            stop_rx,
        ));
        self.driver = Some(Driver { handle, stop_tx });
        self.launches += 1;
        info!(launches = self.launches, interval_ms = self.config.tick_interval_ms, "scheduler started");
    }

    pub fn pause(&self) {
        if self.state() == SchedulerState::Running {
            self.shared.paused.store(true, Ordering::SeqCst);
            info!("scheduler paused");
        }
    }

    pub fn resume(&self) {
        if self.state() == SchedulerState::Paused {
            self.shared.paused.store(false, Ordering::SeqCst);
            info!("scheduler resumed");
        }
    }

    /// Cancel the driver and tell the host to close. Waits for an in-flight
    /// tick up to the configured shutdown timeout, then aborts.
    pub async fn stop(&mut self) {
        self.shared.paused.store(true, Ordering::SeqCst);
        if let Some(Driver { mut handle, stop_tx }) = self.driver.take() {
            let _ = stop_tx.send(true);
            match time::timeout(self.config.shutdown_timeout(), &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!("scheduler task failed: {err}"),
                Err(_) => {
                    warn!(
                        timeout_ms = self.config.shutdown_timeout_ms,
                        "tick did not finish in time, aborting driver"
                    );
                    handle.abort();
                }
            }
        }
        self.shared.paused.store(false, Ordering::SeqCst);

        // a no-op when extinction already closed the run
        self.shared.close(CloseReason::Stopped);
        info!("scheduler stopped");
    }

    /// Install a freshly bootstrapped registry and restart the move
    /// counter. Only allowed while idle.
    pub fn reset(&mut self, map: WorldMap) -> Result<()> {
        if self.driver_active() {
            bail!("cannot reset while the scheduler is {:?}", self.state());
        }
        self.driver = None;
        *self.shared.lock() = Simulation::standard(&self.config, map);
        self.shared.extinct.store(false, Ordering::SeqCst);
        self.shared.closed.store(false, Ordering::SeqCst);
        self.shared.paused.store(false, Ordering::SeqCst);
        info!("simulation reset");
        Ok(())
    }

    pub fn census(&self) -> Census {
        self.shared.lock().map.census()
    }

    pub fn move_counter(&self) -> u64 {
        self.shared.lock().engine.move_counter()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        self.shared.lock().map.snapshot()
    }

    /// How many driver tasks have been created so far
    pub fn launch_count(&self) -> u64 {
        self.launches
    }
}

async fn drive(shared: Arc<Shared>, interval: Duration, mut stop_rx: watch::Receiver<bool>) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately; the first move waits one interval
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    debug!("driver received stop");
                    return;
                }
            }
            _ = ticker.tick() => {
                if shared.paused.load(Ordering::SeqCst) {
                    continue;
                }
                let sim = Arc::clone(&shared);
                match tokio::task::spawn_blocking(move || sim.tick()).await {
                    Ok(Ok(TickOutcome::Advanced(report))) => {
                        debug!(move_counter = report.move_counter, "tick delivered");
                        shared.notify(HostEvent::Tick(report));
                    }
                    Ok(Ok(TickOutcome::Extinct(census))) => {
                        info!(?census, "extinction, closing run");
                        shared.extinct.store(true, Ordering::SeqCst);
                        shared.close(CloseReason::Extinction);
                        return;
                    }
                    Ok(Err(err)) => error!("tick abandoned: {err:#}"),
                    Err(err) => error!("tick panicked: {err}"),
                }
            }
        }
    }
}
