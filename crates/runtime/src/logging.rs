use core_sim::SimulationKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLogEventKind {
    CacheHit,
    CacheMiss,
    ResultStored,
    PrefillStarted { total: usize },
    PrefillProgress { completed: usize, total: usize },
    PrefillCompleted { total: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunLogEvent {
    pub tick: u64,
    pub kind: RunLogEventKind,
    pub key: Option<SimulationKey>,
    pub compute_latency_micros: Option<u64>,
}

impl RunLogEvent {
    pub fn new(tick: u64, kind: RunLogEventKind, key: Option<SimulationKey>) -> Self {
        Self {
            tick,
            kind,
            key,
            compute_latency_micros: None,
        }
    }

    pub fn with_latency(mut self, micros: u64) -> Self {
        self.compute_latency_micros = Some(micros);
        self
    }
}

pub trait RunLogWriter {
    fn write(&mut self, event: RunLogEvent);
}

impl<W: RunLogWriter + ?Sized> RunLogWriter for &mut W {
    fn write(&mut self, event: RunLogEvent) {
        (**self).write(event);
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRunLogWriter {
    events: Vec<RunLogEvent>,
}

impl InMemoryRunLogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RunLogEvent] {
        &self.events
    }

    pub fn kinds(&self) -> Vec<RunLogEventKind> {
        self.events.iter().map(|event| event.kind).collect()
    }
}

impl RunLogWriter for InMemoryRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        self.events.push(event);
    }
}

/// Forwards events to `tracing`: lookups at debug, prefill progress at info.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRunLogWriter;

impl RunLogWriter for TracingRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        let key = event.key;
        match event.kind {
            RunLogEventKind::CacheHit => {
                tracing::debug!(tick = event.tick, key = ?key, "cache hit");
            }
            RunLogEventKind::CacheMiss => {
                tracing::debug!(tick = event.tick, key = ?key, "cache miss, simulating");
            }
            RunLogEventKind::ResultStored => {
                tracing::debug!(
                    tick = event.tick,
                    key = ?key,
                    compute_latency_micros = event.compute_latency_micros,
                    "simulation stored"
                );
            }
            RunLogEventKind::PrefillStarted { total } => {
                tracing::info!("prefilling cache with {total} runs");
            }
            RunLogEventKind::PrefillProgress { completed, total } => match key {
                Some(key) => tracing::info!(
                    "[{completed}/{total}] mu={:.2}%, sigma={:.2}%, h={}",
                    key.mu * 100.0,
                    key.sigma * 100.0,
                    key.horizon
                ),
                None => tracing::info!("[{completed}/{total}]"),
            },
            RunLogEventKind::PrefillCompleted { total } => {
                tracing::info!("cache prefill complete after {total} runs");
            }
        }
    }
}
