use std::io;

use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use seedsheet_core::{ProgressEvent, ProgressObserver};

/// Install the global subscriber. Logs go to stderr so stdout only carries
/// the final status line.
pub fn init_logging(json: bool) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = tracing_subscriber::fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_writer(BoxMakeWriter::new(io::stderr));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer).try_init()
    };
    result.map_err(|err| err.to_string())
}

/// Forwards progress checkpoints to the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingObserver {
    events: usize,
}

impl TracingObserver {
    pub fn events(&self) -> usize {
        self.events
    }
}

impl ProgressObserver for TracingObserver {
    fn on_event(&mut self, event: &ProgressEvent) {
        self.events += 1;
        tracing::debug!(event = "progress", "{}", event.message());
    }
}
