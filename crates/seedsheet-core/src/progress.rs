use serde::Serialize;

/// Checkpoints reported while exporting or importing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    TableExported { table: String, sheet: String },
    TableSkipped { table: String },
    FlavorStarted { flavor: String },
    FlavorImported { flavor: String, tables: usize },
}

impl ProgressEvent {
    /// Human readable status line.
    pub fn message(&self) -> String {
        match self {
            ProgressEvent::TableExported { table, sheet } => {
                format!("Exported table {table} to sheet '{sheet}'.")
            }
            ProgressEvent::TableSkipped { table } => {
                format!("Skipped table {table}, it already exists in the workbook.")
            }
            ProgressEvent::FlavorStarted { flavor } => {
                format!("Generating data helper for {flavor}.")
            }
            ProgressEvent::FlavorImported { flavor, tables } => {
                format!("Generated {tables} table(s) for {flavor}.")
            }
        }
    }
}

/// Synchronous observer invoked in processing order.
pub trait ProgressObserver {
    fn on_event(&mut self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: FnMut(&ProgressEvent),
{
    fn on_event(&mut self, event: &ProgressEvent) {
        self(event)
    }
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_event(&mut self, _event: &ProgressEvent) {}
}
