//! `qm cycle`: one reconciliation cycle against a grid-state file.

use anyhow::{Context, Result};
use qm_reconcile::{DispatchError, EnqueueRequest, ProductionDispatcher};
use qm_runtime::{render_status, QuotaMonitor};
use std::fs::{File, OpenOptions};
use std::io::Write;

use super::{load_definition, read_grid, FileConfigStore};

pub struct CycleArgs {
    pub grid: String,
    pub custom_data: String,
    pub catalog_paths: Vec<String>,
    pub requests_out: Option<String>,
    pub json: bool,
}

enum RequestSink {
    File(File),
    Stdout,
    /// Requests are already part of the JSON outcome.
    Discard,
}

/// Writes each enqueue request as one JSON line. Only reached when dispatch
/// is enabled.
struct JsonlDispatcher {
    sink: RequestSink,
}

impl ProductionDispatcher for JsonlDispatcher {
    fn enqueue(&mut self, request: &EnqueueRequest) -> Result<(), DispatchError> {
        let line = serde_json::to_string(request)
            .map_err(|e| DispatchError::new(format!("serialize request: {e}")))?;
        match &mut self.sink {
            RequestSink::File(f) => writeln!(f, "{line}")
                .map_err(|e| DispatchError::new(format!("write request: {e}"))),
            RequestSink::Stdout => {
                println!("ENQUEUE {line}");
                Ok(())
            }
            RequestSink::Discard => Ok(()),
        }
    }
}

pub fn run_cycle(args: CycleArgs) -> Result<()> {
    let definition = load_definition(&args.catalog_paths)?;
    let grid = read_grid(&args.grid)?;

    let sink = match &args.requests_out {
        Some(path) => RequestSink::File(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open requests-out failed: {path}"))?,
        ),
        None if args.json => RequestSink::Discard,
        None => RequestSink::Stdout,
    };
    let mut dispatcher = JsonlDispatcher { sink };
    let mut store = FileConfigStore::new(&args.custom_data);
    let mut monitor = QuotaMonitor::new(definition);

    let inventories = grid.inventory_sources();
    let queues = grid.queue_sources();
    let outcome = monitor.run_cycle(&mut store, &inventories, &queues, &mut dispatcher);

    if args.json {
        let s = serde_json::to_string_pretty(&outcome).context("serialize outcome failed")?;
        println!("{s}");
    } else {
        print!("{}", render_status(&outcome));
        println!("mode={}", outcome.mode().as_str());
    }

    Ok(())
}
