//! The per-watch hot path: routed event staging and sync fan-out.

use crate::error::Error;
use crate::rescale::rescale;
use crate::routing::RoutingTable;
use crate::sink::{EventSink, SinkMap};
use evdev::{EventType, InputEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Translates one source's event stream into sink writes.
///
/// Routed events are staged per destination sink; each synchronization
/// event from the source flushes every sink in the fan-out set exactly
/// once, so batched axis/button updates become visible atomically on the
/// sink side, preserving the kernel's batching contract.
pub struct Translator<S: EventSink> {
    table: RoutingTable,
    /// Fan-out sinks resolved up front, in config order.
    fanout: Vec<(String, Arc<S>)>,
    pending: HashMap<String, Vec<InputEvent>>,
}

impl<S: EventSink> Translator<S> {
    pub fn new(table: RoutingTable, sinks: &SinkMap<S>) -> Self {
        let fanout = table
            .fanout()
            .iter()
            .filter_map(|name| sinks.get(name).map(|sink| (name.clone(), Arc::clone(sink))))
            .collect();
        Self {
            table,
            fanout,
            pending: HashMap::new(),
        }
    }

    /// Process one source event, in delivery order.
    pub fn process(&mut self, event: InputEvent) -> Result<(), Error> {
        if event.event_type() == EventType::SYNCHRONIZATION {
            return self.flush();
        }

        let Some(targets) = self.table.lookup(event.code()) else {
            debug!(
                kind = ?event.event_type(),
                code = event.code(),
                value = event.value(),
                "skipping unmapped event"
            );
            return Ok(());
        };

        // Rescaling only applies to absolute-axis events with known
        // ranges on both ends; everything else passes through.
        let source_range = if event.event_type() == EventType::ABSOLUTE {
            self.table.source_range(event.code()).copied()
        } else {
            None
        };

        for target in targets {
            let value = rescale(event.value(), source_range.as_ref(), target.range.as_ref())?;
            self.pending
                .entry(target.sink.clone())
                .or_default()
                .push(InputEvent::new(event.event_type(), target.code, value));
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        for (name, sink) in &self.fanout {
            let batch = self.pending.remove(name).unwrap_or_default();
            // An empty batch still flushes: the sync must reach every
            // dependent sink.
            if let Err(e) = sink.emit(&batch) {
                warn!(sink = %name, "sink write failed: {e}");
            }
        }
        Ok(())
    }
}
