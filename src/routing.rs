//! Per-source routing tables, built once at watch start.
//!
//! Axis ranges for both ends of every route are pre-fetched here so the
//! hot translation path never queries capabilities per event.

use crate::config::EventRoute;
use crate::error::Error;
use crate::profiles::AbsInfoFmt;
use crate::sink::{EventSink, SinkMap};
use evdev::{AbsInfo, Device};
use std::collections::HashMap;
use std::fmt;

/// One destination of a routed event.
#[derive(Clone)]
pub struct RouteTarget {
    pub sink: String,
    pub code: u16,
    /// Advertised range of the destination code on the sink, when the
    /// sink carries it as an absolute axis.
    pub range: Option<AbsInfo>,
}

#[derive(Default)]
pub struct RoutingTable {
    routes: HashMap<u16, Vec<RouteTarget>>,
    source_ranges: HashMap<u16, AbsInfo>,
    /// Sinks reachable from this source, deduplicated, in config order.
    /// Synchronization events fan out to exactly these.
    fanout: Vec<String>,
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTarget")
            .field("sink", &self.sink)
            .field("code", &self.code)
            .field("range", &self.range.as_ref().map(AbsInfoFmt))
            .finish()
    }
}

impl fmt::Debug for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingTable")
            .field("routes", &self.routes)
            .field(
                "source_ranges",
                &self
                    .source_ranges
                    .iter()
                    .map(|(code, info)| (code, AbsInfoFmt(info)))
                    .collect::<HashMap<_, _>>(),
            )
            .field("fanout", &self.fanout)
            .finish()
    }
}

impl RoutingTable {
    /// Build a table from resolved routes and the source's advertised
    /// axis ranges. Referencing an unknown sink or routing an axis with
    /// an empty advertised range fails here, before any event flows.
    pub fn new<S: EventSink>(
        source_name: &str,
        events: &[EventRoute],
        source_ranges: HashMap<u16, AbsInfo>,
        sinks: &SinkMap<S>,
    ) -> Result<Self, Error> {
        let mut routes: HashMap<u16, Vec<RouteTarget>> = HashMap::new();
        let mut fanout: Vec<String> = Vec::new();

        for route in events {
            if let Some(info) = source_ranges.get(&route.code) {
                check_range(info)?;
            }

            let mut targets = Vec::new();
            for (sink_name, code) in &route.targets {
                let sink = sinks.get(sink_name).ok_or_else(|| Error::UnknownSink {
                    source_name: source_name.to_string(),
                    sink: sink_name.clone(),
                })?;

                let range = sink.abs_range(*code);
                if let Some(info) = &range {
                    check_range(info)?;
                }

                if !fanout.iter().any(|name| name == sink_name) {
                    fanout.push(sink_name.clone());
                }
                targets.push(RouteTarget {
                    sink: sink_name.clone(),
                    code: *code,
                    range,
                });
            }
            routes.insert(route.code, targets);
        }

        Ok(Self {
            routes,
            source_ranges,
            fanout,
        })
    }

    /// Build for a live device, fetching its advertised axis ranges. A
    /// failed capability query counts as losing the device.
    pub fn for_device<S: EventSink>(
        source_name: &str,
        events: &[EventRoute],
        device: &Device,
        sinks: &SinkMap<S>,
    ) -> Result<Self, Error> {
        Self::new(source_name, events, fetch_abs_ranges(device)?, sinks)
    }

    pub fn lookup(&self, code: u16) -> Option<&[RouteTarget]> {
        self.routes.get(&code).map(Vec::as_slice)
    }

    pub fn source_range(&self, code: u16) -> Option<&AbsInfo> {
        self.source_ranges.get(&code)
    }

    pub fn fanout(&self) -> &[String] {
        &self.fanout
    }
}

fn check_range(info: &AbsInfo) -> Result<(), Error> {
    if info.minimum() == info.maximum() {
        return Err(Error::EmptyAxisRange {
            min: info.minimum(),
            max: info.maximum(),
        });
    }
    Ok(())
}

fn fetch_abs_ranges(device: &Device) -> Result<HashMap<u16, AbsInfo>, Error> {
    let mut ranges = HashMap::new();
    let Some(axes) = device.supported_absolute_axes() else {
        return Ok(ranges);
    };

    let state = device.get_abs_state().map_err(Error::DeviceLost)?;
    for axis in axes.iter() {
        if let Some(info) = state.get(axis.0 as usize) {
            ranges.insert(
                axis.0,
                AbsInfo::new(
                    info.value,
                    info.minimum,
                    info.maximum,
                    info.fuzz,
                    info.flat,
                    info.resolution,
                ),
            );
        }
    }
    Ok(ranges)
}
