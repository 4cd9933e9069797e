//! Visualization of the probes.
//!
//! Autodrive does not render anything. Instead, it hands line segments to an
//! [`AutodriveDebugSink`], and the application decides how to draw them (e.g. with Bevy's gizmos).
//! In a Bevy app, add [`AutodriveDebugSegments`] to a vehicle entity to have its segments
//! collected every tick.

use bevy::color::palettes::basic::{BLACK, LIME, RED, WHITE, YELLOW};
use bevy::prelude::*;

use crate::math::Vector3;
use crate::{PerProbe, Probe, ProbeHits, ProbeKind};

/// Receives line segments for visualizing the probes.
pub trait AutodriveDebugSink {
    fn draw_segment(&mut self, origin: Vector3, endpoint: Vector3, probe: ProbeKind);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugSegment {
    pub origin: Vector3,
    pub endpoint: Vector3,
    pub probe: ProbeKind,
}

impl DebugSegment {
    pub fn color(&self) -> Color {
        probe_debug_color(self.probe)
    }
}

impl AutodriveDebugSink for Vec<DebugSegment> {
    fn draw_segment(&mut self, origin: Vector3, endpoint: Vector3, probe: ProbeKind) {
        self.push(DebugSegment {
            origin,
            endpoint,
            probe,
        });
    }
}

/// The segments of the last step's probes.
///
/// Replaced (not appended to) every time the probes are sampled successfully.
#[derive(Component, Default, Debug, Clone)]
pub struct AutodriveDebugSegments(pub Vec<DebugSegment>);

pub fn probe_debug_color(probe: ProbeKind) -> Color {
    match probe {
        ProbeKind::Forward => WHITE,
        ProbeKind::ForwardLeft => RED,
        ProbeKind::ForwardRight => BLACK,
        ProbeKind::Left => LIME,
        ProbeKind::Right => YELLOW,
    }
    .into()
}

/// Draw every probe from its origin to where it hit, or to the end of its range if it hit
/// nothing.
pub fn draw_probes(
    probes: &PerProbe<Probe>,
    hits: &ProbeHits,
    sink: &mut (impl AutodriveDebugSink + ?Sized),
) {
    for (kind, probe) in probes.iter() {
        sink.draw_segment(probe.origin, hits[kind].point, kind);
    }
}
