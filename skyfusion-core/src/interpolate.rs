//! Playback position interpolation (§4.O): smooths a sequence of sampled
//! snapshot "frames" into a continuous timeline for replay, fading aircraft
//! in and out of frames where they weren't observed.

use crate::geo::{interpolate_angle, spherical_interpolate};
use crate::types::Icao;

#[derive(Debug, Clone, Copy)]
pub struct FrameEntry {
    pub icao: Icao,
    pub lat: f64,
    pub lon: f64,
    pub heading_deg: Option<f64>,
    pub altitude_ft: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub timestamp: f64,
    pub entries: Vec<FrameEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Presence {
    Both,
    FadingOut,
    FadingIn,
}

#[derive(Debug, Clone, Copy)]
pub struct InterpolatedEntry {
    pub icao: Icao,
    pub lat: f64,
    pub lon: f64,
    pub heading_deg: Option<f64>,
    pub altitude_ft: Option<f64>,
    pub presence: Presence,
    pub opacity: f64,
}

/// Finds the bracketing pair of frames for `at`, via binary search on
/// timestamp. Returns `None` if `frames` is empty or `at` is out of range.
fn bracket(frames: &[Frame], at: f64) -> Option<(usize, usize)> {
    if frames.is_empty() {
        return None;
    }
    if at <= frames[0].timestamp {
        return Some((0, 0));
    }
    if at >= frames[frames.len() - 1].timestamp {
        let last = frames.len() - 1;
        return Some((last, last));
    }

    let idx = frames.partition_point(|f| f.timestamp <= at);
    Some((idx - 1, idx))
}

fn find_entry(frame: &Frame, icao: Icao) -> Option<&FrameEntry> {
    frame.entries.iter().find(|e| e.icao == icao)
}

/// Interpolates every aircraft visible in either bracketing frame at `at`.
/// Aircraft present in only one frame fade in/out across the gap: visible
/// at full opacity in the half of the interval adjacent to their frame,
/// fading to zero by the midpoint.
pub fn interpolate_frame(frames: &[Frame], at: f64) -> Vec<InterpolatedEntry> {
    let Some((i1, i2)) = bracket(frames, at) else {
        return Vec::new();
    };

    if i1 == i2 {
        let frame = &frames[i1];
        return frame
            .entries
            .iter()
            .map(|e| InterpolatedEntry {
                icao: e.icao,
                lat: e.lat,
                lon: e.lon,
                heading_deg: e.heading_deg,
                altitude_ft: e.altitude_ft,
                presence: Presence::Both,
                opacity: 1.0,
            })
            .collect();
    }

    let f1 = &frames[i1];
    let f2 = &frames[i2];
    let span = (f2.timestamp - f1.timestamp).max(1e-9);
    let t = ((at - f1.timestamp) / span).clamp(0.0, 1.0);

    let mut icaos: Vec<Icao> = f1.entries.iter().map(|e| e.icao).collect();
    for e in &f2.entries {
        if !icaos.contains(&e.icao) {
            icaos.push(e.icao);
        }
    }

    icaos
        .into_iter()
        .filter_map(|icao| {
            let e1 = find_entry(f1, icao);
            let e2 = find_entry(f2, icao);
            match (e1, e2) {
                (Some(a), Some(b)) => {
                    let (lat, lon) = spherical_interpolate(a.lat, a.lon, b.lat, b.lon, t).unwrap_or((a.lat, a.lon));
                    let heading_deg = match (a.heading_deg, b.heading_deg) {
                        (Some(ha), Some(hb)) => Some(interpolate_angle(ha, hb, t)),
                        (Some(ha), None) => Some(ha),
                        (None, Some(hb)) => Some(hb),
                        (None, None) => None,
                    };
                    let altitude_ft = match (a.altitude_ft, b.altitude_ft) {
                        (Some(aa), Some(ab)) => Some(aa + (ab - aa) * t),
                        (Some(aa), None) => Some(aa),
                        (None, Some(ab)) => Some(ab),
                        (None, None) => None,
                    };
                    Some(InterpolatedEntry { icao, lat, lon, heading_deg, altitude_ft, presence: Presence::Both, opacity: 1.0 })
                }
                (Some(a), None) => {
                    // present only in the earlier frame: fade out over the
                    // second half of the interval, gone by t=1.
                    let opacity = if t <= 0.5 { 1.0 } else { (1.0 - (t - 0.5) * 2.0).max(0.0) };
                    if opacity <= 0.0 {
                        return None;
                    }
                    Some(InterpolatedEntry {
                        icao,
                        lat: a.lat,
                        lon: a.lon,
                        heading_deg: a.heading_deg,
                        altitude_ft: a.altitude_ft,
                        presence: Presence::FadingOut,
                        opacity,
                    })
                }
                (None, Some(b)) => {
                    // present only in the later frame: fade in over the
                    // first half, absent before t=0.
                    let opacity = if t >= 0.5 { 1.0 } else { (t * 2.0).max(0.0) };
                    if opacity <= 0.0 {
                        return None;
                    }
                    Some(InterpolatedEntry {
                        icao,
                        lat: b.lat,
                        lon: b.lon,
                        heading_deg: b.heading_deg,
                        altitude_ft: b.altitude_ft,
                        presence: Presence::FadingIn,
                        opacity,
                    })
                }
                (None, None) => None,
            }
        })
        .collect()
}

/// A monotonic playback clock: wall-clock elapsed time is scaled by a
/// speed multiplier to produce simulated timeline position.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    pub start_timestamp: f64,
    pub speed: f64,
    elapsed_wall_sec: f64,
}

impl PlaybackClock {
    pub fn new(start_timestamp: f64, speed: f64) -> Self {
        PlaybackClock { start_timestamp, speed, elapsed_wall_sec: 0.0 }
    }

    pub fn advance(&mut self, wall_delta_sec: f64) {
        self.elapsed_wall_sec += wall_delta_sec;
    }

    pub fn simulated_timestamp(&self) -> f64 {
        self.start_timestamp + self.elapsed_wall_sec * self.speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ts: f64, entries: Vec<FrameEntry>) -> Frame {
        Frame { timestamp: ts, entries }
    }

    fn entry(icao: Icao, lat: f64, lon: f64) -> FrameEntry {
        FrameEntry { icao, lat, lon, heading_deg: Some(90.0), altitude_ft: Some(30000.0) }
    }

    #[test]
    fn test_interpolate_midpoint_for_shared_aircraft() {
        let frames = vec![
            frame(0.0, vec![entry([0, 0, 1], 10.0, 10.0)]),
            frame(10.0, vec![entry([0, 0, 1], 10.1, 10.1)]),
        ];
        let out = interpolate_frame(&frames, 5.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].presence, Presence::Both);
        assert!((out[0].lat - 10.05).abs() < 0.01);
    }

    #[test]
    fn test_aircraft_only_in_first_frame_fades_out() {
        let frames = vec![
            frame(0.0, vec![entry([0, 0, 1], 10.0, 10.0)]),
            frame(10.0, vec![]),
        ];
        let early = interpolate_frame(&frames, 1.0);
        assert_eq!(early.len(), 1);
        assert_eq!(early[0].opacity, 1.0);

        let late = interpolate_frame(&frames, 9.0);
        assert_eq!(late.len(), 1);
        assert!(late[0].opacity < 1.0);
        assert_eq!(late[0].presence, Presence::FadingOut);
    }

    #[test]
    fn test_aircraft_only_in_second_frame_fades_in() {
        let frames = vec![
            frame(0.0, vec![]),
            frame(10.0, vec![entry([0, 0, 1], 10.0, 10.0)]),
        ];
        let early = interpolate_frame(&frames, 1.0);
        assert_eq!(early.len(), 1);
        assert!(early[0].opacity < 1.0);
        assert_eq!(early[0].presence, Presence::FadingIn);
    }

    #[test]
    fn test_empty_frames_return_empty() {
        assert!(interpolate_frame(&[], 5.0).is_empty());
    }

    #[test]
    fn test_playback_clock_scales_by_speed() {
        let mut clock = PlaybackClock::new(1000.0, 2.0);
        clock.advance(5.0);
        assert_eq!(clock.simulated_timestamp(), 1010.0);
    }
}
