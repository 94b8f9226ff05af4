//! Label geometry and print-origin offsets.
//!
//! [`LabelGeometry`] is a plain value snapshot. [`GeometryState`] owns the
//! live value shared between requests; its only mutations are
//! [`GeometryState::nudge`] and [`GeometryState::set`], each applied
//! atomically under one lock.

use std::{fmt, str::FromStr, sync::Mutex};

use log::{debug, info};

use crate::error::Error;

/// Print density of the device, identical in both axes (203 dpi).
pub const DOTS_PER_MM: f32 = 8.0;

/// Smallest accepted origin offset in dots.
pub const OFFSET_MIN: i32 = -300;

/// Largest accepted origin offset in dots.
pub const OFFSET_MAX: i32 = 300;

/// Largest label width, height or gap accepted from text input.
pub const MAX_LABEL_MM: f32 = 1000.0;

/// Convert millimeters to whole device dots, rounding to nearest.
pub fn mm_to_dots(mm: f32) -> i32 {
    (mm * DOTS_PER_MM).round() as i32
}

fn clamp_offset(dots: i32) -> i32 {
    dots.max(OFFSET_MIN).min(OFFSET_MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x" | "X" => Ok(Axis::X),
            "y" | "Y" => Ok(Axis::Y),
            _ => Err(Error::UnknownAxis(s.to_string())),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Physical label size, gap and print-origin offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub gap_mm: f32,
    pub x_offset: i32,
    pub y_offset: i32,
}

impl Default for LabelGeometry {
    /// 4" x 6" shipping labels.
    fn default() -> Self {
        LabelGeometry {
            width_mm: 101.6,
            height_mm: 152.4,
            gap_mm: 2.5,
            x_offset: 32,
            y_offset: 0,
        }
    }
}

impl LabelGeometry {
    /// Label width in dots.
    pub fn width_dots(&self) -> i32 {
        mm_to_dots(self.width_mm)
    }

    /// Label height in dots.
    pub fn height_dots(&self) -> i32 {
        mm_to_dots(self.height_mm)
    }

    pub fn offset(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x_offset,
            Axis::Y => self.y_offset,
        }
    }

    fn offset_mut(&mut self, axis: Axis) -> &mut i32 {
        match axis {
            Axis::X => &mut self.x_offset,
            Axis::Y => &mut self.y_offset,
        }
    }
}

/// A partial geometry update given as text, as it arrives from a form,
/// a query string or the environment.
///
/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default)]
pub struct GeometryUpdate {
    width_mm: Option<String>,
    height_mm: Option<String>,
    gap_mm: Option<String>,
    x_offset: Option<String>,
    y_offset: Option<String>,
}

impl GeometryUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width_mm(self, value: impl Into<String>) -> Self {
        GeometryUpdate {
            width_mm: Some(value.into()),
            ..self
        }
    }

    pub fn height_mm(self, value: impl Into<String>) -> Self {
        GeometryUpdate {
            height_mm: Some(value.into()),
            ..self
        }
    }

    pub fn gap_mm(self, value: impl Into<String>) -> Self {
        GeometryUpdate {
            gap_mm: Some(value.into()),
            ..self
        }
    }

    pub fn x_offset(self, value: impl Into<String>) -> Self {
        GeometryUpdate {
            x_offset: Some(value.into()),
            ..self
        }
    }

    pub fn y_offset(self, value: impl Into<String>) -> Self {
        GeometryUpdate {
            y_offset: Some(value.into()),
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width_mm.is_none()
            && self.height_mm.is_none()
            && self.gap_mm.is_none()
            && self.x_offset.is_none()
            && self.y_offset.is_none()
    }

    /// Produce the geometry this update would yield on top of `current`.
    ///
    /// Any malformed field fails the whole update. Offsets are clamped into
    /// `[OFFSET_MIN, OFFSET_MAX]`.
    pub fn apply_to(&self, current: &LabelGeometry) -> Result<LabelGeometry, Error> {
        let mut next = *current;
        if let Some(v) = &self.width_mm {
            next.width_mm = parse_size("width_mm", v)?;
        }
        if let Some(v) = &self.height_mm {
            next.height_mm = parse_size("height_mm", v)?;
        }
        if let Some(v) = &self.gap_mm {
            next.gap_mm = parse_gap("gap_mm", v)?;
        }
        if let Some(v) = &self.x_offset {
            next.x_offset = clamp_offset(parse_offset("x_offset", v)?);
        }
        if let Some(v) = &self.y_offset {
            next.y_offset = clamp_offset(parse_offset("y_offset", v)?);
        }
        Ok(next)
    }
}

fn parse_size(field: &'static str, value: &str) -> Result<f32, Error> {
    match value.trim().parse::<f32>() {
        Ok(v) if v.is_finite() && v > 0.0 && v <= MAX_LABEL_MM => Ok(v),
        _ => Err(Error::invalid(field, value)),
    }
}

// A zero gap selects continuous media.
fn parse_gap(field: &'static str, value: &str) -> Result<f32, Error> {
    match value.trim().parse::<f32>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v <= MAX_LABEL_MM => Ok(v),
        _ => Err(Error::invalid(field, value)),
    }
}

fn parse_offset(field: &'static str, value: &str) -> Result<i32, Error> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| Error::invalid(field, value))
}

/// The live geometry shared by every print request.
#[derive(Debug, Default)]
pub struct GeometryState {
    current: Mutex<LabelGeometry>,
}

impl GeometryState {
    pub fn new(geometry: LabelGeometry) -> Self {
        GeometryState {
            current: Mutex::new(geometry),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LabelGeometry> {
        // the geometry is replaced whole, so a poisoned value is still consistent
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the current geometry.
    pub fn snapshot(&self) -> LabelGeometry {
        *self.lock()
    }

    /// Move the print origin along `axis` by `delta_mm`.
    ///
    /// The result saturates at the offset bounds instead of failing.
    pub fn nudge(&self, axis: Axis, delta_mm: f32) -> Result<LabelGeometry, Error> {
        if !delta_mm.is_finite() {
            return Err(Error::invalid("mm", delta_mm));
        }
        let delta = mm_to_dots(delta_mm);

        let mut geometry = self.lock();
        let offset = geometry.offset_mut(axis);
        *offset = clamp_offset(offset.saturating_add(delta));
        info!("nudge {} by {} dots -> {}", axis, delta, *offset);
        Ok(*geometry)
    }

    /// Apply a partial update, all or nothing.
    pub fn set(&self, update: &GeometryUpdate) -> Result<LabelGeometry, Error> {
        let mut geometry = self.lock();
        let next = update.apply_to(&geometry)?;
        debug!("geometry {:?} -> {:?}", *geometry, next);
        *geometry = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn test_nudge_one_mm_is_eight_dots() {
        let state = GeometryState::new(LabelGeometry {
            x_offset: 0,
            ..LabelGeometry::default()
        });
        let g = state.nudge(Axis::X, 1.0).unwrap();
        assert_eq!(g.x_offset, 8);
        let g = state.nudge(Axis::Y, -0.5).unwrap();
        assert_eq!(g.y_offset, -4);
    }

    #[test]
    fn test_nudge_saturates_at_bounds() {
        let state = GeometryState::default();
        for _ in 0..100 {
            let g = state.nudge(Axis::X, 1.0).unwrap();
            assert!(g.x_offset <= OFFSET_MAX);
        }
        assert_eq!(state.snapshot().x_offset, OFFSET_MAX);

        for _ in 0..100 {
            state.nudge(Axis::Y, -10.0).unwrap();
        }
        assert_eq!(state.snapshot().y_offset, OFFSET_MIN);
    }

    #[test]
    fn test_nudge_rejects_non_finite() {
        let state = GeometryState::default();
        assert!(state.nudge(Axis::X, f32::NAN).is_err());
        assert_eq!(state.snapshot(), LabelGeometry::default());
    }

    #[test]
    fn test_concurrent_nudges_are_not_lost() {
        let state = Arc::new(GeometryState::new(LabelGeometry {
            x_offset: 0,
            ..LabelGeometry::default()
        }));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    for _ in 0..4 {
                        state.nudge(Axis::X, 1.0).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(state.snapshot().x_offset, 8 * 4 * 8);
    }

    #[test]
    fn test_set_applies_fields() {
        let state = GeometryState::default();
        let g = state
            .set(&GeometryUpdate::new().width_mm("50").gap_mm("3").y_offset("-12"))
            .unwrap();
        assert_eq!(g.width_mm, 50.0);
        assert_eq!(g.height_mm, 152.4);
        assert_eq!(g.gap_mm, 3.0);
        assert_eq!(g.y_offset, -12);
    }

    #[test]
    fn test_set_is_atomic() {
        let state = GeometryState::default();
        let update = GeometryUpdate::new().width_mm("80").x_offset("12.5");
        match state.set(&update) {
            Err(Error::InvalidField { field, value }) => {
                assert_eq!(field, "x_offset");
                assert_eq!(value, "12.5");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(state.snapshot(), LabelGeometry::default());
    }

    #[test]
    fn test_set_rejects_non_positive_size() {
        let state = GeometryState::default();
        assert!(state.set(&GeometryUpdate::new().height_mm("0")).is_err());
        assert!(state.set(&GeometryUpdate::new().width_mm("inf")).is_err());
        assert!(state.set(&GeometryUpdate::new().gap_mm("-1")).is_err());
        assert!(state.set(&GeometryUpdate::new().gap_mm("0")).is_ok());
    }

    #[test]
    fn test_set_rejects_oversized_label() {
        let state = GeometryState::default();
        let update = GeometryUpdate::new().width_mm("1e9").height_mm("1e9");
        match state.set(&update) {
            Err(Error::InvalidField { field, .. }) => assert_eq!(field, "width_mm"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(state.snapshot(), LabelGeometry::default());
        assert!(state.set(&GeometryUpdate::new().gap_mm("1001")).is_err());

        let g = state.set(&GeometryUpdate::new().width_mm("1000")).unwrap();
        assert_eq!(g.width_dots(), 8000);
    }

    #[test]
    fn test_set_clamps_offsets() {
        let state = GeometryState::default();
        let g = state
            .set(&GeometryUpdate::new().x_offset("1000").y_offset("-1000"))
            .unwrap();
        assert_eq!(g.x_offset, OFFSET_MAX);
        assert_eq!(g.y_offset, OFFSET_MIN);
    }

    #[test]
    fn test_dots() {
        let g = LabelGeometry::default();
        assert_eq!(g.width_dots(), 813);
        assert_eq!(g.height_dots(), 1219);
        assert_eq!("y".parse::<Axis>().unwrap(), Axis::Y);
        assert!("z".parse::<Axis>().is_err());
    }
}
