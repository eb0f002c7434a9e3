//! Touch activation for on-screen controls.
//!
//! A touch screen reports a start and an end phase for every tap. Controls
//! must fire once per tap, so the first phase commits and the paired phase
//! is swallowed. Pairing is by phase, not by target: the screen may be
//! redrawn between the two phases.

use std::marker::PhantomData;

use ratatui::layout::{Position, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    End,
}

/// Screen regions of the interactive controls drawn in the last frame.
#[derive(Debug, Clone)]
pub struct HitMap<T> {
    regions: Vec<(Rect, T)>,
}

impl<T> Default for HitMap<T> {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
        }
    }
}

impl<T: Copy> HitMap<T> {
    pub fn add(&mut self, area: Rect, target: T) {
        if !area.is_empty() {
            self.regions.push((area, target));
        }
    }

    /// Topmost target under `(x, y)`; later registrations win.
    pub fn hit(&self, x: u16, y: u16) -> Option<T> {
        let pos = Position::new(x, y);
        self.regions
            .iter()
            .rev()
            .find(|(r, _)| r.contains(pos))
            .map(|(_, t)| *t)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[derive(Debug)]
pub struct TouchAdapter<T> {
    armed: bool,
    _target: PhantomData<T>,
}

impl<T> Default for TouchAdapter<T> {
    fn default() -> Self {
        Self {
            armed: false,
            _target: PhantomData,
        }
    }
}

impl<T> TouchAdapter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one phase over `target` and returns the target to activate, if
    /// any. A start fires and arms; the next end is consumed whatever lies
    /// under it. An end with no pending start fires on its own.
    pub fn feed(&mut self, phase: TouchPhase, target: Option<T>) -> Option<T> {
        match phase {
            TouchPhase::Start => {
                self.armed = true;
                target
            }
            TouchPhase::End if std::mem::take(&mut self.armed) => None,
            TouchPhase::End => target,
        }
    }
}
