//! Simulated GPIO header. Pins are independent boolean lines; nothing here
//! touches real hardware.

use shared::GPIO_PINS;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GpioError {
    #[error("GPIO {0} is not on the header")]
    UnknownPin(u8),
}

type PinCallback = Box<dyn FnMut(u8, bool)>;

pub struct GpioPanel {
    levels: [bool; GPIO_PINS.len()],
    on_toggle: Option<PinCallback>,
}

impl Default for GpioPanel {
    fn default() -> Self {
        Self::mount()
    }
}

impl GpioPanel {
    /// A freshly mounted panel with every pin low.
    pub fn mount() -> Self {
        Self {
            levels: [false; GPIO_PINS.len()],
            on_toggle: None,
        }
    }

    pub fn with_callback(mut self, cb: impl FnMut(u8, bool) + 'static) -> Self {
        self.on_toggle = Some(Box::new(cb));
        self
    }

    pub fn pins(&self) -> &'static [u8] {
        &GPIO_PINS
    }

    pub fn level(&self, pin: u8) -> Option<bool> {
        index_of(pin).map(|i| self.levels[i])
    }

    /// Pins paired with their levels, in header order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, bool)> + '_ {
        GPIO_PINS.iter().copied().zip(self.levels.iter().copied())
    }

    /// Flips `pin` and reports `(pin, new_level)` to the callback.
    pub fn toggle(&mut self, pin: u8) -> Result<bool, GpioError> {
        let i = index_of(pin).ok_or(GpioError::UnknownPin(pin))?;
        self.levels[i] = !self.levels[i];
        let level = self.levels[i];
        log::debug!("GPIO {pin} -> {}", if level { "HIGH" } else { "LOW" });
        if let Some(cb) = self.on_toggle.as_mut() {
            cb(pin, level);
        }
        Ok(level)
    }
}

fn index_of(pin: u8) -> Option<usize> {
    GPIO_PINS.iter().position(|p| *p == pin)
}

pub fn level_label(level: bool) -> &'static str {
    if level { "HIGH" } else { "LOW" }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn mounts_all_low() {
        let panel = GpioPanel::mount();
        assert_eq!(panel.iter().count(), 22);
        assert!(panel.iter().all(|(_, level)| !level));
        assert_eq!(panel.pins()[3], 17);
    }

    #[test]
    fn double_toggle_restores_state_with_opposite_notifications() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut panel =
            GpioPanel::mount().with_callback(move |pin, lvl| sink.borrow_mut().push((pin, lvl)));

        assert_eq!(panel.toggle(17), Ok(true));
        assert_eq!(panel.toggle(17), Ok(false));

        assert_eq!(panel.level(17), Some(false));
        assert_eq!(*seen.borrow(), vec![(17, true), (17, false)]);
    }

    #[test]
    fn pins_do_not_interact() {
        let mut panel = GpioPanel::mount();
        panel.toggle(4).unwrap();
        assert_eq!(panel.level(4), Some(true));
        assert!(panel.iter().filter(|(p, _)| *p != 4).all(|(_, l)| !l));
    }

    #[test]
    fn unknown_pin_is_rejected_silently() {
        let seen = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&seen);
        let mut panel = GpioPanel::mount().with_callback(move |_, _| *sink.borrow_mut() += 1);
        assert_eq!(panel.toggle(1), Err(GpioError::UnknownPin(1)));
        assert_eq!(panel.level(1), None);
        assert_eq!(*seen.borrow(), 0);
    }
}
