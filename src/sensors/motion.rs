//! PIR motion sensor.
//!
//! The HC-SR501 output goes HIGH while it sees motion.  The driver is generic
//! over an `embedded-hal` input so the same code runs on an ESP-IDF
//! `PinDriver` and on test doubles.  A pin read error counts as "no motion".

use embedded_hal::digital::InputPin;

pub struct MotionSensor<P> {
    pin: P,
}

impl<P: InputPin> MotionSensor<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn detected(&mut self) -> bool {
        self.pin.is_high().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorType, InputPin};

    struct FixedPin(bool);

    impl ErrorType for FixedPin {
        type Error = Infallible;
    }

    impl InputPin for FixedPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.0)
        }
        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.0)
        }
    }

    #[test]
    fn follows_pin_level() {
        assert!(MotionSensor::new(FixedPin(true)).detected());
        assert!(!MotionSensor::new(FixedPin(false)).detected());
    }
}
