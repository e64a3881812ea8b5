//! Stateful words: modal values and running counters.

use super::format::NumberFormat;

/// A word that is only written when its text changes.
///
/// A forced modal is written every time.
#[derive(Debug, Clone)]
pub struct Modal {
    format: NumberFormat,
    force: bool,
    last: Option<String>,
}

impl Modal {
    pub fn new(format: NumberFormat) -> Self {
        Self {
            format,
            force: false,
            last: None,
        }
    }

    pub fn forced(format: NumberFormat) -> Self {
        Self {
            force: true,
            ..Self::new(format)
        }
    }

    /// The word for `value`, or an empty string when it repeats.
    pub fn format(&mut self, value: f64) -> String {
        let word = self.format.format(value);
        if !self.force && self.last.as_deref() == Some(word.as_str()) {
            return String::new();
        }
        self.last = Some(word.clone());
        word
    }

    /// Forget the last value so the next word is always written.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Counter rendered through a format: line numbers, program numbers.
#[derive(Debug, Clone)]
pub struct Incremental {
    format: NumberFormat,
    next: f64,
    step: f64,
}

impl Incremental {
    pub fn new(format: NumberFormat, first: f64, step: f64) -> Self {
        Self {
            format,
            next: first,
            step,
        }
    }

    pub fn next_word(&mut self) -> String {
        let word = self.format.format(self.next);
        self.next += self.step;
        word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xyz(prefix: &str) -> NumberFormat {
        NumberFormat::new(3).prefix(prefix).force_decimal()
    }

    #[test]
    fn test_modal_suppresses_repeats() {
        let mut x = Modal::new(xyz("X"));
        assert_eq!(x.format(1.0), "X1.000");
        assert_eq!(x.format(1.0), "");
        assert_eq!(x.format(2.0), "X2.000");
        x.reset();
        assert_eq!(x.format(2.0), "X2.000");
    }

    #[test]
    fn test_forced_modal_always_writes() {
        let mut r = Modal::forced(xyz("R"));
        assert_eq!(r.format(1.0), "R1.000");
        assert_eq!(r.format(1.0), "R1.000");
    }

    #[test]
    fn test_incremental() {
        let mut n = Incremental::new(NumberFormat::new(0).prefix("N"), 10.0, 10.0);
        assert_eq!(n.next_word(), "N10");
        assert_eq!(n.next_word(), "N20");
    }
}
