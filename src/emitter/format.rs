//! Fixed-precision number rendering.

use crate::config::OutputUnit;
use crate::math::{cm_to_inch, cm_to_mm, rad_to_deg};

/// Conversion applied to a value before it is printed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Scale {
    #[default]
    Unit,
    /// Host centimetres to millimetres.
    Millimetre,
    /// Host centimetres to inches.
    Inch,
    /// Radians to degrees.
    Degree,
    Factor(f64),
}

impl Scale {
    /// Length scale for the configured output unit.
    pub fn length(unit: OutputUnit) -> Self {
        match unit {
            OutputUnit::Mm => Scale::Millimetre,
            OutputUnit::Inch => Scale::Inch,
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Scale::Unit => value,
            Scale::Millimetre => cm_to_mm(value),
            Scale::Inch => cm_to_inch(value),
            Scale::Degree => rad_to_deg(value),
            Scale::Factor(factor) => value * factor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumberFormat {
    prefix: String,
    decimals: usize,
    width: usize,
    zero_pad: bool,
    trim: bool,
    force_decimal: bool,
    scale: Scale,
}

impl NumberFormat {
    pub fn new(decimals: usize) -> Self {
        Self {
            decimals,
            ..Self::default()
        }
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Minimum digit count, only honoured together with `zero_pad`.
    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn zero_pad(mut self) -> Self {
        self.zero_pad = true;
        self
    }

    /// Drop trailing zeros and a dangling decimal point.
    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    /// Always print a decimal point, `5` becomes `5.`.
    pub fn force_decimal(mut self) -> Self {
        self.force_decimal = true;
        self
    }

    pub fn scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    pub fn format(&self, value: f64) -> String {
        let text = format!("{:.*}", self.decimals, self.scale.apply(value));
        let (negative, mut digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest.to_string()),
            None => (false, text),
        };

        if self.trim && digits.contains('.') {
            digits = digits.trim_end_matches('0').trim_end_matches('.').to_string();
        }
        if self.force_decimal && !digits.contains('.') {
            digits.push('.');
        }
        if self.zero_pad && digits.len() < self.width {
            digits = format!("{}{}", "0".repeat(self.width - digits.len()), digits);
        }

        let is_zero = digits.chars().all(|c| c == '0' || c == '.');
        let sign = if negative && !is_zero { "-" } else { "" };
        format!("{}{}{}", self.prefix, sign, digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcode_words() {
        let g = NumberFormat::new(0).prefix("G").width(2).zero_pad();
        assert_eq!(g.format(0.0), "G00");
        assert_eq!(g.format(41.0), "G41");
        let o = NumberFormat::new(0).prefix("O").width(4).zero_pad();
        assert_eq!(o.format(1.0), "O0001");
    }

    #[test]
    fn test_coordinates_in_mm() {
        let xyz = NumberFormat::new(3).scale(Scale::Millimetre).force_decimal();
        assert_eq!(xyz.format(1.25), "12.500");
        assert_eq!(xyz.format(-0.00001), "0.000");
        let whole = NumberFormat::new(0).force_decimal();
        assert_eq!(whole.format(5.0), "5.");
    }

    #[test]
    fn test_trimmed_values() {
        let double = NumberFormat::new(5).trim().scale(Scale::Millimetre);
        assert_eq!(double.format(6.0), "60");
        assert_eq!(double.format(0.05), "0.5");
        assert_eq!(double.format(-1.8), "-18");
        assert_eq!(double.format(0.0), "0");
        let inch = NumberFormat::new(4).scale(Scale::length(OutputUnit::Inch));
        assert_eq!(inch.format(2.54), "1.0000");
    }

    #[test]
    fn test_degrees() {
        let angle = NumberFormat::new(4).trim().scale(Scale::Degree);
        assert_eq!(angle.format(std::f64::consts::FRAC_PI_2), "90");
        assert_eq!(NumberFormat::new(1).scale(Scale::Factor(2.0)).format(1.5), "3.0");
    }
}
