use serde::{Deserialize, Serialize};

/// Schematic internal units per millimetre (1 IU = 100 nm).
pub const IU_PER_MM: f64 = 10_000.0;

/// A point in schematic internal units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VecI {
    pub x: i32,
    pub y: i32,
}

impl VecI {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Convert a millimetre pair into internal units.
    pub fn from_mm(x_mm: f64, y_mm: f64) -> Self {
        Self {
            x: mm_to_iu(x_mm),
            y: mm_to_iu(y_mm),
        }
    }

    pub fn to_mm(self) -> (f64, f64) {
        (iu_to_mm(self.x), iu_to_mm(self.y))
    }
}

/// Millimetres to internal units, rounding half away from zero.
/// Values outside the `i32` range saturate.
pub fn mm_to_iu(mm: f64) -> i32 {
    let iu = (mm * IU_PER_MM).round();
    iu.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

pub fn iu_to_mm(iu: i32) -> f64 {
    f64::from(iu) / IU_PER_MM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_millimetres_scale_exactly() {
        assert_eq!(mm_to_iu(100.0), 1_000_000);
        assert_eq!(mm_to_iu(-2.5), -25_000);
        assert_eq!(VecI::from_mm(100.0, 50.0), VecI::new(1_000_000, 500_000));
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(mm_to_iu(0.000_05), 1);
        assert_eq!(mm_to_iu(-0.000_05), -1);
    }

    #[test]
    fn saturates_out_of_range_values() {
        assert_eq!(mm_to_iu(1.0e9), i32::MAX);
        assert_eq!(mm_to_iu(-1.0e9), i32::MIN);
    }

    #[test]
    fn iu_back_to_mm() {
        assert!((iu_to_mm(12_700) - 1.27).abs() < 1e-9);
        let (x, y) = VecI::new(10_000, -5_000).to_mm();
        assert!((x - 1.0).abs() < 1e-9);
        assert!((y + 0.5).abs() < 1e-9);
    }
}
