//! Tool radius compensation and arc direction codes of each format.

use std::f64::consts::PI;

use crate::job::{OffsetSide, OffsetType};

/// Side numbers on which a Format-4 program sees the part mirrored.
fn mirrored_side(side_number: u32) -> bool {
    side_number == 5 || side_number == 6
}

/// Format-4 `#40` of a contour start block.
pub fn format4_contour_compensation(offset_type: OffsetType, offset_side: OffsetSide, side_number: u32) -> u32 {
    if offset_type == OffsetType::Software {
        return 0;
    }
    match offset_side {
        OffsetSide::Left if mirrored_side(side_number) => 2,
        OffsetSide::Left => 1,
        OffsetSide::Right if mirrored_side(side_number) => 1,
        OffsetSide::Right => 2,
        OffsetSide::Center | OffsetSide::Unknown => 0,
    }
}

/// Format-4 `#8525` of a saw cut.
pub fn format4_cut_compensation(offset_side: OffsetSide, cut_from_inside: bool) -> u32 {
    match offset_side {
        OffsetSide::Left => {
            if cut_from_inside {
                1
            } else {
                2
            }
        }
        OffsetSide::Right => {
            if cut_from_inside {
                2
            } else {
                1
            }
        }
        OffsetSide::Center | OffsetSide::Unknown => 0,
    }
}

/// Format-4 `#8525` of a groove.
pub fn format4_groove_compensation(offset_side: OffsetSide) -> u32 {
    match offset_side {
        OffsetSide::Left => 2,
        OffsetSide::Right => 1,
        OffsetSide::Center | OffsetSide::Unknown => 0,
    }
}

/// Radius compensation state of the G-code writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolCorrection {
    /// No correction requested.
    #[default]
    None,
    Left,
    Right,
    Center,
    /// A `G41`/`G42` has been written and needs a `G40`.
    Done,
}

impl ToolCorrection {
    pub fn for_contour(offset_type: OffsetType, offset_side: OffsetSide) -> Self {
        if offset_type == OffsetType::Software {
            return ToolCorrection::None;
        }
        match offset_side {
            OffsetSide::Left => ToolCorrection::Left,
            OffsetSide::Right => ToolCorrection::Right,
            OffsetSide::Center | OffsetSide::Unknown => ToolCorrection::Center,
        }
    }

    /// `41` or `42` while a side correction is pending.
    pub fn g_code(&self) -> Option<u32> {
        match self {
            ToolCorrection::Left => Some(41),
            ToolCorrection::Right => Some(42),
            _ => None,
        }
    }
}

/// Ardis `OPSIDE` of a contour or saw path.
pub fn ardis_opside(offset_type: OffsetType, offset_side: OffsetSide) -> u32 {
    if offset_type == OffsetType::Software {
        return 0;
    }
    match offset_side {
        OffsetSide::Right => 1,
        _ => 0,
    }
}

/// Format-4 `#34`: the sense of rotation flips on the sides seen from behind.
pub fn format4_arc_dir(side_number: u32, counterclockwise: bool) -> u32 {
    let direct = matches!(side_number, 1 | 3 | 4);
    match (direct, counterclockwise) {
        (true, true) | (false, false) => 1,
        _ => 0,
    }
}

/// Ardis `DIR`: 1/2 for arcs up to half a turn, 3/4 beyond.
pub fn ardis_arc_dir(counterclockwise: bool, angle: f64) -> u32 {
    let small = angle.abs() <= PI;
    match (counterclockwise, small) {
        (true, true) => 1,
        (false, true) => 2,
        (true, false) => 3,
        (false, false) => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format4_contour_table() {
        use OffsetSide::*;
        let hw = OffsetType::Hardware;
        assert_eq!(format4_contour_compensation(hw, Left, 1), 1);
        assert_eq!(format4_contour_compensation(hw, Left, 5), 2);
        assert_eq!(format4_contour_compensation(hw, Right, 3), 2);
        assert_eq!(format4_contour_compensation(hw, Right, 6), 1);
        assert_eq!(format4_contour_compensation(hw, Center, 1), 0);
        assert_eq!(format4_contour_compensation(OffsetType::Software, Left, 1), 0);
    }

    #[test]
    fn test_saw_tables() {
        assert_eq!(format4_cut_compensation(OffsetSide::Left, true), 1);
        assert_eq!(format4_cut_compensation(OffsetSide::Left, false), 2);
        assert_eq!(format4_cut_compensation(OffsetSide::Right, true), 2);
        assert_eq!(format4_cut_compensation(OffsetSide::Right, false), 1);
        assert_eq!(format4_groove_compensation(OffsetSide::Left), 2);
        assert_eq!(format4_groove_compensation(OffsetSide::Center), 0);
    }

    #[test]
    fn test_gcode_correction() {
        let left = ToolCorrection::for_contour(OffsetType::Hardware, OffsetSide::Left);
        assert_eq!(left.g_code(), Some(41));
        let right = ToolCorrection::for_contour(OffsetType::Hardware, OffsetSide::Right);
        assert_eq!(right.g_code(), Some(42));
        assert_eq!(ToolCorrection::for_contour(OffsetType::Software, OffsetSide::Left), ToolCorrection::None);
        assert_eq!(ToolCorrection::Done.g_code(), None);
    }

    #[test]
    fn test_ardis_opside() {
        assert_eq!(ardis_opside(OffsetType::Hardware, OffsetSide::Right), 1);
        assert_eq!(ardis_opside(OffsetType::Hardware, OffsetSide::Left), 0);
        assert_eq!(ardis_opside(OffsetType::Software, OffsetSide::Right), 0);
    }

    #[test]
    fn test_arc_direction_codes() {
        assert_eq!(format4_arc_dir(1, true), 1);
        assert_eq!(format4_arc_dir(1, false), 0);
        assert_eq!(format4_arc_dir(5, true), 0);
        assert_eq!(format4_arc_dir(2, false), 1);
        assert_eq!(ardis_arc_dir(true, 1.0), 1);
        assert_eq!(ardis_arc_dir(false, -PI), 2);
        assert_eq!(ardis_arc_dir(true, 4.0), 3);
        assert_eq!(ardis_arc_dir(false, 5.0), 4);
    }
}
