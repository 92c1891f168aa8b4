use std::f64::consts::{PI, TAU};

use log::warn;

/// Wheel-space angle of the fixed pointer.
pub const POINTER_ANGLE: f64 = PI * 1.5;

/// Fractions of a sector tried, in order, when the sector center does not
/// survive the round trip through [`index_from_angle`].
const NUDGE_FRACTIONS: [f64; 4] = [0.5, 0.25, 0.75, 0.0625];

pub fn slice_angle(prize_count: usize) -> f64 {
    TAU / prize_count as f64
}

/// Maps any angle into `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let normalized = angle.rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to exactly 2π.
    if normalized >= TAU {
        0.0
    } else {
        normalized
    }
}

/// The prize under the pointer when the wheel is rotated by `angle`.
///
/// Sector boundaries belong to the sector that starts there. Returns `None`
/// for an empty wheel.
pub fn index_from_angle(angle: f64, prize_count: usize) -> Option<usize> {
    if prize_count == 0 {
        return None;
    }
    let relative = normalize_angle(POINTER_ANGLE - normalize_angle(angle));
    let index = (relative / slice_angle(prize_count)).floor() as usize;
    Some(index % prize_count)
}

fn angle_at_fraction(index: usize, prize_count: usize, fraction: f64) -> f64 {
    let relative = (index as f64 + fraction) * slice_angle(prize_count);
    normalize_angle(POINTER_ANGLE - relative)
}

/// Rotation that puts the pointer on the center of sector `index`.
///
/// The result is checked against [`index_from_angle`]. If rounding pushes it
/// into a neighbouring sector, fixed offsets inside the sector are tried
/// instead.
///
/// # Panics
///
/// Panics if `index >= prize_count`.
pub fn angle_for_index(index: usize, prize_count: usize) -> f64 {
    assert!(
        index < prize_count,
        "prize index {index} out of range for a wheel of {prize_count}"
    );

    match first_angle_in_sector(index, prize_count, &NUDGE_FRACTIONS) {
        Some((0, angle)) => angle,
        Some((_, angle)) => {
            warn!("Sector center of {index}/{prize_count} drifted, nudged inside the sector");
            angle
        }
        None => {
            warn!("No nudge kept {index}/{prize_count} inside its sector");
            angle_at_fraction(index, prize_count, 0.5)
        }
    }
}

/// First of `fractions` whose angle maps back to `index`, with its position
/// in the list.
fn first_angle_in_sector(index: usize, prize_count: usize, fractions: &[f64]) -> Option<(usize, f64)> {
    fractions.iter().enumerate().find_map(|(attempt, fraction)| {
        let angle = angle_at_fraction(index, prize_count, *fraction);
        (index_from_angle(angle, prize_count) == Some(index)).then_some((attempt, angle))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_sizes() {
        for n in 1..=50 {
            for i in 0..n {
                let angle = angle_for_index(i, n);
                assert!((0.0..TAU).contains(&angle), "angle {angle} for {i}/{n}");
                assert_eq!(index_from_angle(angle, n), Some(i), "{i}/{n}");
            }
        }
    }

    #[test]
    fn test_round_trip_survives_whole_turns() {
        for n in [3, 11, 37] {
            for i in 0..n {
                let angle = angle_for_index(i, n);
                for turns in [-4.0, 1.0, 7.0, 1000.0] {
                    assert_eq!(index_from_angle(angle + TAU * turns, n), Some(i));
                }
            }
        }
    }

    #[test]
    fn test_unrotated_wheel() {
        // With no rotation the pointer sits at 3π/2, three quarters round.
        assert_eq!(index_from_angle(0.0, 4), Some(3));
        assert_eq!(index_from_angle(0.0, 11), Some(8));
    }

    #[test]
    fn test_sides_of_a_boundary() {
        // At angle π/2 the pointer sits on the edge between sectors 1 and 2
        // of a four-sector wheel.
        assert_eq!(index_from_angle(PI / 2.0 - 1e-9, 4), Some(2));
        assert_eq!(index_from_angle(PI / 2.0 + 1e-9, 4), Some(1));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_angle(-1e-18), 0.0);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(5.0 * PI) - PI).abs() < 1e-12);
        assert_eq!(index_from_angle(1.0, 0), None);
    }

    #[test]
    fn test_nudge_search() {
        // 1.5 and -0.5 of a sector land in the neighbours.
        assert_eq!(first_angle_in_sector(2, 8, &[1.5, -0.5]), None);

        let (attempt, angle) = first_angle_in_sector(2, 8, &[1.5, 0.25]).unwrap();
        assert_eq!(attempt, 1);
        assert_eq!(index_from_angle(angle, 8), Some(2));

        assert_eq!(first_angle_in_sector(2, 8, &NUDGE_FRACTIONS).map(|(a, _)| a), Some(0));
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_index_panics() {
        angle_for_index(5, 5);
    }
}
