//! Character-spacing estimation.
//!
//! Given the horizontal gaps between consecutive fragments on one line, pick
//! the largest gap that still separates characters of the same word. Gaps
//! above the result separate words.
//!
//! Char spacing varies far more than word spacing, so the scan runs from the
//! largest gap down. Every distinct gap below `max(3 * font size, mean gap)`
//! is scored by how far it sits below the previous distinct gap, adjusted by
//! its log-distance from the mean gap and by how many gaps lie below it.

use crate::geom::is_within_percent;

const LOG_WEIGHT: f64 = 0.1;
const MIN_SPACING: f64 = 3.0;

/// Estimate the char spacing for one line of gaps.
///
/// `distances` is sorted in place. Zero gaps yield the floor; uniformly
/// spaced gaps (largest within `uniform_percent` of smallest) yield the
/// largest gap. The result is never below `max(3, average_font_size / 2)`
/// and is returned as `floor(spacing) + 1`.
pub fn calculate_char_spacing(
    distances: &mut [i32],
    average_font_size: f64,
    uniform_percent: f32,
) -> i32 {
    let count = distances.len();
    distances.sort_unstable();

    let mut char_spacing = f64::MIN_POSITIVE;

    if count == 0 {
        char_spacing = 0.0;
    } else if is_within_percent(
        distances[0] as f32,
        distances[count - 1] as f32,
        uniform_percent,
    ) {
        char_spacing = distances[count - 1] as f64;
        log::debug!(
            target: "pdf_structure::words",
            "spacing: all distances equal, using {}",
            char_spacing
        );
    } else {
        let average_distance = distances.iter().map(|&d| d as f64).sum::<f64>() / count as f64;
        let ceiling = (average_font_size * 3.0).max(average_distance);
        log::debug!(
            target: "pdf_structure::words",
            "spacing: averageFontSize={}, averageDistance={}",
            average_font_size,
            average_distance
        );

        let mut biggest_score = f64::MIN_POSITIVE;
        let mut last_distance = distances[count - 1].saturating_add(1) as f64;

        for i in (0..count).rev() {
            let distance = distances[i] as f64;

            // Only distinct values get scored.
            if distance == char_spacing || distance == last_distance {
                continue;
            }

            if distance < ceiling {
                let mut score = (last_distance - distance) / distance.max(1.0) + distance * 0.5;

                if distance > 0.0 {
                    let distance_log =
                        (distance.ln() / average_distance.ln().max(1.0)).abs() - 1.0;
                    score *= distance_log * LOG_WEIGHT + 1.0;
                    score = score * i as f64 / count as f64;
                } else {
                    score *= 0.5;
                }

                if score > biggest_score {
                    biggest_score = score;
                    char_spacing = distance;
                    log::trace!(
                        target: "pdf_structure::words",
                        "spacing: {} leads with score {}",
                        distance,
                        score
                    );
                } else {
                    log::trace!(
                        target: "pdf_structure::words",
                        "spacing: {} scored {}",
                        distance,
                        score
                    );
                }
            }
            last_distance = distance;
        }
    }

    let expected_minimum = MIN_SPACING.max(average_font_size / 2.0);
    if char_spacing < expected_minimum {
        log::debug!(
            target: "pdf_structure::words",
            "spacing: raising low charSpacing {} to {}",
            char_spacing,
            expected_minimum
        );
        char_spacing = expected_minimum;
    }

    (char_spacing as i32).saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spacing(distances: &[i32], font_size: f64) -> i32 {
        let mut d = distances.to_vec();
        calculate_char_spacing(&mut d, font_size, 10.0)
    }

    #[test]
    fn test_no_gaps_gives_floor() {
        assert_eq!(spacing(&[], 10.0), 6);
        assert_eq!(spacing(&[], 2.0), 4);
    }

    #[test]
    fn test_uniform_gaps_use_largest() {
        assert_eq!(spacing(&[20, 21, 20, 22], 10.0), 23);
        assert_eq!(spacing(&[8], 10.0), 9);
    }

    #[test]
    fn test_uniform_gaps_below_floor_use_floor() {
        assert_eq!(spacing(&[1, 1, 1], 10.0), 6);
    }

    #[test]
    fn test_report_line_spacing() {
        // "Report" "1" "." "2" with gaps 5, 1, 4 at font size 10.
        let s = spacing(&[5, 1, 4], 10.0);
        assert!((6..=8).contains(&s), "got {}", s);
        assert_eq!(s, 6);
    }

    #[test]
    fn test_separates_char_and_word_gaps() {
        // Tight char gaps of 1-2 and word gaps around 25 at a small font.
        let s = spacing(&[1, 2, 1, 25, 2, 1, 26, 1, 2, 24], 4.0);
        assert!(s > 2, "char gaps must merge, got {}", s);
        assert!(s < 24, "word gaps must split, got {}", s);
    }

    #[test]
    fn test_negative_and_zero_gaps() {
        let s = spacing(&[0, 0, 0, 12], 6.0);
        assert!(s >= 4);
    }

    #[test]
    fn test_extreme_gap_does_not_overflow() {
        let s = spacing(&[1, 2, i32::MAX], 1.0e9);
        assert!(s > 0);
        assert_eq!(spacing(&[], 1.0e10), i32::MAX);
    }

    #[test]
    fn test_floor_holds_for_many_inputs() {
        let inputs: [&[i32]; 6] = [
            &[0],
            &[0, 1, 2, 30],
            &[3, 9, 27],
            &[1, 50, 51, 52],
            &[7, 7, 7, 70],
            &[2, 4, 8, 16, 32],
        ];
        for font_size in [2.0, 6.0, 10.0, 24.0] {
            let floor = (3.0f64).max(font_size / 2.0);
            for input in inputs {
                let s = spacing(input, font_size);
                assert!(
                    s as f64 >= floor,
                    "spacing {} below floor {} for {:?}",
                    s,
                    floor,
                    input
                );
            }
        }
    }
}
