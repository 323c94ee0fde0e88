//! Turning one page's runs into words.
//!
//! ```text
//! TextRun[]  ->  lines (equal Y)  ->  Fragment[] (whitespace split)  ->  WordNode[]
//!                group_runs_into_lines   split_into_fragments          build_words
//! ```
//!
//! A word never spans lines. Within a line, fragments merge into the current
//! word until one starts further than the line's char spacing from the word's
//! right edge, or switches style.

use crate::builder::spacing::calculate_char_spacing;
use crate::config::SegmentationConfig;
use crate::geom::{find_bounds, Rectangle};
use crate::input::TextRun;
use crate::observer::{AssemblyEvent, AssemblyObserver};
use crate::style::StyleRef;
use crate::tree::WordNode;

/// Whitespace-free piece of a run with its gap to the previous fragment.
#[derive(Debug, Clone)]
pub(crate) struct Fragment {
    pub text: String,
    pub style: StyleRef,
    pub pos: Rectangle,
    /// Rounded gap to the previous fragment's right edge; 0 for the first on a line.
    pub distance: i32,
}

/// Round half up.
fn round(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

// ---------------------------------------------------------------------------
// Line grouping
// ---------------------------------------------------------------------------

/// Group runs into lines. Two runs share a line iff their Y starts are equal.
///
/// Runs are ordered top-to-bottom then left-to-right first; the sort is
/// stable so runs at identical positions keep document order.
pub fn group_runs_into_lines(mut runs: Vec<TextRun>) -> Vec<Vec<TextRun>> {
    if runs.is_empty() {
        return Vec::new();
    }

    runs.sort_by(crate::sorting::by_lower_y_then_lower_x);

    let mut lines: Vec<Vec<TextRun>> = Vec::new();
    let mut current: Vec<TextRun> = Vec::new();

    for run in runs {
        if current.first().is_some_and(|first| first.pos.y != run.pos.y) {
            lines.push(std::mem::take(&mut current));
        }
        current.push(run);
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

// ---------------------------------------------------------------------------
// Fragment splitting
// ---------------------------------------------------------------------------

/// Split a line's runs on whitespace chars into fragments.
///
/// Every char of a run taller than the font allows is treated as a separator,
/// which drops the run's text. Distances are measured from the right edge of
/// the last emitted fragment. For the first fragment of a run that is the
/// run's `distance_to_preceding`, plus any advance the previous run made past
/// its last fragment (trailing whitespace, or the whole run if it was
/// dropped), plus the run's own leading whitespace.
pub(crate) fn split_into_fragments(
    line: &[TextRun],
    config: &SegmentationConfig,
) -> Vec<Fragment> {
    let mut out: Vec<Fragment> = Vec::with_capacity(line.len() * 2);
    let mut first_in_line = true;
    let mut last_boundary = 0.0f32;
    // Advance past `last_boundary` up to the previous run's right edge.
    let mut carried = 0.0f32;

    for run in line {
        let lead = carried + run.distance_to_preceding;
        let too_high = run.is_too_high(config.max_height_factor);
        if too_high {
            log::debug!(
                target: "pdf_structure::words",
                "dropping run '{}': height {} exceeds font size {}",
                run.text,
                run.pos.height,
                run.font_size
            );
        }

        let mut x = run.pos.x;
        let mut width = 0.0f32;
        let mut contents = String::new();
        let mut first_in_run = true;

        let mut emit = |contents: &mut String,
                        x: &mut f32,
                        width: &mut f32,
                        out: &mut Vec<Fragment>| {
            let distance = if first_in_line {
                first_in_line = false;
                0
            } else if first_in_run {
                round(lead + (*x - run.pos.x))
            } else {
                round(*x - last_boundary)
            };
            first_in_run = false;

            out.push(Fragment {
                text: std::mem::take(contents),
                style: run.style.clone(),
                pos: Rectangle::new(*x, run.pos.y, *width, run.pos.height),
                distance,
            });
            *x += *width;
            *width = 0.0;
            last_boundary = *x;
        };

        let char_count = run.text.chars().count();
        for (idx, c) in run.text.chars().enumerate() {
            let char_width = run.char_width(idx);

            if c.is_whitespace() || too_high {
                if !contents.is_empty() {
                    emit(&mut contents, &mut x, &mut width, &mut out);
                }
                x += char_width;
            } else {
                width += char_width;
                contents.push(c);
            }

            if idx + 1 == char_count && !contents.is_empty() {
                if width == 0.0 {
                    width = run.pos.width;
                }
                emit(&mut contents, &mut x, &mut width, &mut out);
            }
        }

        carried = if first_in_run {
            lead + run.pos.width
        } else {
            run.pos.end_x() - last_boundary
        };
    }

    out
}

// ---------------------------------------------------------------------------
// Word emission
// ---------------------------------------------------------------------------

/// Estimate the char spacing for a line of fragments.
///
/// Returns the spacing and how many gaps fed into the estimate.
pub(crate) fn line_char_spacing(
    fragments: &[Fragment],
    config: &SegmentationConfig,
) -> (i32, usize) {
    if fragments.is_empty() {
        return (0, 0);
    }

    let mut distances: Vec<i32> = Vec::with_capacity(fragments.len());
    let mut font_size_sum = 0.0f64;

    for (i, fragment) in fragments.iter().enumerate() {
        // Skip the first fragment and any gap too large to be char spacing.
        let outlier = fragment.style.x_size * config.outlier_gap_factor;
        if i != 0 && (fragment.distance as f32) < outlier {
            distances.push(fragment.distance.max(0));
        }
        font_size_sum += fragment.style.x_size as f64;
    }

    let average_font_size = font_size_sum / fragments.len() as f64;
    let gaps = distances.len();
    let spacing =
        calculate_char_spacing(&mut distances, average_font_size, config.uniform_gap_percent);
    (spacing, gaps)
}

/// In-progress word while walking a line.
struct WordState {
    text: String,
    parts: Vec<Rectangle>,
    style: Option<StyleRef>,
}

impl WordState {
    fn new() -> Self {
        WordState {
            text: String::new(),
            parts: Vec::new(),
            style: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn is_too_far_away(&self, fragment: &Fragment, char_spacing: i32) -> bool {
        fragment.distance >= 0 && fragment.distance > char_spacing
    }

    fn is_different_style(&self, style: &StyleRef) -> bool {
        self.style.as_ref().is_some_and(|s| s.id != style.id)
    }

    fn push(&mut self, fragment: Fragment) {
        self.text.push_str(&fragment.text);
        self.parts.push(fragment.pos);
        self.style = Some(fragment.style);
    }

    fn take_word(&mut self, page: u32, char_spacing: i32) -> Option<WordNode> {
        let style = self.style.take()?;
        let pos = find_bounds(self.parts.drain(..));
        let text = std::mem::take(&mut self.text);
        Some(WordNode::new(text, style, pos, page, char_spacing as f32))
    }
}

/// Segment one line of runs into words.
pub fn build_words(
    line: &[TextRun],
    page: u32,
    config: &SegmentationConfig,
    observer: &mut dyn AssemblyObserver,
) -> Vec<WordNode> {
    let fragments = split_into_fragments(line, config);
    let (char_spacing, gaps) = line_char_spacing(&fragments, config);

    if log::log_enabled!(target: "pdf_structure::words", log::Level::Debug) {
        let mut with_gaps = String::new();
        for (i, f) in fragments.iter().enumerate() {
            if i != 0 {
                with_gaps.push_str(&format!("> {}>", f.distance));
            }
            with_gaps.push_str(&f.text);
        }
        log::debug!(target: "pdf_structure::words", "spacing: content: {}", with_gaps);
        log::debug!(target: "pdf_structure::words", "spacing: charSpacing={}", char_spacing);
    }
    observer.observe(&AssemblyEvent::CharSpacing {
        page,
        spacing: char_spacing,
        gaps,
    });

    let words = merge_fragments(fragments, char_spacing, page);

    for word in &words {
        log::debug!(target: "pdf_structure::words", "out: {}", word);
        observer.observe(&AssemblyEvent::WordEmitted {
            page,
            text: word.text().to_string(),
        });
    }

    words
}

/// Merge fragments into words under a fixed char spacing.
pub(crate) fn merge_fragments(
    fragments: Vec<Fragment>,
    char_spacing: i32,
    page: u32,
) -> Vec<WordNode> {
    let mut words = Vec::new();
    let mut state = WordState::new();

    for fragment in fragments {
        if !state.is_empty()
            && (state.is_too_far_away(&fragment, char_spacing)
                || state.is_different_style(&fragment.style))
        {
            words.extend(state.take_word(page, char_spacing));
        }
        state.push(fragment);
    }

    // No word spans lines, so whatever is pending ends here.
    words.extend(state.take_word(page, char_spacing));
    words
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::observer::{EventLog, NoopObserver};
    use crate::style::{FontDescriptor, StyleRegistry};

    fn style(registry: &StyleRegistry, name: &str, size: f32) -> StyleRef {
        registry.intern(&FontDescriptor {
            font_name: name.to_string(),
            font_size: size,
            line_height: size,
            width_of_space: size / 4.0,
            char_widths: Vec::new(),
        })
    }

    fn make_run(text: &str, style: &StyleRef, x: f32, y: f32, w: f32, h: f32, d: f32) -> TextRun {
        TextRun::new(text, Arc::clone(style), Rectangle::new(x, y, w, h), 1, d)
    }

    fn words_of(line: &[TextRun]) -> Vec<String> {
        build_words(line, 1, &SegmentationConfig::default(), &mut NoopObserver)
            .iter()
            .map(|w| w.text().to_string())
            .collect()
    }

    #[test]
    fn test_report_line_merges_into_one_word() {
        let registry = StyleRegistry::new();
        let a = style(&registry, "Times", 10.0);
        let line = vec![
            make_run("Report", &a, 0.0, 0.0, 60.0, 10.0, 0.0),
            make_run("1", &a, 65.0, 0.0, 5.0, 10.0, 5.0),
            make_run(".", &a, 71.0, 0.0, 3.0, 10.0, 1.0),
            make_run("2", &a, 75.0, 0.0, 5.0, 10.0, 4.0),
        ];

        let mut log = EventLog::new();
        let words = build_words(&line, 1, &SegmentationConfig::default(), &mut log);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text(), "Report1.2");
        assert_eq!(words[0].pos(), Rectangle::new(0.0, 0.0, 80.0, 10.0));
        assert!((6.0..=8.0).contains(&words[0].char_spacing()));
        assert!(matches!(
            log.events[0],
            AssemblyEvent::CharSpacing { spacing: 6, gaps: 3, .. }
        ));
        assert_eq!(log.words_emitted(), 1);
    }

    #[test]
    fn test_gap_above_spacing_starts_new_word() {
        let registry = StyleRegistry::new();
        let a = style(&registry, "Times", 10.0);
        // Three tight gaps outscore the single wide one; the floor of 5 gives 6.
        let line = vec![
            make_run("ab", &a, 0.0, 0.0, 10.0, 10.0, 0.0),
            make_run("c", &a, 11.0, 0.0, 5.0, 10.0, 1.0),
            make_run("d", &a, 17.0, 0.0, 5.0, 10.0, 1.0),
            make_run("e", &a, 23.0, 0.0, 5.0, 10.0, 1.0),
            make_run("f", &a, 48.0, 0.0, 5.0, 10.0, 20.0),
        ];
        assert_eq!(words_of(&line), vec!["abcde", "f"]);
    }

    #[test]
    fn test_style_change_starts_new_word() {
        let registry = StyleRegistry::new();
        let a = style(&registry, "Times", 10.0);
        let b = style(&registry, "Times-Bold", 10.0);
        let line = vec![
            make_run("foo", &a, 0.0, 0.0, 15.0, 10.0, 0.0),
            make_run("bar", &b, 15.0, 0.0, 15.0, 10.0, 0.0),
        ];
        assert_eq!(words_of(&line), vec!["foo", "bar"]);
    }

    #[test]
    fn test_identical_fonts_from_different_registries_split() {
        let a = style(&StyleRegistry::new(), "Times", 10.0);
        let b = style(&StyleRegistry::new(), "Times", 10.0);
        assert_ne!(a, b, "styles compare by identity");
        let line = vec![
            make_run("foo", &a, 0.0, 0.0, 15.0, 10.0, 0.0),
            make_run("bar", &b, 15.0, 0.0, 15.0, 10.0, 0.0),
        ];
        assert_eq!(words_of(&line), vec!["foo", "bar"]);
    }

    #[test]
    fn test_whitespace_inside_run_splits() {
        let registry = StyleRegistry::new();
        let a = style(&registry, "Times", 10.0);
        let run = make_run("hello   world", &a, 0.0, 0.0, 130.0, 10.0, 0.0);
        let fragments = split_into_fragments(&[run], &SegmentationConfig::default());
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].text, "hello");
        assert_eq!(fragments[0].pos.width, 50.0);
        assert_eq!(fragments[1].text, "world");
        assert_eq!(fragments[1].pos.x, 80.0);
        assert_eq!(fragments[1].distance, 30);
    }

    #[test]
    fn test_leading_whitespace_counts_towards_gap() {
        let registry = StyleRegistry::new();
        let a = style(&registry, "Times", 10.0);
        let hello = make_run("Hello", &a, 0.0, 0.0, 50.0, 10.0, 0.0);
        let world = make_run("   world", &a, 50.0, 0.0, 80.0, 10.0, 0.0);

        let fragments = split_into_fragments(&[hello, world], &SegmentationConfig::default());
        assert_eq!(fragments[1].text, "world");
        assert_eq!(fragments[1].pos.x, 80.0);
        assert_eq!(fragments[1].distance, 30);

        // Tight char gaps give the line a spacing of 6.
        let line = vec![
            make_run("a", &a, 0.0, 0.0, 5.0, 10.0, 0.0),
            make_run("b", &a, 6.0, 0.0, 5.0, 10.0, 1.0),
            make_run("c", &a, 12.0, 0.0, 5.0, 10.0, 1.0),
            make_run("   world", &a, 17.0, 0.0, 80.0, 10.0, 0.0),
        ];
        assert_eq!(words_of(&line), vec!["abc", "world"]);
    }

    #[test]
    fn test_trailing_whitespace_counts_towards_gap() {
        let registry = StyleRegistry::new();
        let a = style(&registry, "Times", 10.0);
        let line = vec![
            make_run("ab  ", &a, 0.0, 0.0, 40.0, 10.0, 0.0),
            make_run("cd", &a, 42.0, 0.0, 20.0, 10.0, 2.0),
        ];
        let fragments = split_into_fragments(&line, &SegmentationConfig::default());
        assert_eq!(fragments[1].distance, 22);
    }

    #[test]
    fn test_gap_spans_dropped_run() {
        let registry = StyleRegistry::new();
        let a = style(&registry, "Times", 10.0);
        let line = vec![
            make_run("k", &a, 0.0, 0.0, 5.0, 10.0, 0.0),
            make_run("e", &a, 6.0, 0.0, 5.0, 10.0, 1.0),
            make_run("p", &a, 12.0, 0.0, 5.0, 10.0, 1.0),
            make_run("junk", &a, 25.0, 0.0, 20.0, 40.0, 8.0),
            make_run("next", &a, 48.0, 0.0, 20.0, 10.0, 3.0),
        ];

        let fragments = split_into_fragments(&line, &SegmentationConfig::default());
        assert_eq!(fragments.len(), 4);
        assert_eq!(fragments[3].text, "next");
        assert_eq!(fragments[3].distance, 31, "measured back to 'p'");
        assert_eq!(words_of(&line), vec!["kep", "next"]);
    }

    #[test]
    fn test_char_widths_position_fragments() {
        let registry = StyleRegistry::new();
        let a = style(&registry, "Times", 10.0);
        let run = make_run("ab c", &a, 10.0, 0.0, 20.0, 10.0, 0.0)
            .with_char_widths(vec![4.0, 6.0, 3.0, 7.0]);
        let fragments = split_into_fragments(&[run], &SegmentationConfig::default());
        assert_eq!(fragments[0].pos, Rectangle::new(10.0, 0.0, 10.0, 10.0));
        assert_eq!(fragments[1].pos, Rectangle::new(23.0, 0.0, 7.0, 10.0));
        assert_eq!(fragments[1].distance, 3);
    }

    #[test]
    fn test_too_high_run_is_dropped() {
        let registry = StyleRegistry::new();
        let a = style(&registry, "Times", 10.0);
        let line = vec![
            make_run("keep", &a, 0.0, 0.0, 20.0, 10.0, 0.0),
            make_run("junk", &a, 25.0, 0.0, 20.0, 40.0, 5.0),
        ];
        assert_eq!(words_of(&line), vec!["keep"]);
    }

    #[test]
    fn test_negative_distance_never_splits() {
        let registry = StyleRegistry::new();
        let a = style(&registry, "Times", 10.0);
        let line = vec![
            make_run("ov", &a, 0.0, 0.0, 10.0, 10.0, 0.0),
            make_run("er", &a, 8.0, 0.0, 10.0, 10.0, -2.0),
        ];
        assert_eq!(words_of(&line), vec!["over"]);
    }

    #[test]
    fn test_group_runs_into_lines_by_exact_y() {
        let registry = StyleRegistry::new();
        let a = style(&registry, "Times", 10.0);
        let runs = vec![
            make_run("second", &a, 0.0, 20.0, 30.0, 10.0, 0.0),
            make_run("b", &a, 40.0, 0.0, 5.0, 10.0, 0.0),
            make_run("a", &a, 0.0, 0.0, 5.0, 10.0, 0.0),
            make_run("close", &a, 0.0, 0.5, 5.0, 10.0, 0.0),
        ];
        let lines = group_runs_into_lines(runs);
        assert_eq!(lines.len(), 3, "no tolerance is applied to Y");
        assert_eq!(lines[0][0].text, "a");
        assert_eq!(lines[0][1].text, "b");
        assert_eq!(lines[1][0].text, "close");
        assert_eq!(lines[2][0].text, "second");
    }

    #[test]
    fn test_empty_line() {
        assert!(words_of(&[]).is_empty());
        assert!(group_runs_into_lines(Vec::new()).is_empty());
    }

    #[test]
    fn test_increasing_gaps_within_spacing_make_one_word() {
        let registry = StyleRegistry::new();
        let a = style(&registry, "Times", 10.0);
        let spacing = 6;

        let mut fragments = Vec::new();
        let mut x = 0.0;
        for gap in 0..=spacing {
            x += gap as f32;
            fragments.push(Fragment {
                text: "x".to_string(),
                style: a.clone(),
                pos: Rectangle::new(x, 0.0, 5.0, 10.0),
                distance: gap,
            });
            x += 5.0;
        }
        let words = merge_fragments(fragments.clone(), spacing, 1);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text(), "xxxxxxx");

        fragments.push(Fragment {
            text: "y".to_string(),
            style: a.clone(),
            pos: Rectangle::new(x + 7.0, 0.0, 5.0, 10.0),
            distance: spacing + 1,
        });
        let words = merge_fragments(fragments, spacing, 1);
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].text(), "y");
    }
}
