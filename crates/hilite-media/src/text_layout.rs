//! Text escaping, wrapping and font fitting for burned-in text.
//!
//! Glyph widths are approximated from the font size; no font metrics are
//! loaded. Every width estimate in this module goes through
//! [`char_width`] so wrapping and fitting agree.

use hilite_models::CaptionStyle;

/// Average glyph width as a fraction of the font size.
pub const CHAR_WIDTH_RATIO: f64 = 0.6;

/// Font size decrement used while searching for a fitting size.
pub const FONT_SIZE_STEP: u32 = 2;

/// Suffix appended to truncated text.
pub const ELLIPSIS: &str = "...";

/// Line separator inside drawtext text values.
pub const LINE_BREAK: &str = "\n";

/// Escape text for use as a drawtext `text` value.
///
/// Backslashes are doubled, filter-graph delimiters are backslash-escaped and
/// ASCII apostrophes become typographic ones so the value can be single-quoted.
pub fn escape_text_for_ffmpeg(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '[' | ']' | ':' | ';' | '%' | ',' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\'' => escaped.push('\u{2019}'),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn style_factor(style: CaptionStyle) -> f64 {
    match style {
        CaptionStyle::Classic => 1.0,
        CaptionStyle::Bold => 1.1,
    }
}

/// Estimated width of one glyph in pixels.
pub fn char_width(font_size: u32, style: CaptionStyle) -> f64 {
    font_size as f64 * CHAR_WIDTH_RATIO * style_factor(style)
}

/// How many glyphs fit on a line, at least one.
pub fn chars_per_line(font_size: u32, available_width_px: u32, style: CaptionStyle) -> usize {
    let width = char_width(font_size, style);
    if width <= 0.0 {
        return 1;
    }
    ((available_width_px as f64 / width).floor() as usize).max(1)
}

/// Greedy word wrap at `max_chars` characters per line.
///
/// Words are never split; a word longer than `max_chars` is placed alone on
/// its own line.
pub fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn wrap_lines(text: &str, font_size: u32, available_width_px: u32, style: CaptionStyle) -> Vec<String> {
    wrap_words(text, chars_per_line(font_size, available_width_px, style))
}

/// Wrap `text` to lines no wider than `available_width_px`, joined with `\n`.
pub fn wrap_text_by_pixel_width(text: &str, font_size: u32, available_width_px: u32) -> String {
    wrap_lines(text, font_size, available_width_px, CaptionStyle::Classic).join(LINE_BREAK)
}

/// Result of fitting text into a box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FittedText {
    pub font_size: u32,
    /// Lines joined with `\n`, not yet escaped
    pub wrapped_text: String,
    /// Whether lines were dropped and an ellipsis appended
    pub truncated: bool,
}

impl FittedText {
    pub fn line_count(&self) -> usize {
        if self.wrapped_text.is_empty() {
            0
        } else {
            self.wrapped_text.split(LINE_BREAK).count()
        }
    }
}

fn fits(lines: &[String], font_size: u32, available_width_px: u32, style: CaptionStyle, max_lines: Option<usize>) -> bool {
    if let Some(max) = max_lines {
        if lines.len() > max {
            return false;
        }
    }
    let glyph = char_width(font_size, style);
    lines
        .iter()
        .all(|line| line.chars().count() as f64 * glyph <= available_width_px as f64)
}

/// Largest font size in `[min_size, min(start_size, max_size)]` whose wrap fits.
///
/// Sizes are tried from the top in steps of [`FONT_SIZE_STEP`]. When none
/// fits, the text is wrapped at the minimum size and, if `max_lines` is set,
/// cut to that many lines with an ellipsis on the last one.
pub fn calculate_optimal_font_size_with_start_and_cap(
    text: &str,
    style: CaptionStyle,
    start_size: u32,
    max_size: u32,
    min_size: u32,
    available_width_px: u32,
    max_lines: Option<usize>,
) -> FittedText {
    let floor = min_size.min(max_size).max(1);
    let max_lines = max_lines.map(|m| m.max(1));
    let mut size = start_size.min(max_size).max(floor);

    loop {
        let lines = wrap_lines(text, size, available_width_px, style);
        if fits(&lines, size, available_width_px, style, max_lines) {
            return FittedText {
                font_size: size,
                wrapped_text: lines.join(LINE_BREAK),
                truncated: false,
            };
        }
        if size <= floor {
            break;
        }
        size = size.saturating_sub(FONT_SIZE_STEP).max(floor);
    }

    let mut lines = wrap_lines(text, floor, available_width_px, style);
    let Some(max) = max_lines.filter(|&m| lines.len() > m) else {
        return FittedText {
            font_size: floor,
            wrapped_text: lines.join(LINE_BREAK),
            truncated: false,
        };
    };

    lines.truncate(max);
    let cpl = chars_per_line(floor, available_width_px, style);
    if let Some(last) = lines.last_mut() {
        let keep = cpl.saturating_sub(ELLIPSIS.len());
        if last.chars().count() > keep {
            *last = last.chars().take(keep).collect();
        }
        let trimmed_len = last.trim_end().len();
        last.truncate(trimmed_len);
        last.push_str(ELLIPSIS);
    }

    FittedText {
        font_size: floor,
        wrapped_text: lines.join(LINE_BREAK),
        truncated: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape_text_for_ffmpeg("a:b"), "a\\:b");
        assert_eq!(escape_text_for_ffmpeg("50%, [ok];"), "50\\%\\, \\[ok\\]\\;");
        assert_eq!(escape_text_for_ffmpeg("c:\\dir"), "c\\:\\\\dir");
        assert_eq!(escape_text_for_ffmpeg("don't"), "don\u{2019}t");
    }

    #[test]
    fn test_escape_backslash_is_not_doubled_twice() {
        // A delimiter escape must not itself be re-escaped
        assert_eq!(escape_text_for_ffmpeg("\\:"), "\\\\\\:");
    }

    #[test]
    fn test_wrap_never_splits_words() {
        let text = "the quick brown fox jumps over the lazy dog";
        let lines = wrap_words(text, 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps over", "the lazy", "dog"]);
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_overlong_word_sits_alone() {
        let lines = wrap_words("a supercalifragilistic b", 5);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn test_wrap_by_pixel_width() {
        // 20px font -> 12px glyphs -> 10 chars in 120px
        assert_eq!(
            wrap_text_by_pixel_width("hello brave new world", 20, 120),
            "hello\nbrave new\nworld"
        );
        assert_eq!(wrap_text_by_pixel_width("", 20, 120), "");
        assert_eq!(chars_per_line(100, 10, CaptionStyle::Classic), 1);
    }

    #[test]
    fn test_fitting_prefers_start_size() {
        let fitted = calculate_optimal_font_size_with_start_and_cap(
            "short", CaptionStyle::Classic, 40, 48, 24, 1000, Some(2),
        );
        assert_eq!(fitted.font_size, 40);
        assert_eq!(fitted.wrapped_text, "short");
        assert!(!fitted.truncated);
    }

    #[test]
    fn test_fitting_start_is_capped_by_max() {
        let fitted = calculate_optimal_font_size_with_start_and_cap(
            "short", CaptionStyle::Classic, 60, 48, 24, 1000, Some(2),
        );
        assert_eq!(fitted.font_size, 48);
    }

    #[test]
    fn test_fitting_shrinks_until_lines_fit() {
        // 30 chars; at 40px (24px glyphs) 300px holds 12 chars -> 3 lines
        let text = "aaaa bbbb cccc dddd eeee ffff";
        let fitted = calculate_optimal_font_size_with_start_and_cap(
            text, CaptionStyle::Classic, 40, 48, 10, 300, Some(2),
        );
        assert!(fitted.font_size < 40);
        assert!(fitted.line_count() <= 2);
        assert!(!fitted.truncated);
    }

    #[test]
    fn test_fitting_truncates_with_ellipsis() {
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let fitted = calculate_optimal_font_size_with_start_and_cap(
            text, CaptionStyle::Classic, 40, 48, 40, 240, Some(2),
        );
        assert_eq!(fitted.font_size, 40);
        assert!(fitted.truncated);
        assert_eq!(fitted.line_count(), 2);
        assert!(fitted.wrapped_text.ends_with(ELLIPSIS));
        let cpl = chars_per_line(40, 240, CaptionStyle::Classic);
        for line in fitted.wrapped_text.split(LINE_BREAK) {
            assert!(line.chars().count() <= cpl);
        }
    }

    #[test]
    fn test_fitting_without_line_cap_never_truncates() {
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let fitted = calculate_optimal_font_size_with_start_and_cap(
            text, CaptionStyle::Classic, 40, 48, 24, 240, None,
        );
        assert!(!fitted.truncated);
        assert_eq!(fitted.font_size, 40);
    }

    #[test]
    fn test_fitting_is_monotonic_in_width() {
        let text = "Members of the committee, the motion before us concerns the annual budget";
        let mut previous = 0;
        for width in (200..=2000).step_by(50) {
            let fitted = calculate_optimal_font_size_with_start_and_cap(
                text, CaptionStyle::Bold, 44, 52, 26, width, Some(2),
            );
            assert!(fitted.font_size >= previous, "width {width}");
            previous = fitted.font_size;
        }
    }

    #[test]
    fn test_bold_glyphs_are_wider() {
        assert!(char_width(40, CaptionStyle::Bold) > char_width(40, CaptionStyle::Classic));
        assert!(
            chars_per_line(40, 1000, CaptionStyle::Bold)
                <= chars_per_line(40, 1000, CaptionStyle::Classic)
        );
    }
}
