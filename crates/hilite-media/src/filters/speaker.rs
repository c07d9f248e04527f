//! Speaker lower-third overlay.

use serde::Serialize;

use hilite_models::{HexColor, NormalizedUtterance, Speaker, SpeakerOverlayMode};

use super::graph::{Filter, FilterChain, FilterFragment, FilterValue, Stage};
use super::{enable_between, FontSet};
use crate::presets::PresetConfig;
use crate::text_layout::{wrap_words, CHAR_WIDTH_RATIO, ELLIPSIS, LINE_BREAK};

/// Name shown when an utterance has no speaker.
pub const UNKNOWN_SPEAKER: &str = "Unknown Speaker";

/// Share of the frame width the overlay box may occupy.
const MAX_BOX_WIDTH_RATIO: f64 = 0.45;
/// Name lines kept before the last one is cut short.
const MAX_NAME_LINES: usize = 2;

const BACKGROUND_COLOR: &str = "black@0.6";
const NAME_COLOR: &str = "white";
const DETAIL_COLOR: &str = "0xD9D9D9";

/// Display fields for a speaker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeakerInfo {
    pub name: String,
    pub role: Option<String>,
    pub party: Option<String>,
    /// Party colour, dropped when not a valid `#RRGGBB`
    pub color: Option<HexColor>,
}

/// Resolve display fields; a missing speaker is shown as "Unknown Speaker".
pub fn format_speaker_info(speaker: Option<&Speaker>) -> SpeakerInfo {
    let non_empty = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    match speaker {
        Some(s) => SpeakerInfo {
            name: if s.name.trim().is_empty() {
                UNKNOWN_SPEAKER.to_string()
            } else {
                s.name.trim().to_string()
            },
            role: non_empty(&s.role_label),
            party: non_empty(&s.party_label),
            color: s
                .party_color_hex
                .as_deref()
                .and_then(|c| c.parse::<HexColor>().ok()),
        },
        None => SpeakerInfo {
            name: UNKNOWN_SPEAKER.to_string(),
            role: None,
            party: None,
            color: None,
        },
    }
}

/// When and for whom the overlay is drawn, in clip time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeakerDisplaySegment {
    pub start_timestamp: f64,
    pub end_timestamp: f64,
    pub speaker: SpeakerInfo,
    pub speaker_id: Option<String>,
    pub show_overlay: bool,
}

/// One display segment per utterance, flagged by `mode`.
pub fn calculate_speaker_display_segments(
    utterances: &[NormalizedUtterance],
    mode: SpeakerOverlayMode,
) -> Vec<SpeakerDisplaySegment> {
    let mut previous: Option<Option<&str>> = None;

    utterances
        .iter()
        .map(|u| {
            let id = u.speaker_id();
            let show_overlay = match mode {
                SpeakerOverlayMode::Always => true,
                SpeakerOverlayMode::OnSpeakerChange => previous != Some(id),
            };
            previous = Some(id);

            SpeakerDisplaySegment {
                start_timestamp: u.normalized_start,
                end_timestamp: u.normalized_end,
                speaker: format_speaker_info(u.speaker()),
                speaker_id: id.map(str::to_string),
                show_overlay,
            }
        })
        .collect()
}

/// Wrap overlay text at `max_chars`; an over-long word gets its own line.
pub fn wrap_speaker_text(text: &str, max_chars: usize) -> Vec<String> {
    wrap_words(text, max_chars)
}

/// Wrap to `max_chars`, cutting any line that still overflows (and any
/// lines past `max_lines`) with an ellipsis.
fn fit_lines(text: &str, max_chars: usize, max_lines: Option<usize>) -> Vec<String> {
    let shorten = |line: &str| {
        let keep = max_chars.saturating_sub(ELLIPSIS.len());
        let mut short: String = line.chars().take(keep).collect();
        short.push_str(ELLIPSIS);
        short
    };

    let mut lines = wrap_speaker_text(text, max_chars);
    if let Some(max) = max_lines.filter(|&m| lines.len() > m) {
        lines.truncate(max);
        if let Some(last) = lines.last_mut() {
            *last = shorten(last);
        }
    }
    lines
        .into_iter()
        .map(|line| {
            if line.chars().count() > max_chars {
                shorten(&line)
            } else {
                line
            }
        })
        .collect()
}

fn longest(lines: &[String]) -> usize {
    lines.iter().map(|l| l.chars().count()).max().unwrap_or(0)
}

/// Height of `n` stacked lines.
fn block_height(n: u32, font_size: u32, line_spacing: u32) -> u32 {
    if n == 0 {
        0
    } else {
        n * font_size + (n - 1) * line_spacing
    }
}

fn text_width(chars: usize, font_size: u32) -> u32 {
    (chars as f64 * font_size as f64 * CHAR_WIDTH_RATIO).ceil() as u32
}

/// Build the overlay stage, or `None` when nothing is shown.
pub fn generate_speaker_overlay_filter(
    utterances: &[NormalizedUtterance],
    mode: SpeakerOverlayMode,
    preset: &PresetConfig,
    fonts: &FontSet,
) -> Option<FilterFragment> {
    let layout = preset.speaker;
    let frame = preset.dimensions;

    let max_box_width = ((frame.width as f64 * MAX_BOX_WIDTH_RATIO) as u32)
        .min(frame.width.saturating_sub(2 * layout.margin_x))
        .max(1);
    let text_room = max_box_width.saturating_sub(layout.accent_width + 2 * layout.padding);
    let chars_for = |font: u32| {
        ((text_room as f64 / (font as f64 * CHAR_WIDTH_RATIO)).floor() as usize).max(1)
    };
    let name_chars = chars_for(layout.name_font);
    let detail_chars = chars_for(layout.detail_font);

    let mut filters = Vec::new();
    for segment in calculate_speaker_display_segments(utterances, mode)
        .into_iter()
        .filter(|s| s.show_overlay && s.end_timestamp > s.start_timestamp)
    {
        let info = &segment.speaker;
        let enable = enable_between(segment.start_timestamp, segment.end_timestamp);

        let details: Vec<String> = [info.role.as_deref(), info.party.as_deref()]
            .into_iter()
            .flatten()
            .flat_map(|line| fit_lines(line, detail_chars, None))
            .collect();
        let name_lines = fit_lines(&info.name, name_chars, Some(MAX_NAME_LINES));

        let content_width = text_width(longest(&name_lines), layout.name_font)
            .max(text_width(longest(&details), layout.detail_font));
        let box_width =
            (layout.accent_width + 2 * layout.padding + content_width).min(max_box_width);

        let name_height = block_height(name_lines.len() as u32, layout.name_font, layout.line_spacing);
        let detail_height = match block_height(details.len() as u32, layout.detail_font, layout.line_spacing) {
            0 => 0,
            h => layout.line_spacing + h,
        };
        let box_height = 2 * layout.padding + name_height + detail_height;

        let text_x = layout.margin_x + layout.accent_width + layout.padding;
        let name_y = layout.margin_y + layout.padding;

        filters.push(
            Filter::new("drawbox")
                .arg("x", layout.margin_x)
                .arg("y", layout.margin_y)
                .arg("w", box_width)
                .arg("h", box_height)
                .arg("color", BACKGROUND_COLOR)
                .arg("t", "fill")
                .value("enable", enable.clone()),
        );

        if let Some(color) = &info.color {
            filters.push(
                Filter::new("drawbox")
                    .arg("x", layout.margin_x)
                    .arg("y", layout.margin_y)
                    .arg("w", layout.accent_width)
                    .arg("h", box_height)
                    .arg("color", color.to_ffmpeg())
                    .arg("t", "fill")
                    .value("enable", enable.clone()),
            );
        }

        filters.push(
            Filter::new("drawtext")
                .value_opt("fontfile", fonts.bold_value())
                .value("text", FilterValue::Text(name_lines.join(LINE_BREAK)))
                .arg("fontsize", layout.name_font)
                .arg("fontcolor", NAME_COLOR)
                .arg("line_spacing", layout.line_spacing)
                .arg("x", text_x)
                .arg("y", name_y)
                .value("enable", enable.clone()),
        );

        if !details.is_empty() {
            filters.push(
                Filter::new("drawtext")
                    .value_opt("fontfile", fonts.regular_value())
                    .value("text", FilterValue::Text(details.join(LINE_BREAK)))
                    .arg("fontsize", layout.detail_font)
                    .arg("fontcolor", DETAIL_COLOR)
                    .arg("line_spacing", layout.line_spacing)
                    .arg("x", text_x)
                    .arg("y", name_y + name_height + layout.line_spacing)
                    .value("enable", enable),
            );
        }
    }

    if filters.is_empty() {
        return None;
    }

    Some(FilterFragment::new(
        Stage::SpeakerOverlay,
        vec![FilterChain::simple(filters)],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::get_preset_config;
    use hilite_models::{AspectRatio, CaptionStyle, Utterance};

    fn said(id: Option<&str>, start: f64, end: f64) -> NormalizedUtterance {
        let mut utterance = Utterance::new("text", start, end);
        if let Some(id) = id {
            utterance = utterance.with_speaker(
                Speaker::new(id, format!("Speaker {id}"))
                    .with_role("Councillor")
                    .with_party("Green", Some("#00aa44")),
            );
        }
        NormalizedUtterance {
            utterance,
            normalized_start: start,
            normalized_end: end,
        }
    }

    fn preset() -> PresetConfig {
        get_preset_config("1280x720", AspectRatio::Default, CaptionStyle::Classic)
    }

    #[test]
    fn test_format_missing_speaker() {
        let info = format_speaker_info(None);
        assert_eq!(info.name, UNKNOWN_SPEAKER);
        assert!(info.role.is_none() && info.color.is_none());
    }

    #[test]
    fn test_format_drops_invalid_colour() {
        let speaker = Speaker::new("s", "Ada").with_party("Indep.", Some("not-a-colour"));
        let info = format_speaker_info(Some(&speaker));
        assert_eq!(info.party.as_deref(), Some("Indep."));
        assert!(info.color.is_none());
    }

    #[test]
    fn test_display_segments_on_speaker_change() {
        let utterances = vec![
            said(Some("a"), 0.0, 1.0),
            said(Some("a"), 1.0, 2.0),
            said(Some("b"), 2.0, 3.0),
        ];
        let flags: Vec<bool> =
            calculate_speaker_display_segments(&utterances, SpeakerOverlayMode::OnSpeakerChange)
                .iter()
                .map(|s| s.show_overlay)
                .collect();
        assert_eq!(flags, vec![true, false, true]);

        let always: Vec<bool> =
            calculate_speaker_display_segments(&utterances, SpeakerOverlayMode::Always)
                .iter()
                .map(|s| s.show_overlay)
                .collect();
        assert_eq!(always, vec![true, true, true]);
    }

    #[test]
    fn test_display_segments_empty() {
        assert!(calculate_speaker_display_segments(&[], SpeakerOverlayMode::Always).is_empty());
    }

    #[test]
    fn test_unknown_speakers_count_as_same() {
        let utterances = vec![said(None, 0.0, 1.0), said(None, 1.0, 2.0), said(Some("a"), 2.0, 3.0)];
        let flags: Vec<bool> =
            calculate_speaker_display_segments(&utterances, SpeakerOverlayMode::OnSpeakerChange)
                .iter()
                .map(|s| s.show_overlay)
                .collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn test_wrap_speaker_text_keeps_long_word_whole() {
        assert_eq!(
            wrap_speaker_text("Parliamentary Undersecretary", 10),
            vec!["Parliamentary", "Undersecretary"]
        );
    }

    #[test]
    fn test_overlay_elements_are_timed() {
        let utterances = vec![said(Some("a"), 0.0, 2.5), said(Some("a"), 2.5, 4.0)];
        let fragment = generate_speaker_overlay_filter(
            &utterances,
            SpeakerOverlayMode::OnSpeakerChange,
            &preset(),
            &FontSet::default(),
        )
        .unwrap();
        let text = fragment.render("in", "out");

        // background, accent, name, details for the single visible segment
        assert_eq!(fragment.filter_count(), 4);
        assert!(text.starts_with("[in]drawbox=x=40:y=40:"));
        assert!(text.contains("color=0x00AA44"));
        assert!(text.contains("text='Speaker a'"));
        assert!(text.contains("Councillor\nGreen"));
        assert!(text.contains("enable='gte(t,0.000)*lt(t,2.500)'"));
        assert!(!text.contains("gte(t,2.500)"));
        assert!(text.ends_with("[out]"));
    }

    #[test]
    fn test_overlay_without_party_colour_has_no_accent() {
        let mut utterance = said(None, 0.0, 1.0);
        utterance.utterance.speaker = Some(Speaker::new("x", "Bo"));
        let fragment = generate_speaker_overlay_filter(
            &[utterance],
            SpeakerOverlayMode::Always,
            &preset(),
            &FontSet::default(),
        )
        .unwrap();
        assert_eq!(fragment.filter_count(), 2);
    }

    #[test]
    fn test_overlay_uses_font_files() {
        let fonts = FontSet {
            regular: Some("/fonts/Inter-Regular.ttf".to_string()),
            bold: Some("/fonts/Inter-Bold.ttf".to_string()),
        };
        let fragment = generate_speaker_overlay_filter(
            &[said(Some("a"), 0.0, 1.0)],
            SpeakerOverlayMode::Always,
            &preset(),
            &fonts,
        )
        .unwrap();
        let text = fragment.render("in", "out");
        assert!(text.contains("fontfile='/fonts/Inter-Bold.ttf'"));
        assert!(text.contains("fontfile='/fonts/Inter-Regular.ttf'"));
    }

    #[test]
    fn test_no_utterances_no_overlay() {
        assert!(generate_speaker_overlay_filter(
            &[],
            SpeakerOverlayMode::Always,
            &preset(),
            &FontSet::default()
        )
        .is_none());
    }

    #[test]
    fn test_fit_lines_shortens_overflow() {
        assert_eq!(fit_lines("Ann Lee", 10, Some(2)), vec!["Ann Lee"]);
        assert_eq!(fit_lines("Wolfeschlegelsteinhausen", 10, None), vec!["Wolfesc..."]);
        assert_eq!(
            fit_lines("one two three four five six", 9, Some(2)),
            vec!["one two", "three..."]
        );
    }

    #[test]
    fn test_long_name_stays_inside_box() {
        let long_name = "Wolfeschlegelsteinhausenbergerdorff-Rosenkranz Featherstonehaugh";
        let mut utterance = said(None, 0.0, 1.0);
        utterance.utterance.speaker = Some(Speaker::new("x", long_name));
        let text = generate_speaker_overlay_filter(
            &[utterance],
            SpeakerOverlayMode::Always,
            &preset(),
            &FontSet::default(),
        )
        .unwrap()
        .render("in", "out");

        // 1280 wide: box capped at 576px, 540px of text room, 30 chars at 30px
        assert!(text.contains("w=576"));
        assert!(!text.contains(long_name));
        assert!(text.contains("text='Wolfeschlegelsteinhausenber...\nFeatherstonehaugh'"));
        // name block of two 30px lines
        assert!(text.contains("h=95"));
    }
}
