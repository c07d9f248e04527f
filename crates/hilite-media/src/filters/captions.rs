//! Burned-in captions.

use hilite_models::{CaptionStyle, NormalizedUtterance};

use super::graph::{Filter, FilterChain, FilterFragment, FilterValue, Stage};
use super::{enable_between, FontSet};
use crate::presets::PresetConfig;
use crate::text_layout::calculate_optimal_font_size_with_start_and_cap;

const TEXT_COLOR: &str = "white";
const BORDER_COLOR: &str = "black";
const BOX_COLOR: &str = "black@0.45";
const BORDER_WIDTH: u32 = 2;

/// One bottom-centred drawtext per utterance, or `None` if there is no text.
pub fn generate_caption_filters(
    utterances: &[NormalizedUtterance],
    preset: &PresetConfig,
    style: CaptionStyle,
    fonts: &FontSet,
) -> Option<FilterFragment> {
    let layout = preset.caption;
    let available_width = layout.available_width(preset.dimensions.width);
    let fontfile = match style {
        CaptionStyle::Classic => fonts.regular_value(),
        CaptionStyle::Bold => fonts.bold_value(),
    };

    let filters: Vec<Filter> = utterances
        .iter()
        .filter(|u| !u.text().trim().is_empty() && u.normalized_end > u.normalized_start)
        .map(|u| {
            let fitted = calculate_optimal_font_size_with_start_and_cap(
                u.text().trim(),
                style,
                layout.start_font,
                layout.max_font,
                layout.min_font,
                available_width,
                Some(layout.max_lines),
            );

            Filter::new("drawtext")
                .value_opt("fontfile", fontfile.clone())
                .value("text", FilterValue::Text(fitted.wrapped_text))
                .arg("fontsize", fitted.font_size)
                .arg("fontcolor", TEXT_COLOR)
                .arg("borderw", BORDER_WIDTH)
                .arg("bordercolor", BORDER_COLOR)
                .arg("box", 1)
                .arg("boxcolor", BOX_COLOR)
                .arg("boxborderw", layout.box_padding)
                .arg("x", "(w-text_w)/2")
                .arg("y", format!("h-text_h-{}", layout.bottom_margin))
                .value("enable", enable_between(u.normalized_start, u.normalized_end))
        })
        .collect();

    if filters.is_empty() {
        return None;
    }

    Some(FilterFragment::new(
        Stage::Captions,
        vec![FilterChain::simple(filters)],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::get_preset_config;
    use hilite_models::{AspectRatio, Utterance};

    fn line(text: &str, start: f64, end: f64) -> NormalizedUtterance {
        NormalizedUtterance {
            utterance: Utterance::new(text, start + 100.0, end + 100.0),
            normalized_start: start,
            normalized_end: end,
        }
    }

    fn preset() -> PresetConfig {
        get_preset_config("1280x720", AspectRatio::Default, CaptionStyle::Classic)
    }

    #[test]
    fn test_one_drawtext_per_utterance() {
        let utterances = vec![line("Good evening.", 0.0, 1.5), line("Let's begin: item 4", 1.5, 3.0)];
        let fragment =
            generate_caption_filters(&utterances, &preset(), CaptionStyle::Classic, &FontSet::default())
                .unwrap();
        assert_eq!(fragment.stage, Stage::Captions);
        assert_eq!(fragment.filter_count(), 2);

        let text = fragment.render("v2", "vout");
        assert!(text.starts_with("[v2]drawtext=text='Good evening.':fontsize=40:"));
        assert!(text.contains("text='Let\u{2019}s begin\\: item 4'"));
        assert!(text.contains("y=h-text_h-48"));
        assert!(text.contains("enable='gte(t,1.500)*lt(t,3.000)'"));
        assert!(text.ends_with("[vout]"));
    }

    #[test]
    fn test_blank_utterances_are_skipped() {
        let utterances = vec![line("   ", 0.0, 1.0)];
        assert!(generate_caption_filters(
            &utterances,
            &preset(),
            CaptionStyle::Classic,
            &FontSet::default()
        )
        .is_none());
    }

    #[test]
    fn test_long_text_is_wrapped_within_frame() {
        let long = "and so the committee resolved, after a lengthy and occasionally heated debate, \
                    to defer the matter until the next regular session of the full council";
        let fragment = generate_caption_filters(
            &[line(long, 0.0, 6.0)],
            &preset(),
            CaptionStyle::Bold,
            &FontSet::default(),
        )
        .unwrap();
        let text = fragment.render("in", "out");
        assert!(text.contains('\n'));
        assert!(text.contains("..."));
    }

    #[test]
    fn test_bold_prefers_bold_font() {
        let fonts = FontSet {
            regular: Some("/f/regular.ttf".to_string()),
            bold: Some("/f/bold.ttf".to_string()),
        };
        let bold = generate_caption_filters(&[line("Hi", 0.0, 1.0)], &preset(), CaptionStyle::Bold, &fonts)
            .unwrap()
            .render("in", "out");
        assert!(bold.contains("fontfile='/f/bold.ttf'"));
        let classic =
            generate_caption_filters(&[line("Hi", 0.0, 1.0)], &preset(), CaptionStyle::Classic, &fonts)
                .unwrap()
                .render("in", "out");
        assert!(classic.contains("fontfile='/f/regular.ttf'"));
    }
}
