//! Portrait (9:16) reformat of landscape sources.

use hilite_models::{MarginType, SocialOptions};

use super::graph::{Filter, FilterChain, FilterFragment, Pad, Stage};
use crate::presets::Dimensions;

/// Gaussian blur strength of the fill background.
const BACKGROUND_BLUR_SIGMA: u32 = 30;

/// Round down to an even pixel count, at least 2.
fn even(value: f64) -> u32 {
    let v = (value + 1e-6).floor().max(2.0) as u32;
    v - (v % 2)
}

fn foreground_scale(frame: Dimensions, zoom: f64) -> Filter {
    Filter::new("scale")
        .pos(even(frame.width as f64 * zoom))
        .pos(even(frame.height as f64 * zoom))
        .arg("force_original_aspect_ratio", "decrease")
        .arg("force_divisible_by", 2)
}

/// Build the aspect stage for a portrait `frame`.
///
/// `blur` fills the frame with a blurred copy of the source and centres the
/// scaled source over it; `solid` pads the scaled source with a flat colour.
pub fn generate_social_filter(options: &SocialOptions, frame: Dimensions) -> FilterFragment {
    let zoom = options.effective_zoom();
    let (w, h) = (frame.width, frame.height);

    let chains = match options.margin_type {
        MarginType::Blur => vec![
            FilterChain::new(
                vec![Pad::Input],
                vec![Filter::new("split").pos(2)],
                vec![Pad::link("bg"), Pad::link("fg")],
            ),
            FilterChain::new(
                vec![Pad::link("bg")],
                vec![
                    Filter::new("scale")
                        .pos(w)
                        .pos(h)
                        .arg("force_original_aspect_ratio", "increase"),
                    Filter::new("crop").pos(w).pos(h),
                    Filter::new("gblur").arg("sigma", BACKGROUND_BLUR_SIGMA),
                ],
                vec![Pad::link("bgblur")],
            ),
            FilterChain::new(
                vec![Pad::link("fg")],
                vec![foreground_scale(frame, zoom)],
                vec![Pad::link("fgs")],
            ),
            FilterChain::new(
                vec![Pad::link("bgblur"), Pad::link("fgs")],
                vec![
                    Filter::new("overlay").pos("(W-w)/2").pos("(H-h)/2"),
                    Filter::new("setdar").pos("9/16"),
                ],
                vec![Pad::Output],
            ),
        ],
        MarginType::Solid => vec![FilterChain::simple(vec![
            foreground_scale(frame, zoom),
            Filter::new("pad")
                .pos(w)
                .pos(h)
                .pos("(ow-iw)/2")
                .pos("(oh-ih)/2")
                .arg("color", options.background_color.to_ffmpeg()),
            Filter::new("setsar").pos(1),
            Filter::new("setdar").pos("9/16"),
        ])],
    };

    FilterFragment::new(Stage::Aspect, chains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hilite_models::HexColor;

    const PORTRAIT: Dimensions = Dimensions::new(720, 1280);

    #[test]
    fn test_blur_layout() {
        let fragment = generate_social_filter(&SocialOptions::default(), PORTRAIT);
        assert_eq!(
            fragment.render("0:v", "vout"),
            "[0:v]split=2[aspect_bg][aspect_fg];\
             [aspect_bg]scale=720:1280:force_original_aspect_ratio=increase,crop=720:1280,gblur=sigma=30[aspect_bgblur];\
             [aspect_fg]scale=720:1280:force_original_aspect_ratio=decrease:force_divisible_by=2[aspect_fgs];\
             [aspect_bgblur][aspect_fgs]overlay=(W-w)/2:(H-h)/2,setdar=9/16[vout]"
        );
    }

    #[test]
    fn test_solid_uses_background_colour_and_zoom() {
        let options = SocialOptions {
            margin_type: MarginType::Solid,
            background_color: "#1a2b3c".parse::<HexColor>().unwrap(),
            zoom_factor: 0.8,
        };
        let text = generate_social_filter(&options, PORTRAIT).render("in", "out");
        assert_eq!(
            text,
            "[in]scale=576:1024:force_original_aspect_ratio=decrease:force_divisible_by=2,\
             pad=720:1280:(ow-iw)/2:(oh-ih)/2:color=0x1A2B3C,setsar=1,setdar=9/16[out]"
        );
    }

    #[test]
    fn test_zoom_outside_band_is_clamped() {
        let options = SocialOptions {
            margin_type: MarginType::Solid,
            zoom_factor: 0.1,
            ..Default::default()
        };
        let text = generate_social_filter(&options, PORTRAIT).render("in", "out");
        // 0.6 * 720 = 432, 0.6 * 1280 = 768
        assert!(text.starts_with("[in]scale=432:768:"));
    }

    #[test]
    fn test_even_rounding() {
        assert_eq!(even(575.9), 574);
        assert_eq!(even(1.0), 2);
        assert_eq!(even(1024.0), 1024);
    }
}
