//! Render plans: extraction ranges, filter graph and FFmpeg arguments.

use serde::Serialize;
use std::path::{Path, PathBuf};

use hilite_models::{EncodingConfig, MediaType, Segment, TimeSpan};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::filters::{ComposedGraph, Filter, FilterChain, FilterFragment, Pad, Stage};

/// Label of the final video stream in the graph.
const VIDEO_OUT: &str = "vout";
const VIDEO_CONCAT: &str = "vcat";
const AUDIO_CONCAT: &str = "acat";

/// Source ranges to pull into one output, in playback order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionPlan {
    pub segments: Vec<Segment>,
}

impl ExtractionPlan {
    /// Rejects an empty list and zero-length or inverted ranges.
    pub fn new(segments: Vec<Segment>) -> MediaResult<Self> {
        if segments.is_empty() {
            return Err(MediaError::invalid_plan("no segments to extract"));
        }
        if let Some(bad) = segments.iter().find(|s| !s.is_valid() || s.start_timestamp < 0.0) {
            return Err(MediaError::invalid_plan(format!(
                "invalid segment [{:.3}, {:.3}]",
                bad.start_timestamp, bad.end_timestamp
            )));
        }
        Ok(Self { segments })
    }

    /// Seconds of media in the output.
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(TimeSpan::duration).sum()
    }

    /// First start and last end on the source timeline.
    pub fn span(&self) -> (f64, f64) {
        let start = self.segments.first().map_or(0.0, |s| s.start_timestamp);
        let end = self.segments.last().map_or(0.0, |s| s.end_timestamp);
        (start, end)
    }

    pub fn is_single(&self) -> bool {
        self.segments.len() == 1
    }
}

/// Which elementary streams the source carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamLayout {
    pub has_video: bool,
    pub has_audio: bool,
}

impl Default for StreamLayout {
    fn default() -> Self {
        Self {
            has_video: true,
            has_audio: true,
        }
    }
}

/// A fully resolved FFmpeg invocation for one part.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan {
    pub input: PathBuf,
    pub output: PathBuf,
    pub media_type: MediaType,
    pub extraction: ExtractionPlan,
    /// Visual stages present in the graph, in order
    pub stages: Vec<Stage>,
    /// Arguments placed before `-i`
    pub input_args: Vec<String>,
    pub filter_complex: Option<String>,
    /// `-map` targets, video first
    pub maps: Vec<String>,
    /// Encoding arguments
    pub output_args: Vec<String>,
}

fn trim_chain(kind: &str, index: usize, segment: &Segment) -> FilterChain {
    let (source, trim, setpts, label) = if kind == "v" {
        ("0:v", "trim", "setpts", format!("v{}", index))
    } else {
        ("0:a", "atrim", "asetpts", format!("a{}", index))
    };
    FilterChain::new(
        vec![Pad::Named(source.to_string())],
        vec![
            Filter::new(trim)
                .arg("start", format!("{:.3}", segment.start_timestamp))
                .arg("end", format!("{:.3}", segment.end_timestamp)),
            Filter::new(setpts).pos("PTS-STARTPTS"),
        ],
        vec![Pad::Named(label)],
    )
}

/// `trim`/`atrim` each range and concatenate the results in order.
fn concat_fragment(segments: &[Segment], video: bool, audio: bool) -> FilterFragment {
    let mut chains = Vec::new();
    let mut concat_inputs = Vec::new();

    for (i, segment) in segments.iter().enumerate() {
        if video {
            chains.push(trim_chain("v", i, segment));
            concat_inputs.push(Pad::Named(format!("v{}", i)));
        }
        if audio {
            chains.push(trim_chain("a", i, segment));
            concat_inputs.push(Pad::Named(format!("a{}", i)));
        }
    }

    let mut outputs = Vec::new();
    if video {
        outputs.push(Pad::Named(VIDEO_CONCAT.to_string()));
    }
    if audio {
        outputs.push(Pad::Named(AUDIO_CONCAT.to_string()));
    }

    chains.push(FilterChain::new(
        concat_inputs,
        vec![Filter::new("concat")
            .arg("n", segments.len())
            .arg("v", u8::from(video))
            .arg("a", u8::from(audio))],
        outputs,
    ));

    FilterFragment::new(Stage::Extract, chains)
}

impl RenderPlan {
    /// Combine extraction, visual stages and encoding into one invocation.
    ///
    /// A single range is cut with input seeking; several ranges are trimmed
    /// and concatenated inside the graph. Visual stages are dropped for
    /// audio renders and for sources without video.
    pub fn compile(
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        extraction: ExtractionPlan,
        streams: StreamLayout,
        graph: &ComposedGraph,
        media_type: MediaType,
        encoding: &EncodingConfig,
    ) -> MediaResult<Self> {
        let video = media_type == MediaType::Video && streams.has_video;
        let audio = streams.has_audio;
        if !video && !audio {
            return Err(MediaError::invalid_plan(format!(
                "source has no stream usable for a {:?} render",
                media_type
            )));
        }

        let visual = if video { graph.clone() } else { ComposedGraph::default() };
        let mut input_args = Vec::new();
        let mut chains: Vec<String> = Vec::new();
        let mut maps = Vec::new();

        let (video_source, audio_map) = if extraction.is_single() {
            let (start, end) = extraction.span();
            input_args.extend(["-ss".to_string(), format!("{:.3}", start)]);
            input_args.extend(["-t".to_string(), format!("{:.3}", end - start)]);
            ("0:v", "0:a:0".to_string())
        } else {
            chains.push(concat_fragment(&extraction.segments, video, audio).render("", ""));
            (VIDEO_CONCAT, format!("[{}]", AUDIO_CONCAT))
        };

        if video {
            match visual.serialize(video_source, VIDEO_OUT) {
                Some(text) => {
                    chains.push(text);
                    maps.push(format!("[{}]", VIDEO_OUT));
                }
                None if extraction.is_single() => maps.push("0:v:0".to_string()),
                None => maps.push(format!("[{}]", VIDEO_CONCAT)),
            }
        }
        if audio {
            maps.push(audio_map);
        }

        let filter_complex = (!chains.is_empty()).then(|| chains.join(";"));

        Ok(Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            media_type,
            stages: visual.stages(),
            extraction,
            input_args,
            filter_complex,
            maps,
            output_args: encoding.to_ffmpeg_args(media_type),
        })
    }

    /// Expected output length in milliseconds, for progress reporting.
    pub fn expected_duration_ms(&self) -> i64 {
        (self.extraction.total_duration() * 1000.0).round() as i64
    }

    /// Build the FFmpeg command for this plan.
    pub fn to_command(&self) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(&self.input, &self.output);
        for arg in &self.input_args {
            cmd = cmd.input_arg(arg.clone());
        }
        if let Some(graph) = &self.filter_complex {
            cmd = cmd.filter_complex(graph.clone());
        }
        for map in &self.maps {
            cmd = cmd.map(map.clone());
        }
        cmd.output_args(self.output_args.iter().cloned())
    }
}
