//! Typed filter-graph records.
//!
//! Composers produce [`FilterFragment`]s; nothing is escaped or joined until
//! a [`ComposedGraph`] is serialized into `-filter_complex` text.

use serde::Serialize;
use std::fmt;

use crate::text_layout::escape_text_for_ffmpeg;

/// One filter option value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    /// Emitted verbatim (numbers, expressions already in filter syntax)
    Raw(String),
    /// Wrapped in single quotes, contents untouched
    Quoted(String),
    /// Drawtext text, escaped then quoted
    Text(String),
    /// File path, escaped then quoted
    Path(String),
}

impl FilterValue {
    pub fn raw(value: impl fmt::Display) -> Self {
        Self::Raw(value.to_string())
    }
}

/// Escape a filesystem path for use inside a quoted filter option.
///
/// The quotes are removed by the graph parser and the backslashes by the
/// option parser. A quote cannot appear inside quotes, so it closes the
/// quote, emits `\'` for the option parser and reopens.
pub fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'\\''")
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Raw(v) => f.write_str(v),
            FilterValue::Quoted(v) => write!(f, "'{}'", v),
            FilterValue::Text(v) => write!(f, "'{}'", escape_text_for_ffmpeg(v)),
            FilterValue::Path(v) => write!(f, "'{}'", escape_filter_path(v)),
        }
    }
}

/// A single filter invocation such as `scale=1280:720`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    pub name: String,
    /// Options in order; `None` keys are positional
    pub args: Vec<(Option<String>, FilterValue)>,
}

impl Filter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional option.
    pub fn pos(mut self, value: impl fmt::Display) -> Self {
        self.args.push((None, FilterValue::raw(value)));
        self
    }

    /// Append a `key=value` option emitted verbatim.
    pub fn arg(self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.value(key, FilterValue::raw(value))
    }

    /// Append a `key=value` option with an explicit value kind.
    pub fn value(mut self, key: impl Into<String>, value: FilterValue) -> Self {
        self.args.push((Some(key.into()), value));
        self
    }

    /// Append a `key=value` option only when `value` is present.
    pub fn value_opt(self, key: impl Into<String>, value: Option<FilterValue>) -> Self {
        match value {
            Some(value) => self.value(key, value),
            None => self,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (i, (key, value)) in self.args.iter().enumerate() {
            f.write_str(if i == 0 { "=" } else { ":" })?;
            if let Some(key) = key {
                write!(f, "{}=", key)?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

/// A pad attached to a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "label", rename_all = "snake_case")]
pub enum Pad {
    /// The stage's input stream
    Input,
    /// The stage's output stream
    Output,
    /// A label private to the fragment
    Link(String),
    /// A label used verbatim
    Named(String),
}

impl Pad {
    pub fn link(label: impl Into<String>) -> Self {
        Pad::Link(label.into())
    }
}

/// Filters applied in sequence between input and output pads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterChain {
    pub inputs: Vec<Pad>,
    pub filters: Vec<Filter>,
    pub outputs: Vec<Pad>,
}

impl FilterChain {
    pub fn new(inputs: Vec<Pad>, filters: Vec<Filter>, outputs: Vec<Pad>) -> Self {
        Self {
            inputs,
            filters,
            outputs,
        }
    }

    /// `[in]f1,f2,...[out]`
    pub fn simple(filters: Vec<Filter>) -> Self {
        Self::new(vec![Pad::Input], filters, vec![Pad::Output])
    }

    fn render(&self, stage: Stage, input: &str, output: &str) -> String {
        let pad = |p: &Pad| match p {
            Pad::Input => format!("[{}]", input),
            Pad::Output => format!("[{}]", output),
            Pad::Link(label) => format!("[{}_{}]", stage.as_str(), label),
            Pad::Named(label) => format!("[{}]", label),
        };

        let mut out = String::new();
        for p in &self.inputs {
            out.push_str(&pad(p));
        }
        let body: Vec<String> = self.filters.iter().map(ToString::to_string).collect();
        if body.is_empty() {
            out.push_str("null");
        } else {
            out.push_str(&body.join(","));
        }
        for p in &self.outputs {
            out.push_str(&pad(p));
        }
        out
    }
}

/// Which part of the visual pipeline a fragment implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    Aspect,
    SpeakerOverlay,
    Captions,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Aspect => "aspect",
            Stage::SpeakerOverlay => "speaker",
            Stage::Captions => "captions",
        }
    }
}

/// Chains produced by one composer, reading `Pad::Input` and writing `Pad::Output`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterFragment {
    pub stage: Stage,
    pub chains: Vec<FilterChain>,
}

impl FilterFragment {
    pub fn new(stage: Stage, chains: Vec<FilterChain>) -> Self {
        Self { stage, chains }
    }

    /// Serialize with concrete labels for the stage input and output.
    pub fn render(&self, input: &str, output: &str) -> String {
        self.chains
            .iter()
            .map(|c| c.render(self.stage, input, output))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Number of individual filters across all chains.
    pub fn filter_count(&self) -> usize {
        self.chains.iter().map(|c| c.filters.len()).sum()
    }
}

/// The visual stages of a render, one optional slot each.
///
/// Stages are always applied Aspect, then SpeakerOverlay, then Captions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComposedGraph {
    pub aspect: Option<FilterFragment>,
    pub overlay: Option<FilterFragment>,
    pub captions: Option<FilterFragment>,
}

impl ComposedGraph {
    /// Active fragments in application order.
    pub fn fragments(&self) -> impl Iterator<Item = &FilterFragment> {
        [&self.aspect, &self.overlay, &self.captions]
            .into_iter()
            .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments().next().is_none()
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.fragments().map(|f| f.stage).collect()
    }

    /// Join the active stages into one graph from `[input]` to `[output]`.
    ///
    /// Intermediate streams are labelled `v1`, `v2`, ... Returns `None`
    /// when no stage is active.
    pub fn serialize(&self, input: &str, output: &str) -> Option<String> {
        let fragments: Vec<&FilterFragment> = self.fragments().collect();
        if fragments.is_empty() {
            return None;
        }

        let last = fragments.len() - 1;
        let mut current = input.to_string();
        let mut parts = Vec::with_capacity(fragments.len());
        for (idx, fragment) in fragments.into_iter().enumerate() {
            let next = if idx == last {
                output.to_string()
            } else {
                format!("v{}", idx + 1)
            };
            parts.push(fragment.render(&current, &next));
            current = next;
        }
        Some(parts.join(";"))
    }
}
