//! Event-driven construction of configuration trees.
//!
//! The YAML event stream from `yaml-rust2` still carries scalar styles and
//! tags, which a finished `serde_yaml::Value` no longer does. Nodes are built
//! bottom-up from those events so every tag handler sees already-resolved
//! children, and implicit `${VAR}` resolution is limited to plain, untagged
//! scalars. Quoted scalars and `!!str` scalars stay literal.

use super::loader::{LoaderOptions, node_kind};
use crate::error::{ConfigError, ConfigResult};
use crate::paths::{PathResolver, matches_path_pattern};
use regex_lite::Regex;
use serde_yaml::{Mapping, Number, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Handle the parser expands `!!` to.
const CORE_SCHEMA: &str = "tag:yaml.org,2002:";

static FLOAT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?$")
        .expect("float pattern is valid")
});

/// A node tag, classified against the loader's handlers.
enum NodeTag {
    Path,
    Join,
    /// Secondary handle, e.g. `!!str` or `!!map`.
    Core(String),
    Unknown(String),
}

enum Frame {
    Sequence {
        anchor: usize,
        tag: Option<NodeTag>,
        items: Vec<Value>,
    },
    Mapping {
        anchor: usize,
        tag: Option<NodeTag>,
        entries: Mapping,
        key: Option<Value>,
    },
}

/// Receives parser events for one document and builds its resolved tree.
pub(crate) struct TreeBuilder<'a> {
    options: &'a LoaderOptions,
    resolver: &'a PathResolver,
    origin: Option<&'a Path>,
    stack: Vec<Frame>,
    anchors: HashMap<usize, Value>,
    root: Option<Value>,
    error: Option<ConfigError>,
}

impl<'a> TreeBuilder<'a> {
    pub(crate) fn new(
        options: &'a LoaderOptions,
        resolver: &'a PathResolver,
        origin: Option<&'a Path>,
    ) -> Self {
        Self {
            options,
            resolver,
            origin,
            stack: Vec::new(),
            anchors: HashMap::new(),
            root: None,
            error: None,
        }
    }

    /// The document root; an empty stream yields null.
    ///
    /// A construction error wins over a later scanner error, since it was
    /// raised earlier in the stream.
    pub(crate) fn finish<E: std::fmt::Display>(
        mut self,
        scanned: Result<(), E>,
    ) -> ConfigResult<Value> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        scanned.map_err(|err| self.parse_error(err.to_string()))?;
        Ok(self.root.unwrap_or(Value::Null))
    }

    fn parse_error(&self, message: String) -> ConfigError {
        ConfigError::Parse {
            path: self.origin.map(Path::to_path_buf),
            message,
        }
    }

    fn handle(&mut self, event: Event, marker: Marker) -> ConfigResult<()> {
        match event {
            Event::Scalar(text, style, anchor, tag) => {
                let tag = self.classify(tag);
                let value = self.scalar(text.into(), style, tag)?;
                self.complete(anchor, value);
            }
            Event::SequenceStart(anchor, tag) => {
                let tag = self.classify(tag);
                self.stack.push(Frame::Sequence {
                    anchor,
                    tag,
                    items: Vec::new(),
                });
            }
            Event::SequenceEnd => match self.stack.pop() {
                Some(Frame::Sequence { anchor, tag, items }) => {
                    let value = self.sequence(tag, items)?;
                    self.complete(anchor, value);
                }
                _ => return Err(self.unbalanced(marker)),
            },
            Event::MappingStart(anchor, tag) => {
                let tag = self.classify(tag);
                self.stack.push(Frame::Mapping {
                    anchor,
                    tag,
                    entries: Mapping::new(),
                    key: None,
                });
            }
            Event::MappingEnd => match self.stack.pop() {
                Some(Frame::Mapping {
                    anchor,
                    tag,
                    entries,
                    ..
                }) => {
                    let value = self.mapping(tag, entries)?;
                    self.complete(anchor, value);
                }
                _ => return Err(self.unbalanced(marker)),
            },
            Event::Alias(anchor) => {
                // Anchors are registered once their node is complete, so an
                // alias inside its own anchored node is not found here.
                let value = self.anchors.get(&anchor).cloned().ok_or_else(|| {
                    self.parse_error(format!(
                        "recursive alias at line {} column {}",
                        marker.line(),
                        marker.col()
                    ))
                })?;
                self.push(value);
            }
            _ => {}
        }
        Ok(())
    }

    fn unbalanced(&self, marker: Marker) -> ConfigError {
        self.parse_error(format!(
            "unbalanced collection end at line {} column {}",
            marker.line(),
            marker.col()
        ))
    }

    fn classify(&self, tag: Option<Tag>) -> Option<NodeTag> {
        let Tag { handle, suffix } = tag?;
        Some(match handle.as_str() {
            "!" if suffix == self.options.path_tag => NodeTag::Path,
            "!" if suffix == self.options.join_tag => NodeTag::Join,
            "!!" | CORE_SCHEMA => NodeTag::Core(suffix),
            _ => NodeTag::Unknown(format!("{handle}{suffix}")),
        })
    }

    fn scalar(
        &self,
        text: String,
        style: TScalarStyle,
        tag: Option<NodeTag>,
    ) -> ConfigResult<Value> {
        match tag {
            None if style != TScalarStyle::Plain => Ok(Value::String(text)),
            None if self.options.implicit_paths && matches_path_pattern(&text) => {
                Ok(Value::String(self.resolver.interpolate(&text)?))
            }
            None => Ok(resolve_plain(&text)),
            Some(NodeTag::Path) => Ok(Value::String(self.resolver.interpolate(&text)?)),
            Some(NodeTag::Join) => Err(ConfigError::wrong_node_type(
                &self.options.join_tag,
                "sequence",
                "scalar",
            )),
            Some(NodeTag::Core(suffix)) => match suffix.as_str() {
                "str" => Ok(Value::String(text)),
                "null" | "bool" | "int" | "float" => Ok(resolve_plain(&text)),
                _ => Err(unknown_core(&suffix)),
            },
            Some(NodeTag::Unknown(tag)) => Err(ConfigError::UnknownTag { tag }),
        }
    }

    fn sequence(&self, tag: Option<NodeTag>, items: Vec<Value>) -> ConfigResult<Value> {
        match tag {
            None => Ok(Value::Sequence(items)),
            Some(NodeTag::Join) => self.join(items),
            Some(NodeTag::Path) => Err(ConfigError::wrong_node_type(
                &self.options.path_tag,
                "scalar",
                "sequence",
            )),
            Some(NodeTag::Core(suffix)) if suffix == "seq" => Ok(Value::Sequence(items)),
            Some(NodeTag::Core(suffix)) => Err(unknown_core(&suffix)),
            Some(NodeTag::Unknown(tag)) => Err(ConfigError::UnknownTag { tag }),
        }
    }

    fn mapping(&self, tag: Option<NodeTag>, entries: Mapping) -> ConfigResult<Value> {
        match tag {
            None => Ok(Value::Mapping(entries)),
            Some(NodeTag::Path) => Err(ConfigError::wrong_node_type(
                &self.options.path_tag,
                "scalar",
                "mapping",
            )),
            Some(NodeTag::Join) => Err(ConfigError::wrong_node_type(
                &self.options.join_tag,
                "sequence",
                "mapping",
            )),
            Some(NodeTag::Core(suffix)) if suffix == "map" => Ok(Value::Mapping(entries)),
            Some(NodeTag::Core(suffix)) => Err(unknown_core(&suffix)),
            Some(NodeTag::Unknown(tag)) => Err(ConfigError::UnknownTag { tag }),
        }
    }

    /// Items are already constructed, so nested tags and aliases arrive resolved.
    fn join(&self, items: Vec<Value>) -> ConfigResult<Value> {
        let segments = items
            .into_iter()
            .map(|item| match item {
                Value::String(segment) => Ok(segment),
                other => Err(ConfigError::wrong_node_type(
                    &self.options.join_tag,
                    "sequence of strings",
                    node_kind(&other),
                )),
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Value::String(self.resolver.join(&segments)?))
    }

    fn complete(&mut self, anchor: usize, value: Value) {
        if anchor != 0 {
            self.anchors.insert(anchor, value.clone());
        }
        self.push(value);
    }

    fn push(&mut self, value: Value) {
        match self.stack.last_mut() {
            None => self.root = Some(value),
            Some(Frame::Sequence { items, .. }) => items.push(value),
            Some(Frame::Mapping { entries, key, .. }) => match key.take() {
                Some(key) => {
                    entries.insert(key, value);
                }
                None => *key = Some(value),
            },
        }
    }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, event: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.handle(event, marker) {
            self.error = Some(err);
        }
    }
}

fn unknown_core(suffix: &str) -> ConfigError {
    ConfigError::UnknownTag {
        tag: format!("!!{suffix}"),
    }
}

/// Core schema resolution of a plain scalar: null, bool, int, float, else string.
fn resolve_plain(text: &str) -> Value {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => return Value::Null,
        "true" | "True" | "TRUE" => return Value::Bool(true),
        "false" | "False" | "FALSE" => return Value::Bool(false),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
            return Value::Number(Number::from(f64::INFINITY));
        }
        "-.inf" | "-.Inf" | "-.INF" => return Value::Number(Number::from(f64::NEG_INFINITY)),
        ".nan" | ".NaN" | ".NAN" => return Value::Number(Number::from(f64::NAN)),
        _ => {}
    }
    if let Some(number) = parse_int(text) {
        return Value::Number(number);
    }
    match text.parse::<f64>() {
        Ok(float) if FLOAT_PATTERN.is_match(text) => Value::Number(Number::from(float)),
        _ => Value::String(text.to_string()),
    }
}

fn parse_int(text: &str) -> Option<Number> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, digits) = if let Some(hex) = unsigned.strip_prefix("0x") {
        (16, hex)
    } else if let Some(octal) = unsigned.strip_prefix("0o") {
        (8, octal)
    } else {
        (10, unsigned)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    if negative {
        i64::from_str_radix(&format!("-{digits}"), radix)
            .ok()
            .map(Number::from)
    } else {
        u64::from_str_radix(digits, radix).ok().map(Number::from)
    }
}
