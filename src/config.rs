//! Filter configuration document.
//!
//! The document is line-oriented. A `***Name***` line opens a section, and
//! inside the `Styles` section a `###Name###` line opens a named style block:
//!
//! ```text
//! ***FilePath***
//! C:\Users\me\Documents\My Games\Path of Exile\auto.filter
//! ***League***
//! Standard
//! ***Sub1cMult***
//! 0.5
//! ***Override***
//! <copied verbatim into the filter>
//! ***Styles***
//! ###Divine###
//! SetFontSize 45
//! ```
//!
//! Parsing never fails on content. Lines that cannot be used are dropped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_PRICE_MULTIPLIER: f64 = 1.0;

const SECTION_FENCE: &str = "***";
const STYLE_FENCE: &str = "###";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write default config file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The filter file that gets rewritten.
    pub file_path: String,
    /// Market league the prices are fetched for.
    pub league: String,
    /// Scales the stack size threshold of the sub 1 chaos tier.
    pub price_multiplier: f64,
    /// Item names containing any of these are left out of the generated rules.
    pub excluded_names: Vec<String>,
    /// Written verbatim ahead of the generated rules.
    pub override_text: String,
    /// Style name to style lines, each line newline-terminated.
    pub styles: BTreeMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_path: String::new(),
            league: String::new(),
            price_multiplier: DEFAULT_PRICE_MULTIPLIER,
            excluded_names: Vec::new(),
            override_text: String::new(),
            styles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Reads and parses the configuration document at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::parse(&content))
    }

    /// Parses a configuration document.
    pub fn parse(content: &str) -> Self {
        let mut parser = Parser::default();
        for line in content.lines() {
            parser.feed(line);
        }
        parser.finish()
    }

    /// Style lines registered under `name`, or none.
    pub fn style(&self, name: &str) -> &[String] {
        self.styles.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Writes the configuration back out as a document `parse` accepts.
    ///
    /// There is no escaping, so override or style lines that look like
    /// section headers will not survive the trip.
    pub fn render(&self) -> String {
        let mut out = String::new();

        push_section(&mut out, "FilePath");
        push_line(&mut out, &self.file_path);
        push_section(&mut out, "League");
        push_line(&mut out, &self.league);
        push_section(&mut out, "Sub1cMult");
        push_line(&mut out, &self.price_multiplier.to_string());

        push_section(&mut out, "ExcludeNames");
        for name in &self.excluded_names {
            push_line(&mut out, name);
        }

        push_section(&mut out, "Override");
        out.push_str(&self.override_text);
        if !self.override_text.is_empty() && !self.override_text.ends_with('\n') {
            out.push('\n');
        }

        push_section(&mut out, "Styles");
        for (name, lines) in &self.styles {
            out.push_str(&format!("{STYLE_FENCE}{name}{STYLE_FENCE}\n"));
            for line in lines {
                push_line(&mut out, line.trim_end_matches('\n'));
            }
        }

        out
    }

    /// The configuration written for first-time users.
    pub fn starter() -> Self {
        let style = |lines: &[&str]| -> Vec<String> {
            lines.iter().map(|line| format!("{line}\n")).collect()
        };

        let mut styles = BTreeMap::new();
        styles.insert(
            "Sub 1 Chaos".to_string(),
            style(&[
                "SetFontSize 45",
                "SetTextColor 0 0 0 255",
                "SetBorderColor 0 0 0 255",
                "SetBackgroundColor 213 159 0 255",
            ]),
        );
        styles.insert(
            "1 Chaos".to_string(),
            style(&[
                "SetFontSize 45",
                "SetTextColor 0 0 0 255",
                "SetBorderColor 0 0 0 255",
                "SetBackgroundColor 249 150 25 255",
                "PlayAlertSound 2 300",
                "PlayEffect White",
                "MinimapIcon 2 White Circle",
            ]),
        );
        styles.insert(
            "5 Chaos".to_string(),
            style(&[
                "SetFontSize 45",
                "SetTextColor 0 0 0 255",
                "SetBorderColor 0 0 0 255",
                "SetBackgroundColor 240 90 35 255",
                "PlayAlertSound 2 300",
                "PlayEffect Yellow",
                "MinimapIcon 1 Yellow Circle",
            ]),
        );
        styles.insert(
            "Exalted".to_string(),
            style(&[
                "SetFontSize 45",
                "SetTextColor 255 255 255 255",
                "SetBorderColor 255 255 255 255",
                "SetBackgroundColor 240 90 35 255",
                "PlayAlertSound 1 300",
                "PlayEffect Red",
                "MinimapIcon 0 Red Circle",
            ]),
        );
        styles.insert(
            "Divine".to_string(),
            style(&[
                "SetFontSize 45",
                "SetTextColor 255 0 0 255",
                "SetBorderColor 255 0 0 255",
                "SetBackgroundColor 255 255 255 255",
                "PlayAlertSound 6 300",
                "PlayEffect Red",
                "MinimapIcon 0 Red Star",
            ]),
        );

        Self {
            file_path: "Path\\To\\Your\\Filter.filter".to_string(),
            league: "Standard".to_string(),
            price_multiplier: DEFAULT_PRICE_MULTIPLIER,
            excluded_names: ["Muttering", "Whispering", "Weeping", "Wailing"]
                .map(String::from)
                .to_vec(),
            override_text: concat!(
                "#= Custom Override Block Start =\n",
                "Hide\n",
                "BaseType \"Muttering\" \"Whispering\" \"Weeping\" \"Wailing\" \"Divine Vessel\"\n",
                "#= Custom Override Block End =\n",
            )
            .to_string(),
            styles,
        }
    }
}

/// Writes the starter configuration to `path` unless a file is already there.
///
/// Returns true if a new file was written.
pub fn ensure_config_file(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }

    std::fs::write(path, Config::starter().render()).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Wrote a starter config file to {}", path.display());

    Ok(true)
}

fn push_section(out: &mut String, name: &str) {
    out.push_str(&format!("{SECTION_FENCE}{name}{SECTION_FENCE}\n"));
}

fn push_line(out: &mut String, line: &str) {
    if !line.is_empty() {
        out.push_str(line);
        out.push('\n');
    }
}

/// Returns the header name if `line` is fenced on both ends by `fence`.
fn header<'a>(line: &'a str, fence: &str) -> Option<&'a str> {
    let inner = line.strip_prefix(fence)?.strip_suffix(fence)?;
    Some(inner.trim_matches(|c: char| fence.contains(c)).trim())
}

/// Sections whose lines set a single configuration field.
#[derive(Debug, Clone, Copy)]
enum Field {
    FilePath,
    League,
    PriceMultiplier,
    ExcludeNames,
}

#[derive(Debug, Default)]
enum State {
    /// Before the first section header.
    #[default]
    Idle,
    Field(Field),
    /// A section nobody reads. Its lines are dropped.
    Ignored,
    Override(String),
    /// Inside `Styles`, before the first style header.
    Styles,
    StyleBlock {
        name: String,
        lines: Vec<String>,
    },
}

impl State {
    fn for_section(name: &str) -> Self {
        match name {
            "FilePath" => State::Field(Field::FilePath),
            "League" => State::Field(Field::League),
            "Sub1cMult" => State::Field(Field::PriceMultiplier),
            "ExcludeNames" => State::Field(Field::ExcludeNames),
            "Override" => State::Override(String::new()),
            "Styles" => State::Styles,
            other => {
                tracing::debug!("Ignoring unknown config section {other:?}");
                State::Ignored
            }
        }
    }

    fn in_styles(&self) -> bool {
        matches!(self, State::Styles | State::StyleBlock { .. })
    }
}

#[derive(Debug, Default)]
struct Parser {
    config: Config,
    state: State,
}

impl Parser {
    fn feed(&mut self, line: &str) {
        let line = line.trim_end_matches(['\r', ' ']);

        if let Some(name) = header(line, SECTION_FENCE) {
            self.flush();
            self.state = State::for_section(name);
            return;
        }

        if self.state.in_styles() {
            if let Some(name) = header(line, STYLE_FENCE) {
                self.flush();
                self.state = State::StyleBlock {
                    name: name.to_string(),
                    lines: Vec::new(),
                };
                return;
            }
        }

        match &mut self.state {
            State::Idle | State::Ignored | State::Styles => {}
            State::Field(field) => apply_field(&mut self.config, *field, line),
            State::Override(text) => {
                text.push_str(line);
                text.push('\n');
            }
            State::StyleBlock { lines, .. } => {
                if !line.is_empty() {
                    lines.push(format!("{line}\n"));
                }
            }
        }
    }

    /// Stores whatever the current state has accumulated and returns to idle.
    fn flush(&mut self) {
        match std::mem::take(&mut self.state) {
            State::Override(text) => self.config.override_text = text,
            State::StyleBlock { name, lines } if !lines.is_empty() => {
                self.config.styles.insert(name, lines);
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Config {
        self.flush();
        self.config
    }
}

fn apply_field(config: &mut Config, field: Field, line: &str) {
    if line.is_empty() {
        return;
    }

    match field {
        Field::FilePath => config.file_path = line.to_string(),
        Field::League => config.league = line.to_string(),
        Field::PriceMultiplier => match line.parse::<f64>() {
            Ok(multiplier) if multiplier.is_finite() => config.price_multiplier = multiplier,
            _ => tracing::debug!("Ignoring invalid Sub1cMult value {line:?}"),
        },
        Field::ExcludeNames => config.excluded_names.push(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path() {
        let config = Config::parse("***FilePath***\nfoo.txt\n");
        assert_eq!(config.file_path, "foo.txt");
        assert_eq!(config.price_multiplier, DEFAULT_PRICE_MULTIPLIER);
    }

    #[test]
    fn test_last_non_empty_line_wins() {
        let config = Config::parse("***League***\nSettlers\nStandard\n\n***FilePath***\n");
        assert_eq!(config.league, "Standard");
    }

    #[test]
    fn test_trailing_carriage_return_and_spaces() {
        let config = Config::parse("***League***  \r\nHardcore   \r\n");
        assert_eq!(config.league, "Hardcore");
    }

    #[test]
    fn test_invalid_multiplier_keeps_default() {
        let config = Config::parse("***Sub1cMult***\nnotanumber\n");
        assert_eq!(config.price_multiplier, 1.0);

        let config = Config::parse("***Sub1cMult***\n0.5\nNaN\ninf\n");
        assert_eq!(config.price_multiplier, 0.5);
    }

    #[test]
    fn test_style_block() {
        let config = Config::parse("***Styles***\n###X###\na\n\nb\n");
        assert_eq!(config.styles["X"], vec!["a\n".to_string(), "b\n".to_string()]);
    }

    #[test]
    fn test_empty_style_block_is_not_stored() {
        let config = Config::parse("***Styles***\n###Y###\n###X###\na\n");
        assert!(!config.styles.contains_key("Y"));
        assert_eq!(config.style("X"), ["a\n".to_string()]);
        assert!(config.style("Y").is_empty());
    }

    #[test]
    fn test_reopened_style_overwrites() {
        let config = Config::parse("***Styles***\n###X###\na\n###Z###\nz\n###X###\nb\nc\n");
        assert_eq!(config.style("X"), ["b\n".to_string(), "c\n".to_string()]);
        assert_eq!(config.style("Z"), ["z\n".to_string()]);
    }

    #[test]
    fn test_style_flushed_by_section_header() {
        let config = Config::parse("***Styles***\n###X###\na\n***League***\nStandard\n");
        assert_eq!(config.style("X"), ["a\n".to_string()]);
        assert_eq!(config.league, "Standard");
    }

    #[test]
    fn test_style_headers_outside_styles_section() {
        let config = Config::parse("***League***\n###X###\n");
        assert!(config.styles.is_empty());
        assert_eq!(config.league, "###X###");
    }

    #[test]
    fn test_override_accumulation() {
        let config = Config::parse("***Override***\nline1\n\nline2\n***FilePath***\nfoo\n");
        assert_eq!(config.override_text, "line1\n\nline2\n");
        assert_eq!(config.file_path, "foo");
    }

    #[test]
    fn test_override_flushed_at_end_of_input() {
        let config = Config::parse("***Override***\nShow\n###NotAStyle###\n");
        assert_eq!(config.override_text, "Show\n###NotAStyle###\n");
        assert!(config.styles.is_empty());
    }

    #[test]
    fn test_unknown_section_is_dropped() {
        let config = Config::parse("Stray\n***Whatever***\nfoo\n***League***\nStandard\n");
        assert_eq!(config.league, "Standard");
        assert_eq!(config.file_path, "");
        assert_eq!(config.override_text, "");
    }

    #[test]
    fn test_section_names_are_trimmed() {
        let config = Config::parse("*** FilePath ***\nfoo.txt\n*****League*****\nStandard\n");
        assert_eq!(config.file_path, "foo.txt");
        assert_eq!(config.league, "Standard");

        let config = Config::parse("***Styles***\n### X ###\na\n");
        assert_eq!(config.style("X"), ["a\n".to_string()]);
    }

    #[test]
    fn test_reentered_styles_drops_lines_before_header() {
        let config = Config::parse(
            "***Styles***\n###X###\na\n***League***\nS\n***Styles***\nstray\n###Y###\nb\n",
        );
        assert_eq!(config.style("X"), ["a\n".to_string()]);
        assert_eq!(config.style("Y"), ["b\n".to_string()]);
        assert_eq!(config.league, "S");
        assert!(
            config
                .styles
                .values()
                .flatten()
                .all(|line| line.as_str() != "stray\n")
        );
    }

    #[test]
    fn test_exclude_names() {
        let config = Config::parse("***ExcludeNames***\nMuttering\n\nWailing\n");
        assert_eq!(config.excluded_names, vec!["Muttering", "Wailing"]);
    }

    #[test]
    fn test_render_round_trip() {
        let config = Config::starter();
        let reparsed = Config::parse(&config.render());
        assert_eq!(reparsed, config);

        let styles_only = Config::parse("***Styles***\n###X###\na\nb\n");
        assert_eq!(Config::parse(&styles_only.render()).styles, styles_only.styles);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(&dir.path().join("missing.txt"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_ensure_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");

        assert!(ensure_config_file(&path).unwrap());
        assert_eq!(Config::load(&path).unwrap(), Config::starter());

        std::fs::write(&path, "***League***\nMine\n").unwrap();
        assert!(!ensure_config_file(&path).unwrap());
        assert_eq!(Config::load(&path).unwrap().league, "Mine");
    }
}
