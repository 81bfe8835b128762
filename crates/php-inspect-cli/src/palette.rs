//! Terminal colouring, decided once at startup and passed down explicitly.

use clap::ValueEnum;
use owo_colors::OwoColorize;

/// `--color` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Colour when writing to a terminal.
    #[default]
    Auto,
    /// Always colour, even when redirected.
    Always,
    /// Never colour.
    Never,
}

/// How text is styled for one output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    /// Text passes through unchanged.
    Plain,
    /// Text is wrapped in ANSI escape codes.
    Ansi,
}

impl Palette {
    /// Pick the palette for a stream from the `--color` setting.
    pub fn resolve(choice: ColorChoice, is_terminal: bool) -> Self {
        match choice {
            ColorChoice::Always => Palette::Ansi,
            ColorChoice::Auto if is_terminal => Palette::Ansi,
            ColorChoice::Auto | ColorChoice::Never => Palette::Plain,
        }
    }

    /// Style an error label.
    pub fn error(self, text: &str) -> String {
        match self {
            Palette::Plain => text.to_owned(),
            Palette::Ansi => text.red().bold().to_string(),
        }
    }

    /// Style a warning label.
    pub fn warning(self, text: &str) -> String {
        match self {
            Palette::Plain => text.to_owned(),
            Palette::Ansi => text.yellow().bold().to_string(),
        }
    }

    fn key(self, text: &str) -> String {
        match self {
            Palette::Plain => text.to_owned(),
            Palette::Ansi => text.cyan().to_string(),
        }
    }

    /// Style the key of every `key: value` or `key:` line of a report.
    ///
    /// A key that itself contains `": "` is only styled up to that point.
    pub fn report(self, report: &str) -> String {
        if self == Palette::Plain {
            return report.to_owned();
        }

        let mut out = String::with_capacity(report.len() * 2);
        for line in report.split_inclusive('\n') {
            let body = line.trim_end_matches('\n');
            let indent = body.len() - body.trim_start_matches(' ').len();
            let (pad, rest) = body.split_at(indent);
            out.push_str(pad);
            match rest.split_once(": ") {
                Some((key, value)) => {
                    out.push_str(&self.key(key));
                    out.push_str(": ");
                    out.push_str(value);
                }
                None => match rest.strip_suffix(':') {
                    Some(key) => {
                        out.push_str(&self.key(key));
                        out.push(':');
                    }
                    None => out.push_str(rest),
                },
            }
            if line.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}
