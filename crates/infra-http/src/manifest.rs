//! Manifest-format response decoder for the legacy HTTP interface
//!
//! The body follows the JAR manifest syntax: `Key: value` lines, long values
//! wrapped onto continuation lines that start with one space, sections
//! separated by blank lines, and `Name:` opening a per-entry section. The main
//! section carries `exit-code`, `message` and an optional `children` list.
//! Values were percent-encoded twice by older servers, so every value is
//! decoded twice.

use glassadmin_core::domain::{ActionReport, ExitCode, MessagePart};
use glassadmin_core::port::{CommandError, ErrorKind, ReportDecoder};
use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;

pub const EXIT_CODE_ATTR: &str = "exit-code";
pub const MESSAGE_ATTR: &str = "message";
pub const CHILDREN_ATTR: &str = "children";
const NAME_ATTR: &str = "Name";
const VERSION_ATTR: &str = "Manifest-Version";

/// Line separator marker embedded in manifest messages
pub const EOL_MARKER: &str = "%%%EOL%%%";

/// Parsed manifest: main attributes plus named entries in file order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub main: BTreeMap<String, String>,
    pub entries: Vec<(String, BTreeMap<String, String>)>,
}

impl Manifest {
    /// # Errors
    /// `ErrorKind::Response` on a line that is neither attribute nor continuation
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let mut manifest = Manifest::default();
        let mut section: Vec<(String, String)> = Vec::new();

        for raw in text.lines() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.is_empty() {
                manifest.close_section(std::mem::take(&mut section));
                continue;
            }
            if let Some(rest) = line.strip_prefix(' ') {
                match section.last_mut() {
                    Some((_, value)) => value.push_str(rest),
                    None => {
                        return Err(CommandError::new(
                            ErrorKind::Response,
                            "manifest continuation without attribute",
                        ))
                    }
                }
                continue;
            }
            let (key, value) = line.split_once(':').ok_or_else(|| {
                CommandError::new(ErrorKind::Response, format!("malformed manifest line: {line}"))
            })?;
            section.push((key.trim().to_string(), value.strip_prefix(' ').unwrap_or(value).to_string()));
        }
        manifest.close_section(section);
        Ok(manifest)
    }

    fn close_section(&mut self, section: Vec<(String, String)>) {
        if section.is_empty() {
            return;
        }
        let name = section
            .iter()
            .find(|(k, _)| k == NAME_ATTR)
            .map(|(_, v)| v.clone());
        let attrs: BTreeMap<String, String> = section
            .into_iter()
            .filter(|(k, _)| k != NAME_ATTR)
            .collect();
        match name {
            Some(name) => self.entries.push((name, attrs)),
            None if self.entries.is_empty() => self.main.extend(attrs),
            None => {}
        }
    }

    pub fn entry(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }
}

/// Percent-decode twice, `+` meaning space, then expand line markers
pub fn decode_value(value: &str) -> String {
    let once = decode_once(value);
    decode_once(&once).replace(EOL_MARKER, "\n")
}

fn decode_once(value: &str) -> String {
    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

fn message_part(attrs: &BTreeMap<String, String>) -> MessagePart {
    MessagePart {
        message: attrs.get(MESSAGE_ATTR).map(|m| decode_value(m)),
        properties: attrs
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), MESSAGE_ATTR | EXIT_CODE_ATTR | CHILDREN_ATTR | VERSION_ATTR))
            .map(|(k, v)| (k.clone(), decode_value(v)))
            .collect(),
        children: Vec::new(),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestDecoder;

impl ManifestDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ReportDecoder for ManifestDecoder {
    fn decode(&self, body: &[u8]) -> Result<ActionReport, CommandError> {
        let text = String::from_utf8_lossy(body);
        let manifest = Manifest::parse(&text)?;

        // A missing exit code is not a failure
        let exit_code = manifest
            .main
            .get(EXIT_CODE_ATTR)
            .map(|c| ExitCode::parse(c))
            .unwrap_or(ExitCode::Success);

        let mut top = message_part(&manifest.main);
        top.children = match manifest.main.get(CHILDREN_ATTR) {
            Some(list) => decode_value(list)
                .split(';')
                .filter(|n| !n.is_empty())
                .filter_map(|n| manifest.entry(n))
                .map(message_part)
                .collect(),
            None => manifest.entries.iter().map(|(_, a)| message_part(a)).collect(),
        };

        Ok(ActionReport::new(exit_code, top))
    }
}
