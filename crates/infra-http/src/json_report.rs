// JSON action report decoder for the REST interface

use glassadmin_core::domain::{ActionReport, ExitCode, MessagePart};
use glassadmin_core::port::{CommandError, ErrorKind, ReportDecoder};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Wire shape of one report node
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPart {
    message: Option<String>,
    properties: Option<BTreeMap<String, Value>>,
    children: Option<Vec<RawPart>>,
}

/// Wire shape of the whole report
#[derive(Debug, Deserialize)]
struct RawReport {
    exit_code: Option<String>,
    #[serde(flatten)]
    top: RawPart,
    #[serde(rename = "subReports", default)]
    sub_reports: Option<Vec<RawPart>>,
    #[serde(rename = "extraProperties", default)]
    extra_properties: Option<BTreeMap<String, Value>>,
}

impl From<RawPart> for MessagePart {
    fn from(raw: RawPart) -> Self {
        MessagePart {
            message: raw.message,
            properties: stringify_all(raw.properties.unwrap_or_default()),
            children: raw
                .children
                .unwrap_or_default()
                .into_iter()
                .map(MessagePart::from)
                .collect(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReportDecoder;

impl JsonReportDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ReportDecoder for JsonReportDecoder {
    fn decode(&self, body: &[u8]) -> Result<ActionReport, CommandError> {
        let raw: RawReport = serde_json::from_slice(body)
            .map_err(|e| CommandError::new(ErrorKind::Response, format!("invalid JSON report: {e}")))?;

        let exit_code = raw
            .exit_code
            .as_deref()
            .map(ExitCode::parse)
            .ok_or_else(|| CommandError::new(ErrorKind::Response, "JSON report without exit_code"))?;

        let mut top = MessagePart::from(raw.top);
        // Sub-reports of composite commands hang below the top part
        top.children
            .extend(raw.sub_reports.unwrap_or_default().into_iter().map(MessagePart::from));
        for (key, value) in stringify_all(raw.extra_properties.unwrap_or_default()) {
            top.properties.entry(key).or_insert(value);
        }

        Ok(ActionReport::new(exit_code, top))
    }
}

fn stringify_all(values: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    values.into_iter().map(|(k, v)| (k, stringify(v))).collect()
}

/// Property values are strings on the wire, anything else is kept as JSON text
fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
