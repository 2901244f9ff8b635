// Report Decoder Port
// Turns a raw response body into the generic action report

use crate::domain::ActionReport;
use crate::port::runner::CommandError;

pub trait ReportDecoder: Send + Sync {
    /// Decode `body`
    ///
    /// # Errors
    /// `ErrorKind::Response` when the body is not a valid report
    fn decode(&self, body: &[u8]) -> Result<ActionReport, CommandError>;
}
