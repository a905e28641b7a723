pub mod bkr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use bkr::BkrClient;

/// Diagnostics for the configured Beaker client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientDiag {
    pub bkr_exe: String,
    pub version: Option<String>,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Acquisition seam: something that can turn a Beaker taskspec (e.g.
/// "J:123456") into a job-results XML byte stream. The production
/// implementation shells out to `bkr`; tests substitute canned bytes.
pub trait ReportSource {
    fn doctor(&self) -> Result<ClientDiag>;
    fn job_results(&self, taskspec: &str) -> Result<Vec<u8>>;
}
