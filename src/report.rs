use serde::{Deserialize, Serialize};

/// Reservation status of one recipe or guest recipe, keyed by the
/// machine it ran on. `reservation` is either a Beaker status value
/// ("Completed", "Running", ...) or the ambiguity diagnostic from
/// [`crate::reserve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub id: u64,
    pub system: String,
    pub arch: String,
    pub distro: String,
    pub variant: String,
    pub reservation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub job: Option<String>,
    pub generated: String,
    pub systems: Vec<SystemInfo>,
}
