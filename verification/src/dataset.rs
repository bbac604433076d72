//! In-memory flight booking records used by verifiers as their private data.

use crate::error::ConsensusError;
use crate::matcher::{within_tolerance, ClaimMatcher, ClaimQuery, DEFAULT_TOLERANCE_BPS};
use fixinsured_crypto::ClaimTuple;
use fixinsured_types::{Amount, ClaimDigest};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// One booking held privately by a verifier (airline, booking agent, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightRecord {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub last_name: String,
    pub confirmation_number: String,
    pub flight: String,
    #[serde(alias = "flightDate")]
    pub flight_date: String,
    pub ticket_price: u64,
    /// Minutes of delay; zero means on time.
    #[serde(default)]
    pub delay: u32,
}

impl FlightRecord {
    pub fn tuple(&self) -> ClaimTuple {
        ClaimTuple::new(
            self.first_name.as_str(),
            self.middle_name.as_str(),
            self.last_name.as_str(),
            self.confirmation_number.as_str(),
            self.flight.as_str(),
            self.flight_date.as_str(),
        )
    }

    pub fn digest(&self) -> ClaimDigest {
        self.tuple().digest()
    }

    pub fn ticket_price(&self) -> Amount {
        Amount::new(u128::from(self.ticket_price))
    }

    pub fn is_delayed(&self) -> bool {
        self.delay != 0
    }
}

/// A verifier's private record set.
#[derive(Clone, Debug)]
pub struct FlightDataset {
    name: String,
    records: Vec<FlightRecord>,
    tolerance_bps: u32,
}

impl FlightDataset {
    pub fn new(name: impl Into<String>, records: Vec<FlightRecord>) -> Self {
        Self {
            name: name.into(),
            records,
            tolerance_bps: DEFAULT_TOLERANCE_BPS,
        }
    }

    /// Override the eligibility price tolerance (basis points).
    pub fn with_tolerance_bps(mut self, tolerance_bps: u32) -> Self {
        self.tolerance_bps = tolerance_bps;
        self
    }

    /// Parse a JSON array of records.
    pub fn from_json_str(name: impl Into<String>, json: &str) -> Result<Self, ConsensusError> {
        let records: Vec<FlightRecord> =
            serde_json::from_str(json).map_err(|e| ConsensusError::Dataset(e.to_string()))?;
        Ok(Self::new(name, records))
    }

    /// Load a JSON array of records from a file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConsensusError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConsensusError::Dataset(format!("{}: {e}", path.display())))?;
        let dataset = Self::from_json_str(path.display().to_string(), &content)?;
        info!(path = %path.display(), records = dataset.len(), "flight dataset loaded");
        Ok(dataset)
    }

    /// Parse CSV with a header row. A missing `delay` column reads as on time.
    pub fn from_csv_reader<R: Read>(
        name: impl Into<String>,
        reader: R,
    ) -> Result<Self, ConsensusError> {
        let records = csv::Reader::from_reader(reader)
            .deserialize()
            .collect::<Result<Vec<FlightRecord>, _>>()
            .map_err(|e| ConsensusError::Dataset(e.to_string()))?;
        Ok(Self::new(name, records))
    }

    pub fn from_csv_str(name: impl Into<String>, csv: &str) -> Result<Self, ConsensusError> {
        Self::from_csv_reader(name, csv.as_bytes())
    }

    /// Load a CSV file of records.
    pub fn from_csv_file(path: &Path) -> Result<Self, ConsensusError> {
        let file = std::fs::File::open(path)
            .map_err(|e| ConsensusError::Dataset(format!("{}: {e}", path.display())))?;
        let dataset = Self::from_csv_reader(path.display().to_string(), file)?;
        info!(path = %path.display(), records = dataset.len(), "flight dataset loaded");
        Ok(dataset)
    }

    /// Load a dataset, choosing CSV for a `.csv` extension and JSON otherwise.
    pub fn from_file(path: &Path) -> Result<Self, ConsensusError> {
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            Self::from_csv_file(path)
        } else {
            Self::from_json_file(path)
        }
    }

    pub fn records(&self) -> &[FlightRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn tolerance_bps(&self) -> u32 {
        self.tolerance_bps
    }

    /// Records whose commitment equals `digest`.
    pub fn matching<'a>(
        &'a self,
        digest: &'a ClaimDigest,
    ) -> impl Iterator<Item = &'a FlightRecord> + 'a {
        self.records.iter().filter(move |r| r.digest() == *digest)
    }
}

impl ClaimMatcher for FlightDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, query: &ClaimQuery) -> bool {
        match query {
            ClaimQuery::Eligibility { digest, fixed_loss } => self
                .matching(digest)
                .any(|r| within_tolerance(r.ticket_price(), *fixed_loss, self.tolerance_bps)),
            ClaimQuery::Accident { digest } => self.matching(digest).any(FlightRecord::is_delayed),
        }
    }
}
