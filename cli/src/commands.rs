//! Subcommand bodies, kept free of argument parsing so they can be tested.

use anyhow::Context;
use fixinsured_crypto::ClaimTuple;
use fixinsured_types::{Address, Amount, ClaimDigest, PolicyParams};
use fixinsured_utils::format_deadline;
use fixinsured_verification::{FlightDataset, OffChainVerifier, VerifierRole};
use std::fmt::Write;
use std::path::Path;
use tracing::info;

/// Placeholder identity for a verifier that did not configure one.
pub const ANONYMOUS_VERIFIER: &str = "0x0000000000000000000000000000000000000000";

pub fn commit(tuple: &ClaimTuple) -> ClaimDigest {
    let digest = tuple.digest();
    info!(flight = %tuple.flight, date = %tuple.flight_date, digest = %digest, "claim committed");
    digest
}

pub fn load_dataset(path: &Path, tolerance_bps: u32) -> anyhow::Result<FlightDataset> {
    let dataset = FlightDataset::from_file(path)
        .with_context(|| format!("loading dataset {}", path.display()))?;
    Ok(dataset.with_tolerance_bps(tolerance_bps))
}

/// Answer an eligibility (`fixed_loss` given) or accident query from the dataset.
pub fn check(
    dataset: FlightDataset,
    verifier: Address,
    role: VerifierRole,
    digest: ClaimDigest,
    fixed_loss: Amount,
) -> bool {
    OffChainVerifier::new(verifier, role, dataset).assess(digest, fixed_loss)
}

/// Validate policy parameters and render a summary.
pub fn describe_params(path: &Path) -> anyhow::Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let params = PolicyParams::from_toml_str(&content)?;
    params.validate()?;
    let share = params
        .insurer_share()
        .context("insurer_limit must be positive")?;

    let mut out = String::new();
    let t = &params.timeouts;
    writeln!(out, "flight:            {} on {}", params.flight_code, params.flight_date)?;
    writeln!(out, "claim digest:      {}", params.claim_digest)?;
    writeln!(out, "fixed loss:        {}", params.fixed_loss)?;
    writeln!(
        out,
        "insurers:          {} selected from {}",
        params.insurer_limit, params.potential_insurer_limit
    )?;
    writeln!(out, "insurer deposit:   {share}")?;
    writeln!(out, "no-claim premium:  {:?}", params.no_claim_premium)?;
    writeln!(out, "eligibility wait:  {}", format_deadline(t.eligibility_secs))?;
    writeln!(out, "insurer entry:     {}", format_deadline(t.insurer_entry_secs))?;
    writeln!(out, "lottery wait:      {}", format_deadline(t.lottery_secs))?;
    write!(out, "accident wait:     {}", format_deadline(t.accident_secs))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    const RECORDS: &str = r#"[
        {"first_name": "James", "last_name": "Jiang", "confirmation_number": "ABC123",
         "flight": "NB1234", "flightDate": "2022-05-20", "ticket_price": 567, "delay": 30}
    ]"#;

    fn james() -> ClaimTuple {
        ClaimTuple::new(" James", "", "JIANG", "abc123", "nb1234", "2022-05-20")
    }

    fn dataset_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RECORDS.as_bytes()).unwrap();
        file
    }

    #[test]
    fn eligibility_and_accident_from_file() {
        let file = dataset_file();
        let digest = commit(&james());
        let who = Address::new(ANONYMOUS_VERIFIER);

        let ds = load_dataset(file.path(), 100).unwrap();
        assert!(check(ds, who.clone(), VerifierRole::Eligibility, digest, Amount::new(567)));
        let ds = load_dataset(file.path(), 100).unwrap();
        assert!(!check(ds, who.clone(), VerifierRole::Eligibility, digest, Amount::new(700)));
        let ds = load_dataset(file.path(), 100).unwrap();
        assert!(check(ds, who, VerifierRole::Accident, digest, Amount::ZERO));
    }

    #[test]
    fn csv_dataset_answers_eligibility() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(
            b"first_name,middle_name,last_name,confirmation_number,flight,flightDate,ticket_price\n\
              James,,Jiang,ABC123,NB1234,2022-05-20,567\n",
        )
        .unwrap();
        let digest = commit(&james());
        let who = Address::new(ANONYMOUS_VERIFIER);

        let ds = load_dataset(file.path(), 100).unwrap();
        assert!(check(ds, who.clone(), VerifierRole::Eligibility, digest, Amount::new(567)));
        let ds = load_dataset(file.path(), 100).unwrap();
        assert!(!check(ds, who, VerifierRole::Accident, digest, Amount::ZERO));
    }

    #[test]
    fn missing_dataset_has_context() {
        let err = load_dataset(Path::new("/nonexistent/flights.json"), 100).unwrap_err();
        assert!(err.to_string().contains("loading dataset"));
    }

    #[test]
    fn describes_valid_params() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            eligibility_verifier_type = 1
            accident_verifier_type = 1
            potential_insurer_limit = 6
            insurer_limit = 3
            fixed_loss = 567
            claim_digest = "{}"
            flight_code = "NB1234"
            flight_date = "2022-05-20"

            [timeouts]
            lottery_secs = 3600
            "#,
            james().digest().to_hex()
        )
        .unwrap();
        let summary = describe_params(file.path()).unwrap();
        assert!(summary.contains("189 wei"));
        assert!(summary.contains("lottery wait:      1h 0m"));
        assert!(summary.contains("accident wait:     none"));
    }
}
