//! Startup seeding of the distribution channel.

use std::path::Path;

use adaptersync::AssignableAdapters;
use adaptersync_pubsub::Publication;

use crate::error::Error;

/// Read a JSON array of records.
pub fn load_seed(path: &Path) -> Result<Vec<AssignableAdapters>, Error> {
    let contents = std::fs::read_to_string(path).map_err(|source| Error::SeedRead {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<AssignableAdapters> =
        serde_json::from_str(&contents).map_err(|source| Error::SeedFormat {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some(index) = records.iter().position(|r| r.model.trim().is_empty()) {
        return Err(Error::SeedModel { index });
    }
    Ok(records)
}

/// Publish each record under its own model key.
pub fn publish_seed(
    publication: &Publication<AssignableAdapters>,
    records: &[AssignableAdapters],
) -> Result<usize, Error> {
    for record in records {
        publication.publish(&record.model, record)?;
        tracing::debug!(model = %record.model, bundles = record.io_bundle_list.len(), "seeded record");
    }
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptersync_pubsub::Bus;

    const SEED: &str = r#"[
        {"Model": "model-A", "IoBundleList": [{"Type": 1, "Name": "eth0", "Members": ["eth0"]}]},
        {"Model": "model-B", "IoBundleList": []}
    ]"#;

    #[test]
    fn test_load_and_publish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, SEED).unwrap();

        let records = load_seed(&path).unwrap();
        assert_eq!(records.len(), 2);

        let publication = Publication::new(Bus::new());
        assert_eq!(publish_seed(&publication, &records).unwrap(), 2);
        assert_eq!(publication.keys(), vec!["model-A", "model-B"]);
    }

    #[test]
    fn test_missing_seed() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_seed(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::SeedRead { .. }));
    }

    #[test]
    fn test_malformed_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, r#"{"Model": "model-A"}"#).unwrap();

        assert!(matches!(
            load_seed(&path).unwrap_err(),
            Error::SeedFormat { .. }
        ));
    }

    #[test]
    fn test_seed_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, r#"[{"Model": "model-A"}, {"Model": ""}]"#).unwrap();

        assert!(matches!(
            load_seed(&path).unwrap_err(),
            Error::SeedModel { index: 1 }
        ));
    }
}
