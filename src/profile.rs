use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

const LINKEDIN_FALLBACK: &str = "LinkedIn profile not available";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid facts file {path}: {source}")]
    Facts {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("facts file {path} is missing string field `{field}`")]
    MissingField { path: PathBuf, field: &'static str },
}

/// Static identity, biography and style notes used to render the persona.
#[derive(Debug, Clone)]
pub struct ProfileData {
    pub full_name: String,
    pub name: String,
    /// Every entry of `facts.json`, including `full_name` and `name`.
    pub facts: Map<String, Value>,
    pub summary: String,
    pub linkedin: String,
    pub style: String,
}

impl ProfileData {
    /// Load the profile from a directory holding `facts.json`, `summary.txt`,
    /// `style.txt` and optionally `linkedin.txt`.
    pub fn load(dir: &Path) -> Result<Self, ProfileError> {
        let facts_path = dir.join("facts.json");
        let facts_text = read_text(&facts_path)?;
        let facts: Map<String, Value> =
            serde_json::from_str(&facts_text).map_err(|source| ProfileError::Facts {
                path: facts_path.clone(),
                source,
            })?;

        let full_name = string_fact(&facts, &facts_path, "full_name")?;
        let name = string_fact(&facts, &facts_path, "name")?;

        let summary = read_text(&dir.join("summary.txt"))?;
        let style = read_text(&dir.join("style.txt"))?;

        let linkedin_path = dir.join("linkedin.txt");
        let linkedin = if linkedin_path.exists() {
            read_text(&linkedin_path)?
        } else {
            warn!("No LinkedIn profile at {}, using placeholder", linkedin_path.display());
            LINKEDIN_FALLBACK.to_string()
        };

        debug!("Loaded profile for {} from {}", full_name, dir.display());

        Ok(Self {
            full_name,
            name,
            facts,
            summary,
            linkedin,
            style,
        })
    }
}

fn string_fact(
    facts: &Map<String, Value>,
    path: &Path,
    field: &'static str,
) -> Result<String, ProfileError> {
    facts
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ProfileError::MissingField {
            path: path.to_path_buf(),
            field,
        })
}

/// Read a UTF-8 text file, dropping a leading byte-order mark.
fn read_text(path: &Path) -> Result<String, ProfileError> {
    let bytes = fs::read(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(&bytes);
    if had_errors {
        warn!("{} contains invalid UTF-8, replaced with U+FFFD", path.display());
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_profile(dir: &Path, facts: &str, with_linkedin: bool) {
        fs::write(dir.join("facts.json"), facts).unwrap();
        fs::write(dir.join("summary.txt"), "Builds backend systems.").unwrap();
        fs::write(dir.join("style.txt"), "Direct and friendly.").unwrap();
        if with_linkedin {
            fs::write(dir.join("linkedin.txt"), "Staff Engineer at Example Corp").unwrap();
        }
    }

    #[test]
    fn test_load_profile() {
        let tmp = TempDir::new().unwrap();
        write_profile(
            tmp.path(),
            r#"{"full_name": "Ada Lovelace", "name": "Ada", "city": "London"}"#,
            true,
        );

        let profile = ProfileData::load(tmp.path()).unwrap();
        assert_eq!(profile.full_name, "Ada Lovelace");
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.facts["city"], "London");
        assert_eq!(profile.summary, "Builds backend systems.");
        assert_eq!(profile.linkedin, "Staff Engineer at Example Corp");
    }

    #[test]
    fn test_missing_linkedin_falls_back() {
        let tmp = TempDir::new().unwrap();
        write_profile(tmp.path(), r#"{"full_name": "Ada Lovelace", "name": "Ada"}"#, false);

        let profile = ProfileData::load(tmp.path()).unwrap();
        assert_eq!(profile.linkedin, LINKEDIN_FALLBACK);
    }

    #[test]
    fn test_bom_is_stripped() {
        let tmp = TempDir::new().unwrap();
        write_profile(tmp.path(), r#"{"full_name": "Ada Lovelace", "name": "Ada"}"#, true);
        fs::write(tmp.path().join("style.txt"), b"\xEF\xBB\xBFTerse.").unwrap();

        let profile = ProfileData::load(tmp.path()).unwrap();
        assert_eq!(profile.style, "Terse.");
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let tmp = TempDir::new().unwrap();
        write_profile(tmp.path(), r#"{"full_name": "Ada Lovelace"}"#, true);

        let err = ProfileData::load(tmp.path()).unwrap_err();
        assert!(matches!(err, ProfileError::MissingField { field: "name", .. }));
    }

    #[test]
    fn test_missing_summary_is_io_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("facts.json"), r#"{"full_name": "A B", "name": "A"}"#).unwrap();

        let err = ProfileData::load(tmp.path()).unwrap_err();
        assert!(matches!(err, ProfileError::Io { .. }));
    }
}
