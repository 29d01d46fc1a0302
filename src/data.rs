//! Dataset loading and deterministic synthesis.
//!
//! The audit never fails for lack of data: a missing or unparseable test
//! file degrades to policy-seeded synthetic data, and the degradation is
//! recorded as a note on the outcome. Sensitive columns are resolved by
//! normalized name matching so `Age Group`, `age-group`, and `age_group`
//! all hit the same candidate name.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex_lite::Regex;

use crate::policy::AuditPolicy;
use crate::types::dataset::{DataOrigin, Dataset, FeatureTable};

/// A resolved dataset plus caveats accumulated while obtaining it.
#[derive(Debug, Clone)]
pub struct DataOutcome {
    /// The dataset the audit will run over.
    pub dataset: Dataset,
    /// Degradation caveats (synthetic fallback, parse failure). Empty when
    /// the caller's file loaded cleanly.
    pub notes: Vec<String>,
}

/// Load the caller's test data, or synthesize a dataset when none is
/// provided or the file cannot be parsed.
///
/// File format: delimited text with a header row (comma, or tab for a
/// `.tsv` extension); every column numeric; the last column is the binary
/// label. Any structural defect (ragged row, non-numeric cell, empty body)
/// abandons the file and falls back to synthesis rather than auditing over
/// partial data.
pub fn load_or_generate(
    test_data_path: Option<&Path>,
    requested_sensitive: Option<&[String]>,
    policy: &AuditPolicy,
) -> DataOutcome {
    let mut notes = Vec::new();

    if let Some(path) = test_data_path {
        match load_file(path, requested_sensitive, policy) {
            Ok(dataset) => {
                tracing::debug!(
                    path = %path.display(),
                    rows = dataset.features.num_rows(),
                    sensitive = ?dataset.sensitive_columns,
                    "loaded test data"
                );
                return DataOutcome { dataset, notes };
            }
            Err(reason) => {
                tracing::warn!(path = %path.display(), %reason, "test data unusable, synthesizing");
                notes.push(format!(
                    "Test data at {} could not be used ({reason}); generated synthetic evaluation data",
                    path.display()
                ));
            }
        }
    } else {
        notes.push("Test data not provided; generated synthetic evaluation data".to_string());
    }

    let sensitive_names = requested_sensitive
        .filter(|r| !r.is_empty())
        .unwrap_or(&policy.synthetic_sensitive);
    DataOutcome {
        dataset: synthesize(policy, sensitive_names),
        notes,
    }
}

fn load_file(
    path: &Path,
    requested_sensitive: Option<&[String]>,
    policy: &AuditPolicy,
) -> Result<Dataset, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let delimiter = delimiter_for(path);
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let header = lines.next().ok_or("file is empty")?;
    let columns: Vec<String> = header
        .split(delimiter)
        .map(|c| c.trim().to_string())
        .collect();
    if columns.len() < 2 {
        return Err("need at least one feature column and a label column".to_string());
    }

    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        let mut row = Vec::with_capacity(columns.len());
        for cell in line.split(delimiter) {
            let value: f64 = cell
                .trim()
                .parse()
                .map_err(|_| format!("non-numeric cell in data row {i}"))?;
            row.push(value);
        }
        if row.len() != columns.len() {
            return Err(format!(
                "data row {i} has {} cells, header has {}",
                row.len(),
                columns.len()
            ));
        }
        rows.push(row);
    }
    if rows.is_empty() {
        return Err("file has a header but no data rows".to_string());
    }

    // Last column is the label; everything before it is a feature.
    let feature_columns: Vec<String> = columns[..columns.len() - 1].to_vec();
    let labels: Vec<u8> = rows
        .iter()
        .map(|r| u8::from(*r.last().expect("non-empty row") > 0.5))
        .collect();
    let feature_rows: Vec<Vec<f64>> = rows
        .into_iter()
        .map(|mut r| {
            r.pop();
            r
        })
        .collect();

    let features = FeatureTable::new(feature_columns, feature_rows).map_err(|e| e.to_string())?;
    let sensitive = resolve_sensitive(features.columns(), requested_sensitive, policy);

    Dataset::new(features, labels, sensitive, DataOrigin::File).map_err(|e| e.to_string())
}

/// Resolve sensitive columns by normalized name equality.
///
/// Candidates come from the request when given and non-empty, else from
/// the policy's default list. A feature column matches when its normalized
/// form equals a candidate's normalized form; the result is the
/// intersection of the two name sets, ordered by the feature columns so
/// the primary sensitive column is stable.
pub fn resolve_sensitive(
    columns: &[String],
    requested: Option<&[String]>,
    policy: &AuditPolicy,
) -> Vec<String> {
    let candidates: &[String] = match requested {
        Some(r) if !r.is_empty() => r,
        _ => &policy.default_sensitive,
    };

    let normalized_candidates: Vec<String> = candidates.iter().map(|c| normalize(c)).collect();

    columns
        .iter()
        .filter(|col| {
            let n = normalize(col);
            normalized_candidates.iter().any(|c| !c.is_empty() && n == *c)
        })
        .cloned()
        .collect()
}

fn delimiter_for(path: &Path) -> char {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("tab") => '\t',
        _ => ',',
    }
}

fn normalize(name: &str) -> String {
    // Separator-insensitive: "Age Group" == "age_group" == "age-group".
    static STRIPPER: OnceLock<Regex> = OnceLock::new();
    let stripper =
        STRIPPER.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static pattern"));
    stripper.replace_all(&name.to_lowercase(), "").into_owned()
}

/// Deterministically synthesize a labeled dataset from the policy seed.
///
/// `synthetic_features` standard-normal feature columns followed by the
/// policy's binary sensitive columns; the label is a noisy linear rule over
/// the first two features so the synthetic model behavior is non-trivial
/// but reproducible.
pub fn generate_synthetic(policy: &AuditPolicy) -> Dataset {
    synthesize(policy, &policy.synthetic_sensitive)
}

/// Synthesis with an explicit sensitive-column list; requested names from
/// the audit request take the place of the policy defaults.
fn synthesize(policy: &AuditPolicy, sensitive_names: &[String]) -> Dataset {
    let mut rng = StdRng::seed_from_u64(policy.seed);

    let mut columns: Vec<String> = (0..policy.synthetic_features)
        .map(|i| format!("feature_{i}"))
        .collect();
    columns.extend(sensitive_names.iter().cloned());

    let mut rows = Vec::with_capacity(policy.synthetic_rows);
    let mut labels = Vec::with_capacity(policy.synthetic_rows);
    for _ in 0..policy.synthetic_rows {
        let mut row: Vec<f64> = (0..policy.synthetic_features)
            .map(|_| sample_normal(&mut rng))
            .collect();
        for _ in sensitive_names {
            row.push(f64::from(u8::from(rng.gen_bool(0.5))));
        }

        let x0 = row.first().copied().unwrap_or(0.0);
        let x1 = row.get(1).copied().unwrap_or(0.0);
        let noise = sample_normal(&mut rng);
        labels.push(u8::from(x0 + x1 + 0.5 * noise > 0.0));

        rows.push(row);
    }

    let features = FeatureTable::new(columns, rows)
        .expect("synthetic table is rectangular by construction");

    Dataset::new(features, labels, sensitive_names.to_vec(), DataOrigin::Synthetic)
        .expect("synthetic dataset is aligned by construction")
}

/// One standard-normal sample via the Box-Muller transform.
fn sample_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn policy() -> AuditPolicy {
        AuditPolicy::minimal()
    }

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_synthetic_is_deterministic() {
        let a = generate_synthetic(&policy());
        let b = generate_synthetic(&policy());
        assert_eq!(a.features, b.features);
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_synthetic_shape() {
        let p = policy();
        let ds = generate_synthetic(&p);
        assert_eq!(ds.features.num_rows(), p.synthetic_rows);
        assert_eq!(
            ds.features.num_columns(),
            p.synthetic_features + p.synthetic_sensitive.len()
        );
        assert_eq!(ds.origin, DataOrigin::Synthetic);
        assert_eq!(ds.sensitive_columns, p.synthetic_sensitive);
    }

    #[test]
    fn test_synthetic_sensitive_columns_are_binary() {
        let p = policy();
        let ds = generate_synthetic(&p);
        for name in &p.synthetic_sensitive {
            let idx = ds.features.column_index(name).unwrap();
            assert!(ds
                .features
                .column_values(idx)
                .iter()
                .all(|&v| v == 0.0 || v == 1.0));
        }
    }

    #[test]
    fn test_file_loads_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "data.csv",
            "income,gender,label\n1.0,0,1\n2.0,1,0\n3.0,0,1\n",
        );

        let outcome = load_or_generate(Some(&path), None, &policy());
        assert!(outcome.notes.is_empty());
        assert_eq!(outcome.dataset.origin, DataOrigin::File);
        assert_eq!(outcome.dataset.labels, vec![1, 0, 1]);
        assert_eq!(outcome.dataset.sensitive_columns, vec!["gender".to_string()]);
    }

    #[test]
    fn test_tab_delimited_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "data.tsv",
            "income\tgender\tlabel\n1.0\t0\t1\n2.0\t1\t0\n",
        );

        let outcome = load_or_generate(Some(&path), None, &policy());
        assert!(outcome.notes.is_empty());
        assert_eq!(outcome.dataset.origin, DataOrigin::File);
        assert_eq!(outcome.dataset.labels, vec![1, 0]);
    }

    #[test]
    fn test_synthetic_uses_requested_sensitive_names() {
        let requested = vec!["region".to_string()];
        let outcome = load_or_generate(None, Some(&requested), &policy());
        assert_eq!(outcome.dataset.origin, DataOrigin::Synthetic);
        assert_eq!(outcome.dataset.sensitive_columns, requested);
        assert!(outcome.dataset.features.column_index("region").is_some());
    }

    #[test]
    fn test_missing_path_synthesizes_with_note() {
        let outcome = load_or_generate(None, None, &policy());
        assert_eq!(outcome.dataset.origin, DataOrigin::Synthetic);
        assert_eq!(outcome.notes.len(), 1);
        assert!(outcome.notes[0].contains("not provided"));
    }

    #[test]
    fn test_malformed_file_falls_back_with_note() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "bad.csv", "a,b,label\n1.0,oops,1\n");

        let outcome = load_or_generate(Some(&path), None, &policy());
        assert_eq!(outcome.dataset.origin, DataOrigin::Synthetic);
        assert_eq!(outcome.notes.len(), 1);
        assert!(outcome.notes[0].contains("could not be used"));
    }

    #[test]
    fn test_ragged_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "ragged.csv", "a,b,label\n1.0,2.0,1\n1.0,0\n");

        let outcome = load_or_generate(Some(&path), None, &policy());
        assert_eq!(outcome.dataset.origin, DataOrigin::Synthetic);
    }

    #[test]
    fn test_sensitive_resolution_is_separator_insensitive() {
        let columns = vec![
            "Age Group".to_string(),
            "Gender".to_string(),
            "income".to_string(),
        ];
        let requested = vec!["age_group".to_string(), "gender".to_string()];
        let resolved = resolve_sensitive(&columns, Some(&requested), &policy());
        assert_eq!(
            resolved,
            vec!["Age Group".to_string(), "Gender".to_string()]
        );
    }

    #[test]
    fn test_requested_sensitive_overrides_defaults() {
        let columns = vec!["gender".to_string(), "region".to_string()];
        let requested = vec!["region".to_string()];
        let resolved = resolve_sensitive(&columns, Some(&requested), &policy());
        assert_eq!(resolved, vec!["region".to_string()]);
    }

    #[test]
    fn test_resolution_requires_whole_name_match() {
        // Columns that merely contain a candidate name are not sensitive.
        let columns = vec![
            "average_income".to_string(),
            "percentage".to_string(),
            "age".to_string(),
        ];
        let resolved = resolve_sensitive(&columns, None, &policy());
        assert_eq!(resolved, vec!["age".to_string()]);
    }

    #[test]
    fn test_empty_requested_list_falls_back_to_defaults() {
        let columns = vec!["gender".to_string(), "income".to_string()];
        let resolved = resolve_sensitive(&columns, Some(&[]), &policy());
        assert_eq!(resolved, vec!["gender".to_string()]);

        // Same fallback on the synthesis path.
        let outcome = load_or_generate(None, Some(&[]), &policy());
        assert_eq!(
            outcome.dataset.sensitive_columns,
            policy().synthetic_sensitive
        );
    }

    #[test]
    fn test_no_match_yields_empty() {
        let columns = vec!["income".to_string(), "score".to_string()];
        assert!(resolve_sensitive(&columns, None, &policy()).is_empty());
    }
}
