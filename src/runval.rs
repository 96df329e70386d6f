/*!
Run directory validation.

Structural checks over the files of an EvoNAS run: configuration schema,
search space shape, crossover lineage CSV, and the generation/individual
directory tree. Findings are collected as human-readable messages for the
run-selection page; a broken run produces a report, never a panic, so the
valid remainder of a run stays renderable.
*/

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::evolution::{CHROMOSOME_FILE, CONFIG_FILE, CROSSOVER_FILE, GENERATION_PREFIX, RESULTS_FILE};
use crate::genepool::SEARCH_SPACE_FILE;

/// Validation result
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Whether the run passed all checks
    pub valid: bool,
    /// List of errors (blocking issues)
    pub errors: Vec<String>,
    /// List of warnings (non-blocking issues)
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Create a new valid report
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn add_error(&mut self, error: String) {
        self.valid = false;
        self.errors.push(error);
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: ValidationReport) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a JSON file for validation, recording failures as findings.
fn read_json_for_validation(path: &Path, report: &mut ValidationReport) -> Option<Value> {
    if !path.exists() {
        report.add_error(format!("File not found: {}", path.display()));
        return None;
    }
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                report.add_error(format!("Invalid JSON format in {}: {}", path.display(), e));
                None
            }
        },
        Err(e) => {
            report.add_error(format!("Failed to read {}: {}", path.display(), e));
            None
        }
    }
}

/// Validate the `hyperparameters` section of `config.json`.
///
/// Every hyperparameter must be an object carrying a `value` key.
pub fn validate_hyperparameters(run_dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::new();
    let Some(config) = read_json_for_validation(&run_dir.join(CONFIG_FILE), &mut report) else {
        return report;
    };

    let Some(hyperparameters) = config.get("hyperparameters") else {
        report.add_error(format!("Missing 'hyperparameters' key in {}", CONFIG_FILE));
        return report;
    };
    let Some(hyperparameters) = hyperparameters.as_object() else {
        report.add_error("'hyperparameters' must be a dictionary".to_string());
        return report;
    };

    for (name, entry) in hyperparameters {
        match entry.as_object() {
            Some(obj) => {
                if !obj.contains_key("value") {
                    report.add_error(format!("Missing 'value' key in hyperparameter '{}'", name));
                }
            }
            None => {
                report.add_error(format!("Hyperparameter '{}' must be a dictionary", name));
            }
        }
    }
    report
}

/// Validate the `results` section of `config.json` (measurement descriptors).
pub fn validate_meas_info(run_dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::new();
    let Some(config) = read_json_for_validation(&run_dir.join(CONFIG_FILE), &mut report) else {
        return report;
    };

    let Some(results) = config.get("results") else {
        report.add_error(format!("Missing 'results' key in {}", CONFIG_FILE));
        return report;
    };
    let Some(results) = results.as_object() else {
        report.add_error("'results' must be a dictionary".to_string());
        return report;
    };

    for (name, entry) in results {
        if !entry.is_object() {
            report.add_error(format!("Result descriptor '{}' must be a dictionary", name));
        }
    }
    report
}

/// Validate the shape of `search_space.json`.
///
/// Checks the gene pool entries (each gene needs `layer` and `f_name`), the
/// presence of the `Start` rule, and the group rule entries.
pub fn validate_search_space(run_dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::new();
    let Some(space) = read_json_for_validation(&run_dir.join(SEARCH_SPACE_FILE), &mut report)
    else {
        return report;
    };

    match space.get("gene_pool").and_then(Value::as_object) {
        Some(gene_pool) => {
            for (group, genes) in gene_pool {
                let Some(genes) = genes.as_array() else {
                    report.add_error(format!("Gene pool group '{}' must be a list", group));
                    continue;
                };
                for (i, gene) in genes.iter().enumerate() {
                    let Some(gene) = gene.as_object() else {
                        report.add_error(format!(
                            "Gene {} of group '{}' must be a dictionary",
                            i, group
                        ));
                        continue;
                    };
                    if !gene.contains_key("layer") {
                        report.add_error(format!(
                            "Gene {} of group '{}' is missing 'layer' key",
                            i, group
                        ));
                    }
                    if !gene.contains_key("f_name") {
                        report.add_error(format!(
                            "Gene {} of group '{}' is missing 'f_name' key",
                            i, group
                        ));
                    }
                }
            }
        }
        None => report.add_error(format!("Missing 'gene_pool' key in {}", SEARCH_SPACE_FILE)),
    }

    match space.get("rule_set").and_then(Value::as_object) {
        Some(rule_set) => {
            if !rule_set.contains_key("Start") {
                report.add_error("Missing 'Start' rule in 'rule_set'".to_string());
            }
        }
        None => report.add_error(format!("Missing 'rule_set' key in {}", SEARCH_SPACE_FILE)),
    }

    if let Some(rule_set_group) = space.get("rule_set_group") {
        match rule_set_group.as_array() {
            Some(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    let Some(entry) = entry.as_object() else {
                        report.add_error(format!("Group rule {} must be a dictionary", i));
                        continue;
                    };
                    if !entry.contains_key("group") {
                        report.add_error(format!("Group rule {} is missing 'group' key", i));
                    }
                    if !entry.contains_key("rule") {
                        report.add_error(format!("Group rule {} is missing 'rule' key", i));
                    }
                }
            }
            None => report.add_error("'rule_set_group' must be a list".to_string()),
        }
    }

    report
}

/// Validate the crossover lineage file `crossover_parents.csv`.
///
/// Every record must carry the four labeled fields `Generation:`,
/// `Parent_1:`, `Parent_2:` and `New_Individual:`. Parent fields embed a
/// comma inside their `(individual, generation)` pair, so cells are scanned
/// by label rather than by position.
pub fn validate_crossover_parents(run_dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::new();
    let path = run_dir.join(CROSSOVER_FILE);
    if !path.exists() {
        report.add_error(format!("File not found: {}", path.display()));
        return report;
    }

    let mut reader = match csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(&path)
    {
        Ok(reader) => reader,
        Err(e) => {
            report.add_error(format!("Invalid CSV format in {}: {}", path.display(), e));
            return report;
        }
    };

    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                report.add_error(format!("Invalid CSV format in row {}: {}", row + 1, e));
                continue;
            }
        };
        for label in ["Generation:", "Parent_1:", "Parent_2:", "New_Individual:"] {
            if !record.iter().any(|cell| cell.trim().starts_with(label)) {
                report.add_error(format!("Row {} is missing '{}' field", row + 1, label));
            }
        }
    }
    report
}

/// Validate the generation/individual directory tree.
///
/// A run needs at least one `Generation_<n>` directory; every individual
/// directory inside one must contain `results.json` and `chromosome.json`.
pub fn validate_generations_of_individuals(run_dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::new();

    let generation_dirs = match list_generation_dirs(run_dir) {
        Ok(dirs) => dirs,
        Err(e) => {
            report.add_error(format!(
                "Failed to read run directory {}: {}",
                run_dir.display(),
                e
            ));
            return report;
        }
    };
    if generation_dirs.is_empty() {
        report.add_error(format!(
            "No generation directories found in '{}'",
            run_dir.display()
        ));
        return report;
    }

    for generation in &generation_dirs {
        let generation_path = run_dir.join(generation);
        let individuals = match list_subdirectories(&generation_path) {
            Ok(individuals) => individuals,
            Err(e) => {
                report.add_error(format!(
                    "Failed to read {}: {}",
                    generation_path.display(),
                    e
                ));
                continue;
            }
        };
        for individual in individuals {
            for file in [RESULTS_FILE, CHROMOSOME_FILE] {
                let path = generation_path.join(&individual).join(file);
                if !path.exists() {
                    report.add_error(format!("Missing file: {}", path.display()));
                }
            }
        }
    }
    report
}

/// Validate one individual's `results.json`.
pub fn validate_individual_result(
    run_dir: &Path,
    generation: u32,
    individual: &str,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    let path = run_dir
        .join(format!("{}{}", GENERATION_PREFIX, generation))
        .join(individual)
        .join(RESULTS_FILE);
    if let Some(value) = read_json_for_validation(&path, &mut report) {
        if !value.is_object() {
            report.add_error(format!("{} must be a dictionary", path.display()));
        }
    }
    report
}

/// Validate one individual's `chromosome.json`.
pub fn validate_individual_chromosome(
    run_dir: &Path,
    generation: u32,
    individual: &str,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    let path = run_dir
        .join(format!("{}{}", GENERATION_PREFIX, generation))
        .join(individual)
        .join(CHROMOSOME_FILE);
    if let Some(value) = read_json_for_validation(&path, &mut report) {
        if !value.is_array() {
            report.add_error(format!("{} must be a list of genes", path.display()));
        }
    }
    report
}

/// Validate a whole run directory.
///
/// Runs every structural check and additionally validates each individual's
/// result and chromosome files.
pub fn validate_run(run_dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::new();
    report.merge(validate_hyperparameters(run_dir));
    report.merge(validate_meas_info(run_dir));
    report.merge(validate_search_space(run_dir));
    report.merge(validate_crossover_parents(run_dir));
    report.merge(validate_generations_of_individuals(run_dir));

    if let Ok(generations) = list_generation_dirs(run_dir) {
        for generation in generations {
            let Some(number) = generation
                .strip_prefix(GENERATION_PREFIX)
                .and_then(|n| n.parse::<u32>().ok())
            else {
                continue;
            };
            let individuals =
                list_subdirectories(&run_dir.join(&generation)).unwrap_or_default();
            for individual in individuals {
                report.merge(validate_individual_result(run_dir, number, &individual));
                report.merge(validate_individual_chromosome(run_dir, number, &individual));
            }
        }
    }

    debug!(
        "run validation of {} finished: {} errors, {} warnings",
        run_dir.display(),
        report.errors.len(),
        report.warnings.len()
    );
    report
}

fn list_generation_dirs(run_dir: &Path) -> std::io::Result<Vec<String>> {
    let mut dirs: Vec<String> = fs::read_dir(run_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(GENERATION_PREFIX))
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn list_subdirectories(path: &Path) -> std::io::Result<Vec<String>> {
    let mut dirs: Vec<String> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    dirs.sort();
    Ok(dirs)
}
