/*!
Evolution run data aggregation.

Reads the per-generation directory tree of an EvoNAS run and reshapes it for
the result pages: individual discovery, per-individual results and
chromosomes, measurement descriptors with defaults, healthy/unhealthy
partitioning, and best-per-generation selection.

## Run Directory Layout

```text
<run>/
  config.json               hyperparameters + result descriptors
  search_space.json         gene pool and production rules
  crossover_parents.csv     crossover lineage
  Generation_1/
    individual_a/
      results.json
      chromosome.json
    individual_b/...
  Generation_2/...
```
*/

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::debug;

use crate::genepool::loader::read_json_value;
use crate::types::{EvoVisError, EvoVisResult};

/// Run configuration file name
pub const CONFIG_FILE: &str = "config.json";
/// Per-individual result file name
pub const RESULTS_FILE: &str = "results.json";
/// Per-individual chromosome file name
pub const CHROMOSOME_FILE: &str = "chromosome.json";
/// Crossover lineage file name
pub const CROSSOVER_FILE: &str = "crossover_parents.csv";
/// Generation directory prefix, suffixed with the generation number
pub const GENERATION_PREFIX: &str = "Generation_";

/// Flat result mapping of one individual (measurement name -> value)
pub type IndividualResult = IndexMap<String, Value>;

/// Measurement descriptor from the run configuration, with defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct MeasInfo {
    /// Display name; defaults to the measurement key
    pub displayname: String,
    pub unit: Option<String>,
    pub min_boundary: Option<f64>,
    pub max_boundary: Option<f64>,
    /// Whether the measurement appears in the run result plots
    pub run_result_plot: bool,
}

/// Best individual of one generation
#[derive(Debug, Clone)]
pub struct BestIndividual {
    pub individual: String,
    pub results: IndividualResult,
    pub chromosome: Vec<Value>,
}

fn generation_number(name: &str) -> Option<u32> {
    name.strip_prefix(GENERATION_PREFIX)?.parse().ok()
}

fn generation_path(run_dir: &Path, generation: u32) -> PathBuf {
    run_dir.join(format!("{}{}", GENERATION_PREFIX, generation))
}

/// List the generation directory names of a run, sorted by generation
/// number. Generations without any individual are skipped.
pub fn get_generations(run_dir: &Path) -> EvoVisResult<Vec<String>> {
    let mut generations: Vec<(u32, String)> = Vec::new();
    for entry in fs::read_dir(run_dir)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let Some(number) = generation_number(&name) else {
            continue;
        };
        if get_individuals_of_generation(run_dir, number)
            .map(|individuals| individuals.is_empty())
            .unwrap_or(true)
        {
            debug!("skipping empty generation directory '{}'", name);
            continue;
        }
        generations.push((number, name));
    }
    generations.sort_by_key(|(number, _)| *number);
    Ok(generations.into_iter().map(|(_, name)| name).collect())
}

/// Generation numbers of a run, sorted ascending.
pub fn get_generation_numbers(run_dir: &Path) -> EvoVisResult<Vec<u32>> {
    Ok(get_generations(run_dir)?
        .iter()
        .filter_map(|name| generation_number(name))
        .collect())
}

/// Individual directory names of one generation, sorted by name.
pub fn get_individuals_of_generation(
    run_dir: &Path,
    generation: u32,
) -> EvoVisResult<Vec<String>> {
    let mut individuals: Vec<String> = fs::read_dir(generation_path(run_dir, generation))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    individuals.sort();
    Ok(individuals)
}

/// The raw `hyperparameters` mapping of the run configuration.
pub fn get_hyperparameters(run_dir: &Path) -> EvoVisResult<IndexMap<String, Value>> {
    let config = read_json_value(&run_dir.join(CONFIG_FILE))?;
    let Some(hyperparameters) = config.get("hyperparameters").and_then(Value::as_object) else {
        return Err(EvoVisError::JsonError(format!(
            "missing 'hyperparameters' section in {}",
            CONFIG_FILE
        )));
    };
    Ok(hyperparameters
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect())
}

/// Measurement descriptors of the run configuration with defaults applied:
/// `displayname` falls back to the key, boundaries stay optional, and every
/// measurement is plotted unless the configuration opts out.
pub fn get_meas_info(run_dir: &Path) -> EvoVisResult<IndexMap<String, MeasInfo>> {
    let config = read_json_value(&run_dir.join(CONFIG_FILE))?;
    let Some(results) = config.get("results").and_then(Value::as_object) else {
        return Err(EvoVisError::JsonError(format!(
            "missing 'results' section in {}",
            CONFIG_FILE
        )));
    };

    let mut meas_info = IndexMap::new();
    for (name, descriptor) in results {
        let descriptor = descriptor.as_object();
        let get = |key: &str| descriptor.and_then(|d| d.get(key));
        meas_info.insert(
            name.clone(),
            MeasInfo {
                displayname: get("displayname")
                    .and_then(Value::as_str)
                    .unwrap_or(name)
                    .to_string(),
                unit: get("unit").and_then(Value::as_str).map(str::to_string),
                min_boundary: get("min-boundary").and_then(Value::as_f64),
                max_boundary: get("max-boundary").and_then(Value::as_f64),
                run_result_plot: get("run-result-plot")
                    .and_then(Value::as_bool)
                    .unwrap_or(true),
            },
        );
    }
    Ok(meas_info)
}

/// Replace a nested object of numbers by the mean of its values.
///
/// Individual measurements may be recorded per cross-validation fold; the
/// result pages work with the fold average.
fn flatten_measurement(value: &Value) -> Value {
    if let Some(obj) = value.as_object() {
        let numbers: Vec<f64> = obj.values().filter_map(Value::as_f64).collect();
        if !numbers.is_empty() && numbers.len() == obj.len() {
            return json!(numbers.iter().sum::<f64>() / numbers.len() as f64);
        }
    }
    value.clone()
}

/// Result mapping of one individual, nested numeric measurements averaged.
pub fn get_individual_result(
    run_dir: &Path,
    generation: u32,
    individual: &str,
) -> EvoVisResult<IndividualResult> {
    let path = generation_path(run_dir, generation)
        .join(individual)
        .join(RESULTS_FILE);
    let value = read_json_value(&path)?;
    let Some(obj) = value.as_object() else {
        return Err(EvoVisError::JsonError(format!(
            "{} is not a dictionary",
            path.display()
        )));
    };
    Ok(obj
        .iter()
        .map(|(k, v)| (k.clone(), flatten_measurement(v)))
        .collect())
}

/// Chromosome of one individual: the ordered list of selected gene records.
pub fn get_individual_chromosome(
    run_dir: &Path,
    generation: u32,
    individual: &str,
) -> EvoVisResult<Vec<Value>> {
    let path = generation_path(run_dir, generation)
        .join(individual)
        .join(CHROMOSOME_FILE);
    let value = read_json_value(&path)?;
    let Some(genes) = value.as_array() else {
        return Err(EvoVisError::JsonError(format!(
            "{} is not a list of genes",
            path.display()
        )));
    };
    Ok(genes.to_vec())
}

/// Results of every individual, keyed by generation number.
///
/// An individual whose result file is missing or malformed is kept with a
/// synthetic `error` entry, so the result pages can show it as failed
/// instead of dropping it.
pub fn get_results_by_generation(
    run_dir: &Path,
) -> EvoVisResult<BTreeMap<u32, IndexMap<String, IndividualResult>>> {
    let mut by_generation = BTreeMap::new();
    for generation in get_generation_numbers(run_dir)? {
        let mut results = IndexMap::new();
        for individual in get_individuals_of_generation(run_dir, generation)? {
            let result = match get_individual_result(run_dir, generation, &individual) {
                Ok(result) => result,
                Err(e) => {
                    debug!(
                        "individual '{}' of generation {} has no usable results: {}",
                        individual, generation, e
                    );
                    IndexMap::from([("error".to_string(), json!(e.to_string()))])
                }
            };
            results.insert(individual, result);
        }
        by_generation.insert(generation, results);
    }
    Ok(by_generation)
}

/// Chromosomes of every individual, keyed by generation number. Individuals
/// without a readable chromosome are skipped.
pub fn get_chromosomes_by_generation(
    run_dir: &Path,
) -> EvoVisResult<BTreeMap<u32, IndexMap<String, Vec<Value>>>> {
    let mut by_generation = BTreeMap::new();
    for generation in get_generation_numbers(run_dir)? {
        let mut chromosomes = IndexMap::new();
        for individual in get_individuals_of_generation(run_dir, generation)? {
            match get_individual_chromosome(run_dir, generation, &individual) {
                Ok(chromosome) => {
                    chromosomes.insert(individual, chromosome);
                }
                Err(e) => {
                    debug!(
                        "individual '{}' of generation {} has no usable chromosome: {}",
                        individual, generation, e
                    );
                }
            }
        }
        by_generation.insert(generation, chromosomes);
    }
    Ok(by_generation)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Partition all individuals into healthy and unhealthy ones.
///
/// An individual is healthy when its results carry every expected
/// measurement and its `error` entry, if present, is not truthy.
pub fn get_healthy_individuals_results(
    run_dir: &Path,
) -> EvoVisResult<(
    BTreeMap<u32, IndexMap<String, IndividualResult>>,
    BTreeMap<u32, IndexMap<String, IndividualResult>>,
)> {
    let meas_info = get_meas_info(run_dir)?;
    let results = get_results_by_generation(run_dir)?;

    let mut healthy = BTreeMap::new();
    let mut unhealthy = BTreeMap::new();
    for (generation, individuals) in results {
        let healthy_gen: &mut IndexMap<String, IndividualResult> =
            healthy.entry(generation).or_default();
        let unhealthy_gen: &mut IndexMap<String, IndividualResult> =
            unhealthy.entry(generation).or_default();
        for (individual, result) in individuals {
            let has_error = result.get("error").map(is_truthy).unwrap_or(false);
            let complete = meas_info.keys().all(|key| result.contains_key(key));
            if !has_error && complete {
                healthy_gen.insert(individual, result);
            } else {
                unhealthy_gen.insert(individual, result);
            }
        }
    }
    Ok((healthy, unhealthy))
}

/// The individual with the highest `fitness` of each generation, together
/// with its results and chromosome. Generations without a numeric fitness
/// are absent from the result.
pub fn get_best_individuals(run_dir: &Path) -> EvoVisResult<BTreeMap<u32, BestIndividual>> {
    let results = get_results_by_generation(run_dir)?;
    let mut chromosomes = get_chromosomes_by_generation(run_dir)?;

    let mut best = BTreeMap::new();
    for (generation, individuals) in results {
        let winner = individuals
            .into_iter()
            .filter_map(|(individual, result)| {
                let fitness = result.get("fitness").and_then(Value::as_f64)?;
                Some((individual, result, fitness))
            })
            .max_by(|a, b| a.2.total_cmp(&b.2));
        let Some((individual, result, _)) = winner else {
            continue;
        };
        let chromosome = chromosomes
            .get_mut(&generation)
            .and_then(|gen| gen.shift_remove(&individual))
            .unwrap_or_default();
        best.insert(
            generation,
            BestIndividual {
                individual,
                results: result,
                chromosome,
            },
        );
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn run_with_two_generations() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join(CONFIG_FILE),
            r#"{
                "hyperparameters": {"population_size": 10, "mutation_rate": 0.1},
                "results": {
                    "accuracy": {"displayname": "Accuracy", "unit": "%",
                                 "min-boundary": 0, "max-boundary": 100},
                    "fitness": {}
                }
            }"#,
        );
        write(
            &dir.path().join("Generation_1/ind1").join(RESULTS_FILE),
            r#"{"accuracy": 85.5, "fitness": 0.5}"#,
        );
        write(
            &dir.path().join("Generation_1/ind1").join(CHROMOSOME_FILE),
            r#"[{"layer": "Layer1"}]"#,
        );
        write(
            &dir.path().join("Generation_1/ind2").join(RESULTS_FILE),
            r#"{"accuracy": 90.0, "fitness": 0.8}"#,
        );
        write(
            &dir.path().join("Generation_1/ind2").join(CHROMOSOME_FILE),
            r#"[{"layer": "Layer2"}]"#,
        );
        write(
            &dir.path().join("Generation_2/ind3").join(RESULTS_FILE),
            r#"{"error": "Model failed to converge"}"#,
        );
        write(
            &dir.path().join("Generation_2/ind3").join(CHROMOSOME_FILE),
            "[]",
        );
        dir
    }

    #[test]
    fn test_get_generations_sorted_numerically() {
        let dir = run_with_two_generations();
        write(
            &dir.path().join("Generation_10/ind9").join(RESULTS_FILE),
            "{}",
        );
        fs::create_dir_all(dir.path().join("Generation_3")).unwrap();

        // Generation_3 is empty and skipped; Generation_10 sorts after 2
        let generations = get_generations(dir.path()).unwrap();
        assert_eq!(generations, vec!["Generation_1", "Generation_2", "Generation_10"]);
        assert_eq!(get_generation_numbers(dir.path()).unwrap(), vec![1, 2, 10]);
    }

    #[test]
    fn test_get_hyperparameters() {
        let dir = run_with_two_generations();
        let hyperparameters = get_hyperparameters(dir.path()).unwrap();
        assert_eq!(hyperparameters["population_size"], json!(10));
        assert_eq!(hyperparameters["mutation_rate"], json!(0.1));
    }

    #[test]
    fn test_get_meas_info_defaults() {
        let dir = run_with_two_generations();
        let meas_info = get_meas_info(dir.path()).unwrap();

        assert_eq!(meas_info["accuracy"].displayname, "Accuracy");
        assert_eq!(meas_info["accuracy"].unit.as_deref(), Some("%"));
        assert_eq!(meas_info["accuracy"].min_boundary, Some(0.0));
        assert_eq!(meas_info["accuracy"].max_boundary, Some(100.0));
        assert!(meas_info["accuracy"].run_result_plot);

        // Defaults for a bare descriptor
        assert_eq!(meas_info["fitness"].displayname, "fitness");
        assert_eq!(meas_info["fitness"].unit, None);
        assert!(meas_info["fitness"].run_result_plot);
    }

    #[test]
    fn test_get_individual_result_averages_nested_values() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("Generation_1/ind1").join(RESULTS_FILE),
            r#"{"accuracy": {"fold1": 80, "fold2": 90}, "fitness": 0.75}"#,
        );

        let result = get_individual_result(dir.path(), 1, "ind1").unwrap();
        assert_eq!(result["accuracy"], json!(85.0));
        assert_eq!(result["fitness"], json!(0.75));
    }

    #[test]
    fn test_get_individual_chromosome() {
        let dir = run_with_two_generations();
        let chromosome = get_individual_chromosome(dir.path(), 1, "ind1").unwrap();
        assert_eq!(chromosome.len(), 1);
        assert_eq!(chromosome[0]["layer"], json!("Layer1"));
    }

    #[test]
    fn test_results_by_generation_keeps_broken_individuals() {
        let dir = run_with_two_generations();
        fs::create_dir_all(dir.path().join("Generation_2/ind4")).unwrap();
        // ind4 has no results.json at all but still needs a results.json-less
        // chromosome directory to count as an individual
        write(
            &dir.path().join("Generation_2/ind4").join(CHROMOSOME_FILE),
            "[]",
        );

        let results = get_results_by_generation(dir.path()).unwrap();
        assert_eq!(results[&1].len(), 2);
        assert!(results[&2]["ind4"].contains_key("error"));
    }

    #[test]
    fn test_healthy_unhealthy_partition() {
        let dir = run_with_two_generations();
        let (healthy, unhealthy) = get_healthy_individuals_results(dir.path()).unwrap();

        assert!(healthy[&1].contains_key("ind1"));
        assert!(healthy[&1].contains_key("ind2"));
        assert!(healthy[&2].is_empty());
        assert!(unhealthy[&2].contains_key("ind3"));
    }

    #[test]
    fn test_get_best_individuals() {
        let dir = run_with_two_generations();
        let best = get_best_individuals(dir.path()).unwrap();

        assert_eq!(best[&1].individual, "ind2");
        assert_eq!(best[&1].results["fitness"], json!(0.8));
        assert_eq!(best[&1].chromosome[0]["layer"], json!("Layer2"));
        // Generation 2 has no individual with a numeric fitness
        assert!(!best.contains_key(&2));
    }
}
