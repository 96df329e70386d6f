/*!
Search space JSON parser.

Parses the hand-authored `search_space.json` of an EvoNAS run into typed
data structures.

## Search Space Structure

```json
{
  "gene_pool": {
    "Feature Extraction 2D": [
      {"layer": "STFT_2D", "f_name": "stft_2d", "exclude": false},
      {"layer": "MAG_2D", "f_name": "mag_2d"}
    ]
  },
  "rule_set": {
    "Start": {"rule": ["STFT_2D"]},
    "STFT_2D": ["MAG_2D"]
  },
  "rule_set_group": [
    {"group": "Feature Extraction 2D", "rule": ["Processing 2D"], "exclude": false}
  ]
}
```

Rule files are hand-edited; both rule value spellings (bare list and
`{"rule": [...]}` object) occur in the wild and both are accepted. Unknown
gene fields (`f_name`, layer parameters) are tolerated and ignored.
*/

use indexmap::IndexMap;
use serde::Deserialize;

use crate::types::{EvoVisError, EvoVisResult};

/// One selectable network layer entry of the gene pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gene {
    /// Layer name, globally unique across all groups
    pub layer: String,
    /// Excluded genes stay in the pool but are never wired into the graph
    pub exclude: bool,
}

/// One group-level production rule: which groups may follow this group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRule {
    pub group: String,
    pub rule: Vec<String>,
    /// An excluded rule contributes no edges
    pub exclude: bool,
}

/// Parsed search space ready for graph construction.
#[derive(Debug, Clone, Default)]
pub struct SearchSpace {
    /// Group name -> ordered genes; document order is preserved
    pub gene_pool: IndexMap<String, Vec<Gene>>,
    /// Layer name (or "Start") -> successor layer names
    pub rule_set: IndexMap<String, Vec<String>>,
    /// Group-to-group production rules
    pub rule_set_group: Vec<GroupRule>,
}

/// Raw search space JSON structure for deserialization
#[derive(Debug, Clone, Deserialize)]
struct RawSearchSpace {
    #[serde(default)]
    gene_pool: IndexMap<String, Vec<RawGene>>,
    #[serde(default)]
    rule_set: IndexMap<String, RawRule>,
    #[serde(default)]
    rule_set_group: Vec<RawGroupRule>,
}

/// Raw gene entry; extra fields of the authoring format are ignored
#[derive(Debug, Clone, Deserialize)]
struct RawGene {
    layer: String,
    #[serde(default)]
    exclude: bool,
}

/// A rule value is either a bare successor list or a `{"rule": [...]}` object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawRule {
    List(Vec<String>),
    Entry {
        #[serde(default)]
        rule: Vec<String>,
    },
}

impl RawRule {
    fn into_successors(self) -> Vec<String> {
        match self {
            RawRule::List(rule) => rule,
            RawRule::Entry { rule } => rule,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawGroupRule {
    group: String,
    #[serde(default)]
    rule: Vec<String>,
    #[serde(default)]
    exclude: bool,
}

/// Search space parser
pub struct SearchSpaceParser;

impl SearchSpaceParser {
    /// Parse a search space JSON string into a [`SearchSpace`]
    pub fn parse(json_str: &str) -> EvoVisResult<SearchSpace> {
        let raw: RawSearchSpace = serde_json::from_str(json_str)
            .map_err(|e| EvoVisError::InvalidSearchSpace(format!("failed to parse JSON: {}", e)))?;

        let gene_pool = raw
            .gene_pool
            .into_iter()
            .map(|(group, genes)| {
                let genes = genes
                    .into_iter()
                    .map(|g| Gene {
                        layer: g.layer,
                        exclude: g.exclude,
                    })
                    .collect();
                (group, genes)
            })
            .collect();

        let rule_set = raw
            .rule_set
            .into_iter()
            .map(|(layer, rule)| (layer, rule.into_successors()))
            .collect();

        let rule_set_group = raw
            .rule_set_group
            .into_iter()
            .map(|r| GroupRule {
                group: r.group,
                rule: r.rule,
                exclude: r.exclude,
            })
            .collect();

        Ok(SearchSpace {
            gene_pool,
            rule_set,
            rule_set_group,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_both_rule_spellings() {
        let json = r#"{
            "gene_pool": {
                "Feature Extraction 2D": [
                    {"layer": "STFT_2D", "f_name": "stft_2d"},
                    {"layer": "MAG_2D", "exclude": true}
                ]
            },
            "rule_set": {
                "Start": {"rule": ["STFT_2D"]},
                "STFT_2D": ["MAG_2D"]
            },
            "rule_set_group": [
                {"group": "Feature Extraction 2D", "rule": ["Feature Extraction 2D"]}
            ]
        }"#;

        let space = SearchSpaceParser::parse(json).unwrap();

        assert_eq!(space.gene_pool["Feature Extraction 2D"].len(), 2);
        assert!(!space.gene_pool["Feature Extraction 2D"][0].exclude);
        assert!(space.gene_pool["Feature Extraction 2D"][1].exclude);

        assert_eq!(space.rule_set["Start"], vec!["STFT_2D"]);
        assert_eq!(space.rule_set["STFT_2D"], vec!["MAG_2D"]);

        assert_eq!(space.rule_set_group.len(), 1);
        assert!(!space.rule_set_group[0].exclude);
    }

    #[test]
    fn test_parse_missing_sections_default_empty() {
        let space = SearchSpaceParser::parse("{}").unwrap();
        assert!(space.gene_pool.is_empty());
        assert!(space.rule_set.is_empty());
        assert!(space.rule_set_group.is_empty());
    }

    #[test]
    fn test_parse_invalid_json_is_an_error() {
        let result = SearchSpaceParser::parse("{invalid json}");
        assert!(matches!(result, Err(EvoVisError::InvalidSearchSpace(_))));
    }

    #[test]
    fn test_document_order_is_preserved() {
        let json = r#"{
            "gene_pool": {
                "Zeta": [{"layer": "Z1"}],
                "Alpha": [{"layer": "A1"}]
            }
        }"#;

        let space = SearchSpaceParser::parse(json).unwrap();
        let groups: Vec<&String> = space.gene_pool.keys().collect();
        assert_eq!(groups, vec!["Zeta", "Alpha"]);
    }
}
