//! Module providing JSON IO for community descriptors
//!
//! A descriptor lists the organisms, each with its reactions given inline or as a path to a
//! reaction table, and the shared medium:
//!
//! ```json
//! {
//!   "organisms": [
//!     {"id": "ecoli", "biomass_reaction": "bio1", "reactions_file": "ecoli.tsv"},
//!     {"id": "toy", "reactions": [{"id": "bio1", "equation": "(1) a[e] =>"}]}
//!   ],
//!   "medium": [{"compound": "glc", "lower_bound": -10.0, "upper_bound": 1000.0}]
//! }
//! ```
//!
//! Relative reaction table paths are resolved against the directory of the descriptor.
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::community::medium::SharedMedium;
use crate::community::{Community, SteadyComError};
use crate::io::table::{ReactionRecord, ReactionTable, TableError};
use crate::metabolic_model::model::{Model, ModelError};

// region JSON Community
/// Represents a JSON serialized community
#[derive(Serialize, Deserialize)]
struct JsonCommunity {
    organisms: Vec<JsonOrganism>,
    #[serde(default)]
    medium: Vec<JsonMediumCompound>,
}

#[derive(Serialize, Deserialize)]
struct JsonOrganism {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    biomass_reaction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reactions: Option<Vec<ReactionRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reactions_file: Option<PathBuf>,
}

#[derive(Serialize, Deserialize)]
struct JsonMediumCompound {
    compound: String,
    lower_bound: f64,
    upper_bound: f64,
}
// endregion JSON Community

// region Conversions
impl JsonOrganism {
    fn into_model(self, base_dir: &Path) -> Result<Model, JsonError> {
        let records = match (self.reactions, self.reactions_file) {
            (Some(records), None) => records,
            (None, Some(file)) => ReactionTable::read_tsv(base_dir.join(file))?.records,
            (Some(_), Some(_)) => {
                return Err(JsonError::InvalidOrganism(format!(
                    "{} has both inline reactions and a reactions file",
                    self.id
                )))
            }
            (None, None) => {
                return Err(JsonError::InvalidOrganism(format!(
                    "{} has neither inline reactions nor a reactions file",
                    self.id
                )))
            }
        };
        Ok(Model::from_reaction_table(
            &self.id,
            &records,
            self.biomass_reaction.as_deref(),
        )?)
    }
}

impl From<&Model> for JsonOrganism {
    fn from(model: &Model) -> Self {
        let records = model
            .reactions
            .values()
            .map(|r| ReactionRecord {
                id: r.id.clone(),
                equation: r.equation.clone(),
                name: r.name.clone(),
                lower_bound: Some(r.lower_bound),
                upper_bound: Some(r.upper_bound),
            })
            .collect();
        JsonOrganism {
            id: model.id.clone(),
            biomass_reaction: Some(model.biomass_reaction.clone()),
            reactions: Some(records),
            reactions_file: None,
        }
    }
}

impl Community {
    /// Read a community descriptor, reaction table paths are relative to its directory
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Community, JsonError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .map_err(|err| JsonError::UnableToRead(format!("{}: {}", path.display(), err)))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Community::from_json(serde_json::from_str(&data)?, base_dir)
    }

    /// Parse a community descriptor, reaction table paths are relative to the working
    /// directory
    ///
    /// # Examples
    /// ```rust
    /// use steadycom_core::community::Community;
    /// let data = r#"{
    ///     "organisms": [{"id": "org", "reactions": [
    ///         {"id": "EX_a", "equation": "(1) a[e] <=>"},
    ///         {"id": "bio1", "equation": "(1) a[e] =>"}
    ///     ]}],
    ///     "medium": [{"compound": "a", "lower_bound": -10.0, "upper_bound": 1000.0}]
    /// }"#;
    /// let community = Community::from_json_str(data).unwrap();
    /// assert_eq!(community.organisms.len(), 1);
    /// assert_eq!(community.medium.get("a").unwrap().lower_bound, -10.);
    /// ```
    pub fn from_json_str(data: &str) -> Result<Community, JsonError> {
        Community::from_json(serde_json::from_str(data)?, Path::new(""))
    }

    /// Write the community with every organism's reactions inline
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let community_string = serde_json::to_string_pretty(&self.to_json())?;
        fs::write(path, community_string)?;
        Ok(())
    }

    fn from_json(json_community: JsonCommunity, base_dir: &Path) -> Result<Self, JsonError> {
        let organisms = json_community
            .organisms
            .into_iter()
            .map(|o| o.into_model(base_dir))
            .collect::<Result<Vec<Model>, JsonError>>()?;
        let mut medium = SharedMedium::new();
        for compound in json_community.medium {
            medium.add_compound(
                &compound.compound,
                compound.lower_bound,
                compound.upper_bound,
            )?;
        }
        Ok(Community { organisms, medium })
    }

    fn to_json(&self) -> JsonCommunity {
        JsonCommunity {
            organisms: self.organisms.iter().map(JsonOrganism::from).collect(),
            medium: self
                .medium
                .compounds()
                .map(|(compound, bounds)| JsonMediumCompound {
                    compound: compound.clone(),
                    lower_bound: bounds.lower_bound,
                    upper_bound: bounds.upper_bound,
                })
                .collect(),
        }
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Serde json parse error")]
    SerdeJsonParseError(#[from] serde_json::Error),
    #[error("Invalid organism: {0}")]
    InvalidOrganism(String),
    #[error("Unable to read reaction table")]
    Table(#[from] TableError),
    #[error("Unable to build organism model")]
    Model(#[from] ModelError),
    #[error("Invalid medium")]
    Medium(#[from] SteadyComError),
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
}
// endregion Conversions

#[cfg(test)]
mod json_tests {
    use super::*;

    const TOY: &str = r#"{
"organisms":[
{
"id":"producer",
"biomass_reaction":"growth",
"reactions":[
{"id":"EX_glc","equation":"(1) glc[e] <=>","lower_bound":-10.0,"upper_bound":1000.0},
{"id":"R1","name":"glucose to acetate","equation":"(1) glc[e] => (1) ac[e] + (1) x[c]"},
{"id":"EX_ac","equation":"(1) ac[e] <=>"},
{"id":"growth","equation":"(1) x[c] =>"}
]
}
],
"medium":[
{"compound":"glc","lower_bound":-10.0,"upper_bound":1000.0},
{"compound":"ac","lower_bound":0.0,"upper_bound":1000.0}
]
}"#;

    #[test]
    fn inline_reactions() {
        let community = Community::from_json_str(TOY).unwrap();
        let producer = &community.organisms[0];
        assert_eq!(producer.biomass_reaction, "growth");
        assert_eq!(producer.reactions.len(), 4);
        assert_eq!(
            producer.reactions["R1"].name.as_deref(),
            Some("glucose to acetate")
        );
        assert_eq!(producer.reactions["EX_glc"].lower_bound, -10.);
        assert_eq!(producer.reactions["R1"].lower_bound, 0.);
        assert_eq!(community.medium.len(), 2);
    }

    #[test]
    fn reactions_file() {
        let dir = std::env::temp_dir().join(format!("steadycom_json_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("org.tsv"),
            "id\tequation\nEX_a\t(1) a[e] <=>\nbio1\t(1) a[e] =>\n",
        )
        .unwrap();
        let descriptor = dir.join("community.json");
        fs::write(
            &descriptor,
            r#"{"organisms":[{"id":"org","reactions_file":"org.tsv"}]}"#,
        )
        .unwrap();
        let community = Community::read_json(&descriptor).unwrap();
        assert_eq!(community.organisms[0].reactions.len(), 2);
        assert!(community.medium.is_empty());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn write_then_read() {
        let community = Community::from_json_str(TOY).unwrap();
        let path =
            std::env::temp_dir().join(format!("steadycom_write_{}.json", std::process::id()));
        community.write_json(&path).unwrap();
        let read_back = Community::read_json(&path).unwrap();
        fs::remove_file(&path).unwrap();
        let producer = &read_back.organisms[0];
        assert_eq!(producer.biomass_reaction, "growth");
        assert_eq!(producer.reactions["EX_glc"].lower_bound, -10.);
        assert_eq!(
            producer.stoichiometry,
            community.organisms[0].stoichiometry
        );
        assert_eq!(read_back.medium, community.medium);
    }

    #[test]
    fn organism_without_reactions() {
        match Community::from_json_str(r#"{"organisms":[{"id":"org"}]}"#) {
            Err(JsonError::InvalidOrganism(msg)) => assert!(msg.contains("org")),
            other => panic!("Organism without reactions not caught: {:?}", other.err()),
        }
    }

    #[test]
    fn bad_medium() {
        let data = r#"{"organisms":[{"id":"org","reactions":[{"id":"bio1","equation":"(1) a[e] =>"}]}],
"medium":[{"compound":"a","lower_bound":1.0,"upper_bound":0.0}]}"#;
        assert!(matches!(
            Community::from_json_str(data),
            Err(JsonError::Medium(SteadyComError::InvalidParameter(_)))
        ));
    }

    #[test]
    fn bad_equation() {
        let data = r#"{"organisms":[{"id":"org","reactions":[{"id":"bio1","equation":"a[e] =>"}]}]}"#;
        assert!(matches!(
            Community::from_json_str(data),
            Err(JsonError::Model(ModelError::Stoichiometry(_)))
        ));
    }
}
