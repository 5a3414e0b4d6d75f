//! Block model definitions with parent inheritance.
//!
//! A model names up to six face textures, either directly or through `#name`
//! references into its `defines` table. Models may inherit from a parent.
//! [`ModelSet::resolve_named`] walks each requested chain once at load time
//! and produces flat [`ResolvedModel`]s; nothing walks parents afterwards.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest parent chain accepted, and the longest `#ref` → `#ref` chain.
pub const MAX_MODEL_DEPTH: usize = 16;

/// Errors returned while parsing or flattening models.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("model '{model}' has unknown parent '{parent}'")]
    UnknownParent { model: String, parent: String },

    #[error("model '{0}' has a parent cycle")]
    ParentCycle(String),

    #[error("model '{0}' exceeds the maximum inheritance depth of {MAX_MODEL_DEPTH}")]
    TooDeep(String),

    #[error("model '{0}' does not define faces anywhere in its chain")]
    MissingFaces(String),

    #[error("model '{model}' cannot resolve texture reference '{reference}'")]
    UnresolvedTexture { model: String, reference: String },

    #[error("model parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Texture reference for each face. Values are either texture ids or `#define` names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFaces {
    pub west: String,
    pub east: String,
    pub down: String,
    pub up: String,
    pub north: String,
    pub south: String,
}

/// One model as written on disk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDef {
    pub parent: Option<String>,
    /// Texture variables. Children override parents.
    pub defines: BTreeMap<String, String>,
    /// Face layout. The nearest definition in the chain wins.
    pub faces: Option<ModelFaces>,
}

/// A model with inheritance and texture references fully applied.
///
/// `faces` is ordered west, east, down, up, north, south.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedModel {
    pub faces: [String; 6],
}

/// A named collection of model definitions.
#[derive(Clone, Debug, Default)]
pub struct ModelSet {
    models: HashMap<String, ModelDef>,
}

impl ModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a RON map of `name: ModelDef`.
    pub fn from_ron_str(text: &str) -> Result<Self, ModelError> {
        let models: HashMap<String, ModelDef> = ron::from_str(text)?;
        Ok(Self { models })
    }

    pub fn insert(&mut self, name: &str, def: ModelDef) {
        self.models.insert(name.to_string(), def);
    }

    pub fn get(&self, name: &str) -> Option<&ModelDef> {
        self.models.get(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Returns `name` followed by its ancestors, nearest first.
    fn chain(&self, name: &str) -> Result<Vec<&ModelDef>, ModelError> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = name;
        loop {
            let def = match self.models.get(current) {
                Some(def) => def,
                None if current == name => return Err(ModelError::UnknownModel(name.to_string())),
                None => {
                    return Err(ModelError::UnknownParent {
                        model: name.to_string(),
                        parent: current.to_string(),
                    });
                }
            };
            if !seen.insert(current) {
                return Err(ModelError::ParentCycle(name.to_string()));
            }
            if chain.len() >= MAX_MODEL_DEPTH {
                return Err(ModelError::TooDeep(name.to_string()));
            }
            chain.push(def);
            match &def.parent {
                Some(parent) => current = parent,
                None => return Ok(chain),
            }
        }
    }

    /// Flattens one model.
    pub fn resolve(&self, name: &str) -> Result<ResolvedModel, ModelError> {
        let chain = self.chain(name)?;

        let mut defines: BTreeMap<&str, &str> = BTreeMap::new();
        for def in chain.iter().rev() {
            for (key, value) in &def.defines {
                defines.insert(key.as_str(), value.as_str());
            }
        }
        let faces = chain
            .iter()
            .find_map(|def| def.faces.as_ref())
            .ok_or_else(|| ModelError::MissingFaces(name.to_string()))?;

        let lookup = |reference: &str| -> Result<String, ModelError> {
            let mut value = reference;
            for _ in 0..=MAX_MODEL_DEPTH {
                match value.strip_prefix('#') {
                    Some(key) => match defines.get(key) {
                        Some(&next) => value = next,
                        None => break,
                    },
                    None => return Ok(value.to_string()),
                }
            }
            Err(ModelError::UnresolvedTexture {
                model: name.to_string(),
                reference: reference.to_string(),
            })
        };

        Ok(ResolvedModel {
            faces: [
                lookup(&faces.west)?,
                lookup(&faces.east)?,
                lookup(&faces.down)?,
                lookup(&faces.up)?,
                lookup(&faces.north)?,
                lookup(&faces.south)?,
            ],
        })
    }

    /// Flattens each of `names`, stopping at the first failure.
    pub fn resolve_named<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<HashMap<String, ResolvedModel>, ModelError> {
        let mut resolved = HashMap::new();
        for name in names {
            resolved.insert(name.to_string(), self.resolve(name)?);
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODELS: &str = r##"{
        "cube": (
            faces: Some((
                west: "#west", east: "#east", down: "#down",
                up: "#up", north: "#north", south: "#south",
            )),
        ),
        "cube_all": (
            parent: Some("cube"),
            defines: {
                "west": "#all", "east": "#all", "down": "#all",
                "up": "#all", "north": "#all", "south": "#all",
            },
        ),
        "cube_bottom_top": (
            parent: Some("cube"),
            defines: {
                "west": "#side", "east": "#side", "north": "#side",
                "south": "#side", "down": "#bottom", "up": "#top",
            },
        ),
        "stone": (parent: Some("cube_all"), defines: { "all": "stone" }),
        "grass_block": (
            parent: Some("cube_bottom_top"),
            defines: { "top": "grass_block_top", "side": "grass_block_side", "bottom": "dirt" },
        ),
    }"##;

    #[test]
    fn test_resolve_through_two_parents() {
        let set = ModelSet::from_ron_str(MODELS).unwrap();
        let stone = set.resolve("stone").unwrap();
        assert!(stone.faces.iter().all(|f| f == "stone"));

        let grass = set.resolve("grass_block").unwrap();
        assert_eq!(
            grass.faces,
            [
                "grass_block_side",
                "grass_block_side",
                "dirt",
                "grass_block_top",
                "grass_block_side",
                "grass_block_side",
            ]
            .map(String::from)
        );
    }

    #[test]
    fn test_child_defines_override_parent() {
        let mut set = ModelSet::from_ron_str(MODELS).unwrap();
        let mut defines = BTreeMap::new();
        defines.insert("all".to_string(), "cobblestone".to_string());
        defines.insert("up".to_string(), "mossy".to_string());
        set.insert(
            "mossy_cobble",
            ModelDef {
                parent: Some("cube_all".to_string()),
                defines,
                faces: None,
            },
        );
        let model = set.resolve("mossy_cobble").unwrap();
        assert_eq!(model.faces[3], "mossy");
        assert_eq!(model.faces[0], "cobblestone");
    }

    #[test]
    fn test_resolve_named() {
        let set = ModelSet::from_ron_str(MODELS).unwrap();
        let resolved = set.resolve_named(["stone", "grass_block"]).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved["stone"].faces[0], "stone");

        // Templates leave their references open, so resolving one directly fails.
        let err = set.resolve_named(["stone", "cube"]).unwrap_err();
        assert!(matches!(err, ModelError::UnresolvedTexture { model, .. } if model == "cube"));
    }

    #[test]
    fn test_missing_faces() {
        let mut set = ModelSet::new();
        set.insert("abstract", ModelDef::default());
        assert!(matches!(set.resolve("abstract"), Err(ModelError::MissingFaces(_))));
    }

    #[test]
    fn test_parent_cycle_detected() {
        let mut set = ModelSet::new();
        set.insert(
            "a",
            ModelDef {
                parent: Some("b".into()),
                ..Default::default()
            },
        );
        set.insert(
            "b",
            ModelDef {
                parent: Some("a".into()),
                ..Default::default()
            },
        );
        assert!(matches!(set.resolve("a"), Err(ModelError::ParentCycle(_))));
    }

    #[test]
    fn test_depth_limit() {
        let mut set = ModelSet::new();
        for i in 0..(MAX_MODEL_DEPTH + 4) {
            set.insert(
                &format!("m{i}"),
                ModelDef {
                    parent: Some(format!("m{}", i + 1)),
                    ..Default::default()
                },
            );
        }
        set.insert(&format!("m{}", MAX_MODEL_DEPTH + 4), ModelDef::default());
        assert!(matches!(set.resolve("m0"), Err(ModelError::TooDeep(_))));
    }

    #[test]
    fn test_unknown_parent_and_model() {
        let mut set = ModelSet::new();
        set.insert(
            "orphan",
            ModelDef {
                parent: Some("ghost".into()),
                ..Default::default()
            },
        );
        assert!(matches!(
            set.resolve("orphan"),
            Err(ModelError::UnknownParent { parent, .. }) if parent == "ghost"
        ));
        assert!(matches!(set.resolve("nothing"), Err(ModelError::UnknownModel(_))));
    }

    #[test]
    fn test_self_referencing_define_is_unresolved() {
        let mut set = ModelSet::new();
        let mut defines = BTreeMap::new();
        defines.insert("loop".to_string(), "#loop".to_string());
        let hash_loop = "#loop".to_string();
        set.insert(
            "bad",
            ModelDef {
                defines,
                faces: Some(ModelFaces {
                    west: hash_loop.clone(),
                    east: hash_loop.clone(),
                    down: hash_loop.clone(),
                    up: hash_loop.clone(),
                    north: hash_loop.clone(),
                    south: hash_loop,
                }),
                ..Default::default()
            },
        );
        assert!(matches!(
            set.resolve("bad"),
            Err(ModelError::UnresolvedTexture { .. })
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            ModelSet::from_ron_str("{ not ron"),
            Err(ModelError::Parse(_))
        ));
    }
}
