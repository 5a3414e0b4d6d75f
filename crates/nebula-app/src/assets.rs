//! Block catalog and atlas assembly from the configured asset locations.

use std::path::Path;

use nebula_materials::{
    Atlas, AtlasBuilder, DirTextureSource, MemoryTextureSource, ModelError, ModelSet,
    TextureSource, load_textures,
};
use nebula_voxel::{BlockCatalog, FaceTextures};

/// Errors raised while reading block assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Reads a model file. A missing file yields `None`.
pub fn load_models(path: &Path) -> Result<Option<ModelSet>, AssetError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No block models at {}, using built-in faces", path.display());
            return Ok(None);
        }
        Err(source) => {
            return Err(AssetError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let models = ModelSet::from_ron_str(&text)?;
    tracing::info!("Loaded {} block models from {}", models.len(), path.display());
    Ok(Some(models))
}

/// Replaces the face textures of every block that has a model of the same name.
///
/// Returns the number of blocks updated.
pub fn apply_models(catalog: &mut BlockCatalog, models: &ModelSet) -> Result<usize, ModelError> {
    let targets: Vec<_> = catalog
        .iter()
        .filter(|(_, block)| !block.is_air && models.get(&block.name).is_some())
        .map(|(id, block)| (id, block.name.clone()))
        .collect();
    let resolved = models.resolve_named(targets.iter().map(|(_, name)| name.as_str()))?;

    let mut applied = 0;
    for (id, name) in targets {
        if let (Some(block), Some(model)) = (catalog.get_mut(id), resolved.get(&name)) {
            block.faces = FaceTextures::from_array(model.faces.clone());
            applied += 1;
        }
    }
    Ok(applied)
}

/// Texture source for `dir`, or an empty one when it cannot be opened.
///
/// With an empty source every block face falls back to the placeholder.
pub fn texture_source(dir: &Path) -> Box<dyn TextureSource> {
    match DirTextureSource::open(dir) {
        Ok(source) => Box::new(source),
        Err(e) => {
            tracing::warn!("Block textures unavailable ({e}), using placeholders");
            Box::new(MemoryTextureSource::new())
        }
    }
}

/// Loads every texture the catalog references and packs them into one atlas.
pub fn build_block_atlas(
    catalog: &BlockCatalog,
    source: &dyn TextureSource,
    build_mips: bool,
) -> Atlas {
    let ids = catalog.texture_ids();
    let mut builder = AtlasBuilder::new("blocks").build_mips(build_mips);
    for (id, image) in load_textures(source, &ids) {
        builder.add(&id, image);
    }
    let atlas = builder.build();
    tracing::info!(
        "Packed {} textures into a {}x{} atlas ({} mip levels)",
        atlas.len(),
        atlas.width(),
        atlas.height(),
        atlas.mip_level_count()
    );
    atlas
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};
    use nebula_materials::MISSING_TEXTURE;
    use nebula_voxel::FaceDirection;
    use nebula_voxel::blocks::{COBBLESTONE, STONE, default_catalog};

    use super::*;

    const MODELS: &str = r##"{
        "cube_all": (
            faces: Some((
                west: "#all", east: "#all", down: "#all",
                up: "#all", north: "#all", south: "#all",
            )),
        ),
        "stone": (parent: Some("cube_all"), defines: { "all": "smooth_stone" }),
    }"##;

    #[test]
    fn test_apply_models_overrides_named_blocks() {
        let mut catalog = default_catalog();
        let models = ModelSet::from_ron_str(MODELS).unwrap();
        let applied = apply_models(&mut catalog, &models).unwrap();
        assert_eq!(applied, 1);
        assert_eq!(catalog.get(STONE).texture(FaceDirection::PosY), "smooth_stone");
        assert_eq!(catalog.get(COBBLESTONE).texture(FaceDirection::PosY), "cobblestone");
    }

    #[test]
    fn test_apply_models_propagates_broken_chain() {
        let mut catalog = default_catalog();
        let models = ModelSet::from_ron_str(r#"{ "stone": (parent: Some("nowhere")) }"#).unwrap();
        assert!(apply_models(&mut catalog, &models).is_err());
    }

    #[test]
    fn test_missing_model_file_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_models(&tmp.path().join("none.ron")).unwrap().is_none());
    }

    #[test]
    fn test_load_models_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("block.ron");
        std::fs::write(&path, MODELS).unwrap();
        let models = load_models(&path).unwrap().unwrap();
        assert_eq!(models.len(), 2);
    }

    #[test]
    fn test_atlas_holds_every_catalog_texture() {
        let catalog = default_catalog();
        let mut source = MemoryTextureSource::new();
        source.insert("stone", RgbaImage::from_pixel(16, 16, Rgba([90, 90, 90, 255])));
        let atlas = build_block_atlas(&catalog, &source, false);
        for id in catalog.texture_ids() {
            assert!(atlas.contains(&id), "missing {id}");
        }
        assert!(atlas.contains(MISSING_TEXTURE));
        assert_eq!(atlas.mip_level_count(), 1);
    }

    #[test]
    fn test_unreadable_texture_dir_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        let source = texture_source(&tmp.path().join("absent"));
        assert!(source.load("stone").is_err());
    }
}
