// ABOUTME: Runtime assets shipped with every build
// ABOUTME: Playback scripts, stylesheet and cursor icons, bundled or read from an override directory

use crate::errors::{CastError, Result};
use crate::utils;
use log::info;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

/// Where an asset goes inside the build directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetLocation {
    Root,
    Images,
}

/// A file the playback engine expects next to the generated page.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeAsset {
    pub name: &'static str,
    pub location: AssetLocation,
    bundled: &'static [u8],
}

/// The fixed set of runtime files. Names and locations are part of the
/// contract with the playback engine.
pub const RUNTIME_ASSETS: &[RuntimeAsset] = &[
    RuntimeAsset {
        name: "dahuapp.viewer.js",
        location: AssetLocation::Root,
        bundled: include_bytes!("../resources/dahuapp.viewer.js"),
    },
    RuntimeAsset {
        name: "dahuapp.viewer.css",
        location: AssetLocation::Root,
        bundled: include_bytes!("../resources/dahuapp.viewer.css"),
    },
    RuntimeAsset {
        name: "dahuapp.js",
        location: AssetLocation::Root,
        bundled: include_bytes!("../resources/dahuapp.js"),
    },
    RuntimeAsset {
        name: "parse-search.js",
        location: AssetLocation::Root,
        bundled: include_bytes!("../resources/parse-search.js"),
    },
    RuntimeAsset {
        name: "cursor.png",
        location: AssetLocation::Images,
        bundled: include_bytes!("../resources/cursor.png"),
    },
    RuntimeAsset {
        name: "cursor-pause.png",
        location: AssetLocation::Images,
        bundled: include_bytes!("../resources/cursor-pause.png"),
    },
];

impl RuntimeAsset {
    /// Content of the asset. A file of the same name in `override_dir` wins
    /// over the bundled copy.
    pub fn content(&self, override_dir: Option<&Path>) -> Result<Cow<'static, [u8]>> {
        if let Some(dir) = override_dir {
            let path = dir.join(self.name);
            if path.is_file() {
                info!("Reading runtime asset override: {:?}", path);
                let bytes = fs::read(&path).map_err(|e| CastError::io(&path, e))?;
                return Ok(Cow::Owned(bytes));
            }
        }
        Ok(Cow::Borrowed(self.bundled))
    }

    pub fn destination(&self, output_dir: &Path, image_dir_name: &str) -> PathBuf {
        match self.location {
            AssetLocation::Root => output_dir.join(self.name),
            AssetLocation::Images => output_dir.join(image_dir_name).join(self.name),
        }
    }
}

/// Copy every runtime asset into the build directory, unchanged.
pub fn copy_runtime_assets(
    output_dir: &Path,
    image_dir_name: &str,
    override_dir: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(RUNTIME_ASSETS.len());
    for asset in RUNTIME_ASSETS {
        let target = asset.destination(output_dir, image_dir_name);
        utils::ensure_parent_directory_exists(&target)?;
        let content = asset.content(override_dir)?;
        fs::write(&target, content.as_ref()).map_err(|e| CastError::io(&target, e))?;
        written.push(target);
    }
    info!("Copied {} runtime assets", written.len());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_contract() {
        let out = Path::new("/build");
        let names: Vec<PathBuf> = RUNTIME_ASSETS
            .iter()
            .map(|a| a.destination(out, "img"))
            .collect();
        assert_eq!(
            names,
            vec![
                out.join("dahuapp.viewer.js"),
                out.join("dahuapp.viewer.css"),
                out.join("dahuapp.js"),
                out.join("parse-search.js"),
                out.join("img").join("cursor.png"),
                out.join("img").join("cursor-pause.png"),
            ]
        );
    }

    #[test]
    fn test_bundled_cursors_are_png() {
        for asset in RUNTIME_ASSETS
            .iter()
            .filter(|a| a.location == AssetLocation::Images)
        {
            let bytes = asset.content(None).unwrap();
            assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n", "{}", asset.name);
        }
    }

    #[test]
    fn test_override_dir_wins() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("dahuapp.js"), b"// custom").unwrap();

        let asset = RUNTIME_ASSETS
            .iter()
            .find(|a| a.name == "dahuapp.js")
            .unwrap();
        assert_eq!(asset.content(Some(temp.path())).unwrap().as_ref(), b"// custom");

        let other = RUNTIME_ASSETS
            .iter()
            .find(|a| a.name == "parse-search.js")
            .unwrap();
        assert!(matches!(other.content(Some(temp.path())).unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_copy_runtime_assets() {
        let temp = TempDir::new().unwrap();
        let written = copy_runtime_assets(temp.path(), "img", None).unwrap();
        assert_eq!(written.len(), 6);
        assert!(written.iter().all(|p| p.is_file()));
        assert_eq!(
            fs::read(temp.path().join("dahuapp.viewer.css")).unwrap(),
            RUNTIME_ASSETS[1].content(None).unwrap().as_ref()
        );
    }
}
