//! Removing image files once the post rows referencing them are gone.
//! The write path calls this after its storage transaction commits; there is
//! no signal or event bus in between, just an explicit call.

use anyhow::{anyhow, Context};
use std::path::{Component, Path, PathBuf};

/// Where post images live. Only removal is needed here: uploads are handled
/// by a separate service that writes into the same media root.
pub trait MediaStore: Send + Sync {
    fn remove(&self, image: &str) -> Result<(), anyhow::Error>;
}

/// Images on the local filesystem under a single root directory.
#[derive(Clone, Debug)]
pub struct LocalMedia {
    root: PathBuf,
}

impl LocalMedia {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl MediaStore for LocalMedia {
    fn remove(&self, image: &str) -> Result<(), anyhow::Error> {
        // Image names come from stored rows, but never let one climb out of the root.
        let relative = Path::new(image);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(anyhow!("refusing to remove non-normal path {:?}", image));
        }
        let path = self.root.join(relative);
        std::fs::remove_file(&path).with_context(|| format!("removing image {:?}", path))?;
        Ok(())
    }
}
