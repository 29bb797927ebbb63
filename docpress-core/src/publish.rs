//! Output publishing: hands full documents to the renderer and attaches
//! companion archives.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::archive::zip_companion;
use crate::contract::{Archiver, RenderedArtifact, Renderer};
use crate::error::RenderError;

pub struct Publisher<'a> {
    renderer: &'a dyn Renderer,
    archiver: &'a dyn Archiver,
}

impl<'a> Publisher<'a> {
    pub fn new(renderer: &'a dyn Renderer, archiver: &'a dyn Archiver) -> Self {
        Self { renderer, archiver }
    }

    /// Renders `full_document` to `output`, creating missing parent
    /// directories first.
    pub async fn publish(
        &self,
        full_document: &str,
        output: &Path,
    ) -> Result<RenderedArtifact, RenderError> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.renderer.render(full_document, output).await?;
        info!(output = %output.display(), "Published artifact");
        Ok(RenderedArtifact {
            path: output.to_path_buf(),
            companion: None,
        })
    }

    /// Archives `<folder>/src` next to an already published artifact.
    ///
    /// Archive failures are logged and leave `artifact` as it was.
    pub fn attach_companion(
        &self,
        artifact: &mut RenderedArtifact,
        folder: &Path,
        output_dir: &Path,
        base_name: &str,
    ) {
        match zip_companion(self.archiver, folder, output_dir, base_name) {
            Ok(companion) => artifact.companion = companion,
            Err(e) => warn!(
                folder = %folder.display(),
                artifact = %artifact.path.display(),
                error = %e,
                "Failed to write companion archive"
            ),
        }
    }
}
