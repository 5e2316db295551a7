use crate::common::*;

/// Pairs the image files of a split with their annotation files.
///
/// Both directories are listed, sorted by file name and paired by position. With pairing
/// verification on, each image and label at the same position must share a file stem.
#[derive(Debug, Clone)]
pub struct DatasetIndexBuilder {
    verify_pairing: bool,
}

impl Default for DatasetIndexBuilder {
    fn default() -> Self {
        Self {
            verify_pairing: true,
        }
    }
}

impl DatasetIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verify_pairing(self, verify_pairing: bool) -> Self {
        Self { verify_pairing }
    }

    /// Build the ordered list of `(image_path, label_path)` pairs.
    pub fn build(
        &self,
        images_dir: impl AsRef<Path>,
        labels_dir: impl AsRef<Path>,
    ) -> Result<Vec<(PathBuf, PathBuf)>> {
        let images_dir = images_dir.as_ref();
        let labels_dir = labels_dir.as_ref();

        let image_files = list_files(images_dir)?;
        let label_files = list_files(labels_dir)?;

        let mismatch = |reason: String| Error::PairingMismatch {
            images_dir: images_dir.to_owned(),
            labels_dir: labels_dir.to_owned(),
            reason,
        };

        if image_files.len() != label_files.len() {
            return Err(mismatch(format!(
                "found {} images but {} label files",
                image_files.len(),
                label_files.len()
            )));
        }

        if self.verify_pairing {
            let mismatched = image_files
                .iter()
                .zip(&label_files)
                .find(|(image_file, label_file)| image_file.file_stem() != label_file.file_stem());

            if let Some((image_file, label_file)) = mismatched {
                return Err(mismatch(format!(
                    "image '{}' is paired with label '{}'",
                    image_file.display(),
                    label_file.display()
                )));
            }
        }

        debug!(
            "indexed {} image-label pairs in '{}'",
            image_files.len(),
            images_dir.display()
        );

        Ok(image_files.into_iter().zip(label_files).collect())
    }
}

/// List the regular files of a directory, sorted by file name.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let to_error = |source| Error::Directory {
        path: dir.to_owned(),
        source,
    };

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(to_error)?
        .map(|entry| entry.map(|entry| entry.path()))
        .filter(|path| path.as_ref().map_or(true, |path| path.is_file()))
        .collect::<Result<_, _>>()
        .map_err(to_error)?;
    files.sort_by(|lhs, rhs| lhs.file_name().cmp(&rhs.file_name()));

    Ok(files)
}
