use persona_common::{
    error::{PersonaError, Result},
    types::SelectedFile,
};

pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];

/// A selection that passed validation: non-empty and images only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    files: Vec<SelectedFile>,
}

impl Batch {
    /// Validates a selection. Problems are reported in the order
    /// empty, no images at all, then images mixed with other files.
    pub fn validate(selection: &[SelectedFile]) -> Result<Self> {
        if selection.is_empty() {
            return Err(PersonaError::EmptySelection);
        }

        let images: Vec<SelectedFile> = selection
            .iter()
            .filter(|file| is_image_name(&file.name))
            .cloned()
            .collect();
        if images.is_empty() {
            return Err(PersonaError::NoValidImages);
        }
        if images.len() != selection.len() {
            return Err(PersonaError::MixedFileTypes {
                invalid: selection.len() - images.len(),
            });
        }

        Ok(Self { files: images })
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|file| file.size).sum()
    }
}

/// Rejects selections larger than `max`. Runs before any other check.
pub fn check_capacity(selection: &[SelectedFile], max: usize) -> Result<()> {
    if selection.len() > max {
        return Err(PersonaError::TooManyFiles {
            count: selection.len(),
            max,
        });
    }
    Ok(())
}

pub fn is_image_name(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|accepted| ext.eq_ignore_ascii_case(accepted))
    })
}
