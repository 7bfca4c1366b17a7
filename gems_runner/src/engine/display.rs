use std::collections::BTreeMap;

use crate::host::{ImageRequest, TextRequest};

/// What the current view shows on top of its own images.
#[derive(Debug, Clone)]
pub(super) struct DisplayState {
    pub(super) images: BTreeMap<String, ImageRequest>,
    pub(super) texts: Vec<TextRequest>,
    pub(super) cursor_visible: bool,
    pub(super) pockets_visible: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            images: BTreeMap::new(),
            texts: Vec::new(),
            cursor_visible: true,
            pockets_visible: true,
        }
    }
}

impl DisplayState {
    /// Forget view-scoped overlays, returning the image names to hide.
    pub(super) fn clear_view(&mut self) -> Vec<String> {
        self.texts.clear();
        std::mem::take(&mut self.images).into_keys().collect()
    }
}
