use tracing::{debug, instrument};

use crate::acquire::{self, ImageFetcher, ImageSource};
use crate::classifier::{ClassificationResult, Classifier};
use crate::error::ClassifyError;
use crate::features;

/// acquire → extract → classify, shared by every endpoint.
///
/// Holds only read-only state, so one instance serves all request threads.
pub struct Pipeline {
    classifier: Classifier,
    fetcher: Box<dyn ImageFetcher>,
    max_image_bytes: usize,
}

impl Pipeline {
    pub fn new(classifier: Classifier, fetcher: Box<dyn ImageFetcher>, max_image_bytes: usize) -> Pipeline {
        Pipeline { classifier, fetcher, max_image_bytes }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    #[instrument(skip_all, fields(source = source.kind()))]
    pub fn classify(&self, source: ImageSource) -> Result<ClassificationResult, ClassifyError> {
        let bytes = acquire::resolve_bytes(source, self.fetcher.as_ref(), self.max_image_bytes)?;
        debug!(bytes = bytes.len(), "image acquired");
        let img = acquire::decode(&bytes)?;
        let features = features::extract(&img);
        self.classifier.classify(&features)
    }
}
