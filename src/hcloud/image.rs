//! Image resolution against the provider's image listing.

use reqwest::StatusCode;

use crate::provider::ImageSelector;

use super::error::HcloudApiError;
use super::types::{Image, ImagesResponse};
use super::HcloudApi;

impl HcloudApi {
    /// Resolves a selector to a concrete image id with a single unpaginated
    /// fetch of the image listing.
    pub(in crate::hcloud) async fn resolve_image(
        &self,
        selector: &ImageSelector,
    ) -> Result<String, HcloudApiError> {
        let response = self.get("/images").await?;
        if response.status != StatusCode::OK {
            return Err(response.api_error());
        }
        let listing: ImagesResponse = response.json()?;
        select_image_id(listing.images, selector)
    }
}

/// Keeps images of the configured type that carry the configured label key
/// (when one is set; label values are ignored).
fn filter_images(images: Vec<Image>, selector: &ImageSelector) -> Vec<Image> {
    images
        .into_iter()
        .filter(|image| image.image_type == selector.image_type)
        .filter(|image| {
            selector
                .label
                .as_ref()
                .is_none_or(|label| image.labels.contains_key(label))
        })
        .collect()
}

/// Picks the candidate whose description equals the selector's description
/// exactly, case-sensitively.
pub(in crate::hcloud) fn select_image_id(
    images: Vec<Image>,
    selector: &ImageSelector,
) -> Result<String, HcloudApiError> {
    filter_images(images, selector)
        .into_iter()
        .find(|image| image.description == selector.description)
        .map(|image| image.id)
        .ok_or_else(|| HcloudApiError::ImageNotFound {
            description: selector.description.clone(),
            image_type: selector.image_type,
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::provider::ImageType;

    use super::*;

    fn image(id: &str, description: &str, image_type: ImageType, labels: &[&str]) -> Image {
        Image {
            id: id.to_owned(),
            description: description.to_owned(),
            image_type,
            labels: labels
                .iter()
                .map(|key| ((*key).to_owned(), String::new()))
                .collect::<HashMap<_, _>>(),
        }
    }

    fn listing() -> Vec<Image> {
        vec![
            image("23", "", ImageType::Backup, &[]),
            image("24", "", ImageType::System, &[]),
            image("25", "snapshot3", ImageType::Snapshot, &[]),
            image("26", "snapshot4", ImageType::Snapshot, &[]),
            image("27", "snapshot5", ImageType::Snapshot, &["GITHUB"]),
        ]
    }

    fn selector(description: &str, label: Option<&str>) -> ImageSelector {
        ImageSelector {
            image_type: ImageType::Snapshot,
            label: label.map(str::to_owned),
            description: description.to_owned(),
        }
    }

    #[test]
    fn selects_snapshot_by_description() {
        let id = select_image_id(listing(), &selector("snapshot3", None)).expect("match");
        assert_eq!(id, "25");
        let id = select_image_id(listing(), &selector("snapshot4", None)).expect("match");
        assert_eq!(id, "26");
    }

    #[test]
    fn selection_is_idempotent() {
        let first = select_image_id(listing(), &selector("snapshot3", None)).expect("match");
        let second = select_image_id(listing(), &selector("snapshot3", None)).expect("match");
        assert_eq!(first, second);
    }

    #[test]
    fn label_filter_excludes_unlabeled_images() {
        // snapshot3 matches by description but lacks the label key.
        let err =
            select_image_id(listing(), &selector("snapshot3", Some("GITHUB"))).expect_err("no match");
        assert!(matches!(err, HcloudApiError::ImageNotFound { .. }));

        let id = select_image_id(listing(), &selector("snapshot5", Some("GITHUB"))).expect("match");
        assert_eq!(id, "27");
    }

    #[test]
    fn type_filter_excludes_other_categories() {
        let selector = ImageSelector {
            image_type: ImageType::Backup,
            label: None,
            description: "snapshot3".to_owned(),
        };
        let err = select_image_id(listing(), &selector).expect_err("wrong type");
        assert!(matches!(err, HcloudApiError::ImageNotFound { .. }));
    }

    #[test]
    fn description_match_is_exact_and_case_sensitive() {
        let err = select_image_id(listing(), &selector("SNAPSHOT3", None)).expect_err("no match");
        assert!(matches!(err, HcloudApiError::ImageNotFound { .. }));
    }
}
