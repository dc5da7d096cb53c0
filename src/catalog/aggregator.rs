//! Groups attachments by normalized title and classifies each group

use std::collections::HashMap;
use tracing::debug;

use super::{format_size, identity, CatalogEntry, Episode, MovieEntry, RawAttachment, SeriesEntry};
use crate::metadata::MetadataRecord;
use crate::title::ParsedTitle;

#[derive(Debug)]
struct Group {
    id: String,
    title: String,
    metadata: MetadataRecord,
    episodes: Vec<Episode>,
}

/// Accumulates groups for one run; owned by the pipeline driver
#[derive(Debug, Default)]
pub struct Aggregator {
    category: Option<String>,
    groups: Vec<Group>,
    index: HashMap<String, usize>,
}

impl Aggregator {
    pub fn new(category: Option<String>) -> Self {
        Self {
            category,
            ..Self::default()
        }
    }

    /// Whether a group already exists for this normalized title
    pub fn contains(&self, normalized_title: &str) -> bool {
        self.index.contains_key(normalized_title)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Fold one attachment into its group; the metadata only seeds new groups
    pub fn add(&mut self, attachment: RawAttachment, parsed: &ParsedTitle, metadata: &MetadataRecord) {
        let episode = Episode {
            episode_id: episode_id(parsed, &attachment.filename),
            size: format_size(attachment.byte_size),
            link: attachment.source_link,
            title: attachment.filename,
        };

        match self.index.get(&parsed.normalized_title) {
            Some(&position) => {
                let group = &mut self.groups[position];
                debug!("Adding {} to existing group {}", episode.title, group.id);
                group.episodes.push(episode);
            }
            None => {
                let id = identity::assign_with_category(&parsed.normalized_title, self.category.as_deref());
                debug!("New group {} for {:?}", id, parsed.normalized_title);
                self.index.insert(parsed.normalized_title.clone(), self.groups.len());
                self.groups.push(Group {
                    id,
                    title: parsed.normalized_title.clone(),
                    metadata: metadata.clone(),
                    episodes: vec![episode],
                });
            }
        }
    }

    /// Emit entries in first-seen group order
    pub fn finalize(self) -> Vec<CatalogEntry> {
        self.groups.into_iter().map(finalize_group).collect()
    }
}

fn finalize_group(mut group: Group) -> CatalogEntry {
    let entry = if group.episodes.len() == 1 {
        let episode = group.episodes.remove(0);
        CatalogEntry::Movie(MovieEntry {
            id: group.id,
            title: group.title,
            size: episode.size,
            link: episode.link,
            poster: None,
            overview: None,
            rating: None,
            custom_title: None,
            custom_poster: None,
            custom_overview: None,
        })
    } else {
        group
            .episodes
            .sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.link.cmp(&b.link)));
        CatalogEntry::Series(SeriesEntry {
            id: group.id,
            title: group.title,
            episode_count: group.episodes.len(),
            poster: None,
            overview: None,
            rating: None,
            episodes: group.episodes,
            custom_title: None,
            custom_poster: None,
            custom_overview: None,
        })
    };
    entry.with_metadata(&group.metadata)
}

/// Episode label: the marker, else the part number, else a filename hash
fn episode_id(parsed: &ParsedTitle, filename: &str) -> String {
    if let Some(marker) = &parsed.episode_marker {
        return marker.to_uppercase();
    }
    if let Some(part) = parsed.part {
        return format!("PART{}", part);
    }
    let digest = format!("{:x}", md5::compute(filename.as_bytes()));
    format!("FILE-{}", &digest[..8])
}
