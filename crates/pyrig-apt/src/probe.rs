use log::{debug, info, warn};

use pyrig_backend::{Availability, PackageManager, PythonVersion};

use crate::manager::{AptManager, SearchRows};

/// Per-candidate availability after enabling a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelProbe {
    pub results: Vec<(PythonVersion, Availability)>,
}

impl ChannelProbe {
    pub fn available(&self) -> impl Iterator<Item = &PythonVersion> {
        self.with(Availability::Available)
    }

    pub fn unknown(&self) -> impl Iterator<Item = &PythonVersion> {
        self.with(Availability::Unknown)
    }

    /// Every candidate is definitively missing from the index.
    #[must_use]
    pub fn all_unavailable(&self) -> bool {
        self.results
            .iter()
            .all(|(_, availability)| *availability == Availability::Unavailable)
    }

    fn with(&self, wanted: Availability) -> impl Iterator<Item = &PythonVersion> {
        self.results
            .iter()
            .filter(move |(_, availability)| *availability == wanted)
            .map(|(version, _)| version)
    }
}

/// Regex matching exactly the interpreter packages of `candidates`.
fn search_pattern(candidates: &[PythonVersion]) -> String {
    let alternatives: Vec<String> = candidates
        .iter()
        .map(|v| v.package_name().replace('.', "\\."))
        .collect();
    format!("^({})$", alternatives.join("|"))
}

/// Ask the index which candidate interpreters it carries. A name search runs
/// first; when it returns no rows, or rows in a shape we cannot read, each
/// candidate is checked directly.
pub async fn probe_channel(apt: &AptManager, candidates: &[PythonVersion]) -> ChannelProbe {
    let pattern = search_pattern(candidates);

    match apt.search_names(&pattern).await {
        SearchRows::Names(names) if !names.is_empty() => {
            debug!("Search for {pattern} returned {names:?}");
            let results = candidates
                .iter()
                .map(|candidate| {
                    let availability = if names.contains(&candidate.package_name()) {
                        Availability::Available
                    } else {
                        Availability::Unavailable
                    };
                    (candidate.clone(), availability)
                })
                .collect();
            return ChannelProbe { results };
        }
        SearchRows::Names(_) => {
            info!("Package search found no Python candidates, checking each package directly");
        }
        SearchRows::Unrecognized => {
            warn!("Could not read package search output, checking each package directly");
        }
    }

    let mut results = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let availability = apt.availability(&candidate.package_name()).await;
        debug!("{} availability: {availability:?}", candidate.package_name());
        results.push((candidate.clone(), availability));
    }
    ChannelProbe { results }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_escapes_dots_and_anchors() {
        let pattern = search_pattern(&[PythonVersion::series(3, 13), PythonVersion::series(3, 12)]);

        assert_eq!(pattern, "^(python3\\.13|python3\\.12)$");
    }

    #[test]
    fn all_unavailable_ignores_unknown() {
        let probe = ChannelProbe {
            results: vec![
                (PythonVersion::series(3, 13), Availability::Unavailable),
                (PythonVersion::series(3, 12), Availability::Unknown),
            ],
        };

        assert!(!probe.all_unavailable());
        assert_eq!(probe.available().count(), 0);
        assert_eq!(
            probe.unknown().cloned().collect::<Vec<_>>(),
            vec![PythonVersion::series(3, 12)]
        );
    }
}
