use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::domain::{Qualification, QualificationId};

/// In-memory view of every known qualification and its inclusion edges.
#[derive(Debug, Clone, Default)]
pub struct QualificationCatalog {
    qualifications: BTreeMap<QualificationId, Qualification>,
}

impl QualificationCatalog {
    pub fn new(qualifications: impl IntoIterator<Item = Qualification>) -> Self {
        Self {
            qualifications: qualifications
                .into_iter()
                .map(|qualification| (qualification.id.clone(), qualification))
                .collect(),
        }
    }

    pub fn get(&self, id: &QualificationId) -> Option<&Qualification> {
        self.qualifications.get(id)
    }

    pub fn titles<'a>(&self, ids: impl IntoIterator<Item = &'a QualificationId>) -> Vec<String> {
        ids.into_iter()
            .map(|id| match self.get(id) {
                Some(qualification) => qualification.title.clone(),
                None => id.0.clone(),
            })
            .collect()
    }

    /// Every qualification reachable from `given` through `includes`, `given` included.
    pub fn collect_all_included<'a>(
        &self,
        given: impl IntoIterator<Item = &'a QualificationId>,
    ) -> BTreeSet<QualificationId> {
        let mut collected: BTreeSet<QualificationId> = BTreeSet::new();
        let mut queue: VecDeque<QualificationId> = VecDeque::new();

        for id in given {
            if collected.insert(id.clone()) {
                queue.push_back(id.clone());
            }
        }

        while let Some(current) = queue.pop_front() {
            let Some(qualification) = self.qualifications.get(&current) else {
                continue;
            };
            for included in &qualification.includes {
                if collected.insert(included.clone()) {
                    queue.push_back(included.clone());
                }
            }
        }

        collected
    }

    /// Whether `held` (after inclusion) covers every id in `required`.
    pub fn has_qualifications<'a>(
        &self,
        held: impl IntoIterator<Item = &'a QualificationId>,
        required: &[QualificationId],
    ) -> bool {
        if required.is_empty() {
            return true;
        }
        let all = self.collect_all_included(held);
        required.iter().all(|id| all.contains(id))
    }

    /// Smallest subset of `given` whose inclusion closure still covers all of `given`.
    ///
    /// Members of an inclusion cycle collapse onto the smallest id of the cycle.
    pub fn essential_set(&self, given: &BTreeSet<QualificationId>) -> BTreeSet<QualificationId> {
        let closures: BTreeMap<&QualificationId, BTreeSet<QualificationId>> = given
            .iter()
            .map(|id| (id, self.collect_all_included(std::iter::once(id))))
            .collect();

        given
            .iter()
            .filter(|candidate| {
                !given.iter().any(|other| {
                    if other == *candidate || !closures[other].contains(*candidate) {
                        return false;
                    }
                    let mutual = closures[*candidate].contains(other);
                    !mutual || other < *candidate
                })
            })
            .cloned()
            .collect()
    }
}
