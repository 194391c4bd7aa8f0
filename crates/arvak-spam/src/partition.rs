//! Correlation groups and the partition they form.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{SpamError, SpamResult};
use crate::qubit::QubitId;

/// An ordered set of qubits whose SPAM errors are correlated with each other only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationGroup {
    qubits: Vec<QubitId>,
}

impl CorrelationGroup {
    /// Create a group from its qubits, in measurement order.
    pub fn new(qubits: Vec<QubitId>) -> Self {
        Self { qubits }
    }

    /// The qubits of this group.
    pub fn qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    /// Number of qubits in the group.
    pub fn len(&self) -> usize {
        self.qubits.len()
    }

    /// Whether the group has no qubits.
    pub fn is_empty(&self) -> bool {
        self.qubits.is_empty()
    }

    /// Dimension of the group's state space, `2^len`.
    pub fn dim(&self) -> usize {
        1 << self.qubits.len()
    }
}

impl From<Vec<QubitId>> for CorrelationGroup {
    fn from(qubits: Vec<QubitId>) -> Self {
        Self::new(qubits)
    }
}

/// Where a qubit lives inside a [`Partition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSlot {
    /// Index of the group.
    pub group: usize,
    /// Position of the qubit within the group.
    pub offset: usize,
    /// Position of the qubit in canonical (group-concatenated) order.
    pub canonical: usize,
}

/// A validated partition of calibrated qubits into disjoint correlation groups.
///
/// Groups are kept in descending size order (ties keep their input order);
/// the canonical bit order is the concatenation of the groups in that order.
#[derive(Debug, Clone)]
pub struct Partition {
    groups: Vec<CorrelationGroup>,
    lookup: FxHashMap<QubitId, GroupSlot>,
    num_qubits: usize,
}

impl Partition {
    /// Validate and sort a list of groups.
    pub fn new<G>(groups: impl IntoIterator<Item = G>) -> SpamResult<Self>
    where
        G: Into<CorrelationGroup>,
    {
        let mut groups: Vec<CorrelationGroup> = groups.into_iter().map(Into::into).collect();
        if groups.is_empty() {
            return Err(SpamError::EmptyPartition);
        }
        if let Some(index) = groups.iter().position(CorrelationGroup::is_empty) {
            return Err(SpamError::EmptyGroup { index });
        }

        groups.sort_by(|a, b| b.len().cmp(&a.len()));

        let mut lookup = FxHashMap::default();
        let mut canonical = 0;
        for (group, members) in groups.iter().enumerate() {
            for (offset, &qubit) in members.qubits().iter().enumerate() {
                let slot = GroupSlot {
                    group,
                    offset,
                    canonical,
                };
                if lookup.insert(qubit, slot).is_some() {
                    return Err(SpamError::OverlappingGroups { qubit });
                }
                canonical += 1;
            }
        }

        Ok(Self {
            groups,
            lookup,
            num_qubits: canonical,
        })
    }

    /// The groups, largest first.
    pub fn groups(&self) -> &[CorrelationGroup] {
        &self.groups
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Always false; a partition holds at least one group.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of calibrated qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Size of the largest group.
    pub fn largest_group_size(&self) -> usize {
        self.groups.first().map_or(0, CorrelationGroup::len)
    }

    /// State-space dimension of each group, in group order.
    pub fn dims(&self) -> Vec<usize> {
        self.groups.iter().map(CorrelationGroup::dim).collect()
    }

    /// All calibrated qubits in canonical order.
    pub fn canonical_qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        self.groups
            .iter()
            .flat_map(|group| group.qubits().iter().copied())
    }

    /// Locate a qubit.
    pub fn slot(&self, qubit: QubitId) -> Option<GroupSlot> {
        self.lookup.get(&qubit).copied()
    }

    /// Whether the qubit is calibrated by this partition.
    pub fn contains(&self, qubit: QubitId) -> bool {
        self.lookup.contains_key(&qubit)
    }

    /// Largest device wire index among the calibrated qubits.
    pub fn max_qubit(&self) -> Option<QubitId> {
        self.lookup.keys().copied().max()
    }
}
