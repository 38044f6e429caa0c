use crate::model::{Attribution, AuthorKey, ChangeCount, MonthKey};
use std::collections::{BTreeSet, HashMap};

/// Author → month → counts, plus running totals.
///
/// The totals are a cache of the cells. They are only touched by
/// [`Aggregate::fold`] and [`Aggregate::merge`], which update both in
/// lockstep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    stats: HashMap<AuthorKey, HashMap<MonthKey, ChangeCount>>,
    totals: ChangeCount,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold<I>(&mut self, month: &MonthKey, attributions: I)
    where
        I: IntoIterator<Item = Attribution>,
    {
        for Attribution { author, changes } in attributions {
            self.add(author, *month, changes);
        }
    }

    pub fn merge(&mut self, other: Aggregate) {
        for (author, months) in other.stats {
            for (month, changes) in months {
                self.add(author.clone(), month, changes);
            }
        }
    }

    fn add(&mut self, author: AuthorKey, month: MonthKey, changes: ChangeCount) {
        *self
            .stats
            .entry(author)
            .or_default()
            .entry(month)
            .or_default() += changes;
        self.totals += changes;
    }

    pub fn totals(&self) -> ChangeCount {
        self.totals
    }

    pub fn get(&self, author: &AuthorKey, month: &MonthKey) -> Option<ChangeCount> {
        self.stats.get(author)?.get(month).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn author_count(&self) -> usize {
        self.stats.len()
    }

    /// Distinct months present, ascending.
    pub fn months(&self) -> Vec<MonthKey> {
        self.stats
            .values()
            .flat_map(|months| months.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Every (author, month, counts) cell, in no particular order.
    pub fn cells(&self) -> impl Iterator<Item = (&AuthorKey, &MonthKey, &ChangeCount)> + '_ {
        self.stats
            .iter()
            .flat_map(|(author, months)| months.iter().map(move |(month, c)| (author, month, c)))
    }
}
