//! Entity trait: identity + continuity across state changes.

use std::collections::HashSet;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Iterate over `entities`, yielding each identity only once (first occurrence wins).
///
/// Rows joined in from several paths upstream arrive as duplicates; aggregates over
/// entity attributes must count each identity once.
pub fn distinct_by_id<'a, E>(entities: &'a [E]) -> impl Iterator<Item = &'a E> + 'a
where
    E: Entity + 'a,
{
    let mut seen: HashSet<&'a E::Id> = HashSet::with_capacity(entities.len());
    entities.iter().filter(move |e| seen.insert(e.id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Row {
        id: u32,
        value: i64,
    }

    impl Entity for Row {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }
    }

    #[test]
    fn distinct_by_id_keeps_first_occurrence() {
        let rows = vec![
            Row { id: 1, value: 10 },
            Row { id: 2, value: 5 },
            Row { id: 1, value: 99 },
        ];

        let values: Vec<i64> = distinct_by_id(&rows).map(|r| r.value).collect();
        assert_eq!(values, vec![10, 5]);
    }

    #[test]
    fn distinct_by_id_on_empty_slice_yields_nothing() {
        let rows: Vec<Row> = Vec::new();
        assert_eq!(distinct_by_id(&rows).count(), 0);
    }
}
