//! 输入、输出弧重数的稀疏化邻接矩阵封装.
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::Weight;

type SmallRow = SmallVec<[Weight; 4]>;

/// Place × transition matrix of arc multiplicities.
///
/// Parallel arcs between the same endpoints accumulate in one cell.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Incidence {
    rows: IndexVec<PlaceId, SmallRow>,
    cols: usize,
}

impl Incidence {
    pub fn new() -> Self {
        Self {
            rows: IndexVec::new(),
            cols: 0,
        }
    }

    pub fn push_place(&mut self) -> PlaceId {
        let mut row = SmallRow::new();
        row.resize(self.cols, 0);
        self.rows.push(row)
    }

    pub fn push_transition(&mut self) -> TransitionId {
        let next = self.cols;
        for row in self.rows.iter_mut() {
            row.push(0);
        }
        self.cols += 1;
        TransitionId::from_usize(next)
    }

    pub fn places(&self) -> usize {
        self.rows.len()
    }

    pub fn transitions(&self) -> usize {
        self.cols
    }

    pub fn get(&self, place: PlaceId, transition: TransitionId) -> Weight {
        self.rows[place][transition.index()]
    }

    /// Records one more arc between `place` and `transition`.
    pub fn add_arc(&mut self, place: PlaceId, transition: TransitionId) {
        self.rows[place][transition.index()] += 1;
    }

    /// Non-zero entries of one transition column, in place order.
    pub fn entries_for(
        &self,
        transition: TransitionId,
    ) -> impl Iterator<Item = (PlaceId, Weight)> + '_ {
        self.rows.iter_enumerated().filter_map(move |(place, row)| {
            let weight = row[transition.index()];
            (weight > 0).then_some((place, weight))
        })
    }
}

impl Default for Incidence {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Incidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Incidence")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_arcs_accumulate() {
        let mut matrix = Incidence::new();
        let p = matrix.push_place();
        let t = matrix.push_transition();

        matrix.add_arc(p, t);
        matrix.add_arc(p, t);

        assert_eq!(matrix.get(p, t), 2);
        assert_eq!(matrix.entries_for(t).collect::<Vec<_>>(), vec![(p, 2)]);
    }

    #[test]
    fn push_transition_extends_every_row() {
        let mut matrix = Incidence::new();
        let p0 = matrix.push_place();
        let p1 = matrix.push_place();
        let t = matrix.push_transition();

        assert_eq!(matrix.get(p0, t), 0);
        assert_eq!(matrix.get(p1, t), 0);
        assert_eq!(matrix.transitions(), 1);
    }
}
