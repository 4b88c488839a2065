//! Property-based tests for pile reshaping
//!
//! **Feature: fast-hictools, Property 9: 堆叠表格互换**

use fast_hictools::stats::{pile_to_table, table_to_pile, Pile};
use ndarray::Array3;
use proptest::prelude::*;

fn arb_pile() -> impl Strategy<Value = Pile> {
    (1usize..7, 0usize..10).prop_flat_map(|(w, n)| {
        prop::collection::vec(-100.0f64..100.0, w * w * n)
            .prop_map(move |values| Pile::new(Array3::from_shape_vec((w, w, n), values).unwrap()))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 9: 堆叠表格互换**
    ///
    /// A pile survives conversion to a table and back, and table cell
    /// (n, i * W + j) is pixel (i, j) of window n.
    #[test]
    fn prop_pile_table_round_trip(pile in arb_pile()) {
        let w = pile.window_bins();
        let table = pile_to_table(&pile);
        prop_assert_eq!(table.shape(), &[pile.len(), w * w]);

        for n in 0..pile.len() {
            for i in 0..w {
                for j in 0..w {
                    prop_assert_eq!(table[[n, i * w + j]], pile.window(n)[[i, j]]);
                }
            }
        }

        let back = table_to_pile(&table, w).unwrap();
        prop_assert_eq!(back, pile);
    }
}
