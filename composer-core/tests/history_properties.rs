//! Property tests for the undo/redo history.

use composer_core::{History, Layer, LayerId, TextStyle, DocumentState};
use proptest::prelude::*;

/// A document whose content depends on `seed`.
fn document(seed: u16) -> DocumentState {
    let mut doc = DocumentState::default();
    doc.add_layer(
        Layer::text(TextStyle::new(format!("state {seed}")))
            .with_id(LayerId::from_string(format!("layer_{seed}")))
            .with_position(f32::from(seed), 0.0),
    )
    .expect("add");
    doc
}

proptest! {
    #[test]
    fn prop_undo_all_then_redo_all_restores_latest(seeds in prop::collection::vec(any::<u16>(), 1..40)) {
        let mut history = History::new(DocumentState::default());
        for seed in &seeds {
            history.commit(document(*seed));
        }
        let latest = history.present().clone();
        let n = seeds.len();

        for undone in 1..=n {
            prop_assert!(history.can_undo());
            prop_assert!(history.undo().is_some());
            prop_assert_eq!(history.can_undo(), undone < n);
            prop_assert!(history.can_redo());
        }
        prop_assert!(history.undo().is_none());
        prop_assert_eq!(history.present(), &DocumentState::default());

        for redone in 1..=n {
            prop_assert!(history.redo().is_some());
            prop_assert_eq!(history.can_redo(), redone < n);
        }
        prop_assert!(history.redo().is_none());
        prop_assert_eq!(history.present(), &latest);
    }

    #[test]
    fn prop_past_never_exceeds_bound(count in 0_usize..120, bound in 1_usize..60) {
        let mut history = History::with_max_depth(0_usize, bound);
        for i in 1..=count {
            history.commit(i);
            prop_assert!(history.past_len() <= bound);
        }
        let mut oldest = *history.present();
        while let Some(state) = history.undo() {
            oldest = *state;
        }
        prop_assert_eq!(oldest, count.saturating_sub(bound));
    }

    #[test]
    fn prop_silent_commits_add_one_step(silent in 1_usize..30) {
        let mut history = History::new(document(0));
        for i in 0..silent {
            #[allow(clippy::cast_possible_truncation)]
            history.commit_silent(document(i as u16 + 1));
        }
        history.commit(document(999));

        prop_assert_eq!(history.past_len(), 1);
        prop_assert_eq!(history.undo(), Some(&document(0)));
    }
}

#[test]
fn test_snapshots_are_independent_of_the_live_document() {
    let mut live = document(1);
    let mut history = History::new(live.clone());
    live.layers[0].x = 500.0;
    history.commit(live.clone());
    live.layers[0].x = 900.0;

    let restored = history.undo().expect("undo");
    assert!((restored.layers[0].x - 1.0).abs() < f32::EPSILON);
    assert!((history.present().layers[0].x - 1.0).abs() < f32::EPSILON);
}
