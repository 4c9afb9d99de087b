//! Property tests for walker position and scoring invariants.

use std::rc::Rc;

use kiki_content::{LessonDescriptor, QuizDescriptor};
use kiki_runtime::state_persistence::StateStore;
use kiki_walkers::{LessonWalker, QuizWalker, WalkerContext};
use proptest::prelude::*;
use serde_json::json;

fn lesson(screens: usize) -> Rc<LessonDescriptor> {
    let screens: Vec<_> = (0..screens)
        .map(|i| json!({"type": "explanation", "content": {"headline": format!("S{i}")}}))
        .collect();
    Rc::new(serde_json::from_value(json!({"id": 2, "title": "T", "screens": screens})).unwrap())
}

fn quiz(correct: &[usize]) -> Rc<QuizDescriptor> {
    let questions: Vec<_> = correct
        .iter()
        .map(|c| {
            json!({
                "question": "?",
                "answers": ["a", "b", "c", "d"],
                "correctIndex": c,
                "feedback": {"correct": "ja", "incorrect": "nein"}
            })
        })
        .collect();
    Rc::new(
        serde_json::from_value(json!({"lessonId": 2, "title": "Q", "questions": questions}))
            .unwrap(),
    )
}

#[derive(Debug, Clone)]
enum Nav {
    Next,
    Prev,
    GoTo(usize),
}

fn nav() -> impl Strategy<Value = Nav> {
    prop_oneof![
        Just(Nav::Next),
        Just(Nav::Prev),
        (0usize..16).prop_map(Nav::GoTo),
    ]
}

proptest! {
    #[test]
    fn position_stays_in_range_and_is_persisted(
        screens in 1usize..=10,
        ops in prop::collection::vec(nav(), 0..40),
    ) {
        let store = Rc::new(StateStore::in_memory());
        let mut walker = LessonWalker::new(lesson(screens), WalkerContext::new(Rc::clone(&store)));
        walker.render();
        for op in ops {
            let before = walker.position();
            match op {
                Nav::Next => { walker.next(); }
                Nav::Prev => { walker.prev(); }
                Nav::GoTo(i) => {
                    walker.go_to(i);
                    if i >= screens {
                        prop_assert_eq!(walker.position(), before);
                    }
                }
            }
            prop_assert!(walker.position() < screens);
            prop_assert_eq!(store.lesson_position(2), Some(walker.position()));
            let page = walker.page();
            prop_assert_eq!(page.back_enabled, walker.position() > 0);
            prop_assert!(page.progress > 0.0 && page.progress <= 1.0);
        }
    }

    #[test]
    fn score_counts_correct_answers(
        correct in prop::collection::vec(0usize..4, 5),
        picks in prop::collection::vec(0usize..4, 5),
    ) {
        let store = Rc::new(StateStore::in_memory());
        let mut walker = QuizWalker::new(quiz(&correct), WalkerContext::new(Rc::clone(&store)));
        for &pick in &picks {
            let step = walker.answer(pick);
            for d in step.deferred {
                walker.fire(d);
            }
        }
        let expected = correct.iter().zip(&picks).filter(|(c, p)| c == p).count() as u32;
        prop_assert!(walker.is_results());
        prop_assert_eq!(walker.score(), expected);
        prop_assert_eq!(store.quiz_score(2).map(|s| s.score), Some(expected));
        prop_assert_eq!(store.is_lesson_completed(2), expected >= 3);
    }
}
