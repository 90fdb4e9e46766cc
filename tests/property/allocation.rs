//! Property-based tests for time allocation and content sizing

use lessonforge::lesson::content::unit_count;
use lessonforge::lesson::{
    AudienceLevel, CognitiveLevel, GenerationContext, Grouping, ObjectiveTarget, TimeAllocation,
};
use proptest::prelude::*;
use proptest::sample::subsequence;

fn levels() -> impl Strategy<Value = Vec<CognitiveLevel>> {
    subsequence(CognitiveLevel::ALL.to_vec(), 1..=CognitiveLevel::ALL.len())
}

fn audience() -> impl Strategy<Value = AudienceLevel> {
    proptest::sample::select(AudienceLevel::ALL.to_vec())
}

proptest! {
    /// Allocation sums exactly to the requested duration and never starves a grouping.
    #[test]
    fn allocation_sums_to_total(
        minutes in 9u32..=480,
        levels in levels(),
        audience in audience(),
    ) {
        let context = GenerationContext::new("Course", "Topic", audience, minutes, levels).unwrap();
        let allocation = TimeAllocation::compute(&context);

        prop_assert_eq!(allocation.sum(), minutes);
        prop_assert_eq!(allocation.total_minutes(), minutes);
        for grouping in Grouping::ALL {
            prop_assert!(allocation.minutes(grouping) >= 1, "{} got 0 minutes", grouping);
        }
    }

    /// Same request, same allocation.
    #[test]
    fn allocation_is_deterministic(
        minutes in 9u32..=480,
        levels in levels(),
        audience in audience(),
    ) {
        let context = GenerationContext::new("Course", "Topic", audience, minutes, levels).unwrap();
        prop_assert_eq!(TimeAllocation::compute(&context), TimeAllocation::compute(&context));
    }

    /// Every selected level gets at least one objective.
    #[test]
    fn objectives_cover_selected_levels(
        minutes in 9u32..=480,
        levels in levels(),
        audience in audience(),
    ) {
        let context =
            GenerationContext::new("Course", "Topic", audience, minutes, levels.clone()).unwrap();
        let target = ObjectiveTarget::for_context(&context);

        let distributed: usize = target.distribution.iter().map(|(_, n)| n).sum();
        prop_assert_eq!(distributed, target.count);
        for level in levels {
            prop_assert!(
                target.distribution.iter().any(|(l, n)| *l == level && *n >= 1),
                "{} has no objective",
                level
            );
        }
    }

    /// Unit counts stay within the per-grouping bounds.
    #[test]
    fn unit_count_is_bounded(
        number in 1u8..=9,
        minutes in 1u32..=200,
        activities in 0usize..10,
        audience in audience(),
    ) {
        let grouping = Grouping::from_number(number).unwrap();
        let count = unit_count(grouping, minutes, activities, audience);
        prop_assert!(count >= 1);
        prop_assert!(count <= 12);
    }
}
