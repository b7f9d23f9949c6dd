//! Property tests for the pixel clock divisor search

use proptest::prelude::*;
use scanout_core::clock::{ClockDivisorSolver, DIVISOR_MAX, MULTIPLIER_MAX, MULTIPLIER_MIN};

proptest! {
    #[test]
    fn solution_is_in_range_and_consistent(requested in 1800u32..=762_000) {
        let solver = ClockDivisorSolver::default();
        let solution = solver.solve(requested).unwrap();

        let n = u32::from(solution.multiplier);
        let m = u32::from(solution.divisor);
        prop_assert!((MULTIPLIER_MIN..=MULTIPLIER_MAX).contains(&n));
        prop_assert!((1..=DIVISOR_MAX).contains(&m));
        prop_assert_eq!(
            solution.achieved_khz,
            solver.step_khz() * n * solution.doubling_factor() / m
        );
        prop_assert!(solution.achieved_khz <= requested);
    }

    #[test]
    fn solve_is_deterministic(requested in 0u32..1_000_000) {
        let solver = ClockDivisorSolver::default();
        prop_assert_eq!(solver.solve(requested), solver.solve(requested));
    }

    #[test]
    fn below_range_is_unsolvable(requested in 0u32..1800) {
        prop_assert!(ClockDivisorSolver::default().solve(requested).is_err());
    }

    #[test]
    fn above_range_is_unsolvable(requested in 762_001u32..=u32::MAX) {
        prop_assert!(ClockDivisorSolver::default().solve(requested).is_err());
    }

    #[test]
    fn no_candidate_beats_the_solution(requested in 1800u32..=762_000) {
        let solver = ClockDivisorSolver::default();
        let best = solver.solve(requested).unwrap();
        let step = solver.step_khz();

        for m in 1..=DIVISOR_MAX {
            for factor in [1u32, 2] {
                let n = m * requested / (step * factor);
                if (MULTIPLIER_MIN..=MULTIPLIER_MAX).contains(&n) {
                    let achieved = step * factor * n / m;
                    prop_assert!(requested - achieved >= requested - best.achieved_khz);
                }
            }
        }
    }
}
