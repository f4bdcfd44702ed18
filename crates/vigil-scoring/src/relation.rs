//! Relation factor
//!
//! Rewards a declared relation that plausibly grants first-hand access to
//! the kind of incident reported.

use vigil_core::{Category, Factor, FactorScore, Relation};

use crate::factor::{FactorEvaluator, ScoringInput};

pub const RELATION_MAX: u32 = 3;

/// Minimum length of a free-text relation detail for `other`
const MIN_DETAIL_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct RelationFactor;

impl RelationFactor {
    /// Whether `relation` normally witnesses incidents of `category` directly
    pub fn is_first_hand(relation: Relation, category: Category) -> bool {
        use Category::*;
        match relation {
            Relation::Teacher | Relation::Principal => true,
            Relation::Parent | Relation::Student => {
                matches!(category, Poisoning | FoodQuality | Nutrition)
            }
            Relation::Supplier => matches!(category, Distribution | FoodQuality | KitchenHygiene),
            Relation::Community | Relation::Other => false,
        }
    }
}

impl FactorEvaluator for RelationFactor {
    fn factor(&self) -> Factor {
        Factor::Relation
    }

    fn max(&self) -> u32 {
        RELATION_MAX
    }

    fn evaluate(&self, input: &ScoringInput<'_>) -> FactorScore {
        let reporter = &input.report.reporter;
        let category = input.report.category;

        let Some(relation) = reporter.relation else {
            return self.score(0, "No relation to the program declared");
        };

        match relation {
            Relation::Other => {
                let detailed = reporter
                    .relation_detail
                    .as_deref()
                    .map(|d| d.trim().chars().count() >= MIN_DETAIL_CHARS)
                    .unwrap_or(false);
                if detailed {
                    self.score(1, "Other relation with a specific description")
                } else {
                    self.score(0, "Other relation without description")
                }
            }
            Relation::Community => {
                if matches!(category, Category::Distribution | Category::KitchenHygiene) {
                    self.score(2, "Community member can observe distribution and kitchens")
                } else {
                    self.score(1, "Community member, indirect access")
                }
            }
            named if Self::is_first_hand(named, category) => self.score(
                3,
                format!("{} has first-hand access to {} incidents", named.as_str(), category),
            ),
            named => self.score(
                2,
                format!("{} is a named role outside {} incidents", named.as_str(), category),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{evaluate, report};

    fn with_relation(category: Category, relation: Option<Relation>, detail: Option<&str>) -> u32 {
        let mut r = report();
        r.category = category;
        r.reporter.relation = relation;
        r.reporter.relation_detail = detail.map(str::to_string);
        evaluate(&RelationFactor, &r).value
    }

    #[test]
    fn test_first_hand_roles() {
        assert_eq!(with_relation(Category::Poisoning, Some(Relation::Parent), None), 3);
        assert_eq!(with_relation(Category::Distribution, Some(Relation::Teacher), None), 3);
        assert_eq!(with_relation(Category::Distribution, Some(Relation::Supplier), None), 3);
    }

    #[test]
    fn test_named_role_outside_category() {
        assert_eq!(with_relation(Category::Poisoning, Some(Relation::Supplier), None), 2);
        assert_eq!(with_relation(Category::Distribution, Some(Relation::Parent), None), 2);
    }

    #[test]
    fn test_other_scores_below_named_roles() {
        let other = with_relation(Category::Poisoning, Some(Relation::Other), Some("school cook"));
        let parent = with_relation(Category::Poisoning, Some(Relation::Parent), None);
        assert_eq!(other, 1);
        assert!(other < parent);
        assert_eq!(with_relation(Category::Poisoning, Some(Relation::Other), Some("  ")), 0);
    }

    #[test]
    fn test_no_relation() {
        assert_eq!(with_relation(Category::Poisoning, None, None), 0);
    }

    #[test]
    fn test_within_bounds_for_every_combination() {
        let relations = [
            Relation::Parent,
            Relation::Teacher,
            Relation::Principal,
            Relation::Supplier,
            Relation::Student,
            Relation::Community,
            Relation::Other,
        ];
        for category in Category::ALL {
            for relation in relations {
                assert!(with_relation(category, Some(relation), Some("detail")) <= RELATION_MAX);
            }
        }
    }
}
