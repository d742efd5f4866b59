//! Static recipe lookup for the recipe branch

use crate::prompts;
use crate::state_machine::state::{MealType, MenuOption};

const OATMEAL_WITH_BERRIES: &str =
    "Овсяная каша с ягодами: 40 г овсянки, 200 мл воды, 50 г ягод, 1 ч.л. мёда.";
const COTTAGE_CHEESE_DESSERT: &str = "Творожный десерт: 100 г творога, 1 ч.л. мёда, 30 г ягод.";

/// Recipe text for a meal type
pub fn recipe_text(meal: MealType) -> &'static str {
    match meal {
        MealType::Snack => COTTAGE_CHEESE_DESSERT,
        // TODO: dedicated lunch, dinner and drinks recipes; these still reuse the breakfast text
        MealType::Breakfast | MealType::Lunch | MealType::Dinner | MealType::Drinks => {
            OATMEAL_WITH_BERRIES
        }
    }
}

/// Recipe text for a raw menu label, falling back to the meal menu prompt
pub fn recipe_for_label(label: &str) -> &'static str {
    MealType::from_label(label).map_or(prompts::MEAL_FALLBACK, recipe_text)
}
