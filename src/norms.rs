//! Daily norm calculators
//!
//! Pure arithmetic over the collected intake data. Both roundings work on
//! the exact binary value of the product and send ties upward, so results
//! match the bot's historical output exactly.

use crate::state_machine::state::{ActivityLevel, Goal, IntakeData};
use thiserror::Error;

/// Litres of water per kilogram of body weight
pub const WATER_LITRES_PER_KG: f64 = 0.03;

/// Caloric adjustment applied to the basal estimate
pub fn goal_factor(goal: Goal) -> f64 {
    match goal {
        Goal::Lose => 0.85,
        Goal::Gain => 1.15,
        Goal::Maintain => 1.00,
    }
}

/// Daily step target for an activity level
pub fn step_norm(level: ActivityLevel) -> u32 {
    match level {
        ActivityLevel::Low => 5000,
        ActivityLevel::Medium => 8000,
        ActivityLevel::High => 10000,
    }
}

/// Mifflin-St Jeor estimate scaled by `factor`, rounded to whole kcal
#[allow(clippy::cast_possible_truncation)]
pub fn calories(weight: f64, height: f64, age: u32, factor: f64) -> i64 {
    let base = 10.0 * weight + 6.25 * height - 5.0 * f64::from(age) - 161.0;
    round_half_up(base * factor) as i64
}

/// Litres per day, one decimal place
pub fn water_intake(weight: f64) -> f64 {
    round_tenths(weight * WATER_LITRES_PER_KG)
}

/// Nearest integer, ties toward positive infinity
fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    // `value - floor` is exact, unlike `value + 0.5`
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Every finite f64 has a terminating decimal expansion within this many places
const EXACT_DECIMAL_PLACES: usize = 1074;

/// Round a non-negative value to one decimal place on its exact decimal
/// expansion, ties upward.
///
/// Scaling by ten first would round the product and push values such as
/// `55.0 * 0.03` (just below 1.65) over the tie.
fn round_tenths(value: f64) -> f64 {
    let exact = format!("{value:.EXACT_DECIMAL_PLACES$}");
    let Some((whole, fraction)) = exact.split_once('.') else {
        return value;
    };
    let mut fraction = fraction.chars();
    let tenths = fraction.next().unwrap_or('0');
    let round_up = fraction.next().is_some_and(|d| d >= '5');

    let mut digits: Vec<u32> = whole
        .chars()
        .chain(std::iter::once(tenths))
        .filter_map(|c| c.to_digit(10))
        .collect();
    if round_up {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == 9 {
                *digit = 0;
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, 1);
        }
    }

    let Some((last, leading)) = digits.split_last() else {
        return value;
    };
    let render = |ds: &[u32]| -> String {
        ds.iter().filter_map(|d| char::from_digit(*d, 10)).collect()
    };
    format!("{}.{}", render(leading), render(std::slice::from_ref(last)))
        .parse()
        .unwrap_or(value)
}

/// Required intake field was absent when the summary was computed
#[derive(Debug, Error, PartialEq, Eq)]
#[error("intake data incomplete: missing {0}")]
pub struct IncompleteData(pub &'static str);

/// Everything the final summary reports
#[derive(Debug, Clone, PartialEq)]
pub struct HealthNorms {
    pub name: String,
    pub calories: i64,
    pub water_litres: f64,
    pub steps: u32,
}

impl HealthNorms {
    pub fn compute(data: &IntakeData) -> Result<Self, IncompleteData> {
        let name = data.name.as_deref().ok_or(IncompleteData("name"))?;
        let age = data.age.ok_or(IncompleteData("age"))?;
        let weight = data.weight.ok_or(IncompleteData("weight"))?;
        let height = data.height.ok_or(IncompleteData("height"))?;
        let activity = data.activity_level.ok_or(IncompleteData("activity_level"))?;
        let goal = data.goal.ok_or(IncompleteData("goal"))?;

        Ok(Self {
            name: name.to_string(),
            calories: calories(weight, height, age, goal_factor(goal)),
            water_litres: water_intake(weight),
            steps: step_norm(activity),
        })
    }
}
