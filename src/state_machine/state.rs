//! Session state types

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque key for one user's conversation thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// ============================================================================
// Menu Enumerations
// ============================================================================

/// A closed set of quick-reply options rendered as one menu.
///
/// Each variant owns exactly one label; matching is exact and case-sensitive.
pub trait MenuOption: Sized + Copy + 'static {
    /// Every option, in display order
    const ALL: &'static [Self];

    /// User-facing label
    fn label(self) -> &'static str;

    fn from_label(text: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|option| option.label() == text)
    }

    fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|option| option.label()).collect()
    }
}

/// First menu: which consultation the user wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationChoice {
    Metrics,
    Recipes,
}

impl MenuOption for ConsultationChoice {
    const ALL: &'static [Self] = &[Self::Metrics, Self::Recipes];

    fn label(self) -> &'static str {
        match self {
            Self::Metrics => "КБЖУ + вода + активность",
            Self::Recipes => "ПП рецепты",
        }
    }
}

/// Daily activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Low,
    Medium,
    High,
}

impl MenuOption for ActivityLevel {
    const ALL: &'static [Self] = &[Self::Low, Self::Medium, Self::High];

    fn label(self) -> &'static str {
        match self {
            Self::Low => "низкий",
            Self::Medium => "средний",
            Self::High => "высокий",
        }
    }
}

/// What the user wants to achieve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    Lose,
    Gain,
    Maintain,
}

impl MenuOption for Goal {
    const ALL: &'static [Self] = &[Self::Lose, Self::Gain, Self::Maintain];

    fn label(self) -> &'static str {
        match self {
            Self::Lose => "похудеть",
            Self::Gain => "набрать массу",
            Self::Maintain => "просто узнать норму",
        }
    }
}

/// Meal type for the recipe branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Drinks,
}

impl MenuOption for MealType {
    const ALL: &'static [Self] = &[
        Self::Breakfast,
        Self::Lunch,
        Self::Dinner,
        Self::Snack,
        Self::Drinks,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Breakfast => "Завтрак",
            Self::Lunch => "Обед",
            Self::Dinner => "Ужин",
            Self::Snack => "Перекус",
            Self::Drinks => "Напитки",
        }
    }
}

// ============================================================================
// Intake Stages
// ============================================================================

/// Where the conversation currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    AwaitingConsultationChoice,
    AwaitingName,
    AwaitingAge,
    AwaitingWeight,
    AwaitingHeight,
    AwaitingActivity,
    AwaitingGoal,
    AwaitingRecipeType,
    Completed,
}

impl Stage {
    /// Every stage, in intake order
    #[cfg(test)]
    pub const ALL: [Stage; 9] = [
        Stage::AwaitingConsultationChoice,
        Stage::AwaitingName,
        Stage::AwaitingAge,
        Stage::AwaitingWeight,
        Stage::AwaitingHeight,
        Stage::AwaitingActivity,
        Stage::AwaitingGoal,
        Stage::AwaitingRecipeType,
        Stage::Completed,
    ];

    /// Check if entering this stage ends the session
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed)
    }

    /// Quick-reply labels offered with this stage's prompt
    pub fn menu(self) -> Vec<&'static str> {
        match self {
            Stage::AwaitingConsultationChoice => ConsultationChoice::labels(),
            Stage::AwaitingActivity => ActivityLevel::labels(),
            Stage::AwaitingGoal => Goal::labels(),
            Stage::AwaitingRecipeType => MealType::labels(),
            Stage::AwaitingName
            | Stage::AwaitingAge
            | Stage::AwaitingWeight
            | Stage::AwaitingHeight
            | Stage::Completed => Vec::new(),
        }
    }
}

// ============================================================================
// Accumulated Data
// ============================================================================

/// Partially filled intake record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IntakeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Kilograms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Centimetres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
}

impl IntakeData {
    /// Number of populated fields
    #[cfg(test)]
    pub fn filled(&self) -> usize {
        [
            self.name.is_some(),
            self.age.is_some(),
            self.weight.is_some(),
            self.height.is_some(),
            self.activity_level.is_some(),
            self.goal.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

/// Ephemeral per-conversation state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Session {
    pub stage: Stage,
    #[serde(default)]
    pub data: IntakeData,
}

impl Session {
    /// Fresh session at the consultation menu
    pub fn new() -> Self {
        Self::default()
    }
}
