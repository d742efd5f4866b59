//! User-facing copy: prompts, greeting and the final summary

use crate::norms::HealthNorms;
use crate::state_machine::state::Stage;

pub const GREETING: &str = "Привет! Я бот для расчёта КБЖУ, воды и шагов.";

/// Sent when the summary cannot be computed from the collected data
pub const START_OVER: &str = "Что-то пошло не так, давайте начнём заново: /start";

/// Shown for a meal label that has no recipe
pub const MEAL_FALLBACK: &str = "Выберите прием пищи.";

/// Question asked on entering a stage; `None` for the terminal stage
pub fn stage_prompt(stage: Stage) -> Option<&'static str> {
    let text = match stage {
        Stage::AwaitingConsultationChoice => "Выберите консультацию:",
        Stage::AwaitingName => "Как вас зовут?",
        Stage::AwaitingAge => "Сколько вам лет? (введите число)",
        Stage::AwaitingWeight => "Ваш вес в килограммах?",
        Stage::AwaitingHeight => "Ваш рост в сантиметрах?",
        Stage::AwaitingActivity => "Уровень активности?",
        Stage::AwaitingGoal => "Ваша цель?",
        Stage::AwaitingRecipeType => "Выберите прием пищи:",
        Stage::Completed => return None,
    };
    Some(text)
}

pub fn format_summary(norms: &HealthNorms) -> String {
    format!(
        "Привет, {}!\nВаши нормы:\n• КБЖУ (калории): {} ккал\n• Вода: {} л/день\n• Шаги: {} шагов/день",
        norms.name, norms.calories, norms.water_litres, norms.steps
    )
}
