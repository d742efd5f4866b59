//! Pure state transition function
//!
//! Each stage has one handler that validates the raw input and decides an
//! [`Outcome`]. [`transition`] turns that outcome into the next session and
//! the effects the runtime must execute. The store and the transport are
//! never touched here.

use super::state::{
    ActivityLevel, ConsultationChoice, Goal, IntakeData, MealType, MenuOption, Session, Stage,
};
use super::Effect;
use super::Event;
use crate::norms::HealthNorms;
use crate::prompts;
use crate::recipes::recipe_for_label;
use thiserror::Error;

/// What a stage handler decided about one input
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Input failed validation; ask the same question again
    Reprompt,
    /// Input accepted; record it and move on
    Advance { next: Stage, mutation: Mutation },
    /// Recipe branch finished; send the text and end the session
    Terminate { text: &'static str },
}

/// The single field an accepted input fills
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Menu choices that only steer the flow
    None,
    Name(String),
    Age(u32),
    Weight(f64),
    Height(f64),
    Activity(ActivityLevel),
    Goal(Goal),
}

impl IntakeData {
    pub fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::None => {}
            Mutation::Name(name) => self.name = Some(name),
            Mutation::Age(age) => self.age = Some(age),
            Mutation::Weight(weight) => self.weight = Some(weight),
            Mutation::Height(height) => self.height = Some(height),
            Mutation::Activity(level) => self.activity_level = Some(level),
            Mutation::Goal(goal) => self.goal = Some(goal),
        }
    }
}

/// Result of a state transition
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    /// Session to keep; `None` once the conversation has ended
    pub session: Option<Session>,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(session: Option<Session>) -> Self {
        Self {
            session,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("No active session; waiting for /start")]
    MissingSession,
    #[error("Session is already completed")]
    SessionCompleted,
}

/// Pure transition function
pub fn transition(
    session: Option<&Session>,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (session, event) {
        // Begin always wins, discarding whatever was in flight
        (_, Event::Begin) => {
            let fresh = Session::new();
            Ok(TransitionResult::new(Some(fresh.clone()))
                .with_effect(Effect::PersistSession)
                .with_effect(Effect::send_text(prompts::GREETING))
                .with_effects(prompt_for(fresh.stage)))
        }

        (None, Event::Message { .. }) => Err(TransitionError::MissingSession),

        (Some(session), Event::Message { .. }) if session.stage.is_terminal() => {
            Err(TransitionError::SessionCompleted)
        }

        (Some(session), Event::Message { text }) => {
            Ok(apply_outcome(session, handle_input(session.stage, text.trim())))
        }
    }
}

/// Dispatch raw input to the current stage's validator
pub fn handle_input(stage: Stage, input: &str) -> Outcome {
    match stage {
        Stage::AwaitingConsultationChoice => match ConsultationChoice::from_label(input) {
            Some(ConsultationChoice::Metrics) => advance(Stage::AwaitingName, Mutation::None),
            Some(ConsultationChoice::Recipes) => {
                advance(Stage::AwaitingRecipeType, Mutation::None)
            }
            None => Outcome::Reprompt,
        },
        Stage::AwaitingName => parse_name(input).map_or(Outcome::Reprompt, |name| {
            advance(Stage::AwaitingAge, Mutation::Name(name))
        }),
        Stage::AwaitingAge => parse_age(input).map_or(Outcome::Reprompt, |age| {
            advance(Stage::AwaitingWeight, Mutation::Age(age))
        }),
        Stage::AwaitingWeight => parse_positive(input).map_or(Outcome::Reprompt, |weight| {
            advance(Stage::AwaitingHeight, Mutation::Weight(weight))
        }),
        Stage::AwaitingHeight => parse_positive(input).map_or(Outcome::Reprompt, |height| {
            advance(Stage::AwaitingActivity, Mutation::Height(height))
        }),
        Stage::AwaitingActivity => ActivityLevel::from_label(input)
            .map_or(Outcome::Reprompt, |level| {
                advance(Stage::AwaitingGoal, Mutation::Activity(level))
            }),
        Stage::AwaitingGoal => Goal::from_label(input).map_or(Outcome::Reprompt, |goal| {
            advance(Stage::Completed, Mutation::Goal(goal))
        }),
        Stage::AwaitingRecipeType => match MealType::from_label(input) {
            Some(_) => Outcome::Terminate {
                text: recipe_for_label(input),
            },
            None => Outcome::Reprompt,
        },
        // Unreachable through `transition`, which rejects input for a finished session
        Stage::Completed => Outcome::Reprompt,
    }
}

fn advance(next: Stage, mutation: Mutation) -> Outcome {
    Outcome::Advance { next, mutation }
}

fn apply_outcome(session: &Session, outcome: Outcome) -> TransitionResult {
    match outcome {
        // Unchanged session is still persisted so the store sees the activity
        Outcome::Reprompt => TransitionResult::new(Some(session.clone()))
            .with_effect(Effect::PersistSession)
            .with_effects(prompt_for(session.stage)),

        Outcome::Advance { next, mutation } => {
            let mut data = session.data.clone();
            data.apply(mutation);

            if next.is_terminal() {
                return complete(&data);
            }

            TransitionResult::new(Some(Session { stage: next, data }))
                .with_effect(Effect::PersistSession)
                .with_effects(prompt_for(next))
        }

        Outcome::Terminate { text } => TransitionResult::new(None)
            .with_effect(Effect::send_text(text))
            .with_effect(Effect::DeleteSession),
    }
}

/// Entering `Completed`: compute the summary in the same step and end the session
fn complete(data: &IntakeData) -> TransitionResult {
    let reply = match HealthNorms::compute(data) {
        Ok(norms) => prompts::format_summary(&norms),
        Err(e) => {
            tracing::warn!(error = %e, "Reached completion without full intake data");
            prompts::START_OVER.to_string()
        }
    };

    TransitionResult::new(None)
        .with_effect(Effect::send_text(reply))
        .with_effect(Effect::DeleteSession)
}

fn prompt_for(stage: Stage) -> Option<Effect> {
    prompts::stage_prompt(stage).map(|text| Effect::send_prompt(text, stage.menu()))
}

// ============================================================================
// Validators
// ============================================================================

fn parse_name(input: &str) -> Option<String> {
    let name = input.trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn parse_age(input: &str) -> Option<u32> {
    input.parse::<u32>().ok().filter(|age| *age > 0)
}

fn parse_positive(input: &str) -> Option<f64> {
    input
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}
