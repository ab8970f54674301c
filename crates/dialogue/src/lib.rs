mod agent;
pub mod controller;

pub use agent::TripPlannerAgent;
pub use controller::{
    complete_creation, complete_deletion, complete_listing, transition, Effect, TurnOutcome,
};
