pub mod clock;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod intent;
pub mod models;
pub mod replies;
pub mod temporal;
pub mod text;
pub mod trip;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Settings;
pub use dialogue::{ButtonOption, DialogueContext, DialogueResponse, DialogueState, TurnRecord};
pub use error::NluError;
pub use intent::{check_user_confirmation, detect_action, detect_visibility, is_abort, is_restart, Confirmation};
pub use models::*;
pub use temporal::TemporalParser;
pub use text::normalize_text;
pub use trip::{MergeOutcome, NewTrip, SlotUpdate, TripData, TripRecord};
