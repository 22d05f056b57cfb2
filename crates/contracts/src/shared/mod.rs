pub mod action_result;
pub mod events;
pub mod session_state;
