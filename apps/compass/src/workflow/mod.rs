// Session workflow: state machine, in-memory sessions, request orchestration
// and the HTTP handlers that drive them.
// The orchestrator is the only code that applies events to a live session.

pub mod handlers;
pub mod machine;
pub mod orchestrator;
pub mod session;
