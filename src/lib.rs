// Configuration loading
pub mod config;

// Error kinds
pub mod error;

// World model and target generation
pub mod world;

// Agent/observer registry
pub mod session;

// Field-of-view detection
pub mod detection;

// Shared session state, broadcast and snapshots
pub mod state;

// Wire protocol
pub mod protocol;

// Classification and alert seams
pub mod notify;

// WebSocket and HTTP APIs
pub mod api;
