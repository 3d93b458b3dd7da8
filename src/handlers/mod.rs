// handlers/mod.rs - two handler tiers
//
// Public (no auth): service info, health and token acquisition under /auth.
// Protected (Bearer JWT, user must exist): everything under /api.

pub mod protected;
pub mod public;
