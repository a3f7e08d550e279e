// Homepage: password-gated single-tenant dashboard.
//
// config holds the process-wide settings read once at startup; web holds
// the server, the session token codec and the auth gate.

pub mod config;
pub mod web;
