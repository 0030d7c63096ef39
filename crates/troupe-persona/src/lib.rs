//! Persona catalog and the response-decision engine.
//!
//! A [`Persona`] is one configured bot identity: it owns an inbound
//! application id, a delivery credential, a system prompt, and an ordered
//! list of [`ResponseRule`]s. [`PersonaStore`] loads personas from a YAML
//! directory and resolves the one responsible for an event.

mod persona;
mod policy;
mod store;

pub use persona::{Persona, ResponseRule, RuleKind};
pub use store::{PersonaError, PersonaStore};
