//! The agents sequenced by the `/solve-math` and feedback endpoints.
//!
//! - [`router`] - decides between the knowledge base and web-backed solving
//! - [`solver`] - turns a KB hit or an LLM reply into a step-by-step [`Solution`](crate::models::Solution)
//! - [`feedback`] - records user feedback and reports aggregate statistics

pub mod feedback;
pub mod router;
pub mod solver;
