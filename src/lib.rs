//! # math-router
//!
//! A web service that answers math questions either from a small seeded
//! knowledge base or by asking an LLM grounded on web search results.
//!
//! ## Architecture
//!
//! Each `/solve-math` request runs a fixed pipeline:
//!
//! ```text
//!                   ┌──────────────┐
//!                   │   Question   │
//!                   └──────┬───────┘
//!                          ▼
//!              ┌───────────────────────┐
//!              │  Gateway (input)      │  sanitize, redact PII,
//!              │                       │  reject profanity/non-math
//!              └───────────┬───────────┘
//!                          ▼
//!              ┌───────────────────────┐
//!              │  Knowledge base       │  feature vector, cosine,
//!              │                       │  top 3, score >= 0.6
//!              └───────────┬───────────┘
//!                          ▼
//!              ┌───────────────────────┐
//!              │  Routing agent        │  LLM classifier, or
//!              │                       │  "any KB match" fallback
//!              └─────┬───────────┬─────┘
//!            KB route│           │web route
//!                    ▼           ▼
//!        ┌────────────────┐ ┌────────────────────────┐
//!        │ Stored solution│ │ Web search → LLM solve │
//!        └───────┬────────┘ └───────────┬────────────┘
//!                └──────────┬───────────┘
//!                           ▼
//!              ┌───────────────────────┐
//!              │  Gateway (output)     │  redact, number steps
//!              └───────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, LLM, search, KB and guardrails
//! - [`models`] - Shared data types: questions, solutions, routing decisions, feedback
//! - [`gateway`] - Input sanitizing/rejection and output formatting guardrails
//! - [`knowledge`] - Feature encoder, in-memory vector store and the seeded knowledge base
//! - [`llm::chat`] - Chat completions via Ollama or OpenAI-compatible APIs
//! - [`web`] - Tavily-compatible web search with a math-content check
//! - [`agents`] - Routing, solving and feedback agents
//! - [`api`] - Axum HTTP handlers and router
//! - [`state`] - Shared application state

pub mod agents;
pub mod api;
pub mod config;
pub mod gateway;
pub mod knowledge;
pub mod llm;
pub mod models;
pub mod state;
pub mod web;
