//! JEE-style benchmark against a running math-router server.
//!
//! Posts a fixed set of questions to `/solve-math` and reports which
//! solution source answered each one, plus overall success rate.
//!
//! ```text
//! MATH_ROUTER_URL=http://localhost:8000 cargo run --bin jee-bench
//! ```

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

struct BenchQuestion {
    id: u32,
    question: &'static str,
    category: &'static str,
    difficulty: &'static str,
}

const QUESTIONS: &[BenchQuestion] = &[
    BenchQuestion {
        id: 1,
        question: "Find the derivative of f(x) = x^3 * sin(x)",
        category: "calculus",
        difficulty: "medium",
    },
    BenchQuestion {
        id: 2,
        question: "Solve the equation: 2x^2 - 5x + 2 = 0",
        category: "algebra",
        difficulty: "easy",
    },
    BenchQuestion {
        id: 3,
        question: "Calculate the integral of ∫(3x^2 + 2x + 1) dx from 0 to 2",
        category: "calculus",
        difficulty: "medium",
    },
];

#[derive(Deserialize)]
struct SolveReply {
    solution: SolutionReply,
}

#[derive(Deserialize)]
struct SolutionReply {
    source: String,
    confidence: String,
}

enum Outcome {
    Success {
        source: String,
        confidence: String,
        elapsed: Duration,
    },
    Failure(String),
}

async fn run_one(client: &reqwest::Client, base_url: &str, q: &BenchQuestion) -> Result<Outcome> {
    let started = Instant::now();
    let resp = client
        .post(format!("{base_url}/solve-math"))
        .json(&serde_json::json!({ "question": q.question }))
        .send()
        .await
        .context("Request failed")?;

    if !resp.status().is_success() {
        return Ok(Outcome::Failure(format!("HTTP {}", resp.status())));
    }

    let reply: SolveReply = resp.json().await.context("Failed to parse solve response")?;
    Ok(Outcome::Success {
        source: reply.solution.source,
        confidence: reply.solution.confidence,
        elapsed: started.elapsed(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let base_url = std::env::var("MATH_ROUTER_URL")
        .unwrap_or_else(|_| "http://localhost:8000".to_string());
    let base_url = base_url.trim_end_matches('/');
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    println!("JEE BENCHMARK against {base_url}");
    println!("{}", "=".repeat(60));

    let mut successes = 0usize;
    let mut sources: BTreeMap<String, usize> = BTreeMap::new();

    for q in QUESTIONS {
        println!(
            "\n[{}] ({}, {}) {}",
            q.id, q.category, q.difficulty, q.question
        );
        match run_one(&client, base_url, q).await {
            Ok(Outcome::Success {
                source,
                confidence,
                elapsed,
            }) => {
                println!(
                    "  ok - source: {source}, confidence: {confidence}, {:.2}s",
                    elapsed.as_secs_f64()
                );
                successes += 1;
                *sources.entry(source).or_insert(0) += 1;
            }
            Ok(Outcome::Failure(reason)) => println!("  failed - {reason}"),
            Err(e) => println!("  error - {e:#}"),
        }
    }

    let total = QUESTIONS.len();
    println!("\n{}", "=".repeat(60));
    println!("Total questions: {total}");
    println!("Successful: {successes}");
    println!(
        "Success rate: {:.1}%",
        successes as f64 / total as f64 * 100.0
    );
    if !sources.is_empty() {
        println!("Sources used: {sources:?}");
    }

    Ok(())
}
