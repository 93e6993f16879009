use std::sync::Arc;

use crate::agents::feedback::FeedbackAgent;
use crate::agents::router::RoutingAgent;
use crate::agents::solver::MathSolver;
use crate::config::Config;
use crate::gateway::Gateway;
use crate::knowledge::KnowledgeBase;
use crate::web::WebSearcher;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<Gateway>,
    pub knowledge: Arc<KnowledgeBase>,
    pub router: Arc<RoutingAgent>,
    pub solver: Arc<MathSolver>,
    pub web: Arc<WebSearcher>,
    pub feedback: Arc<FeedbackAgent>,
    pub solve_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        let knowledge = KnowledgeBase::new(&config.knowledge)?;

        let feedback = match &config.feedback_path {
            Some(path) => FeedbackAgent::open(path.clone())?,
            None => FeedbackAgent::in_memory(),
        };

        Ok(Self {
            gateway: Arc::new(Gateway::new(config.gateway.clone())),
            knowledge: Arc::new(knowledge),
            router: Arc::new(RoutingAgent::new(
                http_client.clone(),
                config.llm.clone(),
                config.routing.use_classifier,
            )),
            solver: Arc::new(MathSolver::new(http_client.clone(), config.llm.clone())),
            web: Arc::new(WebSearcher::new(http_client, config.search.clone())),
            feedback: Arc::new(feedback),
            solve_semaphore: Arc::new(tokio::sync::Semaphore::new(config.max_concurrent_solves)),
            config,
        })
    }
}
