use std::sync::Arc;
use std::time::Duration;

use interview_nav_rust::config::EngineConfig;
use interview_nav_rust::logic::{NavOutcome, Navigator};
use interview_nav_rust::seed;
use interview_nav_rust::store::{HttpStore, MemoryStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = EngineConfig::load()?;
    println!(
        "interview-nav: project={} exit={}",
        config.project.id, config.project.exit
    );

    if config.api.url.is_empty() {
        println!("No API base URL configured, walking the built-in demo catalog");
        let store = Arc::new(MemoryStore::new());
        let project_id = seed::load_demo_data(&store).await?;
        walk(store, &project_id, &config.project.exit).await
    } else {
        let store = Arc::new(HttpStore::with_timeout(
            &config.api.url,
            Duration::from_secs(config.api.timeout),
        )?);
        walk(store, &config.project.id, &config.project.exit).await
    }
}

/// Walk the questionnaire front to back, printing each admitted page and
/// the render signals the engine emits along the way.
async fn walk<S: Store>(store: Arc<S>, project_id: &str, exit_url: &str) -> anyhow::Result<()> {
    let mut navigator = Navigator::start(store, &project_id.to_string(), exit_url).await?;

    let mut outcome = match navigator.current() {
        Some(_) => NavOutcome::Page,
        None => NavOutcome::Exhausted,
    };

    while outcome == NavOutcome::Page {
        if let Some(page) = navigator.current() {
            println!(
                "== {} / {} ({})",
                page.entity.section, page.entity.subsection, page.entity.id
            );
            for question in &page.entity.questions {
                println!("   ? {} [{:?}]", question.text, question.widget_type);
            }
        }
        for signal in navigator.take_signals() {
            println!("   signal: {:?}", signal);
        }
        outcome = navigator.next().await?;
    }

    match outcome {
        NavOutcome::Exit => println!("Done, control passes to {}", exit_url),
        NavOutcome::Exhausted => println!("No further admitting page"),
        NavOutcome::Page => unreachable!(),
    }
    Ok(())
}
