use clap::Args;

use dreamclass_core::{Assistant, GeminiClient};

use super::CommandError;
use crate::config::Config;

#[derive(Args)]
pub struct AskCommand {
    /// What you need ideas for (e.g. "친구 사랑 주간")
    #[arg(required = true, num_args = 1..)]
    pub topic: Vec<String>,
}

impl AskCommand {
    pub async fn run(&self, config: &Config) -> Result<(), CommandError> {
        let assistant = assistant(config);
        if !assistant.is_configured() {
            eprintln!("Note: no assistant API key configured; set DREAMCLASS_AI_KEY.");
        }

        match assistant.class_suggestions(&self.topic.join(" ")).await {
            Some(text) => println!("{}", text.trim()),
            None => println!("Give a topic to get ideas for."),
        }
        Ok(())
    }
}

/// Prints a morning encouragement message.
pub async fn greet(config: &Config) -> Result<(), CommandError> {
    println!("{}", assistant(config).encouragement().await.trim());
    Ok(())
}

fn assistant(config: &Config) -> Assistant<GeminiClient> {
    let client = config
        .assistant
        .api_key
        .as_ref()
        .map(|key| GeminiClient::new(key.clone(), config.assistant.model.clone()));
    Assistant::new(client)
}
