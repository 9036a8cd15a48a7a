use anyhow::{anyhow, Result};
use clap::Args;
use std::io::{self, Read};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::llm::{AnswerGenerator, OpenAIProvider};

/// Answer a single question non-interactively
#[derive(Args)]
pub struct AskCommand {
    /// The question. If not provided, it is read from stdin
    pub question: Vec<String>,

    /// Also suggest up to three follow-up questions
    #[arg(short = 'f', long = "follow-ups")]
    pub follow_ups: bool,

    /// Improve this answer to the question instead of writing a new one
    #[arg(short = 'i', long = "improve", value_name = "ANSWER")]
    pub improve: Option<String>,
}

impl AskCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        debug!("Executing ask command");

        let question = self.get_question()?;
        let question = question.trim();
        if question.is_empty() {
            return Err(anyhow!("No question provided. Use arguments or pipe input via stdin."));
        }

        config.validate()?;

        let provider = Arc::new(OpenAIProvider::new(config.provider_config())?);
        let generator = AnswerGenerator::new(provider, config.temperature);

        info!("Asking: {}", question.chars().take(50).collect::<String>());

        let answer = match self.improve.as_deref().map(str::trim) {
            Some("") => return Err(anyhow!("The answer to improve cannot be empty")),
            Some(current) => generator.improve_answer(question, current).await?,
            None => generator.generate_answer(question).await?,
        };
        println!("{}", answer);

        if self.follow_ups {
            let questions = generator.generate_follow_up_questions(question).await;
            if !questions.is_empty() {
                println!("\nFollow-up questions:");
                for q in questions {
                    println!("  {}", q);
                }
            }
        }

        Ok(())
    }

    fn get_question(&self) -> Result<String> {
        if !self.question.is_empty() {
            Ok(self.question.join(" "))
        } else {
            debug!("Reading question from stdin");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| anyhow!("Failed to read from stdin: {}", e))?;
            Ok(buffer)
        }
    }
}
