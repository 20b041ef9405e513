//! `folio ask`: single-question or interactive mode.

use std::io::Write;
use std::path::Path;

use folio_agent::PortfolioAgent;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CliResult, build_components, load_config, require_api_key};

pub async fn run(config_path: Option<&Path>, message: Option<String>) -> CliResult<()> {
    let config = load_config(config_path)?;
    require_api_key(&config)?;

    let (provider, indexer) = build_components(&config)?;
    let chunks = indexer.load_or_build().await?;
    let agent = PortfolioAgent::from_config(&config, provider, indexer.clone());
    let mut history = agent.new_history();

    if let Some(question) = message {
        let answer = agent.handle_query(&question, &mut history).await?;
        println!("{answer}");
        return Ok(());
    }

    println!();
    println!("  Folio: Interactive Mode");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", agent.model());
    println!("  Index:     {chunks} chunks");
    println!();
    println!("  Ask about your portfolio documents and press Enter.");
    println!("  Type 'clear' to forget the conversation, 'exit' to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "exit" | "quit" => break,
            "clear" => {
                history.clear();
                println!("  (conversation cleared)\n");
                continue;
            }
            _ => {}
        }

        match agent.handle_query(line, &mut history).await {
            Ok(answer) => {
                println!();
                for text in answer.lines() {
                    println!("  Folio > {text}");
                }
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    Ok(())
}
