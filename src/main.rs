//! Reflex - 神经符号决策引擎
//!
//! 控制台入口：初始化日志与配置，组装编排器，跑查询-评分主循环。
//! 每条回答后征求 y/n 评分，差评可附上理想回答来教引擎学新规则；
//! `:explain` 查看上一条决策的推理依据，`:stats` 看规则簿概况。

use std::io::{self, BufRead, Write};

use reflex::config::{load_config, AppConfig};
use reflex::llm::{create_llm_from_config, OllamaClient};
use reflex::memory::{JsonRuleStorage, Session};
use reflex::DecisionAgent;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });
    let app_name = cfg.app.name.clone().unwrap_or_else(|| "Reflex".to_string());

    let llm = create_llm_from_config(&cfg);
    if cfg.llm.provider.eq_ignore_ascii_case("ollama") {
        let probe = OllamaClient::new(cfg.llm.ollama.host.clone(), cfg.llm.ollama.model.clone());
        if !probe.ping().await {
            tracing::warn!(
                "Ollama is not reachable at {}, fallback answers will degrade until it is up",
                probe.host()
            );
        }
    }

    let storage = JsonRuleStorage::new(&cfg.memory.rules_path);
    let mut agent = DecisionAgent::new(Box::new(storage), llm, cfg.rules.clone());
    if cfg.app.seed_base_rules {
        agent.seed_base_rules();
    }
    let mut session = Session::new();

    println!("--- {} Decision Engine ---", app_name);
    println!("Type a query, or 'quit' to exit. Commands: :explain [id], :stats");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut last_decision_id: Option<String> = None;

    loop {
        print!("\n> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") || input == ":quit" {
            break;
        }

        if input == ":stats" {
            let stats = agent.stats(&session);
            println!("Rules: {} total, {} with a winning record", stats.total_rules, stats.successful_rules);
            println!("Decisions this session: {}", stats.total_decisions);
            println!("Rule success share: {:.2}", stats.rule_success_rate);
            continue;
        }
        if input == ":explain" || input.starts_with(":explain ") {
            let id = input.trim_start_matches(":explain").trim();
            let target = if id.is_empty() {
                last_decision_id.clone()
            } else {
                Some(id.to_string())
            };
            match target {
                Some(id) => println!("{}", agent.explain(&session, &id)),
                None => println!("No decision to explain yet."),
            }
            continue;
        }

        let decision = agent.process(&mut session, input).await;
        println!("\n{}: {}", app_name, decision.output);
        println!(
            "(Decision ID: {}, Confidence: {:.2})",
            decision.id, decision.final_confidence
        );
        last_decision_id = Some(decision.id.clone());

        print!("Was this helpful? (y/n, Enter to skip): ");
        io::stdout().flush()?;
        let Some(answer) = lines.next() else { break };
        match answer?.trim().to_lowercase().as_str() {
            "y" => agent.feedback(&mut session, &decision.id, 5, "").await,
            "n" => {
                print!("How should I have responded? (Enter to skip): ");
                io::stdout().flush()?;
                let Some(correction) = lines.next() else { break };
                let correction = correction?;
                agent
                    .feedback(&mut session, &decision.id, 1, correction.trim())
                    .await;
            }
            _ => {}
        }
    }

    println!("Bye.");
    Ok(())
}
