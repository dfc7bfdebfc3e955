use super::models::{AppEvent, EventBus};
use colored::Colorize;
use std::sync::Arc;

impl EventBus {
    pub fn new(silent_mode: bool) -> Arc<Self> {
        Arc::new(Self { silent_mode })
    }

    pub fn emit(&self, event: AppEvent) {
        if self.silent_mode {
            return;
        }
        match event {
            // Application lifecycle
            AppEvent::Starting => {
                println!("\n{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_black());
                println!("  {}", "BlockPulse - Server Status Monitor".white().bold());
                println!("  {} {}", "Version".dimmed(), env!("CARGO_PKG_VERSION").cyan());
                println!("{}\n", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_black());
            }
            AppEvent::Ready { addr, base_url } => {
                println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".green());
                println!("  {} {}", "Server".white(), addr.cyan());
                println!("  {} {}", "URL   ".white(), base_url.blue());
                println!("{}\n", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".green());
            }
            AppEvent::Shutdown => {
                println!("\n{}", "Server shutting down".red());
            }

            // Configuration
            AppEvent::ConfigLoading { path } => {
                println!("  {} {}", "Loading config".dimmed(), path.cyan());
            }
            AppEvent::ConfigLoaded { servers_count } => {
                if servers_count == 0 {
                    println!("  {} No servers configured", "⚠".yellow());
                } else {
                    println!("  {} {} tracked server(s)", "✓".green(), servers_count.to_string().cyan());
                }
            }
            AppEvent::ConfigCreated { path } => {
                tracing::warn!("Configuration file not found");
                tracing::info!("Created default configuration at: {}", path);
            }
            AppEvent::ConfigError { error } => {
                tracing::error!("Configuration error: {}", error);
            }

            // Upstream sources
            AppEvent::SourcesLoaded { java, bedrock } => {
                println!(
                    "  {} {} java / {} bedrock upstream source(s)",
                    "✓".green(),
                    java.to_string().cyan(),
                    bedrock.to_string().cyan()
                );
            }

            // Persistence
            AppEvent::DatabaseReady { url } => {
                println!("  {} Database {}", "✓".green(), url.cyan());
            }
            AppEvent::ServerRegistered { .. } => {
                // Silent - reduce verbosity
            }

            // Icon cache
            AppEvent::IconCacheDir { path } => {
                println!("  {} Icon cache {}", "✓".green(), path.cyan());
            }

            // Background polling
            AppEvent::PollingEnabled { interval } => {
                println!("  {} Polling every {}s", "↻".blue(), interval.to_string().cyan());
            }
            AppEvent::PollCompleted { resolved, failed } => {
                if failed > 0 {
                    println!(
                        "  {} Poll finished: {} ok, {} failed",
                        "⚠".yellow(),
                        resolved.to_string().cyan(),
                        failed.to_string().red()
                    );
                }
            }

            // Errors
            AppEvent::Error { context, error } => {
                tracing::error!("{}: {}", context, error);
            }
        }
    }
}
