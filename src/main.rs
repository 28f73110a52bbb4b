use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use kliksy_gate::{
    AccessGate, AuditDispatch, DirectoryStore, GateConfig, GateOutcome, HistoryNavigator,
    SessionRecord, Trigger, telemetry,
};

/// Drives the session gate against a directory-backed store, one page visit per invocation.
#[derive(Parser)]
#[command(name = "kliksy-gate", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluates the gate for a page path and reports the decision.
    Visit {
        path: String,
        /// Evaluate as a back/forward restore instead of a first load.
        #[arg(long)]
        restored: bool,
    },
    /// Logs out from the given page, waiting for the audit notification before exiting.
    Logout {
        #[arg(long)]
        from: String,
        #[arg(long)]
        target: Option<String>,
    },
    /// Writes a session record, standing in for the external login flow.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
    },
    /// Prints the stored session, if any.
    Whoami,
}

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Configuration & Environment Loading
    dotenv::dotenv().ok();
    let config = GateConfig::load();

    // 2. Logging
    telemetry::init_tracing(&config.env);
    tracing::debug!(env = ?config.env, store_dir = %config.store_dir.display(), "configuration loaded");

    let cli = Cli::parse();
    let store = Arc::new(DirectoryStore::new(config.store_dir.clone()));

    // 3. Gate Assembly
    let start_path = match &cli.command {
        Command::Visit { path, .. } => path.clone(),
        Command::Logout { from, .. } => from.clone(),
        Command::Login { .. } | Command::Whoami => String::new(),
    };
    let navigator = Arc::new(HistoryNavigator::new(start_path));
    let gate = match AccessGate::from_config(config, store, navigator.clone()) {
        Ok(gate) => gate,
        Err(e) => {
            tracing::error!(error = %e, "failed to build audit client");
            return ExitCode::FAILURE;
        }
    };

    // 4. Command Dispatch
    match cli.command {
        Command::Visit { restored, .. } => {
            let trigger = if restored { Trigger::PageShow } else { Trigger::Load };
            report(&gate.evaluate(trigger));
        }
        Command::Logout { target, .. } => {
            // A public page with a session redirects first; log out from wherever it lands.
            let outcome = gate.settle(Trigger::Load);
            let Some(page) = outcome.allowed() else {
                report(&outcome);
                tracing::error!("no page reachable to log out from");
                return ExitCode::FAILURE;
            };

            let logout = page.logout(target.as_deref()).await;
            // The process is about to exit, so give the detached audit task its chance to finish.
            if let AuditDispatch::Dispatched(handle) = logout.audit
                && let Err(e) = handle.await
            {
                tracing::warn!(error = %e, "audit task aborted");
            }

            if gate.session().read().is_some() {
                tracing::error!("session slot still occupied after logout");
                return ExitCode::FAILURE;
            }
            println!("logged out: {:?}", logout.redirect);
        }
        Command::Login { email, username } => {
            if let Err(e) = gate.session().write(&SessionRecord::new(email, username)) {
                tracing::error!(error = %e, "failed to store session");
                return ExitCode::FAILURE;
            }
            println!("session stored under {:?}", gate.session().key());
        }
        Command::Whoami => match gate.session().read() {
            Some(user) => println!("{} <{}>", user.username, user.email),
            None => println!("not logged in"),
        },
    }

    let history = navigator.navigations();
    if !history.is_empty() {
        println!("navigated to: {}", history.join(" -> "));
    }
    ExitCode::SUCCESS
}

fn report(outcome: &GateOutcome) {
    match outcome {
        GateOutcome::Allowed(page) => {
            let user = page
                .current_user()
                .map(|user| user.username)
                .unwrap_or_else(|| "anonymous".to_string());
            println!("allowed: page={:?} class={:?} user={}", page.page(), page.class(), user);
        }
        GateOutcome::Redirected { class, outcome } => {
            println!("redirected: class={class:?} outcome={outcome:?}");
        }
    }
}
