//! CLI commands for zapcmd using clap.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::chat;
use crate::command::{self, dispatch, known_commands};
use crate::config::{load_settings_or_default, Settings};
use crate::gateway;
use crate::interpreter::{CommandResult, Interpreter};
use crate::schedule::{self, Recurrence};
use crate::store::{Instance, NewSchedule, Store};

/// zapcmd - WhatsApp group commands for UAZAPI instances.
#[derive(Parser)]
#[command(name = "zapcmd")]
#[command(version)]
#[command(about = "Interpret #commands into WhatsApp group operations", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP API (and the scheduled message processor)
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Execute a command line against an instance
    Run {
        /// Instance ID
        #[arg(long, short, env = "ZAPCMD_INSTANCE")]
        instance: String,

        /// Command line, e.g. "#attnomegrupo Vendas|Vendas 2024"
        line: String,
    },

    /// Parse a command line without executing it
    Parse {
        /// Command line
        line: String,
    },

    /// List the chat and group commands
    Commands,

    /// Manage gateway instances
    #[command(subcommand)]
    Instance(InstanceCommand),

    /// Manage scheduled messages
    #[command(subcommand)]
    Schedule(ScheduleCommand),
}

#[derive(Subcommand)]
pub enum InstanceCommand {
    /// Register an instance
    Add {
        /// Instance ID
        id: String,

        /// Gateway base URL
        #[arg(long)]
        url: String,

        /// Instance token
        #[arg(long, env = "ZAPCMD_TOKEN")]
        token: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// List instances
    List,

    /// Remove an instance
    Remove {
        /// Instance ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ScheduleCommand {
    /// Schedule a message
    Add {
        /// Instance ID
        #[arg(long)]
        instance: String,

        /// Phone number or group JID
        #[arg(long)]
        to: String,

        /// Message text
        #[arg(long)]
        message: String,

        /// First run (RFC 3339)
        #[arg(long)]
        at: String,

        /// none, daily, weekly or monthly
        #[arg(long, default_value = "none")]
        repeat: String,
    },

    /// List scheduled messages
    List,

    /// Remove a scheduled message
    Remove {
        /// Scheduled message ID
        id: String,
    },

    /// Send everything that is due now
    Process,
}

impl Commands {
    /// Run the command.
    pub async fn run(&self) -> Result<()> {
        let settings = load_settings_or_default();

        match &self.command {
            Command::Serve { host, port } => cmd_serve(settings, host.clone(), *port).await,
            Command::Run { instance, line } => cmd_run(&settings, instance, line).await,
            Command::Parse { line } => cmd_parse(line),
            Command::Commands => cmd_commands(),
            Command::Instance(cmd) => cmd_instance(&settings, cmd),
            Command::Schedule(cmd) => cmd_schedule(&settings, cmd).await,
        }
    }
}

// Command implementations

async fn cmd_serve(mut settings: Settings, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }

    let store = Store::from_settings(&settings)?;
    tracing::info!("Using database {}", store.path().display());
    crate::web::run_server(settings, store).await?;
    Ok(())
}

async fn cmd_run(settings: &Settings, instance_id: &str, line: &str) -> Result<()> {
    let store = Store::from_settings(settings)?;
    let instance = store.require_instance(instance_id)?;
    let gateway = gateway::for_instance(&instance, &settings.gateway)?;
    let interpreter = Interpreter::new(gateway).with_settle_delay(settings.gateway.settle_delay());

    match interpreter.interpret(line).await {
        Some(result) => print_result(&result),
        None => {
            println!("Not a command; it would be sent as a plain message.");
            Ok(())
        }
    }
}

fn print_result(result: &CommandResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    if !result.success {
        anyhow::bail!("#{} failed: {}", result.command, result.message);
    }
    Ok(())
}

fn cmd_parse(line: &str) -> Result<()> {
    let Some(parsed) = command::parse_command(line) else {
        println!("Not a command.");
        return Ok(());
    };

    println!("Command: {}", parsed.command);
    for (i, param) in parsed.params.iter().enumerate() {
        println!("  [{}] {:?}", i, param);
    }

    match dispatch(&parsed) {
        None => println!("Unknown group command."),
        Some(Ok(operation)) => println!("Operation: {}", serde_json::to_string_pretty(&operation)?),
        Some(Err(usage)) => println!("{}", usage),
    }
    Ok(())
}

fn cmd_commands() -> Result<()> {
    println!("Group commands (first parameter is the group):");
    for (token, usage) in known_commands() {
        println!("  {:<18} {}", token, usage);
    }

    println!();
    println!("Chat commands (act on the open chat):");
    for spec in chat::CHAT_COMMANDS {
        let sep = spec.separator.to_string();
        println!("  {:<18} {} [{}]", spec.token, spec.label, spec.fields.join(sep.as_str()));
    }
    Ok(())
}

fn cmd_instance(settings: &Settings, cmd: &InstanceCommand) -> Result<()> {
    let store = Store::from_settings(settings)?;

    match cmd {
        InstanceCommand::Add { id, url, token, name } => {
            let instance = Instance::new(id, name.as_deref().unwrap_or(id), url, token);
            store.add_instance(&instance)?;
            println!("Instance {} added.", id);
        }
        InstanceCommand::List => {
            let instances = store.list_instances()?;
            if instances.is_empty() {
                println!("No instances registered.");
            }
            for instance in instances {
                println!(
                    "• {} - {} ({}) token {}",
                    instance.id,
                    instance.name,
                    instance.base_url,
                    instance.masked_token()
                );
            }
        }
        InstanceCommand::Remove { id } => {
            if store.remove_instance(id)? {
                println!("Instance {} removed.", id);
            } else {
                anyhow::bail!("Instance {} not found", id);
            }
        }
    }
    Ok(())
}

async fn cmd_schedule(settings: &Settings, cmd: &ScheduleCommand) -> Result<()> {
    let store = Store::from_settings(settings)?;

    match cmd {
        ScheduleCommand::Add {
            instance,
            to,
            message,
            at,
            repeat,
        } => {
            store.require_instance(instance)?;
            let next_run = DateTime::parse_from_rfc3339(at)
                .with_context(|| format!("Invalid --at timestamp: {}", at))?
                .with_timezone(&Utc);
            let recurrence: Recurrence = repeat.parse().map_err(anyhow::Error::msg)?;

            let scheduled = store.add_schedule(&NewSchedule {
                instance_id: instance.clone(),
                target: to.clone(),
                message: message.clone(),
                next_run,
                recurrence,
            })?;
            println!("Scheduled {} for {} ({}).", scheduled.id, scheduled.next_run, recurrence);
        }
        ScheduleCommand::List => {
            let scheduled = store.list_schedules()?;
            if scheduled.is_empty() {
                println!("No scheduled messages.");
            }
            for s in scheduled {
                let state = if s.active { "active" } else { "done" };
                println!(
                    "• {} [{}] {} -> {} at {} ({}){}",
                    s.id,
                    state,
                    s.instance_id,
                    s.target,
                    s.next_run,
                    s.recurrence,
                    s.last_error
                        .map(|e| format!(" last error: {}", e))
                        .unwrap_or_default()
                );
            }
        }
        ScheduleCommand::Remove { id } => {
            if store.remove_schedule(id)? {
                println!("Scheduled message {} removed.", id);
            } else {
                anyhow::bail!("Scheduled message {} not found", id);
            }
        }
        ScheduleCommand::Process => {
            let report = schedule::process_due(&store, settings, Utc::now()).await?;
            println!(
                "{} sent, {} failed, {} finished.",
                report.sent, report.failed, report.finished
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Commands::command().debug_assert();
    }

    #[test]
    fn test_parse_run_arguments() {
        let cli = Commands::try_parse_from([
            "zapcmd",
            "run",
            "--instance",
            "loja",
            "#attnomegrupo Vendas|Vendas 2024",
        ])
        .unwrap();

        match cli.command {
            Command::Run { instance, line } => {
                assert_eq!(instance, "loja");
                assert_eq!(line, "#attnomegrupo Vendas|Vendas 2024");
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_schedule_repeat_default() {
        let cli = Commands::try_parse_from([
            "zapcmd",
            "schedule",
            "add",
            "--instance",
            "loja",
            "--to",
            "1203@g.us",
            "--message",
            "Bom dia",
            "--at",
            "2026-10-20T09:00:00-03:00",
        ])
        .unwrap();

        match cli.command {
            Command::Schedule(ScheduleCommand::Add { repeat, .. }) => assert_eq!(repeat, "none"),
            _ => panic!("expected schedule add"),
        }
    }
}
