//! logdesk-cli - scriptable access to the LogCollector API
//!
//! Every console operation is available as a subcommand, with plain-text
//! output by default and `--json` for piping into other tools.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/logdesk/config.toml (~/.config/logdesk/config.toml)
//! - Logs: $XDG_STATE_HOME/logdesk/ (~/.local/state/logdesk/)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Args as ClapArgs, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use logdesk_core::checks::{self, CheckStatus};
use logdesk_core::format::{format_count, or_placeholder, short_hash, truncate};
use logdesk_core::generator::{self, LogTemplate, Preset, RunSettings};
use logdesk_core::ranking;
use logdesk_core::{
    format_server_time, AddendumCreate, ApiClient, Author, BlockingApi, Config,
    IncidentDetailsUpdate, IncidentQuery, IncidentStatus, KbArticleWrite, KbDetailQuery, KbQuery,
    KbStatus, LogLevel, LogQuery, LogStatus, RankQuery,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "logdesk-cli")]
#[command(about = "Query and operate the LogCollector service")]
#[command(version)]
struct Args {
    /// API base URL (overrides config and LOGDESK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print raw JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Write a debug log to the state directory
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the API answers
    Health,

    /// Collected logs
    Logs {
        #[command(subcommand)]
        command: LogsCommand,
    },

    /// Incidents (logs grouped by hash)
    Incidents {
        #[command(subcommand)]
        command: IncidentsCommand,
    },

    /// Knowledge-base articles
    Kb {
        #[command(subcommand)]
        command: KbCommand,
    },

    /// Show the OPEN, recent and all-time incident boards
    Rank {
        /// Entries per board
        #[arg(short, long)]
        limit: Option<u32>,

        /// Only incidents of this service
        #[arg(short, long)]
        service: Option<String>,
    },

    /// Send synthetic logs
    Generate(GenerateArgs),

    /// Run the end-to-end API smoke check
    Check,
}

#[derive(Subcommand)]
enum LogsCommand {
    /// List logs, newest first
    List {
        #[arg(short, long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
        #[arg(short, long)]
        service: Option<String>,
        /// NEW, ACKNOWLEDGED, RESOLVED or IGNORED
        #[arg(long, value_parser = parse_wire::<LogStatus>)]
        status: Option<LogStatus>,
        /// Only logs from today
        #[arg(long)]
        today: bool,
    },

    /// Change a log's status
    Status {
        log_id: i64,
        /// NEW, ACKNOWLEDGED, RESOLVED or IGNORED
        #[arg(value_parser = parse_wire::<LogStatus>)]
        status: LogStatus,
    },

    /// Ask for an AI analysis of a log hash
    Analyze {
        log_hash: String,
        /// Discard any cached analysis
        #[arg(long)]
        force: bool,
    },

    /// Send a single log
    Send {
        #[arg(short, long)]
        service: String,
        #[arg(short, long)]
        message: String,
        #[arg(long)]
        host: Option<String>,
        /// Omit to let the server infer it
        #[arg(short, long, value_parser = parse_wire::<LogLevel>)]
        level: Option<LogLevel>,
        #[arg(long)]
        stack_trace: Option<String>,
        /// Occurrence time, e.g. 2026-01-20T18:41:09
        #[arg(long)]
        occurred_time: Option<String>,
    },
}

#[derive(Subcommand)]
enum IncidentsCommand {
    /// Search incidents
    Search {
        /// Free-text query
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long, value_parser = parse_wire::<IncidentStatus>)]
        status: Option<IncidentStatus>,
        #[arg(short, long)]
        service: Option<String>,
        #[arg(short, long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
    },

    /// Show one incident
    Get { log_hash: String },

    /// Change an incident's status
    Status {
        log_hash: String,
        #[arg(value_parser = parse_wire::<IncidentStatus>)]
        status: IncidentStatus,
    },

    /// Update title, assignee or status
    Update {
        log_hash: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long, value_parser = parse_wire::<IncidentStatus>)]
        status: Option<IncidentStatus>,
    },

    /// Top incidents by a metric
    Top {
        #[arg(long, default_value = "repeatCount")]
        metric: String,
        #[arg(short, long, default_value_t = 5)]
        limit: u32,
        #[arg(long, value_parser = parse_wire::<IncidentStatus>)]
        status: Option<IncidentStatus>,
        #[arg(short, long)]
        service: Option<String>,
        /// Window start, e.g. 2026-01-13T00:00:00
        #[arg(long)]
        from: Option<NaiveDateTime>,
        #[arg(long)]
        to: Option<NaiveDateTime>,
    },

    /// Create a KB draft from an incident
    Draft { incident_id: i64 },
}

#[derive(Subcommand)]
enum KbCommand {
    /// List articles
    List {
        #[arg(long, value_parser = parse_wire::<KbStatus>)]
        status: Option<KbStatus>,
        #[arg(short, long)]
        keyword: Option<String>,
        /// system, user or admin
        #[arg(short, long, value_parser = parse_wire::<Author>)]
        author: Option<Author>,
        #[arg(short, long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
    },

    /// Show one article with a page of addendums
    Get {
        id: i64,
        #[arg(long, default_value_t = 0)]
        addendum_page: u32,
        #[arg(long, default_value_t = 20)]
        addendum_size: u32,
    },

    /// Save or append to an article
    Save(ArticleArgs),

    /// Overwrite a draft
    UpdateDraft(ArticleArgs),

    /// Set an article's status
    Status {
        id: i64,
        #[arg(value_parser = parse_wire::<KbStatus>)]
        status: KbStatus,
    },

    /// Publish an article
    Publish { id: i64 },

    /// List all addendums of an article
    Addendums { id: i64 },

    /// Append an addendum
    AddAddendum {
        id: i64,
        #[arg(short, long)]
        content: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long, default_value = "user", value_parser = parse_wire::<Author>)]
        author: Author,
    },

    /// Run the draft scheduler now
    Scheduler,
}

#[derive(ClapArgs)]
struct ArticleArgs {
    id: i64,
    #[arg(short, long)]
    title: String,
    #[arg(short, long)]
    content: String,
    #[arg(short, long, default_value = "user", value_parser = parse_wire::<Author>)]
    author: Author,
}

#[derive(ClapArgs)]
struct GenerateArgs {
    /// DB, PAYMENT or OOM
    #[arg(short, long)]
    preset: Option<Preset>,
    #[arg(short, long)]
    service: Option<String>,
    #[arg(long)]
    host: Option<String>,
    #[arg(short, long, value_parser = parse_wire::<LogLevel>)]
    level: Option<LogLevel>,
    #[arg(short, long)]
    message: Option<String>,
    #[arg(long)]
    stack_trace: Option<String>,
    /// Number of logs to send
    #[arg(short, long, default_value_t = 1)]
    repeat: u32,
    /// Milliseconds between sends
    #[arg(short, long)]
    delay: Option<u64>,
}

/// Strict parse for status, level and author arguments.
///
/// Wire enums also convert from any string into their `Other` variant, which
/// clap would otherwise pick up and accept.
fn parse_wire<T>(value: &str) -> std::result::Result<T, String>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse()
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(url) = &args.api_url {
        config.api.base_url = url.clone();
    }
    config.validate().context("invalid configuration")?;

    // Initialize logging if verbose
    let _log_guard = if args.verbose {
        let guard = logdesk_core::logging::init(&config.logging)
            .context("failed to initialize logging")?;
        eprintln!("Logging to {}", guard.log_dir().display());
        Some(guard)
    } else {
        None
    };

    let client = ApiClient::new(&config.api).context("invalid API configuration")?;
    let api = BlockingApi::new(Arc::new(client)).context("failed to start runtime")?;
    let out = Output { json: args.json };

    match args.command {
        Command::Health => cmd_health(&api, &config, &out),
        Command::Logs { command } => cmd_logs(&api, &out, command),
        Command::Incidents { command } => cmd_incidents(&api, &out, command),
        Command::Kb { command } => cmd_kb(&api, &out, command),
        Command::Rank { limit, service } => cmd_rank(
            &api,
            &out,
            limit.unwrap_or(config.console.rank_limit),
            service,
        ),
        Command::Generate(gen) => cmd_generate(&api, &config, &out, gen),
        Command::Check => cmd_check(&api, &out),
    }
}

/// Output mode shared by all commands.
struct Output {
    json: bool,
}

impl Output {
    fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("failed to encode JSON")?
        );
        Ok(())
    }

    /// Acknowledge a write.
    fn done(&self, message: &str) -> Result<()> {
        if self.json {
            self.json(&serde_json::json!({ "ok": true, "message": message }))
        } else {
            println!("{}", message);
            Ok(())
        }
    }
}

fn cmd_health(api: &BlockingApi, config: &Config, out: &Output) -> Result<()> {
    let up = api.health_check().context("health check failed")?;
    if out.json {
        out.json(&serde_json::json!({ "url": config.api.base_url, "up": up }))?;
    } else if up {
        println!("API is up: {}", config.api.base_url);
    } else {
        println!("API is unreachable: {}", config.api.base_url);
    }
    if !up {
        std::process::exit(1);
    }
    Ok(())
}

// ========== Logs ==========

fn cmd_logs(api: &BlockingApi, out: &Output, command: LogsCommand) -> Result<()> {
    match command {
        LogsCommand::List {
            page,
            size,
            service,
            status,
            today,
        } => {
            let query = LogQuery {
                page,
                size,
                service_name: service,
                status,
                today_only: today,
            };
            let logs = api.search_logs(&query).context("failed to list logs")?;
            if out.json {
                return out.json(&logs);
            }
            if logs.content.is_empty() {
                println!("No logs found.");
                return Ok(());
            }
            println!(
                "{:<8} {:<26} {:<9} {:<13} {:<20} MESSAGE",
                "ID", "OCCURRED", "LEVEL", "STATUS", "SERVICE"
            );
            for log in &logs.content {
                println!(
                    "{:<8} {:<26} {:<9} {:<13} {:<20} {}",
                    log.id().map(|id| id.to_string()).unwrap_or_default(),
                    format_server_time(log.occurred_at()),
                    label(log.log_level.as_ref()),
                    label(log.status.as_ref()),
                    truncate(log.service(), 20),
                    truncate(log.display_message(), 80)
                );
            }
            print_paging(page, logs.total_elements, logs.has_next(size));
            Ok(())
        }
        LogsCommand::Status { log_id, status } => {
            api.update_log_status(log_id, &status)
                .with_context(|| format!("failed to update log {}", log_id))?;
            out.done(&format!("Log {} is now {}", log_id, status))
        }
        LogsCommand::Analyze { log_hash, force } => {
            let analysis = api
                .analyze(&log_hash, force)
                .with_context(|| format!("failed to analyze {}", log_hash))?;
            if out.json {
                return out.json(&analysis);
            }
            println!("Cause:\n  {}", or_placeholder(analysis.cause.as_deref()));
            println!("Suggestion:\n  {}", or_placeholder(analysis.suggestion.as_deref()));
            if let Some(kb_id) = analysis.kb_id {
                println!("KB article: #{}", kb_id);
            }
            Ok(())
        }
        LogsCommand::Send {
            service,
            message,
            host,
            level,
            stack_trace,
            occurred_time,
        } => {
            let template = LogTemplate {
                service_name: service,
                host_name: host.unwrap_or_default(),
                log_level: level,
                message,
                stack_trace: stack_trace.unwrap_or_default(),
            };
            let mut request = template.to_request();
            request.occurred_time = occurred_time;
            api.collect_log(&request).context("failed to send log")?;
            out.done(&format!(
                "Log accepted (level {})",
                template.predicted_level()
            ))
        }
    }
}

// ========== Incidents ==========

fn cmd_incidents(api: &BlockingApi, out: &Output, command: IncidentsCommand) -> Result<()> {
    match command {
        IncidentsCommand::Search {
            query,
            status,
            service,
            page,
            size,
        } => {
            let query = IncidentQuery {
                query,
                status,
                service_name: service,
                page,
                size,
            };
            let incidents = api
                .search_incidents(&query)
                .context("failed to search incidents")?;
            if out.json {
                return out.json(&incidents);
            }
            if incidents.content.is_empty() {
                println!("No incidents found.");
                return Ok(());
            }
            println!(
                "{:<10} {:<10} {:<26} {:>7}  {:<20} TITLE",
                "HASH", "STATUS", "LAST SEEN", "COUNT", "SERVICE"
            );
            for incident in &incidents.content {
                println!(
                    "{:<10} {:<10} {:<26} {:>7}  {:<20} {}",
                    short_hash(incident.log_hash.as_deref().unwrap_or("-")),
                    label(incident.status.as_ref()),
                    format_server_time(incident.last_occurred_at.as_ref()),
                    incident.repeat_count.map(format_count).unwrap_or_default(),
                    truncate(or_placeholder(incident.service_name.as_deref()), 20),
                    truncate(incident.display_title(), 80)
                );
            }
            print_paging(page, incidents.total_elements, incidents.has_next(size));
            Ok(())
        }
        IncidentsCommand::Get { log_hash } => {
            let incident = api
                .get_incident(&log_hash)
                .with_context(|| format!("failed to load incident {}", log_hash))?;
            if out.json {
                return out.json(&incident);
            }
            println!("{}", incident.display_title());
            println!("{}", "=".repeat(incident.display_title().chars().count().min(80)));
            println!("Log hash:    {}", log_hash);
            println!("ID:          {}", opt_num(incident.id));
            println!("Status:      {}", label(incident.status.as_ref()));
            println!("Level:       {}", label(incident.error_level.as_ref()));
            println!("Service:     {}", or_placeholder(incident.service_name.as_deref()));
            println!("Assignee:    {}", or_placeholder(incident.created_by.as_deref()));
            println!("Repeats:     {}", opt_num(incident.repeat_count));
            println!("First seen:  {}", format_server_time(incident.first_occurred_at.as_ref()));
            println!("Last seen:   {}", format_server_time(incident.last_occurred_at.as_ref()));
            println!("Resolved:    {}", format_server_time(incident.resolved_at.as_ref()));
            println!("Linked KB:   {}", opt_num(incident.linked_kb_id()));
            if let Some(summary) = incident.summary.as_deref().or(incident.log_summary.as_deref()) {
                println!();
                println!("{}", summary);
            }
            if incident.has_stack_trace() {
                println!();
                println!("{}", incident.stack_trace.as_deref().unwrap_or_default());
            }
            Ok(())
        }
        IncidentsCommand::Status { log_hash, status } => {
            api.update_incident_status(&log_hash, &status)
                .with_context(|| format!("failed to update incident {}", log_hash))?;
            out.done(&format!("Incident {} is now {}", short_hash(&log_hash), status))
        }
        IncidentsCommand::Update {
            log_hash,
            title,
            assignee,
            status,
        } => {
            let update = IncidentDetailsUpdate {
                title,
                created_by: assignee,
                status,
            };
            api.update_incident_details(&log_hash, &update)
                .with_context(|| format!("failed to update incident {}", log_hash))?;
            out.done(&format!("Incident {} updated", short_hash(&log_hash)))
        }
        IncidentsCommand::Top {
            metric,
            limit,
            status,
            service,
            from,
            to,
        } => {
            let query = RankQuery {
                metric,
                limit,
                status,
                service_name: service,
                from,
                to,
            };
            let entries = api.incident_top(&query).context("failed to load ranking")?;
            if out.json {
                return out.json(&entries);
            }
            if entries.is_empty() {
                println!("No incidents ranked.");
            }
            for (i, entry) in entries.iter().enumerate() {
                println!(
                    "{:>2}. {:>7}  {:<10} {:<20} {}",
                    i + 1,
                    format_count(entry.count()),
                    label(entry.status.as_ref()),
                    truncate(or_placeholder(entry.service_name.as_deref()), 20),
                    truncate(entry.display_title(), 80)
                );
            }
            Ok(())
        }
        IncidentsCommand::Draft { incident_id } => {
            let id = api
                .create_draft(incident_id)
                .with_context(|| format!("failed to create draft for incident {}", incident_id))?;
            if out.json {
                return out.json(&serde_json::json!({ "id": id }));
            }
            println!("Draft created: KB #{}", id);
            Ok(())
        }
    }
}

// ========== Knowledge Base ==========

fn cmd_kb(api: &BlockingApi, out: &Output, command: KbCommand) -> Result<()> {
    match command {
        KbCommand::List {
            status,
            keyword,
            author,
            page,
            size,
        } => {
            let query = KbQuery {
                status,
                keyword,
                created_by: author,
                page,
                size,
            };
            let articles = api.list_kb(&query).context("failed to list articles")?;
            if out.json {
                return out.json(&articles);
            }
            if articles.content.is_empty() {
                println!("No articles found.");
                return Ok(());
            }
            println!(
                "{:<6} {:<12} {:<26} {:<10} TITLE",
                "ID", "STATUS", "LAST ACTIVITY", "AUTHOR"
            );
            for article in &articles.content {
                println!(
                    "{:<6} {:<12} {:<26} {:<10} {}",
                    opt_num(article.id),
                    label(article.status.as_ref()),
                    format_server_time(article.last_activity()),
                    truncate(article.author(), 10),
                    truncate(article.display_title(), 80)
                );
            }
            print_paging(page, articles.total_elements, articles.has_next(size));
            Ok(())
        }
        KbCommand::Get {
            id,
            addendum_page,
            addendum_size,
        } => {
            let query = KbDetailQuery {
                addendum_page,
                addendum_size,
            };
            let article = api
                .get_kb(id, &query)
                .with_context(|| format!("failed to load article {}", id))?;
            if out.json {
                return out.json(&article);
            }
            println!("{}", article.display_title());
            println!("{}", "=".repeat(article.display_title().chars().count().min(80)));
            println!("ID:            {}", id);
            println!("Status:        {}", label(article.status.as_ref()));
            println!("Service:       {}", or_placeholder(article.service_name.as_deref()));
            println!("Author:        {}", article.author());
            println!("Created:       {}", format_server_time(article.created_at.as_ref()));
            println!("Last activity: {}", format_server_time(article.last_activity()));
            println!();
            println!("{}", or_placeholder(article.content.as_deref()));

            let offset = (addendum_page * addendum_size) as usize;
            if !article.addendums.is_empty() {
                println!();
                println!("Addendums (page {}):", addendum_page + 1);
                for (i, addendum) in article.addendums.iter().enumerate() {
                    println!(
                        "  {}. {} ({}, {})",
                        offset + i + 1,
                        addendum.headline(offset + i),
                        or_placeholder(addendum.created_by.as_deref()),
                        format_server_time(addendum.created_at.as_ref())
                    );
                    println!("     {}", addendum.preview());
                }
                if article.has_more_addendums() {
                    println!("  ... more on page {}", addendum_page + 2);
                }
            }
            Ok(())
        }
        KbCommand::Save(article) => {
            let body = article.body();
            api.post_kb_article(article.id, &body)
                .with_context(|| format!("failed to save article {}", article.id))?;
            out.done(&format!("Article {} saved", article.id))
        }
        KbCommand::UpdateDraft(article) => {
            let body = article.body();
            api.update_draft(article.id, &body)
                .with_context(|| format!("failed to update draft {}", article.id))?;
            out.done(&format!("Draft {} updated", article.id))
        }
        KbCommand::Status { id, status } => {
            api.update_kb_status(id, &status)
                .with_context(|| format!("failed to update article {}", id))?;
            out.done(&format!("Article {} is now {}", id, status))
        }
        KbCommand::Publish { id } => {
            api.update_kb_status(id, &KbStatus::Published)
                .with_context(|| format!("failed to publish article {}", id))?;
            out.done(&format!("Article {} published", id))
        }
        KbCommand::Addendums { id } => {
            let addendums = api
                .list_addendums(id)
                .with_context(|| format!("failed to list addendums of {}", id))?;
            if out.json {
                return out.json(&addendums);
            }
            if addendums.is_empty() {
                println!("No addendums.");
            }
            for (i, addendum) in addendums.iter().enumerate() {
                println!(
                    "{}. {} ({})",
                    i + 1,
                    addendum.headline(i),
                    format_server_time(addendum.created_at.as_ref())
                );
                println!("   {}", addendum.preview());
            }
            Ok(())
        }
        KbCommand::AddAddendum {
            id,
            content,
            title,
            author,
        } => {
            let body = AddendumCreate {
                title,
                content,
                status: None,
                created_by: author,
            };
            let created = api
                .create_addendum(id, &body)
                .with_context(|| format!("failed to add addendum to {}", id))?;
            if out.json {
                return out.json(&created);
            }
            println!("Addendum added to article {}", id);
            Ok(())
        }
        KbCommand::Scheduler => {
            let reply = api.run_scheduler().context("failed to run scheduler")?;
            let reply = reply.trim();
            out.done(if reply.is_empty() {
                "Scheduler executed"
            } else {
                reply
            })
        }
    }
}

impl ArticleArgs {
    fn body(&self) -> KbArticleWrite {
        KbArticleWrite {
            title: self.title.clone(),
            content: self.content.clone(),
            created_by: self.author.clone(),
        }
    }
}

// ========== Ranking ==========

fn cmd_rank(api: &BlockingApi, out: &Output, limit: u32, service: Option<String>) -> Result<()> {
    let inner = api.api();
    let boards = api.block_on(ranking::load_boards(
        inner.as_ref(),
        limit,
        service.as_deref(),
    ));

    if out.json {
        let value: Vec<_> = boards
            .iter()
            .map(|b| {
                serde_json::json!({
                    "board": b.board.title(),
                    "entries": b.entries,
                    "error": b.error,
                })
            })
            .collect();
        return out.json(&value);
    }

    for board in &boards {
        println!("{}", board.board.title());
        println!("{}", "-".repeat(board.board.title().len()));
        if let Some(err) = &board.error {
            println!("  failed: {}", err);
        } else if board.entries.is_empty() {
            println!("  no incidents");
        }
        for (i, (entry, ratio)) in board.bars().into_iter().enumerate() {
            let filled = (ratio * 20.0).round() as usize;
            println!(
                "{:>2}. {:<20} {:>7}  {}",
                i + 1,
                "#".repeat(filled.min(20)),
                format_count(entry.count()),
                truncate(entry.display_title(), 60)
            );
        }
        println!();
    }
    Ok(())
}

// ========== Generator ==========

fn cmd_generate(api: &BlockingApi, config: &Config, out: &Output, args: GenerateArgs) -> Result<()> {
    let mut template = args.preset.map(Preset::template).unwrap_or_default();
    if let Some(service) = args.service {
        template.service_name = service;
    }
    if let Some(host) = args.host {
        template.host_name = host;
    }
    if args.level.is_some() {
        template.log_level = args.level;
    }
    if let Some(message) = args.message {
        template.message = message;
    }
    if let Some(stack_trace) = args.stack_trace {
        template.stack_trace = stack_trace;
    }
    if template.message.trim().is_empty() {
        anyhow::bail!("a message is required (use --message or --preset)");
    }

    let settings = RunSettings::clamped(
        args.repeat,
        args.delay.unwrap_or(config.generator.delay_ms),
        &config.generator,
    );

    // Ctrl+C stops after the current send
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nStopping...");
        flag.store(true, Ordering::SeqCst);
    })
    .context("failed to set Ctrl+C handler")?;

    let pb = if out.json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(u64::from(settings.repeat))
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );
    pb.set_message(format!(
        "{} ({})",
        template.service_name,
        template.predicted_level()
    ));

    let inner = api.api();
    let report = api.block_on(generator::run(
        inner.as_ref(),
        &template,
        settings,
        Some(cancel.as_ref()),
        |progress| pb.set_position(u64::from(progress.sent)),
    ));
    pb.finish_and_clear();

    if out.json {
        out.json(&serde_json::json!({
            "sent": report.sent,
            "total": report.total,
            "cancelled": report.cancelled,
            "error": report.failure.as_ref().map(|e| e.user_message()),
        }))?;
    } else {
        println!("{}", report.summary());
    }

    if let Some(err) = report.failure {
        return Err(err).context("generator stopped early");
    }
    Ok(())
}

// ========== System Check ==========

fn cmd_check(api: &BlockingApi, out: &Output) -> Result<()> {
    let inner = api.api();
    let report = api.block_on(checks::run_checks(inner.as_ref()));

    if out.json {
        let results: Vec<_> = report
            .results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "check": r.id.label(),
                    "status": r.status.to_string(),
                    "message": r.message,
                })
            })
            .collect();
        out.json(&serde_json::json!({
            "startedAt": report.started_at.to_rfc3339(),
            "results": results,
        }))?;
    } else {
        for result in &report.results {
            let mark = match result.status {
                CheckStatus::Pass => "✓",
                CheckStatus::Fail => "✗",
                CheckStatus::Skip => "-",
            };
            println!(
                "{} {:<4} {:<44} {}",
                mark,
                result.status,
                result.id.label(),
                result.message
            );
        }
        println!();
        println!(
            "Last run {}",
            report
                .started_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
        );
    }

    if !report.all_passed() {
        anyhow::bail!("{} check(s) failed", report.failed());
    }
    Ok(())
}

// ========== Helpers ==========

fn label<T: std::fmt::Display>(value: Option<&T>) -> String {
    value
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}

fn opt_num(value: Option<i64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_paging(page: u32, total: Option<i64>, has_next: bool) {
    let total = total
        .map(|t| format!(", {} total", format_count(t)))
        .unwrap_or_default();
    let more = if has_next { " (more: --page next)" } else { "" };
    println!();
    println!("Page {}{}{}", page + 1, total, more);
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("logdesk-cli").chain(args.iter().copied()))
    }

    #[test]
    fn test_command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_unknown_statuses_are_rejected() {
        for args in [
            &["logs", "status", "42", "DONE"][..],
            &["logs", "list", "--status", "done"],
            &["incidents", "status", "abc123", "ESCALATED"],
            &["incidents", "search", "--status", "PENDING"],
            &["kb", "status", "7", "REVIEW"],
            &["kb", "list", "--author", "robot"],
            &["generate", "--level", "DEBUG"],
        ] {
            let err = match parse(args) {
                Ok(_) => panic!("{:?} should be rejected", args),
                Err(err) => err,
            };
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation, "{:?}", args);
        }
    }

    #[test]
    fn test_known_values_parse_case_insensitively() {
        let args = parse(&["logs", "status", "42", "acknowledged"]).unwrap();
        match args.command {
            Command::Logs {
                command: LogsCommand::Status { log_id, status },
            } => {
                assert_eq!(log_id, 42);
                assert_eq!(status, LogStatus::Acknowledged);
            }
            _ => panic!("expected logs status"),
        }

        let args = parse(&["kb", "add-addendum", "7", "--content", "retry fixed it"]).unwrap();
        match args.command {
            Command::Kb {
                command: KbCommand::AddAddendum { author, .. },
            } => assert_eq!(author, Author::User),
            _ => panic!("expected kb add-addendum"),
        }
    }
}
