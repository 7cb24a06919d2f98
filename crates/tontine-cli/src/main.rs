use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tontine_cli::{render, report};
use tontine_core::{
    CashFlow, Ledger, MemberKey, PageFormat, Projection, RecordId, RuleSet, Snapshot, TaskFilter,
};
use tontine_storage::{
    LedgerStorage, PersistOutcome, RemoteConfig, RemoteTaskClient, Session, SignUpOutcome, Slot,
    SlotStore, StorageError, TaskPersistence,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "tontine", version, about = "Treasury ledger for a small member organization")]
struct Cli {
    /// Directory holding the local persistence slots.
    #[arg(long, env = "TONTINE_DATA_DIR", default_value = "tontine/data", global = true)]
    data_dir: PathBuf,

    /// Remote backend base URL (task persistence and auth).
    #[arg(long, env = "TONTINE_REMOTE_URL", global = true)]
    remote_url: Option<String>,

    /// Remote backend publishable API key.
    #[arg(long, env = "TONTINE_REMOTE_KEY", global = true)]
    remote_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tasks (persisted through the remote backend when signed in)
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Cash-box movements
    Cash {
        #[command(subcommand)]
        command: CashCommands,
    },
    /// Project funding records
    Funding {
        #[command(subcommand)]
        command: FundingCommands,
    },
    /// Member debts
    Debt {
        #[command(subcommand)]
        command: DebtCommands,
    },
    /// Member contributions
    Contribution {
        #[command(subcommand)]
        command: ContributionCommands,
    },
    /// Penalties (each opens a linked debt)
    Penalty {
        #[command(subcommand)]
        command: PenaltyCommands,
    },
    /// Member totals: debts plus unlinked penalties
    Totals,
    /// Funding acceptance rules
    Rules {
        #[command(subcommand)]
        command: RuleCommands,
    },
    /// Project an income/expense scenario onto a funding record
    Simulate(ProjectionArgs),
    /// Evaluate a funding record against the rule set under a projection
    Evaluate(ProjectionArgs),
    /// Report documents and their settings
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Export the whole ledger as one JSON document
    Export {
        #[arg(long)]
        out: PathBuf,
    },
    /// Import a JSON export, replacing every category wholesale
    Import {
        file: PathBuf,
        /// Confirm the replacement.
        #[arg(long)]
        yes: bool,
    },
    /// Activity journal
    Journal {
        #[command(subcommand)]
        command: JournalCommands,
    },
    /// Remote account session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Clear every category
    Wipe {
        /// Confirm the wipe.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    Add { text: String },
    Done { id: i64 },
    Undone { id: i64 },
    Rm { id: i64 },
    List {
        #[arg(long, value_enum, default_value = "all")]
        filter: TaskFilterArg,
    },
    /// Remove every completed task
    ClearCompleted,
}

#[derive(Subcommand)]
enum CashCommands {
    Add {
        text: String,
        amount: f64,
        #[arg(long, value_enum)]
        flow: FlowArg,
    },
    Rm { id: i64 },
    List,
}

#[derive(Subcommand)]
enum FundingCommands {
    Add {
        name: String,
        amount: f64,
        #[arg(long)]
        source: Option<String>,
    },
    Rm { id: i64 },
    List,
}

#[derive(Subcommand)]
enum DebtCommands {
    Add {
        name: String,
        amount: f64,
        #[arg(long)]
        rank: Option<String>,
    },
    Rm { id: i64 },
    List,
}

#[derive(Subcommand)]
enum ContributionCommands {
    Add {
        name: String,
        amount: f64,
        #[arg(long)]
        rank: Option<String>,
        #[arg(long)]
        period: Option<String>,
    },
    Rm { id: i64 },
    List,
}

#[derive(Subcommand)]
enum PenaltyCommands {
    Add {
        name: String,
        amount: f64,
        #[arg(long)]
        rank: Option<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    Rm { id: i64 },
    List,
}

#[derive(Subcommand)]
enum RuleCommands {
    /// Replace the whole rule set with the given thresholds
    Set(RuleArgs),
    Show,
    Clear,
}

#[derive(Args)]
struct RuleArgs {
    #[arg(long)]
    min_funding: Option<f64>,
    #[arg(long)]
    min_balance: Option<f64>,
    #[arg(long)]
    min_roi: Option<f64>,
    #[arg(long)]
    max_member_debt: Option<f64>,
    #[arg(long)]
    required_source: Option<String>,
}

#[derive(Args)]
struct ProjectionArgs {
    funding_id: i64,
    #[arg(long, default_value_t = 0.0)]
    income: f64,
    #[arg(long, default_value_t = 0.0)]
    expenses: f64,
    /// Duration in months (display only).
    #[arg(long, default_value_t = 0)]
    duration: u32,
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Update report document settings
    Settings {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        subtitle: Option<String>,
        #[arg(long)]
        logo_url: Option<String>,
        #[arg(long, value_enum)]
        format: Option<PageFormatArg>,
    },
    /// Full report: every category plus member totals and rules
    Full {
        #[arg(long)]
        out: PathBuf,
    },
    /// One-page notice for a single penalty
    Penalty {
        id: i64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Roster of all penalties
    Penalties {
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum JournalCommands {
    List {
        /// Case-insensitive substring filter.
        #[arg(long)]
        search: Option<String>,
    },
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Create the account when the credentials are not recognized.
        #[arg(long)]
        create_if_missing: bool,
    },
    Logout,
    Status,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TaskFilterArg {
    All,
    Active,
    Done,
}

impl From<TaskFilterArg> for TaskFilter {
    fn from(arg: TaskFilterArg) -> Self {
        match arg {
            TaskFilterArg::All => TaskFilter::All,
            TaskFilterArg::Active => TaskFilter::Active,
            TaskFilterArg::Done => TaskFilter::Done,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FlowArg {
    In,
    Out,
}

impl From<FlowArg> for CashFlow {
    fn from(arg: FlowArg) -> Self {
        match arg {
            FlowArg::In => CashFlow::In,
            FlowArg::Out => CashFlow::Out,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PageFormatArg {
    A4,
    Letter,
}

impl From<PageFormatArg> for PageFormat {
    fn from(arg: PageFormatArg) -> Self {
        match arg {
            PageFormatArg::A4 => PageFormat::A4,
            PageFormatArg::Letter => PageFormat::Letter,
        }
    }
}

struct App {
    ledger: Ledger,
    storage: LedgerStorage,
    slots: SlotStore,
    remote: Option<RemoteConfig>,
    session: Option<Session>,
}

impl App {
    fn bootstrap(cli: &Cli) -> Self {
        let slots = SlotStore::new(&cli.data_dir);
        let storage = LedgerStorage::new(slots.clone());
        let ledger = storage.load();
        let session = slots.load_optional(Slot::Session);
        let remote = match (&cli.remote_url, &cli.remote_key) {
            (Some(url), Some(key)) => Some(RemoteConfig::new(url, key)),
            _ => None,
        };
        Self {
            ledger,
            storage,
            slots,
            remote,
            session,
        }
    }

    fn remote_client(&self) -> anyhow::Result<RemoteTaskClient> {
        let config = self.remote.as_ref().context(
            "remote backend not configured; set TONTINE_REMOTE_URL and TONTINE_REMOTE_KEY",
        )?;
        Ok(RemoteTaskClient::new(config)?)
    }

    fn task_persistence(&self) -> anyhow::Result<Option<TaskPersistence<RemoteTaskClient>>> {
        match &self.remote {
            Some(config) => Ok(Some(TaskPersistence::new(
                RemoteTaskClient::new(config)?,
                self.slots.clone(),
            ))),
            None => Ok(None),
        }
    }

    /// Replace in-memory tasks with the remote result set (empty when
    /// signed out or unreachable).
    async fn refresh_tasks(&mut self) -> anyhow::Result<()> {
        if let Some(persistence) = self.task_persistence()? {
            let tasks = persistence.load(self.session.as_ref()).await;
            self.ledger.replace_tasks(tasks);
        }
        Ok(())
    }

    async fn save_tasks(&self) -> anyhow::Result<()> {
        let outcome = match self.task_persistence()? {
            Some(persistence) => {
                persistence
                    .save(self.ledger.tasks().records(), self.session.as_ref())
                    .await
            }
            None => PersistOutcome::Skipped,
        };
        match outcome {
            PersistOutcome::Remote => info!(outcome = outcome.label(), "tasks persisted"),
            PersistOutcome::Skipped => {
                info!("no session or remote backend; tasks were not persisted")
            }
            PersistOutcome::LocalFallback => {
                warn!("remote save failed; tasks snapshotted to the local backup slot")
            }
            PersistOutcome::Failed => warn!("tasks could not be persisted anywhere"),
        }
        Ok(())
    }

    fn save_local(&self) -> anyhow::Result<()> {
        self.storage.save(&self.ledger)?;
        Ok(())
    }

    fn list_tasks(&self, filter: TaskFilter) {
        for task in self.ledger.tasks_filtered(filter) {
            println!("{}", render::task_line(task));
        }
        println!("{}", render::task_counter(self.ledger.active_task_count()));
    }

    fn funding(&self, id: i64) -> anyhow::Result<tontine_core::FundingRecord> {
        let id = RecordId(id);
        Ok(self
            .ledger
            .funding(id)
            .cloned()
            .ok_or(tontine_core::CoreError::UnknownFunding(id))?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tontine=info,warn".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let mut app = App::bootstrap(&cli);

    match cli.command {
        Commands::Task { command } => run_task(&mut app, command).await?,
        Commands::Cash { command } => run_cash(&mut app, command)?,
        Commands::Funding { command } => run_funding(&mut app, command)?,
        Commands::Debt { command } => run_debt(&mut app, command)?,
        Commands::Contribution { command } => run_contribution(&mut app, command)?,
        Commands::Penalty { command } => run_penalty(&mut app, command)?,
        Commands::Totals => {
            println!("{}", render::member_totals_block(&app.ledger.member_totals()));
        }
        Commands::Rules { command } => run_rules(&mut app, command)?,
        Commands::Simulate(args) => {
            let funding = app.funding(args.funding_id)?;
            let projection =
                Projection::simulate(&funding, args.income, args.expenses, args.duration);
            println!("{}", render::simulation_block(&funding, &projection));
        }
        Commands::Evaluate(args) => {
            let funding = app.funding(args.funding_id)?;
            let projection =
                Projection::simulate(&funding, args.income, args.expenses, args.duration);
            let evaluation = tontine_core::evaluate(
                &funding,
                &projection,
                app.ledger.rules(),
                &app.ledger.member_totals(),
            );
            println!("{}", render::evaluation_block(&evaluation));
        }
        Commands::Report { command } => run_report(&mut app, command)?,
        Commands::Export { out } => {
            let snapshot = Snapshot::capture(&app.ledger);
            fs::write(&out, serde_json::to_vec_pretty(&snapshot)?)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("exported to {}", out.display());
        }
        Commands::Import { file, yes } => run_import(&mut app, file, yes).await?,
        Commands::Journal { command } => run_journal(&mut app, command)?,
        Commands::Auth { command } => run_auth(&mut app, command).await?,
        Commands::Wipe { yes } => {
            if !yes {
                bail!("wiping clears every category; pass --yes to confirm");
            }
            app.ledger.clear_all();
            app.save_local()?;
            println!("all data cleared");
        }
    }

    Ok(())
}

async fn run_task(app: &mut App, command: TaskCommands) -> anyhow::Result<()> {
    app.refresh_tasks().await?;
    match command {
        TaskCommands::Add { text } => {
            app.ledger.add_task(&text)?;
            app.save_tasks().await?;
            app.save_local()?;
            app.list_tasks(TaskFilter::All);
        }
        TaskCommands::Done { id } => {
            app.ledger.set_task_done(RecordId(id), true)?;
            app.save_tasks().await?;
            app.list_tasks(TaskFilter::All);
        }
        TaskCommands::Undone { id } => {
            app.ledger.set_task_done(RecordId(id), false)?;
            app.save_tasks().await?;
            app.list_tasks(TaskFilter::All);
        }
        TaskCommands::Rm { id } => {
            if !app.ledger.remove_task(RecordId(id)) {
                bail!("no task with id {id}");
            }
            app.save_tasks().await?;
            app.list_tasks(TaskFilter::All);
        }
        TaskCommands::List { filter } => app.list_tasks(filter.into()),
        TaskCommands::ClearCompleted => {
            app.ledger.clear_completed();
            app.save_tasks().await?;
            app.save_local()?;
            app.list_tasks(TaskFilter::All);
        }
    }
    Ok(())
}

fn run_cash(app: &mut App, command: CashCommands) -> anyhow::Result<()> {
    match command {
        CashCommands::Add { text, amount, flow } => {
            app.ledger.add_cash_entry(&text, amount, flow.into())?;
            app.save_local()?;
        }
        CashCommands::Rm { id } => {
            if !app.ledger.remove_cash_entry(RecordId(id)) {
                bail!("no cash entry with id {id}");
            }
            app.save_local()?;
        }
        CashCommands::List => {}
    }
    for entry in app.ledger.cash_entries().iter() {
        println!("{}", render::cash_line(entry));
    }
    println!("{}", render::cash_summary_block(&app.ledger.cash_summary()));
    Ok(())
}

fn run_funding(app: &mut App, command: FundingCommands) -> anyhow::Result<()> {
    match command {
        FundingCommands::Add {
            name,
            amount,
            source,
        } => {
            app.ledger.add_funding(&name, source, amount)?;
            app.save_local()?;
        }
        FundingCommands::Rm { id } => {
            if !app.ledger.remove_funding(RecordId(id)) {
                bail!("no funding record with id {id}");
            }
            app.save_local()?;
        }
        FundingCommands::List => {}
    }
    for record in app.ledger.funding_records().iter() {
        println!("{}", render::funding_line(record));
    }
    Ok(())
}

fn run_debt(app: &mut App, command: DebtCommands) -> anyhow::Result<()> {
    match command {
        DebtCommands::Add { name, amount, rank } => {
            app.ledger.add_debt(MemberKey::new(name, rank), amount)?;
            app.save_local()?;
        }
        DebtCommands::Rm { id } => {
            if !app.ledger.remove_debt(RecordId(id)) {
                bail!("no debt with id {id}");
            }
            app.save_local()?;
        }
        DebtCommands::List => {}
    }
    for debt in app.ledger.debts().iter() {
        println!("{}", render::debt_line(debt));
    }
    println!("{}", render::member_totals_block(&app.ledger.member_totals()));
    Ok(())
}

fn run_contribution(app: &mut App, command: ContributionCommands) -> anyhow::Result<()> {
    match command {
        ContributionCommands::Add {
            name,
            amount,
            rank,
            period,
        } => {
            app.ledger
                .add_contribution(MemberKey::new(name, rank), amount, period)?;
            app.save_local()?;
        }
        ContributionCommands::Rm { id } => {
            if !app.ledger.remove_contribution(RecordId(id)) {
                bail!("no contribution with id {id}");
            }
            app.save_local()?;
        }
        ContributionCommands::List => {}
    }
    for contribution in app.ledger.contributions().iter() {
        println!("{}", render::contribution_line(contribution));
    }
    println!(
        "{}",
        render::contribution_summary_block(&app.ledger.contribution_summary())
    );
    Ok(())
}

fn run_penalty(app: &mut App, command: PenaltyCommands) -> anyhow::Result<()> {
    match command {
        PenaltyCommands::Add {
            name,
            amount,
            rank,
            reason,
        } => {
            app.ledger
                .add_penalty(MemberKey::new(name, rank), amount, reason)?;
            app.save_local()?;
        }
        PenaltyCommands::Rm { id } => {
            if !app.ledger.remove_penalty(RecordId(id)) {
                bail!("no penalty with id {id}");
            }
            app.save_local()?;
        }
        PenaltyCommands::List => {}
    }
    for penalty in app.ledger.penalties().iter() {
        println!("{}", render::penalty_line(penalty));
    }
    println!(
        "{}",
        render::member_totals_block(&app.ledger.penalty_totals())
    );
    Ok(())
}

fn run_rules(app: &mut App, command: RuleCommands) -> anyhow::Result<()> {
    match command {
        RuleCommands::Set(args) => {
            app.ledger.save_rules(RuleSet {
                min_funding: args.min_funding,
                min_balance: args.min_balance,
                min_roi: args.min_roi,
                max_member_debt: args.max_member_debt,
                required_fund_source: args.required_source,
            });
            app.save_local()?;
            println!("rules saved");
        }
        RuleCommands::Show => {
            let rules = app.ledger.rules();
            if rules.is_empty() {
                println!("no rules set");
            } else {
                if let Some(v) = rules.min_funding {
                    println!("minimum funding: {v:.2}");
                }
                if let Some(v) = rules.min_balance {
                    println!("minimum balance: {v:.2}");
                }
                if let Some(v) = rules.min_roi {
                    println!("minimum ROI: {v}%");
                }
                if let Some(v) = rules.max_member_debt {
                    println!("maximum member debt: {v:.2}");
                }
                if let Some(source) = &rules.required_fund_source {
                    println!("required fund source: {source}");
                }
            }
        }
        RuleCommands::Clear => {
            app.ledger.clear_rules();
            app.save_local()?;
            println!("rules cleared");
        }
    }
    Ok(())
}

fn run_report(app: &mut App, command: ReportCommands) -> anyhow::Result<()> {
    match command {
        ReportCommands::Settings {
            title,
            subtitle,
            logo_url,
            format,
        } => {
            let mut settings = app.ledger.report_settings().clone();
            if let Some(title) = title {
                settings.title = title;
            }
            if let Some(subtitle) = subtitle {
                settings.subtitle = subtitle;
            }
            if let Some(logo_url) = logo_url {
                settings.logo_url = logo_url;
            }
            if let Some(format) = format {
                settings.page_format = format.into();
            }
            app.ledger.set_report_settings(settings);
            app.ledger.journal_mut().record("Report settings saved");
            app.save_local()?;
            println!("report settings saved");
        }
        ReportCommands::Full { out } => {
            let doc = report::full_report(&app.ledger);
            fs::write(&out, doc).with_context(|| format!("writing {}", out.display()))?;
            println!("report written to {}", out.display());
        }
        ReportCommands::Penalty { id, out } => {
            let penalty = app
                .ledger
                .penalties()
                .get(RecordId(id))
                .with_context(|| format!("no penalty with id {id}"))?;
            let doc = report::penalty_notice(penalty, app.ledger.report_settings());
            fs::write(&out, doc).with_context(|| format!("writing {}", out.display()))?;
            println!("penalty notice written to {}", out.display());
        }
        ReportCommands::Penalties { out } => {
            if app.ledger.penalties().is_empty() {
                println!("no penalties to export");
                return Ok(());
            }
            let doc =
                report::penalty_roster(app.ledger.penalties().records(), app.ledger.report_settings());
            fs::write(&out, doc).with_context(|| format!("writing {}", out.display()))?;
            println!("penalty roster written to {}", out.display());
        }
    }
    Ok(())
}

async fn run_import(app: &mut App, file: PathBuf, yes: bool) -> anyhow::Result<()> {
    let bytes = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
    let snapshot: Snapshot = serde_json::from_slice(&bytes).context("invalid JSON file")?;
    if !yes {
        bail!("importing replaces all current data; pass --yes to confirm");
    }
    app.ledger.restore(snapshot);
    app.save_local()?;
    app.save_tasks().await?;
    println!(
        "imported: {} tasks, {} cash entries, {} funding records, {} debts, {} contributions, {} penalties",
        app.ledger.tasks().len(),
        app.ledger.cash_entries().len(),
        app.ledger.funding_records().len(),
        app.ledger.debts().len(),
        app.ledger.contributions().len(),
        app.ledger.penalties().len(),
    );
    Ok(())
}

fn run_journal(app: &mut App, command: JournalCommands) -> anyhow::Result<()> {
    match command {
        JournalCommands::List { search } => {
            let entries = match &search {
                Some(needle) => app.ledger.journal().search(needle),
                None => app.ledger.journal().entries().iter().collect(),
            };
            for entry in entries {
                println!("{}", render::journal_line(entry));
            }
        }
        JournalCommands::Clear { yes } => {
            if !yes {
                bail!("clearing the journal is irreversible; pass --yes to confirm");
            }
            app.ledger.clear_journal();
            app.save_local()?;
            println!("journal cleared");
        }
    }
    Ok(())
}

async fn run_auth(app: &mut App, command: AuthCommands) -> anyhow::Result<()> {
    match command {
        AuthCommands::Login {
            email,
            password,
            create_if_missing,
        } => {
            let client = app.remote_client()?;
            match client.sign_in(&email, &password).await {
                Ok(session) => {
                    app.slots.save(Slot::Session, &session)?;
                    println!("signed in as {}", session.email);
                }
                Err(StorageError::InvalidCredentials) if create_if_missing => {
                    info!("credentials not recognized, creating the account");
                    match client.sign_up(&email, &password).await? {
                        SignUpOutcome::Active(session) => {
                            app.slots.save(Slot::Session, &session)?;
                            println!("account created; signed in as {}", session.email);
                        }
                        SignUpOutcome::ConfirmationPending => {
                            println!("account created; confirm your email, then sign in");
                        }
                    }
                }
                Err(StorageError::InvalidCredentials) => {
                    bail!("invalid credentials; pass --create-if-missing to create an account")
                }
                Err(err) => return Err(err.into()),
            }
        }
        AuthCommands::Logout => {
            app.slots.remove(Slot::Session)?;
            app.session = None;
            app.ledger.reset();
            println!("signed out");
        }
        AuthCommands::Status => match &app.session {
            Some(session) => println!("signed in as {}", session.email),
            None => println!("not signed in"),
        },
    }
    Ok(())
}
