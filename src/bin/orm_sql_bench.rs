use clap::{Parser, ValueEnum};
use orm_sql_bench::harness::{BenchConfig, FailurePolicy, Profile, Runner};
use orm_sql_bench::metrics::{AllocatorMetrics, TrackingAllocator};
use orm_sql_bench::report::{self, run_suite};
use orm_sql_bench::schema::{RunMeta, SuiteReport};
use orm_sql_bench::workloads::{self, Database, FixtureConfig, ReferenceIds, StatementMode};
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileArg {
    Quick,
    Full,
}

impl From<ProfileArg> for Profile {
    fn from(v: ProfileArg) -> Self {
        match v {
            ProfileArg::Quick => Profile::Quick,
            ProfileArg::Full => Profile::Full,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Fixed-width table on stdout, one row per operation as it finishes.
    #[default]
    Table,
    /// JSON report on stdout (or `--out`); the table is streamed to stderr
    /// when the report takes stdout.
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "orm-sql-bench")]
#[command(about = "Measure latency, throughput and allocation of SQL data-access operations")]
struct Args {
    #[arg(long, value_enum, default_value_t = ProfileArg::Quick)]
    profile: ProfileArg,

    /// Iterations per operation. Overrides the profile default.
    #[arg(short = 'n', long)]
    iterations: Option<u64>,

    /// Seed for fixture generation.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// How operations prepare their SQL.
    #[arg(long, value_enum, default_value_t = StatementMode::Direct)]
    mode: StatementMode,

    /// SQLite database file. Defaults to a fresh in-memory database.
    ///
    /// A file whose fixture tables are all empty is seeded first. Otherwise
    /// its first customer, product and order are used as-is.
    #[arg(long, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Customers to seed (one order each). [default: 100]
    #[arg(long)]
    customers: Option<usize>,

    /// Products to seed. [default: 200]
    #[arg(long)]
    products: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Write the JSON report to this file. Implies `--format json`.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Stop at the first failing operation instead of skipping it.
    #[arg(long, default_value_t = false)]
    fail_fast: bool,
}

impl Args {
    fn writes_json(&self) -> bool {
        self.format == OutputFormat::Json || self.out.is_some()
    }

    /// stdout is reserved for the report when it has no file to go to.
    fn table_on_stderr(&self) -> bool {
        self.writes_json() && self.out.is_none()
    }

    fn fixture_config(&self) -> FixtureConfig {
        let defaults = FixtureConfig::default();
        FixtureConfig {
            customers: self.customers.unwrap_or(defaults.customers),
            products: self.products.unwrap_or(defaults.products),
        }
    }
}

fn now_utc_stamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("unix:{secs}")
}

fn git_sha_short() -> Option<String> {
    std::env::var("GIT_SHA")
        .ok()
        .or_else(|| std::env::var("GITHUB_SHA").ok())
        .map(|s| s.chars().take(12).collect())
}

fn open_database(args: &Args, cfg: &BenchConfig) -> Result<(Database, ReferenceIds), Box<dyn Error>> {
    let db = match &args.database {
        Some(path) => Database::open(path, args.mode)?,
        None => Database::open_in_memory(args.mode)?,
    };

    let ids = if db.is_empty()? {
        workloads::seed(&db, &args.fixture_config(), &mut cfg.rng())?
    } else {
        info!("using existing rows as benchmark references");
        ReferenceIds::load(&db)?
    };
    Ok((db, ids))
}

fn run(args: Args) -> Result<ExitCode, Box<dyn Error>> {
    let cfg = BenchConfig {
        profile: args.profile.into(),
        iterations: args.iterations,
        seed: args.seed,
        failure_policy: if args.fail_fast {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Continue
        },
    };

    workloads::track_sqlite_allocations()?;
    let (db, ids) = open_database(&args, &cfg)?;
    info!(
        mode = db.mode().as_str(),
        customer_id = ids.customer_id,
        product_id = ids.product_id,
        order_id = ids.order_id,
        "benchmark database ready"
    );

    let mut operations = workloads::suite(&db, ids);
    let runner = Runner::new(AllocatorMetrics);

    let mut table: Box<dyn Write> = if args.table_on_stderr() {
        Box::new(io::stderr().lock())
    } else {
        Box::new(io::stdout().lock())
    };
    let outcome = run_suite(
        &runner,
        &mut operations,
        cfg.iters(),
        cfg.failure_policy,
        &mut table,
    )?;
    drop(table);

    if args.writes_json() {
        let report = SuiteReport {
            run: RunMeta {
                schema_version: 1,
                bench_version: env!("CARGO_PKG_VERSION").to_string(),
                profile: cfg.profile.as_str().to_string(),
                iterations: cfg.iters(),
                seed: cfg.seed,
                mode: db.mode().as_str().to_string(),
                timestamp_utc: now_utc_stamp(),
                git_sha: git_sha_short(),
            },
            results: outcome.results.clone(),
            failures: outcome.failures.clone(),
        };
        report::write_json(&report, args.out.as_deref())?;
    }

    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(failed = outcome.failures.len(), "some operations failed");
        Ok(ExitCode::FAILURE)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
