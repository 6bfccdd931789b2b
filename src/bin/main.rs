//! Beeconnect CLI - drive simulated wallet providers from a fixture
//!
//!   beeconnect list                         → Public wallets, JSON array
//!   beeconnect connect <name>               → Connection state after connect
//!   beeconnect cycle <name>                 → Connect, then disconnect
//!   beeconnect invoke <name> <cap> [json]   → Connect, then invoke a method capability
//!
//! Configuration:
//!   --fixture <path>   Providers fixture (env: BEECONNECT_FIXTURE, default: built-in demo)
//!   --timeout <ms>     Connect timeout (env: BEECONNECT_CONNECT_TIMEOUT_MS)
//!   --silent           Silent connect
//!
//! Output format:
//!   --json     Compact JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use beeconnect::logging::init_logging;
use beeconnect::{ConnectionController, Fixture, Hub, HubConfig, PublicCollection, PublicHandle};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("beeconnect {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("list") | Some("ls") => run(&opts, cmd_list),
        Some("connect") => run(&opts, cmd_connect),
        Some("cycle") => run(&opts, cmd_cycle),
        Some("invoke") => run(&opts, cmd_invoke),
        Some(cmd) => Err(format!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || (!opts.json && std::io::stdout().is_terminal());
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": e}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|e| format!("{{\"error\":\"render: {}\"}}", e))
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    name: Option<String>,
    capability: Option<String>,
    data: Option<String>,
    fixture: Option<String>,
    timeout_ms: Option<u64>,
    silent: bool,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--silent" => opts.silent = true,
                "--fixture" | "-f" => {
                    if i + 1 < args.len() {
                        opts.fixture = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--timeout" | "-t" => {
                    if i + 1 < args.len() {
                        opts.timeout_ms = args[i + 1].parse().ok();
                        i += 1;
                    }
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        let mut positional = positional.into_iter();
        opts.command = positional.next();
        opts.name = positional.next();
        opts.capability = positional.next();
        let rest: Vec<String> = positional.collect();
        if !rest.is_empty() {
            opts.data = Some(rest.join(" "));
        }

        // Environment (lower priority than CLI args)
        if opts.fixture.is_none() {
            opts.fixture = env::var("BEECONNECT_FIXTURE").ok().filter(|s| !s.is_empty());
        }

        opts
    }
}

fn print_usage() {
    println!(
        r#"beeconnect - Wallet provider connection harness

USAGE:
    beeconnect <command> [name] [capability] [json] [options]

COMMANDS:
    list                          List public wallets
    connect <name>                Connect to a wallet by name
    cycle <name>                  Connect, then disconnect
    invoke <name> <cap> [json]    Connect, then invoke a method capability

OPTIONS:
    --fixture, -f <path>    Providers fixture (env: BEECONNECT_FIXTURE)
    --timeout, -t <ms>      Connect timeout (env: BEECONNECT_CONNECT_TIMEOUT_MS)
    --silent                Silent connect (no prompt)
    --json                  Compact JSON output
    --pretty                Pretty-print JSON
    --version, -V           Print version

LOGGING:
    RUST_LOG=debug          Log filter (stderr)
    BEECONNECT_LOG_JSON=1   JSON log lines

EXAMPLES:
    beeconnect list
    beeconnect connect Acme --pretty
    beeconnect invoke Acme acme:signMessage '{{"message":"hi"}}'
    beeconnect cycle Acme --fixture ./wallets.json"#
    );
}

struct Session {
    wallets: PublicCollection,
    controller: ConnectionController,
}

fn load_session(opts: &ParsedArgs) -> Result<Session, String> {
    let fixture = match opts.fixture.as_deref() {
        Some(path) => Fixture::load(path).map_err(|e| format!("{:#}", e))?,
        None => Fixture::demo(),
    };

    let mut config = HubConfig::from_env("beeconnect");
    if let Some(timeout) = opts.timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis).or(fixture.connect_timeout()) {
        config = config.with_connect_timeout(timeout);
    }
    if opts.silent {
        config = config.silent();
    }
    debug!(providers = fixture.providers.len(), "cli: fixture loaded");

    let hub = Hub::from_config(Arc::new(fixture.into_registry()), config);
    Ok(Session { wallets: hub.wallets(), controller: hub.controller() })
}

fn run<F, Fut>(opts: &ParsedArgs, cmd: F) -> Result<Value, String>
where
    F: FnOnce(Session, Vec<String>) -> Fut,
    Fut: std::future::Future<Output = Result<Value, String>>,
{
    let session = load_session(opts)?;
    let args = [&opts.name, &opts.capability, &opts.data].into_iter().flatten().cloned().collect();
    let rt = tokio::runtime::Runtime::new().map_err(|e| format!("Failed to create runtime: {}", e))?;
    rt.block_on(cmd(session, args))
}

fn find(session: &Session, name: Option<&String>) -> Result<PublicHandle, String> {
    let name = name.ok_or("Missing wallet name")?;
    session.wallets.find(name).ok_or_else(|| format!("No wallet named {}", name))
}

async fn cmd_list(session: Session, _args: Vec<String>) -> Result<Value, String> {
    let wallets = session.wallets.current();
    let listed: Vec<Value> = wallets.iter().map(|w| json!(&**w)).collect();
    session.wallets.teardown();
    Ok(json!({"wallets": listed, "count": listed.len()}))
}

async fn cmd_connect(session: Session, args: Vec<String>) -> Result<Value, String> {
    let wallet = find(&session, args.first())?;
    session.controller.connect(&wallet).await.map_err(|e| e.to_string())?;
    session.wallets.teardown();
    Ok(session.controller.state().summary())
}

async fn cmd_cycle(session: Session, args: Vec<String>) -> Result<Value, String> {
    let wallet = find(&session, args.first())?;
    session.controller.connect(&wallet).await.map_err(|e| e.to_string())?;
    let connected = session.controller.state().summary();
    // a failed disconnect still clears local state; the error shows in the summary
    let _ = session.controller.disconnect().await;
    let disconnected = session.controller.state().summary();
    session.wallets.teardown();
    Ok(json!({"connected": connected, "disconnected": disconnected}))
}

async fn cmd_invoke(session: Session, args: Vec<String>) -> Result<Value, String> {
    let wallet = find(&session, args.first())?;
    let capability = args.get(1).ok_or("Missing capability name")?;
    let input: Value = match args.get(2) {
        Some(raw) => serde_json::from_str(raw).map_err(|e| format!("Invalid JSON: {}", e))?,
        None => json!({}),
    };
    session.controller.connect(&wallet).await.map_err(|e| e.to_string())?;
    let result = session.controller.invoke(capability, input).await.map_err(|e| e.to_string())?;
    session.wallets.teardown();
    Ok(json!({"wallet": wallet.name(), "capability": capability, "result": result}))
}
