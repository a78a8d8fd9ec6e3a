//! sharepack CLI — batch re-encode `shares` content columns to gzip+base64.
//!
//! Usage:
//! ```bash
//! # Migrate a MySQL database, 500 rows per page
//! sharepack run --dialect mysql --host 127.0.0.1 --port 3306 \
//!     --user root --password secret --database code_diff_checker
//!
//! # Smaller pages against SQL Server
//! sharepack run --dialect mssql --host db.internal --port 1433 \
//!     --user sa --password secret --database shares --batch-size 100
//!
//! # Decode a stored payload for a spot check
//! sharepack peek --payload H4sIAAAAAAAA...
//! ```
//!
//! Writers must be paused for the duration of a run; paging is offset-based
//! over `ORDER BY id`. Interrupting mid-run is safe — re-encoding is
//! idempotent and a re-run starts over from offset 0.

use std::env;
use std::process;

use sharepack_core::{decode_content, Reencoder, ReencoderConfig};
use sharepack_storage::{connect, ConnectParams, Dialect};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "run" => cmd_run(&args[2..]).await,
        "peek" => cmd_peek(&args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        "version" | "--version" | "-V" => {
            println!("sharepack {}", env!("CARGO_PKG_VERSION"));
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("sharepack {}", env!("CARGO_PKG_VERSION"));
    println!("Batch re-encode share content columns to gzip+base64\n");
    println!("USAGE:");
    println!("    sharepack <COMMAND>\n");
    println!("COMMANDS:");
    println!("    run      Migrate the shares table in place");
    println!("    peek     Decode a stored payload back to text");
    println!("    version  Print version");
    println!("    help     Print this help\n");
    println!("RUN FLAGS:");
    println!("    --dialect <NAME>     mysql | postgres | mssql      [required]");
    println!("    --host <HOST>        Database host                 [required]");
    println!("    --port <PORT>        Database port                 [required]");
    println!("    --user <USER>        Database user                 [required]");
    println!("    --password <PASS>    Database password             [required]");
    println!("    --database <NAME>    Database name                 [required]");
    println!("    --batch-size <N>     Rows per page (default: 500)\n");
    println!("PEEK FLAGS:");
    println!("    --payload <B64>      Stored gzip+base64 payload    [required]");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

fn required(flag: &str, value: Option<String>) -> String {
    match value {
        Some(v) => v,
        None => {
            eprintln!("Error: {flag} is required");
            process::exit(1);
        }
    }
}

async fn cmd_run(args: &[String]) {
    let mut dialect: Option<String> = None;
    let mut host: Option<String> = None;
    let mut port: Option<String> = None;
    let mut user: Option<String> = None;
    let mut password: Option<String> = None;
    let mut database: Option<String> = None;
    let mut batch_size: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--dialect" => {
                i += 1;
                dialect = args.get(i).cloned();
            }
            "--host" => {
                i += 1;
                host = args.get(i).cloned();
            }
            "--port" => {
                i += 1;
                port = args.get(i).cloned();
            }
            "--user" => {
                i += 1;
                user = args.get(i).cloned();
            }
            "--password" => {
                i += 1;
                password = args.get(i).cloned();
            }
            "--database" => {
                i += 1;
                database = args.get(i).cloned();
            }
            "--batch-size" => {
                i += 1;
                batch_size = args.get(i).cloned();
            }
            flag => {
                eprintln!("Unknown flag: {flag}");
                process::exit(1);
            }
        }
        i += 1;
    }

    let dialect: Dialect = match required("--dialect", dialect).parse() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    let port: u16 = match required("--port", port).parse() {
        Ok(p) => p,
        Err(_) => {
            eprintln!("Error: --port must be a number between 1 and 65535");
            process::exit(1);
        }
    };
    let batch_size: u64 = match batch_size {
        None => ReencoderConfig::default().batch_size,
        Some(n) => match n.parse() {
            Ok(n) if n > 0 => n,
            _ => {
                eprintln!("Error: --batch-size must be a positive number");
                process::exit(1);
            }
        },
    };

    let params = ConnectParams {
        host: required("--host", host),
        port,
        user: required("--user", user),
        password: required("--password", password),
        database: required("--database", database),
    };

    init_tracing();

    let store = match connect(dialect, &params).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Connection error: {e}");
            process::exit(1);
        }
    };

    let reencoder = Reencoder::new(store, ReencoderConfig { batch_size });
    match reencoder.run().await {
        Ok(summary) => {
            println!(
                "done: checked {} rows, converted {} rows",
                summary.rows_checked, summary.rows_converted
            );
        }
        Err(e) => {
            eprintln!("Migration error: {e}");
            process::exit(1);
        }
    }
}

fn cmd_peek(args: &[String]) {
    let mut payload: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--payload" => {
                i += 1;
                payload = args.get(i).cloned();
            }
            flag => {
                eprintln!("Unknown flag: {flag}");
                process::exit(1);
            }
        }
        i += 1;
    }

    let payload = required("--payload", payload);
    match decode_content(&payload) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("Decode error: {e}");
            process::exit(1);
        }
    }
}
