//! Taglib Lookup CLI
//!
//! Usage:
//!   taglib-lookup [OPTIONS] <DESCRIPTOR>...
//!
//! Options:
//!   -t, --tag <NAME>     Show attributes and rewrite chains for a tag
//!   -a, --attr <NAME>    Resolve an attribute on the tag given with --tag
//!   --template           Show template-scoped rewrite chains
//!   -v, --verbose        Log registration details (repeat for more)
//!   -h, --help           Print help

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use taglib_lookup::report::{describe_attribute, tag_list, tag_summary, template_summary};
use taglib_lookup::{TagLibrary, TaglibLookup};

#[derive(Parser)]
#[command(name = "taglib-lookup")]
#[command(about = "Merge tag library descriptors and inspect the result")]
struct Cli {
    /// Tag library descriptors (TOML), registered in the given order
    #[arg(required = true)]
    descriptors: Vec<PathBuf>,

    /// Show attributes and rewrite chains for a tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Resolve an attribute on the tag given with --tag
    #[arg(short, long, requires = "tag")]
    attr: Option<String>,

    /// Show template-scoped rewrite chains
    #[arg(long)]
    template: bool,

    /// Log registration details (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut lookup = TaglibLookup::new();
    for path in &cli.descriptors {
        let library = match TagLibrary::from_file(path) {
            Ok(library) => library,
            Err(e) => {
                eprintln!("Error loading descriptor '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        };
        if let Err(e) = lookup.register(library) {
            eprintln!("Error registering '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    }
    tracing::info!("{}", lookup);

    if cli.template {
        match template_summary(&lookup) {
            Ok(summary) => print!("{}", summary),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let Some(tag) = &cli.tag else {
        print!("{}", tag_list(&lookup));
        return;
    };

    if let Some(attr) = &cli.attr {
        match lookup.resolve_attribute(tag, attr) {
            Some(attribute) => println!("{}", describe_attribute(attribute)),
            None => {
                eprintln!("Attribute '{}' is not defined for tag '{}'", attr, tag);
                std::process::exit(1);
            }
        }
        return;
    }

    match tag_summary(&lookup, tag) {
        Ok(Some(summary)) => print!("{}", summary),
        Ok(None) => {
            eprintln!("Unknown tag '{}'", tag);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(filter),
        )
        .init();
}
