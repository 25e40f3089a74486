mod cli;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use rusty_treepack::convert::{from_csv, from_pcd};
use rusty_treepack::{import_campaign_tiles, merge_campaign_tiles, Result};

fn init_logging(verbose: bool) {
	let default = if verbose { "debug" } else { "info" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

fn run(cli: Cli) -> Result<()> {
	match cli.command {
		Commands::Import(args) => {
			let options = args.options()?;
			let records = import_campaign_tiles(&args.campaign, args.inputs.as_slice(), &options)?;
			print_json(&records)
		}
		Commands::Merge(args) => {
			let options = args.options()?;
			let record = merge_campaign_tiles(&args.campaign, &options)?;
			print_json(&vec![record])
		}
		Commands::ConvertPcd(args) => {
			let points = from_pcd(&args.source, &args.destination, &args.options())?;
			print_json(&serde_json::json!({ "points": points, "uri": args.destination }))
		}
		Commands::ConvertCsv(args) => {
			let points = from_csv(&args.source, &args.destination, &args.options())?;
			print_json(&serde_json::json!({ "points": points, "uri": args.destination }))
		}
	}
}

fn main() {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	if let Err(e) = run(cli) {
		eprintln!("Error: {}", e);
		std::process::exit(1);
	}
}
