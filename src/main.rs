use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pullcdn::config::{
	CONFIG_FILE_NAME, LoadedConfig, MergedConfig, Setting, generate_init_template, load_config_file,
	load_merged_config, user_config_path,
};
use pullcdn::output::{BodySource, BodyTarget, capture_body, emit_body, filter_body};
use pullcdn::rewrite::{Rewriter, RewriterFactory};

#[derive(Parser)]
#[command(name = "pullcdn")]
#[command(
	author,
	version,
	about = "Rewrite asset URLs in HTML so they are served from an origin-pull CDN"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Use this settings file instead of discovering .pullcdn.toml files
	#[arg(long, global = true, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Create a template .pullcdn.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing .pullcdn.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Rewrite asset URLs in HTML files, or stdin when no files are given
	Rewrite {
		/// HTML files to rewrite
		#[arg(value_name = "FILE")]
		files: Vec<PathBuf>,

		/// Write the result to this file instead of stdout
		#[arg(short, long, value_name = "FILE", conflicts_with = "in_place")]
		output: Option<PathBuf>,

		/// Rewrite each file in place
		#[arg(long, requires = "files")]
		in_place: bool,

		/// Fail on configuration errors instead of passing bodies through
		#[arg(long)]
		strict: bool,
	},
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display merged effective configuration with source annotations
	Show,
	/// Check config files and the asset pattern without rewriting anything
	Validate,
}

fn main() -> ExitCode {
	env_logger::init_from_env(env_logger::Env::new().filter_or("PULLCDN_LOG", "warn"));

	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	// Handle --init
	if cli.init {
		return handle_init(cli.force);
	}

	let config_path = cli.config.as_deref();
	match cli.command {
		Some(Commands::Rewrite {
			files,
			output,
			in_place,
			strict,
		}) => handle_rewrite(config_path, &files, output, in_place, strict),
		Some(Commands::Config { action }) => match action {
			ConfigAction::Show => handle_config_show(config_path),
			ConfigAction::Validate => handle_config_validate(config_path),
		},
		// No command specified - this shouldn't happen due to arg_required_else_help
		None => Ok(ExitCode::SUCCESS),
	}
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let config_path = PathBuf::from(CONFIG_FILE_NAME);

	if config_path.exists() && !force {
		anyhow::bail!("{} already exists. Use --force to overwrite.", CONFIG_FILE_NAME);
	}

	std::fs::write(&config_path, generate_init_template())
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created {}", CONFIG_FILE_NAME);
	Ok(ExitCode::SUCCESS)
}

/// Discover (or load the explicit) settings files and merge them.
fn load_settings(config_path: Option<&Path>) -> Result<(Vec<LoadedConfig>, MergedConfig)> {
	if let Some(path) = config_path {
		let (loaded, merged) = load_config_file(path)
			.with_context(|| format!("Failed to load {}", path.display()))?;
		return Ok((vec![loaded], merged));
	}

	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	load_merged_config(&cwd).context("Failed to load configuration")
}

fn build_rewriter(merged: &MergedConfig) -> Result<Option<Rewriter>> {
	RewriterFactory::build(&merged.configuration(), &merged.site())
		.context("Failed to build rewriter")
}

fn handle_rewrite(
	config_path: Option<&Path>,
	files: &[PathBuf],
	output: Option<PathBuf>,
	in_place: bool,
	strict: bool,
) -> Result<ExitCode> {
	if output.is_some() && files.len() > 1 {
		anyhow::bail!("--output can only be used with a single input file");
	}

	let rewriter = match load_settings(config_path).and_then(|(_, merged)| build_rewriter(&merged)) {
		Ok(rewriter) => rewriter,
		Err(e) if !strict => {
			log::warn!("rewriting disabled: {e:#}");
			None
		}
		Err(e) => return Err(e),
	};

	let sources: Vec<BodySource> = if files.is_empty() {
		vec![BodySource::Stdin]
	} else {
		files.iter().cloned().map(BodySource::File).collect()
	};

	for source in sources {
		let target = match (&source, &output) {
			(BodySource::File(path), _) if in_place => BodyTarget::File(path.clone()),
			(_, Some(path)) => BodyTarget::File(path.clone()),
			_ => BodyTarget::Stdout,
		};

		let name = source.name();
		let body = capture_body(&source)?;
		let body = filter_body(rewriter.as_ref(), body, &name);
		emit_body(&target, &body)?;
		log::info!("{} -> {}", name, target.name());
	}

	Ok(ExitCode::SUCCESS)
}

fn print_setting<T: Display>(key: &str, setting: &Option<Setting<T>>, default: &str) {
	match setting {
		Some(s) => println!("  {}: {}  (from {})", key, s.value, s.source),
		None => println!("  {}: {}  (default)", key, default),
	}
}

fn handle_config_show(config_path: Option<&Path>) -> Result<ExitCode> {
	let (configs, merged) = load_settings(config_path)?;

	if configs.is_empty() {
		println!("No configuration files found.");
	} else {
		println!("Configuration files (in cascade order):\n");

		for loaded in &configs {
			let config = &loaded.config;
			println!("# Source: {}", loaded.path.display());
			println!("# root: {}", config.root);
			if let Some(ref host) = config.cdn_host {
				println!("    cdn-host: {}", host);
			}
			if let Some(uploads) = config.uploads {
				println!("    uploads: {}", uploads.as_str());
			}
			if let Some(ref url) = config.site_url {
				println!("    site-url: {}", url);
			}
			if let Some(ref url) = config.uploads_url {
				println!("    uploads-url: {}", url);
			}
			if let Some(ref exts) = config.extensions {
				println!("    extensions: {}", exts.join(", "));
			}
			if let Some(disabled) = config.disabled {
				println!("    disabled: {}", disabled);
			}
			println!();
		}
	}

	println!("Effective settings:");
	print_setting("cdn-host", &merged.cdn_host, "(none)");
	match merged.uploads {
		Some(ref s) => println!("  uploads: {}  (from {})", s.value.as_str(), s.source),
		None => println!("  uploads: on  (default)"),
	}
	print_setting("site-url", &merged.site_url, "(none)");
	print_setting("uploads-url", &merged.uploads_url, "<site-url>/wp-content/uploads");
	match merged.extensions {
		Some(ref s) => println!("  extensions: {}  (from {})", s.value.join(", "), s.source),
		None => println!(
			"  extensions: {}  (default)",
			pullcdn::rewrite::DEFAULT_EXTENSIONS.join(", ")
		),
	}
	print_setting("disabled", &merged.disabled, "false");
	println!();

	match build_rewriter(&merged) {
		Ok(Some(rewriter)) => println!(
			"Rewriting: enabled ({} from {}{} to {})",
			merged.configuration().mode.as_str(),
			rewriter.scope().host(),
			rewriter.scope().base_path(),
			rewriter.cdn_host()
		),
		Ok(None) => println!(
			"Rewriting: disabled ({})",
			merged
				.configuration()
				.disabled_reason()
				.unwrap_or("not configured")
		),
		Err(e) => println!("Rewriting: disabled (error: {e:#})"),
	}

	// Show user config path
	if config_path.is_none()
		&& let Ok(user_path) = user_config_path()
	{
		println!("\nUser config path: {}", user_path.display());
		if user_path.exists() {
			println!("  (exists)");
		} else {
			println!("  (not found)");
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate(config_path: Option<&Path>) -> Result<ExitCode> {
	let result = load_settings(config_path).and_then(|(configs, merged)| {
		let rewriter = build_rewriter(&merged)?;
		Ok((configs, merged, rewriter))
	});

	match result {
		Ok((configs, merged, rewriter)) => {
			if configs.is_empty() {
				println!("No configuration files found.");
			} else {
				println!("All configuration files are valid:");
				for loaded in &configs {
					println!("  {}", loaded.path.display());
				}
			}
			match rewriter {
				Some(_) => println!("Rewriting is enabled."),
				None => println!(
					"Rewriting is disabled ({}).",
					merged
						.configuration()
						.disabled_reason()
						.unwrap_or("not configured")
				),
			}
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {e:#}");
			Ok(ExitCode::FAILURE)
		}
	}
}
